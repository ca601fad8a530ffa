//! The three-call contract of the VoidLoader native module.
//!
//! The module exports, with the platform's system calling convention:
//!
//! ```text
//! void agentStart(void);
//! void agentInit(const char* args, void* host_context);
//! void agentCleanup(void);
//! ```
//!
//! Symbols are looked up on every call so that a module missing one of them
//! still loads; the missing call then fails with a linkage error.

use std::ffi::{c_char, c_void, CString};
use std::path::{Path, PathBuf};

use libloading::Library;

use crate::error::{BootstrapError, Result};

pub const AGENT_START: &[u8] = b"agentStart\0";
pub const AGENT_INIT: &[u8] = b"agentInit\0";
pub const AGENT_CLEANUP: &[u8] = b"agentCleanup\0";

type AgentStartFn = unsafe extern "system" fn();
type AgentInitFn = unsafe extern "system" fn(*const c_char, *mut c_void);
type AgentCleanupFn = unsafe extern "system" fn();

/// Opaque handle to the host's instrumentation context.
///
/// For the JVMTI entry points this is the `JavaVM*` the agent was loaded into.
/// The bridge never dereferences it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostContext(*mut c_void);

// The pointer is only ever handed back to native code, never dereferenced here.
unsafe impl Send for HostContext {}
unsafe impl Sync for HostContext {}

impl HostContext {
    pub fn null() -> Self {
        HostContext(std::ptr::null_mut())
    }

    pub fn from_raw(ptr: *mut c_void) -> Self {
        HostContext(ptr)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl Default for HostContext {
    fn default() -> Self {
        Self::null()
    }
}

/// The agent-side view of the native module.
pub trait NativeAgent: Send + Sync {
    fn start(&self) -> Result<()>;
    fn init(&self, args: &str, context: HostContext) -> Result<()>;
    fn cleanup(&self) -> Result<()>;
}

/// Where a loaded module came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryOrigin {
    SystemPath,
    ExtractedArchive,
}

/// Location of the loaded module plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLibraryPath {
    pub path: PathBuf,
    pub origin: LibraryOrigin,
}

impl ResolvedLibraryPath {
    pub fn new(path: impl Into<PathBuf>, origin: LibraryOrigin) -> Self {
        Self {
            path: path.into(),
            origin,
        }
    }
}

/// A native module opened with `libloading`.
///
/// The library is never closed: once its symbols are registered in the
/// process they stay there until exit.
#[derive(Debug)]
pub struct NativeModule {
    library: Library,
    path: PathBuf,
}

impl NativeModule {
    /// Opens a module by file name or path.
    ///
    /// A bare file name is searched for on the platform's default library path.
    ///
    /// # Safety
    /// Loading a library runs its initialisers. The caller must trust the module.
    pub unsafe fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let library = Library::new(path)
            .map_err(|e| BootstrapError::linkage(path.display().to_string(), e))?;
        Ok(Self {
            library,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn symbol<T: Copy>(&self, name: &[u8]) -> Result<T> {
        unsafe {
            self.library
                .get::<T>(name)
                .map(|symbol| *symbol)
                .map_err(|e| BootstrapError::linkage(symbol_name(name), e))
        }
    }
}

fn symbol_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw.strip_suffix(b"\0").unwrap_or(raw)).into_owned()
}

impl NativeAgent for NativeModule {
    fn start(&self) -> Result<()> {
        let start: AgentStartFn = self.symbol(AGENT_START)?;
        unsafe { start() };
        Ok(())
    }

    fn init(&self, args: &str, context: HostContext) -> Result<()> {
        let init: AgentInitFn = self.symbol(AGENT_INIT)?;
        let args = CString::new(args).map_err(|e| BootstrapError::linkage("agentInit arguments", e))?;
        unsafe { init(args.as_ptr(), context.as_ptr()) };
        Ok(())
    }

    fn cleanup(&self) -> Result<()> {
        let cleanup: AgentCleanupFn = self.symbol(AGENT_CLEANUP)?;
        unsafe { cleanup() };
        Ok(())
    }
}
