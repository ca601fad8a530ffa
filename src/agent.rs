//! JVMTI entry points of the bootstrap library.
//!
//! Loaded at startup:
//!
//! ```bash
//! java -agentpath:/path/to/libvoidloader.so=<agent args> -jar game.jar
//! ```
//!
//! or into a running VM through the Attach API. Both hooks load the native
//! module once and forward `agentStart` + `agentInit`; `Agent_OnUnload` runs the
//! cleanup. Every hook reports success to the JVM whatever happens inside.

use std::ffi::{c_char, c_void, CStr};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

use crate::config::BootstrapConfig;
use crate::lifecycle::LifecycleBridge;
use crate::loader::LibraryLoader;
use crate::native::HostContext;
use crate::resource::{EmbeddedResources, ResourceSource};
use crate::telemetry;

type Jint = i32;
const JNI_OK: Jint = 0;

/// The single bridge of this process.
static BRIDGE: OnceLock<LifecycleBridge> = OnceLock::new();

#[cfg(feature = "archive")]
fn resources_for(config: &BootstrapConfig) -> Arc<dyn ResourceSource> {
    match &config.archive {
        Some(archive) => Arc::new(crate::resource::ArchiveResources::new(archive)),
        None => Arc::new(EmbeddedResources::bundled()),
    }
}

#[cfg(not(feature = "archive"))]
fn resources_for(config: &BootstrapConfig) -> Arc<dyn ResourceSource> {
    if config.archive.is_some() {
        tracing::warn!("package archive configured but archive support is not compiled in");
    }
    Arc::new(EmbeddedResources::bundled())
}

/// Loader described by `config`.
pub fn loader_for(config: &BootstrapConfig) -> LibraryLoader {
    LibraryLoader::new(resources_for(config)).with_system_name(config.system_library.clone())
}

/// Returns the process bridge, creating and loading it on first use.
pub fn bridge() -> &'static LifecycleBridge {
    BRIDGE.get_or_init(|| {
        let config = BootstrapConfig::from_env();
        telemetry::init(&config.log_filter);
        tracing::info!("bootstrap agent initializing");

        let bridge = LifecycleBridge::new();
        bridge.load(&loader_for(&config));
        bridge
    })
}

unsafe fn options_str<'a>(options: *const c_char) -> Option<&'a str> {
    if options.is_null() {
        return None;
    }
    match CStr::from_ptr(options).to_str() {
        Ok(s) => Some(s),
        Err(_) => {
            tracing::warn!("agent options are not valid UTF-8, passing none");
            None
        }
    }
}

/// Runs `f`, turning a panic into a log line instead of unwinding into the JVM.
fn contain<F: FnOnce()>(hook: &str, f: F) {
    if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(f)) {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::error!(hook, "bootstrap hook panicked: {message}");
    }
}

unsafe fn on_load(vm: *mut c_void, options: *const c_char) {
    let bridge = bridge();
    let options = options_str(options);
    // Failures are already logged by the bridge.
    let _ = bridge.boot(options, HostContext::from_raw(vm));
}

unsafe fn on_attach(vm: *mut c_void, options: *const c_char) {
    let bridge = bridge();
    let options = options_str(options);
    tracing::warn!("dynamic attach: some classes may already be loaded");
    tracing::warn!("for best results load at startup with -agentpath:/path/to/libvoidloader.so");
    let _ = bridge.boot(options, HostContext::from_raw(vm));
}

/// Pre-main hook, called by the JVM for `-agentpath`/`-agentlib`.
///
/// # Safety
/// Called by the JVM with a valid `JavaVM*` and a NUL-terminated or null
/// options string.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "system" fn Agent_OnLoad(
    vm: *mut c_void,
    options: *mut c_char,
    _reserved: *mut c_void,
) -> Jint {
    contain("Agent_OnLoad", || on_load(vm, options));
    JNI_OK
}

/// Dynamic-attach hook, called by the JVM Attach API.
///
/// # Safety
/// Same contract as [`Agent_OnLoad`].
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "system" fn Agent_OnAttach(
    vm: *mut c_void,
    options: *mut c_char,
    _reserved: *mut c_void,
) -> Jint {
    contain("Agent_OnAttach", || on_attach(vm, options));
    JNI_OK
}

/// Shutdown hook, called once by the JVM while the VM is going down.
///
/// # Safety
/// Called by the JVM; `vm` is not used.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "system" fn Agent_OnUnload(_vm: *mut c_void) {
    contain("Agent_OnUnload", || {
        if let Some(bridge) = BRIDGE.get() {
            bridge.cleanup();
        }
    });
}
