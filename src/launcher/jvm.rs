//! Runs a [`LaunchTarget`] inside a JVM created in this process.
//!
//! `libjvm` is located from the launcher configuration (an explicit library
//! path or a java home) and loaded with `libloading`; everything after `JNI_CreateJavaVM` goes through the `jni`
//! crate. The game archive gets its own `URLClassLoader` whose parent is the
//! system class loader.

use std::ffi::{c_char, c_void, CString, NulError};
use std::path::{Path, PathBuf};
use std::ptr;

use jni::objects::{JClass, JObject, JStaticMethodID, JString, JValue};
use jni::signature::{Primitive, ReturnType};
use jni::sys;
use jni::JNIEnv;

use super::{EntryInvoker, LaunchTarget};
use crate::config::LauncherConfig;
use crate::error::{BootstrapError, ReflectionStage, Result};

type CreateJavaVmFn =
    unsafe extern "system" fn(*mut *mut sys::JavaVM, *mut *mut c_void, *mut c_void) -> sys::jint;

const MAIN_METHOD: &str = "main";
const MAIN_SIGNATURE: &str = "([Ljava/lang/String;)V";

/// Where the launcher looks for `libjvm`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JvmSearch {
    /// Exact library path. When set, `java_home` is not consulted.
    pub library: Option<PathBuf>,
    pub java_home: Option<PathBuf>,
}

impl JvmSearch {
    pub fn from_config(config: &LauncherConfig) -> Self {
        Self {
            library: config.jvm_library.clone(),
            java_home: config.java_home.clone(),
        }
    }

    /// Every path tried, in order.
    pub fn candidates(&self) -> Vec<PathBuf> {
        if let Some(library) = &self.library {
            return vec![library.clone()];
        }
        let Some(home) = &self.java_home else {
            return Vec::new();
        };
        let file_name = libloading::library_filename("jvm");
        home_layouts()
            .into_iter()
            .map(|dir| home.join(dir).join(&file_name))
            .collect()
    }

    /// First candidate present on disk.
    pub fn locate(&self) -> Result<PathBuf> {
        if let Some(found) = self.candidates().into_iter().find(|p| p.is_file()) {
            return Ok(found);
        }
        let reason = match (&self.library, &self.java_home) {
            (Some(library), _) => format!("{} does not exist", library.display()),
            (None, Some(home)) => format!("no libjvm under java home {}", home.display()),
            (None, None) => "no java home configured; set JAVA_HOME, VOIDLOADER_JAVA_HOME or JVM_LIB_PATH".to_string(),
        };
        Err(BootstrapError::JvmUnavailable(reason))
    }
}

/// Directories inside a JDK or JRE home that may hold `libjvm`.
fn home_layouts() -> Vec<PathBuf> {
    let arch = std::env::consts::ARCH;
    let mut dirs = Vec::new();
    for lib in ["lib", "jre/lib"] {
        dirs.push(Path::new(lib).join("server"));
        dirs.push(Path::new(lib).join(arch).join("server"));
    }
    if cfg!(windows) {
        for bin in ["bin", "jre/bin"] {
            dirs.push(Path::new(bin).join("server"));
            dirs.push(Path::new(bin).join("client"));
        }
    }
    dirs
}

/// Options for the JVM the game runs in.
#[derive(Debug, Clone)]
pub struct JvmOptions {
    version: sys::jint,
    options: Vec<CString>,
    ignore_unrecognized: bool,
}

impl Default for JvmOptions {
    fn default() -> Self {
        Self {
            version: sys::JNI_VERSION_1_8,
            options: Vec::new(),
            ignore_unrecognized: false,
        }
    }
}

impl JvmOptions {
    /// Adds options such as `-Xmx2G` or `-Djava.library.path=natives`.
    pub fn options<I, S>(mut self, opts: I) -> std::result::Result<Self, NulError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for opt in opts {
            self.options.push(CString::new(opt.as_ref())?);
        }
        Ok(self)
    }

    pub fn ignore_unrecognized(mut self, value: bool) -> Self {
        self.ignore_unrecognized = value;
        self
    }

    /// Loads `libjvm` from `path` and creates a VM on the current thread.
    pub fn create_from_library<P: AsRef<Path>>(&self, path: P) -> Result<EmbeddedJvm> {
        let path = path.as_ref();
        let lib = unsafe {
            libloading::Library::new(path)
                .map_err(|e| BootstrapError::JvmUnavailable(format!("failed to load {}: {e}", path.display())))?
        };
        let create: CreateJavaVmFn = unsafe {
            *lib.get::<CreateJavaVmFn>(b"JNI_CreateJavaVM\0")
                .map_err(|e| BootstrapError::JvmUnavailable(e.to_string()))?
        };

        let mut option_structs: Vec<sys::JavaVMOption> = self
            .options
            .iter()
            .map(|s| sys::JavaVMOption {
                optionString: s.as_ptr() as *mut c_char,
                extraInfo: ptr::null_mut(),
            })
            .collect();
        let mut args = sys::JavaVMInitArgs {
            version: self.version,
            nOptions: option_structs.len() as sys::jint,
            options: if option_structs.is_empty() {
                ptr::null_mut()
            } else {
                option_structs.as_mut_ptr()
            },
            ignoreUnrecognized: if self.ignore_unrecognized {
                sys::JNI_TRUE
            } else {
                sys::JNI_FALSE
            },
        };

        let mut vm: *mut sys::JavaVM = ptr::null_mut();
        let mut env: *mut c_void = ptr::null_mut();
        let res = unsafe { create(&mut vm, &mut env, &mut args as *mut _ as *mut c_void) };
        if res != sys::JNI_OK || vm.is_null() {
            return Err(BootstrapError::JvmUnavailable(format!(
                "JNI_CreateJavaVM returned {res}"
            )));
        }

        let vm = unsafe { jni::JavaVM::from_raw(vm) }
            .map_err(|e| BootstrapError::JvmUnavailable(e.to_string()))?;
        Ok(EmbeddedJvm {
            vm,
            _lib: lib,
        })
    }

    /// Creates a VM from the `libjvm` found by `search`.
    pub fn create(&self, search: &JvmSearch) -> Result<EmbeddedJvm> {
        let path = search.locate()?;
        tracing::debug!(libjvm = %path.display(), "creating JVM");
        self.create_from_library(path)
    }
}

/// A JVM owned by this process. Dropping it waits for non-daemon Java
/// threads and then destroys the VM.
pub struct EmbeddedJvm {
    vm: jni::JavaVM,
    _lib: libloading::Library,
}

impl EmbeddedJvm {
    pub fn java_vm(&self) -> &jni::JavaVM {
        &self.vm
    }
}

impl Drop for EmbeddedJvm {
    fn drop(&mut self) {
        let raw = self.vm.get_java_vm_pointer();
        unsafe {
            if let Some(destroy) = (**raw).DestroyJavaVM {
                let _ = destroy(raw);
            }
        }
    }
}

struct ResolvedEntry<'local> {
    class: JClass<'local>,
    main: JStaticMethodID,
}

/// [`EntryInvoker`] that creates the JVM lazily on first use.
pub struct JvmInvoker {
    options: JvmOptions,
    search: JvmSearch,
    jvm: Option<EmbeddedJvm>,
}

impl JvmInvoker {
    pub fn new(options: JvmOptions, search: JvmSearch) -> Self {
        Self {
            options,
            search,
            jvm: None,
        }
    }

    /// Wraps an already created VM.
    pub fn with_jvm(jvm: EmbeddedJvm) -> Self {
        Self {
            options: JvmOptions::default(),
            search: JvmSearch::default(),
            jvm: Some(jvm),
        }
    }

    fn jvm(&mut self) -> Result<&EmbeddedJvm> {
        if self.jvm.is_none() {
            self.jvm = Some(self.options.create(&self.search)?);
        }
        self.jvm
            .as_ref()
            .ok_or_else(|| BootstrapError::JvmUnavailable("JVM was not created".to_string()))
    }
}

impl EntryInvoker for JvmInvoker {
    fn invoke(&mut self, target: &LaunchTarget) -> Result<()> {
        let jvm = self.jvm()?;
        let mut env = jvm
            .java_vm()
            .attach_current_thread()
            .map_err(|e| BootstrapError::JvmUnavailable(e.to_string()))?;

        let entry = match resolve_entry(&mut env, target) {
            Ok(entry) => entry,
            Err(e) => return Err(java_failure(&mut env, ReflectionStage::Resolve, target, e)),
        };
        tracing::debug!(entry = %target.entry_class, "entry point resolved");

        if let Err(e) = call_entry(&mut env, &entry, &target.args) {
            return Err(java_failure(&mut env, ReflectionStage::Invoke, target, e));
        }
        Ok(())
    }
}

fn resolve_entry<'local>(
    env: &mut JNIEnv<'local>,
    target: &LaunchTarget,
) -> jni::errors::Result<ResolvedEntry<'local>> {
    let path = env.new_string(target.archive.to_string_lossy())?;
    let file = env.new_object("java/io/File", "(Ljava/lang/String;)V", &[JValue::Object(&path)])?;
    let uri = env.call_method(&file, "toURI", "()Ljava/net/URI;", &[])?.l()?;
    let url = env.call_method(&uri, "toURL", "()Ljava/net/URL;", &[])?.l()?;
    let urls = env.new_object_array(1, "java/net/URL", &url)?;

    let parent = env
        .call_static_method(
            "java/lang/ClassLoader",
            "getSystemClassLoader",
            "()Ljava/lang/ClassLoader;",
            &[],
        )?
        .l()?;
    let loader = env.new_object(
        "java/net/URLClassLoader",
        "([Ljava/net/URL;Ljava/lang/ClassLoader;)V",
        &[JValue::Object(&*urls), JValue::Object(&parent)],
    )?;

    let name = env.new_string(&target.entry_class)?;
    let class = env
        .call_static_method(
            "java/lang/Class",
            "forName",
            "(Ljava/lang/String;ZLjava/lang/ClassLoader;)Ljava/lang/Class;",
            &[
                JValue::Object(&name),
                JValue::Bool(sys::JNI_TRUE),
                JValue::Object(&loader),
            ],
        )?
        .l()?;
    let class = JClass::from(class);
    let main = env.get_static_method_id(&class, MAIN_METHOD, MAIN_SIGNATURE)?;

    Ok(ResolvedEntry { class, main })
}

fn call_entry(env: &mut JNIEnv<'_>, entry: &ResolvedEntry<'_>, args: &[String]) -> jni::errors::Result<()> {
    let string_class = env.find_class("java/lang/String")?;
    let argv = env.new_object_array(args.len() as sys::jsize, &string_class, JObject::null())?;
    for (index, arg) in args.iter().enumerate() {
        let value = env.new_string(arg)?;
        env.set_object_array_element(&argv, index as sys::jsize, &value)?;
        env.delete_local_ref(value)?;
    }

    unsafe {
        env.call_static_method_unchecked(
            &entry.class,
            entry.main,
            ReturnType::Primitive(Primitive::Void),
            &[JValue::Object(&*argv).as_jni()],
        )?;
    }
    Ok(())
}

fn java_failure(
    env: &mut JNIEnv<'_>,
    stage: ReflectionStage,
    target: &LaunchTarget,
    error: jni::errors::Error,
) -> BootstrapError {
    let reason = pending_exception(env).unwrap_or_else(|| error.to_string());
    BootstrapError::Reflection {
        stage,
        entry: format!("{}.{MAIN_METHOD}", target.entry_class),
        reason,
    }
}

/// Describes and clears a pending Java exception, returning its `toString()`.
fn pending_exception(env: &mut JNIEnv<'_>) -> Option<String> {
    if !env.exception_check().unwrap_or(false) {
        return None;
    }
    let throwable = env.exception_occurred().ok()?;
    let _ = env.exception_describe();
    let _ = env.exception_clear();

    let text = env
        .call_method(&throwable, "toString", "()Ljava/lang/String;", &[])
        .ok()?
        .l()
        .ok()?;
    let text = JString::from(text);
    let text: String = env.get_string(&text).ok()?.into();
    Some(text)
}
