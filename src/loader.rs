//! Two-step acquisition of the native module.
//!
//! 1. Ask the platform loader for the pre-installed module by logical name.
//! 2. Otherwise extract the embedded payload into a private temp directory and
//!    load it from there.

use std::sync::Arc;

use crate::error::Result;
use crate::extract::{self, ExtractedLibrary};
use crate::native::{LibraryOrigin, NativeAgent, NativeModule, ResolvedLibraryPath};
use crate::platform::{Platform, SYSTEM_LIBRARY_NAME};
use crate::resource::{EmbeddedResources, ResourceSource};

/// A module made available to the process.
pub struct LoadedModule {
    pub agent: Box<dyn NativeAgent>,
    pub location: ResolvedLibraryPath,
    /// The extracted copy backing `agent`, when it came from the payload.
    pub artifact: Option<ExtractedLibrary>,
}

impl std::fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModule")
            .field("location", &self.location)
            .field("artifact", &self.artifact)
            .finish_non_exhaustive()
    }
}

/// Strategy for making the native module available.
pub trait ModuleLoader {
    fn load(&self) -> Result<LoadedModule>;
}

/// The system-path-then-extraction loader used by the agent.
pub struct LibraryLoader {
    system_name: String,
    platform: Platform,
    resources: Arc<dyn ResourceSource>,
}

impl LibraryLoader {
    pub fn new(resources: Arc<dyn ResourceSource>) -> Self {
        Self {
            system_name: SYSTEM_LIBRARY_NAME.to_string(),
            platform: Platform::current(),
            resources,
        }
    }

    /// Loader backed by the payload table compiled into this library.
    pub fn bundled() -> Self {
        Self::new(Arc::new(EmbeddedResources::bundled()))
    }

    pub fn with_system_name(mut self, name: impl Into<String>) -> Self {
        self.system_name = name.into();
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn system_name(&self) -> &str {
        &self.system_name
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Platform-specific file name searched for on the library path,
    /// e.g. `libVoidLoader_agent.so`.
    pub fn system_file_name(&self) -> String {
        libloading::library_filename(&self.system_name)
            .to_string_lossy()
            .into_owned()
    }

    fn load_from_system(&self) -> Result<LoadedModule> {
        let file_name = self.system_file_name();
        let module = unsafe { NativeModule::open(&file_name)? };
        Ok(LoadedModule {
            agent: Box::new(module),
            location: ResolvedLibraryPath::new(file_name, LibraryOrigin::SystemPath),
            artifact: None,
        })
    }

    fn load_from_payload(&self) -> Result<LoadedModule> {
        let name = self.platform.library_file_name();
        let artifact = extract::extract(self.resources.as_ref(), name)?;
        let module = unsafe { NativeModule::open(artifact.path())? };
        Ok(LoadedModule {
            agent: Box::new(module),
            location: ResolvedLibraryPath::new(artifact.path(), LibraryOrigin::ExtractedArchive),
            artifact: Some(artifact),
        })
    }
}

impl ModuleLoader for LibraryLoader {
    fn load(&self) -> Result<LoadedModule> {
        match self.load_from_system() {
            Ok(loaded) => {
                tracing::info!(library = %self.system_file_name(), "loaded native module from system library path");
                return Ok(loaded);
            }
            Err(e) => {
                tracing::info!(error = %e, "system library not found, extracting from {}", self.resources.describe());
            }
        }

        let loaded = self.load_from_payload()?;
        tracing::info!(path = %loaded.location.path.display(), "loaded native module from extracted payload");
        Ok(loaded)
    }
}
