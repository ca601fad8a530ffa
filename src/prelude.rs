//! Common imports for embedding the bootstrap in another agent or tool.
//!
//! Kept small on purpose: the bridge, the loader seam and the types that
//! flow through them.

pub use crate::error::{BootstrapError, ErrorKind, Result};
pub use crate::extract::ExtractedLibrary;
pub use crate::lifecycle::{LifecycleBridge, LifecycleState};
pub use crate::loader::{LibraryLoader, LoadedModule, ModuleLoader};
pub use crate::native::{HostContext, LibraryOrigin, NativeAgent, ResolvedLibraryPath};
pub use crate::platform::Platform;
pub use crate::resource::{EmbeddedResources, ResourceSource};
#[cfg(feature = "archive")]
pub use crate::resource::ArchiveResources;
pub use crate::launcher::{EntryInvoker, LaunchTarget};
