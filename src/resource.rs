//! Sources of embedded native payloads.
//!
//! A [`ResourceSource`] streams a named payload into a writer. The agent
//! normally reads from the table compiled in by `build.rs`; with the `archive`
//! feature it can also pull the payload out of a jar or zip on disk.

use std::io::{self, Write};

use crate::error::{BootstrapError, Result};

/// Something that can hand out bundled binary resources by name.
pub trait ResourceSource: Send + Sync {
    /// Human-readable origin, used in logs and error messages.
    fn describe(&self) -> String;

    /// Copies the resource `name` into `out`, returning the number of bytes written.
    ///
    /// Fails with [`BootstrapError::ResourceNotFound`] when the resource is absent.
    fn copy_to(&self, name: &str, out: &mut dyn Write) -> Result<u64>;
}

/// Resources compiled into the binary as a static `(name, bytes)` table.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedResources {
    entries: &'static [(&'static str, &'static [u8])],
}

mod generated {
    include!(concat!(env!("OUT_DIR"), "/embedded_payloads.rs"));
}

impl EmbeddedResources {
    pub const fn new(entries: &'static [(&'static str, &'static [u8])]) -> Self {
        Self { entries }
    }

    /// The payload table produced by the build script.
    pub fn bundled() -> Self {
        Self::new(generated::EMBEDDED_PAYLOADS)
    }

    pub fn get(&self, name: &str) -> Option<&'static [u8]> {
        let name = name.trim_start_matches('/');
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|(_, bytes)| *bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceSource for EmbeddedResources {
    fn describe(&self) -> String {
        format!("embedded payload table ({} entries)", self.entries.len())
    }

    fn copy_to(&self, name: &str, out: &mut dyn Write) -> Result<u64> {
        let mut bytes = self.get(name).ok_or_else(|| BootstrapError::ResourceNotFound {
            name: name.to_string(),
            source_desc: self.describe(),
        })?;
        io::copy(&mut bytes, out)
            .map_err(|e| BootstrapError::io(format!("failed to copy embedded {name}"), e))
    }
}

#[cfg(feature = "archive")]
pub use self::archive::ArchiveResources;

#[cfg(feature = "archive")]
mod archive {
    use std::fs::File;
    use std::io::{self, Write};
    use std::path::{Path, PathBuf};

    use zip::result::ZipError;
    use zip::ZipArchive;

    use super::ResourceSource;
    use crate::error::{BootstrapError, Result};

    /// Resources stored as entries of a jar or zip package archive.
    #[derive(Debug, Clone)]
    pub struct ArchiveResources {
        path: PathBuf,
    }

    impl ArchiveResources {
        pub fn new<P: AsRef<Path>>(path: P) -> Self {
            Self {
                path: path.as_ref().to_path_buf(),
            }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl ResourceSource for ArchiveResources {
        fn describe(&self) -> String {
            format!("package archive {}", self.path.display())
        }

        fn copy_to(&self, name: &str, out: &mut dyn Write) -> Result<u64> {
            let file = File::open(&self.path).map_err(|e| {
                BootstrapError::io(format!("failed to open {}", self.path.display()), e)
            })?;
            let mut archive = ZipArchive::new(file).map_err(|e| {
                BootstrapError::io(
                    format!("failed to read {}", self.path.display()),
                    io::Error::new(io::ErrorKind::InvalidData, e),
                )
            })?;

            let entry_name = name.trim_start_matches('/');
            let mut entry = match archive.by_name(entry_name) {
                Ok(entry) => entry,
                Err(ZipError::FileNotFound) => {
                    return Err(BootstrapError::ResourceNotFound {
                        name: entry_name.to_string(),
                        source_desc: self.describe(),
                    })
                }
                Err(e) => {
                    return Err(BootstrapError::io(
                        format!("failed to open entry {entry_name}"),
                        io::Error::new(io::ErrorKind::InvalidData, e),
                    ))
                }
            };

            io::copy(&mut entry, out)
                .map_err(|e| BootstrapError::io(format!("failed to copy {entry_name}"), e))
        }
    }
}
