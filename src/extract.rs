//! Materialises an embedded payload as an executable file on disk.
//!
//! Every extraction gets its own freshly created directory under the system
//! temp location. The directory holds exactly one file and is never reused.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{BootstrapError, Result};
use crate::platform::TEMP_PREFIX;
use crate::resource::ResourceSource;

const COPY_BUFFER: usize = 8 * 1024;

/// A payload copied out to a private temporary directory.
///
/// Dropping the value removes the directory. [`ExtractedLibrary::remove`]
/// does the same eagerly and tolerates the files already being gone.
#[derive(Debug)]
pub struct ExtractedLibrary {
    dir: TempDir,
    path: PathBuf,
    len: u64,
}

impl ExtractedLibrary {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Number of bytes copied from the source.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Deletes the extracted file and then its directory.
    ///
    /// Returns `true` if the file still existed and was removed.
    pub fn remove(&self) -> io::Result<bool> {
        let removed = match fs::remove_file(&self.path) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(e),
        };
        match fs::remove_dir(self.dir.path()) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        Ok(removed)
    }
}

/// Extracts `name` from `source` into a new temporary directory under the
/// system temp location.
pub fn extract(source: &dyn ResourceSource, name: &str) -> Result<ExtractedLibrary> {
    extract_in(source, name, &std::env::temp_dir())
}

/// Same as [`extract`], with the parent of the fresh directory given explicitly.
pub fn extract_in(source: &dyn ResourceSource, name: &str, parent: &Path) -> Result<ExtractedLibrary> {
    let dir = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempdir_in(parent)
        .map_err(|e| {
            BootstrapError::io(
                format!("failed to create temp directory in {}", parent.display()),
                e,
            )
        })?;

    let file_name = Path::new(name.trim_start_matches('/'))
        .file_name()
        .ok_or_else(|| BootstrapError::ResourceNotFound {
            name: name.to_string(),
            source_desc: source.describe(),
        })?;
    let path = dir.path().join(file_name);

    let file = File::create(&path)
        .map_err(|e| BootstrapError::io(format!("failed to create {}", path.display()), e))?;
    let mut out = BufWriter::with_capacity(COPY_BUFFER, file);
    let len = source.copy_to(name, &mut out)?;
    out.flush()
        .map_err(|e| BootstrapError::io(format!("failed to write {}", path.display()), e))?;
    drop(out);

    mark_executable(&path)
        .map_err(|e| BootstrapError::io(format!("failed to mark {} executable", path.display()), e))?;

    tracing::debug!(path = %path.display(), bytes = len, "extracted native payload");
    Ok(ExtractedLibrary { dir, path, len })
}

/// Adds execute permission for owner, group and others.
#[cfg(unix)]
pub fn mark_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms)
}

/// Windows has no execute bit; loadability only requires the file to be
/// readable, so clear the read-only flag if it was set.
#[cfg(not(unix))]
pub fn mark_executable(path: &Path) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    if perms.readonly() {
        perms.set_readonly(false);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}
