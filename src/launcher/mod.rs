//! Launches the game from a versioned archive next to the working directory.
//!
//! Resolution and invocation are separate steps: a [`LaunchTarget`] is fully
//! resolved from the filesystem before any JVM is touched, so "nothing to
//! launch" is always distinguishable from "launch failed".
//!
//! ```text
//! <work dir>/versions/1.20.1/1.20.1.jar  ->  net.minecraft.client.main.Main.main(args)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::LauncherConfig;
use crate::error::{BootstrapError, Result};

#[cfg(feature = "launcher")]
pub mod jvm;

/// Everything needed to call the game's entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchTarget {
    /// The single archive the isolated class loader is scoped to.
    pub archive: PathBuf,
    /// Fully-qualified, dot-separated entry class name.
    pub entry_class: String,
    /// Passed to `main(String[])` unchanged.
    pub args: Vec<String>,
}

impl LaunchTarget {
    /// Locates the archive under `base_dir` and binds it to the entry point.
    pub fn resolve(base_dir: &Path, config: &LauncherConfig, args: Vec<String>) -> Result<Self> {
        let versions_dir = base_dir.join(&config.versions_dir);
        let archive = find_versioned_archive(&versions_dir, &config.archive_extension).ok_or_else(|| {
            BootstrapError::LaunchTargetNotFound {
                versions_dir: versions_dir.clone(),
                extension: config.archive_extension.clone(),
            }
        })?;

        Ok(Self {
            archive,
            entry_class: config.entry_class.clone(),
            args,
        })
    }

    /// Entry class in JNI form, e.g. `net/minecraft/client/main/Main`.
    pub fn entry_class_internal(&self) -> String {
        self.entry_class.replace('.', "/")
    }
}

/// Returns the first `<name>/<name>.<ext>` found under `versions_dir`.
///
/// Candidates are checked in directory enumeration order, which is up to the
/// filesystem. With several versions installed the pick is not necessarily
/// the newest.
pub fn find_versioned_archive(versions_dir: &Path, extension: &str) -> Option<PathBuf> {
    let entries = match fs::read_dir(versions_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %versions_dir.display(), error = %e, "cannot read versions directory");
            return None;
        }
    };

    for entry in entries.flatten() {
        let version_dir = entry.path();
        let Some(name) = version_dir.file_name() else {
            continue;
        };
        let mut file_name = name.to_os_string();
        file_name.push(".");
        file_name.push(extension);

        let candidate = version_dir.join(file_name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Something able to run a resolved [`LaunchTarget`].
pub trait EntryInvoker {
    fn invoke(&mut self, target: &LaunchTarget) -> Result<()>;
}

/// Resolves the target under `base_dir` and hands it to `invoker`.
///
/// The invoker is not called when no archive is found.
pub fn launch(
    base_dir: &Path,
    config: &LauncherConfig,
    args: Vec<String>,
    invoker: &mut dyn EntryInvoker,
) -> Result<LaunchTarget> {
    tracing::info!("custom loader starting");

    let target = match LaunchTarget::resolve(base_dir, config, args) {
        Ok(target) => target,
        Err(e) => {
            tracing::error!(error = %e, "could not locate the game archive");
            return Err(e);
        }
    };

    tracing::info!(archive = %target.archive.display(), "loading game");
    tracing::info!(entry = %target.entry_class, "launching game main");
    if let Err(e) = invoker.invoke(&target) {
        tracing::error!(error = %e, kind = ?e.kind(), "launch failed");
        return Err(e);
    }
    Ok(target)
}
