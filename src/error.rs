//! Error taxonomy shared by the bootstrap agent and the launcher.
//!
//! None of these errors ever reach the JVM: the agent entry points log and
//! swallow them. Only the launcher binary turns one into a process exit code.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Which half of a reflective launch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflectionStage {
    /// Class loader construction, class lookup or method lookup.
    Resolve,
    /// The entry point itself threw or could not be called.
    Invoke,
}

impl std::fmt::Display for ReflectionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReflectionStage::Resolve => f.write_str("resolve"),
            ReflectionStage::Invoke => f.write_str("invoke"),
        }
    }
}

/// Stable classification of a [`BootstrapError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ResourceNotFound,
    LinkageFailure,
    IoFailure,
    LaunchTargetNotFound,
    ReflectionFailure,
    JvmUnavailable,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("native library {name} not found in {source_desc}")]
    ResourceNotFound { name: String, source_desc: String },

    #[error("native linkage failed for {what}: {reason}")]
    Linkage { what: String, reason: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("no versions/<name>/<name>.{extension} archive under {}", .versions_dir.display())]
    LaunchTargetNotFound {
        versions_dir: PathBuf,
        extension: String,
    },

    #[error("failed to {stage} entry point {entry}: {reason}")]
    Reflection {
        stage: ReflectionStage,
        entry: String,
        reason: String,
    },

    #[error("JVM unavailable: {0}")]
    JvmUnavailable(String),
}

impl BootstrapError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        BootstrapError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn linkage(what: impl Into<String>, reason: impl ToString) -> Self {
        BootstrapError::Linkage {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BootstrapError::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            BootstrapError::Linkage { .. } => ErrorKind::LinkageFailure,
            BootstrapError::Io { .. } => ErrorKind::IoFailure,
            BootstrapError::LaunchTargetNotFound { .. } => ErrorKind::LaunchTargetNotFound,
            BootstrapError::Reflection { .. } => ErrorKind::ReflectionFailure,
            BootstrapError::JvmUnavailable(_) => ErrorKind::JvmUnavailable,
        }
    }
}
