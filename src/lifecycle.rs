//! The lifecycle bridge between the host's agent hooks and the native module.
//!
//! ```text
//! Uninitialized --load--> Loaded --init--> Initialized --cleanup--> CleanedUp
//! ```
//!
//! `agentStart` reaches the module once and always before `agentInit`.
//!
//! Transitions only move forward. Out-of-order calls (a second `init`, a
//! `cleanup` before anything was loaded) are tolerated and logged, never
//! surfaced to the host: every failure stops at this layer.

use std::sync::{Mutex, MutexGuard};

use crate::error::{BootstrapError, Result};
use crate::extract::ExtractedLibrary;
use crate::loader::ModuleLoader;
use crate::native::{HostContext, NativeAgent, ResolvedLibraryPath};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Loaded,
    Initialized,
    CleanedUp,
}

const RECOMMENDATION: &str = "\n\
========================================\n\
RECOMMENDED: load the native agent directly instead!\n\
Add to JVM args: -agentpath:/path/to/libVoidLoader_agent.so\n\
This loads BEFORE any Java code runs.\n\
========================================";

#[derive(Default)]
struct Inner {
    state: LifecycleState,
    agent: Option<Box<dyn NativeAgent>>,
    location: Option<ResolvedLibraryPath>,
    artifact: Option<ExtractedLibrary>,
    started: bool,
    load_attempted: bool,
}

/// Process-scoped owner of the native module and its extracted artifact.
pub struct LifecycleBridge {
    inner: Mutex<Inner>,
}

impl Default for LifecycleBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleBridge {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock must not stop the shutdown path.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> LifecycleState {
        self.lock().state
    }

    /// `true` once a load attempt failed and the bridge runs without a module.
    pub fn is_disabled(&self) -> bool {
        let inner = self.lock();
        inner.load_attempted && inner.agent.is_none()
    }

    pub fn location(&self) -> Option<ResolvedLibraryPath> {
        self.lock().location.clone()
    }

    /// Path of the extracted payload, if the module came from one.
    pub fn artifact_path(&self) -> Option<std::path::PathBuf> {
        self.lock().artifact.as_ref().map(|a| a.path().to_path_buf())
    }

    /// Makes the native module available, at most once per bridge.
    ///
    /// On failure the error is logged together with the `-agentpath`
    /// recommendation and the bridge stays disabled.
    pub fn load(&self, loader: &dyn ModuleLoader) -> LifecycleState {
        let mut inner = self.lock();
        if inner.load_attempted || inner.state != LifecycleState::Uninitialized {
            tracing::debug!(state = ?inner.state, "native module load already attempted");
            return inner.state;
        }
        inner.load_attempted = true;

        match loader.load() {
            Ok(loaded) => {
                tracing::info!(path = %loaded.location.path.display(), origin = ?loaded.location.origin, "native module loaded");
                inner.agent = Some(loaded.agent);
                inner.location = Some(loaded.location);
                inner.artifact = loaded.artifact;
                inner.state = LifecycleState::Loaded;
            }
            Err(e) => {
                tracing::error!(error = %e, kind = ?e.kind(), "CRITICAL: failed to load native library");
                tracing::error!("{RECOMMENDATION}");
            }
        }
        inner.state
    }

    /// Forwards `agentStart`. Only the first successful call reaches the module.
    pub fn start(&self) -> Result<()> {
        forward_start(&mut self.lock())
    }

    /// Forwards `agentInit` with the raw agent arguments and host context.
    pub fn init(&self, args: Option<&str>, context: HostContext) -> Result<LifecycleState> {
        let mut inner = self.lock();
        match inner.state {
            LifecycleState::Loaded => {}
            LifecycleState::Uninitialized => return Err(not_available("agentInit")),
            state => {
                tracing::warn!(?state, "agentInit ignored");
                return Ok(state);
            }
        }

        if !inner.started {
            forward_start(&mut inner)?;
        }

        let args = args.unwrap_or("");
        let Some(agent) = inner.agent.as_ref() else {
            return Err(not_available("agentInit"));
        };
        match agent.init(args, context) {
            Ok(()) => {
                inner.state = LifecycleState::Initialized;
                tracing::info!("agent initialized");
                Ok(LifecycleState::Initialized)
            }
            Err(e) => {
                tracing::error!(error = %e, "error during agent initialization");
                Err(e)
            }
        }
    }

    /// `start` followed by `init`: the sequence run by both agent hooks.
    pub fn boot(&self, args: Option<&str>, context: HostContext) -> Result<LifecycleState> {
        self.start()?;
        self.init(args, context)
    }

    /// Final call of the process. Never fails.
    ///
    /// Removes the extracted artifact, forwards `agentCleanup` if a module is
    /// loaded and cleanup has not run yet, then lands in `CleanedUp`.
    pub fn cleanup(&self) -> LifecycleState {
        let mut inner = self.lock();
        let previous = inner.state;

        if let Some(artifact) = inner.artifact.as_ref() {
            match artifact.remove() {
                Ok(true) => tracing::debug!(path = %artifact.path().display(), "removed extracted library"),
                Ok(false) => {}
                Err(e) => tracing::debug!(error = %e, "could not remove extracted library"),
            }
        }

        if previous != LifecycleState::CleanedUp {
            if let Some(agent) = inner.agent.as_ref() {
                if let Err(e) = agent.cleanup() {
                    tracing::debug!(error = %e, "agentCleanup failed");
                }
            }
        }

        inner.state = LifecycleState::CleanedUp;
        LifecycleState::CleanedUp
    }
}

fn forward_start(inner: &mut Inner) -> Result<()> {
    if inner.started {
        tracing::debug!("agentStart already forwarded");
        return Ok(());
    }
    let agent = match inner.agent.as_ref() {
        Some(agent) if inner.state != LifecycleState::CleanedUp => agent,
        Some(_) => {
            tracing::warn!("agentStart ignored after cleanup");
            return Ok(());
        }
        None => return Err(not_available("agentStart")),
    };
    let result = agent.start();
    match &result {
        Ok(()) => {
            tracing::debug!("agentStart forwarded");
            inner.started = true;
        }
        Err(e) => tracing::error!(error = %e, kind = ?e.kind(), "agentStart failed"),
    }
    result
}

/// Logged linkage failure for a call made while no module is loaded.
fn not_available(call: &str) -> BootstrapError {
    let e = BootstrapError::linkage(call, "native module is not loaded");
    tracing::error!(error = %e, kind = ?e.kind(), "native methods not available; the native agent may not have loaded correctly");
    e
}
