//! # voidloader
//!
//! Bootstrap layer for the VoidLoader mod loader.
//!
//! The real work happens in a separate native module (`libVoidLoader`). This
//! crate gets that module into a JVM and forwards its lifecycle:
//!
//! - Find the module on the system library path, or extract the embedded
//!   payload into a private temp directory and load it from there
//! - Forward `agentStart`, `agentInit` and `agentCleanup` across the native
//!   boundary without ever letting a failure reach the JVM
//! - Launch the game from `versions/<name>/<name>.jar` in an isolated class
//!   loader (`voidloader-launch` binary)
//!
//! ## Loading the agent
//!
//! Build the cdylib, optionally embedding the native module:
//!
//! ```bash
//! VOIDLOADER_PAYLOAD_DIR=./native cargo build --release
//! ```
//!
//! Then load it at startup (preferred):
//!
//! ```bash
//! java -agentpath:./target/release/libvoidloader.so=<agent args> -jar game.jar
//! ```
//!
//! or attach it to a running VM with the Attach API. Attaching works, but
//! classes loaded before the attach are not seen by the native module.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │            JVM hooks (agent module)                     │
//! │   Agent_OnLoad / Agent_OnAttach / Agent_OnUnload        │
//! ├─────────────────────────────────────────────────────────┤
//! │            LifecycleBridge (lifecycle module)           │
//! │   Uninitialized -> Loaded -> Initialized -> CleanedUp   │
//! ├─────────────────────────────────────────────────────────┤
//! │   LibraryLoader (loader)     │  NativeModule (native)   │
//! │   system path, else extract  │  agentStart/Init/Cleanup │
//! ├──────────────────────────────┴──────────────────────────┤
//! │   extract + resource: temp dir, payload copy, +x bits   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`platform`] | OS detection and the fixed library file names |
//! | [`resource`] | Embedded payload table and package archives |
//! | [`extract`] | Copy a payload to a fresh temp directory and mark it executable |
//! | [`native`] | The three-call native contract over `libloading` |
//! | [`loader`] | System path first, extraction second |
//! | [`lifecycle`] | State machine owning the module and its artifact |
//! | [`agent`] | The exported JVMTI entry points |
//! | [`launcher`] | Versioned archive lookup and reflective launch |
//!
//! ## Environment
//!
//! | Variable | Used by | Meaning |
//! |----------|---------|---------|
//! | `VOIDLOADER_LIBRARY_NAME` | agent | Logical name on the system path (default `VoidLoader_agent`) |
//! | `VOIDLOADER_ARCHIVE` | agent | Jar/zip to extract the payload from |
//! | `VOIDLOADER_LOG` | both | `tracing` filter, default `info` |
//! | `VOIDLOADER_VERSIONS_DIR` | launcher | Versions directory (default `versions`) |
//! | `VOIDLOADER_JVM_OPTS` | launcher | Whitespace-separated JVM options |
//! | `JVM_LIB_PATH` | launcher | Explicit `libjvm` path |
//! | `VOIDLOADER_JAVA_HOME` / `JAVA_HOME` | launcher | JDK searched for `libjvm` |

pub mod agent;
pub mod config;
pub mod error;
pub mod extract;
pub mod launcher;
pub mod lifecycle;
pub mod loader;
pub mod native;
pub mod platform;
pub mod resource;
pub mod telemetry;

pub mod prelude;

pub use crate::error::{BootstrapError, ErrorKind, Result};
pub use crate::lifecycle::{LifecycleBridge, LifecycleState};
pub use crate::platform::Platform;
