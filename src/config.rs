//! Environment-driven configuration for the agent and the launcher.

use std::path::PathBuf;

use crate::platform::SYSTEM_LIBRARY_NAME;

pub const LIBRARY_NAME_VAR: &str = "VOIDLOADER_LIBRARY_NAME";
pub const ARCHIVE_VAR: &str = "VOIDLOADER_ARCHIVE";
pub const LOG_VAR: &str = "VOIDLOADER_LOG";
pub const VERSIONS_DIR_VAR: &str = "VOIDLOADER_VERSIONS_DIR";
pub const JVM_OPTS_VAR: &str = "VOIDLOADER_JVM_OPTS";
pub const JAVA_HOME_VAR: &str = "VOIDLOADER_JAVA_HOME";
/// Explicit `libjvm` path, shared with other JVM embedders.
pub const JVM_LIB_PATH_VAR: &str = "JVM_LIB_PATH";
pub const SYSTEM_JAVA_HOME_VAR: &str = "JAVA_HOME";

const DEFAULT_LOG_FILTER: &str = "info";

/// Fully-qualified name of the game's entry class.
pub const ENTRY_CLASS: &str = "net.minecraft.client.main.Main";

/// Extension of versioned game archives.
pub const ARCHIVE_EXTENSION: &str = "jar";

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Settings for the bootstrap agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Logical name looked up on the system library path.
    pub system_library: String,
    /// Package archive to extract the payload from; the compiled-in table
    /// is used when unset.
    pub archive: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            system_library: SYSTEM_LIBRARY_NAME.to_string(),
            archive: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl BootstrapConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            system_library: non_empty(lookup(LIBRARY_NAME_VAR)).unwrap_or(defaults.system_library),
            archive: non_empty(lookup(ARCHIVE_VAR)).map(PathBuf::from),
            log_filter: non_empty(lookup(LOG_VAR)).unwrap_or(defaults.log_filter),
        }
    }
}

/// Settings for the versioned game launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherConfig {
    /// Directory, relative to the working directory, holding `<name>/<name>.jar`.
    pub versions_dir: PathBuf,
    pub archive_extension: String,
    pub entry_class: String,
    pub jvm_options: Vec<String>,
    /// `libjvm` to load; takes precedence over `java_home`.
    pub jvm_library: Option<PathBuf>,
    /// JDK or JRE home searched for `libjvm`.
    pub java_home: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            versions_dir: PathBuf::from("versions"),
            archive_extension: ARCHIVE_EXTENSION.to_string(),
            entry_class: ENTRY_CLASS.to_string(),
            jvm_options: Vec::new(),
            jvm_library: None,
            java_home: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl LauncherConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            versions_dir: non_empty(lookup(VERSIONS_DIR_VAR))
                .map(PathBuf::from)
                .unwrap_or(defaults.versions_dir),
            jvm_options: lookup(JVM_OPTS_VAR)
                .map(|opts| opts.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            jvm_library: non_empty(lookup(JVM_LIB_PATH_VAR)).map(PathBuf::from),
            java_home: non_empty(lookup(JAVA_HOME_VAR))
                .or_else(|| non_empty(lookup(SYSTEM_JAVA_HOME_VAR)))
                .map(PathBuf::from),
            log_filter: non_empty(lookup(LOG_VAR)).unwrap_or(defaults.log_filter),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn bootstrap_defaults_when_unset() {
        let config = BootstrapConfig::from_lookup(|_| None);
        assert_eq!(config, BootstrapConfig::default());
        assert_eq!(config.system_library, "VoidLoader_agent");
    }

    #[test]
    fn bootstrap_reads_overrides_and_ignores_blank_values() {
        let config = BootstrapConfig::from_lookup(lookup(&[
            (LIBRARY_NAME_VAR, "custom_agent"),
            (ARCHIVE_VAR, "/opt/voidloader/agent.jar"),
            (LOG_VAR, "  "),
        ]));
        assert_eq!(config.system_library, "custom_agent");
        assert_eq!(config.archive, Some(PathBuf::from("/opt/voidloader/agent.jar")));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn launcher_splits_jvm_options() {
        let config = LauncherConfig::from_lookup(lookup(&[
            (JVM_OPTS_VAR, "-Xmx2G  -Dfoo=bar"),
            (VERSIONS_DIR_VAR, "game/versions"),
        ]));
        assert_eq!(config.jvm_options, vec!["-Xmx2G", "-Dfoo=bar"]);
        assert_eq!(config.versions_dir, PathBuf::from("game/versions"));
        assert_eq!(config.entry_class, ENTRY_CLASS);
        assert_eq!(config.archive_extension, "jar");
        assert_eq!(config.java_home, None);
    }

    #[test]
    fn launcher_java_home_override_beats_system_java_home() {
        let config = LauncherConfig::from_lookup(lookup(&[
            (SYSTEM_JAVA_HOME_VAR, "/usr/lib/jvm/default"),
            (JAVA_HOME_VAR, "/opt/jdk-17"),
        ]));
        assert_eq!(config.java_home, Some(PathBuf::from("/opt/jdk-17")));

        let config = LauncherConfig::from_lookup(lookup(&[
            (SYSTEM_JAVA_HOME_VAR, "/usr/lib/jvm/default"),
            (JVM_LIB_PATH_VAR, "/opt/jvm/libjvm.so"),
        ]));
        assert_eq!(config.java_home, Some(PathBuf::from("/usr/lib/jvm/default")));
        assert_eq!(config.jvm_library, Some(PathBuf::from("/opt/jvm/libjvm.so")));
    }
}
