//! Platform detection and the fixed native library naming table.

/// Host platforms the native module is built for.
///
/// Anything that is neither Windows nor macOS is treated as Linux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    Windows,
    MacOs,
}

/// Logical name of a pre-installed module on the system library path.
pub const SYSTEM_LIBRARY_NAME: &str = "VoidLoader_agent";

/// Prefix of the directories created for extracted payloads.
pub const TEMP_PREFIX: &str = "VoidLoader_";

const LIBRARY_FILE_NAMES: [(Platform, &str); 3] = [
    (Platform::Linux, "libVoidLoader.so"),
    (Platform::Windows, "libVoidLoader.dll"),
    (Platform::MacOs, "libVoidLoader.dylib"),
];

impl Platform {
    /// Classifies a free-form OS identifier such as `"Windows 11"` or `"Mac OS X"`.
    ///
    /// The match is a case-insensitive substring test: `win` wins over `mac`,
    /// and everything else falls back to Linux.
    pub fn from_os_name(os_name: &str) -> Platform {
        let os = os_name.to_ascii_lowercase();
        if os.contains("win") {
            Platform::Windows
        } else if os.contains("mac") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// The platform this crate was compiled for.
    pub fn current() -> Platform {
        match std::env::consts::OS {
            "windows" => Platform::Windows,
            "macos" | "ios" => Platform::MacOs,
            _ => Platform::Linux,
        }
    }

    /// File name of the embedded native module for this platform.
    pub fn library_file_name(self) -> &'static str {
        LIBRARY_FILE_NAMES
            .iter()
            .find(|(platform, _)| *platform == self)
            .map(|(_, name)| *name)
            .unwrap_or(LIBRARY_FILE_NAMES[0].1)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Linux => f.write_str("linux"),
            Platform::Windows => f.write_str("windows"),
            Platform::MacOs => f.write_str("macos"),
        }
    }
}

/// All file names the resolver can return, in table order.
pub fn known_library_file_names() -> impl Iterator<Item = &'static str> {
    LIBRARY_FILE_NAMES.iter().map(|(_, name)| *name)
}
