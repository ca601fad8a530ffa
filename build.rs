//! Generates the embedded payload table.
//!
//! When `VOIDLOADER_PAYLOAD_DIR` points at a directory holding the native
//! module for the target OS, its bytes are compiled into the agent and used
//! as the extraction fallback. Without it the table is empty.

use std::env;
use std::fs;
use std::path::PathBuf;

const PAYLOAD_DIR_VAR: &str = "VOIDLOADER_PAYLOAD_DIR";

fn payload_file_name(target_os: &str) -> &'static str {
    match target_os {
        "windows" => "libVoidLoader.dll",
        "macos" | "ios" => "libVoidLoader.dylib",
        _ => "libVoidLoader.so",
    }
}

fn main() {
    println!("cargo:rerun-if-env-changed={PAYLOAD_DIR_VAR}");
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let name = payload_file_name(&target_os);

    let mut entries = String::new();
    if let Some(dir) = env::var_os(PAYLOAD_DIR_VAR) {
        let candidate = PathBuf::from(dir).join(name);
        if candidate.is_file() {
            let absolute = fs::canonicalize(&candidate).unwrap_or(candidate);
            println!("cargo:rerun-if-changed={}", absolute.display());
            entries.push_str(&format!(
                "    ({name:?}, include_bytes!({:?})),\n",
                absolute.display().to_string()
            ));
        } else {
            println!(
                "cargo:warning={PAYLOAD_DIR_VAR} is set but {} is missing; building without an embedded payload",
                candidate.display()
            );
        }
    }

    let generated = format!(
        "pub(crate) static EMBEDDED_PAYLOADS: &[(&str, &[u8])] = &[\n{entries}];\n"
    );
    fs::write(out_dir.join("embedded_payloads.rs"), generated)
        .expect("write embedded payload table");
}
