use std::collections::HashSet;
use std::fs;
use std::io::Write;

use sha2::{Digest, Sha256};
use voidloader::error::{ErrorKind, Result};
use voidloader::extract::{extract, extract_in};
use voidloader::platform::TEMP_PREFIX;
use voidloader::resource::{EmbeddedResources, ResourceSource};

static SMALL_TABLE: &[(&str, &[u8])] = &[("libVoidLoader.so", b"\x7fELF not really a library")];

/// In-memory payload larger than the copy buffer.
struct BigPayload {
    name: &'static str,
    bytes: Vec<u8>,
}

impl BigPayload {
    fn new(name: &'static str, len: usize) -> Self {
        let bytes = (0..len).map(|i| (i * 31 % 251) as u8).collect();
        Self { name, bytes }
    }
}

impl ResourceSource for BigPayload {
    fn describe(&self) -> String {
        "test payload".to_string()
    }

    fn copy_to(&self, name: &str, out: &mut dyn Write) -> Result<u64> {
        if name != self.name {
            return Err(voidloader::BootstrapError::ResourceNotFound {
                name: name.to_string(),
                source_desc: self.describe(),
            });
        }
        out.write_all(&self.bytes).expect("write payload");
        Ok(self.bytes.len() as u64)
    }
}

#[test]
fn extracts_into_a_fresh_prefixed_directory() {
    let scratch = tempfile::tempdir().unwrap();
    let source = EmbeddedResources::new(SMALL_TABLE);

    let extracted = extract_in(&source, "libVoidLoader.so", scratch.path()).unwrap();

    assert!(extracted.path().is_file());
    assert_eq!(extracted.path().parent(), Some(extracted.dir()));
    assert_eq!(extracted.dir().parent(), Some(scratch.path()));
    let dir_name = extracted.dir().file_name().unwrap().to_string_lossy().into_owned();
    assert!(dir_name.starts_with(TEMP_PREFIX), "{dir_name}");
    assert_eq!(extracted.path().file_name().unwrap(), "libVoidLoader.so");
    assert_eq!(fs::read(extracted.path()).unwrap(), SMALL_TABLE[0].1);
    assert_eq!(extracted.len(), SMALL_TABLE[0].1.len() as u64);

    // Exactly one file per extraction directory.
    assert_eq!(fs::read_dir(extracted.dir()).unwrap().count(), 1);
}

#[test]
fn repeated_extraction_yields_distinct_directories_with_identical_bytes() {
    let scratch = tempfile::tempdir().unwrap();
    let source = BigPayload::new("libVoidLoader.dll", 100_000);
    let expected = Sha256::digest(&source.bytes);

    let copies: Vec<_> = (0..5)
        .map(|_| extract_in(&source, "libVoidLoader.dll", scratch.path()).unwrap())
        .collect();

    let dirs: HashSet<_> = copies.iter().map(|c| c.dir().to_path_buf()).collect();
    assert_eq!(dirs.len(), copies.len());
    for copy in &copies {
        let bytes = fs::read(copy.path()).unwrap();
        assert_eq!(Sha256::digest(&bytes), expected);
    }
}

#[cfg(unix)]
#[test]
fn extracted_file_is_executable_by_everyone() {
    use std::os::unix::fs::PermissionsExt;

    let scratch = tempfile::tempdir().unwrap();
    let source = EmbeddedResources::new(SMALL_TABLE);
    let extracted = extract_in(&source, "libVoidLoader.so", scratch.path()).unwrap();

    let mode = fs::metadata(extracted.path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o100, 0o100, "owner execute bit missing: {mode:o}");
    assert_eq!(mode & 0o111, 0o111, "execute bits missing: {mode:o}");
}

#[test]
fn missing_resource_is_reported_and_leaves_nothing_behind() {
    let scratch = tempfile::tempdir().unwrap();
    let source = EmbeddedResources::new(&[]);

    let err = extract_in(&source, "libVoidLoader.so", scratch.path()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
    assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[test]
fn remove_is_idempotent() {
    let scratch = tempfile::tempdir().unwrap();
    let source = EmbeddedResources::new(SMALL_TABLE);
    let extracted = extract_in(&source, "libVoidLoader.so", scratch.path()).unwrap();

    assert!(extracted.remove().unwrap());
    assert!(!extracted.path().exists());
    assert!(!extracted.dir().exists());
    assert!(!extracted.remove().unwrap());
}

#[test]
fn dropping_the_extraction_removes_the_directory() {
    let scratch = tempfile::tempdir().unwrap();
    let source = EmbeddedResources::new(SMALL_TABLE);
    let extracted = extract_in(&source, "libVoidLoader.so", scratch.path()).unwrap();
    let dir = extracted.dir().to_path_buf();

    drop(extracted);
    assert!(!dir.exists());
}

#[test]
fn default_location_is_the_system_temp_dir() {
    let source = EmbeddedResources::new(SMALL_TABLE);
    let extracted = extract(&source, "/libVoidLoader.so").unwrap();

    assert_eq!(extracted.dir().parent(), Some(std::env::temp_dir().as_path()));
    assert_eq!(extracted.path().file_name().unwrap(), "libVoidLoader.so");
}
