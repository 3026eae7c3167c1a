//! Artifact hashing for change detection.
//!
//! The server identifies deployment content by the SHA-1 of the uploaded
//! archive, so the local side hashes the archive the same way and compares
//! hex strings.

use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::Result;

/// Read buffer size used while hashing.
const BLOCK_SIZE: usize = 64 * 1024;

/// Hasher for computing artifact content hashes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArtifactHasher;

impl ArtifactHasher {
    /// Creates a new artifact hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the SHA-1 of a file's bytes as lowercase hex.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn sha1_file(&self, path: impl AsRef<Path>) -> Result<String> {
        let mut file = File::open(path.as_ref())?;
        let mut hasher = Sha1::new();
        let mut buffer = vec![0u8; BLOCK_SIZE];

        loop {
            let read = file.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(hex::encode(hasher.finalize()))
    }

    /// Computes the SHA-1 of an in-memory buffer as lowercase hex.
    #[must_use]
    pub fn sha1_bytes(&self, data: &[u8]) -> String {
        hex::encode(Sha1::digest(data))
    }

    /// Computes a short hash (first 8 characters) for display purposes.
    #[must_use]
    pub fn short_hash(hash: &str) -> String {
        hash.chars().take(8).collect()
    }

    /// Compares two hex hashes, ignoring ASCII case.
    #[must_use]
    pub fn hashes_match(hash1: &str, hash2: &str) -> bool {
        // Constant-time over equal lengths
        if hash1.len() != hash2.len() {
            return false;
        }

        hash1
            .bytes()
            .zip(hash2.bytes())
            .fold(0u8, |acc, (a, b)| {
                acc | (a.to_ascii_lowercase() ^ b.to_ascii_lowercase())
            })
            == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sha1_known_value() {
        let hasher = ArtifactHasher::new();

        assert_eq!(
            hasher.sha1_bytes(b"abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn test_sha1_file_matches_bytes() {
        let hasher = ArtifactHasher::new();
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        // Larger than one block
        let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        file.write_all(&content).expect("Failed to write temp file");

        let from_file = hasher.sha1_file(file.path()).expect("hash should succeed");
        assert_eq!(from_file, hasher.sha1_bytes(&content));
        assert_eq!(from_file.len(), 40);
    }

    #[test]
    fn test_sha1_missing_file() {
        let hasher = ArtifactHasher::new();
        assert!(hasher.sha1_file("/nonexistent/hello.war").is_err());
    }

    #[test]
    fn test_short_hash() {
        let short = ArtifactHasher::short_hash("abcdef1234567890abcdef1234567890");

        assert_eq!(short, "abcdef12");
    }

    #[test]
    fn test_hashes_match() {
        assert!(ArtifactHasher::hashes_match("abc123", "abc123"));
        assert!(ArtifactHasher::hashes_match("ABC123", "abc123"));
        assert!(!ArtifactHasher::hashes_match("abc123", "abc124"));
        assert!(!ArtifactHasher::hashes_match("abc123", "abc12"));
    }
}
