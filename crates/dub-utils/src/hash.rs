use std::path::Path;

use crate::error::{HashError, HashResult};

/// Calculates the checksum of a file using `blake3`, returned as a
/// lowercase hex string. Used to key package cache entries and verify
/// downloaded archives against a registry's advertised checksum.
pub fn calculate_checksum<P: AsRef<Path>>(file_path: P) -> HashResult<String> {
    let file_path = file_path.as_ref();
    let mut hasher = blake3::Hasher::new();
    hasher
        .update_mmap(file_path)
        .map_err(|source| HashError::ReadFailed {
            path: file_path.to_path_buf(),
            source,
        })?;
    Ok(hasher.finalize().to_hex().to_string())
}

/// Verifies a file's checksum against an expected value, case-insensitively.
pub fn verify_checksum<P: AsRef<Path>>(file_path: P, expected: &str) -> HashResult<bool> {
    let actual = calculate_checksum(file_path)?;
    Ok(actual.eq_ignore_ascii_case(expected))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::{calculate_checksum, verify_checksum};

    #[test]
    fn calculates_checksum() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello world\n").unwrap();
        let checksum = calculate_checksum(file.path()).unwrap();
        assert_eq!(checksum.len(), 64);
    }

    #[test]
    fn verifies_matching_checksum() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"package contents").unwrap();
        let checksum = calculate_checksum(file.path()).unwrap();
        assert!(verify_checksum(file.path(), &checksum.to_uppercase()).unwrap());
    }

    #[test]
    fn rejects_mismatched_checksum() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"package contents").unwrap();
        assert!(!verify_checksum(file.path(), "deadbeef").unwrap());
    }

    #[test]
    fn errors_on_missing_file() {
        assert!(calculate_checksum("/nonexistent/path/to/file").is_err());
    }
}
