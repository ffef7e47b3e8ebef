//! String digests.

use std::str::FromStr;

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::errors::AppError;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// MD5 (128-bit).
    #[default]
    Md5,
    /// SHA-1 (160-bit).
    Sha1,
    /// SHA-256.
    Sha256,
}

impl FromStr for HashAlgorithm {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha256" => Ok(HashAlgorithm::Sha256),
            other => Err(AppError::InvalidValue(format!("unknown hash type: {other}"))),
        }
    }
}

/// Hex digest of the UTF-8 bytes of `s`.
pub fn hash_str(s: &str, algorithm: HashAlgorithm) -> String {
    match algorithm {
        HashAlgorithm::Md5 => hex_digest::<Md5>(s.as_bytes()),
        HashAlgorithm::Sha1 => hex_digest::<Sha1>(s.as_bytes()),
        HashAlgorithm::Sha256 => hex_digest::<Sha256>(s.as_bytes()),
    }
}

fn hex_digest<D: Digest>(bytes: &[u8]) -> String {
    D::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digests() {
        assert_eq!(
            hash_str("abc", HashAlgorithm::Md5),
            "900150983cd24fb0d6963f7d28e17f72"
        );
        assert_eq!(
            hash_str("abc", HashAlgorithm::Sha1),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            hash_str("abc", HashAlgorithm::Sha256),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_unknown_algorithm_is_rejected() {
        let err = "crc32".parse::<HashAlgorithm>().unwrap_err();
        assert_eq!(err.code(), "INVALID_VALUE");
        assert_eq!("SHA1".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha1);
    }
}
