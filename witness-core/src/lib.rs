//! Witness Core - Entity Types
//!
//! Pure data structures for transcript forensics. All other crates depend on
//! this. Pattern compilation and the detection pipeline live in
//! `witness-analyzer`.

use sha2::{Digest, Sha256};

pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod rules;

pub use config::*;
pub use entities::*;
pub use enums::*;
pub use error::*;
pub use rules::*;

/// Compute the lowercase hex SHA-256 of raw transcript content.
pub fn compute_transcript_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_digest_is_stable_hex() {
        let digest = compute_transcript_digest("");
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(compute_transcript_digest("abc"), compute_transcript_digest("abc"));
        assert_ne!(compute_transcript_digest("abc"), compute_transcript_digest("abd"));
    }
}
