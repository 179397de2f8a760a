use std::io::Read;
use std::path::Path;

use notary_types::DocumentHash;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Deterministic SHA-256 content hasher.
///
/// The digest is computed over the raw bytes only: no domain tag, no file
/// name, no metadata. Registration and verification must reproduce the
/// same digest bit for bit on any machine, and third parties must be able
/// to recompute it with a stock `sha256sum`.
pub struct ContentHasher;

impl ContentHasher {
    /// Read size used by the streaming variants.
    pub const CHUNK_SIZE: usize = 64 * 1024;

    /// Hash an in-memory buffer.
    pub fn hash(data: &[u8]) -> DocumentHash {
        DocumentHash::from_digest(Sha256::digest(data).into())
    }

    /// Hash a blocking reader until EOF.
    pub fn hash_reader<R: Read>(mut reader: R) -> Result<DocumentHash, HasherError> {
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; Self::CHUNK_SIZE];
        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }
        Ok(DocumentHash::from_digest(hasher.finalize().into()))
    }

    /// Hash an async reader until EOF.
    ///
    /// Returns the digest together with the number of bytes consumed.
    pub async fn hash_async<R: AsyncRead + Unpin>(
        mut reader: R,
    ) -> Result<(DocumentHash, u64), HasherError> {
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; Self::CHUNK_SIZE];
        let mut total = 0u64;
        loop {
            let n = reader.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
            total += n as u64;
        }
        Ok((DocumentHash::from_digest(hasher.finalize().into()), total))
    }

    /// Hash a file on disk.
    pub async fn hash_file(path: impl AsRef<Path>) -> Result<DocumentHash, HasherError> {
        let file = tokio::fs::File::open(path).await?;
        let (hash, _) = Self::hash_async(file).await?;
        Ok(hash)
    }

    /// Verify that data produces the expected digest.
    pub fn verify(data: &[u8], expected: &DocumentHash) -> bool {
        Self::hash(data) == *expected
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error)]
pub enum HasherError {
    #[error("failed to read content: {0}")]
    Io(#[from] std::io::Error),
}
