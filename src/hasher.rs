//! Digest functions the tree can be built over
use sha2::{Digest, Sha256};

/// Thread safety marker trait
#[cfg(feature = "multi-thread")]
pub trait ThreadSafe: Send + Sync {}
#[cfg(feature = "multi-thread")]
impl<T: Send + Sync> ThreadSafe for T {}

#[cfg(not(feature = "multi-thread"))]
pub trait ThreadSafe {}
#[cfg(not(feature = "multi-thread"))]
impl<T> ThreadSafe for T {}

/// Digest function owned by a tree. Both the keys and the inner nodes are hashed with it.
///
/// # Type Parameters
/// * `HASH_SIZE` - The size of the hash digest in bytes, which fixes the tree height to
///   `8 * HASH_SIZE`.
pub trait Hasher<const HASH_SIZE: usize>: ThreadSafe {
    fn hash(&self, data: &[u8]) -> [u8; HASH_SIZE];
}

impl Hasher<32> for Sha256 {
    fn hash(&self, data: &[u8]) -> [u8; 32] {
        Sha256::digest(data).into()
    }
}

/// Double SHA-256: `sha256(sha256(data))`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dsha256;

impl Hasher<32> for Dsha256 {
    fn hash(&self, data: &[u8]) -> [u8; 32] {
        Sha256::digest(Sha256::digest(data)).into()
    }
}

/// Keeps the first `N` bytes of a wider digest.
///
/// Useful to build small trees whose every level can be checked by hand, e.g. a 24-bit tree
/// with `Truncated<Dsha256, 32, 3>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Truncated<H, const FROM: usize, const N: usize>(pub H);

impl<H: Hasher<FROM>, const FROM: usize, const N: usize> Hasher<N> for Truncated<H, FROM, N> {
    fn hash(&self, data: &[u8]) -> [u8; N] {
        const {
            assert!(N <= FROM, "digest too short to truncate");
        };
        let full = self.0.hash(data);
        let mut out = [0u8; N];
        out.copy_from_slice(&full[..N]);
        out
    }
}
