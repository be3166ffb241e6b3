//! Sync hashing of simulation state.
//!
//! Every replica hashes its world after each tick; lockstep peers compare the
//! digests to detect divergence. Traits contribute through [`SyncState`].
use std::fmt;

use sha2::{Digest, Sha256};

/// Traits whose state must agree across replicas.
pub trait SyncState {
    fn sync_state(&self, hasher: &mut SyncHasher);
}

/// Canonical little-endian writer over SHA-256.
pub struct SyncHasher {
    inner: Sha256,
}

impl SyncHasher {
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.inner.update([value]);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(value as u8);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.inner.update(value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.inner.update(value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.inner.update(value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.inner.update(value.to_le_bytes());
    }

    /// Length-prefixed so adjacent strings cannot alias.
    pub fn write_str(&mut self, value: &str) {
        self.write_u32(value.len() as u32);
        self.write_bytes(value.as_bytes());
    }

    pub fn finish(self) -> SyncHash {
        SyncHash(self.inner.finalize().into())
    }
}

impl Default for SyncHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SyncHash(pub [u8; 32]);

impl SyncHash {
    /// Leading 8 bytes as an integer, for compact logging.
    pub fn short(&self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.0[..8]);
        u64::from_be_bytes(bytes)
    }
}

impl fmt::Display for SyncHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for SyncHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SyncHash({:016x})", self.short())
    }
}
