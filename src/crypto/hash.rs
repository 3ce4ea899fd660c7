//! Block identity bytes and BLAKE3 hashing
//!
//! Block signatures are opaque byte strings. The only signature this core
//! ever computes itself is the genesis signature, derived with BLAKE3.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a block signature in bytes
pub const SIGNATURE_LENGTH: usize = 64;

/// Opaque block identity (and parent reference)
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockSignature(pub Vec<u8>);

impl BlockSignature {
    /// All-zero signature, used as the genesis block's reference
    pub fn zero() -> Self {
        BlockSignature(vec![0u8; SIGNATURE_LENGTH])
    }

    /// Create signature from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        BlockSignature(bytes.to_vec())
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Get as bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Abbreviated hex form for log lines
    pub fn short(&self) -> String {
        let hex = self.to_hex();
        hex.chars().take(16).collect()
    }
}

impl fmt::Debug for BlockSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockSignature({})", self.short())
    }
}

impl fmt::Display for BlockSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Default for BlockSignature {
    fn default() -> Self {
        Self::zero()
    }
}

/// Derive a full-length signature from arbitrary bytes using BLAKE3's
/// extendable output.
pub fn derive_signature(data: &[u8]) -> BlockSignature {
    let mut hasher = blake3::Hasher::new();
    hasher.update(data);
    let mut out = vec![0u8; SIGNATURE_LENGTH];
    hasher.finalize_xof().fill(&mut out);
    BlockSignature(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_signature_deterministic() {
        let sig1 = derive_signature(b"genesis");
        let sig2 = derive_signature(b"genesis");
        assert_eq!(sig1, sig2);
        assert_eq!(sig1.as_bytes().len(), SIGNATURE_LENGTH);
    }

    #[test]
    fn test_derive_signature_different_inputs() {
        assert_ne!(derive_signature(b"hello"), derive_signature(b"world"));
    }

    #[test]
    fn test_zero_signature() {
        let zero = BlockSignature::zero();
        assert!(zero.as_bytes().iter().all(|b| *b == 0));
    }

    #[test]
    fn test_hex_display() {
        let sig = BlockSignature::from_bytes(&[0x00, 0xff, 0x10]);
        assert_eq!(sig.to_hex(), "00ff10");
        assert_eq!(sig.to_string(), "00ff10");
        assert_eq!(derive_signature(b"x").short().len(), 16);
    }
}
