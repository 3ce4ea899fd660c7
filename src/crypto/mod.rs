//! Cryptography module - block identity bytes and BLAKE3 derivation

mod hash;

pub use hash::*;
