//! P2P module - initial peer seeding

mod seeds;

pub use seeds::*;
