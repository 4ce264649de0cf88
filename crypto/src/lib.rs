//! Cryptographic primitives for the Lumen governance core.
//!
//! - **Ed25519** for vote payload signing and verification
//! - **Blake2b-256** for digests (domain separators, vote digests, addresses)
//! - Address derivation with `lmn_` prefix (hashed public key + checksum)

pub mod address;
pub mod hash;
pub mod keys;
pub mod sign;

pub use address::{decode_address, derive_address, validate_address};
pub use hash::{blake2b_256, blake2b_256_multi};
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature};
