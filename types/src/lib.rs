//! Fundamental types for the Lumen governance core.
//!
//! This crate defines the types shared by every other crate in the
//! workspace: member addresses, timestamps, and Ed25519 key material.

pub mod address;
pub mod keys;
pub mod time;

pub use address::MemberAddress;
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use time::Timestamp;
