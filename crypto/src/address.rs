//! Member address derivation from public keys.
//!
//! Address format: `lmn_` + hex(account_id, 40 chars) + hex(checksum, 8 chars)
//!
//! Account id: last 20 bytes of Blake2b-256(public_key) — the address commits
//! to the key without revealing it, so signed vote payloads must carry the
//! public key alongside the claimed address.
//! Checksum: first 4 bytes of Blake2b-256(account_id).
//! Total address length: 4 (prefix) + 40 + 8 = 52 characters.

use lumen_types::{MemberAddress, PublicKey};

/// Prefix for all Lumen addresses.
const PREFIX: &str = "lmn_";
/// Hex characters for the 20-byte account id.
const ACCOUNT_CHARS: usize = 40;
/// Hex characters for the 4-byte checksum.
const CHECKSUM_CHARS: usize = 8;

/// Derive an `lmn_`-prefixed member address from a public key.
///
/// Process:
/// 1. account_id = Blake2b-256(public_key)[12..32]
/// 2. checksum = Blake2b-256(account_id)[0..4]
/// 3. Address = "lmn_" + hex(account_id) + hex(checksum)
pub fn derive_address(public_key: &PublicKey) -> MemberAddress {
    let key_hash = crate::blake2b_256(public_key.as_bytes());
    let account_id = &key_hash[12..32];
    let checksum = &crate::blake2b_256(account_id)[..4];
    MemberAddress::new(format!(
        "{}{}{}",
        PREFIX,
        hex::encode(account_id),
        hex::encode(checksum)
    ))
}

/// Extract the 20-byte account id from an address string.
///
/// Returns `None` if the address is malformed or has an invalid checksum.
pub fn decode_address(address: &str) -> Option<[u8; 20]> {
    let encoded = address.strip_prefix(PREFIX)?;
    if encoded.len() != ACCOUNT_CHARS + CHECKSUM_CHARS {
        return None;
    }

    let mut account_id = [0u8; 20];
    hex::decode_to_slice(&encoded[..ACCOUNT_CHARS], &mut account_id).ok()?;
    let mut checksum = [0u8; 4];
    hex::decode_to_slice(&encoded[ACCOUNT_CHARS..], &mut checksum).ok()?;

    if checksum != crate::blake2b_256(&account_id)[..4] {
        return None;
    }
    Some(account_id)
}

/// Validate that an address string is well-formed and its checksum is correct.
pub fn validate_address(address: &str) -> bool {
    decode_address(address).is_some()
}
