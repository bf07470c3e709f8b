//! Hashing and block-signature primitives for the stake kernel
//!
//! The hash function underlying both the kernel hash and candidate
//! selection is double SHA-256. Block signatures are 65-byte compact
//! recoverable ECDSA signatures over the block hash; verification
//! recovers the public key and compares its key id against the one the
//! staked output pays to.

use ripemd::Ripemd160;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1, VerifyOnly};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::Hash;

/// Thread-local secp256k1 context for signature recovery
///
/// The context is stateless and thread-safe for verification-only
/// operations; reusing one avoids rebuilding it per signature.
thread_local! {
    static SECP256K1_CONTEXT: Secp256k1<VerifyOnly> = Secp256k1::verification_only();
}

/// Single SHA-256 hash.
pub fn sha256(data: &[u8]) -> Hash {
    let mut result = [0u8; 32];
    result.copy_from_slice(&Sha256::digest(data));
    result
}

/// Double SHA-256 (the block-hash and kernel-hash function).
pub fn hash256(data: &[u8]) -> Hash {
    sha256(&sha256(data))
}

/// RIPEMD160(SHA256(data)), the key-id hash.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let mut result = [0u8; 20];
    result.copy_from_slice(&Ripemd160::digest(Sha256::digest(data)));
    result
}

/// Identifier of a public key: the 20-byte hash of its serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyId(pub [u8; 20]);

impl KeyId {
    /// Key id of a serialized public key.
    pub fn from_pubkey(pubkey: &[u8]) -> Self {
        KeyId(hash160(pubkey))
    }

    /// Key id from raw bytes, as embedded in a pay-to-pubkey-hash script.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() == 20 {
            let mut id = [0u8; 20];
            id.copy_from_slice(bytes);
            Some(KeyId(id))
        } else {
            None
        }
    }
}

/// Verify a compact recoverable block signature against a key id.
///
/// Layout: one header byte in 27..=34 (recovery id in the low two bits,
/// bit 2 marking a compressed public key), followed by the 64-byte
/// signature. The recovered key must hash to `key_id` under the
/// serialization the header byte names.
pub fn verify_block_signature(key_id: &KeyId, message_hash: &Hash, signature: &[u8]) -> bool {
    if signature.len() != 65 {
        return false;
    }
    let header = signature[0];
    if !(27..=34).contains(&header) {
        return false;
    }
    let compressed = (header - 27) & 4 != 0;

    let Ok(recovery_id) = RecoveryId::from_i32(i32::from((header - 27) & 3)) else {
        return false;
    };
    let Ok(recoverable) = RecoverableSignature::from_compact(&signature[1..], recovery_id) else {
        return false;
    };

    let message = Message::from_digest(*message_hash);
    let Some(pubkey) =
        SECP256K1_CONTEXT.with(|secp| secp.recover_ecdsa(&message, &recoverable).ok())
    else {
        return false;
    };

    let recovered = if compressed {
        KeyId::from_pubkey(&pubkey.serialize())
    } else {
        KeyId::from_pubkey(&pubkey.serialize_uncompressed())
    };
    recovered == *key_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::SecretKey;

    fn test_keypair() -> (SecretKey, secp256k1::PublicKey) {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&[0x42; 32]).unwrap();
        let pubkey = secret.public_key(&secp);
        (secret, pubkey)
    }

    /// Sign the way a staking wallet does: compact recoverable signature
    /// with the conventional header byte.
    fn sign_compact(secret: &SecretKey, message_hash: &Hash, compressed: bool) -> Vec<u8> {
        let secp = Secp256k1::new();
        let message = Message::from_digest(*message_hash);
        let recoverable = secp.sign_ecdsa_recoverable(&message, secret);
        let (recovery_id, body) = recoverable.serialize_compact();
        let mut signature = Vec::with_capacity(65);
        signature.push(27 + recovery_id.to_i32() as u8 + if compressed { 4 } else { 0 });
        signature.extend_from_slice(&body);
        signature
    }

    #[test]
    fn test_sha256_empty_vector() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash256_is_double_sha256() {
        let data = b"stake";
        assert_eq!(hash256(data), sha256(&sha256(data)));
    }

    #[test]
    fn test_hash160_known_vector() {
        // hash160 of the empty string
        assert_eq!(
            hex::encode(hash160(b"")),
            "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"
        );
    }

    #[test]
    fn test_key_id_from_slice_length_check() {
        assert!(KeyId::from_slice(&[0u8; 20]).is_some());
        assert!(KeyId::from_slice(&[0u8; 19]).is_none());
        assert!(KeyId::from_slice(&[0u8; 21]).is_none());
    }

    #[test]
    fn test_verify_compressed_signature() {
        let (secret, pubkey) = test_keypair();
        let message = hash256(b"block");
        let signature = sign_compact(&secret, &message, true);
        let key_id = KeyId::from_pubkey(&pubkey.serialize());
        assert!(verify_block_signature(&key_id, &message, &signature));
    }

    #[test]
    fn test_verify_uncompressed_signature() {
        let (secret, pubkey) = test_keypair();
        let message = hash256(b"block");
        let signature = sign_compact(&secret, &message, false);
        let key_id = KeyId::from_pubkey(&pubkey.serialize_uncompressed());
        assert!(verify_block_signature(&key_id, &message, &signature));
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let (secret, _) = test_keypair();
        let message = hash256(b"block");
        let signature = sign_compact(&secret, &message, true);
        let other = KeyId([0x13; 20]);
        assert!(!verify_block_signature(&other, &message, &signature));
    }

    #[test]
    fn test_verify_rejects_wrong_message() {
        let (secret, pubkey) = test_keypair();
        let signature = sign_compact(&secret, &hash256(b"block"), true);
        let key_id = KeyId::from_pubkey(&pubkey.serialize());
        assert!(!verify_block_signature(&key_id, &hash256(b"other"), &signature));
    }

    #[test]
    fn test_verify_rejects_malformed_signature() {
        let key_id = KeyId([0u8; 20]);
        let message = [0u8; 32];
        assert!(!verify_block_signature(&key_id, &message, &[]));
        assert!(!verify_block_signature(&key_id, &message, &[0u8; 64]));
        let mut bad_header = vec![0u8; 65];
        bad_header[0] = 26;
        assert!(!verify_block_signature(&key_id, &message, &bad_header));
        bad_header[0] = 35;
        assert!(!verify_block_signature(&key_id, &message, &bad_header));
    }

    #[test]
    fn test_verify_rejects_compression_flag_mismatch() {
        let (secret, pubkey) = test_keypair();
        let message = hash256(b"block");
        // signed claiming uncompressed, checked against the compressed id
        let signature = sign_compact(&secret, &message, false);
        let key_id = KeyId::from_pubkey(&pubkey.serialize());
        assert!(!verify_block_signature(&key_id, &message, &signature));
    }
}
