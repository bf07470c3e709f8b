//! Output-script solver for stake key extraction
//!
//! The kernel only ever needs to answer one question about a script:
//! which key owns the staked output. That limits the solver to the two
//! standard shapes a coinstake may spend; everything else is an
//! unsupported stake type.

use crate::types::ByteString;

const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;

/// Recognized output-script shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptType {
    /// OP_DUP OP_HASH160 <20-byte key hash> OP_EQUALVERIFY OP_CHECKSIG
    PubKeyHash,
    /// <33- or 65-byte public key> OP_CHECKSIG
    PubKey,
    /// Anything else; not stakeable.
    NonStandard,
}

/// Classify an output script and extract its solution bytes: the key
/// hash for pay-to-pubkey-hash, the raw public key for pay-to-pubkey.
pub fn solve_script(script: &[u8]) -> (ScriptType, Vec<ByteString>) {
    if script.len() == 25
        && script[0] == OP_DUP
        && script[1] == OP_HASH160
        && script[2] == 20
        && script[23] == OP_EQUALVERIFY
        && script[24] == OP_CHECKSIG
    {
        return (ScriptType::PubKeyHash, vec![script[3..23].to_vec()]);
    }

    let p2pk_compressed = script.len() == 35 && script[0] == 33;
    let p2pk_uncompressed = script.len() == 67 && script[0] == 65;
    if (p2pk_compressed || p2pk_uncompressed) && script[script.len() - 1] == OP_CHECKSIG {
        return (ScriptType::PubKey, vec![script[1..script.len() - 1].to_vec()]);
    }

    (ScriptType::NonStandard, Vec::new())
}

/// Build a pay-to-pubkey-hash script for a key hash.
pub fn pay_to_pubkey_hash(key_hash: &[u8; 20]) -> ByteString {
    let mut script = Vec::with_capacity(25);
    script.push(OP_DUP);
    script.push(OP_HASH160);
    script.push(20);
    script.extend_from_slice(key_hash);
    script.push(OP_EQUALVERIFY);
    script.push(OP_CHECKSIG);
    script
}

/// Build a pay-to-pubkey script for a serialized public key.
pub fn pay_to_pubkey(pubkey: &[u8]) -> ByteString {
    debug_assert!(pubkey.len() == 33 || pubkey.len() == 65);
    let mut script = Vec::with_capacity(pubkey.len() + 2);
    script.push(pubkey.len() as u8);
    script.extend_from_slice(pubkey);
    script.push(OP_CHECKSIG);
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_pay_to_pubkey_hash() {
        let key_hash = [0x5a; 20];
        let script = pay_to_pubkey_hash(&key_hash);
        let (shape, solutions) = solve_script(&script);
        assert_eq!(shape, ScriptType::PubKeyHash);
        assert_eq!(solutions, vec![key_hash.to_vec()]);
    }

    #[test]
    fn test_solve_pay_to_pubkey_compressed() {
        let pubkey = [0x02; 33];
        let script = pay_to_pubkey(&pubkey);
        let (shape, solutions) = solve_script(&script);
        assert_eq!(shape, ScriptType::PubKey);
        assert_eq!(solutions, vec![pubkey.to_vec()]);
    }

    #[test]
    fn test_solve_pay_to_pubkey_uncompressed() {
        let pubkey = [0x04; 65];
        let script = pay_to_pubkey(&pubkey);
        let (shape, solutions) = solve_script(&script);
        assert_eq!(shape, ScriptType::PubKey);
        assert_eq!(solutions, vec![pubkey.to_vec()]);
    }

    #[test]
    fn test_solve_rejects_nonstandard() {
        // pay-to-script-hash shape
        let mut p2sh = vec![OP_HASH160, 20];
        p2sh.extend_from_slice(&[0x11; 20]);
        p2sh.push(0x87); // OP_EQUAL
        assert_eq!(solve_script(&p2sh).0, ScriptType::NonStandard);

        assert_eq!(solve_script(&[]).0, ScriptType::NonStandard);

        // truncated pay-to-pubkey-hash
        let script = pay_to_pubkey_hash(&[0x5a; 20]);
        assert_eq!(solve_script(&script[..24]).0, ScriptType::NonStandard);

        // pubkey push length disagreeing with script length
        let mut bad = pay_to_pubkey(&[0x02; 33]);
        bad[0] = 65;
        assert_eq!(solve_script(&bad).0, ScriptType::NonStandard);
    }
}
