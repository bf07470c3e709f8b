//! Core chain types as consumed by the stake kernel
//!
//! The chain index owns all block data; the kernel reads it through
//! non-owning references and the caller-owned [`BlockIndex`] / [`TxIndex`]
//! maps, and never mutates either.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Hash type: 256-bit hash, internal byte order.
pub type Hash = [u8; 32];

/// Byte string type.
pub type ByteString = Vec<u8>;

/// Block hash: newtype wrapper for type safety
///
/// Prevents mixing up block hashes with other `Hash` values (e.g.
/// transaction hashes). Uses `#[repr(transparent)]` for zero-cost
/// abstraction - same memory layout as `Hash`.
#[repr(transparent)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BlockHash(pub Hash);

impl BlockHash {
    /// Create a new BlockHash from a Hash
    #[inline]
    pub fn new(hash: Hash) -> Self {
        BlockHash(hash)
    }

    /// Get the inner Hash value
    #[inline]
    pub fn as_hash(self) -> Hash {
        self.0
    }

    /// Get a reference to the inner Hash
    #[inline]
    pub fn as_hash_ref(&self) -> &Hash {
        &self.0
    }
}

impl From<Hash> for BlockHash {
    #[inline]
    fn from(hash: Hash) -> Self {
        BlockHash(hash)
    }
}

impl From<BlockHash> for Hash {
    #[inline]
    fn from(hash: BlockHash) -> Self {
        hash.0
    }
}

impl std::ops::Deref for BlockHash {
    type Target = Hash;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_hash(&self.0))
    }
}

/// Render a hash in the conventional reversed-hex display order.
pub(crate) fn format_hash(hash: &Hash) -> String {
    let mut out = String::with_capacity(64);
    for byte in hash.iter().rev() {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Identifies one transaction output: transaction hash plus output index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: u32,
}

/// A transaction output: satoshi amount and locking script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: i64,
    pub script_pubkey: ByteString,
}

/// A transaction, in the shape the kernel consumes: the kernel only ever
/// reads the outputs of the transaction whose output is being staked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
}

/// One block of the chain index, as consumed by the kernel.
///
/// `hash`, `height` and the flag fields are index-owned facts about the
/// block; `prev` is the back-reference that threads the chain. For a
/// proof-of-stake block, `stake_input` names the staked outpoint and
/// `pos_block_sig` signs the block hash with the key owning it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub hash: BlockHash,
    pub prev: Option<BlockHash>,
    pub height: u64,
    /// Unix seconds, consensus width.
    pub time: u32,
    /// Compact-encoded 256-bit difficulty target.
    pub bits: u32,
    /// Kernel hash recorded when the block was accepted as proof-of-stake.
    pub proof_hash: Hash,
    /// Rolling 64-bit stake modifier associated with the block.
    pub stake_modifier: u64,
    pub is_proof_of_stake: bool,
    /// Whether this block regenerated the stake modifier.
    pub is_generated_stake_modifier: bool,
    /// Single entropy bit this block contributes to modifier selection.
    pub stake_entropy_bit: bool,
    pub stake_input: Option<OutPoint>,
    pub pos_block_sig: ByteString,
}

/// Block index: block hash to header, owned by the caller and read-only
/// for the kernel.
pub type BlockIndex = HashMap<BlockHash, BlockHeader>;

/// Transaction lookup: transaction hash to the transaction and the hash
/// of its containing block.
pub type TxIndex = HashMap<Hash, (Transaction, BlockHash)>;
