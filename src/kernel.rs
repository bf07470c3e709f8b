//! Stake kernel verification
//!
//! A kernel is one attempt to stake an output at a timestamp. Its hash
//! binds the attempt to a stake modifier formed after the output's
//! block, and it satisfies the protocol when the hash falls below a
//! target that scales linearly with the staked amount. This module
//! builds the kernel hash, derives the target, and checks both a single
//! kernel (in check or search mode) and a whole proof-of-stake block.

use log::debug;

use crate::arith::{expand_compact, U256};
use crate::crypto::{hash256, verify_block_signature, KeyId};
use crate::error::{KernelError, Result};
use crate::modifier::compute_next_stake_modifier;
use crate::params::NetworkParams;
use crate::script::{solve_script, ScriptType};
use crate::types::{format_hash, BlockHeader, BlockIndex, Hash, OutPoint, Transaction, TxIndex};

/// Verification mode for [`check_stake_kernel_hash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelMode {
    /// Verify a recorded kernel against the caller-supplied modifier and
    /// proof hash.
    Check,
    /// Search forward from the supplied timestamp, up to `hash_drift`
    /// seconds, for a timestamp whose kernel meets the target.
    Search { hash_drift: u32 },
}

/// Serialize and hash one kernel attempt.
///
/// Preimage layout, 52 bytes: modifier (8, LE), block-from time (4, LE),
/// prevout index (4, LE), prevout hash (32, internal order), attempt
/// time (4, LE). Hashed with double SHA-256.
fn stake_hash(modifier: u64, time_block_from: u32, prevout: &OutPoint, time_tx: u32) -> Hash {
    let mut data = [0u8; 52];
    data[..8].copy_from_slice(&modifier.to_le_bytes());
    data[8..12].copy_from_slice(&time_block_from.to_le_bytes());
    data[12..16].copy_from_slice(&prevout.index.to_le_bytes());
    data[16..48].copy_from_slice(&prevout.hash);
    data[48..].copy_from_slice(&time_tx.to_le_bytes());
    hash256(&data)
}

/// Check one stake kernel against its target, in check or search mode.
///
/// `block_from` is the block containing `tx_prev`, whose output
/// `prevout` is being staked. In check mode the caller supplies
/// `hash_proof` and `stake_modifier` from the block under validation and
/// the result is whether the proof hash meets the target; nothing is
/// written back. In search mode `stake_modifier` is overwritten with the
/// required modifier, and on success `time_tx` is set to the found
/// timestamp and `hash_proof` to its kernel hash. Search exhaustion is
/// `Ok(false)`, not an error.
#[allow(clippy::too_many_arguments)]
pub fn check_stake_kernel_hash(
    params: &NetworkParams,
    chain: &BlockIndex,
    bits: u32,
    block_from: &BlockHeader,
    tx_prev: &Transaction,
    prevout: &OutPoint,
    time_tx: &mut u32,
    mode: KernelMode,
    hash_proof: &mut Hash,
    stake_modifier: &mut u64,
) -> Result<bool> {
    let output = tx_prev.outputs.get(prevout.index as usize).ok_or_else(|| {
        KernelError::InvalidStakeAttempt(
            format!("stake prevout index {} out of range", prevout.index).into(),
        )
    })?;
    let value_in = output.value;
    let time_block_from = block_from.time;

    if value_in < params.min_stake_amount {
        return Err(KernelError::InvalidStakeAttempt(
            format!(
                "stake value {value_in} below minimum {}",
                params.min_stake_amount
            )
            .into(),
        ));
    }
    if *time_tx < time_block_from {
        return Err(KernelError::InvalidStakeAttempt(
            format!("stake time {} precedes source block time {time_block_from}", *time_tx).into(),
        ));
    }
    if time_block_from.wrapping_add(params.min_stake_age) > *time_tx {
        return Err(KernelError::InvalidStakeAttempt(
            format!(
                "minimum stake age violation: source block time {time_block_from} \
                 minimum age {} stake time {}",
                params.min_stake_age, *time_tx
            )
            .into(),
        ));
    }

    // Target scales linearly with the staked amount: one unit of target
    // weight per hundred satoshis. The widening multiply saturates.
    let target = expand_compact(bits)?.saturating_mul_u64(value_in as u64 / 100);

    // The kernel must hash against the modifier derived from the block
    // holding the staked output, not the block under validation.
    let required_modifier = compute_next_stake_modifier(params, chain, Some(block_from))?;

    match mode {
        KernelMode::Check => {
            if *stake_modifier != required_modifier {
                return Err(KernelError::InvalidBlock(
                    format!(
                        "stake modifier mismatch at height {}: {:016x} != {required_modifier:016x}",
                        block_from.height, *stake_modifier
                    )
                    .into(),
                ));
            }
            let required_hash = stake_hash(*stake_modifier, time_block_from, prevout, *time_tx);
            if required_hash != *hash_proof {
                return Err(KernelError::InvalidBlock(
                    format!(
                        "proof hash mismatch for kernel {}:{} at time {}: {} != {}",
                        format_hash(&prevout.hash),
                        prevout.index,
                        *time_tx,
                        format_hash(hash_proof),
                        format_hash(&required_hash)
                    )
                    .into(),
                ));
            }
            Ok(U256::from_bytes(hash_proof) < target)
        }
        KernelMode::Search { hash_drift } => {
            *stake_modifier = required_modifier;
            for drift in 0..hash_drift {
                let try_time = time_tx.wrapping_add(drift);
                *hash_proof = stake_hash(*stake_modifier, time_block_from, prevout, try_time);

                if U256::from_bytes(hash_proof) < target {
                    *time_tx = try_time;
                    debug!(
                        "stake found: modifier={:016x} source height={} source time={} \
                         prevout={}:{} time={try_time} proof={}",
                        *stake_modifier,
                        block_from.height,
                        time_block_from,
                        format_hash(&prevout.hash),
                        prevout.index,
                        format_hash(hash_proof)
                    );
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

/// Validate the proof-of-stake claim of a whole block: signature over
/// the block hash by the key owning the staked output, then the recorded
/// kernel in check mode.
pub fn check_proof_of_stake(
    params: &NetworkParams,
    chain: &BlockIndex,
    txs: &TxIndex,
    block: &BlockHeader,
) -> Result<()> {
    if block.pos_block_sig.is_empty() {
        return Err(KernelError::InvalidBlock(
            format!("block {} is not signed", block.hash).into(),
        ));
    }
    let prevout = block.stake_input.clone().ok_or_else(|| {
        KernelError::InvalidBlock(format!("block {} has no stake input", block.hash).into())
    })?;

    let (tx_prev, tx_block_hash) = txs.get(&prevout.hash).ok_or_else(|| {
        KernelError::InvalidBlock(
            format!(
                "stake input transaction {} not found",
                format_hash(&prevout.hash)
            )
            .into(),
        )
    })?;
    let block_from = chain.get(tx_block_hash).ok_or_else(|| {
        KernelError::InvalidBlock(
            format!("unknown block {tx_block_hash} for stake input transaction").into(),
        )
    })?;

    let output = tx_prev.outputs.get(prevout.index as usize).ok_or_else(|| {
        KernelError::InvalidBlock(
            format!("stake input index {} out of range", prevout.index).into(),
        )
    })?;

    let key_id = match solve_script(&output.script_pubkey) {
        (ScriptType::PubKeyHash, solutions) => {
            KeyId::from_slice(&solutions[0]).ok_or_else(|| {
                KernelError::InvalidBlock(
                    format!("malformed stake key hash in block {}", block.hash).into(),
                )
            })?
        }
        (ScriptType::PubKey, solutions) => KeyId::from_pubkey(&solutions[0]),
        (ScriptType::NonStandard, _) => {
            return Err(KernelError::InvalidBlock(
                format!("unsupported stake script for block {}", block.hash).into(),
            ));
        }
    };

    if !verify_block_signature(&key_id, block.hash.as_hash_ref(), &block.pos_block_sig) {
        return Err(KernelError::InvalidBlock(
            format!("bad block signature on {}", block.hash).into(),
        ));
    }

    let mut time_tx = block.time;
    let mut hash_proof = block.proof_hash;
    let mut stake_modifier = block.stake_modifier;
    let valid = check_stake_kernel_hash(
        params,
        chain,
        block.bits,
        block_from,
        tx_prev,
        &prevout,
        &mut time_tx,
        KernelMode::Check,
        &mut hash_proof,
        &mut stake_modifier,
    )?;
    if !valid {
        return Err(KernelError::InvalidBlock(
            format!(
                "kernel check failed on coinstake {}:{}",
                format_hash(&prevout.hash),
                prevout.index
            )
            .into(),
        ));
    }

    Ok(())
}
