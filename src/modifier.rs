//! Stake modifier derivation
//!
//! The stake modifier exists to stop the owner of an output from
//! predicting the future proof-of-stake hashes that output can generate
//! at the time it confirms: every kernel must hash against a modifier
//! formed *after* the output's block. Each modifier packs 64 entropy
//! bits, one from a block deterministically selected out of a
//! time-windowed candidate set, and regenerates at most once per
//! modifier interval so an attacker cannot grind additional bits into it
//! by producing blocks quickly.

use std::collections::HashSet;

use log::{debug, log_enabled, trace, Level};

use crate::arith::U256;
use crate::constants::{
    FIRST_BLOCK_STAKE_MODIFIER, GENESIS_STAKE_MODIFIER, MODIFIER_SELECTION_ROUNDS,
};
use crate::crypto::hash256;
use crate::error::{KernelError, Result};
use crate::params::NetworkParams;
use crate::types::{BlockHash, BlockHeader, BlockIndex};

/// Length in seconds of selection-interval section `section`.
///
/// Formula: interval * 63 / (63 + (63 - section) * (ratio - 1))
///
/// Computed in signed 64-bit integers; at section 63 the subexpression
/// `(63 - section)` is zero and the divisor is 63.
fn selection_interval_section(params: &NetworkParams, section: usize) -> i64 {
    debug_assert!(
        section < MODIFIER_SELECTION_ROUNDS,
        "section {section} out of range"
    );
    let interval = i64::from(params.modifier_interval);
    interval * 63 / (63 + (63 - section as i64) * (params.modifier_interval_ratio - 1))
}

/// Total selection interval in seconds: the sum of all 64 section
/// lengths. Summed term by term; integer truncation makes the total
/// differ from any closed form.
fn selection_interval(params: &NetworkParams) -> i64 {
    (0..MODIFIER_SELECTION_ROUNDS)
        .map(|section| selection_interval_section(params, section))
        .sum()
}

/// Selection ranking of a candidate block: the 256-bit integer reading of
/// hash256(block hash, previous modifier).
///
/// A proof-of-stake candidate's ranking is shifted down by 32 bits so
/// that it always beats a proof-of-work candidate; this preserves the
/// energy-efficiency property of the chain.
fn selection_hash(block_hash: &BlockHash, prev_modifier: u64, is_proof_of_stake: bool) -> U256 {
    let mut data = [0u8; 40];
    data[..32].copy_from_slice(block_hash.as_hash_ref());
    data[32..].copy_from_slice(&prev_modifier.to_le_bytes());
    let ranking = U256::from_bytes(&hash256(&data));
    if is_proof_of_stake {
        ranking.shr(32)
    } else {
        ranking
    }
}

/// Select one block from the candidate list, excluding blocks already
/// chosen in earlier rounds and considering timestamps up to
/// `interval_stop`.
///
/// Candidates arrive newest first. The timestamp cutoff is only applied
/// once a first candidate has been adopted, so a round with candidates
/// always selects something, even when every candidate is newer than its
/// nominal stop time.
fn select_block_from_candidates<'a>(
    chain: &'a BlockIndex,
    sorted_by_timestamp: &[(i64, BlockHash)],
    selected: &HashSet<BlockHash>,
    interval_stop: i64,
    prev_modifier: u64,
) -> Result<Option<&'a BlockHeader>> {
    let mut best: Option<&BlockHeader> = None;
    let mut hash_best = U256::zero();

    for (_, candidate_hash) in sorted_by_timestamp {
        let block = chain.get(candidate_hash).ok_or_else(|| {
            KernelError::ChainCorruption(
                format!("candidate block {candidate_hash} missing from index").into(),
            )
        })?;

        if best.is_some() && i64::from(block.time) > interval_stop {
            break;
        }
        if selected.contains(&block.hash) {
            continue;
        }

        let hash_selection = selection_hash(&block.hash, prev_modifier, block.is_proof_of_stake);
        match best {
            Some(_) if hash_selection < hash_best => {
                hash_best = hash_selection;
                best = Some(block);
            }
            None => {
                hash_best = hash_selection;
                best = Some(block);
            }
            _ => {}
        }
    }

    trace!("selection hash={hash_best:x}");
    Ok(best)
}

/// Walk back from `from` (inclusive) to the nearest block whose modifier
/// generation flag is set; return that block's modifier and time.
fn last_generated_modifier(chain: &BlockIndex, from: &BlockHeader) -> Result<(u64, i64)> {
    let mut block = from;
    while let Some(parent) = block.prev {
        if block.is_generated_stake_modifier {
            break;
        }
        block = chain.get(&parent).ok_or_else(|| {
            KernelError::ChainCorruption(format!("ancestor {parent} missing from index").into())
        })?;
    }
    if !block.is_generated_stake_modifier {
        return Err(KernelError::ChainCorruption(
            "no modifier generation up to genesis".into(),
        ));
    }
    Ok((block.stake_modifier, i64::from(block.time)))
}

/// Compute the stake modifier for the block following `prev`.
///
/// `None` yields the genesis modifier; a `prev` at height 0 yields the
/// seeded first-block modifier. Otherwise the previous modifier is
/// reused while its generation time shares an interval slot with
/// `prev.time`, and regenerated from 64 selection rounds once the slot
/// advances.
pub fn compute_next_stake_modifier(
    params: &NetworkParams,
    chain: &BlockIndex,
    prev: Option<&BlockHeader>,
) -> Result<u64> {
    let Some(prev) = prev else {
        return Ok(GENESIS_STAKE_MODIFIER);
    };
    if prev.height == 0 {
        return Ok(FIRST_BLOCK_STAKE_MODIFIER);
    }

    let interval = i64::from(params.modifier_interval);
    let (prev_modifier, prev_modifier_time) = last_generated_modifier(chain, prev)?;
    trace!("previous modifier={prev_modifier:016x} time={prev_modifier_time}");

    // Same interval slot: the modifier regenerates at most once per interval
    // regardless of block rate.
    if prev_modifier_time / interval >= i64::from(prev.time) / interval {
        return Ok(prev_modifier);
    }

    // Gather candidate blocks inside the selection window, walking the
    // chain backwards from prev.
    let selection_interval_len = selection_interval(params);
    let selection_start = i64::from(prev.time) / interval * interval - selection_interval_len;

    let mut sorted_by_timestamp: Vec<(i64, BlockHash)> = Vec::with_capacity(
        (MODIFIER_SELECTION_ROUNDS as u32 * params.modifier_interval / params.stake_target_spacing)
            as usize,
    );
    let mut cursor = Some(prev);
    while let Some(block) = cursor {
        if i64::from(block.time) < selection_start {
            break;
        }
        sorted_by_timestamp.push((i64::from(block.time), block.hash));
        cursor = match block.prev {
            Some(parent) => Some(chain.get(&parent).ok_or_else(|| {
                KernelError::ChainCorruption(
                    format!("ancestor {parent} missing from index").into(),
                )
            })?),
            None => None,
        };
    }
    let first_candidate_height = cursor.map_or(0, |block| block.height + 1);

    // Ascending by (time, hash), then reversed to newest-first. Ties on
    // time must resolve exactly this way.
    sorted_by_timestamp.sort();
    sorted_by_timestamp.reverse();

    // Run the selection rounds, one entropy bit per round.
    let mut modifier_new: u64 = 0;
    let mut interval_stop = selection_start;
    let mut selected_hashes: HashSet<BlockHash> = HashSet::new();
    let mut selected_blocks: Vec<&BlockHeader> = Vec::with_capacity(MODIFIER_SELECTION_ROUNDS);
    let rounds = sorted_by_timestamp.len().min(MODIFIER_SELECTION_ROUNDS);

    for round in 0..rounds {
        interval_stop += selection_interval_section(params, round);

        let block = select_block_from_candidates(
            chain,
            &sorted_by_timestamp,
            &selected_hashes,
            interval_stop,
            prev_modifier,
        )?
        .ok_or_else(|| {
            KernelError::ChainCorruption(format!("unable to select block at round {round}").into())
        })?;

        modifier_new |= u64::from(block.stake_entropy_bit) << round;

        selected_hashes.insert(block.hash);
        selected_blocks.push(block);
        trace!(
            "selected round {round} stop={interval_stop} height={} bit={}",
            block.height,
            u8::from(block.stake_entropy_bit)
        );
    }

    if log_enabled!(Level::Trace) {
        trace_selection_map(chain, prev, &selected_blocks, first_candidate_height);
    }
    debug!("new modifier={modifier_new:016x} prev block time={}", prev.time);

    Ok(modifier_new)
}

/// Render the selection landscape over the candidate height range:
/// '-' proof-of-work unselected, '=' proof-of-stake unselected,
/// 'W' / 'S' selected proof-of-work / proof-of-stake.
fn trace_selection_map(
    chain: &BlockIndex,
    prev: &BlockHeader,
    selected: &[&BlockHeader],
    first_candidate_height: u64,
) {
    let len = (prev.height - first_candidate_height + 1) as usize;
    let mut map = vec![b'-'; len];

    let mut cursor = Some(prev);
    while let Some(block) = cursor {
        if block.height < first_candidate_height {
            break;
        }
        if block.is_proof_of_stake {
            map[(block.height - first_candidate_height) as usize] = b'=';
        }
        cursor = block.prev.and_then(|parent| chain.get(&parent));
    }
    for block in selected {
        map[(block.height - first_candidate_height) as usize] =
            if block.is_proof_of_stake { b'S' } else { b'W' };
    }

    trace!(
        "selection height [{first_candidate_height}, {}] map {}",
        prev.height,
        String::from_utf8_lossy(&map)
    );
}
