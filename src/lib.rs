//! # Stake Kernel
//!
//! Consensus-critical proof-of-stake kernel: the subsystem that decides
//! whether a candidate block satisfies the staking rules, and that
//! deterministically derives the rolling 64-bit stake modifier binding
//! each stake attempt to past chain history.
//!
//! ## Architecture
//!
//! The kernel is a pure library consumed by a node. The chain index and
//! transaction lookup are caller-owned maps read through shared
//! references; the kernel never mutates them and holds no state of its
//! own beyond the [`NetworkParams`] the caller hands it.
//!
//! - [`modifier`] - selection-interval arithmetic, candidate gathering,
//!   deterministic block selection, and modifier assembly
//! - [`kernel`] - kernel hash construction, target derivation, and
//!   check/search verification up to whole-block proof-of-stake checks
//! - [`arith`] - fixed-width 256-bit arithmetic with explicit saturation
//! - [`crypto`], [`script`] - double SHA-256, key ids, recoverable block
//!   signatures, and the minimal output-script solver
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every entry point is a deterministic function
//!    of its arguments; two nodes with identical chain state compute
//!    identical modifiers and targets, bit for bit
//! 2. **Exact Version Pinning**: consensus-critical dependencies are
//!    pinned to exact versions
//! 3. **No Internal Retries**: failures reject locally; the kernel never
//!    retries, never branches on diagnostics, and leaves caller state
//!    untouched on failing paths
//!
//! ## Usage
//!
//! ```rust
//! use stake_kernel::{NetworkParams, StakeKernel};
//! use stake_kernel::types::BlockIndex;
//!
//! let kernel = StakeKernel::new(NetworkParams::mainnet());
//! let chain = BlockIndex::new();
//! // the genesis block's modifier is zero
//! assert_eq!(kernel.compute_next_stake_modifier(&chain, None).unwrap(), 0);
//! ```

pub mod arith;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod kernel;
pub mod modifier;
pub mod params;
pub mod script;
pub mod types;

pub use error::{KernelError, Result};
pub use kernel::KernelMode;
pub use params::{Network, NetworkParams};

use types::{BlockHeader, BlockIndex, Hash, OutPoint, Transaction, TxIndex};

/// Stake kernel facade: carries the network parameters and delegates to
/// the module functions.
#[derive(Debug, Clone)]
pub struct StakeKernel {
    params: NetworkParams,
}

impl StakeKernel {
    /// Create a kernel for the given network parameters.
    pub fn new(params: NetworkParams) -> Self {
        Self { params }
    }

    /// The parameters this kernel validates against.
    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    /// Compute the stake modifier for the block following `prev`.
    pub fn compute_next_stake_modifier(
        &self,
        chain: &BlockIndex,
        prev: Option<&BlockHeader>,
    ) -> Result<u64> {
        modifier::compute_next_stake_modifier(&self.params, chain, prev)
    }

    /// Check one stake kernel against its target, in check or search mode.
    #[allow(clippy::too_many_arguments)]
    pub fn check_stake_kernel_hash(
        &self,
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
        kernel::check_stake_kernel_hash(
            &self.params,
            chain,
            bits,
            block_from,
            tx_prev,
            prevout,
            time_tx,
            mode,
            hash_proof,
            stake_modifier,
        )
    }

    /// Validate the proof-of-stake claim of a whole block.
    pub fn check_proof_of_stake(
        &self,
        chain: &BlockIndex,
        txs: &TxIndex,
        block: &BlockHeader,
    ) -> Result<()> {
        kernel::check_proof_of_stake(&self.params, chain, txs, block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facade_genesis_modifier() {
        let kernel = StakeKernel::new(NetworkParams::mainnet());
        let chain = BlockIndex::new();
        assert_eq!(kernel.compute_next_stake_modifier(&chain, None).unwrap(), 0);
    }

    #[test]
    fn test_facade_exposes_params() {
        let kernel = StakeKernel::new(NetworkParams::testnet());
        assert_eq!(kernel.params().network, Network::Testnet);
    }
}
