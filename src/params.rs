//! Per-network staking parameters
//!
//! The kernel takes its chain constants as an explicit [`NetworkParams`]
//! value rather than reading process-wide network state; a kernel
//! invocation is a pure function of its arguments.

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Which chain the kernel is validating for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Network {
    Mainnet,
    Testnet,
}

/// Staking parameters of one network. Values are protocol-defined; this
/// struct only carries them to the kernel entry points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub network: Network,

    /// Seconds between stake modifier regenerations.
    pub modifier_interval: u32,

    /// Shaping parameter for the selection interval partition.
    pub modifier_interval_ratio: i64,

    /// Minimum satoshi value of a staking output.
    pub min_stake_amount: i64,

    /// Minimum age in seconds from the block containing the staked output
    /// to a stake attempt.
    pub min_stake_age: u32,

    /// Nominal block spacing in seconds; sizes the candidate buffer only.
    pub stake_target_spacing: u32,
}

impl NetworkParams {
    /// Parameters for the given network.
    pub fn new(network: Network) -> Self {
        match network {
            Network::Mainnet => Self::mainnet(),
            Network::Testnet => Self::testnet(),
        }
    }

    /// Production network parameters.
    pub fn mainnet() -> Self {
        Self {
            network: Network::Mainnet,
            modifier_interval: MODIFIER_INTERVAL,
            modifier_interval_ratio: MODIFIER_INTERVAL_RATIO,
            min_stake_amount: MIN_STAKE_AMOUNT,
            min_stake_age: MIN_STAKE_AGE,
            stake_target_spacing: STAKE_TARGET_SPACING,
        }
    }

    /// Test network parameters.
    pub fn testnet() -> Self {
        Self {
            network: Network::Testnet,
            modifier_interval: MODIFIER_INTERVAL_TESTNET,
            modifier_interval_ratio: MODIFIER_INTERVAL_RATIO,
            min_stake_amount: MIN_STAKE_AMOUNT,
            min_stake_age: MIN_STAKE_AGE_TESTNET,
            stake_target_spacing: STAKE_TARGET_SPACING,
        }
    }
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self::mainnet()
    }
}
