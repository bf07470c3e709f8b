//! Protocol constants for the proof-of-stake kernel

/// Seconds between stake modifier regenerations on the production network: 3 hours.
pub const MODIFIER_INTERVAL: u32 = 3 * 60 * 60;

/// Seconds between stake modifier regenerations on the test network: 20 minutes.
pub const MODIFIER_INTERVAL_TESTNET: u32 = 20 * 60;

/// Shaping parameter for the 64-section partition of the selection interval.
pub const MODIFIER_INTERVAL_RATIO: i64 = 3;

/// Number of selection rounds per stake modifier, one entropy bit each.
pub const MODIFIER_SELECTION_ROUNDS: usize = 64;

/// Satoshis per coin.
pub const COIN: i64 = 100_000_000;

/// Minimum value of an output eligible to stake.
pub const MIN_STAKE_AMOUNT: i64 = COIN;

/// Minimum age in seconds of a staked output on the production network.
pub const MIN_STAKE_AGE: u32 = 60 * 60;

/// Minimum age in seconds of a staked output on the test network.
pub const MIN_STAKE_AGE_TESTNET: u32 = 10 * 60;

/// Nominal block spacing in seconds. Used only to pre-size the candidate buffer.
pub const STAKE_TARGET_SPACING: u32 = 60;

/// Stake modifier seeded on the block at height 1. Chain-historical value;
/// not derived from anything.
pub const FIRST_BLOCK_STAKE_MODIFIER: u64 = 0x1234567887654321;

/// Stake modifier of the genesis block.
pub const GENESIS_STAKE_MODIFIER: u64 = 0;
