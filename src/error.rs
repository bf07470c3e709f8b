//! Error types for stake kernel verification

use std::borrow::Cow;
use thiserror::Error;

/// Failures surfaced by the kernel. The diagnostic strings exist for
/// operators and logs; consensus never branches on them.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum KernelError {
    /// The chain index is inconsistent with itself. A well-formed chain
    /// never triggers this.
    #[error("Chain corruption: {0}")]
    ChainCorruption(Cow<'static, str>),

    /// A proof-of-stake block failed validation.
    #[error("Invalid proof-of-stake block: {0}")]
    InvalidBlock(Cow<'static, str>),

    /// A stake attempt violated an eligibility precondition.
    #[error("Invalid stake attempt: {0}")]
    InvalidStakeAttempt(Cow<'static, str>),

    /// Compact difficulty bits did not expand to a valid 256-bit target.
    #[error("Invalid stake target: {0}")]
    InvalidTarget(Cow<'static, str>),
}

pub type Result<T> = std::result::Result<T, KernelError>;
