// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// Error taxonomy shared by every engine crate.
///
/// `InvalidInput` signals a caller bug or unusable input and must never be
/// silently coerced. `QualityThreshold` is the one recoverable condition:
/// it is raised at the [`crate::AlignmentResult`] boundary and the three-way
/// orchestrator is the only component expected to catch it and fall back to
/// uncorrected distances.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IliError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("alignment quality below threshold: {0}")]
    QualityThreshold(String),
    #[error("numerical issue: {0}")]
    NumericalIssue(String),
}

impl IliError {
    /// Constructs an `InvalidInput` error from any message type.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Constructs a `QualityThreshold` error from any message type.
    pub fn quality_threshold(msg: impl Into<String>) -> Self {
        Self::QualityThreshold(msg.into())
    }

    /// Constructs a `NumericalIssue` error from any message type.
    pub fn numerical_issue(msg: impl Into<String>) -> Self {
        Self::NumericalIssue(msg.into())
    }

    /// Returns true for the recoverable alignment-gate condition.
    pub fn is_quality_threshold(&self) -> bool {
        matches!(self, Self::QualityThreshold(_))
    }
}
