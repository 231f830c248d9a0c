//! Closing workflow
//!
//! The operator moves through `Counting -> AmountEntry -> Verification`
//! and submits from `Verification`. Earlier stages can be revisited at any
//! time before submission; once submitted the workflow is frozen.
//!
//! This is a library type for clients that drive the closing form. The
//! server never sees the stages: it only receives the final submission
//! through `ClosingService::submit`, and a recorded closing is immutable.

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosingStage {
    Counting,
    AmountEntry,
    Verification,
    Submitted,
}

impl ClosingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClosingStage::Counting => "counting",
            ClosingStage::AmountEntry => "amount_entry",
            ClosingStage::Verification => "verification",
            ClosingStage::Submitted => "submitted",
        }
    }

    /// Next stage in the linear progression
    pub fn next(&self) -> Option<ClosingStage> {
        match self {
            ClosingStage::Counting => Some(ClosingStage::AmountEntry),
            ClosingStage::AmountEntry => Some(ClosingStage::Verification),
            ClosingStage::Verification => Some(ClosingStage::Submitted),
            ClosingStage::Submitted => None,
        }
    }
}

impl std::fmt::Display for ClosingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stage tracker for one closing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingWorkflow {
    stage: ClosingStage,
}

impl ClosingWorkflow {
    pub fn new() -> Self {
        Self {
            stage: ClosingStage::Counting,
        }
    }

    pub fn stage(&self) -> ClosingStage {
        self.stage
    }

    pub fn is_submitted(&self) -> bool {
        self.stage == ClosingStage::Submitted
    }

    /// Move to the next editing stage. Submission goes through `submit`.
    pub fn advance(&mut self) -> Result<ClosingStage, DomainError> {
        self.ensure_open()?;
        match self.stage.next() {
            Some(ClosingStage::Submitted) | None => Err(DomainError::InvalidStageTransition {
                from: self.stage.to_string(),
                to: ClosingStage::Submitted.to_string(),
            }),
            Some(next) => {
                self.stage = next;
                Ok(next)
            }
        }
    }

    /// Jump to any editing stage, backwards or forwards.
    pub fn go_to(&mut self, target: ClosingStage) -> Result<ClosingStage, DomainError> {
        self.ensure_open()?;
        if target == ClosingStage::Submitted {
            return Err(DomainError::InvalidStageTransition {
                from: self.stage.to_string(),
                to: target.to_string(),
            });
        }
        self.stage = target;
        Ok(target)
    }

    /// Submit from `Verification`; terminal.
    pub fn submit(&mut self) -> Result<(), DomainError> {
        self.ensure_open()?;
        if self.stage != ClosingStage::Verification {
            return Err(DomainError::InvalidStageTransition {
                from: self.stage.to_string(),
                to: ClosingStage::Submitted.to_string(),
            });
        }
        self.stage = ClosingStage::Submitted;
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), DomainError> {
        if self.is_submitted() {
            return Err(DomainError::ClosingAlreadySubmitted);
        }
        Ok(())
    }
}

impl Default for ClosingWorkflow {
    fn default() -> Self {
        Self::new()
    }
}
