//! Collaboration hints supplied by neighbouring cognitive components.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A side signal attached to a store request by another component.
///
/// Hints nudge importance and valence at creation time only; they are kept on
/// the record for provenance but never consulted again during retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum CollaborationHint {
    /// Attention manager salience in [0, 1].
    Attention {
        /// How strongly the event captured attention.
        salience: f32,
    },
    /// Tone manager warmth in [0, 1]; 0.5 is neutral.
    Tone {
        /// Conversational warmth.
        warmth: f32,
    },
    /// Value-alignment manager score in [0, 1].
    ValueAlignment {
        /// How well the event aligns with the agent's values.
        alignment: f32,
    },
}

impl CollaborationHint {
    /// Name of the component that produced the hint.
    #[must_use]
    pub const fn source(&self) -> &'static str {
        match self {
            Self::Attention { .. } => "attention",
            Self::Tone { .. } => "tone",
            Self::ValueAlignment { .. } => "value_alignment",
        }
    }

    /// The hint's scalar signal.
    #[must_use]
    pub const fn value(&self) -> f32 {
        match self {
            Self::Attention { salience } => *salience,
            Self::Tone { warmth } => *warmth,
            Self::ValueAlignment { alignment } => *alignment,
        }
    }

    /// Checks the signal is a finite number in [0, 1].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when the value is out of range.
    pub fn validate(&self) -> Result<()> {
        let value = self.value();
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "{} hint must be within 0.0..=1.0, got {value}",
                self.source()
            )))
        }
    }
}

impl fmt::Display for CollaborationHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:.2}", self.source(), self.value())
    }
}
