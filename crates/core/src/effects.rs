use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure inside a single charm or material handler. The pipeline logs it
/// and carries on with the total from before the handler ran.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectError {
    #[error("{source_id} produced a non-finite value")]
    NonFinite { source_id: String },
    #[error("{source_id} referenced die {index}, which is not in the hand")]
    InvalidDie { source_id: String, index: usize },
    #[error("{source_id}: invalid rule {reason}")]
    InvalidRule { source_id: String, reason: String },
}

/// Which part of the engine produced a log line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EffectSource {
    Charm,
    Material,
    Consumable,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectLog {
    pub source: EffectSource,
    pub id: String,
    pub line: String,
}

impl EffectLog {
    pub fn charm(id: &str, line: impl Into<String>) -> Self {
        Self {
            source: EffectSource::Charm,
            id: id.to_string(),
            line: line.into(),
        }
    }

    pub fn material(id: &str, line: impl Into<String>) -> Self {
        Self {
            source: EffectSource::Material,
            id: id.to_string(),
            line: line.into(),
        }
    }

    pub fn consumable(id: &str, line: impl Into<String>) -> Self {
        Self {
            source: EffectSource::Consumable,
            id: id.to_string(),
            line: line.into(),
        }
    }
}

pub(crate) fn ensure_finite(source_id: &str, value: f64) -> Result<f64, EffectError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EffectError::NonFinite {
            source_id: source_id.to_string(),
        })
    }
}
