//! Parameter identifiers and read pages

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_BATCH_SIZE;
use crate::errors::CodecError;

/// Numeric identifier of a device parameter
pub type ParameterId = u32;

/// An ordered page of at most [`MAX_BATCH_SIZE`] parameter ids, read in one
/// API call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ParameterId>", into = "Vec<ParameterId>")]
pub struct ParameterBatch(Vec<ParameterId>);

impl ParameterBatch {
    /// # Errors
    /// Returns `CodecError::BatchTooLarge` for more than 15 ids.
    pub fn new(ids: Vec<ParameterId>) -> Result<Self, CodecError> {
        if ids.len() > MAX_BATCH_SIZE {
            return Err(CodecError::BatchTooLarge(ids.len()));
        }
        Ok(Self(ids))
    }

    #[must_use]
    pub fn ids(&self) -> &[ParameterId] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<ParameterId>> for ParameterBatch {
    type Error = CodecError;

    fn try_from(ids: Vec<ParameterId>) -> Result<Self, Self::Error> {
        Self::new(ids)
    }
}

impl From<ParameterBatch> for Vec<ParameterId> {
    fn from(batch: ParameterBatch) -> Self {
        batch.0
    }
}

impl fmt::Display for ParameterBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", ids.join(","))
    }
}
