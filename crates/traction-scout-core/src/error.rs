//! Error types for the analytics core.
//!
//! Two families are kept apart: [`InputError`] marks missing or unparsable
//! input, which only skips the computation that depends on it, while
//! [`PipelineError`] carries store failures that must reach the caller.

use thiserror::Error;

use crate::models::EntityId;

/// A recoverable problem with one input field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("{0} is missing")]
    Missing(&'static str),

    #[error("{field} is not a valid timestamp: '{value}'")]
    Unparsable { field: &'static str, value: String },

    #[error("{field} lies in the future: '{value}'")]
    InFuture { field: &'static str, value: String },
}

/// A failure that aborts enrichment of one entity.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("storage failure while {action} for {entity}")]
    Storage {
        entity: EntityId,
        action: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    pub(crate) fn storage(entity: &EntityId, action: &'static str, source: anyhow::Error) -> Self {
        PipelineError::Storage {
            entity: entity.clone(),
            action,
            source,
        }
    }
}
