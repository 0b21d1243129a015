//! Kernel error type.
//!
//! One shared enum covers both configuration-time validation and run-time
//! misuse; the engine crate converts nothing and simply propagates. Misuse
//! variants (`UnknownProcess`, `UnknownResource`, `UnknownEntity`,
//! `Payload`) abort a run by bubbling out of `Environment::run`.

use thiserror::Error;

use crate::EntityId;

/// The top-level error type for all `des-*` crates.
#[derive(Debug, Error)]
pub enum DesError {
    #[error("no process registered under id {0:?}")]
    UnknownProcess(String),

    #[error("no resource registered under id {0:?}")]
    UnknownResource(String),

    #[error("entity {0} is not (or no longer) registered")]
    UnknownEntity(EntityId),

    #[error("payload of {entity} is not a {expected}")]
    Payload {
        entity:   String,
        expected: &'static str,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid distribution: {0}")]
    Distribution(String),
}

/// Shorthand result type for all `des-*` crates.
pub type DesResult<T> = Result<T, DesError>;
