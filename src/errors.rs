//! Typed errors which callers may want to distinguish after they've been boxed into
//! [`GenericError`](crate::core::GenericError).

use thiserror::Error;

use crate::currency::{ProviderKind, RateKey};
use crate::declaration::BuilderState;

/// A rate source couldn't be reached or returned garbage. Fatal to the current statement file.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Failed to get {provider} currency rates for {key}: {message}")]
pub struct RateProviderError {
    pub provider: ProviderKind,
    pub key: RateKey,
    pub message: String,
}

/// A currency is absent from a non-empty rate table.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("There is no {currency} currency rate for {key}")]
pub struct MissingRateError {
    pub currency: String,
    pub key: RateKey,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid declaration builder usage: {operation} is not allowed in {state} state")]
pub struct InvalidBuilderState {
    pub operation: &'static str,
    pub state: BuilderState,
}
