use std::time::Duration;

use thiserror::Error;

use crate::client::ClientError;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the provider's lifecycle operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The LaunchDarkly client could not be constructed. Raised by
    /// [crate::FeatureProvider::initialize] rather than at construction time.
    #[error("the LaunchDarkly client could not be created")]
    ClientConstruction(#[source] ClientError),
    #[error("the LaunchDarkly client failed to initialize")]
    Initialization(#[source] ClientError),
    #[error("the LaunchDarkly client did not initialize within {0:?}")]
    InitializationTimeout(Duration),
    #[error("invalid evaluation context: {0}")]
    InvalidContext(String),
}
