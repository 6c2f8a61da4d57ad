use async_trait::async_trait;
use thiserror::Error;

use crate::detail::Detail;
use crate::flag_value::FlagValue;
use crate::user::User;

/// Callback invoked with the key of every flag whose configuration changed.
pub type FlagChangeListener = Box<dyn Fn(&str) + Send + Sync>;

/// Errors reported by the LaunchDarkly client while being created or initialized.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Authentication failed. Double check your SDK key.")]
    Unauthorized,
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
    #[error("client failed to initialize: {0}")]
    InitializationFailed(String),
}

/// The operations the provider needs from a LaunchDarkly server-side client.
///
/// Flag evaluation, data source management and analytics event delivery all happen inside the
/// client; the provider only translates between its inputs and outputs. Implement this for the
/// SDK's client type to plug it into a [crate::LaunchDarklyProvider].
#[async_trait]
pub trait LdClient: Send + Sync {
    /// Evaluate `flag_key` for `user`, falling back to `default` when the flag cannot be
    /// evaluated.
    fn variation_detail(&self, user: &User, flag_key: &str, default: FlagValue)
        -> Detail<FlagValue>;

    /// Resolves once the client has received its first set of flag data, or failed to.
    async fn wait_for_initialization(&self) -> Result<(), ClientError>;

    /// Record a custom analytics event.
    fn track(
        &self,
        user: &User,
        key: &str,
        data: Option<serde_json::Value>,
        metric_value: Option<f64>,
    );

    /// Deliver any pending analytics events.
    fn flush(&self);

    /// Shut the client down and release its resources.
    fn close(&self);

    /// Register a listener for flag configuration changes.
    fn on_flag_change(&self, listener: FlagChangeListener);
}
