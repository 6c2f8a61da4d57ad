use std::time::Duration;

/// Configuration for a [crate::LaunchDarklyProvider].
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderOptions {
    pub(crate) initialization_timeout: Duration,
}

impl ProviderOptions {
    /// How long [crate::FeatureProvider::initialize] waits for the client by default.
    pub const DEFAULT_INITIALIZATION_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create options with default settings.
    pub fn new() -> Self {
        ProviderOptions {
            initialization_timeout: Self::DEFAULT_INITIALIZATION_TIMEOUT,
        }
    }

    /// Set how long initialization waits for the LaunchDarkly client to become ready before the
    /// provider reports an error.
    ///
    /// ```
    /// # use std::time::Duration;
    /// # use launchdarkly_openfeature_provider::ProviderOptions;
    /// let mut options = ProviderOptions::new();
    /// options.initialization_timeout(Duration::from_secs(2));
    /// ```
    pub fn initialization_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.initialization_timeout = timeout;
        self
    }
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self::new()
    }
}
