use log::debug;
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Events a provider emits to the OpenFeature API.
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderEvent {
    /// The provider finished initializing and can evaluate flags.
    Ready,
    /// The provider failed to initialize.
    Error { message: String },
    /// Flag configuration changed in LaunchDarkly.
    ConfigurationChanged { flags_changed: Vec<String> },
}

/// Fans provider events out to every subscriber.
///
/// Cloning yields another handle onto the same channel, so a clone can be moved into a client
/// callback.
#[derive(Clone)]
pub struct ProviderEvents {
    sender: broadcast::Sender<ProviderEvent>,
}

impl ProviderEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        ProviderEvents { sender }
    }

    /// Receive every event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn emit(&self, event: ProviderEvent) {
        // Fails only when nobody is subscribed.
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            debug!("no subscribers for provider event {:?}", event);
        }
    }
}

impl Default for ProviderEvents {
    fn default() -> Self {
        Self::new()
    }
}
