//! Desktop event subscriptions feeding `WindowsChanged`.

use tracing::{debug, warn};

use super::accessor::Accessor;
use super::serializer::windows_json;
use crate::desktop::{DesktopSession, DesktopSignal, SubscriptionId};
use crate::error::SessionError;
use crate::events::DaemonEventSender;

/// Live subscriptions to the window-created and window-destroyed streams.
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    subscriptions: Vec<(DesktopSignal, SubscriptionId)>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every stream that is not subscribed yet.
    pub fn subscribe(&mut self, desktop: &dyn DesktopSession, sink: &DaemonEventSender) {
        for signal in DesktopSignal::ALL {
            if self.subscriptions.iter().any(|(s, _)| *s == signal) {
                continue;
            }
            match desktop.subscribe(signal, sink.clone()) {
                Ok(id) => {
                    debug!(signal = signal.name(), ?id, "Subscribed");
                    self.subscriptions.push((signal, id));
                }
                Err(e) => warn!(signal = signal.name(), error = %e, "Failed to subscribe"),
            }
        }
    }

    /// Drop every subscription. Failures are logged and do not stop the rest.
    pub fn unsubscribe(&mut self, desktop: &dyn DesktopSession) {
        for (signal, id) in self.subscriptions.drain(..) {
            match desktop.unsubscribe(id) {
                Ok(()) => debug!(signal = signal.name(), ?id, "Unsubscribed"),
                Err(SessionError::NotSubscribed(_)) => {
                    debug!(signal = signal.name(), ?id, "Already unsubscribed")
                }
                Err(e) => warn!(signal = signal.name(), error = %e, "Failed to unsubscribe"),
            }
        }
    }

    pub fn is_subscribed(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

/// Full snapshot for one `WindowsChanged`, or `None` if it cannot be encoded.
pub fn windows_changed_payload(accessor: &Accessor) -> Option<String> {
    match windows_json(accessor) {
        Ok(payload) => Some(payload),
        Err(e) => {
            warn!(error = %e, "Suppressing WindowsChanged, snapshot failed to encode");
            None
        }
    }
}
