//! Message bus transport for the bridge.
//!
//! Publishing happens in two separable steps, mirroring how a session bus
//! name is owned: the connection comes up (`Connected`), the object gets
//! exported on it, and only then is the well-known name requested
//! (`NameAcquired` / `NameLost`). Every step is reported back to the control
//! loop as a [`BusEvent`] tagged with the [`OwnerId`] of the request.

use std::sync::Arc;

use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;
use zbus::Connection;
use zbus::names::WellKnownName;
use zbus::object_server::SignalEmitter;
use zbus::zvariant::ObjectPath;

use super::interface::BridgeInterface;
use crate::error::TransportError;
use crate::events::DaemonEventSender;

/// Identifies one name-ownership request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(pub u64);

/// Progress of a name-ownership request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    /// The bus connection is up; the object can be exported now.
    Connected(OwnerId),
    /// The well-known name is ours.
    NameAcquired(OwnerId),
    /// The name could not be acquired, or was taken away.
    NameLost { owner: OwnerId, reason: String },
}

impl BusEvent {
    pub fn owner(&self) -> OwnerId {
        match self {
            BusEvent::Connected(owner) | BusEvent::NameAcquired(owner) => *owner,
            BusEvent::NameLost { owner, .. } => *owner,
        }
    }
}

/// The transport the bridge publishes itself on.
///
/// All methods are called from the control loop only.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Start acquiring `name`. Progress arrives on `events` as [`BusEvent`]s.
    fn own_name(&mut self, name: &str, events: DaemonEventSender)
    -> Result<OwnerId, TransportError>;

    /// Export the bridge object at `path` on the connection of `owner`.
    async fn export(&mut self, owner: OwnerId, path: &str) -> Result<(), TransportError>;

    /// Remove the exported object.
    async fn unexport(&mut self) -> Result<(), TransportError>;

    /// Give up the name registration of `owner`.
    async fn unown_name(&mut self, owner: OwnerId) -> Result<(), TransportError>;

    /// Emit `WindowsChanged` from the exported object.
    async fn emit_windows_changed(&self, windows_json: &str) -> Result<(), TransportError>;
}

/// Connection of the current ownership request.
struct Binding {
    owner: OwnerId,
    connection: Connection,
}

/// Name request of `owner` held back until its export was attempted.
struct PendingRequest {
    owner: OwnerId,
    ready: oneshot::Sender<()>,
}

/// Releases a held-back name request when dropped.
struct ReadyGate(Option<oneshot::Sender<()>>);

impl Drop for ReadyGate {
    fn drop(&mut self) {
        if let Some(ready) = self.0.take() {
            let _ = ready.send(());
        }
    }
}

struct Acquisition {
    owner: OwnerId,
    name: WellKnownName<'static>,
    task: JoinHandle<()>,
}

struct Export {
    connection: Connection,
    path: ObjectPath<'static>,
}

/// Session bus transport backed by zbus.
pub struct ZbusTransport {
    requests: DaemonEventSender,
    next_owner: u64,
    binding: Arc<Mutex<Option<Binding>>>,
    pending: Arc<Mutex<Option<PendingRequest>>>,
    acquisition: Option<Acquisition>,
    export: Option<Export>,
}

impl ZbusTransport {
    /// Create a transport whose exported object forwards calls to `requests`.
    pub fn new(requests: DaemonEventSender) -> Self {
        Self {
            requests,
            next_owner: 0,
            binding: Arc::new(Mutex::new(None)),
            pending: Arc::new(Mutex::new(None)),
            acquisition: None,
            export: None,
        }
    }

    /// Take the held-back name request of `owner`, if it is still pending.
    async fn take_gate(&self, owner: OwnerId) -> ReadyGate {
        let mut slot = self.pending.lock().await;
        match slot.take() {
            Some(pending) if pending.owner == owner => ReadyGate(Some(pending.ready)),
            other => {
                *slot = other;
                ReadyGate(None)
            }
        }
    }
}

impl Transport for ZbusTransport {
    fn own_name(
        &mut self,
        name: &str,
        events: DaemonEventSender,
    ) -> Result<OwnerId, TransportError> {
        let name = WellKnownName::try_from(name)
            .map_err(|e| TransportError::InvalidAddress(format!("{}: {}", name, e)))?
            .into_owned();

        if let Some(previous) = self.acquisition.take() {
            previous.task.abort();
        }

        self.next_owner += 1;
        let owner = OwnerId(self.next_owner);
        let task = tokio::spawn(acquire_name(
            owner,
            name.clone(),
            self.binding.clone(),
            self.pending.clone(),
            events,
        ));
        self.acquisition = Some(Acquisition { owner, name, task });

        Ok(owner)
    }

    async fn export(&mut self, owner: OwnerId, path: &str) -> Result<(), TransportError> {
        // The name is requested once this is dropped, whatever the outcome
        let _gate = self.take_gate(owner).await;

        let path = ObjectPath::try_from(path)
            .map_err(|e| TransportError::InvalidAddress(format!("{}: {}", path, e)))?
            .into_owned();

        let connection = match self.binding.lock().await.as_ref() {
            Some(binding) if binding.owner == owner => binding.connection.clone(),
            Some(_) => return Err(TransportError::NotOwned),
            None => return Err(TransportError::NotConnected),
        };

        if self.export.is_some() {
            return Err(TransportError::AlreadyExported(path.to_string()));
        }

        let interface = BridgeInterface::new(self.requests.clone());
        if !connection.object_server().at(path.clone(), interface).await? {
            return Err(TransportError::AlreadyExported(path.to_string()));
        }

        self.export = Some(Export { connection, path });
        Ok(())
    }

    async fn unexport(&mut self) -> Result<(), TransportError> {
        let export = self.export.take().ok_or(TransportError::NotExported)?;
        let removed = export
            .connection
            .object_server()
            .remove::<BridgeInterface, _>(export.path)
            .await?;

        if removed {
            Ok(())
        } else {
            Err(TransportError::NotExported)
        }
    }

    async fn unown_name(&mut self, owner: OwnerId) -> Result<(), TransportError> {
        let acquisition = match self.acquisition.take() {
            Some(acquisition) if acquisition.owner == owner => acquisition,
            other => {
                self.acquisition = other;
                return Err(TransportError::NotOwned);
            }
        };
        acquisition.task.abort();
        self.pending.lock().await.take();

        let binding = self.binding.lock().await.take();
        if let Some(binding) = binding.filter(|b| b.owner == owner) {
            let released = binding.connection.release_name(acquisition.name).await?;
            debug!(released, "Released bus name");
        }

        Ok(())
    }

    async fn emit_windows_changed(&self, windows_json: &str) -> Result<(), TransportError> {
        let export = self.export.as_ref().ok_or(TransportError::NotExported)?;
        let emitter = SignalEmitter::new(&export.connection, export.path.clone())?;
        BridgeInterface::windows_changed(&emitter, windows_json).await?;
        Ok(())
    }
}

/// Connect, hand the connection to the control loop, then request the name.
async fn acquire_name(
    owner: OwnerId,
    name: WellKnownName<'static>,
    binding: Arc<Mutex<Option<Binding>>>,
    pending: Arc<Mutex<Option<PendingRequest>>>,
    events: DaemonEventSender,
) {
    let connection = match Connection::session().await {
        Ok(connection) => connection,
        Err(e) => {
            let _ = events.send(
                BusEvent::NameLost {
                    owner,
                    reason: format!("no session bus: {}", e),
                }
                .into(),
            );
            return;
        }
    };

    let (ready_tx, ready_rx) = oneshot::channel();
    *pending.lock().await = Some(PendingRequest {
        owner,
        ready: ready_tx,
    });
    *binding.lock().await = Some(Binding {
        owner,
        connection: connection.clone(),
    });

    if events.send(BusEvent::Connected(owner).into()).is_err() {
        return;
    }

    // Sender dropped means unown is tearing this request down
    if ready_rx.await.is_err() {
        return;
    }

    let event = match connection.request_name(name).await {
        Ok(()) => BusEvent::NameAcquired(owner),
        Err(e) => BusEvent::NameLost {
            owner,
            reason: e.to_string(),
        },
    };
    let _ = events.send(event.into());
}
