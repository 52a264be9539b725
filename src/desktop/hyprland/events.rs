//! Reader for Hyprland's event socket (`.socket2.sock`).
//!
//! One connection and one reader thread serve every subscription, so events
//! reach the control channel in the order Hyprland wrote them. Lines look
//! like `openwindow>>ADDRESS,WORKSPACE,CLASS,TITLE`.

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{debug, warn};

use crate::desktop::{DesktopSignal, SubscriptionId};
use crate::error::SessionError;
use crate::events::{DaemonEvent, DaemonEventSender};

/// Live subscriptions, shared between the session and the reader thread.
pub(super) type Subscribers = Arc<Mutex<HashMap<SubscriptionId, (DesktopSignal, DaemonEventSender)>>>;

/// A running event reader.
pub(super) struct EventReader {
    stream: UnixStream,
    running: Arc<AtomicBool>,
}

impl EventReader {
    /// Connect to the event socket and fan events out to `subscribers`.
    pub(super) fn spawn(path: &Path, subscribers: Subscribers) -> Result<Self, SessionError> {
        let stream = UnixStream::connect(path)?;
        let reader_stream = stream.try_clone()?;
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        thread::Builder::new()
            .name("hyprland-events".into())
            .spawn(move || read_events(reader_stream, subscribers, running_clone))?;

        Ok(Self { stream, running })
    }

    /// Stop the reader. Shutting the socket down unblocks the pending read.
    pub(super) fn stop(self) {
        self.running.store(false, Ordering::Relaxed);
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            debug!("Event socket already closed: {}", e);
        }
    }
}

fn read_events(stream: UnixStream, subscribers: Subscribers, running: Arc<AtomicBool>) {
    for line in BufReader::new(stream).lines() {
        if !running.load(Ordering::Relaxed) {
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Hyprland event socket error: {}", e);
                break;
            }
        };
        let Some(signal) = parse_event(&line) else {
            continue;
        };
        let Ok(subscribers) = subscribers.lock() else {
            warn!("Subscriber table poisoned, reader exiting");
            break;
        };
        for (subscribed, sink) in subscribers.values() {
            if *subscribed == signal && sink.send(DaemonEvent::Desktop(signal)).is_err() {
                debug!(signal = signal.name(), "Event channel closed");
            }
        }
    }
    debug!("Hyprland event reader stopped");
}

/// The signal an event line belongs to, if any.
pub(super) fn parse_event(line: &str) -> Option<DesktopSignal> {
    let (name, _data) = line.split_once(">>")?;
    match name {
        "openwindow" => Some(DesktopSignal::WindowCreated),
        "closewindow" => Some(DesktopSignal::WindowDestroyed),
        _ => None,
    }
}
