//! Event handling for the daemon.
//!
//! Drains the control channel one event at a time. Bus calls, bus lifecycle
//! progress and desktop events are handled strictly in arrival order.

use tracing::debug;

use crate::bridge::{Bridge, Transport};
use crate::events::{DaemonEvent, DaemonEventReceiver};

/// Run the main event loop until shutdown, then disable the bridge.
pub async fn run_event_loop<T: Transport>(bridge: &mut Bridge<T>, event_rx: DaemonEventReceiver) {
    while let Ok(event) = event_rx.recv_async().await {
        match event {
            DaemonEvent::Call {
                request,
                response_tx,
            } => {
                let reply = bridge.dispatch(request);
                if response_tx.send(reply).is_err() {
                    debug!("Caller went away before the reply");
                }
            }
            DaemonEvent::Desktop(signal) => bridge.on_desktop_event(signal).await,
            DaemonEvent::Bus(event) => bridge.on_bus_event(event).await,
            DaemonEvent::Shutdown => break,
        }
    }

    bridge.disable().await;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::oneshot;

    use super::*;
    use crate::bridge::{BridgeState, BusEvent};
    use crate::config::BridgeConfig;
    use crate::desktop::{DesktopSignal, WindowHandle};
    use crate::events::{Reply, Request, create_daemon_channel};
    use crate::test_utils::{FakeDesktop, FakeLauncher, FakeTransport, TransportCall, backend, window};

    fn call(request: Request) -> (DaemonEvent, oneshot::Receiver<Reply>) {
        let (response_tx, response_rx) = oneshot::channel();
        (
            DaemonEvent::Call {
                request,
                response_tx,
            },
            response_rx,
        )
    }

    #[tokio::test]
    async fn test_loop_processes_in_order_and_disables() {
        let fake = FakeDesktop::with_windows(vec![window(7, "Editor")]);
        let (tx, rx) = create_daemon_channel();
        let mut bridge = Bridge::new(
            backend(&fake),
            Arc::new(FakeLauncher::default()),
            FakeTransport::default(),
            &BridgeConfig::default(),
        );
        bridge.enable(&tx);
        let owner = bridge.session().owner().unwrap();

        let (focus, focus_rx) = call(Request::FocusWindow(WindowHandle(7)));
        let (close, close_rx) = call(Request::CloseWindow(WindowHandle(7)));
        let (refocus, refocus_rx) = call(Request::FocusWindow(WindowHandle(7)));

        tx.send(BusEvent::Connected(owner).into()).unwrap();
        tx.send(focus).unwrap();
        fake.fire(DesktopSignal::WindowCreated);
        tx.send(close).unwrap();
        fake.fire(DesktopSignal::WindowDestroyed);
        tx.send(refocus).unwrap();
        tx.send(DaemonEvent::Shutdown).unwrap();

        run_event_loop(&mut bridge, rx).await;

        assert_eq!(focus_rx.await.unwrap(), Reply::Success(true));
        assert_eq!(close_rx.await.unwrap(), Reply::Success(true));
        assert_eq!(refocus_rx.await.unwrap(), Reply::Success(false));

        let emitted = bridge.session().transport().emitted();
        assert_eq!(emitted.len(), 2);
        assert!(emitted[0].contains("\"title\":\"Editor\""));
        assert_eq!(emitted[1], "[]");

        assert_eq!(bridge.session().state(), BridgeState::Disabled);
        assert_eq!(fake.subscription_count(), 0);
        assert_eq!(
            bridge.session().transport().calls().last(),
            Some(&TransportCall::UnownName(owner))
        );
    }

    #[tokio::test]
    async fn test_dropped_caller_does_not_stop_the_loop() {
        let fake = FakeDesktop::with_windows(vec![]);
        let (tx, rx) = create_daemon_channel();
        let mut bridge = Bridge::new(
            backend(&fake),
            Arc::new(FakeLauncher::default()),
            FakeTransport::default(),
            &BridgeConfig::default(),
        );

        let (abandoned, abandoned_rx) = call(Request::GetWindows);
        drop(abandoned_rx);
        let (windows, windows_rx) = call(Request::GetWindows);

        tx.send(abandoned).unwrap();
        tx.send(windows).unwrap();
        tx.send(DaemonEvent::Shutdown).unwrap();

        run_event_loop(&mut bridge, rx).await;
        assert_eq!(windows_rx.await.unwrap(), Reply::Json("[]".into()));
    }
}
