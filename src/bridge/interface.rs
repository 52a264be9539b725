//! The `org.gnome.AIBridge` bus interface.
//!
//! The exported object holds nothing but a sender into the control loop.
//! Each method call is turned into a [`Request`] and answered with the
//! [`Reply`] the loop sends back.

use tokio::sync::oneshot;
use tracing::warn;
use zbus::object_server::SignalEmitter;

use crate::desktop::{Rect, WindowHandle};
use crate::events::{DaemonEvent, DaemonEventSender, Reply, Request};

/// Object exported on the session bus.
pub struct BridgeInterface {
    requests: DaemonEventSender,
}

impl BridgeInterface {
    pub fn new(requests: DaemonEventSender) -> Self {
        Self { requests }
    }

    /// Hand a request to the control loop and wait for its reply.
    async fn call(&self, request: Request) -> Reply {
        let fallback = request.fallback_reply();
        let (response_tx, response_rx) = oneshot::channel();

        if self
            .requests
            .send(DaemonEvent::Call {
                request,
                response_tx,
            })
            .is_err()
        {
            warn!("Control loop is gone, answering with fallback");
            return fallback;
        }

        response_rx.await.unwrap_or(fallback)
    }
}

#[zbus::interface(name = "org.gnome.AIBridge")]
impl BridgeInterface {
    #[zbus(out_args("windows_json"))]
    async fn get_windows(&self) -> String {
        self.call(Request::GetWindows).await.into_json()
    }

    #[zbus(out_args("success"))]
    async fn focus_window(&self, window_id: u32) -> bool {
        self.call(Request::FocusWindow(WindowHandle(window_id)))
            .await
            .into_success()
    }

    #[zbus(out_args("success"))]
    async fn close_window(&self, window_id: u32) -> bool {
        self.call(Request::CloseWindow(WindowHandle(window_id)))
            .await
            .into_success()
    }

    #[zbus(out_args("success"))]
    async fn move_resize_window(
        &self,
        window_id: u32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> bool {
        self.call(Request::MoveResizeWindow {
            handle: WindowHandle(window_id),
            frame: Rect::new(x, y, width, height),
        })
        .await
        .into_success()
    }

    #[zbus(out_args("success"))]
    async fn minimize_window(&self, window_id: u32) -> bool {
        self.call(Request::MinimizeWindow(WindowHandle(window_id)))
            .await
            .into_success()
    }

    #[zbus(out_args("success"))]
    async fn maximize_window(&self, window_id: u32, maximize: bool) -> bool {
        self.call(Request::MaximizeWindow {
            handle: WindowHandle(window_id),
            maximize,
        })
        .await
        .into_success()
    }

    #[zbus(out_args("workspaces_json"))]
    async fn get_workspaces(&self) -> String {
        self.call(Request::GetWorkspaces).await.into_json()
    }

    #[zbus(out_args("success"))]
    async fn switch_workspace(&self, index: i32) -> bool {
        self.call(Request::SwitchWorkspace(index))
            .await
            .into_success()
    }

    #[zbus(out_args("success"))]
    async fn launch_app(&self, command: String) -> bool {
        self.call(Request::LaunchApp(command)).await.into_success()
    }

    #[zbus(out_args("window_id"))]
    async fn get_focused_window(&self) -> u32 {
        self.call(Request::GetFocusedWindow).await.into_window()
    }

    #[zbus(signal)]
    pub async fn windows_changed(
        emitter: &SignalEmitter<'_>,
        windows_json: &str,
    ) -> zbus::Result<()>;
}

/// Client side of the bridge interface.
#[zbus::proxy(
    interface = "org.gnome.AIBridge",
    default_service = "org.gnome.AIBridge",
    default_path = "/org/gnome/AIBridge"
)]
pub trait BridgeClient {
    fn get_windows(&self) -> zbus::Result<String>;

    fn focus_window(&self, window_id: u32) -> zbus::Result<bool>;

    fn close_window(&self, window_id: u32) -> zbus::Result<bool>;

    fn move_resize_window(
        &self,
        window_id: u32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> zbus::Result<bool>;

    fn minimize_window(&self, window_id: u32) -> zbus::Result<bool>;

    fn maximize_window(&self, window_id: u32, maximize: bool) -> zbus::Result<bool>;

    fn get_workspaces(&self) -> zbus::Result<String>;

    fn switch_workspace(&self, index: i32) -> zbus::Result<bool>;

    fn launch_app(&self, command: &str) -> zbus::Result<bool>;

    fn get_focused_window(&self) -> zbus::Result<u32>;

    #[zbus(signal)]
    fn windows_changed(&self, windows_json: String) -> zbus::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::create_daemon_channel;

    #[tokio::test]
    async fn test_call_round_trips_through_the_loop() {
        let (tx, rx) = create_daemon_channel();
        let interface = BridgeInterface::new(tx);

        let answer = tokio::spawn(async move {
            match rx.recv_async().await {
                Ok(DaemonEvent::Call {
                    request,
                    response_tx,
                }) => {
                    assert_eq!(request, Request::FocusWindow(WindowHandle(7)));
                    let _ = response_tx.send(Reply::Success(true));
                }
                _ => panic!("expected a call"),
            }
        });

        assert!(interface.focus_window(7).await);
        answer.await.unwrap();
    }

    #[tokio::test]
    async fn test_fallback_when_loop_is_gone() {
        let (tx, rx) = create_daemon_channel();
        drop(rx);
        let interface = BridgeInterface::new(tx);

        assert_eq!(interface.get_windows().await, "[]");
        assert_eq!(interface.get_workspaces().await, "[]");
        assert_eq!(interface.get_focused_window().await, 0);
        assert!(!interface.switch_workspace(0).await);
    }

    #[tokio::test]
    async fn test_dropped_reply_uses_fallback() {
        let (tx, rx) = create_daemon_channel();
        let interface = BridgeInterface::new(tx);

        let drop_reply = tokio::spawn(async move {
            if let Ok(DaemonEvent::Call { response_tx, .. }) = rx.recv_async().await {
                drop(response_tx);
            }
        });

        assert!(!interface.launch_app("true".to_string()).await);
        drop_reply.await.unwrap();
    }
}
