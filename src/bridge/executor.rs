//! Imperative window and workspace actions.
//!
//! Every action resolves its target through the [`Accessor`] first. A handle
//! that does not resolve to a live normal window fails before anything is
//! touched.

use std::sync::Arc;

use tracing::debug;

use super::accessor::Accessor;
use crate::desktop::{MaximizeFlags, Rect, WindowHandle};
use crate::error::CommandError;
use crate::process::AppLauncher;

/// Applies one command against one target.
pub struct Executor {
    accessor: Accessor,
    launcher: Arc<dyn AppLauncher>,
}

impl Executor {
    pub fn new(accessor: Accessor, launcher: Arc<dyn AppLauncher>) -> Self {
        Self { accessor, launcher }
    }

    fn timestamp(&self) -> u32 {
        self.accessor.session().current_time()
    }

    /// Raise and focus a window.
    pub fn focus(&self, handle: WindowHandle) -> Result<(), CommandError> {
        let window = self.accessor.find_window(handle)?;
        self.accessor
            .session()
            .activate(&window, self.timestamp())?;
        Ok(())
    }

    /// Ask a window to close. Success means the request was sent.
    pub fn close(&self, handle: WindowHandle) -> Result<(), CommandError> {
        let window = self.accessor.find_window(handle)?;
        self.accessor.session().delete(&window, self.timestamp())?;
        Ok(())
    }

    /// Unmaximize on both axes, then apply the frame.
    pub fn move_resize(&self, handle: WindowHandle, frame: Rect) -> Result<(), CommandError> {
        let window = self.accessor.find_window(handle)?;
        let session = self.accessor.session();
        // A maximized window ignores resize requests.
        session.unmaximize(&window, MaximizeFlags::BOTH)?;
        session.move_resize_frame(&window, frame)?;
        Ok(())
    }

    pub fn minimize(&self, handle: WindowHandle) -> Result<(), CommandError> {
        let window = self.accessor.find_window(handle)?;
        self.accessor.session().minimize(&window)?;
        Ok(())
    }

    /// Maximize or restore on both axes together.
    pub fn set_maximized(&self, handle: WindowHandle, maximize: bool) -> Result<(), CommandError> {
        let window = self.accessor.find_window(handle)?;
        let session = self.accessor.session();
        if maximize {
            session.maximize(&window, MaximizeFlags::BOTH)?;
        } else {
            session.unmaximize(&window, MaximizeFlags::BOTH)?;
        }
        Ok(())
    }

    /// Activate the workspace at `index`, which must be in `0..count`.
    pub fn switch_workspace(&self, index: i32) -> Result<(), CommandError> {
        let (count, _) = self.accessor.list_workspaces()?;
        let target = u32::try_from(index)
            .ok()
            .filter(|i| *i < count)
            .ok_or(CommandError::WorkspaceOutOfRange { index, count })?;

        self.accessor
            .workspaces()
            .activate_workspace(target, self.timestamp())?;
        Ok(())
    }

    /// Launch a command line like the desktop would, falling back to the shell.
    pub fn launch_app(&self, command_line: &str) -> Result<(), CommandError> {
        let desktop = match self.launcher.launch_command_line(command_line) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        debug!(error = %desktop, "Desktop launch failed, trying the shell");

        self.launcher
            .spawn_shell(command_line)
            .map_err(|shell| CommandError::LaunchFailed { desktop, shell })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desktop::WindowInfo;
    use crate::test_utils::{FakeDesktop, FakeLauncher, backend, window};

    fn executor(fake: &Arc<FakeDesktop>, launcher: Arc<FakeLauncher>) -> Executor {
        Executor::new(Accessor::new(backend(fake)), launcher)
    }

    #[test]
    fn test_unknown_handle_touches_nothing() {
        let fake = FakeDesktop::with_windows(vec![window(7, "Editor")]);
        let executor = executor(&fake, Arc::new(FakeLauncher::default()));
        let missing = WindowHandle(99);

        assert!(executor.focus(missing).unwrap_err().is_not_found());
        assert!(executor.close(missing).unwrap_err().is_not_found());
        assert!(
            executor
                .move_resize(missing, Rect::new(0, 0, 10, 10))
                .unwrap_err()
                .is_not_found()
        );
        assert!(executor.minimize(missing).unwrap_err().is_not_found());
        assert!(
            executor
                .set_maximized(missing, true)
                .unwrap_err()
                .is_not_found()
        );

        assert!(fake.calls().is_empty());
        assert_eq!(fake.window(WindowHandle(7)), Some(window(7, "Editor")));
    }

    #[test]
    fn test_move_resize_unmaximizes_first() {
        let fake = FakeDesktop::with_windows(vec![WindowInfo {
            maximized: MaximizeFlags::BOTH,
            ..window(7, "Editor")
        }]);
        let executor = executor(&fake, Arc::new(FakeLauncher::default()));

        executor
            .move_resize(WindowHandle(7), Rect::new(10, 20, 800, 600))
            .unwrap();

        assert_eq!(fake.calls(), vec!["unmaximize 7", "move_resize 7"]);
        let moved = fake.window(WindowHandle(7)).unwrap();
        assert!(!moved.maximized.is_any());
        assert_eq!(moved.frame, Rect::new(10, 20, 800, 600));
    }

    #[test]
    fn test_set_maximized_uses_both_axes() {
        let fake = FakeDesktop::with_windows(vec![window(3, "Term")]);
        let executor = executor(&fake, Arc::new(FakeLauncher::default()));

        executor.set_maximized(WindowHandle(3), true).unwrap();
        assert_eq!(
            fake.window(WindowHandle(3)).unwrap().maximized,
            MaximizeFlags::BOTH
        );

        executor.set_maximized(WindowHandle(3), false).unwrap();
        assert_eq!(
            fake.window(WindowHandle(3)).unwrap().maximized,
            MaximizeFlags::NONE
        );
    }

    #[test]
    fn test_focus_and_close() {
        let fake = FakeDesktop::with_windows(vec![window(1, "A"), window(2, "B")]);
        let executor = executor(&fake, Arc::new(FakeLauncher::default()));

        executor.focus(WindowHandle(2)).unwrap();
        assert!(fake.window(WindowHandle(2)).unwrap().focused);

        executor.close(WindowHandle(1)).unwrap();
        assert_eq!(fake.window(WindowHandle(1)), None);
    }

    #[test]
    fn test_session_failure_is_not_not_found() {
        let fake = FakeDesktop::with_windows(vec![window(1, "A")]);
        fake.fail_actions(true);
        let executor = executor(&fake, Arc::new(FakeLauncher::default()));

        let err = executor.minimize(WindowHandle(1)).unwrap_err();
        assert!(matches!(err, CommandError::Session(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_switch_workspace_bounds() {
        let fake = FakeDesktop::with_windows(vec![]);
        fake.set_workspaces(2, 0);
        let executor = executor(&fake, Arc::new(FakeLauncher::default()));

        for index in [-1, 2, 5, i32::MIN, i32::MAX] {
            assert!(matches!(
                executor.switch_workspace(index),
                Err(CommandError::WorkspaceOutOfRange { count: 2, .. })
            ));
        }
        assert_eq!(fake.active_workspace(), 0);

        executor.switch_workspace(1).unwrap();
        assert_eq!(fake.active_workspace(), 1);
    }

    #[test]
    fn test_launch_prefers_desktop_launch() {
        let fake = FakeDesktop::with_windows(vec![]);
        let launcher = Arc::new(FakeLauncher::default());
        let executor = executor(&fake, launcher.clone());

        executor.launch_app("gnome-calculator").unwrap();
        assert_eq!(launcher.calls(), vec!["launch gnome-calculator"]);
    }

    #[test]
    fn test_launch_falls_back_to_shell() {
        let fake = FakeDesktop::with_windows(vec![]);
        let launcher = Arc::new(FakeLauncher::failing(true, false));
        let executor = executor(&fake, launcher.clone());

        executor.launch_app("echo hi > /tmp/x").unwrap();
        assert_eq!(
            launcher.calls(),
            vec!["launch echo hi > /tmp/x", "shell echo hi > /tmp/x"]
        );
    }

    #[test]
    fn test_launch_fails_when_both_tiers_fail() {
        let fake = FakeDesktop::with_windows(vec![]);
        let launcher = Arc::new(FakeLauncher::failing(true, true));
        let executor = executor(&fake, launcher);

        assert!(matches!(
            executor.launch_app("nothing"),
            Err(CommandError::LaunchFailed { .. })
        ));
    }
}
