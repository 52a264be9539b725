//! Helpers shared by the desktop backends and the accessor.

use super::{WindowHandle, WindowInfo, WindowType};

/// Whether a window may be exposed by the bridge.
///
/// Only top-level windows of normal type that do not skip the taskbar are
/// ever reported, in queries and in change notifications alike.
pub fn is_normal_window(window: &WindowInfo) -> bool {
    window.window_type == WindowType::Normal && !window.skip_taskbar
}

/// Fold a hex compositor address (e.g. "0x55d2a3b4c5e0") into a window handle.
///
/// The two 32-bit halves are xor-ed so that addresses from one allocator
/// arena stay distinct. Returns `None` for unparsable addresses and for the
/// reserved value 0.
pub fn fold_address(address: &str) -> Option<WindowHandle> {
    let hex = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);
    let value = u64::from_str_radix(hex, 16).ok()?;
    let folded = (value ^ (value >> 32)) as u32;
    (folded != 0).then_some(WindowHandle(folded))
}
