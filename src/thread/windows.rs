//! Windows platform layer for thread utilities.

use windows_sys::Win32::System::Threading::SwitchToThread;

/// Yields the processor using `SwitchToThread`.
///
/// A zero return only means no other thread was ready to run.
pub(crate) fn sys_yield() {
    unsafe { SwitchToThread() };
}
