use libc::sched_yield;

/// Yields the processor using `sched_yield(2)`.
///
/// The return value is ignored: errors carry no actionable information.
pub(crate) fn sys_yield() {
    unsafe { sched_yield() };
}
