//! Signals to the worker by pid. Usable without the `Child` handle, which the
//! session task owns.

/// Ask the worker to exit. Returns whether the signal was delivered.
#[cfg(unix)]
pub fn terminate(pid: u32) -> bool {
    send_signal(pid, libc::SIGTERM)
}

/// Kill the worker outright. Returns whether the signal was delivered.
#[cfg(unix)]
pub fn kill(pid: u32) -> bool {
    send_signal(pid, libc::SIGKILL)
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: libc::c_int) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }
    // SAFETY: kill(2) has no memory-safety preconditions; pid is a positive
    // single-process id, never a group or broadcast target.
    let result = unsafe { libc::kill(pid, signal) };
    if result != 0 {
        tracing::debug!(pid, signal, error = %std::io::Error::last_os_error(), "Signal not delivered");
    }
    result == 0
}

#[cfg(not(unix))]
pub fn terminate(_pid: u32) -> bool {
    false
}

#[cfg(not(unix))]
pub fn kill(_pid: u32) -> bool {
    false
}
