//! Signal delivery to agent subprocesses

use std::io;

use crate::types::TerminationSignal;

/// Deliver `sig` to the process `pid`
#[cfg(unix)]
pub(crate) fn send(pid: u32, sig: TerminationSignal) -> io::Result<()> {
    let signum = match sig {
        TerminationSignal::Term => libc::SIGTERM,
        TerminationSignal::Kill => libc::SIGKILL,
    };
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;

    // SAFETY: kill(2) has no memory-safety preconditions.
    if unsafe { libc::kill(pid, signum) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Deliver `sig` to the process `pid`
///
/// Windows has no signals; both variants end the process, `Term` without `/F`.
#[cfg(windows)]
pub(crate) fn send(pid: u32, sig: TerminationSignal) -> io::Result<()> {
    let mut cmd = std::process::Command::new("taskkill");
    cmd.args(["/PID", &pid.to_string()]);
    if sig == TerminationSignal::Kill {
        cmd.arg("/F");
    }
    let output = cmd.output()?;
    if output.status.success() {
        Ok(())
    } else {
        Err(io::Error::other(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ))
    }
}

#[cfg(not(any(unix, windows)))]
pub(crate) fn send(_pid: u32, _sig: TerminationSignal) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "signals are not supported on this platform",
    ))
}
