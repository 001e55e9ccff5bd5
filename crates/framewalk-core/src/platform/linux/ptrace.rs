//! Thin safe wrappers over the `ptrace(2)` and `waitpid(2)` calls we use.
//!
//! See: [ptrace(2) man page](https://man7.org/linux/man-pages/man2/ptrace.2.html)

use std::{io, mem, ptr};

use libc::{c_void, pid_t};

use crate::types::{Address, StackFrame};

/// `NT_PRSTATUS` regset: general purpose registers.
const NT_PRSTATUS: usize = 1;

/// Where a seized thread is, as far as `waitpid` knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitState
{
    /// No state change reported yet.
    Running,
    /// The thread is in a ptrace-stop.
    Stopped,
    /// The thread exited or was killed.
    Gone,
}

fn check(result: libc::c_long) -> io::Result<()>
{
    if result == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// `PTRACE_SEIZE`: become the tracer of `tid` without stopping it.
pub(crate) fn seize(tid: pid_t) -> io::Result<()>
{
    // SAFETY: PTRACE_SEIZE takes no pointers; addr and data are ignored/zero.
    check(unsafe { libc::ptrace(libc::PTRACE_SEIZE, tid, ptr::null_mut::<c_void>(), ptr::null_mut::<c_void>()) })
}

/// `PTRACE_INTERRUPT`: ask a seized thread to enter a ptrace-stop.
pub(crate) fn interrupt(tid: pid_t) -> io::Result<()>
{
    // SAFETY: no pointers are passed.
    check(unsafe {
        libc::ptrace(
            libc::PTRACE_INTERRUPT,
            tid,
            ptr::null_mut::<c_void>(),
            ptr::null_mut::<c_void>(),
        )
    })
}

/// `PTRACE_DETACH`: stop tracing `tid` and let it run.
pub(crate) fn detach(tid: pid_t) -> io::Result<()>
{
    // SAFETY: no pointers are passed; data = 0 means no signal is injected.
    check(unsafe { libc::ptrace(libc::PTRACE_DETACH, tid, ptr::null_mut::<c_void>(), ptr::null_mut::<c_void>()) })
}

/// Non-blocking `waitpid` on a traced thread.
pub(crate) fn poll_state(tid: pid_t) -> io::Result<WaitState>
{
    let mut status: libc::c_int = 0;
    // SAFETY: `status` is a valid, writable c_int for the duration of the call.
    let result = unsafe { libc::waitpid(tid, &mut status, libc::WNOHANG | libc::__WALL) };
    match result {
        -1 => Err(io::Error::last_os_error()),
        0 => Ok(WaitState::Running),
        _ if libc::WIFSTOPPED(status) => Ok(WaitState::Stopped),
        _ if libc::WIFEXITED(status) || libc::WIFSIGNALED(status) => Ok(WaitState::Gone),
        _ => Ok(WaitState::Running),
    }
}

/// Read the general purpose registers of a stopped thread and pick out the
/// instruction and frame pointer.
pub(crate) fn read_frame(tid: pid_t) -> io::Result<StackFrame>
{
    // SAFETY: user_regs_struct is plain old data; all-zero is a valid value.
    let mut regs: libc::user_regs_struct = unsafe { mem::zeroed() };
    let mut iov = libc::iovec {
        iov_base: ptr::addr_of_mut!(regs).cast::<c_void>(),
        iov_len: mem::size_of::<libc::user_regs_struct>(),
    };
    // SAFETY: `iov` points at `regs`, which outlives the call, and iov_len is
    // its exact size. The kernel writes at most iov_len bytes.
    check(unsafe {
        libc::ptrace(
            libc::PTRACE_GETREGSET,
            tid,
            NT_PRSTATUS as *mut c_void,
            ptr::addr_of_mut!(iov).cast::<c_void>(),
        )
    })?;
    Ok(frame_from_regs(&regs))
}

#[cfg(target_arch = "x86_64")]
fn frame_from_regs(regs: &libc::user_regs_struct) -> StackFrame
{
    StackFrame::new(Address::from(regs.rip), Address::from(regs.rbp))
}

#[cfg(target_arch = "aarch64")]
fn frame_from_regs(regs: &libc::user_regs_struct) -> StackFrame
{
    // x29 is the frame pointer in the AAPCS64 frame record convention.
    StackFrame::new(Address::from(regs.pc), Address::from(regs.regs[29]))
}
