use crate::{Error, Tracee};
use nix::sys::ptrace;
use nix::sys::signal::Signal;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::Pid;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command};

/// Spawns and traces the process using the provided [`std::process::Command`].
///
/// Returns once the new program is stopped at the trap the kernel raises after `execve`,
/// before it has executed a single instruction. The [`Child`] stays with the caller, which
/// is responsible for reaping the process.
pub fn spawn(mut command: Command) -> Result<(Child, Tracee), Error> {
    unsafe {
        command.pre_exec(|| {
            ptrace::traceme()?;

            Ok(())
        });
    }

    let mut child = command.spawn()?;
    let pid = Pid::from_raw(child.id() as i32);

    match waitpid(pid, None)? {
        WaitStatus::Stopped(_, Signal::SIGTRAP) => (),
        status => {
            let _ = child.kill();
            let _ = child.wait();

            return Err(Error::UnexpectedStatus {
                pid,
                status: format!("{status:?}"),
            });
        }
    }

    // Take the tracee down with us if the debugger dies first.
    ptrace::setoptions(pid, ptrace::Options::PTRACE_O_EXITKILL)?;

    let tracee = Tracee::new(pid)?;

    tracing::debug!(%pid, program = ?command.get_program(), "spawned tracee");

    Ok((child, tracee))
}
