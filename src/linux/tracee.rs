use crate::Error;
use libc::user_regs_struct;
use nix::sys::ptrace;
use nix::sys::signal::Signal;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::Pid;
use std::fs::{File, OpenOptions};

/// The operations the debugger needs from the operating system's tracing facility.
///
/// Every method assumes the process is stopped under trace, except [`Inferior::wait`], which
/// blocks until a resumed process stops again.
pub trait Inferior {
    /// Returns the process ID.
    fn pid(&self) -> Pid;

    /// Reads the word at the virtual address.
    fn read_word(&self, address: u64) -> nix::Result<u64>;

    /// Writes the word to the virtual address.
    fn write_word(&mut self, address: u64, word: u64) -> nix::Result<()>;

    /// Fetches the full register snapshot.
    fn snapshot(&self) -> nix::Result<user_regs_struct>;

    /// Stores the full register snapshot.
    fn set_snapshot(&mut self, snapshot: user_regs_struct) -> nix::Result<()>;

    /// Resumes execution, delivering `signal` if given.
    fn resume(&mut self, signal: Option<Signal>) -> nix::Result<()>;

    /// Executes a single instruction, delivering `signal` if given.
    fn step(&mut self, signal: Option<Signal>) -> nix::Result<()>;

    /// Blocks until the process changes state.
    fn wait(&mut self) -> nix::Result<WaitStatus>;
}

/// The tracee is the process that is currently being traced.
#[derive(Debug)]
pub struct Tracee {
    pub(crate) pid: Pid,
    pub(crate) file: File,
}

impl Tracee {
    /// Wraps a process that is already stopped under trace by this process.
    pub fn new(pid: Pid) -> Result<Self, Error> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(false)
            .open(format!("/proc/{pid}/mem"))?;

        Ok(Self {
            pid,
            file,
        })
    }
}

impl Inferior for Tracee {
    fn pid(&self) -> Pid {
        self.pid
    }

    fn read_word(&self, address: u64) -> nix::Result<u64> {
        let mut bytes = [0u8; 8];
        self.read_exact(address, &mut bytes)?;

        Ok(u64::from_le_bytes(bytes))
    }

    fn write_word(&mut self, address: u64, word: u64) -> nix::Result<()> {
        self.write_all(address, &word.to_le_bytes())
    }

    fn snapshot(&self) -> nix::Result<user_regs_struct> {
        ptrace::getregs(self.pid)
    }

    fn set_snapshot(&mut self, snapshot: user_regs_struct) -> nix::Result<()> {
        ptrace::setregs(self.pid, snapshot)
    }

    fn resume(&mut self, signal: Option<Signal>) -> nix::Result<()> {
        ptrace::cont(self.pid, signal)
    }

    fn step(&mut self, signal: Option<Signal>) -> nix::Result<()> {
        ptrace::step(self.pid, signal)
    }

    fn wait(&mut self) -> nix::Result<WaitStatus> {
        waitpid(self.pid, None)
    }
}
