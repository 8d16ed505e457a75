//! This module implements the error type used throughout this crate.

use nix::errno::Errno;
use nix::unistd::Pid;
use std::fmt;
use thiserror::Error;

/// The half of a register snapshot round-trip that failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SnapshotStep {
    /// Fetching the register file from the stopped tracee.
    Fetch,
    /// Writing the modified register file back.
    Store,
}

impl fmt::Display for SnapshotStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => f.write_str("fetch"),
            Self::Store => f.write_str("store"),
        }
    }
}

/// The memory access of a breakpoint patch that failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PatchStep {
    /// Reading the word at the breakpoint address.
    Read,
    /// Writing the patched or restored word back.
    Write,
}

impl fmt::Display for PatchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("reading"),
            Self::Write => f.write_str("writing"),
        }
    }
}

/// The error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The register snapshot could not be fetched or stored. The tracee is no longer stopped
    /// under our control, so the session cannot continue.
    #[error("process {pid} is no longer traceable: failed to {step} registers while accessing {register}: {source}")]
    TargetUnreachable {
        pid: Pid,
        step: SnapshotStep,
        register: &'static str,
        #[source]
        source: Errno,
    },

    /// A word of tracee memory could not be read.
    #[error("failed to read memory at {address:#x}: {source}")]
    ReadMemory {
        address: u64,
        #[source]
        source: Errno,
    },

    /// A word of tracee memory could not be written.
    #[error("failed to write memory at {address:#x}: {source}")]
    WriteMemory {
        address: u64,
        #[source]
        source: Errno,
    },

    /// Installing the trap instruction failed.
    #[error("failed to set breakpoint at {address:#x} while {step} the address: {source}")]
    EnableBreakpoint {
        address: u64,
        step: PatchStep,
        #[source]
        source: Errno,
    },

    /// Restoring the original instruction failed.
    #[error("failed to disable breakpoint at {address:#x} while {step} the address: {source}")]
    DisableBreakpoint {
        address: u64,
        step: PatchStep,
        #[source]
        source: Errno,
    },

    /// No breakpoint is tracked at the address.
    #[error("no breakpoint at {0:#x}")]
    NoBreakpoint(u64),

    /// The tracee could not be resumed.
    #[error("failed to continue process {pid}: {source}")]
    Resume {
        pid: Pid,
        #[source]
        source: Errno,
    },

    /// The tracee could not be single-stepped.
    #[error("failed to single-step process {pid}: {source}")]
    SingleStep {
        pid: Pid,
        #[source]
        source: Errno,
    },

    /// Waiting for the tracee to change state failed.
    #[error("failed to wait for process {pid}: {source}")]
    Wait {
        pid: Pid,
        #[source]
        source: Errno,
    },

    /// The wait returned a status that does not belong to the tracee or does not describe a
    /// stop or an exit.
    #[error("unexpected status from process {pid}: {status}")]
    UnexpectedStatus {
        pid: Pid,
        status: String,
    },

    /// The tracee has already exited.
    #[error("process {0} has exited")]
    Exited(Pid),

    /// No register has the given name.
    #[error("unknown register {0:?}")]
    UnknownRegister(String),

    /// No register has the given debug-format index.
    #[error("unknown debug register index {0}")]
    UnknownDebugIndex(u16),

    /// Represents [`std::io::Error`].
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Represents [`nix::Error`].
    #[error(transparent)]
    Nix(#[from] nix::Error),
}

impl Error {
    /// Returns true if the debugging session cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::TargetUnreachable { .. })
    }
}
