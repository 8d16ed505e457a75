//! The process controller.
//!
//! [`Debugger`] owns the breakpoints of one traced process and is the only place that resumes,
//! steps, or waits on it. Every resume is immediately followed by a wait, so all other
//! operations run against a stopped process.

use crate::arch::x86_64::Register;
use crate::breakpoint::Breakpoint;
use crate::linux::registers;
use crate::{Error, Event, Inferior, Tracee};
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use std::collections::HashMap;

/// Controls a single traced process that is stopped when handed over.
#[derive(Debug)]
pub struct Debugger<T: Inferior = Tracee> {
    program: String,
    inferior: T,
    breakpoints: HashMap<u64, Breakpoint>,
    // Signal from the last stop that still has to be delivered to the process.
    pending_signal: Option<Signal>,
    // Set once the process has exited or was killed.
    terminated: Option<Event>,
}

impl<T: Inferior> Debugger<T> {
    /// Takes control of a process that is stopped under trace. `program` is only used for
    /// diagnostics.
    pub fn new(program: impl Into<String>, inferior: T) -> Self {
        Self {
            program: program.into(),
            inferior,
            breakpoints: HashMap::new(),
            pending_signal: None,
            terminated: None,
        }
    }

    pub fn pid(&self) -> Pid {
        self.inferior.pid()
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn inferior(&self) -> &T {
        &self.inferior
    }

    pub fn inferior_mut(&mut self) -> &mut T {
        &mut self.inferior
    }

    /// Returns how the process terminated, if it has.
    pub fn terminated(&self) -> Option<Event> {
        self.terminated
    }

    pub fn has_exited(&self) -> bool {
        self.terminated.is_some()
    }

    /// Returns the breakpoint tracked at the address.
    pub fn breakpoint(&self, address: u64) -> Option<&Breakpoint> {
        self.breakpoints.get(&address)
    }

    /// Iterates over the tracked breakpoints, ordered by address.
    pub fn breakpoints(&self) -> impl Iterator<Item = &Breakpoint> {
        let mut breakpoints: Vec<_> = self.breakpoints.values().collect();
        breakpoints.sort_by_key(|breakpoint| breakpoint.address());

        breakpoints.into_iter()
    }

    /// Sets a breakpoint at the address. Setting a breakpoint twice is a no-op. The breakpoint
    /// is only tracked once the trap has been written.
    pub fn set_breakpoint_at_address(&mut self, address: u64) -> Result<(), Error> {
        if let Some(breakpoint) = self.breakpoints.get_mut(&address) {
            tracing::debug!(address = format_args!("{address:#x}"), "breakpoint already set");

            // A failed step-over can leave a tracked breakpoint disabled.
            return breakpoint.enable(&mut self.inferior);
        }

        let mut breakpoint = Breakpoint::new(self.inferior.pid(), address);
        breakpoint.enable(&mut self.inferior)?;
        self.breakpoints.insert(address, breakpoint);

        Ok(())
    }

    /// Restores the original instruction at the address and forgets the breakpoint. The
    /// breakpoint stays tracked if the instruction could not be restored.
    ///
    /// If the process just trapped on the breakpoint, the program counter is rewound to the
    /// address so the restored instruction runs on the next continue.
    pub fn remove_breakpoint(&mut self, address: u64) -> Result<(), Error> {
        let enabled = self
            .breakpoints
            .get(&address)
            .ok_or(Error::NoBreakpoint(address))?
            .is_enabled();

        let trapped = enabled
            && !self.has_exited()
            && self.get_program_counter()? == address.wrapping_add(1);

        self.with_breakpoint(address, |breakpoint, inferior| breakpoint.disable(inferior))?;

        if trapped {
            self.set_program_counter(address)?;
        }

        self.breakpoints.remove(&address);

        tracing::debug!(address = format_args!("{address:#x}"), trapped, "removed breakpoint");

        Ok(())
    }

    /// Resumes the process until it stops or terminates.
    ///
    /// If the process sits on a breakpoint, the original instruction is executed first. A
    /// signal the process stopped with is delivered on resume.
    pub fn continue_execution(&mut self) -> Result<Event, Error> {
        self.ensure_alive()?;

        if let Some(event) = self.step_over_breakpoint()? {
            if !event.is_stopped() {
                return Ok(event);
            }
        }

        let pid = self.pid();

        self.inferior
            .resume(self.pending_signal)
            .map_err(|source| Error::Resume { pid, source })?;

        tracing::debug!(%pid, signal = ?self.pending_signal, "resumed");
        self.pending_signal = None;

        self.wait_for_signal()
    }

    /// Executes the original instruction of the breakpoint the process just trapped on and
    /// re-arms the breakpoint.
    ///
    /// A trap leaves the program counter one byte past the patched address. If an enabled
    /// breakpoint sits there, the program counter is rewound, the original byte restored, one
    /// instruction executed, and the trap written back. Returns the event of the single step,
    /// or `None` if there was no breakpoint to step over.
    pub fn step_over_breakpoint(&mut self) -> Result<Option<Event>, Error> {
        self.ensure_alive()?;

        let candidate = self.get_program_counter()?.wrapping_sub(1);

        match self.breakpoints.get(&candidate) {
            Some(breakpoint) if breakpoint.is_enabled() => (),
            _ => return Ok(None),
        }

        self.set_program_counter(candidate)?;
        self.with_breakpoint(candidate, |breakpoint, inferior| breakpoint.disable(inferior))?;

        let pid = self.pid();

        self.inferior
            .step(None)
            .map_err(|source| Error::SingleStep { pid, source })?;

        let event = self.wait_for_signal()?;

        // Nothing is left to patch if the instruction ended the process.
        if event.is_stopped() {
            self.with_breakpoint(candidate, |breakpoint, inferior| breakpoint.enable(inferior))?;
        }

        tracing::debug!(%pid, address = format_args!("{candidate:#x}"), ?event, "stepped over breakpoint");

        Ok(Some(event))
    }

    /// Blocks until the process changes state.
    pub fn wait_for_signal(&mut self) -> Result<Event, Error> {
        let pid = self.pid();

        let status = self.inferior.wait().map_err(|source| {
            tracing::warn!(%pid, program = %self.program, %source, "wait failed");

            Error::Wait { pid, source }
        })?;

        let event = match Event::from_status(status) {
            Some((stopped, event)) if stopped == pid => event,
            _ => {
                tracing::warn!(%pid, program = %self.program, ?status, "unexpected wait status");

                return Err(Error::UnexpectedStatus {
                    pid,
                    status: format!("{status:?}"),
                });
            }
        };

        match event {
            Event::Stopped(_) => self.pending_signal = event.pending_signal(),
            Event::Exited(_) | Event::Killed(_) => {
                self.pending_signal = None;
                self.terminated = Some(event);
            }
        }

        tracing::debug!(%pid, ?event, "process changed state");

        Ok(event)
    }

    pub fn get_program_counter(&self) -> Result<u64, Error> {
        registers::value_of(&self.inferior, Register::Rip)
    }

    pub fn set_program_counter(&mut self, value: u64) -> Result<(), Error> {
        registers::set_value(&mut self.inferior, Register::Rip, value)
    }

    pub fn read_register(&self, register: Register) -> Result<u64, Error> {
        registers::value_of(&self.inferior, register)
    }

    pub fn write_register(&mut self, register: Register, value: u64) -> Result<(), Error> {
        registers::set_value(&mut self.inferior, register, value)
    }

    /// Reads every register from a single snapshot.
    pub fn dump_registers(&self) -> Result<Vec<(Register, u64)>, Error> {
        registers::dump(&self.inferior)
    }

    /// Reads the word at the address. Breakpoints show up as the trap byte.
    pub fn read_memory(&self, address: u64) -> Result<u64, Error> {
        self.inferior
            .read_word(address)
            .map_err(|source| Error::ReadMemory { address, source })
    }

    /// Writes the word to the address.
    pub fn write_memory(&mut self, address: u64, value: u64) -> Result<(), Error> {
        self.inferior
            .write_word(address, value)
            .map_err(|source| Error::WriteMemory { address, source })
    }

    fn ensure_alive(&self) -> Result<(), Error> {
        match self.terminated {
            Some(_) => Err(Error::Exited(self.pid())),
            None => Ok(()),
        }
    }

    fn with_breakpoint(
        &mut self,
        address: u64,
        f: impl FnOnce(&mut Breakpoint, &mut T) -> Result<(), Error>,
    ) -> Result<(), Error> {
        match self.breakpoints.get_mut(&address) {
            Some(breakpoint) => f(breakpoint, &mut self.inferior),
            None => Err(Error::NoBreakpoint(address)),
        }
    }
}
