//! A simulated tracee for exercising the debugger without a real process.
//!
//! Memory is a sparse byte map. Code is modelled as a list of instruction addresses with
//! known lengths: executing an address whose current byte is `0xcc` traps with the program
//! counter one byte further, anything else advances by the instruction's length. Running past
//! `code_end` makes the process exit with status 0.

#![allow(dead_code)]

use libc::user_regs_struct;
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;
use std::collections::{HashMap, HashSet};
use trace_dbg::Inferior;

pub const PID: i32 = 4242;

pub fn blank_registers() -> user_regs_struct {
    // SAFETY: `user_regs_struct` is plain integers, so all-zero is a valid value.
    unsafe { std::mem::zeroed() }
}

pub struct FakeInferior {
    pub pid: Pid,
    pub memory: HashMap<u64, u8>,
    pub registers: user_regs_struct,
    pub lengths: HashMap<u64, u64>,
    pub code_end: u64,
    pub pending: Option<WaitStatus>,
    pub executed: Vec<u64>,
    pub resumed_with: Vec<Option<Signal>>,
    pub fail_reads: HashSet<u64>,
    pub fail_writes: HashSet<u64>,
    pub fail_snapshot: bool,
    pub fail_resume: bool,
    pub fail_step: bool,
    pub fail_wait: bool,
    pub stop_signal: Option<Signal>,
    pub foreign_status: Option<WaitStatus>,
    pub writes: usize,
}

impl FakeInferior {
    pub fn new() -> Self {
        Self {
            pid: Pid::from_raw(PID),
            memory: HashMap::new(),
            registers: blank_registers(),
            lengths: HashMap::new(),
            code_end: 0,
            pending: None,
            executed: Vec::new(),
            resumed_with: Vec::new(),
            fail_reads: HashSet::new(),
            fail_writes: HashSet::new(),
            fail_snapshot: false,
            fail_resume: false,
            fail_step: false,
            fail_wait: false,
            stop_signal: None,
            foreign_status: None,
            writes: 0,
        }
    }

    /// Maps `bytes` at `base` as code made of instructions with the given lengths, and points
    /// the program counter at `base`.
    pub fn with_code(base: u64, bytes: &[u8], lengths: &[u64]) -> Self {
        let mut inferior = Self::new();
        inferior.map(base, bytes);

        let mut address = base;
        for length in lengths {
            inferior.lengths.insert(address, *length);
            address += length;
        }

        inferior.code_end = address;
        inferior.registers.rip = base;
        inferior
    }

    pub fn map(&mut self, base: u64, bytes: &[u8]) {
        for (offset, byte) in bytes.iter().enumerate() {
            self.memory.insert(base + offset as u64, *byte);
        }
    }

    pub fn word(&self, address: u64) -> u64 {
        let bytes: Vec<u8> = (0..8).map(|offset| self.memory[&(address + offset)]).collect();
        u64::from_le_bytes(bytes.try_into().unwrap())
    }

    pub fn byte(&self, address: u64) -> u8 {
        self.memory[&address]
    }

    // Executes the instruction at the program counter and returns the status it stopped the
    // process with, if any.
    fn execute(&mut self) -> Option<WaitStatus> {
        let pc = self.registers.rip;

        if pc >= self.code_end {
            return Some(WaitStatus::Exited(self.pid, 0));
        }

        if self.memory.get(&pc) == Some(&0xcc) {
            self.registers.rip = pc + 1;
            return Some(WaitStatus::Stopped(self.pid, Signal::SIGTRAP));
        }

        self.executed.push(pc);
        self.registers.rip = pc + self.lengths.get(&pc).copied().unwrap_or(1);

        None
    }
}

impl Inferior for FakeInferior {
    fn pid(&self) -> Pid {
        self.pid
    }

    fn read_word(&self, address: u64) -> nix::Result<u64> {
        if self.fail_reads.contains(&address) {
            return Err(Errno::EIO);
        }

        let mut bytes = [0u8; 8];

        for (offset, byte) in bytes.iter_mut().enumerate() {
            *byte = *self.memory.get(&(address + offset as u64)).ok_or(Errno::EIO)?;
        }

        Ok(u64::from_le_bytes(bytes))
    }

    fn write_word(&mut self, address: u64, word: u64) -> nix::Result<()> {
        if self.fail_writes.contains(&address) {
            return Err(Errno::EIO);
        }

        for offset in 0..8 {
            if !self.memory.contains_key(&(address + offset)) {
                return Err(Errno::EIO);
            }
        }

        self.writes += 1;
        self.map(address, &word.to_le_bytes());

        Ok(())
    }

    fn snapshot(&self) -> nix::Result<user_regs_struct> {
        if self.fail_snapshot {
            return Err(Errno::ESRCH);
        }

        Ok(self.registers)
    }

    fn set_snapshot(&mut self, snapshot: user_regs_struct) -> nix::Result<()> {
        if self.fail_snapshot {
            return Err(Errno::ESRCH);
        }

        self.registers = snapshot;

        Ok(())
    }

    fn resume(&mut self, signal: Option<Signal>) -> nix::Result<()> {
        if self.fail_resume {
            return Err(Errno::ESRCH);
        }

        self.resumed_with.push(signal);

        if let Some(signal) = self.stop_signal.take() {
            self.pending = Some(WaitStatus::Stopped(self.pid, signal));
            return Ok(());
        }

        loop {
            if let Some(status) = self.execute() {
                self.pending = Some(status);
                return Ok(());
            }
        }
    }

    fn step(&mut self, _signal: Option<Signal>) -> nix::Result<()> {
        if self.fail_step {
            return Err(Errno::ESRCH);
        }

        let status = self.execute();
        self.pending = Some(status.unwrap_or(WaitStatus::Stopped(self.pid, Signal::SIGTRAP)));

        Ok(())
    }

    fn wait(&mut self) -> nix::Result<WaitStatus> {
        if self.fail_wait {
            return Err(Errno::EINTR);
        }

        if let Some(status) = self.foreign_status.take() {
            return Ok(status);
        }

        self.pending.take().ok_or(Errno::ECHILD)
    }
}
