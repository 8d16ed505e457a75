//! This module provides code specific to the x86-64 architecture.
//!
//! Every register the debugger knows about is declared exactly once, in the table below. The
//! table drives the [`Register`] enum, the name and debug-index lookups, and the accessors into
//! the kernel's register snapshot, so the three can never disagree.

use crate::error::Error;
use libc::user_regs_struct;
use std::fmt;
use std::str::FromStr;

/// The `int3` opcode. Executing it raises `SIGTRAP` with the instruction pointer one byte past
/// the trap.
pub const BREAKPOINT: u8 = 0xcc;

/// Static description of one register.
#[derive(Clone, Copy)]
pub struct RegisterDescriptor {
    /// The register being described.
    pub register: Register,
    /// The DWARF register number from the System V AMD64 psABI, if it has one.
    pub debug_index: Option<u16>,
    /// The canonical display name.
    pub name: &'static str,
    get: fn(&user_regs_struct) -> u64,
    set: fn(&mut user_regs_struct, u64),
}

impl RegisterDescriptor {
    /// Extracts this register from a snapshot.
    pub fn read(&self, snapshot: &user_regs_struct) -> u64 {
        (self.get)(snapshot)
    }

    /// Overwrites this register in a snapshot, leaving every other field untouched.
    pub fn write(&self, snapshot: &mut user_regs_struct, value: u64) {
        (self.set)(snapshot, value)
    }
}

impl fmt::Debug for RegisterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterDescriptor")
            .field("register", &self.register)
            .field("debug_index", &self.debug_index)
            .field("name", &self.name)
            .finish()
    }
}

macro_rules! registers {
    ($($(#[$meta:meta])* $variant:ident => $name:literal, $debug_index:expr, $field:ident;)*) => {
        /// Represents the registers of the x86-64 architecture that are part of the register
        /// snapshot of a stopped tracee.
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum Register {
            $($(#[$meta])* $variant,)*
        }

        /// The register table, in the layout order of `user_regs_struct`. The position of each
        /// entry matches the discriminant of its [`Register`].
        pub static REGISTERS: &[RegisterDescriptor] = &[
            $(RegisterDescriptor {
                register: Register::$variant,
                debug_index: $debug_index,
                name: $name,
                get: |snapshot| snapshot.$field,
                set: |snapshot, value| snapshot.$field = value,
            },)*
        ];
    };
}

registers! {
    /// The R15 register.
    R15 => "r15", Some(15), r15;
    /// The R14 register.
    R14 => "r14", Some(14), r14;
    /// The R13 register.
    R13 => "r13", Some(13), r13;
    /// The R12 register.
    R12 => "r12", Some(12), r12;
    /// The base pointer register.
    Rbp => "rbp", Some(6), rbp;
    /// The base register.
    Rbx => "rbx", Some(3), rbx;
    /// The R11 register.
    R11 => "r11", Some(11), r11;
    /// The R10 register.
    R10 => "r10", Some(10), r10;
    /// The R9 register.
    R9 => "r9", Some(9), r9;
    /// The R8 register.
    R8 => "r8", Some(8), r8;
    /// The accumulator register.
    Rax => "rax", Some(0), rax;
    /// The counter register.
    Rcx => "rcx", Some(2), rcx;
    /// The data register.
    Rdx => "rdx", Some(1), rdx;
    /// The source index register.
    Rsi => "rsi", Some(4), rsi;
    /// The destination index register.
    Rdi => "rdi", Some(5), rdi;
    /// The system call number as it was on entry to the kernel.
    OrigRax => "orig_rax", None, orig_rax;
    /// The instruction pointer register.
    Rip => "rip", None, rip;
    /// The code segment register.
    Cs => "cs", Some(51), cs;
    /// The status register.
    Rflags => "eflags", Some(49), eflags;
    /// The stack pointer register.
    Rsp => "rsp", Some(7), rsp;
    /// The stack segment register.
    Ss => "ss", Some(52), ss;
    /// The FS segment base address.
    FsBase => "fs_base", Some(58), fs_base;
    /// The GS segment base address.
    GsBase => "gs_base", Some(59), gs_base;
    /// The data segment register.
    Ds => "ds", Some(53), ds;
    /// The extra segment register.
    Es => "es", Some(50), es;
    /// The FS segment register.
    Fs => "fs", Some(54), fs;
    /// The GS segment register.
    Gs => "gs", Some(55), gs;
}

impl Register {
    /// Returns the table entry for this register.
    pub fn descriptor(self) -> &'static RegisterDescriptor {
        &REGISTERS[self as usize]
    }

    /// Iterates over every register in table order.
    pub fn all() -> impl Iterator<Item = Register> {
        REGISTERS.iter().map(|descriptor| descriptor.register)
    }

    /// Returns the canonical name of the register.
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// Returns the DWARF register number, or `None` for registers without one.
    pub fn debug_index(self) -> Option<u16> {
        self.descriptor().debug_index
    }

    /// Looks a register up by its canonical name.
    pub fn from_name(name: &str) -> Result<Self, Error> {
        REGISTERS
            .iter()
            .find(|descriptor| descriptor.name == name)
            .map(|descriptor| descriptor.register)
            .ok_or_else(|| Error::UnknownRegister(name.to_string()))
    }

    /// Looks a register up by its DWARF register number.
    pub fn from_debug_index(index: u16) -> Result<Self, Error> {
        REGISTERS
            .iter()
            .find(|descriptor| descriptor.debug_index == Some(index))
            .map(|descriptor| descriptor.register)
            .ok_or(Error::UnknownDebugIndex(index))
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Register {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}
