use crate::arch::x86_64::BREAKPOINT;
use crate::error::{Error, PatchStep};
use crate::Inferior;
use nix::unistd::Pid;

/// A software breakpoint: a trap instruction patched over the first byte of the instruction
/// at `address`.
///
/// Only the low byte of the word at the address is ever modified. The rest of the word is
/// re-read on every patch, since neighbouring breakpoints may share it.
#[derive(Clone, Copy, Debug)]
pub struct Breakpoint {
    pid: Pid,
    address: u64,
    enabled: bool,
    // The instruction byte the trap replaced. `None` until the first successful enable.
    original: Option<u8>,
}

impl Breakpoint {
    /// Creates a disabled breakpoint. Memory is not touched until [`Breakpoint::enable`].
    pub fn new(pid: Pid, address: u64) -> Self {
        Self {
            pid,
            address,
            enabled: false,
            original: None,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The instruction byte the trap replaced, if the breakpoint was ever enabled.
    pub fn original_byte(&self) -> Option<u8> {
        self.original
    }

    /// Writes the trap instruction. Does nothing if the breakpoint is already enabled, so the
    /// trap is never mistaken for the original byte.
    pub fn enable<T: Inferior + ?Sized>(&mut self, inferior: &mut T) -> Result<(), Error> {
        if self.enabled {
            return Ok(());
        }

        debug_assert_eq!(inferior.pid(), self.pid);

        let word = inferior
            .read_word(self.address)
            .map_err(|source| self.failed(Error::EnableBreakpoint {
                address: self.address,
                step: PatchStep::Read,
                source,
            }))?;

        let original = (word & 0xff) as u8;
        let patched = (word & !0xff) | u64::from(BREAKPOINT);

        inferior
            .write_word(self.address, patched)
            .map_err(|source| self.failed(Error::EnableBreakpoint {
                address: self.address,
                step: PatchStep::Write,
                source,
            }))?;

        self.original = Some(original);
        self.enabled = true;

        tracing::debug!(
            pid = %self.pid,
            address = format_args!("{:#x}", self.address),
            original = format_args!("{original:#04x}"),
            "enabled breakpoint",
        );

        Ok(())
    }

    /// Restores the original instruction byte. Does nothing if the breakpoint is disabled.
    pub fn disable<T: Inferior + ?Sized>(&mut self, inferior: &mut T) -> Result<(), Error> {
        let original = match (self.enabled, self.original) {
            (true, Some(original)) => original,
            _ => return Ok(()),
        };

        debug_assert_eq!(inferior.pid(), self.pid);

        let word = inferior
            .read_word(self.address)
            .map_err(|source| self.failed(Error::DisableBreakpoint {
                address: self.address,
                step: PatchStep::Read,
                source,
            }))?;

        let restored = (word & !0xff) | u64::from(original);

        inferior
            .write_word(self.address, restored)
            .map_err(|source| self.failed(Error::DisableBreakpoint {
                address: self.address,
                step: PatchStep::Write,
                source,
            }))?;

        self.enabled = false;

        tracing::debug!(
            pid = %self.pid,
            address = format_args!("{:#x}", self.address),
            "disabled breakpoint",
        );

        Ok(())
    }

    fn failed(&self, error: Error) -> Error {
        tracing::warn!(pid = %self.pid, %error, "breakpoint patch failed");

        error
    }
}
