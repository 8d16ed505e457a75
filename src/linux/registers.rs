//! Register access for a stopped tracee.
//!
//! The kernel only exposes the register file as a whole, so every access is a fetch of the
//! full snapshot and every write is a read-modify-write of it. Failing to fetch or store the
//! snapshot means the process is no longer stopped under trace, which is reported as the fatal
//! [`Error::TargetUnreachable`].

use crate::arch::x86_64::{Register, REGISTERS};
use crate::error::{Error, SnapshotStep};
use crate::Inferior;
use libc::user_regs_struct;

/// Extends an [`Inferior`] with functions to access architecture-specific registers.
pub trait CpuRegs {
    /// Gets the registers specified by the array of [`Register`]s.
    fn get_registers(
        &self,
        registers: &[Register],
    ) -> Result<Vec<u64>, Error>;

    /// Sets the registers specified by the array of [`Register`]s to the corresponding
    /// values.
    fn set_registers(
        &mut self,
        registers: &[Register],
        values: &[u64],
    ) -> Result<(), Error>;
}

impl<T: Inferior + ?Sized> CpuRegs for T {
    fn get_registers(
        &self,
        registers: &[Register],
    ) -> Result<Vec<u64>, Error> {
        let snapshot = fetch(self, describe(registers))?;

        Ok(registers
            .iter()
            .map(|register| register.descriptor().read(&snapshot))
            .collect())
    }

    fn set_registers(
        &mut self,
        registers: &[Register],
        values: &[u64],
    ) -> Result<(), Error> {
        debug_assert_eq!(registers.len(), values.len());

        let target = describe(registers);
        let mut snapshot = fetch(self, target)?;

        for (register, value) in registers.iter().zip(values) {
            register.descriptor().write(&mut snapshot, *value);
        }

        let pid = self.pid();

        self.set_snapshot(snapshot).map_err(|source| Error::TargetUnreachable {
            pid,
            step: SnapshotStep::Store,
            register: target,
            source,
        })
    }
}

/// Reads a single register.
pub fn value_of<T: Inferior + ?Sized>(inferior: &T, register: Register) -> Result<u64, Error> {
    let snapshot = fetch(inferior, register.name())?;

    Ok(register.descriptor().read(&snapshot))
}

/// Writes a single register, leaving every other register as it was.
pub fn set_value<T: Inferior + ?Sized>(
    inferior: &mut T,
    register: Register,
    value: u64,
) -> Result<(), Error> {
    inferior.set_registers(&[register], &[value])
}

/// Reads every register from a single snapshot, in table order.
pub fn dump<T: Inferior + ?Sized>(inferior: &T) -> Result<Vec<(Register, u64)>, Error> {
    let snapshot = fetch(inferior, "all registers")?;

    Ok(REGISTERS
        .iter()
        .map(|descriptor| (descriptor.register, descriptor.read(&snapshot)))
        .collect())
}

fn fetch<T: Inferior + ?Sized>(
    inferior: &T,
    target: &'static str,
) -> Result<user_regs_struct, Error> {
    inferior.snapshot().map_err(|source| {
        tracing::error!(pid = %inferior.pid(), register = target, %source, "register fetch failed");

        Error::TargetUnreachable {
            pid: inferior.pid(),
            step: SnapshotStep::Fetch,
            register: target,
            source,
        }
    })
}

fn describe(registers: &[Register]) -> &'static str {
    match registers {
        [register] => register.name(),
        _ => "multiple registers",
    }
}
