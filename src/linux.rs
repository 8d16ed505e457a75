pub mod launch;
pub mod memory;
pub mod registers;
pub mod tracee;

pub use launch::spawn;
pub use registers::CpuRegs;
pub use tracee::{Inferior, Tracee};
