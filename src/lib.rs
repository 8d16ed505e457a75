//! A minimal debugger for native x86-64 Linux processes.
//!
//! The [`Debugger`] drives a stopped, traced process through the [`Inferior`] trait: it
//! patches `int3` breakpoints into the process, steps over them when execution continues, and
//! reads and writes registers and memory. [`linux::spawn`] starts a program under trace.

#[cfg(not(all(target_os = "linux", target_arch = "x86_64")))]
compile_error!("trace-dbg only supports x86-64 Linux");

pub mod arch;
pub mod breakpoint;
pub mod command;
pub mod debugger;
pub mod error;
pub mod event;
pub mod linux;
pub mod logging;

pub use arch::x86_64::Register;
pub use breakpoint::Breakpoint;
pub use command::Command;
pub use debugger::Debugger;
pub use error::Error;
pub use event::Event;
pub use linux::{Inferior, Tracee};
