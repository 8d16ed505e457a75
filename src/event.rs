use nix::sys::signal::Signal;
use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;

/// The state change reported by the traced process.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Event {
    /// The process stopped. Breakpoints and single steps stop with `SIGTRAP`.
    Stopped(Signal),
    /// The process has exited with the given status.
    Exited(i32),
    /// The process was terminated by a signal.
    Killed(Signal),
}

impl Event {
    /// Translates a wait status into the process it belongs to and the event it describes.
    /// Returns `None` for statuses that are neither a stop nor a termination.
    pub fn from_status(status: WaitStatus) -> Option<(Pid, Self)> {
        match status {
            WaitStatus::Stopped(pid, signal) => Some((pid, Self::Stopped(signal))),
            WaitStatus::PtraceEvent(pid, signal, _) => Some((pid, Self::Stopped(signal))),
            WaitStatus::PtraceSyscall(pid) => Some((pid, Self::Stopped(Signal::SIGTRAP))),
            WaitStatus::Exited(pid, status) => Some((pid, Self::Exited(status))),
            WaitStatus::Signaled(pid, signal, _) => Some((pid, Self::Killed(signal))),
            _ => None,
        }
    }

    /// Returns true if the process is still alive and stopped.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped(_))
    }

    /// Returns the signal that should be delivered when the process is resumed. Traps are
    /// consumed by the debugger, anything else belongs to the process.
    pub fn pending_signal(&self) -> Option<Signal> {
        match self {
            Self::Stopped(Signal::SIGTRAP) => None,
            Self::Stopped(signal) => Some(*signal),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traps_are_not_redelivered() {
        let pid = Pid::from_raw(42);
        let (_, event) = Event::from_status(WaitStatus::Stopped(pid, Signal::SIGTRAP)).unwrap();

        assert!(event.is_stopped());
        assert_eq!(event.pending_signal(), None);
    }

    #[test]
    fn other_signals_are_redelivered() {
        let pid = Pid::from_raw(42);
        let (_, event) = Event::from_status(WaitStatus::Stopped(pid, Signal::SIGSEGV)).unwrap();

        assert_eq!(event.pending_signal(), Some(Signal::SIGSEGV));
    }

    #[test]
    fn terminations() {
        let pid = Pid::from_raw(7);

        assert_eq!(
            Event::from_status(WaitStatus::Exited(pid, 3)),
            Some((pid, Event::Exited(3))),
        );
        assert_eq!(
            Event::from_status(WaitStatus::Signaled(pid, Signal::SIGKILL, false)),
            Some((pid, Event::Killed(Signal::SIGKILL))),
        );
        assert!(!Event::Exited(0).is_stopped());
        assert_eq!(Event::from_status(WaitStatus::StillAlive), None);
    }
}
