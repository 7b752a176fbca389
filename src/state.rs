use core::fmt;

/// The lifecycle state of a coroutine object.
///
/// `Suspended` is the only state a coroutine can be created in, and `Dead` is
/// terminal: once reached, the coroutine can never be resumed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Not currently executing; eligible for `resume`.
    Suspended,
    /// Currently executing on this thread.
    Running,
    /// Resumed a child coroutine and is waiting for it to yield or die.
    Normal,
    /// The entry function has returned; the coroutine cannot be resumed.
    Dead,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            State::Suspended => "suspended",
            State::Running => "running",
            State::Normal => "normal",
            State::Dead => "dead",
        };
        f.write_str(s)
    }
}
