use core::fmt;

/// Closed set of failure modes the engine can report.
///
/// None of these propagate as panics or unwinds across a context switch; a
/// switch that was interrupted by unwinding is undefined behavior, so every
/// fallible operation returns one of these codes instead.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A generic, otherwise unclassified failure.
    Generic,
    /// A pointer argument (e.g. a user pointer) was invalid.
    InvalidPointer,
    /// The handle does not refer to a live coroutine.
    InvalidCoroutine,
    /// `resume` was called on a coroutine that is not suspended.
    NotSuspended,
    /// `yield_now` was called from a coroutine that is not running.
    NotRunning,
    /// Preparing the initial machine context failed.
    MakeContextError,
    /// The low-level context switch failed.
    SwitchContextError,
    /// A push or pop did not fit in the remaining data-channel capacity.
    NotEnoughSpace,
    /// The backing allocation for a coroutine could not be obtained.
    OutOfMemory,
    /// An argument to a constructor violated its documented precondition.
    InvalidArguments,
    /// The requested operation is not valid in the coroutine's current state.
    InvalidOperation,
    /// The magic sentinel was overwritten, or a stack probe landed outside
    /// the coroutine's stack region.
    StackOverflow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Error::Generic => "generic error",
            Error::InvalidPointer => "invalid pointer",
            Error::InvalidCoroutine => "invalid coroutine",
            Error::NotSuspended => "coroutine not suspended",
            Error::NotRunning => "coroutine not running",
            Error::MakeContextError => "make context error",
            Error::SwitchContextError => "switch context error",
            Error::NotEnoughSpace => "not enough space",
            Error::OutOfMemory => "out of memory",
            Error::InvalidArguments => "invalid arguments",
            Error::InvalidOperation => "invalid operation",
            Error::StackOverflow => "stack overflow",
        };
        f.write_str(s)
    }
}

impl core::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
