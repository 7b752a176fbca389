use crate::config::{StackSize, StorageSize};
use crate::coroutine::{Coroutine, Handle, Storable};
use crate::error::Result;
use crate::state::State;
use core::marker::PhantomData;

/// Couples one push-then-yield into a single call, for use inside generator
/// bodies.
pub fn yield_value<T: Storable>(handle: &Handle, val: T) -> Result<()> {
    handle.push(val)?;
    handle.yield_now()
}

/// A coroutine specialized to repeatedly produce values of type `T`.
///
/// The body pushes a `T` and yields each time it has a value ready;
/// [`next_value`](Generator::next_value) drives one step and pops the result.
pub struct Generator<T: Storable> {
    coroutine: Coroutine,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Storable> Generator<T> {
    /// Creates a generator from a body closure. The storage region is sized
    /// to fit exactly one `T` (or the caller-requested size, if larger).
    pub fn new<F>(f: F, stack_size: StackSize, storage_size: StorageSize) -> Result<Self>
    where
        F: FnMut(&Handle) + 'static,
    {
        let storage_size = StorageSize::new(storage_size.bytes().max(size_of::<T>()));
        let coroutine = Coroutine::from_fn(f, stack_size, storage_size)?;
        Ok(Self {
            coroutine,
            _marker: PhantomData,
        })
    }

    /// Advances the generator by one step.
    ///
    /// Returns `Ok(None)` once the generator's body has returned (including
    /// on this very call, if it terminates without producing a final
    /// value). Errors from `resume` or `pop` propagate.
    pub fn next_value(&mut self) -> Result<Option<T>> {
        if self.coroutine.done() {
            return Ok(None);
        }
        match self.coroutine.resume()? {
            State::Dead => {
                #[cfg(feature = "tracing")]
                tracing::trace!("generator exhausted");
                Ok(None)
            }
            State::Suspended => Ok(Some(self.coroutine.pop::<T>()?)),
            other => unreachable!("resume() of a generator returned {other}"),
        }
    }
}

impl<T: Storable> Iterator for Generator<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_value() {
            Ok(Some(v)) => Some(Ok(v)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StackSize, StorageSize};

    use std::vec::Vec;

    #[test]
    fn fibonacci() {
        let mut gen = Generator::<u64>::new(
            |handle| {
                let (mut a, mut b) = (0u64, 1u64);
                loop {
                    yield_value(handle, a).unwrap();
                    let next = a + b;
                    a = b;
                    b = next;
                }
            },
            StackSize::default(),
            StorageSize::default(),
        )
        .unwrap();

        let first_ten: Vec<u64> = (0..10).map(|_| gen.next_value().unwrap().unwrap()).collect();
        assert_eq!(first_ten, [0, 1, 1, 2, 3, 5, 8, 13, 21, 34]);
    }

    #[test]
    fn iterator_facade_stops_after_return() {
        let gen = Generator::<u32>::new(
            |handle| {
                for i in 0..3u32 {
                    yield_value(handle, i).unwrap();
                }
            },
            StackSize::default(),
            StorageSize::default(),
        )
        .unwrap();

        let values: std::vec::Vec<u32> = gen.map(|r| r.unwrap()).collect();
        assert_eq!(values, [0, 1, 2]);
    }
}
