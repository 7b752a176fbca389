//! Strong-typed configuration values.
//!
//! `StackSize` and `StorageSize` are both thin wrappers around a byte count.
//! Keeping them as distinct types means a caller cannot accidentally swap the
//! stack size and the data-channel capacity at a call site and have it
//! compile.

/// Minimum stack size, excluding the header, context block, storage region
/// and tail margin packed into the same allocation. Requests below this are
/// silently clamped upward.
pub const MIN_STACK_SIZE: usize = 32 * 1024;

/// Stack size used by [`StackSize::default`][Default::default].
pub const DEFAULT_STACK_SIZE: usize = 56 * 1024;

/// Data-channel capacity used by [`StorageSize::default`][Default::default].
pub const DEFAULT_STORAGE_SIZE: usize = 1024;

/// The size, in bytes, of a coroutine's private call stack.
///
/// Values below [`MIN_STACK_SIZE`] are clamped upward by the factory rather
/// than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StackSize(pub usize);

impl StackSize {
    #[must_use]
    pub const fn new(bytes: usize) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn bytes(self) -> usize {
        self.0
    }
}

impl Default for StackSize {
    fn default() -> Self {
        Self(DEFAULT_STACK_SIZE)
    }
}

/// The capacity, in bytes, of a coroutine's byte-stack data channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StorageSize(pub usize);

impl StorageSize {
    #[must_use]
    pub const fn new(bytes: usize) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn bytes(self) -> usize {
        self.0
    }
}

impl Default for StorageSize {
    fn default() -> Self {
        Self(DEFAULT_STORAGE_SIZE)
    }
}
