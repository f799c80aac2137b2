//! Lock helpers that map poisoning to a domain error.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use mirage_common::error::{MirageError, Result};

/// Acquires a shared read guard on `lock`.
pub(crate) fn read<'a, T>(
    lock: &'a RwLock<T>,
    resource: &'static str,
) -> Result<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| MirageError::LockPoisoned { resource })
}

/// Acquires an exclusive write guard on `lock`.
pub(crate) fn write<'a, T>(
    lock: &'a RwLock<T>,
    resource: &'static str,
) -> Result<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| MirageError::LockPoisoned { resource })
}

/// Acquires `mutex`.
pub(crate) fn lock<'a, T>(
    mutex: &'a Mutex<T>,
    resource: &'static str,
) -> Result<MutexGuard<'a, T>> {
    mutex.lock().map_err(|_| MirageError::LockPoisoned { resource })
}
