//! Counting semaphores usable across processes
//!
//! [`NamedSemaphore`] wraps a POSIX named semaphore so unrelated processes
//! can share it by name. [`LocalSemaphore`] has the same non-blocking
//! interface for agents that run as tasks inside one process.

use crate::error::{Result, TransportError};
use parking_lot::Mutex;
use std::ffi::CString;
use std::io;
use std::ptr::NonNull;
use tracing::{debug, warn};

/// Non-blocking counting semaphore
///
/// Blocking waits are built on top of `try_acquire` by the gate so they can
/// observe cancellation.
pub trait Semaphore: Send + Sync {
    /// Take one permit if one is available
    fn try_acquire(&self) -> Result<bool>;

    /// Return one permit
    fn release(&self) -> Result<()>;

    /// Permits currently available
    fn available(&self) -> Result<u32>;
}

/// POSIX named semaphore (`sem_open`)
pub struct NamedSemaphore {
    sem: NonNull<libc::sem_t>,
    name: CString,
    owner: bool,
}

// sem_t operations are thread-safe; the handle is only closed on drop.
unsafe impl Send for NamedSemaphore {}
unsafe impl Sync for NamedSemaphore {}

impl NamedSemaphore {
    /// Create the semaphore with `initial` permits, replacing a stale one
    /// left by a previous run. The creator unlinks the name on drop.
    pub fn create(name: &str, initial: u32) -> Result<Self> {
        let cname = Self::c_name(name)?;

        // A crashed run may have left the name behind
        if unsafe { libc::sem_unlink(cname.as_ptr()) } == 0 {
            warn!("Removed stale semaphore {}", name);
        }

        let sem = unsafe {
            libc::sem_open(
                cname.as_ptr(),
                libc::O_CREAT | libc::O_EXCL,
                0o644 as libc::c_uint,
                initial as libc::c_uint,
            )
        };
        let sem = Self::check_open(sem, name)?;

        debug!("Created semaphore {} with {} permit(s)", name, initial);
        Ok(Self {
            sem,
            name: cname,
            owner: true,
        })
    }

    /// Attach to a semaphore another process created
    pub fn open(name: &str) -> Result<Self> {
        let cname = Self::c_name(name)?;
        let sem = unsafe { libc::sem_open(cname.as_ptr(), 0) };
        let sem = Self::check_open(sem, name)?;

        debug!("Attached to semaphore {}", name);
        Ok(Self {
            sem,
            name: cname,
            owner: false,
        })
    }

    pub fn name(&self) -> &str {
        self.name.to_str().unwrap_or("<non-utf8>")
    }

    fn c_name(name: &str) -> Result<CString> {
        CString::new(name).map_err(|e| {
            TransportError::setup_with_source(format!("Invalid semaphore name {name:?}"), e)
        })
    }

    fn check_open(sem: *mut libc::sem_t, name: &str) -> Result<NonNull<libc::sem_t>> {
        if sem == libc::SEM_FAILED {
            return Err(TransportError::setup_with_source(
                format!("Failed to open semaphore {name}"),
                io::Error::last_os_error(),
            ));
        }
        NonNull::new(sem)
            .ok_or_else(|| TransportError::setup(format!("sem_open returned null for {name}")))
    }
}

impl Semaphore for NamedSemaphore {
    fn try_acquire(&self) -> Result<bool> {
        loop {
            if unsafe { libc::sem_trywait(self.sem.as_ptr()) } == 0 {
                return Ok(true);
            }
            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::EAGAIN) => return Ok(false),
                Some(libc::EINTR) => continue,
                _ => return Err(TransportError::io(format!("sem_trywait {}", self.name()), err)),
            }
        }
    }

    fn release(&self) -> Result<()> {
        if unsafe { libc::sem_post(self.sem.as_ptr()) } != 0 {
            return Err(TransportError::last_os_error(format!(
                "sem_post {}",
                self.name()
            )));
        }
        Ok(())
    }

    fn available(&self) -> Result<u32> {
        let mut value: libc::c_int = 0;
        if unsafe { libc::sem_getvalue(self.sem.as_ptr(), &mut value) } != 0 {
            return Err(TransportError::last_os_error(format!(
                "sem_getvalue {}",
                self.name()
            )));
        }
        // Linux reports 0 rather than a negative waiter count
        Ok(value.max(0) as u32)
    }
}

impl Drop for NamedSemaphore {
    fn drop(&mut self) {
        unsafe {
            libc::sem_close(self.sem.as_ptr());
        }
        if self.owner {
            if unsafe { libc::sem_unlink(self.name.as_ptr()) } != 0 {
                debug!(
                    "sem_unlink {} failed: {}",
                    self.name(),
                    io::Error::last_os_error()
                );
            } else {
                debug!("Removed semaphore {}", self.name());
            }
        }
    }
}

/// In-process semaphore with the same interface as [`NamedSemaphore`]
#[derive(Debug)]
pub struct LocalSemaphore {
    permits: Mutex<u32>,
}

impl LocalSemaphore {
    pub fn new(initial: u32) -> Self {
        Self {
            permits: Mutex::new(initial),
        }
    }
}

impl Semaphore for LocalSemaphore {
    fn try_acquire(&self) -> Result<bool> {
        let mut permits = self.permits.lock();
        if *permits == 0 {
            return Ok(false);
        }
        *permits -= 1;
        Ok(true)
    }

    fn release(&self) -> Result<()> {
        *self.permits.lock() += 1;
        Ok(())
    }

    fn available(&self) -> Result<u32> {
        Ok(*self.permits.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_name(tag: &str) -> String {
        format!("/hotel_test_{}_{}", tag, std::process::id())
    }

    #[test]
    fn test_local_semaphore_counts_permits() {
        let sem = LocalSemaphore::new(1);
        assert!(sem.try_acquire().unwrap());
        assert!(!sem.try_acquire().unwrap());
        sem.release().unwrap();
        assert_eq!(sem.available().unwrap(), 1);
    }

    #[test]
    fn test_named_semaphore_shared_by_name() {
        let name = unique_name("shared");
        let created = NamedSemaphore::create(&name, 1).unwrap();
        let attached = NamedSemaphore::open(&name).unwrap();

        assert!(attached.try_acquire().unwrap());
        assert!(!created.try_acquire().unwrap());
        assert_eq!(created.available().unwrap(), 0);

        attached.release().unwrap();
        assert!(created.try_acquire().unwrap());
        created.release().unwrap();
    }

    #[test]
    fn test_create_replaces_stale_semaphore() {
        let name = unique_name("stale");
        let first = NamedSemaphore::create(&name, 0).unwrap();
        std::mem::forget(first);

        let second = NamedSemaphore::create(&name, 1).unwrap();
        assert_eq!(second.available().unwrap(), 1);
    }

    #[test]
    fn test_owner_unlinks_on_drop() {
        let name = unique_name("unlink");
        drop(NamedSemaphore::create(&name, 1).unwrap());
        assert!(NamedSemaphore::open(&name).is_err());
    }

    #[test]
    fn test_rejects_interior_nul() {
        assert!(matches!(
            NamedSemaphore::create("/bad\0name", 1),
            Err(TransportError::Setup { .. })
        ));
    }
}
