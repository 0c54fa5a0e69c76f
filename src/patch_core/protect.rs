//! Toggles the protection of the code pages spanning a patched region.
//!
//! Protection operations act on whole pages, so every change covers each page
//! intersected by the requested range. The platforms differ only in the OS
//! primitive and in how the pre-write protection is recovered: POSIX
//! `mprotect` does not report prior flags, so the resting executable mode is
//! reapplied explicitly; Windows `VirtualProtect` returns the previous value,
//! which is round-tripped verbatim.

use std::io;

use crate::interface::error::PatchError;

#[cfg(target_os = "windows")]
use crate::patch_core::winapi::*;

#[cfg(unix)]
use once_cell::sync::Lazy;

#[cfg(unix)]
static PAGE_SIZE: Lazy<usize> = Lazy::new(|| unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize });

/// Desired protection for a code range.
pub(crate) enum Protection {
    /// Readable and executable, the resting state of code pages.
    #[cfg_attr(target_os = "windows", allow(dead_code))]
    Execute,

    /// Temporarily writable for the duration of a code write.
    ReadWriteExecute,
}

/// What must be reapplied once the write is done.
pub(crate) enum PriorProtection {
    /// POSIX `mprotect` does not report prior flags; the resting mode is
    /// supplied explicitly on restore.
    #[cfg(unix)]
    Assumed,

    /// The previous protection value reported by `VirtualProtect`.
    #[cfg(target_os = "windows")]
    Captured(u32),
}

#[cfg(unix)]
pub(crate) fn change_protection(
    addr: *const u8,
    len: usize,
    mode: Protection,
) -> Result<PriorProtection, PatchError> {
    let prot = match mode {
        Protection::Execute => libc::PROT_READ | libc::PROT_EXEC,
        Protection::ReadWriteExecute => libc::PROT_READ | libc::PROT_WRITE | libc::PROT_EXEC,
    };

    let page_size = *PAGE_SIZE;
    let end = addr as usize + len;

    // mprotect acts on whole pages; round the start down and walk every page
    // the range intersects.
    let mut page = (addr as usize) & !(page_size - 1);
    while page < end {
        if unsafe { libc::mprotect(page as *mut libc::c_void, page_size, prot) } != 0 {
            return Err(PatchError::Protection(io::Error::last_os_error()));
        }
        page += page_size;
    }

    Ok(PriorProtection::Assumed)
}

#[cfg(unix)]
pub(crate) fn restore_protection(
    addr: *const u8,
    len: usize,
    _prior: PriorProtection,
) -> Result<(), PatchError> {
    change_protection(addr, len, Protection::Execute).map(|_| ())
}

#[cfg(target_os = "windows")]
pub(crate) fn change_protection(
    addr: *const u8,
    len: usize,
    mode: Protection,
) -> Result<PriorProtection, PatchError> {
    let desired = match mode {
        Protection::Execute => PAGE_EXECUTE_READ,
        Protection::ReadWriteExecute => PAGE_EXECUTE_READWRITE,
    };

    let mut previous: u32 = 0;
    let result = unsafe {
        VirtualProtect(
            addr as *mut core::ffi::c_void,
            len,
            desired,
            &mut previous,
        )
    };

    if result == 0 {
        return Err(PatchError::Protection(io::Error::last_os_error()));
    }

    Ok(PriorProtection::Captured(previous))
}

#[cfg(target_os = "windows")]
pub(crate) fn restore_protection(
    addr: *const u8,
    len: usize,
    prior: PriorProtection,
) -> Result<(), PatchError> {
    let PriorProtection::Captured(previous) = prior;

    let mut scratch: u32 = 0;
    let result = unsafe {
        VirtualProtect(
            addr as *mut core::ffi::c_void,
            len,
            previous,
            &mut scratch,
        )
    };

    if result == 0 {
        return Err(PatchError::Protection(io::Error::last_os_error()));
    }

    Ok(())
}
