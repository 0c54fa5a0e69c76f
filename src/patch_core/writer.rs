//! The one place in the crate that writes to live code memory.

use std::ptr;

use crate::interface::error::PatchError;
use crate::patch_core::common::{clear_cache, CodeAddr};
use crate::patch_core::protect::{change_protection, restore_protection, Protection};

/// Copies `bytes` verbatim over the code at `addr`, bracketing the write with
/// page protection changes and flushing the instruction cache.
///
/// The copy completes before the bracket closes, so callers of the public
/// patch operations never observe a partially written sequence. A failure
/// while restoring protection leaves the new bytes in place: the write has
/// already happened, and backing it out on a page that cannot be reprotected
/// is the worse of the two outcomes. The error is still surfaced so the
/// caller knows the page may remain writable.
///
/// # Safety
///
/// `addr` must point to live code with at least `bytes.len()` writable-once-
/// unprotected bytes, and no other thread may be entering that code during
/// the write.
pub(crate) unsafe fn write_code(addr: CodeAddr, bytes: &[u8]) -> Result<(), PatchError> {
    let dest = addr.as_mut_ptr();

    let prior = change_protection(dest, bytes.len(), Protection::ReadWriteExecute)?;

    ptr::copy_nonoverlapping(bytes.as_ptr(), dest, bytes.len());
    clear_cache(dest, dest.add(bytes.len()));

    restore_protection(dest, bytes.len(), prior)
}
