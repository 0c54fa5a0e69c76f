use std::fmt;
use std::ptr;

#[cfg(target_os = "linux")]
use crate::patch_core::linuxapi::__clear_cache;

#[cfg(target_os = "windows")]
use crate::patch_core::winapi::*;

/// The entry address of a compiled function.
///
/// This is the identity of "this exact compiled function": the process-wide
/// registry keys active patches by it. The handle is opaque on purpose so no
/// arithmetic can be performed on the underlying address.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct CodeAddr(usize);

impl CodeAddr {
    /// Wraps a raw code pointer, refusing null.
    pub(crate) fn new(ptr: *const ()) -> Option<Self> {
        if ptr.is_null() {
            None
        } else {
            Some(CodeAddr(ptr as usize))
        }
    }

    pub(crate) fn as_mut_ptr(self) -> *mut u8 {
        self.0 as *mut u8
    }

    pub(crate) fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Debug for CodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CodeAddr({:#x})", self.0)
    }
}

/// Unsafely reads `len` bytes from `ptr` and returns them as a Vec.
///
/// # Safety
///
/// The caller must ensure that `ptr` is valid for reading `len` bytes.
pub(crate) unsafe fn read_bytes(ptr: *const u8, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    ptr::copy_nonoverlapping(ptr, buf.as_mut_ptr(), len);
    buf
}

/// Flushes the instruction cache for `[start, end)` after a code write.
pub(crate) unsafe fn clear_cache(start: *mut u8, end: *mut u8) {
    #[cfg(target_os = "linux")]
    {
        __clear_cache(start, end);
    }

    #[cfg(target_os = "windows")]
    {
        let size = end.offset_from(start) as usize;
        let process = GetCurrentProcess();
        let success = FlushInstructionCache(process, start as *const core::ffi::c_void, size);

        if success == 0 {
            panic!("FlushInstructionCache failed");
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        let _ = (start, end);
    }

    // On ARM64, explicitly synchronize the CPU pipeline.
    #[cfg(target_arch = "aarch64")]
    {
        core::arch::asm!("dsb sy", "isb", options(nostack, nomem));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_addr_refuses_null() {
        assert!(CodeAddr::new(std::ptr::null()).is_none());
    }

    #[test]
    fn code_addr_debug_prints_hex() {
        let addr = CodeAddr::new(0x1000 as *const ()).unwrap();
        assert_eq!(format!("{:?}", addr), "CodeAddr(0x1000)");
    }

    #[test]
    fn read_bytes_copies_exactly() {
        let data = [0xAAu8, 0xBB, 0xCC, 0xDD];
        let copied = unsafe { read_bytes(data.as_ptr(), 3) };
        assert_eq!(copied, vec![0xAA, 0xBB, 0xCC]);
    }
}
