mod jump_arm;
mod jump_arm64;
mod jump_unsupported;
mod jump_x64;
mod jump_x86;

pub(crate) mod common;
pub(crate) mod protect;
pub(crate) mod writer;

#[cfg(target_os = "linux")]
mod linuxapi;

#[cfg(target_os = "windows")]
pub(crate) mod winapi;

use crate::interface::error::PatchError;
use common::CodeAddr;

/// Builds the absolute-jump trampoline for the build-target architecture.
///
/// The returned sequence has the fixed length defined by the architecture
/// module. On an architecture without a generator this fails with
/// [`PatchError::UnsupportedArchitecture`] and produces no bytes.
pub(crate) fn absolute_jump(to: CodeAddr) -> Result<Vec<u8>, PatchError> {
    #[cfg(target_arch = "x86_64")]
    {
        Ok(jump_x64::absolute_jump(to))
    }

    #[cfg(target_arch = "x86")]
    {
        Ok(jump_x86::absolute_jump(to))
    }

    #[cfg(target_arch = "aarch64")]
    {
        Ok(jump_arm64::absolute_jump(to))
    }

    #[cfg(target_arch = "arm")]
    {
        Ok(jump_arm::absolute_jump(to))
    }

    #[cfg(not(any(
        target_arch = "x86_64",
        target_arch = "x86",
        target_arch = "aarch64",
        target_arch = "arm"
    )))]
    {
        jump_unsupported::absolute_jump(to)
    }
}
