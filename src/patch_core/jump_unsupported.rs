#![cfg(not(any(
    target_arch = "x86_64",
    target_arch = "x86",
    target_arch = "aarch64",
    target_arch = "arm"
)))]

use crate::interface::error::PatchError;
use crate::patch_core::common::CodeAddr;

/// This architecture has no trampoline generator; no bytes are produced and
/// no memory is touched.
pub(crate) fn absolute_jump(_to: CodeAddr) -> Result<Vec<u8>, PatchError> {
    Err(PatchError::UnsupportedArchitecture(std::env::consts::ARCH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fails_without_producing_bytes() {
        let to = CodeAddr::new(0x1000 as *const ()).unwrap();
        assert!(matches!(
            absolute_jump(to),
            Err(PatchError::UnsupportedArchitecture(_))
        ));
    }
}
