#![cfg(target_arch = "arm")]

use crate::patch_core::common::CodeAddr;

/// A literal load, a register branch, and the embedded target word.
pub(crate) const JUMP_SIZE: usize = 12;

// ldr r12, [pc, #0] reads the literal word below: pc reads as the load
// instruction's address plus 8, which lands exactly on the embedded target.
const LDR_R12_PC: u32 = 0xE59F_C000;
const BLX_R12: u32 = 0xE12F_FF3C;

/// Builds an absolute jump to `to`.
///
/// The 32-bit target travels as a little-endian literal word after the two
/// instructions. `r12` is the IP intra-procedure scratch register, outside
/// the AAPCS argument set.
pub(crate) fn absolute_jump(to: CodeAddr) -> Vec<u8> {
    let mut code = Vec::with_capacity(JUMP_SIZE);
    code.extend_from_slice(&LDR_R12_PC.to_le_bytes());
    code.extend_from_slice(&BLX_R12.to_le_bytes());
    code.extend_from_slice(&(to.as_usize() as u32).to_le_bytes());
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trampoline_has_fixed_size() {
        let to = CodeAddr::new(0x1122_3344usize as *const ()).unwrap();
        assert_eq!(absolute_jump(to).len(), JUMP_SIZE);
    }

    #[test]
    fn embeds_little_endian_target_after_instructions() {
        let to = CodeAddr::new(0x1122_3344usize as *const ()).unwrap();
        let code = absolute_jump(to);

        assert_eq!(&code[..4], &LDR_R12_PC.to_le_bytes());
        assert_eq!(&code[4..8], &BLX_R12.to_le_bytes());
        assert_eq!(&code[8..], &0x1122_3344u32.to_le_bytes());
    }
}
