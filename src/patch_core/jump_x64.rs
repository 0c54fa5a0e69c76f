#![cfg(target_arch = "x86_64")]

use crate::patch_core::common::CodeAddr;

/// `mov rax, imm64` (10 bytes) followed by `jmp rax` (2 bytes).
pub(crate) const JUMP_SIZE: usize = 12;

const MOV_RAX_OPCODE: [u8; 2] = [0x48, 0xB8];
const JMP_RAX_OPCODE: [u8; 2] = [0xFF, 0xE0];

/// Builds an absolute jump to `to`.
///
/// The target address is encoded as a 64-bit immediate, so the sequence works
/// regardless of where it is placed. `rax` carries neither arguments nor a
/// live return value at function entry, which keeps the clobber invisible to
/// the function being jumped to.
pub(crate) fn absolute_jump(to: CodeAddr) -> Vec<u8> {
    let mut code = Vec::with_capacity(JUMP_SIZE);
    code.extend_from_slice(&MOV_RAX_OPCODE);
    code.extend_from_slice(&(to.as_usize() as u64).to_le_bytes());
    code.extend_from_slice(&JMP_RAX_OPCODE);
    code
}
