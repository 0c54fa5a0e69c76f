#![cfg(target_arch = "x86")]

use crate::patch_core::common::CodeAddr;

/// `mov eax, imm32` (5 bytes) followed by `jmp eax` (2 bytes).
pub(crate) const JUMP_SIZE: usize = 7;

const MOV_EAX_OPCODE: u8 = 0xB8;
const JMP_EAX_OPCODE: [u8; 2] = [0xFF, 0xE0];

/// Builds an absolute jump to `to`, with the target encoded as a 32-bit
/// immediate. `eax` is outside the cdecl argument set and dead at entry.
pub(crate) fn absolute_jump(to: CodeAddr) -> Vec<u8> {
    let mut code = Vec::with_capacity(JUMP_SIZE);
    code.push(MOV_EAX_OPCODE);
    code.extend_from_slice(&(to.as_usize() as u32).to_le_bytes());
    code.extend_from_slice(&JMP_EAX_OPCODE);
    code
}
