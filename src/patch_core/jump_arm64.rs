#![cfg(target_arch = "aarch64")]

use crate::patch_core::common::CodeAddr;

/// Four wide moves, a register branch, and one pad instruction.
pub(crate) const JUMP_SIZE: usize = 24;

const MOVZ_X17_LSL0: u32 = 0xD280_0011;
const MOVK_X17_LSL16: u32 = 0xF2A0_0011;
const MOVK_X17_LSL32: u32 = 0xF2C0_0011;
const MOVK_X17_LSL48: u32 = 0xF2E0_0011;
const BR_X17: u32 = 0xD61F_0220;
const NOP: u32 = 0xD503_201F;

/// Builds an absolute jump to `to`.
///
/// The 64-bit target is synthesized 16 bits at a time with `movz`/`movk`
/// into `x17`, the IP1 intra-procedure scratch register, which the AAPCS64
/// calling convention keeps outside the argument and return set. A trailing
/// `nop` pads the sequence to its fixed size.
pub(crate) fn absolute_jump(to: CodeAddr) -> Vec<u8> {
    let addr = to.as_usize() as u64;
    let chunk = |i: u32| ((addr >> (16 * i)) & 0xFFFF) as u32;

    let instructions: [u32; 6] = [
        MOVZ_X17_LSL0 | (chunk(0) << 5),
        MOVK_X17_LSL16 | (chunk(1) << 5),
        MOVK_X17_LSL32 | (chunk(2) << 5),
        MOVK_X17_LSL48 | (chunk(3) << 5),
        BR_X17,
        NOP,
    ];

    let mut code = Vec::with_capacity(JUMP_SIZE);
    for instruction in instructions {
        code.extend_from_slice(&instruction.to_le_bytes());
    }
    code
}
