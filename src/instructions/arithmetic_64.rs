//! 64-bit register arithmetic: ADD_64, SUB_64, MUL_64, DIV_U_64, DIV_S_64, REM_U_64, REM_S_64.

use crate::config::{
    OPCODE_ADD_64, OPCODE_DIV_S_64, OPCODE_DIV_U_64, OPCODE_MUL_64, OPCODE_REM_S_64,
    OPCODE_REM_U_64, OPCODE_SUB_64,
};
use crate::instructions::base::{parse_three_registers, InstructionHandler};
use crate::types::{InstructionContext, InstructionResult};

fn get_register(registers: &[u64; 13], index: u8) -> u64 {
    registers.get(index as usize).copied().unwrap_or(0)
}

fn set_register(registers: &mut [u64; 13], index: u8, value: u64) {
    if (index as usize) < 13 {
        registers[index as usize] = value;
    }
}

fn to_signed64(x: u64) -> i64 {
    x as i64
}

// --- ADD_64 (200) ---
pub struct Add64Instruction;

impl Add64Instruction {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl InstructionHandler for Add64Instruction {
    fn opcode(&self) -> i32 {
        i32::from(OPCODE_ADD_64)
    }
    fn name(&self) -> &'static str {
        "ADD_64"
    }
    fn execute(&self, context: &mut InstructionContext<'_>) -> InstructionResult {
        let parsed = parse_three_registers(context.operands);
        let value_a = get_register(context.registers, parsed.register_a);
        let value_b = get_register(context.registers, parsed.register_b);
        set_register(context.registers, parsed.register_d, value_a.wrapping_add(value_b));
        InstructionResult::new(InstructionResult::CONTINUE, 0)
    }
}

// --- SUB_64 (201) ---
pub struct Sub64Instruction;

impl Sub64Instruction {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl InstructionHandler for Sub64Instruction {
    fn opcode(&self) -> i32 {
        i32::from(OPCODE_SUB_64)
    }
    fn name(&self) -> &'static str {
        "SUB_64"
    }
    fn execute(&self, context: &mut InstructionContext<'_>) -> InstructionResult {
        let parsed = parse_three_registers(context.operands);
        let value_a = get_register(context.registers, parsed.register_a);
        let value_b = get_register(context.registers, parsed.register_b);
        set_register(context.registers, parsed.register_d, value_a.wrapping_sub(value_b));
        InstructionResult::new(InstructionResult::CONTINUE, 0)
    }
}

// --- MUL_64 (202) ---
pub struct Mul64Instruction;

impl Mul64Instruction {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl InstructionHandler for Mul64Instruction {
    fn opcode(&self) -> i32 {
        i32::from(OPCODE_MUL_64)
    }
    fn name(&self) -> &'static str {
        "MUL_64"
    }
    fn execute(&self, context: &mut InstructionContext<'_>) -> InstructionResult {
        let parsed = parse_three_registers(context.operands);
        let value_a = get_register(context.registers, parsed.register_a);
        let value_b = get_register(context.registers, parsed.register_b);
        set_register(context.registers, parsed.register_d, value_a.wrapping_mul(value_b));
        InstructionResult::new(InstructionResult::CONTINUE, 0)
    }
}

// --- DIV_U_64 (203) ---
pub struct DivU64Instruction;

impl DivU64Instruction {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl InstructionHandler for DivU64Instruction {
    fn opcode(&self) -> i32 {
        i32::from(OPCODE_DIV_U_64)
    }
    fn name(&self) -> &'static str {
        "DIV_U_64"
    }
    fn execute(&self, context: &mut InstructionContext<'_>) -> InstructionResult {
        let parsed = parse_three_registers(context.operands);
        let value_a = get_register(context.registers, parsed.register_a);
        let value_b = get_register(context.registers, parsed.register_b);
        let result = if value_b == 0 {
            0xffff_ffff_ffff_ffff
        } else {
            value_a / value_b
        };
        set_register(context.registers, parsed.register_d, result);
        InstructionResult::new(InstructionResult::CONTINUE, 0)
    }
}

// --- DIV_S_64 (204) ---
pub struct DivS64Instruction;

impl DivS64Instruction {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl InstructionHandler for DivS64Instruction {
    fn opcode(&self) -> i32 {
        i32::from(OPCODE_DIV_S_64)
    }
    fn name(&self) -> &'static str {
        "DIV_S_64"
    }
    fn execute(&self, context: &mut InstructionContext<'_>) -> InstructionResult {
        let parsed = parse_three_registers(context.operands);
        let value_a = get_register(context.registers, parsed.register_a);
        let value_b = get_register(context.registers, parsed.register_b);
        let signed_a = to_signed64(value_a);
        let signed_b = to_signed64(value_b);
        let result = if signed_b == 0 {
            0xffff_ffff_ffff_ffffu64
        } else if signed_a == i64::MIN && signed_b == -1 {
            value_a
        } else {
            let q = signed_a / signed_b;
            q as u64
        };
        set_register(context.registers, parsed.register_d, result);
        InstructionResult::new(InstructionResult::CONTINUE, 0)
    }
}

// --- REM_U_64 (205) ---
pub struct RemU64Instruction;

impl RemU64Instruction {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl InstructionHandler for RemU64Instruction {
    fn opcode(&self) -> i32 {
        i32::from(OPCODE_REM_U_64)
    }
    fn name(&self) -> &'static str {
        "REM_U_64"
    }
    fn execute(&self, context: &mut InstructionContext<'_>) -> InstructionResult {
        let parsed = parse_three_registers(context.operands);
        let value_a = get_register(context.registers, parsed.register_a);
        let value_b = get_register(context.registers, parsed.register_b);
        let result = if value_b == 0 {
            value_a
        } else {
            value_a % value_b
        };
        set_register(context.registers, parsed.register_d, result);
        InstructionResult::new(InstructionResult::CONTINUE, 0)
    }
}

// --- REM_S_64 (206) ---
pub struct RemS64Instruction;

impl RemS64Instruction {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl InstructionHandler for RemS64Instruction {
    fn opcode(&self) -> i32 {
        i32::from(OPCODE_REM_S_64)
    }
    fn name(&self) -> &'static str {
        "REM_S_64"
    }
    fn execute(&self, context: &mut InstructionContext<'_>) -> InstructionResult {
        let parsed = parse_three_registers(context.operands);
        let value_a = get_register(context.registers, parsed.register_a);
        let value_b = get_register(context.registers, parsed.register_b);
        let signed_a = to_signed64(value_a);
        let signed_b = to_signed64(value_b);
        let result = if signed_a == i64::MIN && signed_b == -1 {
            0u64
        } else if signed_b == 0 {
            value_a
        } else {
            let abs_a = signed_a.unsigned_abs();
            let abs_b = signed_b.unsigned_abs();
            let sign = if signed_a < 0 { -1i64 } else { 1 };
            let signed_rem = sign * (abs_a as i64 % abs_b as i64);
            signed_rem as u64
        };
        set_register(context.registers, parsed.register_d, result);
        InstructionResult::new(InstructionResult::CONTINUE, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_ram::MockRam;
    use crate::types::RegisterState;

    /// operands[0] = (B<<4)|A, operands[1] = D; r_a=1, r_b=2, r_d=3.
    const OPERANDS: [u8; 2] = [(2 << 4) | 1, 3];

    fn run(handler: &dyn InstructionHandler, a: u64, b: u64) -> u64 {
        let mut registers: RegisterState = [0u64; 13];
        registers[1] = a;
        registers[2] = b;
        let code = [0u8; 4];
        let bitmask = [1u8; 1];
        let jump_table = [];
        let mut ram = MockRam::new();
        let mut context = InstructionContext {
            code: &code,
            bitmask: &bitmask,
            registers: &mut registers,
            program_counter: 0,
            gas_remaining: 1,
            operands: &OPERANDS,
            fskip: OPERANDS.len() as i32,
            jump_table: &jump_table,
            ram: &mut ram,
            host_call_id_out: None,
        };
        handler.execute(&mut context);
        context.registers[3]
    }

    #[test]
    fn div_s_64_min_by_minus_one_saturates() {
        let result = run(&DivS64Instruction::new(), i64::MIN as u64, u64::MAX);
        assert_eq!(result as i64, i64::MIN, "DIV_S(-2^63, -1) = -2^63");
    }

    #[test]
    fn rem_s_64_min_by_minus_one_is_zero() {
        let result = run(&RemS64Instruction::new(), i64::MIN as u64, u64::MAX);
        assert_eq!(result, 0, "REM_S(-2^63, -1) = 0");
    }

    #[test]
    fn div_u_64_by_zero_saturates_to_max() {
        let result = run(&DivU64Instruction::new(), 42, 0);
        assert_eq!(result, u64::MAX, "DIV_U(a, 0) = 2^64-1");
    }

    #[test]
    fn rem_u_64_by_zero_returns_dividend() {
        let result = run(&RemU64Instruction::new(), 42, 0);
        assert_eq!(result, 42, "REM_U(a, 0) = a");
    }

    #[test]
    fn div_s_64_by_zero_is_minus_one() {
        let result = run(&DivS64Instruction::new(), 42, 0);
        assert_eq!(result as i64, -1);
    }

    #[test]
    fn rem_s_64_by_zero_returns_dividend() {
        let result = run(&RemS64Instruction::new(), (-7i64) as u64, 0);
        assert_eq!(result as i64, -7);
    }
}
