use crate::cpu::instructions::{Instruction, JumpCondition, ModifyTarget, ReadTarget, WriteTarget};
use crate::cpu::registers::{CpuRegister, CpuRegisterPair};
use crate::memory::AddressSpace;
use once_cell::sync::Lazy;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid opcode sequence: {opcodes:02X?}")]
    InvalidOpcode { opcodes: Vec<u8> },
}

/// Number of immediate bytes following an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    None,
    Byte,
    Word,
}

impl Operand {
    fn len(self) -> u16 {
        match self {
            Self::None => 0,
            Self::Byte => 1,
            Self::Word => 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct OpcodeEntry {
    template: Instruction,
    operand: Operand,
}

impl OpcodeEntry {
    fn new(template: Instruction) -> Self {
        Self { template, operand: Operand::None }
    }

    fn byte(template: Instruction) -> Self {
        Self { template, operand: Operand::Byte }
    }

    fn word(template: Instruction) -> Self {
        Self { template, operand: Operand::Word }
    }
}

const PREFIX_OPCODE: u8 = 0xCB;

static BASE_OPCODES: Lazy<[Option<OpcodeEntry>; 256]> =
    Lazy::new(|| std::array::from_fn(|i| decode_base(i as u8)));

static CB_OPCODES: Lazy<[Option<Instruction>; 256]> =
    Lazy::new(|| std::array::from_fn(|i| decode_cb(i as u8)));

/// Decode the instruction at `pc` without executing it.
///
/// Returns the instruction along with the address of the next instruction. Reading has no side
/// effects on the bus, so this can also be used to disassemble.
pub fn parse_next_instruction(
    address_space: &AddressSpace,
    pc: u16,
) -> Result<(Instruction, u16), ParseError> {
    let opcode = address_space.read_address_u8(pc);

    if opcode == PREFIX_OPCODE {
        let cb_opcode = address_space.read_address_u8(pc.wrapping_add(1));
        return match CB_OPCODES[usize::from(cb_opcode)] {
            Some(instruction) => Ok((instruction, pc.wrapping_add(2))),
            None => Err(ParseError::InvalidOpcode { opcodes: vec![opcode, cb_opcode] }),
        };
    }

    let Some(entry) = BASE_OPCODES[usize::from(opcode)] else {
        return Err(ParseError::InvalidOpcode { opcodes: vec![opcode] });
    };

    let operand_address = pc.wrapping_add(1);
    let instruction = match entry.operand {
        Operand::None => entry.template,
        Operand::Byte => {
            entry.template.with_operand(address_space.read_address_u8(operand_address).into())
        }
        Operand::Word => entry.template.with_operand(address_space.read_address_u16(operand_address)),
    };

    // STOP is followed by a padding byte
    let length = if entry.template == Instruction::Stop { 2 } else { 1 + entry.operand.len() };

    Ok((instruction, pc.wrapping_add(length)))
}

impl Instruction {
    /// Replace the placeholder immediate in a decode-table template with the value read from
    /// memory. Instructions without an immediate are returned unchanged.
    fn with_operand(self, operand: u16) -> Self {
        let n = operand as u8;
        let e = n as i8;

        match self {
            Self::Load(write_target, ReadTarget::Immediate(_)) => {
                Self::Load(write_target, ReadTarget::Immediate(n))
            }
            Self::Load(WriteTarget::Direct(_), read_target) => {
                Self::Load(WriteTarget::Direct(operand), read_target)
            }
            Self::Load(write_target, ReadTarget::Direct(_)) => {
                Self::Load(write_target, ReadTarget::Direct(operand))
            }
            Self::Load(WriteTarget::FFDirect(_), read_target) => {
                Self::Load(WriteTarget::FFDirect(n), read_target)
            }
            Self::Load(write_target, ReadTarget::FFDirect(_)) => {
                Self::Load(write_target, ReadTarget::FFDirect(n))
            }
            Self::LoadRegisterPairImmediate(rr, _) => Self::LoadRegisterPairImmediate(rr, operand),
            Self::LoadDirectStackPointer(_) => Self::LoadDirectStackPointer(operand),
            Self::LoadHLStackPointerOffset(_) => Self::LoadHLStackPointerOffset(e),
            Self::AddSPImmediate(_) => Self::AddSPImmediate(e),
            Self::Add(ReadTarget::Immediate(_)) => Self::Add(ReadTarget::Immediate(n)),
            Self::AddWithCarry(ReadTarget::Immediate(_)) => {
                Self::AddWithCarry(ReadTarget::Immediate(n))
            }
            Self::Subtract(ReadTarget::Immediate(_)) => Self::Subtract(ReadTarget::Immediate(n)),
            Self::SubtractWithCarry(ReadTarget::Immediate(_)) => {
                Self::SubtractWithCarry(ReadTarget::Immediate(n))
            }
            Self::And(ReadTarget::Immediate(_)) => Self::And(ReadTarget::Immediate(n)),
            Self::Or(ReadTarget::Immediate(_)) => Self::Or(ReadTarget::Immediate(n)),
            Self::Xor(ReadTarget::Immediate(_)) => Self::Xor(ReadTarget::Immediate(n)),
            Self::Compare(ReadTarget::Immediate(_)) => Self::Compare(ReadTarget::Immediate(n)),
            Self::Jump(cc, _) => Self::Jump(cc, operand),
            Self::RelativeJump(cc, _) => Self::RelativeJump(cc, e),
            Self::Call(cc, _) => Self::Call(cc, operand),
            other => other,
        }
    }
}

fn read_target_from_bits(opcode: u8) -> ReadTarget {
    CpuRegister::from_low_opcode_bits(opcode).map_or(ReadTarget::IndirectHL, ReadTarget::Register)
}

fn write_target_from_bits(opcode: u8) -> WriteTarget {
    CpuRegister::from_mid_opcode_bits(opcode).map_or(WriteTarget::IndirectHL, WriteTarget::Register)
}

fn modify_target_from_mid_bits(opcode: u8) -> ModifyTarget {
    CpuRegister::from_mid_opcode_bits(opcode)
        .map_or(ModifyTarget::IndirectHL, ModifyTarget::Register)
}

fn modify_target_from_low_bits(opcode: u8) -> ModifyTarget {
    CpuRegister::from_low_opcode_bits(opcode)
        .map_or(ModifyTarget::IndirectHL, ModifyTarget::Register)
}

// LD rr,nn / INC rr / DEC rr / ADD HL,rr
fn register_pair_for_other_ops(opcode: u8) -> CpuRegisterPair {
    match opcode & 0x30 {
        0x00 => CpuRegisterPair::BC,
        0x10 => CpuRegisterPair::DE,
        0x20 => CpuRegisterPair::HL,
        _ => CpuRegisterPair::SP,
    }
}

// PUSH rr / POP rr
fn register_pair_for_push_pop(opcode: u8) -> CpuRegisterPair {
    match opcode & 0x30 {
        0x00 => CpuRegisterPair::BC,
        0x10 => CpuRegisterPair::DE,
        0x20 => CpuRegisterPair::HL,
        _ => CpuRegisterPair::AF,
    }
}

fn parse_jump_condition(opcode: u8) -> JumpCondition {
    match opcode & 0x18 {
        0x00 => JumpCondition::NZ,
        0x08 => JumpCondition::Z,
        0x10 => JumpCondition::NC,
        _ => JumpCondition::C,
    }
}

fn alu_instruction(opcode: u8, read_target: ReadTarget) -> Instruction {
    match opcode & 0x38 {
        0x00 => Instruction::Add(read_target),
        0x08 => Instruction::AddWithCarry(read_target),
        0x10 => Instruction::Subtract(read_target),
        0x18 => Instruction::SubtractWithCarry(read_target),
        0x20 => Instruction::And(read_target),
        0x28 => Instruction::Xor(read_target),
        0x30 => Instruction::Or(read_target),
        _ => Instruction::Compare(read_target),
    }
}

/// Build the decode-table entry for an unprefixed opcode. Immediates are left as zero
/// placeholders and filled in by [`Instruction::with_operand`].
fn decode_base(opcode: u8) -> Option<OpcodeEntry> {
    use Instruction as I;
    use ReadTarget as R;
    use WriteTarget as W;

    let a_read = R::Register(CpuRegister::A);
    let a_write = W::Register(CpuRegister::A);

    let entry = match opcode {
        0x00 => OpcodeEntry::new(I::NoOp),
        0x01 | 0x11 | 0x21 | 0x31 => {
            OpcodeEntry::word(I::LoadRegisterPairImmediate(register_pair_for_other_ops(opcode), 0))
        }
        0x02 => OpcodeEntry::new(I::Load(W::IndirectBC, a_read)),
        0x12 => OpcodeEntry::new(I::Load(W::IndirectDE, a_read)),
        0x22 => OpcodeEntry::new(I::Load(W::IndirectHLInc, a_read)),
        0x32 => OpcodeEntry::new(I::Load(W::IndirectHLDec, a_read)),
        0x03 | 0x13 | 0x23 | 0x33 => {
            OpcodeEntry::new(I::IncRegisterPair(register_pair_for_other_ops(opcode)))
        }
        0x0B | 0x1B | 0x2B | 0x3B => {
            OpcodeEntry::new(I::DecRegisterPair(register_pair_for_other_ops(opcode)))
        }
        0x09 | 0x19 | 0x29 | 0x39 => {
            OpcodeEntry::new(I::AddHLRegister(register_pair_for_other_ops(opcode)))
        }
        0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
            OpcodeEntry::new(I::Increment(modify_target_from_mid_bits(opcode)))
        }
        0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
            OpcodeEntry::new(I::Decrement(modify_target_from_mid_bits(opcode)))
        }
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
            OpcodeEntry::byte(I::Load(write_target_from_bits(opcode), R::Immediate(0)))
        }
        0x07 => OpcodeEntry::new(I::RotateLeft(ModifyTarget::Accumulator)),
        0x0F => OpcodeEntry::new(I::RotateRight(ModifyTarget::Accumulator)),
        0x17 => OpcodeEntry::new(I::RotateLeftThruCarry(ModifyTarget::Accumulator)),
        0x1F => OpcodeEntry::new(I::RotateRightThruCarry(ModifyTarget::Accumulator)),
        0x08 => OpcodeEntry::word(I::LoadDirectStackPointer(0)),
        0x0A => OpcodeEntry::new(I::Load(a_write, R::IndirectBC)),
        0x1A => OpcodeEntry::new(I::Load(a_write, R::IndirectDE)),
        0x2A => OpcodeEntry::new(I::Load(a_write, R::IndirectHLInc)),
        0x3A => OpcodeEntry::new(I::Load(a_write, R::IndirectHLDec)),
        0x10 => OpcodeEntry::new(I::Stop),
        0x18 => OpcodeEntry::byte(I::RelativeJump(None, 0)),
        0x20 | 0x28 | 0x30 | 0x38 => {
            OpcodeEntry::byte(I::RelativeJump(Some(parse_jump_condition(opcode)), 0))
        }
        0x27 => OpcodeEntry::new(I::DecimalAdjustAccumulator),
        0x2F => OpcodeEntry::new(I::ComplementAccumulator),
        0x37 => OpcodeEntry::new(I::SetCarryFlag),
        0x3F => OpcodeEntry::new(I::ComplementCarryFlag),
        0x76 => OpcodeEntry::new(I::Halt),
        0x40..=0x7F => {
            OpcodeEntry::new(I::Load(write_target_from_bits(opcode), read_target_from_bits(opcode)))
        }
        0x80..=0xBF => OpcodeEntry::new(alu_instruction(opcode, read_target_from_bits(opcode))),
        0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
            OpcodeEntry::byte(alu_instruction(opcode, R::Immediate(0)))
        }
        0xC0 | 0xC8 | 0xD0 | 0xD8 => {
            OpcodeEntry::new(I::Return(Some(parse_jump_condition(opcode))))
        }
        0xC9 => OpcodeEntry::new(I::Return(None)),
        0xD9 => OpcodeEntry::new(I::ReturnFromInterruptHandler),
        0xC1 | 0xD1 | 0xE1 | 0xF1 => {
            OpcodeEntry::new(I::PopStack(register_pair_for_push_pop(opcode)))
        }
        0xC5 | 0xD5 | 0xE5 | 0xF5 => {
            OpcodeEntry::new(I::PushStack(register_pair_for_push_pop(opcode)))
        }
        0xC2 | 0xCA | 0xD2 | 0xDA => {
            OpcodeEntry::word(I::Jump(Some(parse_jump_condition(opcode)), 0))
        }
        0xC3 => OpcodeEntry::word(I::Jump(None, 0)),
        0xE9 => OpcodeEntry::new(I::JumpHL),
        0xC4 | 0xCC | 0xD4 | 0xDC => {
            OpcodeEntry::word(I::Call(Some(parse_jump_condition(opcode)), 0))
        }
        0xCD => OpcodeEntry::word(I::Call(None, 0)),
        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
            OpcodeEntry::new(I::RestartCall(opcode & 0x38))
        }
        0xE0 => OpcodeEntry::byte(I::Load(W::FFDirect(0), a_read)),
        0xF0 => OpcodeEntry::byte(I::Load(a_write, R::FFDirect(0))),
        0xE2 => OpcodeEntry::new(I::Load(W::FFIndirectC, a_read)),
        0xF2 => OpcodeEntry::new(I::Load(a_write, R::FFIndirectC)),
        0xEA => OpcodeEntry::word(I::Load(W::Direct(0), a_read)),
        0xFA => OpcodeEntry::word(I::Load(a_write, R::Direct(0))),
        0xE8 => OpcodeEntry::byte(I::AddSPImmediate(0)),
        0xF8 => OpcodeEntry::byte(I::LoadHLStackPointerOffset(0)),
        0xF9 => OpcodeEntry::new(I::LoadStackPointerHL),
        0xF3 => OpcodeEntry::new(I::DisableInterrupts),
        0xFB => OpcodeEntry::new(I::EnableInterrupts),
        // 0xCB is the prefix and is handled before the table lookup. The rest are unused on DMG
        0xCB | 0xD3 | 0xDB | 0xDD | 0xE3 | 0xE4 | 0xEB | 0xEC | 0xED | 0xF4 | 0xFC | 0xFD => {
            return None;
        }
    };

    Some(entry)
}

/// Build the decode-table entry for a CB-prefixed opcode: bits 0-2 select the operand, bits 3-5
/// the bit index or shift kind, and bits 6-7 the operation class.
fn decode_cb(opcode: u8) -> Option<Instruction> {
    let bit = (opcode >> 3) & 0x07;
    let modify_target = modify_target_from_low_bits(opcode);

    let instruction = match opcode >> 6 {
        0x00 => match bit {
            0x00 => Instruction::RotateLeft(modify_target),
            0x01 => Instruction::RotateRight(modify_target),
            0x02 => Instruction::RotateLeftThruCarry(modify_target),
            0x03 => Instruction::RotateRightThruCarry(modify_target),
            0x04 => Instruction::ShiftLeft(modify_target),
            0x05 => Instruction::ArithmeticShiftRight(modify_target),
            0x06 => Instruction::Swap(modify_target),
            0x07 => Instruction::LogicalShiftRight(modify_target),
            _ => return None,
        },
        0x01 => Instruction::TestBit(bit, read_target_from_bits(opcode)),
        0x02 => Instruction::ResetBit(bit, modify_target),
        0x03 => Instruction::SetBit(bit, modify_target),
        _ => return None,
    };

    Some(instruction)
}
