mod parse;

use crate::cpu::registers::{CpuRegister, CpuRegisterPair, CpuRegisters};
use crate::memory::AddressSpace;
use dmgemu_proc_macros::EnumDisplay;
use std::fmt::{self, Formatter};

pub use parse::{parse_next_instruction, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumDisplay)]
pub enum JumpCondition {
    NZ,
    Z,
    NC,
    C,
}

impl JumpCondition {
    fn check(self, cpu_registers: &CpuRegisters) -> bool {
        match self {
            Self::NZ => !cpu_registers.zero_flag(),
            Self::Z => cpu_registers.zero_flag(),
            Self::NC => !cpu_registers.carry_flag(),
            Self::C => cpu_registers.carry_flag(),
        }
    }
}

/// Shared evaluation for JP/JR/CALL/RET: no condition means always taken.
fn should_branch(condition: Option<JumpCondition>, cpu_registers: &CpuRegisters) -> bool {
    condition.map_or(true, |cc| cc.check(cpu_registers))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTarget {
    Register(CpuRegister),
    IndirectHL,
    IndirectBC,
    IndirectDE,
    IndirectHLInc,
    IndirectHLDec,
    Direct(u16),
    FFDirect(u8),
    FFIndirectC,
    Immediate(u8),
}

impl ReadTarget {
    fn read_value(self, cpu_registers: &mut CpuRegisters, address_space: &AddressSpace) -> u8 {
        match self {
            Self::Register(r) => cpu_registers.read_register(r),
            Self::IndirectHL => address_space.read_address_u8(cpu_registers.hl()),
            Self::IndirectBC => address_space.read_address_u8(cpu_registers.bc()),
            Self::IndirectDE => address_space.read_address_u8(cpu_registers.de()),
            Self::IndirectHLInc => {
                let hl = cpu_registers.hl();
                cpu_registers.set_hl(hl.wrapping_add(1));
                address_space.read_address_u8(hl)
            }
            Self::IndirectHLDec => {
                let hl = cpu_registers.hl();
                cpu_registers.set_hl(hl.wrapping_sub(1));
                address_space.read_address_u8(hl)
            }
            Self::Direct(nn) => address_space.read_address_u8(nn),
            Self::FFDirect(n) => address_space.read_address_u8(u16::from_be_bytes([0xFF, n])),
            Self::FFIndirectC => {
                address_space.read_address_u8(u16::from_be_bytes([0xFF, cpu_registers.c]))
            }
            Self::Immediate(n) => n,
        }
    }

    /// Machine cycles spent fetching the operand, on top of the opcode fetch.
    fn cycles_required(self) -> u32 {
        match self {
            Self::Register(..) => 0,
            Self::IndirectHL
            | Self::IndirectBC
            | Self::IndirectDE
            | Self::IndirectHLInc
            | Self::IndirectHLDec
            | Self::FFIndirectC
            | Self::Immediate(..) => 1,
            Self::FFDirect(..) => 2,
            Self::Direct(..) => 3,
        }
    }
}

impl fmt::Display for ReadTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(r) => write!(f, "{r}"),
            Self::IndirectHL => write!(f, "(HL)"),
            Self::IndirectBC => write!(f, "(BC)"),
            Self::IndirectDE => write!(f, "(DE)"),
            Self::IndirectHLInc => write!(f, "(HL+)"),
            Self::IndirectHLDec => write!(f, "(HL-)"),
            Self::Direct(nn) => write!(f, "(${nn:04X})"),
            Self::FFDirect(n) => write!(f, "(${n:02X})"),
            Self::FFIndirectC => write!(f, "(C)"),
            Self::Immediate(n) => write!(f, "${n:02X}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTarget {
    Register(CpuRegister),
    IndirectHL,
    IndirectBC,
    IndirectDE,
    IndirectHLInc,
    IndirectHLDec,
    Direct(u16),
    FFDirect(u8),
    FFIndirectC,
}

impl WriteTarget {
    fn write_value(
        self,
        cpu_registers: &mut CpuRegisters,
        address_space: &mut AddressSpace,
        value: u8,
    ) {
        match self {
            Self::Register(r) => {
                cpu_registers.set_register(r, value);
            }
            Self::IndirectHL => {
                address_space.write_address_u8(cpu_registers.hl(), value);
            }
            Self::IndirectBC => {
                address_space.write_address_u8(cpu_registers.bc(), value);
            }
            Self::IndirectDE => {
                address_space.write_address_u8(cpu_registers.de(), value);
            }
            Self::IndirectHLInc => {
                let hl = cpu_registers.hl();
                address_space.write_address_u8(hl, value);
                cpu_registers.set_hl(hl.wrapping_add(1));
            }
            Self::IndirectHLDec => {
                let hl = cpu_registers.hl();
                address_space.write_address_u8(hl, value);
                cpu_registers.set_hl(hl.wrapping_sub(1));
            }
            Self::Direct(nn) => {
                address_space.write_address_u8(nn, value);
            }
            Self::FFDirect(n) => {
                address_space.write_address_u8(u16::from_be_bytes([0xFF, n]), value);
            }
            Self::FFIndirectC => {
                address_space.write_address_u8(u16::from_be_bytes([0xFF, cpu_registers.c]), value);
            }
        }
    }

    fn cycles_required(self) -> u32 {
        match self {
            Self::Register(..) => 0,
            Self::IndirectHL
            | Self::IndirectBC
            | Self::IndirectDE
            | Self::IndirectHLInc
            | Self::IndirectHLDec
            | Self::FFIndirectC => 1,
            Self::FFDirect(..) => 2,
            Self::Direct(..) => 3,
        }
    }
}

impl fmt::Display for WriteTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(r) => write!(f, "{r}"),
            Self::IndirectHL => write!(f, "(HL)"),
            Self::IndirectBC => write!(f, "(BC)"),
            Self::IndirectDE => write!(f, "(DE)"),
            Self::IndirectHLInc => write!(f, "(HL+)"),
            Self::IndirectHLDec => write!(f, "(HL-)"),
            Self::Direct(nn) => write!(f, "(${nn:04X})"),
            Self::FFDirect(n) => write!(f, "(${n:02X})"),
            Self::FFIndirectC => write!(f, "(C)"),
        }
    }
}

/// Operand of read-modify-write instructions. `Accumulator` is the implied operand of the
/// RLCA/RLA/RRCA/RRA forms, which always clear Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyTarget {
    Accumulator,
    Register(CpuRegister),
    IndirectHL,
}

impl ModifyTarget {
    fn read_value(self, cpu_registers: &CpuRegisters, address_space: &AddressSpace) -> u8 {
        match self {
            Self::Accumulator => cpu_registers.accumulator,
            Self::Register(r) => cpu_registers.read_register(r),
            Self::IndirectHL => address_space.read_address_u8(cpu_registers.hl()),
        }
    }

    fn write_value(
        self,
        cpu_registers: &mut CpuRegisters,
        address_space: &mut AddressSpace,
        value: u8,
    ) {
        match self {
            Self::Accumulator => {
                cpu_registers.accumulator = value;
            }
            Self::Register(r) => {
                cpu_registers.set_register(r, value);
            }
            Self::IndirectHL => {
                address_space.write_address_u8(cpu_registers.hl(), value);
            }
        }
    }
}

impl fmt::Display for ModifyTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accumulator => write!(f, "A"),
            Self::Register(r) => write!(f, "{r}"),
            Self::IndirectHL => write!(f, "(HL)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    // LD <w>, <r>
    Load(WriteTarget, ReadTarget),
    // LD rr, nn
    LoadRegisterPairImmediate(CpuRegisterPair, u16),
    // LD (nn), SP
    LoadDirectStackPointer(u16),
    // LD SP, HL
    LoadStackPointerHL,
    // LD HL, SP+e
    LoadHLStackPointerOffset(i8),
    // PUSH rr
    PushStack(CpuRegisterPair),
    // POP rr
    PopStack(CpuRegisterPair),
    // ADD A, <r>
    Add(ReadTarget),
    // ADC A, <r>
    AddWithCarry(ReadTarget),
    // SUB <r>
    Subtract(ReadTarget),
    // SBC A, <r>
    SubtractWithCarry(ReadTarget),
    // AND <r>
    And(ReadTarget),
    // OR <r>
    Or(ReadTarget),
    // XOR <r>
    Xor(ReadTarget),
    // CP <r>
    Compare(ReadTarget),
    // INC <m>
    Increment(ModifyTarget),
    // DEC <m>
    Decrement(ModifyTarget),
    // ADD HL, rr
    AddHLRegister(CpuRegisterPair),
    // INC rr
    IncRegisterPair(CpuRegisterPair),
    // DEC rr
    DecRegisterPair(CpuRegisterPair),
    // ADD SP, e
    AddSPImmediate(i8),
    // RLCA / RLC <m>
    RotateLeft(ModifyTarget),
    // RLA / RL <m>
    RotateLeftThruCarry(ModifyTarget),
    // RRCA / RRC <m>
    RotateRight(ModifyTarget),
    // RRA / RR <m>
    RotateRightThruCarry(ModifyTarget),
    // SLA <m>
    ShiftLeft(ModifyTarget),
    // SRA <m>
    ArithmeticShiftRight(ModifyTarget),
    // SWAP <m>
    Swap(ModifyTarget),
    // SRL <m>
    LogicalShiftRight(ModifyTarget),
    // BIT n, <r>
    TestBit(u8, ReadTarget),
    // RES n, <m>
    ResetBit(u8, ModifyTarget),
    // SET n, <m>
    SetBit(u8, ModifyTarget),
    // CCF
    ComplementCarryFlag,
    // SCF
    SetCarryFlag,
    // DAA
    DecimalAdjustAccumulator,
    // CPL
    ComplementAccumulator,
    // JP [cc,] nn
    Jump(Option<JumpCondition>, u16),
    // JP HL
    JumpHL,
    // JR [cc,] e
    RelativeJump(Option<JumpCondition>, i8),
    // CALL [cc,] nn
    Call(Option<JumpCondition>, u16),
    // RET [cc]
    Return(Option<JumpCondition>),
    // RETI
    ReturnFromInterruptHandler,
    // RST n
    RestartCall(u8),
    // HALT
    Halt,
    // STOP
    Stop,
    // DI
    DisableInterrupts,
    // EI
    EnableInterrupts,
    // NOP
    NoOp,
}

impl Instruction {
    /// Execute this instruction. The PC must already point past the instruction's bytes.
    pub fn execute(self, address_space: &mut AddressSpace, cpu_registers: &mut CpuRegisters) {
        match self {
            Self::Load(write_target, read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                write_target.write_value(cpu_registers, address_space, value);
            }
            Self::LoadRegisterPairImmediate(rr, nn) => {
                cpu_registers.set_register_pair(rr, nn);
            }
            Self::LoadDirectStackPointer(nn) => {
                address_space.write_address_u16(nn, cpu_registers.sp);
            }
            Self::LoadStackPointerHL => {
                cpu_registers.sp = cpu_registers.hl();
            }
            Self::LoadHLStackPointerOffset(e) => {
                let (value, h_flag, c_flag) = add_sp_offset(cpu_registers.sp, e);
                cpu_registers.set_hl(value);
                cpu_registers.set_flags(false, false, h_flag, c_flag);
            }
            Self::PushStack(rr) => {
                let value = cpu_registers.read_register_pair(rr);
                push_stack(address_space, cpu_registers, value);
            }
            Self::PopStack(rr) => {
                let value = pop_stack(address_space, cpu_registers);
                cpu_registers.set_register_pair(rr, value);
            }
            Self::Add(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                let (sum, h_flag, c_flag) = add(cpu_registers.accumulator, value, false);
                cpu_registers.accumulator = sum;
                cpu_registers.set_flags(sum == 0, false, h_flag, c_flag);
            }
            Self::AddWithCarry(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                let carry = cpu_registers.carry_flag();
                let (sum, h_flag, c_flag) = add(cpu_registers.accumulator, value, carry);
                cpu_registers.accumulator = sum;
                cpu_registers.set_flags(sum == 0, false, h_flag, c_flag);
            }
            Self::Subtract(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                let (difference, h_flag, c_flag) = sub(cpu_registers.accumulator, value, false);
                cpu_registers.accumulator = difference;
                cpu_registers.set_flags(difference == 0, true, h_flag, c_flag);
            }
            Self::SubtractWithCarry(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                let carry = cpu_registers.carry_flag();
                let (difference, h_flag, c_flag) = sub(cpu_registers.accumulator, value, carry);
                cpu_registers.accumulator = difference;
                cpu_registers.set_flags(difference == 0, true, h_flag, c_flag);
            }
            Self::And(read_target) => {
                let value = cpu_registers.accumulator
                    & read_target.read_value(cpu_registers, address_space);
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(value == 0, false, true, false);
            }
            Self::Or(read_target) => {
                let value = cpu_registers.accumulator
                    | read_target.read_value(cpu_registers, address_space);
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::Xor(read_target) => {
                let value = cpu_registers.accumulator
                    ^ read_target.read_value(cpu_registers, address_space);
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::Compare(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                let (difference, h_flag, c_flag) = sub(cpu_registers.accumulator, value, false);
                cpu_registers.set_flags(difference == 0, true, h_flag, c_flag);
            }
            Self::Increment(modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                let sum = value.wrapping_add(1);
                modify_target.write_value(cpu_registers, address_space, sum);
                let h_flag = value & 0x0F == 0x0F;
                cpu_registers.set_some_flags(Some(sum == 0), Some(false), Some(h_flag), None);
            }
            Self::Decrement(modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                let difference = value.wrapping_sub(1);
                modify_target.write_value(cpu_registers, address_space, difference);
                let h_flag = value & 0x0F == 0x00;
                cpu_registers.set_some_flags(Some(difference == 0), Some(true), Some(h_flag), None);
            }
            Self::AddHLRegister(rr) => {
                let (sum, h_flag, c_flag) =
                    add_u16(cpu_registers.hl(), cpu_registers.read_register_pair(rr));
                cpu_registers.set_hl(sum);
                cpu_registers.set_some_flags(None, Some(false), Some(h_flag), Some(c_flag));
            }
            Self::IncRegisterPair(rr) => {
                let value = cpu_registers.read_register_pair(rr).wrapping_add(1);
                cpu_registers.set_register_pair(rr, value);
            }
            Self::DecRegisterPair(rr) => {
                let value = cpu_registers.read_register_pair(rr).wrapping_sub(1);
                cpu_registers.set_register_pair(rr, value);
            }
            Self::AddSPImmediate(e) => {
                let (value, h_flag, c_flag) = add_sp_offset(cpu_registers.sp, e);
                cpu_registers.sp = value;
                cpu_registers.set_flags(false, false, h_flag, c_flag);
            }
            Self::RotateLeft(modify_target) => {
                apply_shift(address_space, cpu_registers, modify_target, |value, _| {
                    (value.rotate_left(1), value & 0x80 != 0)
                });
            }
            Self::RotateLeftThruCarry(modify_target) => {
                apply_shift(address_space, cpu_registers, modify_target, |value, carry| {
                    ((value << 1) | u8::from(carry), value & 0x80 != 0)
                });
            }
            Self::RotateRight(modify_target) => {
                apply_shift(address_space, cpu_registers, modify_target, |value, _| {
                    (value.rotate_right(1), value & 0x01 != 0)
                });
            }
            Self::RotateRightThruCarry(modify_target) => {
                apply_shift(address_space, cpu_registers, modify_target, |value, carry| {
                    ((value >> 1) | (u8::from(carry) << 7), value & 0x01 != 0)
                });
            }
            Self::ShiftLeft(modify_target) => {
                apply_shift(address_space, cpu_registers, modify_target, |value, _| {
                    (value << 1, value & 0x80 != 0)
                });
            }
            Self::ArithmeticShiftRight(modify_target) => {
                apply_shift(address_space, cpu_registers, modify_target, |value, _| {
                    ((value >> 1) | (value & 0x80), value & 0x01 != 0)
                });
            }
            Self::LogicalShiftRight(modify_target) => {
                apply_shift(address_space, cpu_registers, modify_target, |value, _| {
                    (value >> 1, value & 0x01 != 0)
                });
            }
            Self::Swap(modify_target) => {
                let value = modify_target
                    .read_value(cpu_registers, address_space)
                    .rotate_left(4);
                modify_target.write_value(cpu_registers, address_space, value);
                cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::TestBit(bit, read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                let z_flag = value & (1 << bit) == 0;
                cpu_registers.set_some_flags(Some(z_flag), Some(false), Some(true), None);
            }
            Self::ResetBit(bit, modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space) & !(1 << bit);
                modify_target.write_value(cpu_registers, address_space, value);
            }
            Self::SetBit(bit, modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space) | (1 << bit);
                modify_target.write_value(cpu_registers, address_space, value);
            }
            Self::ComplementCarryFlag => {
                let c_flag = !cpu_registers.carry_flag();
                cpu_registers.set_some_flags(None, Some(false), Some(false), Some(c_flag));
            }
            Self::SetCarryFlag => {
                cpu_registers.set_some_flags(None, Some(false), Some(false), Some(true));
            }
            Self::DecimalAdjustAccumulator => {
                let (value, c_flag) = decimal_adjust(
                    cpu_registers.accumulator,
                    cpu_registers.subtract_flag(),
                    cpu_registers.half_carry_flag(),
                    cpu_registers.carry_flag(),
                );
                cpu_registers.accumulator = value;
                cpu_registers.set_some_flags(Some(value == 0), None, Some(false), Some(c_flag));
            }
            Self::ComplementAccumulator => {
                cpu_registers.accumulator = !cpu_registers.accumulator;
                cpu_registers.set_some_flags(None, Some(true), Some(true), None);
            }
            Self::Jump(cc, nn) => {
                if should_branch(cc, cpu_registers) {
                    cpu_registers.pc = nn;
                }
            }
            Self::JumpHL => {
                cpu_registers.pc = cpu_registers.hl();
            }
            Self::RelativeJump(cc, e) => {
                if should_branch(cc, cpu_registers) {
                    cpu_registers.pc = cpu_registers.pc.wrapping_add_signed(e.into());
                }
            }
            Self::Call(cc, nn) => {
                if should_branch(cc, cpu_registers) {
                    push_stack(address_space, cpu_registers, cpu_registers.pc);
                    cpu_registers.pc = nn;
                }
            }
            Self::Return(cc) => {
                if should_branch(cc, cpu_registers) {
                    cpu_registers.pc = pop_stack(address_space, cpu_registers);
                }
            }
            Self::ReturnFromInterruptHandler => {
                cpu_registers.pc = pop_stack(address_space, cpu_registers);
                cpu_registers.ime = true;
            }
            Self::RestartCall(rst_address) => {
                push_stack(address_space, cpu_registers, cpu_registers.pc);
                cpu_registers.pc = rst_address.into();
            }
            Self::Halt => {
                cpu_registers.halted = true;
            }
            Self::Stop => {
                log::debug!("STOP executed at {:04X}, treating as NOP", cpu_registers.pc);
            }
            Self::DisableInterrupts => {
                cpu_registers.ime = false;
                cpu_registers.ime_latch.cancel();
            }
            Self::EnableInterrupts => {
                cpu_registers.ime_latch.request();
            }
            Self::NoOp => {}
        }
    }

    /// Number of machine cycles (4 clock cycles each) this instruction takes, given the current
    /// flags. Must be called before [`Instruction::execute`] for conditional branches.
    pub fn cycles_required(self, cpu_registers: &CpuRegisters) -> u32 {
        match self {
            Self::Load(write_target, read_target) => {
                1 + write_target.cycles_required() + read_target.cycles_required()
            }
            Self::Add(read_target)
            | Self::AddWithCarry(read_target)
            | Self::Subtract(read_target)
            | Self::SubtractWithCarry(read_target)
            | Self::And(read_target)
            | Self::Or(read_target)
            | Self::Xor(read_target)
            | Self::Compare(read_target) => 1 + read_target.cycles_required(),
            Self::LoadRegisterPairImmediate(..)
            | Self::PopStack(..)
            | Self::LoadHLStackPointerOffset(..) => 3,
            Self::LoadDirectStackPointer(..) => 5,
            Self::LoadStackPointerHL
            | Self::AddHLRegister(..)
            | Self::IncRegisterPair(..)
            | Self::DecRegisterPair(..) => 2,
            Self::PushStack(..)
            | Self::AddSPImmediate(..)
            | Self::ReturnFromInterruptHandler
            | Self::RestartCall(..) => 4,
            Self::Increment(modify_target) | Self::Decrement(modify_target) => match modify_target
            {
                ModifyTarget::IndirectHL => 3,
                ModifyTarget::Accumulator | ModifyTarget::Register(..) => 1,
            },
            Self::RotateLeft(modify_target)
            | Self::RotateLeftThruCarry(modify_target)
            | Self::RotateRight(modify_target)
            | Self::RotateRightThruCarry(modify_target)
            | Self::ShiftLeft(modify_target)
            | Self::ArithmeticShiftRight(modify_target)
            | Self::Swap(modify_target)
            | Self::LogicalShiftRight(modify_target)
            | Self::ResetBit(_, modify_target)
            | Self::SetBit(_, modify_target) => match modify_target {
                ModifyTarget::Accumulator => 1,
                ModifyTarget::Register(..) => 2,
                ModifyTarget::IndirectHL => 4,
            },
            Self::TestBit(_, read_target) => match read_target {
                ReadTarget::IndirectHL => 3,
                _ => 2,
            },
            Self::Jump(cc, _) => {
                if should_branch(cc, cpu_registers) {
                    4
                } else {
                    3
                }
            }
            Self::RelativeJump(cc, _) => {
                if should_branch(cc, cpu_registers) {
                    3
                } else {
                    2
                }
            }
            Self::Call(cc, _) => {
                if should_branch(cc, cpu_registers) {
                    6
                } else {
                    3
                }
            }
            Self::Return(None) => 4,
            Self::Return(Some(cc)) => {
                if cc.check(cpu_registers) {
                    5
                } else {
                    2
                }
            }
            Self::ComplementCarryFlag
            | Self::SetCarryFlag
            | Self::DecimalAdjustAccumulator
            | Self::ComplementAccumulator
            | Self::JumpHL
            | Self::Halt
            | Self::Stop
            | Self::DisableInterrupts
            | Self::EnableInterrupts
            | Self::NoOp => 1,
        }
    }
}

fn fmt_condition(f: &mut Formatter<'_>, mnemonic: &str, cc: Option<JumpCondition>) -> fmt::Result {
    match cc {
        Some(cc) => write!(f, "{mnemonic} {cc}, "),
        None => write!(f, "{mnemonic} "),
    }
}

fn fmt_shift(f: &mut Formatter<'_>, mnemonic: &str, modify_target: ModifyTarget) -> fmt::Result {
    match modify_target {
        // RLCA, RLA, RRCA, RRA
        ModifyTarget::Accumulator => write!(f, "{mnemonic}A"),
        _ => write!(f, "{mnemonic} {modify_target}"),
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Load(write_target, read_target) => {
                let mnemonic = if matches!(write_target, WriteTarget::FFDirect(..))
                    || matches!(read_target, ReadTarget::FFDirect(..))
                {
                    "LDH"
                } else {
                    "LD"
                };
                write!(f, "{mnemonic} {write_target}, {read_target}")
            }
            Self::LoadRegisterPairImmediate(rr, nn) => write!(f, "LD {rr}, ${nn:04X}"),
            Self::LoadDirectStackPointer(nn) => write!(f, "LD (${nn:04X}), SP"),
            Self::LoadStackPointerHL => write!(f, "LD SP, HL"),
            Self::LoadHLStackPointerOffset(e) => write!(f, "LD HL, SP{e:+}"),
            Self::PushStack(rr) => write!(f, "PUSH {rr}"),
            Self::PopStack(rr) => write!(f, "POP {rr}"),
            Self::Add(read_target) => write!(f, "ADD A, {read_target}"),
            Self::AddWithCarry(read_target) => write!(f, "ADC A, {read_target}"),
            Self::Subtract(read_target) => write!(f, "SUB {read_target}"),
            Self::SubtractWithCarry(read_target) => write!(f, "SBC A, {read_target}"),
            Self::And(read_target) => write!(f, "AND {read_target}"),
            Self::Or(read_target) => write!(f, "OR {read_target}"),
            Self::Xor(read_target) => write!(f, "XOR {read_target}"),
            Self::Compare(read_target) => write!(f, "CP {read_target}"),
            Self::Increment(modify_target) => write!(f, "INC {modify_target}"),
            Self::Decrement(modify_target) => write!(f, "DEC {modify_target}"),
            Self::AddHLRegister(rr) => write!(f, "ADD HL, {rr}"),
            Self::IncRegisterPair(rr) => write!(f, "INC {rr}"),
            Self::DecRegisterPair(rr) => write!(f, "DEC {rr}"),
            Self::AddSPImmediate(e) => write!(f, "ADD SP, {e}"),
            Self::RotateLeft(modify_target) => fmt_shift(f, "RLC", modify_target),
            Self::RotateLeftThruCarry(modify_target) => fmt_shift(f, "RL", modify_target),
            Self::RotateRight(modify_target) => fmt_shift(f, "RRC", modify_target),
            Self::RotateRightThruCarry(modify_target) => fmt_shift(f, "RR", modify_target),
            Self::ShiftLeft(modify_target) => write!(f, "SLA {modify_target}"),
            Self::ArithmeticShiftRight(modify_target) => write!(f, "SRA {modify_target}"),
            Self::Swap(modify_target) => write!(f, "SWAP {modify_target}"),
            Self::LogicalShiftRight(modify_target) => write!(f, "SRL {modify_target}"),
            Self::TestBit(bit, read_target) => write!(f, "BIT {bit}, {read_target}"),
            Self::ResetBit(bit, modify_target) => write!(f, "RES {bit}, {modify_target}"),
            Self::SetBit(bit, modify_target) => write!(f, "SET {bit}, {modify_target}"),
            Self::ComplementCarryFlag => write!(f, "CCF"),
            Self::SetCarryFlag => write!(f, "SCF"),
            Self::DecimalAdjustAccumulator => write!(f, "DAA"),
            Self::ComplementAccumulator => write!(f, "CPL"),
            Self::Jump(cc, nn) => {
                fmt_condition(f, "JP", cc)?;
                write!(f, "${nn:04X}")
            }
            Self::JumpHL => write!(f, "JP HL"),
            Self::RelativeJump(cc, e) => {
                fmt_condition(f, "JR", cc)?;
                write!(f, "{e}")
            }
            Self::Call(cc, nn) => {
                fmt_condition(f, "CALL", cc)?;
                write!(f, "${nn:04X}")
            }
            Self::Return(None) => write!(f, "RET"),
            Self::Return(Some(cc)) => write!(f, "RET {cc}"),
            Self::ReturnFromInterruptHandler => write!(f, "RETI"),
            Self::RestartCall(rst_address) => write!(f, "RST ${rst_address:02X}"),
            Self::Halt => write!(f, "HALT"),
            Self::Stop => write!(f, "STOP"),
            Self::DisableInterrupts => write!(f, "DI"),
            Self::EnableInterrupts => write!(f, "EI"),
            Self::NoOp => write!(f, "NOP"),
        }
    }
}

pub(crate) fn push_stack(
    address_space: &mut AddressSpace,
    cpu_registers: &mut CpuRegisters,
    value: u16,
) {
    let [high, low] = value.to_be_bytes();
    cpu_registers.sp = cpu_registers.sp.wrapping_sub(1);
    address_space.write_address_u8(cpu_registers.sp, high);
    cpu_registers.sp = cpu_registers.sp.wrapping_sub(1);
    address_space.write_address_u8(cpu_registers.sp, low);
}

fn pop_stack(address_space: &AddressSpace, cpu_registers: &mut CpuRegisters) -> u16 {
    let low = address_space.read_address_u8(cpu_registers.sp);
    cpu_registers.sp = cpu_registers.sp.wrapping_add(1);
    let high = address_space.read_address_u8(cpu_registers.sp);
    cpu_registers.sp = cpu_registers.sp.wrapping_add(1);
    u16::from_be_bytes([high, low])
}

/// Read-modify-write helper shared by the rotate and shift instructions. `op` receives the
/// current value and carry flag and returns the new value and carry flag.
fn apply_shift<F>(
    address_space: &mut AddressSpace,
    cpu_registers: &mut CpuRegisters,
    modify_target: ModifyTarget,
    op: F,
) where
    F: FnOnce(u8, bool) -> (u8, bool),
{
    let value = modify_target.read_value(cpu_registers, address_space);
    let (new_value, c_flag) = op(value, cpu_registers.carry_flag());
    modify_target.write_value(cpu_registers, address_space, new_value);

    // The unprefixed accumulator forms always clear Z
    let z_flag = modify_target != ModifyTarget::Accumulator && new_value == 0;
    cpu_registers.set_flags(z_flag, false, false, c_flag);
}

/// Returns (sum, half carry, carry).
fn add(l_value: u8, r_value: u8, carry: bool) -> (u8, bool, bool) {
    let carry = u8::from(carry);
    let sum = u16::from(l_value) + u16::from(r_value) + u16::from(carry);
    let h_flag = (l_value & 0x0F) + (r_value & 0x0F) + carry > 0x0F;

    (sum as u8, h_flag, sum > 0xFF)
}

/// Returns (difference, half borrow, borrow).
fn sub(l_value: u8, r_value: u8, carry: bool) -> (u8, bool, bool) {
    let carry = u8::from(carry);
    let difference = l_value.wrapping_sub(r_value).wrapping_sub(carry);
    let h_flag = (l_value & 0x0F) < (r_value & 0x0F) + carry;
    let c_flag = u16::from(l_value) < u16::from(r_value) + u16::from(carry);

    (difference, h_flag, c_flag)
}

/// 16-bit add with half carry out of bit 11 and carry out of bit 15.
fn add_u16(l_value: u16, r_value: u16) -> (u16, bool, bool) {
    let (sum, c_flag) = l_value.overflowing_add(r_value);
    let h_flag = (l_value & 0x0FFF) + (r_value & 0x0FFF) > 0x0FFF;

    (sum, h_flag, c_flag)
}

/// SP + signed offset. The flags come from the unsigned add of the low byte, not from the 16-bit
/// result.
fn add_sp_offset(sp: u16, e: i8) -> (u16, bool, bool) {
    let offset = e as u16;
    let h_flag = (sp & 0x000F) + (offset & 0x000F) > 0x000F;
    let c_flag = (sp & 0x00FF) + (offset & 0x00FF) > 0x00FF;

    (sp.wrapping_add(offset), h_flag, c_flag)
}

/// BCD correction after an add or subtract. Returns (adjusted accumulator, new carry).
fn decimal_adjust(accumulator: u8, n_flag: bool, h_flag: bool, c_flag: bool) -> (u8, bool) {
    let mut correction = 0;
    let mut carry = false;

    if h_flag || (!n_flag && accumulator & 0x0F > 0x09) {
        correction |= 0x06;
    }

    if c_flag || (!n_flag && accumulator > 0x99) {
        correction |= 0x60;
        carry = true;
    }

    let value = if n_flag {
        accumulator.wrapping_sub(correction)
    } else {
        accumulator.wrapping_add(correction)
    };

    (value, carry)
}
