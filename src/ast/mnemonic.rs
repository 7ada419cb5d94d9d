use std::collections::HashMap;

use lazy_static::lazy_static;
use strum::IntoEnumIterator;

/// Mnemonic of an instruction.
///
/// The discriminants are the integer codes handed to the code generator, so the variant order
/// must not change.
#[derive(
    Debug, Hash, Eq, PartialEq, Clone, Copy, strum_macros::EnumIter, strum_macros::Display,
)]
#[repr(u8)]
pub enum Mnemonic {
    LDA = 11,
    LDX,
    LDY,
    STA,
    STX,
    STY,
    TAX,
    TAY,
    TXA,
    TYA,
    TSX,
    TXS,
    PHA,
    PHP,
    PLA,
    PLP,
    AND,
    EOR,
    ORA,
    BIT,
    ADC,
    SBC,
    CMP,
    CPX,
    CPY,
    INC,
    INX,
    INY,
    DEC,
    DEX,
    DEY,
    ASL,
    LSR,
    ROL,
    ROR,
    JMP,
    JSR,
    RTS,
    BCC,
    BCS,
    BEQ,
    BMI,
    BNE,
    BPL,
    BVC,
    BVS,
    CLC,
    CLD,
    CLI,
    CLV,
    SEC,
    SED,
    SEI,
    BRK,
    NOP,
    RTI,
}

/// What an instruction expects after its mnemonic.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum OperandClass {
    /// No operand at all, e.g. `tax`, `rts`.
    Implied,
    /// A full operand expression with optional `,x`/`,y` suffix, e.g. `lda $0200,x`.
    Memory,
    /// Like [`OperandClass::Memory`] but the operand may be left out (accumulator form).
    Accumulator,
    /// A bare name, e.g. `jsr InitScreen` or `bne Loop`.
    Target,
}

lazy_static! {
    static ref MNEMONICS: HashMap<String, Mnemonic> = Mnemonic::iter()
        .map(|mnemonic| (mnemonic.to_string().to_lowercase(), mnemonic))
        .collect();
}

impl Mnemonic {
    /// Look up a mnemonic by its lowercase spelling.
    pub fn from_lowercase(name: &str) -> Option<Mnemonic> {
        MNEMONICS.get(name).copied()
    }

    /// Integer code of the mnemonic as used by the code generator.
    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn is_branching_instruction(&self) -> bool {
        matches!(
            self,
            Mnemonic::BCC
                | Mnemonic::BCS
                | Mnemonic::BEQ
                | Mnemonic::BMI
                | Mnemonic::BNE
                | Mnemonic::BPL
                | Mnemonic::BVC
                | Mnemonic::BVS
        )
    }

    pub fn has_implied_addressing_mode(&self) -> bool {
        matches!(
            self,
            Mnemonic::BRK
                | Mnemonic::CLC
                | Mnemonic::CLD
                | Mnemonic::CLI
                | Mnemonic::CLV
                | Mnemonic::DEX
                | Mnemonic::DEY
                | Mnemonic::INX
                | Mnemonic::INY
                | Mnemonic::NOP
                | Mnemonic::PHA
                | Mnemonic::PHP
                | Mnemonic::PLA
                | Mnemonic::PLP
                | Mnemonic::RTI
                | Mnemonic::RTS
                | Mnemonic::SEC
                | Mnemonic::SED
                | Mnemonic::SEI
                | Mnemonic::TAX
                | Mnemonic::TAY
                | Mnemonic::TSX
                | Mnemonic::TXA
                | Mnemonic::TXS
                | Mnemonic::TYA
        )
    }

    pub fn has_accumulator_addressing_mode(&self) -> bool {
        matches!(
            self,
            Mnemonic::ASL | Mnemonic::LSR | Mnemonic::ROL | Mnemonic::ROR
        )
    }

    pub fn operand_class(&self) -> OperandClass {
        if self.has_implied_addressing_mode() {
            OperandClass::Implied
        } else if self.has_accumulator_addressing_mode() {
            OperandClass::Accumulator
        } else if self.is_branching_instruction() || *self == Mnemonic::JSR {
            OperandClass::Target
        } else {
            OperandClass::Memory
        }
    }
}
