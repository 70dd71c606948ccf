use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OpCode {
    MovePointer,
    AddValue,
    JumpIfZero,
    JumpIfNotZero,
    Input,
    Output,
    SetValue,
}

/// A single bytecode instruction.
///
/// `operand` is the signed delta for `MovePointer`/`AddValue`, the absolute
/// index of the partner bracket for the two jumps once resolved, the literal
/// cell value for `SetValue`, and unused (zero) for `Input`/`Output`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Inst {
    pub op: OpCode,
    pub operand: i32,
}

impl Inst {
    pub const fn new(op: OpCode, operand: i32) -> Self {
        Inst { op, operand }
    }

    pub const fn move_pointer(delta: i32) -> Self {
        Inst::new(OpCode::MovePointer, delta)
    }

    pub const fn add_value(delta: i32) -> Self {
        Inst::new(OpCode::AddValue, delta)
    }

    pub const fn set_value(value: i32) -> Self {
        Inst::new(OpCode::SetValue, value)
    }

    pub const fn jump_if_zero(target: i32) -> Self {
        Inst::new(OpCode::JumpIfZero, target)
    }

    pub const fn jump_if_not_zero(target: i32) -> Self {
        Inst::new(OpCode::JumpIfNotZero, target)
    }

    pub const fn input() -> Self {
        Inst::new(OpCode::Input, 0)
    }

    pub const fn output() -> Self {
        Inst::new(OpCode::Output, 0)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpCode::MovePointer => "mpadd",
            OpCode::AddValue => "add",
            OpCode::JumpIfZero => "jmpz",
            OpCode::JumpIfNotZero => "jmpnz",
            OpCode::Input => "in",
            OpCode::Output => "out",
            OpCode::SetValue => "set",
        };
        f.pad(name)
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            OpCode::Input | OpCode::Output => write!(f, "{}", self.op),
            _ => write!(f, "{:<6}{}", self.op, self.operand),
        }
    }
}

/// Renders a program as one `index  instruction` line per instruction.
pub fn disassemble(prog: &[Inst]) -> String {
    let width = prog.len().saturating_sub(1).to_string().len();
    prog.iter()
        .enumerate()
        .map(|(idx, inst)| format!("{idx:>width$}  {inst}\n"))
        .collect()
}
