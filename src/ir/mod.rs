//! Three-address intermediate code.
//!
//! The code is a flat list of instructions. Control flow is expressed with
//! labels, `IF` (conditional branch with both targets) and `GOTO`. Functions
//! are delimited by `FUNCTION` / `ENDFUNCTION` and take their arguments in
//! parameter slots, see [`parameter_slot`].
use crate::ast::BinaryOp;

mod format;
pub mod generate;
mod usage;

pub use format::{quote_string, Listing};
pub use generate::generate;
pub use usage::OperandUsage;

pub type IRCode = Vec<Instruction>;

/// Name of the `index`th parameter of a function nested in `depth` other
/// functions: `param0`, `param1`, ... at the top level and `param0$1`, ...
/// one level down. `$` never appears in source names.
pub fn parameter_slot(depth: usize, index: usize) -> String {
    match depth {
        0 => format!("param{}", index),
        _ => format!("param{}${}", index, depth),
    }
}

/// Compiler generated value, printed as `t1`, `t2`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Temp(pub usize);

/// Jump target, printed as `L1`, `L2`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Label(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Variable(String),
    Temp(Temp),
    Number(f64),
    Str(String),
}

/// Something that can be written to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Place {
    Variable(String),
    Temp(Temp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOpcode {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    /// shift left, only produced by strength reduction
    Shl,
    /// shift right, only produced by strength reduction
    Shr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Assign {
        target: Place,
        value: Operand,
    },
    Binary {
        op: BinaryOpcode,
        target: Temp,
        lhs: Operand,
        rhs: Operand,
    },
    /// branch to `then` when the condition holds, to `otherwise` when not
    If {
        condition: Operand,
        then: Label,
        otherwise: Label,
    },
    Goto(Label),
    Label(Label),
    Function {
        name: String,
        params: usize,
    },
    EndFunction {
        name: String,
    },
    Push(Operand),
    Call {
        name: String,
        args: usize,
    },
    /// stores the result of the last call
    Pop(Temp),
    Return(Option<Operand>),
    Print(Operand),
}

impl Operand {
    pub fn var(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        if let Self::Number(n) = self {
            Some(*n)
        } else {
            None
        }
    }

    pub const fn as_temp(&self) -> Option<Temp> {
        if let Self::Temp(t) = self {
            Some(*t)
        } else {
            None
        }
    }

    pub const fn is_temp(&self) -> bool {
        matches!(self, Self::Temp(_))
    }

    /// Whether reading this operand reads `place`.
    pub fn refers_to(&self, place: &Place) -> bool {
        match (self, place) {
            (Self::Variable(a), Place::Variable(b)) => a == b,
            (Self::Temp(a), Place::Temp(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Temp> for Operand {
    fn from(t: Temp) -> Self {
        Self::Temp(t)
    }
}

impl From<Place> for Operand {
    fn from(place: Place) -> Self {
        match place {
            Place::Variable(name) => Self::Variable(name),
            Place::Temp(t) => Self::Temp(t),
        }
    }
}

impl From<f64> for Operand {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl Place {
    pub fn var(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    pub const fn as_temp(&self) -> Option<Temp> {
        if let Self::Temp(t) = self {
            Some(*t)
        } else {
            None
        }
    }
}

impl BinaryOpcode {
    pub const fn from_ast(op: BinaryOp) -> Self {
        match op {
            BinaryOp::Add => Self::Add,
            BinaryOp::Subtract => Self::Sub,
            BinaryOp::Multiply => Self::Mul,
            BinaryOp::Divide => Self::Div,
            BinaryOp::Equals => Self::Eq,
            BinaryOp::NotEquals => Self::Ne,
            BinaryOp::Less => Self::Lt,
            BinaryOp::Greater => Self::Gt,
            BinaryOp::LessEqual => Self::Le,
            BinaryOp::GreaterEqual => Self::Ge,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
            Self::Eq => "EQ",
            Self::Ne => "NE",
            Self::Lt => "LT",
            Self::Gt => "GT",
            Self::Le => "LE",
            Self::Ge => "GE",
            Self::Shl => "SHL",
            Self::Shr => "SHR",
        }
    }

    /// `ADD`, `SUB`, `MUL` and `DIV`
    pub const fn is_arithmetic(self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div)
    }

    pub const fn is_commutative(self) -> bool {
        matches!(self, Self::Add | Self::Mul)
    }

    /// Evaluates the operation on two numbers. Only arithmetic is evaluated.
    pub fn evaluate(self, lhs: f64, rhs: f64) -> Option<f64> {
        match self {
            Self::Add => Some(lhs + rhs),
            Self::Sub => Some(lhs - rhs),
            Self::Mul => Some(lhs * rhs),
            Self::Div if rhs != 0.0 => Some(lhs / rhs),
            _ => None,
        }
    }
}

impl Instruction {
    pub fn opcode(&self) -> &'static str {
        match self {
            Self::Assign { .. } => "ASSIGN",
            Self::Binary { op, .. } => op.name(),
            Self::If { .. } => "IF",
            Self::Goto(_) => "GOTO",
            Self::Label(_) => "LABEL",
            Self::Function { .. } => "FUNCTION",
            Self::EndFunction { .. } => "ENDFUNCTION",
            Self::Push(_) => "PUSH",
            Self::Call { .. } => "CALL",
            Self::Pop(_) => "POP",
            Self::Return(_) => "RETURN",
            Self::Print(_) => "PRINT",
        }
    }

    /// The label this instruction defines, if any.
    pub const fn label(&self) -> Option<Label> {
        if let Self::Label(label) = self {
            Some(*label)
        } else {
            None
        }
    }

    /// The place this instruction writes.
    pub fn target(&self) -> Option<Place> {
        match self {
            Self::Assign { target, .. } => Some(target.clone()),
            Self::Binary { target, .. } | Self::Pop(target) => Some(Place::Temp(*target)),
            _ => None,
        }
    }
}
