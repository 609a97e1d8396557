use std::fmt;

use super::{BinaryOpcode, Instruction, Label, Operand, Place, Temp};

macro_rules! write_instruction {
    ($formatter:expr, $name:expr) => {
        $formatter.write_str($name)
    };
    ($formatter:expr, $name:expr, $first:expr $(, $rest:expr)*) => {{
        write!($formatter, "{} {}", $name, $first)?;
        $(write!($formatter, ", {}", $rest)?;)*
        Ok(())
    }};
}

/// Writes `s` as a double quoted literal that both the IR listing and the
/// generated JavaScript accept.
pub fn quote_string(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            ch => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

impl fmt::Display for Temp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Variable(name) => f.write_str(name),
            Operand::Temp(t) => fmt::Display::fmt(t, f),
            Operand::Number(n) if n.is_nan() => f.write_str("NaN"),
            Operand::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Operand::Number(n) => write!(f, "{}", n),
            Operand::Str(s) => f.write_str(&quote_string(s)),
        }
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Variable(name) => f.write_str(name),
            Place::Temp(t) => fmt::Display::fmt(t, f),
        }
    }
}

impl fmt::Display for BinaryOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.opcode();
        match self {
            Instruction::Assign { target, value } => write_instruction!(f, name, target, value),
            Instruction::Binary {
                target, lhs, rhs, ..
            } => write_instruction!(f, name, target, lhs, rhs),
            Instruction::If {
                condition,
                then,
                otherwise,
            } => write_instruction!(f, name, condition, then, otherwise),
            Instruction::Goto(label) => write_instruction!(f, name, label),
            Instruction::Label(label) => {
                write!(f, "{}: ", label)?;
                write_instruction!(f, name, label)
            }
            Instruction::Function { name: function, params } => {
                write_instruction!(f, name, function, params)
            }
            Instruction::EndFunction { name: function } => write_instruction!(f, name, function),
            Instruction::Push(value) | Instruction::Print(value) => {
                write_instruction!(f, name, value)
            }
            Instruction::Call { name: function, args } => {
                write_instruction!(f, name, function, args)
            }
            Instruction::Pop(target) => write_instruction!(f, name, target),
            Instruction::Return(Some(value)) => write_instruction!(f, name, value),
            Instruction::Return(None) => write_instruction!(f, name),
        }
    }
}

/// Numbered listing of a whole instruction list, one per line.
pub struct Listing<'a>(pub &'a [Instruction]);

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, instruction) in self.0.iter().enumerate() {
            writeln!(f, "{:>4}. {}", index + 1, instruction)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_text() {
        let cases = [
            (
                Instruction::Binary {
                    op: BinaryOpcode::Add,
                    target: Temp(1),
                    lhs: Operand::Number(5.0),
                    rhs: Operand::Number(3.0),
                },
                "ADD t1, 5, 3",
            ),
            (
                Instruction::Assign {
                    target: Place::var("x"),
                    value: Operand::Number(2.5),
                },
                "ASSIGN x, 2.5",
            ),
            (Instruction::Label(Label(1)), "L1: LABEL L1"),
            (
                Instruction::If {
                    condition: Operand::Temp(Temp(2)),
                    then: Label(1),
                    otherwise: Label(2),
                },
                "IF t2, L1, L2",
            ),
            (
                Instruction::Function {
                    name: "jog".into(),
                    params: 2,
                },
                "FUNCTION jog, 2",
            ),
            (Instruction::Print(Operand::Str("Yes".into())), "PRINT \"Yes\""),
            (Instruction::Return(None), "RETURN"),
            (Instruction::Pop(Temp(3)), "POP t3"),
        ];
        for (instruction, text) in cases {
            assert_eq!(instruction.to_string(), text);
        }
    }

    #[test]
    fn non_finite_numbers_use_script_names() {
        assert_eq!(Operand::Number(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Operand::Number(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Operand::Number(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(quote_string("a\\b\"c\nd\te"), r#""a\\b\"c\nd\te""#);
        assert_eq!(quote_string("বাংলা"), "\"বাংলা\"");
    }

    #[test]
    fn listing_numbers_lines() {
        let code = vec![Instruction::Goto(Label(3)), Instruction::Return(None)];
        assert_eq!(
            Listing(&code).to_string(),
            "   1. GOTO L3\n   2. RETURN\n"
        );
    }
}
