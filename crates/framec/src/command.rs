/// Target command vocabulary.
///
/// The target environment only understands six commands, one per text line:
///
/// ```text
/// declare-register <name>
/// set <frame> <register> <value>
/// operation <frame> <lhs> <op> <frame> <rhs>
/// invoke <path>
/// frame-summon <tag>
/// frame-kill <tag>
/// ```
///
/// Register references are tagged with the active call frame. When no frame is
/// active (bare expression lowering) the tag token is left out.

use std::fmt;

/// Operators accepted by the `operation` command. Both operands are registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl Op {
    pub fn symbol(self) -> &'static str {
        match self {
            Op::Assign => "=",
            Op::Add => "+=",
            Op::Sub => "-=",
            Op::Mul => "*=",
            Op::Div => "/=",
            Op::Rem => "%=",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    DeclareRegister(String),
    /// Store an immediate value.
    Set {
        frame: Option<String>,
        register: String,
        value: String,
    },
    /// `lhs op= rhs` between two registers of the same frame.
    Operation {
        frame: Option<String>,
        lhs: String,
        op: Op,
        rhs: String,
    },
    /// Run another script by its qualified path.
    Invoke(String),
    FrameSummon(String),
    FrameKill(String),
}

struct Tagged<'a>(&'a Option<String>, &'a str);

impl fmt::Display for Tagged<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(frame) => write!(f, "{} {}", frame, self.1),
            None => write!(f, "{}", self.1),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::DeclareRegister(name) => write!(f, "declare-register {}", name),
            Command::Set { frame, register, value } => {
                write!(f, "set {} {}", Tagged(frame, register), value)
            }
            Command::Operation { frame, lhs, op, rhs } => {
                write!(f, "operation {} {} {}", Tagged(frame, lhs), op, Tagged(frame, rhs))
            }
            Command::Invoke(path) => write!(f, "invoke {}", path),
            Command::FrameSummon(tag) => write!(f, "frame-summon {}", tag),
            Command::FrameKill(tag) => write!(f, "frame-kill {}", tag),
        }
    }
}

/// Render commands as a script body, one line each.
pub fn render(commands: &[Command]) -> String {
    let mut body = String::new();
    for command in commands {
        body.push_str(&command.to_string());
        body.push('\n');
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_tagged_commands() {
        let frame = Some("main".to_string());
        let commands = vec![
            Command::DeclareRegister("x_1".to_string()),
            Command::FrameSummon("main".to_string()),
            Command::Set { frame: frame.clone(), register: "x_1".to_string(), value: "5".to_string() },
            Command::Operation { frame, lhs: "x_1".to_string(), op: Op::Add, rhs: "register1".to_string() },
            Command::Invoke("main/add".to_string()),
            Command::FrameKill("main".to_string()),
        ];
        assert_eq!(
            render(&commands),
            "declare-register x_1\n\
             frame-summon main\n\
             set main x_1 5\n\
             operation main x_1 += main register1\n\
             invoke main/add\n\
             frame-kill main\n"
        );
    }

    #[test]
    fn test_render_without_frame() {
        let set = Command::Set { frame: None, register: "register1".to_string(), value: "1".to_string() };
        let op = Command::Operation { frame: None, lhs: "a".to_string(), op: Op::Rem, rhs: "register1".to_string() };
        assert_eq!(set.to_string(), "set register1 1");
        assert_eq!(op.to_string(), "operation a %= register1");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[]), "");
    }
}
