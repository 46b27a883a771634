/// Minimal arena-allocated AST handed to the transpiler.
///
/// Every child node is an `&'a` reference (or `&'a [T]` slice) into a `bumpalo::Bump`
/// owned by the caller. Declarations carry a `DeclId` so later passes can attach
/// metadata in index-keyed tables instead of keying on node identity.

use serde::Serialize;
use std::fmt;

/// Stable id of a function, method, constructor or class within one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclId(pub u32);

impl DeclId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One parsed source file.
#[derive(Debug, Serialize)]
pub struct Unit<'a> {
    /// Base name including extension (`main.ts`), used in tracers.
    pub file_name: &'a str,
    /// Base name without extension (`main`): frame tag and path prefix.
    pub context: &'a str,
    pub statements: &'a [Statement<'a>],
    /// Number of `DeclId`s handed out while building this unit.
    pub decl_count: u32,
}

#[derive(Debug, Serialize)]
pub struct Statement<'a> {
    pub kind: StatementKind<'a>,
    pub line: u32,
}

#[derive(Debug, Serialize)]
pub enum StatementKind<'a> {
    Block(&'a [Statement<'a>]),
    Import(&'a ImportDecl<'a>),
    Variables(&'a [VariableDecl<'a>]),
    Expression(&'a Expression<'a>),
    Function(&'a FunctionDecl<'a>),
    Class(&'a ClassDecl<'a>),
    Return(Option<&'a Expression<'a>>),
    /// Interfaces and type aliases.
    TypeOnly,
    Empty,
    /// Any statement kind without a lowering rule, by its syntax-kind name.
    Other(&'a str),
}

#[derive(Debug, Serialize)]
pub struct ImportDecl<'a> {
    /// Module specifier as written (`./lib/util`).
    pub module: &'a str,
    pub default: Option<&'a str>,
    pub namespace: Option<&'a str>,
    pub named: &'a [ImportName<'a>],
}

impl<'a> ImportDecl<'a> {
    /// Context name of the imported module: last path segment, extension stripped.
    pub fn module_context(&self) -> &'a str {
        let segment = self.module.rsplit('/').next().unwrap_or(self.module);
        match segment.find('.') {
            Some(0) | None => segment,
            Some(dot) => &segment[..dot],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImportName<'a> {
    /// Exported name in the imported module.
    pub name: &'a str,
    /// Local alias (`import { a as b }`).
    pub alias: Option<&'a str>,
}

impl<'a> ImportName<'a> {
    pub fn local(&self) -> &'a str {
        self.alias.unwrap_or(self.name)
    }
}

#[derive(Debug, Serialize)]
pub struct VariableDecl<'a> {
    pub binding: Binding<'a>,
    pub initializer: Option<&'a Expression<'a>>,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Binding<'a> {
    Identifier(&'a str),
    /// Array or object destructuring pattern.
    Pattern,
}

#[derive(Debug, Serialize)]
pub struct Param<'a> {
    pub binding: Binding<'a>,
    pub rest: bool,
    /// Static type name, if the front-end supplied one.
    pub ty: Option<&'a str>,
    pub line: u32,
}

#[derive(Debug, Serialize)]
pub struct FunctionDecl<'a> {
    pub id: DeclId,
    pub name: Option<&'a str>,
    pub params: &'a [Param<'a>],
    /// `None` for overload signatures and `declare function`.
    pub body: Option<&'a [Statement<'a>]>,
    pub is_async: bool,
    pub line: u32,
}

#[derive(Debug, Serialize)]
pub struct ClassDecl<'a> {
    pub id: DeclId,
    pub name: Option<&'a str>,
    pub extends: Option<&'a str>,
    /// `declare class`.
    pub is_declared: bool,
    pub is_abstract: bool,
    pub members: &'a [ClassMember<'a>],
    pub line: u32,
}

#[derive(Debug, Serialize)]
pub enum ClassMember<'a> {
    Method(MethodDecl<'a>),
    Constructor(&'a FunctionDecl<'a>),
    Property(PropertyDecl<'a>),
    /// Accessors, index signatures and the like.
    Other { kind: &'a str, line: u32 },
}

#[derive(Debug, Serialize)]
pub struct MethodDecl<'a> {
    pub function: &'a FunctionDecl<'a>,
    pub is_static: bool,
}

#[derive(Debug, Serialize)]
pub struct PropertyDecl<'a> {
    pub name: &'a str,
    pub initializer: Option<&'a Expression<'a>>,
    pub is_static: bool,
    pub line: u32,
}

#[derive(Debug, Serialize)]
pub struct Expression<'a> {
    pub kind: ExprKind<'a>,
    pub line: u32,
    /// Static type name resolved by the front-end.
    pub ty: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub enum ExprKind<'a> {
    Number(f64),
    Boolean(bool),
    Null,
    Identifier(&'a str),
    This,
    Super,
    Binary {
        left: &'a Expression<'a>,
        op: BinaryOp<'a>,
        right: &'a Expression<'a>,
    },
    Unary {
        op: UnaryOp<'a>,
        fixity: Fixity,
        operand: &'a Expression<'a>,
    },
    Call {
        callee: &'a Expression<'a>,
        arguments: &'a [&'a Expression<'a>],
    },
    New {
        callee: &'a Expression<'a>,
        arguments: &'a [&'a Expression<'a>],
    },
    Member {
        object: &'a Expression<'a>,
        name: &'a str,
    },
    Await(&'a Expression<'a>),
    /// Parentheses, `as` casts and non-null assertions.
    Wrapped(&'a Expression<'a>),
    /// An expression kind without a lowering rule, by its syntax-kind name.
    Unsupported(&'a str),
}

impl<'a> Expression<'a> {
    /// Look through parentheses and type assertions.
    pub fn unwrapped(&self) -> &Expression<'a> {
        match &self.kind {
            ExprKind::Wrapped(inner) => inner.unwrapped(),
            _ => self,
        }
    }

    /// Syntax-kind style name, used in diagnostics.
    pub fn kind_name(&self) -> &'a str {
        match &self.kind {
            ExprKind::Number(_) => "NumericLiteral",
            ExprKind::Boolean(true) => "TrueKeyword",
            ExprKind::Boolean(false) => "FalseKeyword",
            ExprKind::Null => "NullKeyword",
            ExprKind::Identifier(_) => "Identifier",
            ExprKind::This => "ThisKeyword",
            ExprKind::Super => "SuperKeyword",
            ExprKind::Binary { .. } => "BinaryExpression",
            ExprKind::Unary { fixity: Fixity::Prefix, .. } => "PrefixUnaryExpression",
            ExprKind::Unary { fixity: Fixity::Postfix, .. } => "PostfixUnaryExpression",
            ExprKind::Call { .. } => "CallExpression",
            ExprKind::New { .. } => "NewExpression",
            ExprKind::Member { .. } => "PropertyAccessExpression",
            ExprKind::Await(_) => "AwaitExpression",
            ExprKind::Wrapped(_) => "ParenthesizedExpression",
            ExprKind::Unsupported(kind) => *kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Fixity {
    Prefix,
    Postfix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp<'a> {
    Increment,
    Decrement,
    Other(&'a str),
}

impl<'a> UnaryOp<'a> {
    pub fn from_token(token: &'a str) -> Self {
        match token {
            "++" => UnaryOp::Increment,
            "--" => UnaryOp::Decrement,
            other => UnaryOp::Other(other),
        }
    }
}

impl fmt::Display for UnaryOp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Increment => write!(f, "++"),
            UnaryOp::Decrement => write!(f, "--"),
            UnaryOp::Other(token) => write!(f, "{}", token),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp<'a> {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
    PowAssign,
    BitXor,
    BitXorAssign,
    /// Arithmetic, comparison and logical operators, kept by token.
    Other(&'a str),
}

impl<'a> BinaryOp<'a> {
    pub fn from_token(token: &'a str) -> Self {
        match token {
            "=" => BinaryOp::Assign,
            "+=" => BinaryOp::AddAssign,
            "-=" => BinaryOp::SubAssign,
            "*=" => BinaryOp::MulAssign,
            "/=" => BinaryOp::DivAssign,
            "%=" => BinaryOp::RemAssign,
            "**=" => BinaryOp::PowAssign,
            "^" => BinaryOp::BitXor,
            "^=" => BinaryOp::BitXorAssign,
            other => BinaryOp::Other(other),
        }
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            BinaryOp::Assign
                | BinaryOp::AddAssign
                | BinaryOp::SubAssign
                | BinaryOp::MulAssign
                | BinaryOp::DivAssign
                | BinaryOp::RemAssign
                | BinaryOp::PowAssign
        )
    }

    pub fn is_xor(self) -> bool {
        matches!(self, BinaryOp::BitXor | BinaryOp::BitXorAssign)
    }
}

impl fmt::Display for BinaryOp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            BinaryOp::Assign => "=",
            BinaryOp::AddAssign => "+=",
            BinaryOp::SubAssign => "-=",
            BinaryOp::MulAssign => "*=",
            BinaryOp::DivAssign => "/=",
            BinaryOp::RemAssign => "%=",
            BinaryOp::PowAssign => "**=",
            BinaryOp::BitXor => "^",
            BinaryOp::BitXorAssign => "^=",
            BinaryOp::Other(token) => *token,
        };
        write!(f, "{}", token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_op_tokens() {
        assert_eq!(BinaryOp::from_token("+="), BinaryOp::AddAssign);
        assert_eq!(BinaryOp::from_token("**="), BinaryOp::PowAssign);
        assert_eq!(BinaryOp::from_token("<="), BinaryOp::Other("<="));
        assert!(BinaryOp::from_token("%=").is_assignment());
        assert!(!BinaryOp::from_token("+").is_assignment());
        assert!(BinaryOp::from_token("^=").is_xor());
        assert_eq!(BinaryOp::MulAssign.to_string(), "*=");
    }

    #[test]
    fn test_import_module_context() {
        let import = ImportDecl {
            module: "./lib/util.ts",
            default: None,
            namespace: None,
            named: &[],
        };
        assert_eq!(import.module_context(), "util");

        let bare = ImportDecl { module: "shared", default: None, namespace: None, named: &[] };
        assert_eq!(bare.module_context(), "shared");
    }
}
