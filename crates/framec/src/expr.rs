/// Expression lowering.
///
/// Lowering an expression appends commands to the current script and yields where
/// its value lives: an immediate literal, a register slot, or nothing at all.
/// Only assignments, `++`/`--`, calls and `new` emit commands; everything else
/// only names a value.

use framec_language::ast::{BinaryOp, DeclId, ExprKind, Expression, Fixity, UnaryOp};

use crate::command::{Command, Op};
use crate::compiler::{ClassScope, Transpiler};
use crate::diagnostics::{ErrorKind, Result};
use crate::symbol::{member_key, method_script, SymbolKind, INIT_SUFFIX};

/// Where the value of a lowered expression lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A literal, stored with `set`.
    Immediate(String),
    /// A register, copied with `operation … =`.
    Slot(String),
}

/// Render a numeric literal the way `set` expects it (`5`, `1.5`).
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

impl Transpiler {
    pub(crate) fn lower_expr(&mut self, expr: &Expression<'_>, out: &mut Vec<Command>) -> Result<Option<Operand>> {
        match &expr.kind {
            ExprKind::Number(value) => Ok(Some(Operand::Immediate(format_number(*value)))),
            ExprKind::Boolean(value) => Ok(Some(Operand::Immediate(if *value { "1" } else { "0" }.to_string()))),
            ExprKind::Null => Err(self.error(expr.line, ErrorKind::NullLiteral)),
            ExprKind::Identifier(name) => Ok(Some(Operand::Slot(self.resolve_identifier(name)))),
            ExprKind::This => {
                self.enclosing_class(expr.line)?;
                Ok(None)
            }
            ExprKind::Super => {
                self.parent_class(expr.line)?;
                Ok(None)
            }
            ExprKind::Binary { left, op, right } => self.lower_binary(expr, left, *op, right, out),
            ExprKind::Unary { op, operand, fixity } => {
                self.lower_update(expr, *op, operand, *fixity == Fixity::Postfix, out)
            }
            ExprKind::Call { callee, arguments } => self.lower_call(expr, callee, arguments, out),
            ExprKind::New { callee, arguments } => self.lower_new(expr, callee, arguments, out),
            ExprKind::Member { object, name } => {
                let slot = self.resolve_member(object, name)?;
                Ok(Some(Operand::Slot(slot)))
            }
            ExprKind::Await(_) => Err(self.error(expr.line, ErrorKind::Await)),
            ExprKind::Wrapped(inner) => self.lower_expr(inner, out),
            ExprKind::Unsupported(kind) => {
                Err(self.error(expr.line, ErrorKind::UnsupportedExpression { kind: kind.to_string() }))
            }
        }
    }

    /// Lower an expression whose value is needed.
    pub(crate) fn lower_value(&mut self, expr: &Expression<'_>, out: &mut Vec<Command>) -> Result<Operand> {
        match self.lower_expr(expr, out)? {
            Some(value) => Ok(value),
            None => {
                let kind = expr.unwrapped().kind_name().to_string();
                Err(self.error(expr.line, ErrorKind::NoValue { kind }))
            }
        }
    }

    /// `set` for immediates, `operation … =` for slots.
    pub(crate) fn assign(&self, slot: &str, value: Operand) -> Command {
        match value {
            Operand::Immediate(value) => Command::Set {
                frame: self.frame.owned_tag(),
                register: slot.to_string(),
                value,
            },
            Operand::Slot(source) => self.operation(slot, Op::Assign, source),
        }
    }

    fn operation(&self, lhs: &str, op: Op, rhs: String) -> Command {
        Command::Operation {
            frame: self.frame.owned_tag(),
            lhs: lhs.to_string(),
            op,
            rhs,
        }
    }

    /// Put an immediate into a fresh register so it can be used as an operand.
    fn stage(&mut self, value: Operand, out: &mut Vec<Command>) -> String {
        match value {
            Operand::Slot(slot) => slot,
            Operand::Immediate(_) => {
                let register = self.alloc.fresh_register();
                out.push(self.assign(&register, value));
                register
            }
        }
    }

    // ==================== Names ====================

    /// Parameter of the enclosing callable, then the symbol table, then the raw name.
    fn resolve_identifier(&self, name: &str) -> String {
        let param = self
            .scope
            .owner
            .and_then(|id| self.decls.callable(id))
            .and_then(|callable| callable.param_slot(name));
        match param {
            Some(slot) => slot.to_string(),
            None => self.symbols.resolve(name),
        }
    }

    fn enclosing_class(&self, line: u32) -> Result<&ClassScope> {
        self.scope
            .class
            .as_ref()
            .ok_or_else(|| self.error(line, ErrorKind::ThisOutsideClass))
    }

    fn parent_class(&self, line: u32) -> Result<String> {
        match self.scope.class.as_ref().and_then(|class| class.extends.clone()) {
            Some(parent) => Ok(parent),
            None => Err(self.error(line, ErrorKind::SuperOutsideDerivedClass)),
        }
    }

    /// Class owning the members of `object`, when it is statically known.
    fn member_owner(&self, object: &Expression<'_>) -> Result<Option<String>> {
        let object = object.unwrapped();
        match &object.kind {
            ExprKind::This => Ok(Some(self.enclosing_class(object.line)?.name.clone())),
            ExprKind::Identifier(name) if self.symbols.is_class(name) => Ok(Some(name.to_string())),
            // `Box<number>` owns the members of `Box`.
            _ => Ok(object.ty.map(|ty| ty.split('<').next().unwrap_or(ty).trim().to_string())),
        }
    }

    /// Module context of a namespace import used as `ns.member`.
    fn namespace_of(&self, object: &Expression<'_>) -> Option<String> {
        match &object.unwrapped().kind {
            ExprKind::Identifier(name) => match self.symbols.lookup(name) {
                Some(symbol) if symbol.kind == SymbolKind::Namespace => Some(symbol.path.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Slot of a field read or written through `object.name`.
    fn resolve_member(&self, object: &Expression<'_>, name: &str) -> Result<String> {
        let owner = match self.member_owner(object)? {
            Some(owner) => owner,
            None => {
                if let Some(module) = self.namespace_of(object) {
                    return Ok(format!("{}/{}", module, name));
                }
                let object = object.unwrapped();
                match &object.kind {
                    ExprKind::Identifier(name) => name.to_string(),
                    _ => object.kind_name().to_string(),
                }
            }
        };
        match self.symbols.lookup(&member_key(&owner, name)) {
            Some(symbol) => Ok(symbol.path.clone()),
            None => Err(self.error(object.line, ErrorKind::UnknownMember { owner, member: name.to_string() })),
        }
    }

    /// Left side of an assignment or update.
    fn lower_target(&self, target: &Expression<'_>) -> Result<String> {
        let target = target.unwrapped();
        match &target.kind {
            ExprKind::Identifier(name) => Ok(self.resolve_identifier(name)),
            ExprKind::Member { object, name } => self.resolve_member(object, name),
            ExprKind::This => {
                self.enclosing_class(target.line)?;
                Err(self.error(target.line, ErrorKind::NotAssignable { kind: target.kind_name().to_string() }))
            }
            _ => Err(self.error(target.line, ErrorKind::NotAssignable { kind: target.kind_name().to_string() })),
        }
    }

    // ==================== Operators ====================

    fn lower_binary(
        &mut self,
        expr: &Expression<'_>,
        left: &Expression<'_>,
        op: BinaryOp<'_>,
        right: &Expression<'_>,
        out: &mut Vec<Command>,
    ) -> Result<Option<Operand>> {
        let code = match op {
            BinaryOp::Assign => Op::Assign,
            BinaryOp::AddAssign => Op::Add,
            BinaryOp::SubAssign => Op::Sub,
            BinaryOp::MulAssign => Op::Mul,
            BinaryOp::DivAssign => Op::Div,
            BinaryOp::RemAssign => Op::Rem,
            BinaryOp::PowAssign => return self.lower_square(expr, left, right, out),
            BinaryOp::BitXor | BinaryOp::BitXorAssign => {
                return Err(self.error(expr.line, ErrorKind::BitwiseXor { op: op.to_string() }));
            }
            BinaryOp::Other(token) => {
                return Err(self.error(expr.line, ErrorKind::UnsupportedOperator { op: token.to_string() }));
            }
        };
        let target = self.lower_target(left)?;
        let value = self.lower_value(right, out)?;
        let rhs = self.stage(value, out);
        out.push(self.operation(&target, code, rhs));
        Ok(Some(Operand::Slot(target)))
    }

    /// `x **= 2` as `x *= x`, through a scratch copy of `x`.
    fn lower_square(
        &mut self,
        expr: &Expression<'_>,
        left: &Expression<'_>,
        right: &Expression<'_>,
        out: &mut Vec<Command>,
    ) -> Result<Option<Operand>> {
        let target = self.lower_target(left)?;
        let exponent = self.lower_value(right, out)?;
        if exponent != Operand::Immediate("2".to_string()) {
            return Err(self.error(right.line, ErrorKind::UnsupportedExponent));
        }
        self.warn(expr.line, "`**=` is lowered as a square by repeated multiplication");
        let scratch = self.alloc.fresh_register();
        out.push(self.operation(&scratch, Op::Assign, target.clone()));
        out.push(self.operation(&target, Op::Mul, scratch));
        Ok(Some(Operand::Slot(target)))
    }

    /// `++`/`--`. With `keep_old` the value is the operand before the update,
    /// held in a fresh register.
    pub(crate) fn lower_update(
        &mut self,
        expr: &Expression<'_>,
        op: UnaryOp<'_>,
        operand: &Expression<'_>,
        keep_old: bool,
        out: &mut Vec<Command>,
    ) -> Result<Option<Operand>> {
        let code = match op {
            UnaryOp::Increment => Op::Add,
            UnaryOp::Decrement => Op::Sub,
            UnaryOp::Other(token) => {
                return Err(self.error(expr.line, ErrorKind::UnsupportedOperator { op: token.to_string() }));
            }
        };
        let target = self.lower_target(operand)?;
        let old = if keep_old {
            let register = self.alloc.fresh_register();
            out.push(self.operation(&register, Op::Assign, target.clone()));
            Some(register)
        } else {
            None
        };
        let one = self.stage(Operand::Immediate("1".to_string()), out);
        out.push(self.operation(&target, code, one));
        Ok(Some(Operand::Slot(old.unwrap_or(target))))
    }

    // ==================== Calls ====================

    fn lower_call(
        &mut self,
        expr: &Expression<'_>,
        callee: &Expression<'_>,
        arguments: &[&Expression<'_>],
        out: &mut Vec<Command>,
    ) -> Result<Option<Operand>> {
        let callee = callee.unwrapped();
        let (path, decl) = match &callee.kind {
            ExprKind::Super => {
                let parent = self.parent_class(callee.line)?;
                let path = format!("{}{}", self.symbols.resolve(&parent), INIT_SUFFIX);
                (path, self.constructor_of(&parent))
            }
            ExprKind::Member { object, name } => self.method_target(object, name)?,
            ExprKind::Identifier(name) => self.function_target(name),
            _ => match self.lower_value(callee, out)? {
                Operand::Slot(path) => (path, None),
                Operand::Immediate(_) => {
                    let kind = callee.kind_name().to_string();
                    return Err(self.error(callee.line, ErrorKind::UnsupportedExpression { kind }));
                }
            },
        };
        self.invoke(expr.line, path, decl, arguments, out)
    }

    fn lower_new(
        &mut self,
        expr: &Expression<'_>,
        callee: &Expression<'_>,
        arguments: &[&Expression<'_>],
        out: &mut Vec<Command>,
    ) -> Result<Option<Operand>> {
        let callee = callee.unwrapped();
        let ExprKind::Identifier(class) = &callee.kind else {
            let kind = callee.kind_name().to_string();
            return Err(self.error(callee.line, ErrorKind::UnsupportedExpression { kind }));
        };
        let path = format!("{}{}", self.symbols.resolve(class), INIT_SUFFIX);
        let decl = self.constructor_of(class);
        self.invoke(expr.line, path, decl, arguments, out)?;
        // Instances have no register representation.
        Ok(None)
    }

    fn function_target(&self, name: &str) -> (String, Option<DeclId>) {
        if let Some(slot) = self
            .scope
            .owner
            .and_then(|id| self.decls.callable(id))
            .and_then(|callable| callable.param_slot(name))
        {
            return (slot.to_string(), None);
        }
        match self.symbols.lookup(name) {
            Some(symbol) => (symbol.path.clone(), symbol.decl),
            None => (name.to_string(), None),
        }
    }

    fn method_target(&self, object: &Expression<'_>, name: &str) -> Result<(String, Option<DeclId>)> {
        if let Some(owner) = self.member_owner(object)? {
            if let Some(symbol) = self.symbols.lookup(&member_key(&owner, name)) {
                return Ok((symbol.path.clone(), symbol.decl));
            }
            // Classes from other units: `util/Shape` owns `util/Shape_area`.
            if self.symbols.lookup(&owner).is_some() {
                return Ok((method_script(&self.symbols.resolve(&owner), name), None));
            }
        }
        if let Some(module) = self.namespace_of(object) {
            return Ok((format!("{}/{}", module, name), None));
        }
        Ok((self.symbols.resolve(name), None))
    }

    fn constructor_of(&self, class: &str) -> Option<DeclId> {
        let symbol = self.symbols.lookup(class)?;
        if symbol.kind != SymbolKind::Class {
            return None;
        }
        self.decls.class(symbol.decl?)?.constructor
    }

    /// Caller-copies calling convention: every argument is evaluated first, then
    /// copied into the callee's parameter slots, then the callee's script is invoked.
    fn invoke(
        &mut self,
        line: u32,
        path: String,
        decl: Option<DeclId>,
        arguments: &[&Expression<'_>],
        out: &mut Vec<Command>,
    ) -> Result<Option<Operand>> {
        let callee = decl.and_then(|id| self.decls.callable(id)).cloned();
        match &callee {
            Some(callable) => {
                let values = self.lower_arguments(arguments, out)?;
                for (param, value) in callable.params.iter().zip(values) {
                    out.push(self.assign(&param.slot, value));
                }
                if arguments.len() > callable.params.len() {
                    let surplus = arguments.len() - callable.params.len();
                    self.warn(line, format!("{} surplus argument(s) to `{}` are dropped", surplus, path));
                }
            }
            None => {
                for argument in arguments {
                    self.lower_expr(argument, out)?;
                }
                if !arguments.is_empty() {
                    self.warn(line, format!("arguments to `{}` are dropped: its parameters are unknown", path));
                }
            }
        }
        log::trace!("invoke {}", path);
        out.push(Command::Invoke(path));
        Ok(callee.and_then(|callable| callable.return_slot).map(Operand::Slot))
    }

    /// Evaluate call arguments left to right. A slot value is copied into a fresh
    /// register when a later argument emits commands that could overwrite it.
    fn lower_arguments(&mut self, arguments: &[&Expression<'_>], out: &mut Vec<Command>) -> Result<Vec<Operand>> {
        let mut lowered = Vec::with_capacity(arguments.len());
        for argument in arguments {
            let mut commands = Vec::new();
            let value = self.lower_value(argument, &mut commands)?;
            lowered.push((commands, value));
        }

        let last_effect = lowered.iter().rposition(|(commands, _)| !commands.is_empty());
        let mut values = Vec::with_capacity(lowered.len());
        for (i, (commands, value)) in lowered.into_iter().enumerate() {
            out.extend(commands);
            let value = match value {
                Operand::Slot(slot) if last_effect.is_some_and(|j| j > i) => {
                    let register = self.alloc.fresh_register();
                    out.push(self.operation(&register, Op::Assign, slot));
                    Operand::Slot(register)
                }
                value => value,
            };
            values.push(value);
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.0), "0");
    }
}
