/// Statement lowering.
///
/// Functions and classes are hoisted: their bodies go into scripts of their own and
/// leave nothing behind in the enclosing script. Each hoisted script collects its own
/// `declare-register` preamble.

use framec_language::ast::{
    Binding, ClassDecl, ClassMember, Expression, ExprKind, FunctionDecl, Statement,
    StatementKind, UnaryOp, VariableDecl,
};

use crate::command::Command;
use crate::compiler::{ClassScope, Scope, Transpiler};
use crate::decl::ClassInfo;
use crate::diagnostics::{ErrorKind, Result};
use crate::symbol::{SymbolKind, CLASS_SUFFIX, INIT_SUFFIX};

/// Whether traversal continues after a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Next,
    Return,
}

impl Transpiler {
    pub(crate) fn lower_statements(&mut self, statements: &[Statement<'_>], out: &mut Vec<Command>) -> Result<Flow> {
        for (i, stmt) in statements.iter().enumerate() {
            if self.lower_statement(stmt, out)? == Flow::Return {
                let skipped = &statements[i + 1..];
                if let Some(next) = skipped.first() {
                    self.warn(next.line, format!("unreachable code: {} statement(s) after return are skipped", skipped.len()));
                }
                return Ok(Flow::Return);
            }
        }
        Ok(Flow::Next)
    }

    fn lower_statement(&mut self, stmt: &Statement<'_>, out: &mut Vec<Command>) -> Result<Flow> {
        match &stmt.kind {
            StatementKind::Block(statements) => self.lower_statements(statements, out),
            StatementKind::Variables(declarations) => {
                for decl in declarations.iter() {
                    self.lower_variable(decl, out)?;
                }
                Ok(Flow::Next)
            }
            StatementKind::Expression(expr) => {
                self.lower_expression_statement(expr, out)?;
                Ok(Flow::Next)
            }
            StatementKind::Function(function) => {
                self.hoist_function(function)?;
                Ok(Flow::Next)
            }
            StatementKind::Class(class) => {
                self.hoist_class(class)?;
                Ok(Flow::Next)
            }
            StatementKind::Return(value) => {
                self.lower_return(*value, stmt.line, out)?;
                Ok(Flow::Return)
            }
            StatementKind::Import(_) | StatementKind::TypeOnly | StatementKind::Empty => Ok(Flow::Next),
            StatementKind::Other(kind) => {
                self.warn(stmt.line, format!("uncompilable statement {}; its effect is lost", kind));
                Ok(Flow::Next)
            }
        }
    }

    fn lower_variable(&mut self, decl: &VariableDecl<'_>, out: &mut Vec<Command>) -> Result<()> {
        let name = match decl.binding {
            Binding::Identifier(name) => name,
            Binding::Pattern => return Err(self.error(decl.line, ErrorKind::DestructuringDeclaration)),
        };
        let slot = self.alloc.fresh_id(Some(name));
        self.alloc.declare(&slot);
        self.symbols.register(name, &slot, SymbolKind::Variable);

        if let Some(init) = decl.initializer {
            let value = self.lower_value(init, out)?;
            out.push(self.assign(&slot, value));
        }
        Ok(())
    }

    fn lower_expression_statement(&mut self, expr: &Expression<'_>, out: &mut Vec<Command>) -> Result<()> {
        let root = expr.unwrapped();
        let allowed = match &root.kind {
            ExprKind::Call { .. } | ExprKind::New { .. } | ExprKind::Await(_) => true,
            ExprKind::Unary { op: UnaryOp::Increment | UnaryOp::Decrement, .. } => true,
            // XOR passes so that it fails with its own message.
            ExprKind::Binary { op, .. } => op.is_assignment() || op.is_xor(),
            _ => false,
        };
        if !allowed {
            let kind = root.kind_name().to_string();
            return Err(self.error(root.line, ErrorKind::InvalidExpressionStatement { kind }));
        }
        match &root.kind {
            // The value is discarded, so postfix needs no copy of the old value.
            ExprKind::Unary { op, operand, .. } => self.lower_update(root, *op, operand, false, out)?,
            _ => self.lower_expr(root, out)?,
        };
        Ok(())
    }

    fn lower_return(&mut self, value: Option<&Expression<'_>>, line: u32, out: &mut Vec<Command>) -> Result<()> {
        let Some(value) = value else { return Ok(()) };
        let return_slot = self
            .scope
            .owner
            .and_then(|id| self.decls.callable(id))
            .and_then(|callable| callable.return_slot.clone());
        match return_slot {
            Some(slot) => {
                let value = self.lower_value(value, out)?;
                out.push(self.assign(&slot, value));
            }
            None => {
                self.warn(line, "return value outside of a function is discarded");
                self.lower_expr(value, out)?;
            }
        }
        Ok(())
    }

    // ==================== Hoisting ====================

    /// Lower into a fresh script with its own preamble and symbol scope, restoring
    /// the enclosing ones afterwards.
    fn in_script<F>(&mut self, scope: Scope, prologue: Vec<Command>, lower: F) -> Result<Vec<Command>>
    where
        F: FnOnce(&mut Self, &mut Vec<Command>) -> Result<()>,
    {
        let saved_preamble = self.alloc.swap_preamble(Vec::new());
        let saved_scope = std::mem::replace(&mut self.scope, scope);
        self.symbols.enter_scope();

        let mut body = prologue;
        let result = lower(self, &mut body);

        self.symbols.exit_scope();
        self.scope = saved_scope;
        let mut script = self.alloc.swap_preamble(saved_preamble);
        result?;
        script.extend(body);
        Ok(script)
    }

    fn hoist_function(&mut self, function: &FunctionDecl<'_>) -> Result<()> {
        let Some(body) = function.body else { return Ok(()) };
        // Nested functions are not seen by the pre-pass.
        self.declare_function(function)?;
        if function.is_async {
            self.warn(function.line, "async function is lowered synchronously");
        }
        let class = self.scope.class.clone();
        self.lower_callable(function, body, class, Vec::new())
    }

    fn lower_callable(
        &mut self,
        function: &FunctionDecl<'_>,
        body: &[Statement<'_>],
        class: Option<ClassScope>,
        prologue: Vec<Command>,
    ) -> Result<()> {
        let id = function.id;
        let Some(callable) = self.decls.callable(id).cloned() else { return Ok(()) };
        log::debug!("hoisting {} into script `{}`", callable.path, callable.script);

        let scope = Scope { owner: Some(id), class };
        let script = self.in_script(scope, prologue, |this, out| {
            for param in &callable.params {
                this.alloc.declare(&param.slot);
            }
            if let Some(slot) = &callable.return_slot {
                this.alloc.declare(slot);
            }
            this.lower_statements(body, out)?;
            Ok(())
        })?;
        self.push_script(&callable.script, &script, function.line);
        Ok(())
    }

    fn hoist_class(&mut self, class: &ClassDecl<'_>) -> Result<()> {
        if class.is_declared || class.is_abstract {
            return Ok(());
        }
        self.declare_class(class)?;
        let Some(info) = self.decls.class(class.id).cloned() else { return Ok(()) };
        let scope = ClassScope {
            name: info.name.clone(),
            extends: class.extends.map(str::to_string),
        };

        let class_script = format!("{}{}", info.name, CLASS_SUFFIX);
        let fields = self.in_script(Scope { owner: None, class: Some(scope.clone()) }, Vec::new(), |this, out| {
            this.lower_fields(class, &info, out)
        })?;
        self.push_script(&class_script, &fields, class.line);

        // The constructor starts by running the field initializers.
        let prologue = vec![Command::Invoke(self.qualify(&class_script))];
        let constructor = class.members.iter().find_map(|member| match member {
            ClassMember::Constructor(function) if info.constructor == Some(function.id) => Some(*function),
            _ => None,
        });
        match constructor.and_then(|function| function.body.map(|body| (function, body))) {
            Some((function, body)) => self.lower_callable(function, body, Some(scope.clone()), prologue)?,
            None => {
                let init = format!("{}{}", info.name, INIT_SUFFIX);
                self.push_script(&init, &prologue, class.line);
            }
        }

        for member in class.members {
            match member {
                ClassMember::Method(method) => {
                    let function = method.function;
                    let Some(body) = function.body else { continue };
                    if function.is_async {
                        self.warn(function.line, "async method is lowered synchronously");
                    }
                    self.lower_callable(function, body, Some(scope.clone()), Vec::new())?;
                }
                ClassMember::Other { kind, line } => {
                    self.warn(*line, format!("unsupported class member {} in `{}`", kind, info.name));
                }
                ClassMember::Constructor(_) | ClassMember::Property(_) => {}
            }
        }
        Ok(())
    }

    fn lower_fields(&mut self, class: &ClassDecl<'_>, info: &ClassInfo, out: &mut Vec<Command>) -> Result<()> {
        for (_, slot) in &info.fields {
            self.alloc.declare(slot);
        }
        for member in class.members {
            let ClassMember::Property(property) = member else { continue };
            let Some(init) = property.initializer else { continue };
            let Some(slot) = info.field_slot(property.name) else { continue };
            let value = self.lower_value(init, out)?;
            out.push(self.assign(slot, value));
        }
        Ok(())
    }
}
