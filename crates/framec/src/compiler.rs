/// Transpiler session: lowers one source unit at a time into command scripts.
///
/// A `Transpiler` owns everything that lives across units (the id/register
/// allocator) and everything that is rebuilt per unit (symbols, declaration
/// metadata, collected scripts, warnings). Statement lowering lives in `stmt.rs`,
/// expression lowering in `expr.rs` and the declaration pre-pass in `declare.rs`;
/// all of them are `impl Transpiler` blocks over the state defined here.

use framec_language::ast::{DeclId, Expression, Unit};

use crate::allocator::Allocator;
use crate::command::{render, Command};
use crate::decl::DeclTable;
use crate::diagnostics::{Diagnostic, ErrorKind, Result, Tracer, TranspileError};
use crate::frame::CallFrame;
use crate::output::{OutputCollector, Scripts};
use crate::symbol::{qualify, SymbolTable};

/// Scripts and warnings produced by one `compile()` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    /// Context name of the unit (`main` for `main.ts`).
    pub context: String,
    pub scripts: Scripts,
    pub warnings: Vec<Diagnostic>,
}

/// File and context names of the unit being compiled.
#[derive(Debug)]
pub(crate) struct UnitContext {
    pub file: String,
    pub context: String,
}

/// Enclosing class of the code being lowered.
#[derive(Debug, Clone)]
pub(crate) struct ClassScope {
    pub name: String,
    pub extends: Option<String>,
}

/// Lexical position of the lowering: enclosing callable and class.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scope {
    pub owner: Option<DeclId>,
    pub class: Option<ClassScope>,
}

#[derive(Debug, Default)]
pub struct Transpiler {
    pub(crate) alloc: Allocator,
    pub(crate) symbols: SymbolTable,
    pub(crate) decls: DeclTable,
    pub(crate) frame: CallFrame,
    pub(crate) output: OutputCollector,
    pub(crate) warnings: Vec<Diagnostic>,
    pub(crate) unit: Option<UnitContext>,
    pub(crate) scope: Scope,
}

impl Transpiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lower a unit into its scripts: the primary script named after the context,
    /// plus one script per function, method, constructor and class.
    pub fn compile(&mut self, unit: &Unit<'_>) -> Result<Compilation> {
        log::debug!("compiling {} (context `{}`)", unit.file_name, unit.context);

        self.output.reset();
        self.symbols.clear();
        self.decls.reset(unit.decl_count);
        self.warnings.clear();
        self.alloc.take_preamble();
        self.scope = Scope::default();
        self.unit = Some(UnitContext {
            file: unit.file_name.to_string(),
            context: unit.context.to_string(),
        });
        self.frame.enter(unit.context);

        let result = self.compile_unit(unit);

        self.frame.exit();
        self.unit = None;
        result?;

        let compilation = Compilation {
            context: unit.context.to_string(),
            scripts: self.output.snapshot(),
            warnings: std::mem::take(&mut self.warnings),
        };
        log::debug!(
            "{}: {} script(s), {} warning(s)",
            unit.file_name,
            compilation.scripts.len(),
            compilation.warnings.len()
        );
        Ok(compilation)
    }

    fn compile_unit(&mut self, unit: &Unit<'_>) -> Result<()> {
        self.declare_unit(unit.statements)?;

        let mut body = Vec::new();
        self.lower_statements(unit.statements, &mut body)?;

        let preamble = self.alloc.take_preamble();
        let script = render(&preamble) + &self.frame.enter_script(&body);
        self.store_script(unit.context, script, 1);
        Ok(())
    }

    /// Lower a single expression outside of any unit. No frame is active, so
    /// register references carry no frame token.
    pub fn lower_expression(&mut self, expr: &Expression<'_>) -> Result<String> {
        let saved = self.alloc.swap_preamble(Vec::new());
        let mut body = Vec::new();
        let result = self.lower_expr(expr, &mut body);
        let mut commands = self.alloc.swap_preamble(saved);
        result?;
        commands.extend(body);
        Ok(render(&commands))
    }

    /// Start a new session: counters, symbols and collected output are dropped.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn allocator_mut(&mut self) -> &mut Allocator {
        &mut self.alloc
    }

    // ==================== Helpers ====================

    pub(crate) fn tracer(&self, line: u32) -> Tracer {
        let file = match &self.unit {
            Some(unit) => unit.file.clone(),
            None => "<expression>".to_string(),
        };
        Tracer { line, file }
    }

    pub(crate) fn error(&self, line: u32, kind: ErrorKind) -> TranspileError {
        TranspileError::new(self.tracer(line), kind)
    }

    pub(crate) fn warn(&mut self, line: u32, message: impl Into<String>) {
        let warning = Diagnostic::warning(self.tracer(line), message);
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// `context/name` for the unit being compiled.
    pub(crate) fn qualify(&self, name: &str) -> String {
        match &self.unit {
            Some(unit) => qualify(&unit.context, name),
            None => name.to_string(),
        }
    }

    pub(crate) fn push_script(&mut self, name: &str, commands: &[Command], line: u32) {
        self.store_script(name, render(commands), line);
    }

    fn store_script(&mut self, name: &str, body: String, line: u32) {
        if self.output.push(name, body).is_some() {
            self.warn(line, format!("script `{}` is produced twice; the last one is kept", name));
        }
    }
}
