/// Declaration pre-pass.
///
/// Runs over a unit's top-level statements before anything is lowered and registers
/// every import, function, class, method and field, so that forward references
/// resolve. Parameter and return slots are minted here as well.

use framec_language::ast::{
    Binding, ClassDecl, ClassMember, FunctionDecl, ImportDecl, Statement, StatementKind,
};

use crate::compiler::Transpiler;
use crate::decl::{Callable, ClassInfo, DeclInfo, ParamSlot};
use crate::diagnostics::{ErrorKind, Result};
use crate::symbol::{member_key, method_script, qualify, SymbolKind, INIT_SUFFIX};

impl Transpiler {
    pub(crate) fn declare_unit(&mut self, statements: &[Statement<'_>]) -> Result<()> {
        for stmt in statements {
            match &stmt.kind {
                StatementKind::Import(import) => self.declare_import(import),
                StatementKind::Function(function) => self.declare_function(function)?,
                StatementKind::Class(class) => self.declare_class(class)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn declare_import(&mut self, import: &ImportDecl<'_>) {
        let module = import.module_context();
        if let Some(local) = import.default {
            self.symbols.register(local, &qualify(module, local), SymbolKind::Import);
        }
        if let Some(local) = import.namespace {
            self.symbols.register(local, module, SymbolKind::Namespace);
        }
        for name in import.named {
            self.symbols.register(name.local(), &qualify(module, name.name), SymbolKind::Import);
        }
    }

    /// Register a function with a body. Already declared functions are left alone.
    pub(crate) fn declare_function(&mut self, function: &FunctionDecl<'_>) -> Result<()> {
        if function.body.is_none() || self.decls.contains(function.id) {
            return Ok(());
        }
        let name = match function.name {
            Some(name) => name.to_string(),
            None => self.alloc.fresh_id(None),
        };
        let path = self.qualify(&name);
        let callable = self.declare_callable(name.clone(), path.clone(), function)?;
        self.symbols.register_decl(&name, &path, SymbolKind::Function, function.id);
        self.decls.insert(function.id, DeclInfo::Callable(callable));
        Ok(())
    }

    pub(crate) fn declare_class(&mut self, class: &ClassDecl<'_>) -> Result<()> {
        if class.is_declared || class.is_abstract || self.decls.contains(class.id) {
            return Ok(());
        }
        let name = match class.name {
            Some(name) => name.to_string(),
            None => self.alloc.fresh_id(None),
        };
        let path = self.qualify(&name);
        self.symbols.register_decl(&name, &path, SymbolKind::Class, class.id);

        let mut info = ClassInfo { name, path, constructor: None, fields: Vec::new() };
        for member in class.members {
            match member {
                ClassMember::Method(method) => {
                    let function = method.function;
                    let Some(method_name) = function.name else { continue };
                    if function.body.is_none() {
                        continue;
                    }
                    let script = method_script(&info.name, method_name);
                    let path = self.qualify(&script);
                    let callable = self.declare_callable(script, path.clone(), function)?;
                    let kind = if method.is_static { SymbolKind::StaticMethod } else { SymbolKind::Method };
                    self.symbols.register_decl(&member_key(&info.name, method_name), &path, kind, function.id);
                    self.decls.insert(function.id, DeclInfo::Callable(callable));
                }
                ClassMember::Constructor(function) => {
                    if function.body.is_none() {
                        continue;
                    }
                    let script = format!("{}{}", info.name, INIT_SUFFIX);
                    let path = self.qualify(&script);
                    let callable = self.declare_callable(script, path, function)?;
                    self.decls.insert(function.id, DeclInfo::Callable(callable));
                    info.constructor = Some(function.id);
                }
                ClassMember::Property(property) => {
                    let slot = self.alloc.fresh_id(Some(&method_script(&info.name, property.name)));
                    self.symbols.register(&member_key(&info.name, property.name), &slot, SymbolKind::Field);
                    info.fields.push((property.name.to_string(), slot));
                }
                ClassMember::Other { .. } => {}
            }
        }
        log::debug!("declared class {} ({} field(s))", info.path, info.fields.len());
        self.decls.insert(class.id, DeclInfo::Class(info));
        Ok(())
    }

    fn declare_callable(&mut self, script: String, path: String, function: &FunctionDecl<'_>) -> Result<Callable> {
        let mut params = Vec::with_capacity(function.params.len());
        for param in function.params {
            if param.rest {
                let name = match param.binding {
                    Binding::Identifier(name) => name.to_string(),
                    Binding::Pattern => "pattern".to_string(),
                };
                return Err(self.error(param.line, ErrorKind::RestParameter { name }));
            }
            let (name, slot) = match param.binding {
                Binding::Identifier(name) => (Some(name.to_string()), self.alloc.fresh_id(Some(name))),
                Binding::Pattern => (None, self.alloc.fresh_id(None)),
            };
            params.push(ParamSlot { name, slot });
        }
        let return_slot = match function.body {
            Some(body) if returns_value(body) => Some(self.alloc.fresh_id(Some(&format!("{}_return", script)))),
            _ => None,
        };
        log::trace!("callable {} with {} parameter slot(s)", path, params.len());
        Ok(Callable { script, path, params, return_slot })
    }
}

/// Does the body contain `return <value>` outside nested declarations?
fn returns_value(statements: &[Statement<'_>]) -> bool {
    statements.iter().any(|stmt| match &stmt.kind {
        StatementKind::Return(value) => value.is_some(),
        StatementKind::Block(inner) => returns_value(inner),
        _ => false,
    })
}
