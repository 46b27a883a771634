/// Source document loader.
///
/// External front-ends hand over a parsed and type-annotated tree as JSON:
///
/// ```text
/// { "file": "main.ts",
///   "statements": [ { "kind": "VariableStatement", "line": 1,
///                     "declarations": [ { "name": "x",
///                                         "initializer": { "kind": "NumericLiteral", "value": 5 } } ] } ] }
/// ```
///
/// Node `kind`s use TypeScript syntax-kind names. Kinds without a dedicated AST
/// variant are kept by name (`StatementKind::Other`, `ExprKind::Unsupported`) so the
/// transpiler can report them.

use std::path::Path;

use bumpalo::Bump;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::ast::*;
use crate::builder::AstBuilder;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("line {line}: expected a JSON object for {what}")]
    NotAnObject { what: &'static str, line: u32 },
    #[error("line {line}: {kind} is missing field `{field}`")]
    MissingField { kind: String, field: &'static str, line: u32 },
    #[error("line {line}: field `{field}` of {kind} must be {expected}")]
    InvalidField { kind: String, field: &'static str, expected: &'static str, line: u32 },
}

type Object = Map<String, Value>;

/// Parse `source` as a JSON document and build its unit in `arena`.
///
/// `fallback_name` is used when the document has no `file` field.
pub fn load_unit<'a>(arena: &'a Bump, source: &str, fallback_name: &str) -> Result<Unit<'a>, LoadError> {
    let value: Value = serde_json::from_str(source)?;
    load_value(arena, &value, fallback_name)
}

/// File name assumed for a document without a `file` field:
/// `main.json` and `main.ts.json` both become `main.ts`.
pub fn fallback_name(document: &Path) -> String {
    let stem = document.file_stem().and_then(|s| s.to_str()).unwrap_or("unit");
    if Path::new(stem).extension().is_some() {
        stem.to_string()
    } else {
        format!("{}.ts", stem)
    }
}

/// Build a unit from an already parsed document value.
pub fn load_value<'a>(arena: &'a Bump, value: &Value, fallback_name: &str) -> Result<Unit<'a>, LoadError> {
    let loader = Loader { b: AstBuilder::new(arena) };
    let document = value
        .as_object()
        .ok_or(LoadError::NotAnObject { what: "the document", line: 0 })?;
    let file = match document.get("file") {
        Some(Value::String(s)) => s.as_str(),
        Some(_) => {
            return Err(LoadError::InvalidField {
                kind: "document".to_string(),
                field: "file",
                expected: "a string",
                line: 0,
            });
        }
        None => fallback_name,
    };
    let statements = loader.statements(document, "document", "statements", 0)?;
    log::debug!("loaded {} with {} top-level statements", file, statements.len());
    Ok(loader.b.unit(file, statements))
}

struct Loader<'a> {
    b: AstBuilder<'a>,
}

impl<'a> Loader<'a> {
    // ========== Field access ==========

    fn object<'v>(&self, value: &'v Value, what: &'static str, line: u32) -> Result<&'v Object, LoadError> {
        value.as_object().ok_or(LoadError::NotAnObject { what, line })
    }

    /// Enter a node: read its kind and stamp its line (inherited when absent).
    fn enter<'v>(&self, node: &'v Object, what: &'static str, parent_line: u32) -> Result<&'v str, LoadError> {
        let line = node_line(node, parent_line);
        self.b.at(line);
        match node.get("kind") {
            Some(Value::String(kind)) => Ok(kind.as_str()),
            _ => Err(LoadError::MissingField { kind: what.to_string(), field: "kind", line }),
        }
    }

    fn str_field<'v>(&self, node: &'v Object, kind: &str, field: &'static str) -> Result<&'v str, LoadError> {
        match node.get(field) {
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(_) => Err(self.invalid(kind, field, "a string")),
            None => Err(LoadError::MissingField { kind: kind.to_string(), field, line: self.b.line() }),
        }
    }

    fn opt_str_field<'v>(&self, node: &'v Object, kind: &str, field: &'static str) -> Result<Option<&'v str>, LoadError> {
        match node.get(field) {
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(Value::Null) | None => Ok(None),
            Some(_) => Err(self.invalid(kind, field, "a string")),
        }
    }

    fn flag(&self, node: &Object, kind: &str, field: &'static str) -> Result<bool, LoadError> {
        match node.get(field) {
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::Null) | None => Ok(false),
            Some(_) => Err(self.invalid(kind, field, "a boolean")),
        }
    }

    fn array<'v>(&self, node: &'v Object, kind: &str, field: &'static str) -> Result<&'v [Value], LoadError> {
        match node.get(field) {
            Some(Value::Array(items)) => Ok(items.as_slice()),
            Some(Value::Null) | None => Ok(&[]),
            Some(_) => Err(self.invalid(kind, field, "an array")),
        }
    }

    fn invalid(&self, kind: &str, field: &'static str, expected: &'static str) -> LoadError {
        LoadError::InvalidField { kind: kind.to_string(), field, expected, line: self.b.line() }
    }

    // ========== Statements ==========

    fn statements(&self, node: &Object, kind: &str, field: &'static str, line: u32) -> Result<Vec<Statement<'a>>, LoadError> {
        self.array(node, kind, field)?
            .iter()
            .map(|item| self.statement(item, line))
            .collect()
    }

    fn statement(&self, value: &Value, parent_line: u32) -> Result<Statement<'a>, LoadError> {
        let node = self.object(value, "a statement", parent_line)?;
        let kind = self.enter(node, "statement", parent_line)?;
        let line = self.b.line();
        let stmt = match kind {
            "Block" => {
                let statements = self.statements(node, kind, "statements", line)?;
                self.b.at(line).block(statements)
            }
            "ImportDeclaration" => {
                let module = self.str_field(node, kind, "module")?;
                let default = self.opt_str_field(node, kind, "default")?;
                let namespace = self.opt_str_field(node, kind, "namespace")?;
                let mut named = Vec::new();
                for item in self.array(node, kind, "named")? {
                    let specifier = self.object(item, "an import specifier", line)?;
                    let name = self.str_field(specifier, "ImportSpecifier", "name")?;
                    let alias = self.opt_str_field(specifier, "ImportSpecifier", "alias")?;
                    named.push((name, alias));
                }
                self.b.import(module, default, namespace, &named)
            }
            "VariableStatement" => {
                let mut declarations = Vec::new();
                for item in self.array(node, kind, "declarations")? {
                    declarations.push(self.declarator(item, line)?);
                }
                self.b.at(line).variables(declarations)
            }
            "ExpressionStatement" => {
                let expression = self.required_expr(node, kind, "expression", line)?;
                self.b.at(line).expr_stmt(expression)
            }
            "ReturnStatement" => {
                let value = self.opt_expr(node, "expression", line)?;
                self.b.at(line).ret(value)
            }
            "FunctionDeclaration" => {
                let decl = self.function(node, kind, line)?;
                self.b.function_stmt(decl)
            }
            "ClassDeclaration" => {
                let decl = self.class(node, kind, line)?;
                self.b.class_stmt(decl)
            }
            "InterfaceDeclaration" | "TypeAliasDeclaration" => self.b.type_only(),
            "EmptyStatement" => self.b.empty(),
            other => self.b.other(other),
        };
        Ok(stmt)
    }

    fn declarator(&self, value: &Value, line: u32) -> Result<VariableDecl<'a>, LoadError> {
        let node = self.object(value, "a variable declarator", line)?;
        let initializer = self.opt_expr(node, "initializer", line)?;
        self.b.at(node_line(node, line));
        if self.flag(node, "VariableDeclaration", "pattern")? {
            return Ok(self.b.pattern_declarator(initializer));
        }
        let name = self.str_field(node, "VariableDeclaration", "name")?;
        Ok(self.b.declarator(name, initializer))
    }

    fn params(&self, node: &Object, kind: &str, line: u32) -> Result<Vec<Param<'a>>, LoadError> {
        let mut params = Vec::new();
        for item in self.array(node, kind, "parameters")? {
            let param = self.object(item, "a parameter", line)?;
            self.b.at(node_line(param, line));
            let rest = self.flag(param, "Parameter", "rest")?;
            let ty = self.opt_str_field(param, "Parameter", "type")?;
            let mut built = if self.flag(param, "Parameter", "pattern")? {
                self.b.pattern_param()
            } else {
                self.b.param(self.str_field(param, "Parameter", "name")?)
            };
            built.rest = rest;
            built.ty = ty.map(|t| self.b.str(t));
            params.push(built);
        }
        Ok(params)
    }

    /// Functions, methods and constructors share one shape.
    fn function(&self, node: &Object, kind: &str, line: u32) -> Result<FunctionDecl<'a>, LoadError> {
        let name = self.opt_str_field(node, kind, "name")?;
        let is_async = self.flag(node, kind, "async")?;
        let params = self.params(node, kind, line)?;
        let body = match node.get("body") {
            Some(Value::Null) | None => None,
            Some(Value::Array(_)) => Some(self.statements(node, kind, "body", line)?),
            Some(_) => return Err(self.invalid(kind, "body", "an array of statements")),
        };
        let mut decl = self.b.at(line).function(name, params, body);
        decl.is_async = is_async;
        Ok(decl)
    }

    fn class(&self, node: &Object, kind: &str, line: u32) -> Result<ClassDecl<'a>, LoadError> {
        let name = self.opt_str_field(node, kind, "name")?;
        let extends = self.opt_str_field(node, kind, "extends")?;
        let is_declared = self.flag(node, kind, "declare")?;
        let is_abstract = self.flag(node, kind, "abstract")?;
        let mut members = Vec::new();
        for item in self.array(node, kind, "members")? {
            members.push(self.member(item, line)?);
        }
        let mut decl = self.b.at(line).class(name, extends, members);
        decl.is_declared = is_declared;
        decl.is_abstract = is_abstract;
        Ok(decl)
    }

    fn member(&self, value: &Value, parent_line: u32) -> Result<ClassMember<'a>, LoadError> {
        let node = self.object(value, "a class member", parent_line)?;
        let kind = self.enter(node, "class member", parent_line)?;
        let line = self.b.line();
        let member = match kind {
            "MethodDeclaration" => {
                let is_static = self.flag(node, kind, "static")?;
                self.str_field(node, kind, "name")?;
                let function = self.function(node, kind, line)?;
                self.b.method_decl(function, is_static)
            }
            "Constructor" => {
                let params = self.params(node, kind, line)?;
                let body = self.statements(node, kind, "body", line)?;
                self.b.at(line).constructor(params, body)
            }
            "PropertyDeclaration" => {
                let name = self.str_field(node, kind, "name")?;
                let is_static = self.flag(node, kind, "static")?;
                let initializer = self.opt_expr(node, "initializer", line)?;
                self.b.at(line).property(name, initializer, is_static)
            }
            other => self.b.other_member(other),
        };
        Ok(member)
    }

    // ========== Expressions ==========

    fn required_expr(&self, node: &Object, kind: &str, field: &'static str, line: u32) -> Result<&'a Expression<'a>, LoadError> {
        match node.get(field) {
            Some(Value::Null) | None => Err(LoadError::MissingField { kind: kind.to_string(), field, line }),
            Some(value) => self.expression(value, line),
        }
    }

    fn opt_expr(&self, node: &Object, field: &'static str, line: u32) -> Result<Option<&'a Expression<'a>>, LoadError> {
        match node.get(field) {
            Some(Value::Null) | None => Ok(None),
            Some(value) => self.expression(value, line).map(Some),
        }
    }

    fn arguments(&self, node: &Object, kind: &str, line: u32) -> Result<Vec<&'a Expression<'a>>, LoadError> {
        self.array(node, kind, "arguments")?
            .iter()
            .map(|arg| self.expression(arg, line))
            .collect()
    }

    fn expression(&self, value: &Value, parent_line: u32) -> Result<&'a Expression<'a>, LoadError> {
        let node = self.object(value, "an expression", parent_line)?;
        let kind = self.enter(node, "expression", parent_line)?;
        let line = self.b.line();
        let ty = self.opt_str_field(node, kind, "type")?;
        let built = match kind {
            "NumericLiteral" => ExprKind::Number(self.number(node, kind, line)?),
            "TrueKeyword" => ExprKind::Boolean(true),
            "FalseKeyword" => ExprKind::Boolean(false),
            "NullKeyword" => ExprKind::Null,
            "ThisKeyword" => ExprKind::This,
            "SuperKeyword" => ExprKind::Super,
            "Identifier" => ExprKind::Identifier(self.b.str(self.str_field(node, kind, "name")?)),
            "BinaryExpression" => {
                let op = BinaryOp::from_token(self.b.str(self.str_field(node, kind, "operator")?));
                let left = self.required_expr(node, kind, "left", line)?;
                let right = self.required_expr(node, kind, "right", line)?;
                ExprKind::Binary { left, op, right }
            }
            "PrefixUnaryExpression" | "PostfixUnaryExpression" => {
                let op = UnaryOp::from_token(self.b.str(self.str_field(node, kind, "operator")?));
                let operand = self.required_expr(node, kind, "operand", line)?;
                let fixity = if kind == "PrefixUnaryExpression" { Fixity::Prefix } else { Fixity::Postfix };
                ExprKind::Unary { op, fixity, operand }
            }
            "CallExpression" | "NewExpression" => {
                let callee = self.required_expr(node, kind, "expression", line)?;
                let arguments = self.b.slice(self.arguments(node, kind, line)?);
                if kind == "CallExpression" {
                    ExprKind::Call { callee, arguments }
                } else {
                    ExprKind::New { callee, arguments }
                }
            }
            "PropertyAccessExpression" => {
                let name = self.b.str(self.str_field(node, kind, "name")?);
                let object = self.required_expr(node, kind, "expression", line)?;
                ExprKind::Member { object, name }
            }
            "AwaitExpression" => ExprKind::Await(self.required_expr(node, kind, "expression", line)?),
            "ParenthesizedExpression" | "AsExpression" | "NonNullExpression" | "TypeAssertionExpression" => {
                ExprKind::Wrapped(self.required_expr(node, kind, "expression", line)?)
            }
            other => ExprKind::Unsupported(self.b.str(other)),
        };
        Ok(self.b.node(built, line, ty))
    }

    fn number(&self, node: &Object, kind: &str, line: u32) -> Result<f64, LoadError> {
        match node.get("value") {
            Some(Value::Number(n)) => n.as_f64().ok_or_else(|| self.invalid(kind, "value", "a finite number")),
            Some(Value::String(text)) => text.parse::<f64>().map_err(|_| self.invalid(kind, "value", "a number")),
            _ => Err(LoadError::MissingField { kind: kind.to_string(), field: "value", line }),
        }
    }
}

/// Line of `node`; absent or out-of-range lines inherit `fallback`.
fn node_line(node: &Object, fallback: u32) -> u32 {
    node.get("line")
        .and_then(Value::as_u64)
        .and_then(|l| u32::try_from(l).ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_variable_statement() {
        let arena = Bump::new();
        let doc = json!({
            "file": "main.ts",
            "statements": [
                { "kind": "VariableStatement", "line": 2, "declarations": [
                    { "name": "x", "initializer": { "kind": "NumericLiteral", "value": 5 } }
                ] }
            ]
        });
        let unit = load_value(&arena, &doc, "ignored.ts").unwrap();
        assert_eq!(unit.file_name, "main.ts");
        assert_eq!(unit.context, "main");
        assert_eq!(unit.statements.len(), 1);
        assert_eq!(unit.statements[0].line, 2);
        match &unit.statements[0].kind {
            StatementKind::Variables(decls) => {
                assert_eq!(decls[0].binding, Binding::Identifier("x"));
                let init = decls[0].initializer.expect("initializer");
                assert!(matches!(init.kind, ExprKind::Number(v) if v == 5.0));
                assert_eq!(init.line, 2);
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_line_is_inherited() {
        let arena = Bump::new();
        let doc = json!({
            "file": "main.ts",
            "statements": [
                { "kind": "ExpressionStatement", "line": 7,
                  "expression": { "kind": "Identifier", "name": "x", "line": 4_294_967_303u64 } }
            ]
        });
        let unit = load_value(&arena, &doc, "main.ts").unwrap();
        match &unit.statements[0].kind {
            StatementKind::Expression(e) => assert_eq!(e.line, 7),
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_load_fallback_name() {
        let arena = Bump::new();
        let unit = load_unit(&arena, r#"{ "statements": [] }"#, "game/tick.ts").unwrap();
        assert_eq!(unit.file_name, "tick.ts");
        assert_eq!(unit.context, "tick");
    }

    #[test]
    fn test_load_function_and_class() {
        let arena = Bump::new();
        let doc = json!({
            "file": "main.ts",
            "statements": [
                { "kind": "FunctionDeclaration", "line": 1, "name": "add", "async": true,
                  "parameters": [ { "name": "a" }, { "name": "rest", "rest": true } ],
                  "body": [] },
                { "kind": "ClassDeclaration", "line": 4, "name": "C", "extends": "Base",
                  "members": [
                      { "kind": "PropertyDeclaration", "name": "value",
                        "initializer": { "kind": "NumericLiteral", "value": 1 } },
                      { "kind": "MethodDeclaration", "name": "m", "static": true, "body": [] },
                      { "kind": "GetAccessor", "line": 9 }
                  ] }
            ]
        });
        let unit = load_value(&arena, &doc, "main.ts").unwrap();
        assert_eq!(unit.decl_count, 3);
        match &unit.statements[0].kind {
            StatementKind::Function(f) => {
                assert_eq!(f.name, Some("add"));
                assert!(f.is_async);
                assert_eq!(f.params.len(), 2);
                assert!(f.params[1].rest);
                assert!(f.body.is_some());
            }
            other => panic!("unexpected statement: {:?}", other),
        }
        match &unit.statements[1].kind {
            StatementKind::Class(c) => {
                assert_eq!(c.name, Some("C"));
                assert_eq!(c.extends, Some("Base"));
                assert_eq!(c.line, 4);
                assert!(matches!(c.members[0], ClassMember::Property(_)));
                assert!(matches!(&c.members[1], ClassMember::Method(m) if m.is_static));
                assert!(matches!(c.members[2], ClassMember::Other { kind: "GetAccessor", line: 9 }));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_kinds_are_kept_by_name() {
        let arena = Bump::new();
        let doc = json!({
            "file": "main.ts",
            "statements": [
                { "kind": "IfStatement", "line": 3 },
                { "kind": "ExpressionStatement", "line": 4,
                  "expression": { "kind": "ArrayLiteralExpression" } }
            ]
        });
        let unit = load_value(&arena, &doc, "main.ts").unwrap();
        assert!(matches!(unit.statements[0].kind, StatementKind::Other("IfStatement")));
        match &unit.statements[1].kind {
            StatementKind::Expression(e) => {
                assert_eq!(e.kind_name(), "ArrayLiteralExpression");
                assert_eq!(e.line, 4);
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_static_types_are_attached() {
        let arena = Bump::new();
        let doc = json!({
            "statements": [
                { "kind": "ExpressionStatement", "expression": {
                    "kind": "CallExpression", "arguments": [],
                    "expression": { "kind": "PropertyAccessExpression", "name": "m",
                                    "expression": { "kind": "Identifier", "name": "other", "type": "C" } } } }
            ]
        });
        let unit = load_value(&arena, &doc, "main.ts").unwrap();
        let StatementKind::Expression(call) = &unit.statements[0].kind else {
            panic!("expected an expression statement");
        };
        let ExprKind::Call { callee, .. } = &call.kind else {
            panic!("expected a call");
        };
        let ExprKind::Member { object, name } = &callee.kind else {
            panic!("expected a member access");
        };
        assert_eq!(*name, "m");
        assert_eq!(object.ty, Some("C"));
    }

    #[test]
    fn test_missing_kind_is_an_error() {
        let arena = Bump::new();
        let doc = json!({ "statements": [ { "line": 5 } ] });
        let err = load_value(&arena, &doc, "main.ts").unwrap_err();
        assert!(matches!(err, LoadError::MissingField { field: "kind", line: 5, .. }));
    }

    #[test]
    fn test_fallback_name_from_document_path() {
        assert_eq!(fallback_name(Path::new("out/main.json")), "main.ts");
        assert_eq!(fallback_name(Path::new("main.ts.json")), "main.ts");
    }

    #[test]
    fn test_invalid_json() {
        let arena = Bump::new();
        assert!(matches!(load_unit(&arena, "{", "main.ts"), Err(LoadError::Json(_))));
    }
}
