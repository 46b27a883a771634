/// AST builder over a `bumpalo` arena.
///
/// Used by the document loader and by tests to assemble units by hand. The builder
/// hands out `DeclId`s in creation order and stamps every node with the current
/// line (see [`AstBuilder::at`]).

use std::cell::Cell;
use std::path::Path;

use bumpalo::Bump;

use crate::ast::*;

pub struct AstBuilder<'a> {
    arena: &'a Bump,
    next_decl: Cell<u32>,
    line: Cell<u32>,
}

impl<'a> AstBuilder<'a> {
    pub fn new(arena: &'a Bump) -> Self {
        Self {
            arena,
            next_decl: Cell::new(0),
            line: Cell::new(1),
        }
    }

    /// Set the line stamped on nodes built from now on.
    pub fn at(&self, line: u32) -> &Self {
        self.line.set(line);
        self
    }

    pub fn line(&self) -> u32 {
        self.line.get()
    }

    pub fn decl_count(&self) -> u32 {
        self.next_decl.get()
    }

    fn next_decl_id(&self) -> DeclId {
        let id = self.next_decl.get();
        self.next_decl.set(id + 1);
        DeclId(id)
    }

    pub fn str(&self, s: &str) -> &'a str {
        self.arena.alloc_str(s)
    }

    fn opt_str(&self, s: Option<&str>) -> Option<&'a str> {
        s.map(|s| self.str(s))
    }

    pub fn slice<T, I>(&self, items: I) -> &'a [T]
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arena.alloc_slice_fill_iter(items)
    }

    // ========== Expressions ==========

    pub fn expr(&self, kind: ExprKind<'a>) -> &'a Expression<'a> {
        self.arena.alloc(Expression { kind, line: self.line(), ty: None })
    }

    pub fn typed(&self, kind: ExprKind<'a>, ty: &str) -> &'a Expression<'a> {
        self.node(kind, self.line(), Some(ty))
    }

    /// Allocate an expression with an explicit line and optional static type.
    pub fn node(&self, kind: ExprKind<'a>, line: u32, ty: Option<&str>) -> &'a Expression<'a> {
        let ty = self.opt_str(ty);
        self.arena.alloc(Expression { kind, line, ty })
    }

    pub fn num(&self, value: f64) -> &'a Expression<'a> {
        self.expr(ExprKind::Number(value))
    }

    pub fn boolean(&self, value: bool) -> &'a Expression<'a> {
        self.expr(ExprKind::Boolean(value))
    }

    pub fn null(&self) -> &'a Expression<'a> {
        self.expr(ExprKind::Null)
    }

    pub fn ident(&self, name: &str) -> &'a Expression<'a> {
        self.expr(ExprKind::Identifier(self.str(name)))
    }

    /// Identifier whose static type the front-end resolved to `ty`.
    pub fn typed_ident(&self, name: &str, ty: &str) -> &'a Expression<'a> {
        self.typed(ExprKind::Identifier(self.str(name)), ty)
    }

    pub fn this(&self) -> &'a Expression<'a> {
        self.expr(ExprKind::This)
    }

    pub fn super_keyword(&self) -> &'a Expression<'a> {
        self.expr(ExprKind::Super)
    }

    pub fn binary(&self, left: &'a Expression<'a>, op: &str, right: &'a Expression<'a>) -> &'a Expression<'a> {
        let op = BinaryOp::from_token(self.str(op));
        self.expr(ExprKind::Binary { left, op, right })
    }

    pub fn prefix(&self, op: &str, operand: &'a Expression<'a>) -> &'a Expression<'a> {
        let op = UnaryOp::from_token(self.str(op));
        self.expr(ExprKind::Unary { op, fixity: Fixity::Prefix, operand })
    }

    pub fn postfix(&self, op: &str, operand: &'a Expression<'a>) -> &'a Expression<'a> {
        let op = UnaryOp::from_token(self.str(op));
        self.expr(ExprKind::Unary { op, fixity: Fixity::Postfix, operand })
    }

    pub fn call(&self, callee: &'a Expression<'a>, arguments: Vec<&'a Expression<'a>>) -> &'a Expression<'a> {
        let arguments = self.slice(arguments);
        self.expr(ExprKind::Call { callee, arguments })
    }

    pub fn new_expr(&self, callee: &'a Expression<'a>, arguments: Vec<&'a Expression<'a>>) -> &'a Expression<'a> {
        let arguments = self.slice(arguments);
        self.expr(ExprKind::New { callee, arguments })
    }

    pub fn member(&self, object: &'a Expression<'a>, name: &str) -> &'a Expression<'a> {
        self.expr(ExprKind::Member { object, name: self.str(name) })
    }

    pub fn await_expr(&self, inner: &'a Expression<'a>) -> &'a Expression<'a> {
        self.expr(ExprKind::Await(inner))
    }

    pub fn wrapped(&self, inner: &'a Expression<'a>) -> &'a Expression<'a> {
        self.expr(ExprKind::Wrapped(inner))
    }

    pub fn unsupported(&self, kind: &str) -> &'a Expression<'a> {
        self.expr(ExprKind::Unsupported(self.str(kind)))
    }

    // ========== Statements ==========

    pub fn stmt(&self, kind: StatementKind<'a>) -> Statement<'a> {
        Statement { kind, line: self.line() }
    }

    pub fn declarator(&self, name: &str, initializer: Option<&'a Expression<'a>>) -> VariableDecl<'a> {
        VariableDecl {
            binding: Binding::Identifier(self.str(name)),
            initializer,
            line: self.line(),
        }
    }

    pub fn pattern_declarator(&self, initializer: Option<&'a Expression<'a>>) -> VariableDecl<'a> {
        VariableDecl { binding: Binding::Pattern, initializer, line: self.line() }
    }

    pub fn variables(&self, declarations: Vec<VariableDecl<'a>>) -> Statement<'a> {
        self.stmt(StatementKind::Variables(self.slice(declarations)))
    }

    /// `let name = initializer;`
    pub fn let_stmt(&self, name: &str, initializer: Option<&'a Expression<'a>>) -> Statement<'a> {
        let declarator = self.declarator(name, initializer);
        self.variables(vec![declarator])
    }

    pub fn expr_stmt(&self, expression: &'a Expression<'a>) -> Statement<'a> {
        self.stmt(StatementKind::Expression(expression))
    }

    pub fn ret(&self, value: Option<&'a Expression<'a>>) -> Statement<'a> {
        self.stmt(StatementKind::Return(value))
    }

    pub fn block(&self, statements: Vec<Statement<'a>>) -> Statement<'a> {
        self.stmt(StatementKind::Block(self.slice(statements)))
    }

    /// `import def, * as ns, { name as alias } from "module"`
    pub fn import(
        &self,
        module: &str,
        default: Option<&str>,
        namespace: Option<&str>,
        named: &[(&str, Option<&str>)],
    ) -> Statement<'a> {
        let named = self.slice(named.iter().map(|(name, alias)| ImportName {
            name: self.str(name),
            alias: self.opt_str(*alias),
        }));
        let decl = self.arena.alloc(ImportDecl {
            module: self.str(module),
            default: self.opt_str(default),
            namespace: self.opt_str(namespace),
            named,
        });
        self.stmt(StatementKind::Import(decl))
    }

    pub fn type_only(&self) -> Statement<'a> {
        self.stmt(StatementKind::TypeOnly)
    }

    pub fn empty(&self) -> Statement<'a> {
        self.stmt(StatementKind::Empty)
    }

    pub fn other(&self, kind: &str) -> Statement<'a> {
        self.stmt(StatementKind::Other(self.str(kind)))
    }

    // ========== Declarations ==========

    pub fn param(&self, name: &str) -> Param<'a> {
        Param { binding: Binding::Identifier(self.str(name)), rest: false, ty: None, line: self.line() }
    }

    pub fn typed_param(&self, name: &str, ty: &str) -> Param<'a> {
        Param { ty: Some(self.str(ty)), ..self.param(name) }
    }

    pub fn rest_param(&self, name: &str) -> Param<'a> {
        Param { rest: true, ..self.param(name) }
    }

    pub fn pattern_param(&self) -> Param<'a> {
        Param { binding: Binding::Pattern, rest: false, ty: None, line: self.line() }
    }

    /// A function declaration with a fresh `DeclId`. `body: None` is a signature only.
    pub fn function(
        &self,
        name: Option<&str>,
        params: Vec<Param<'a>>,
        body: Option<Vec<Statement<'a>>>,
    ) -> FunctionDecl<'a> {
        FunctionDecl {
            id: self.next_decl_id(),
            name: self.opt_str(name),
            params: self.slice(params),
            body: body.map(|statements| self.slice(statements)),
            is_async: false,
            line: self.line(),
        }
    }

    pub fn function_stmt(&self, decl: FunctionDecl<'a>) -> Statement<'a> {
        let line = decl.line;
        Statement { kind: StatementKind::Function(self.arena.alloc(decl)), line }
    }

    /// `function name(params) { body }`
    pub fn func(&self, name: &str, params: Vec<Param<'a>>, body: Vec<Statement<'a>>) -> Statement<'a> {
        let decl = self.function(Some(name), params, Some(body));
        self.function_stmt(decl)
    }

    pub fn class(&self, name: Option<&str>, extends: Option<&str>, members: Vec<ClassMember<'a>>) -> ClassDecl<'a> {
        ClassDecl {
            id: self.next_decl_id(),
            name: self.opt_str(name),
            extends: self.opt_str(extends),
            is_declared: false,
            is_abstract: false,
            members: self.slice(members),
            line: self.line(),
        }
    }

    pub fn class_stmt(&self, decl: ClassDecl<'a>) -> Statement<'a> {
        let line = decl.line;
        Statement { kind: StatementKind::Class(self.arena.alloc(decl)), line }
    }

    pub fn method_decl(&self, function: FunctionDecl<'a>, is_static: bool) -> ClassMember<'a> {
        ClassMember::Method(MethodDecl { function: self.arena.alloc(function), is_static })
    }

    pub fn method(&self, name: &str, params: Vec<Param<'a>>, body: Vec<Statement<'a>>) -> ClassMember<'a> {
        let function = self.function(Some(name), params, Some(body));
        self.method_decl(function, false)
    }

    pub fn static_method(&self, name: &str, params: Vec<Param<'a>>, body: Vec<Statement<'a>>) -> ClassMember<'a> {
        let function = self.function(Some(name), params, Some(body));
        self.method_decl(function, true)
    }

    pub fn constructor(&self, params: Vec<Param<'a>>, body: Vec<Statement<'a>>) -> ClassMember<'a> {
        let function = self.function(Some("constructor"), params, Some(body));
        ClassMember::Constructor(self.arena.alloc(function))
    }

    pub fn property(&self, name: &str, initializer: Option<&'a Expression<'a>>, is_static: bool) -> ClassMember<'a> {
        ClassMember::Property(PropertyDecl { name: self.str(name), initializer, is_static, line: self.line() })
    }

    pub fn other_member(&self, kind: &str) -> ClassMember<'a> {
        ClassMember::Other { kind: self.str(kind), line: self.line() }
    }

    // ========== Units ==========

    /// Finish a unit. `file_name` may be a path; only its base name is kept.
    pub fn unit(&self, file_name: &str, statements: Vec<Statement<'a>>) -> Unit<'a> {
        let path = Path::new(file_name);
        let base = path.file_name().and_then(|n| n.to_str()).unwrap_or(file_name);
        let context = path.file_stem().and_then(|n| n.to_str()).unwrap_or(base);
        Unit {
            file_name: self.str(base),
            context: self.str(context),
            statements: self.slice(statements),
            decl_count: self.decl_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_context_name() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let unit = b.unit("src/game/main.ts", vec![]);
        assert_eq!(unit.file_name, "main.ts");
        assert_eq!(unit.context, "main");
        assert!(unit.statements.is_empty());
    }

    #[test]
    fn test_decl_ids_are_sequential() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let add = b.function(Some("add"), vec![b.param("a")], Some(vec![]));
        let method = b.method("m", vec![], vec![]);
        let class = b.class(Some("C"), None, vec![method]);
        assert_eq!(add.id, DeclId(0));
        assert_eq!(class.id, DeclId(2));
        match &class.members[0] {
            ClassMember::Method(m) => assert_eq!(m.function.id, DeclId(1)),
            other => panic!("unexpected member: {:?}", other),
        }
        assert_eq!(b.decl_count(), 3);
    }

    #[test]
    fn test_line_stamping() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let first = b.at(3).expr_stmt(b.ident("x"));
        let second = b.at(7).ret(None);
        assert_eq!(first.line, 3);
        assert_eq!(second.line, 7);
    }
}
