use std::mem;

use rustc_hash::FxHashMap;

use crate::{
    ast::{
        ArrowBody, AssignOperator, BinaryOperator, Decl, DeclKind, Export, Expr, ExprKind,
        Function, Ident, Import, ImportSpecifier, Param, Program, Property, PropertyKey, Stmt,
        StmtKind, UnaryOperator,
    },
    config::{AnalyzerConfig, Pass},
    diagnostic::Severity,
    lints,
    modules::{self, FunctionSignature, SourceLoader},
    parser,
    symbols::{ScopeId, ScopeKind, Symbol, SymbolId, SymbolKind, SymbolTable},
    token::{Span, Spanned},
    types::Type,
};

/// The scope tree of a program along with every semantic problem found in it.
#[derive(Debug)]
pub struct Analysis {
    pub symbols: SymbolTable,
    pub errors: Vec<Spanned<Error>>,
}

/// Builds the scopes of `program`, infers the types of its bindings and runs
/// the checks enabled in `config`. Imports of script files are checked
/// against `loader`.
#[tracing::instrument(level = "debug", skip_all, fields(statements = program.body.len()))]
pub fn analyze(program: &Program, config: &AnalyzerConfig, loader: &dyn SourceLoader) -> Analysis {
    let end = program.body.last().map_or(0, |stmt| stmt.span.hi());
    let mut a = Analyzer {
        config,
        loader,
        table: SymbolTable::new(Span::new_of_bounds(0..end)),
        errors: Vec::new(),
        scope: SymbolTable::ROOT,
        env: Env::default(),
        returns: Vec::new(),
        loops: Loops::default(),
        depth: 0,
    };
    a.stmts(&program.body);

    let mut errors = a.errors;
    if config.enabled(Pass::UnusedVariables) {
        errors.extend(lints::unused(&a.table));
    }
    if config.enabled(Pass::Shadowing) {
        errors.extend(lints::shadowing(&a.table));
    }
    tracing::debug!(
        scopes = a.table.scopes().count(),
        references = a.table.references().len(),
        errors = errors.len(),
        "analyzed program"
    );
    Analysis {
        symbols: a.table,
        errors,
    }
}

/// The current type of each binding at some point of the program.
type Env = FxHashMap<SymbolId, Type>;

/// Depth of the enclosing constructs `break` and `continue` may leave, reset
/// at function boundaries.
#[derive(Clone, Copy, Default)]
struct Loops {
    breakable: usize,
    continuable: usize,
    /// Whether a `break` leaves the innermost breakable construct.
    broke: bool,
}

struct Analyzer<'a> {
    config: &'a AnalyzerConfig,
    loader: &'a dyn SourceLoader,
    table: SymbolTable,
    errors: Vec<Spanned<Error>>,
    scope: ScopeId,
    env: Env,
    /// Types returned so far by the innermost function.
    returns: Vec<Type>,
    loops: Loops,
    /// Nesting of the expression being visited.
    depth: usize,
}

// Statements. Each returns whether control can't fall through it.
impl Analyzer<'_> {
    fn stmts(&mut self, stmts: &[Stmt]) -> bool {
        self.hoist(stmts);
        let mut diverges = false;
        let mut reported = false;
        for stmt in stmts {
            if diverges && !reported && !matches!(stmt.kind, StmtKind::Function(_) | StmtKind::Empty)
            {
                self.report(stmt.span, Error::Unreachable);
                reported = true;
            }
            let reachable_returns = self.returns.len();
            diverges |= self.stmt(stmt);
            if reported {
                self.returns.truncate(reachable_returns);
            }
        }
        diverges
    }

    /// Declares the functions of a statement list before any of it runs.
    fn hoist(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            let function = match &stmt.kind {
                StmtKind::Function(function) => function,
                StmtKind::Export(Export::Decl(inner)) => match &inner.kind {
                    StmtKind::Function(function) => function,
                    _ => continue,
                },
                _ => continue,
            };
            self.hoist_function(function);
        }
    }

    fn hoist_function(&mut self, function: &Function) {
        if let Some(name) = &function.name {
            let ty = Type::function(param_names(&function.params), Type::Unknown);
            self.declare(name, SymbolKind::Function, ty);
        }
    }

    /// Runs `stmts` in a block scope of their own if they declare anything.
    fn block(&mut self, stmts: &[Stmt], span: Span) -> bool {
        let outer = self.scope;
        if stmts.iter().any(declares) {
            self.scope = self.table.push_scope(ScopeKind::Block, outer, span);
        }
        let diverges = self.stmts(stmts);
        self.scope = outer;
        diverges
    }

    fn stmt(&mut self, stmt: &Stmt) -> bool {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.expr(expr);
                self.is_exit_call(expr)
            }
            StmtKind::Decl(decl) => {
                self.decl(decl);
                false
            }
            StmtKind::Function(function) => {
                self.function_decl(function);
                false
            }
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                self.expr(test);
                let before = self.env.clone();
                let then_diverges = self.stmt(consequent);
                let then_env = mem::replace(&mut self.env, before);
                let else_diverges = alternate.as_ref().is_some_and(|alt| self.stmt(alt));
                self.merge_branch(then_env, then_diverges, else_diverges);
                then_diverges && else_diverges
            }
            StmtKind::While { test, body } => {
                self.expr(test);
                self.loop_body(body, None);
                false
            }
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                let outer = self.scope;
                if init.as_deref().is_some_and(declares) {
                    self.scope = self.table.push_scope(ScopeKind::Block, outer, stmt.span);
                }
                if let Some(init) = init {
                    self.stmt(init);
                }
                if let Some(test) = test {
                    self.expr(test);
                }
                self.loop_body(body, update.as_ref());
                self.scope = outer;
                false
            }
            StmtKind::ForIn {
                decl_kind,
                key,
                value,
                iterable,
                body,
            } => {
                let iterable_ty = self.expr(iterable);
                let (key_ty, value_ty) = for_in_types(&iterable_ty, key.is_some());
                let outer = self.scope;
                if let Some(decl_kind) = decl_kind {
                    self.scope = self.table.push_scope(ScopeKind::Block, outer, stmt.span);
                    let kind = symbol_kind(*decl_kind);
                    if let Some(key) = key {
                        self.declare(key, kind, key_ty);
                    }
                    self.declare(value, kind, value_ty);
                } else {
                    if let Some(key) = key {
                        self.assign(key, key_ty);
                    }
                    self.assign(value, value_ty);
                }
                self.loop_body(body, None);
                self.scope = outer;
                false
            }
            StmtKind::Switch {
                discriminant,
                cases,
            } => {
                self.expr(discriminant);
                let outer = self.scope;
                if cases.iter().any(|case| case.body.iter().any(declares)) {
                    self.scope = self.table.push_scope(ScopeKind::Block, outer, stmt.span);
                }
                let before = self.env.clone();
                let outer_loops = self.loops;
                self.loops.breakable += 1;
                self.loops.broke = false;
                let mut last_diverges = false;
                for case in cases {
                    if let Some(test) = &case.test {
                        self.expr(test);
                    }
                    last_diverges = self.stmts(&case.body);
                }
                let broke = self.loops.broke;
                self.loops = outer_loops;
                self.scope = outer;
                let after = mem::take(&mut self.env);
                self.env = join_envs(before, after);
                // Cases fall through into the next one, so only the last case
                // can leave the switch at its end.
                let has_default = cases.iter().any(|case| case.test.is_none());
                has_default && last_diverges && !broke
            }
            StmtKind::Try {
                block,
                param,
                handler,
            } => {
                let before = self.env.clone();
                let block_diverges = self.block(block, stmt.span);
                let block_env = self.env.clone();
                self.env = join_envs(before, mem::take(&mut self.env));

                let outer = self.scope;
                let handler_span = handler
                    .first()
                    .zip(handler.last())
                    .map(|(first, last)| first.span.to(last.span));
                let scope_span = match (param, handler_span) {
                    (Some(param), Some(span)) => Some(param.span.to(span)),
                    (Some(param), None) => Some(param.span),
                    (None, span) => span.filter(|_| handler.iter().any(declares)),
                };
                if let Some(span) = scope_span {
                    self.scope = self.table.push_scope(ScopeKind::Block, outer, span);
                }
                if let Some(param) = param {
                    self.declare(param, SymbolKind::Variable, Type::Object);
                }
                let handler_diverges = self.stmts(handler);
                self.scope = outer;

                self.merge_branch(block_env, block_diverges, handler_diverges);
                block_diverges && handler_diverges
            }
            StmtKind::Return(expr) => {
                let ty = expr.as_ref().map_or(Type::Null, |expr| self.expr(expr));
                self.returns.push(ty);
                true
            }
            StmtKind::Break => {
                if self.loops.breakable == 0 {
                    self.report(stmt.span, Error::BreakOutsideLoop);
                }
                self.loops.broke = true;
                true
            }
            StmtKind::Continue => {
                if self.loops.continuable == 0 {
                    self.report(stmt.span, Error::ContinueOutsideLoop);
                }
                true
            }
            StmtKind::Block(stmts) => self.block(stmts, stmt.span),
            StmtKind::Import(import) => {
                self.import(import);
                false
            }
            StmtKind::Export(export) => {
                self.export(export);
                false
            }
            StmtKind::Empty => false,
        }
    }

    /// Merges the environment of a taken branch (`then_env`) with the current
    /// one, which belongs to the other branch. Diverging branches don't reach
    /// the join point.
    fn merge_branch(&mut self, then_env: Env, then_diverges: bool, else_diverges: bool) {
        match (then_diverges, else_diverges) {
            (false, true) => self.env = then_env,
            (false, false) => {
                let else_env = mem::take(&mut self.env);
                self.env = join_envs(then_env, else_env);
            }
            (true, _) => {}
        }
    }

    fn loop_body(&mut self, body: &Stmt, update: Option<&Expr>) {
        let before = self.env.clone();
        let outer = self.loops;
        self.loops.breakable += 1;
        self.loops.continuable += 1;
        self.stmt(body);
        self.loops = outer;
        if let Some(update) = update {
            self.expr(update);
        }
        let after = mem::take(&mut self.env);
        self.env = join_envs(before, after);
    }

    fn decl(&mut self, decl: &Decl) {
        let kind = symbol_kind(decl.kind);
        for declarator in &decl.declarators {
            let ty = declarator
                .init
                .as_ref()
                .map_or(Type::Null, |init| self.expr(init));
            self.declare(&declarator.name, kind, ty);
        }
    }

    fn function_decl(&mut self, function: &Function) {
        // Declarations standing alone as the body of an `if` or a loop are
        // not part of any statement list, so they were never hoisted.
        let hoisted = function.name.as_ref().is_some_and(|name| {
            self.table
                .lookup(&name.name, self.scope)
                .is_some_and(|id| id.scope == self.scope)
        });
        if !hoisted {
            self.hoist_function(function);
        }
        let ty = self.function(&function.params, Body::Stmts(&function.body), function.span);
        let Some(name) = &function.name else {
            return;
        };
        if let Some(id) = self.table.lookup(&name.name, self.scope) {
            if self.table.symbol(id).kind == SymbolKind::Function {
                self.table.symbol_mut(id).ty = ty.clone();
            }
            self.env.insert(id, ty);
        }
    }

    fn import(&mut self, import: &Import) {
        let source = &*import.source.value;
        if let Some(path) = modules::module_path(source) {
            if !self.loader.exists(&path) {
                tracing::debug!(source, "imported file not found");
                self.report(import.source.span, Error::ModuleNotFound(source.into()));
                return;
            }
            for specifier in &import.specifiers {
                let imported = match specifier {
                    ImportSpecifier::Named { imported, .. } => Some(imported.name.clone()),
                    ImportSpecifier::Default(_) => Some("default".into()),
                    ImportSpecifier::Namespace(_) => None,
                };
                self.declare_import(specifier.local(), Type::Unknown, imported, source);
            }
            return;
        }

        let module = modules::lookup(source);
        if module.is_none() {
            tracing::trace!(source, "import of unknown module");
        }
        let namespace = module.map_or(Type::Unknown, |m| Type::Module(m.name));
        for specifier in &import.specifiers {
            let (ty, imported) = match specifier {
                ImportSpecifier::Namespace(_) => (namespace.clone(), None),
                ImportSpecifier::Default(_) => (namespace.clone(), Some("default".into())),
                ImportSpecifier::Named { imported, .. } => {
                    let ty = match module {
                        Some(module) if !module.is_valid_import(&imported.name) => {
                            let error = Error::NotExported {
                                name: imported.name.clone(),
                                module: module.name,
                            };
                            self.report(imported.span, error);
                            Type::Unknown
                        }
                        Some(module) => match module.function(&imported.name) {
                            Some(function) => signature_type(function),
                            None => module
                                .constant(&imported.name)
                                .map_or(Type::Unknown, |constant| {
                                    Type::from_signature(&[constant.ty])
                                }),
                        },
                        None => Type::Unknown,
                    };
                    (ty, Some(imported.name.clone()))
                }
            };
            self.declare_import(specifier.local(), ty, imported, source);
        }
    }

    fn declare_import(&mut self, local: &Ident, ty: Type, imported: Option<Box<str>>, source: &str) {
        if let Some(id) = self.declare(local, SymbolKind::Imported, ty) {
            let symbol = self.table.symbol_mut(id);
            symbol.import_specifier = imported;
            symbol.import_source = Some(source.into());
        }
    }

    fn export(&mut self, export: &Export) {
        match export {
            Export::Decl(stmt) => {
                self.stmt(stmt);
                let names: Vec<&Ident> = match &stmt.kind {
                    StmtKind::Decl(decl) => decl.declarators.iter().map(|d| &d.name).collect(),
                    StmtKind::Function(function) => function.name.iter().collect(),
                    _ => Vec::new(),
                };
                for name in names {
                    if let Some(id) = self.table.lookup(&name.name, self.scope) {
                        self.table.symbol_mut(id).reads += 1;
                    }
                }
            }
            Export::Default(expr) => {
                self.expr(expr);
            }
            Export::Named { specifiers, source } => match source {
                Some(source) => self.check_reexport(&source.value, source.span),
                None => {
                    for specifier in specifiers {
                        self.read(&specifier.local);
                    }
                }
            },
            Export::All { source, .. } => self.check_reexport(&source.value, source.span),
        }
    }

    fn check_reexport(&mut self, source: &str, span: Span) {
        if let Some(path) = modules::module_path(source) {
            if !self.loader.exists(&path) {
                self.report(span, Error::ModuleNotFound(source.into()));
            }
        }
    }

    /// Whether `expr` is a call to `die` or `exit`, which never return.
    fn is_exit_call(&self, expr: &Expr) -> bool {
        let ExprKind::Call { callee, .. } = &expr.kind else {
            return false;
        };
        let ExprKind::Id(ident) = &callee.kind else {
            return false;
        };
        matches!(&*ident.name, "die" | "exit") && self.table.lookup(&ident.name, self.scope).is_none()
    }
}

/// A function body, either statements or the expression of an arrow.
enum Body<'a> {
    Stmts(&'a [Stmt]),
    Expr(&'a Expr),
}

// Expressions. Each returns its inferred type.
impl Analyzer<'_> {
    /// Expressions nested deeper than the parser accepts are left untyped.
    fn expr(&mut self, expr: &Expr) -> Type {
        if self.depth >= parser::MAX_NESTING {
            return Type::Unknown;
        }
        self.depth += 1;
        let ty = self.infer(expr);
        self.depth -= 1;
        ty
    }

    fn infer(&mut self, expr: &Expr) -> Type {
        match &expr.kind {
            ExprKind::Id(ident) => self.read(ident),
            ExprKind::Int(_) => Type::Integer,
            ExprKind::Double(_) => Type::Double,
            ExprKind::String(_) => Type::String,
            ExprKind::Template(parts) => {
                for part in parts {
                    self.expr(part);
                }
                Type::String
            }
            ExprKind::Regexp { .. } => Type::Regexp,
            ExprKind::Bool(_) => Type::Boolean,
            ExprKind::Null => Type::Null,
            ExprKind::This => Type::Object,
            ExprKind::Array(elements) => {
                let mut elem_types = Vec::with_capacity(elements.len());
                for element in elements {
                    let ty = self.expr(element);
                    elem_types.push(match (&element.kind, ty) {
                        (ExprKind::Spread(_), Type::Array(elem)) => *elem,
                        (ExprKind::Spread(_), _) => Type::Unknown,
                        (_, ty) => ty,
                    });
                }
                Type::Array(Box::new(Type::union(elem_types)))
            }
            ExprKind::Object(properties) => {
                for property in properties {
                    match property {
                        Property::KeyValue { key, value } => {
                            if let PropertyKey::Computed(key) = key {
                                self.expr(key);
                            }
                            self.expr(value);
                        }
                        Property::Shorthand(ident) => {
                            self.read(ident);
                        }
                        Property::Spread(expr) => {
                            self.expr(expr);
                        }
                    }
                }
                Type::Object
            }
            ExprKind::Spread(inner) | ExprKind::Paren(inner) => self.expr(inner),
            ExprKind::Unary { op, expr } => {
                let ty = self.expr(expr);
                match op {
                    UnaryOperator::Neg | UnaryOperator::Plus => numeric(&ty),
                    UnaryOperator::Not | UnaryOperator::Delete => Type::Boolean,
                    UnaryOperator::BitNot => Type::Integer,
                }
            }
            ExprKind::Update { target, .. } => {
                let current = self.expr(target);
                let ty = numeric(&current);
                self.assign_target(target, ty.clone());
                ty
            }
            ExprKind::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs, expr.span),
            ExprKind::Assignment { op, target, value } => {
                let ty = match op {
                    AssignOperator::Assign => {
                        if !matches!(target.kind, ExprKind::Id(_)) {
                            self.expr(target);
                        }
                        self.expr(value)
                    }
                    AssignOperator::Compound(op) => self.binary(*op, target, value, expr.span),
                };
                self.assign_target(target, ty.clone());
                ty
            }
            ExprKind::Conditional {
                test,
                then_arm,
                else_arm,
            } => {
                self.expr(test);
                let before = self.env.clone();
                let then_ty = self.expr(then_arm);
                let then_env = mem::replace(&mut self.env, before);
                let else_ty = self.expr(else_arm);
                self.merge_branch(then_env, false, false);
                then_ty.join(else_ty)
            }
            ExprKind::Call { callee, args, .. } => self.call(callee, args, expr.span),
            ExprKind::Member {
                object, property, ..
            } => {
                let object_ty = self.expr(object);
                self.member(&object_ty, property)
            }
            ExprKind::Index { object, index, .. } => {
                let object_ty = self.expr(object);
                self.expr(index);
                match object_ty {
                    Type::Array(elem) => *elem,
                    Type::String => Type::String,
                    _ => Type::Unknown,
                }
            }
            ExprKind::Function(function) => {
                self.function(&function.params, Body::Stmts(&function.body), function.span)
            }
            ExprKind::Arrow { params, body } => {
                let body = match body {
                    ArrowBody::Expr(expr) => Body::Expr(expr),
                    ArrowBody::Block(stmts) => Body::Stmts(stmts),
                };
                self.function(params, body, expr.span)
            }
            ExprKind::Invalid => Type::Unknown,
        }
    }

    fn binary(&mut self, op: BinaryOperator, lhs: &Expr, rhs: &Expr, span: Span) -> Type {
        use BinaryOperator::*;

        let lhs_ty = self.expr(lhs);
        if matches!(op, And | Or | Nullish) {
            // The right operand may not run.
            let before = self.env.clone();
            let rhs_ty = self.expr(rhs);
            self.merge_branch(before, false, false);
            return match op {
                Nullish if lhs_ty == Type::Null => rhs_ty,
                Nullish => lhs_ty.without_null().join(rhs_ty),
                _ => lhs_ty.join(rhs_ty),
            };
        }

        let rhs_ty = self.expr(rhs);
        match op {
            Eq | Ne | StrictEq | StrictNe | Lt | Le | Gt | Ge | In => Type::Boolean,
            BitAnd | BitOr | BitXor | Shl | Shr => Type::Integer,
            Add | Sub | Mul | Div | Mod | Exp => {
                if let Some(compound) = [&lhs_ty, &rhs_ty].into_iter().find(|ty| ty.is_compound()) {
                    self.report(span, Error::ArithmeticOnCompound(compound.clone()));
                }
                arithmetic(op, &lhs_ty, &rhs_ty)
            }
            And | Or | Nullish => unreachable!("handled above"),
        }
    }

    fn call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> Type {
        let (callee_ty, signature) = self.callee(callee);
        for arg in args {
            self.expr(arg);
        }

        if !callee_ty.is_callable() {
            self.report(callee.span, Error::NotCallable(callee_ty.clone()));
        }
        let spread = args.iter().any(|arg| matches!(arg.kind, ExprKind::Spread(_)));
        if let Some(signature) = signature {
            if !spread && args.len() < signature.required {
                let error = Error::TooFewArguments {
                    name: signature.name,
                    expected: signature.required,
                    found: args.len(),
                };
                self.report(span, error);
            }
            return Type::from_signature(signature.returns);
        }
        callee_ty.ret().cloned().unwrap_or_default()
    }

    /// The type of a callee and, if it names a builtin, its signature.
    fn callee(&mut self, callee: &Expr) -> (Type, Option<&'static FunctionSignature>) {
        match &callee.kind {
            ExprKind::Id(ident) => {
                let ty = self.read(ident);
                let signature = match self.table.lookup(&ident.name, self.scope) {
                    None => modules::global(&ident.name),
                    Some(id) => {
                        let symbol = self.table.symbol(id);
                        match (&symbol.import_source, &symbol.import_specifier) {
                            (Some(source), Some(name)) => {
                                modules::lookup(source).and_then(|m| m.function(name))
                            }
                            _ => None,
                        }
                    }
                };
                (ty, signature)
            }
            ExprKind::Member {
                object, property, ..
            } => {
                let object_ty = self.expr(object);
                let ty = self.member(&object_ty, property);
                let signature = match object_ty {
                    Type::Module(name) => modules::lookup(name).and_then(|m| m.function(&property.name)),
                    _ => object_ty
                        .resources()
                        .find_map(|tag| modules::method(tag, &property.name)),
                };
                (ty, signature)
            }
            ExprKind::Paren(inner) => self.callee(inner),
            _ => (self.expr(callee), None),
        }
    }

    /// Resolves `object.property` against builtin modules and resources.
    fn member(&mut self, object: &Type, property: &Ident) -> Type {
        let name = &*property.name;
        if let Type::Module(module_name) = *object {
            let Some(module) = modules::lookup(module_name) else {
                return Type::Unknown;
            };
            if let Some(function) = module.function(name) {
                return signature_type(function);
            }
            if let Some(constant) = module.constant(name) {
                return Type::from_signature(&[constant.ty]);
            }
            let error = match module.object_type_with_method(name) {
                Some(object_type) => Error::InstanceMethodOnModule {
                    method: name.into(),
                    tag: object_type.tag,
                    module: module.name,
                },
                None => Error::UnknownModuleMember {
                    member: name.into(),
                    module: module.name,
                },
            };
            self.report(property.span, error);
            return Type::Unknown;
        }

        let tags: Vec<_> = object.resources().collect();
        let Some(&first) = tags.first() else {
            return Type::Unknown;
        };
        let methods: Vec<_> = tags
            .iter()
            .filter_map(|tag| modules::method(tag, name))
            .map(signature_type)
            .collect();
        if methods.is_empty() {
            let open = object.alternatives().contains(&Type::Object);
            if !open {
                let error = Error::UnknownMethod {
                    tag: first,
                    method: name.into(),
                };
                self.report(property.span, error);
            }
            return Type::Unknown;
        }
        Type::union(methods)
    }

    /// Analyzes a function in a scope of its own, returning its type.
    fn function(&mut self, params: &[Param], body: Body<'_>, span: Span) -> Type {
        let outer_scope = self.scope;
        let scope = self.table.push_scope(ScopeKind::Function, outer_scope, span);
        self.scope = scope;
        let outer_env = self.env.clone();
        let outer_returns = mem::take(&mut self.returns);
        let outer_loops = mem::take(&mut self.loops);

        for param in params {
            let ty = if param.rest {
                Type::Array(Box::default())
            } else {
                Type::Unknown
            };
            self.declare(&param.name, SymbolKind::Parameter, ty);
        }
        let ret = match body {
            Body::Stmts(stmts) => {
                let falls_through = !self.stmts(stmts);
                let mut returns = mem::take(&mut self.returns);
                if falls_through {
                    returns.push(Type::Null);
                }
                Type::union(returns)
            }
            Body::Expr(expr) => self.expr(expr),
        };

        // Bindings of enclosing scopes may have been assigned by the body, at
        // some point after which it's called.
        let inner_env = mem::replace(&mut self.env, outer_env);
        for (id, ty) in inner_env {
            if id.scope < scope && self.env.get(&id) != Some(&ty) {
                let assigned = self.table.symbol(id).ty.clone();
                self.env.insert(id, assigned);
            }
        }
        self.returns = outer_returns;
        self.loops = outer_loops;
        self.scope = outer_scope;
        Type::function(param_names(params), ret)
    }
}

// Bindings.
impl Analyzer<'_> {
    /// Declares `name` in the current scope, reporting redeclarations.
    fn declare(&mut self, name: &Ident, kind: SymbolKind, ty: Type) -> Option<SymbolId> {
        let symbol = Symbol::new(name.name.clone(), kind, ty.clone(), name.span);
        match self.table.declare(self.scope, symbol) {
            Ok(id) => {
                self.env.insert(id, ty);
                Some(id)
            }
            Err(_) => {
                self.report(name.span, Error::Redeclaration(name.name.clone()));
                None
            }
        }
    }

    fn read(&mut self, ident: &Ident) -> Type {
        if let Some(id) = self.table.lookup(&ident.name, self.scope) {
            self.table.add_reference(ident.span, id);
            let symbol = self.table.symbol_mut(id);
            symbol.reads += 1;
            return self.env.get(&id).unwrap_or(&symbol.ty).clone();
        }
        if let Some(function) = modules::global(&ident.name) {
            return signature_type(function);
        }
        if let Some(constant) = modules::global_constant(&ident.name) {
            return Type::from_signature(&[constant.ty]);
        }
        self.report(ident.span, Error::UndefinedVariable(ident.name.clone()));
        Type::Unknown
    }

    /// Records `ty` as the new type of `name`. Names no scope declares are
    /// bound in the enclosing function scope.
    fn assign(&mut self, name: &Ident, ty: Type) {
        let id = match self.table.lookup(&name.name, self.scope) {
            Some(id) => {
                self.table.add_reference(name.span, id);
                let symbol = self.table.symbol_mut(id);
                if symbol.kind == SymbolKind::Constant {
                    self.report(name.span, Error::AssignToConstant(name.name.clone()));
                    return;
                }
                symbol.ty = mem::take(&mut symbol.ty).join(ty.clone());
                id
            }
            None => {
                let scope = self.table.function_scope(self.scope);
                let mut symbol = Symbol::new(name.name.clone(), SymbolKind::Variable, ty.clone(), name.span);
                symbol.implicit = true;
                let (Ok(id) | Err(id)) = self.table.declare(scope, symbol);
                id
            }
        };
        self.env.insert(id, ty);
    }

    fn assign_target(&mut self, target: &Expr, ty: Type) {
        match &target.kind {
            ExprKind::Id(ident) => self.assign(ident, ty),
            ExprKind::Paren(inner) => self.assign_target(inner, ty),
            // Members and indexes are visited as operands.
            _ => {}
        }
    }

    fn report(&mut self, span: Span, error: Error) {
        if self.config.enabled(error.pass()) {
            self.errors.push(span.wrap(error));
        }
    }
}

fn declares(stmt: &Stmt) -> bool {
    matches!(
        stmt.kind,
        StmtKind::Decl(_)
            | StmtKind::Function(_)
            | StmtKind::Import(_)
            | StmtKind::Export(Export::Decl(_))
    )
}

fn symbol_kind(kind: DeclKind) -> SymbolKind {
    match kind {
        DeclKind::Let => SymbolKind::Variable,
        DeclKind::Const => SymbolKind::Constant,
    }
}

fn param_names(params: &[Param]) -> Vec<Box<str>> {
    params
        .iter()
        .map(|param| {
            if param.rest {
                format!("...{}", param.name).into()
            } else {
                param.name.name.clone()
            }
        })
        .collect()
}

fn signature_type(signature: &FunctionSignature) -> Type {
    let params = signature.params.iter().map(|&p| p.into()).collect();
    Type::function(params, Type::from_signature(signature.returns))
}

/// The types of the key and value bindings of a for-in loop over a value of
/// type `iterable`. With a single binding, the value is the element of an
/// array or the key of an object.
fn for_in_types(iterable: &Type, pair: bool) -> (Type, Type) {
    match (iterable, pair) {
        (Type::Array(elem), false) => (Type::Unknown, (**elem).clone()),
        (Type::Array(elem), true) => (Type::Integer, (**elem).clone()),
        (Type::Object, false) => (Type::Unknown, Type::String),
        (Type::Object, true) => (Type::String, Type::Unknown),
        _ => (Type::Unknown, Type::Unknown),
    }
}

/// The result of `+x`, `-x` or `x++`.
fn numeric(ty: &Type) -> Type {
    if ty.is_unknown() || ty.is_numeric() {
        ty.clone()
    } else {
        Type::union([Type::Integer, Type::Double])
    }
}

fn arithmetic(op: BinaryOperator, lhs: &Type, rhs: &Type) -> Type {
    if op == BinaryOperator::Add && (*lhs == Type::String || *rhs == Type::String) {
        return Type::String;
    }
    match (lhs, rhs) {
        (Type::Unknown, _) | (_, Type::Unknown) => Type::Unknown,
        (Type::Integer, Type::Integer) => Type::Integer,
        (Type::Double, Type::Double) => Type::Double,
        _ => Type::union([Type::Integer, Type::Double]),
    }
}

/// Joins the environments of two paths reaching the same point. A binding
/// only one path knows keeps its type.
fn join_envs(mut a: Env, b: Env) -> Env {
    for (id, ty) in b {
        let joined = match a.remove(&id) {
            Some(other) => other.join(ty),
            None => ty,
        };
        a.insert(id, joined);
    }
    a
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("`{0}` is already declared in this scope")]
    Redeclaration(Box<str>),
    #[error("`{0}` is not defined")]
    UndefinedVariable(Box<str>),
    #[error("cannot assign to constant `{0}`")]
    AssignToConstant(Box<str>),
    #[error("`{name}` is not exported by the `{module}` module")]
    NotExported {
        name: Box<str>,
        module: &'static str,
    },
    #[error("cannot find module `{0}`")]
    ModuleNotFound(Box<str>),
    #[error("`{tag}` has no method `{method}`")]
    UnknownMethod {
        tag: &'static str,
        method: Box<str>,
    },
    #[error("`{method}` is a method of `{tag}` values, not a function of module `{module}`")]
    InstanceMethodOnModule {
        method: Box<str>,
        tag: &'static str,
        module: &'static str,
    },
    #[error("module `{module}` has no member `{member}`")]
    UnknownModuleMember {
        member: Box<str>,
        module: &'static str,
    },
    #[error("value of type `{0}` is not callable")]
    NotCallable(Type),
    #[error("`{name}` expects at least {expected} argument{}, but got {found}", plural(.expected))]
    TooFewArguments {
        name: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("arithmetic on a value of type `{0}`")]
    ArithmeticOnCompound(Type),
    #[error("`break` outside of a loop or switch")]
    BreakOutsideLoop,
    #[error("`continue` outside of a loop")]
    ContinueOutsideLoop,
    #[error("unreachable code")]
    Unreachable,
    #[error("`{0}` is declared but never used")]
    Unused(Box<str>),
    #[error("`{0}` shadows a declaration in an outer scope")]
    Shadowing(Box<str>),
}

fn plural(n: &usize) -> &'static str {
    if *n == 1 {
        ""
    } else {
        "s"
    }
}

impl Error {
    pub fn severity(&self) -> Severity {
        match self {
            Error::UndefinedVariable(_)
            | Error::ArithmeticOnCompound(_)
            | Error::Unused(_)
            | Error::Shadowing(_) => Severity::Warning,
            Error::Unreachable => Severity::Hint,
            _ => Severity::Error,
        }
    }

    /// The pass which reports this error.
    pub fn pass(&self) -> Pass {
        match self {
            Error::Redeclaration(_)
            | Error::UndefinedVariable(_)
            | Error::AssignToConstant(_)
            | Error::NotExported { .. }
            | Error::ModuleNotFound(_) => Pass::ScopeAnalysis,
            Error::UnknownMethod { .. }
            | Error::InstanceMethodOnModule { .. }
            | Error::UnknownModuleMember { .. }
            | Error::NotCallable(_)
            | Error::TooFewArguments { .. }
            | Error::ArithmeticOnCompound(_) => Pass::TypeChecking,
            Error::BreakOutsideLoop | Error::ContinueOutsideLoop | Error::Unreachable => {
                Pass::ControlFlow
            }
            Error::Unused(_) => Pass::UnusedVariables,
            Error::Shadowing(_) => Pass::Shadowing,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{lexer::LexOptions, modules::DiskLoader, util::test_utils::tree_tests};

    tree_tests!(
        use analyzer;

        fn test_const_assignment_spans() {
            let program = "const c = 1;\nc = 2;";
            let expected_errors = &[
                "13..14: cannot assign to constant `c`",
                "6..7: `c` is declared but never used",
            ];
        }

        fn test_redeclaration_spans() {
            let program = "let a = 1;\nlet a = 2;\nprint(a);";
            let expected_errors = &["15..16: `a` is already declared in this scope"];
        }
    );

    fn run(src: &str, config: AnalyzerConfig, loader: &dyn SourceLoader) -> Analysis {
        let parsed = parser::parse_program(src, LexOptions::default());
        assert_eq!(parsed.errors, [], "syntax errors in test input");
        analyze(&parsed.program, &config, loader)
    }

    fn no_files(_: &Path) -> bool {
        false
    }

    /// The messages of every error, in order.
    fn messages(src: &str) -> Vec<String> {
        let analysis = run(src, AnalyzerConfig::default(), &no_files);
        analysis.errors.iter().map(|e| e.inner.to_string()).collect()
    }

    fn type_of(analysis: &Analysis, name: &str) -> String {
        let (_, symbol) = analysis
            .symbols
            .symbols()
            .find(|(_, symbol)| &*symbol.name == name)
            .unwrap_or_else(|| panic!("no symbol `{name}`"));
        symbol.ty.to_string()
    }

    #[test]
    fn test_return_type_unions() {
        let analysis = run(
            indoc! {r#"
                function f(a) { if (a) return 1; else return 2.5; }
                function g(a) { if (a) return "x"; }
                function h() {}
            "#},
            AnalyzerConfig::default(),
            &no_files,
        );
        assert_eq!(analysis.errors, []);
        assert_eq!(type_of(&analysis, "f"), "function(a): integer | double");
        assert_eq!(type_of(&analysis, "g"), "function(a): string | null");
        assert_eq!(type_of(&analysis, "h"), "function(): null");
    }

    #[test]
    fn test_unreachable_returns_are_ignored() {
        let analysis = run(
            indoc! {r#"
                function f() { return 1; return "s"; }
                function g(a) { if (a) { return 1; print(a); return "s"; } return 2; }
            "#},
            AnalyzerConfig::default(),
            &no_files,
        );
        assert_eq!(type_of(&analysis, "f"), "function(): integer");
        assert_eq!(type_of(&analysis, "g"), "function(a): integer");
        let hints: Vec<_> = analysis.errors.iter().map(|e| e.inner.severity()).collect();
        assert_eq!(hints, [Severity::Hint, Severity::Hint]);
    }

    #[test]
    fn test_switch_divergence() {
        let analysis = run(
            indoc! {r#"
                function f(x) { switch (x) { case 1: return 1; default: return 2; } }
                function g(x) { switch (x) { case 1: return 1; case 2: return 2; } }
                function h(x) { switch (x) { case 1: break; default: return 2; } }
                function k(x) { switch (x) { case 1: default: return "s"; } }
                function m(x) {
                    switch (x) {
                        default:
                            while (x) { break; }
                            return 1;
                    }
                }
            "#},
            AnalyzerConfig::default(),
            &no_files,
        );
        assert_eq!(analysis.errors, []);
        assert_eq!(type_of(&analysis, "f"), "function(x): integer");
        assert_eq!(type_of(&analysis, "g"), "function(x): integer | null");
        assert_eq!(type_of(&analysis, "h"), "function(x): integer | null");
        assert_eq!(type_of(&analysis, "k"), "function(x): string");
        assert_eq!(type_of(&analysis, "m"), "function(x): integer");
    }

    #[test]
    fn test_catch_without_param_has_its_own_scope() {
        let src = indoc! {r#"
            try { print(1); } catch { let x = 1; print(x); }
            let x = 2;
            print(x);
        "#};
        assert_eq!(messages(src), ["`x` shadows a declaration in an outer scope"]);
        let analysis = run(src, AnalyzerConfig::default().with_shadowing(false), &no_files);
        assert_eq!(analysis.errors, []);

        let handler_scope = analysis.symbols.scope_at(src.find("let x = 1").unwrap());
        assert_ne!(handler_scope, SymbolTable::ROOT);
        assert_eq!(analysis.symbols.scope(handler_scope).kind, ScopeKind::Block);
        assert_eq!(messages("try { print(1); } catch { print(2); }"), Vec::<String>::new());
    }

    #[test]
    fn test_function_declared_as_statement_body() {
        let analysis = run(
            indoc! {r#"
                let c = true;
                if (c) function g() { return 1; }
                g();
                while (c) function w() { return g(); }
            "#},
            AnalyzerConfig::default(),
            &no_files,
        );
        assert_eq!(analysis.errors, []);
        assert_eq!(type_of(&analysis, "g"), "function(): integer");
        assert_eq!(type_of(&analysis, "w"), "function(): integer");
    }

    #[test]
    fn test_deeply_nested_expression() {
        let mut expr = Expr {
            kind: ExprKind::Int(1),
            span: Span::new_of_bounds(0..1),
        };
        for _ in 0..2000 {
            expr = Expr {
                kind: ExprKind::Paren(Box::new(expr)),
                span: Span::new_of_bounds(0..1),
            };
        }
        let program = Program {
            body: vec![Stmt {
                kind: StmtKind::Expr(expr),
                span: Span::new_of_bounds(0..1),
            }],
        };
        let analysis = analyze(&program, &AnalyzerConfig::default(), &no_files);
        assert_eq!(analysis.errors, []);
    }

    #[test]
    fn test_branch_types_are_joined() {
        let analysis = run(
            indoc! {r#"
                let c = true;
                let x = 1;
                if (c) x = "s";
                let y = c ? 1 : null;
                let z = x;
                let i = 0;
                while (i < 10) i = i + 0.5;
                print(y, z, i);
            "#},
            AnalyzerConfig::default(),
            &no_files,
        );
        assert_eq!(analysis.errors, []);
        assert_eq!(type_of(&analysis, "x"), "integer | string");
        assert_eq!(type_of(&analysis, "y"), "integer | null");
        // The branch that assigned comes first.
        assert_eq!(type_of(&analysis, "z"), "string | integer");
        assert_eq!(type_of(&analysis, "i"), "integer | double");
    }

    #[test]
    fn test_diverging_branch_is_not_joined() {
        let analysis = run(
            indoc! {r#"
                function f(c) {
                    let x = null;
                    if (c) {
                        x = 1;
                    } else {
                        return;
                    }
                    let y = x;
                    return y;
                }
            "#},
            AnalyzerConfig::default(),
            &no_files,
        );
        assert_eq!(analysis.errors, []);
        assert_eq!(type_of(&analysis, "y"), "integer");
        assert_eq!(type_of(&analysis, "f"), "function(c): null | integer");
    }

    #[test]
    fn test_literal_and_operator_types() {
        let analysis = run(
            indoc! {r#"
                let a = [1, 2, ...[3.5]];
                let s = "n = " + 1;
                let b = 1 < 2;
                let m = 7 & 3;
                let d = null ?? "default";
                let r = /x+/g;
                let e = a[0];
                print(a, s, b, m, d, r, e);
            "#},
            AnalyzerConfig::default(),
            &no_files,
        );
        assert_eq!(analysis.errors, []);
        assert_eq!(type_of(&analysis, "a"), "array<integer | double>");
        assert_eq!(type_of(&analysis, "s"), "string");
        assert_eq!(type_of(&analysis, "b"), "boolean");
        assert_eq!(type_of(&analysis, "m"), "integer");
        assert_eq!(type_of(&analysis, "d"), "string");
        assert_eq!(type_of(&analysis, "r"), "regexp");
        assert_eq!(type_of(&analysis, "e"), "integer | double");
    }

    #[test]
    fn test_import_validation() {
        assert_eq!(
            messages("import { invalidFunction } from 'math';"),
            ["`invalidFunction` is not exported by the `math` module"]
        );
        assert_eq!(messages("import { abs, sin } from 'math';"), Vec::<String>::new());
        assert_eq!(messages("import * as luci from 'luci.http';"), Vec::<String>::new());
    }

    #[test]
    fn test_import_error_span() {
        let analysis = run(
            "import { abs, nope } from 'math';",
            AnalyzerConfig::default(),
            &no_files,
        );
        let errors: Vec<_> = analysis.errors.iter().map(|e| format!("{e:#}")).collect();
        assert_eq!(errors, ["14..18: `nope` is not exported by the `math` module"]);
    }

    #[test]
    fn test_imported_types() {
        let analysis = run(
            "import { open, stdout } from 'fs'; import * as math from 'math';",
            AnalyzerConfig::default(),
            &no_files,
        );
        assert_eq!(
            type_of(&analysis, "open"),
            "function(path, mode, perm): fs.file | null"
        );
        assert_eq!(type_of(&analysis, "stdout"), "fs.file");
        assert_eq!(type_of(&analysis, "math"), "module(math)");

        let (_, open) = analysis.symbols.symbols().next().unwrap();
        assert_eq!(open.kind, SymbolKind::Imported);
        assert_eq!(open.import_specifier.as_deref(), Some("open"));
        assert_eq!(open.import_source.as_deref(), Some("fs"));
    }

    #[test]
    fn test_file_imports() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("helper.uc"), "export const x = 1;").unwrap();
        let analysis = run(
            indoc! {r#"
                import { x } from './helper';
                import { y } from './missing.uc';
                print(x, y);
            "#},
            AnalyzerConfig::default(),
            &DiskLoader::new(dir.path()),
        );
        let errors: Vec<_> = analysis.errors.iter().map(|e| e.inner.to_string()).collect();
        assert_eq!(
            errors,
            ["cannot find module `./missing.uc`", "`y` is not defined"]
        );
        let names: Vec<_> = analysis.symbols.symbols().map(|(_, s)| &*s.name).collect();
        assert_eq!(names, ["x"]);
    }

    #[test]
    fn test_module_members() {
        let src = indoc! {r#"
            import * as fs from 'fs';
            let f = fs.open("/etc/passwd", "r");
            let line = f.read(64);
            print(line);
            fs.read();
            fs.nothing;
        "#};
        assert_eq!(
            messages(src),
            [
                "`read` is a method of `fs.file` values, not a function of module `fs`",
                "module `fs` has no member `nothing`",
            ]
        );
    }

    #[test]
    fn test_resource_methods() {
        let src = indoc! {r#"
            import { open } from 'fs';
            let f = open("x");
            f.foo();
            f.close();
        "#};
        assert_eq!(messages(src), ["`fs.file` has no method `foo`"]);

        let analysis = run(
            "import { cursor } from 'uci'; let c = cursor(); let v = c.get('network', 'lan');",
            AnalyzerConfig::default().with_unused_variables(false),
            &no_files,
        );
        assert_eq!(analysis.errors, []);
        assert_eq!(type_of(&analysis, "c"), "uci.cursor | null");
    }

    #[test]
    fn test_calls() {
        assert_eq!(
            messages("length(); let n = 1; n();"),
            [
                "`length` expects at least 1 argument, but got 0",
                "value of type `integer` is not callable",
            ]
        );
        assert_eq!(messages("let args = [1]; sprintf(...args);"), Vec::<String>::new());
    }

    #[test]
    fn test_arithmetic_on_compound() {
        let analysis = run(
            "let a = [1]; print(a * 2);",
            AnalyzerConfig::default(),
            &no_files,
        );
        let [error] = &analysis.errors[..] else {
            panic!("expected a single error, got {:?}", analysis.errors);
        };
        assert_eq!(error.inner.to_string(), "arithmetic on a value of type `array<integer>`");
        assert_eq!(error.inner.severity(), Severity::Warning);
    }

    #[test]
    fn test_scope_errors() {
        assert_eq!(
            messages("let a = 1; let a = 2; print(a);"),
            ["`a` is already declared in this scope"]
        );
        assert_eq!(
            messages("const c = 1; c = 2; print(c);"),
            ["cannot assign to constant `c`"]
        );
        assert_eq!(messages("print(nope);"), ["`nope` is not defined"]);
        assert_eq!(
            messages("function f(a, a) { return a; } f();"),
            ["`a` is already declared in this scope"]
        );
    }

    #[test]
    fn test_hoisting_and_implicit_globals() {
        let src = indoc! {r#"
            print(f());
            function f() { return 1; }
            function g() { counter = 1; return counter; }
            g();
        "#};
        let analysis = run(src, AnalyzerConfig::default(), &no_files);
        assert_eq!(analysis.errors, []);

        let counter = analysis
            .symbols
            .symbols()
            .find(|(_, symbol)| &*symbol.name == "counter")
            .map(|(id, symbol)| (id.scope, symbol.implicit));
        let g_scope = analysis.symbols.scope_at(src.find("counter").unwrap());
        assert_eq!(counter, Some((g_scope, true)));
        assert_eq!(analysis.symbols.scope(g_scope).kind, ScopeKind::Function);
    }

    #[test]
    fn test_control_flow() {
        assert_eq!(
            messages("while (true) { break; } break;"),
            ["`break` outside of a loop or switch"]
        );
        assert_eq!(
            messages("for (let i = 0; i < 3; i++) { function f() { continue; } f(); }"),
            ["`continue` outside of a loop"]
        );
        assert_eq!(
            messages("switch (1) { case 1: break; default: break; }"),
            Vec::<String>::new()
        );

        let analysis = run(
            indoc! {r#"
                function f() {
                    return 1;
                    print("never");
                    print("again");
                }
                f();
                die("bye");
                f();
            "#},
            AnalyzerConfig::default(),
            &no_files,
        );
        let errors: Vec<_> = analysis
            .errors
            .iter()
            .map(|e| (e.inner.severity(), e.inner.to_string()))
            .collect();
        assert_eq!(
            errors,
            [
                (Severity::Hint, "unreachable code".to_owned()),
                (Severity::Hint, "unreachable code".to_owned()),
            ]
        );
    }

    #[test]
    fn test_lints() {
        assert_eq!(
            messages("let a = 1; let b = 2; print(b);"),
            ["`a` is declared but never used"]
        );
        assert_eq!(
            messages("let x = 1; function f() { let x = 2; return x; } print(x, f());"),
            ["`x` shadows a declaration in an outer scope"]
        );
        assert_eq!(
            messages("export const answer = 42; export function twice(n) { return n * 2; };"),
            Vec::<String>::new()
        );
        assert_eq!(
            messages("for (let item in [1, 2]) {} try { die(); } catch (e) {}"),
            [
                "`item` is declared but never used",
                "`e` is declared but never used",
            ]
        );
    }

    #[test]
    fn test_config_gates_diagnostics() {
        let src = "let x = 1; function f() { let x = 2; } break; fs.read();";
        let analysis = run(src, AnalyzerConfig::none(), &no_files);
        assert_eq!(analysis.errors, []);
        // Scopes and types are still built.
        assert_eq!(type_of(&analysis, "f"), "function(): null");

        let config = AnalyzerConfig::none().with_shadowing(true);
        let analysis = run(src, config, &no_files);
        let errors: Vec<_> = analysis.errors.iter().map(|e| e.inner.to_string()).collect();
        assert_eq!(errors, ["`x` shadows a declaration in an outer scope"]);
    }

    #[test]
    fn test_for_in_bindings() {
        let analysis = run(
            indoc! {r#"
                let total = 0;
                for (let n in [1, 2]) total += n;
                for (let k, v in { a: 1 }) print(k, v);
            "#},
            AnalyzerConfig::default(),
            &no_files,
        );
        assert_eq!(analysis.errors, []);
        assert_eq!(type_of(&analysis, "n"), "integer");
        assert_eq!(type_of(&analysis, "k"), "string");
        assert_eq!(type_of(&analysis, "total"), "integer");
    }

    #[test]
    fn test_references() {
        let src = "let value = 1;\nprint(value);";
        let analysis = run(src, AnalyzerConfig::default(), &no_files);
        let definition = analysis.symbols.definition_at(23).map(|s| s.span);
        assert_eq!(definition, Some(Span::new_of_bounds(4..9)));

        let src = "function f(a) { let b = a; return b; }";
        let analysis = run(src, AnalyzerConfig::default(), &no_files);
        let scope = analysis.symbols.scope_at(src.find("return").unwrap());
        let names: Vec<_> = analysis
            .symbols
            .visible_symbols(scope)
            .iter()
            .map(|s| &*s.name)
            .collect();
        assert_eq!(names, ["a", "b", "f"]);
    }
}
