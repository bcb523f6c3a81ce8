use std::io::Write;

use crate::ast::*;

const INDENT_WIDTH: usize = 2;

pub fn print_program_string(program: &Program) -> String {
    let mut buf = Vec::with_capacity(1024);
    // Writing to a `Vec` can't fail.
    _ = print_program(&mut buf, program);
    String::from_utf8_lossy(&buf).into_owned()
}

pub fn print_expr_string(expr: &Expr) -> String {
    let mut buf = Vec::with_capacity(512);
    _ = print_expr(&mut buf, 0, expr);
    String::from_utf8_lossy(&buf).into_owned()
}

pub fn print_program(w: &mut impl Write, program: &Program) -> std::io::Result<()> {
    for stmt in &program.body {
        print_stmt(w, 0, stmt)?;
    }
    Ok(())
}

fn print_stmts(w: &mut impl Write, i: usize, stmts: &[Stmt]) -> std::io::Result<()> {
    for stmt in stmts {
        print_stmt(w, i, stmt)?;
    }
    Ok(())
}

pub fn print_stmt(w: &mut impl Write, i: usize, stmt: &Stmt) -> std::io::Result<()> {
    sp(w, i)?;
    let span = stmt.span;
    match &stmt.kind {
        StmtKind::Expr(expr) => {
            writeln!(w, "expr ({span})")?;
            print_expr(w, i + 1, expr)?;
        }
        StmtKind::Decl(decl) => {
            writeln!(w, "{} ({span})", decl_keyword(decl.kind))?;
            for Declarator { name, init } in &decl.declarators {
                sp(w, i + 1)?;
                writeln!(w, "binding {name}")?;
                if let Some(init) = init {
                    print_expr(w, i + 2, init)?;
                }
            }
        }
        StmtKind::Function(function) => print_function(w, i, "function", function)?,
        StmtKind::If {
            test,
            consequent,
            alternate,
        } => {
            writeln!(w, "if ({span})")?;
            print_expr(w, i + 1, test)?;
            print_stmt(w, i + 1, consequent)?;
            if let Some(alternate) = alternate {
                sp(w, i + 1)?;
                writeln!(w, "else")?;
                print_stmt(w, i + 2, alternate)?;
            }
        }
        StmtKind::While { test, body } => {
            writeln!(w, "while ({span})")?;
            print_expr(w, i + 1, test)?;
            print_stmt(w, i + 1, body)?;
        }
        StmtKind::For {
            init,
            test,
            update,
            body,
        } => {
            writeln!(w, "for ({span})")?;
            if let Some(init) = init {
                print_stmt(w, i + 1, init)?;
            }
            if let Some(test) = test {
                print_expr(w, i + 1, test)?;
            }
            if let Some(update) = update {
                print_expr(w, i + 1, update)?;
            }
            print_stmt(w, i + 1, body)?;
        }
        StmtKind::ForIn {
            decl_kind,
            key,
            value,
            iterable,
            body,
        } => {
            write!(w, "for-in ")?;
            if let Some(kind) = decl_kind {
                write!(w, "{} ", decl_keyword(*kind))?;
            }
            if let Some(key) = key {
                write!(w, "{key}, ")?;
            }
            writeln!(w, "{value} ({span})")?;
            print_expr(w, i + 1, iterable)?;
            print_stmt(w, i + 1, body)?;
        }
        StmtKind::Switch {
            discriminant,
            cases,
        } => {
            writeln!(w, "switch ({span})")?;
            print_expr(w, i + 1, discriminant)?;
            for case in cases {
                sp(w, i + 1)?;
                match &case.test {
                    Some(test) => {
                        writeln!(w, "case ({})", case.span)?;
                        print_expr(w, i + 2, test)?;
                    }
                    None => writeln!(w, "default ({})", case.span)?,
                }
                print_stmts(w, i + 2, &case.body)?;
            }
        }
        StmtKind::Try {
            block,
            param,
            handler,
        } => {
            writeln!(w, "try ({span})")?;
            sp(w, i + 1)?;
            writeln!(w, "block")?;
            print_stmts(w, i + 2, block)?;
            sp(w, i + 1)?;
            match param {
                Some(param) => writeln!(w, "catch {param}")?,
                None => writeln!(w, "catch")?,
            }
            print_stmts(w, i + 2, handler)?;
        }
        StmtKind::Return(value) => {
            writeln!(w, "return ({span})")?;
            if let Some(value) = value {
                print_expr(w, i + 1, value)?;
            }
        }
        StmtKind::Break => writeln!(w, "break ({span})")?,
        StmtKind::Continue => writeln!(w, "continue ({span})")?,
        StmtKind::Block(body) => {
            writeln!(w, "block ({span})")?;
            print_stmts(w, i + 1, body)?;
        }
        StmtKind::Import(import) => {
            writeln!(w, "import from {:?} ({span})", import.source.value)?;
            for specifier in &import.specifiers {
                sp(w, i + 1)?;
                match specifier {
                    ImportSpecifier::Named {
                        imported,
                        local: Some(local),
                    } => writeln!(w, "named {imported} as {local}")?,
                    ImportSpecifier::Named {
                        imported,
                        local: None,
                    } => writeln!(w, "named {imported}")?,
                    ImportSpecifier::Default(local) => writeln!(w, "default {local}")?,
                    ImportSpecifier::Namespace(local) => writeln!(w, "namespace {local}")?,
                }
            }
        }
        StmtKind::Export(export) => {
            writeln!(w, "export ({span})")?;
            print_export(w, i + 1, export)?;
        }
        StmtKind::Empty => writeln!(w, "empty ({span})")?,
    }
    Ok(())
}

fn print_export(w: &mut impl Write, i: usize, export: &Export) -> std::io::Result<()> {
    match export {
        Export::Decl(stmt) => print_stmt(w, i, stmt)?,
        Export::Default(expr) => {
            sp(w, i)?;
            writeln!(w, "default")?;
            print_expr(w, i + 1, expr)?;
        }
        Export::Named { specifiers, source } => {
            for ExportSpecifier { local, exported } in specifiers {
                sp(w, i)?;
                match exported {
                    Some(exported) => writeln!(w, "named {local} as {exported}")?,
                    None => writeln!(w, "named {local}")?,
                }
            }
            if let Some(source) = source {
                sp(w, i)?;
                writeln!(w, "from {:?}", source.value)?;
            }
        }
        Export::All { alias, source } => {
            sp(w, i)?;
            write!(w, "all ")?;
            if let Some(alias) = alias {
                write!(w, "as {alias} ")?;
            }
            writeln!(w, "from {:?}", source.value)?;
        }
    }
    Ok(())
}

fn print_function(
    w: &mut impl Write,
    i: usize,
    label: &str,
    function: &Function,
) -> std::io::Result<()> {
    write!(w, "{label}")?;
    if let Some(name) = &function.name {
        write!(w, " {name}")?;
    }
    print_params(w, &function.params)?;
    writeln!(w, " ({})", function.span)?;
    print_stmts(w, i + 1, &function.body)
}

fn print_params(w: &mut impl Write, params: &[Param]) -> std::io::Result<()> {
    write!(w, "(")?;
    for (idx, param) in params.iter().enumerate() {
        if idx > 0 {
            write!(w, ", ")?;
        }
        if param.rest {
            write!(w, "...")?;
        }
        write!(w, "{}", param.name)?;
    }
    write!(w, ")")
}

pub fn print_expr(w: &mut impl Write, i: usize, expr: &Expr) -> std::io::Result<()> {
    sp(w, i)?;
    let span = expr.span;
    match &expr.kind {
        ExprKind::Id(ident) => writeln!(w, "ident {ident} ({span})")?,
        ExprKind::Int(int) => writeln!(w, "int {int} ({span})")?,
        ExprKind::Double(double) => writeln!(w, "double {double} ({span})")?,
        ExprKind::String(string) => writeln!(w, "string {string:?} ({span})")?,
        ExprKind::Template(exprs) => {
            writeln!(w, "template ({span})")?;
            for expr in exprs {
                print_expr(w, i + 1, expr)?;
            }
        }
        ExprKind::Regexp { pattern, flags } => {
            writeln!(w, "regexp /{pattern}/{flags} ({span})")?;
        }
        ExprKind::Bool(bool) => writeln!(w, "bool {bool} ({span})")?,
        ExprKind::Null => writeln!(w, "null ({span})")?,
        ExprKind::This => writeln!(w, "this ({span})")?,
        ExprKind::Array(elems) => {
            writeln!(w, "array ({span})")?;
            for elem in elems {
                print_expr(w, i + 1, elem)?;
            }
        }
        ExprKind::Object(props) => {
            writeln!(w, "object ({span})")?;
            for prop in props {
                sp(w, i + 1)?;
                match prop {
                    Property::KeyValue { key, value } => {
                        match key {
                            PropertyKey::Ident(ident) => writeln!(w, "property {ident}")?,
                            PropertyKey::String(lit) => writeln!(w, "property {:?}", lit.value)?,
                            PropertyKey::Number(lit) => writeln!(w, "property {}", lit.value)?,
                            PropertyKey::Computed(key) => {
                                writeln!(w, "property [computed]")?;
                                print_expr(w, i + 2, key)?;
                            }
                        }
                        print_expr(w, i + 2, value)?;
                    }
                    Property::Shorthand(ident) => writeln!(w, "shorthand {ident}")?,
                    Property::Spread(expr) => {
                        writeln!(w, "spread")?;
                        print_expr(w, i + 2, expr)?;
                    }
                }
            }
        }
        ExprKind::Spread(expr) => {
            writeln!(w, "spread ({span})")?;
            print_expr(w, i + 1, expr)?;
        }
        ExprKind::Unary { op, expr } => {
            writeln!(w, "unary {op:?} ({span})")?;
            print_expr(w, i + 1, expr)?;
        }
        ExprKind::Update { op, prefix, target } => {
            let fixity = if *prefix { "prefix" } else { "postfix" };
            writeln!(w, "update {op:?} {fixity} ({span})")?;
            print_expr(w, i + 1, target)?;
        }
        ExprKind::Binary { op, lhs, rhs } => {
            writeln!(w, "binary {op:?} ({span})")?;
            print_expr(w, i + 1, lhs)?;
            print_expr(w, i + 1, rhs)?;
        }
        ExprKind::Assignment { op, target, value } => {
            writeln!(w, "assignment {op:?} ({span})")?;
            print_expr(w, i + 1, target)?;
            print_expr(w, i + 1, value)?;
        }
        ExprKind::Conditional {
            test,
            then_arm,
            else_arm,
        } => {
            writeln!(w, "conditional ({span})")?;
            print_expr(w, i + 1, test)?;
            print_expr(w, i + 1, then_arm)?;
            print_expr(w, i + 1, else_arm)?;
        }
        ExprKind::Call {
            callee,
            args,
            optional,
        } => {
            writeln!(w, "call{} ({span})", optional_marker(*optional))?;
            print_expr(w, i + 1, callee)?;
            for arg in args {
                print_expr(w, i + 1, arg)?;
            }
        }
        ExprKind::Member {
            object,
            property,
            optional,
        } => {
            writeln!(w, "member{} {property} ({span})", optional_marker(*optional))?;
            print_expr(w, i + 1, object)?;
        }
        ExprKind::Index {
            object,
            index,
            optional,
        } => {
            writeln!(w, "index{} ({span})", optional_marker(*optional))?;
            print_expr(w, i + 1, object)?;
            print_expr(w, i + 1, index)?;
        }
        ExprKind::Function(function) => print_function(w, i, "function-expr", function)?,
        ExprKind::Arrow { params, body } => {
            write!(w, "arrow ")?;
            print_params(w, params)?;
            writeln!(w, " ({span})")?;
            match body {
                ArrowBody::Expr(expr) => print_expr(w, i + 1, expr)?,
                ArrowBody::Block(stmts) => print_stmts(w, i + 1, stmts)?,
            }
        }
        ExprKind::Paren(expr) => {
            writeln!(w, "paren ({span})")?;
            print_expr(w, i + 1, expr)?;
        }
        ExprKind::Invalid => writeln!(w, "invalid ({span})")?,
    }
    Ok(())
}

fn decl_keyword(kind: DeclKind) -> &'static str {
    match kind {
        DeclKind::Let => "let",
        DeclKind::Const => "const",
    }
}

fn optional_marker(optional: bool) -> &'static str {
    if optional {
        " optional"
    } else {
        ""
    }
}

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:1$}", "", i * INDENT_WIDTH)
}
