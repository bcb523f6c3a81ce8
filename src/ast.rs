// program   ::= stmt*
// stmt      ::= decl | function | if | while | for | switch | try | return
//             | break | continue | block | import | export | expr ';' | ';'
// decl      ::= (let | const) ID ['=' expr] (',' ID ['=' expr])* ';'
// function  ::= function ID '(' params ')' (block | ':' stmt* endfunction)
// if        ::= if '(' expr ')' stmt [else stmt]
//             | if '(' expr ')' ':' stmt* (elif '(' expr ')' ':' stmt*)* [else ':' stmt*] endif
// for       ::= for '(' [let|const] ID [',' ID] in expr ')' body
//             | for '(' [init] ';' [expr] ';' [expr] ')' body
// import    ::= import (ID | '{' specs '}' | '*' as ID | ID ',' '{' specs '}') from STRING ';'
// export    ::= export (decl | function ';' | default expr ';'
//             | '{' specs '}' [from STRING] ';' | '*' [as ID] from STRING ';')
//
// Expressions are parsed by precedence climbing, see `parser`.

use crate::token::Span;

#[derive(Debug, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
}

#[derive(Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum StmtKind {
    Expr(Expr),
    Decl(Decl),
    Function(Function),
    If {
        test: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },
    While {
        test: Expr,
        body: Box<Stmt>,
    },
    For {
        init: Option<Box<Stmt>>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    ForIn {
        /// `let`/`const`, or `None` for a bare identifier.
        decl_kind: Option<DeclKind>,
        /// Present in the two-binding form `for (k, v in obj)`.
        key: Option<Ident>,
        value: Ident,
        iterable: Expr,
        body: Box<Stmt>,
    },
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
    },
    Try {
        block: Vec<Stmt>,
        param: Option<Ident>,
        handler: Vec<Stmt>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Block(Vec<Stmt>),
    Import(Import),
    Export(Export),
    Empty,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum DeclKind {
    Let,
    Const,
}

#[derive(Debug, PartialEq)]
pub struct Decl {
    pub kind: DeclKind,
    pub declarators: Vec<Declarator>,
}

#[derive(Debug, PartialEq)]
pub struct Declarator {
    pub name: Ident,
    pub init: Option<Expr>,
}

#[derive(Debug, PartialEq)]
pub struct Function {
    /// `None` for anonymous function expressions.
    pub name: Option<Ident>,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub struct Param {
    pub name: Ident,
    /// `...name`
    pub rest: bool,
}

#[derive(Debug, PartialEq)]
pub struct SwitchCase {
    /// `None` for `default:`.
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub struct Import {
    /// In source order.
    pub specifiers: Vec<ImportSpecifier>,
    pub source: StrLit,
}

impl Import {
    /// The local names this import binds, in source order.
    pub fn local_names(&self) -> impl Iterator<Item = &str> {
        self.specifiers.iter().map(|s| &*s.local().name)
    }
}

#[derive(Debug, PartialEq)]
pub enum ImportSpecifier {
    /// `import { imported as local }`, where `local` is `None` when not
    /// aliased.
    Named {
        imported: Ident,
        local: Option<Ident>,
    },
    /// `import local from "..."`
    Default(Ident),
    /// `import * as local from "..."`
    Namespace(Ident),
}

impl ImportSpecifier {
    pub fn local(&self) -> &Ident {
        match self {
            ImportSpecifier::Named { imported, local } => local.as_ref().unwrap_or(imported),
            ImportSpecifier::Default(local) | ImportSpecifier::Namespace(local) => local,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Export {
    /// `export let ...;`, `export const ...;` or `export function f() {};`
    Decl(Box<Stmt>),
    /// `export default expr;`
    Default(Expr),
    /// `export { a, b as c } [from "..."];`
    Named {
        specifiers: Vec<ExportSpecifier>,
        source: Option<StrLit>,
    },
    /// `export * [as ns] from "...";`
    All {
        alias: Option<Ident>,
        source: StrLit,
    },
}

#[derive(Debug, PartialEq)]
pub struct ExportSpecifier {
    pub local: Ident,
    pub exported: Option<Ident>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct StrLit {
    pub value: Box<str>,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    /// Placeholder for an expression which failed to lex or parse.
    pub fn invalid(span: Span) -> Expr {
        Expr {
            kind: ExprKind::Invalid,
            span,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum ExprKind {
    Id(Ident),
    Int(i64),
    Double(f64),
    String(Box<str>),
    /// Interpolated expressions of a template literal, in source order.
    Template(Vec<Expr>),
    Regexp {
        pattern: Box<str>,
        flags: Box<str>,
    },
    Bool(bool),
    Null,
    This,
    Array(Vec<Expr>),
    Object(Vec<Property>),
    /// `...expr`, only valid inside array literals and call arguments.
    Spread(Box<Expr>),
    Unary {
        op: UnaryOperator,
        expr: Box<Expr>,
    },
    Update {
        op: UpdateOperator,
        prefix: bool,
        target: Box<Expr>,
    },
    Binary {
        op: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Assignment {
        op: AssignOperator,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        then_arm: Box<Expr>,
        else_arm: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        optional: bool,
    },
    Member {
        object: Box<Expr>,
        property: Ident,
        optional: bool,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        optional: bool,
    },
    Function(Box<Function>),
    Arrow {
        params: Vec<Param>,
        body: ArrowBody,
    },
    Paren(Box<Expr>),
    Invalid,
}

#[derive(Debug, PartialEq)]
pub enum ArrowBody {
    Expr(Box<Expr>),
    Block(Vec<Stmt>),
}

#[derive(Debug, PartialEq)]
pub enum Property {
    KeyValue { key: PropertyKey, value: Expr },
    /// `{ name }`
    Shorthand(Ident),
    Spread(Expr),
}

#[derive(Debug, PartialEq)]
pub enum PropertyKey {
    /// Bare identifiers and keywords.
    Ident(Ident),
    String(StrLit),
    Number(StrLit),
    Computed(Box<Expr>),
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UnaryOperator {
    Neg,
    Plus,
    Not,
    BitNot,
    Delete,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UpdateOperator {
    Increment,
    Decrement,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    And,
    Or,
    Nullish,
}

impl BinaryOperator {
    pub fn is_arithmetic(self) -> bool {
        use BinaryOperator::*;
        matches!(self, Add | Sub | Mul | Div | Mod | Exp)
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum AssignOperator {
    Assign,
    /// Compound assignment such as `+=`, carrying the underlying operator.
    Compound(BinaryOperator),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Ident {
    pub name: Box<str>,
    pub span: Span,
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
