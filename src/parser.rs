use crate::{
    ast::{
        ArrowBody, AssignOperator, BinaryOperator, Decl, DeclKind, Declarator, Export,
        ExportSpecifier, Expr, ExprKind, Function, Ident, Import, ImportSpecifier, Param, Program,
        Property, PropertyKey, Stmt, StmtKind, StrLit, SwitchCase, UnaryOperator, UpdateOperator,
    },
    lexer::{self, extract, LexError, LexOptions},
    token::{Span, Spanned, Token, TokenKind},
};

type Result<T, E = ()> = std::result::Result<T, E>;

/// How deep statements and expressions may nest before parsing gives up on
/// the enclosing statement.
pub const MAX_NESTING: usize = 128;

/// A best-effort program and every syntax error found while building it.
#[derive(Debug)]
pub struct Parsed {
    pub program: Program,
    pub errors: Vec<Spanned<Error>>,
}

/// Lexes and parses the provided source.
pub fn parse_program(src: &str, options: LexOptions) -> Parsed {
    let tokens = lexer::tokenize(src, options);
    parse(src, &tokens)
}

/// Parses an already lexed token stream, which must end with
/// [`TokenKind::Eof`].
#[tracing::instrument(level = "debug", skip_all, fields(tokens = tokens.len()))]
pub fn parse(src: &str, tokens: &[Token]) -> Parsed {
    let mut p = Parser::new(src, tokens);
    let body = p.parse_statements(&[]);
    tracing::debug!(
        statements = body.len(),
        errors = p.errors.len(),
        "parsed program"
    );
    Parsed {
        program: Program { body },
        errors: p.errors,
    }
}

/// Parses a single expression spanning the whole input.
pub fn parse_expr(src: &str) -> (Expr, Vec<Spanned<Error>>) {
    let tokens = lexer::tokenize(src, LexOptions::default());
    let mut p = Parser::new(src, &tokens);
    let expr = p.parse_expr_until_eof();
    (expr, p.errors)
}

struct Parser<'src, 'tok> {
    src: &'src str,
    tokens: &'tok [Token],
    cursor: usize,
    errors: Vec<Spanned<Error>>,
    /// Index of the first lexer error token which wasn't reported yet.
    lex_watermark: usize,
    /// Nesting of the statement or expression being parsed.
    depth: usize,
    too_deep: bool,
}

impl Parser<'_, '_> {
    /// Parses statements until the end of input or one of `terminators`,
    /// which is not consumed.
    fn parse_statements(&mut self, terminators: &[TokenKind]) -> Vec<Stmt> {
        let mut body = Vec::new();
        while self.except(terminators.iter().copied()) {
            let start = self.cursor;
            match self.parse_statement() {
                Ok(stmt) => body.push(stmt),
                Err(()) => self.recover(start, terminators),
            }
        }
        body
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        let depth = self.depth;
        let stmt = self.descend().and_then(|()| self.parse_nested_statement());
        self.depth = depth;
        stmt
    }

    fn parse_nested_statement(&mut self) -> Result<Stmt> {
        let token = self.peek();
        let kind = match token.kind {
            TokenKind::Let | TokenKind::Const => {
                let decl = self.parse_decl()?;
                self.expect_terminator();
                StmtKind::Decl(decl)
            }
            TokenKind::Function if self.peek_nth(1).kind == TokenKind::Label => {
                StmtKind::Function(self.parse_function()?)
            }
            TokenKind::If => return self.parse_if(),
            TokenKind::While => {
                self.advance();
                let test = self.parse_paren_expr()?;
                let body = self.parse_body(TokenKind::EndWhile)?;
                StmtKind::While {
                    test,
                    body: Box::new(body),
                }
            }
            TokenKind::For => return self.parse_for(),
            TokenKind::Switch => return self.parse_switch(),
            TokenKind::Try => {
                self.advance();
                let block = self.parse_block()?;
                self.consume(TokenKind::Catch)?;
                let param = if self.take(TokenKind::LParen) {
                    let param = self.parse_ident()?;
                    self.consume(TokenKind::RParen)?;
                    Some(param)
                } else {
                    None
                };
                let handler = self.parse_block()?;
                StmtKind::Try {
                    block,
                    param,
                    handler,
                }
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.at_statement_end() {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect_terminator();
                StmtKind::Return(value)
            }
            TokenKind::Break | TokenKind::Continue => {
                self.advance();
                self.expect_terminator();
                if token.kind == TokenKind::Break {
                    StmtKind::Break
                } else {
                    StmtKind::Continue
                }
            }
            TokenKind::LBrace => StmtKind::Block(self.parse_block()?),
            TokenKind::Semicolon => {
                self.advance();
                StmtKind::Empty
            }
            TokenKind::Import => StmtKind::Import(self.parse_import()?),
            TokenKind::Export => StmtKind::Export(self.parse_export()?),
            _ => {
                let expr = self.parse_expr()?;
                self.expect_terminator();
                StmtKind::Expr(expr)
            }
        };
        Ok(Stmt {
            kind,
            span: self.span_from(token.span()),
        })
    }

    fn parse_decl(&mut self) -> Result<Decl> {
        let kind = match self.consume_any(&[TokenKind::Let, TokenKind::Const])?.kind {
            TokenKind::Let => DeclKind::Let,
            _ => DeclKind::Const,
        };
        let mut declarators = Vec::with_capacity(1);
        loop {
            let name = self.parse_ident()?;
            let init = if self.take(TokenKind::Assign) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            if kind == DeclKind::Const && init.is_none() {
                self.error(name.span.wrap(Error::ConstWithoutInitializer));
            }
            declarators.push(Declarator { name, init });
            if !self.take(TokenKind::Comma) {
                break;
            }
        }
        Ok(Decl { kind, declarators })
    }

    fn parse_function(&mut self) -> Result<Function> {
        let start = self.consume(TokenKind::Function)?.span();
        let name = if self.is(TokenKind::Label) {
            Some(self.parse_ident()?)
        } else {
            None
        };
        self.consume(TokenKind::LParen)?;
        let params = self.parse_params()?;
        self.consume(TokenKind::RParen)?;
        let body = if self.take(TokenKind::Colon) {
            let body = self.parse_statements(&[TokenKind::EndFunction]);
            self.consume(TokenKind::EndFunction)?;
            body
        } else {
            self.parse_block()?
        };
        Ok(Function {
            name,
            params,
            body,
            span: self.span_from(start),
        })
    }

    /// Parses a parameter list, up to (but not including) the closing `)`.
    fn parse_params(&mut self) -> Result<Vec<Param>> {
        let params = self.parse_list(TokenKind::RParen, TokenKind::Comma, |p| {
            let rest = p.take(TokenKind::Ellipsis);
            let name = p.parse_ident()?;
            Ok(Param { name, rest })
        })?;
        let leading = params.len().saturating_sub(1);
        if let Some(misplaced) = params[..leading].iter().find(|p| p.rest) {
            let span = misplaced.name.span;
            self.error(span.wrap(Error::RestParameterNotLast));
        }
        Ok(params)
    }

    /// Parses `{ stmt* }`, returning the statements.
    fn parse_block(&mut self) -> Result<Vec<Stmt>> {
        self.consume(TokenKind::LBrace)?;
        let body = self.parse_statements(&[TokenKind::RBrace]);
        self.consume(TokenKind::RBrace)?;
        Ok(body)
    }

    /// Parses the body of a loop: either a single statement or the
    /// alternative `: stmt* end` form.
    fn parse_body(&mut self, end: TokenKind) -> Result<Stmt> {
        if !self.is(TokenKind::Colon) {
            return self.parse_statement();
        }
        let start = self.advance().span();
        let body = self.parse_statements(&[end]);
        self.consume(end)?;
        Ok(Stmt {
            kind: StmtKind::Block(body),
            span: self.span_from(start),
        })
    }

    fn parse_paren_expr(&mut self) -> Result<Expr> {
        self.consume(TokenKind::LParen)?;
        let expr = self.parse_expr()?;
        self.consume(TokenKind::RParen)?;
        Ok(expr)
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        let start = self.consume(TokenKind::If)?.span();
        let test = self.parse_paren_expr()?;
        if self.is(TokenKind::Colon) {
            return self.parse_alt_if(start, test);
        }
        let consequent = self.parse_statement()?;
        let alternate = if self.take(TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt {
            kind: StmtKind::If {
                test,
                consequent: Box::new(consequent),
                alternate,
            },
            span: self.span_from(start),
        })
    }

    /// `if (test): ... [elif (test): ...]* [else: ...] endif`. Each `elif`
    /// nests as the alternate of the previous branch.
    fn parse_alt_if(&mut self, start: Span, test: Expr) -> Result<Stmt> {
        let colon = self.consume(TokenKind::Colon)?.span();
        let body = self.parse_statements(&[TokenKind::Elif, TokenKind::Else, TokenKind::EndIf]);
        let consequent = Stmt {
            kind: StmtKind::Block(body),
            span: self.span_from(colon),
        };
        let alternate = match self.peek().kind {
            TokenKind::Elif => {
                let elif = self.advance().span();
                let test = self.parse_paren_expr()?;
                Some(Box::new(self.parse_alt_if(elif, test)?))
            }
            TokenKind::Else => {
                self.advance();
                let colon = self.consume(TokenKind::Colon)?.span();
                let body = self.parse_statements(&[TokenKind::EndIf]);
                let block = Stmt {
                    kind: StmtKind::Block(body),
                    span: self.span_from(colon),
                };
                self.consume(TokenKind::EndIf)?;
                Some(Box::new(block))
            }
            _ => {
                self.consume(TokenKind::EndIf)?;
                None
            }
        };
        Ok(Stmt {
            kind: StmtKind::If {
                test,
                consequent: Box::new(consequent),
                alternate,
            },
            span: self.span_from(start),
        })
    }

    fn parse_for(&mut self) -> Result<Stmt> {
        let start = self.consume(TokenKind::For)?.span();
        self.consume(TokenKind::LParen)?;

        let kind = if let Some(decl_kind) = self.for_in_head() {
            if decl_kind.is_some() {
                self.advance();
            }
            let first = self.parse_ident()?;
            let (key, value) = if self.take(TokenKind::Comma) {
                (Some(first), self.parse_ident()?)
            } else {
                (None, first)
            };
            self.consume(TokenKind::In)?;
            let iterable = self.parse_expr()?;
            self.consume(TokenKind::RParen)?;
            let body = self.parse_body(TokenKind::EndFor)?;
            StmtKind::ForIn {
                decl_kind,
                key,
                value,
                iterable,
                body: Box::new(body),
            }
        } else {
            let init = match self.peek().kind {
                TokenKind::Semicolon => None,
                TokenKind::Let | TokenKind::Const => {
                    let token = self.peek();
                    let decl = self.parse_decl()?;
                    Some(Box::new(Stmt {
                        kind: StmtKind::Decl(decl),
                        span: self.span_from(token.span()),
                    }))
                }
                _ => {
                    let expr = self.parse_expr()?;
                    let span = expr.span;
                    Some(Box::new(Stmt {
                        kind: StmtKind::Expr(expr),
                        span,
                    }))
                }
            };
            self.consume(TokenKind::Semicolon)?;
            let test = if self.is(TokenKind::Semicolon) {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.consume(TokenKind::Semicolon)?;
            let update = if self.is(TokenKind::RParen) {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.consume(TokenKind::RParen)?;
            let body = self.parse_body(TokenKind::EndFor)?;
            StmtKind::For {
                init,
                test,
                update,
                body: Box::new(body),
            }
        };
        Ok(Stmt {
            kind,
            span: self.span_from(start),
        })
    }

    /// Looks ahead for `[let|const] ID [, ID] in`. Returns the declaration
    /// kind (`Some(None)` for bare identifiers) when the head is a for-in.
    ///
    /// The left-hand side of a for-in only ever binds names, so it is never
    /// handed to expression parsing, which would take `in` as an operator.
    fn for_in_head(&self) -> Option<Option<DeclKind>> {
        let (decl_kind, skip): (_, usize) = match self.peek().kind {
            TokenKind::Let => (Some(DeclKind::Let), 1),
            TokenKind::Const => (Some(DeclKind::Const), 1),
            _ => (None, 0),
        };
        let kind_at = |n: usize| self.peek_nth(skip + n).kind;
        let single = kind_at(0) == TokenKind::Label && kind_at(1) == TokenKind::In;
        let pair = kind_at(0) == TokenKind::Label
            && kind_at(1) == TokenKind::Comma
            && kind_at(2) == TokenKind::Label
            && kind_at(3) == TokenKind::In;
        (single || pair).then_some(decl_kind)
    }

    fn parse_switch(&mut self) -> Result<Stmt> {
        let start = self.consume(TokenKind::Switch)?.span();
        let discriminant = self.parse_paren_expr()?;
        self.consume(TokenKind::LBrace)?;
        let mut cases = Vec::new();
        let mut seen_default = false;
        while self.except([TokenKind::RBrace]) {
            let case_start = self.peek();
            let test = match case_start.kind {
                TokenKind::Case => {
                    self.advance();
                    Some(self.parse_expr()?)
                }
                TokenKind::Default => {
                    self.advance();
                    if seen_default {
                        self.error(case_start.span().wrap(Error::DuplicateDefault));
                    }
                    seen_default = true;
                    None
                }
                _ => {
                    self.error_unexpected(&[TokenKind::Case, TokenKind::Default, TokenKind::RBrace]);
                    self.skip();
                    continue;
                }
            };
            self.consume(TokenKind::Colon)?;
            let body = self.parse_statements(&[
                TokenKind::Case,
                TokenKind::Default,
                TokenKind::RBrace,
            ]);
            cases.push(SwitchCase {
                test,
                body,
                span: self.span_from(case_start.span()),
            });
        }
        self.consume(TokenKind::RBrace)?;
        Ok(Stmt {
            kind: StmtKind::Switch {
                discriminant,
                cases,
            },
            span: self.span_from(start),
        })
    }

    fn parse_import(&mut self) -> Result<Import> {
        self.consume(TokenKind::Import)?;
        let mut specifiers = Vec::new();
        if self.is(TokenKind::Label) && !self.is_word("from") {
            specifiers.push(ImportSpecifier::Default(self.parse_ident()?));
            if !self.take(TokenKind::Comma) {
                return self.finish_import(specifiers);
            }
        }
        if self.take(TokenKind::Star) {
            self.consume_word("as")?;
            specifiers.push(ImportSpecifier::Namespace(self.parse_ident()?));
        } else {
            self.consume(TokenKind::LBrace)?;
            let named = self.parse_list(TokenKind::RBrace, TokenKind::Comma, |p| {
                let imported = p.parse_property_name()?;
                let local = if p.take_word("as") {
                    Some(p.parse_ident()?)
                } else {
                    None
                };
                Ok(ImportSpecifier::Named { imported, local })
            })?;
            self.consume(TokenKind::RBrace)?;
            specifiers.extend(named);
        }
        self.finish_import(specifiers)
    }

    fn finish_import(&mut self, specifiers: Vec<ImportSpecifier>) -> Result<Import> {
        self.consume_word("from")?;
        let source = self.parse_str_lit()?;
        self.expect_terminator();
        Ok(Import { specifiers, source })
    }

    fn parse_export(&mut self) -> Result<Export> {
        self.consume(TokenKind::Export)?;
        let token = self.peek();
        match token.kind {
            TokenKind::Let | TokenKind::Const => {
                let decl = self.parse_decl()?;
                self.expect_terminator();
                Ok(Export::Decl(Box::new(Stmt {
                    kind: StmtKind::Decl(decl),
                    span: self.span_from(token.span()),
                })))
            }
            TokenKind::Function => {
                let function = self.parse_function()?;
                let span = function.span;
                if function.name.is_none() {
                    self.error(span.wrap(Error::AnonymousExport));
                }
                // Unlike plain function declarations, exported ones must be
                // terminated.
                _ = self.consume(TokenKind::Semicolon);
                Ok(Export::Decl(Box::new(Stmt {
                    kind: StmtKind::Function(function),
                    span,
                })))
            }
            TokenKind::Default => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect_terminator();
                Ok(Export::Default(expr))
            }
            TokenKind::Star => {
                self.advance();
                let alias = if self.take_word("as") {
                    Some(self.parse_ident()?)
                } else {
                    None
                };
                self.consume_word("from")?;
                let source = self.parse_str_lit()?;
                self.expect_terminator();
                Ok(Export::All { alias, source })
            }
            TokenKind::LBrace => {
                self.advance();
                let specifiers = self.parse_list(TokenKind::RBrace, TokenKind::Comma, |p| {
                    let local = p.parse_property_name()?;
                    let exported = if p.take_word("as") {
                        Some(p.parse_property_name()?)
                    } else {
                        None
                    };
                    Ok(ExportSpecifier { local, exported })
                })?;
                self.consume(TokenKind::RBrace)?;
                let source = if self.take_word("from") {
                    Some(self.parse_str_lit()?)
                } else {
                    None
                };
                self.expect_terminator();
                Ok(Export::Named { specifiers, source })
            }
            _ => {
                self.error_unexpected(&[
                    TokenKind::Let,
                    TokenKind::Const,
                    TokenKind::Function,
                    TokenKind::Default,
                    TokenKind::LBrace,
                    TokenKind::Star,
                ]);
                Err(())
            }
        }
    }

    fn parse_str_lit(&mut self) -> Result<StrLit> {
        let token = self.consume(TokenKind::String)?;
        Ok(StrLit {
            value: extract::string(token, self.src),
            span: token.span(),
        })
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.consume(TokenKind::Label)?;
        Ok(Ident {
            name: extract::ident(token, self.src),
            span: token.span(),
        })
    }

    /// Property names may also be keywords, as in `obj.default`.
    fn parse_property_name(&mut self) -> Result<Ident> {
        let token = self.peek();
        if token.kind.is_keyword() {
            self.advance();
            return Ok(Ident {
                name: extract::ident(token, self.src),
                span: token.span(),
            });
        }
        self.parse_ident()
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_until_eof(&mut self) -> Expr {
        let expr = self
            .parse_expr()
            .unwrap_or_else(|()| Expr::invalid(Span::new_of_length(self.src.len(), 0)));
        if !self.is(TokenKind::Eof) {
            _ = self.consume(TokenKind::Eof);
        }
        expr
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let depth = self.depth;
        let expr = self.parse_operators(min_bp);
        self.depth = depth;
        expr
    }

    /// Every operator applied to the left-hand side deepens the tree, so it
    /// counts as a nesting level too.
    fn parse_operators(&mut self, min_bp: u8) -> Result<Expr> {
        self.descend()?;
        let mut lhs = self.parse_nud()?;

        loop {
            let op_token = self.peek();

            if let Some((lbp, rbp)) = self.infix_binding_power(op_token.kind) {
                if lbp < min_bp {
                    // Operator binds less tightly than the minimum required
                    break;
                }

                self.advance(); // Operator
                self.descend()?;
                lhs = self.parse_led(op_token, lhs, rbp)?;
            } else {
                // Not an infix operator or binds too loosely
                break;
            }
        }

        Ok(lhs)
    }

    /// nud: Parses tokens that start an expression
    /// (prefix operators, literals, grouping)
    fn parse_nud(&mut self) -> Result<Expr> {
        let token = self.peek();
        let kind = match token.kind {
            TokenKind::Label if self.peek_nth(1).kind == TokenKind::Arrow => {
                let name = self.parse_ident()?;
                self.consume(TokenKind::Arrow)?;
                let body = self.parse_arrow_body()?;
                let params = vec![Param { name, rest: false }];
                ExprKind::Arrow { params, body }
            }
            TokenKind::Label => ExprKind::Id(self.parse_ident()?),
            TokenKind::Number => {
                self.advance();
                match extract::int(token, self.src) {
                    Ok(parsed) => ExprKind::Int(parsed),
                    Err(_) => {
                        self.error(token.span().wrap(Error::IntegerOutOfRange));
                        ExprKind::Invalid
                    }
                }
            }
            TokenKind::Double => {
                self.advance();
                ExprKind::Double(extract::double(token, self.src))
            }
            TokenKind::String => {
                self.advance();
                ExprKind::String(extract::string(token, self.src))
            }
            TokenKind::Template => {
                self.advance();
                ExprKind::Template(self.parse_template(token))
            }
            TokenKind::Regexp => {
                self.advance();
                let (pattern, flags) = extract::regexp(token, self.src);
                ExprKind::Regexp { pattern, flags }
            }
            TokenKind::True => self.advance_with(ExprKind::Bool(true)),
            TokenKind::False => self.advance_with(ExprKind::Bool(false)),
            TokenKind::Null => self.advance_with(ExprKind::Null),
            TokenKind::This => self.advance_with(ExprKind::This),

            // Arrow function: ( params ) => body
            TokenKind::LParen if self.is_arrow_params() => {
                self.advance();
                let params = self.parse_params()?;
                self.consume(TokenKind::RParen)?;
                self.consume(TokenKind::Arrow)?;
                let body = self.parse_arrow_body()?;
                ExprKind::Arrow { params, body }
            }

            // Grouping: ( expr )
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.consume(TokenKind::RParen)?;
                ExprKind::Paren(Box::new(expr))
            }

            // Array: [ elem, ... ]
            TokenKind::LBrack => {
                self.advance();
                let elems =
                    self.parse_list(TokenKind::RBrack, TokenKind::Comma, Self::parse_element)?;
                self.consume(TokenKind::RBrack)?;
                ExprKind::Array(elems)
            }

            // Object: { key: value, ... }
            TokenKind::LBrace => {
                self.advance();
                let props =
                    self.parse_list(TokenKind::RBrace, TokenKind::Comma, Self::parse_property)?;
                self.consume(TokenKind::RBrace)?;
                ExprKind::Object(props)
            }

            TokenKind::Function => ExprKind::Function(Box::new(self.parse_function()?)),

            // Prefix operators: -, +, !, ~, delete
            kind @ (TokenKind::Minus
            | TokenKind::Plus
            | TokenKind::Bang
            | TokenKind::Tilde
            | TokenKind::Delete) => {
                self.advance();
                let op = match kind {
                    TokenKind::Minus => UnaryOperator::Neg,
                    TokenKind::Plus => UnaryOperator::Plus,
                    TokenKind::Bang => UnaryOperator::Not,
                    TokenKind::Tilde => UnaryOperator::BitNot,
                    _ => UnaryOperator::Delete,
                };
                let expr = self.parse_expr_bp(PREFIX_BP)?;
                ExprKind::Unary {
                    op,
                    expr: Box::new(expr),
                }
            }
            kind @ (TokenKind::PlusPlus | TokenKind::MinusMinus) => {
                self.advance();
                let target = self.parse_expr_bp(PREFIX_BP)?;
                self.check_assignment_target(&target);
                ExprKind::Update {
                    op: update_operator(kind),
                    prefix: true,
                    target: Box::new(target),
                }
            }

            TokenKind::Error(_) => {
                self.report_lex_error(self.cursor);
                self.advance();
                ExprKind::Invalid
            }

            other => {
                let error = Error::UnexpectedTokenInExpr { token: other };
                self.error(token.span().wrap(error));
                return Err(());
            }
        };

        Ok(Expr {
            kind,
            span: self.span_from(token.span()),
        })
    }

    /// led: Parses tokens that follow a left-hand-side expression
    /// (infix/postfix operators)
    fn parse_led(&mut self, op_token: Token, lhs: Expr, rbp: u8) -> Result<Expr> {
        let start = lhs.span;

        // Assignment: target (= | += | ...) expr
        if let Some(op) = assign_operator(op_token.kind) {
            self.check_assignment_target(&lhs);
            let value = self.parse_expr_bp(rbp)?;
            let kind = ExprKind::Assignment {
                op,
                target: Box::new(lhs),
                value: Box::new(value),
            };
            return Ok(Expr {
                kind,
                span: self.span_from(start),
            });
        }

        let kind = match op_token.kind {
            // Conditional: test ? expr : expr
            TokenKind::Question => {
                let then_arm = self.parse_expr()?;
                self.consume(TokenKind::Colon)?;
                let else_arm = self.parse_expr_bp(rbp)?;
                ExprKind::Conditional {
                    test: Box::new(lhs),
                    then_arm: Box::new(then_arm),
                    else_arm: Box::new(else_arm),
                }
            }
            // Member access: expr . name, expr ?. name
            kind @ (TokenKind::Dot | TokenKind::QDot) => {
                let property = self.parse_property_name()?;
                ExprKind::Member {
                    object: Box::new(lhs),
                    property,
                    optional: kind == TokenKind::QDot,
                }
            }
            // Call: expr ( args ), expr ?.( args )
            kind @ (TokenKind::LParen | TokenKind::QLParen) => {
                let args =
                    self.parse_list(TokenKind::RParen, TokenKind::Comma, Self::parse_element)?;
                self.consume(TokenKind::RParen)?;
                ExprKind::Call {
                    callee: Box::new(lhs),
                    args,
                    optional: kind == TokenKind::QLParen,
                }
            }
            // Index: expr [ expr ], expr ?.[ expr ]
            kind @ (TokenKind::LBrack | TokenKind::QLBrack) => {
                let index = self.parse_expr()?;
                self.consume(TokenKind::RBrack)?;
                ExprKind::Index {
                    object: Box::new(lhs),
                    index: Box::new(index),
                    optional: kind == TokenKind::QLBrack,
                }
            }
            // Postfix update: expr ++, expr --
            kind @ (TokenKind::PlusPlus | TokenKind::MinusMinus) => {
                self.check_assignment_target(&lhs);
                ExprKind::Update {
                    op: update_operator(kind),
                    prefix: false,
                    target: Box::new(lhs),
                }
            }
            kind => {
                let Some(op) = binary_operator(kind) else {
                    let error = Error::UnexpectedOperator { actual: kind };
                    self.error(op_token.span().wrap(error));
                    return Err(());
                };
                // Parse right operand with correct precedence
                let rhs = self.parse_expr_bp(rbp)?;
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                }
            }
        };
        Ok(Expr {
            kind,
            span: self.span_from(start),
        })
    }

    /// Array elements and call arguments, which may be spread.
    fn parse_element(&mut self) -> Result<Expr> {
        let Some(start) = self.take_span(TokenKind::Ellipsis) else {
            return self.parse_expr();
        };
        let expr = self.parse_expr()?;
        Ok(Expr {
            kind: ExprKind::Spread(Box::new(expr)),
            span: self.span_from(start),
        })
    }

    fn parse_property(&mut self) -> Result<Property> {
        if self.take(TokenKind::Ellipsis) {
            return Ok(Property::Spread(self.parse_expr()?));
        }
        let token = self.peek();
        let key = match token.kind {
            TokenKind::Label
                if matches!(self.peek_nth(1).kind, TokenKind::Comma | TokenKind::RBrace) =>
            {
                return Ok(Property::Shorthand(self.parse_ident()?));
            }
            kind if kind == TokenKind::Label || kind.is_keyword() => {
                PropertyKey::Ident(self.parse_property_name()?)
            }
            TokenKind::String => PropertyKey::String(self.parse_str_lit()?),
            TokenKind::Number | TokenKind::Double => {
                self.advance();
                PropertyKey::Number(StrLit {
                    value: token.text(self.src).into(),
                    span: token.span(),
                })
            }
            TokenKind::LBrack => {
                self.advance();
                let expr = self.parse_expr()?;
                self.consume(TokenKind::RBrack)?;
                PropertyKey::Computed(Box::new(expr))
            }
            _ => {
                self.error_unexpected(&[
                    TokenKind::Label,
                    TokenKind::String,
                    TokenKind::Number,
                    TokenKind::LBrack,
                ]);
                return Err(());
            }
        };
        self.consume(TokenKind::Colon)?;
        let value = self.parse_expr()?;
        Ok(Property::KeyValue { key, value })
    }

    fn parse_arrow_body(&mut self) -> Result<ArrowBody> {
        if self.is(TokenKind::LBrace) {
            Ok(ArrowBody::Block(self.parse_block()?))
        } else {
            Ok(ArrowBody::Expr(Box::new(self.parse_expr()?)))
        }
    }

    /// Parses the interpolated expressions of a template literal. Each
    /// `${...}` is lexed and parsed on its own, keeping absolute spans.
    fn parse_template(&mut self, token: Token) -> Vec<Expr> {
        let mut exprs = Vec::new();
        for range in extract::template_interpolations(token, self.src) {
            let tokens = lexer::tokenize_range(self.src, range, LexOptions::default());
            let mut sub = Parser::new(self.src, &tokens);
            exprs.push(sub.parse_expr_until_eof());
            self.errors.append(&mut sub.errors);
        }
        exprs
    }

    /// Checks whether the current `(` opens an arrow function parameter
    /// list, i.e. names (the last one possibly a rest parameter) up to a `)`
    /// followed by `=>`. The scan stops at the first token a parameter list
    /// can't hold, so nested groups are never rescanned.
    fn is_arrow_params(&self) -> bool {
        let mut offset = 1;
        loop {
            match self.peek_nth(offset).kind {
                TokenKind::Label | TokenKind::Comma | TokenKind::Ellipsis => offset += 1,
                TokenKind::RParen => return self.peek_nth(offset + 1).kind == TokenKind::Arrow,
                _ => return false,
            }
        }
    }

    fn check_assignment_target(&mut self, target: &Expr) {
        let valid = matches!(
            target.kind,
            ExprKind::Id(_) | ExprKind::Member { .. } | ExprKind::Index { .. } | ExprKind::Invalid
        );
        if !valid {
            self.error(target.span.wrap(Error::InvalidAssignmentTarget));
        }
    }

    /// Parses `item (separator item)*` until `end_delim` is found. Does
    /// **NOT** consume the end delimiter. Trailing separators are accepted.
    fn parse_list<T>(
        &mut self,
        end_delim: TokenKind,
        separator: TokenKind,
        parse_item: impl Fn(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        debug_assert_ne!(end_delim, separator);
        let mut items = Vec::new();
        while self.except([end_delim]) {
            let item = self.synchronize(&[separator], &[end_delim], |p| parse_item(p))?;
            items.push(item);
            // After consuming an item, we must consume the separator.
            if !self.take(separator) {
                if self.is(end_delim) {
                    // If, however, it is not present, then we check if the end
                    // delimiter is current. If so, we can stop.
                    break;
                }
                // However, if the current token is not the separator nor
                // the end delimiter, the list is malformed.
                self.error_unexpected(&[separator, end_delim]);
                return Err(());
            }
        }
        Ok(items)
    }

    fn infix_binding_power(&self, kind: TokenKind) -> Option<(u8, u8)> {
        use TokenKind::*;
        let bp = match kind {
            // Assignment (right-associative)
            Assign | PlusAssign | MinusAssign | StarAssign | SlashAssign | PercentAssign
            | StarStarAssign | AmpAssign | PipeAssign | CaretAssign | ShlAssign | ShrAssign
            | AndAndAssign | OrOrAssign | NullishAssign => (2, 1),
            // Conditional (right-associative)
            Question => (4, 3),
            // Logical (left-associative)
            Nullish => (5, 6),
            OrOr => (7, 8),
            AndAnd => (9, 10),
            // Bitwise (left-associative)
            Pipe => (11, 12),
            Caret => (13, 14),
            Amp => (15, 16),
            // Equality and comparisons (left-associative)
            EqEq | NotEq | EqEqEq | NotEqEq => (17, 18),
            Less | LessEq | Greater | GreaterEq | In => (19, 20),
            Shl | Shr => (21, 22),
            // Arithmetic (left-associative)
            Plus | Minus => (23, 24),
            Star | Slash | Percent => (25, 26),
            // Exponentiation (right-associative)
            StarStar => (28, 27),
            // Postfix update, only on the same line as its operand
            PlusPlus | MinusMinus if !self.newline_before_current() => (31, 32),
            // Member access, calls and indexing
            Dot | QDot | LParen | QLParen | LBrack | QLBrack => (33, 34),
            _ => return None,
        };
        Some(bp)
    }
}

/// Binding power of prefix operators' operands.
const PREFIX_BP: u8 = 29;

fn binary_operator(kind: TokenKind) -> Option<BinaryOperator> {
    use BinaryOperator as B;
    use TokenKind::*;
    let op = match kind {
        Plus => B::Add,
        Minus => B::Sub,
        Star => B::Mul,
        Slash => B::Div,
        Percent => B::Mod,
        StarStar => B::Exp,
        EqEq => B::Eq,
        NotEq => B::Ne,
        EqEqEq => B::StrictEq,
        NotEqEq => B::StrictNe,
        Less => B::Lt,
        LessEq => B::Le,
        Greater => B::Gt,
        GreaterEq => B::Ge,
        In => B::In,
        Amp => B::BitAnd,
        Pipe => B::BitOr,
        Caret => B::BitXor,
        Shl => B::Shl,
        Shr => B::Shr,
        AndAnd => B::And,
        OrOr => B::Or,
        Nullish => B::Nullish,
        _ => return None,
    };
    Some(op)
}

fn assign_operator(kind: TokenKind) -> Option<AssignOperator> {
    use BinaryOperator as B;
    use TokenKind::*;
    let op = match kind {
        Assign => return Some(AssignOperator::Assign),
        PlusAssign => B::Add,
        MinusAssign => B::Sub,
        StarAssign => B::Mul,
        SlashAssign => B::Div,
        PercentAssign => B::Mod,
        StarStarAssign => B::Exp,
        AmpAssign => B::BitAnd,
        PipeAssign => B::BitOr,
        CaretAssign => B::BitXor,
        ShlAssign => B::Shl,
        ShrAssign => B::Shr,
        AndAndAssign => B::And,
        OrOrAssign => B::Or,
        NullishAssign => B::Nullish,
        _ => return None,
    };
    Some(AssignOperator::Compound(op))
}

fn update_operator(kind: TokenKind) -> UpdateOperator {
    if kind == TokenKind::PlusPlus {
        UpdateOperator::Increment
    } else {
        UpdateOperator::Decrement
    }
}

/// Tokens which always begin a new statement. Recovery resumes at these.
fn starts_statement(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        Let | Const
            | Function
            | If
            | For
            | While
            | Switch
            | Try
            | Return
            | Break
            | Continue
            | Import
            | Export
    )
}

/// Tokens which close a block, before which a `;` may be omitted.
fn closes_block(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        RBrace | Eof | EndIf | EndFor | EndWhile | EndFunction | Elif | Case | Default
    )
}

impl<'src, 'tok> Parser<'src, 'tok> {
    fn new(src: &'src str, tokens: &'tok [Token]) -> Parser<'src, 'tok> {
        debug_assert!(tokens.last().is_some_and(Token::is_eof));
        Parser {
            src,
            tokens,
            cursor: 0,
            errors: Vec::with_capacity(8),
            lex_watermark: 0,
            depth: 0,
            too_deep: false,
        }
    }

    /// Enters one more nesting level, failing past [`MAX_NESTING`]. Only the
    /// first failure is reported.
    fn descend(&mut self) -> Result<()> {
        if self.depth >= MAX_NESTING {
            if !self.too_deep {
                self.too_deep = true;
                let span = self.peek().span();
                self.error(span.wrap(Error::NestingTooDeep));
            }
            return Err(());
        }
        self.depth += 1;
        Ok(())
    }

    /// Records an error.
    fn error(&mut self, error: Spanned<Error>) {
        self.errors.push(error);
    }

    /// Records an error describing the current token as unexpected.
    fn error_unexpected(&mut self, expected: &[TokenKind]) {
        let c = self.peek();
        if c.kind.is_error() {
            self.report_lex_error(self.cursor);
            return;
        }
        let error = match expected {
            [single] => Error::Unexpected {
                actual: c.kind,
                expected: *single,
            },
            _ => Error::UnexpectedAny {
                actual: c.kind,
                expected: Box::from(expected),
            },
        };
        self.error(c.span().wrap(error));
    }

    /// Reports the lexer error token at `index`, at most once.
    fn report_lex_error(&mut self, index: usize) {
        let Some(token) = self.tokens.get(index) else {
            return;
        };
        if let TokenKind::Error(e) = token.kind {
            if index >= self.lex_watermark {
                self.lex_watermark = index + 1;
                self.errors.push(token.span().wrap(Error::Lexer(e)));
            }
        }
    }

    /// Returns the current token.
    #[inline]
    fn peek(&self) -> Token {
        self.peek_nth(0)
    }

    /// Returns the `n`-th token after the current one.
    fn peek_nth(&self, n: usize) -> Token {
        match self.tokens.get(self.cursor + n) {
            Some(token) => *token,
            None => self.tokens.last().copied().unwrap_or(Token::eof_for(self.src)),
        }
    }

    /// Returns the current token and advances. Never moves past the end.
    fn advance(&mut self) -> Token {
        let c = self.peek();
        if !c.is_eof() {
            self.cursor += 1;
        }
        c
    }

    /// Advances and returns the provided value.
    fn advance_with<T>(&mut self, value: T) -> T {
        self.advance();
        value
    }

    /// Advances past a token while skipping, reporting it if it's a lexer
    /// error.
    fn skip(&mut self) {
        self.report_lex_error(self.cursor);
        self.advance();
    }

    /// The span of the last consumed token.
    fn last_span(&self) -> Span {
        match self.cursor.checked_sub(1) {
            Some(i) => self.tokens[i].span(),
            None => self.peek().span(),
        }
    }

    /// A span from `start` up to the last consumed token.
    fn span_from(&self, start: Span) -> Span {
        start.to(self.last_span())
    }

    /// Whether a line break separates the current token from the previous.
    fn newline_before_current(&self) -> bool {
        let Some(prev) = self.cursor.checked_sub(1).map(|i| self.tokens[i]) else {
            return false;
        };
        let lo = prev.span().hi();
        let hi = self.peek().span().lo.max(lo);
        self.src[lo..hi].contains('\n')
    }

    /// Whether a `return` has no value: `return;`, `return }` or a line
    /// break after `return`.
    fn at_statement_end(&self) -> bool {
        let kind = self.peek().kind;
        kind == TokenKind::Semicolon || closes_block(kind) || self.newline_before_current()
    }

    /// Checks whether the current token matches the given one.
    fn is(&self, expect: TokenKind) -> bool {
        self.peek().kind == expect
    }

    /// Whether the current token is the identifier `word`. Used for the
    /// contextual words `as` and `from`.
    fn is_word(&self, word: &str) -> bool {
        let c = self.peek();
        c.kind == TokenKind::Label && c.text(self.src) == word
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> bool {
        self.take_span(expect).is_some()
    }

    fn take_span(&mut self, expect: TokenKind) -> Option<Span> {
        self.is(expect).then(|| self.advance().span())
    }

    fn take_word(&mut self, word: &str) -> bool {
        if self.is_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume_word(&mut self, word: &'static str) -> Result<Token> {
        if self.is_word(word) {
            return Ok(self.advance());
        }
        let c = self.peek();
        if c.kind.is_error() {
            self.report_lex_error(self.cursor);
        } else {
            self.error(c.span().wrap(Error::ExpectedWord {
                word,
                actual: c.kind,
            }));
        }
        Err(())
    }

    /// Advances if the current token matches the provided one, returning it.
    /// If not, records an error.
    fn consume(&mut self, expect: TokenKind) -> Result<Token> {
        if self.is(expect) {
            Ok(self.advance())
        } else {
            self.error_unexpected(&[expect]);
            Err(())
        }
    }

    /// Advances if the current token matches any of the provided tokens,
    /// returning it. If not, records an error.
    fn consume_any(&mut self, expect: &'static [TokenKind]) -> Result<Token> {
        for t in expect {
            if self.is(*t) {
                return Ok(self.advance());
            }
        }
        self.error_unexpected(expect);
        Err(())
    }

    /// Returns true while the current token does *not* match one of the
    /// provided ones. [`TokenKind::Eof`] is implicitly included in the list.
    ///
    /// This won't advance the cursor.
    fn except(&self, except: impl IntoIterator<Item = TokenKind>) -> bool {
        let c = self.peek();
        for e in except {
            if c.kind == e {
                return false;
            }
        }
        c.kind != TokenKind::Eof
    }

    /// Consumes the `;` terminating a statement.
    ///
    /// A missing `;` is reported once. If the next token is on a new line or
    /// starts a statement, it's taken as an implicit boundary. Otherwise the
    /// rest of the statement is skipped. Nothing is reported before a token
    /// closing a block, or right after a lexer error (already reported).
    fn expect_terminator(&mut self) {
        if self.take(TokenKind::Semicolon) {
            return;
        }
        let c = self.peek();
        let after_lex_error = self.cursor > 0 && self.tokens[self.cursor - 1].kind.is_error();
        if closes_block(c.kind) || after_lex_error {
            return;
        }
        self.error_unexpected(&[TokenKind::Semicolon]);
        if self.newline_before_current() || starts_statement(c.kind) {
            return;
        }
        tracing::trace!(at = %c.span(), "skipping to statement boundary");
        while !self.at_boundary() {
            self.skip();
        }
        self.take(TokenKind::Semicolon);
    }

    /// A statement boundary: a `;`, a token that closes a block or starts a
    /// statement, or the first token of a line.
    fn at_boundary(&self) -> bool {
        let kind = self.peek().kind;
        kind == TokenKind::Semicolon
            || closes_block(kind)
            || starts_statement(kind)
            || self.newline_before_current()
    }

    /// Resynchronizes after a statement failed to parse. Skips at least one
    /// token (unless at a terminator), then up to the next statement boundary.
    /// A `;` boundary is consumed.
    fn recover(&mut self, start: usize, terminators: &[TokenKind]) {
        tracing::trace!(at = %self.peek().span(), "recovering from syntax error");
        if self.cursor == start {
            self.skip();
        }
        loop {
            let kind = self.peek().kind;
            if kind == TokenKind::Eof || terminators.contains(&kind) {
                return;
            }
            if kind == TokenKind::Semicolon {
                self.advance();
                return;
            }
            if starts_statement(kind) || self.newline_before_current() {
                return;
            }
            self.skip();
        }
    }

    /// Runs `f`. On failure, skips tokens until one in `cont_cond` (after
    /// which `f` is retried) or one in `stop_cond` or a statement boundary
    /// (after which the failure is propagated).
    fn synchronize<T>(
        &mut self,
        cont_cond: &[TokenKind],
        stop_cond: &[TokenKind],
        mut f: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<T> {
        'outer: loop {
            if let Ok(val) = f(self) {
                break Ok(val);
            }
            // In the case of an error, try to advance until find a token
            // specified in `cont_cond` (in which case we retry) or in
            // `stop_cond` (in which case we stop).
            loop {
                let c = self.peek().kind;
                // Check whether must stop
                if c == TokenKind::Eof
                    || stop_cond.contains(&c)
                    || c == TokenKind::Semicolon
                    || starts_statement(c)
                    || (c == TokenKind::RBrace && !cont_cond.contains(&c))
                {
                    break 'outer Err(());
                }
                // The token advancement must be AFTER stopping. If we break
                // out, the caller should advance (to follow the convention).
                self.skip();
                // Check whether can retry
                if cont_cond.contains(&c) {
                    continue 'outer;
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("invalid assignment target")]
    InvalidAssignmentTarget,
    #[error("expected expression, but got {token}")]
    UnexpectedTokenInExpr { token: TokenKind },
    #[error("expected {expected}, but got {actual}")]
    Unexpected {
        actual: TokenKind,
        expected: TokenKind,
    },
    #[error("expected one of {}, but got {actual}", kinds(.expected))]
    UnexpectedAny {
        actual: TokenKind,
        expected: Box<[TokenKind]>,
    },
    #[error("expected '{word}', but got {actual}")]
    ExpectedWord {
        word: &'static str,
        actual: TokenKind,
    },
    #[error("unexpected operator {actual}")]
    UnexpectedOperator { actual: TokenKind },
    #[error("missing initializer in const declaration")]
    ConstWithoutInitializer,
    #[error("rest parameter must be the last parameter")]
    RestParameterNotLast,
    #[error("multiple default clauses in switch")]
    DuplicateDefault,
    #[error("exported functions must be named")]
    AnonymousExport,
    #[error("integer literal out of range")]
    IntegerOutOfRange,
    #[error("nesting too deep")]
    NestingTooDeep,
    /// A lexer error token, surfaced verbatim.
    #[error("{0}")]
    Lexer(LexError),
}

fn kinds(kinds: &[TokenKind]) -> String {
    let kinds: Vec<_> = kinds.iter().map(ToString::to_string).collect();
    kinds.join(", ")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::util::test_utils::{format_errors, tree_tests};

    fn nesting_errors(parsed: &Parsed) -> usize {
        parsed
            .errors
            .iter()
            .filter(|e| e.inner == Error::NestingTooDeep)
            .count()
    }

    #[test]
    fn test_deep_parentheses_fail_the_statement() {
        let src = format!("x = {}1{};\nlet y = 2;", "(".repeat(5000), ")".repeat(5000));
        let parsed = parse_program(&src, LexOptions::default());
        assert_eq!(format_errors(&parsed.errors), ["129..130: nesting too deep"]);
        assert_eq!(parsed.program.body.len(), 1);
        assert!(matches!(parsed.program.body[0].kind, StmtKind::Decl(_)));
    }

    #[test]
    fn test_arrow_detection_inside_groups() {
        let (expr, errors) = parse_expr("(((a))) + ((c, ...d) => c)");
        assert_eq!(errors, []);
        let ExprKind::Binary { lhs, rhs, .. } = expr.kind else {
            panic!("expected a binary expression");
        };
        assert!(matches!(lhs.kind, ExprKind::Paren(_)));
        let ExprKind::Paren(inner) = rhs.kind else {
            panic!("expected a group");
        };
        assert!(matches!(inner.kind, ExprKind::Arrow { .. }));

        let (_, errors) = parse_expr("(a, 1) => a");
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_deep_blocks_and_operator_chains() {
        let src = format!("{}{}", "{".repeat(3000), "}".repeat(3000));
        let parsed = parse_program(&src, LexOptions::default());
        assert_eq!(nesting_errors(&parsed), 1);

        let src = format!("{}1;", "1 + ".repeat(3000));
        let parsed = parse_program(&src, LexOptions::default());
        assert_eq!(nesting_errors(&parsed), 1);

        let src = format!("{}1;", "1 + ".repeat(50));
        let parsed = parse_program(&src, LexOptions::default());
        assert_eq!(parsed.errors, []);
    }

    tree_tests!(
        use parser;

        fn test_let_multiple_declarators() {
            let program = "let a = 1, b;";
            let tree_ok = "
                let (0..13)
                  binding a
                    int 1 (8..9)
                  binding b
            ";
        }

        fn test_const_requires_initializer() {
            let program = "const a;";
            let expected_errors = &["6..7: missing initializer in const declaration"];
        }

        fn test_precedence_and_associativity() {
            let program = "x = y = 1 + 2 * 3 ** 2 ** 1;";
            let tree_ok = "
                expr (0..28)
                  assignment Assign (0..27)
                    ident x (0..1)
                    assignment Assign (4..27)
                      ident y (4..5)
                      binary Add (8..27)
                        int 1 (8..9)
                        binary Mul (12..27)
                          int 2 (12..13)
                          binary Exp (16..27)
                            int 3 (16..17)
                            binary Exp (21..27)
                              int 2 (21..22)
                              int 1 (26..27)
            ";
        }

        fn test_logical_and_conditional() {
            let program = "a || b && c ? d : e ? f : g;";
            let tree_ok = "
                expr (0..28)
                  conditional (0..27)
                    binary Or (0..11)
                      ident a (0..1)
                      binary And (5..11)
                        ident b (5..6)
                        ident c (10..11)
                    ident d (14..15)
                    conditional (18..27)
                      ident e (18..19)
                      ident f (22..23)
                      ident g (26..27)
            ";
        }

        fn test_division_and_regex() {
            let program = "x = 10 / 2; y = /a+/g;";
            let tree_ok = r#"
                expr (0..11)
                  assignment Assign (0..10)
                    ident x (0..1)
                    binary Div (4..10)
                      int 10 (4..6)
                      int 2 (9..10)
                expr (12..22)
                  assignment Assign (12..21)
                    ident y (12..13)
                    regexp /a+/g (16..21)
            "#;
        }

        fn test_optional_chaining() {
            let program = "a?.b?.(c)?.[0];";
            let tree_ok = "
                expr (0..15)
                  index optional (0..14)
                    call optional (0..9)
                      member optional b (0..4)
                        ident a (0..1)
                      ident c (7..8)
                    int 0 (12..13)
            ";
        }

        fn test_for_in_bare_identifier() {
            let program = "for (s in all_stations) station_total++;";
            let tree_ok = "
                for-in s (0..40)
                  ident all_stations (10..22)
                  expr (24..40)
                    update Increment postfix (24..39)
                      ident station_total (24..37)
            ";
        }

        fn test_for_in_key_value_with_let() {
            let program = "for (let k, v in obj) {}";
            let tree_ok = "
                for-in let k, v (0..24)
                  ident obj (17..20)
                  block (22..24)
            ";
        }

        fn test_classic_for() {
            let program = "for (let i = 0; i < 3; i++) print(i);";
            let tree_ok = "
                for (0..37)
                  let (5..14)
                    binding i
                      int 0 (13..14)
                  binary Lt (16..21)
                    ident i (16..17)
                    int 3 (20..21)
                  update Increment postfix (23..26)
                    ident i (23..24)
                  expr (28..37)
                    call (28..36)
                      ident print (28..33)
                      ident i (34..35)
            ";
        }

        fn test_object_literal_key_kinds() {
            let program = r#"x = { a: 1, "b": 2, 3: 4, default: 5, [k]: 6, c, ...d };"#;
            let tree_ok = r#"
                expr (0..56)
                  assignment Assign (0..55)
                    ident x (0..1)
                    object (4..55)
                      property a
                        int 1 (9..10)
                      property "b"
                        int 2 (17..18)
                      property 3
                        int 4 (23..24)
                      property default
                        int 5 (35..36)
                      property [computed]
                        ident k (39..40)
                        int 6 (43..44)
                      shorthand c
                      spread
                        ident d (52..53)
            "#;
        }

        fn test_arrow_functions() {
            let program = "f = (a, ...b) => a; g = x => { return x; };";
            let tree_ok = "
                expr (0..19)
                  assignment Assign (0..18)
                    ident f (0..1)
                    arrow (a, ...b) (4..18)
                      ident a (17..18)
                expr (20..43)
                  assignment Assign (20..42)
                    ident g (20..21)
                    arrow (x) (24..42)
                      return (31..40)
                        ident x (38..39)
            ";
        }

        fn test_template_interpolation() {
            let program = "t = `a ${b + 1} c`;";
            let tree_ok = "
                expr (0..19)
                  assignment Assign (0..18)
                    ident t (0..1)
                    template (4..18)
                      binary Add (9..14)
                        ident b (9..10)
                        int 1 (13..14)
            ";
        }

        fn test_function_declaration_needs_no_semicolon() {
            let program = "function f(a) { return a; } f(1);";
            let tree_ok = "
                function f(a) (0..27)
                  return (16..25)
                    ident a (23..24)
                expr (28..33)
                  call (28..32)
                    ident f (28..29)
                    int 1 (30..31)
            ";
        }

        fn test_exported_function_with_semicolon() {
            let program = "export function f() {};";
            let tree_ok = "
                export (0..23)
                  function f() (7..22)
            ";
        }

        fn test_exported_function_requires_semicolon() {
            let program = "export function f() {}\nlet x = 1;";
            let expected_errors = &["23..26: expected ';', but got 'let'"];
        }

        fn test_export_forms() {
            let program = r#"export { a as b } from "./m.uc"; export * from "x"; export default 1; export const c = 2;"#;
            let tree_ok = r#"
                export (0..32)
                  named a as b
                  from "./m.uc"
                export (33..51)
                  all from "x"
                export (52..69)
                  default
                    int 1 (67..68)
                export (70..89)
                  const (77..89)
                    binding c
                      int 2 (87..88)
            "#;
        }

        fn test_import_forms() {
            let program = r#"import { a, b as c } from 'math'; import * as fs from 'fs'; import d, { e } from './x.uc';"#;
            let tree_ok = r#"
                import from "math" (0..33)
                  named a
                  named b as c
                import from "fs" (34..59)
                  namespace fs
                import from "./x.uc" (60..90)
                  default d
                  named e
            "#;
        }

        fn test_alternative_syntax() {
            let program = "if (a): x(); elif (b): y(); else: z(); endif";
            let tree_ok = "
                if (0..44)
                  ident a (4..5)
                  block (6..12)
                    expr (8..12)
                      call (8..11)
                        ident x (8..9)
                  else
                    if (13..44)
                      ident b (19..20)
                      block (21..27)
                        expr (23..27)
                          call (23..26)
                            ident y (23..24)
                      else
                        block (32..38)
                          expr (34..38)
                            call (34..37)
                              ident z (34..35)
            ";
        }

        fn test_switch_and_try() {
            let program = "switch (x) { case 1: break; default: y(); } try { z(); } catch (e) { }";
            let tree_ok = "
                switch (0..43)
                  ident x (8..9)
                  case (13..27)
                    int 1 (18..19)
                    break (21..27)
                  default (28..41)
                    expr (37..41)
                      call (37..40)
                        ident y (37..38)
                try (44..70)
                  block
                    expr (50..54)
                      call (50..53)
                        ident z (50..51)
                  catch e
            ";
        }

        fn test_missing_semicolon_single_error() {
            let program = "let x = 5\nlet y = 10;";
            let tree_error = "
                let (0..9)
                  binding x
                    int 5 (8..9)
                let (10..21)
                  binding y
                    int 10 (18..20)
            ";
            let expected_errors = &["10..13: expected ';', but got 'let'"];
        }

        fn test_missing_semicolons_one_error_each() {
            let program = "a()\nb()\nc();";
            let expected_errors = &[
                "4..5: expected ';', but got identifier",
                "8..9: expected ';', but got identifier",
            ];
        }

        fn test_missing_semicolon_same_line_skips_to_boundary() {
            let program = "let x = 5 6 7; y();";
            let tree_error = "
                let (0..14)
                  binding x
                    int 5 (8..9)
                expr (15..19)
                  call (15..18)
                    ident y (15..16)
            ";
            let expected_errors = &["10..11: expected ';', but got integer literal"];
        }

        fn test_no_semicolon_needed_before_brace() {
            let program = "function f() { return 1 }";
            let expected_errors = &[];
        }

        fn test_recovery_resumes_at_next_statement() {
            let program = "let = 1;\nlet ok = 2;";
            let tree_error = "
                let (9..20)
                  binding ok
                    int 2 (18..19)
            ";
            let expected_errors = &["4..5: expected identifier, but got '='"];
        }

        fn test_recovery_in_call_arguments() {
            let program = "f(1, , 2);";
            let tree_error = "
                expr (0..10)
                  call (0..9)
                    ident f (0..1)
                    int 1 (2..3)
                    int 2 (7..8)
            ";
            let expected_errors = &["5..6: expected expression, but got ','"];
        }

        fn test_unterminated_string_reported_once() {
            let program = "let s = \"abc\nlet t = 1;";
            let tree_error = "
                let (0..12)
                  binding s
                    invalid (8..12)
                let (13..23)
                  binding t
                    int 1 (21..22)
            ";
            let expected_errors = &["8..12: unterminated string literal"];
        }

        fn test_stray_slash() {
            let program = "let x = / 2;";
            let expected_errors = &[
                "8..9: unexpected '/': not a division, a comment or a regular expression",
            ];
        }

        fn test_invalid_assignment_target() {
            let program = "1 = 2;";
            let expected_errors = &["0..1: invalid assignment target"];
        }

        fn test_rest_parameter_not_last() {
            let program = "function f(...a, b) {}";
            let expected_errors = &["14..15: rest parameter must be the last parameter"];
        }

        fn test_stray_closing_brace() {
            let program = "}\nx();";
            let tree_error = "
                expr (2..6)
                  call (2..5)
                    ident x (2..3)
            ";
            let expected_errors = &["0..1: expected expression, but got '}'"];
        }

        fn test_unclosed_block_stops_at_eof() {
            let program = "if (a) { b();";
            let expected_errors = &["13..13: expected '}', but got end of input"];
        }
    );
}
