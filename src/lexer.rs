use std::{num::ParseIntError, ops::Range};

use crate::token::{Span, Token, TokenKind, KEYWORDS};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 8_192;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LexOptions {
    /// Disables keyword promotion: every bare word is lexed as a
    /// [`TokenKind::Label`].
    pub raw_mode: bool,
}

/// A malformed token. Carried by [`TokenKind::Error`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("unexpected character")]
    UnexpectedChar,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated template literal")]
    UnterminatedTemplate,
    #[error("unterminated regular expression literal")]
    UnterminatedRegex,
    #[error("invalid regular expression flag, expected one of 'g', 'i' or 's'")]
    InvalidRegexFlag,
    #[error("unexpected '/': not a division, a comment or a regular expression")]
    StraySlash,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("malformed number literal")]
    InvalidNumber,
}

/// Lexes the provided string, producing the tokens into the provided buffer.
pub fn lex(src: &str, options: LexOptions, tokens: &mut Vec<Token>) {
    Lexer::new(src, 0..src.len(), options, tokens).lex();
}

/// A convenience function that allocates a new buffer per lexed input and
/// returns it. The last token is always [`TokenKind::Eof`].
#[tracing::instrument(level = "trace", skip_all, fields(len = src.len()))]
pub fn tokenize(src: &str, options: LexOptions) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(src.len() / 4 + 1);
    lex(src, options, &mut tokens);
    tracing::trace!(count = tokens.len(), "lexed");
    tokens
}

/// Lexes only `range` of the source. Spans stay absolute to `src`.
pub fn tokenize_range(src: &str, range: Range<usize>, options: LexOptions) -> Vec<Token> {
    let mut tokens = Vec::new();
    Lexer::new(src, range, options, &mut tokens).lex();
    tokens
}

struct Lexer<'src, 'tok> {
    src: &'src str,
    start: usize,
    end: usize,
    cursor: usize,
    current_lo: usize,
    /// The last two produced tokens, most recent first.
    prev: [Option<TokenKind>; 2],
    options: LexOptions,
    tokens: &'tok mut Vec<Token>,
}

impl Lexer<'_, '_> {
    /// Scans the source string until the input is exhausted.
    fn lex(mut self) {
        loop {
            self.skip_trivia();
            let next = self.scan_token_kind();
            let is_eof = matches!(next, TokenKind::Eof);
            self.produce(next);
            if is_eof {
                break;
            }
        }
    }

    /// Skips whitespace and comments. An unclosed block comment is produced
    /// as an error token spanning up to the end of input.
    fn skip_trivia(&mut self) {
        loop {
            let c = self.peek();
            if self.at_end() {
                return;
            }
            if c.is_whitespace() {
                self.advance();
            } else if c == '/' && self.peek_nth(1) == '/' {
                while !self.at_end() && self.peek() != '\n' {
                    self.advance();
                }
            } else if c == '/' && self.peek_nth(1) == '*' {
                self.current_lo = self.cursor;
                self.advance();
                self.advance();
                if !self.block_comment() {
                    self.produce(TokenKind::Error(LexError::UnterminatedComment));
                }
            } else if c == '#' && self.cursor == 0 && self.start == 0 && self.peek_nth(1) == '!' {
                while !self.at_end() && self.peek() != '\n' {
                    self.advance();
                }
            } else {
                return;
            }
        }
    }

    fn block_comment(&mut self) -> bool {
        while !self.at_end() {
            if self.advance() == '*' && self.peek() == '/' {
                self.advance();
                return true;
            }
        }
        false
    }

    /// Tries to scan the current character.
    fn scan_token_kind(&mut self) -> TokenKind {
        use TokenKind::*;
        if self.at_end() {
            self.current_lo = self.cursor;
            return Eof;
        }
        match self.mark_advance() {
            '(' => LParen,
            ')' => RParen,
            '[' => LBrack,
            ']' => RBrack,
            '{' => LBrace,
            '}' => RBrace,
            ';' => Semicolon,
            ',' => Comma,
            ':' => Colon,
            '~' => Tilde,
            '?' => match self.peek() {
                // `a?.5:1` is a conditional, not an optional chain.
                '.' if !self.peek_nth(1).is_ascii_digit() => {
                    self.advance();
                    match self.peek() {
                        '(' => self.advance_with(QLParen),
                        '[' => self.advance_with(QLBrack),
                        _ => QDot,
                    }
                }
                '?' => {
                    self.advance();
                    self.choose('=', NullishAssign, Nullish)
                }
                _ => Question,
            },
            '.' => match self.peek() {
                '.' if self.peek_nth(1) == '.' => {
                    self.advance();
                    self.advance_with(Ellipsis)
                }
                c if c.is_ascii_digit() => self.number('.'),
                _ => Dot,
            },
            '=' => match self.peek() {
                '=' => {
                    self.advance();
                    self.choose('=', EqEqEq, EqEq)
                }
                '>' => self.advance_with(Arrow),
                _ => Assign,
            },
            '!' => match self.peek() {
                '=' => {
                    self.advance();
                    self.choose('=', NotEqEq, NotEq)
                }
                _ => Bang,
            },
            '<' => match self.peek() {
                '<' => {
                    self.advance();
                    self.choose('=', ShlAssign, Shl)
                }
                '=' => self.advance_with(LessEq),
                _ => Less,
            },
            '>' => match self.peek() {
                '>' => {
                    self.advance();
                    self.choose('=', ShrAssign, Shr)
                }
                '=' => self.advance_with(GreaterEq),
                _ => Greater,
            },
            '+' => match self.peek() {
                '+' => self.advance_with(PlusPlus),
                '=' => self.advance_with(PlusAssign),
                _ => Plus,
            },
            '-' => match self.peek() {
                '-' => self.advance_with(MinusMinus),
                '=' => self.advance_with(MinusAssign),
                _ => Minus,
            },
            '*' => match self.peek() {
                '*' => {
                    self.advance();
                    self.choose('=', StarStarAssign, StarStar)
                }
                '=' => self.advance_with(StarAssign),
                _ => Star,
            },
            '%' => self.choose('=', PercentAssign, Percent),
            '&' => match self.peek() {
                '&' => {
                    self.advance();
                    self.choose('=', AndAndAssign, AndAnd)
                }
                '=' => self.advance_with(AmpAssign),
                _ => Amp,
            },
            '|' => match self.peek() {
                '|' => {
                    self.advance();
                    self.choose('=', OrOrAssign, OrOr)
                }
                '=' => self.advance_with(PipeAssign),
                _ => Pipe,
            },
            '^' => self.choose('=', CaretAssign, Caret),
            '/' if self.slash_starts_regex() => self.regexp(),
            '/' => self.choose('=', SlashAssign, Slash),
            q @ ('"' | '\'') => self.string(q),
            '`' => self.template(),
            c if c.is_ascii_digit() => self.number(c),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier_or_keyword(),
            _ => Error(LexError::UnexpectedChar),
        }
    }

    /// A `/` opens a regular expression unless the previous token may end an
    /// expression. Keywords used as property names (`obj.default / 2`) also
    /// end an expression.
    fn slash_starts_regex(&self) -> bool {
        match self.prev {
            [Some(kind), _] if kind.ends_expression() => false,
            [Some(kind), Some(TokenKind::Dot | TokenKind::QDot)] if kind.is_keyword() => false,
            _ => true,
        }
    }

    /// Scans a regular expression literal. The opening `/` was consumed.
    fn regexp(&mut self) -> TokenKind {
        if self.at_end() || self.peek().is_whitespace() {
            return TokenKind::Error(LexError::StraySlash);
        }
        let mut in_class = false;
        loop {
            if self.at_end() || self.peek() == '\n' {
                return TokenKind::Error(LexError::UnterminatedRegex);
            }
            match self.advance() {
                '\\' => {
                    if self.at_end() || self.peek() == '\n' {
                        return TokenKind::Error(LexError::UnterminatedRegex);
                    }
                    self.advance();
                }
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => break,
                _ => (),
            }
        }
        let mut valid_flags = true;
        while self.peek().is_ascii_alphabetic() {
            valid_flags &= matches!(self.advance(), 'g' | 'i' | 's');
        }
        if valid_flags {
            TokenKind::Regexp
        } else {
            TokenKind::Error(LexError::InvalidRegexFlag)
        }
    }

    /// Tries to lex a string token. The opening quote was consumed.
    ///
    /// A raw line break ends the literal as unterminated, leaving the line
    /// break itself to the next scan so the following line lexes normally. A
    /// malformed escape doesn't stop the scan: the token covers the whole
    /// literal and is reported once.
    fn string(&mut self, quote: char) -> TokenKind {
        let mut error = None;
        loop {
            if self.at_end() || self.peek() == '\n' {
                return TokenKind::Error(LexError::UnterminatedString);
            }
            match self.advance() {
                c if c == quote => {
                    return error.map_or(TokenKind::String, TokenKind::Error);
                }
                '\\' => {
                    if let Err(e) = self.escape() {
                        error.get_or_insert(e);
                    }
                }
                _ => (),
            }
        }
    }

    fn template(&mut self) -> TokenKind {
        let mut error = None;
        loop {
            if self.at_end() {
                return TokenKind::Error(LexError::UnterminatedTemplate);
            }
            match self.advance() {
                '`' => return error.map_or(TokenKind::Template, TokenKind::Error),
                '\\' => {
                    if let Err(e) = self.escape() {
                        error.get_or_insert(e);
                    }
                }
                '$' if self.peek() == '{' => {
                    self.advance();
                    if !self.template_interpolation() {
                        return TokenKind::Error(LexError::UnterminatedTemplate);
                    }
                }
                _ => (),
            }
        }
    }

    /// Skips a `${ ... }` body, balancing braces and nested literals.
    fn template_interpolation(&mut self) -> bool {
        let mut depth = 1_u32;
        while !self.at_end() {
            match self.advance() {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return true;
                    }
                }
                q @ ('"' | '\'') => {
                    self.string(q);
                }
                '`' => {
                    if self.template() == TokenKind::Error(LexError::UnterminatedTemplate) {
                        return false;
                    }
                }
                _ => (),
            }
        }
        false
    }

    /// Validates one escape sequence. The backslash was consumed.
    fn escape(&mut self) -> Result<(), LexError> {
        if self.at_end() {
            return Ok(());
        }
        match self.advance() {
            'x' => self.hex_digits(2),
            'u' if self.peek() == '{' => {
                self.advance();
                let mut count = 0;
                while self.peek().is_ascii_hexdigit() {
                    self.advance();
                    count += 1;
                }
                if (1..=6).contains(&count) && self.peek() == '}' {
                    self.advance();
                    Ok(())
                } else {
                    Err(LexError::InvalidEscape)
                }
            }
            'u' => self.hex_digits(4),
            '0'..='7' => {
                for _ in 0..2 {
                    if !matches!(self.peek(), '0'..='7') {
                        break;
                    }
                    self.advance();
                }
                Ok(())
            }
            // Any other character (including a line break) stands for itself.
            _ => Ok(()),
        }
    }

    fn hex_digits(&mut self, count: usize) -> Result<(), LexError> {
        for _ in 0..count {
            if !self.peek().is_ascii_hexdigit() {
                return Err(LexError::InvalidEscape);
            }
            self.advance();
        }
        Ok(())
    }

    fn number(&mut self, first: char) -> TokenKind {
        if first == '0' && matches!(self.peek(), 'x' | 'X' | 'o' | 'O' | 'b' | 'B') {
            let radix = match self.advance() {
                'x' | 'X' => 16,
                'o' | 'O' => 8,
                _ => 2,
            };
            let mut digits = 0;
            while self.peek().is_digit(radix) {
                self.advance();
                digits += 1;
            }
            if digits == 0 || is_word_char(self.peek()) {
                return self.invalid_number();
            }
            return TokenKind::Number;
        }

        let mut kind = if first == '.' {
            TokenKind::Double
        } else {
            TokenKind::Number
        };
        self.digits();
        if kind == TokenKind::Number && self.peek() == '.' && self.peek_nth(1).is_ascii_digit() {
            self.advance();
            self.digits();
            kind = TokenKind::Double;
        }
        if matches!(self.peek(), 'e' | 'E') {
            let sign = usize::from(matches!(self.peek_nth(1), '+' | '-'));
            if !self.peek_nth(1 + sign).is_ascii_digit() {
                return self.invalid_number();
            }
            for _ in 0..=sign {
                self.advance();
            }
            self.digits();
            kind = TokenKind::Double;
        }
        if is_word_char(self.peek()) {
            return self.invalid_number();
        }
        kind
    }

    fn digits(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
    }

    /// Consumes the rest of a malformed number, such as `12ab` or `0x`.
    fn invalid_number(&mut self) -> TokenKind {
        while is_word_char(self.peek()) {
            self.advance();
        }
        TokenKind::Error(LexError::InvalidNumber)
    }

    fn identifier_or_keyword(&mut self) -> TokenKind {
        while is_word_char(self.peek()) {
            self.advance();
        }
        if self.options.raw_mode {
            return TokenKind::Label;
        }
        KEYWORDS
            .get(self.substr())
            .copied()
            .unwrap_or(TokenKind::Label)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl Lexer<'_, '_> {
    /// Constructs a new lexer with the default state.
    fn new<'src, 'tok>(
        src: &'src str,
        range: Range<usize>,
        options: LexOptions,
        tokens: &'tok mut Vec<Token>,
    ) -> Lexer<'src, 'tok> {
        debug_assert!(range.end <= src.len());
        Lexer {
            src,
            start: range.start,
            end: range.end,
            cursor: range.start,
            current_lo: range.start,
            prev: [None, None],
            options,
            tokens,
        }
    }

    fn at_end(&self) -> bool {
        self.cursor >= self.end
    }

    /// Starts a new token "mark" and advances the iterator.
    fn mark_advance(&mut self) -> char {
        self.current_lo = self.cursor;
        self.advance()
    }

    /// Returns the next char and advances the cursor. Returns `'\0'` (without
    /// advancing) at the end of input.
    fn advance(&mut self) -> char {
        let c = self.peek();
        if !self.at_end() {
            self.cursor += c.len_utf8();
        }
        c
    }

    /// Advances and returns the provided value.
    fn advance_with<T>(&mut self, value: T) -> T {
        self.advance();
        value
    }

    /// Advances and returns `then` if the next char is `expected`, otherwise
    /// returns `otherwise` without advancing.
    fn choose(&mut self, expected: char, then: TokenKind, otherwise: TokenKind) -> TokenKind {
        if self.peek() == expected {
            self.advance_with(then)
        } else {
            otherwise
        }
    }

    /// Returns the next char without advancing the iterator.
    fn peek(&self) -> char {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> char {
        self.src[self.cursor..self.end].chars().nth(n).unwrap_or('\0')
    }

    /// Returns the current span.
    fn span(&self) -> Span {
        Span::new_of_bounds(self.current_lo..self.cursor)
    }

    /// Returns the substring of the current marked bounds.
    fn substr(&self) -> &str {
        self.span().substr(self.src)
    }

    /// Produces a token using the marked bounds.
    fn produce(&mut self, kind: TokenKind) {
        self.prev = [Some(kind), self.prev[0]];
        self.tokens.push(Token::new(kind, self.span()));
    }
}

/// Decoding of literal token values.
pub mod extract {
    use super::*;

    pub fn int(token: Token, src: &str) -> Result<i64, ParseIntError> {
        debug_assert_eq!(token.kind, TokenKind::Number);
        let text = token.text(src);
        let (radix, digits) = match text.get(..2) {
            Some("0x" | "0X") => (16, &text[2..]),
            Some("0o" | "0O") => (8, &text[2..]),
            Some("0b" | "0B") => (2, &text[2..]),
            _ => (10, text),
        };
        i64::from_str_radix(digits, radix)
    }

    pub fn double(token: Token, src: &str) -> f64 {
        debug_assert_eq!(token.kind, TokenKind::Double);
        // The lexer only produces well-formed doubles.
        token.text(src).parse().unwrap_or(f64::NAN)
    }

    pub fn ident(token: Token, src: &str) -> Box<str> {
        token.text(src).into()
    }

    pub fn string(token: Token, src: &str) -> Box<str> {
        debug_assert_eq!(token.kind, TokenKind::String);
        let raw = token.span().offset(1, -1).substr(src);
        if raw.contains('\\') {
            perform_escape(raw).into_boxed_str()
        } else {
            raw.into()
        }
    }

    /// Splits a regular expression literal into its pattern and flags.
    pub fn regexp(token: Token, src: &str) -> (Box<str>, Box<str>) {
        debug_assert_eq!(token.kind, TokenKind::Regexp);
        let text = token.text(src);
        let close = text.rfind('/').unwrap_or(0);
        (text[1..close.max(1)].into(), text[close + 1..].into())
    }

    /// Absolute source ranges of the `${...}` interpolations of a template
    /// literal, without the delimiters.
    pub fn template_interpolations(token: Token, src: &str) -> Vec<Range<usize>> {
        debug_assert_eq!(token.kind, TokenKind::Template);
        let lo = token.span().lo;
        let bytes = token.text(src).as_bytes();
        let mut ranges = Vec::new();
        let mut i = 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'$' if bytes.get(i + 1) == Some(&b'{') => {
                    let close = closing_brace(bytes, i + 2);
                    ranges.push(lo + i + 2..lo + close);
                    i = close + 1;
                }
                _ => i += 1,
            }
        }
        ranges
    }

    /// Index of the `}` closing an interpolation whose body starts at `i`.
    fn closing_brace(bytes: &[u8], mut i: usize) -> usize {
        let mut depth = 1_u32;
        while i < bytes.len() {
            match bytes[i] {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return i;
                    }
                }
                quote @ (b'"' | b'\'' | b'`') => {
                    i += 1;
                    while i < bytes.len() && bytes[i] != quote {
                        i += if bytes[i] == b'\\' { 2 } else { 1 };
                    }
                }
                _ => (),
            }
            i += 1;
        }
        bytes.len()
    }
}

/// Decodes the escape sequences of a literal body which is known to be
/// well formed.
pub fn perform_escape(raw: &str) -> String {
    let mut buf = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            buf.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            break;
        };
        let decoded = match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\x08',
            'f' => '\x0c',
            'v' => '\x0b',
            'a' => '\x07',
            'e' => '\x1b',
            // Line continuation.
            '\n' => continue,
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                char_of(u32::from_str_radix(&hex, 16).ok())
            }
            'u' if chars.peek() == Some(&'{') => {
                chars.next();
                let hex: String = chars.by_ref().take_while(|&c| c != '}').collect();
                char_of(u32::from_str_radix(&hex, 16).ok())
            }
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                char_of(u32::from_str_radix(&hex, 16).ok())
            }
            d @ '0'..='7' => {
                let mut value = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                char_of(Some(value))
            }
            other => other,
        };
        buf.push(decoded);
    }
    buf
}

fn char_of(code: Option<u32>) -> char {
    code.and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}
