use std::{fmt, ops::Range};

use crate::lexer::LexError;

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    lo: usize,
    len: u32,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Token {
        Token {
            kind,
            len: span.len,
            lo: span.lo,
        }
    }

    /// The end-of-input token for the given source.
    pub fn eof_for(src: &str) -> Token {
        Token::new(TokenKind::Eof, Span::new_of_length(src.len(), 0))
    }

    pub fn span(&self) -> Span {
        Span {
            len: self.len,
            lo: self.lo,
        }
    }

    /// The source text this token covers.
    pub fn text<'src>(&self, src: &'src str) -> &'src str {
        self.span().substr(src)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {})", self.kind, self.span())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub len: u32,
    pub lo: usize,
}

impl Span {
    pub fn new_of_bounds(Range { start: lo, end: hi }: Range<usize>) -> Span {
        debug_assert!(hi >= lo);
        Self::new_of_length(lo, u32::try_from(hi - lo).unwrap())
    }

    pub fn new_of_length(lo: usize, len: u32) -> Span {
        Span { len, lo }
    }

    pub fn hi(self) -> usize {
        self.lo + self.len as usize
    }

    /// Returns a span which starts at `self` and ends at `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new_of_bounds(self.lo..other.hi().max(self.lo))
    }

    /// Shrinks (or grows) the span on both ends.
    pub fn offset(self, lo: isize, hi: isize) -> Span {
        let new_lo = self.lo.saturating_add_signed(lo);
        let new_hi = self.hi().saturating_add_signed(hi).max(new_lo);
        Span::new_of_bounds(new_lo..new_hi)
    }

    pub fn contains(self, offset: usize) -> bool {
        self.lo <= offset && offset < self.hi()
    }

    /// Like [`Span::contains`], but also accepts the end offset, which is
    /// where an editor cursor sits right after a word.
    pub fn touches(self, offset: usize) -> bool {
        self.lo <= offset && offset <= self.hi()
    }

    pub fn substr(self, src: &str) -> &str {
        &src[self.lo..self.hi()]
    }

    pub fn wrap<T>(self, inner: T) -> Spanned<T> {
        Spanned { span: self, inner }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({self}, len: {})", self.len)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lo = self.lo;
        let hi = self.hi();
        write!(f, "{lo}..{hi}")
    }
}

/// Some value paired with the source region it originated from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub inner: T,
}

/// With the alternate flag (`{:#}`), the span is printed before the value.
impl<T: fmt::Display> fmt::Display for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "{}: ", self.span)?;
        }
        write!(f, "{}", self.inner)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Break,
    Case,
    Catch,
    Const,
    Continue,
    Default,
    Delete,
    Elif,
    Else,
    EndFor,
    EndFunction,
    EndIf,
    EndWhile,
    Export,
    For,
    Function,
    If,
    Import,
    In,
    Let,
    Return,
    Switch,
    Try,
    While,

    True,
    False,
    Null,
    This,

    LParen,
    RParen,
    LBrack,
    RBrack,
    LBrace,
    RBrace,
    Semicolon,
    Comma,
    Colon,
    Question,
    Dot,
    /// `...`
    Ellipsis,
    /// `=>`
    Arrow,
    /// `?.`
    QDot,
    /// `?.(`
    QLParen,
    /// `?.[`
    QLBrack,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,
    PlusPlus,
    MinusMinus,
    Bang,
    Tilde,
    Amp,
    Pipe,
    Caret,
    Shl,
    Shr,
    AndAnd,
    OrOr,
    /// `??`
    Nullish,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,

    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    StarStarAssign,
    AmpAssign,
    PipeAssign,
    CaretAssign,
    ShlAssign,
    ShrAssign,
    AndAndAssign,
    OrOrAssign,
    NullishAssign,

    /// Identifiers, and keywords when lexing in raw mode.
    Label,
    /// Integer literal, in any radix.
    Number,
    Double,
    String,
    Template,
    Regexp,

    Eof,
    Error(LexError),
}

impl TokenKind {
    pub fn is_error(self) -> bool {
        matches!(self, TokenKind::Error(_))
    }

    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Break
                | Case
                | Catch
                | Const
                | Continue
                | Default
                | Delete
                | Elif
                | Else
                | EndFor
                | EndFunction
                | EndIf
                | EndWhile
                | Export
                | For
                | Function
                | If
                | Import
                | In
                | Let
                | Return
                | Switch
                | Try
                | While
                | True
                | False
                | Null
                | This
        )
    }

    /// Whether a token of this kind may be the last token of an expression.
    /// A `/` following such a token is a division, otherwise it opens a
    /// regular expression literal.
    pub fn ends_expression(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Label
                | Number
                | Double
                | String
                | Template
                | Regexp
                | RParen
                | RBrack
                | PlusPlus
                | MinusMinus
                | True
                | False
                | Null
                | This
        )
    }

    /// The source form of fixed tokens. `None` for literals, labels and
    /// control tokens.
    pub fn lexeme(self) -> Option<&'static str> {
        use TokenKind::*;
        let s = match self {
            Break => "break",
            Case => "case",
            Catch => "catch",
            Const => "const",
            Continue => "continue",
            Default => "default",
            Delete => "delete",
            Elif => "elif",
            Else => "else",
            EndFor => "endfor",
            EndFunction => "endfunction",
            EndIf => "endif",
            EndWhile => "endwhile",
            Export => "export",
            For => "for",
            Function => "function",
            If => "if",
            Import => "import",
            In => "in",
            Let => "let",
            Return => "return",
            Switch => "switch",
            Try => "try",
            While => "while",
            True => "true",
            False => "false",
            Null => "null",
            This => "this",
            LParen => "(",
            RParen => ")",
            LBrack => "[",
            RBrack => "]",
            LBrace => "{",
            RBrace => "}",
            Semicolon => ";",
            Comma => ",",
            Colon => ":",
            Question => "?",
            Dot => ".",
            Ellipsis => "...",
            Arrow => "=>",
            QDot => "?.",
            QLParen => "?.(",
            QLBrack => "?.[",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Percent => "%",
            StarStar => "**",
            PlusPlus => "++",
            MinusMinus => "--",
            Bang => "!",
            Tilde => "~",
            Amp => "&",
            Pipe => "|",
            Caret => "^",
            Shl => "<<",
            Shr => ">>",
            AndAnd => "&&",
            OrOr => "||",
            Nullish => "??",
            EqEq => "==",
            NotEq => "!=",
            EqEqEq => "===",
            NotEqEq => "!==",
            Less => "<",
            LessEq => "<=",
            Greater => ">",
            GreaterEq => ">=",
            Assign => "=",
            PlusAssign => "+=",
            MinusAssign => "-=",
            StarAssign => "*=",
            SlashAssign => "/=",
            PercentAssign => "%=",
            StarStarAssign => "**=",
            AmpAssign => "&=",
            PipeAssign => "|=",
            CaretAssign => "^=",
            ShlAssign => "<<=",
            ShrAssign => ">>=",
            AndAndAssign => "&&=",
            OrOrAssign => "||=",
            NullishAssign => "??=",
            Label | Number | Double | String | Template | Regexp | Eof | Error(_) => {
                return None;
            }
        };
        Some(s)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(lexeme) = self.lexeme() {
            return write!(f, "'{lexeme}'");
        }
        match self {
            TokenKind::Label => write!(f, "identifier"),
            TokenKind::Number => write!(f, "integer literal"),
            TokenKind::Double => write!(f, "double literal"),
            TokenKind::String => write!(f, "string literal"),
            TokenKind::Template => write!(f, "template literal"),
            TokenKind::Regexp => write!(f, "regular expression"),
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::Error(_) => write!(f, "invalid token"),
            _ => unreachable!("fixed tokens are handled above"),
        }
    }
}

/// Promotes bare words to keyword tokens. A pure function of the word.
pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "break" => TokenKind::Break,
    "case" => TokenKind::Case,
    "catch" => TokenKind::Catch,
    "const" => TokenKind::Const,
    "continue" => TokenKind::Continue,
    "default" => TokenKind::Default,
    "delete" => TokenKind::Delete,
    "elif" => TokenKind::Elif,
    "else" => TokenKind::Else,
    "endfor" => TokenKind::EndFor,
    "endfunction" => TokenKind::EndFunction,
    "endif" => TokenKind::EndIf,
    "endwhile" => TokenKind::EndWhile,
    "export" => TokenKind::Export,
    "for" => TokenKind::For,
    "function" => TokenKind::Function,
    "if" => TokenKind::If,
    "import" => TokenKind::Import,
    "in" => TokenKind::In,
    "let" => TokenKind::Let,
    "return" => TokenKind::Return,
    "switch" => TokenKind::Switch,
    "try" => TokenKind::Try,
    "while" => TokenKind::While,
    "true" => TokenKind::True,
    "false" => TokenKind::False,
    "null" => TokenKind::Null,
    "this" => TokenKind::This,
};
