/// Token definition for parsing
/// Each token stores its kind, start position (byte offset), and length
use std::fmt;

/// Token kinds - types of tokens without embedded data
/// Literals store only position information, not the actual value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Identifiers and literals
    Ident,
    Label,         // 'outer
    Num,           // 42, 0xff, 1_000u64
    ByteString,    // b"bytes"
    HexString,     // x"00ff"
    AddressPrefix, // @
    MacroName,     // assert!

    // Keywords
    Module,
    Use,
    Fun,
    Public,
    Entry,
    Native,
    Struct,
    Has,
    Const,
    Let,
    Mut,
    If,
    Else,
    While,
    Loop,
    Break,
    Continue,
    Return,
    Abort,
    As,
    True,
    False,

    // Operators
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Percent,      // %
    Amp,          // &
    AmpAmp,       // &&
    Pipe,         // |
    PipePipe,     // ||
    Caret,        // ^
    Bang,         // !
    BangEq,       // !=
    EqEq,         // ==
    EqEqGt,       // ==>
    LtEqEqGt,     // <==>
    Lt,           // <
    LtEq,         // <=
    Gt,           // >
    GtEq,         // >=
    Assign,       // =
    Arrow,        // ->
    DoubleDot,    // ..
    Dot,          // .
    Comma,        // ,
    Colon,        // :
    DoubleColon,  // ::
    SemiColon,    // ;
    Sharp,        // #

    // Brackets
    ParenBegin,   // (
    ParenEnd,     // )
    BracketBegin, // [
    BracketEnd,   // ]
    BlockBegin,   // {
    BlockEnd,     // }

    // Trivia (whitespace and comments)
    LineBreak,
    Whitespace,
    SingleLineComment,
    MultiLineComment,

    // Special
    Error, // Error token for recovery
    Eof,
}

impl TokenKind {
    /// Keywords that may still be used where an identifier is expected
    /// (field names, annotation names, module members).
    pub fn is_contextual_ident(self) -> bool {
        matches!(
            self,
            TokenKind::Ident | TokenKind::Has | TokenKind::Entry | TokenKind::Native
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenKind::Ident => write!(f, "identifier"),
            TokenKind::Label => write!(f, "label"),
            TokenKind::Num => write!(f, "number"),
            TokenKind::ByteString => write!(f, "byte_string"),
            TokenKind::HexString => write!(f, "hex_string"),
            TokenKind::AddressPrefix => write!(f, "@"),
            TokenKind::MacroName => write!(f, "macro_name"),
            TokenKind::Module => write!(f, "module"),
            TokenKind::Use => write!(f, "use"),
            TokenKind::Fun => write!(f, "fun"),
            TokenKind::Public => write!(f, "public"),
            TokenKind::Entry => write!(f, "entry"),
            TokenKind::Native => write!(f, "native"),
            TokenKind::Struct => write!(f, "struct"),
            TokenKind::Has => write!(f, "has"),
            TokenKind::Const => write!(f, "const"),
            TokenKind::Let => write!(f, "let"),
            TokenKind::Mut => write!(f, "mut"),
            TokenKind::If => write!(f, "if"),
            TokenKind::Else => write!(f, "else"),
            TokenKind::While => write!(f, "while"),
            TokenKind::Loop => write!(f, "loop"),
            TokenKind::Break => write!(f, "break"),
            TokenKind::Continue => write!(f, "continue"),
            TokenKind::Return => write!(f, "return"),
            TokenKind::Abort => write!(f, "abort"),
            TokenKind::As => write!(f, "as"),
            TokenKind::True => write!(f, "true"),
            TokenKind::False => write!(f, "false"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::Amp => write!(f, "&"),
            TokenKind::AmpAmp => write!(f, "&&"),
            TokenKind::Pipe => write!(f, "|"),
            TokenKind::PipePipe => write!(f, "||"),
            TokenKind::Caret => write!(f, "^"),
            TokenKind::Bang => write!(f, "!"),
            TokenKind::BangEq => write!(f, "!="),
            TokenKind::EqEq => write!(f, "=="),
            TokenKind::EqEqGt => write!(f, "==>"),
            TokenKind::LtEqEqGt => write!(f, "<==>"),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::LtEq => write!(f, "<="),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::GtEq => write!(f, ">="),
            TokenKind::Assign => write!(f, "="),
            TokenKind::Arrow => write!(f, "->"),
            TokenKind::DoubleDot => write!(f, ".."),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::DoubleColon => write!(f, "::"),
            TokenKind::SemiColon => write!(f, ";"),
            TokenKind::Sharp => write!(f, "#"),
            TokenKind::ParenBegin => write!(f, "("),
            TokenKind::ParenEnd => write!(f, ")"),
            TokenKind::BracketBegin => write!(f, "["),
            TokenKind::BracketEnd => write!(f, "]"),
            TokenKind::BlockBegin => write!(f, "{{"),
            TokenKind::BlockEnd => write!(f, "}}"),
            TokenKind::LineBreak => write!(f, "linebreak"),
            TokenKind::Whitespace => write!(f, "whitespace"),
            TokenKind::SingleLineComment => write!(f, "single_line_comment"),
            TokenKind::MultiLineComment => write!(f, "multi_line_comment"),
            TokenKind::Error => write!(f, "error"),
            TokenKind::Eof => write!(f, "eof"),
        }
    }
}

/// A token with position information
/// The actual value can be retrieved from the source text using start and length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,  // byte offset in source
    pub length: usize, // length in bytes
}

impl Token {
    pub fn new(kind: TokenKind, start: usize, length: usize) -> Self {
        Self {
            kind,
            start,
            length,
        }
    }

    /// Get the end position of this token
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Get the text of this token from the source
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end()]
    }

    /// Check if this token is trivia (whitespace or comment)
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::LineBreak
                | TokenKind::Whitespace
                | TokenKind::SingleLineComment
                | TokenKind::MultiLineComment
        )
    }

    /// Check if this token is a comment
    pub fn is_comment(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::SingleLineComment | TokenKind::MultiLineComment
        )
    }

    /// Check if this token is an error token
    pub fn is_error(&self) -> bool {
        self.kind == TokenKind::Error
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}:{}", self.kind, self.start, self.length)
    }
}
