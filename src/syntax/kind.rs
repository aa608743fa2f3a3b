//! Syntax kinds shared by the lexer, the green tree and the typed AST.

/// Every token and node kind of the Go concrete syntax tree.
///
/// Tokens outside the package clause and the import declarations are kept
/// flat under [`SyntaxKind::SOURCE_FILE`]; only the parts the import fixer
/// rewrites get their own nodes.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    // trivia
    WHITESPACE = 0,
    LINE_COMMENT,
    BLOCK_COMMENT,

    // literals and names
    IDENT,
    NUMBER,
    STRING,
    RAW_STRING,
    RUNE,

    // keywords
    BREAK_KW,
    CASE_KW,
    CHAN_KW,
    CONST_KW,
    CONTINUE_KW,
    DEFAULT_KW,
    DEFER_KW,
    ELSE_KW,
    FALLTHROUGH_KW,
    FOR_KW,
    FUNC_KW,
    GO_KW,
    GOTO_KW,
    IF_KW,
    IMPORT_KW,
    INTERFACE_KW,
    MAP_KW,
    PACKAGE_KW,
    RANGE_KW,
    RETURN_KW,
    SELECT_KW,
    STRUCT_KW,
    SWITCH_KW,
    TYPE_KW,
    VAR_KW,

    // punctuation
    L_PAREN,
    R_PAREN,
    L_BRACK,
    R_BRACK,
    L_CURLY,
    R_CURLY,
    COMMA,
    SEMICOLON,
    DOT,
    ELLIPSIS,
    COLON,
    DEFINE,
    ASSIGN,
    INC,
    DEC,
    OPERATOR,

    /// Source text left untokenized by a partial parse mode.
    UNPARSED,

    // nodes
    SOURCE_FILE,
    PACKAGE_CLAUSE,
    IMPORT_DECL,
    IMPORT_SPEC,
}

use SyntaxKind::*;

impl SyntaxKind {
    const ALL: [SyntaxKind; IMPORT_SPEC as usize + 1] = [
        WHITESPACE,
        LINE_COMMENT,
        BLOCK_COMMENT,
        IDENT,
        NUMBER,
        STRING,
        RAW_STRING,
        RUNE,
        BREAK_KW,
        CASE_KW,
        CHAN_KW,
        CONST_KW,
        CONTINUE_KW,
        DEFAULT_KW,
        DEFER_KW,
        ELSE_KW,
        FALLTHROUGH_KW,
        FOR_KW,
        FUNC_KW,
        GO_KW,
        GOTO_KW,
        IF_KW,
        IMPORT_KW,
        INTERFACE_KW,
        MAP_KW,
        PACKAGE_KW,
        RANGE_KW,
        RETURN_KW,
        SELECT_KW,
        STRUCT_KW,
        SWITCH_KW,
        TYPE_KW,
        VAR_KW,
        L_PAREN,
        R_PAREN,
        L_BRACK,
        R_BRACK,
        L_CURLY,
        R_CURLY,
        COMMA,
        SEMICOLON,
        DOT,
        ELLIPSIS,
        COLON,
        DEFINE,
        ASSIGN,
        INC,
        DEC,
        OPERATOR,
        UNPARSED,
        SOURCE_FILE,
        PACKAGE_CLAUSE,
        IMPORT_DECL,
        IMPORT_SPEC,
    ];

    /// Whitespace and comments.
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(self, WHITESPACE | LINE_COMMENT | BLOCK_COMMENT)
    }

    #[inline]
    pub fn is_comment(self) -> bool {
        matches!(self, LINE_COMMENT | BLOCK_COMMENT)
    }

    #[inline]
    pub fn is_string(self) -> bool {
        matches!(self, STRING | RAW_STRING)
    }

    #[inline]
    pub fn is_opening_bracket(self) -> bool {
        matches!(self, L_PAREN | L_BRACK | L_CURLY)
    }

    #[inline]
    pub fn is_closing_bracket(self) -> bool {
        matches!(self, R_PAREN | R_BRACK | R_CURLY)
    }

    /// The closing bracket matching an opening one.
    pub fn closing(self) -> Option<SyntaxKind> {
        match self {
            L_PAREN => Some(R_PAREN),
            L_BRACK => Some(R_BRACK),
            L_CURLY => Some(R_CURLY),
            _ => None,
        }
    }

    /// Whether a line break after a token of this kind terminates the
    /// statement (Go's automatic semicolon insertion rule).
    pub fn ends_statement(self) -> bool {
        matches!(
            self,
            IDENT
                | NUMBER
                | STRING
                | RAW_STRING
                | RUNE
                | BREAK_KW
                | CONTINUE_KW
                | FALLTHROUGH_KW
                | RETURN_KW
                | INC
                | DEC
                | R_PAREN
                | R_BRACK
                | R_CURLY
        )
    }

    fn from_raw(raw: u16) -> SyntaxKind {
        Self::ALL[raw as usize]
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Marker type tying rowan's untyped trees to [`SyntaxKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GoLanguage {}

impl rowan::Language for GoLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> SyntaxKind {
        SyntaxKind::from_raw(raw.0)
    }

    fn kind_to_raw(kind: SyntaxKind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type SyntaxNode = rowan::SyntaxNode<GoLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<GoLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<GoLanguage>;
