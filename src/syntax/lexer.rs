//! Go tokenizer built on `logos`.
//!
//! The lexer is lossless: whitespace and comments are tokens too, so the
//! concatenated token texts always reproduce the input.

use logos::Logos;

use super::kind::SyntaxKind;
use crate::base::{TextRange, TextSize};

/// A lexed token borrowing its text from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'t> {
    pub kind: SyntaxKind,
    pub text: &'t str,
    pub range: TextRange,
}

/// A byte sequence that is not a Go token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub offset: TextSize,
    pub message: String,
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawToken {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,
    #[token("//", line_comment)]
    LineComment,
    #[token("/*", block_comment)]
    BlockComment,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", ident_tail)]
    Ident,
    #[regex(r"[^\x00-\x7F]", unicode_ident)]
    UnicodeIdent,
    #[regex(r"[0-9][0-9A-Za-z_]*(\.[0-9A-Za-z_]*)?")]
    #[regex(r"\.[0-9][0-9A-Za-z_]*")]
    Number,
    #[token("\"", interpreted_string)]
    String,
    #[token("`", raw_string)]
    RawString,
    #[token("'", rune)]
    Rune,

    #[token("break")]
    Break,
    #[token("case")]
    Case,
    #[token("chan")]
    Chan,
    #[token("const")]
    Const,
    #[token("continue")]
    Continue,
    #[token("default")]
    Default,
    #[token("defer")]
    Defer,
    #[token("else")]
    Else,
    #[token("fallthrough")]
    Fallthrough,
    #[token("for")]
    For,
    #[token("func")]
    Func,
    #[token("go")]
    Go,
    #[token("goto")]
    Goto,
    #[token("if")]
    If,
    #[token("import")]
    Import,
    #[token("interface")]
    Interface,
    #[token("map")]
    Map,
    #[token("package")]
    Package,
    #[token("range")]
    Range,
    #[token("return")]
    Return,
    #[token("select")]
    Select,
    #[token("struct")]
    Struct,
    #[token("switch")]
    Switch,
    #[token("type")]
    Type,
    #[token("var")]
    Var,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBrack,
    #[token("]")]
    RBrack,
    #[token("{")]
    LCurly,
    #[token("}")]
    RCurly,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token(":")]
    Colon,
    #[token(":=")]
    Define,
    #[token("=")]
    Assign,
    #[token("++")]
    Inc,
    #[token("--")]
    Dec,
    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("/")]
    #[token("%")]
    #[token("&")]
    #[token("|")]
    #[token("^")]
    #[token("<<")]
    #[token(">>")]
    #[token("&^")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("%=")]
    #[token("&=")]
    #[token("|=")]
    #[token("^=")]
    #[token("<<=")]
    #[token(">>=")]
    #[token("&^=")]
    #[token("&&")]
    #[token("||")]
    #[token("<-")]
    #[token("==")]
    #[token("!=")]
    #[token("<")]
    #[token("<=")]
    #[token(">")]
    #[token(">=")]
    #[token("!")]
    #[token("~")]
    Operator,
}

impl RawToken {
    fn kind(self) -> SyntaxKind {
        use SyntaxKind::*;
        match self {
            RawToken::Whitespace => WHITESPACE,
            RawToken::LineComment => LINE_COMMENT,
            RawToken::BlockComment => BLOCK_COMMENT,
            RawToken::Ident | RawToken::UnicodeIdent => IDENT,
            RawToken::Number => NUMBER,
            RawToken::String => STRING,
            RawToken::RawString => RAW_STRING,
            RawToken::Rune => RUNE,
            RawToken::Break => BREAK_KW,
            RawToken::Case => CASE_KW,
            RawToken::Chan => CHAN_KW,
            RawToken::Const => CONST_KW,
            RawToken::Continue => CONTINUE_KW,
            RawToken::Default => DEFAULT_KW,
            RawToken::Defer => DEFER_KW,
            RawToken::Else => ELSE_KW,
            RawToken::Fallthrough => FALLTHROUGH_KW,
            RawToken::For => FOR_KW,
            RawToken::Func => FUNC_KW,
            RawToken::Go => GO_KW,
            RawToken::Goto => GOTO_KW,
            RawToken::If => IF_KW,
            RawToken::Import => IMPORT_KW,
            RawToken::Interface => INTERFACE_KW,
            RawToken::Map => MAP_KW,
            RawToken::Package => PACKAGE_KW,
            RawToken::Range => RANGE_KW,
            RawToken::Return => RETURN_KW,
            RawToken::Select => SELECT_KW,
            RawToken::Struct => STRUCT_KW,
            RawToken::Switch => SWITCH_KW,
            RawToken::Type => TYPE_KW,
            RawToken::Var => VAR_KW,
            RawToken::LParen => L_PAREN,
            RawToken::RParen => R_PAREN,
            RawToken::LBrack => L_BRACK,
            RawToken::RBrack => R_BRACK,
            RawToken::LCurly => L_CURLY,
            RawToken::RCurly => R_CURLY,
            RawToken::Comma => COMMA,
            RawToken::Semicolon => SEMICOLON,
            RawToken::Dot => DOT,
            RawToken::Ellipsis => ELLIPSIS,
            RawToken::Colon => COLON,
            RawToken::Define => DEFINE,
            RawToken::Assign => ASSIGN,
            RawToken::Inc => INC,
            RawToken::Dec => DEC,
            RawToken::Operator => OPERATOR,
        }
    }
}

/// Whether `c` may continue a Go identifier.
pub fn is_ident_continue(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_continue(c)
}

/// Whether `c` may start a Go identifier.
pub fn is_ident_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

/// Whether `s` is a non-empty Go identifier.
pub fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_continue)
}

fn ident_tail(lex: &mut logos::Lexer<RawToken>) {
    let tail: usize = lex
        .remainder()
        .chars()
        .take_while(|&c| is_ident_continue(c))
        .map(char::len_utf8)
        .sum();
    lex.bump(tail);
}

fn unicode_ident(lex: &mut logos::Lexer<RawToken>) -> bool {
    if !lex.slice().chars().next().is_some_and(is_ident_start) {
        return false;
    }
    ident_tail(lex);
    true
}

fn line_comment(lex: &mut logos::Lexer<RawToken>) {
    let rest = lex.remainder();
    lex.bump(rest.find('\n').unwrap_or(rest.len()));
}

fn block_comment(lex: &mut logos::Lexer<RawToken>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => false,
    }
}

/// Consumes a quoted literal body up to `quote`; escapes are skipped and a
/// line break ends the literal unsuccessfully.
fn quoted(lex: &mut logos::Lexer<RawToken>, quote: u8) -> bool {
    let bytes = lex.remainder().as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return false,
            b if b == quote => {
                lex.bump(i + 1);
                return true;
            }
            _ => i += 1,
        }
    }
    false
}

fn interpreted_string(lex: &mut logos::Lexer<RawToken>) -> bool {
    quoted(lex, b'"')
}

fn rune(lex: &mut logos::Lexer<RawToken>) -> bool {
    quoted(lex, b'\'')
}

fn raw_string(lex: &mut logos::Lexer<RawToken>) -> bool {
    match lex.remainder().find('`') {
        Some(end) => {
            lex.bump(end + 1);
            true
        }
        None => false,
    }
}

/// Streaming tokenizer over a Go source text.
///
/// Tokens are produced on demand so partial parses (package clause only,
/// imports only) never look at the rest of the file.
pub struct Lexer<'t> {
    inner: logos::Lexer<'t, RawToken>,
}

impl<'t> Lexer<'t> {
    pub fn new(text: &'t str) -> Self {
        Self {
            inner: RawToken::lexer(text),
        }
    }
}

impl<'t> Iterator for Lexer<'t> {
    type Item = Result<Token<'t>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.inner.next()?;
        let span = self.inner.span();
        let range = TextRange::new(
            TextSize::from(span.start as u32),
            TextSize::from(span.end as u32),
        );
        let text = self.inner.slice();
        Some(match raw {
            Ok(raw) => Ok(Token {
                kind: raw.kind(),
                text,
                range,
            }),
            Err(()) => Err(LexError {
                offset: range.start(),
                message: describe_error(text),
            }),
        })
    }
}

fn describe_error(text: &str) -> String {
    match text.chars().next() {
        Some('"') => "string literal not terminated".to_string(),
        Some('`') => "raw string literal not terminated".to_string(),
        Some('\'') => "rune literal not terminated".to_string(),
        Some('/') if text.starts_with("/*") => "comment not terminated".to_string(),
        Some(c) => format!("invalid character {c:?}"),
        None => "unexpected end of input".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SyntaxKind::*;

    fn tokenize(text: &str) -> Result<Vec<Token<'_>>, LexError> {
        Lexer::new(text).collect()
    }

    fn kinds(text: &str) -> Vec<SyntaxKind> {
        tokenize(text)
            .unwrap()
            .into_iter()
            .filter(|t| !t.kind.is_trivia())
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("package main\nfunc funcName() {}"),
            vec![PACKAGE_KW, IDENT, FUNC_KW, IDENT, L_PAREN, R_PAREN, L_CURLY, R_CURLY]
        );
    }

    #[test]
    fn test_lossless() {
        let text = "package p // trailing\n\n/* block\n comment */\nvar s = `raw\nstring` + \"q\\\"x\"\n";
        let joined: String = tokenize(text).unwrap().iter().map(|t| t.text).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn test_selector_and_define() {
        assert_eq!(
            kinds("x := fmt.Sprintf(\"%d\", 1.5)"),
            vec![IDENT, DEFINE, IDENT, DOT, IDENT, L_PAREN, STRING, COMMA, NUMBER, R_PAREN]
        );
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(
            kinds("a &^= b <- c ... d++"),
            vec![IDENT, OPERATOR, IDENT, OPERATOR, IDENT, ELLIPSIS, IDENT, INC]
        );
    }

    #[test]
    fn test_unicode_identifier() {
        let tokens = tokenize("héllo := ñandú").unwrap();
        let idents: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == IDENT)
            .map(|t| t.text)
            .collect();
        assert_eq!(idents, vec!["héllo", "ñandú"]);
    }

    #[test]
    fn test_rune_with_escaped_quote() {
        assert_eq!(kinds(r"c := '\''"), vec![IDENT, DEFINE, RUNE]);
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("x := \"abc\ny").unwrap_err();
        assert_eq!(err.offset, TextSize::from(5));
        assert_eq!(err.message, "string literal not terminated");
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = tokenize("package p /* never closed").unwrap_err();
        assert_eq!(err.message, "comment not terminated");
    }

    #[test]
    fn test_is_ident() {
        assert!(is_ident("fmt"));
        assert!(is_ident("_"));
        assert!(is_ident("ñ1"));
        assert!(!is_ident("go-yaml"));
        assert!(!is_ident("1x"));
        assert!(!is_ident(""));
    }
}
