//! Recursive-descent parser producing a lossless rowan tree.
//!
//! Only the package clause and the import declarations get structure. The
//! rest of the file is kept as flat tokens (or as a single
//! [`SyntaxKind::UNPARSED`] token in the partial modes), which is all the
//! import fixer needs while still reproducing every byte of the input.

use std::collections::VecDeque;
use std::fmt;

use rowan::{GreenNode, GreenNodeBuilder};

use super::ast::SourceFile;
use super::kind::{SyntaxKind, SyntaxNode};
use super::lexer::{LexError, Lexer, Token};
use crate::base::TextSize;

use SyntaxKind::*;

/// How much of a file to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Stop after the package clause. Used when indexing candidate packages.
    PackageClause,
    /// Stop after the import declarations. Used for sibling files.
    ImportsOnly,
    /// Lex the whole file and check bracket balance. Used for the target.
    Full,
}

/// A syntax error with the byte offset it was detected at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub offset: TextSize,
    pub message: String,
}

impl ParseError {
    fn new(offset: TextSize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.message, u32::from(self.offset))
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        Self::new(err.offset, err.message)
    }
}

/// The result of a successful parse.
#[derive(Debug, Clone)]
pub struct Parse {
    green: GreenNode,
}

impl Parse {
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn tree(&self) -> SourceFile {
        SourceFile::from_root(self.syntax())
    }
}

/// Parse `text` as a Go source file.
pub fn parse(text: &str, mode: ParseMode) -> Result<Parse, ParseError> {
    let mut parser = Parser::new(text);
    parser.source_file(mode)?;
    Ok(Parse {
        green: parser.builder.finish(),
    })
}

type Lexed<'t> = Result<Token<'t>, LexError>;

struct Parser<'t> {
    text: &'t str,
    lexer: Lexer<'t>,
    lookahead: VecDeque<Lexed<'t>>,
    builder: GreenNodeBuilder<'static>,
    /// End of the last token added to the tree.
    pos: TextSize,
}

impl<'t> Parser<'t> {
    fn new(text: &'t str) -> Self {
        Self {
            text,
            lexer: Lexer::new(text),
            lookahead: VecDeque::new(),
            builder: GreenNodeBuilder::new(),
            pos: TextSize::from(0),
        }
    }

    // ------------------------------------------------------------------
    // token stream
    // ------------------------------------------------------------------

    fn fill(&mut self, n: usize) {
        while self.lookahead.len() <= n {
            match self.lexer.next() {
                Some(token) => self.lookahead.push_back(token),
                None => break,
            }
        }
    }

    /// The `n`th upcoming token. A lexer error surfaces only once the
    /// parser actually reaches it.
    fn nth(&mut self, n: usize) -> Result<Option<Token<'t>>, ParseError> {
        self.fill(n);
        match self.lookahead.get(n) {
            Some(Ok(token)) => Ok(Some(*token)),
            Some(Err(err)) => Err(err.clone().into()),
            None => Ok(None),
        }
    }

    fn current(&mut self) -> Result<Option<Token<'t>>, ParseError> {
        self.nth(0)
    }

    fn current_kind(&mut self) -> Result<Option<SyntaxKind>, ParseError> {
        Ok(self.current()?.map(|t| t.kind))
    }

    fn bump(&mut self) -> Result<(), ParseError> {
        if let Some(token) = self.current()? {
            self.builder.token(token.kind.into(), token.text);
            self.pos = token.range.end();
            self.lookahead.pop_front();
        }
        Ok(())
    }

    fn bump_trivia(&mut self) -> Result<(), ParseError> {
        while let Some(kind) = self.current_kind()? {
            if !kind.is_trivia() {
                break;
            }
            self.bump()?;
        }
        Ok(())
    }

    /// Consume comments that close the current line, with the whitespace
    /// before them. Stops before anything that starts a new line.
    fn bump_same_line_comments(&mut self) -> Result<(), ParseError> {
        loop {
            let Some(token) = self.current()? else {
                return Ok(());
            };
            match token.kind {
                WHITESPACE if !token.text.contains('\n') => {
                    let next_is_comment = matches!(
                        self.nth(1)?,
                        Some(next) if next.kind.is_comment() && !next.text.contains('\n')
                    );
                    if !next_is_comment {
                        return Ok(());
                    }
                }
                LINE_COMMENT => {}
                BLOCK_COMMENT if !token.text.contains('\n') => {}
                _ => return Ok(()),
            }
            self.bump()?;
        }
    }

    fn offset(&mut self) -> Result<TextSize, ParseError> {
        Ok(match self.current()? {
            Some(token) => token.range.start(),
            None => TextSize::of(self.text),
        })
    }

    fn error_here(&mut self, message: impl Into<String>) -> ParseError {
        match self.offset() {
            Ok(offset) => ParseError::new(offset, message),
            Err(err) => err,
        }
    }

    fn describe_current(&mut self) -> String {
        match self.current() {
            Ok(Some(token)) if token.kind == WHITESPACE => "newline".to_string(),
            Ok(Some(token)) => format!("'{}'", token.text),
            Ok(None) => "EOF".to_string(),
            Err(err) => err.message,
        }
    }

    /// Everything from the current position on becomes one opaque token.
    fn rest_unparsed(&mut self) {
        let start = usize::from(self.pos);
        if start < self.text.len() {
            self.builder.token(UNPARSED.into(), &self.text[start..]);
        }
        self.lookahead.clear();
    }

    // ------------------------------------------------------------------
    // grammar
    // ------------------------------------------------------------------

    fn source_file(&mut self, mode: ParseMode) -> Result<(), ParseError> {
        self.builder.start_node(SOURCE_FILE.into());
        self.bump_trivia()?;
        self.package_clause()?;

        if mode == ParseMode::PackageClause {
            self.rest_unparsed();
            self.builder.finish_node();
            return Ok(());
        }

        loop {
            self.bump_trivia()?;
            match self.current_kind()? {
                Some(SEMICOLON) => self.bump()?,
                Some(IMPORT_KW) => self.import_decl()?,
                _ => break,
            }
        }

        match mode {
            ParseMode::ImportsOnly => self.rest_unparsed(),
            _ => self.body()?,
        }
        self.builder.finish_node();
        Ok(())
    }

    fn package_clause(&mut self) -> Result<(), ParseError> {
        if self.current_kind()? != Some(PACKAGE_KW) {
            let found = self.describe_current();
            return Err(self.error_here(format!("expected 'package', found {found}")));
        }
        self.builder.start_node(PACKAGE_CLAUSE.into());
        self.bump()?;
        self.bump_trivia()?;
        match self.current()? {
            Some(token) if token.kind == IDENT && token.text == "_" => {
                return Err(self.error_here("invalid package name _"));
            }
            Some(token) if token.kind == IDENT => self.bump()?,
            _ => {
                let found = self.describe_current();
                return Err(self.error_here(format!("expected package name, found {found}")));
            }
        }
        self.builder.finish_node();
        Ok(())
    }

    fn import_decl(&mut self) -> Result<(), ParseError> {
        self.builder.start_node(IMPORT_DECL.into());
        self.bump()?;
        self.bump_trivia()?;

        if self.current_kind()? == Some(L_PAREN) {
            self.bump()?;
            loop {
                self.bump_trivia()?;
                match self.current_kind()? {
                    Some(R_PAREN) => {
                        self.bump()?;
                        break;
                    }
                    Some(SEMICOLON) => self.bump()?,
                    None => return Err(self.error_here("expected ')', found EOF")),
                    Some(_) => self.import_spec()?,
                }
            }
        } else {
            self.import_spec()?;
            self.bump_same_line_comments()?;
        }

        self.builder.finish_node();
        Ok(())
    }

    fn import_spec(&mut self) -> Result<(), ParseError> {
        self.builder.start_node(IMPORT_SPEC.into());
        if matches!(self.current_kind()?, Some(IDENT | DOT)) {
            self.bump()?;
            while self.current_kind()? == Some(WHITESPACE) {
                if self.current()?.is_some_and(|t| t.text.contains('\n')) {
                    return Err(self.error_here("expected import path, found newline"));
                }
                self.bump()?;
            }
        }
        if !matches!(self.current_kind()?, Some(STRING | RAW_STRING)) {
            let found = self.describe_current();
            return Err(self.error_here(format!("expected import path, found {found}")));
        }
        self.bump()?;
        self.builder.finish_node();
        Ok(())
    }

    /// Declarations after the imports, kept flat. Brackets must balance and
    /// no further import may appear.
    fn body(&mut self) -> Result<(), ParseError> {
        let mut open: Vec<(SyntaxKind, TextSize)> = Vec::new();
        while let Some(token) = self.current()? {
            match token.kind {
                IMPORT_KW if open.is_empty() => {
                    return Err(ParseError::new(
                        token.range.start(),
                        "imports must appear before other declarations",
                    ));
                }
                kind if kind.is_opening_bracket() => open.push((kind, token.range.start())),
                kind if kind.is_closing_bracket() => match open.pop() {
                    Some((opening, _)) if opening.closing() == Some(kind) => {}
                    _ => {
                        return Err(ParseError::new(
                            token.range.start(),
                            format!("unexpected '{}'", token.text),
                        ));
                    }
                },
                _ => {}
            }
            self.bump()?;
        }
        if let Some((_, offset)) = open.pop() {
            return Err(ParseError::new(offset, "unclosed bracket at end of file"));
        }
        Ok(())
    }
}
