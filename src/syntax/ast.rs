//! Typed wrappers over the untyped rowan tree.

use smol_str::SmolStr;

use super::kind::{SyntaxKind, SyntaxNode, SyntaxToken};
use crate::base::TextRange;

use SyntaxKind::*;

/// A typed view of a syntax node of one particular kind.
pub trait AstNode: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;

    fn cast(syntax: SyntaxNode) -> Option<Self>;

    fn syntax(&self) -> &SyntaxNode;

    fn text_range(&self) -> TextRange {
        self.syntax().text_range()
    }
}

macro_rules! ast_node {
    ($name:ident, $kind:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            syntax: SyntaxNode,
        }

        impl AstNode for $name {
            fn can_cast(kind: SyntaxKind) -> bool {
                kind == $kind
            }

            fn cast(syntax: SyntaxNode) -> Option<Self> {
                Self::can_cast(syntax.kind()).then_some(Self { syntax })
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.syntax
            }
        }
    };
}

ast_node!(SourceFile, SOURCE_FILE);
ast_node!(PackageClause, PACKAGE_CLAUSE);
ast_node!(ImportDecl, IMPORT_DECL);
ast_node!(ImportSpec, IMPORT_SPEC);

impl SourceFile {
    pub(crate) fn from_root(syntax: SyntaxNode) -> Self {
        debug_assert_eq!(syntax.kind(), SOURCE_FILE);
        Self { syntax }
    }

    pub fn package_clause(&self) -> Option<PackageClause> {
        self.syntax.children().find_map(PackageClause::cast)
    }

    pub fn package_name(&self) -> Option<SmolStr> {
        self.package_clause()?.name().map(|t| SmolStr::new(t.text()))
    }

    pub fn import_decls(&self) -> impl Iterator<Item = ImportDecl> + '_ {
        self.syntax.children().filter_map(ImportDecl::cast)
    }

    /// All import specs of the file, in source order.
    pub fn import_specs(&self) -> impl Iterator<Item = ImportSpec> + '_ {
        self.import_decls().flat_map(|decl| decl.specs().collect::<Vec<_>>())
    }

    /// Tokens outside the package clause and the import declarations,
    /// trivia included.
    pub fn top_level_tokens(&self) -> impl Iterator<Item = SyntaxToken> + '_ {
        self.syntax
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .filter(|token| token.kind() != UNPARSED)
    }
}

impl PackageClause {
    pub fn name(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .find(|token| token.kind() == IDENT)
    }
}

impl ImportDecl {
    pub fn specs(&self) -> impl Iterator<Item = ImportSpec> {
        self.syntax.children().filter_map(ImportSpec::cast)
    }

    pub fn is_parenthesized(&self) -> bool {
        self.syntax
            .children_with_tokens()
            .any(|element| element.kind() == L_PAREN)
    }

    /// Comments directly above the `import` keyword, with no blank line in
    /// between, outermost first.
    pub fn doc_comments(&self) -> Vec<SyntaxToken> {
        let mut docs = Vec::new();
        let mut prev = self.syntax.prev_sibling_or_token();
        while let Some(element) = prev {
            let Some(token) = element.as_token() else {
                break;
            };
            match token.kind() {
                WHITESPACE if token.text().matches('\n').count() <= 1 => {}
                LINE_COMMENT | BLOCK_COMMENT => {
                    // a comment trailing the previous line's code is not ours
                    let before = token.prev_sibling_or_token();
                    let starts_line = match &before {
                        None => true,
                        Some(b) => b.kind() == WHITESPACE && b.to_string().contains('\n'),
                    };
                    if !starts_line {
                        break;
                    }
                    docs.push(token.clone());
                }
                _ => break,
            }
            prev = element.prev_sibling_or_token();
        }
        docs.reverse();
        docs
    }
}

impl ImportSpec {
    /// The explicit local name: an identifier, `_` or `.`.
    pub fn alias(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .find(|token| matches!(token.kind(), IDENT | DOT))
    }

    pub fn alias_text(&self) -> Option<SmolStr> {
        self.alias().map(|t| SmolStr::new(t.text()))
    }

    pub fn path_token(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .find(|token| token.kind().is_string())
    }

    /// The unquoted import path.
    pub fn path(&self) -> Option<String> {
        let token = self.path_token()?;
        unquote(token.text())
    }
}

/// Decode a Go string literal. Only the escapes that can occur in import
/// paths are supported; anything else yields `None`.
pub fn unquote(literal: &str) -> Option<String> {
    if let Some(raw) = literal.strip_prefix('`') {
        return raw.strip_suffix('`').map(|s| s.replace('\r', ""));
    }
    let inner = literal.strip_prefix('"')?.strip_suffix('"')?;
    if !inner.contains('\\') {
        return Some(inner.to_string());
    }
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                out.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
            }
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                out.push(char::from(u8::from_str_radix(&hex, 16).ok()?));
            }
            _ => return None,
        }
    }
    Some(out)
}

/// Quote an import path as an interpreted string literal.
pub fn quote(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 2);
    out.push('"');
    for c in path.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
