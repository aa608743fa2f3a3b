//! Canonical rendering of import declarations.
//!
//! An [`ImportBlock`] is an editable model of one `import` declaration:
//! specs with their comments, free comments and blank-line separators.
//! Rendering follows gofmt: tab indentation, one spec per line, each run of
//! consecutive specs sorted by path.

use smol_str::SmolStr;

use super::ast::{AstNode, ImportDecl, ImportSpec, quote};
use super::kind::SyntaxKind;
use crate::base::TextRange;

/// One import spec together with the comments that travel with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecLine {
    /// Comments on the lines directly above the spec.
    pub leading: Vec<String>,
    pub alias: Option<SmolStr>,
    pub path: String,
    /// The path as written, quotes included.
    pub path_literal: String,
    /// Comment after the spec on the same line.
    pub trailing: Option<String>,
    /// Source range of an existing spec; `None` for a new one.
    pub range: Option<TextRange>,
}

impl SpecLine {
    /// A spec that does not exist in the source yet.
    pub fn new(path: impl Into<String>, alias: Option<SmolStr>) -> Self {
        let path = path.into();
        Self {
            leading: Vec::new(),
            alias,
            path_literal: quote(&path),
            path,
            trailing: None,
            range: None,
        }
    }

    fn render(&self, indent: &str, out: &mut String) {
        for comment in &self.leading {
            out.push_str(indent);
            out.push_str(comment);
            out.push('\n');
        }
        out.push_str(indent);
        if let Some(alias) = &self.alias {
            out.push_str(alias);
            out.push(' ');
        }
        out.push_str(&self.path_literal);
        if let Some(trailing) = &self.trailing {
            out.push(' ');
            out.push_str(trailing);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockItem {
    Spec(SpecLine),
    /// A comment inside the parentheses not attached to any spec.
    Comment(String),
    Blank,
}

/// Editable model of one import declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportBlock {
    pub parenthesized: bool,
    pub items: Vec<BlockItem>,
}

impl ImportBlock {
    /// A fresh declaration holding `specs`.
    pub fn with_specs(specs: impl IntoIterator<Item = SpecLine>) -> Self {
        let items: Vec<_> = specs.into_iter().map(BlockItem::Spec).collect();
        Self {
            parenthesized: items.len() > 1,
            items,
        }
    }

    /// Build the model of an existing declaration.
    pub fn from_decl(decl: &ImportDecl) -> Self {
        let mut block = Self {
            parenthesized: decl.is_parenthesized(),
            items: Vec::new(),
        };
        let mut pending: Vec<String> = Vec::new();
        // true while nothing but a spec has been seen on the current line
        let mut after_spec = false;

        for element in decl.syntax().children_with_tokens() {
            match element.kind() {
                SyntaxKind::IMPORT_SPEC => {
                    let Some(spec) = element.into_node().and_then(ImportSpec::cast) else {
                        continue;
                    };
                    let (Some(path_token), Some(path)) = (spec.path_token(), spec.path()) else {
                        continue;
                    };
                    block.items.push(BlockItem::Spec(SpecLine {
                        leading: std::mem::take(&mut pending),
                        alias: spec.alias_text(),
                        path,
                        path_literal: path_token.text().to_string(),
                        trailing: None,
                        range: Some(spec.text_range()),
                    }));
                    after_spec = true;
                }
                SyntaxKind::LINE_COMMENT | SyntaxKind::BLOCK_COMMENT => {
                    let text = element.to_string();
                    match block.items.last_mut() {
                        Some(BlockItem::Spec(spec)) if after_spec => {
                            spec.trailing = Some(match spec.trailing.take() {
                                Some(prev) => format!("{prev} {text}"),
                                None => text,
                            });
                        }
                        _ => pending.push(text),
                    }
                }
                SyntaxKind::WHITESPACE => {
                    let newlines = element.to_string().matches('\n').count();
                    if newlines > 0 {
                        after_spec = false;
                    }
                    if newlines > 1 {
                        block.flush_comments(&mut pending);
                        block.items.push(BlockItem::Blank);
                    }
                }
                SyntaxKind::R_PAREN => block.flush_comments(&mut pending),
                _ => {}
            }
        }
        block.flush_comments(&mut pending);
        block
    }

    fn flush_comments(&mut self, pending: &mut Vec<String>) {
        self.items.extend(pending.drain(..).map(BlockItem::Comment));
    }

    pub fn specs(&self) -> impl Iterator<Item = &SpecLine> {
        self.items.iter().filter_map(|item| match item {
            BlockItem::Spec(spec) => Some(spec),
            _ => None,
        })
    }

    pub fn spec_count(&self) -> usize {
        self.specs().count()
    }

    /// Remove the spec starting at `range`. Returns whether one was found.
    pub fn remove(&mut self, range: TextRange) -> bool {
        let before = self.items.len();
        self.items.retain(|item| {
            !matches!(item, BlockItem::Spec(spec) if spec.range == Some(range))
        });
        before != self.items.len()
    }

    /// Insert a new spec at the end of the run whose paths share the longest
    /// prefix with it (first run on ties).
    pub fn insert(&mut self, spec: SpecLine) {
        let mut best: Option<(usize, usize)> = None;
        for (start, end) in self.runs() {
            let score = self.items[start..end]
                .iter()
                .filter_map(|item| match item {
                    BlockItem::Spec(existing) => Some(match_len(&existing.path, &spec.path)),
                    _ => None,
                })
                .max()
                .unwrap_or(0);
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((end, score));
            }
        }
        match best {
            Some((end, _)) => self.items.insert(end, BlockItem::Spec(spec)),
            None => self.items.push(BlockItem::Spec(spec)),
        }
        if self.spec_count() > 1 {
            self.parenthesized = true;
        }
    }

    /// Half-open item ranges of consecutive specs.
    fn runs(&self) -> Vec<(usize, usize)> {
        let mut runs = Vec::new();
        let mut start = None;
        for (i, item) in self.items.iter().enumerate() {
            match (item, start) {
                (BlockItem::Spec(_), None) => start = Some(i),
                (BlockItem::Spec(_), Some(_)) => {}
                (_, Some(s)) => {
                    runs.push((s, i));
                    start = None;
                }
                (_, None) => {}
            }
        }
        if let Some(s) = start {
            runs.push((s, self.items.len()));
        }
        runs
    }

    fn sort_runs(&mut self) {
        for (start, end) in self.runs() {
            self.items[start..end].sort_by(|a, b| match (a, b) {
                (BlockItem::Spec(a), BlockItem::Spec(b)) => {
                    (&a.path, &a.alias).cmp(&(&b.path, &b.alias))
                }
                _ => std::cmp::Ordering::Equal,
            });
        }
    }

    /// Blank separators collapsed to one and trimmed at both ends.
    fn normalize_blanks(&mut self) {
        let mut items = Vec::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            let is_blank = item == BlockItem::Blank;
            if is_blank && matches!(items.last(), None | Some(BlockItem::Blank)) {
                continue;
            }
            items.push(item);
        }
        if items.last() == Some(&BlockItem::Blank) {
            items.pop();
        }
        self.items = items;
    }

    /// Render the declaration, `import` keyword included, without a
    /// trailing newline.
    pub fn render(&mut self) -> String {
        self.normalize_blanks();
        self.sort_runs();

        if let [BlockItem::Spec(spec)] = self.items.as_slice() {
            if !self.parenthesized && spec.leading.is_empty() {
                let mut out = String::from("import ");
                spec.render("", &mut out);
                return out;
            }
        }

        if self.items.is_empty() {
            return String::from("import ()");
        }

        let mut out = String::from("import (\n");
        for item in &self.items {
            match item {
                BlockItem::Spec(spec) => spec.render("\t", &mut out),
                BlockItem::Comment(comment) => {
                    out.push('\t');
                    out.push_str(comment);
                }
                BlockItem::Blank => {}
            }
            out.push('\n');
        }
        out.push(')');
        out
    }
}

/// Number of `/`-separated segments two import paths have in common.
fn match_len(a: &str, b: &str) -> usize {
    a.bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .filter(|(x, _)| *x == b'/')
        .count()
}
