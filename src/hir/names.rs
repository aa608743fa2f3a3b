//! Name analysis of a single Go file.
//!
//! Go code is not type-checked here. The analysis walks the flat token
//! stream after the imports with a lexical scope stack and answers one
//! question per selector `X.Sel`: what does the bare identifier `X` bind to?
//! Anything that binds to nothing is an unresolved package qualifier.
//!
//! The scope model over-approximates: a name declared with `:=` in a plain
//! statement stays visible until the end of its enclosing block, and the
//! names of a function literal's statement are visible inside its body.
//! Names declared in an `if`, `for` or `switch` header are visible after the
//! clause that declares them, through every block of the statement.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::base::TextRange;
use crate::syntax::lexer::is_ident_continue;
use crate::syntax::{AstNode, SourceFile, SyntaxKind};

use SyntaxKind::*;

/// Identifiers of the universe block.
const PREDECLARED: &[&str] = &[
    "any", "append", "bool", "byte", "cap", "clear", "close", "comparable", "complex",
    "complex128", "complex64", "copy", "delete", "error", "false", "float32", "float64",
    "imag", "int", "int16", "int32", "int64", "int8", "iota", "len", "make", "max", "min",
    "new", "nil", "panic", "print", "println", "real", "recover", "rune", "string", "true",
    "uint", "uint16", "uint32", "uint64", "uint8", "uintptr",
];

pub fn is_predeclared(name: &str) -> bool {
    PREDECLARED.binary_search(&name).is_ok()
}

/// The last `/`-separated segment of an import path.
pub fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// The package name conventionally declared by the package at `path`.
///
/// The last segment, except that a trailing major-version segment (`v2`)
/// defers to the one before it, a `go-` prefix is dropped and the name is cut
/// at the first character that cannot appear in an identifier.
pub fn assumed_name(path: &str) -> Option<SmolStr> {
    let mut base = last_segment(path);
    if let Some(version) = base.strip_prefix('v') {
        if !version.is_empty() && version.bytes().all(|b| b.is_ascii_digit()) {
            if let Some((dir, _)) = path.rsplit_once('/') {
                base = last_segment(dir);
            }
        }
    }
    let base = base.strip_prefix("go-").unwrap_or(base);
    let end = base
        .char_indices()
        .find(|&(_, c)| !is_ident_continue(c))
        .map_or(base.len(), |(i, _)| i);
    let name = &base[..end];
    (!name.is_empty()).then(|| SmolStr::new(name))
}

/// What the qualifier of a selector expression binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    /// A parameter, result, or block-scoped declaration.
    Local,
    /// A package-level declaration of this file.
    Package,
    /// An import of this file.
    Import,
    /// A predeclared identifier such as `len` or `string`.
    Predeclared,
    Unbound,
}

/// A bare identifier used as `X` in `X.Sel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifierRef {
    pub name: SmolStr,
    pub range: TextRange,
    pub binding: Binding,
}

/// An existing import spec and the names it makes available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub path: String,
    pub alias: Option<SmolStr>,
    /// Names a qualifier may use to refer to this import.
    pub names: Vec<SmolStr>,
    pub range: TextRange,
}

impl ImportBinding {
    fn new(path: String, alias: Option<SmolStr>, range: TextRange) -> Self {
        let names = match alias.as_deref() {
            Some("_" | ".") => Vec::new(),
            Some(alias) => vec![SmolStr::new(alias)],
            None => {
                let mut names = Vec::with_capacity(2);
                let last = last_segment(&path);
                if crate::syntax::lexer::is_ident(last) {
                    names.push(SmolStr::new(last));
                }
                if let Some(assumed) = assumed_name(&path) {
                    if !names.contains(&assumed) {
                        names.push(assumed);
                    }
                }
                names
            }
        };
        Self {
            path,
            alias,
            names,
            range,
        }
    }

    /// Blank, dot and cgo imports have effects beyond their name.
    pub fn is_always_used(&self) -> bool {
        matches!(self.alias.as_deref(), Some("_" | ".")) || self.path == "C"
    }
}

/// Declared names and qualifier references of one file.
#[derive(Debug, Clone, Default)]
pub struct FileNames {
    package_level: FxHashSet<SmolStr>,
    imports: Vec<ImportBinding>,
    qualifiers: Vec<QualifierRef>,
}

impl FileNames {
    pub fn analyze(file: &SourceFile) -> Self {
        let imports: Vec<ImportBinding> = file
            .import_specs()
            .filter_map(|spec| {
                let path = spec.path()?;
                Some(ImportBinding::new(path, spec.alias_text(), spec.text_range()))
            })
            .collect();

        let tokens = significant_tokens(file);
        let package_level = package_level_names(&tokens);

        let mut names = Self {
            package_level,
            imports,
            qualifiers: Vec::new(),
        };
        let qualifiers = Scopes::new(&tokens).walk(|name| names.bind_outer(name));
        names.qualifiers = qualifiers;
        names
    }

    /// Binding of `name` outside every local scope.
    fn bind_outer(&self, name: &str) -> Binding {
        if self.package_level.contains(name) {
            Binding::Package
        } else if self.imports.iter().any(|i| i.names.iter().any(|n| n == name)) {
            Binding::Import
        } else if is_predeclared(name) {
            Binding::Predeclared
        } else {
            Binding::Unbound
        }
    }

    pub fn imports(&self) -> &[ImportBinding] {
        &self.imports
    }

    pub fn qualifiers(&self) -> &[QualifierRef] {
        &self.qualifiers
    }

    /// Unbound qualifiers, each once, in order of first use.
    pub fn unresolved(&self) -> Vec<SmolStr> {
        let mut seen = FxHashSet::default();
        self.qualifiers
            .iter()
            .filter(|q| q.binding == Binding::Unbound)
            .filter(|q| seen.insert(q.name.clone()))
            .map(|q| q.name.clone())
            .collect()
    }

    /// Whether some selector refers to an import through `name`.
    pub fn uses(&self, name: &str) -> bool {
        self.qualifiers
            .iter()
            .any(|q| q.binding == Binding::Import && q.name == name)
    }

    /// Whether an existing import must be kept.
    pub fn is_used(&self, import: &ImportBinding) -> bool {
        import.is_always_used() || import.names.iter().any(|name| self.uses(name))
    }
}

// ============================================================================
// TOKENS
// ============================================================================

#[derive(Debug, Clone)]
struct Tok {
    kind: SyntaxKind,
    text: SmolStr,
    range: TextRange,
    /// A line break separates this token from the previous one.
    newline_before: bool,
}

fn significant_tokens(file: &SourceFile) -> Vec<Tok> {
    let mut tokens = Vec::new();
    let mut newline = false;
    for token in file.top_level_tokens() {
        let kind = token.kind();
        if kind.is_trivia() {
            newline |= token.text().contains('\n');
            continue;
        }
        tokens.push(Tok {
            kind,
            text: SmolStr::new(token.text()),
            range: token.text_range(),
            newline_before: std::mem::take(&mut newline),
        });
    }
    tokens
}

/// Whether a statement ends between `tokens[i - 1]` and `tokens[i]`.
fn ends_before(tokens: &[Tok], i: usize) -> bool {
    i > 0 && tokens[i].newline_before && tokens[i - 1].kind.ends_statement()
}

/// Index just past the bracket group opening at `open`.
fn skip_group(tokens: &[Tok], open: usize) -> usize {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if token.kind.is_opening_bracket() {
            depth += 1;
        } else if token.kind.is_closing_bracket() {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return i + 1;
            }
        }
    }
    tokens.len()
}

/// `a, b, c` starting at `i`.
fn ident_list(tokens: &[Tok], mut i: usize) -> Vec<SmolStr> {
    let mut names = Vec::new();
    while let Some(token) = tokens.get(i).filter(|t| t.kind == IDENT) {
        names.push(token.text.clone());
        if tokens.get(i + 1).is_some_and(|t| t.kind == COMMA) {
            i += 2;
        } else {
            break;
        }
    }
    names
}

/// Names introduced by the `var`, `const` or `type` keyword at `kw`.
fn decl_names(tokens: &[Tok], kw: usize) -> Vec<SmolStr> {
    let single = |i: usize| -> Vec<SmolStr> {
        if tokens[kw].kind == TYPE_KW {
            tokens
                .get(i)
                .filter(|t| t.kind == IDENT)
                .map(|t| vec![t.text.clone()])
                .unwrap_or_default()
        } else {
            ident_list(tokens, i)
        }
    };

    if tokens.get(kw + 1).is_none_or(|t| t.kind != L_PAREN) {
        return single(kw + 1);
    }

    let end = skip_group(tokens, kw + 1);
    let mut names = Vec::new();
    let mut depth = 0usize;
    let mut spec_start = true;
    for i in kw + 2..end.saturating_sub(1) {
        let token = &tokens[i];
        if depth == 0 && (spec_start || ends_before(tokens, i)) {
            names.extend(single(i));
            spec_start = false;
        }
        if token.kind.is_opening_bracket() {
            depth += 1;
        } else if token.kind.is_closing_bracket() {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && token.kind == SEMICOLON {
            spec_start = true;
        }
    }
    names
}

fn package_level_names(tokens: &[Tok]) -> FxHashSet<SmolStr> {
    let mut names = FxHashSet::default();
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            kind if kind.is_opening_bracket() => depth += 1,
            kind if kind.is_closing_bracket() => depth = depth.saturating_sub(1),
            FUNC_KW if depth == 0 => {
                // methods are not package-scope names
                if let Some(name) = tokens.get(i + 1).filter(|t| t.kind == IDENT) {
                    names.insert(name.text.clone());
                }
            }
            VAR_KW | CONST_KW | TYPE_KW if depth == 0 => {
                names.extend(decl_names(tokens, i));
            }
            _ => {}
        }
    }
    names.remove("_");
    names
}

// ============================================================================
// FUNCTION SIGNATURES
// ============================================================================

/// Names declared by one parenthesized or bracketed parameter list.
///
/// `(a, b int, c string)` declares `a`, `b` and `c`; `(int, fmt.Stringer)`
/// declares nothing.
fn param_names(group: &[Tok]) -> Vec<SmolStr> {
    let mut parts: Vec<&[Tok]> = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in group.iter().enumerate() {
        if token.kind.is_opening_bracket() {
            depth += 1;
        } else if token.kind.is_closing_bracket() {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && token.kind == COMMA {
            parts.push(&group[start..i]);
            start = i + 1;
        }
    }
    if start < group.len() {
        parts.push(&group[start..]);
    }

    let named = parts
        .iter()
        .any(|part| part.len() >= 2 && part[0].kind == IDENT && part[1].kind != DOT);
    if !named {
        return Vec::new();
    }
    parts
        .iter()
        .filter_map(|part| part.first())
        .filter(|token| token.kind == IDENT && token.text != "_")
        .map(|token| token.text.clone())
        .collect()
}

/// For every `func` with a body, the index of the body's `{` and the names
/// its signature declares (receiver, type parameters, parameters, results).
fn function_bodies(tokens: &[Tok]) -> FxHashMap<usize, Vec<SmolStr>> {
    let mut bodies = FxHashMap::default();
    for (kw, token) in tokens.iter().enumerate() {
        if token.kind != FUNC_KW {
            continue;
        }
        let mut names = Vec::new();
        let mut i = kw + 1;
        while let Some(token) = tokens.get(i) {
            if i > kw + 1 && ends_before(tokens, i) {
                break;
            }
            match token.kind {
                L_PAREN | L_BRACK => {
                    let end = skip_group(tokens, i);
                    names.extend(param_names(&tokens[i + 1..end.saturating_sub(1)]));
                    i = end;
                }
                STRUCT_KW | INTERFACE_KW => {
                    i += 1;
                    if tokens.get(i).is_some_and(|t| t.kind == L_CURLY) {
                        i = skip_group(tokens, i);
                    }
                }
                L_CURLY => {
                    bodies.insert(i, names);
                    break;
                }
                IDENT | DOT | OPERATOR | ELLIPSIS | MAP_KW | CHAN_KW | FUNC_KW => i += 1,
                _ => break,
            }
        }
    }
    bodies
}

// ============================================================================
// SCOPES
// ============================================================================

#[derive(Debug, Default)]
struct Scope {
    names: FxHashSet<SmolStr>,
    /// Declared by the current statement, visible once it ends.
    pending: Vec<SmolStr>,
    /// Declared in the header of the current `if`/`for`/`switch` statement.
    /// Visible for the rest of the header and in every block of the
    /// statement, `else` branches included.
    header: FxHashSet<SmolStr>,
    /// Kind of the first token of the current statement.
    stmt_start: Option<SyntaxKind>,
}

impl Scope {
    fn flush(&mut self) {
        self.names.extend(self.pending.drain(..));
        self.header.clear();
        self.stmt_start = None;
    }

    /// Statements whose header may declare names scoped to the block that
    /// follows.
    fn in_header(&self) -> bool {
        matches!(self.stmt_start, Some(IF_KW | FOR_KW | SWITCH_KW | SELECT_KW | ELSE_KW))
    }

    /// Move the header's pending declarations into view.
    fn close_header_clause(&mut self) {
        self.header.extend(self.pending.drain(..));
    }
}

struct Scopes<'a> {
    tokens: &'a [Tok],
    bodies: FxHashMap<usize, Vec<SmolStr>>,
    stack: Vec<Scope>,
}

impl<'a> Scopes<'a> {
    fn new(tokens: &'a [Tok]) -> Self {
        Self {
            tokens,
            bodies: function_bodies(tokens),
            stack: vec![Scope::default()],
        }
    }

    fn current(&mut self) -> &mut Scope {
        // the root scope is never popped
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn is_local(&self, name: &str) -> bool {
        // the outermost scope only ever holds package-level names
        self.stack[1..].iter().any(|scope| scope.names.contains(name))
            || self.stack.iter().any(|scope| scope.header.contains(name))
    }

    /// Walk the tokens, binding every qualifier. `outer` binds names not
    /// found in any local scope.
    fn walk(mut self, outer: impl Fn(&str) -> Binding) -> Vec<QualifierRef> {
        let tokens = self.tokens;
        let mut qualifiers = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            if ends_before(tokens, i) {
                self.current().flush();
            }
            let scope = self.current();
            if scope.stmt_start.is_none() {
                scope.stmt_start = Some(token.kind);
            }

            match token.kind {
                L_CURLY => {
                    let parent = self.current();
                    let mut scope = Scope::default();
                    if parent.in_header() {
                        parent.close_header_clause();
                    } else {
                        scope.names.extend(parent.pending.iter().cloned());
                    }
                    if let Some(params) = self.bodies.remove(&i) {
                        scope.names.extend(params);
                    }
                    self.stack.push(scope);
                }
                R_CURLY => {
                    if self.stack.len() > 1 {
                        self.stack.pop();
                    }
                }
                SEMICOLON => {
                    let scope = self.current();
                    if scope.in_header() {
                        scope.close_header_clause();
                    } else {
                        scope.flush();
                    }
                }
                COLON
                    if matches!(
                        self.stack.last().and_then(|s| s.stmt_start),
                        Some(CASE_KW | DEFAULT_KW)
                    ) =>
                {
                    // `case v := <-ch:` declares `v` for the clause body
                    self.current().flush();
                }
                DEFINE => {
                    let names = define_lhs(tokens, i);
                    self.current().pending.extend(names);
                }
                VAR_KW | CONST_KW | TYPE_KW if self.stack.len() > 1 => {
                    let names = decl_names(tokens, i);
                    self.current().pending.extend(names);
                }
                IDENT if is_qualifier(tokens, i) => {
                    let binding = if self.is_local(&token.text) {
                        Binding::Local
                    } else {
                        outer(&token.text)
                    };
                    qualifiers.push(QualifierRef {
                        name: token.text.clone(),
                        range: token.range,
                        binding,
                    });
                }
                _ => {}
            }
        }
        qualifiers
    }
}

/// `X` in `X.Sel`, where `X` is not itself a selector.
fn is_qualifier(tokens: &[Tok], i: usize) -> bool {
    tokens.get(i + 1).is_some_and(|t| t.kind == DOT)
        && tokens.get(i + 2).is_some_and(|t| t.kind == IDENT)
        && (i == 0 || tokens[i - 1].kind != DOT)
}

/// Identifiers on the left of the `:=` at `define`.
fn define_lhs(tokens: &[Tok], define: usize) -> Vec<SmolStr> {
    let mut names = Vec::new();
    let mut i = define;
    while i > 0 && tokens[i - 1].kind == IDENT {
        names.push(tokens[i - 1].text.clone());
        if i >= 2 && tokens[i - 2].kind == COMMA {
            i -= 2;
        } else {
            break;
        }
    }
    names.retain(|name| name != "_");
    names.reverse();
    names
}
