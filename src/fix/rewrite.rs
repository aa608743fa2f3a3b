//! Applies an [`ImportPlan`] to source text.
//!
//! Only import declarations touched by the plan are re-rendered; every
//! other byte of the file is copied through unchanged.

use crate::base::{TextRange, TextSize};
use crate::hir::ImportPlan;
use crate::syntax::{AstNode, ImportBlock, ImportDecl, SourceFile, SpecLine, SyntaxKind};

/// A replacement of `range` in the input text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    range: TextRange,
    insert: String,
}

/// Rewrite `text` (whose tree is `file`) according to `plan`.
pub fn rewrite(file: &SourceFile, text: &str, plan: &ImportPlan) -> String {
    if plan.is_empty() {
        return text.to_string();
    }

    let additions = || {
        plan.additions
            .iter()
            .map(|a| SpecLine::new(a.path.clone(), a.alias.clone()))
    };

    let mut edits = Vec::new();
    let decls: Vec<ImportDecl> = file.import_decls().collect();
    // a cgo preamble must stay directly above its `import "C"`
    let target = decls.iter().position(|decl| !imports_cgo(decl));

    for (i, decl) in decls.iter().enumerate() {
        let decl_range = decl.text_range();
        let removals: Vec<TextRange> = plan
            .removals
            .iter()
            .map(|r| r.range)
            .filter(|range| decl_range.contains_range(*range))
            .collect();
        let receives_additions = target == Some(i) && !plan.additions.is_empty();
        if removals.is_empty() && !receives_additions {
            continue;
        }

        let mut block = ImportBlock::from_decl(decl);
        for range in removals {
            block.remove(range);
        }
        if receives_additions {
            for spec in additions() {
                block.insert(spec);
            }
        }

        if block.spec_count() == 0 {
            edits.push(Edit {
                range: deletion_range(decl),
                insert: String::new(),
            });
        } else {
            edits.push(Edit {
                range: decl_range,
                insert: block.render(),
            });
        }
    }

    if target.is_none() && !plan.additions.is_empty() {
        let offset = decls
            .last()
            .map_or_else(|| after_package_clause(file), |decl| decl.text_range().end());
        let mut block = ImportBlock::with_specs(additions());
        edits.push(Edit {
            range: TextRange::empty(offset),
            insert: format!("\n\n{}", block.render()),
        });
    }

    apply(text, edits)
}

fn imports_cgo(decl: &ImportDecl) -> bool {
    decl.specs().any(|spec| spec.path().as_deref() == Some("C"))
}

/// The declaration with its doc comment and the whitespace after it.
fn deletion_range(decl: &ImportDecl) -> TextRange {
    let range = decl.text_range();
    let start = decl
        .doc_comments()
        .first()
        .map_or(range.start(), |doc| doc.text_range().start());
    let end = match decl.syntax().next_sibling_or_token() {
        Some(next) if next.kind() == SyntaxKind::WHITESPACE => next.text_range().end(),
        _ => range.end(),
    };
    TextRange::new(start, end)
}

/// Where a new import declaration goes: the end of the package clause line,
/// after any comment sharing that line.
fn after_package_clause(file: &SourceFile) -> TextSize {
    let Some(clause) = file.package_clause() else {
        return TextSize::from(0);
    };
    let mut offset = clause.text_range().end();
    let mut next = clause.syntax().next_sibling_or_token();
    while let Some(element) = next {
        let multiline = element.to_string().contains('\n');
        match element.kind() {
            SyntaxKind::WHITESPACE if !multiline => {}
            SyntaxKind::LINE_COMMENT => offset = element.text_range().end(),
            SyntaxKind::BLOCK_COMMENT if !multiline => offset = element.text_range().end(),
            _ => break,
        }
        next = element.next_sibling_or_token();
    }
    offset
}

fn apply(text: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|edit| std::cmp::Reverse(edit.range.start()));
    let mut out = text.to_string();
    for edit in edits {
        out.replace_range(std::ops::Range::<usize>::from(edit.range), &edit.insert);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::{Addition, Removal, ResolveSource};
    use crate::syntax::{ParseMode, parse};
    use pretty_assertions::assert_eq;

    fn addition(path: &str) -> Addition {
        Addition {
            name: crate::hir::assumed_name(path).unwrap(),
            path: path.to_string(),
            alias: None,
            source: ResolveSource::Index,
        }
    }

    fn removal_of(file: &SourceFile, path: &str) -> Removal {
        let spec = file
            .import_specs()
            .find(|s| s.path().as_deref() == Some(path))
            .unwrap();
        Removal {
            path: path.to_string(),
            alias: spec.alias_text(),
            range: spec.text_range(),
        }
    }

    fn run(text: &str, add: &[&str], remove: &[&str]) -> String {
        let file = parse(text, ParseMode::Full).unwrap().tree();
        let plan = ImportPlan {
            additions: add.iter().map(|p| addition(p)).collect(),
            removals: remove.iter().map(|p| removal_of(&file, p)).collect(),
            unresolved: Vec::new(),
        };
        rewrite(&file, text, &plan)
    }

    #[test]
    fn test_empty_plan_is_identity() {
        let text = "package p\n\nimport (\n\"os\"\n  \"fmt\"\n)\n";
        assert_eq!(run(text, &[], &[]), text);
    }

    #[test]
    fn test_new_decl_after_package_clause() {
        let text = "\n    package p // the package\n\n    // Toto\n    const c = 1.0\n";
        assert_eq!(
            run(text, &["fmt", "os"], &[]),
            "\n    package p // the package\n\nimport (\n\t\"fmt\"\n\t\"os\"\n)\n\n    // Toto\n    const c = 1.0\n"
        );
    }

    #[test]
    fn test_single_new_import_is_unparenthesized() {
        assert_eq!(
            run("package p\n\nfunc main() {}\n", &["fmt"], &[]),
            "package p\n\nimport \"fmt\"\n\nfunc main() {}\n"
        );
    }

    #[test]
    fn test_reuses_empty_group() {
        let out = run("package p\n\nimport ()\n\nvar X = 1\n", &["fmt"], &[]);
        assert_eq!(out, "package p\n\nimport (\n\t\"fmt\"\n)\n\nvar X = 1\n");
        assert_eq!(out.matches("import").count(), 1);
    }

    #[test]
    fn test_additions_go_to_first_decl_only() {
        let text = "package p\n\nimport \"os\"\n\nimport \"strings\"\n\nvar x = 1\n";
        assert_eq!(
            run(text, &["fmt"], &[]),
            "package p\n\nimport (\n\t\"fmt\"\n\t\"os\"\n)\n\nimport \"strings\"\n\nvar x = 1\n"
        );
    }

    #[test]
    fn test_cgo_decl_keeps_its_preamble() {
        let text = "package p\n\n// #include <stdio.h>\nimport \"C\"\n\nfunc main() {}\n";
        assert_eq!(
            run(text, &["fmt"], &[]),
            "package p\n\n// #include <stdio.h>\nimport \"C\"\n\nimport \"fmt\"\n\nfunc main() {}\n"
        );
    }

    #[test]
    fn test_additions_skip_cgo_decl() {
        let text = "package p\n\n// #include <stdio.h>\nimport \"C\"\n\nimport \"os\"\n";
        assert_eq!(
            run(text, &["fmt"], &[]),
            "package p\n\n// #include <stdio.h>\nimport \"C\"\n\nimport (\n\t\"fmt\"\n\t\"os\"\n)\n"
        );
    }

    #[test]
    fn test_emptied_decl_is_deleted_with_doc() {
        let text = "package p\n\n// Imports.\nimport \"os\"\n\nimport \"fmt\"\n\nvar x = fmt.Sprint()\n";
        assert_eq!(
            run(text, &[], &["os"]),
            "package p\n\nimport \"fmt\"\n\nvar x = fmt.Sprint()\n"
        );
    }

    #[test]
    fn test_remove_from_group_keeps_other_decls_verbatim() {
        let text = "package p\n\nimport (\n\t\"fmt\"\n\t\"os\" // env\n)\n\nimport   \"strings\"\n";
        assert_eq!(
            run(text, &[], &["os"]),
            "package p\n\nimport (\n\t\"fmt\"\n)\n\nimport   \"strings\"\n"
        );
    }

    #[test]
    fn test_add_and_remove_in_same_decl() {
        let text = "package p\n\nimport (\n\t\"bytes\"\n\t// Env access.\n\t\"os\"\n)\n";
        assert_eq!(
            run(text, &["strings"], &["bytes"]),
            "package p\n\nimport (\n\t// Env access.\n\t\"os\"\n\t\"strings\"\n)\n"
        );
    }
}
