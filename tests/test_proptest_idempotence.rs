//! Property-based tests of the fixer on generated Go files.
//!
//! Files are assembled from a package clause, an optional import block
//! drawn from a small package pool and a body that uses a random subset of
//! the pool through package qualifiers.
#![cfg(feature = "proptest")]

use gofiximport::hir::SiblingImports;
use gofiximport::{CandidateIndex, Fixer};
use proptest::prelude::*;

const POOL: &[&str] = &["bytes", "fmt", "go/ast", "net/http", "os", "strings"];

// ============================================================================
// PROPTEST STRATEGIES
// ============================================================================

fn arb_subset() -> impl Strategy<Value = Vec<&'static str>> {
    proptest::sample::subsequence(POOL, 0..=POOL.len())
}

fn arb_imports() -> impl Strategy<Value = String> {
    (arb_subset(), any::<bool>()).prop_map(|(paths, grouped)| match paths.as_slice() {
        [] => String::new(),
        [only] if !grouped => format!("import \"{only}\"\n\n"),
        _ => {
            let specs: String = paths.iter().map(|p| format!("\t\"{p}\"\n")).collect();
            format!("import (\n{specs})\n\n")
        }
    })
}

fn arb_body() -> impl Strategy<Value = String> {
    arb_subset().prop_map(|paths| {
        let calls: String = paths
            .iter()
            .map(|p| format!("\t_ = {}.X\n", p.rsplit('/').next().unwrap_or(p)))
            .collect();
        format!("func main() {{\n{calls}}}\n")
    })
}

fn arb_file() -> impl Strategy<Value = String> {
    (arb_imports(), arb_body())
        .prop_map(|(imports, body)| format!("package main\n\n{imports}{body}"))
}

fn fixer() -> Fixer {
    Fixer::new(POOL.iter().copied().collect::<CandidateIndex>())
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #[test]
    fn fix_is_idempotent(text in arb_file()) {
        let fixer = fixer();
        let siblings = SiblingImports::new();
        let once = fixer.fix_source(&text, &siblings).unwrap();
        let twice = fixer.fix_source(&once.text, &siblings).unwrap();
        prop_assert!(!twice.is_changed(), "second pass changed:\n{}", once.text);
        prop_assert_eq!(twice.text, once.text);
    }

    #[test]
    fn fixed_file_imports_exactly_what_it_uses(text in arb_file()) {
        let fixed = fixer().fix_source(&text, &SiblingImports::new()).unwrap();
        for path in POOL {
            let name = path.rsplit('/').next().unwrap_or(path);
            let used = fixed.text.contains(&format!("{name}.X"));
            let imported = fixed.text.contains(&format!("\"{path}\""));
            prop_assert_eq!(used, imported, "{} in\n{}", path, fixed.text);
        }
    }

    #[test]
    fn body_is_preserved(text in arb_file()) {
        let fixed = fixer().fix_source(&text, &SiblingImports::new()).unwrap();
        let body_start = text.find("func main").unwrap();
        prop_assert!(fixed.text.ends_with(&text[body_start..]));
    }
}
