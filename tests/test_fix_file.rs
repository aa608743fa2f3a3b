//! End-to-end fixes of Go files against a temporary GOPATH.
//!
//! Each test lays out a search root with a handful of standard packages,
//! builds the candidate index through the cache and fixes files in a
//! separate work directory.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use gofiximport::project::CacheRecord;
use gofiximport::{CacheManager, CandidateIndex, Config, FixError, Fixed, Fixer, StalenessCheck};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const PACKAGES: &[&str] = &[
    "bytes",
    "fmt",
    "go/ast",
    "go/format",
    "go/token",
    "os",
    "reflect",
    "strconv",
    "strings",
];

struct Workspace {
    tmp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let ws = Self { tmp };
        for package in PACKAGES {
            ws.add_package(package);
        }
        fs::create_dir_all(ws.work()).unwrap();
        ws
    }

    fn root(&self) -> PathBuf {
        self.tmp.path().join("goroot")
    }

    fn work(&self) -> PathBuf {
        self.tmp.path().join("work")
    }

    fn config(&self) -> Config {
        Config::new(vec![self.root()], self.tmp.path().join("cache/candidates.json"))
    }

    fn add_package(&self, path: &str) -> PathBuf {
        let dir = self.root().join("src").join(path);
        fs::create_dir_all(&dir).unwrap();
        let name = path.rsplit('/').next().unwrap();
        let file = dir.join("doc.go");
        fs::write(&file, format!("package {name}\n")).unwrap();
        file
    }

    fn write(&self, name: &str, text: &str) -> PathBuf {
        let path = self.work().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    fn fixer(&self) -> Fixer {
        Fixer::new(CacheManager::new(&self.config()).load(false))
    }
}

fn unresolved(fixed: &Fixed) -> Vec<&str> {
    fixed.plan.unresolved.iter().map(|name| name.as_str()).collect()
}

fn set_mtime(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

// ============================================================================
// ADDING AND REMOVING
// ============================================================================

#[test]
fn test_add_imports_keeps_comments() {
    let ws = Workspace::new();
    let file = ws.write(
        "add_imports.go",
        "package main\n\n// A comment\nfunc main() {\n\tfmt.Println(ast.Node(nil))\n}\n",
    );

    let fixed = ws.fixer().fix_file(&file).unwrap();
    assert_eq!(
        fixed.text,
        "package main\n\nimport (\n\t\"fmt\"\n\t\"go/ast\"\n)\n\n// A comment\nfunc main() {\n\tfmt.Println(ast.Node(nil))\n}\n"
    );
}

#[test]
fn test_remove_unused_import() {
    let ws = Workspace::new();
    let file = ws.write(
        "remove_imports.go",
        "package main\n\nimport (\n\t\"fmt\"\n\t\"os\"\n)\n\nfunc main() {\n\tfmt.Println(\"hi\")\n}\n",
    );

    let fixed = ws.fixer().fix_file(&file).unwrap();
    assert!(!fixed.text.contains("\"os\""), "got\n{}", fixed.text);
    assert!(fixed.text.contains("\"fmt\""));
    assert_eq!(fixed.plan.removals.len(), 1);
    assert_eq!(fixed.plan.removals[0].path, "os");
}

#[test]
fn test_complex_file_gets_every_import() {
    let ws = Workspace::new();
    let file = ws.write(
        "complex.go",
        r#"package main

func main() {
	var buf bytes.Buffer
	fset := token.NewFileSet()
	f := &ast.File{}
	if err := format.Node(&buf, fset, f); err != nil {
		fmt.Fprintln(os.Stderr, err)
	}
	n, _ := strconv.Atoi("3")
	fmt.Println(reflect.TypeOf(n), buf.String())
}
"#,
    );

    let fixed = ws.fixer().fix_file(&file).unwrap();
    for path in [
        "bytes",
        "fmt",
        "go/ast",
        "go/format",
        "go/token",
        "os",
        "reflect",
        "strconv",
    ] {
        assert!(fixed.text.contains(&format!("\t\"{path}\"\n")), "missing {path} in\n{}", fixed.text);
    }
    assert!(!fixed.text.contains("\"strings\""));
    assert!(fixed.plan.unresolved.is_empty());
}

#[test]
fn test_new_decl_after_indented_package_clause() {
    let ws = Workspace::new();
    let file = ws.write(
        "src.go",
        "\n    package p\n\n    // Toto\n    const c = 1.0\n    var X = fmt.Sprint(os.Args)\n",
    );

    let text = ws.fixer().fix_file(&file).unwrap().text;
    assert!(text.contains("\"fmt\""));
    assert!(text.contains("\"os\""));
    assert!(text.contains("// Toto"));
}

#[test]
fn test_empty_import_group_is_reused() {
    let ws = Workspace::new();
    let file = ws.write(
        "src.go",
        "\n    package p\n\n    import ()\n\n    // Toto\n    const c = 1.0\n    var X = fmt.Sprint(c)\n",
    );

    let text = ws.fixer().fix_file(&file).unwrap().text;
    assert_eq!(text.matches("import").count(), 1, "got\n{text}");
    assert!(text.contains("\"fmt\""));
}

#[test]
fn test_unknown_qualifier_is_left_alone() {
    let ws = Workspace::new();
    let text = "package main\n\nfunc main() { nowhere.Call() }\n";
    let file = ws.write("main.go", text);

    let fixed = ws.fixer().fix_file(&file).unwrap();
    assert_eq!(fixed.text, text);
    assert_eq!(unresolved(&fixed), vec!["nowhere"]);
}

#[test]
fn test_ambiguous_qualifier_is_left_alone() {
    let ws = Workspace::new();
    ws.add_package("github.com/acme/token");
    let text = "package main\n\nvar fset = token.NewFileSet()\n";
    let file = ws.write("main.go", text);

    let fixed = ws.fixer().fix_file(&file).unwrap();
    assert_eq!(fixed.text, text);
    assert!(!fixed.is_changed());
}

#[test]
fn test_header_locals_shadow_index_candidates() {
    let ws = Workspace::new();
    ws.add_package("os/user");
    ws.add_package("net/url");
    let file = ws.write(
        "main.go",
        r#"package main

func main() {
	if user, err := lookup(1); err != nil {
		fmt.Println(err)
	} else if url := user.Home(); url.Host != "" {
		fmt.Println(user.Name, url.Path)
	}
	for url := next(); url != nil; url = url.Next() {
		fmt.Println(url)
	}
}
"#,
    );

    let fixed = ws.fixer().fix_file(&file).unwrap();
    assert!(fixed.text.starts_with("package main\n\nimport \"fmt\"\n\nfunc main() {"), "got\n{}", fixed.text);
    assert!(fixed.plan.unresolved.is_empty());
}

#[test]
fn test_local_variable_named_like_a_package() {
    let ws = Workspace::new();
    ws.add_package("os/user");
    let text = "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tuser := current()\n\tfmt.Println(user.Name)\n}\n";
    let file = ws.write("main.go", text);

    let fixed = ws.fixer().fix_file(&file).unwrap();
    assert_eq!(fixed.text, text);
    assert!(!fixed.is_changed());
}

#[test]
fn test_spec_bound_under_unused_alias_is_replaced() {
    let ws = Workspace::new();
    ws.add_package("example.com/bar");
    let file = ws.write(
        "main.go",
        "package main\n\nimport other \"example.com/bar\"\n\nvar _ = bar.X\n",
    );

    let fixed = ws.fixer().fix_file(&file).unwrap();
    assert_eq!(fixed.text, "package main\n\nimport \"example.com/bar\"\n\nvar _ = bar.X\n");
    assert_eq!(fixed.plan.removals[0].alias.as_deref(), Some("other"));
}

#[test]
fn test_cgo_preamble_stays_with_import_c() {
    let ws = Workspace::new();
    let file = ws.write(
        "cgo.go",
        "package main\n\n// #include <stdio.h>\nimport \"C\"\n\nfunc main() {\n\tC.puts(nil)\n\tfmt.Println()\n}\n",
    );

    let fixed = ws.fixer().fix_file(&file).unwrap();
    assert_eq!(
        fixed.text,
        "package main\n\n// #include <stdio.h>\nimport \"C\"\n\nimport \"fmt\"\n\nfunc main() {\n\tC.puts(nil)\n\tfmt.Println()\n}\n"
    );
}

// ============================================================================
// SIBLING FILES
// ============================================================================

#[test]
fn test_sibling_alias_is_reused() {
    let ws = Workspace::new();
    ws.write(
        "encode.go",
        "package main\n\nimport y \"gopkg.in/yaml.v2\"\n\nvar _ = y.Marshal\n",
    );
    let file = ws.write("main.go", "package main\n\nvar out, _ = y.Marshal(1)\n");

    let text = ws.fixer().fix_file(&file).unwrap().text;
    assert_eq!(
        text,
        "package main\n\nimport y \"gopkg.in/yaml.v2\"\n\nvar out, _ = y.Marshal(1)\n"
    );
}

#[test]
fn test_sibling_beats_ambiguous_index() {
    let ws = Workspace::new();
    ws.add_package("github.com/acme/token");
    ws.write("a.go", "package main\n\nimport \"github.com/acme/token\"\n");
    let file = ws.write("main.go", "package main\n\nvar t = token.New()\n");

    let text = ws.fixer().fix_file(&file).unwrap().text;
    assert!(text.contains("import \"github.com/acme/token\""), "got\n{text}");
}

#[test]
fn test_test_files_and_other_packages_are_not_siblings() {
    let ws = Workspace::new();
    ws.write("a_test.go", "package main\n\nimport z \"example.com/zeta\"\n");
    ws.write("other.go", "package other\n\nimport q \"example.com/quux\"\n");
    ws.write("broken.go", "package main\n\nimport (\n");
    let text = "package main\n\nvar a, b = z.A, q.B\n";
    let file = ws.write("main.go", text);

    let fixed = ws.fixer().fix_file(&file).unwrap();
    assert_eq!(fixed.text, text);
    assert_eq!(unresolved(&fixed), vec!["z", "q"]);
}

// ============================================================================
// WRITING BACK
// ============================================================================

#[test]
fn test_fix_in_place_is_idempotent() {
    let ws = Workspace::new();
    let file = ws.write(
        "main.go",
        "package main\n\nimport \"os\"\n\nfunc main() { fmt.Println(strings.ToUpper(\"x\")) }\n",
    );
    let fixer = ws.fixer();

    assert!(fixer.fix_in_place(&file).unwrap());
    let once = fs::read_to_string(&file).unwrap();
    assert_eq!(
        once,
        "package main\n\nimport (\n\t\"fmt\"\n\t\"strings\"\n)\n\nfunc main() { fmt.Println(strings.ToUpper(\"x\")) }\n"
    );

    assert!(!fixer.fix_in_place(&file).unwrap());
    assert_eq!(fs::read_to_string(&file).unwrap(), once);
}

#[cfg(unix)]
#[test]
fn test_fix_in_place_replaces_file_whole() {
    use std::os::unix::fs::PermissionsExt;

    let ws = Workspace::new();
    let file = ws.write("main.go", "package main\n\nvar _ = os.Args\n");
    fs::set_permissions(&file, fs::Permissions::from_mode(0o640)).unwrap();

    assert!(ws.fixer().fix_in_place(&file).unwrap());
    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "package main\n\nimport \"os\"\n\nvar _ = os.Args\n"
    );
    assert_eq!(fs::metadata(&file).unwrap().permissions().mode() & 0o777, 0o640);

    let entries: Vec<_> = fs::read_dir(ws.work())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("main.go")]);
}

#[test]
fn test_parse_error_is_positioned() {
    let ws = Workspace::new();
    let file = ws.write("bad.go", "package main\n\nfunc main() {\n");

    let err = ws.fixer().fix_file(&file).unwrap_err();
    assert!(matches!(err, FixError::Parse { .. }));
    assert!(err.to_string().starts_with(&file.display().to_string()));
    assert!(err.to_string().ends_with("unclosed bracket at end of file"));
}

#[test]
fn test_missing_file_is_io_error() {
    let ws = Workspace::new();
    let err = ws.fixer().fix_file(&ws.work().join("gone.go")).unwrap_err();
    assert!(matches!(err, FixError::Io { .. }));
}

// ============================================================================
// CACHE
// ============================================================================

#[test]
fn test_cache_reused_until_roots_change() {
    let ws = Workspace::new();
    let cache = CacheManager::new(&ws.config());
    let now = SystemTime::now();

    let planted: CandidateIndex = ["example.com/planted"].into_iter().collect();
    cache
        .save(&CacheRecord::new(planted.clone(), now + Duration::from_secs(60)))
        .unwrap();
    assert_eq!(cache.load(false), planted);

    let added = ws.add_package("example.com/fresh");
    set_mtime(&added, now + Duration::from_secs(120));

    let index = cache.load(false);
    assert!(index.packages("planted").next().is_none());
    assert_eq!(
        index.packages("fresh").collect::<Vec<_>>(),
        vec!["example.com/fresh"]
    );
}

#[test]
fn test_directory_mtime_check_misses_deep_edits() {
    let ws = Workspace::new();
    let config = ws.config().with_staleness(StalenessCheck::DirectoryMtime);
    let cache = CacheManager::new(&config);
    let now = SystemTime::now();

    let planted: CandidateIndex = ["example.com/planted"].into_iter().collect();
    cache
        .save(&CacheRecord::new(planted.clone(), now + Duration::from_secs(60)))
        .unwrap();

    let added = ws.add_package("example.com/fresh");
    set_mtime(&added, now + Duration::from_secs(120));

    // the root directory itself predates the record
    assert_eq!(cache.load(false), planted);
    assert!(cache.load(true).packages("fresh").next().is_some());
}

#[test]
fn test_cache_file_is_json() {
    let ws = Workspace::new();
    let cache = CacheManager::new(&ws.config());
    let index = cache.load(false);
    assert_eq!(index.package_count(), PACKAGES.len());

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(cache.path()).unwrap()).unwrap();
    assert_eq!(json["version"], 1);
    assert_eq!(json["packages"]["ast"][0], "go/ast");
}
