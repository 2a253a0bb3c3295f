//! Integration tests for naming, graph construction, and partitioning over
//! on-disk project layouts.

use keel_config::Remapping;
use keel_graph::{
    merge_units, partition, GraphBuilder, GraphError, Overrides, SourceUnitNameResolver,
};
use keel_source::ParseMode;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

/// A project with `contracts/`, a `node_modules` include path, and a bundled
/// library directory outside the project.
struct Project {
    _dir: TempDir,
    root: PathBuf,
    modules: PathBuf,
    bundled: PathBuf,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("project");
        let modules = root.join("node_modules");
        let bundled = dir.path().join("bundled");
        fs::create_dir_all(&modules).unwrap();
        fs::create_dir_all(&bundled).unwrap();
        Self {
            _dir: dir,
            root,
            modules,
            bundled,
        }
    }

    fn resolver(&self, remappings: &[&str]) -> SourceUnitNameResolver {
        SourceUnitNameResolver::new(
            self.root.clone(),
            vec![self.modules.clone()],
            Some(self.bundled.clone()),
            remappings
                .iter()
                .map(|r| r.parse::<Remapping>().unwrap())
                .collect(),
        )
    }
}

// ===========================================================================
// Resolver round-trips
// ===========================================================================

#[test]
fn cmdline_names_locate_back_to_their_file() {
    let p = Project::new();
    let files = [
        write(&p.root, "contracts/Token.sol", ""),
        write(&p.modules, "@oz/access/Ownable.sol", ""),
        write(&p.bundled, "console.sol", ""),
    ];
    let resolver = p.resolver(&[]);
    let locator = resolver.locator();
    for file in &files {
        let name = resolver.resolve_cmdline_arg(file).unwrap();
        let located = locator.locate(&name, &Overrides::new()).unwrap();
        assert_eq!(&located, file, "name {name}");
        assert!(locator.matches(&name, file));
    }
}

#[test]
fn relative_import_names_locate() {
    let p = Project::new();
    write(&p.root, "contracts/lib/Math.sol", "");
    let resolver = p.resolver(&[]);
    let name = resolver.resolve_import("contracts/tokens/Token.sol", "../lib/Math.sol");
    assert_eq!(name, "contracts/lib/Math.sol");
    let located = resolver.locator().locate(&name, &Overrides::new()).unwrap();
    assert_eq!(located, p.root.join("contracts/lib/Math.sol"));
}

// ===========================================================================
// Graph construction
// ===========================================================================

#[test]
fn imports_through_include_path_and_remapping() {
    let p = Project::new();
    let token = write(
        &p.root,
        "contracts/Token.sol",
        r#"pragma solidity ^0.8.0;
import "@oz/token/ERC20.sol";
import {Math} from "utils/Math.sol";
import "console.sol";
"#,
    );
    write(
        &p.modules,
        "@oz/token/ERC20.sol",
        "pragma solidity >=0.8.4;\nimport \"../utils/Context.sol\";",
    );
    write(&p.modules, "@oz/utils/Context.sol", "pragma solidity ^0.8.0;");
    write(&p.root, "lib/utils/Math.sol", "pragma solidity >=0.7.0;");
    write(&p.bundled, "console.sol", "pragma solidity >=0.4.22 <0.9.0;");

    let resolver = p.resolver(&["utils/=lib/utils/"]);
    let (graph, bound) = GraphBuilder::new(&resolver)
        .build(&[token], &Overrides::new(), ParseMode::Strict)
        .unwrap();

    assert_eq!(
        graph.names(),
        vec![
            "@oz/token/ERC20.sol",
            "@oz/utils/Context.sol",
            "console.sol",
            "contracts/Token.sol",
            "lib/utils/Math.sol",
        ]
    );
    assert_eq!(bound["console.sol"], p.bundled.join("console.sol"));
    assert_eq!(graph.sinks(), vec!["contracts/Token.sol"]);

    let units = partition(&graph);
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].len(), 5);
    assert_eq!(units[0].versions.to_string(), ">=0.8.4 <0.9.0");
}

#[test]
fn ambiguous_import_reports_candidates() {
    let p = Project::new();
    let main = write(&p.root, "Main.sol", "import \"Shared.sol\";");
    write(&p.root, "Shared.sol", "");
    write(&p.modules, "Shared.sol", "");
    let resolver = p.resolver(&[]);

    let err = GraphBuilder::new(&resolver)
        .build(std::slice::from_ref(&main), &Overrides::new(), ParseMode::Strict)
        .unwrap_err();
    match err {
        GraphError::AmbiguousImport { name, candidates } => {
            assert_eq!(name, "Shared.sol");
            assert_eq!(candidates.len(), 2);
        }
        other => panic!("unexpected error: {other}"),
    }

    let (graph, _) = GraphBuilder::new(&resolver)
        .build(&[main], &Overrides::new(), ParseMode::Lenient)
        .unwrap();
    assert!(graph
        .get("Main.sol")
        .unwrap()
        .unresolved_imports
        .contains("Shared.sol"));
}

#[test]
fn seeds_with_same_name_from_different_roots_clash() {
    let p = Project::new();
    let a = write(&p.root, "X.sol", "");
    let b = write(&p.bundled, "X.sol", "");
    let resolver = p.resolver(&[]);
    let err = GraphBuilder::new(&resolver)
        .build(&[a, b], &Overrides::new(), ParseMode::Lenient)
        .unwrap_err();
    assert!(matches!(err, GraphError::DuplicateSourceUnitName { ref name, .. } if name == "X.sol"));
}

#[test]
fn malformed_pragma_by_mode() {
    let p = Project::new();
    let bad = write(&p.root, "Bad.sol", "pragma solidity ^0.0.0;\ncontract Bad {}");
    let resolver = p.resolver(&[]);
    let builder = GraphBuilder::new(&resolver);

    let (graph, _) = builder
        .build(std::slice::from_ref(&bad), &Overrides::new(), ParseMode::Lenient)
        .unwrap();
    assert!(graph.get("Bad.sol").unwrap().versions.contains(&"0.8.0".parse().unwrap()));

    let err = builder
        .build(&[bad], &Overrides::new(), ParseMode::Strict)
        .unwrap_err();
    assert!(matches!(err, GraphError::PreParse { .. }));
}

// ===========================================================================
// Partitioning
// ===========================================================================

#[test]
fn independent_contracts_partition_and_merge() {
    let p = Project::new();
    let seeds = [
        write(&p.root, "A.sol", "pragma solidity ^0.8.0;\nimport \"./Lib.sol\";"),
        write(&p.root, "B.sol", "pragma solidity >=0.8.10;\nimport \"./Lib.sol\";"),
        write(&p.root, "Old.sol", "pragma solidity ^0.6.0;"),
        write(&p.root, "Lib.sol", "pragma solidity >=0.6.0;"),
    ];
    let resolver = p.resolver(&[]);
    let (graph, _) = GraphBuilder::new(&resolver)
        .build(&seeds, &Overrides::new(), ParseMode::Lenient)
        .unwrap();

    let units = partition(&graph);
    assert_eq!(units.len(), 3);
    for unit in &units {
        for name in &unit.names {
            for import in graph.imports_of(name) {
                assert!(unit.names.contains(import), "{name} imports {import}");
            }
        }
    }

    let merged = merge_units(&graph, units, &"0.6.2".parse().unwrap(), None);
    assert_eq!(merged.len(), 2);
    let names: Vec<Vec<&str>> = merged
        .iter()
        .map(|u| u.names.iter().map(String::as_str).collect())
        .collect();
    assert_eq!(names[0], vec!["Old.sol"]);
    assert_eq!(names[1], vec!["A.sol", "B.sol", "Lib.sol"]);
}
