//! Integration tests for configuration loading.
//!
//! These tests compose real project directories through the public
//! `asset_composer::config::load` entry point and check the resolved tree,
//! the entry injection and the layer order.

mod common;

use asset_composer::config::{load, LoadOptions};
use asset_composer::error::Error;
use asset_composer::merge::merge;
use chrono::{TimeZone, Utc};
use common::prelude::*;
use serde_json::json;
use serial_test::serial;

fn options(fixture: &ProjectFixture) -> LoadOptions {
    LoadOptions::new(fixture.context())
        .with_debug(false)
        .with_now(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap())
}

#[test]
fn test_later_layers_win_and_arrays_replace() {
    let default = json!({"path": {"base": "./"}, "ignore": ["a"]});
    let debug = json!({"path": {"base": "./dev/"}});
    let task = json!({"ignore": ["b"]});

    let merged = merge(&default, &[&debug, &task]).unwrap();
    assert_eq!(merged["path"]["base"], "./dev/");
    assert_eq!(merged["ignore"], json!(["b"]));
}

#[test]
fn test_minimal_project() {
    let fixture = ProjectFixture::new().with_manifest(manifests::MINIMAL);
    let context = fixture.context();
    let resolved = load(&options(&fixture)).unwrap();

    assert_eq!(resolved.context.directory, context);
    assert_eq!(resolved.get("name"), Some(&json!("fixture")));
    assert_eq!(
        resolved.get("path.context"),
        Some(&json!(format!("{}/", context.display())))
    );
    assert_eq!(
        resolved.get("injection.entry.normalized"),
        Some(&json!({"index": ["./source/index.js"]}))
    );
    assert_eq!(resolved.get("needed"), Some(&json!({"javaScript": true})));
    assert_eq!(
        resolved.get("module.locations.filePaths"),
        Some(&json!([context.join("source/index.js")]))
    );
}

#[test]
fn test_applied_layers_in_order() {
    let fixture = ProjectFixture::new().with_manifest(manifests::DEBUG);
    let resolved = load(
        &LoadOptions::new(fixture.context())
            .with_task("serve")
            .with_cli_json(r#"{"custom": true}"#),
    )
    .unwrap();

    insta::assert_json_snapshot!(resolved.layers, @r###"
    [
      {
        "kind": "default",
        "name": "default"
      },
      {
        "kind": "debug",
        "name": "debug"
      },
      {
        "kind": "task",
        "name": "serve"
      },
      {
        "kind": "manifest",
        "name": "manifest"
      },
      {
        "kind": "dynamic-file",
        "name": "command-line"
      },
      {
        "kind": "cli-json",
        "name": "cli-json"
      }
    ]
    "###);
}

#[test]
fn test_task_blocks_from_manifest() {
    let fixture = ProjectFixture::new().with_manifest(
        r#"{"assetComposer": {
            "serve": {"development": {"server": {"port": 9000}}},
            "build": {"development": {"server": {"port": 1}}}
        }}"#,
    );
    let resolved = load(&options(&fixture).with_task("serve")).unwrap();

    assert_eq!(resolved.get("development.server.port"), Some(&json!(9000)));
    assert_eq!(resolved.get("development.openBrowser"), Some(&json!(true)));
    assert!(resolved.get("serve").is_none());
    assert!(resolved.get("build").is_none());
}

#[test]
fn test_document_task_moves_target() {
    let fixture = ProjectFixture::new().with_manifest(manifests::MINIMAL);
    let context = fixture.context();
    let resolved = load(&options(&fixture).with_task("document")).unwrap();
    assert_eq!(
        resolved.get("path.target.base"),
        Some(&json!(format!("{}/apiDocumentation/", context.display())))
    );
}

#[test]
fn test_style_only_project_does_not_need_scripts() {
    let fixture = ProjectFixture::new()
        .with_manifest(r#"{"assetComposer": {"injection": {"entry": "./source/style.css"}}}"#)
        .with_file("source/style.css", "body {}");
    let resolved = load(&options(&fixture).with_task("serve")).unwrap();

    assert_eq!(
        resolved.get("needed"),
        Some(&json!({"javaScript": false, "cascadingStyleSheet": true}))
    );
}

#[test]
fn test_debug_serve_needs_scripts() {
    let fixture = ProjectFixture::new()
        .with_manifest(r#"{"assetComposer": {"injection": {"entry": "./source/style.css"}}}"#)
        .with_file("source/style.css", "body {}");
    let resolved = load(&options(&fixture).with_debug(true).with_task("serve")).unwrap();

    assert!(resolved.debug);
    assert_eq!(
        resolved.get("needed"),
        Some(&json!({"javaScript": true, "cascadingStyleSheet": true}))
    );
}

#[test]
fn test_explicit_chunks_and_aliases() {
    let fixture = ProjectFixture::new()
        .with_manifest(manifests::CHUNKS)
        .with_file("source/style.css", "body {}");
    let resolved = load(&options(&fixture)).unwrap();

    assert_eq!(
        resolved.get("injection.entry.normalized"),
        Some(&json!({"main": ["app"], "style": ["./source/style.css"]}))
    );
    assert_eq!(
        resolved.get("injection.entry.given"),
        Some(&json!({"main": ["app"], "style": ["./source/style.css"], "empty": []}))
    );
    assert_eq!(
        resolved.injection.modules["style"][0].asset_type.as_deref(),
        Some("cascadingStyleSheet")
    );
}

#[test]
fn test_library_leaves_bare_dependencies_external() {
    let fixture = ProjectFixture::new().with_manifest(manifests::LIBRARY);
    let resolved = load(&options(&fixture)).unwrap();

    assert_eq!(resolved.get("library"), Some(&json!(true)));
    assert_eq!(resolved.get("offline"), Some(&json!(false)));
    assert_eq!(resolved.get("injection.external"), Some(&json!(["lodash"])));
}

#[test]
fn test_unresolvable_entry_names_chunk() {
    let fixture = ProjectFixture::new()
        .with_manifest(r#"{"assetComposer": {"injection": {"entry": {"admin": "./missing"}}}}"#);
    match load(&options(&fixture)) {
        Err(Error::UnresolvableModule { request, chunk }) => {
            assert_eq!(request, "./missing");
            assert_eq!(chunk, "admin");
        }
        other => panic!("expected an unresolvable module, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_auto_discovery_with_own_chunks() {
    let fixture = ProjectFixture::new()
        .with_manifest(
            r#"{"assetComposer": {"injection": {
                "ownChunkDirectoryPattern": "^admin$",
                "ignorePattern": ["draft/*"]
            }}}"#,
        )
        .with_file("source/admin/panel.js", "")
        .with_file("source/draft/unused.js", "")
        .with_file("node_modules/dependency/index.js", "");
    let resolved = load(&options(&fixture)).unwrap();

    assert_eq!(
        resolved.get("injection.entry.normalized"),
        Some(&json!({
            "admin": ["./source/admin/panel.js"],
            "index": ["./source/index.js"]
        }))
    );
}

#[test]
fn test_reference_splices_manifest_section() {
    let fixture = ProjectFixture::new().with_manifest(
        r#"{"assetComposer": {"production": {"hashAlgorithm": "sha256", "encoding": "latin1"}}}"#,
    );
    let resolved = load(
        &options(&fixture).with_cli_json(r#"{"__reference__": "production", "encoding": "utf-8"}"#),
    )
    .unwrap();

    assert_eq!(resolved.get("hashAlgorithm"), Some(&json!("sha256")));
    assert_eq!(resolved.get("encoding"), Some(&json!("latin1")));
    assert!(resolved.get("__reference__").is_none());
}

#[test]
fn test_malformed_override_is_reported() {
    let fixture = ProjectFixture::new().with_manifest(manifests::MINIMAL);
    let error = load(&options(&fixture).with_cli_json("{not json")).unwrap_err();
    assert!(matches!(error, Error::ConfigParse { .. }));
}

#[test]
fn test_manifest_expressions_read_resolved_paths() {
    let fixture = ProjectFixture::new().with_manifest(
        r#"{"assetComposer": {
            "sourceName": {"__evaluate__": "path.basename(self.path.source.base)"},
            "hasEntry": {"__evaluate__": "fs.isFile(self.path.source.base + 'index.js')"},
            "stamp": {"__evaluate__": "nowUTCTimestamp"}
        }}"#,
    );
    let resolved = load(&options(&fixture)).unwrap();

    assert_eq!(resolved.get("sourceName"), Some(&json!("source")));
    assert_eq!(resolved.get("hasEntry"), Some(&json!(true)));
    assert_eq!(resolved.get("stamp"), Some(&json!(1704164645)));
}

#[test]
fn test_cyclic_expressions_fail() {
    let fixture = ProjectFixture::new().with_manifest(
        r#"{"assetComposer": {
            "a": {"__evaluate__": "self.b"},
            "b": {"__evaluate__": "self.a"}
        }}"#,
    );
    assert!(matches!(
        load(&options(&fixture)),
        Err(Error::CyclicConfiguration { .. })
    ));
}

#[test]
fn test_dll_manifests_are_listed() {
    let fixture = ProjectFixture::new()
        .with_manifest(r#"{"assetComposer": {"dll": {"__evaluate__": "isDLLUseful"}}}"#)
        .with_file("build/vendor.dll-manifest.json", "{}");
    let context = fixture.context();
    let resolved = load(&options(&fixture).with_task("build")).unwrap();

    assert_eq!(
        resolved.dll_manifest_file_paths,
        vec![context.join("build/vendor.dll-manifest.json")]
    );
    assert_eq!(resolved.get("dll"), Some(&json!(true)));
}

#[test]
#[serial]
fn test_context_discovered_from_working_directory() {
    let fixture = ProjectFixture::new()
        .with_manifest(manifests::MINIMAL)
        .with_file("source/nested/deeper/file.txt", "");
    let context = fixture.context();
    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(context.join("source/nested/deeper")).unwrap();

    let result = load(&LoadOptions::default().with_debug(false));
    std::env::set_current_dir(previous).unwrap();

    assert_eq!(result.unwrap().context.directory, context);
}
