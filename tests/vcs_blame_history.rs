//! Git-fixture-backed tests for `blame_file`/`entity_history`, building a
//! real two-commit repository with `git2` directly rather than mocking
//! `VcsBridge`.

use std::fs;
use std::path::Path;

use git2::Repository;

use sem_core::lang::ParserRegistry;
use sem_core::storage::{blame_file, entity_history};
use sem_core::vcs::GitBridge;

fn stage_and_commit(repo: &Repository, paths: &[&str], message: &str) {
    let mut index = repo.index().expect("index");
    for path in paths {
        index.add_path(Path::new(path)).expect("add path");
    }
    index.write().expect("write index");
    let tree_id = index.write_tree().expect("write tree");
    let tree = repo.find_tree(tree_id).expect("find tree");
    let sig = git2::Signature::now("Test", "test@example.com").expect("signature");

    let parents: Vec<git2::Commit> = repo
        .head()
        .ok()
        .and_then(|reference| reference.peel_to_commit().ok())
        .into_iter()
        .collect();

    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
        .expect("commit");
}

#[test]
fn blame_attributes_an_unchanged_function_to_the_introducing_commit() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let repo = Repository::init(root).unwrap();

    fs::write(root.join("lib.rs"), "fn greet() {}\n").unwrap();
    stage_and_commit(&repo, &["lib.rs"], "add greet");

    fs::write(root.join("lib.rs"), "fn greet() {}\nfn farewell() {}\n").unwrap();
    stage_and_commit(&repo, &["lib.rs"], "add farewell");

    let bridge = GitBridge::discover(root);
    let registry = ParserRegistry::with_builtins();
    let entries = blame_file(&bridge, &registry, "lib.rs", 10).unwrap();

    let greet = entries.iter().find(|e| e.entity_name == "greet").unwrap();
    let farewell = entries.iter().find(|e| e.entity_name == "farewell").unwrap();
    assert_ne!(greet.commit_sha, farewell.commit_sha);
}

#[test]
fn history_reports_added_then_modified_for_a_changed_function() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let repo = Repository::init(root).unwrap();

    fs::write(root.join("lib.rs"), "fn greet() {}\n").unwrap();
    stage_and_commit(&repo, &["lib.rs"], "add greet");

    fs::write(root.join("lib.rs"), "fn greet() { println!(\"hi\"); }\n").unwrap();
    stage_and_commit(&repo, &["lib.rs"], "flesh out greet");

    let bridge = GitBridge::discover(root);
    let registry = ParserRegistry::with_builtins();
    let transitions = entity_history(&bridge, &registry, "lib.rs", "greet", 10).unwrap();

    assert!(transitions.len() >= 2);
    let oldest = transitions.last().unwrap();
    assert_eq!(format!("{:?}", oldest.change_type), "Added");
}
