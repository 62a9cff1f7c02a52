//! Scenario 6: two repositories connected by an in-memory duplex.

use std::fs;
use std::path::Path;

use magicrepos::auth::AllowAll;
use magicrepos::config::NullConfig;
use magicrepos::repo::Repository;
use magicrepos_protocol::{pull, push, serve, BareRepo};

fn count_loose_objects(objects_dir: &Path) -> usize {
    let mut count = 0;
    if !objects_dir.is_dir() {
        return 0;
    }
    for prefix in fs::read_dir(objects_dir).unwrap() {
        let prefix = prefix.unwrap().path();
        if prefix.is_dir() {
            count += fs::read_dir(&prefix).unwrap().count();
        }
    }
    count
}

#[tokio::test]
async fn push_then_pull_round_trip() {
    let client_dir = tempfile::tempdir().unwrap();
    let base_dir = tempfile::tempdir().unwrap();

    let repo = Repository::init(client_dir.path()).unwrap();
    fs::write(client_dir.path().join("a.txt"), "hello").unwrap();
    repo.stage("a.txt").unwrap();
    let commit_id = repo.commit("c1", &NullConfig).unwrap();

    // --- push A -> server ---
    let (mut client_side, mut server_side) = tokio::io::duplex(16 * 1024);
    let base_dir_path = base_dir.path().to_path_buf();
    let server = tokio::spawn(async move {
        serve(&mut server_side, &base_dir_path, "ada", &AllowAll).await
    });
    push(&mut client_side, &repo, "ada", "engine").await.unwrap();
    server.await.unwrap().unwrap();

    let bare = BareRepo::open(base_dir.path(), "ada", "engine").unwrap();
    assert_eq!(bare.refs().resolve_branch("main").unwrap(), Some(commit_id));

    // exactly the closure of C: one blob, one tree, one commit.
    assert_eq!(count_loose_objects(bare.store().objects_dir()), 3);

    // --- pull server -> B ---
    let pull_client_dir = tempfile::tempdir().unwrap();
    let pull_repo = Repository::init(pull_client_dir.path()).unwrap();

    let (mut client_side2, mut server_side2) = tokio::io::duplex(16 * 1024);
    let base_dir_path2 = base_dir.path().to_path_buf();
    let server2 = tokio::spawn(async move {
        serve(&mut server_side2, &base_dir_path2, "ada", &AllowAll).await
    });
    let advertised = pull(&mut client_side2, &pull_repo, "ada", "engine", "origin").await.unwrap();
    server2.await.unwrap().unwrap();

    assert!(advertised.iter().any(|(name, id)| name == "refs/heads/main" && *id == commit_id));
    assert_eq!(
        pull_repo.refs().read_ref("refs/remotes/origin/main").unwrap(),
        Some(commit_id)
    );
    assert!(pull_repo.store().exists(commit_id));

    // --- pulling again is a no-op: Ok, no new objects ---
    let (mut client_side3, mut server_side3) = tokio::io::duplex(16 * 1024);
    let base_dir_path3 = base_dir.path().to_path_buf();
    let server3 = tokio::spawn(async move {
        serve(&mut server_side3, &base_dir_path3, "ada", &AllowAll).await
    });
    let objects_before = count_loose_objects(&pull_client_dir.path().join(".magicrepos/objects"));
    pull(&mut client_side3, &pull_repo, "ada", "engine", "origin").await.unwrap();
    server3.await.unwrap().unwrap();
    let objects_after = count_loose_objects(&pull_client_dir.path().join(".magicrepos/objects"));
    assert_eq!(objects_before, objects_after);
}

#[tokio::test]
async fn pull_from_empty_repository_yields_no_refs() {
    let base_dir = tempfile::tempdir().unwrap();
    BareRepo::create(base_dir.path(), "ada", "empty").unwrap();

    let client_dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(client_dir.path()).unwrap();

    let (mut client_side, mut server_side) = tokio::io::duplex(4096);
    let base_dir_path = base_dir.path().to_path_buf();
    let server = tokio::spawn(async move { serve(&mut server_side, &base_dir_path, "ada", &AllowAll).await });

    let advertised = pull(&mut client_side, &repo, "ada", "empty", "origin").await.unwrap();
    server.await.unwrap().unwrap();
    assert!(advertised.is_empty());
}

#[tokio::test]
async fn push_is_rejected_for_an_unauthorized_user() {
    use magicrepos::auth::SingleOwnerAuth;

    let client_dir = tempfile::tempdir().unwrap();
    let base_dir = tempfile::tempdir().unwrap();

    let repo = Repository::init(client_dir.path()).unwrap();
    fs::write(client_dir.path().join("a.txt"), "hello").unwrap();
    repo.stage("a.txt").unwrap();
    repo.commit("c1", &NullConfig).unwrap();

    let (mut client_side, mut server_side) = tokio::io::duplex(16 * 1024);
    let base_dir_path = base_dir.path().to_path_buf();
    let server = tokio::spawn(async move {
        serve(&mut server_side, &base_dir_path, "mallory", &SingleOwnerAuth).await
    });

    let result = push(&mut client_side, &repo, "ada", "engine").await;
    assert!(result.is_err());
    assert!(server.await.unwrap().is_err());
    assert!(!BareRepo::exists(base_dir.path(), "ada", "engine"));
}
