//! End-to-end runs against a mocked GitHub: release API + zipball download.

mod common;

use common::{list_files, package_ids, read_json, write_descriptor, zipball};
use extrepo::helpers::acquire::HttpClient;
use extrepo::{
    Outcome, ReleaseMaterializer, RemoteQueryResolver, SyncConfig, SyncDriver, descriptor,
};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BASE_URL: &str = "https://ext.example.com/";

/// Publish `tag` for `owner/<repo>` with a zipball containing `files`.
async fn publish(server: &MockServer, repo: &str, tag: &str, files: &[(&str, &str)], downloads: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/owner/{}/releases/latest", repo)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "tag_name": tag,
            "zipball_url": format!("{}/zipball/{}/{}", server.uri(), repo, tag),
        })))
        .mount(server)
        .await;

    let root = format!("owner-{}-abc1234", repo);
    Mock::given(method("GET"))
        .and(path(format!("/zipball/{}/{}", repo, tag)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(zipball(&root, files)))
        .expect(downloads)
        .mount(server)
        .await;
}

async fn unreleased(server: &MockServer, repo: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/owner/{}/releases/latest", repo)))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

fn driver(server: &MockServer, public: &Path, jobs: usize) -> SyncDriver {
    let client = HttpClient::new(Duration::from_secs(10), Some("token".into()));
    SyncDriver::new(
        SyncConfig::new(public, BASE_URL).with_jobs(jobs),
        Box::new(RemoteQueryResolver::new(client.clone(), server.uri())),
        Box::new(ReleaseMaterializer::new(client)),
    )
}

#[tokio::test]
async fn test_release_is_materialized_without_root_or_hidden_entries() {
    let server = MockServer::start().await;
    publish(
        &server,
        "folders",
        "1.3.0",
        &[
            ("index.html", "<html>"),
            ("dist/app.js", "app"),
            (".git/config", "[core]"),
            (".gitignore", "node_modules"),
        ],
        1,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let extensions = dir.path().join("extensions");
    let public = dir.path().join("public");
    write_descriptor(&extensions, "folders.yaml", "folders", "");

    let descriptors = descriptor::discover(&extensions).unwrap().descriptors;
    let report = driver(&server, &public, 1).run(descriptors).unwrap();

    assert_eq!(report.updated(), 1);
    assert_eq!(
        list_files(&public.join("folders/1.3.0")),
        vec!["dist/app.js", "index.html"]
    );
    assert!(!public.join("folders/1.3.0.zip").exists());

    let package = read_json(&public.join("folders/index.json"));
    assert_eq!(package["version"], "1.3.0");
    assert_eq!(
        package["url"],
        "https://ext.example.com/folders/1.3.0/index.html"
    );
    assert_eq!(
        package["download_url"],
        "https://github.com/owner/folders/archive/1.3.0.zip"
    );
    assert_eq!(
        package["latest_url"],
        "https://ext.example.com/folders/index.json"
    );
    // No description or flags in the descriptor, so no keys at all.
    assert!(package.get("description").is_none());
    assert!(package.get("flags").is_none());
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let server = MockServer::start().await;
    // Exactly one download across both runs.
    publish(&server, "folders", "1.3.0", &[("index.html", "<html>")], 1).await;
    publish(&server, "notes", "0.9.1", &[("index.html", "notes")], 1).await;

    let dir = TempDir::new().unwrap();
    let extensions = dir.path().join("extensions");
    let public = dir.path().join("public");
    write_descriptor(&extensions, "folders.yaml", "folders", "description: Folders\n");
    write_descriptor(&extensions, "notes.yaml", "notes", "");

    let first = driver(&server, &public, 2)
        .run(descriptor::discover(&extensions).unwrap().descriptors)
        .unwrap();
    let root_after_first = std::fs::read(public.join("index.json")).unwrap();
    let files_after_first = list_files(&public);

    let second = driver(&server, &public, 2)
        .run(descriptor::discover(&extensions).unwrap().descriptors)
        .unwrap();

    assert_eq!(first.updated(), 2);
    assert_eq!(second.updated(), 0);
    assert_eq!(second.up_to_date(), 2);
    assert_eq!(std::fs::read(public.join("index.json")).unwrap(), root_after_first);
    assert_eq!(list_files(&public), files_after_first);
}

#[tokio::test]
async fn test_new_release_adds_a_version_directory() {
    let server = MockServer::start().await;
    publish(&server, "folders", "2.0.0", &[("index.html", "v2")], 1).await;

    let dir = TempDir::new().unwrap();
    let extensions = dir.path().join("extensions");
    let public = dir.path().join("public");
    write_descriptor(&extensions, "folders.yaml", "folders", "");
    std::fs::create_dir_all(public.join("folders/1.0.0")).unwrap();
    std::fs::write(public.join("folders/1.0.0/index.html"), "v1").unwrap();

    driver(&server, &public, 1)
        .run(descriptor::discover(&extensions).unwrap().descriptors)
        .unwrap();

    // Older versions are never removed.
    assert!(public.join("folders/1.0.0/index.html").exists());
    assert_eq!(
        std::fs::read_to_string(public.join("folders/2.0.0/index.html")).unwrap(),
        "v2"
    );
    assert_eq!(read_json(&public.join("folders/index.json"))["version"], "2.0.0");
}

#[tokio::test]
async fn test_ordering_and_failure_isolation() {
    let server = MockServer::start().await;
    publish(&server, "a", "1.0", &[("index.html", "a")], 1).await;
    publish(&server, "b", "1.0", &[("index.html", "b")], 1).await;
    publish(&server, "m", "1.0", &[("index.html", "m")], 1).await;
    publish(&server, "z", "1.0", &[("index.html", "z")], 1).await;
    unreleased(&server, "c").await;

    let dir = TempDir::new().unwrap();
    let extensions = dir.path().join("extensions");
    let public = dir.path().join("public");
    write_descriptor(&extensions, "b.yaml", "b", "");
    write_descriptor(&extensions, "c.yaml", "c", "");
    write_descriptor(&extensions, "a.yaml", "a", "");
    write_descriptor(&extensions, "z-theme.yaml", "z", "");
    write_descriptor(&extensions, "m-theme.yaml", "m", "");

    let report = driver(&server, &public, 4)
        .run(descriptor::discover(&extensions).unwrap().descriptors)
        .unwrap();

    let root = read_json(&public.join("index.json"));
    assert_eq!(root["content_type"], "SN|Repo");
    assert_eq!(root["valid_until"], "2030-05-16T18:35:33.000Z");
    assert_eq!(
        package_ids(&root),
        vec![
            "org.example.a",
            "org.example.b",
            "org.example.m",
            "org.example.z"
        ]
    );

    assert_eq!(report.failed(), 1);
    let failed = report
        .packages
        .iter()
        .find(|p| matches!(p.outcome, Outcome::Failed(_)))
        .unwrap();
    assert_eq!(failed.identifier, "org.example.c");
    assert!(!public.join("c").exists());
}

#[tokio::test]
async fn test_corrupt_archive_leaves_no_version_directory() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/owner/broken/releases/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "tag_name": "1.0.0",
            "zipball_url": format!("{}/zipball/broken/1.0.0", server.uri()),
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/zipball/broken/1.0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not a zip</html>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let extensions = dir.path().join("extensions");
    let public = dir.path().join("public");
    write_descriptor(&extensions, "broken.yaml", "broken", "");

    let report = driver(&server, &public, 1)
        .run(descriptor::discover(&extensions).unwrap().descriptors)
        .unwrap();

    assert_eq!(report.failed(), 1);
    assert!(!public.join("broken/1.0.0").exists());
    assert!(!public.join("broken/1.0.0.zip").exists());
    assert!(package_ids(&read_json(&public.join("index.json"))).is_empty());
}

#[tokio::test]
async fn test_invalid_descriptor_does_not_stop_the_run() {
    let server = MockServer::start().await;
    publish(&server, "folders", "1.3.0", &[("index.html", "<html>")], 1).await;

    let dir = TempDir::new().unwrap();
    let extensions = dir.path().join("extensions");
    let public = dir.path().join("public");
    write_descriptor(&extensions, "folders.yaml", "folders", "");
    std::fs::write(
        extensions.join("nomain.yaml"),
        "id: org.example.nomain\nname: nomain\ncontent_type: SN|Component\ngithub: owner/nomain\n",
    )
    .unwrap();

    let discovered = descriptor::discover(&extensions).unwrap();
    assert_eq!(discovered.rejected.len(), 1);
    assert!(discovered.rejected[0].to_string().contains("nomain.yaml"));

    let report = driver(&server, &public, 1)
        .run(discovered.descriptors)
        .unwrap();

    assert_eq!(report.updated(), 1);
    assert_eq!(
        package_ids(&read_json(&public.join("index.json"))),
        vec!["org.example.folders"]
    );
}
