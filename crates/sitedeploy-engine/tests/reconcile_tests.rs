//! Reconcile behavior against an in-memory blob store

use std::io::{Cursor, Write};

use sitedeploy_core::{
    ContainerRef, CredentialRef, DeploymentRequest, DeploymentStatus, ErrorKind,
};
use sitedeploy_engine::Deployer;
use sitedeploy_store::{ListOptions, MemoryBlobStore, StoreError};
use zip::write::SimpleFileOptions;

fn request(version: &str) -> DeploymentRequest {
    DeploymentRequest::new(
        CredentialRef::new("tenant", "client", "secret"),
        "mysite",
        version,
        "mypackages",
    )
}

fn web() -> ContainerRef {
    ContainerRef::new("mysite", "$web")
}

fn packages() -> ContainerRef {
    ContainerRef::new("mypackages", "packages")
}

fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Destination published at `published`, package for each of `versions` available
fn seeded_store(published: &str, versions: &[(&str, &[(&str, &[u8])])]) -> MemoryBlobStore {
    let store = MemoryBlobStore::new();
    store.put_object(&web(), "index.html", "<html>old</html>", &[("version", published)]);
    store.put_object(&web(), "app.js", "old()", &[("version", published)]);
    store.create_container(&packages());
    for (version, entries) in versions {
        store.put_object(&packages(), format!("{}.zip", version), build_zip(entries), &[]);
    }
    store
}

mod idempotence {
    use super::*;

    #[tokio::test]
    async fn test_matching_version_is_skipped_without_transfers() {
        let store = seeded_store("1.0.0", &[("1.0.0", &[("index.html", b"<html/>")])]);
        let deployer = Deployer::new(store.clone());

        let outcome = deployer.reconcile(&request("1.0.0")).await;

        assert_eq!(outcome.status, DeploymentStatus::Skipped);
        assert_eq!(outcome.resulting_version.as_deref(), Some("1.0.0"));
        assert!(outcome.error.is_none());

        let counts = store.operation_counts();
        assert_eq!(counts.downloads, 0);
        assert_eq!(counts.uploads, 0);
        assert_eq!(counts.lists, 1);
    }

    #[tokio::test]
    async fn test_second_run_after_success_is_skipped() {
        let store = seeded_store(
            "1.0.0",
            &[("1.1.0", &[("index.html", b"<html>new</html>"), ("app.js", b"new()")])],
        );
        let deployer = Deployer::new(store.clone());

        let first = deployer.reconcile(&request("1.1.0")).await;
        assert_eq!(first.status, DeploymentStatus::Success);

        store.reset_counts();
        let second = deployer.reconcile(&request("1.1.0")).await;

        assert_eq!(second.status, DeploymentStatus::Skipped);
        assert_eq!(second.resulting_version.as_deref(), Some("1.1.0"));
        let counts = store.operation_counts();
        assert_eq!(counts.downloads, 0);
        assert_eq!(counts.uploads, 0);
    }

    #[tokio::test]
    async fn test_version_comparison_is_case_sensitive() {
        let store = seeded_store("v2.0.0", &[("V2.0.0", &[("index.html", b"<html/>")])]);
        let deployer = Deployer::new(store.clone());

        let outcome = deployer.reconcile(&request("V2.0.0")).await;

        assert_eq!(outcome.status, DeploymentStatus::Success);
        assert_eq!(store.downloaded(), vec!["V2.0.0.zip"]);
    }
}

mod publish {
    use super::*;

    #[tokio::test]
    async fn test_mismatch_publishes_every_entry() {
        let store = seeded_store(
            "1.0.0",
            &[
                ("1.0.0", &[("index.html", b"<html>1.0.0</html>")]),
                (
                    "1.1.0",
                    &[
                        ("index.html", b"<html>1.1.0</html>"),
                        ("assets/site.css", b"body{}"),
                        ("assets/img/logo.svg", b"<svg/>"),
                    ],
                ),
            ],
        );
        let deployer = Deployer::new(store.clone());

        let outcome = deployer.reconcile(&request("1.1.0")).await;

        assert_eq!(outcome.status, DeploymentStatus::Success);
        assert_eq!(outcome.resulting_version.as_deref(), Some("1.1.0"));
        assert_eq!(outcome.files_published, 3);

        assert_eq!(store.downloaded(), vec!["1.1.0.zip"]);

        let mut uploaded = store.uploaded();
        uploaded.sort();
        assert_eq!(
            uploaded,
            vec!["assets/img/logo.svg", "assets/site.css", "index.html"]
        );

        for name in &uploaded {
            let object = store.object(&web(), name).unwrap();
            assert_eq!(
                object.tags.get("version").map(String::as_str),
                Some("1.1.0"),
                "{} should carry the new version",
                name
            );
        }

        let css = store.object(&web(), "assets/site.css").unwrap();
        assert_eq!(css.content.as_ref(), b"body{}");
        assert_eq!(css.content_type.as_deref(), Some("text/css; charset=utf-8"));
    }

    #[tokio::test]
    async fn test_files_missing_from_package_are_left_in_place() {
        let store = seeded_store("1.0.0", &[("1.1.0", &[("index.html", b"<html/>")])]);
        let deployer = Deployer::new(store.clone());

        let outcome = deployer.reconcile(&request("1.1.0")).await;

        assert_eq!(outcome.status, DeploymentStatus::Success);
        let old = store.object(&web(), "app.js").unwrap();
        assert_eq!(old.tags.get("version").map(String::as_str), Some("1.0.0"));
    }

    #[tokio::test]
    async fn test_custom_tag_key_and_containers() {
        let store = MemoryBlobStore::new();
        let site = ContainerRef::new("mysite", "site");
        let releases = ContainerRef::new("mypackages", "releases");
        store.put_object(&site, "home.html", "<html/>", &[("release", "7")]);
        store.put_object(&releases, "8.zip", build_zip(&[("home.html", b"<html>8</html>")]), &[]);

        let request = request("8")
            .with_container("site")
            .with_marker_file("home.html")
            .with_tag_key("release")
            .with_package_container("releases");

        let outcome = Deployer::new(store.clone()).reconcile(&request).await;

        assert_eq!(outcome.status, DeploymentStatus::Success);
        let home = store.object(&site, "home.html").unwrap();
        assert_eq!(home.content.as_ref(), b"<html>8</html>");
        assert_eq!(home.tags.get("release").map(String::as_str), Some("8"));
    }
}

mod resolution_failures {
    use super::*;

    #[tokio::test]
    async fn test_marker_missing_fails() {
        let store = MemoryBlobStore::new();
        store.put_object(&web(), "app.js", "x", &[("version", "1.0.0")]);
        store.put_object(&packages(), "1.0.0.zip", build_zip(&[("index.html", b"x")]), &[]);

        let outcome = Deployer::new(store.clone()).reconcile(&request("1.0.0")).await;

        assert_eq!(outcome.status, DeploymentStatus::Failed);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::MarkerNotFound));
        assert_eq!(outcome.resulting_version, None);
        assert_eq!(store.operation_counts().downloads, 0);
        assert_eq!(store.operation_counts().uploads, 0);
    }

    #[tokio::test]
    async fn test_tag_missing_fails() {
        let store = MemoryBlobStore::new();
        store.put_object(&web(), "index.html", "<html/>", &[("owner", "web-team")]);

        let outcome = Deployer::new(store.clone()).reconcile(&request("1.0.0")).await;

        assert_eq!(outcome.status, DeploymentStatus::Failed);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::VersionTagNotFound));
        let message = &outcome.error.as_ref().unwrap().message;
        assert!(message.contains("index.html"));
        assert!(message.contains("version"));
    }

    #[tokio::test]
    async fn test_unavailable_destination_fails() {
        let store = MemoryBlobStore::new();

        let outcome = Deployer::new(store).reconcile(&request("1.0.0")).await;

        assert_eq!(outcome.error_kind(), Some(ErrorKind::ContainerUnavailable));
    }

    #[tokio::test]
    async fn test_resolution_stops_at_marker() {
        let store = MemoryBlobStore::new().with_page_size(2);
        for name in ["a.css", "b.js", "index.html", "x.png", "y.png", "z.png", "zz.png"] {
            store.put_object(&web(), name, "x", &[("version", "3.0.0")]);
        }

        let outcome = Deployer::new(store.clone()).reconcile(&request("3.0.0")).await;

        assert_eq!(outcome.status, DeploymentStatus::Skipped);
        let counts = store.operation_counts();
        assert_eq!(counts.pages, 2);
        assert!(counts.listed_objects < 7);
    }

    #[tokio::test]
    async fn test_resolution_is_repeated_every_attempt() {
        let store = seeded_store("1.0.0", &[]);
        let deployer = Deployer::new(store.clone());

        deployer.reconcile(&request("1.0.0")).await;
        store.put_object(&web(), "index.html", "<html/>", &[("version", "0.9.0")]);
        let published = deployer.resolve(&request("1.0.0")).await.unwrap();

        assert_eq!(published.version, "0.9.0");
        assert_eq!(store.operation_counts().lists, 2);
    }
}

mod package_failures {
    use super::*;

    #[tokio::test]
    async fn test_corrupt_archive_uploads_nothing() {
        let store = seeded_store("1.0.0", &[]);
        store.put_object(&packages(), "1.1.0.zip", "definitely not a zip", &[]);

        let outcome = Deployer::new(store.clone()).reconcile(&request("1.1.0")).await;

        assert_eq!(outcome.status, DeploymentStatus::Failed);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::CorruptArchive));
        assert_eq!(store.operation_counts().uploads, 0);
    }

    #[tokio::test]
    async fn test_missing_package_fails_download() {
        let store = seeded_store("1.0.0", &[]);

        let outcome = Deployer::new(store.clone()).reconcile(&request("1.1.0")).await;

        assert_eq!(outcome.error_kind(), Some(ErrorKind::DownloadFailure));
        assert!(outcome.error.unwrap().message.contains("1.1.0.zip"));
        assert_eq!(store.operation_counts().uploads, 0);
    }

    #[tokio::test]
    async fn test_download_auth_failure_is_credential_invalid() {
        let store = seeded_store("1.0.0", &[("1.1.0", &[("index.html", b"x")])]);
        store.fail_downloads(StoreError::Unauthorized {
            status: 403,
            message: "AuthorizationPermissionMismatch".to_string(),
        });

        let outcome = Deployer::new(store).reconcile(&request("1.1.0")).await;

        assert_eq!(outcome.error_kind(), Some(ErrorKind::CredentialInvalid));
    }
}

mod upload_failures {
    use super::*;

    fn five_files() -> Vec<(&'static str, &'static [u8])> {
        vec![
            ("a.css", &b"a{}"[..]),
            ("b.js", &b"b()"[..]),
            ("c.svg", &b"<svg/>"[..]),
            ("d.txt", &b"d"[..]),
            ("index.html", &b"<html/>"[..]),
        ]
    }

    #[tokio::test]
    async fn test_third_upload_failure_fails_naming_the_file() {
        let files = five_files();
        let store = seeded_store("1.0.0", &[("2.0.0", &files)]);
        store.fail_upload_attempt(
            3,
            StoreError::HttpError {
                status: 500,
                code: Some("InternalError".to_string()),
                message: "Server encountered an internal error.".to_string(),
            },
        );

        let outcome = Deployer::new(store.clone()).reconcile(&request("2.0.0")).await;

        assert_eq!(outcome.status, DeploymentStatus::Failed);
        assert_ne!(outcome.status, DeploymentStatus::Success);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::UploadFailure));

        let failed_file = store.uploaded()[2].clone();
        let message = outcome.error.unwrap().message;
        assert!(
            message.contains(&format!("'{}'", failed_file)),
            "{} should name {}",
            message,
            failed_file
        );
        assert_eq!(store.operation_counts().failed_uploads, 1);
    }

    #[tokio::test]
    async fn test_retry_after_partial_publish_completes() {
        let files = five_files();
        let store = seeded_store("1.0.0", &[("2.0.0", &files)]);
        store.fail_upload_attempt(
            3,
            StoreError::NetworkError {
                message: "connection reset".to_string(),
            },
        );
        let deployer = Deployer::new(store.clone());

        let failed = deployer.reconcile(&request("2.0.0")).await;
        assert!(failed.is_failed());

        let marker = store.object(&web(), "index.html").unwrap();
        assert_eq!(marker.tags.get("version").map(String::as_str), Some("1.0.0"));

        let retried = deployer.reconcile(&request("2.0.0")).await;
        assert_eq!(retried.status, DeploymentStatus::Success);
        assert_eq!(retried.files_published, 5);
        for (name, _) in &files {
            let object = store.object(&web(), name).unwrap();
            assert_eq!(object.tags.get("version").map(String::as_str), Some("2.0.0"));
        }

        let again = deployer.reconcile(&request("2.0.0")).await;
        assert_eq!(again.status, DeploymentStatus::Skipped);
    }

    #[tokio::test]
    async fn test_marker_is_published_last() {
        let files: Vec<(&str, &[u8])> = vec![
            ("app.js", &b"new()"[..]),
            ("index.html", &b"<html>new</html>"[..]),
            ("static/app.js", &b"static()"[..]),
        ];
        let store = seeded_store("1.0.0", &[("2.0.0", &files)]);

        let outcome = Deployer::new(store.clone()).reconcile(&request("2.0.0")).await;

        assert_eq!(outcome.status, DeploymentStatus::Success);
        assert_eq!(
            store.uploaded(),
            vec!["app.js", "static/app.js", "index.html"]
        );
    }

    #[tokio::test]
    async fn test_failure_after_marker_name_is_repaired_on_retry() {
        let files: Vec<(&str, &[u8])> = vec![
            ("index.html", &b"<html>new</html>"[..]),
            ("static/app.js", &b"static()"[..]),
        ];
        let store = seeded_store("1.0.0", &[("2.0.0", &files)]);
        store.fail_upload_attempt(
            1,
            StoreError::NetworkError {
                message: "connection reset".to_string(),
            },
        );
        let deployer = Deployer::new(store.clone());

        let failed = deployer.reconcile(&request("2.0.0")).await;
        assert_eq!(failed.error_kind(), Some(ErrorKind::UploadFailure));
        assert!(failed.error.unwrap().message.contains("'static/app.js'"));

        let marker = store.object(&web(), "index.html").unwrap();
        assert_eq!(marker.tags.get("version").map(String::as_str), Some("1.0.0"));
        assert_eq!(marker.content.as_ref(), b"<html>old</html>");

        let retried = deployer.reconcile(&request("2.0.0")).await;
        assert_eq!(retried.status, DeploymentStatus::Success);

        let repaired = store.object(&web(), "static/app.js").unwrap();
        assert_eq!(repaired.content.as_ref(), b"static()");
        assert_eq!(repaired.tags.get("version").map(String::as_str), Some("2.0.0"));
    }
}

mod end_to_end {
    use super::*;
    use futures::TryStreamExt;
    use sitedeploy_store::BlobStore;

    #[tokio::test]
    async fn test_upgrade_from_1_9_0_to_2_0_0() {
        let store = MemoryBlobStore::new();
        store.put_object(&web(), "index.html", "<html>1.9.0</html>", &[("version", "1.9.0")]);
        store.put_object(
            &packages(),
            "2.0.0.zip",
            build_zip(&[("index.html", b"<html/>"), ("app.js", b"console.log(1)")]),
            &[],
        );

        let outcome = Deployer::new(store.clone()).reconcile(&request("2.0.0")).await;

        assert_eq!(outcome.status, DeploymentStatus::Success);
        assert_eq!(outcome.resulting_version.as_deref(), Some("2.0.0"));
        assert_eq!(outcome.files_published, 2);

        let mut uploaded = store.uploaded();
        uploaded.sort();
        assert_eq!(uploaded, vec!["app.js", "index.html"]);

        let index = store.object(&web(), "index.html").unwrap();
        assert_eq!(index.content.as_ref(), b"<html/>");
        let app = store.object(&web(), "app.js").unwrap();
        assert_eq!(app.content.as_ref(), b"console.log(1)");

        let container = web();
        let listed: Vec<_> = store
            .list_objects(&container, ListOptions::with_tags())
            .try_collect()
            .await
            .unwrap();
        assert!(listed.iter().all(|o| o.tag("version") == Some("2.0.0")));
    }
}
