//! End-to-end backup runs: crawl, extract, write and download images

use adkeep::config::{Config, RetryConfig, SiteConfig, ThrottleConfig};
use adkeep::crawler::Coordinator;
use adkeep::output::LISTING_FILE;
use adkeep::{AdkeepError, BackupStats};
use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_PATH: &str = "/s-bestandsliste.html";

/// Encodes a 32x32 horizontal gradient
///
/// The ascending and descending gradients hash as far apart as possible,
/// re-encodes of the same gradient hash as near-identical.
fn gradient(ascending: bool, format: ImageOutputFormat) -> Vec<u8> {
    let img = GrayImage::from_fn(32, 32, |x, _| {
        let value = (x * 8) as u8;
        Luma([if ascending { value } else { 255 - value }])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img)
        .write_to(&mut buf, format)
        .expect("Failed to encode test image");
    buf.into_inner()
}

fn listing_page(ids: &[u32]) -> String {
    let items: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<article class="aditem"><h2 class="text-module-begin"><a href="/s-anzeige/ad-{0}/{0}">Ad {0}</a></h2></article>"#,
                id
            )
        })
        .collect();
    format!("<html><body><ul>{}</ul></body></html>", items)
}

fn ad_page(title: &str, images: &[&str]) -> String {
    let gallery: String = images
        .iter()
        .map(|src| format!(r#"<div class="galleryimage-element"><img src="{}"/></div>"#, src))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
  <body>
    {gallery}
    <a class="breadcrump-link" href="/s-moebel/c81"><span>Möbel</span></a>
    <a class="breadcrump-link" href="/s-stuehle/c82"><span>Stühle</span></a>
    <h1 id="viewad-title">{title}</h1>
    <h2 id="viewad-price">25 € VB</h2>
    <div id="viewad-extra-info"><div><span>02.01.2024</span></div></div>
    <ul class="addetailslist">
      <li class="addetailslist--detail">Zustand<span>Gut</span></li>
      <li class="addetailslist--detail">Farbe<span>Braun</span></li>
    </ul>
    <p id="viewad-description-text">Schöner Stuhl<br/>kaum benutzt</p>
  </body>
</html>"#
    )
}

fn test_config(server: &MockServer, outdir: &Path) -> Config {
    Config {
        outdir: outdir.display().to_string(),
        site: SiteConfig {
            base_url: server.uri(),
            listing_path: LISTING_PATH.to_string(),
        },
        throttle: ThrottleConfig {
            min_ms: 0,
            max_ms: 0,
        },
        retry: RetryConfig {
            max_retries: 0,
            base_delay_ms: 1,
        },
        ..Config::default()
    }
}

fn ad_link(server: &MockServer, slug: &str, id: u32) -> String {
    format!("{}/s-anzeige/{}/{}", server.uri(), slug, id)
}

/// Sorted file names in `dir`
fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to read directory")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

async fn mount_ad(server: &MockServer, slug: &str, id: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/s-anzeige/{}/{}", slug, id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_image(server: &MockServer, image_path: &str, data: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(image_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(data))
        .mount(server)
        .await;
}

async fn run(config: Config) -> Result<BackupStats, AdkeepError> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}

#[tokio::test]
async fn test_full_user_crawl() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("pageNum", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[4, 5, 6])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("pageNum", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("userId", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[1, 2, 3])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/s-anzeige/ad-\d+/\d+$"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(ad_page("Holzstuhl", &["/img/1.png"])),
        )
        .expect(6)
        .mount(&server)
        .await;

    mount_image(&server, "/img/1.png", gradient(true, ImageOutputFormat::Png)).await;

    let config = Config {
        user: 42,
        ..test_config(&server, tmp.path())
    };
    let stats = run(config).await.unwrap();

    assert_eq!(stats, BackupStats { ads: 6, images: 6 });

    for id in 1..=6 {
        let dir = tmp.path().join(format!("ad-{}", id));
        assert_eq!(files_in(&dir), vec!["1.png", LISTING_FILE]);

        let listing = std::fs::read_to_string(dir.join(LISTING_FILE)).unwrap();
        assert!(listing.contains("Title: Holzstuhl"));
        assert!(listing.contains(&format!("Id: {}", id)));
        assert!(listing.contains("Category: Möbel => Stühle"));
        assert!(listing.contains("Condition: Gut"));
        assert!(listing.contains("Expire: 02.03.2024"));
        assert!(listing.contains("Schöner Stuhl\nkaum benutzt"));
    }
}

#[tokio::test]
async fn test_limit_truncates_ads() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(query_param("pageNum", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[1, 2, 3])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/s-anzeige/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ad_page("Tisch", &[])))
        .expect(2)
        .mount(&server)
        .await;

    let config = Config {
        user: 42,
        limit: 2,
        ..test_config(&server, tmp.path())
    };
    let stats = run(config).await.unwrap();

    assert_eq!(stats, BackupStats { ads: 2, images: 0 });
    assert!(tmp.path().join("ad-1").is_dir());
    assert!(tmp.path().join("ad-2").is_dir());
    assert!(!tmp.path().join("ad-3").exists());
}

#[tokio::test]
async fn test_rerun_skips_existing_images() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    let body = ad_page("Holzstuhl", &["/img/a", "/img/b"]);
    mount_ad(&server, "holzstuhl", 7, body.clone()).await;
    mount_image(&server, "/img/a", gradient(true, ImageOutputFormat::Png)).await;
    mount_image(&server, "/img/b", gradient(false, ImageOutputFormat::Png)).await;

    let config = Config {
        adlinks: vec![ad_link(&server, "holzstuhl", 7)],
        ..test_config(&server, tmp.path())
    };

    run(config.clone()).await.unwrap();
    let dir = tmp.path().join("holzstuhl");
    assert_eq!(files_in(&dir), vec!["1.png", "2.png", LISTING_FILE]);

    // Same pictures, recompressed by the server
    server.reset().await;
    mount_ad(&server, "holzstuhl", 7, body).await;
    mount_image(&server, "/img/a", gradient(true, ImageOutputFormat::Jpeg(60))).await;
    mount_image(&server, "/img/b", gradient(false, ImageOutputFormat::Jpeg(60))).await;

    let stats = run(config).await.unwrap();

    assert_eq!(stats, BackupStats { ads: 1, images: 2 });
    assert_eq!(files_in(&dir), vec!["1.png", "2.png", LISTING_FILE]);
}

#[tokio::test]
async fn test_force_rewrites_images() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    let body = ad_page("Holzstuhl", &["/img/a", "/img/b"]);
    mount_ad(&server, "holzstuhl", 7, body.clone()).await;
    mount_image(&server, "/img/a", gradient(true, ImageOutputFormat::Png)).await;
    mount_image(&server, "/img/b", gradient(false, ImageOutputFormat::Png)).await;

    let config = Config {
        adlinks: vec![ad_link(&server, "holzstuhl", 7)],
        ..test_config(&server, tmp.path())
    };
    run(config.clone()).await.unwrap();

    server.reset().await;
    mount_ad(&server, "holzstuhl", 7, body).await;
    mount_image(&server, "/img/a", gradient(true, ImageOutputFormat::Jpeg(60))).await;
    mount_image(&server, "/img/b", gradient(false, ImageOutputFormat::Jpeg(60))).await;

    let forced = Config {
        force: true,
        ..config
    };
    run(forced).await.unwrap();

    let dir = tmp.path().join("holzstuhl");
    assert_eq!(
        files_in(&dir),
        vec!["1.jpg", "1.png", "2.jpg", "2.png", LISTING_FILE]
    );
}

#[tokio::test]
async fn test_new_image_is_added_on_rerun() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_ad(
        &server,
        "holzstuhl",
        7,
        ad_page("Holzstuhl", &["/img/a"]),
    )
    .await;
    mount_image(&server, "/img/a", gradient(true, ImageOutputFormat::Png)).await;

    let config = Config {
        adlinks: vec![ad_link(&server, "holzstuhl", 7)],
        ..test_config(&server, tmp.path())
    };
    run(config.clone()).await.unwrap();

    server.reset().await;
    mount_ad(
        &server,
        "holzstuhl",
        7,
        ad_page("Holzstuhl", &["/img/a", "/img/b"]),
    )
    .await;
    mount_image(&server, "/img/a", gradient(true, ImageOutputFormat::Png)).await;
    mount_image(&server, "/img/b", gradient(false, ImageOutputFormat::Png)).await;
    run(config).await.unwrap();

    let dir = tmp.path().join("holzstuhl");
    assert_eq!(files_in(&dir), vec!["1.png", "2.png", LISTING_FILE]);
}

#[tokio::test]
async fn test_ignore_errors_skips_failed_image() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_ad(
        &server,
        "holzstuhl",
        7,
        ad_page("Holzstuhl", &["/img/missing", "/img/b"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/img/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_image(&server, "/img/b", gradient(false, ImageOutputFormat::Png)).await;

    let config = Config {
        adlinks: vec![ad_link(&server, "holzstuhl", 7)],
        ignore_errors: true,
        ..test_config(&server, tmp.path())
    };
    let stats = run(config).await.unwrap();

    assert_eq!(stats, BackupStats { ads: 1, images: 2 });
    assert_eq!(
        files_in(&tmp.path().join("holzstuhl")),
        vec!["2.png", LISTING_FILE]
    );
}

#[tokio::test]
async fn test_failed_image_aborts_run() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_ad(
        &server,
        "holzstuhl",
        7,
        ad_page("Holzstuhl", &["/img/missing", "/img/b"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/img/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_image(&server, "/img/b", gradient(false, ImageOutputFormat::Png)).await;

    let config = Config {
        adlinks: vec![
            ad_link(&server, "holzstuhl", 7),
            ad_link(&server, "tisch", 8),
        ],
        ..test_config(&server, tmp.path())
    };
    let result = run(config).await;

    match result {
        Err(AdkeepError::Fetch { url, .. }) => assert!(url.ends_with("/img/missing")),
        other => panic!("expected fetch error, got {:?}", other),
    }

    // Work done before the failure stays on disk
    assert_eq!(
        files_in(&tmp.path().join("holzstuhl")),
        vec!["2.png", LISTING_FILE]
    );
    assert!(!tmp.path().join("tisch").exists());
}

#[tokio::test]
async fn test_undecodable_image_aborts_run() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_ad(
        &server,
        "holzstuhl",
        7,
        ad_page("Holzstuhl", &["/img/broken"]),
    )
    .await;
    mount_image(&server, "/img/broken", b"<html>not found</html>".to_vec()).await;

    let config = Config {
        adlinks: vec![ad_link(&server, "holzstuhl", 7)],
        ..test_config(&server, tmp.path())
    };

    match run(config).await {
        Err(AdkeepError::Image { name, .. }) => assert!(name.ends_with("/img/broken")),
        other => panic!("expected image error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_incomplete_ad_aborts_run() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_ad(
        &server,
        "leer",
        9,
        "<html><body><h1>Nur ein Titel</h1></body></html>".to_string(),
    )
    .await;

    let config = Config {
        adlinks: vec![ad_link(&server, "leer", 9)],
        ..test_config(&server, tmp.path())
    };

    assert!(matches!(
        run(config).await,
        Err(AdkeepError::IncompleteAd { .. })
    ));
    assert!(!tmp.path().join("leer").exists());
}

#[tokio::test]
async fn test_invalid_ad_url_makes_no_requests() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    let config = Config {
        adlinks: vec![format!("{}/bad", server.uri())],
        ..test_config(&server, tmp.path())
    };

    match run(config).await {
        Err(e) => assert!(e.to_string().contains("invalid URI")),
        Ok(stats) => panic!("expected failure, got {:?}", stats),
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_directory_name_collision() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path_regex(r"^/s-anzeige/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ad_page("Holzstuhl", &[])))
        .mount(&server)
        .await;

    let config = Config {
        adlinks: vec![
            ad_link(&server, "stuhl-a", 1),
            ad_link(&server, "stuhl-b", 2),
            ad_link(&server, "stuhl-a", 1),
        ],
        ad_name_template: "{{.Title}}".to_string(),
        ..test_config(&server, tmp.path())
    };
    let stats = run(config).await.unwrap();

    assert_eq!(stats.ads, 2);
    assert_eq!(files_in(tmp.path()), vec!["Holzstuhl", "Holzstuhl-2"]);

    let second = std::fs::read_to_string(tmp.path().join("Holzstuhl-2").join(LISTING_FILE)).unwrap();
    assert!(second.contains("Id: 2"));
}

#[tokio::test]
async fn test_fallback_directory_taken_by_other_ad() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_ad(&server, "stuhl", 1, ad_page("Stuhl", &[])).await;
    mount_ad(&server, "stuhl-2", 9, ad_page("Anderer Stuhl", &[])).await;
    mount_ad(&server, "stuhl", 2, ad_page("Zweiter Stuhl", &[])).await;

    let config = Config {
        adlinks: vec![
            ad_link(&server, "stuhl", 1),
            ad_link(&server, "stuhl-2", 9),
            ad_link(&server, "stuhl", 2),
        ],
        ..test_config(&server, tmp.path())
    };
    let stats = run(config).await.unwrap();

    assert_eq!(stats.ads, 3);
    assert_eq!(files_in(tmp.path()), vec!["stuhl", "stuhl-2", "stuhl-2-2"]);

    let third = std::fs::read_to_string(tmp.path().join("stuhl-2-2").join(LISTING_FILE)).unwrap();
    assert!(third.contains("Title: Zweiter Stuhl"));
}

#[tokio::test]
async fn test_force_rewrites_repeated_ad() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_ad(&server, "holzstuhl", 7, ad_page("Holzstuhl", &["/img/a"])).await;
    Mock::given(method("GET"))
        .and(path("/img/a"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(gradient(true, ImageOutputFormat::Png)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let link = ad_link(&server, "holzstuhl", 7);
    let config = Config {
        adlinks: vec![link.clone(), link],
        force: true,
        ..test_config(&server, tmp.path())
    };
    let stats = run(config).await.unwrap();

    assert_eq!(stats, BackupStats { ads: 2, images: 2 });
    assert_eq!(files_in(tmp.path()), vec!["holzstuhl"]);
    assert_eq!(
        files_in(&tmp.path().join("holzstuhl")),
        vec!["1.png", LISTING_FILE]
    );
}

#[tokio::test]
async fn test_repeated_ad_skipped_without_force() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_ad(&server, "holzstuhl", 7, ad_page("Holzstuhl", &["/img/a"])).await;
    Mock::given(method("GET"))
        .and(path("/img/a"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(gradient(true, ImageOutputFormat::Png)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let link = ad_link(&server, "holzstuhl", 7);
    let config = Config {
        adlinks: vec![link.clone(), link],
        ..test_config(&server, tmp.path())
    };
    let stats = run(config).await.unwrap();

    assert_eq!(stats, BackupStats { ads: 1, images: 1 });
}
