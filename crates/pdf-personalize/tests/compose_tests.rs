mod common;

use common::{Reply, TestServer, create_test_pdf, fixture_fonts, pdf_bytes, serve};
use lopdf::Document;
use pdf_personalize::compose::get_page_dimensions;
use pdf_personalize::*;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const PAGE_WIDTH: i64 = 1920;
const PAGE_HEIGHT: i64 = 1440;

/// Template with two pages (the second must be discarded) saved to a temp dir
fn write_template(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("name.pdf");
    let mut doc = create_test_pdf(2, PAGE_WIDTH, PAGE_HEIGHT);
    doc.save(&path).unwrap();
    path
}

fn composer(template: &Path, server: &TestServer, retries: u32) -> Composer {
    composer_with(FontCatalog::empty(), template, server, retries)
}

fn composer_with(fonts: FontCatalog, template: &Path, server: &TestServer, retries: u32) -> Composer {
    let mut options = ComposerOptions::default();
    options.template_path = template.to_path_buf();
    options.tails.english_url = server.url.clone();
    options.tails.arabic_url = server.url.clone();
    options.fetch = FetchOptions {
        timeout_ms: 2_000,
        retries,
        backoff_ms: 10,
    };
    Composer::new(Arc::new(fonts), options).unwrap()
}

async fn tail_server(pages: usize) -> TestServer {
    let tail = pdf_bytes(create_test_pdf(pages, 612, 792));
    serve(move |_| Reply::Ok(tail.clone())).await
}

#[tokio::test]
async fn test_compose_english() {
    let dir = TempDir::new().unwrap();
    let template = write_template(dir.path());
    let server = tail_server(3).await;

    let composed = composer(&template, &server, 3)
        .compose("Ahmed Al-Sayed", Language::English)
        .await
        .unwrap();

    assert_eq!(composed.tail_page_count, 3);
    assert_eq!(composed.page_count, 4);
    assert_eq!(composed.page_size, (1920.0, 1440.0));

    // "Dear" at 64px with estimated metrics: 154 x 105
    assert_eq!(composed.salutation.x, 126.0);
    assert_eq!(composed.salutation.width, 154.0);
    assert_eq!(composed.salutation.height, 105.0);
    assert_eq!(composed.salutation.y, 1440.0 - 1006.0 - 105.0);

    // "Ahmed" + space + "Al-Sayed" fits at the starting size
    assert_eq!(composed.name.font_size, 128.0);
    assert_eq!(composed.name.x, 126.0);
    assert_eq!(composed.name.width, 896.0);
    assert_eq!(composed.name.height, 180.0);
    assert_eq!(composed.name.y, 1440.0 - 1059.0 - 180.0);
    assert!(!composed.name_floor_reached);

    let doc = Document::load_mem(&composed.bytes).unwrap();
    let pages: Vec<_> = doc.get_pages().into_values().collect();
    assert_eq!(pages.len(), 4);
    assert_eq!(get_page_dimensions(&doc, pages[0]), (1920.0, 1440.0));
    for &page in &pages[1..] {
        assert_eq!(get_page_dimensions(&doc, page), (612.0, 792.0));
    }
}

#[tokio::test]
async fn test_tail_pages_keep_order() {
    let dir = TempDir::new().unwrap();
    let template = write_template(dir.path());
    let server = tail_server(3).await;

    let composed = composer(&template, &server, 1)
        .compose("Ahmed", Language::English)
        .await
        .unwrap();

    let doc = Document::load_mem(&composed.bytes).unwrap();
    let pages: Vec<_> = doc.get_pages().into_values().collect();
    for (i, &page) in pages[1..].iter().enumerate() {
        let content = doc.get_page_content(page).unwrap();
        let text = String::from_utf8_lossy(&content);
        assert!(
            text.contains(&format!("(Page {})", i + 1)),
            "tail page {} out of order: {}",
            i + 1,
            text
        );
    }
}

#[tokio::test]
async fn test_first_page_carries_overlays() {
    let dir = TempDir::new().unwrap();
    let template = write_template(dir.path());
    let server = tail_server(1).await;

    let composed = composer(&template, &server, 1)
        .compose("Ahmed", Language::English)
        .await
        .unwrap();

    let doc = Document::load_mem(&composed.bytes).unwrap();
    let first = doc.get_pages().into_values().next().unwrap();
    let content = String::from_utf8_lossy(&doc.get_page_content(first).unwrap()).to_string();
    assert!(content.contains("(Page 1)"));
    assert!(!content.contains("(Page 2)"));
    assert_eq!(content.matches(" Do Q").count(), 2);
}

#[tokio::test]
async fn test_compose_arabic_is_right_anchored() {
    let dir = TempDir::new().unwrap();
    let template = write_template(dir.path());
    let server = tail_server(2).await;

    let composed = composer(&template, &server, 3)
        .compose("محمد العلي", Language::Arabic)
        .await
        .unwrap();

    assert_eq!(composed.page_count, 3);
    let right_edge = 1920.0 - 126.0;
    assert_eq!(composed.salutation.x + composed.salutation.width, right_edge);
    assert_eq!(composed.name.x + composed.name.width, right_edge);
    // 10 characters at 128px plus padding
    assert_eq!(composed.name.width, 692.0);
    assert_eq!(composed.name.font_size, 128.0);
}

#[tokio::test]
async fn test_compose_with_real_fonts() {
    let dir = TempDir::new().unwrap();
    let template = write_template(dir.path());
    let server = tail_server(1).await;
    let composer = composer_with(fixture_fonts(), &template, &server, 1);

    let english = composer
        .compose("Ahmed Al-Sayed", Language::English)
        .await
        .unwrap();
    assert_eq!(english.name.x, 126.0);
    assert_eq!(english.salutation.x, 126.0);
    assert!(english.name.width <= 968.0);
    assert!(english.name.font_size >= 56.0 && english.name.font_size <= 128.0);

    let arabic = composer
        .compose("محمد العلي", Language::Arabic)
        .await
        .unwrap();
    let right_edge = 1920.0 - 126.0;
    assert_eq!(arabic.salutation.x + arabic.salutation.width, right_edge);
    assert_eq!(arabic.name.x + arabic.name.width, right_edge);
    assert_eq!(arabic.page_count, 2);
}

#[tokio::test]
async fn test_long_name_is_clamped_to_max_width() {
    let dir = TempDir::new().unwrap();
    let template = write_template(dir.path());
    let server = tail_server(1).await;

    let name = "Bartholomew-Maximilian-Fitzgerald-Worthington";
    let composed = composer(&template, &server, 1)
        .compose(name, Language::English)
        .await
        .unwrap();

    assert!(composed.name_floor_reached);
    assert_eq!(composed.name.font_size, 56.0);
    assert_eq!(composed.name.width, 968.0);
    assert_eq!(composed.name.x, 126.0);
}

#[tokio::test]
async fn test_empty_name_still_composes() {
    let dir = TempDir::new().unwrap();
    let template = write_template(dir.path());
    let server = tail_server(1).await;

    let composed = composer(&template, &server, 1)
        .compose("", Language::English)
        .await
        .unwrap();
    assert_eq!(composed.page_count, 2);
    // Only the minimum glyph width remains: ceil(0.4 x 128)
    assert_eq!(composed.name.width, 52.0);
    assert_eq!(composed.name.x, 126.0);
    assert_eq!(composed.name.font_size, 128.0);
    assert!(!composed.name_floor_reached);
}

#[tokio::test]
async fn test_missing_template_fails_before_fetch() {
    let dir = TempDir::new().unwrap();
    let server = tail_server(1).await;

    let result = composer(&dir.path().join("absent.pdf"), &server, 3)
        .compose("Ahmed", Language::English)
        .await;

    assert!(matches!(result, Err(PersonalizeError::TemplateMissing(_))));
    assert_eq!(server.hits(), 0);
}

#[tokio::test]
async fn test_malformed_tail_is_not_retried() {
    let dir = TempDir::new().unwrap();
    let template = write_template(dir.path());
    let server = serve(|_| Reply::Ok(b"<html>not a pdf</html>".to_vec())).await;

    let result = composer(&template, &server, 3)
        .compose("Ahmed", Language::English)
        .await;

    assert!(matches!(result, Err(PersonalizeError::MalformedTail { .. })));
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn test_fetch_failure_is_fatal() {
    let dir = TempDir::new().unwrap();
    let template = write_template(dir.path());
    let server = serve(|_| Reply::Status(502)).await;

    let result = composer(&template, &server, 2)
        .compose("Ahmed", Language::English)
        .await;

    assert!(matches!(
        result,
        Err(PersonalizeError::Fetch { attempts: 2, .. })
    ));
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn test_compose_to_dir_uses_slug() {
    let dir = TempDir::new().unwrap();
    let template = write_template(dir.path());
    let server = tail_server(1).await;

    let (path, composed) = composer(&template, &server, 1)
        .compose_to_dir("José Álvarez", Language::English, dir.path())
        .await
        .unwrap();

    assert_eq!(path, dir.path().join("Jose_A_lvarez_HGS.pdf"));
    let written = tokio::fs::read(&path).await.unwrap();
    assert_eq!(written, composed.bytes);
}

#[tokio::test]
async fn test_concurrent_calls_are_independent() {
    let dir = TempDir::new().unwrap();
    let template = write_template(dir.path());
    let server = tail_server(2).await;
    let composer = composer(&template, &server, 1);
    assert_eq!(composer.options().template_path, template);

    let (a, b) = tokio::join!(
        composer.compose("Ahmed", Language::English),
        composer.compose("محمد", Language::Arabic)
    );
    assert_eq!(a.unwrap().page_count, 3);
    assert_eq!(b.unwrap().page_count, 3);
}
