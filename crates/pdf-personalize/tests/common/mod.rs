#![allow(dead_code)]

use lopdf::{Dictionary, Document, Object, Stream};
use pdf_personalize::{FontAsset, FontCatalog, Language, Script, Weight};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub fn create_test_pdf(num_pages: usize, width: i64, height: i64) -> Document {
    let mut doc = Document::with_version("1.7");

    // Create page tree root ID
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for i in 0..num_pages {
        let content = format!("BT /F1 12 Tf 72 72 Td (Page {}) Tj ET", i + 1);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(width),
                    Object::Integer(height),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(num_pages as i64)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));

    doc.trailer.set("Root", catalog_id);

    doc
}

// =============================================================================
// Font fixtures
// =============================================================================

fn fixture_path(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(file)
}

/// Catalog with the DejaVu fixtures registered under all four family names.
///
/// DejaVu Sans covers both Latin and Arabic, so it stands in for Inter and Amiri.
pub fn fixture_fonts() -> FontCatalog {
    let bold = std::fs::read(fixture_path("DejaVuSans-Bold.ttf")).unwrap();
    let regular = std::fs::read(fixture_path("DejaVuSans.ttf")).unwrap();

    let mut catalog = FontCatalog::empty();
    for (language, script) in [
        (Language::English, Script::Latin),
        (Language::Arabic, Script::Arabic),
    ] {
        let pair = language.fonts();
        catalog
            .register(
                FontAsset::new(pair.bold, script, Weight::Bold, fixture_path("DejaVuSans-Bold.ttf")),
                bold.clone(),
            )
            .unwrap();
        catalog
            .register(
                FontAsset::new(pair.regular, script, Weight::Regular, fixture_path("DejaVuSans.ttf")),
                regular.clone(),
            )
            .unwrap();
    }
    catalog
}

pub fn pdf_bytes(mut doc: Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

// =============================================================================
// Local HTTP responder
// =============================================================================

/// What the responder does for one request
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(Vec<u8>),
    Status(u16),
    /// Accept the request and never answer
    Hang,
}

pub struct TestServer {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

impl TestServer {
    /// Requests received so far
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Serve `reply(n)` for the n-th request (1-based) on a loopback port
pub async fn serve<F>(reply: F) -> TestServer
where
    F: Fn(usize) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let reply = Arc::new(reply);

    let counter = hits.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let counter = counter.clone();
            let reply = reply.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                let response = match reply(n) {
                    Reply::Ok(body) => {
                        let mut response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            body.len()
                        )
                        .into_bytes();
                        response.extend_from_slice(&body);
                        response
                    }
                    Reply::Status(code) => format!(
                        "HTTP/1.1 {} Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                        code
                    )
                    .into_bytes(),
                    Reply::Hang => {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                        return;
                    }
                };
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    TestServer {
        url: format!("http://{}/tail.pdf", addr),
        hits,
    }
}
