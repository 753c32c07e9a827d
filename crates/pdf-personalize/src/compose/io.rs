//! Document I/O for composition

use crate::types::*;
use lopdf::Document;
use std::path::Path;

/// Load the first-page template, reporting a missing file distinctly
pub async fn load_template(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref().to_owned();
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PersonalizeError::TemplateMissing(path));
        }
        Err(e) => return Err(e.into()),
    };
    let doc = tokio::task::spawn_blocking(move || Document::load_mem(&bytes)).await??;
    Ok(doc)
}

/// Parse downloaded tail bytes; parse failures are not retried
pub async fn parse_tail(url: &str, bytes: Vec<u8>) -> Result<Document> {
    let parsed = tokio::task::spawn_blocking(move || Document::load_mem(&bytes)).await?;
    parsed.map_err(|source| PersonalizeError::MalformedTail {
        url: url.to_string(),
        source,
    })
}

/// Serialize a document to PDF bytes
pub async fn save_to_bytes(mut doc: Document) -> Result<Vec<u8>> {
    let bytes = tokio::task::spawn_blocking(move || {
        let mut writer = Vec::new();
        doc.save_to(&mut writer)?;
        Ok::<_, PersonalizeError>(writer)
    })
    .await??;
    Ok(bytes)
}

/// Write composed PDF bytes to disk
pub async fn save_pdf(bytes: &[u8], path: impl AsRef<Path>) -> Result<()> {
    tokio::fs::write(path, bytes).await?;
    Ok(())
}
