//! Stamping raster overlays onto a page
//!
//! Each PNG becomes an Image XObject (RGB samples plus a DeviceGray soft
//! mask for alpha) drawn above the existing page content. The existing
//! content is wrapped in `q ... Q` so its graphics state cannot leak into
//! the overlay transforms.

use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use log::debug;

/// A PNG placed on a page at a lower-left corner and size, in points
#[derive(Debug, Clone, Copy)]
pub struct Overlay<'a> {
    pub png: &'a [u8],
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

// =============================================================================
// Image Embedding
// =============================================================================

/// Decode a PNG and add it as an Image XObject with an alpha soft mask
pub(crate) fn embed_png(doc: &mut Document, png: &[u8]) -> Result<ObjectId> {
    let rgba = image::load_from_memory(png)?.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }

    let smask_id = doc.add_object(image_stream(width, height, "DeviceGray", alpha, None)?);
    let image_id = doc.add_object(image_stream(width, height, "DeviceRGB", rgb, Some(smask_id))?);
    debug!("Embedded {}x{} overlay as {:?}", width, height, image_id);
    Ok(image_id)
}

fn image_stream(
    width: u32,
    height: u32,
    color_space: &str,
    samples: Vec<u8>,
    smask: Option<ObjectId>,
) -> Result<Stream> {
    let mut dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(width as i64)),
        ("Height", Object::Integer(height as i64)),
        ("ColorSpace", Object::Name(color_space.as_bytes().to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
    ]);
    if let Some(smask) = smask {
        dict.set("SMask", Object::Reference(smask));
    }
    let mut stream = Stream::new(dict, samples);
    stream.compress()?;
    Ok(stream)
}

// =============================================================================
// Page Stamping
// =============================================================================

/// Draw `overlays` in order on top of the page's existing content
pub(crate) fn stamp_overlays(
    doc: &mut Document,
    page_id: ObjectId,
    overlays: &[Overlay<'_>],
) -> Result<()> {
    if overlays.is_empty() {
        return Ok(());
    }

    let page = doc.get_dictionary(page_id)?.clone();
    let mut resources = resolve_dictionary(doc, page.get(b"Resources").ok());
    let mut xobjects = resolve_dictionary(doc, resources.get(b"XObject").ok());

    let mut operations = String::from("Q\n");
    let mut next_index = 0usize;
    for overlay in overlays {
        let image_id = embed_png(doc, overlay.png)?;

        let name = loop {
            next_index += 1;
            let candidate = format!("Ov{}", next_index);
            if !xobjects.has(candidate.as_bytes()) {
                break candidate;
            }
        };
        xobjects.set(name.as_bytes().to_vec(), Object::Reference(image_id));

        operations.push_str(&format!(
            "q {} 0 0 {} {} {} cm /{} Do Q\n",
            overlay.width, overlay.height, overlay.x, overlay.y, name
        ));
    }

    resources.set("XObject", Object::Dictionary(xobjects));

    let mut contents = vec![Object::Reference(
        doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec())),
    )];
    match page.get(b"Contents") {
        Ok(Object::Reference(id)) => contents.push(Object::Reference(*id)),
        Ok(Object::Array(parts)) => contents.extend(parts.iter().cloned()),
        _ => {}
    }
    contents.push(Object::Reference(
        doc.add_object(Stream::new(Dictionary::new(), operations.into_bytes())),
    ));

    let page = doc.get_dictionary_mut(page_id)?;
    page.set("Resources", Object::Dictionary(resources));
    page.set("Contents", Object::Array(contents));
    Ok(())
}

/// Clone an inline or referenced dictionary, empty if absent or not a dictionary
fn resolve_dictionary(doc: &Document, obj: Option<&Object>) -> Dictionary {
    match obj {
        Some(Object::Dictionary(dict)) => dict.clone(),
        Some(Object::Reference(id)) => doc
            .get_dictionary(*id)
            .cloned()
            .unwrap_or_else(|_| Dictionary::new()),
        _ => Dictionary::new(),
    }
}
