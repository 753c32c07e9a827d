//! Document composition
//!
//! Builds the personalised document: the template's first page with the
//! salutation and name stamped on it, followed by every page of the
//! language's remote tail document.

mod io;
mod overlay;
mod pages;

pub use io::{load_template, parse_tail, save_pdf, save_to_bytes};
pub use overlay::Overlay;
pub use pages::{PageBox, get_page_dimensions, page_box};

use crate::fetch::RemoteTailFetcher;
use crate::fit::{AutoFitLayout, NameRender, NameStyle};
use crate::fonts::FontCatalog;
use crate::naming::document_file_name;
use crate::options::ComposerOptions;
use crate::placement::{PlacementSpec, clamp_width};
use crate::raster::StyleSpec;
use crate::types::*;
use log::{debug, info, warn};
use lopdf::Document;
use pages::{PageCopier, finish_document};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where an overlay landed on the first page, in page coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayPlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
}

/// Result of one composition
#[derive(Debug, Clone)]
pub struct ComposedDocument {
    pub bytes: Vec<u8>,
    /// Always `1 + tail_page_count`
    pub page_count: usize,
    pub tail_page_count: usize,
    /// First page (width, height), equal to the template's first page
    pub page_size: (f32, f32),
    pub salutation: OverlayPlacement,
    pub name: OverlayPlacement,
    /// The name stopped shrinking at the minimum size without fitting
    pub name_floor_reached: bool,
}

/// Composes personalised documents.
///
/// The font catalog is shared and read-only; every call works on its own
/// documents and buffers, so one composer can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct Composer {
    fonts: Arc<FontCatalog>,
    options: ComposerOptions,
    fetcher: RemoteTailFetcher,
}

impl Composer {
    pub fn new(fonts: Arc<FontCatalog>, options: ComposerOptions) -> Result<Self> {
        options.validate()?;
        let fetcher = RemoteTailFetcher::new(options.fetch)?;
        Ok(Self {
            fonts,
            options,
            fetcher,
        })
    }

    /// Load the font catalog from `options.font_dir` and build a composer
    pub async fn from_options(options: ComposerOptions) -> Result<Self> {
        let fonts = FontCatalog::load_dir(&options.font_dir).await?;
        Self::new(Arc::new(fonts), options)
    }

    pub fn options(&self) -> &ComposerOptions {
        &self.options
    }

    /// Salutation overlay for `language` at its nominal size
    pub fn render_salutation(&self, language: Language) -> RasterResult {
        AutoFitLayout::new(&self.fonts).render_salutation(
            language.salutation(),
            &self.salutation_style(language),
        )
    }

    /// Name overlay for `language`, shrunk to fit the maximum width
    pub fn render_name(&self, name: &str, language: Language) -> NameRender {
        AutoFitLayout::new(&self.fonts)
            .render_name(name, &NameStyle::for_language(language, &self.options.layout))
    }

    /// Compose the full document for `name` in `language`
    pub async fn compose(&self, name: &str, language: Language) -> Result<ComposedDocument> {
        info!("Composing {} document for '{}'", language.name(), name);

        let template = load_template(&self.options.template_path).await?;

        // Rendering is CPU-bound; keep it off the async workers
        let composer = self.clone();
        let owned_name = name.to_string();
        let first_page =
            tokio::task::spawn_blocking(move || composer.build_first_page(&template, &owned_name, language))
                .await??;
        info!("First page ready, fetching tail document");

        let url = self.options.tails.for_language(language);
        let tail_bytes = self.fetcher.fetch(url).await?;
        let tail = parse_tail(url, tail_bytes).await?;

        let FirstPage {
            mut output,
            pages_id,
            page_id,
            page_size,
            salutation,
            name: name_placement,
            name_floor_reached,
        } = first_page;

        let tail_page_ids: Vec<_> = tail.get_pages().into_values().collect();
        let tail_page_count = tail_page_ids.len();

        let mut kids = Vec::with_capacity(1 + tail_page_count);
        kids.push(page_id);

        let mut copier = PageCopier::new(&tail);
        copier.reserve_pages(&mut output, &tail_page_ids);
        for id in tail_page_ids {
            kids.push(copier.copy_page(&mut output, id, pages_id)?);
        }
        let page_count = kids.len();
        finish_document(&mut output, pages_id, kids);
        debug!("Appended {} tail pages", tail_page_count);

        let bytes = save_to_bytes(output).await?;
        info!(
            "Composed {} pages ({} bytes) for '{}'",
            page_count,
            bytes.len(),
            name
        );

        Ok(ComposedDocument {
            bytes,
            page_count,
            tail_page_count,
            page_size,
            salutation,
            name: name_placement,
            name_floor_reached,
        })
    }

    /// Compose and write to `dir` under the document's standard file name
    pub async fn compose_to_dir(
        &self,
        name: &str,
        language: Language,
        dir: impl AsRef<Path>,
    ) -> Result<(PathBuf, ComposedDocument)> {
        let composed = self.compose(name, language).await?;
        let path = dir.as_ref().join(document_file_name(name));
        save_pdf(&composed.bytes, &path).await?;
        Ok((path, composed))
    }

    fn salutation_style(&self, language: Language) -> StyleSpec {
        let layout = &self.options.layout;
        StyleSpec::new(
            language.fonts().bold,
            layout.salutation_font_size,
            layout.accent_color,
            language.direction(),
        )
    }

    /// New document holding the template's first page with both overlays
    fn build_first_page(&self, template: &Document, name: &str, language: Language) -> Result<FirstPage> {
        let template_page = template
            .get_pages()
            .into_values()
            .next()
            .ok_or(PersonalizeError::NoPages)?;

        let mut output = Document::with_version("1.7");
        let pages_id = output.new_object_id();
        let mut copier = PageCopier::new(template);
        let page_id = copier.copy_page(&mut output, template_page, pages_id)?;

        let page = page_box(&output, page_id);
        let layout = &self.options.layout;
        let direction = language.direction();
        let inset = match direction {
            Direction::LeftToRight => layout.left_margin,
            Direction::RightToLeft => layout.right_margin,
        };
        let place = |design_top: f32, width: f32, height: f32| {
            let point = PlacementSpec {
                design_top,
                inset,
                element_width: width,
                element_height: height,
                page_width: page.width,
                page_height: page.height,
                direction,
            }
            .place();
            (page.x + point.x, page.y + point.y)
        };

        let salutation_raster = self.render_salutation(language);
        let (sw, sh) = (
            salutation_raster.width as f32,
            salutation_raster.height as f32,
        );
        let (sx, sy) = place(layout.salutation_top, sw, sh);

        let name_render = self.render_name(name, language);
        let (nw, nh) = clamp_width(
            name_render.raster.width as f32,
            name_render.raster.height as f32,
            layout.name_max_width,
        );
        if nw < name_render.raster.width as f32 {
            warn!(
                "Name '{}' overflows at {}px, scaling overlay to {}pt wide",
                name, name_render.size, nw
            );
        }
        let (nx, ny) = place(layout.name_top, nw, nh);

        overlay::stamp_overlays(
            &mut output,
            page_id,
            &[
                Overlay {
                    png: &salutation_raster.png,
                    x: sx,
                    y: sy,
                    width: sw,
                    height: sh,
                },
                Overlay {
                    png: &name_render.raster.png,
                    x: nx,
                    y: ny,
                    width: nw,
                    height: nh,
                },
            ],
        )?;
        debug!(
            "Placed salutation at ({}, {}) and name at ({}, {}) size {}px",
            sx, sy, nx, ny, name_render.size
        );

        Ok(FirstPage {
            output,
            pages_id,
            page_id,
            page_size: (page.width, page.height),
            salutation: OverlayPlacement {
                x: sx,
                y: sy,
                width: sw,
                height: sh,
                font_size: layout.salutation_font_size,
            },
            name: OverlayPlacement {
                x: nx,
                y: ny,
                width: nw,
                height: nh,
                font_size: name_render.size,
            },
            name_floor_reached: name_render.floor_reached,
        })
    }
}

struct FirstPage {
    output: Document,
    pages_id: lopdf::ObjectId,
    page_id: lopdf::ObjectId,
    page_size: (f32, f32),
    salutation: OverlayPlacement,
    name: OverlayPlacement,
    name_floor_reached: bool,
}
