//! Font catalog
//!
//! Fonts are read once at startup and shared read-only between generation
//! calls, typically behind an `Arc`.

use crate::types::*;
use log::{info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A font file registered under a family name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontAsset {
    pub family: String,
    pub script: Script,
    pub weight: Weight,
    pub path: PathBuf,
}

impl FontAsset {
    pub fn new(
        family: impl Into<String>,
        script: Script,
        weight: Weight,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            family: family.into(),
            script,
            weight,
            path: path.into(),
        }
    }
}

/// The bold and regular faces for both supported scripts, relative to `dir`
pub fn standard_assets(dir: impl AsRef<Path>) -> Vec<FontAsset> {
    let dir = dir.as_ref();
    vec![
        FontAsset::new(
            Language::English.fonts().bold,
            Script::Latin,
            Weight::Bold,
            dir.join("Inter_18pt-SemiBold.ttf"),
        ),
        FontAsset::new(
            Language::English.fonts().regular,
            Script::Latin,
            Weight::Regular,
            dir.join("Inter_18pt-Light.ttf"),
        ),
        FontAsset::new(
            Language::Arabic.fonts().bold,
            Script::Arabic,
            Weight::Bold,
            dir.join("Amiri-Bold.ttf"),
        ),
        FontAsset::new(
            Language::Arabic.fonts().regular,
            Script::Arabic,
            Weight::Regular,
            dir.join("Amiri-Regular.ttf"),
        ),
    ]
}

/// Font bytes that parsed successfully at registration
#[derive(Debug, Clone)]
pub struct LoadedFont {
    pub asset: FontAsset,
    data: Vec<u8>,
}

impl LoadedFont {
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Read-only registry of font families
#[derive(Debug, Clone, Default)]
pub struct FontCatalog {
    fonts: HashMap<String, LoadedFont>,
}

impl FontCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the standard four faces from a directory
    pub async fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::load(standard_assets(dir)).await
    }

    /// Load a set of assets without blocking the runtime
    pub async fn load(assets: Vec<FontAsset>) -> Result<Self> {
        tokio::task::spawn_blocking(move || Self::from_assets(assets)).await?
    }

    /// Load a set of assets.
    ///
    /// Missing or unparsable files are skipped with a warning; rendering with
    /// a skipped family falls back to estimated metrics. Other IO failures
    /// are returned.
    pub fn from_assets(assets: impl IntoIterator<Item = FontAsset>) -> Result<Self> {
        let mut catalog = Self::empty();

        for asset in assets {
            let data = match std::fs::read(&asset.path) {
                Ok(data) => data,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(
                        "Font file for '{}' not found at {}, skipping",
                        asset.family,
                        asset.path.display()
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if let Err(e) = catalog.register(asset.clone(), data) {
                warn!("{}, skipping", e);
            }
        }

        info!(
            "Registered {} font famil{}",
            catalog.len(),
            if catalog.len() == 1 { "y" } else { "ies" }
        );
        Ok(catalog)
    }

    /// Register in-memory font bytes under the asset's family name
    pub fn register(&mut self, asset: FontAsset, data: Vec<u8>) -> Result<()> {
        if let Err(e) = ttf_parser::Face::parse(&data, 0) {
            return Err(PersonalizeError::Font(format!(
                "Font for '{}' could not be parsed: {}",
                asset.family, e
            )));
        }
        self.fonts
            .insert(asset.family.clone(), LoadedFont { asset, data });
        Ok(())
    }

    pub fn resolve(&self, family: &str) -> Option<&LoadedFont> {
        self.fonts.get(family)
    }

    pub fn contains(&self, family: &str) -> bool {
        self.fonts.contains_key(family)
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}
