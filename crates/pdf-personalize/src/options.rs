use crate::constants::*;
use crate::types::*;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Environment variables recognised by [`ComposerOptions::with_env_overrides`]
pub const ENV_FETCH_TIMEOUT_MS: &str = "PDF_FETCH_TIMEOUT_MS";
pub const ENV_FETCH_RETRIES: &str = "PDF_FETCH_RETRIES";
pub const ENV_FETCH_BACKOFF_MS: &str = "PDF_FETCH_BACKOFF_MS";
pub const ENV_ENGLISH_TAIL_URL: &str = "ENG_TAIL_URL";
pub const ENV_ARABIC_TAIL_URL: &str = "AR_TAIL_URL";

/// Complete composition configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ComposerOptions {
    // Local assets
    pub template_path: PathBuf,
    pub font_dir: PathBuf,

    // Remote tail documents
    pub tails: TailUrls,

    // Network policy
    pub fetch: FetchOptions,

    // Overlay design
    pub layout: LayoutOptions,
}

impl Default for ComposerOptions {
    fn default() -> Self {
        Self {
            template_path: PathBuf::from("name.pdf"),
            font_dir: PathBuf::from("fonts"),
            tails: TailUrls::default(),
            fetch: FetchOptions::default(),
            layout: LayoutOptions::default(),
        }
    }
}

/// Tail document location per language
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TailUrls {
    pub english_url: String,
    pub arabic_url: String,
}

impl Default for TailUrls {
    fn default() -> Self {
        Self {
            english_url: "https://do-mediaout-7107.fra1.digitaloceanspaces.com/7107374016/48963020-8bd7-4e86-8e2f-e907866e3474.pdf".to_string(),
            arabic_url: "https://do-mediaout-7107.fra1.digitaloceanspaces.com/7107374016/ae16790f-6474-4eed-9338-bc33d06714d1.pdf".to_string(),
        }
    }
}

impl TailUrls {
    pub fn for_language(&self, language: Language) -> &str {
        match language {
            Language::English => &self.english_url,
            Language::Arabic => &self.arabic_url,
        }
    }
}

/// Retry policy for tail downloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FetchOptions {
    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,
    /// Total attempts, including the first
    pub retries: u32,
    /// Base backoff in milliseconds, doubled after every failed attempt
    pub backoff_ms: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            retries: DEFAULT_FETCH_RETRIES,
            backoff_ms: DEFAULT_FETCH_BACKOFF_MS,
        }
    }
}

impl FetchOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Wait after failed attempt `attempt` (1-based): `backoff × 2^(attempt−1)`
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = 1u64
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u64::MAX);
        Duration::from_millis(self.backoff_ms.saturating_mul(factor))
    }

    pub fn validate(&self) -> Result<()> {
        if self.retries == 0 {
            return Err(PersonalizeError::Config(
                "Fetch retries must be at least 1".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(PersonalizeError::Config(
                "Fetch timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Overlay sizes, positions and colours in design-tool coordinates
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LayoutOptions {
    pub salutation_font_size: f32,
    pub salutation_top: f32,
    pub left_margin: f32,
    pub right_margin: f32,
    pub name_font_size: f32,
    pub name_min_font_size: f32,
    pub name_max_width: f32,
    pub name_top: f32,
    pub accent_color: Rgb,
    pub body_color: Rgb,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            salutation_font_size: SALUTATION_FONT_SIZE,
            salutation_top: SALUTATION_TOP,
            left_margin: LEFT_MARGIN,
            right_margin: RIGHT_MARGIN,
            name_font_size: NAME_FONT_SIZE,
            name_min_font_size: NAME_MIN_FONT_SIZE,
            name_max_width: NAME_MAX_WIDTH,
            name_top: NAME_TOP,
            accent_color: ACCENT_COLOR,
            body_color: BODY_COLOR,
        }
    }
}

impl LayoutOptions {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("salutation font size", self.salutation_font_size),
            ("name font size", self.name_font_size),
            ("name minimum font size", self.name_min_font_size),
            ("name maximum width", self.name_max_width),
        ];
        for (label, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(PersonalizeError::Config(format!(
                    "The {} must be a positive number",
                    label
                )));
            }
        }
        if self.name_min_font_size > self.name_font_size {
            return Err(PersonalizeError::Config(
                "Name minimum font size exceeds the starting size".to_string(),
            ));
        }
        Ok(())
    }
}

impl ComposerOptions {
    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options = serde_json::from_slice(&bytes)
            .map_err(|e| PersonalizeError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PersonalizeError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(value) = lookup(ENV_FETCH_TIMEOUT_MS) {
            self.fetch.timeout_ms = parse_number(ENV_FETCH_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_FETCH_RETRIES) {
            self.fetch.retries = parse_number(ENV_FETCH_RETRIES, &value)?;
        }
        if let Some(value) = lookup(ENV_FETCH_BACKOFF_MS) {
            self.fetch.backoff_ms = parse_number(ENV_FETCH_BACKOFF_MS, &value)?;
        }
        if let Some(url) = lookup(ENV_ENGLISH_TAIL_URL) {
            self.tails.english_url = url;
        }
        if let Some(url) = lookup(ENV_ARABIC_TAIL_URL) {
            self.tails.arabic_url = url;
        }
        Ok(self)
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        self.fetch.validate()?;
        self.layout.validate()?;

        for language in [Language::English, Language::Arabic] {
            if self.tails.for_language(language).trim().is_empty() {
                return Err(PersonalizeError::Config(format!(
                    "No tail document URL configured for {}",
                    language.name()
                )));
            }
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| PersonalizeError::Config(format!("{} is not a valid number: {:?}", key, value)))
}
