use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersonalizeError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Template not found at {}", .0.display())]
    TemplateMissing(PathBuf),
    #[error("Template has no pages")]
    NoPages,
    #[error("Fetching {url} failed after {attempts} attempt(s): {source}")]
    Fetch {
        url: String,
        attempts: u32,
        #[source]
        source: FetchError,
    },
    #[error("Tail document from {url} is malformed: {source}")]
    MalformedTail {
        url: String,
        #[source]
        source: lopdf::Error,
    },
    #[error("Render error: {0}")]
    Render(String),
    #[error("Font error: {0}")]
    Font(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, PersonalizeError>;

/// Failure of a single fetch attempt
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Writing direction of a text run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    #[default]
    LeftToRight,
    RightToLeft,
}

impl Direction {
    pub fn is_rtl(self) -> bool {
        self == Direction::RightToLeft
    }
}

/// Scripts with a registered font pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Script {
    Latin,
    Arabic,
}

/// Weight class of a font asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Weight {
    Bold,
    Regular,
}

/// Bold/regular family names used for one language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontPair {
    pub bold: &'static str,
    pub regular: &'static str,
}

/// Language of the generated document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Language {
    #[default]
    English,
    Arabic,
}

impl Language {
    pub fn script(self) -> Script {
        match self {
            Language::English => Script::Latin,
            Language::Arabic => Script::Arabic,
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Language::English => Direction::LeftToRight,
            Language::Arabic => Direction::RightToLeft,
        }
    }

    pub fn fonts(self) -> FontPair {
        match self {
            Language::English => FontPair {
                bold: "Inter-SemiBold",
                regular: "Inter-Light",
            },
            Language::Arabic => FontPair {
                bold: "Amiri-Bold",
                regular: "Amiri-Regular",
            },
        }
    }

    /// Salutation printed above the name
    pub fn salutation(self) -> &'static str {
        match self {
            Language::English => "Dear",
            Language::Arabic => "عزيزي",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Arabic => "Arabic",
        }
    }
}

impl FromStr for Language {
    type Err = PersonalizeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" | "eng" | "1" => Ok(Language::English),
            "arabic" | "ar" | "2" => Ok(Language::Arabic),
            other => Err(PersonalizeError::Config(format!(
                "Unknown language: {}",
                other
            ))),
        }
    }
}

/// Opaque RGB fill colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (leading `#` optional)
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(PersonalizeError::Config(format!("Invalid colour: {}", hex)));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| PersonalizeError::Config(format!("Invalid colour: {}", hex)))
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub(crate) fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, 255)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Rgb {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Rgb {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Rgb::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Encoded overlay bitmap
///
/// Tied to the exact text and style that produced it; never reused for other input.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterResult {
    pub width: u32,
    pub height: u32,
    /// PNG-encoded RGBA pixels
    pub png: Vec<u8>,
}

impl RasterResult {
    /// Whether this is the 1x1 placeholder produced after a render failure
    pub fn is_placeholder(&self) -> bool {
        self.width == 1 && self.height == 1
    }
}
