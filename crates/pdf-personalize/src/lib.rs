pub mod compose;
pub mod constants;
pub mod fetch;
pub mod fit;
pub mod fonts;
pub mod naming;
mod options;
pub mod placement;
pub mod raster;
mod types;

pub use compose::{ComposedDocument, Composer, OverlayPlacement, load_template, save_pdf};
pub use fetch::RemoteTailFetcher;
pub use fit::{AutoFitLayout, FitOutcome, FitState, NameRender, NameStyle};
pub use fonts::{FontAsset, FontCatalog};
pub use naming::document_file_name;
pub use options::*;
pub use placement::{PagePoint, PlacementSpec};
pub use raster::{StyleSpec, TextMetrics, TextRasterizer};
pub use types::*;
