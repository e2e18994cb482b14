pub mod pdftotext;
pub mod ruling;

use crate::error::TabliftError;

/// Axis-aligned box in page space: origin top-left, y grows downwards, units in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BBox {
    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    pub fn center_x(&self) -> f32 {
        (self.x_min + self.x_max) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.y_min + self.y_max) / 2.0
    }
}

/// A positioned word.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub bbox: BBox,
}

/// Content extracted from a single page of a PDF.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub page_number: usize,
    /// Layout-preserving text lines; column alignment is kept with spaces.
    pub lines: Vec<String>,
    pub words: Vec<Word>,
}

/// Trait for PDF text extraction backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract text content from PDF bytes, returning one PageContent per page.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, TabliftError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Straight ruling line in the same coordinate space as [`BBox`].
///
/// Endpoints are ordered: `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Segment {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Segment {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn horizontal(y: f32, x0: f32, x1: f32) -> Self {
        Segment::new(x0, y, x1, y)
    }

    pub fn vertical(x: f32, y0: f32, y1: f32) -> Self {
        Segment::new(x, y0, x, y1)
    }

    pub fn is_horizontal(&self) -> bool {
        self.y1 - self.y0 <= AXIS_TOLERANCE && self.x1 - self.x0 > AXIS_TOLERANCE
    }

    pub fn is_vertical(&self) -> bool {
        self.x1 - self.x0 <= AXIS_TOLERANCE && self.y1 - self.y0 > AXIS_TOLERANCE
    }

    pub fn length(&self) -> f32 {
        (self.x1 - self.x0).max(self.y1 - self.y0)
    }
}

/// Maximum skew (in points) for a segment to still count as horizontal or vertical.
pub const AXIS_TOLERANCE: f32 = 0.5;

/// Ruling segments drawn on one page.
#[derive(Debug, Clone, Default)]
pub struct PageRulings {
    pub page_number: usize,
    pub segments: Vec<Segment>,
}

/// Trait for backends that recover the ruling lines drawn on each page.
pub trait RulingExtractor: Send + Sync {
    fn extract_rulings(&self, pdf_bytes: &[u8]) -> Result<Vec<PageRulings>, TabliftError>;

    fn backend_name(&self) -> &str;
}
