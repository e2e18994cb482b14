use crate::error::TabliftError;
use crate::extraction::{PageRulings, RulingExtractor, Segment, AXIS_TOLERANCE};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};

/// Segments shorter than this (in points) are glyph decorations, not rulings.
const MIN_SEGMENT_LENGTH: f32 = 3.0;

/// Ruling-line backend that interprets page content streams with lopdf.
///
/// Only path construction and painting operators are followed; text, images
/// and form XObjects are ignored.
pub struct LopdfRulingExtractor;

impl LopdfRulingExtractor {
    pub fn new() -> Self {
        LopdfRulingExtractor
    }
}

impl Default for LopdfRulingExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RulingExtractor for LopdfRulingExtractor {
    fn extract_rulings(&self, pdf_bytes: &[u8]) -> Result<Vec<PageRulings>, TabliftError> {
        let doc = Document::load_mem(pdf_bytes)
            .map_err(|e| TabliftError::Extraction(format!("failed to parse PDF: {e}")))?;

        let mut pages = Vec::new();
        for (page_number, page_id) in doc.get_pages() {
            let frame = page_frame(&doc, page_id);
            let content = doc.get_page_content(page_id).map_err(|e| {
                TabliftError::Extraction(format!("page {page_number}: unreadable content: {e}"))
            })?;
            let content = Content::decode(&content).map_err(|e| {
                TabliftError::Extraction(format!("page {page_number}: bad content stream: {e}"))
            })?;

            let segments = collect_segments(&content.operations, frame);
            tracing::debug!(page = page_number, segments = segments.len(), "collected rulings");
            pages.push(PageRulings {
                page_number: page_number as usize,
                segments,
            });
        }

        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "lopdf"
    }
}

/// Maps PDF user space (origin bottom-left) onto the top-left page space
/// used by word boxes: `x' = x - left`, `y' = top - y`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PageFrame {
    left: f32,
    top: f32,
}

impl PageFrame {
    fn map(&self, (x, y): (f32, f32)) -> (f32, f32) {
        (x - self.left, self.top - y)
    }
}

/// US Letter, used when a page has no readable MediaBox.
const DEFAULT_FRAME: PageFrame = PageFrame {
    left: 0.0,
    top: 792.0,
};

fn page_frame(doc: &Document, page_id: ObjectId) -> PageFrame {
    let Some(Object::Array(media_box)) = inherited_attribute(doc, page_id, b"MediaBox") else {
        return DEFAULT_FRAME;
    };
    let coords: Vec<f32> = media_box.iter().filter_map(object_to_f32).collect();
    match coords.as_slice() {
        [x0, y0, x1, y1] => PageFrame {
            left: x0.min(*x1),
            top: y0.max(*y1),
        },
        _ => DEFAULT_FRAME,
    }
}

/// Look up a page attribute, walking up the page tree through /Parent.
fn inherited_attribute<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = page_id;
    // /Parent chains in broken files can cycle.
    for _ in 0..64 {
        let dict = doc.get_object(current).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return match value {
                Object::Reference(id) => doc.get_object(*id).ok(),
                other => Some(other),
            };
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

fn object_to_f32(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(f) => Some(*f as f32),
        _ => None,
    }
}

/// Affine transform `[a b c d e f]` as used by the `cm` operator.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    /// `self × other`, i.e. apply `self` first, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }
}

/// Walk the path operators of one page and return the stroked or filled
/// axis-aligned edges in top-left page space.
fn collect_segments(operations: &[Operation], frame: PageFrame) -> Vec<Segment> {
    let mut ctm = Matrix::IDENTITY;
    let mut stack: Vec<Matrix> = Vec::new();
    let mut path: Vec<((f32, f32), (f32, f32))> = Vec::new();
    let mut current: Option<(f32, f32)> = None;
    let mut subpath_start: Option<(f32, f32)> = None;
    let mut segments = Vec::new();

    for op in operations {
        let nums: Vec<f32> = op.operands.iter().filter_map(object_to_f32).collect();
        match op.operator.as_str() {
            "q" => stack.push(ctm),
            "Q" => ctm = stack.pop().unwrap_or(Matrix::IDENTITY),
            "cm" => {
                if let [a, b, c, d, e, f] = nums[..] {
                    ctm = Matrix([a, b, c, d, e, f]).then(&ctm);
                }
            }
            "m" => {
                if let [x, y] = nums[..] {
                    let p = ctm.apply(x, y);
                    current = Some(p);
                    subpath_start = Some(p);
                }
            }
            "l" => {
                if let ([x, y], Some(from)) = (&nums[..], current) {
                    let to = ctm.apply(*x, *y);
                    path.push((from, to));
                    current = Some(to);
                }
            }
            "c" => {
                if let [.., x, y] = nums[..] {
                    current = Some(ctm.apply(x, y));
                }
            }
            "v" | "y" => {
                if let [_, _, x, y] = nums[..] {
                    current = Some(ctm.apply(x, y));
                }
            }
            "h" => close_subpath(&mut path, current, subpath_start),
            "re" => {
                if let [x, y, w, h] = nums[..] {
                    let corners = [
                        ctm.apply(x, y),
                        ctm.apply(x + w, y),
                        ctm.apply(x + w, y + h),
                        ctm.apply(x, y + h),
                    ];
                    for i in 0..4 {
                        path.push((corners[i], corners[(i + 1) % 4]));
                    }
                    current = Some(corners[0]);
                    subpath_start = Some(corners[0]);
                }
            }
            "s" | "b" | "b*" => {
                close_subpath(&mut path, current, subpath_start);
                flush_path(&mut path, &mut segments, frame);
            }
            "S" | "f" | "F" | "f*" | "B" | "B*" => flush_path(&mut path, &mut segments, frame),
            "n" => path.clear(),
            _ => {}
        }
    }

    segments
}

fn close_subpath(
    path: &mut Vec<((f32, f32), (f32, f32))>,
    current: Option<(f32, f32)>,
    start: Option<(f32, f32)>,
) {
    if let (Some(from), Some(to)) = (current, start) {
        if from != to {
            path.push((from, to));
        }
    }
}

fn flush_path(
    path: &mut Vec<((f32, f32), (f32, f32))>,
    segments: &mut Vec<Segment>,
    frame: PageFrame,
) {
    for (from, to) in path.drain(..) {
        let (x0, y0) = frame.map(from);
        let (x1, y1) = frame.map(to);
        let segment = Segment::new(x0, y0, x1, y1);
        let axis_aligned = segment.x1 - segment.x0 <= AXIS_TOLERANCE
            || segment.y1 - segment.y0 <= AXIS_TOLERANCE;
        if axis_aligned && segment.length() >= MIN_SEGMENT_LENGTH {
            segments.push(segment);
        }
    }
}
