use crate::error::TabliftError;
use crate::extraction::{BBox, PageContent, PdfExtractor, Word};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

/// PDF extraction backend using pdftotext (from poppler-utils).
///
/// Runs `pdftotext -layout` for whitespace-aligned text and
/// `pdftotext -bbox-layout` for word positions and page sizes.
pub struct PdftotextExtractor {
    program: PathBuf,
}

impl PdftotextExtractor {
    pub fn new() -> Self {
        Self::with_program("pdftotext")
    }

    /// Use a specific pdftotext binary instead of the one on `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        PdftotextExtractor {
            program: program.into(),
        }
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }

    fn run(&self, mode: &str, pdf_path: &Path) -> Result<String, TabliftError> {
        let output = Command::new(&self.program)
            .arg(mode)
            .arg(pdf_path)
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TabliftError::PdftotextNotFound
                } else {
                    TabliftError::Extraction(format!("pdftotext {mode} failed: {e}"))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(TabliftError::PdftotextFailed { code, stderr });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExtractor for PdftotextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, TabliftError> {
        // Write PDF bytes to a temp file
        let mut tmpfile = tempfile::NamedTempFile::new()?;
        tmpfile.write_all(pdf_bytes)?;
        tmpfile.flush()?;

        let layout = self.run("-layout", tmpfile.path())?;
        let bbox = self.run("-bbox-layout", tmpfile.path())?;
        let bbox_pages = parse_bbox_xml(&bbox)?;

        tracing::debug!(
            backend = self.backend_name(),
            pages = bbox_pages.len(),
            "extracted page text"
        );

        Ok(merge_pages(&layout, bbox_pages))
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

#[derive(Debug, Clone, Default)]
struct BBoxPage {
    words: Vec<Word>,
}

/// Pair layout text (pages separated by form feed) with the bbox pages.
///
/// The bbox output decides the page count; pdftotext ends the layout text
/// with a trailing form feed, so the split yields one extra empty chunk.
fn merge_pages(layout: &str, bbox_pages: Vec<BBoxPage>) -> Vec<PageContent> {
    let mut chunks = layout.split('\x0c');

    bbox_pages
        .into_iter()
        .enumerate()
        .map(|(i, page)| PageContent {
            page_number: i + 1,
            lines: chunks
                .next()
                .map(|chunk| chunk.lines().map(|l| l.to_string()).collect())
                .unwrap_or_default(),
            words: page.words,
        })
        .collect()
}

fn parse_bbox_xml(xml: &str) -> Result<Vec<BBoxPage>, TabliftError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pages: Vec<BBoxPage> = Vec::new();
    let mut current_word: Option<(BBox, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(tag)) => match tag.name().as_ref() {
                b"page" => pages.push(BBoxPage::default()),
                b"word" => current_word = parse_bbox(&tag).map(|bbox| (bbox, String::new())),
                _ => {}
            },
            Ok(Event::Text(text)) => {
                if let Some((_, word)) = current_word.as_mut() {
                    match text.unescape() {
                        Ok(decoded) => word.push_str(&decoded),
                        Err(_) => word.push_str(&String::from_utf8_lossy(&text)),
                    }
                }
            }
            Ok(Event::End(tag)) if tag.name().as_ref() == b"word" => {
                if let (Some((bbox, text)), Some(page)) = (current_word.take(), pages.last_mut())
                {
                    let text = text.trim();
                    if !text.is_empty() {
                        page.words.push(Word {
                            text: text.to_string(),
                            bbox,
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(TabliftError::Extraction(format!(
                    "malformed pdftotext bbox output at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(pages)
}

fn parse_attr_f32(tag: &BytesStart<'_>, name: &[u8]) -> Option<f32> {
    tag.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok()?.trim().parse().ok())
}

fn parse_bbox(tag: &BytesStart<'_>) -> Option<BBox> {
    Some(BBox {
        x_min: parse_attr_f32(tag, b"xMin")?,
        y_min: parse_attr_f32(tag, b"yMin")?,
        x_max: parse_attr_f32(tag, b"xMax")?,
        y_max: parse_attr_f32(tag, b"yMax")?,
    })
}
