use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// The uploaded PDF, exactly as received.
///
/// No validation happens here: a file that is not a PDF fails in whichever
/// backend first tries to parse it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfBytesSource {
    bytes: Vec<u8>,
}

impl PdfBytesSource {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        PdfBytesSource {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Sub-mode of grid-based extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridMode {
    /// Cells bounded by explicit ruling lines.
    Ruled,
    /// Column boundaries inferred from whitespace alignment.
    Inferred,
}

/// Caller preference selecting which strategy runs first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlavorHint {
    #[default]
    Auto,
    GridRuled,
    GridInferred,
    TextFlow,
    /// Any value not recognized above, kept verbatim.
    Other(String),
}

impl FlavorHint {
    /// Parse a form value. Accepts both the canonical names and the
    /// `camelot-lattice` / `camelot-stream` / `pdfplumber` aliases.
    pub fn from_str_loose(s: &str) -> FlavorHint {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "" | "auto" => FlavorHint::Auto,
            "grid-ruled" | "camelot-lattice" | "lattice" => FlavorHint::GridRuled,
            "grid-inferred" | "camelot-stream" | "stream" => FlavorHint::GridInferred,
            "text-flow" | "pdfplumber" => FlavorHint::TextFlow,
            _ => FlavorHint::Other(trimmed.to_string()),
        }
    }

    /// Grid sub-mode to attempt first, or `None` when grid extraction is skipped.
    pub fn grid_mode(&self) -> Option<GridMode> {
        match self {
            FlavorHint::GridRuled => Some(GridMode::Ruled),
            FlavorHint::Auto | FlavorHint::GridInferred | FlavorHint::Other(_) => {
                Some(GridMode::Inferred)
            }
            FlavorHint::TextFlow => None,
        }
    }

    /// True when text-flow extraction must run regardless of grid results.
    pub fn forces_text_flow(&self) -> bool {
        matches!(self, FlavorHint::TextFlow)
    }
}

impl fmt::Display for FlavorHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlavorHint::Auto => write!(f, "auto"),
            FlavorHint::GridRuled => write!(f, "grid-ruled"),
            FlavorHint::GridInferred => write!(f, "grid-inferred"),
            FlavorHint::TextFlow => write!(f, "text-flow"),
            FlavorHint::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// One extracted table: a header row and rectangular data rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabularResult {
    /// 1-based page the table was found on.
    pub page_number: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TabularResult {
    /// Build a table from a raw cell grid, using the first row as the header.
    ///
    /// Rows are padded to the widest row. Returns `None` for an empty grid.
    pub fn from_grid(page_number: usize, grid: Vec<Vec<String>>) -> Option<TabularResult> {
        let width = grid.iter().map(Vec::len).max().unwrap_or(0);
        if width == 0 {
            return None;
        }

        let mut rows = grid.into_iter().map(|mut row| {
            row.resize(width, String::new());
            row
        });
        let header = rows.next()?;

        Some(TabularResult {
            page_number,
            columns: normalize_headers(header),
            rows: rows.collect(),
        })
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

/// Make header names non-empty and unique.
///
/// Empty names become `Column_<n>`; repeats get `_2`, `_3`, ... appended,
/// skipping any suffixed name that is already taken.
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let trimmed: Vec<String> = raw
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let name = name.trim();
            if name.is_empty() {
                format!("Column_{}", i + 1)
            } else {
                name.to_string()
            }
        })
        .collect();

    let mut taken: HashSet<String> = trimmed.iter().cloned().collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::with_capacity(trimmed.len());

    for name in &trimmed {
        if seen.insert(name.as_str()) {
            out.push(name.clone());
            continue;
        }
        let mut n = 2;
        let unique = loop {
            let candidate = format!("{name}_{n}");
            if !taken.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        taken.insert(unique.clone());
        out.push(unique);
    }

    out
}

/// Result of running one strategy, kept explicit so that "no tables" and
/// "could not read the file" stay distinguishable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Tables(Vec<TabularResult>),
    NoTables,
    ParseError(String),
}

impl ExtractionOutcome {
    pub fn from_tables(tables: Vec<TabularResult>) -> Self {
        if tables.is_empty() {
            ExtractionOutcome::NoTables
        } else {
            ExtractionOutcome::Tables(tables)
        }
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self, ExtractionOutcome::ParseError(_))
    }

    pub fn into_tables(self) -> Vec<TabularResult> {
        match self {
            ExtractionOutcome::Tables(tables) => tables,
            ExtractionOutcome::NoTables | ExtractionOutcome::ParseError(_) => Vec::new(),
        }
    }
}
