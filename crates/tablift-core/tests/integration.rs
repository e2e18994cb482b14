//! Integration tests for the extraction / fallback / export pipeline.
//!
//! Strategies and backends are mocked, so these tests run without
//! poppler-utils installed. The one test that shells out to pdftotext
//! returns early when it is missing.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use calamine::{Reader, Xlsx};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tablift_core::convert_pdf;
use tablift_core::error::TabliftError;
use tablift_core::extraction::pdftotext::PdftotextExtractor;
use tablift_core::extraction::{
    BBox, PageContent, PageRulings, PdfExtractor, RulingExtractor, Segment, Word,
};
use tablift_core::model::{FlavorHint, PdfBytesSource, TabularResult};
use tablift_core::orchestrator::{ExtractionStatus, Orchestrator};
use tablift_core::selector::PageSelector;
use tablift_core::strategy::text_flow::TextFlowStrategy;
use tablift_core::strategy::TableExtractionStrategy;
use tablift_core::workbook::{PLACEHOLDER_MESSAGE, PLACEHOLDER_SHEET};

struct MockStrategy {
    name: &'static str,
    result: Result<Vec<TabularResult>, String>,
    calls: Arc<AtomicUsize>,
}

impl MockStrategy {
    fn boxed(
        name: &'static str,
        result: Result<Vec<TabularResult>, String>,
    ) -> (Box<dyn TableExtractionStrategy>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = MockStrategy {
            name,
            result,
            calls: calls.clone(),
        };
        (Box::new(strategy), calls)
    }
}

impl TableExtractionStrategy for MockStrategy {
    fn extract(
        &self,
        _source: &PdfBytesSource,
        _pages: &PageSelector,
    ) -> Result<Vec<TabularResult>, TabliftError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map_err(TabliftError::Extraction)
    }

    fn name(&self) -> &str {
        self.name
    }
}

struct PanickingStrategy;

impl TableExtractionStrategy for PanickingStrategy {
    fn extract(
        &self,
        _source: &PdfBytesSource,
        _pages: &PageSelector,
    ) -> Result<Vec<TabularResult>, TabliftError> {
        panic!("unsupported font encoding")
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

fn table(page: usize, grid: &[&[&str]]) -> TabularResult {
    let grid = grid
        .iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect();
    TabularResult::from_grid(page, grid).unwrap()
}

fn read_back(bytes: &[u8]) -> Vec<(String, Vec<Vec<String>>)> {
    let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(Cursor::new(bytes)).unwrap();
    workbook
        .sheet_names()
        .into_iter()
        .map(|name| {
            let range = workbook.worksheet_range(&name).unwrap();
            let rows = range
                .rows()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect();
            (name, rows)
        })
        .collect()
}

/// Orchestrator whose three strategies are mocks; returns the call counters
/// for (grid-ruled, grid-inferred, text-flow).
fn orchestrator(
    ruled: Result<Vec<TabularResult>, String>,
    inferred: Result<Vec<TabularResult>, String>,
    text_flow: Result<Vec<TabularResult>, String>,
) -> (Orchestrator, [Arc<AtomicUsize>; 3]) {
    let (ruled, ruled_calls) = MockStrategy::boxed("grid-ruled", ruled);
    let (inferred, inferred_calls) = MockStrategy::boxed("grid-inferred", inferred);
    let (text_flow, text_calls) = MockStrategy::boxed("text-flow", text_flow);
    (
        Orchestrator::new(ruled, inferred, text_flow),
        [ruled_calls, inferred_calls, text_calls],
    )
}

fn calls(counters: &[Arc<AtomicUsize>; 3]) -> [usize; 3] {
    [
        counters[0].load(Ordering::SeqCst),
        counters[1].load(Ordering::SeqCst),
        counters[2].load(Ordering::SeqCst),
    ]
}

fn source() -> PdfBytesSource {
    PdfBytesSource::new(b"%PDF-1.7 fixture".to_vec())
}

// ---------------------------------------------------------------------------
// Test 1: Grid tables become Table_1..Table_N, identically on every run
// ---------------------------------------------------------------------------
#[test]
fn grid_tables_become_numbered_sheets() {
    let found = vec![
        table(1, &[&["Region", "Sales"], &["North", "10"]]),
        table(2, &[&["Region", "Costs"], &["South", "7"]]),
    ];
    let (orch, counters) = orchestrator(Ok(vec![]), Ok(found), Ok(vec![]));

    let first = convert_pdf(&source(), &PageSelector::all(), &FlavorHint::Auto, &orch).unwrap();
    let second = convert_pdf(&source(), &PageSelector::all(), &FlavorHint::Auto, &orch).unwrap();

    let sheets = read_back(&first.workbook);
    let names: Vec<&str> = sheets.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["Table_1", "Table_2"]);
    assert_eq!(sheets[1].1[1], vec!["South", "7"]);
    assert_eq!(read_back(&second.workbook), sheets);
    assert_eq!(first.extraction.status(), ExtractionStatus::Tables);
    // Text flow is only a fallback
    assert_eq!(calls(&counters), [0, 2, 0]);
}

// ---------------------------------------------------------------------------
// Test 2: Nothing found anywhere gives one placeholder sheet, for any flavor
// ---------------------------------------------------------------------------
#[test]
fn no_tables_yields_placeholder_for_every_flavor() {
    for flavor in ["auto", "grid-ruled", "grid-inferred", "text-flow", "bogus"] {
        let (orch, _) = orchestrator(Ok(vec![]), Ok(vec![]), Ok(vec![]));
        let flavor = FlavorHint::from_str_loose(flavor);
        let conversion = convert_pdf(&source(), &PageSelector::all(), &flavor, &orch).unwrap();

        let sheets = read_back(&conversion.workbook);
        assert_eq!(sheets.len(), 1, "flavor {flavor}");
        assert_eq!(sheets[0].0, PLACEHOLDER_SHEET);
        assert_eq!(sheets[0].1, vec![vec![PLACEHOLDER_MESSAGE]]);
        assert_eq!(conversion.extraction.status(), ExtractionStatus::NoTables);
    }
}

// ---------------------------------------------------------------------------
// Test 3: Text-flow flavor never touches grid extraction
// ---------------------------------------------------------------------------
#[test]
fn text_flow_flavor_skips_grid_strategies() {
    let orch = Orchestrator::new(
        Box::new(PanickingStrategy),
        Box::new(PanickingStrategy),
        MockStrategy::boxed("text-flow", Ok(vec![table(1, &[&["A"], &["1"]])])).0,
    );

    for alias in ["text-flow", "pdfplumber"] {
        let extraction = orch.run(
            &source(),
            &PageSelector::all(),
            &FlavorHint::from_str_loose(alias),
        );
        assert_eq!(extraction.attempts.len(), 1);
        assert_eq!(extraction.attempts[0].strategy, "text-flow");
        assert_eq!(extraction.tables.len(), 1);
    }
}

// ---------------------------------------------------------------------------
// Test 4: Ruled grid finding nothing falls back to text flow
// ---------------------------------------------------------------------------
#[test]
fn empty_ruled_grid_falls_back_to_text_flow() {
    let fallback = vec![table(3, &[&["Name", "Qty"], &["Bolt", "40"]])];
    let (orch, counters) = orchestrator(Ok(vec![]), Ok(vec![]), Ok(fallback.clone()));

    let extraction = orch.run(
        &source(),
        &PageSelector::all(),
        &FlavorHint::from_str_loose("camelot-lattice"),
    );

    assert_eq!(calls(&counters), [1, 0, 1]);
    assert_eq!(extraction.tables, fallback);
    let strategies: Vec<&str> = extraction
        .attempts
        .iter()
        .map(|a| a.strategy.as_str())
        .collect();
    assert_eq!(strategies, vec!["grid-ruled", "text-flow"]);
}

// ---------------------------------------------------------------------------
// Test 5: Header [A,B] and row [1,2] survive the trip through the workbook
// ---------------------------------------------------------------------------
#[test]
fn workbook_round_trip() {
    let (orch, _) = orchestrator(
        Ok(vec![]),
        Ok(vec![table(1, &[&["A", "B"], &["1", "2"]])]),
        Ok(vec![]),
    );
    let conversion = convert_pdf(&source(), &PageSelector::all(), &FlavorHint::Auto, &orch).unwrap();

    let sheets = read_back(&conversion.workbook);
    assert_eq!(sheets.len(), 1);
    assert_eq!(sheets[0].0, "Table_1");
    assert_eq!(sheets[0].1[0], vec!["A", "B"]);
    assert_eq!(sheets[0].1[1..], [vec!["1", "2"]]);
}

// ---------------------------------------------------------------------------
// Test 6: Non-PDF bytes through the real backends (regression baseline)
//
// Both strategies fail (pdftotext rejects the file, or is not installed at
// all), nothing escapes, and the caller gets a placeholder workbook.
// ---------------------------------------------------------------------------
#[test]
fn non_pdf_upload_yields_placeholder_and_parse_error_status() {
    let orch = Orchestrator::with_pdftotext("pdftotext");
    let blob = PdfBytesSource::new(b"PK\x03\x04 this is a zip, not a pdf".to_vec());

    let conversion = convert_pdf(&blob, &PageSelector::all(), &FlavorHint::Auto, &orch).unwrap();

    assert_eq!(conversion.extraction.status(), ExtractionStatus::ParseError);
    assert_eq!(conversion.extraction.attempts.len(), 2);
    assert!(conversion
        .extraction
        .attempts
        .iter()
        .all(|a| a.error.is_some()));
    let sheets = read_back(&conversion.workbook);
    assert_eq!(sheets[0].1, vec![vec![PLACEHOLDER_MESSAGE]]);
}

// ---------------------------------------------------------------------------
// Test 7: Grid failure is recorded, not raised, and triggers the fallback
// ---------------------------------------------------------------------------
#[test]
fn grid_failure_is_swallowed_and_recorded() {
    let (orch, counters) = orchestrator(
        Ok(vec![]),
        Err("xref table is corrupt".into()),
        Ok(vec![table(1, &[&["K", "V"], &["a", "b"]])]),
    );

    let extraction = orch.run(&source(), &PageSelector::all(), &FlavorHint::Auto);

    assert_eq!(calls(&counters), [0, 1, 1]);
    assert_eq!(extraction.tables.len(), 1);
    assert!(extraction.attempts[0]
        .error
        .as_deref()
        .unwrap()
        .contains("xref table is corrupt"));
    assert_eq!(extraction.attempts[1].error, None);
    assert_eq!(extraction.status(), ExtractionStatus::Tables);
}

// ---------------------------------------------------------------------------
// Test 8: A panicking text-flow strategy is contained too
// ---------------------------------------------------------------------------
#[test]
fn text_flow_panic_is_contained() {
    let orch = Orchestrator::new(
        MockStrategy::boxed("grid-ruled", Ok(vec![])).0,
        MockStrategy::boxed("grid-inferred", Err("unreadable".into())).0,
        Box::new(PanickingStrategy),
    );

    let extraction = orch.run(&source(), &PageSelector::all(), &FlavorHint::Auto);

    assert!(extraction.tables.is_empty());
    assert_eq!(extraction.status(), ExtractionStatus::ParseError);
    assert_eq!(
        extraction.attempts[1].error.as_deref(),
        Some("unsupported font encoding")
    );
}

// ---------------------------------------------------------------------------
// Test 9: Unrecognized flavor behaves like default grid extraction + fallback
// ---------------------------------------------------------------------------
#[test]
fn unknown_flavor_uses_inferred_grid_then_fallback() {
    let (orch, counters) = orchestrator(Ok(vec![]), Ok(vec![]), Ok(vec![]));

    let extraction = orch.run(
        &source(),
        &PageSelector::all(),
        &FlavorHint::from_str_loose("tabula"),
    );

    assert_eq!(calls(&counters), [0, 1, 1]);
    assert_eq!(extraction.flavor, "tabula");
}

// ---------------------------------------------------------------------------
// Test 10: Real strategies over mock backends, ruled tables on two pages
// ---------------------------------------------------------------------------
struct MockExtractor {
    pages: Vec<PageContent>,
}

impl PdfExtractor for MockExtractor {
    fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageContent>, TabliftError> {
        Ok(self.pages.clone())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

struct MockRulings {
    pages: Vec<PageRulings>,
}

impl RulingExtractor for MockRulings {
    fn extract_rulings(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageRulings>, TabliftError> {
        Ok(self.pages.clone())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

fn word(text: &str, x: f32, y: f32) -> Word {
    Word {
        text: text.to_string(),
        bbox: BBox {
            x_min: x,
            y_min: y,
            x_max: x + 6.0 * text.chars().count() as f32,
            y_max: y + 10.0,
        },
    }
}

/// Ruled 2x2 grid with its top-left corner at (100, top).
fn ruled_box(top: f32) -> Vec<Segment> {
    let mut segments: Vec<Segment> = [top, top + 20.0, top + 40.0]
        .iter()
        .map(|y| Segment::horizontal(*y, 100.0, 300.0))
        .collect();
    segments.extend(
        [100.0, 200.0, 300.0]
            .iter()
            .map(|x| Segment::vertical(*x, top, top + 40.0)),
    );
    segments
}

#[test]
fn ruled_tables_through_real_strategies() {
    let page = |n: usize, words: Vec<Word>| PageContent {
        page_number: n,
        lines: vec![],
        words,
    };
    let extractor = MockExtractor {
        pages: vec![
            page(
                1,
                vec![
                    word("City", 105.0, 105.0),
                    word("Pop", 205.0, 105.0),
                    word("Oslo", 105.0, 125.0),
                    word("709000", 205.0, 125.0),
                ],
            ),
            page(2, vec![word("Narrative", 50.0, 50.0)]),
            page(
                3,
                vec![
                    word("Year", 105.0, 505.0),
                    word("Rain", 205.0, 505.0),
                    word("2023", 105.0, 525.0),
                    word("812", 205.0, 525.0),
                ],
            ),
        ],
    };
    let rulings = MockRulings {
        pages: vec![
            PageRulings {
                page_number: 1,
                segments: ruled_box(100.0),
            },
            PageRulings {
                page_number: 2,
                segments: vec![],
            },
            PageRulings {
                page_number: 3,
                segments: ruled_box(500.0),
            },
        ],
    };
    let orch = Orchestrator::with_backends(Arc::new(extractor), Arc::new(rulings));

    let conversion = convert_pdf(
        &source(),
        &PageSelector::all(),
        &FlavorHint::GridRuled,
        &orch,
    )
    .unwrap();

    let sheets = read_back(&conversion.workbook);
    assert_eq!(sheets.len(), 2);
    assert_eq!(sheets[0].0, "Table_1");
    assert_eq!(sheets[0].1, vec![vec!["City", "Pop"], vec!["Oslo", "709000"]]);
    assert_eq!(sheets[1].0, "Table_2");
    assert_eq!(sheets[1].1, vec![vec!["Year", "Rain"], vec!["2023", "812"]]);
    assert_eq!(conversion.extraction.attempts.len(), 1);

    // Restricting pages restricts the output
    let only_third = orch.run(&source(), &PageSelector::new("3-end"), &FlavorHint::GridRuled);
    assert_eq!(only_third.tables.len(), 1);
    assert_eq!(only_third.tables[0].page_number, 3);
}

// ---------------------------------------------------------------------------
// Test 11: A bad page selector fails grid extraction only; text flow still
// scans the whole document
// ---------------------------------------------------------------------------
fn layout_page(n: usize, lines: &[&str]) -> PageContent {
    PageContent {
        page_number: n,
        lines: lines.iter().map(|s| s.to_string()).collect(),
        words: vec![],
    }
}

#[test]
fn invalid_page_selector_falls_back_to_text_flow() {
    let orch = Orchestrator::with_backends(
        Arc::new(MockExtractor {
            pages: vec![layout_page(1, &["Item    Qty", "Bolt    40"])],
        }),
        Arc::new(MockRulings { pages: vec![] }),
    );

    let conversion = convert_pdf(
        &source(),
        &PageSelector::new("first"),
        &FlavorHint::Auto,
        &orch,
    )
    .unwrap();

    let attempts = &conversion.extraction.attempts;
    assert_eq!(attempts.len(), 2);
    assert!(attempts[0]
        .error
        .as_deref()
        .unwrap()
        .contains("invalid page selector"));
    assert_eq!(attempts[1].error, None);
    assert_eq!(attempts[1].table_count, 1);
    assert_eq!(conversion.extraction.status(), ExtractionStatus::Tables);

    let sheets = read_back(&conversion.workbook);
    assert_eq!(sheets[0].1, vec![vec!["Item", "Qty"], vec!["Bolt", "40"]]);
}

#[test]
fn text_flow_reads_pages_outside_the_selector() {
    let orch = Orchestrator::with_backends(
        Arc::new(MockExtractor {
            pages: vec![
                layout_page(1, &["Introduction"]),
                layout_page(2, &["City     Pop", "Oslo     709000"]),
            ],
        }),
        Arc::new(MockRulings { pages: vec![] }),
    );

    let extraction = orch.run(&source(), &PageSelector::new("1"), &FlavorHint::TextFlow);

    assert_eq!(extraction.tables.len(), 1);
    assert_eq!(extraction.tables[0].page_number, 2);
    assert_eq!(extraction.tables[0].columns, vec!["City", "Pop"]);
}

// ---------------------------------------------------------------------------
// Test 12: pdftotext and text flow over a generated two-column PDF
// ---------------------------------------------------------------------------

/// One Letter-size page with a Helvetica cell at each (x, y, text).
fn text_pdf(cells: &[(i64, i64, &str)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut operations = Vec::new();
    for &(x, y, text) in cells {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
        operations.push(Operation::new("Td", vec![x.into(), y.into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(text)]));
        operations.push(Operation::new("ET", vec![]));
    }
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

#[test]
fn text_flow_reads_a_real_pdf() {
    let extractor = PdftotextExtractor::new();
    if !extractor.is_available() {
        return;
    }

    let pdf = text_pdf(&[
        (72, 700, "Item"),
        (300, 700, "Qty"),
        (72, 680, "Bolt"),
        (300, 680, "40"),
        (72, 660, "Nut"),
        (300, 660, "12"),
    ]);

    let pages = extractor.extract_pages(&pdf).unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].page_number, 1);
    assert_eq!(pages[0].words.len(), 6);

    let strategy = TextFlowStrategy::new(Arc::new(extractor));
    let tables = strategy
        .extract(&PdfBytesSource::new(pdf), &PageSelector::all())
        .unwrap();

    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].page_number, 1);
    assert_eq!(tables[0].columns, vec!["Item", "Qty"]);
    assert_eq!(tables[0].rows, vec![vec!["Bolt", "40"], vec!["Nut", "12"]]);
}
