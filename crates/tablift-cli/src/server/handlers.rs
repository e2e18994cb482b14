use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue};
use axum::response::{Html, IntoResponse, Response};
use tablift_core::model::{FlavorHint, PdfBytesSource};
use tablift_core::selector::PageSelector;
use tablift_core::XLSX_CONTENT_TYPE;

use super::error::ApiError;
use super::AppState;

pub const EXTRACTION_STATUS_HEADER: &str = "x-extraction-status";

/// `GET /`: the upload page.
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    tokio::fs::read_to_string(&state.index_path)
        .await
        .map(Html)
        .map_err(|e| {
            ApiError::Internal(format!(
                "cannot read index page {}: {e}",
                state.index_path.display()
            ))
        })
}

struct Upload {
    filename: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct ConvertForm {
    file: Option<Upload>,
    pages: Option<String>,
    flavor: Option<String>,
}

impl ConvertForm {
    async fn read(multipart: &mut Multipart) -> Result<ConvertForm, ApiError> {
        let mut form = ConvertForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("file") => {
                    let filename = field.file_name().map(str::to_string);
                    let bytes = field.bytes().await?;
                    form.file = Some(Upload {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
                Some("pages") => form.pages = Some(field.text().await?),
                Some("flavor") => form.flavor = Some(field.text().await?),
                _ => {}
            }
        }
        Ok(form)
    }
}

/// `POST /convert`: multipart upload in, xlsx workbook out.
pub async fn convert(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut multipart = multipart?;
    let form = ConvertForm::read(&mut multipart).await?;
    let upload = form.file.ok_or(ApiError::MissingField("file"))?;

    let pages = PageSelector::new(form.pages.unwrap_or_else(|| "all".to_string()));
    let flavor = FlavorHint::from_str_loose(form.flavor.as_deref().unwrap_or("auto"));
    let download = download_name(upload.filename.as_deref());
    let size = upload.bytes.len();
    let source = PdfBytesSource::new(upload.bytes);

    let orchestrator = state.orchestrator.clone();
    let conversion = tokio::task::spawn_blocking(move || {
        tablift_core::convert_pdf(&source, &pages, &flavor, &orchestrator)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("conversion worker failed: {e}")))?
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    let extraction = &conversion.extraction;
    let status = extraction.status();
    tracing::info!(
        file = %download,
        bytes = size,
        flavor = %extraction.flavor,
        pages = %extraction.pages,
        tables = extraction.tables.len(),
        status = status.as_str(),
        "converted upload"
    );

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{download}\""))
        .map_err(|e| ApiError::Internal(format!("bad content-disposition: {e}")))?;
    let headers = [
        (CONTENT_TYPE, HeaderValue::from_static(XLSX_CONTENT_TYPE)),
        (CONTENT_DISPOSITION, disposition),
        (
            HeaderName::from_static(EXTRACTION_STATUS_HEADER),
            HeaderValue::from_static(status.as_str()),
        ),
    ];
    Ok((headers, conversion.workbook).into_response())
}

/// Attachment name for an upload: the original name plus `.xlsx`.
///
/// Quotes, backslashes and control characters are dropped and other
/// non-ASCII characters become `_` so the header value stays valid.
fn download_name(filename: Option<&str>) -> String {
    let cleaned: String = filename
        .unwrap_or("")
        .chars()
        .filter(|c| !matches!(c, '"' | '\\') && !c.is_control())
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    let base = cleaned.trim();
    let base = if base.is_empty() { "document" } else { base };
    format!("{base}.xlsx")
}
