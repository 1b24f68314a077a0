use std::collections::BTreeMap;
#[cfg(not(target_arch = "wasm32"))]
use std::panic::{self, AssertUnwindSafe};

use encoding_rs::{UTF_16BE, UTF_16LE, WINDOWS_1252};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::error::ExtractError;
use crate::model::PageText;
use crate::table_parse::{looks_numeric, split_line_into_cells};

const FORM_FEED: char = '\u{000C}';
const IDENTITY_PLACEHOLDER: &str = "?Identity-H Unimplemented?";
/// Negative `TJ` adjustments beyond this read as a gap between two cells.
const CELL_GAP_KERNING: f32 = -200.0;

/// Text pulled out of a PDF, per page and for the whole document.
#[derive(Debug, Clone, Default)]
pub(crate) struct DocumentText {
    pub pages: Vec<PageText>,
    pub full_text: Option<String>,
}

/// Where a page text candidate came from; used only for logging.
#[derive(Debug, Clone, Copy)]
enum TextSource {
    DocumentSplit,
    ContentStream,
    LopdfPage,
}

fn page_chunks(document_text: &str) -> Vec<String> {
    let mut chunks = document_text
        .split(FORM_FEED)
        .map(ToOwned::to_owned)
        .collect::<Vec<_>>();
    if chunks.last().is_some_and(String::is_empty) {
        chunks.pop();
    }
    chunks
}

fn is_garbled(text: &str) -> bool {
    if text.contains(IDENTITY_PLACEHOLDER) {
        return true;
    }

    let (mut glyphs, mut replacements, mut controls) = (0_usize, 0_usize, 0_usize);
    for ch in text.chars() {
        glyphs += 1;
        if ch == '\u{FFFD}' {
            replacements += 1;
        } else if ch.is_control() && !ch.is_whitespace() {
            controls += 1;
        }
    }

    glyphs > 0 && (replacements * 8 > glyphs || controls * 5 > glyphs)
}

fn decode_utf16_with_bom(bytes: &[u8]) -> Option<String> {
    let (decoded, had_errors) = match bytes {
        [0xFE, 0xFF, rest @ ..] => UTF_16BE.decode_without_bom_handling(rest),
        [0xFF, 0xFE, rest @ ..] => UTF_16LE.decode_without_bom_handling(rest),
        _ => return None,
    };
    (!had_errors && !decoded.is_empty()).then(|| decoded.into_owned())
}

fn is_two_byte_encoding(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    ["utf16", "ucs2", "identity-h"]
        .iter()
        .any(|marker| name.contains(marker))
}

/// Decodes one string operand, falling back to UTF-16 and then Windows-1252.
fn decode_string_operand(encoding: Option<&str>, bytes: &[u8]) -> String {
    let text = Document::decode_text(encoding, bytes);
    if !is_garbled(&text) {
        return text;
    }

    if let Some(text) = decode_utf16_with_bom(bytes) {
        return text;
    }

    if encoding.is_some_and(is_two_byte_encoding) {
        let (wide, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
        if !had_errors && !wide.is_empty() {
            return wide.into_owned();
        }
    }

    WINDOWS_1252.decode(bytes).0.into_owned()
}

/// Ranks page text by how much of it looks like statement rows.
fn candidate_score(text: &str) -> i64 {
    let rows = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(split_line_into_cells)
        .collect::<Vec<_>>();
    if rows.is_empty() {
        return i64::MIN / 4;
    }

    let (mut gridded, mut with_amounts) = (0_i64, 0_i64);
    for cells in &rows {
        gridded += i64::from(cells.len() >= 2);
        with_amounts += i64::from(cells.iter().any(|cell| looks_numeric(cell)));
    }
    let lines = i64::try_from(rows.len()).unwrap_or(i64::MAX / 64);
    let garbled = if is_garbled(text) { 800 } else { 0 };

    gridded * 50 + with_amounts * 15 + lines - garbled
}

fn best_candidate(candidates: Vec<(TextSource, String)>) -> String {
    let best = candidates
        .into_iter()
        .max_by_key(|(_, text)| candidate_score(text));
    match best {
        Some((source, text)) => {
            debug!(?source, "picked page text candidate");
            text
        }
        None => String::new(),
    }
}

/// Font resource name to the encoding lopdf reports for it.
type FontEncodings<'a> = BTreeMap<Vec<u8>, &'a str>;

/// Accumulates shown text into lines while walking a page content stream.
struct LineCollector<'a> {
    fonts: &'a FontEncodings<'a>,
    encoding: Option<&'a str>,
    pending: String,
    lines: Vec<String>,
}

impl<'a> LineCollector<'a> {
    fn new(fonts: &'a FontEncodings<'a>) -> Self {
        Self {
            fonts,
            encoding: None,
            pending: String::new(),
            lines: Vec::new(),
        }
    }

    fn apply(&mut self, operation: &Operation) {
        match operation.operator.as_str() {
            "Tf" => {
                let font = operation.operands.first().and_then(|name| name.as_name().ok());
                if let Some(font) = font {
                    self.encoding = self.fonts.get(font).copied();
                }
            }
            "Tj" | "TJ" | "'" | "\"" => self.show(&operation.operands),
            "T*" | "Td" | "TD" | "Tm" | "ET" => self.break_line(),
            _ => {}
        }
    }

    fn show(&mut self, operands: &[Object]) {
        for operand in operands {
            match operand {
                Object::String(bytes, _) => {
                    let text = decode_string_operand(self.encoding, bytes);
                    self.pending.push_str(&text);
                }
                Object::Array(items) => self.show(items),
                Object::Integer(_) | Object::Real(_)
                    if operand.as_float().is_ok_and(|offset| offset < CELL_GAP_KERNING) =>
                {
                    self.pending.push_str("  ");
                }
                _ => {}
            }
        }
    }

    fn break_line(&mut self) {
        if !self.pending.trim().is_empty() {
            self.lines.push(std::mem::take(&mut self.pending));
        }
        self.pending.clear();
    }

    fn finish(mut self) -> Option<String> {
        self.break_line();
        (!self.lines.is_empty()).then(|| self.lines.join("\n"))
    }
}

fn content_stream_text(document: &Document, page_id: ObjectId) -> Option<String> {
    let content = document
        .get_page_content(page_id)
        .ok()
        .and_then(|bytes| Content::decode(&bytes).ok())?;
    let fonts = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<FontEncodings<'_>>();

    let mut collector = LineCollector::new(&fonts);
    for operation in &content.operations {
        collector.apply(operation);
    }
    collector.finish()
}

/// Whole-document text from pdf-extract, pages separated by form feeds.
///
/// pdf-extract panics on some malformed font dictionaries; the panic is
/// caught here and reported as [`ExtractError::PdfExtract`].
#[cfg(not(target_arch = "wasm32"))]
fn extract_document_text(input_pdf: &[u8]) -> Result<String, ExtractError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(input_pdf)
    }));
    match outcome {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(error)) => Err(ExtractError::PdfExtract(error.to_string())),
        Err(_) => Err(ExtractError::PdfExtract(
            "pdf-extract panicked on a malformed document".to_string(),
        )),
    }
}

/// Panics abort on wasm32, so pdf-extract is never called there and pages
/// come from lopdf alone.
#[cfg(target_arch = "wasm32")]
fn extract_document_text(_input_pdf: &[u8]) -> Result<String, ExtractError> {
    Err(ExtractError::PdfExtract(
        "document text extraction is not available on wasm32".to_string(),
    ))
}

/// Loads the PDF from memory and returns the best text candidate for every page.
///
/// The parsed document lives only for the duration of this call.
pub(crate) fn read_pdf_text(input_pdf: &[u8]) -> Result<DocumentText, ExtractError> {
    let document = Document::load_mem(input_pdf)?;
    let page_ids = document.get_pages();
    if page_ids.is_empty() {
        return Err(ExtractError::NoPages);
    }

    let full_text = extract_document_text(input_pdf)
        .inspect_err(|error| debug!(%error, "document text unavailable"))
        .ok();
    let mut split = full_text
        .as_deref()
        .map(page_chunks)
        .filter(|chunks| chunks.len() == page_ids.len())
        .unwrap_or_default()
        .into_iter();

    let pages = page_ids
        .iter()
        .map(|(&page_number, &page_id)| {
            let candidates = [
                (TextSource::DocumentSplit, split.next()),
                (
                    TextSource::ContentStream,
                    content_stream_text(&document, page_id),
                ),
                (
                    TextSource::LopdfPage,
                    document.extract_text(&[page_number]).ok(),
                ),
            ]
            .into_iter()
            .filter_map(|(source, text)| text.map(|text| (source, text)))
            .filter(|(_, text)| !text.trim().is_empty())
            .collect();

            PageText {
                page_number,
                text: best_candidate(candidates),
            }
        })
        .collect();

    Ok(DocumentText { pages, full_text })
}

#[cfg(test)]
mod tests {
    use super::{
        TextSource, best_candidate, decode_utf16_with_bom, extract_document_text, is_garbled,
        page_chunks,
    };
    use crate::error::ExtractError;

    #[test]
    fn form_feed_separates_pages() {
        assert_eq!(page_chunks("first\u{000C}second\u{000C}"), vec!["first", "second"]);
        assert_eq!(page_chunks("only"), vec!["only"]);
    }

    #[test]
    fn decodes_utf16_with_byte_order_mark() {
        let big_endian = [0xFE, 0xFF, 0x00, 0x41, 0x00, 0x52, 0x00, 0x4E];
        let little_endian = [0xFF, 0xFE, 0x41, 0x00, 0x52, 0x00, 0x4E, 0x00];
        assert_eq!(decode_utf16_with_bom(&big_endian).as_deref(), Some("ARN"));
        assert_eq!(decode_utf16_with_bom(&little_endian).as_deref(), Some("ARN"));
        assert_eq!(decode_utf16_with_bom(b"ARN"), None);
    }

    #[test]
    fn replacement_heavy_text_is_garbled() {
        assert!(is_garbled("\u{FFFD}\u{FFFD}a"));
        assert!(is_garbled("?Identity-H Unimplemented?"));
        assert!(!is_garbled("Date  Amount"));
        assert!(!is_garbled(""));
    }

    #[test]
    fn gridded_text_beats_run_together_text() {
        let best = best_candidate(vec![
            (TextSource::LopdfPage, "Date Amount Balance".to_string()),
            (
                TextSource::ContentStream,
                "Date  Amount  Balance\n01/01  F 10.00  20.00".to_string(),
            ),
        ]);
        assert!(best.starts_with("Date  Amount"));
    }

    #[test]
    fn no_candidates_yields_empty_page() {
        assert_eq!(best_candidate(Vec::new()), "");
    }

    #[test]
    fn unreadable_document_text_is_an_extract_error() {
        let result = extract_document_text(b"%PDF-1.5 not really a document");
        assert!(matches!(result, Err(ExtractError::PdfExtract(_))));
    }
}
