//! Multi-format document loader
//!
//! Dispatches a raw file by its declared mime type to a format-specific
//! extractor and yields plain-text segments with provenance (page number,
//! row range, or sheet name).

use calamine::Reader;

use crate::error::{Error, Result};
use crate::types::{DocumentFormat, Provenance};

/// Rows of tabular data grouped into one segment
const CSV_ROWS_PER_SEGMENT: usize = 50;

/// Extracted text plus where it came from
#[derive(Debug, Clone)]
pub struct TextSegment {
    /// Extracted text
    pub text: String,
    /// Source location within the document
    pub provenance: Provenance,
}

/// Multi-format loader, polymorphic over "extract text from bytes of
/// declared mime type"
pub struct DocumentLoader;

impl DocumentLoader {
    /// Load a file into text segments.
    ///
    /// An unrecognized mime type fails with `UnsupportedFormat`; content the
    /// declared format cannot decode fails with `CorruptDocument`. Both are
    /// per-file failures the ingestion pipeline isolates from the rest of
    /// the batch.
    pub fn load(filename: &str, mime_type: &str, data: &[u8]) -> Result<Vec<TextSegment>> {
        let format = DocumentFormat::detect(filename, mime_type)
            .ok_or_else(|| Error::unsupported_format(filename, mime_type))?;

        let segments = match format {
            DocumentFormat::Pdf => Self::load_pdf(filename, data)?,
            DocumentFormat::Docx => Self::load_docx(filename, data)?,
            DocumentFormat::Text | DocumentFormat::Markdown => Self::load_text(data),
            DocumentFormat::Csv => Self::load_csv(filename, data)?,
            DocumentFormat::Xlsx => Self::load_xlsx(filename, data)?,
        };

        if segments.iter().all(|s| s.text.trim().is_empty()) {
            return Err(Error::corrupt_document(
                filename,
                "no text content could be extracted",
            ));
        }

        Ok(segments)
    }

    fn load_pdf(filename: &str, data: &[u8]) -> Result<Vec<TextSegment>> {
        let content = match pdf_extract::extract_text_from_mem(data) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("pdf-extract failed for '{}': {}, trying fallback", filename, e);
                Self::extract_pdf_fallback(filename, data)?
            }
        };

        let content = cleanup_pdf_text(&content);
        let content = content
            .replace('\0', "")
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if content.trim().is_empty() {
            return Err(Error::corrupt_document(
                filename,
                "PDF has no extractable text (image-based or encrypted)",
            ));
        }

        // pdf-extract yields one undivided text stream; page-level
        // provenance is only attributable for single-page documents
        let page_count = lopdf::Document::load_mem(data)
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(1);

        let provenance = if page_count == 1 {
            Provenance::Page { number: 1 }
        } else {
            Provenance::Whole
        };

        Ok(vec![TextSegment { text: content, provenance }])
    }

    /// Fallback PDF extraction: walk content streams with lopdf
    fn extract_pdf_fallback(filename: &str, data: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::corrupt_document(filename, format!("failed to load PDF: {}", e)))?;

        let mut all_text = String::new();
        for (page_num, page_id) in doc.get_pages() {
            match doc.get_page_content(page_id) {
                Ok(content) => {
                    let text = extract_text_from_content_stream(&content);
                    if !text.is_empty() {
                        all_text.push_str(&text);
                        all_text.push('\n');
                    }
                }
                Err(e) => {
                    tracing::debug!("No content for page {} of '{}': {}", page_num, filename, e);
                }
            }
        }

        if all_text.trim().is_empty() {
            return Err(Error::corrupt_document(
                filename,
                "PDF has no extractable text (image-based or encrypted)",
            ));
        }

        Ok(all_text)
    }

    fn load_docx(filename: &str, data: &[u8]) -> Result<Vec<TextSegment>> {
        let doc = docx_rs::read_docx(data)
            .map_err(|e| Error::corrupt_document(filename, e.to_string()))?;

        let mut content = String::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                content.push_str(&t.text);
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }

        Ok(vec![TextSegment {
            text: content,
            provenance: Provenance::Page { number: 1 },
        }])
    }

    fn load_text(data: &[u8]) -> Vec<TextSegment> {
        let content = String::from_utf8_lossy(data).to_string();
        vec![TextSegment {
            text: content,
            provenance: Provenance::Whole,
        }]
    }

    fn load_csv(filename: &str, data: &[u8]) -> Result<Vec<TextSegment>> {
        let mut reader = csv::Reader::from_reader(data);

        let header_line = match reader.headers() {
            Ok(headers) => headers.iter().collect::<Vec<_>>().join(" | "),
            Err(e) => return Err(Error::corrupt_document(filename, e.to_string())),
        };

        let mut segments = Vec::new();
        let mut rows = Vec::new();
        // 1-indexed data rows; the header repeats in every segment so each
        // excerpt stays self-describing
        let mut window_start = 1u32;
        let mut row_number = 0u32;

        for result in reader.records() {
            let record =
                result.map_err(|e| Error::corrupt_document(filename, e.to_string()))?;
            row_number += 1;
            rows.push(record.iter().collect::<Vec<_>>().join(" | "));

            if rows.len() == CSV_ROWS_PER_SEGMENT {
                segments.push(csv_segment(&header_line, &rows, window_start, row_number));
                rows.clear();
                window_start = row_number + 1;
            }
        }

        if !rows.is_empty() {
            segments.push(csv_segment(&header_line, &rows, window_start, row_number));
        }

        if segments.is_empty() {
            // Header-only file still yields the header text
            segments.push(TextSegment {
                text: header_line,
                provenance: Provenance::Rows { start: 0, end: 0 },
            });
        }

        Ok(segments)
    }

    fn load_xlsx(filename: &str, data: &[u8]) -> Result<Vec<TextSegment>> {
        let cursor = std::io::Cursor::new(data.to_vec());
        let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
            .map_err(|e| Error::corrupt_document(filename, e.to_string()))?;

        let mut segments = Vec::new();

        for sheet_name in workbook.sheet_names().to_vec() {
            if let Ok(range) = workbook.worksheet_range(&sheet_name) {
                let mut sheet_content = String::new();

                for row in range.rows() {
                    let row_text: Vec<String> = row
                        .iter()
                        .map(|cell| match cell {
                            calamine::Data::Empty => String::new(),
                            calamine::Data::String(s) => s.clone(),
                            calamine::Data::Float(f) => f.to_string(),
                            calamine::Data::Int(i) => i.to_string(),
                            calamine::Data::Bool(b) => b.to_string(),
                            calamine::Data::DateTime(dt) => dt.to_string(),
                            _ => String::new(),
                        })
                        .collect();

                    if !row_text.iter().all(|s| s.is_empty()) {
                        sheet_content.push_str(&row_text.join(" | "));
                        sheet_content.push('\n');
                    }
                }

                if !sheet_content.trim().is_empty() {
                    segments.push(TextSegment {
                        text: sheet_content,
                        provenance: Provenance::Sheet { name: sheet_name },
                    });
                }
            }
        }

        if segments.is_empty() {
            return Err(Error::corrupt_document(filename, "workbook has no readable sheets"));
        }

        Ok(segments)
    }
}

fn csv_segment(header: &str, rows: &[String], start: u32, end: u32) -> TextSegment {
    let mut text = String::with_capacity(header.len() + rows.iter().map(|r| r.len() + 1).sum::<usize>());
    text.push_str(header);
    text.push('\n');
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    TextSegment {
        text,
        provenance: Provenance::Rows { start, end },
    }
}

/// Replace typographic glyphs pdf-extract tends to surface with ASCII
/// approximations
fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\u{2010}', "-")
        .replace('\u{2011}', "-")
        .replace('\u{2013}', "-")
        .replace('\u{2014}', "--")
        .replace('\u{2018}', "'")
        .replace('\u{2019}', "'")
        .replace('\u{201C}', "\"")
        .replace('\u{201D}', "\"")
        .replace('\u{2022}', "* ")
        .replace('\u{2026}', "...")
        .replace('\u{00A0}', " ")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
}

/// Pull text show operators out of a raw PDF content stream
fn extract_text_from_content_stream(content: &[u8]) -> String {
    let content_str = String::from_utf8_lossy(content);
    let mut text = String::new();
    let mut in_text_block = false;

    for line in content_str.lines() {
        let line = line.trim();

        if line == "BT" {
            in_text_block = true;
            continue;
        }
        if line == "ET" {
            in_text_block = false;
            continue;
        }

        if in_text_block && (line.ends_with("Tj") || line.ends_with("TJ")) {
            if let (Some(start), Some(end)) = (line.find('('), line.rfind(')')) {
                if start < end {
                    let extracted = &line[start + 1..end];
                    let decoded = extracted
                        .replace("\\n", "\n")
                        .replace("\\r", "\r")
                        .replace("\\t", "\t")
                        .replace("\\(", "(")
                        .replace("\\)", ")")
                        .replace("\\\\", "\\");
                    text.push_str(&decoded);
                    text.push(' ');
                }
            }
        }
    }

    text
}
