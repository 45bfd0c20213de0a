//! Multi-format document loader
//!
//! Turns a file on disk into text units. The format is chosen by extension only;
//! unknown extensions are read as text with encoding detection.

use scraper::{Html, Selector};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{file_type_of, keys, DocumentFormat, Metadata, TextUnit};

/// Text extracted by a format handler, before the common metadata is applied
struct Extracted {
    content: String,
    metadata: Metadata,
}

impl Extracted {
    fn plain(content: String) -> Self {
        Self {
            content,
            metadata: Metadata::new(),
        }
    }
}

/// Loads files into provenance-tagged text units
pub struct DocumentLoader;

impl DocumentLoader {
    /// Load a file. Blocking; see [`DocumentLoader::load_blocking`] for async callers.
    ///
    /// Metadata precedence, lowest first: `metadata`, then loader fields such as
    /// `page` or `row`, then `filename`, `file_type`, `chunk_id` and `source`.
    /// `source` is the caller's `original_filename` when given, else the base name.
    pub fn load(path: &Path, metadata: Option<&Metadata>) -> Result<Vec<TextUnit>> {
        let path_label = path.display().to_string();
        let data = std::fs::read(path).map_err(|e| Error::file_parse(&path_label, e.to_string()))?;

        let format = DocumentFormat::from_path(path);
        tracing::debug!("Loading {} as {}", path_label, format.display_name());

        let extracted = match format {
            DocumentFormat::Pdf => extract_pdf(&path_label, &data)?,
            DocumentFormat::Word => extract_docx(&path_label, &data)?,
            DocumentFormat::Markdown => vec![Extracted::plain(markdown_to_text(&decode_text(&data)))],
            DocumentFormat::Html => vec![Extracted::plain(html_to_text(&path_label, &decode_text(&data))?)],
            DocumentFormat::Csv => extract_csv(&path_label, &data)?,
            DocumentFormat::PlainText => vec![Extracted::plain(decode_text(&data))],
        };

        let base_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_type = file_type_of(path);
        let source = metadata
            .and_then(|m| m.get_str(keys::ORIGINAL_FILENAME))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| base_name.clone());

        let units = extracted
            .into_iter()
            .enumerate()
            .map(|(i, unit)| {
                let mut merged = metadata.cloned().unwrap_or_default();
                merged.merge(&unit.metadata);
                merged.insert(keys::FILENAME, base_name.as_str());
                merged.insert(keys::FILE_TYPE, file_type.as_str());
                merged.insert(keys::CHUNK_ID, i);
                merged.insert(keys::SOURCE, source.as_str());
                TextUnit::new(unit.content, merged)
            })
            .collect::<Vec<_>>();

        tracing::debug!("Loaded {} unit(s) from {}", units.len(), path_label);
        Ok(units)
    }

    /// Load on the blocking pool so parsing never stalls the async runtime
    pub async fn load_blocking(path: PathBuf, metadata: Option<Metadata>) -> Result<Vec<TextUnit>> {
        tokio::task::spawn_blocking(move || Self::load(&path, metadata.as_ref())).await?
    }
}

/// One unit per page, numbered from 0.
///
/// A PDF that opens but yields no text anywhere (a scan, say) keeps its empty
/// page units, which the chunker then skips.
fn extract_pdf(path_label: &str, data: &[u8]) -> Result<Vec<Extracted>> {
    let doc = match lopdf::Document::load_mem(data) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!("lopdf could not open {}: {}, trying pdf-extract", path_label, e);
            return extract_pdf_whole(path_label, data);
        }
    };

    let pages = doc.get_pages();
    let total_pages = pages.len();
    let mut units = Vec::with_capacity(total_pages);

    for (page_index, page_number) in pages.keys().enumerate() {
        let text = match doc.extract_text(&[*page_number]) {
            Ok(text) => clean_pdf_text(&text),
            Err(e) => {
                tracing::debug!("No text on page {} of {}: {}", page_number, path_label, e);
                String::new()
            }
        };
        units.push(Extracted {
            content: text,
            metadata: Metadata::new()
                .with(keys::PAGE, page_index)
                .with("total_pages", total_pages),
        });
    }

    if units.iter().all(|u| u.content.trim().is_empty()) {
        // Fonts lopdf cannot decode; pdf-extract handles more encodings
        return match extract_pdf_whole(path_label, data) {
            Ok(whole) => Ok(whole),
            Err(e) => {
                tracing::warn!("No extractable text in {}: {}", path_label, e);
                Ok(units)
            }
        };
    }

    Ok(units)
}

/// Whole-document fallback, reported as page 0
fn extract_pdf_whole(path_label: &str, data: &[u8]) -> Result<Vec<Extracted>> {
    let text = pdf_extract::extract_text_from_mem(data)
        .map_err(|e| Error::file_parse(path_label, e.to_string()))?;
    let text = clean_pdf_text(&text);

    if text.trim().is_empty() {
        return Err(Error::file_parse(
            path_label,
            "No text content could be extracted from PDF",
        ));
    }

    Ok(vec![Extracted {
        content: text,
        metadata: Metadata::new().with(keys::PAGE, 0u32),
    }])
}

fn clean_pdf_text(text: &str) -> String {
    text.replace('\0', "")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Whole document, one line per paragraph
fn extract_docx(path_label: &str, data: &[u8]) -> Result<Vec<Extracted>> {
    let doc = docx_rs::read_docx(data).map_err(|e| Error::file_parse(path_label, e.to_string()))?;

    let mut content = String::new();
    for child in doc.document.children {
        match child {
            docx_rs::DocumentChild::Paragraph(p) => {
                push_paragraph(&mut content, &p);
            }
            docx_rs::DocumentChild::Table(table) => {
                for docx_rs::TableChild::TableRow(row) in table.rows {
                    let mut cells = Vec::new();
                    for docx_rs::TableRowChild::TableCell(cell) in row.cells {
                        let mut text = String::new();
                        for c in cell.children {
                            if let docx_rs::TableCellContent::Paragraph(p) = c {
                                push_paragraph(&mut text, &p);
                            }
                        }
                        cells.push(text.trim().to_string());
                    }
                    content.push_str(&cells.join(" | "));
                    content.push('\n');
                }
            }
            _ => {}
        }
    }

    Ok(vec![Extracted::plain(content.trim_end().to_string())])
}

fn push_paragraph(out: &mut String, p: &docx_rs::Paragraph) {
    for child in &p.children {
        if let docx_rs::ParagraphChild::Run(run) = child {
            for child in &run.children {
                match child {
                    docx_rs::RunChild::Text(t) => out.push_str(&t.text),
                    docx_rs::RunChild::Tab(_) => out.push('\t'),
                    docx_rs::RunChild::Break(_) => out.push('\n'),
                    _ => {}
                }
            }
        }
    }
    out.push('\n');
}

/// Render markdown to plain text, keeping block boundaries as blank lines
fn markdown_to_text(markdown: &str) -> String {
    use pulldown_cmark::{Event, Parser, TagEnd};

    let mut out = String::new();
    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => out.push_str(&t),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::CodeBlock) => {
                out.push_str("\n\n")
            }
            Event::End(TagEnd::Item | TagEnd::TableRow | TagEnd::TableHead) => out.push('\n'),
            Event::End(TagEnd::TableCell) => out.push(' '),
            _ => {}
        }
    }
    out.trim().to_string()
}

/// Visible body text, one text node per line
fn html_to_text(path_label: &str, html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let body = Selector::parse("body").map_err(|e| Error::file_parse(path_label, e.to_string()))?;
    let skip = Selector::parse("script, style, noscript")
        .map_err(|e| Error::file_parse(path_label, e.to_string()))?;

    let hidden: Vec<_> = document.select(&skip).map(|el| el.id()).collect();

    let mut lines = Vec::new();
    if let Some(body) = document.select(&body).next() {
        for node in body.descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            if node.ancestors().any(|a| hidden.contains(&a.id())) {
                continue;
            }
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }
    }

    Ok(lines.join("\n"))
}

/// One unit per data row, rendered as `header: value` lines
fn extract_csv(path_label: &str, data: &[u8]) -> Result<Vec<Extracted>> {
    let text = decode_text(data);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| Error::file_parse(path_label, e.to_string()))?
        .clone();

    let mut units = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| Error::file_parse(path_label, e.to_string()))?;
        let content = record
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let header = headers.get(i).unwrap_or("");
                format!("{}: {}", header.trim(), value.trim())
            })
            .collect::<Vec<_>>()
            .join("\n");

        units.push(Extracted {
            content,
            metadata: Metadata::new().with(keys::ROW, row),
        });
    }

    Ok(units)
}

/// Decode bytes to text: BOM first, then UTF-8, then a statistical guess
pub(crate) fn decode_text(data: &[u8]) -> String {
    if let Some((encoding, bom_len)) = encoding_rs::Encoding::for_bom(data) {
        let (text, _) = encoding.decode_without_bom_handling(&data[bom_len..]);
        return text.into_owned();
    }

    if let Ok(text) = std::str::from_utf8(data) {
        return text.to_string();
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(data, true);
    let encoding = detector.guess(None, true);
    tracing::debug!("Detected text encoding {}", encoding.name());

    let (text, _, had_errors) = encoding.decode(data);
    if had_errors {
        tracing::warn!("Replaced undecodable bytes while reading as {}", encoding.name());
    }
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, data: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(data).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_plain_text_metadata() {
        let file = write_temp(".txt", b"hello world");
        let units = DocumentLoader::load(file.path(), None).unwrap();

        assert_eq!(units.len(), 1);
        let unit = &units[0];
        let base = file.path().file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(unit.content, "hello world");
        assert_eq!(unit.metadata.get_str(keys::SOURCE), Some(base.as_str()));
        assert_eq!(unit.metadata.get_str(keys::FILENAME), Some(base.as_str()));
        assert_eq!(unit.metadata.get_str(keys::FILE_TYPE), Some(".txt"));
        assert_eq!(unit.metadata.get_i64(keys::CHUNK_ID), Some(0));
        assert!(unit.metadata.page().is_none());
    }

    #[test]
    fn test_original_filename_becomes_source() {
        let file = write_temp(".txt", b"body");
        let meta = Metadata::new()
            .with(keys::ORIGINAL_FILENAME, "notes.txt")
            .with(keys::SOURCE, "caller-value")
            .with(keys::UPLOAD_ID, "123_abcdef01");

        let units = DocumentLoader::load(file.path(), Some(&meta)).unwrap();
        assert_eq!(units[0].metadata.source(), Some("notes.txt"));
        assert_eq!(units[0].metadata.get_str(keys::UPLOAD_ID), Some("123_abcdef01"));
    }

    #[test]
    fn test_computed_fields_override_caller() {
        let file = write_temp(".md", b"# Title\n\nBody text");
        let meta = Metadata::new()
            .with(keys::FILE_TYPE, ".bogus")
            .with(keys::CHUNK_ID, 99i64);

        let units = DocumentLoader::load(file.path(), Some(&meta)).unwrap();
        assert_eq!(units[0].metadata.get_str(keys::FILE_TYPE), Some(".md"));
        assert_eq!(units[0].metadata.chunk_id(), Some(0));
    }

    #[test]
    fn test_markdown_rendered() {
        let text = markdown_to_text("# Heading\n\nSome *emphasis* and `code`.\n\n- one\n- two\n");
        assert!(text.starts_with("Heading\n\nSome emphasis and code."));
        assert!(text.contains("one\n"));
        assert!(!text.contains('#'));
        assert!(!text.contains('*'));
    }

    #[test]
    fn test_html_skips_scripts() {
        let text = html_to_text(
            "page.html",
            "<html><head><title>T</title></head><body><h1>Hello</h1>\
             <script>var x = 1;</script><p>World</p></body></html>",
        )
        .unwrap();
        assert_eq!(text, "Hello\nWorld");
    }

    #[test]
    fn test_csv_one_unit_per_row() {
        let file = write_temp(".csv", b"name,age\nalice,30\nbob,41\n");
        let units = DocumentLoader::load(file.path(), None).unwrap();

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].content, "name: alice\nage: 30");
        assert_eq!(units[1].metadata.get_i64(keys::ROW), Some(1));
        assert_eq!(units[1].metadata.chunk_id(), Some(1));
    }

    #[test]
    fn test_decode_latin1_and_bom() {
        // "café" in windows-1252
        let text = decode_text(b"caf\xe9 au lait, tr\xe8s bien, d\xe9j\xe0 vu");
        assert!(text.starts_with("café"));

        let text = decode_text(b"\xef\xbb\xbfwith bom");
        assert_eq!(text, "with bom");
    }

    #[test]
    fn test_bad_pdf_is_tagged_with_path() {
        let file = write_temp(".pdf", b"not a valid pdf");
        let err = DocumentLoader::load(file.path(), None).unwrap_err();
        match err {
            Error::FileParse { filename, .. } => {
                assert_eq!(filename, file.path().display().to_string())
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// A PDF with one page per entry; an empty entry draws no text
    fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Object, Stream};

        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let operations = if text.is_empty() {
                Vec::new()
            } else {
                vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ]
            };
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_pdf_pages_numbered_from_zero() {
        let file = write_temp(".pdf", &pdf_with_pages(&["First page", "Second page"]));
        let units = DocumentLoader::load(file.path(), None).unwrap();

        assert_eq!(units.len(), 2);
        assert!(units[0].content.contains("First page"));
        assert_eq!(units[0].metadata.page(), Some(0));
        assert!(units[1].content.contains("Second page"));
        assert_eq!(units[1].metadata.page(), Some(1));
        assert_eq!(units[1].metadata.get_i64("total_pages"), Some(2));
    }

    #[test]
    fn test_pdf_without_text_loads_empty_pages() {
        let file = write_temp(".pdf", &pdf_with_pages(&["", ""]));
        let units = DocumentLoader::load(file.path(), None).unwrap();

        assert_eq!(units.len(), 2);
        assert!(units.iter().all(|u| u.content.trim().is_empty()));
        assert_eq!(units[1].metadata.page(), Some(1));
    }

    #[test]
    fn test_missing_file() {
        let err = DocumentLoader::load(Path::new("/nonexistent/file.txt"), None).unwrap_err();
        assert!(matches!(err, Error::FileParse { .. }));
    }

    #[tokio::test]
    async fn test_load_blocking() {
        let file = write_temp(".log", b"line one\nline two");
        let units = DocumentLoader::load_blocking(file.path().to_path_buf(), None)
            .await
            .unwrap();
        assert_eq!(units[0].metadata.get_str(keys::FILE_TYPE), Some(".log"));
    }
}
