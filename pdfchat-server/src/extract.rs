//! PDF text extraction.
//!
//! Wraps `lopdf`: pages are read in ascending page order and their text is
//! concatenated as-is. Any page that fails to decode fails the whole document.

use axum::body::Bytes;
use lopdf::{Document, ObjectId};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PDF processing failed: could not open document: {0}")]
    Load(#[source] lopdf::Error),

    #[error("PDF processing failed: page {page} could not be decoded: {source}")]
    Page {
        page: u32,
        #[source]
        source: lopdf::Error,
    },

    #[error("PDF processing failed: extraction worker stopped: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Extracts the plain text of every page, in page order, with no separator between pages.
pub fn extract_text(pdf_bytes: &[u8]) -> Result<String, ExtractionError> {
    let document = Document::load_mem(pdf_bytes).map_err(ExtractionError::Load)?;
    let pages = document.get_pages();
    debug!(page_count = pages.len(), "PDF document opened");

    let mut text = String::new();
    for (page, page_id) in pages {
        check_page_content(&document, page_id)
            .map_err(|source| ExtractionError::Page { page, source })?;
        let page_text = document
            .extract_text(&[page])
            .map_err(|source| ExtractionError::Page { page, source })?;
        text.push_str(&page_text);
    }
    Ok(text)
}

/// `extract_text` in lopdf skips content streams it cannot resolve or inflate,
/// so every stream of the page is resolved and decoded up front.
fn check_page_content(document: &Document, page_id: ObjectId) -> Result<(), lopdf::Error> {
    for content_id in document.get_page_contents(page_id) {
        let stream = document.get_object(content_id)?.as_stream()?;
        if stream.dict.has(b"Filter") {
            stream.decompressed_content()?;
        }
    }
    Ok(())
}

/// Runs [`extract_text`] on the blocking pool.
pub async fn extract_text_blocking(pdf_bytes: Bytes) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || extract_text(&pdf_bytes)).await?
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Builds an in-memory PDF with one page per entry in `pages`.
    pub(crate) fn build_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn pages_are_concatenated_in_order_without_separator() {
        let bytes = build_pdf(&["Hello", "World"]);
        let text = extract_text(&bytes).unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let first = doc.extract_text(&[1]).unwrap();
        let second = doc.extract_text(&[2]).unwrap();
        assert_eq!(text, format!("{first}{second}"));

        let hello = text.find("Hello").unwrap();
        let world = text.find("World").unwrap();
        assert!(hello < world);
        assert_eq!(text.replace('\n', ""), "HelloWorld");
    }

    #[test]
    fn zero_page_document_yields_empty_text() {
        let bytes = build_pdf(&[]);
        assert_eq!(extract_text(&bytes).unwrap(), "");
    }

    #[test]
    fn non_pdf_bytes_fail_to_load() {
        let err = extract_text(b"this is not a pdf").unwrap_err();
        assert!(matches!(err, ExtractionError::Load(_)));
        assert!(err.to_string().starts_with("PDF processing failed"));
    }

    /// Rebuilds `bytes` after letting `edit` change the second page.
    fn break_second_page(bytes: &[u8], edit: impl FnOnce(&mut Document, ObjectId)) -> Vec<u8> {
        let mut doc = Document::load_mem(bytes).unwrap();
        let page_id = doc.get_pages()[&2];
        edit(&mut doc, page_id);
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn dangling_content_reference_fails_the_whole_document() {
        let bytes = break_second_page(&build_pdf(&["Hello", "World"]), |doc, page_id| {
            doc.get_object_mut(page_id)
                .unwrap()
                .as_dict_mut()
                .unwrap()
                .set("Contents", Object::Reference((9999, 0)));
        });

        let err = extract_text(&bytes).unwrap_err();
        assert!(matches!(err, ExtractionError::Page { page: 2, .. }), "{err:?}");
    }

    #[test]
    fn corrupt_compressed_page_fails_the_whole_document() {
        let bytes = break_second_page(&build_pdf(&["Hello", "World"]), |doc, page_id| {
            let content_id = doc.get_page_contents(page_id)[0];
            doc.objects.insert(
                content_id,
                Object::Stream(Stream::new(
                    dictionary! { "Filter" => "FlateDecode" },
                    b"garbage-not-zlib".to_vec(),
                )),
            );
        });

        let err = extract_text(&bytes).unwrap_err();
        assert!(matches!(err, ExtractionError::Page { page: 2, .. }), "{err:?}");
        assert!(err.to_string().starts_with("PDF processing failed: page 2"));
    }

    #[tokio::test]
    async fn blocking_variant_matches_direct_call() {
        let bytes = build_pdf(&["one", "two", "three"]);
        let direct = extract_text(&bytes).unwrap();
        let pooled = extract_text_blocking(Bytes::from(bytes)).await.unwrap();
        assert_eq!(direct, pooled);
    }
}
