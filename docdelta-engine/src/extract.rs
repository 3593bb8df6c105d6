use docdelta::{ExtractedText, Side};

use crate::document::{DocumentUpload, MimeType};
use crate::EngineError;

/// Capability turning document bytes into plain text plus layout hints.
///
/// Called from a blocking thread; implementations may do CPU-heavy parsing.
pub trait TextExtractor: Send + Sync {
    fn extract(
        &self,
        side: Side,
        mime: MimeType,
        document: &DocumentUpload,
    ) -> Result<ExtractedText, EngineError>;
}

/// Built-in extractor for `text/plain` documents.
///
/// Decodes UTF-8 (a leading BOM is dropped) and reports form feeds as page breaks through
/// the normalizer. PDF and DOCX need an external extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(
        &self,
        side: Side,
        mime: MimeType,
        document: &DocumentUpload,
    ) -> Result<ExtractedText, EngineError> {
        if mime != MimeType::Text {
            return Err(EngineError::UnsupportedFormat {
                side,
                mime: mime.as_str().to_string(),
            });
        }
        let text = std::str::from_utf8(&document.bytes).map_err(|e| EngineError::ExtractionFailed {
            side,
            message: format!("{} is not valid UTF-8: {}", document.name, e),
        })?;
        Ok(ExtractedText::plain(text.trim_start_matches('\u{FEFF}')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_only() {
        let extractor = PlainTextExtractor;
        let doc = DocumentUpload::text("a.txt", "\u{FEFF}Clause one.");
        let text = extractor.extract(Side::Reference, MimeType::Text, &doc).unwrap();
        assert_eq!(text.text, "Clause one.");

        let pdf = DocumentUpload::new("a.pdf", MimeType::Pdf.as_str(), b"%PDF-1.7".to_vec());
        assert!(matches!(
            extractor.extract(Side::Client, MimeType::Pdf, &pdf),
            Err(EngineError::UnsupportedFormat { .. })
        ));

        let garbage = DocumentUpload::new("b.txt", "text/plain", vec![0xff, 0xfe, 0x00]);
        assert!(matches!(
            extractor.extract(Side::Client, MimeType::Text, &garbage),
            Err(EngineError::ExtractionFailed { side: Side::Client, .. })
        ));
    }
}
