mod pdf_extractor;
mod text_sanitizer;

pub use pdf_extractor::PdfTextExtractor;
pub use text_sanitizer::{join_pages, sanitize_page_text};
