//! Manual ingestion: PDF parsing, chunking, embedding, and vector upsert

mod chunker;
mod parser;
mod pipeline;

pub use chunker::TextChunker;
pub use parser::{PageText, ParsedPdf, PdfInfo, PdfParser};
pub use pipeline::{validate_upload, IngestOutcome, IngestPipeline, PreparedManual};
