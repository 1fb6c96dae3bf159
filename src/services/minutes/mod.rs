//! Meeting Minutes
//!
//! Turns a minutes document into a pending-approval record of extracted
//! issues and TODOs. `.docx` minutes are converted to Markdown first.
//!
//! - `docx` - reads the paragraphs and tables of a `.docx` body
//! - `markdown` - converts the minutes template to Markdown
//! - `prompt` - the extraction prompt
//! - `analyzer` - runs the extraction and stores the record

pub mod analyzer;
pub mod docx;
pub mod markdown;
pub mod prompt;

pub use analyzer::{
    MinutesAnalyzer, MinutesOutcome, MinutesRequest, MinutesSource, SourceFormat,
    MAX_MINUTES_BYTES,
};
pub use docx::DocxDocument;
pub use markdown::convert as docx_to_markdown;
