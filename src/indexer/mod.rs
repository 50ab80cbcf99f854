//! Source extraction, tree walking, and chunking
//!
//! Turns a Python source tree into documents: top-of-line assignments and
//! function definitions are extracted per file, tagged with their unit type and
//! source file, then split into token windows sized for the embedding model.

mod ast_parser;
mod chunker;
mod documents;
mod file_walker;
mod identifiers;
mod tokenizer;

pub use ast_parser::{AstNode, AstParser, PYTHON_EXTENSIONS, is_supported_extension};
pub use chunker::CodeChunker;
pub use documents::{
    ExtractedElements, build_documents, create_function_documents, create_identifier_documents,
};
pub use file_walker::{FileWalker, WalkOutput};
pub use identifiers::extract_identifiers;
pub use tokenizer::{ChunkTokenizer, load_tokenizer};

/// Run both extractors over one file's text.
///
/// Identifier extraction does not depend on the parse, so a file with syntax
/// errors still yields its identifiers.
pub fn extract_elements(parser: &mut AstParser, code: &str) -> ExtractedElements {
    ExtractedElements {
        identifiers: extract_identifiers(code),
        functions: parser.extract_functions(code),
    }
}
