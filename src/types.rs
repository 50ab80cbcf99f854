use crate::error::ValidationError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of structural unit a document was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    /// A top-of-line assignment such as `X = "hello"`
    Identifier,
    /// A function definition, header through last body line
    Function,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Identifier => "identifier",
            UnitType::Function => "function",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UnitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "identifier" => Ok(UnitType::Identifier),
            "function" => Ok(UnitType::Function),
            other => Err(format!("unknown unit type: {}", other)),
        }
    }
}

/// One identifier assignment or function definition extracted from a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Literal source text of the unit
    pub content: String,
    pub unit_type: UnitType,
    /// Path of the file the unit came from
    pub source_file: String,
}

/// Metadata carried by every document and chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DocumentMetadata {
    /// "identifier" or "function"
    #[serde(rename = "type")]
    pub unit_type: UnitType,
    /// Source file the content was extracted from
    pub file: String,
}

/// A retrievable record: text plus metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Document {
    /// The code text
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(content: impl Into<String>, unit_type: UnitType, file: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: DocumentMetadata {
                unit_type,
                file: file.into(),
            },
        }
    }
}

impl From<SourceUnit> for Document {
    fn from(unit: SourceUnit) -> Self {
        Document::new(unit.content, unit.unit_type, unit.source_file)
    }
}

/// Byte range of one chunk inside its parent document's content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Summary of one indexing run
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct IndexStats {
    /// Number of source files read
    pub files_read: usize,
    /// Documents extracted before chunking
    pub documents: usize,
    /// Chunks produced by the chunker
    pub chunks: usize,
    /// Embeddings stored in the vector index
    pub embeddings: usize,
    /// Time taken in milliseconds
    pub duration_ms: u64,
}

/// Request for the `retrieve_code_data` tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RetrieveRequest {
    /// Natural-language description of the code to look up
    pub query: String,
}

/// Request for the `search` web search tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WebSearchRequest {
    /// Web search query
    pub query: String,
    /// Optional override of the configured number of results
    #[serde(default)]
    pub max_results: Option<usize>,
}

/// Request for the `python_interpretor` sandbox tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteCodeRequest {
    /// Python source to run in a fresh sandbox
    pub code: String,
}

impl WebSearchRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.query.trim().is_empty() {
            return Err(ValidationError::Empty("query".to_string()));
        }
        if self.max_results == Some(0) {
            return Err(ValidationError::ConstraintViolation {
                field: "max_results".to_string(),
                constraint: "greater than 0".to_string(),
                actual: "0".to_string(),
            });
        }
        Ok(())
    }
}

impl ExecuteCodeRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.code.trim().is_empty() {
            return Err(ValidationError::Empty("code".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
