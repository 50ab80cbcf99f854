//! Packaging extracted snippets as retrievable documents

use crate::types::{Document, SourceUnit, UnitType};
use serde::Serialize;

/// Snippets extracted from one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedElements {
    pub identifiers: Vec<String>,
    pub functions: Vec<String>,
}

impl ExtractedElements {
    /// Tag every snippet with its unit type and source file, identifiers first
    pub fn into_units(self, file: &str) -> Vec<SourceUnit> {
        let identifiers = self.identifiers.into_iter().map(|content| SourceUnit {
            content,
            unit_type: UnitType::Identifier,
            source_file: file.to_string(),
        });
        let functions = self.functions.into_iter().map(|content| SourceUnit {
            content,
            unit_type: UnitType::Function,
            source_file: file.to_string(),
        });

        identifiers.chain(functions).collect()
    }

    pub fn len(&self) -> usize {
        self.identifiers.len() + self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One `type: identifier` document per snippet, order preserved
pub fn create_identifier_documents(file: &str, identifiers: &[String]) -> Vec<Document> {
    create_documents(file, identifiers, UnitType::Identifier)
}

/// One `type: function` document per snippet, order preserved
pub fn create_function_documents(file: &str, functions: &[String]) -> Vec<Document> {
    create_documents(file, functions, UnitType::Function)
}

fn create_documents(file: &str, snippets: &[String], unit_type: UnitType) -> Vec<Document> {
    snippets
        .iter()
        .map(|snippet| Document::new(snippet.as_str(), unit_type, file))
        .collect()
}

/// All documents for one file: identifiers, then functions
pub fn build_documents(file: &str, elements: ExtractedElements) -> Vec<Document> {
    elements
        .into_units(file)
        .into_iter()
        .map(Document::from)
        .collect()
}
