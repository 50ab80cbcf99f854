use crate::error::ChunkingError;
use anyhow::Result;
use std::collections::VecDeque;
use tree_sitter::{Language, Node, Parser};

/// Extensions parsed with the Python grammar
pub const PYTHON_EXTENSIONS: &[&str] = &["py", "pyi", "pyw"];

/// Node kind tree-sitter-python uses for `def` and `async def`
const FUNCTION_KIND: &str = "function_definition";

const COMMENT_KIND: &str = "comment";

/// Python 2 statements the grammar still accepts but Python 3 rejects
const PYTHON2_STATEMENTS: &[&str] = &["print_statement", "exec_statement"];

/// Whether files with this extension can be parsed
pub fn is_supported_extension(extension: &str) -> bool {
    let extension = extension.to_lowercase();
    PYTHON_EXTENSIONS.contains(&extension.as_str())
}

/// AST node information for a function definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNode {
    pub kind: String,
    pub start_byte: usize,
    pub end_byte: usize,
    /// 1-indexed line of the `def` keyword
    pub start_line: usize,
    /// 1-indexed line of the last statement in the body
    pub end_line: usize,
}

/// AST parser for extracting function definitions
pub struct AstParser {
    parser: Parser,
    language_name: String,
}

impl AstParser {
    /// Create a new AST parser for the given file extension
    pub fn new(extension: &str) -> Result<Self> {
        if !is_supported_extension(extension) {
            return Err(ChunkingError::UnsupportedLanguage(extension.to_string()).into());
        }
        Self::python()
    }

    /// Create a parser for Python source
    pub fn python() -> Result<Self> {
        let language: Language = tree_sitter_python::LANGUAGE.into();

        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| ChunkingError::ParserSetupFailed(e.to_string()))?;

        Ok(Self {
            parser,
            language_name: "Python".to_string(),
        })
    }

    /// Parse source code and locate every plain `def`, outer before nested.
    ///
    /// `async def` is skipped, though definitions nested inside one are not.
    /// Returns `None` when the source does not parse cleanly.
    pub fn parse(&mut self, source_code: &str) -> Option<Vec<AstNode>> {
        let tree = self.parser.parse(source_code, None)?;
        let root_node = tree.root_node();

        // tree-sitter recovers from errors; a clean parse has no ERROR/MISSING nodes
        if root_node.has_error() {
            return None;
        }

        let mut nodes = Vec::new();
        let mut queue = VecDeque::from([root_node]);

        while let Some(node) = queue.pop_front() {
            if PYTHON2_STATEMENTS.contains(&node.kind()) {
                return None;
            }

            if node.kind() == FUNCTION_KIND && !Self::is_async(node) {
                nodes.push(Self::to_ast_node(node));
            }

            let mut cursor = node.walk();
            queue.extend(node.children(&mut cursor));
        }

        Some(nodes)
    }

    /// Extract the source text of every function definition.
    ///
    /// A file with syntax errors yields no functions; the failure is logged and
    /// never propagated.
    pub fn extract_functions(&mut self, source_code: &str) -> Vec<String> {
        let Some(nodes) = self.parse(source_code) else {
            tracing::warn!("Syntax error in code, no functions extracted");
            return Vec::new();
        };

        let lines: Vec<&str> = source_code.split('\n').collect();

        nodes
            .iter()
            .map(|node| lines[node.start_line - 1..node.end_line].join("\n"))
            .collect()
    }

    fn is_async(node: Node) -> bool {
        node.child(0).is_some_and(|first| first.kind() == "async")
    }

    /// Deepest last token under `node`, skipping comments at every level
    fn last_code_token(node: Node) -> Node {
        let mut current = node;
        loop {
            let mut cursor = current.walk();
            let last = current
                .children(&mut cursor)
                .filter(|child| child.kind() != COMMENT_KIND)
                .last();
            match last {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    fn to_ast_node(node: Node) -> AstNode {
        // Comments after the last statement belong to the node span but not to the function
        let end = node
            .child_by_field_name("body")
            .map(Self::last_code_token)
            .unwrap_or(node);

        AstNode {
            kind: node.kind().to_string(),
            start_byte: node.start_byte(),
            end_byte: end.end_byte(),
            start_line: node.start_position().row + 1, // Tree-sitter uses 0-indexed rows
            end_line: end.end_position().row + 1,
        }
    }

    /// Get the language name
    pub fn language_name(&self) -> &str {
        &self.language_name
    }
}
