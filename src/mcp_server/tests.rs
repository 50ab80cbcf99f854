use super::*;
use crate::embedding::EmbeddingProvider;
use crate::indexer::ChunkTokenizer;
use tempfile::TempDir;

struct LengthEmbedder;

impl EmbeddingProvider for LengthEmbedder {
    fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| vec![t.len() as f32, t.lines().count() as f32, 1.0])
            .collect())
    }

    fn dimension(&self) -> usize {
        3
    }

    fn model_name(&self) -> &str {
        "length"
    }
}

struct CharTokenizer;

impl ChunkTokenizer for CharTokenizer {
    fn token_offsets(&self, text: &str) -> Result<Vec<(usize, usize)>> {
        Ok(text
            .char_indices()
            .map(|(i, c)| (i, i + c.len_utf8()))
            .collect())
    }
}

fn server_for(root: &Path, config: Config) -> CodeRagMcpServer {
    let client = RagClient::with_components(
        config,
        Arc::new(LengthEmbedder),
        Arc::new(CharTokenizer),
    )
    .unwrap();
    CodeRagMcpServer::with_client(Arc::new(client), root).unwrap()
}

fn project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("a.py"),
        "X = \"hello\"\ndef f():\n    return 1\n",
    )
    .unwrap();
    temp_dir
}

#[test]
fn test_get_info() {
    let temp_dir = project();
    let server = server_for(temp_dir.path(), Config::default());

    let info = server.get_info();

    assert_eq!(info.server_info.name, "code-rag");
    assert!(info.server_info.title.is_some());
    assert!(info.instructions.is_some());
    assert!(info.capabilities.tools.is_some());
}

#[test]
fn test_tools_registered() {
    let temp_dir = project();
    let server = server_for(temp_dir.path(), Config::default());

    let tools = server.tool_router.list_all();
    let mut names: Vec<String> = tools.iter().map(|t| t.name.to_string()).collect();
    names.sort();
    assert_eq!(
        names,
        vec!["python_interpretor", "retrieve_code_data", "search"]
    );

    let retrieve = tools
        .iter()
        .find(|t| t.name == "retrieve_code_data")
        .unwrap();
    assert_eq!(
        retrieve.description.as_deref(),
        Some(RetrieverTool::DESCRIPTION)
    );

    let search = tools.iter().find(|t| t.name == "search").unwrap();
    assert_eq!(search.description.as_deref(), Some(WebSearchTool::DESCRIPTION));

    let sandbox = tools
        .iter()
        .find(|t| t.name == "python_interpretor")
        .unwrap();
    assert_eq!(
        sandbox.description.as_deref(),
        Some(CodeSandboxTool::DESCRIPTION)
    );
}

#[tokio::test]
async fn test_retriever_built_lazily() {
    let temp_dir = project();
    let server = server_for(temp_dir.path(), Config::default());
    assert!(server.indexed_tools.get().is_none());

    let output = server
        .retrieve_code_data(Parameters(RetrieveRequest {
            query: "function returning one".to_string(),
        }))
        .await
        .unwrap();
    assert!(server.indexed_tools.get().is_some());

    let documents: Vec<Document> = serde_json::from_str(&output).unwrap();
    assert_eq!(documents.len(), 2);
    assert!(documents.iter().all(|d| d.metadata.file == "a.py"));

    // The second call reuses the index
    let clone = server.clone();
    clone
        .retrieve_code_data(Parameters(RetrieveRequest {
            query: "hello".to_string(),
        }))
        .await
        .unwrap();
    assert!(Arc::ptr_eq(&server.indexed_tools, &clone.indexed_tools));
    assert_eq!(
        server.indexed_tools.get().unwrap().names(),
        vec!["search", "python_interpretor", "retrieve_code_data"]
    );
}

#[tokio::test]
async fn test_retrieve_accepts_blank_query() {
    let temp_dir = project();
    let server = server_for(temp_dir.path(), Config::default());

    let output = server
        .retrieve_code_data(Parameters(RetrieveRequest {
            query: "  ".to_string(),
        }))
        .await
        .unwrap();

    let documents: Vec<Document> = serde_json::from_str(&output).unwrap();
    assert_eq!(documents.len(), 2);
}

#[tokio::test]
async fn test_remote_tools_do_not_build_index() {
    let temp_dir = project();
    let server = server_for(temp_dir.path(), Config::default());

    let _ = server
        .search(Parameters(WebSearchRequest {
            query: "rust".to_string(),
            max_results: None,
        }))
        .await;
    assert!(server.indexed_tools.get().is_none());
    assert_eq!(
        server.remote_tools.names(),
        vec!["search", "python_interpretor"]
    );
}

#[tokio::test]
async fn test_retrieve_reports_index_failure() {
    let temp_dir = TempDir::new().unwrap();
    let server = server_for(&temp_dir.path().join("missing"), Config::default());

    let err = server
        .retrieve_code_data(Parameters(RetrieveRequest {
            query: "anything".to_string(),
        }))
        .await
        .unwrap_err();
    assert!(err.contains("Failed to build code index"));
    assert!(server.indexed_tools.get().is_none());
}

#[tokio::test]
async fn test_search_without_credentials() {
    let temp_dir = project();
    let server = server_for(temp_dir.path(), Config::default());

    let err = server
        .search(Parameters(WebSearchRequest {
            query: "rust".to_string(),
            max_results: None,
        }))
        .await
        .unwrap_err();
    assert!(err.contains("TAVILY_API_KEY"));
}

#[tokio::test]
async fn test_python_interpretor_without_credentials() {
    let temp_dir = project();
    let server = server_for(temp_dir.path(), Config::default());

    let err = server
        .python_interpretor(Parameters(ExecuteCodeRequest {
            code: "print(1)".to_string(),
        }))
        .await
        .unwrap_err();
    assert!(err.contains("E2B_API_KEY"));
}

#[tokio::test]
async fn test_search_validates_max_results() {
    let temp_dir = project();
    let server = server_for(temp_dir.path(), Config::default());

    let result = server
        .search(Parameters(WebSearchRequest {
            query: "rust".to_string(),
            max_results: Some(0),
        }))
        .await;
    assert!(result.is_err());
}
