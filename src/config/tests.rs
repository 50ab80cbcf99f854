use super::*;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.embedding.model_name, "all-MiniLM-L6-v2");
    assert_eq!(config.embedding.batch_size, 32);
    assert!(config.embedding.tokenizer_path.is_none());
    assert_eq!(config.indexing.extensions, vec!["py"]);
    assert_eq!(config.indexing.private_prefix, "__");
    assert_eq!(config.indexing.chunk_size, 100);
    assert_eq!(config.indexing.chunk_overlap, 50);
    assert!(!config.indexing.skip_unreadable);
    assert_eq!(config.vector_db.collection_name, "code-rag-chroma");
    assert!(config.vector_db.lancedb_path.is_none());
    assert_eq!(config.search.top_k, 4);
    assert_eq!(config.tools.max_search_results, 10);
}

#[test]
fn test_validate_valid_config() {
    let config = Config::default();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_invalid_batch_size() {
    let mut config = Config::default();
    config.embedding.batch_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_overlap_must_be_smaller_than_chunk() {
    let mut config = Config::default();
    config.indexing.chunk_overlap = config.indexing.chunk_size;
    let err = config.validate().unwrap_err();
    assert!(matches!(
        err,
        RagError::Config(ConfigError::InvalidValue { ref key, .. }) if key == "indexing.chunk_overlap"
    ));
}

#[test]
fn test_validate_unsupported_extension() {
    let mut config = Config::default();
    config.indexing.extensions = vec!["py".to_string(), "rs".to_string()];
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("'rs'"));
}

#[test]
fn test_validate_python_variants_accepted() {
    let mut config = Config::default();
    config.indexing.extensions = vec!["py".to_string(), "pyi".to_string(), "PYW".to_string()];
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_empty_extensions() {
    let mut config = Config::default();
    config.indexing.extensions.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_zero_top_k() {
    let mut config = Config::default();
    config.search.top_k = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_save_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.embedding.batch_size = 64;
    config.indexing.chunk_size = 200;
    config.search.top_k = 8;
    config.tools.tavily_api_key = Some("secret".to_string());

    config.save(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.embedding.batch_size, 64);
    assert_eq!(loaded.indexing.chunk_size, 200);
    assert_eq!(loaded.search.top_k, 8);
    // Credentials never hit the config file
    assert!(loaded.tools.tavily_api_key.is_none());
}

#[test]
fn test_partial_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[indexing]\nchunk_size = 256\n").unwrap();

    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded.indexing.chunk_size, 256);
    assert_eq!(loaded.indexing.chunk_overlap, 50);
    assert_eq!(loaded.vector_db.collection_name, "code-rag-chroma");
}

#[test]
fn test_load_nonexistent_file() {
    let result = Config::from_file(Path::new("/nonexistent/config.toml"));
    assert!(result.is_err());
    assert!(matches!(
        result.unwrap_err(),
        RagError::Config(ConfigError::FileNotFound(_))
    ));
}

#[test]
fn test_load_invalid_toml() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "this is = = not toml").unwrap();

    let result = Config::from_file(&path);
    assert!(matches!(
        result.unwrap_err(),
        RagError::Config(ConfigError::ParseFailed(_))
    ));
}

#[test]
fn test_toml_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).unwrap();
    assert!(toml_str.contains("model_name"));
    assert!(toml_str.contains("chunk_overlap"));
    assert!(toml_str.contains("code-rag-chroma"));
    assert!(!toml_str.contains("api_key"));
}

#[test]
fn test_apply_env_overrides() {
    // Safety: these variables are only touched by this test
    unsafe {
        std::env::set_var("CODE_RAG_MODEL", "BAAI/bge-small-en-v1.5");
        std::env::set_var("CODE_RAG_EXTENSIONS", "py, .pyi");
        std::env::set_var("CODE_RAG_CHUNK_SIZE", "300");
        std::env::set_var("CODE_RAG_TOP_K", "not-a-number");
    }

    let mut config = Config::default();
    config.apply_env_overrides();

    assert_eq!(config.embedding.model_name, "BAAI/bge-small-en-v1.5");
    assert_eq!(config.indexing.extensions, vec!["py", "pyi"]);
    assert_eq!(config.indexing.chunk_size, 300);
    // Unparseable values leave the default in place
    assert_eq!(config.search.top_k, 4);

    // Safety: cleaning up the variables set above
    unsafe {
        std::env::remove_var("CODE_RAG_MODEL");
        std::env::remove_var("CODE_RAG_EXTENSIONS");
        std::env::remove_var("CODE_RAG_CHUNK_SIZE");
        std::env::remove_var("CODE_RAG_TOP_K");
    }
}
