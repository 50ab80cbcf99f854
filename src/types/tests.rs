use super::*;

#[test]
fn test_unit_type_serializes_lowercase() {
    assert_eq!(
        serde_json::to_string(&UnitType::Identifier).unwrap(),
        "\"identifier\""
    );
    assert_eq!(
        serde_json::to_string(&UnitType::Function).unwrap(),
        "\"function\""
    );
}

#[test]
fn test_unit_type_from_str() {
    assert_eq!("function".parse::<UnitType>(), Ok(UnitType::Function));
    assert_eq!("identifier".parse::<UnitType>(), Ok(UnitType::Identifier));
    assert!("class".parse::<UnitType>().is_err());
}

#[test]
fn test_document_metadata_uses_type_key() {
    let doc = Document::new("X = 1", UnitType::Identifier, "pkg/a.py");
    let value = serde_json::to_value(&doc).unwrap();

    assert_eq!(value["content"], "X = 1");
    assert_eq!(value["metadata"]["type"], "identifier");
    assert_eq!(value["metadata"]["file"], "pkg/a.py");
}

#[test]
fn test_document_roundtrip_json() {
    let json = r#"{"content":"def f():\n    return 1","metadata":{"type":"function","file":"a.py"}}"#;
    let doc: Document = serde_json::from_str(json).unwrap();
    assert_eq!(doc.metadata.unit_type, UnitType::Function);
    assert_eq!(doc.content, "def f():\n    return 1");
}

#[test]
fn test_document_from_source_unit() {
    let unit = SourceUnit {
        content: "def f():\n    return 1".to_string(),
        unit_type: UnitType::Function,
        source_file: "a.py".to_string(),
    };

    let doc = Document::from(unit);
    assert_eq!(doc.content, "def f():\n    return 1");
    assert_eq!(doc.metadata.unit_type, UnitType::Function);
    assert_eq!(doc.metadata.file, "a.py");
}

#[test]
fn test_retrieve_request_schema() {
    let req: RetrieveRequest = serde_json::from_str(r#"{"query":""}"#).unwrap();
    assert_eq!(req.query, "");

    let schema = schemars::schema_for!(RetrieveRequest).to_value();
    assert_eq!(schema["required"], serde_json::json!(["query"]));
}

#[test]
fn test_web_search_request_defaults() {
    let req: WebSearchRequest = serde_json::from_str(r#"{"query":"rust lancedb"}"#).unwrap();
    assert!(req.max_results.is_none());
    assert!(req.validate().is_ok());

    let zero = WebSearchRequest {
        query: "rust".to_string(),
        max_results: Some(0),
    };
    assert!(zero.validate().is_err());
}

#[test]
fn test_execute_code_request_validation() {
    let req = ExecuteCodeRequest {
        code: "print(1)".to_string(),
    };
    assert!(req.validate().is_ok());

    let empty = ExecuteCodeRequest {
        code: String::new(),
    };
    assert!(empty.validate().is_err());
}

#[test]
fn test_index_stats_default() {
    let stats = IndexStats::default();
    assert_eq!(stats.files_read, 0);
    assert_eq!(stats.chunks, 0);
}
