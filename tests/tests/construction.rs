use application::rag_service::GeminiRagService;
use domain::errors::ConfigError;
use infrastructure::config::Config;
use infrastructure::embedding_storage::EmbeddingStorage;
use tempfile::TempDir;

fn lookup(pairs: Vec<(&'static str, String)>) -> impl Fn(&str) -> Option<String> {
    move |key| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone())
}

#[test]
fn missing_credential_produces_no_service() {
    let result = Config::from_lookup(lookup(vec![]));
    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "GOOGLE_API_KEY not set.");
}

#[test]
fn missing_index_fails_at_construction() {
    let dir = TempDir::new().unwrap();
    let config = Config::from_lookup(lookup(vec![
        ("GOOGLE_API_KEY", "test-key".to_string()),
        ("VECTOR_DB_DIR", dir.path().join("absent").display().to_string()),
    ]))
    .unwrap();

    let err = GeminiRagService::from_config(&config).err().unwrap();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::MissingIndex(_))
    ));
}

#[test]
fn index_built_with_other_embedding_model_is_rejected() {
    let dir = TempDir::new().unwrap();
    let storage = EmbeddingStorage::create(dir.path()).unwrap();
    storage.set_embedding_model("models/text-embedding-004").unwrap();
    drop(storage);

    let config = Config::from_lookup(lookup(vec![
        ("GOOGLE_API_KEY", "test-key".to_string()),
        ("VECTOR_DB_DIR", dir.path().display().to_string()),
    ]))
    .unwrap();

    let err = GeminiRagService::from_config(&config).err().unwrap();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::InvalidValue { .. })
    ));
}

#[test]
fn existing_empty_index_constructs() {
    let dir = TempDir::new().unwrap();
    EmbeddingStorage::create(dir.path()).unwrap();
    let config = Config::from_lookup(lookup(vec![
        ("GOOGLE_API_KEY", "test-key".to_string()),
        ("VECTOR_DB_DIR", dir.path().display().to_string()),
    ]))
    .unwrap();

    assert!(GeminiRagService::from_config(&config).is_ok());
}

#[test]
fn placeholder_index_file_is_rejected_and_not_rewritten() {
    let dir = TempDir::new().unwrap();
    let index = dir.path().join("index.sqlite3");
    std::fs::write(&index, b"").unwrap();
    let config = Config::from_lookup(lookup(vec![
        ("GOOGLE_API_KEY", "test-key".to_string()),
        ("VECTOR_DB_DIR", dir.path().display().to_string()),
    ]))
    .unwrap();

    let err = GeminiRagService::from_config(&config).err().unwrap();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::MissingIndex(_))
    ));
    assert_eq!(std::fs::metadata(&index).unwrap().len(), 0);
}
