#[cfg(test)]
mod config_e2e_tests {
    use operation_kit::OperationProcessor;
    use operation_kit_config::load_config;
    use serde_json::json;

    use crate::testkit::{body, schema, sha256_hex, write_file};

    #[tokio::test]
    async fn should_resolve_fixture_paths_relative_to_the_config_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let query = "{ employees { id } }";
        let mut manifest = serde_json::Map::new();
        manifest.insert(sha256_hex(query), json!(query));
        write_file(
            dir.path(),
            "config/persisted.json",
            &serde_json::Value::Object(manifest).to_string(),
        );
        write_file(
            dir.path(),
            "config/operation-kit.config.yaml",
            "persisted_operations:\n  enabled: true\n  source:\n    file:\n      path: ./persisted.json\nnormalization:\n  extract_variables: false\n",
        );

        let config_path = dir.path().join("config/operation-kit.config.yaml");
        let config = load_config(Some(config_path.to_string_lossy().into_owned()))
            .expect("config loaded");
        assert!(!config.normalization.extract_variables);

        let processor = OperationProcessor::from_config(schema(), &config).expect("processor");
        let operation = processor
            .canonicalize(
                &body(json!({
                    "extensions": {
                        "persistedQuery": { "version": 1, "sha256Hash": sha256_hex(query) }
                    }
                })),
                &Default::default(),
            )
            .await
            .expect("resolved");

        assert!(operation.persisted);
        insta::assert_snapshot!(operation.normalized_representation, @r"
        query {
          employees {
            id
          }
        }
        ");
    }

    #[test]
    fn should_reject_invalid_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        write_file(
            dir.path(),
            "operation-kit.config.yaml",
            "cache_warmup:\n  workers: 0\n",
        );

        let config_path = dir.path().join("operation-kit.config.yaml");
        let err = load_config(Some(config_path.to_string_lossy().into_owned()))
            .expect_err("zero workers");
        assert!(err.to_string().contains("cache_warmup.workers"));
    }
}
