#[cfg(test)]
mod persisted_operations_e2e_tests {
    use http::StatusCode;
    use operation_kit::persisted_operations::PersistedOperationError;
    use operation_kit::{ErrorKind, OperationError, OperationKind};
    use serde_json::json;

    use crate::testkit::{persisted_body, sha256_hex, TestProcessorBuilder};

    const EMPLOYEES: &str = "query Employees($withDetails: Boolean!, $active: Boolean) { employees(active: $active) { id details @include(if: $withDetails) { forename } } }";

    #[tokio::test]
    async fn should_resolve_persisted_operations() {
        let processor = TestProcessorBuilder::new()
            .persisted_operation(EMPLOYEES)
            .build();
        let hash = sha256_hex(EMPLOYEES);

        let operation = processor
            .canonicalize(&persisted_body(
                &hash,
                None,
                json!({ "withDetails": true }),
            ))
            .await
            .expect("resolved");

        assert!(operation.persisted);
        assert!(!operation.persisted_operation_cache_hit);
        assert!(!operation.normalization_cache_hit);
        assert_eq!(operation.sha256_hash, hash);
        assert_eq!(operation.kind, OperationKind::Query);
        assert_eq!(operation.name.as_deref(), Some("Employees"));
        insta::assert_snapshot!(operation.normalized_representation, @r"
        query Employees($withDetails: Boolean!, $active: Boolean) {
          employees(active: $active) {
            id
            details @include(if: $withDetails) {
              forename
            }
          }
        }
        ");
    }

    #[tokio::test]
    async fn should_accept_uppercase_hashes() {
        let processor = TestProcessorBuilder::new()
            .persisted_operation("{ initialPayload }")
            .build();

        let operation = processor
            .canonicalize(&persisted_body(
                &sha256_hex("{ initialPayload }").to_ascii_uppercase(),
                None,
                json!(null),
            ))
            .await
            .expect("resolved");

        assert_eq!(operation.sha256_hash, sha256_hex("{ initialPayload }"));
    }

    #[tokio::test]
    async fn should_key_the_cache_on_skip_and_include_variables_only() {
        let processor = TestProcessorBuilder::new()
            .persisted_operation(EMPLOYEES)
            .build();
        let hash = sha256_hex(EMPLOYEES);
        let request = |with_details: bool, active: bool| {
            persisted_body(
                &hash,
                None,
                json!({ "withDetails": with_details, "active": active }),
            )
        };

        let first = processor
            .canonicalize(&request(true, true))
            .await
            .expect("resolved");
        assert!(!first.persisted_operation_cache_hit);

        // `active` is not a directive condition, the entry of the first request is reused
        let untracked_change = processor
            .canonicalize(&request(true, false))
            .await
            .expect("resolved");
        assert!(untracked_change.persisted_operation_cache_hit);
        assert_eq!(untracked_change.id, first.id);
        assert_eq!(untracked_change.variables_json()["active"], json!(false));

        let tracked_change = processor
            .canonicalize(&request(false, true))
            .await
            .expect("resolved");
        assert!(!tracked_change.persisted_operation_cache_hit);
        assert_eq!(tracked_change.id, first.id);

        let repeated = processor
            .canonicalize(&request(false, true))
            .await
            .expect("resolved");
        assert!(repeated.persisted_operation_cache_hit);
        assert_eq!(repeated.normalized_representation, first.normalized_representation);

        assert_eq!(processor.processor.cache().directive_variables_len(), 1);
    }

    #[tokio::test]
    async fn should_validate_variables_on_cache_hits() {
        let processor = TestProcessorBuilder::new()
            .persisted_operation(EMPLOYEES)
            .build();
        let hash = sha256_hex(EMPLOYEES);

        processor
            .canonicalize(&persisted_body(&hash, None, json!({ "withDetails": true })))
            .await
            .expect("resolved");

        let err = processor
            .canonicalize(&persisted_body(
                &hash,
                None,
                json!({ "withDetails": true, "active": "yes" }),
            ))
            .await
            .expect_err("invalid variable");
        assert!(matches!(err, OperationError::InvalidVariables { .. }));
    }

    #[tokio::test]
    async fn should_replay_extracted_variables_on_cache_hits() {
        let query = "query Employee { employee(id: 7) { id } }";
        let processor = TestProcessorBuilder::new()
            .persisted_operation(query)
            .build();
        let hash = sha256_hex(query);

        let first = processor
            .canonicalize(&persisted_body(&hash, None, json!({})))
            .await
            .expect("resolved");
        let second = processor
            .canonicalize(&persisted_body(&hash, None, json!({})))
            .await
            .expect("resolved");

        assert!(second.persisted_operation_cache_hit);
        assert_eq!(first.variables_json(), json!({ "a": 7 }));
        assert_eq!(second.variables_json(), json!({ "a": 7 }));
    }

    #[tokio::test]
    async fn should_select_operations_of_persisted_documents() {
        let document = "query A { initialPayload } mutation B { initialPayload(repeat: 1) }";
        let processor = TestProcessorBuilder::new()
            .persisted_operation(document)
            .build();
        let hash = sha256_hex(document);

        let err = processor
            .canonicalize(&persisted_body(&hash, None, json!({})))
            .await
            .expect_err("ambiguous document");
        assert!(matches!(err, OperationError::OperationNameRequired));

        let mutation = processor
            .canonicalize(&persisted_body(&hash, Some("B"), json!({})))
            .await
            .expect("resolved");
        assert_eq!(mutation.kind, OperationKind::Mutation);

        let query = processor
            .canonicalize(&persisted_body(&hash, Some("A"), json!({})))
            .await
            .expect("resolved");
        assert_eq!(query.kind, OperationKind::Query);
        assert_ne!(query.id, mutation.id);
    }

    #[tokio::test]
    async fn should_report_unknown_persisted_operations() {
        let processor = TestProcessorBuilder::new()
            .persisted_operation("{ initialPayload }")
            .build();

        let err = processor
            .canonicalize(&persisted_body(&sha256_hex("{ other }"), None, json!({})))
            .await
            .expect_err("unknown hash");

        assert!(matches!(
            err,
            OperationError::PersistedOperation(PersistedOperationError::NotFound(_))
        ));
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert_eq!(err.graphql_error_code(), "PERSISTED_QUERY_NOT_FOUND");
        assert_eq!(err.status_code(false), StatusCode::OK);
        assert_eq!(err.to_graphql_errors()[0].message, "PersistedQueryNotFound");
    }

    #[tokio::test]
    async fn should_reject_persisted_requests_when_not_configured() {
        let processor = TestProcessorBuilder::new().build();

        let err = processor
            .canonicalize(&persisted_body(&sha256_hex("{ a }"), None, json!({})))
            .await
            .expect_err("not configured");

        assert_eq!(
            err.to_string(),
            "could not resolve persisted query, feature is not configured"
        );
    }

    #[tokio::test]
    async fn should_reject_invalid_hashes() {
        let processor = TestProcessorBuilder::new()
            .persisted_operation("{ initialPayload }")
            .build();

        let err = processor
            .canonicalize(&persisted_body("not-a-hash", None, json!({})))
            .await
            .expect_err("invalid hash");

        assert_eq!(
            err.to_string(),
            "persistedQuery does not have a valid sha256 hash"
        );
        assert_eq!(err.status_code(false), StatusCode::BAD_REQUEST);
    }
}
