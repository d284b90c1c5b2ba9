#[cfg(test)]
mod canonicalize_e2e_tests {
    use http::StatusCode;
    use operation_kit::{ErrorKind, OperationError, OperationKind};
    use serde_json::json;

    use crate::testkit::{body, sha256_hex, TestProcessorBuilder};

    const NO_EXTRACTION: &str = "normalization:\n  extract_variables: false\n";

    #[tokio::test]
    async fn should_produce_the_same_id_regardless_of_operation_name() {
        let processor = TestProcessorBuilder::new().build();

        let first = processor
            .query("query First { employee(id: 1) { id tag } }")
            .await
            .expect("canonicalized");
        let second = processor
            .query("query Second { employee(id: 1) { id tag } }")
            .await
            .expect("canonicalized");

        assert_eq!(first.id, second.id);
        assert_eq!(first.name.as_deref(), Some("First"));
        assert_eq!(second.name.as_deref(), Some("Second"));
        insta::assert_snapshot!(first.normalized_representation, @r"
        query First($a: Int!) {
          employee(id: $a) {
            id
            tag
          }
        }
        ");
        assert_eq!(first.variables, second.variables);
    }

    #[tokio::test]
    async fn should_select_a_single_operation_with_or_without_name() {
        let processor = TestProcessorBuilder::new().inline_config(NO_EXTRACTION).build();

        let anonymous = processor
            .query("{ employees { id } }")
            .await
            .expect("anonymous operation selected");
        assert_eq!(anonymous.kind, OperationKind::Query);
        assert_eq!(anonymous.name, None);

        let named = processor
            .query("query Employees { employees { id } }")
            .await
            .expect("named operation selected");
        assert_eq!(named.name.as_deref(), Some("Employees"));
        assert_eq!(anonymous.id, named.id);
    }

    #[tokio::test]
    async fn should_require_a_name_when_several_operations_are_defined() {
        let processor = TestProcessorBuilder::new().build();

        let err = processor
            .canonicalize(&body(json!({
                "query": "mutation { initialPayload(repeat:3) } query { initialPayload(repeat:3) }"
            })))
            .await
            .expect_err("ambiguous document");
        assert_eq!(
            err.to_string(),
            "operation name is required when multiple operations are defined"
        );
        assert_eq!(err.kind(), ErrorKind::Semantic);
        assert_eq!(err.status_code(true), StatusCode::OK);

        let err = processor
            .query("query A { initialPayload } query B { initialPayload }")
            .await
            .expect_err("ambiguous document");
        assert!(matches!(err, OperationError::OperationNameRequired));
    }

    #[tokio::test]
    async fn should_select_the_named_operation() {
        let processor = TestProcessorBuilder::new().inline_config(NO_EXTRACTION).build();

        let operation = processor
            .canonicalize(&body(json!({
                "query": "mutation Update { updateEmployeeTag(id: 1, tag: \"x\") { id } } query Read { employee(id: 1) { tag } }",
                "operationName": "Update"
            })))
            .await
            .expect("operation selected");

        assert_eq!(operation.kind, OperationKind::Mutation);
        assert_eq!(operation.name.as_deref(), Some("Update"));
        insta::assert_snapshot!(operation.normalized_representation, @r#"
        mutation Update {
          updateEmployeeTag(id: 1, tag: "x") {
            id
          }
        }
        "#);

        let err = processor
            .canonicalize(&body(json!({
                "query": "query A { initialPayload } query B { initialPayload }",
                "operationName": "C"
            })))
            .await
            .expect_err("unknown operation");
        assert_eq!(err.to_string(), "operation with name 'C' not found");
    }

    #[tokio::test]
    async fn should_report_the_supplied_name_of_an_anonymous_operation() {
        let processor = TestProcessorBuilder::new().build();

        let operation = processor
            .canonicalize(&body(json!({
                "query": "{ initialPayload }",
                "operationName": "Payload"
            })))
            .await
            .expect("single operation selected");

        assert_eq!(operation.name.as_deref(), Some("Payload"));
        insta::assert_snapshot!(operation.normalized_representation, @r"
        query {
          initialPayload
        }
        ");
    }

    #[tokio::test]
    async fn should_treat_null_and_absent_variables_as_empty() {
        let processor = TestProcessorBuilder::new().build();

        let with_null = processor
            .canonicalize(&body(json!({ "query": "{ employees { id } }", "variables": null })))
            .await
            .expect("canonicalized");
        let absent = processor
            .canonicalize(&body(json!({ "query": "{ employees { id } }" })))
            .await
            .expect("canonicalized");

        assert_eq!(with_null.variables_json(), json!({}));
        assert_eq!(absent.variables_json(), json!({}));
    }

    #[tokio::test]
    async fn should_keep_client_variables() {
        let request = body(json!({
            "query": "query { initialPayload(repeat:3) }",
            "variables": { "foo": "bar" }
        }));

        let processor = TestProcessorBuilder::new().inline_config(NO_EXTRACTION).build();
        let operation = processor.canonicalize(&request).await.expect("canonicalized");
        assert_eq!(operation.kind, OperationKind::Query);
        assert_eq!(operation.variables_json(), json!({ "foo": "bar" }));

        let processor = TestProcessorBuilder::new().build();
        let operation = processor.canonicalize(&request).await.expect("canonicalized");
        assert_eq!(operation.kind, OperationKind::Query);
        assert_eq!(operation.variables_json(), json!({ "foo": "bar", "a": 3 }));
        insta::assert_snapshot!(operation.normalized_representation, @r"
        query($a: Int) {
          initialPayload(repeat: $a)
        }
        ");
    }

    #[tokio::test]
    async fn should_be_idempotent() {
        let processor = TestProcessorBuilder::new().build();
        let request = body(json!({
            "query": "query Q($filter: EmployeeFilter) { employees(filter: $filter, active: true) { ...F } } fragment F on Employee { id role }",
            "variables": { "filter": { "role": "ENGINEER" } }
        }));

        let first = processor.canonicalize(&request).await.expect("canonicalized");
        let second = processor.canonicalize(&request).await.expect("canonicalized");

        assert!(!first.normalization_cache_hit);
        assert!(second.normalization_cache_hit);
        assert_eq!(first.id, second.id);
        assert_eq!(first.normalized_representation, second.normalized_representation);
        assert_eq!(first.variables, second.variables);
        insta::assert_snapshot!(second.normalized_representation, @r"
        query Q($filter: EmployeeFilter, $a: Boolean) {
          employees(filter: $filter, active: $a) {
            id
            role
          }
        }
        ");
        assert_eq!(
            second.variables_json(),
            json!({ "filter": { "role": "ENGINEER" }, "a": true })
        );
    }

    #[tokio::test]
    async fn should_replay_pruned_variables_on_cache_hits() {
        let processor = TestProcessorBuilder::new().build();
        let request = body(json!({
            "query": "query Q($unused: Int) { initialPayload }",
            "variables": { "unused": 1, "other": 2 }
        }));

        let first = processor.canonicalize(&request).await.expect("canonicalized");
        let second = processor.canonicalize(&request).await.expect("canonicalized");

        assert!(second.normalization_cache_hit);
        assert_eq!(first.variables_json(), json!({ "other": 2 }));
        assert_eq!(second.variables_json(), json!({ "other": 2 }));
    }

    #[tokio::test]
    async fn should_hash_the_query_text() {
        let processor = TestProcessorBuilder::new().build();
        let query = "{ employees { id } }";

        let operation = processor.query(query).await.expect("canonicalized");

        assert_eq!(operation.sha256_hash, sha256_hex(query));
        assert!(!operation.persisted);
    }

    #[tokio::test]
    async fn should_reject_malformed_requests() {
        let processor = TestProcessorBuilder::new().build();

        let err = processor
            .canonicalize(b"{not json")
            .await
            .expect_err("malformed");
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert_eq!(err.status_code(false), StatusCode::BAD_REQUEST);

        let err = processor
            .canonicalize(&body(json!({ "query": "{ a }", "variables": [] })))
            .await
            .expect_err("wrong variables type");
        assert_eq!(err.to_string(), "variables value must not be an array");

        let err = processor
            .canonicalize(&body(json!({ "query": "{ a }", "extensions": "x" })))
            .await
            .expect_err("wrong extensions type");
        assert_eq!(
            err.to_string(),
            "invalid extensions type: string, must be object or null"
        );

        let err = processor
            .canonicalize(&body(json!({})))
            .await
            .expect_err("empty");
        assert!(matches!(err, OperationError::EmptyRequest));
    }

    #[tokio::test]
    async fn should_report_syntax_errors() {
        let processor = TestProcessorBuilder::new().build();

        let err = processor.query("query {").await.expect_err("invalid syntax");

        assert_eq!(err.kind(), ErrorKind::Grammar);
        assert_eq!(err.graphql_error_code(), "GRAPHQL_PARSE_FAILED");
        assert_eq!(err.status_code(false), StatusCode::BAD_REQUEST);
        assert_eq!(err.status_code(true), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_enforce_limits() {
        let processor = TestProcessorBuilder::new()
            .inline_config("limits:\n  max_request_body_size: 128\n  max_operation_name_length: 5\n")
            .build();

        let err = processor
            .canonicalize(&body(json!({
                "query": "query TooLong { initialPayload }",
                "operationName": "TooLong"
            })))
            .await
            .expect_err("name too long");
        assert_eq!(
            err.to_string(),
            "operation name of length 7 exceeds max length of 5"
        );

        let err = processor
            .query("query LongName { initialPayload }")
            .await
            .expect_err("name in document too long");
        assert_eq!(
            err.to_string(),
            "operation name of length 8 exceeds max length of 5"
        );

        let err = processor
            .query(&format!("{{ initialPayload {} }}", " ".repeat(128)))
            .await
            .expect_err("body too large");
        assert!(matches!(err, OperationError::EntityTooLarge { .. }));
        assert_eq!(err.status_code(false), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn should_reject_fragment_fan_out() {
        let processor = TestProcessorBuilder::new().build();
        let mut query = String::from("query { ...F0 }");
        for i in 0..30 {
            let next = i + 1;
            query.push_str(&format!(
                " fragment F{i} on Query {{ employees {{ id }} ...F{next} ...F{next} @include(if: true) }}"
            ));
        }
        query.push_str(" fragment F30 on Query { initialPayload }");

        let err = processor.query(&query).await.expect_err("too many fields");

        assert_eq!(
            err.to_string(),
            "Operation exceeds the maximum of 3500 fields after fragment expansion."
        );
        assert_eq!(err.kind(), ErrorKind::Grammar);
        assert_eq!(err.status_code(false), StatusCode::BAD_REQUEST);
        assert_eq!(err.status_code(true), StatusCode::OK);
        assert_eq!(processor.processor.workspace_pool().idle_count(), 1);
    }

    #[tokio::test]
    async fn should_block_introspection_when_disabled() {
        let processor = TestProcessorBuilder::new()
            .inline_config("introspection:\n  enabled: false\n")
            .build();

        let err = processor
            .query("{ __schema { queryType { name } } }")
            .await
            .expect_err("introspection disabled");
        assert_eq!(err.graphql_error_code(), "INTROSPECTION_DISABLED");

        let err = processor
            .query("query { ... on Query { __type(name: \"Employee\") { name } } }")
            .await
            .expect_err("introspection disabled");
        assert!(matches!(err, OperationError::IntrospectionDisabled));

        processor
            .query("{ employees { __typename id } }")
            .await
            .expect("typename is not introspection");
    }

    #[tokio::test]
    async fn should_validate_variables() {
        let processor = TestProcessorBuilder::new().build();

        let err = processor
            .canonicalize(&body(json!({
                "query": "query Q($id: Int!) { employee(id: $id) { id } }"
            })))
            .await
            .expect_err("missing variable");
        assert_eq!(
            err.to_string(),
            "Variable \"$id\" of required type \"Int!\" was not provided."
        );
        assert_eq!(err.graphql_error_code(), "BAD_USER_INPUT");
        assert_eq!(err.status_code(false), StatusCode::OK);

        let err = processor
            .canonicalize(&body(json!({
                "query": "query Q($filter: EmployeeFilter) { employees(filter: $filter) { id } }",
                "variables": { "filter": { "role": "CEO" } }
            })))
            .await
            .expect_err("unknown enum value");
        assert!(matches!(err, OperationError::InvalidVariables { .. }));

        let strict = TestProcessorBuilder::new()
            .inline_config("compatibility:\n  replace_validation_error_status: true\n")
            .build();
        let err = strict
            .canonicalize(&body(json!({
                "query": "query Q($id: Int!) { employee(id: $id) { id } }",
                "variables": { "id": "one" }
            })))
            .await
            .expect_err("invalid variable");
        assert_eq!(err.status_code(false), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_strip_the_persisted_query_extension() {
        let processor = TestProcessorBuilder::new().build();
        let query = "{ initialPayload }";

        let operation = processor
            .canonicalize(&body(json!({
                "query": query,
                "extensions": {
                    "persistedQuery": { "version": 1, "sha256Hash": sha256_hex(query) },
                    "tracing": true
                }
            })))
            .await
            .expect("canonicalized");

        assert_eq!(
            operation.extensions.map(serde_json::Value::Object),
            Some(json!({ "tracing": true }))
        );
        assert!(!operation.persisted);
    }

    #[tokio::test]
    async fn should_canonicalize_concurrently() {
        let processor = TestProcessorBuilder::new().build();
        let requests = (0..32).map(|index| {
            let processor = processor.processor.clone();
            tokio::spawn(async move {
                let request = body(json!({
                    "query": format!("query Op{} {{ employee(id: {}) {{ id }} }}", index % 4, index)
                }));
                processor
                    .canonicalize(&request, &Default::default())
                    .await
                    .map(|operation| operation.id)
            })
        });

        let ids = futures::future::join_all(requests).await;
        let first = ids[0].as_ref().expect("joined").as_ref().expect("canonicalized");
        for id in &ids {
            assert_eq!(id.as_ref().expect("joined").as_ref().expect("canonicalized"), first);
        }
        assert!(processor.processor.workspace_pool().idle_count() >= 1);
    }
}
