#[cfg(test)]
mod warmup_e2e_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use operation_kit::planner::{NoopPlanner, OperationPlanner, PlannerError};
    use operation_kit::warmup::processor::PlanningWarmupProcessor;
    use operation_kit::warmup::source::{FileSystemSource, InMemorySource};
    use operation_kit::{CacheWarmup, ClientInfo, ParsedOperation, WarmupItem, WarmupStats};
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    use crate::testkit::{body, persisted_body, sha256_hex, TestProcessor, TestProcessorBuilder};

    const WARMUP_CONFIG: &str = r#"
cache_warmup:
  enabled: true
  workers: 2
  items_per_second: 0
  timeout: 10s
  source:
    filesystem:
      path: ./warmup
"#;

    /// Records the operations it is asked to plan, rejecting mutations.
    #[derive(Default)]
    struct RecordingPlanner {
        planned: Mutex<Vec<(Option<String>, ClientInfo)>>,
    }

    #[async_trait]
    impl OperationPlanner for RecordingPlanner {
        async fn plan(
            &self,
            operation: &ParsedOperation,
            client: &ClientInfo,
        ) -> Result<(), PlannerError> {
            if operation.kind == operation_kit::OperationKind::Mutation {
                return Err(PlannerError::Failed("mutations are not planned".to_string()));
            }
            self.planned
                .lock()
                .expect("lock")
                .push((operation.name.clone(), client.clone()));
            Ok(())
        }
    }

    fn source_of(processor: &TestProcessor) -> FileSystemSource {
        let source = processor
            .config
            .cache_warmup
            .source
            .as_ref()
            .expect("warmup source is configured");
        FileSystemSource::from_config(source)
    }

    #[tokio::test]
    async fn should_warm_the_normalization_cache_from_files() {
        let manifest = json!({
            "operations": [
                {
                    "request": { "query": "query Employees { employees { id } }" },
                    "client": { "name": "web", "version": "1.2.0" }
                },
                {
                    "request": {
                        "query": "query Employee($id: Int!) { employee(id: $id) { tag } }",
                        "variables": { "id": 1 }
                    }
                }
            ]
        });
        let processor = TestProcessorBuilder::new()
            .inline_config(WARMUP_CONFIG)
            .file("warmup/operations.json", &manifest.to_string())
            .file("warmup/payload.graphql", "{ initialPayload(repeat: 2) }")
            .file("warmup/broken.gql", "query {")
            .build();

        let planner = Arc::new(RecordingPlanner::default());
        let warmed = Arc::new(AtomicUsize::new(0));
        let counter = warmed.clone();
        let stats = CacheWarmup::new(&processor.config.cache_warmup)
            .with_after_operation(move |_| {
                counter.fetch_add(1, Ordering::Relaxed);
            })
            .run(
                &source_of(&processor),
                Arc::new(PlanningWarmupProcessor::new(
                    processor.processor.clone(),
                    planner.clone(),
                )),
                CancellationToken::new(),
            )
            .await
            .expect("warmup finished");

        assert_eq!(
            stats,
            WarmupStats {
                total: 4,
                processed: 3,
                failed: 1
            }
        );
        assert_eq!(warmed.load(Ordering::Relaxed), 3);

        let planned = planner.planned.lock().expect("lock").clone();
        assert_eq!(planned.len(), 3);
        assert!(planned.contains(&(
            Some("Employees".to_string()),
            ClientInfo::new("web", "1.2.0")
        )));

        let operation = processor
            .canonicalize(&body(json!({
                "query": "query Employee($id: Int!) { employee(id: $id) { tag } }",
                "variables": { "id": 1 }
            })))
            .await
            .expect("canonicalized");
        assert!(operation.normalization_cache_hit);

        let operation = processor
            .query("{ initialPayload(repeat: 2) }")
            .await
            .expect("canonicalized");
        assert!(operation.normalization_cache_hit);
    }

    #[tokio::test]
    async fn should_warm_the_persisted_operation_cache() {
        let query = "query Payload { initialPayload(repeat: 5) }";
        let processor = TestProcessorBuilder::new()
            .persisted_operation(query)
            .build();
        let request = persisted_body(&sha256_hex(query), None, json!({}));

        let stats = CacheWarmup::new(&processor.config.cache_warmup)
            .run(
                &InMemorySource::new(vec![WarmupItem::new(
                    ClientInfo::default(),
                    request.clone(),
                )]),
                Arc::new(PlanningWarmupProcessor::new(
                    processor.processor.clone(),
                    Arc::new(NoopPlanner),
                )),
                CancellationToken::new(),
            )
            .await
            .expect("warmup finished");
        assert_eq!(stats.processed, 1);

        let operation = processor.canonicalize(&request).await.expect("resolved");
        assert!(operation.persisted_operation_cache_hit);
    }

    #[tokio::test]
    async fn should_count_planning_failures() {
        let processor = TestProcessorBuilder::new().build();
        let items = vec![
            WarmupItem::new(
                ClientInfo::default(),
                body(json!({ "query": "mutation { initialPayload }" })),
            ),
            WarmupItem::new(
                ClientInfo::default(),
                body(json!({ "query": "{ initialPayload }" })),
            ),
        ];

        let stats = CacheWarmup::new(&processor.config.cache_warmup)
            .run(
                &InMemorySource::new(items),
                Arc::new(PlanningWarmupProcessor::new(
                    processor.processor.clone(),
                    Arc::new(RecordingPlanner::default()),
                )),
                CancellationToken::new(),
            )
            .await
            .expect("warmup finished");

        assert_eq!(
            stats,
            WarmupStats {
                total: 2,
                processed: 1,
                failed: 1
            }
        );
    }
}
