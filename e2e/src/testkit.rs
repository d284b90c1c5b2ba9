use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use operation_kit::{ClientInfo, OperationError, OperationProcessor, ParsedOperation, SchemaIndex};
use operation_kit_config::{parse_yaml_config_at, OperationKitConfig};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tempfile::TempDir;

pub const SCHEMA: &str = r#"
type Query {
  initialPayload(repeat: Int): Int
  employee(id: Int!): Employee
  employees(active: Boolean, filter: EmployeeFilter): [Employee!]!
  node(id: ID!): Node
}

type Mutation {
  initialPayload(repeat: Int): Int
  updateEmployeeTag(id: Int!, tag: String!): Employee
}

interface Node {
  id: ID!
}

type Employee implements Node {
  id: ID!
  tag: String
  role: Role
  details: Details
}

type Details {
  forename: String
  surname: String
}

enum Role {
  ENGINEER
  MANAGER
}

input EmployeeFilter {
  tag: String
  role: Role
}
"#;

pub fn schema() -> Arc<SchemaIndex> {
    Arc::new(SchemaIndex::parse(SCHEMA).expect("valid schema"))
}

pub fn sha256_hex(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

pub fn body(value: Value) -> Vec<u8> {
    value.to_string().into_bytes()
}

pub fn persisted_body(sha256_hash: &str, operation_name: Option<&str>, variables: Value) -> Vec<u8> {
    body(json!({
        "operationName": operation_name,
        "variables": variables,
        "extensions": {
            "persistedQuery": { "version": 1, "sha256Hash": sha256_hash }
        }
    }))
}

/// A processor built from a YAML config, with fixture files living in a temporary directory.
pub struct TestProcessor {
    pub processor: Arc<OperationProcessor>,
    pub config: OperationKitConfig,
    // Fixtures must outlive the processor.
    _dir: TempDir,
}

impl TestProcessor {
    pub async fn canonicalize(&self, body: &[u8]) -> Result<ParsedOperation, OperationError> {
        self.processor.canonicalize(body, &ClientInfo::default()).await
    }

    pub async fn query(&self, query: &str) -> Result<ParsedOperation, OperationError> {
        self.canonicalize(&body(json!({ "query": query }))).await
    }
}

#[derive(Default)]
pub struct TestProcessorBuilder {
    yaml: String,
    persisted_operations: HashMap<String, String>,
    files: Vec<(String, String)>,
}

impl TestProcessorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inline_config(mut self, yaml: &str) -> Self {
        self.yaml = yaml.to_string();
        self
    }

    /// Registers an operation in `persisted.json` and enables persisted operations.
    pub fn persisted_operation(mut self, query: &str) -> Self {
        self.persisted_operations
            .insert(sha256_hex(query), query.to_string());
        self
    }

    pub fn file(mut self, name: &str, content: &str) -> Self {
        self.files.push((name.to_string(), content.to_string()));
        self
    }

    pub fn build(self) -> TestProcessor {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut yaml = self.yaml;

        if !self.persisted_operations.is_empty() {
            write_file(
                dir.path(),
                "persisted.json",
                &serde_json::to_string(&self.persisted_operations).expect("manifest"),
            );
            yaml.push_str(
                "\npersisted_operations:\n  enabled: true\n  source:\n    file:\n      path: persisted.json\n",
            );
        }
        for (name, content) in &self.files {
            write_file(dir.path(), name, content);
        }

        let config = parse_yaml_config_at(dir.path(), &yaml).expect("valid config");
        let processor =
            OperationProcessor::from_config(schema(), &config).expect("processor created");

        TestProcessor {
            processor: Arc::new(processor),
            config,
            _dir: dir,
        }
    }
}

pub fn write_file(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture directory");
    }
    fs::write(path, content).expect("write fixture");
}
