use std::sync::Arc;

use dashmap::DashMap;
use graphql_parser::query::{Definition, Directive, Document, Value as GraphQLValue};
use moka::future::Cache;
use operation_kit_config::cache::CacheConfig;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use xxhash_rust::xxh3::{xxh3_64, Xxh3};

use crate::normalization::context::NormalizationOutcome;
use crate::normalization::utils::{selection_set, visit_directives};
use crate::operation::OperationKind;

const DISCRIMINATOR_TRUE: u8 = b't';
const DISCRIMINATOR_FALSE: u8 = b'f';
const DISCRIMINATOR_ABSENT: u8 = b'x';

/// A previously computed canonical operation.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedOperation {
    pub id: u64,
    pub kind: OperationKind,
    pub name: Option<String>,
    pub normalized_representation: Arc<str>,
    pub outcome: Arc<NormalizationOutcome>,
}

/// Long-lived caches shared by every canonicalization call.
///
/// Each table is guarded independently, so writes to one never wait on reads of another.
pub struct OperationCache {
    /// Persisted query hash -> sorted names of the variables used as `@skip`/`@include` conditions.
    directive_variables: DashMap<String, Arc<[String]>>,
    /// Composite key of [`compute_cache_key`] -> canonical result of a persisted operation.
    persisted: Cache<u64, Arc<CachedOperation>>,
    /// Same, for operations sent as text.
    normalization: Cache<u64, Arc<CachedOperation>>,
    /// xxh3 of a query text -> hex sha256 of it.
    query_hashes: moka::sync::Cache<u64, Arc<str>>,
}

impl OperationCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            directive_variables: DashMap::new(),
            persisted: Cache::new(config.persisted_operation_cache_size),
            normalization: Cache::new(config.normalization_cache_size),
            query_hashes: moka::sync::Cache::new(config.operation_hash_cache_size),
        }
    }

    pub fn lookup_directive_variables(&self, sha256_hash: &str) -> Option<Arc<[String]>> {
        self.directive_variables
            .get(sha256_hash)
            .map(|entry| entry.value().clone())
    }

    /// Entries are written once per hash and never invalidated, recording again is a no-op overwrite.
    pub fn record_directive_variables(&self, sha256_hash: &str, names: Arc<[String]>) {
        self.directive_variables
            .insert(sha256_hash.to_string(), names);
    }

    pub async fn get_persisted(&self, key: u64) -> Option<Arc<CachedOperation>> {
        self.persisted.get(&key).await
    }

    pub async fn put_persisted(&self, key: u64, entry: Arc<CachedOperation>) {
        self.persisted.insert(key, entry).await;
    }

    pub async fn get_normalized(&self, key: u64) -> Option<Arc<CachedOperation>> {
        self.normalization.get(&key).await
    }

    pub async fn put_normalized(&self, key: u64, entry: Arc<CachedOperation>) {
        self.normalization.insert(key, entry).await;
    }

    /// Hex sha256 of a query text, memoized.
    pub fn sha256_of(&self, query: &str) -> Arc<str> {
        self.query_hashes.get_with(xxh3_64(query.as_bytes()), || {
            Arc::from(hex::encode(Sha256::digest(query.as_bytes())))
        })
    }

    /// Drops every entry, for example after the schema changed.
    pub fn clear(&self) {
        self.directive_variables.clear();
        self.persisted.invalidate_all();
        self.normalization.invalidate_all();
        self.query_hashes.invalidate_all();
    }

    pub fn directive_variables_len(&self) -> usize {
        self.directive_variables.len()
    }
}

/// Cache key of an operation: the operation reference (persisted hash or query text),
/// the operation name, and one discriminator per directive variable (`t`, `f`, or `x` when
/// the value is absent or not a boolean).
pub fn compute_cache_key(
    reference: &str,
    operation_name: Option<&str>,
    directive_variable_names: &[String],
    variables: &Map<String, Value>,
) -> u64 {
    let mut hasher = Xxh3::new();
    hasher.update(reference.as_bytes());
    hasher.update(&[0]);
    if let Some(name) = operation_name {
        hasher.update(name.as_bytes());
    }
    hasher.update(&[0]);
    for name in directive_variable_names {
        let discriminator = match variables.get(name) {
            Some(Value::Bool(true)) => DISCRIMINATOR_TRUE,
            Some(Value::Bool(false)) => DISCRIMINATOR_FALSE,
            _ => DISCRIMINATOR_ABSENT,
        };
        hasher.update(&[discriminator]);
    }
    hasher.digest()
}

/// Sorted, deduplicated names of the variables used as the `if` argument of
/// `@skip` or `@include`, anywhere in the document.
pub fn skip_include_variable_names(document: &Document<'static, String>) -> Vec<String> {
    let mut names = Vec::new();
    let mut collect = |directive: &Directive<'static, String>| {
        if directive.name != "skip" && directive.name != "include" {
            return;
        }
        for (argument, value) in &directive.arguments {
            if argument != "if" {
                continue;
            }
            if let GraphQLValue::Variable(name) = value {
                names.push(name.clone());
            }
        }
    };

    for definition in &document.definitions {
        match definition {
            Definition::Operation(operation) => {
                visit_directives(selection_set(operation), &mut collect);
            }
            Definition::Fragment(fragment) => {
                visit_directives(&fragment.selection_set, &mut collect);
            }
        }
    }

    names.sort_unstable();
    names.dedup();
    names
}
