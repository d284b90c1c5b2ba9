use std::sync::Arc;

use operation_kit_config::OperationKitConfig;
use serde_json::{Map, Value};
use tracing::{debug, error, trace};

use crate::cache_state::{
    compute_cache_key, skip_include_variable_names, CachedOperation, OperationCache,
};
use crate::error::OperationError;
use crate::operation::{ClientInfo, FileUpload, ParsedOperation};
use crate::persisted_operations::{
    FilePersistedOperationStore, PersistedOperationError, PersistedOperationStore,
};
use crate::pipeline::normalize::{normalize_selected_operation, replay_outcome};
use crate::pipeline::validate::validate_operation;
use crate::request::GraphQLRequest;
use crate::normalization::SelectionLimits;
use crate::schema::SchemaIndex;
use crate::workspace::{Workspace, WorkspacePool};

pub mod normalize;
pub mod parse;
pub mod validate;

pub use normalize::OPERATION_NAME_PLACEHOLDER;
pub use parse::{parse_document, select_operation, SelectedOperation};

/// Settings of [`OperationProcessor`] taken from [`OperationKitConfig`].
#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    pub max_request_body_size: usize,
    pub max_operation_name_length: usize,
    pub introspection_enabled: bool,
    pub replace_validation_error_status: bool,
}

impl From<&OperationKitConfig> for ProcessorOptions {
    fn from(config: &OperationKitConfig) -> Self {
        Self {
            max_request_body_size: config.limits.max_request_body_size,
            max_operation_name_length: config.limits.max_operation_name_length,
            introspection_enabled: config.introspection.enabled,
            replace_validation_error_status: config
                .compatibility
                .replace_validation_error_status,
        }
    }
}

/// Where the operation text came from, which decides the cache used and how errors are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Client,
    Persisted,
}

/// Turns raw GraphQL requests into [`ParsedOperation`]s.
///
/// Shared by every request handler. Caches and the workspace pool are internally synchronized.
pub struct OperationProcessor {
    schema: Arc<SchemaIndex>,
    options: ProcessorOptions,
    pool: WorkspacePool,
    cache: OperationCache,
    persisted_store: Option<Arc<dyn PersistedOperationStore>>,
}

impl OperationProcessor {
    pub fn new(schema: Arc<SchemaIndex>, config: &OperationKitConfig) -> Self {
        Self {
            schema,
            options: ProcessorOptions::from(config),
            pool: WorkspacePool::new(
                &config.workspace_pool,
                config.normalization.extract_variables,
            )
            .with_selection_limits(SelectionLimits::from(&config.limits)),
            cache: OperationCache::new(&config.cache),
            persisted_store: None,
        }
    }

    /// Builds the processor, loading the persisted operations file when the feature is enabled.
    pub fn from_config(
        schema: Arc<SchemaIndex>,
        config: &OperationKitConfig,
    ) -> Result<Self, PersistedOperationError> {
        let processor = Self::new(schema, config);
        if config.persisted_operations.is_disabled() {
            return Ok(processor);
        }

        match &config.persisted_operations.source {
            Some(source) => {
                let store = FilePersistedOperationStore::try_new(source)?;
                Ok(processor.with_persisted_store(Arc::new(store)))
            }
            None => Ok(processor),
        }
    }

    pub fn with_persisted_store(mut self, store: Arc<dyn PersistedOperationStore>) -> Self {
        self.persisted_store = Some(store);
        self
    }

    pub fn schema(&self) -> &SchemaIndex {
        &self.schema
    }

    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    pub fn cache(&self) -> &OperationCache {
        &self.cache
    }

    pub fn workspace_pool(&self) -> &WorkspacePool {
        &self.pool
    }

    #[inline]
    pub async fn canonicalize(
        &self,
        body: &[u8],
        client: &ClientInfo,
    ) -> Result<ParsedOperation, OperationError> {
        self.canonicalize_with_files(body, client, Vec::new()).await
    }

    pub async fn canonicalize_with_files(
        &self,
        body: &[u8],
        client: &ClientInfo,
        files: Vec<FileUpload>,
    ) -> Result<ParsedOperation, OperationError> {
        let request = GraphQLRequest::decode(body, self.options.max_request_body_size)?;
        self.canonicalize_request(request, client, files).await
    }

    /// Canonicalizes an already decoded request.
    pub async fn canonicalize_request(
        &self,
        mut request: GraphQLRequest,
        client: &ClientInfo,
        files: Vec<FileUpload>,
    ) -> Result<ParsedOperation, OperationError> {
        if let Some(name) = &request.operation_name {
            let max = self.options.max_operation_name_length;
            if max > 0 && name.len() > max {
                return Err(OperationError::OperationNameTooLong {
                    length: name.len(),
                    max,
                });
            }
        }

        match request.query.take() {
            Some(query) => self.process_text(query, request, files).await,
            None if request.persisted_query.is_some() => {
                self.process_persisted(request, client, files).await
            }
            None => Err(OperationError::EmptyRequest),
        }
    }

    async fn process_text(
        &self,
        query: String,
        request: GraphQLRequest,
        files: Vec<FileUpload>,
    ) -> Result<ParsedOperation, OperationError> {
        let sha256_hash = self.cache.sha256_of(&query);
        let mut workspace = self.pool.checkout();
        let selected = parse_into(
            &mut workspace,
            &query,
            request.operation_name.as_deref(),
            self.options.max_operation_name_length,
            Origin::Client,
        )?;

        let names = workspace
            .document
            .as_ref()
            .map(skip_include_variable_names)
            .unwrap_or_default();
        let key = compute_cache_key(
            &query,
            request.operation_name.as_deref(),
            &names,
            &request.variables,
        );

        if let Some(cached) = self.cache.get_normalized(key).await {
            trace!(cache_key = key, "normalization cache hit");
            return self.finish_from_cache(
                &mut workspace,
                &cached,
                request,
                files,
                sha256_hash.to_string(),
                Origin::Client,
            );
        }
        trace!(cache_key = key, "normalization cache miss");

        let mut variables = request.variables;
        let cached = Arc::new(normalize_selected_operation(
            &self.schema,
            &mut workspace,
            &selected,
            &mut variables,
        )?);
        self.cache.put_normalized(key, cached.clone()).await;

        validate_operation(&self.schema, &self.options, &mut workspace, &variables)?;

        Ok(build_operation(
            &cached,
            request.operation_name,
            variables,
            request.extensions,
            files,
            sha256_hash.to_string(),
            Origin::Client,
            false,
        ))
    }

    async fn process_persisted(
        &self,
        request: GraphQLRequest,
        client: &ClientInfo,
        files: Vec<FileUpload>,
    ) -> Result<ParsedOperation, OperationError> {
        let Some(store) = self.persisted_store.as_ref() else {
            return Err(OperationError::PersistedOperationsDisabled);
        };
        let sha256_hash = match &request.persisted_query {
            Some(persisted_query) => persisted_query.sha256_hash.to_ascii_lowercase(),
            None => return Err(OperationError::EmptyRequest),
        };

        if let Some(names) = self.cache.lookup_directive_variables(&sha256_hash) {
            let key = compute_cache_key(
                &sha256_hash,
                request.operation_name.as_deref(),
                &names,
                &request.variables,
            );
            if let Some(cached) = self.cache.get_persisted(key).await {
                trace!(cache_key = key, "persisted operation cache hit");
                let mut workspace = self.pool.checkout();
                return self.finish_from_cache(
                    &mut workspace,
                    &cached,
                    request,
                    files,
                    sha256_hash,
                    Origin::Persisted,
                );
            }
        }
        trace!(
            sha256_hash = sha256_hash.as_str(),
            "persisted operation cache miss"
        );

        let query = store.fetch(&sha256_hash, client).await.map_err(|err| {
            if !matches!(err, PersistedOperationError::NotFound(_)) {
                error!(
                    client_name = client.name.as_str(),
                    "failed to fetch persisted operation: {}", err
                );
            }
            OperationError::PersistedOperation(err)
        })?;

        let mut workspace = self.pool.checkout();
        let selected = parse_into(
            &mut workspace,
            &query,
            request.operation_name.as_deref(),
            self.options.max_operation_name_length,
            Origin::Persisted,
        )?;

        let names: Arc<[String]> = workspace
            .document
            .as_ref()
            .map(skip_include_variable_names)
            .unwrap_or_default()
            .into();
        self.cache
            .record_directive_variables(&sha256_hash, names.clone());
        let key = compute_cache_key(
            &sha256_hash,
            request.operation_name.as_deref(),
            &names,
            &request.variables,
        );

        let mut variables = request.variables;
        let cached = Arc::new(normalize_selected_operation(
            &self.schema,
            &mut workspace,
            &selected,
            &mut variables,
        )?);
        self.cache.put_persisted(key, cached.clone()).await;

        validate_operation(&self.schema, &self.options, &mut workspace, &variables)?;

        Ok(build_operation(
            &cached,
            request.operation_name,
            variables,
            request.extensions,
            files,
            sha256_hash,
            Origin::Persisted,
            false,
        ))
    }

    /// Validates a cached result against the current request.
    /// The normalized representation is parsed again, validation needs the AST.
    fn finish_from_cache(
        &self,
        workspace: &mut Workspace,
        cached: &CachedOperation,
        request: GraphQLRequest,
        files: Vec<FileUpload>,
        sha256_hash: String,
        origin: Origin,
    ) -> Result<ParsedOperation, OperationError> {
        let document = parse_document(&cached.normalized_representation).map_err(|err| {
            error!(
                operation_id = cached.id,
                "failed to parse cached normalized operation: {}", err
            );
            OperationError::Internal("cached operation is not parsable".to_string())
        })?;
        workspace.document = Some(document);

        let mut variables = request.variables;
        replay_outcome(cached, &mut variables);
        validate_operation(&self.schema, &self.options, workspace, &variables)?;

        Ok(build_operation(
            cached,
            request.operation_name,
            variables,
            request.extensions,
            files,
            sha256_hash,
            origin,
            true,
        ))
    }
}

/// Parses `query` into the workspace and selects the requested operation.
fn parse_into(
    workspace: &mut Workspace,
    query: &str,
    operation_name: Option<&str>,
    max_name_length: usize,
    origin: Origin,
) -> Result<SelectedOperation, OperationError> {
    let document = parse_document(query).map_err(|err| {
        match origin {
            Origin::Client => debug!("failed to parse operation: {}", err),
            Origin::Persisted => error!("failed to parse persisted operation: {}", err),
        }
        OperationError::InvalidSyntax(err)
    })?;

    let selected = select_operation(&document, operation_name, max_name_length)?;
    workspace.document = Some(document);
    Ok(selected)
}

#[allow(clippy::too_many_arguments)]
fn build_operation(
    cached: &CachedOperation,
    requested_name: Option<String>,
    variables: Map<String, Value>,
    extensions: Option<Map<String, Value>>,
    files: Vec<FileUpload>,
    sha256_hash: String,
    origin: Origin,
    cache_hit: bool,
) -> ParsedOperation {
    let persisted = origin == Origin::Persisted;
    ParsedOperation {
        id: cached.id,
        kind: cached.kind,
        name: cached.name.clone().or(requested_name),
        normalized_representation: cached.normalized_representation.to_string(),
        variables,
        extensions,
        files,
        sha256_hash,
        persisted,
        persisted_operation_cache_hit: persisted && cache_hit,
        normalization_cache_hit: !persisted && cache_hit,
    }
}
