use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use graphql_parser::query::Document;
use operation_kit_config::cache::WorkspacePoolConfig;
use tracing::trace;
use xxhash_rust::xxh3::Xxh3;

use crate::normalization::{Normalizer, SelectionLimits};
use crate::variables::VariablesValidator;

const INITIAL_OUTPUT_CAPACITY: usize = 1024;

/// Scratch memory used while canonicalizing one operation.
pub struct Workspace {
    pub document: Option<Document<'static, String>>,
    pub hasher: Xxh3,
    pub normalizer: Normalizer,
    pub output: String,
    pub validator: VariablesValidator,
}

impl Workspace {
    fn new(extract_variables: bool, limits: SelectionLimits) -> Self {
        Self {
            document: None,
            hasher: Xxh3::new(),
            normalizer: Normalizer::new(extract_variables).with_limits(limits),
            output: String::with_capacity(INITIAL_OUTPUT_CAPACITY),
            validator: VariablesValidator::default(),
        }
    }

    /// Clears everything a previous operation left behind.
    /// Buffers are kept, unless they grew above `max_retained_buffer_bytes`.
    fn reset(&mut self, max_retained_buffer_bytes: usize) {
        self.document = None;
        self.hasher.reset();
        self.normalizer.reset();
        self.validator.reset();
        if self.output.capacity() > max_retained_buffer_bytes {
            self.output = String::with_capacity(INITIAL_OUTPUT_CAPACITY);
        } else {
            self.output.clear();
        }
    }
}

/// Pool of [`Workspace`]s. Checkout never blocks on availability: when every
/// workspace is in use a new one is created, and surplus workspaces are dropped on return.
pub struct WorkspacePool {
    idle: Mutex<Vec<Workspace>>,
    max_idle: usize,
    max_retained_buffer_bytes: usize,
    extract_variables: bool,
    selection_limits: SelectionLimits,
    created: AtomicUsize,
}

impl WorkspacePool {
    pub fn new(config: &WorkspacePoolConfig, extract_variables: bool) -> Self {
        Self {
            idle: Mutex::new(Vec::with_capacity(config.max_idle)),
            max_idle: config.max_idle,
            max_retained_buffer_bytes: config.max_retained_buffer_bytes,
            extract_variables,
            selection_limits: SelectionLimits::default(),
            created: AtomicUsize::new(0),
        }
    }

    /// Bounds applied by the normalizer of every workspace created afterwards.
    pub fn with_selection_limits(mut self, limits: SelectionLimits) -> Self {
        self.selection_limits = limits;
        self
    }

    pub fn checkout(&self) -> PooledWorkspace<'_> {
        let reused = self
            .idle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop();

        let workspace = match reused {
            Some(workspace) => workspace,
            None => {
                let total = self.created.fetch_add(1, Ordering::Relaxed) + 1;
                trace!(total, "allocating a new workspace");
                Workspace::new(self.extract_variables, self.selection_limits)
            }
        };

        PooledWorkspace {
            pool: self,
            workspace: Some(workspace),
        }
    }

    /// Number of workspaces waiting for reuse.
    pub fn idle_count(&self) -> usize {
        self.idle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Number of workspaces allocated over the lifetime of the pool.
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    fn release(&self, mut workspace: Workspace) {
        workspace.reset(self.max_retained_buffer_bytes);
        let mut idle = self
            .idle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if idle.len() < self.max_idle {
            idle.push(workspace);
        }
    }
}

/// Exclusive handle to a workspace, returned to its pool when dropped.
pub struct PooledWorkspace<'a> {
    pool: &'a WorkspacePool,
    workspace: Option<Workspace>,
}

impl Deref for PooledWorkspace<'_> {
    type Target = Workspace;

    fn deref(&self) -> &Self::Target {
        match &self.workspace {
            Some(workspace) => workspace,
            None => unreachable!("workspace is only taken on drop"),
        }
    }
}

impl DerefMut for PooledWorkspace<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.workspace {
            Some(workspace) => workspace,
            None => unreachable!("workspace is only taken on drop"),
        }
    }
}

impl Drop for PooledWorkspace<'_> {
    fn drop(&mut self) {
        if let Some(workspace) = self.workspace.take() {
            self.pool.release(workspace);
        }
    }
}
