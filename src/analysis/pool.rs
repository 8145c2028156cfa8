//! Analyzer resolution and per-analyzer instance pools
//!
//! An [`AnalyzerPool`] is the shared handle a link configuration stores for
//! every named analyzer. Token stream instances are not thread-safe, so each
//! traversal leases one through [`AnalyzerPool::acquire`] and the lease puts
//! it back on drop.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::analysis::analyzers::{AnalyzerFactory, AnalyzerRegistry, IdentityAnalyzer, IDENTITY_TYPE};
use crate::analysis::token::{Features, Token, TokenStream};
use crate::config::AnalyzerPoolConfig;
use crate::error::{AnalyzerCreationError, ConfigError};

/// Name of the always-available pass-through analyzer
pub const IDENTITY_ANALYZER: &str = "identity";

/// Cache key of a resolved analyzer
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AnalyzerKey {
    pub name: String,
    pub kind: String,
    pub properties: String,
}

struct PoolInner {
    key: AnalyzerKey,
    features: Features,
    factory: AnalyzerFactory,
    idle: Mutex<Vec<Box<dyn TokenStream>>>,
    max_idle: usize,
}

/// Shared factory and instance pool for one named analyzer
#[derive(Clone)]
pub struct AnalyzerPool {
    inner: Arc<PoolInner>,
}

impl AnalyzerPool {
    fn new(
        key: AnalyzerKey,
        features: Features,
        factory: AnalyzerFactory,
        max_idle: usize,
    ) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                key,
                features,
                factory,
                idle: Mutex::new(Vec::new()),
                max_idle,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.key.name
    }

    pub fn kind(&self) -> &str {
        &self.inner.key.kind
    }

    pub fn properties(&self) -> &str {
        &self.inner.key.properties
    }

    pub fn features(&self) -> Features {
        self.inner.features
    }

    pub fn key(&self) -> &AnalyzerKey {
        &self.inner.key
    }

    /// Idle instances currently held by the pool
    pub fn idle_count(&self) -> usize {
        self.inner.idle.lock().len()
    }

    /// Lease a token stream, constructing one if none is idle
    pub fn acquire(&self) -> Result<PooledTokenStream, AnalyzerCreationError> {
        let pooled = self.inner.idle.lock().pop();
        let stream = match pooled {
            Some(stream) => stream,
            None => self.create()?,
        };
        Ok(PooledTokenStream {
            stream,
            pool: self.clone(),
        })
    }

    fn create(&self) -> Result<Box<dyn TokenStream>, AnalyzerCreationError> {
        (self.inner.factory)(&self.inner.key.properties).map_err(|reason| {
            AnalyzerCreationError {
                name: self.inner.key.name.clone(),
                kind: self.inner.key.kind.clone(),
                reason,
            }
        })
    }

    fn release(&self, stream: Box<dyn TokenStream>) {
        let mut idle = self.inner.idle.lock();
        if idle.len() < self.inner.max_idle {
            idle.push(stream);
        }
    }

    /// Whether both handles refer to the same pool
    pub fn ptr_eq(&self, other: &AnalyzerPool) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for AnalyzerPool {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.inner.key == other.inner.key
    }
}

impl fmt::Debug for AnalyzerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerPool")
            .field("name", &self.inner.key.name)
            .field("kind", &self.inner.key.kind)
            .field("features", &self.inner.features)
            .finish()
    }
}

/// Stands in for a leased instance once it has gone back to the pool
struct Released;

impl TokenStream for Released {
    fn reset(&mut self, _value: &str) -> bool {
        false
    }

    fn next_token(&mut self) -> Option<Token> {
        None
    }
}

/// A leased token stream; returns to its pool when dropped
pub struct PooledTokenStream {
    stream: Box<dyn TokenStream>,
    pool: AnalyzerPool,
}

impl PooledTokenStream {
    pub fn pool(&self) -> &AnalyzerPool {
        &self.pool
    }
}

impl Deref for PooledTokenStream {
    type Target = dyn TokenStream;

    fn deref(&self) -> &Self::Target {
        self.stream.as_ref()
    }
}

impl DerefMut for PooledTokenStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.stream.as_mut()
    }
}

impl TokenStream for PooledTokenStream {
    fn reset(&mut self, value: &str) -> bool {
        self.stream.reset(value)
    }

    fn next_token(&mut self) -> Option<Token> {
        self.stream.next_token()
    }
}

impl Drop for PooledTokenStream {
    fn drop(&mut self) {
        let stream = std::mem::replace(&mut self.stream, Box::new(Released));
        self.pool.release(stream);
    }
}

impl fmt::Debug for PooledTokenStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledTokenStream")
            .field("analyzer", &self.pool.name())
            .finish()
    }
}

/// Process-wide analyzer cache
///
/// Resolves `(name, type, properties)` to a shared [`AnalyzerPool`]. Names are
/// unique: a second definition under an existing name must match it exactly.
pub struct AnalyzerResolver {
    registry: AnalyzerRegistry,
    config: AnalyzerPoolConfig,
    by_key: DashMap<AnalyzerKey, AnalyzerPool>,
    by_name: DashMap<String, AnalyzerPool>,
}

impl AnalyzerResolver {
    /// Create a resolver; the `identity` analyzer is registered up front
    pub fn new(registry: AnalyzerRegistry, config: AnalyzerPoolConfig) -> Self {
        let mut registry = registry;
        if !registry.contains(IDENTITY_TYPE) {
            registry.register(
                IDENTITY_TYPE,
                Features::FREQUENCY | Features::NORM,
                |_: &str| Ok(Box::new(IdentityAnalyzer::default()) as Box<dyn TokenStream>),
            );
        }

        let resolver = Self {
            registry,
            config,
            by_key: DashMap::new(),
            by_name: DashMap::new(),
        };
        if let Some(kind) = resolver.registry.get(IDENTITY_TYPE) {
            let key = AnalyzerKey {
                name: IDENTITY_ANALYZER.to_string(),
                kind: IDENTITY_TYPE.to_string(),
                properties: String::new(),
            };
            let pool = AnalyzerPool::new(
                key.clone(),
                kind.features,
                kind.factory.clone(),
                resolver.config.max_pooled_instances,
            );
            resolver.by_name.insert(key.name.clone(), pool.clone());
            resolver.by_key.insert(key, pool);
        }
        resolver
    }

    pub fn registry(&self) -> &AnalyzerRegistry {
        &self.registry
    }

    /// Resolve an analyzer definition, creating its pool on first use
    pub fn get(&self, name: &str, kind: &str, properties: &str) -> Result<AnalyzerPool, ConfigError> {
        let pool = self.prepare(name, kind, properties)?;
        self.register(pool)
    }

    /// Validate a definition and build its pool without publishing it
    ///
    /// The first instance is constructed eagerly so invalid properties are
    /// reported here rather than during traversal. Properties are compared
    /// by JSON value, so key order does not matter.
    pub fn prepare(&self, name: &str, kind: &str, properties: &str) -> Result<AnalyzerPool, ConfigError> {
        validate_name(name)?;
        let key = AnalyzerKey {
            name: name.to_string(),
            kind: kind.to_string(),
            properties: canonical_properties(properties),
        };
        if let Some(pool) = self.by_key.get(&key) {
            return Ok(pool.clone());
        }

        let analyzer_type = self
            .registry
            .get(kind)
            .ok_or_else(|| ConfigError::new("type", format!("unknown analyzer type '{}'", kind)))?;
        if let Some(existing) = self.by_name.get(name) {
            if existing.value().key() != &key {
                return Err(redefinition(name));
            }
        }

        let pool = AnalyzerPool::new(
            key,
            analyzer_type.features,
            analyzer_type.factory.clone(),
            self.config.max_pooled_instances,
        );
        let first = pool
            .create()
            .map_err(|e| ConfigError::new("properties", e.reason))?;
        pool.release(first);
        Ok(pool)
    }

    /// Publish a prepared pool under its name
    ///
    /// The first registration of a name wins; registering an identical
    /// definition again returns the winner.
    pub fn register(&self, pool: AnalyzerPool) -> Result<AnalyzerPool, ConfigError> {
        match self.by_name.entry(pool.name().to_string()) {
            Entry::Occupied(existing) => {
                if existing.get().key() == pool.key() {
                    Ok(existing.get().clone())
                } else {
                    Err(redefinition(pool.name()))
                }
            }
            Entry::Vacant(slot) => {
                debug!(analyzer = pool.name(), kind = pool.kind(), "Registered analyzer");
                slot.insert(pool.clone());
                self.by_key.insert(pool.key().clone(), pool.clone());
                Ok(pool)
            }
        }
    }

    /// Look up an already resolved analyzer by name
    pub fn lookup(&self, name: &str) -> Option<AnalyzerPool> {
        self.by_name.get(name).map(|pool| pool.clone())
    }

    /// The built-in pass-through analyzer
    pub fn identity(&self) -> Option<AnalyzerPool> {
        self.lookup(IDENTITY_ANALYZER)
    }

    /// Number of distinct analyzers resolved so far
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl Default for AnalyzerResolver {
    fn default() -> Self {
        Self::new(AnalyzerRegistry::with_builtins(), AnalyzerPoolConfig::default())
    }
}

impl fmt::Debug for AnalyzerResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerResolver")
            .field("analyzers", &self.by_name.len())
            .finish()
    }
}

fn redefinition(name: &str) -> ConfigError {
    ConfigError::new(
        "name",
        format!("analyzer '{}' is already defined differently", name),
    )
}

/// Compact JSON text with object keys sorted; non-JSON text is kept as is
fn canonical_properties(properties: &str) -> String {
    match serde_json::from_str::<Value>(properties) {
        Ok(value) => sort_keys(value).to_string(),
        Err(_) => properties.to_string(),
    }
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Analyzer names are embedded in field names after a control-character
/// delimiter, so they may not contain control characters themselves.
fn validate_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::new("name", "analyzer name must not be empty"));
    }
    if name.chars().any(char::is_control) {
        warn!(analyzer = ?name, "Rejected analyzer name with control characters");
        return Err(ConfigError::new(
            "name",
            "analyzer name must not contain control characters",
        ));
    }
    Ok(())
}
