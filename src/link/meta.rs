//! Link configuration override nodes and their catalog representation

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::analysis::{AnalyzerPool, AnalyzerResolver};
use crate::error::ConfigError;

/// How much of a value the index stores alongside its terms
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueStorage {
    /// Nothing stored (default)
    #[default]
    None,
    /// Only the value kind
    Id,
    /// The full value
    Full,
}

/// One node of the override tree
///
/// Every property is optional; `None` means "inherit from the parent" and is
/// also the mask used when writing the node back to catalog form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinkMeta {
    pub analyzers: Option<Vec<AnalyzerPool>>,
    pub include_all_fields: Option<bool>,
    pub track_list_positions: Option<bool>,
    pub store_values: Option<ValueStorage>,
    pub boost: Option<f32>,
    /// Overrides for child object keys
    pub fields: BTreeMap<String, LinkMeta>,
}

impl LinkMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_analyzers(mut self, analyzers: Vec<AnalyzerPool>) -> Self {
        self.analyzers = Some(dedup_by_name(analyzers));
        self
    }

    pub fn with_include_all_fields(mut self, include: bool) -> Self {
        self.include_all_fields = Some(include);
        self
    }

    pub fn with_track_list_positions(mut self, track: bool) -> Self {
        self.track_list_positions = Some(track);
        self
    }

    pub fn with_store_values(mut self, storage: ValueStorage) -> Self {
        self.store_values = Some(storage);
        self
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = Some(boost);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, meta: LinkMeta) -> Self {
        self.fields.insert(key.into(), meta);
        self
    }

    /// Override node for a child key
    pub fn field(&self, key: &str) -> Option<&LinkMeta> {
        self.fields.get(key)
    }

    /// Parse a node from catalog JSON
    ///
    /// Analyzer names must already be known to `resolver` or be defined
    /// inline elsewhere in the same tree. Inline definitions are accepted
    /// only when `allow_definitions` is set, and are registered with the
    /// resolver only once the whole tree has parsed.
    pub fn from_json(
        value: &Value,
        resolver: &AnalyzerResolver,
        allow_definitions: bool,
    ) -> Result<Self, ConfigError> {
        let mut parser = CatalogParser {
            resolver,
            allow_definitions,
            defined: BTreeMap::new(),
        };
        let mut meta = parser.node(value)?;
        let registered = parser.register()?;
        meta.rebind(&registered);
        Ok(meta)
    }

    /// Point analyzer handles at the pools the resolver published
    fn rebind(&mut self, registered: &BTreeMap<String, AnalyzerPool>) {
        if let Some(analyzers) = self.analyzers.as_mut() {
            for pool in analyzers.iter_mut() {
                if let Some(winner) = registered.get(pool.name()) {
                    *pool = winner.clone();
                }
            }
        }
        for child in self.fields.values_mut() {
            child.rebind(registered);
        }
    }

    /// Catalog form holding only the explicitly set properties
    pub fn to_json(&self, with_definitions: bool) -> Value {
        let mut object = Map::new();
        if let Some(include) = self.include_all_fields {
            object.insert("includeAllFields".to_string(), Value::Bool(include));
        }
        if let Some(track) = self.track_list_positions {
            object.insert("trackListPositions".to_string(), Value::Bool(track));
        }
        if let Some(storage) = self.store_values {
            let storage = serde_json::to_value(storage).unwrap_or(Value::Null);
            object.insert("storeValues".to_string(), storage);
        }
        if let Some(boost) = self.boost {
            object.insert("boost".to_string(), Value::from(f64::from(boost)));
        }
        if let Some(analyzers) = &self.analyzers {
            let list = analyzers
                .iter()
                .map(|pool| analyzer_to_json(pool, with_definitions))
                .collect();
            object.insert("analyzers".to_string(), Value::Array(list));
        }
        if !self.fields.is_empty() {
            let fields = self
                .fields
                .iter()
                .map(|(key, meta)| (key.clone(), meta.to_json(with_definitions)))
                .collect();
            object.insert("fields".to_string(), Value::Object(fields));
        }
        Value::Object(object)
    }
}

fn parse_bool(value: &Value) -> Result<bool, ConfigError> {
    value
        .as_bool()
        .ok_or_else(|| ConfigError::new("", "expected a boolean"))
}

fn parse_boost(value: &Value) -> Result<f32, ConfigError> {
    let boost = value
        .as_f64()
        .ok_or_else(|| ConfigError::new("", "expected a number"))?;
    let boost = boost as f32;
    if !boost.is_finite() {
        return Err(ConfigError::new("", "boost must be finite"));
    }
    Ok(boost)
}

struct CatalogParser<'r> {
    resolver: &'r AnalyzerResolver,
    allow_definitions: bool,
    /// Inline definitions seen so far, not yet visible in the resolver
    defined: BTreeMap<String, AnalyzerPool>,
}

impl CatalogParser<'_> {
    fn node(&mut self, value: &Value) -> Result<LinkMeta, ConfigError> {
        let object = value
            .as_object()
            .ok_or_else(|| ConfigError::new("", "expected an object"))?;

        let mut meta = LinkMeta::new();
        for (key, value) in object {
            match key.as_str() {
                "includeAllFields" => {
                    meta.include_all_fields = Some(parse_bool(value).map_err(|e| e.nested(key))?);
                }
                "trackListPositions" => {
                    meta.track_list_positions =
                        Some(parse_bool(value).map_err(|e| e.nested(key))?);
                }
                "storeValues" => {
                    let storage = ValueStorage::deserialize(value).map_err(|_| {
                        ConfigError::new(key.as_str(), "expected one of \"none\", \"id\", \"full\"")
                    })?;
                    meta.store_values = Some(storage);
                }
                "boost" => {
                    meta.boost = Some(parse_boost(value).map_err(|e| e.nested(key))?);
                }
                "analyzers" => {
                    let analyzers = self.analyzers(value).map_err(|e| e.nested(key))?;
                    meta.analyzers = Some(analyzers);
                }
                "fields" => {
                    let fields = value
                        .as_object()
                        .ok_or_else(|| ConfigError::new(key.as_str(), "expected an object"))?;
                    for (child, child_value) in fields {
                        let child_meta = self
                            .node(child_value)
                            .map_err(|e| e.nested(child).nested(key))?;
                        meta.fields.insert(child.clone(), child_meta);
                    }
                }
                other => {
                    return Err(ConfigError::new(other, "unknown configuration key"));
                }
            }
        }
        Ok(meta)
    }

    fn analyzers(&mut self, value: &Value) -> Result<Vec<AnalyzerPool>, ConfigError> {
        let entries = value
            .as_array()
            .ok_or_else(|| ConfigError::new("", "expected an array"))?;

        let mut analyzers = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let pool = self
                .analyzer(entry)
                .map_err(|e| e.nested(&format!("[{}]", i)))?;
            analyzers.push(pool);
        }
        Ok(dedup_by_name(analyzers))
    }

    fn analyzer(&mut self, entry: &Value) -> Result<AnalyzerPool, ConfigError> {
        match entry {
            Value::String(name) => self
                .defined
                .get(name)
                .cloned()
                .or_else(|| self.resolver.lookup(name))
                .ok_or_else(|| ConfigError::new("", format!("unknown analyzer '{}'", name))),
            Value::Object(definition) if self.allow_definitions => {
                let mut name = None;
                let mut kind = None;
                let mut properties = String::new();
                for (key, value) in definition {
                    match key.as_str() {
                        "name" => name = value.as_str(),
                        "type" => kind = value.as_str(),
                        "properties" => properties = value.to_string(),
                        other => return Err(ConfigError::new(other, "unknown analyzer key")),
                    }
                }
                let name = name.ok_or_else(|| ConfigError::new("name", "expected a string"))?;
                let kind = kind.ok_or_else(|| ConfigError::new("type", "expected a string"))?;
                let pool = self.resolver.prepare(name, kind, &properties)?;

                match self.defined.get(name) {
                    Some(earlier) if earlier.key() != pool.key() => Err(ConfigError::new(
                        "name",
                        format!("analyzer '{}' is defined twice differently", name),
                    )),
                    Some(earlier) => Ok(earlier.clone()),
                    None => {
                        self.defined.insert(name.to_string(), pool.clone());
                        Ok(pool)
                    }
                }
            }
            Value::Object(_) => Err(ConfigError::new(
                "",
                "analyzer definitions are not allowed here",
            )),
            _ => Err(ConfigError::new("", "expected an analyzer name")),
        }
    }

    /// Publish the inline definitions; returns the pools now registered
    fn register(self) -> Result<BTreeMap<String, AnalyzerPool>, ConfigError> {
        let mut registered = BTreeMap::new();
        for (name, pool) in self.defined {
            let winner = self
                .resolver
                .register(pool)
                .map_err(|e| e.nested("analyzers"))?;
            registered.insert(name, winner);
        }
        Ok(registered)
    }
}

fn analyzer_to_json(pool: &AnalyzerPool, with_definitions: bool) -> Value {
    if !with_definitions {
        return Value::String(pool.name().to_string());
    }
    let mut definition = Map::new();
    definition.insert("name".to_string(), Value::String(pool.name().to_string()));
    definition.insert("type".to_string(), Value::String(pool.kind().to_string()));
    if !pool.properties().is_empty() {
        if let Ok(properties) = serde_json::from_str::<Value>(pool.properties()) {
            definition.insert("properties".to_string(), properties);
        }
    }
    Value::Object(definition)
}

/// Analyzer lists are ordered sets keyed by name; the first occurrence wins
fn dedup_by_name(analyzers: Vec<AnalyzerPool>) -> Vec<AnalyzerPool> {
    let mut unique: Vec<AnalyzerPool> = Vec::with_capacity(analyzers.len());
    for pool in analyzers {
        if !unique.iter().any(|p| p.name() == pool.name()) {
            unique.push(pool);
        }
    }
    unique
}
