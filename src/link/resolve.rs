use serde_json::Value;
use std::fmt;

use crate::analysis::{AnalyzerPool, AnalyzerResolver};
use crate::error::ConfigError;
use crate::link::meta::{LinkMeta, ValueStorage};

/// One step of a document path
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathSegment<'p> {
    Key(&'p str),
    Index(usize),
}

impl fmt::Display for PathSegment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// Fully merged configuration in effect at one path
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectiveMeta<'a> {
    pub analyzers: &'a [AnalyzerPool],
    pub include_all_fields: bool,
    pub track_list_positions: bool,
    pub store_values: ValueStorage,
    pub boost: f32,
}

impl<'a> EffectiveMeta<'a> {
    /// Apply the explicitly set properties of `node` on top of `self`
    pub fn merge(self, node: &'a LinkMeta) -> EffectiveMeta<'a> {
        EffectiveMeta {
            analyzers: node.analyzers.as_deref().unwrap_or(self.analyzers),
            include_all_fields: node.include_all_fields.unwrap_or(self.include_all_fields),
            track_list_positions: node
                .track_list_positions
                .unwrap_or(self.track_list_positions),
            store_values: node.store_values.unwrap_or(self.store_values),
            boost: node.boost.unwrap_or(self.boost),
        }
    }
}

/// A validated link configuration: the override tree plus root defaults
#[derive(Clone, Debug, PartialEq)]
pub struct LinkConfig {
    root: LinkMeta,
    default_analyzers: Vec<AnalyzerPool>,
}

impl LinkConfig {
    /// Wrap an override tree; unset root analyzers default to `identity`
    pub fn new(root: LinkMeta, resolver: &AnalyzerResolver) -> Self {
        Self {
            root,
            default_analyzers: resolver.identity().into_iter().collect(),
        }
    }

    /// Parse catalog JSON
    pub fn init(
        raw: &Value,
        resolver: &AnalyzerResolver,
        allow_definitions: bool,
    ) -> Result<Self, ConfigError> {
        let root = LinkMeta::from_json(raw, resolver, allow_definitions)?;
        Ok(Self::new(root, resolver))
    }

    /// Catalog JSON referring to analyzers by name
    pub fn to_json(&self) -> Value {
        self.root.to_json(false)
    }

    /// Catalog JSON with inline analyzer definitions
    pub fn to_json_with_definitions(&self) -> Value {
        self.root.to_json(true)
    }

    pub fn root(&self) -> &LinkMeta {
        &self.root
    }

    /// Effective configuration at the document root
    pub fn root_meta(&self) -> EffectiveMeta<'_> {
        EffectiveMeta {
            analyzers: &self.default_analyzers,
            include_all_fields: false,
            track_list_positions: false,
            store_values: ValueStorage::None,
            boost: 1.0,
        }
        .merge(&self.root)
    }

    /// Effective configuration at `path`
    ///
    /// Array indexes never select an override node, so all elements of an
    /// array resolve like the array itself.
    pub fn resolve(&self, path: &[PathSegment<'_>]) -> EffectiveMeta<'_> {
        self.walk(path).0
    }

    /// Whether a value at `path` would be visited by a traversal
    pub fn is_included(&self, path: &[PathSegment<'_>]) -> bool {
        self.walk(path).1
    }

    fn walk(&self, path: &[PathSegment<'_>]) -> (EffectiveMeta<'_>, bool) {
        let mut meta = self.root_meta();
        let mut node = Some(&self.root);
        let mut included = true;

        for segment in path {
            let PathSegment::Key(key) = segment else {
                continue;
            };
            match node.and_then(|n| n.field(key)) {
                Some(child) => {
                    meta = meta.merge(child);
                    node = Some(child);
                }
                None => {
                    included &= meta.include_all_fields;
                    node = None;
                }
            }
        }
        (meta, included)
    }
}
