//! Pre-order traversal of a document into indexable fields

use serde_json::Value;
use std::iter::Enumerate;
use std::slice;
use tracing::{debug, warn};

use crate::analysis::{BooleanTokenStream, Features, NullTokenStream, NumericTokenStream, TokenStream};
use crate::document::field::{Field, FieldTokens};
use crate::document::mangle::{self, ValueKind};
use crate::link::{EffectiveMeta, LinkConfig, LinkMeta};

/// Traversal state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IteratorState {
    Uninitialized,
    Traversing,
    Exhausted,
}

enum Children<'a> {
    Object(serde_json::map::Iter<'a>),
    Array(Enumerate<slice::Iter<'a, Value>>),
}

struct Frame<'a> {
    children: Children<'a>,
    meta: EffectiveMeta<'a>,
    node: Option<&'a LinkMeta>,
    /// Length of the container's own path
    path_len: usize,
    /// Whether the container's path has at least one segment
    named: bool,
}

/// A scalar awaiting emission, one field per analyzer
struct Leaf<'a> {
    value: &'a Value,
    meta: EffectiveMeta<'a>,
    next_analyzer: usize,
}

enum Step<'a> {
    Done,
    Skip,
    Enter(&'a Value, EffectiveMeta<'a>, Option<&'a LinkMeta>, bool),
}

/// Single-pass cursor over the fields of one document
///
/// ```ignore
/// let mut it = FieldIterator::new();
/// it.reset(&doc, &config);
/// while it.valid() {
///     let field = it.field_mut().unwrap();
///     // index field
///     it.advance();
/// }
/// ```
pub struct FieldIterator<'a> {
    state: IteratorState,
    root: Option<&'a Value>,
    config: Option<&'a LinkConfig>,
    stack: Vec<Frame<'a>>,
    leaf: Option<Leaf<'a>>,
    path: String,
    current: Option<Field>,
    /// Fields emitted since the last reset
    position: usize,
}

impl<'a> FieldIterator<'a> {
    pub fn new() -> Self {
        Self {
            state: IteratorState::Uninitialized,
            root: None,
            config: None,
            stack: Vec::new(),
            leaf: None,
            path: String::new(),
            current: None,
            position: 0,
        }
    }

    /// Start a traversal of `root`, discarding any previous one
    pub fn reset(&mut self, root: &'a Value, config: &'a LinkConfig) {
        self.stack.clear();
        self.leaf = None;
        self.path.clear();
        self.current = None;
        self.position = 0;
        self.root = Some(root);
        self.config = Some(config);
        self.state = IteratorState::Traversing;

        self.enter(root, config.root_meta(), Some(config.root()), false);
        if !self.next_field() {
            self.finish();
        }
    }

    pub fn state(&self) -> IteratorState {
        self.state
    }

    /// Whether a current field is available
    pub fn valid(&self) -> bool {
        self.state == IteratorState::Traversing
    }

    /// Move to the next field; returns `false` once exhausted
    pub fn advance(&mut self) -> bool {
        if self.state != IteratorState::Traversing {
            return false;
        }
        // return the previous analyzer instance before leasing the next one
        self.current = None;
        if self.next_field() {
            self.position += 1;
            true
        } else {
            self.finish();
            false
        }
    }

    pub fn field(&self) -> Option<&Field> {
        self.current.as_ref()
    }

    pub fn field_mut(&mut self) -> Option<&mut Field> {
        self.current.as_mut()
    }

    fn finish(&mut self) {
        self.state = IteratorState::Exhausted;
        self.stack.clear();
        self.leaf = None;
        self.current = None;
        self.root = None;
        self.config = None;
    }

    fn next_field(&mut self) -> bool {
        loop {
            if self.leaf.is_some() {
                if self.emit_leaf() {
                    return true;
                }
                self.leaf = None;
            }

            let Some(frame) = self.stack.last_mut() else {
                return false;
            };
            match next_child(frame, &mut self.path) {
                Step::Done => {
                    self.stack.pop();
                }
                Step::Skip => {}
                Step::Enter(value, meta, node, named) => self.enter(value, meta, node, named),
            }
        }
    }

    /// `named` is false while the path holds no segment yet
    fn enter(
        &mut self,
        value: &'a Value,
        meta: EffectiveMeta<'a>,
        node: Option<&'a LinkMeta>,
        named: bool,
    ) {
        let children = match value {
            Value::Object(map) if !map.is_empty() => Children::Object(map.iter()),
            Value::Array(elements) if !elements.is_empty() => {
                Children::Array(elements.iter().enumerate())
            }
            Value::Object(_) | Value::Array(_) => return,
            _ => {
                if named && !meta.analyzers.is_empty() {
                    self.leaf = Some(Leaf {
                        value,
                        meta,
                        next_analyzer: 0,
                    });
                }
                return;
            }
        };
        self.stack.push(Frame {
            children,
            meta,
            node,
            path_len: self.path.len(),
            named,
        });
    }

    fn emit_leaf(&mut self) -> bool {
        let Some(leaf) = self.leaf.as_mut() else {
            return false;
        };
        let meta = leaf.meta;

        let (kind, tokens, features) = match leaf.value {
            Value::String(text) => {
                let mut emitted = None;
                while let Some(pool) = meta.analyzers.get(leaf.next_analyzer) {
                    leaf.next_analyzer += 1;
                    let mut stream = match pool.acquire() {
                        Ok(stream) => stream,
                        Err(err) => {
                            warn!(field = %self.path, error = %err, "Skipping analyzer");
                            continue;
                        }
                    };
                    if !stream.reset(text) {
                        debug!(field = %self.path, analyzer = pool.name(), "Analyzer rejected value");
                        continue;
                    }
                    emitted = Some((
                        ValueKind::String,
                        FieldTokens::Analyzer(stream),
                        pool.features(),
                    ));
                    break;
                }
                match emitted {
                    Some(emitted) => emitted,
                    None => return false,
                }
            }
            scalar => {
                if leaf.next_analyzer > 0 {
                    return false;
                }
                leaf.next_analyzer = meta.analyzers.len();
                match primitive_tokens(scalar) {
                    Some((kind, tokens)) => (kind, tokens, Features::EMPTY),
                    None => return false,
                }
            }
        };

        let analyzer = match &tokens {
            FieldTokens::Analyzer(stream) => stream.pool().name(),
            _ => "",
        };
        let name = mangle::field_name(&self.path, kind, analyzer);
        self.current = Some(Field {
            name,
            kind,
            tokens,
            features,
            boost: meta.boost,
            store_values: meta.store_values,
        });
        true
    }
}

impl Default for FieldIterator<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterators at the end of a traversal (or never started) compare equal;
/// active ones only when positioned on the same field of the same document
/// under the same configuration.
impl PartialEq for FieldIterator<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self.state, other.state) {
            (IteratorState::Traversing, IteratorState::Traversing) => {
                let same_root = match (self.root, other.root) {
                    (Some(a), Some(b)) => std::ptr::eq(a, b),
                    _ => false,
                };
                let same_config = match (self.config, other.config) {
                    (Some(a), Some(b)) => std::ptr::eq(a, b),
                    _ => false,
                };
                same_root && same_config && self.position == other.position
            }
            (IteratorState::Traversing, _) | (_, IteratorState::Traversing) => false,
            _ => true,
        }
    }
}

fn next_child<'a>(frame: &mut Frame<'a>, path: &mut String) -> Step<'a> {
    path.truncate(frame.path_len);
    match &mut frame.children {
        Children::Object(entries) => {
            let Some((key, value)) = entries.next() else {
                return Step::Done;
            };
            let (meta, node) = match frame.node.and_then(|n| n.field(key)) {
                Some(child) => (frame.meta.merge(child), Some(child)),
                None if frame.meta.include_all_fields => (frame.meta, None),
                None => return Step::Skip,
            };
            mangle::push_key(path, key, frame.named);
            Step::Enter(value, meta, node, true)
        }
        Children::Array(elements) => {
            let Some((index, value)) = elements.next() else {
                return Step::Done;
            };
            let tracked = frame.meta.track_list_positions;
            if tracked {
                mangle::push_index(path, index);
            }
            Step::Enter(value, frame.meta, frame.node, frame.named || tracked)
        }
    }
}

fn primitive_tokens(value: &Value) -> Option<(ValueKind, FieldTokens)> {
    match value {
        Value::Null => Some((ValueKind::Null, FieldTokens::Null(NullTokenStream::new()))),
        Value::Bool(b) => Some((
            ValueKind::Bool,
            FieldTokens::Boolean(BooleanTokenStream::new(*b)),
        )),
        Value::Number(n) => {
            let number = n.as_f64().unwrap_or(f64::NAN);
            Some((
                ValueKind::Number,
                FieldTokens::Numeric(NumericTokenStream::new(number)),
            ))
        }
        _ => None,
    }
}
