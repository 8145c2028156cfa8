//! Link configuration: which parts of a document are indexed, and how
//!
//! A configuration is an immutable tree of override nodes keyed by object
//! key. Properties not set on a node are inherited from its parent.

pub mod meta;
pub mod resolve;

pub use meta::{LinkMeta, ValueStorage};
pub use resolve::{EffectiveMeta, LinkConfig, PathSegment};
