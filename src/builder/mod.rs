//! Fluent builders for leaves and trees
//!
//! Builders collect a node's definition and validate it once, in `build`.
//! Mistakes made while chaining (an attribute declared twice, a default the
//! type rejects) are remembered and reported by `build` instead of panicking
//! in the middle of a chain.
//!
//! ```
//! use fiberconf::builder::ConfigTreeBuilder;
//! use fiberconf::schema::types;
//!
//! # fn main() -> fiberconf::Result<()> {
//! let mut builder = ConfigTreeBuilder::new();
//! builder
//!     .begin_value("fov", &types::integer().with_minimum(30)?.with_maximum(110)?, 90)
//!     .with_comment("Field of view, in degrees")
//!     .finish_value()?
//!     .fork("audio", |audio| {
//!         audio.begin_value("muted", &types::boolean(), false).finish_value()?;
//!         Ok(())
//!     })?;
//! let root = builder.build()?;
//!
//! assert!(root.lookup_leaf("audio.muted").is_some());
//! # Ok(())
//! # }
//! ```

mod leaf;
mod tree;

pub use leaf::ConfigLeafBuilder;
pub use tree::ConfigTreeBuilder;

use crate::error::{Error, Result};
use crate::schema::{ConfigType, ConfigValue, DerivedType, TypeKind};
use crate::tree::{ConfigAttribute, FiberId, NodeBase};

/// Name, comment and attributes shared by every builder
#[derive(Debug)]
pub(crate) struct NodeSpec {
    name: String,
    comment: Option<String>,
    attributes: Vec<ConfigAttribute>,
    /// First mistake made while chaining, reported at build time
    error: Option<Error>,
}

impl NodeSpec {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: None,
            attributes: Vec::new(),
            error: None,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = Some(comment.into());
    }

    pub(crate) fn record(&mut self, error: Error) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub(crate) fn add_attribute(&mut self, attribute: Result<ConfigAttribute>) {
        match attribute {
            Ok(attribute) if self.attributes.iter().any(|a| a.id() == attribute.id()) => {
                self.record(Error::DuplicateAttribute {
                    node: self.name.clone(),
                    id: attribute.id().to_string(),
                });
            }
            Ok(attribute) => self.attributes.push(attribute),
            Err(e) => self.record(e),
        }
    }

    pub(crate) fn attribute(&mut self, id: FiberId, ty: impl Into<ConfigType>, value: ConfigValue) {
        self.add_attribute(ConfigAttribute::new(id, ty, value));
    }

    pub(crate) fn typed_attribute<A: 'static, K: TypeKind>(
        &mut self,
        id: FiberId,
        ty: &DerivedType<A, K>,
        value: &A,
    ) {
        self.add_attribute(ConfigAttribute::of(id, ty, value));
    }

    /// Surface the first recorded mistake, or produce the node state
    pub(crate) fn into_base(self) -> Result<NodeBase> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(NodeBase::new(self.name, self.comment, self.attributes))
    }
}
