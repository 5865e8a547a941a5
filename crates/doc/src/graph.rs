//! Pass-scoped graph contexts.
//!
//! One [`MarshalContext`] or [`UnmarshalContext`] exists per encode or decode
//! pass. They hold the identity tables that turn repeated occurrences of a
//! shared object into reference markers on write, and reference markers back
//! into the same `Arc` on read. Nothing here is global: two passes running
//! concurrently over graphs that share objects number them independently.

use crate::config::{DocConfig, ReferenceStyle};
use crate::converter::{Converter, ConverterRegistry};
use crate::element::Element;
use crate::error::{DocError, Result};
use crate::path::NodePath;
use crate::persist::{Persist, Shared};
use crate::reader::XmlReader;
use crate::writer::XmlWriter;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Attribute carrying the id assigned to a shared object on first write.
pub const ID_ATTRIBUTE: &str = "id";

/// Attribute marking an element as a reference to an earlier object.
pub const REFERENCE_ATTRIBUTE: &str = "reference";

/// Where a shared object was first written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenNode {
    pub id: u64,
    pub path: NodePath,
}

/// Encode-side identity table.
pub struct MarshalContext<'c> {
    registry: &'c ConverterRegistry,
    config: &'c DocConfig,
    written: HashMap<usize, WrittenNode>,
    next_id: u64,
}

impl<'c> MarshalContext<'c> {
    pub fn new(registry: &'c ConverterRegistry, config: &'c DocConfig) -> Self {
        Self {
            registry,
            config,
            written: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn config(&self) -> &DocConfig {
        self.config
    }

    pub fn converter_for(&self, ty: TypeId) -> Option<Arc<dyn Converter>> {
        self.registry.lookup(ty)
    }

    /// The earlier write of the object with this identity, if any.
    pub fn written(&self, identity: usize) -> Option<&WrittenNode> {
        self.written.get(&identity)
    }

    pub fn written_count(&self) -> usize {
        self.written.len()
    }

    /// Record that the object with `identity` is being written at the
    /// writer's current node, assigning it the next id.
    pub fn register(&mut self, identity: usize, writer: &mut XmlWriter) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        if self.config.reference_style == ReferenceStyle::Id {
            writer.add_attribute(ID_ATTRIBUTE, id.to_string());
        }
        self.written.insert(
            identity,
            WrittenNode {
                id,
                path: writer.path(),
            },
        );
        id
    }

    /// Mark the writer's current node as a reference to `node`.
    pub fn write_reference(&self, node: &WrittenNode, writer: &mut XmlWriter) {
        let marker = match self.config.reference_style {
            ReferenceStyle::Id => node.id.to_string(),
            ReferenceStyle::RelativePath => node.path.relative_from(&writer.path()),
        };
        writer.add_attribute(REFERENCE_ATTRIBUTE, marker);
    }

    /// Encode `value` into the writer's current node.
    pub fn convert_another<T: Persist>(&mut self, value: &T, writer: &mut XmlWriter) -> Result<()> {
        if writer.depth() > self.config.max_depth {
            return Err(DocError::DepthExceeded(self.config.max_depth));
        }
        value.marshal(writer, self)
    }

    /// Encode `value` as a child element named `name`.
    pub fn write_field<T: Persist>(
        &mut self,
        writer: &mut XmlWriter,
        name: &str,
        value: &T,
    ) -> Result<()> {
        writer.start_node(name);
        self.convert_another(value, writer)?;
        writer.end_node()
    }

    /// Encode `value` as a child element named `name`, or nothing when absent.
    pub fn write_optional<T: Persist>(
        &mut self,
        writer: &mut XmlWriter,
        name: &str,
        value: Option<&T>,
    ) -> Result<()> {
        match value {
            Some(value) => self.write_field(writer, name, value),
            None => Ok(()),
        }
    }
}

type Materialized = Arc<dyn Any + Send + Sync>;

/// Decode-side identity table.
///
/// Shared nodes are materialized once and handed out again for every marker
/// that points at them. Plain values have no identity; a marker on a value
/// element is followed into the document and the target decoded in place,
/// which needs the document attached with [`UnmarshalContext::with_document`].
pub struct UnmarshalContext<'c> {
    registry: &'c ConverterRegistry,
    config: &'c DocConfig,
    document: Option<&'c Element>,
    by_id: HashMap<String, Materialized>,
    by_path: HashMap<NodePath, Materialized>,
    following: Vec<NodePath>,
}

impl<'c> UnmarshalContext<'c> {
    pub fn new(registry: &'c ConverterRegistry, config: &'c DocConfig) -> Self {
        Self {
            registry,
            config,
            document: None,
            by_id: HashMap::new(),
            by_path: HashMap::new(),
            following: Vec::new(),
        }
    }

    /// Attach the root of the document being decoded.
    pub fn with_document(mut self, root: &'c Element) -> Self {
        self.document = Some(root);
        self
    }

    pub fn config(&self) -> &DocConfig {
        self.config
    }

    pub fn converter_for(&self, ty: TypeId) -> Option<Arc<dyn Converter>> {
        self.registry.lookup(ty)
    }

    pub fn materialized_count(&self) -> usize {
        self.by_path.len()
    }

    /// True when the element is a reference marker rather than a body.
    pub fn is_reference(&self, reader: &XmlReader<'_>) -> bool {
        reader.attribute(REFERENCE_ATTRIBUTE).is_some()
    }

    /// Resolve a reference marker to the instance materialized earlier in
    /// this pass. Id references are tried first, then relative paths.
    pub fn resolve<T>(&self, reader: &XmlReader<'_>) -> Result<Shared<T>>
    where
        T: Send + Sync + 'static,
    {
        let reference = reader.attribute(REFERENCE_ATTRIBUTE).unwrap_or_default();
        let unresolved = || DocError::UnresolvedReference {
            reference: reference.to_string(),
            path: reader.path().to_string(),
        };

        let found = match self.by_id.get(reference) {
            Some(found) => found,
            None => {
                let target = reader.path().resolve(reference).ok_or_else(unresolved)?;
                self.by_path.get(&target).ok_or_else(unresolved)?
            }
        };

        found
            .downcast_ref::<Shared<T>>()
            .cloned()
            .ok_or_else(|| DocError::ReferenceTypeMismatch(reference.to_string()))
    }

    /// Decode the element a reference marker on a value points at.
    ///
    /// The marker is tried as an `id` first, then as a path. Following a
    /// marker back into an element already being followed fails, as does
    /// any marker when no document is attached.
    pub fn follow_reference<T, F>(&mut self, reader: &XmlReader<'_>, decode: F) -> Result<T>
    where
        F: FnOnce(&XmlReader<'c>, &mut Self) -> Result<T>,
    {
        let reference = reader.attribute(REFERENCE_ATTRIBUTE).unwrap_or_default();
        let unresolved = || DocError::UnresolvedReference {
            reference: reference.to_string(),
            path: reader.path().to_string(),
        };

        let document = self.document.ok_or_else(unresolved)?;
        let target = match XmlReader::find_by_attribute(document, ID_ATTRIBUTE, reference) {
            Some(target) => target,
            None => {
                let path = reader.path().resolve(reference).ok_or_else(unresolved)?;
                XmlReader::locate(document, &path).ok_or_else(unresolved)?
            }
        };
        if self.following.contains(target.path()) {
            return Err(unresolved());
        }

        self.following.push(target.path().clone());
        let decoded = decode(&target, self);
        self.following.pop();
        decoded
    }

    /// Record `node` as the instance materialized from the reader's element,
    /// under its path and, when present, its `id` attribute.
    pub fn register<T>(&mut self, reader: &XmlReader<'_>, node: &Shared<T>)
    where
        T: Send + Sync + 'static,
    {
        let materialized: Materialized = Arc::new(Arc::clone(node));
        if let Some(id) = reader.attribute(ID_ATTRIBUTE) {
            self.by_id.insert(id.to_string(), Arc::clone(&materialized));
        }
        self.by_path.insert(reader.path().clone(), materialized);
    }

    /// Decode the reader's element as a `T`.
    pub fn convert_another<T: Persist>(&mut self, reader: &XmlReader<'_>) -> Result<T> {
        if reader.depth() > self.config.max_depth {
            return Err(DocError::DepthExceeded(self.config.max_depth));
        }
        if !T::TRACKS_IDENTITY && self.is_reference(reader) {
            return self.follow_reference(reader, |target, ctx| ctx.convert_another(target));
        }
        T::unmarshal(reader, self)
    }

    /// Decode the first child named `name`, if present.
    pub fn read_field<T: Persist>(&mut self, reader: &XmlReader<'_>, name: &str) -> Result<Option<T>> {
        reader
            .child(name)
            .map(|child| self.convert_another(&child))
            .transpose()
    }

    /// Decode the first child named `name`, failing when it is absent.
    pub fn read_required<T: Persist>(&mut self, reader: &XmlReader<'_>, name: &str) -> Result<T> {
        self.read_field(reader, name)?
            .ok_or_else(|| DocError::missing(name, reader.path()))
    }
}
