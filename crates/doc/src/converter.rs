use crate::error::Result;
use crate::graph::{MarshalContext, UnmarshalContext};
use crate::reader::XmlReader;
use crate::writer::XmlWriter;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Custom encoding for shared objects of specific types.
///
/// A converter replaces the structural [`Persist`](crate::Persist) codec for
/// every `Shared<T>` whose `TypeId::of::<T>()` it claims. Claims are matched
/// on exact type identity; there is no notion of "is-a".
///
/// `marshal` receives the `Shared<T>` handle as `&dyn Any` and `unmarshal`
/// must return a boxed `Shared<T>`. Converters own the identity protocol for
/// the types they claim: they consult the graph context for already-written
/// or already-materialized instances themselves.
pub trait Converter: Send + Sync {
    /// Whether this converter handles objects of exactly `ty`.
    fn can_convert(&self, ty: TypeId) -> bool;

    fn marshal(
        &self,
        source: &dyn Any,
        writer: &mut XmlWriter,
        ctx: &mut MarshalContext<'_>,
    ) -> Result<()>;

    fn unmarshal(
        &self,
        reader: &XmlReader<'_>,
        ctx: &mut UnmarshalContext<'_>,
    ) -> Result<Box<dyn Any>>;

    /// Short name used in log lines.
    fn name(&self) -> &str {
        "converter"
    }
}

/// Ordered set of converters; later registrations take precedence.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: Vec<Arc<dyn Converter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<C>(&mut self, converter: C)
    where
        C: Converter + 'static,
    {
        log::debug!("registering converter {}", converter.name());
        self.converters.push(Arc::new(converter));
    }

    /// Most recently registered converter claiming exactly `ty`.
    pub fn lookup(&self, ty: TypeId) -> Option<Arc<dyn Converter>> {
        self.converters
            .iter()
            .rev()
            .find(|converter| converter.can_convert(ty))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.converters.iter().map(|c| c.name()))
            .finish()
    }
}
