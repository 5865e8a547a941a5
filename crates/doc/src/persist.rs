use crate::error::{DocError, Result};
use crate::graph::{MarshalContext, UnmarshalContext};
use crate::reader::XmlReader;
use crate::writer::XmlWriter;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// An identity-tracked node of the object graph.
///
/// Two fields holding clones of the same `Shared<T>` are written once and
/// referenced afterwards; decoding restores a single `Arc` for both.
pub type Shared<T> = Arc<RwLock<T>>;

pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}

/// Identity of a shared node for the duration of one encode pass.
pub fn identity_of<T>(node: &Shared<T>) -> usize {
    Arc::as_ptr(node) as *const () as usize
}

/// Structural codec for a type.
///
/// `marshal` writes into the element the caller has already opened (it adds
/// attributes, text or children), and `unmarshal` reads from the element the
/// reader is positioned at. Absent optional fields are simply not written.
pub trait Persist: Sized {
    /// Element name used when values of this type appear in a sequence.
    const ALIAS: &'static str;

    /// True for types that resolve `reference` markers on their own
    /// elements. Markers on any other type are followed by the context.
    const TRACKS_IDENTITY: bool = false;

    /// Element name for this particular value inside a sequence.
    fn element_name(&self) -> &'static str {
        Self::ALIAS
    }

    fn marshal(&self, writer: &mut XmlWriter, ctx: &mut MarshalContext<'_>) -> Result<()>;

    fn unmarshal(reader: &XmlReader<'_>, ctx: &mut UnmarshalContext<'_>) -> Result<Self>;
}

/// A type that can be the root of a document.
pub trait Root: Persist {
    const ELEMENT: &'static str;
}

/// Marker element for an absent slot inside a sequence.
pub const NULL_ELEMENT: &str = "null";

impl Persist for String {
    const ALIAS: &'static str = "string";

    fn marshal(&self, writer: &mut XmlWriter, _ctx: &mut MarshalContext<'_>) -> Result<()> {
        writer.set_value(self.as_str());
        Ok(())
    }

    fn unmarshal(reader: &XmlReader<'_>, _ctx: &mut UnmarshalContext<'_>) -> Result<Self> {
        Ok(reader.value().unwrap_or_default().to_string())
    }
}

macro_rules! persist_number {
    ($($ty:ty => $alias:literal),* $(,)?) => {
        $(
            impl Persist for $ty {
                const ALIAS: &'static str = $alias;

                fn marshal(&self, writer: &mut XmlWriter, _ctx: &mut MarshalContext<'_>) -> Result<()> {
                    writer.set_value(self.to_string());
                    Ok(())
                }

                fn unmarshal(reader: &XmlReader<'_>, _ctx: &mut UnmarshalContext<'_>) -> Result<Self> {
                    let raw = reader.value().unwrap_or_default().trim();
                    raw.parse()
                        .map_err(|_| DocError::invalid_value(reader.path().to_string(), raw))
                }
            }
        )*
    };
}

persist_number!(u32 => "int", u64 => "long", i64 => "long");

impl Persist for bool {
    const ALIAS: &'static str = "boolean";

    fn marshal(&self, writer: &mut XmlWriter, _ctx: &mut MarshalContext<'_>) -> Result<()> {
        writer.set_value(if *self { "true" } else { "false" });
        Ok(())
    }

    fn unmarshal(reader: &XmlReader<'_>, _ctx: &mut UnmarshalContext<'_>) -> Result<Self> {
        match reader.value().unwrap_or_default().trim() {
            "true" => Ok(true),
            "false" | "" => Ok(false),
            other => Err(DocError::invalid_value(reader.path().to_string(), other)),
        }
    }
}

/// `None` writes nothing into its element and is named [`NULL_ELEMENT`]
/// inside sequences, so `Vec<Option<T>>` keeps its gaps.
impl<T: Persist> Persist for Option<T> {
    const ALIAS: &'static str = T::ALIAS;
    const TRACKS_IDENTITY: bool = T::TRACKS_IDENTITY;

    fn element_name(&self) -> &'static str {
        match self {
            Some(value) => value.element_name(),
            None => NULL_ELEMENT,
        }
    }

    fn marshal(&self, writer: &mut XmlWriter, ctx: &mut MarshalContext<'_>) -> Result<()> {
        match self {
            Some(value) => ctx.convert_another(value, writer),
            None => Ok(()),
        }
    }

    fn unmarshal(reader: &XmlReader<'_>, ctx: &mut UnmarshalContext<'_>) -> Result<Self> {
        if reader.name() == NULL_ELEMENT {
            return Ok(None);
        }
        ctx.convert_another(reader).map(Some)
    }
}

impl<T: Persist> Persist for Vec<T> {
    const ALIAS: &'static str = "list";

    fn marshal(&self, writer: &mut XmlWriter, ctx: &mut MarshalContext<'_>) -> Result<()> {
        for item in self {
            ctx.write_field(writer, item.element_name(), item)?;
        }
        Ok(())
    }

    fn unmarshal(reader: &XmlReader<'_>, ctx: &mut UnmarshalContext<'_>) -> Result<Self> {
        reader
            .children()
            .map(|child| ctx.convert_another(&child))
            .collect()
    }
}

impl<T: Persist> Persist for Box<T> {
    const ALIAS: &'static str = T::ALIAS;
    const TRACKS_IDENTITY: bool = T::TRACKS_IDENTITY;

    fn element_name(&self) -> &'static str {
        self.as_ref().element_name()
    }

    fn marshal(&self, writer: &mut XmlWriter, ctx: &mut MarshalContext<'_>) -> Result<()> {
        ctx.convert_another(self.as_ref(), writer)
    }

    fn unmarshal(reader: &XmlReader<'_>, ctx: &mut UnmarshalContext<'_>) -> Result<Self> {
        ctx.convert_another(reader).map(Box::new)
    }
}

/// Shared nodes first go to a registered converter claiming exactly `T`.
/// Without one, the generic identity protocol applies: repeated instances
/// become reference markers, and new instances are registered before their
/// children are decoded so that cycles resolve to the partially built node.
impl<T> Persist for Shared<T>
where
    T: Persist + Default + Send + Sync + 'static,
{
    const ALIAS: &'static str = T::ALIAS;
    const TRACKS_IDENTITY: bool = true;

    fn marshal(&self, writer: &mut XmlWriter, ctx: &mut MarshalContext<'_>) -> Result<()> {
        if let Some(converter) = ctx.converter_for(TypeId::of::<T>()) {
            return converter.marshal(self as &dyn Any, writer, ctx);
        }

        let identity = identity_of(self);
        if let Some(node) = ctx.written(identity).cloned() {
            ctx.write_reference(&node, writer);
            return Ok(());
        }
        ctx.register(identity, writer);

        let value = self.read();
        value.marshal(writer, ctx)
    }

    fn unmarshal(reader: &XmlReader<'_>, ctx: &mut UnmarshalContext<'_>) -> Result<Self> {
        if let Some(converter) = ctx.converter_for(TypeId::of::<T>()) {
            let decoded = converter.unmarshal(reader, ctx)?;
            return decoded.downcast::<Shared<T>>().map(|node| *node).map_err(|_| {
                DocError::converter(format!(
                    "converter {} returned an object of the wrong type",
                    converter.name()
                ))
            });
        }

        if ctx.is_reference(reader) {
            return ctx.resolve(reader);
        }

        let node = shared(T::default());
        ctx.register(reader, &node);
        let value = T::unmarshal(reader, ctx)?;
        *node.write() = value;
        Ok(node)
    }
}

impl<T> Root for Shared<T>
where
    T: Root + Default + Send + Sync + 'static,
{
    const ELEMENT: &'static str = T::ELEMENT;
}
