use crate::context::{TriggerContext, EVENT, OTHERS, THIS_BUILD};
use crate::item::ItemReference;
use crate::legacy;
use std::any::{Any, TypeId};
use trigger_doc::{
    identity_of, shared, Converter, DocError, MarshalContext, Persist, Result, Shared,
    UnmarshalContext, XmlReader, XmlWriter,
};

/// Converter for [`TriggerContext`] fields.
///
/// Writes the current layout only: `event`, `thisBuild`, then `others` with
/// one `itemReference` per present slot. Reads every layout [`legacy`]
/// recognizes. Claims exactly `TriggerContext`; wrapper types fall back to
/// their own structural encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextCodec;

impl ContextCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Converter for ContextCodec {
    fn can_convert(&self, ty: TypeId) -> bool {
        ty == TypeId::of::<TriggerContext>()
    }

    fn marshal(
        &self,
        source: &dyn Any,
        writer: &mut XmlWriter,
        ctx: &mut MarshalContext<'_>,
    ) -> Result<()> {
        let node = source
            .downcast_ref::<Shared<TriggerContext>>()
            .ok_or_else(|| DocError::converter("expected a shared trigger context"))?;

        let identity = identity_of(node);
        if let Some(written) = ctx.written(identity).cloned() {
            ctx.write_reference(&written, writer);
            return Ok(());
        }
        ctx.register(identity, writer);

        let context = node.read();
        ctx.write_optional(writer, EVENT, context.event())?;
        ctx.write_optional(writer, THIS_BUILD, context.this_build())?;
        if context.has_others() {
            writer.start_node(OTHERS);
            for other in context.others() {
                ctx.write_field(writer, ItemReference::ALIAS, other)?;
            }
            writer.end_node()?;
        }
        Ok(())
    }

    fn unmarshal(
        &self,
        reader: &XmlReader<'_>,
        ctx: &mut UnmarshalContext<'_>,
    ) -> Result<Box<dyn Any>> {
        if ctx.is_reference(reader) {
            let existing: Shared<TriggerContext> = ctx.resolve(reader)?;
            return Ok(Box::new(existing));
        }

        let node = shared(TriggerContext::default());
        ctx.register(reader, &node);
        let decoded = legacy::read_context(reader, ctx)?;
        *node.write() = decoded;
        Ok(Box::new(node))
    }

    fn name(&self) -> &str {
        "trigger-context"
    }
}
