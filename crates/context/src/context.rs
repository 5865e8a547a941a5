use crate::event::ReviewEvent;
use crate::item::ItemReference;
use trigger_doc::{MarshalContext, Persist, Root, UnmarshalContext, XmlReader, XmlWriter};

pub(crate) const EVENT: &str = "event";
pub(crate) const THIS_BUILD: &str = "thisBuild";
pub(crate) const OTHERS: &str = "others";

/// Which build a triggering decision produced, and the builds it triggered
/// alongside.
///
/// `others` is an ordered sequence of slots. Slots may be empty in memory;
/// records decoded through [`ContextCodec`](crate::ContextCodec) never
/// contain empty slots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerContext {
    event: Option<ReviewEvent>,
    this_build: Option<ItemReference>,
    others: Vec<Option<ItemReference>>,
}

impl TriggerContext {
    pub fn new(event: Option<ReviewEvent>) -> Self {
        Self {
            event,
            ..Default::default()
        }
    }

    pub fn with_this_build(mut self, this_build: ItemReference) -> Self {
        self.this_build = Some(this_build);
        self
    }

    pub fn event(&self) -> Option<&ReviewEvent> {
        self.event.as_ref()
    }

    pub fn set_event(&mut self, event: Option<ReviewEvent>) {
        self.event = event;
    }

    pub fn this_build(&self) -> Option<&ItemReference> {
        self.this_build.as_ref()
    }

    pub fn set_this_build(&mut self, this_build: Option<ItemReference>) {
        self.this_build = this_build;
    }

    /// Replace the slot sequence as given, empty slots included.
    pub fn set_others(&mut self, others: Vec<Option<ItemReference>>) {
        self.others = others;
    }

    /// Present references, in order.
    pub fn others(&self) -> impl Iterator<Item = &ItemReference> + '_ {
        self.others.iter().flatten()
    }

    pub fn other_slots(&self) -> &[Option<ItemReference>] {
        &self.others
    }

    pub fn has_others(&self) -> bool {
        self.others().next().is_some()
    }

    /// Record a triggered build, replacing an earlier reference to the same
    /// job.
    pub fn add_other_build(&mut self, owner_id: &str, build_number: u64) {
        let reference = ItemReference::new(owner_id, build_number);
        let existing = self
            .others
            .iter_mut()
            .flatten()
            .find(|other| other.matches_owner(owner_id));
        match existing {
            Some(other) => *other = reference,
            None => self.others.push(Some(reference)),
        }
    }

    /// Record a triggered job whose build is not yet known.
    pub fn add_other_owner(&mut self, owner_id: &str) {
        if !self.others().any(|other| other.matches_owner(owner_id)) {
            self.others.push(Some(ItemReference::owner_only(owner_id)));
        }
    }

    pub fn other_owner_ids(&self) -> Vec<&str> {
        self.others().map(|other| other.owner_id.as_str()).collect()
    }

    pub(crate) fn push_other(&mut self, other: ItemReference) {
        self.others.push(Some(other));
    }
}

/// Field-by-field encoding, used when no converter claims the type.
/// Empty slots are kept as `<null/>` markers.
impl Persist for TriggerContext {
    const ALIAS: &'static str = "context";

    fn marshal(&self, writer: &mut XmlWriter, ctx: &mut MarshalContext<'_>) -> trigger_doc::Result<()> {
        ctx.write_optional(writer, EVENT, self.event.as_ref())?;
        ctx.write_optional(writer, THIS_BUILD, self.this_build.as_ref())?;
        if !self.others.is_empty() {
            ctx.write_field(writer, OTHERS, &self.others)?;
        }
        Ok(())
    }

    fn unmarshal(reader: &XmlReader<'_>, ctx: &mut UnmarshalContext<'_>) -> trigger_doc::Result<Self> {
        Ok(Self {
            event: ctx.read_field(reader, EVENT)?,
            this_build: ctx.read_field(reader, THIS_BUILD)?,
            others: ctx.read_field(reader, OTHERS)?.unwrap_or_default(),
        })
    }
}

impl Root for TriggerContext {
    const ELEMENT: &'static str = "context";
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_other_build_replaces_same_owner() {
        let mut context = TriggerContext::default();
        context.add_other_owner("downstream");
        context.add_other_build("other", 3);
        context.add_other_build("downstream", 7);

        assert_eq!(
            context.others().cloned().collect::<Vec<_>>(),
            vec![ItemReference::new("downstream", 7), ItemReference::new("other", 3)]
        );
    }

    #[test]
    fn add_other_owner_skips_known_owner() {
        let mut context = TriggerContext::default();
        context.add_other_build("downstream", 7);
        context.add_other_owner("downstream");
        context.add_other_owner("matrix");

        assert_eq!(context.other_owner_ids(), vec!["downstream", "matrix"]);
    }

    #[test]
    fn empty_slots_are_not_others() {
        let mut context = TriggerContext::default();
        context.set_others(vec![None, None]);
        assert!(!context.has_others());
        assert_eq!(context.other_slots().len(), 2);

        context.set_others(vec![None, Some(ItemReference::new("projectY", 1))]);
        assert!(context.has_others());
        assert_eq!(context.other_owner_ids(), vec!["projectY"]);
    }
}
