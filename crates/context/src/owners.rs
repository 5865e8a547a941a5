//! Persisted objects that hold a trigger context.
//!
//! A build record keeps its causes and actions; causes and actions each
//! point at a context, and usually the same one. Contexts are shared
//! nodes, so one instance referenced from several owners is written once.

use crate::context::TriggerContext;
use crate::event::ReviewEvent;
use std::sync::Arc;
use trigger_doc::{MarshalContext, Persist, Root, Shared, UnmarshalContext, XmlReader, XmlWriter};

const CONTEXT: &str = "context";

/// Action attached to a build so that it can be triggered again with the
/// same context.
#[derive(Debug, Clone, Default)]
pub struct RetriggerAction {
    pub context: Option<Shared<TriggerContext>>,
}

impl RetriggerAction {
    pub fn new(context: Shared<TriggerContext>) -> Self {
        Self {
            context: Some(context),
        }
    }
}

impl Persist for RetriggerAction {
    const ALIAS: &'static str = "retriggerAction";

    fn marshal(&self, writer: &mut XmlWriter, ctx: &mut MarshalContext<'_>) -> trigger_doc::Result<()> {
        ctx.write_optional(writer, CONTEXT, self.context.as_ref())
    }

    fn unmarshal(reader: &XmlReader<'_>, ctx: &mut UnmarshalContext<'_>) -> trigger_doc::Result<Self> {
        Ok(Self {
            context: ctx.read_field(reader, CONTEXT)?,
        })
    }
}

impl Root for RetriggerAction {
    const ELEMENT: &'static str = "retriggerAction";
}

/// Why a build was started: a review event, and the context of the
/// triggering decision.
#[derive(Debug, Clone, Default)]
pub struct TriggerCause {
    pub event: Option<ReviewEvent>,
    pub context: Option<Shared<TriggerContext>>,
    pub silent: bool,
}

impl TriggerCause {
    pub fn new(event: Option<ReviewEvent>, context: Shared<TriggerContext>) -> Self {
        Self {
            event,
            context: Some(context),
            silent: false,
        }
    }
}

impl Persist for TriggerCause {
    const ALIAS: &'static str = "triggerCause";

    fn marshal(&self, writer: &mut XmlWriter, ctx: &mut MarshalContext<'_>) -> trigger_doc::Result<()> {
        ctx.write_optional(writer, "event", self.event.as_ref())?;
        ctx.write_optional(writer, CONTEXT, self.context.as_ref())?;
        ctx.write_field(writer, "silentMode", &self.silent)
    }

    fn unmarshal(reader: &XmlReader<'_>, ctx: &mut UnmarshalContext<'_>) -> trigger_doc::Result<Self> {
        Ok(Self {
            event: ctx.read_field(reader, "event")?,
            context: ctx.read_field(reader, CONTEXT)?,
            silent: ctx.read_field(reader, "silentMode")?.unwrap_or_default(),
        })
    }
}

/// Cause of a build started by another build, carrying the upstream build's
/// own causes.
#[derive(Debug, Clone, Default)]
pub struct UpstreamCause {
    pub upstream_project: String,
    pub upstream_build: u64,
    pub upstream_causes: Vec<TriggerCause>,
}

impl Persist for UpstreamCause {
    const ALIAS: &'static str = "upstreamCause";

    fn marshal(&self, writer: &mut XmlWriter, ctx: &mut MarshalContext<'_>) -> trigger_doc::Result<()> {
        ctx.write_field(writer, "upstreamProject", &self.upstream_project)?;
        ctx.write_field(writer, "upstreamBuild", &self.upstream_build)?;
        if !self.upstream_causes.is_empty() {
            ctx.write_field(writer, "upstreamCauses", &self.upstream_causes)?;
        }
        Ok(())
    }

    fn unmarshal(reader: &XmlReader<'_>, ctx: &mut UnmarshalContext<'_>) -> trigger_doc::Result<Self> {
        Ok(Self {
            upstream_project: ctx.read_required(reader, "upstreamProject")?,
            upstream_build: ctx.read_required(reader, "upstreamBuild")?,
            upstream_causes: ctx.read_field(reader, "upstreamCauses")?.unwrap_or_default(),
        })
    }
}

/// A persisted build with the causes and actions that reference contexts.
#[derive(Debug, Clone, Default)]
pub struct BuildRecord {
    pub job: String,
    pub number: u64,
    pub causes: Vec<TriggerCause>,
    pub upstream: Vec<UpstreamCause>,
    pub actions: Vec<RetriggerAction>,
}

impl BuildRecord {
    pub fn new(job: impl Into<String>, number: u64) -> Self {
        Self {
            job: job.into(),
            number,
            ..Default::default()
        }
    }

    /// Every distinct context reachable from this record, in document order.
    pub fn trigger_contexts(&self) -> Vec<Shared<TriggerContext>> {
        let from_causes = self.causes.iter().filter_map(|cause| cause.context.as_ref());
        let from_upstream = self
            .upstream
            .iter()
            .flat_map(|upstream| upstream.upstream_causes.iter())
            .filter_map(|cause| cause.context.as_ref());
        let from_actions = self.actions.iter().filter_map(|action| action.context.as_ref());

        let mut distinct: Vec<Shared<TriggerContext>> = Vec::new();
        for context in from_causes.chain(from_upstream).chain(from_actions) {
            if !distinct.iter().any(|seen| Arc::ptr_eq(seen, context)) {
                distinct.push(Arc::clone(context));
            }
        }
        distinct
    }
}

impl Persist for BuildRecord {
    const ALIAS: &'static str = "build";

    fn marshal(&self, writer: &mut XmlWriter, ctx: &mut MarshalContext<'_>) -> trigger_doc::Result<()> {
        ctx.write_field(writer, "job", &self.job)?;
        ctx.write_field(writer, "number", &self.number)?;
        ctx.write_field(writer, "causes", &self.causes)?;
        if !self.upstream.is_empty() {
            ctx.write_field(writer, "upstreamCauses", &self.upstream)?;
        }
        ctx.write_field(writer, "actions", &self.actions)
    }

    fn unmarshal(reader: &XmlReader<'_>, ctx: &mut UnmarshalContext<'_>) -> trigger_doc::Result<Self> {
        Ok(Self {
            job: ctx.read_field(reader, "job")?.unwrap_or_default(),
            number: ctx.read_field(reader, "number")?.unwrap_or_default(),
            causes: ctx.read_field(reader, "causes")?.unwrap_or_default(),
            upstream: ctx.read_field(reader, "upstreamCauses")?.unwrap_or_default(),
            actions: ctx.read_field(reader, "actions")?.unwrap_or_default(),
        })
    }
}

impl Root for BuildRecord {
    const ELEMENT: &'static str = "build";
}
