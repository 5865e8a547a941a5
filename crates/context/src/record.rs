use crate::context::TriggerContext;
use crate::error::{ContextError, Result};
use crate::owners::{BuildRecord, RetriggerAction};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use trigger_doc::{DocumentCodec, Root, Shared};

/// The kinds of document that can hold trigger contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    Build,
    Action,
    Context,
}

impl RecordKind {
    pub fn root_element(self) -> &'static str {
        match self {
            RecordKind::Build => BuildRecord::ELEMENT,
            RecordKind::Action => RetriggerAction::ELEMENT,
            RecordKind::Context => TriggerContext::ELEMENT,
        }
    }

    pub fn from_root(name: &str) -> Option<Self> {
        [RecordKind::Build, RecordKind::Action, RecordKind::Context]
            .into_iter()
            .find(|kind| kind.root_element() == name)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordKind::Build => "build",
            RecordKind::Action => "action",
            RecordKind::Context => "context",
        })
    }
}

/// A decoded document of any [`RecordKind`].
#[derive(Debug, Clone)]
pub enum PersistedRecord {
    Build(BuildRecord),
    Action(RetriggerAction),
    Context(Shared<TriggerContext>),
}

impl PersistedRecord {
    /// Decode `input`, detecting the kind from its root element unless one
    /// is given.
    pub fn decode(codec: &DocumentCodec, input: &str, kind: Option<RecordKind>) -> Result<Self> {
        let root = codec.parse(input)?;
        let kind = match kind {
            Some(kind) => kind,
            None => RecordKind::from_root(root.name())
                .ok_or_else(|| ContextError::UnknownRecord(root.name().to_string()))?,
        };
        log::debug!("decoding <{}> as {kind} record", root.name());

        let record = match kind {
            RecordKind::Build => Self::Build(codec.from_element(&root)?),
            RecordKind::Action => Self::Action(codec.from_element(&root)?),
            RecordKind::Context => Self::Context(codec.from_element(&root)?),
        };
        Ok(record)
    }

    pub fn read_from_path(
        codec: &DocumentCodec,
        path: impl AsRef<Path>,
        kind: Option<RecordKind>,
    ) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(trigger_doc::DocError::from)?;
        Self::decode(codec, &raw, kind)
    }

    /// Re-encode in the current layout.
    pub fn encode(&self, codec: &DocumentCodec) -> Result<String> {
        let xml = match self {
            Self::Build(build) => codec.to_xml(build)?,
            Self::Action(action) => codec.to_xml(action)?,
            Self::Context(context) => codec.to_xml(context)?,
        };
        Ok(xml)
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Build(_) => RecordKind::Build,
            Self::Action(_) => RecordKind::Action,
            Self::Context(_) => RecordKind::Context,
        }
    }

    /// Every distinct context in the record.
    pub fn contexts(&self) -> Vec<Shared<TriggerContext>> {
        match self {
            Self::Build(build) => build.trigger_contexts(),
            Self::Action(action) => action.context.iter().cloned().collect(),
            Self::Context(context) => vec![context.clone()],
        }
    }

    /// The first context in the record, for callers that require one.
    pub fn primary_context(&self) -> Result<Shared<TriggerContext>> {
        self.contexts()
            .into_iter()
            .next()
            .ok_or_else(|| ContextError::MissingContext(self.kind().root_element().to_string()))
    }
}
