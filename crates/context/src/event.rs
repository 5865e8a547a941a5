//! Review-system event payload.
//!
//! The event is carried through the document framework exactly as any other
//! value: a `class` attribute naming its kind plus optional children.

use serde::{Deserialize, Serialize};
use std::fmt;
use trigger_doc::{DocError, MarshalContext, Persist, UnmarshalContext, XmlReader, XmlWriter};

const CLASS_ATTRIBUTE: &str = "class";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    #[default]
    PatchsetCreated,
    DraftPublished,
    ChangeMerged,
    ChangeAbandoned,
    ChangeRestored,
    CommentAdded,
    RefUpdated,
    ManualPatchsetCreated,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::PatchsetCreated,
        EventKind::DraftPublished,
        EventKind::ChangeMerged,
        EventKind::ChangeAbandoned,
        EventKind::ChangeRestored,
        EventKind::CommentAdded,
        EventKind::RefUpdated,
        EventKind::ManualPatchsetCreated,
    ];

    /// Name written into the `class` attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::PatchsetCreated => "patchset-created",
            EventKind::DraftPublished => "draft-published",
            EventKind::ChangeMerged => "change-merged",
            EventKind::ChangeAbandoned => "change-abandoned",
            EventKind::ChangeRestored => "change-restored",
            EventKind::CommentAdded => "comment-added",
            EventKind::RefUpdated => "ref-updated",
            EventKind::ManualPatchsetCreated => "manual-patchset-created",
        }
    }

    fn legacy_name(self) -> &'static str {
        match self {
            EventKind::PatchsetCreated => "PatchsetCreated",
            EventKind::DraftPublished => "DraftPublished",
            EventKind::ChangeMerged => "ChangeMerged",
            EventKind::ChangeAbandoned => "ChangeAbandoned",
            EventKind::ChangeRestored => "ChangeRestored",
            EventKind::CommentAdded => "CommentAdded",
            EventKind::RefUpdated => "RefUpdated",
            EventKind::ManualPatchsetCreated => "ManualPatchsetCreated",
        }
    }

    /// Parse a `class` attribute. Older records store a qualified class
    /// name; only its last dotted segment is significant.
    pub fn from_class(class: &str) -> Option<Self> {
        let short = class.rsplit('.').next().unwrap_or(class);
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == short || kind.legacy_name() == short)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Persist for Account {
    const ALIAS: &'static str = "account";

    fn marshal(&self, writer: &mut XmlWriter, ctx: &mut MarshalContext<'_>) -> trigger_doc::Result<()> {
        ctx.write_field(writer, "name", &self.name)?;
        ctx.write_optional(writer, "email", self.email.as_ref())
    }

    fn unmarshal(reader: &XmlReader<'_>, ctx: &mut UnmarshalContext<'_>) -> trigger_doc::Result<Self> {
        Ok(Self {
            name: ctx.read_field(reader, "name")?.unwrap_or_default(),
            email: ctx.read_field(reader, "email")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub project: String,
    pub branch: String,
    pub id: String,
    pub number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Account>,
}

impl Persist for Change {
    const ALIAS: &'static str = "change";

    fn marshal(&self, writer: &mut XmlWriter, ctx: &mut MarshalContext<'_>) -> trigger_doc::Result<()> {
        ctx.write_field(writer, "project", &self.project)?;
        ctx.write_field(writer, "branch", &self.branch)?;
        ctx.write_field(writer, "id", &self.id)?;
        ctx.write_field(writer, "number", &self.number)?;
        ctx.write_optional(writer, "subject", self.subject.as_ref())?;
        ctx.write_optional(writer, "owner", self.owner.as_ref())?;
        ctx.write_optional(writer, "url", self.url.as_ref())
    }

    fn unmarshal(reader: &XmlReader<'_>, ctx: &mut UnmarshalContext<'_>) -> trigger_doc::Result<Self> {
        Ok(Self {
            project: ctx.read_field(reader, "project")?.unwrap_or_default(),
            branch: ctx.read_field(reader, "branch")?.unwrap_or_default(),
            id: ctx.read_field(reader, "id")?.unwrap_or_default(),
            number: ctx.read_field(reader, "number")?.unwrap_or_default(),
            subject: ctx.read_field(reader, "subject")?,
            url: ctx.read_field(reader, "url")?,
            owner: ctx.read_field(reader, "owner")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchSet {
    pub number: String,
    pub revision: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_spec: Option<String>,
}

impl Persist for PatchSet {
    const ALIAS: &'static str = "patchSet";

    fn marshal(&self, writer: &mut XmlWriter, ctx: &mut MarshalContext<'_>) -> trigger_doc::Result<()> {
        ctx.write_field(writer, "number", &self.number)?;
        ctx.write_field(writer, "revision", &self.revision)?;
        ctx.write_optional(writer, "ref", self.ref_spec.as_ref())
    }

    fn unmarshal(reader: &XmlReader<'_>, ctx: &mut UnmarshalContext<'_>) -> trigger_doc::Result<Self> {
        Ok(Self {
            number: ctx.read_field(reader, "number")?.unwrap_or_default(),
            revision: ctx.read_field(reader, "revision")?.unwrap_or_default(),
            ref_spec: ctx.read_field(reader, "ref")?,
        })
    }
}

/// The event that caused a build to be triggered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEvent {
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Change>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_set: Option<PatchSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<u64>,
}

impl ReviewEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn with_change(mut self, change: Change) -> Self {
        self.change = Some(change);
        self
    }

    pub fn with_patch_set(mut self, patch_set: PatchSet) -> Self {
        self.patch_set = Some(patch_set);
        self
    }

    pub fn project(&self) -> Option<&str> {
        self.change.as_ref().map(|change| change.project.as_str())
    }
}

impl Persist for ReviewEvent {
    const ALIAS: &'static str = "event";

    fn marshal(&self, writer: &mut XmlWriter, ctx: &mut MarshalContext<'_>) -> trigger_doc::Result<()> {
        writer.add_attribute(CLASS_ATTRIBUTE, self.kind.as_str());
        ctx.write_optional(writer, "change", self.change.as_ref())?;
        ctx.write_optional(writer, "patchSet", self.patch_set.as_ref())?;
        ctx.write_optional(writer, "account", self.account.as_ref())?;
        ctx.write_optional(writer, "createdOn", self.created_on.as_ref())
    }

    fn unmarshal(reader: &XmlReader<'_>, ctx: &mut UnmarshalContext<'_>) -> trigger_doc::Result<Self> {
        let kind = match reader.attribute(CLASS_ATTRIBUTE) {
            Some(class) => {
                EventKind::from_class(class).ok_or_else(|| DocError::UnknownClass(class.to_string()))?
            }
            None => EventKind::default(),
        };

        Ok(Self {
            kind,
            change: ctx.read_field(reader, "change")?,
            patch_set: ctx.read_field(reader, "patchSet")?,
            account: ctx.read_field(reader, "account")?,
            created_on: ctx.read_field(reader, "createdOn")?,
        })
    }
}
