use crate::context::TriggerContext;
use crate::event::EventKind;
use crate::item::ItemReference;
use crate::record::{PersistedRecord, RecordKind};
use serde::Serialize;

/// Flat, serializable view of one context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<EventKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_set: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub this_build: Option<ItemReference>,
    pub others: Vec<ItemReference>,
}

impl From<&TriggerContext> for ContextSummary {
    fn from(context: &TriggerContext) -> Self {
        let event = context.event();
        Self {
            event: event.map(|event| event.kind),
            project: event.and_then(|event| event.project()).map(str::to_string),
            patch_set: event
                .and_then(|event| event.patch_set.as_ref())
                .map(|patch_set| patch_set.number.clone()),
            this_build: context.this_build().cloned(),
            others: context.others().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSummary {
    pub kind: RecordKind,
    pub contexts: Vec<ContextSummary>,
}

impl From<&PersistedRecord> for RecordSummary {
    fn from(record: &PersistedRecord) -> Self {
        Self {
            kind: record.kind(),
            contexts: record
                .contexts()
                .iter()
                .map(|context| ContextSummary::from(&*context.read()))
                .collect(),
        }
    }
}

impl RecordSummary {
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
