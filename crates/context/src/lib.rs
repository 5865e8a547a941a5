//! # Trigger Context
//!
//! Records of which build caused which other builds to be triggered, and
//! their persistence.
//!
//! ## Architecture
//!
//! ```text
//! BuildRecord / RetriggerAction / TriggerCause
//!     │
//!     └──> Shared<TriggerContext> field
//!            │
//!            ├──> ContextCodec (registered on the DocumentCodec)
//!            │      ├─ encode: identity check → event, thisBuild, others
//!            │      └─ decode: reference resolve → allocate + register
//!            │                 → legacy shape matchers
//!            │
//!            └──> ItemReference / ReviewEvent via Persist
//! ```
//!
//! ## Example
//!
//! ```rust
//! use trigger_context::{standard_codec, ItemReference, TriggerContext};
//! use trigger_doc::{shared, DocConfig, Shared};
//!
//! let codec = standard_codec(DocConfig::compact()).unwrap();
//!
//! let mut context = TriggerContext::default().with_this_build(ItemReference::new("projectX", 100));
//! context.add_other_build("projectY", 1);
//!
//! let xml = codec.to_xml(&shared(context)).unwrap();
//! let decoded: Shared<TriggerContext> = codec.from_xml(&xml).unwrap();
//! assert_eq!(decoded.read().other_owner_ids(), vec!["projectY"]);
//! ```

mod context;
mod converter;
mod error;
mod event;
mod item;
pub mod legacy;
mod owners;
mod record;
mod summary;

pub use context::TriggerContext;
pub use converter::ContextCodec;
pub use error::{ContextError, Result};
pub use event::{Account, Change, EventKind, PatchSet, ReviewEvent};
pub use item::ItemReference;
pub use owners::{BuildRecord, RetriggerAction, TriggerCause, UpstreamCause};
pub use record::{PersistedRecord, RecordKind};
pub use summary::{ContextSummary, RecordSummary};

pub use trigger_doc::{DocConfig, DocError, DocumentCodec, ReferenceStyle};

/// A document codec with [`ContextCodec`] registered, ready for records
/// holding trigger contexts.
pub fn standard_codec(config: DocConfig) -> trigger_doc::Result<DocumentCodec> {
    let mut codec = DocumentCodec::new(config)?;
    codec.register_converter(ContextCodec::new());
    Ok(codec)
}
