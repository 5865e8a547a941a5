//! # Trigger Doc
//!
//! Hierarchical document framework for persisting object graphs as XML.
//!
//! ## Philosophy
//!
//! Object graphs written to disk must come back as the same graph:
//! - A shared object appears once in full; later occurrences are markers
//! - Markers resolve to the very instance decoded earlier in the same pass
//! - Custom converters take over specific types, matched on exact type
//! - Every pass is independent; nothing is global
//!
//! ## Architecture
//!
//! ```text
//! value: impl Root
//!     │
//!     ├──> DocumentCodec::to_element
//!     │    ├─> MarshalContext (identity → id / path)
//!     │    ├─> ConverterRegistry lookup per Shared<T>
//!     │    └─> Persist::marshal → XmlWriter → Element
//!     │
//!     └──> Element::render → String
//!
//! String
//!     │
//!     ├──> DocumentCodec::parse (roxmltree, bounded by max_depth)
//!     │
//!     └──> DocumentCodec::from_element
//!          ├─> UnmarshalContext (id / path → Arc)
//!          ├─> ConverterRegistry lookup per Shared<T>
//!          └─> Persist::unmarshal ← XmlReader
//! ```
//!
//! ## Example
//!
//! ```rust
//! use trigger_doc::{shared, DocConfig, DocumentCodec, Shared};
//!
//! let codec = DocumentCodec::new(DocConfig::compact()).unwrap();
//!
//! let name = shared("job".to_string());
//! let pair: Vec<Shared<String>> = vec![name.clone(), name];
//!
//! # struct Pair(Vec<Shared<String>>);
//! # impl trigger_doc::Persist for Pair {
//! #     const ALIAS: &'static str = "pair";
//! #     fn marshal(&self, w: &mut trigger_doc::XmlWriter, ctx: &mut trigger_doc::MarshalContext<'_>) -> trigger_doc::Result<()> {
//! #         ctx.convert_another(&self.0, w)
//! #     }
//! #     fn unmarshal(r: &trigger_doc::XmlReader<'_>, ctx: &mut trigger_doc::UnmarshalContext<'_>) -> trigger_doc::Result<Self> {
//! #         ctx.convert_another(r).map(Pair)
//! #     }
//! # }
//! # impl trigger_doc::Root for Pair { const ELEMENT: &'static str = "pair"; }
//! let xml = codec.to_xml(&Pair(pair)).unwrap();
//! assert_eq!(xml, r#"<pair><string id="1">job</string><string reference="1"/></pair>"#);
//!
//! let decoded: Pair = codec.from_xml(&xml).unwrap();
//! assert!(std::sync::Arc::ptr_eq(&decoded.0[0], &decoded.0[1]));
//! ```

mod codec;
mod config;
mod converter;
mod element;
mod error;
mod graph;
mod path;
mod persist;
mod reader;
mod writer;

pub use codec::DocumentCodec;
pub use config::{DocConfig, ReferenceStyle, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};
pub use converter::{Converter, ConverterRegistry};
pub use element::Element;
pub use error::{DocError, Result};
pub use graph::{MarshalContext, UnmarshalContext, WrittenNode, ID_ATTRIBUTE, REFERENCE_ATTRIBUTE};
pub use path::{NodePath, PathSegment};
pub use persist::{identity_of, shared, Persist, Root, Shared, NULL_ELEMENT};
pub use reader::XmlReader;
pub use writer::XmlWriter;
