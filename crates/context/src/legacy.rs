//! Decoding of current and older context layouts.
//!
//! Records written by earlier releases used different element names and
//! nesting for the same data. Each layout is a shape: a predicate over an
//! element plus the reader that applies when it matches. Shapes are tried in
//! order and the first match wins, so each one can be tested in isolation.
//!
//! Context children:
//!
//! | Shape               | Matches                                        |
//! |---------------------|------------------------------------------------|
//! | `event`             | `<event>`                                      |
//! | `this-build`        | `<thisBuild>`                                  |
//! | `legacy-this-build` | `<thisRun>` or `<build>`                       |
//! | `legacy-single-other` | `<other>`, or `<others>` carrying item fields itself |
//! | `others`            | `<others>` holding a sequence                  |
//!
//! Item references, wherever they appear:
//!
//! | Shape           | Matches                                              |
//! |-----------------|------------------------------------------------------|
//! | `null`          | `<null/>`                                            |
//! | `reference`     | a `reference` marker, followed to its target         |
//! | `current`       | a `projectId` child                                  |
//! | `attributes`    | a `projectId` or `project` attribute                 |
//! | `legacy-fields` | a `project` child, number in `number`                |
//! | `wrapped`       | a single child element matching one of the above     |

use crate::context::{TriggerContext, EVENT, OTHERS, THIS_BUILD};
use crate::event::ReviewEvent;
use crate::item::{ItemReference, BUILD_NUMBER, PROJECT_ID};
use trigger_doc::{DocError, Result, UnmarshalContext, XmlReader, NULL_ELEMENT, REFERENCE_ATTRIBUTE};

const LEGACY_PROJECT: &str = "project";
const LEGACY_NUMBER: &str = "number";
const LEGACY_THIS_BUILD: [&str; 2] = ["thisRun", "build"];
const LEGACY_OTHER: &str = "other";

type ContextMatch = fn(&XmlReader<'_>) -> bool;
type ContextApply = fn(&XmlReader<'_>, &mut UnmarshalContext<'_>, &mut TriggerContext) -> Result<()>;

/// One recognized layout for a child of `<context>`.
pub struct ContextShape {
    pub name: &'static str,
    pub matches: ContextMatch,
    pub apply: ContextApply,
}

pub const CONTEXT_SHAPES: &[ContextShape] = &[
    ContextShape {
        name: "event",
        matches: is_event,
        apply: apply_event,
    },
    ContextShape {
        name: "this-build",
        matches: is_this_build,
        apply: apply_this_build,
    },
    ContextShape {
        name: "legacy-this-build",
        matches: is_legacy_this_build,
        apply: apply_this_build,
    },
    ContextShape {
        name: "legacy-single-other",
        matches: is_legacy_single_other,
        apply: apply_single_other,
    },
    ContextShape {
        name: "others",
        matches: is_others,
        apply: apply_others,
    },
];

type ItemMatch = fn(&XmlReader<'_>) -> bool;
type ItemRead = fn(&XmlReader<'_>, &mut UnmarshalContext<'_>) -> Result<Option<ItemReference>>;

/// One recognized layout for an item reference.
pub struct ItemShape {
    pub name: &'static str,
    pub matches: ItemMatch,
    pub read: ItemRead,
}

pub const ITEM_SHAPES: &[ItemShape] = &[
    ItemShape {
        name: "null",
        matches: is_null,
        read: read_null,
    },
    ItemShape {
        name: "reference",
        matches: is_reference_marker,
        read: read_referenced,
    },
    ItemShape {
        name: "current",
        matches: has_current_fields,
        read: read_current,
    },
    ItemShape {
        name: "attributes",
        matches: has_attribute_fields,
        read: read_attribute_fields,
    },
    ItemShape {
        name: "legacy-fields",
        matches: has_legacy_fields,
        read: read_legacy_fields,
    },
    ItemShape {
        name: "wrapped",
        matches: is_wrapper,
        read: read_wrapped,
    },
];

/// Populate a context from the children of `reader`, whatever layout they
/// were written in.
pub fn read_context(reader: &XmlReader<'_>, ctx: &mut UnmarshalContext<'_>) -> Result<TriggerContext> {
    let mut context = TriggerContext::default();
    for child in reader.children() {
        match CONTEXT_SHAPES.iter().find(|shape| (shape.matches)(&child)) {
            Some(shape) => {
                if shape.name.starts_with("legacy") {
                    log::debug!("migrating {} from {} layout", child.path(), shape.name);
                }
                (shape.apply)(&child, ctx, &mut context)?;
            }
            None => log::debug!("ignoring unrecognized element {}", child.path()),
        }
    }
    Ok(context)
}

/// Decode one item reference in any known layout. `None` for null markers
/// and unrecognized elements.
pub fn read_item(reader: &XmlReader<'_>, ctx: &mut UnmarshalContext<'_>) -> Result<Option<ItemReference>> {
    match ITEM_SHAPES.iter().find(|shape| (shape.matches)(reader)) {
        Some(shape) => (shape.read)(reader, ctx),
        None => {
            log::warn!("dropping unrecognized reference at {}", reader.path());
            Ok(None)
        }
    }
}

fn is_event(reader: &XmlReader<'_>) -> bool {
    reader.name() == EVENT
}

fn is_this_build(reader: &XmlReader<'_>) -> bool {
    reader.name() == THIS_BUILD
}

fn is_legacy_this_build(reader: &XmlReader<'_>) -> bool {
    LEGACY_THIS_BUILD.contains(&reader.name())
}

fn is_legacy_single_other(reader: &XmlReader<'_>) -> bool {
    reader.name() == LEGACY_OTHER || (reader.name() == OTHERS && carries_item_fields(reader))
}

fn is_others(reader: &XmlReader<'_>) -> bool {
    reader.name() == OTHERS
}

fn carries_item_fields(reader: &XmlReader<'_>) -> bool {
    [PROJECT_ID, LEGACY_PROJECT, BUILD_NUMBER, LEGACY_NUMBER]
        .iter()
        .any(|field| reader.has_field(field))
}

fn apply_event(
    reader: &XmlReader<'_>,
    ctx: &mut UnmarshalContext<'_>,
    context: &mut TriggerContext,
) -> Result<()> {
    let event: ReviewEvent = ctx.convert_another(reader)?;
    context.set_event(Some(event));
    Ok(())
}

fn apply_this_build(
    reader: &XmlReader<'_>,
    ctx: &mut UnmarshalContext<'_>,
    context: &mut TriggerContext,
) -> Result<()> {
    context.set_this_build(read_item(reader, ctx)?);
    Ok(())
}

fn apply_single_other(
    reader: &XmlReader<'_>,
    ctx: &mut UnmarshalContext<'_>,
    context: &mut TriggerContext,
) -> Result<()> {
    let other = read_item(reader, ctx)?;
    push_named_other(reader, context, other);
    Ok(())
}

fn apply_others(
    reader: &XmlReader<'_>,
    ctx: &mut UnmarshalContext<'_>,
    context: &mut TriggerContext,
) -> Result<()> {
    for child in reader.children() {
        let other = read_item(&child, ctx)?;
        push_named_other(&child, context, other);
    }
    Ok(())
}

/// Other builds must name an owner; entries without one are dropped.
fn push_named_other(reader: &XmlReader<'_>, context: &mut TriggerContext, other: Option<ItemReference>) {
    match other {
        Some(other) if other.owner_id.trim().is_empty() => {
            log::warn!("dropping reference without owner at {}", reader.path());
        }
        Some(other) => context.push_other(other),
        None => {}
    }
}

fn is_null(reader: &XmlReader<'_>) -> bool {
    reader.name() == NULL_ELEMENT
}

fn read_null(_reader: &XmlReader<'_>, _ctx: &mut UnmarshalContext<'_>) -> Result<Option<ItemReference>> {
    Ok(None)
}

fn is_reference_marker(reader: &XmlReader<'_>) -> bool {
    reader.attribute(REFERENCE_ATTRIBUTE).is_some()
}

fn read_referenced(reader: &XmlReader<'_>, ctx: &mut UnmarshalContext<'_>) -> Result<Option<ItemReference>> {
    ctx.follow_reference(reader, |target, ctx| read_item(target, ctx))
}

fn has_current_fields(reader: &XmlReader<'_>) -> bool {
    reader.child(PROJECT_ID).is_some()
}

fn read_current(reader: &XmlReader<'_>, ctx: &mut UnmarshalContext<'_>) -> Result<Option<ItemReference>> {
    ctx.convert_another(reader).map(Some)
}

fn has_attribute_fields(reader: &XmlReader<'_>) -> bool {
    reader.attribute(PROJECT_ID).is_some() || reader.attribute(LEGACY_PROJECT).is_some()
}

fn read_attribute_fields(
    reader: &XmlReader<'_>,
    _ctx: &mut UnmarshalContext<'_>,
) -> Result<Option<ItemReference>> {
    let owner = reader
        .attribute(PROJECT_ID)
        .or_else(|| reader.attribute(LEGACY_PROJECT))
        .unwrap_or_default();
    let number = reader
        .attribute(BUILD_NUMBER)
        .or_else(|| reader.attribute(LEGACY_NUMBER));
    item_from_parts(reader, owner, number).map(Some)
}

fn has_legacy_fields(reader: &XmlReader<'_>) -> bool {
    reader.child(LEGACY_PROJECT).is_some()
}

fn read_legacy_fields(
    reader: &XmlReader<'_>,
    _ctx: &mut UnmarshalContext<'_>,
) -> Result<Option<ItemReference>> {
    let owner = reader.child_value(LEGACY_PROJECT).unwrap_or_default();
    let number = reader
        .child_value(LEGACY_NUMBER)
        .or_else(|| reader.child_value(BUILD_NUMBER));
    item_from_parts(reader, owner, number).map(Some)
}

/// Shapes a wrapped element may take; wrappers do not nest.
fn flat_shape(reader: &XmlReader<'_>) -> Option<&'static ItemShape> {
    ITEM_SHAPES
        .iter()
        .filter(|shape| shape.name != "null" && shape.name != "wrapped")
        .find(|shape| (shape.matches)(reader))
}

fn is_wrapper(reader: &XmlReader<'_>) -> bool {
    let mut children = reader.children();
    match (children.next(), children.next()) {
        (Some(only), None) => flat_shape(&only).is_some(),
        _ => false,
    }
}

fn read_wrapped(reader: &XmlReader<'_>, ctx: &mut UnmarshalContext<'_>) -> Result<Option<ItemReference>> {
    let Some(inner) = reader.children().next() else {
        return Ok(None);
    };
    match flat_shape(&inner) {
        Some(shape) => (shape.read)(&inner, ctx),
        None => Ok(None),
    }
}

fn item_from_parts(reader: &XmlReader<'_>, owner: &str, number: Option<&str>) -> Result<ItemReference> {
    let build_number = number
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            raw.parse::<u64>()
                .map_err(|_| DocError::invalid_value(reader.path().to_string(), raw))
        })
        .transpose()?;

    Ok(ItemReference {
        build_number,
        owner_id: owner.trim().to_string(),
    })
}
