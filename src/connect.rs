// Copyright 2025 Cowboy AI, LLC.

//! Connecting an extender document onto a base
//!
//! [`connect`] is the single merge step everything else is built from:
//! it consumes one output link of the base and one input link of the
//! extender, welds them with a synthesized fixed joint, and returns a
//! new composition tracking the extender as a fresh contributor. Neither
//! operand is modified.

use indexmap::IndexMap;
use tracing::debug;

use crate::composed::{first_available_in, ComposedUrdf};
use crate::document::UrdfSource;
use crate::element::UrdfElement;
use crate::errors::{ComposeError, ComposeErrorKind, ComposeResult};
use crate::resolve::ResolvedConnection;

/// Prefix given to the two links consumed by a connection.
pub const CONNECTED_PREFIX: &str = "CONNECTED:";

/// Name given to synthesized bridge joints, suffixed on collision.
pub const GENERATED_JOINT_NAME: &str = "GENERATED_CONNECTION";

/// Connect `extender` onto `base` at an already-resolved connection.
///
/// The extender is wrapped as a fresh contributor, so connecting the
/// same document several times is legal. On success the consumed links
/// are renamed `CONNECTED:<name>` (first-available suffixed if taken), a
/// fixed joint named `GENERATED_CONNECTION` bridges them, and the joint
/// sits between the base's elements and the extender's.
///
/// Preconditions checked, in order: the base link exists, is empty, and
/// is not yet a joint parent; the extender link exists and is not yet a
/// joint child. Any violation fails without touching either operand.
pub fn connect<E>(
    base: &ComposedUrdf,
    extender: &E,
    conn: &ResolvedConnection,
) -> ComposeResult<ComposedUrdf>
where
    E: UrdfSource + ?Sized,
{
    debug!(
        base = base.label(),
        extender = extender.label(),
        base_link = %conn.base_link,
        extender_link = %conn.extender_link,
        "connecting extender onto base"
    );
    let mut ext = ComposedUrdf::construct(extender);
    if let Some(kind) = connection_issue(base, &ext, conn) {
        return Err(ComposeError::new(kind, base, &ext));
    }
    let mut base = base.clone();
    ext.remove_duplicate_materials(&base);

    let new_extender_link =
        first_available_in(&ext, &format!("{CONNECTED_PREFIX}{}", conn.extender_link));
    let new_base_link =
        first_available_in(&base, &format!("{CONNECTED_PREFIX}{}", conn.base_link));
    ext.rename_elements(&IndexMap::from([(
        conn.extender_link.clone(),
        new_extender_link,
    )]));
    base.rename_elements(&IndexMap::from([(
        conn.base_link.clone(),
        new_base_link.clone(),
    )]));

    let merged_count = ext.root().children().len();
    base.concatenate(ext);

    // Concatenation may have suffixed the extender link again; the name
    // map knows where it ended up.
    let extender_link_now = base
        .name_map()
        .lookup_by_id(extender.document_id(), &conn.extender_link)
        .expect("connected extender link stays tracked through concatenation")
        .to_string();
    let joint_name = first_available_in(&base, GENERATED_JOINT_NAME);
    let joint = bridge_joint(&joint_name, &new_base_link, &extender_link_now);
    let insert_at = base.root().children().len() - merged_count;
    base.insert_element(insert_at, joint);
    Ok(base)
}

/// First violated connection precondition, if any.
fn connection_issue(
    base: &ComposedUrdf,
    extender: &ComposedUrdf,
    conn: &ResolvedConnection,
) -> Option<ComposeErrorKind> {
    let Some(base_link) = base.find_top_level(Some("link"), &conn.base_link) else {
        let available = base
            .root()
            .children()
            .iter()
            .filter(|el| el.tag() == "link")
            .filter_map(|el| el.name().map(str::to_string))
            .collect();
        return Some(ComposeErrorKind::UnknownBaseLink {
            link: conn.base_link.clone(),
            available,
        });
    };
    if !base_link.children().is_empty() {
        return Some(ComposeErrorKind::NonEmptyOutputLink {
            link: conn.base_link.clone(),
        });
    }
    if extender
        .find_top_level(Some("link"), &conn.extender_link)
        .is_none()
    {
        return Some(ComposeErrorKind::UnknownExtenderLink {
            link: conn.extender_link.clone(),
        });
    }
    if let Some(joint) = joint_using(base, "parent", &conn.base_link) {
        return Some(ComposeErrorKind::OutputLinkInUse {
            link: conn.base_link.clone(),
            joint,
        });
    }
    if let Some(joint) = joint_using(extender, "child", &conn.extender_link) {
        return Some(ComposeErrorKind::InputLinkInUse {
            link: conn.extender_link.clone(),
            joint,
        });
    }
    None
}

/// Name of the first top-level joint whose `<parent>` or `<child>`
/// references the given link.
fn joint_using<S: UrdfSource + ?Sized>(doc: &S, end: &str, link: &str) -> Option<String> {
    doc.root()
        .children()
        .iter()
        .filter(|el| el.tag() == "joint")
        .find(|el| {
            el.find_child(end).and_then(|e| e.attribute("link")) == Some(link)
        })
        .map(|el| el.name().unwrap_or("<unnamed>").to_string())
}

/// The fixed joint welding the two connected links together.
fn bridge_joint(name: &str, parent_link: &str, child_link: &str) -> UrdfElement {
    UrdfElement::new("joint")
        .with_attribute("name", name)
        .with_attribute("type", "fixed")
        .with_child(
            UrdfElement::new("origin")
                .with_attribute("xyz", "0 0 0")
                .with_attribute("rpy", "0 0 0"),
        )
        .with_child(UrdfElement::new("parent").with_attribute("link", parent_link))
        .with_child(UrdfElement::new("child").with_attribute("link", child_link))
        .with_child(UrdfElement::new("axis").with_attribute("xyz", "0 0 0"))
}
