//! Root selection and non-exportable node filtering.
//!
//! The image is taken of one subtree of the capture. Before rendering, the
//! subtree is copied without the nodes that should never appear in an export
//! (buttons, export controls, anything flagged `no-export`), and chart
//! surfaces are made fully opaque.

use dashport_ir::{CaptureNode, CaptureTree, NodeSubtype};
use tracing::{debug, warn};

/// Classes that mark a node as export chrome
const HIDDEN_CLASSES: [&str; 2] = ["no-export", "export-button"];

/// Tags that are always removed
const HIDDEN_TAGS: [&str; 1] = ["button"];

/// Tags drawn by chart libraries
const CHART_SURFACE_TAGS: [&str; 2] = ["canvas", "svg"];

/// Pick the subtree to render.
///
/// A caller-supplied id wins when it resolves; otherwise the first node
/// flagged `data-dashboard="true"`, then the first `dashboard-container`,
/// then the first `main` element, then the tree root.
pub fn select_root<'a>(capture: &'a CaptureTree, root_id: Option<&str>) -> &'a CaptureNode {
    let root = capture.root();
    if let Some(id) = root_id {
        match root.find_by_id(id) {
            Some(node) => return node,
            None => warn!(root_id = id, "requested root not in capture, using fallback"),
        }
    }

    let chain: [(&str, &dyn Fn(&CaptureNode) -> bool); 3] = [
        ("data-dashboard", &|n: &CaptureNode| n.attribute("data-dashboard") == Some("true")),
        ("dashboard-container", &|n: &CaptureNode| n.has_class("dashboard-container")),
        ("main", &|n: &CaptureNode| n.has_tag("main")),
    ];
    for (rule, predicate) in chain {
        if let Some(node) = root.find(predicate) {
            debug!(rule, node = %node.id, "image root selected");
            return node;
        }
    }
    root
}

/// Whether the node is removed from the image
pub fn is_hidden(node: &CaptureNode) -> bool {
    HIDDEN_TAGS.iter().any(|t| node.has_tag(t))
        || HIDDEN_CLASSES.iter().any(|c| node.has_class(c))
        || node
            .metadata
            .export_hints
            .as_ref()
            .is_some_and(|h| h.no_export)
}

/// Whether the node is a chart surface that must render fully opaque
pub fn is_chart_surface(node: &CaptureNode) -> bool {
    node.subtype == Some(NodeSubtype::Chart) || CHART_SURFACE_TAGS.iter().any(|t| node.has_tag(t))
}

/// Copy of the subtree with hidden nodes dropped and chart surfaces opaque.
///
/// Returns `None` when the root itself is hidden.
pub fn prune(node: &CaptureNode) -> Option<CaptureNode> {
    if is_hidden(node) {
        return None;
    }
    let mut kept = CaptureNode {
        id: node.id.clone(),
        kind: node.kind,
        subtype: node.subtype,
        properties: node.properties.clone(),
        children: Vec::with_capacity(node.children.len()),
        metadata: node.metadata.clone(),
    };
    if is_chart_surface(&kept) {
        kept.properties.style.opacity = Some(1.0);
    }
    kept.children.extend(node.children.iter().filter_map(prune));
    Some(kept)
}
