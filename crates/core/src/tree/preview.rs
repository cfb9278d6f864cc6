use std::fmt::Write as _;

use crate::model::{NodeId, PaintKind};
use crate::tree::{TreeAccess, TreeError, TreeResult};

/// Render a coarse SVG outline of a node: its bounding box plus one shape per
/// direct child, positioned by the child's offset.
///
/// This is a structural proxy, not a rasterization.
pub fn render_preview_svg<T>(tree: &T, id: &NodeId) -> TreeResult<Option<String>>
where
    T: TreeAccess + ?Sized,
{
    let node = tree.node(id)?;
    let Some(bounds) = node.bounds else {
        return Ok(None);
    };
    if !(bounds.width.is_finite() && bounds.height.is_finite()) {
        return Err(TreeError::ExportFailure {
            id: id.clone(),
            reason: "bounding box is not finite".into(),
        });
    }

    let mut svg = String::new();
    let write_err = |_| TreeError::ExportFailure { id: id.clone(), reason: "format error".into() };
    write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = bounds.width,
        h = bounds.height
    )
    .map_err(write_err)?;

    for child_id in &node.children {
        let Ok(child) = tree.node(child_id) else {
            continue;
        };
        let Some(child_bounds) = child.bounds else {
            continue;
        };
        let fill = match child.fills.first() {
            Some(paint) if paint.kind == PaintKind::Solid => {
                paint.color.clone().unwrap_or_else(|| "currentColor".into())
            }
            Some(_) => "currentColor".into(),
            None => "none".into(),
        };
        let stroke = if child.strokes.is_empty() { "none" } else { "currentColor" };
        write!(
            svg,
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="{}"/>"#,
            child.transform.x, child.transform.y, child_bounds.width, child_bounds.height, fill, stroke
        )
        .map_err(write_err)?;
    }
    svg.push_str("</svg>");
    Ok(Some(svg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeKind, Paint};
    use crate::tree::{Document, DocumentNode, DocumentTree};

    #[test]
    fn renders_children_as_rects() {
        let doc = Document {
            name: "Preview".into(),
            pages: vec![DocumentNode::new("0:1", "Page", NodeKind::Page).with_children(vec![
                DocumentNode::new("1:1", "icon/star", NodeKind::Frame)
                    .sized(24.0, 24.0)
                    .with_children(vec![DocumentNode::new("1:2", "Star", NodeKind::Star)
                        .sized(20.0, 20.0)
                        .at(2.0, 2.0)
                        .with_fills(vec![Paint::solid("#ff0000")])]),
            ])],
        };
        let tree = DocumentTree::from_document(&doc).unwrap();
        let svg = render_preview_svg(&tree, &"1:1".into()).unwrap().expect("svg");
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r##"fill="#ff0000""##));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn nodes_without_bounds_have_no_preview() {
        let doc = Document {
            name: "Preview".into(),
            pages: vec![DocumentNode::new("0:1", "Page", NodeKind::Page)],
        };
        let tree = DocumentTree::from_document(&doc).unwrap();
        assert_eq!(render_preview_svg(&tree, &"0:1".into()).unwrap(), None);
    }
}
