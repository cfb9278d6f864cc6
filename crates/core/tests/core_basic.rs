use iconsweep_core::model::{NodeId, NodeKind};
use iconsweep_core::tree::{DocumentTree, TreeAccess, TreeError};
use iconsweep_core::version;

const HOST_DOCUMENT: &str = r##"{
  "name": "Host",
  "pages": [
    { "id": "0:1", "name": "Screens", "type": "PAGE", "children": [
      { "id": "1:1", "name": "Header", "type": "FRAME", "width": 375, "height": 64, "children": [
        { "id": "1:2", "name": "Icons/close", "type": "INSTANCE", "width": 24, "height": 24,
          "x": 339, "y": 20, "mainComponentId": "lib:close" },
        { "id": "1:3", "name": "Title", "type": "TEXT", "width": 120, "height": 20 }
      ] }
    ] }
  ]
}"##;

#[test]
fn version_is_non_empty() {
    assert!(!version().is_empty());
}

#[test]
fn host_json_loads_with_parents_and_external_masters() {
    let tree = DocumentTree::from_json(HOST_DOCUMENT).expect("load");
    assert_eq!(tree.pages().unwrap(), vec![NodeId::new("0:1")]);

    let close = tree.node(&NodeId::new("1:2")).unwrap();
    assert_eq!(close.kind, NodeKind::Instance);
    assert_eq!(close.parent, Some(NodeId::new("1:1")));
    assert_eq!(close.transform.x, 339.0);

    // The master lives in another file, so it does not resolve here.
    assert_eq!(tree.resolve_main_component(&NodeId::new("1:2")).unwrap(), None);
}

#[test]
fn stale_ids_surface_as_not_found() {
    let mut tree = DocumentTree::from_json(HOST_DOCUMENT).expect("load");
    let gone = NodeId::new("9:9");
    assert_eq!(tree.node(&gone).unwrap_err(), TreeError::NotFound(gone.clone()));
    assert!(matches!(tree.delete_node(&gone), Err(TreeError::NotFound(_))));
}

#[test]
fn malformed_json_is_rejected() {
    assert!(DocumentTree::from_json(r#"{"name": "x", "pages": [{"id": 1}]}"#).is_err());
}
