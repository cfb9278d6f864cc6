use std::collections::HashSet;

use iconsweep_core::config::EngineConfig;
use iconsweep_core::model::{
    BoundingBox, CandidateStatus, NodeId, NodeKind, Paint, Transform, TreeNode,
};
use iconsweep_core::services::{ConsolidationScope, ScanSession};
use iconsweep_core::tree::{Document, DocumentNode, DocumentTree, TreeAccess, TreeError, TreeResult};

fn icon_frame(id: &str, name: &str, x: f64) -> DocumentNode {
    DocumentNode::new(id, name, NodeKind::Frame).sized(24.0, 24.0).at(x, 12.0).with_children(vec![
        DocumentNode::new(format!("{id}:glyph"), "Vector", NodeKind::Vector)
            .sized(20.0, 18.0)
            .at(2.0, 3.0)
            .with_fills(vec![Paint::solid("#101010")]),
    ])
}

fn screens(children: Vec<DocumentNode>) -> DocumentTree {
    let doc = Document {
        name: "App".into(),
        pages: vec![DocumentNode::new("p:screens", "Screens", NodeKind::Page).with_children(children)],
    };
    DocumentTree::from_document(&doc).expect("fixture loads")
}

/// Wraps a document and refuses selected mutations.
struct FlakyTree {
    inner: DocumentTree,
    refuse_inserts_into: Option<NodeId>,
    refuse_deletes: HashSet<NodeId>,
}

impl FlakyTree {
    fn new(inner: DocumentTree) -> Self {
        Self { inner, refuse_inserts_into: None, refuse_deletes: HashSet::new() }
    }
}

impl TreeAccess for FlakyTree {
    fn pages(&self) -> TreeResult<Vec<NodeId>> {
        self.inner.pages()
    }

    fn node(&self, id: &NodeId) -> TreeResult<&TreeNode> {
        self.inner.node(id)
    }

    fn resolve_main_component(&self, instance: &NodeId) -> TreeResult<Option<NodeId>> {
        self.inner.resolve_main_component(instance)
    }

    fn export_preview(&self, id: &NodeId) -> TreeResult<Option<Vec<u8>>> {
        self.inner.export_preview(id)
    }

    fn clone_subtree(&mut self, id: &NodeId) -> TreeResult<NodeId> {
        self.inner.clone_subtree(id)
    }

    fn create_page(&mut self, name: &str) -> TreeResult<NodeId> {
        self.inner.create_page(name)
    }

    fn create_master_container(&mut self, parent: &NodeId, name: &str) -> TreeResult<NodeId> {
        self.inner.create_master_container(parent, name)
    }

    fn create_reference_instance(&mut self, master: &NodeId) -> TreeResult<NodeId> {
        self.inner.create_reference_instance(master)
    }

    fn insert_at_index(&mut self, parent: &NodeId, index: usize, node: &NodeId) -> TreeResult<()> {
        if self.refuse_inserts_into.as_ref() == Some(parent) {
            return Err(TreeError::InvalidParent {
                id: parent.clone(),
                reason: "locked layer".into(),
            });
        }
        self.inner.insert_at_index(parent, index, node)
    }

    fn delete_node(&mut self, id: &NodeId) -> TreeResult<()> {
        if self.refuse_deletes.contains(id) {
            return Err(TreeError::Inaccessible { id: id.clone(), reason: "locked".into() });
        }
        self.inner.delete_node(id)
    }

    fn resize(&mut self, id: &NodeId, bounds: BoundingBox) -> TreeResult<()> {
        self.inner.resize(id, bounds)
    }

    fn set_transform(&mut self, id: &NodeId, transform: Transform) -> TreeResult<()> {
        self.inner.set_transform(id, transform)
    }
}

#[test]
fn five_home_icons_become_one_master() {
    let mut tree = screens(vec![
        icon_frame("a", "home-icon", 0.0),
        icon_frame("b", "home_icon2", 40.0),
        icon_frame("c", "HomeIcon", 80.0),
        icon_frame("d", "Home Icon copy", 120.0),
        icon_frame("e", "home.icon", 160.0),
    ]);
    let session = ScanSession::new(EngineConfig::default());
    let scan = session.scan(&tree).expect("scan");
    assert_eq!(scan.total_icons, 5);
    assert!(scan.discovered_icons.iter().all(|c| c.status == CandidateStatus::Unresolved));

    let result = session
        .consolidate(&mut tree, &scan.discovered_icons, ConsolidationScope::AllPages, None, &mut |_| {})
        .expect("consolidate");
    assert_eq!(result.components_created, 1);
    assert_eq!(result.icons_replaced, 5);
    assert_eq!(result.pages_affected, 1);
    assert_eq!(result.failed_operations, 0);

    // N-1 instances in place, the representative consumed by the master.
    let page = tree.node(&NodeId::new("p:screens")).expect("page");
    assert_eq!(page.children.len(), 4);
    let xs: Vec<f64> = page
        .children
        .iter()
        .map(|id| tree.node(id).expect("child").transform.x)
        .collect();
    assert_eq!(xs, vec![0.0, 40.0, 80.0, 160.0]);

    let rescan = session.scan(&tree).expect("rescan");
    let masters: Vec<_> =
        rescan.discovered_icons.iter().filter(|c| c.status == CandidateStatus::Master).collect();
    assert_eq!(masters.len(), 1);
    assert_eq!(masters[0].name, "Home Icon");
    assert_eq!(masters[0].page, "Icon Library");
    let instances =
        rescan.discovered_icons.iter().filter(|c| c.status == CandidateStatus::Instance).count();
    assert_eq!(instances, 4);
    assert!(!rescan.discovered_icons.iter().any(|c| c.status == CandidateStatus::Unresolved));
}

#[test]
fn member_failures_are_counted_and_cleaned_up() {
    let doc = Document {
        name: "App".into(),
        pages: vec![DocumentNode::new("p:screens", "Screens", NodeKind::Page).with_children(vec![
            DocumentNode::new("card", "Card", NodeKind::Frame)
                .sized(320.0, 240.0)
                .with_children(vec![icon_frame("a", "home", 0.0), icon_frame("b", "home", 40.0)]),
            DocumentNode::new("sidebar", "Sidebar", NodeKind::Frame)
                .sized(80.0, 600.0)
                .with_children(vec![icon_frame("c", "home", 0.0)]),
        ])],
    };
    let mut tree = FlakyTree::new(DocumentTree::from_document(&doc).expect("fixture"));
    tree.refuse_inserts_into = Some(NodeId::new("sidebar"));

    let session = ScanSession::new(EngineConfig::default());
    let icons = session.scan(&tree).expect("scan").discovered_icons;
    assert_eq!(icons.len(), 3);

    let result = session
        .consolidate(&mut tree, &icons, ConsolidationScope::AllPages, None, &mut |_| {})
        .expect("consolidate");
    assert_eq!(result.components_created, 1);
    assert_eq!(result.icons_replaced, 2);
    assert_eq!(result.failed_operations, 1);

    // Fallback deletion removed the member that could not be rewritten.
    assert!(tree.node(&NodeId::new("c")).is_err());
    let sidebar = tree.node(&NodeId::new("sidebar")).expect("sidebar");
    assert!(sidebar.children.is_empty());
}

#[test]
fn cluster_with_no_successful_member_removes_its_master() {
    let mut tree = FlakyTree::new(screens(vec![icon_frame("a", "home", 0.0)]));
    tree.refuse_deletes.insert(NodeId::new("a"));

    let session = ScanSession::new(EngineConfig::default());
    let icons = session.scan(&tree).expect("scan").discovered_icons;
    let result = session
        .consolidate(&mut tree, &icons, ConsolidationScope::AllPages, None, &mut |_| {})
        .expect("consolidate");

    assert_eq!(result.components_created, 0);
    assert_eq!(result.icons_replaced, 0);
    assert_eq!(result.failed_operations, 1);
    assert!(tree.node(&NodeId::new("a")).is_ok());

    let library = tree
        .pages()
        .expect("pages")
        .into_iter()
        .find(|id| tree.node(id).is_ok_and(|p| p.name == "Icon Library"))
        .expect("library page created");
    assert!(tree.node(&library).expect("library").children.is_empty());
}

#[test]
fn ignored_and_non_unresolved_icons_are_not_consolidated() {
    let mut tree = screens(vec![icon_frame("a", "home", 0.0), icon_frame("b", "bell", 40.0)]);
    let session = ScanSession::new(EngineConfig::default())
        .with_markings(HashSet::from([NodeId::new("b")]), Default::default());
    let mut icons = ScanSession::new(EngineConfig::default()).scan(&tree).expect("scan").discovered_icons;
    assert_eq!(icons.len(), 2);
    icons[0].status = CandidateStatus::Master;

    let result = session
        .consolidate(&mut tree, &icons, ConsolidationScope::AllPages, None, &mut |_| {})
        .expect("consolidate");
    assert_eq!(result.components_created, 0);
    assert!(tree.node(&NodeId::new("a")).is_ok());
    assert!(tree.node(&NodeId::new("b")).is_ok());
}

#[test]
fn node_turned_into_a_master_after_the_scan_is_left_alone() {
    let mut tree = screens(vec![icon_frame("x", "home", 0.0), icon_frame("y", "home", 40.0)]);
    let session = ScanSession::new(EngineConfig::default());
    let icons = session.scan(&tree).expect("scan").discovered_icons;
    assert_eq!(icons.len(), 2);

    // Between scan and consolidate, `x` became a component with a live instance.
    tree = screens(vec![
        DocumentNode::new("x", "home", NodeKind::Component).sized(24.0, 24.0).with_children(vec![
            DocumentNode::new("x:glyph", "Vector", NodeKind::Vector).sized(20.0, 18.0),
        ]),
        icon_frame("y", "home", 40.0),
        DocumentNode::new("i", "home", NodeKind::Instance)
            .sized(24.0, 24.0)
            .at(80.0, 12.0)
            .instance_of("x"),
    ]);

    let result = session
        .consolidate(&mut tree, &icons, ConsolidationScope::AllPages, None, &mut |_| {})
        .expect("consolidate");
    assert_eq!(result.failed_operations, 1);
    assert_eq!(result.icons_replaced, 1);

    let master = tree.node(&NodeId::new("x")).expect("component kept");
    assert_eq!(master.kind, NodeKind::Component);
    assert_eq!(
        tree.resolve_main_component(&NodeId::new("i")).expect("resolve"),
        Some(NodeId::new("x"))
    );
    assert!(tree.node(&NodeId::new("y")).is_err());
}
