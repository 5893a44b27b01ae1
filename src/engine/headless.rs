//! In-memory engine without a display.
//!
//! Keeps the scene (nodes, labels, edges, layout passes) in shared state so a
//! clone of the engine can inspect it and simulate clicks while the original is
//! owned by a bridge server.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use super::{
    EngineError, InputEvent, InputEvents, Item, LayoutKind, LayoutRequest, Rect, VisualEngine,
};

/// Size of nodes created without explicit bounds.
const DEFAULT_NODE_SIZE: f64 = 30.0;
/// Horizontal distance between neighbouring nodes.
const NODE_SPACING: f64 = 60.0;
/// Vertical distance between hierarchy layers.
const LAYER_SPACING: f64 = 90.0;

/// Opaque handle of a headless node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey(usize);

#[derive(Debug, Clone)]
struct SceneNode {
    bounds: Rect,
    labels: Vec<String>,
}

#[derive(Default)]
struct Scene {
    selector: Option<String>,
    /// Indexed by creation order. Removed nodes leave an empty slot.
    nodes: Vec<Option<SceneNode>>,
    edges: Vec<(usize, usize)>,
    layouts: Vec<LayoutRequest>,
    input: Option<mpsc::UnboundedSender<InputEvent<NodeKey>>>,
}

impl Scene {
    fn node(&self, index: usize) -> Option<&SceneNode> {
        self.nodes.get(index).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, index: usize) -> Option<&mut SceneNode> {
        self.nodes.get_mut(index).and_then(Option::as_mut)
    }
}

/// Headless implementation of [`VisualEngine`].
#[derive(Clone, Default)]
pub struct HeadlessEngine {
    scene: Arc<Mutex<Scene>>,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selector the graph was created for, if any.
    pub fn selector(&self) -> Option<String> {
        self.scene().selector.clone()
    }

    /// Number of nodes in the graph, not counting removed ones.
    pub fn node_count(&self) -> usize {
        self.scene().nodes.iter().flatten().count()
    }

    pub fn edge_count(&self) -> usize {
        self.scene().edges.len()
    }

    /// Edges as pairs of node creation indices.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.scene().edges.clone()
    }

    /// Labels of the `index`-th created node.
    pub fn labels(&self, index: usize) -> Option<Vec<String>> {
        self.scene().node(index).map(|n| n.labels.clone())
    }

    /// Current bounds of the `index`-th created node.
    pub fn bounds(&self, index: usize) -> Option<Rect> {
        self.scene().node(index).map(|n| n.bounds)
    }

    /// Layout passes requested so far.
    pub fn layouts(&self) -> Vec<LayoutRequest> {
        self.scene().layouts.clone()
    }

    /// Simulates a click on the empty canvas.
    pub fn click_canvas(&self) -> bool {
        self.emit(InputEvent::CanvasClicked)
    }

    /// Simulates a click on the `index`-th created node.
    pub fn click_node(&self, index: usize) -> bool {
        if self.scene().node(index).is_none() {
            return false;
        }
        self.emit(InputEvent::ItemClicked(Item::Node(NodeKey(index))))
    }

    /// Simulates a click on a label of the `index`-th created node.
    pub fn click_label(&self, index: usize) -> bool {
        let has_label = self
            .scene()
            .node(index)
            .is_some_and(|n| !n.labels.is_empty());
        has_label && self.emit(InputEvent::ItemClicked(Item::Label))
    }

    /// Simulates a click on the `index`-th created edge.
    pub fn click_edge(&self, index: usize) -> bool {
        if index >= self.edge_count() {
            return false;
        }
        self.emit(InputEvent::ItemClicked(Item::Edge))
    }

    /// Simulates a click at a point, hit-testing nodes topmost first.
    pub fn click_at(&self, x: f64, y: f64) -> bool {
        let hit = self
            .scene()
            .nodes
            .iter()
            .rposition(|n| n.as_ref().is_some_and(|n| n.bounds.contains(x, y)));
        match hit {
            Some(index) => self.emit(InputEvent::ItemClicked(Item::Node(NodeKey(index)))),
            None => self.emit(InputEvent::CanvasClicked),
        }
    }

    fn emit(&self, event: InputEvent<NodeKey>) -> bool {
        let scene = self.scene();
        match &scene.input {
            Some(tx) => tx.send(event).is_ok(),
            None => {
                tracing::debug!("Click ignored, graph not created");
                false
            }
        }
    }

    fn scene(&self) -> MutexGuard<'_, Scene> {
        self.scene.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl VisualEngine for HeadlessEngine {
    type Node = NodeKey;

    fn create_graph(&mut self, selector: &str) -> Result<InputEvents<NodeKey>, EngineError> {
        let mut scene = self.scene();
        if scene.selector.is_some() {
            return Err(EngineError(format!(
                "graph already created for '{}'",
                scene.selector.as_deref().unwrap_or_default()
            )));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        scene.selector = Some(selector.to_string());
        scene.input = Some(tx);
        Ok(rx)
    }

    fn create_node(&mut self, bounds: Option<Rect>) -> Result<NodeKey, EngineError> {
        let mut scene = self.scene();
        let index = scene.nodes.len();
        let bounds = bounds.unwrap_or_else(|| {
            Rect::new(
                index as f64 * NODE_SPACING,
                0.0,
                DEFAULT_NODE_SIZE,
                DEFAULT_NODE_SIZE,
            )
        });
        scene.nodes.push(Some(SceneNode {
            bounds,
            labels: Vec::new(),
        }));
        Ok(NodeKey(index))
    }

    fn remove_node(&mut self, node: &NodeKey) -> Result<(), EngineError> {
        let mut scene = self.scene();
        scene
            .nodes
            .get_mut(node.0)
            .and_then(Option::take)
            .ok_or_else(|| EngineError(format!("unknown node {:?}", node)))?;
        scene
            .edges
            .retain(|&(from, to)| from != node.0 && to != node.0);
        Ok(())
    }

    fn add_label(&mut self, node: &NodeKey, text: &str) -> Result<(), EngineError> {
        let mut scene = self.scene();
        let target = scene
            .node_mut(node.0)
            .ok_or_else(|| EngineError(format!("unknown node {:?}", node)))?;
        target.labels.push(text.to_string());
        Ok(())
    }

    fn create_edge(&mut self, source: &NodeKey, target: &NodeKey) -> Result<(), EngineError> {
        let mut scene = self.scene();
        if scene.node(source.0).is_none() || scene.node(target.0).is_none() {
            return Err(EngineError(format!(
                "edge endpoints {:?} -> {:?} not in graph",
                source, target
            )));
        }
        scene.edges.push((source.0, target.0));
        Ok(())
    }

    fn apply_layout(&mut self, request: LayoutRequest) -> Result<(), EngineError> {
        let mut scene = self.scene();
        match request.kind {
            LayoutKind::Hierarchic => layer_nodes(&mut scene),
        }
        scene.layouts.push(request);
        Ok(())
    }
}

/// Places nodes in layers by their distance from a source along edges.
fn layer_nodes(scene: &mut Scene) {
    let n = scene.nodes.len();
    let mut depth = vec![0usize; n];

    // Bounded relaxation: cycles cannot push depths past n.
    for _ in 0..n {
        let mut changed = false;
        for &(from, to) in &scene.edges {
            if depth[to] < depth[from] + 1 && depth[from] + 1 < n {
                depth[to] = depth[from] + 1;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let mut next_slot = vec![0usize; n.max(1)];
    for (index, entry) in scene.nodes.iter_mut().enumerate() {
        let Some(node) = entry else { continue };
        let layer = depth[index];
        let slot = next_slot[layer];
        next_slot[layer] += 1;
        node.bounds.x = slot as f64 * NODE_SPACING;
        node.bounds.y = layer as f64 * LAYER_SPACING;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn layout() -> LayoutRequest {
        LayoutRequest {
            kind: LayoutKind::Hierarchic,
            animation: Duration::from_millis(200),
        }
    }

    #[test]
    fn test_create_graph_once() {
        let mut engine = HeadlessEngine::new();
        assert!(engine.create_graph("#graph").is_ok());
        assert!(engine.create_graph("#graph").is_err());
        assert_eq!(engine.selector().as_deref(), Some("#graph"));
    }

    #[test]
    fn test_nodes_labels_edges() {
        let mut engine = HeadlessEngine::new();
        let a = engine.create_node(None).unwrap();
        let b = engine
            .create_node(Some(Rect::new(5.0, 5.0, 40.0, 20.0)))
            .unwrap();
        engine.add_label(&a, "Ada Albers").unwrap();
        engine.create_edge(&a, &b).unwrap();

        assert_eq!(engine.node_count(), 2);
        assert_eq!(engine.edges(), vec![(0, 1)]);
        assert_eq!(engine.labels(0).unwrap(), vec!["Ada Albers".to_string()]);
        assert_eq!(engine.bounds(1), Some(Rect::new(5.0, 5.0, 40.0, 20.0)));
    }

    #[test]
    fn test_remove_node_drops_its_edges() {
        let mut engine = HeadlessEngine::new();
        let mut events = engine.create_graph("#graph").unwrap();
        let a = engine.create_node(None).unwrap();
        let b = engine.create_node(None).unwrap();
        let c = engine.create_node(None).unwrap();
        engine.create_edge(&a, &b).unwrap();
        engine.create_edge(&b, &c).unwrap();
        engine.create_edge(&a, &c).unwrap();

        engine.remove_node(&b).unwrap();

        assert_eq!(engine.node_count(), 2);
        assert_eq!(engine.edges(), vec![(0, 2)]);
        assert!(engine.labels(1).is_none());
        assert!(!engine.click_node(1));
        assert!(engine.remove_node(&b).is_err());
        assert!(engine.add_label(&b, "gone").is_err());
        assert!(engine.create_edge(&a, &b).is_err());

        // Later nodes keep their own slot.
        let d = engine.create_node(None).unwrap();
        assert_eq!(d, NodeKey(3));
        engine.apply_layout(layout()).unwrap();
        assert_eq!(engine.bounds(2).unwrap().y, LAYER_SPACING);

        assert!(engine.click_node(3));
        assert_eq!(
            events.try_recv().unwrap(),
            InputEvent::ItemClicked(Item::Node(d))
        );
    }

    #[test]
    fn test_layout_layers_children_below_parents() {
        let mut engine = HeadlessEngine::new();
        let root = engine.create_node(None).unwrap();
        let left = engine.create_node(None).unwrap();
        let right = engine.create_node(None).unwrap();
        let grandchild = engine.create_node(None).unwrap();
        engine.create_edge(&root, &left).unwrap();
        engine.create_edge(&root, &right).unwrap();
        engine.create_edge(&left, &grandchild).unwrap();

        engine.apply_layout(layout()).unwrap();

        let y = |i| engine.bounds(i).unwrap().y;
        assert_eq!(y(0), 0.0);
        assert_eq!(y(1), LAYER_SPACING);
        assert_eq!(y(2), LAYER_SPACING);
        assert_eq!(y(3), 2.0 * LAYER_SPACING);
        assert_ne!(engine.bounds(1).unwrap().x, engine.bounds(2).unwrap().x);
        assert_eq!(engine.layouts(), vec![layout()]);
    }

    #[test]
    fn test_clicks_need_a_graph() {
        let mut engine = HeadlessEngine::new();
        engine.create_node(None).unwrap();
        assert!(!engine.click_canvas());
        assert!(!engine.click_node(0));
    }

    #[test]
    fn test_click_events_in_order() {
        let mut engine = HeadlessEngine::new();
        let mut events = engine.create_graph("#graph").unwrap();
        let a = engine.create_node(None).unwrap();
        let b = engine.create_node(None).unwrap();
        engine.add_label(&a, "A").unwrap();
        engine.create_edge(&a, &b).unwrap();

        assert!(engine.click_node(1));
        assert!(engine.click_canvas());
        assert!(engine.click_label(0));
        assert!(engine.click_edge(0));
        assert!(!engine.click_node(2));
        assert!(!engine.click_label(1));

        assert_eq!(
            events.try_recv().unwrap(),
            InputEvent::ItemClicked(Item::Node(b))
        );
        assert_eq!(events.try_recv().unwrap(), InputEvent::CanvasClicked);
        assert_eq!(
            events.try_recv().unwrap(),
            InputEvent::ItemClicked(Item::Label)
        );
        assert_eq!(
            events.try_recv().unwrap(),
            InputEvent::ItemClicked(Item::Edge)
        );
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_click_at_hit_tests_nodes() {
        let mut engine = HeadlessEngine::new();
        let mut events = engine.create_graph("#graph").unwrap();
        let node = engine
            .create_node(Some(Rect::new(0.0, 0.0, 10.0, 10.0)))
            .unwrap();

        assert!(engine.click_at(5.0, 5.0));
        assert!(engine.click_at(50.0, 50.0));

        assert_eq!(
            events.try_recv().unwrap(),
            InputEvent::ItemClicked(Item::Node(node))
        );
        assert_eq!(events.try_recv().unwrap(), InputEvent::CanvasClicked);
    }
}
