//! Visualization engine capability.
//!
//! The engine owns drawing, hit-testing, layout and animation. The rest of the
//! crate only sees the narrow surface defined here:
//!
//! - [`VisualEngine`]: create a graph, nodes, labels and edges, run a layout
//! - [`InputEvent`]: clicks reported by the engine's input surface
//! - [`Rect`]: placement of a node in the engine's coordinate space
//!
//! Node handles are the engine's associated type. They never leave the engine
//! runtime; only the id bridge holds them.

mod headless;

pub use headless::{HeadlessEngine, NodeKey};

use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Failure reported by the engine runtime itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct EngineError(pub String);

/// Position and size of a node in engine coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when all four values are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// True when the point lies inside the rectangle (edges included).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// Which layout algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// Tree-oriented layered layout.
    Hierarchic,
}

/// A layout pass request. The engine animates towards the result on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutRequest {
    pub kind: LayoutKind,
    pub animation: Duration,
}

/// An item the user can click on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item<N> {
    Node(N),
    Label,
    Edge,
}

/// Input reported by the engine's input surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent<N> {
    /// The empty canvas was clicked.
    CanvasClicked,
    /// An item was clicked.
    ItemClicked(Item<N>),
}

/// Receiving end of the listeners installed on a graph's input surface.
pub type InputEvents<N> = mpsc::UnboundedReceiver<InputEvent<N>>;

/// The rendering engine as seen from the bridge.
pub trait VisualEngine: Send {
    /// Opaque handle of a node inside the engine.
    type Node: Clone + Eq + Hash + Debug + Send + 'static;

    /// Creates the graph hosted at `selector` and installs the canvas and item
    /// click listeners. Events arrive on the returned receiver in input order.
    fn create_graph(&mut self, selector: &str) -> Result<InputEvents<Self::Node>, EngineError>;

    /// Creates a node. Without `bounds` the engine picks placement and size.
    fn create_node(&mut self, bounds: Option<Rect>) -> Result<Self::Node, EngineError>;

    /// Removes a node together with its labels and edges.
    fn remove_node(&mut self, node: &Self::Node) -> Result<(), EngineError>;

    /// Attaches a text label to a node.
    fn add_label(&mut self, node: &Self::Node, text: &str) -> Result<(), EngineError>;

    /// Creates an edge from `source` to `target`.
    fn create_edge(&mut self, source: &Self::Node, target: &Self::Node)
        -> Result<(), EngineError>;

    /// Starts a layout pass. Returns once the pass is enqueued.
    fn apply_layout(&mut self, request: LayoutRequest) -> Result<(), EngineError>;
}
