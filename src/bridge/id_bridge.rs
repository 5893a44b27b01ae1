//! Engine-side id bridge.
//!
//! Gives the host a stable integer identity for every node it creates and turns
//! engine clicks back into that identity. The bridge is the only place that
//! holds engine node handles.

use std::time::Duration;

use crate::engine::{InputEvent, InputEvents, Item, LayoutKind, LayoutRequest, Rect, VisualEngine};

use super::error::BridgeError;
use super::identity::IdentityMap;
use super::protocol::NO_SELECTION;
use super::selection::SelectionNotifier;

/// Duration of the animated layout transition when nothing else is configured.
pub const DEFAULT_LAYOUT_ANIMATION: Duration = Duration::from_millis(200);

/// Id bridge over a visualization engine.
///
/// Owned by a single task together with its engine; nothing here is shared.
pub struct IdBridge<E: VisualEngine> {
    engine: E,
    identities: IdentityMap<E::Node>,
    notifier: Option<SelectionNotifier>,
    layout_animation: Duration,
}

impl<E: VisualEngine> IdBridge<E> {
    pub fn new(engine: E) -> Self {
        Self::with_layout_animation(engine, DEFAULT_LAYOUT_ANIMATION)
    }

    pub fn with_layout_animation(engine: E, layout_animation: Duration) -> Self {
        Self {
            engine,
            identities: IdentityMap::new(),
            notifier: None,
            layout_animation,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.notifier.is_some()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Number of nodes created through the bridge.
    pub fn node_count(&self) -> usize {
        self.identities.len()
    }

    /// Creates the engine graph and remembers where selections go.
    ///
    /// Returns the engine's input events; feed them to [`Self::handle_input`].
    pub fn initialize(
        &mut self,
        selector: &str,
        notifier: SelectionNotifier,
    ) -> Result<InputEvents<E::Node>, BridgeError> {
        if self.is_initialized() {
            return Err(BridgeError::AlreadyInitialized);
        }
        let events = self.engine.create_graph(selector)?;
        tracing::info!(
            selector,
            callback = notifier.callback_target(),
            "Graph initialized"
        );
        self.notifier = Some(notifier);
        Ok(events)
    }

    /// Creates a labelled node and returns its id.
    ///
    /// If the label cannot be attached the node is removed again, so a failed
    /// call leaves neither an engine node nor an id behind.
    pub fn create_node(&mut self, label: &str, rect: Option<Rect>) -> Result<i64, BridgeError> {
        self.ensure_initialized()?;
        if let Some(rect) = rect {
            validate_rect(&rect)?;
        }

        let node = self.engine.create_node(rect)?;
        if let Err(e) = self.engine.add_label(&node, label) {
            if let Err(rollback) = self.engine.remove_node(&node) {
                tracing::warn!(error = %rollback, ?node, "Failed to remove unlabelled node");
            }
            return Err(e.into());
        }
        let id = self.identities.insert(node);

        tracing::debug!(id, label, "Created node");
        Ok(id)
    }

    /// Connects two nodes by id. Unknown ids make this a no-op.
    pub fn create_edge(&mut self, id1: i64, id2: i64) -> Result<(), BridgeError> {
        self.ensure_initialized()?;

        let (Some(source), Some(target)) = (self.identities.handle(id1), self.identities.handle(id2))
        else {
            tracing::debug!(id1, id2, "Skipping edge with unknown endpoint");
            return Ok(());
        };
        self.engine.create_edge(source, target)?;

        tracing::debug!(id1, id2, "Created edge");
        Ok(())
    }

    /// Enqueues an animated hierarchic layout pass.
    pub fn apply_layout(&mut self) -> Result<(), BridgeError> {
        self.ensure_initialized()?;
        self.engine.apply_layout(LayoutRequest {
            kind: LayoutKind::Hierarchic,
            animation: self.layout_animation,
        })?;
        tracing::debug!(
            animation_ms = self.layout_animation.as_millis() as u64,
            "Layout enqueued"
        );
        Ok(())
    }

    /// Id a click refers to, [`NO_SELECTION`] for anything but a known node.
    pub fn resolve(&self, event: &InputEvent<E::Node>) -> i64 {
        match event {
            InputEvent::ItemClicked(Item::Node(node)) => {
                self.identities.id_of(node).unwrap_or(NO_SELECTION)
            }
            InputEvent::ItemClicked(_) | InputEvent::CanvasClicked => NO_SELECTION,
        }
    }

    /// Resolves a click and notifies the host.
    pub fn handle_input(&self, event: InputEvent<E::Node>) {
        let id = self.resolve(&event);
        match &self.notifier {
            Some(notifier) => notifier.deliver(id),
            None => tracing::debug!(id, "Click before initialization ignored"),
        }
    }

    fn ensure_initialized(&self) -> Result<(), BridgeError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(BridgeError::NotInitialized)
        }
    }
}

pub(super) fn validate_rect(rect: &Rect) -> Result<(), BridgeError> {
    if !rect.is_finite() {
        return Err(BridgeError::InvalidRect(format!(
            "all values must be finite, got {:?}",
            rect
        )));
    }
    if rect.width < 0.0 || rect.height < 0.0 {
        return Err(BridgeError::InvalidRect(format!(
            "size must not be negative, got {}x{}",
            rect.width, rect.height
        )));
    }
    Ok(())
}
