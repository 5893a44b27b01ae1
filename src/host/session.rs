//! Rendering a hierarchy through the bridge and tracking the selection.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::bridge::{BridgeClient, BridgeError, CallbackTarget};
use crate::config::GraphConfig;
use crate::models::{Hierarchy, Person};

type PeopleById = Arc<Mutex<HashMap<i64, usize>>>;

/// A hierarchy drawn on the engine, with the currently selected person.
///
/// The selection is driven by `SetSelectedPerson` notifications: a known id
/// selects that person, `-1` or an id this session never created clears it.
pub struct HostSession {
    client: BridgeClient,
    hierarchy: Hierarchy,
    node_ids: Vec<i64>,
    callback_target: CallbackTarget,
    selection: watch::Receiver<Option<usize>>,
}

impl HostSession {
    /// Draws `hierarchy`: one labelled node per person, one edge per link,
    /// then an animated hierarchic layout.
    pub async fn render(
        mut client: BridgeClient,
        hierarchy: Hierarchy,
        graph: &GraphConfig,
    ) -> Result<Self, BridgeError> {
        let people_by_id: PeopleById = Arc::default();
        let (selected_tx, selection) = watch::channel(None);

        let callback_target = client.callbacks().register({
            let people_by_id = people_by_id.clone();
            move |id| {
                let index = lock(&people_by_id).get(&id).copied();
                selected_tx.send_replace(index);
            }
        });

        client
            .initialize_graph(&graph.selector, &callback_target)
            .await?;

        let rect = graph.node_rect();
        let mut node_ids = Vec::with_capacity(hierarchy.people().len());
        for (index, person) in hierarchy.people().iter().enumerate() {
            let id = client.create_node(&person.to_string(), rect).await?;
            // A click on this node that arrives before the reply above is read
            // finds no entry yet and clears the selection.
            lock(&people_by_id).insert(id, index);
            node_ids.push(id);
        }

        for link in hierarchy.links() {
            client
                .create_edge(node_ids[link.parent], node_ids[link.child])
                .await?;
        }

        client.apply_hierarchic_layout().await?;

        tracing::info!(
            people = hierarchy.people().len(),
            links = hierarchy.links().len(),
            "Hierarchy rendered"
        );

        Ok(Self {
            client,
            hierarchy,
            node_ids,
            callback_target,
            selection,
        })
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Engine id of the node showing person `index`.
    pub fn node_id(&self, index: usize) -> Option<i64> {
        self.node_ids.get(index).copied()
    }

    /// Index of the selected person.
    pub fn selected_index(&self) -> Option<usize> {
        *self.selection.borrow()
    }

    /// The selected person, if any.
    pub fn selected(&self) -> Option<&Person> {
        self.selected_index()
            .and_then(|index| self.hierarchy.person(index))
    }

    /// Receiver that observes every selection change.
    pub fn selection(&self) -> watch::Receiver<Option<usize>> {
        self.selection.clone()
    }

    /// Waits for the next selection notification and returns the new selection.
    ///
    /// Fails with [`BridgeError::ConnectionClosed`] once the engine is gone.
    pub async fn selection_changed(&mut self) -> Result<Option<usize>, BridgeError> {
        self.selection
            .changed()
            .await
            .map_err(|_| BridgeError::ConnectionClosed)?;
        Ok(*self.selection.borrow_and_update())
    }
}

impl Drop for HostSession {
    fn drop(&mut self) {
        self.client.callbacks().unregister(&self.callback_target);
    }
}

fn lock(people: &PeopleById) -> MutexGuard<'_, HashMap<i64, usize>> {
    people.lock().unwrap_or_else(PoisonError::into_inner)
}
