//! Engine-side delivery of selection changes to the host.

use tokio::sync::mpsc;

use super::protocol::SelectedPerson;

/// Fire-and-forget channel for `SetSelectedPerson` notifications.
///
/// Created at graph initialization with the callback target the host handed
/// over. Delivery never fails from the caller's point of view: if the outbound
/// side is gone the notification is logged and dropped.
#[derive(Debug, Clone)]
pub struct SelectionNotifier {
    callback_target: String,
    outbox: mpsc::UnboundedSender<SelectedPerson>,
}

impl SelectionNotifier {
    pub fn new(
        callback_target: impl Into<String>,
        outbox: mpsc::UnboundedSender<SelectedPerson>,
    ) -> Self {
        Self {
            callback_target: callback_target.into(),
            outbox,
        }
    }

    pub fn callback_target(&self) -> &str {
        &self.callback_target
    }

    /// Queues a selection notification for the host.
    pub fn deliver(&self, id: i64) {
        let notification = SelectedPerson {
            callback_target: self.callback_target.clone(),
            id,
        };
        if self.outbox.send(notification).is_err() {
            tracing::warn!(id, "Selection dropped, host connection gone");
        }
    }
}
