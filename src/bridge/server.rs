//! Engine-side bridge server.
//!
//! One task owns the [`IdBridge`] and its engine. Host requests, engine input
//! events and outgoing selection notifications are multiplexed with
//! `tokio::select!` and handled one at a time, so nothing needs a lock.

use std::time::Duration;

use rmpv::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::engine::{InputEvent, InputEvents, VisualEngine};

use super::error::BridgeError;
use super::id_bridge::IdBridge;
use super::protocol::{Call, Message, SelectedPerson};
use super::selection::SelectionNotifier;
use super::transport;

/// Requests read ahead of the dispatch loop.
const INCOMING_BUFFER: usize = 32;

/// Serves one host connection on top of a visualization engine.
pub struct BridgeServer<E: VisualEngine> {
    bridge: IdBridge<E>,
}

impl<E: VisualEngine + 'static> BridgeServer<E> {
    pub fn new(engine: E) -> Self {
        Self {
            bridge: IdBridge::new(engine),
        }
    }

    pub fn with_layout_animation(engine: E, layout_animation: Duration) -> Self {
        Self {
            bridge: IdBridge::with_layout_animation(engine, layout_animation),
        }
    }

    /// Serves requests until the host disconnects.
    ///
    /// Returns `Ok` on a clean disconnect and the transport error otherwise.
    pub async fn serve<S>(mut self, stream: S) -> Result<(), BridgeError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (mut reader, mut writer) = transport::split(stream);

        // Frame reads are not cancel safe, so they run on their own task.
        let (incoming_tx, mut incoming) = mpsc::channel(INCOMING_BUFFER);
        let read_task = ReadTask(tokio::spawn(async move {
            loop {
                let message = reader.read_message().await;
                let done = !matches!(message, Ok(Some(_)));
                if incoming_tx.send(message).await.is_err() || done {
                    break;
                }
            }
        }));

        let (outbox_tx, mut outbox) = mpsc::unbounded_channel::<SelectedPerson>();
        let mut events: Option<InputEvents<E::Node>> = None;

        tracing::info!("Bridge session started");
        let result = loop {
            tokio::select! {
                message = incoming.recv() => match message {
                    Some(Ok(Some(Message::Request { msgid, method, params }))) => {
                        let outcome = self.dispatch(&method, params, &outbox_tx, &mut events);
                        if let Err(e) = &outcome {
                            tracing::warn!(method = %method, msgid, error = %e, "Request failed");
                        }
                        if let Err(e) = writer.write_message(Message::response(msgid, outcome)).await {
                            break Err(e);
                        }
                    }
                    Some(Ok(Some(other))) => {
                        tracing::warn!(received = ?other, "Ignoring non-request message from host");
                    }
                    Some(Ok(None)) | None => break Ok(()),
                    Some(Err(e)) => break Err(e),
                },
                event = next_input(&mut events) => match event {
                    Some(event) => self.bridge.handle_input(event),
                    None => {
                        tracing::debug!("Engine input closed");
                        events = None;
                    }
                },
                Some(selected) = outbox.recv() => {
                    if let Err(e) = writer.write_message(selected.into_message()).await {
                        tracing::warn!(error = %e, "Failed to deliver selection");
                        break Err(e);
                    }
                }
            }
        };

        drop(read_task);
        match &result {
            Ok(()) => tracing::info!(nodes = self.bridge.node_count(), "Bridge session ended"),
            Err(e) => tracing::warn!(error = %e, "Bridge session failed"),
        }
        result
    }

    fn dispatch(
        &mut self,
        method: &str,
        params: Vec<Value>,
        outbox: &mpsc::UnboundedSender<SelectedPerson>,
        events: &mut Option<InputEvents<E::Node>>,
    ) -> Result<Value, BridgeError> {
        match Call::parse(method, params)? {
            Call::InitializeGraph {
                selector,
                callback_target,
            } => {
                let notifier = SelectionNotifier::new(callback_target, outbox.clone());
                *events = Some(self.bridge.initialize(&selector, notifier)?);
                Ok(Value::Nil)
            }
            Call::CreateNode { label, rect } => {
                self.bridge.create_node(&label, rect).map(Value::from)
            }
            Call::CreateEdge { id1, id2 } => {
                self.bridge.create_edge(id1, id2)?;
                Ok(Value::Nil)
            }
            Call::ApplyHierarchicLayout => {
                self.bridge.apply_layout()?;
                Ok(Value::Nil)
            }
        }
    }
}

/// Frame reader task, aborted when the session ends or is cancelled.
struct ReadTask(JoinHandle<()>);

impl Drop for ReadTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Next engine input event; never resolves before the graph exists.
async fn next_input<N>(events: &mut Option<InputEvents<N>>) -> Option<InputEvent<N>> {
    match events {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}

/// Accepts host connections on a Unix socket, one server per connection.
#[cfg(unix)]
pub async fn listen_unix<E, F>(
    path: impl AsRef<std::path::Path>,
    mut new_server: F,
) -> Result<(), BridgeError>
where
    E: VisualEngine + 'static,
    F: FnMut() -> BridgeServer<E>,
{
    let path = path.as_ref();
    let listener = tokio::net::UnixListener::bind(path)?;
    tracing::info!(socket = %path.display(), "Listening for hosts");

    loop {
        let (stream, _) = listener.accept().await?;
        let server = new_server();
        tokio::spawn(async move {
            if let Err(e) = server.serve(stream).await {
                tracing::warn!(error = %e, "Host session ended with error");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::protocol::{CREATE_NODE, INITIALIZE_GRAPH, SET_SELECTED_PERSON};
    use crate::bridge::transport::{FrameReader, FrameWriter};
    use crate::engine::HeadlessEngine;
    use tokio::io::{DuplexStream, ReadHalf, WriteHalf};

    struct RawHost {
        reader: FrameReader<ReadHalf<DuplexStream>>,
        writer: FrameWriter<WriteHalf<DuplexStream>>,
        next_msgid: u32,
    }

    impl RawHost {
        fn start(engine: HeadlessEngine) -> Self {
            let (host, remote) = tokio::io::duplex(4096);
            tokio::spawn(BridgeServer::new(engine).serve(remote));
            let (reader, writer) = transport::split(host);
            Self {
                reader,
                writer,
                next_msgid: 0,
            }
        }

        async fn request(&mut self, method: &str, params: Vec<Value>) -> Message {
            let msgid = self.next_msgid;
            self.next_msgid += 1;
            self.writer
                .write_message(Message::Request {
                    msgid,
                    method: method.to_string(),
                    params,
                })
                .await
                .unwrap();
            self.reader.read_message().await.unwrap().unwrap()
        }
    }

    #[tokio::test]
    async fn test_cancelled_session_closes_stream() {
        let (host, remote) = tokio::io::duplex(4096);
        let session = tokio::spawn(BridgeServer::new(HeadlessEngine::new()).serve(remote));
        let (mut reader, _writer) = transport::split(host);

        session.abort();
        assert!(session.await.unwrap_err().is_cancelled());
        assert_eq!(reader.read_message().await.unwrap(), None);
    }

    fn result(message: Message) -> Value {
        match message {
            Message::Response {
                error: None,
                result,
                ..
            } => result,
            other => panic!("expected successful response, got {:?}", other),
        }
    }

    fn error_kind(message: Message) -> String {
        match message {
            Message::Response {
                error: Some(err), ..
            } => err.kind,
            other => panic!("expected error response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_requests_are_dispatched() {
        let engine = HeadlessEngine::new();
        let mut host = RawHost::start(engine.clone());

        let reply = host
            .request(INITIALIZE_GRAPH, vec![Value::from("#g"), Value::from("t")])
            .await;
        assert_eq!(result(reply), Value::Nil);

        for expected in 0..3 {
            let reply = host
                .request(CREATE_NODE, vec![Value::from("p"), Value::Nil])
                .await;
            assert_eq!(result(reply), Value::from(expected));
        }
        assert_eq!(engine.node_count(), 3);
        assert_eq!(engine.selector().as_deref(), Some("#g"));
    }

    #[tokio::test]
    async fn test_errors_become_error_responses() {
        let mut host = RawHost::start(HeadlessEngine::new());

        let reply = host
            .request(CREATE_NODE, vec![Value::from("p"), Value::Nil])
            .await;
        assert_eq!(error_kind(reply), "not_initialized");

        let reply = host.request("removeNode", vec![]).await;
        assert_eq!(error_kind(reply), "unknown_method");

        let reply = host.request(INITIALIZE_GRAPH, vec![Value::from(1)]).await;
        assert_eq!(error_kind(reply), "invalid_params");
    }

    #[tokio::test]
    async fn test_clicks_become_notifications() {
        let engine = HeadlessEngine::new();
        let mut host = RawHost::start(engine.clone());

        host.request(INITIALIZE_GRAPH, vec![Value::from("#g"), Value::from("t")])
            .await;
        host.request(CREATE_NODE, vec![Value::from("p"), Value::Nil])
            .await;

        assert!(engine.click_node(0));
        let Some(Message::Notification { method, params }) =
            host.reader.read_message().await.unwrap()
        else {
            panic!("expected notification");
        };
        assert_eq!(method, SET_SELECTED_PERSON);
        assert_eq!(params, vec![Value::from("t"), Value::from(0)]);
    }

    #[tokio::test]
    async fn test_serve_returns_on_disconnect() {
        let (host, remote) = tokio::io::duplex(64);
        let session = tokio::spawn(BridgeServer::new(HeadlessEngine::new()).serve(remote));
        drop(host);
        assert_eq!(session.await.unwrap(), Ok(()));
    }
}
