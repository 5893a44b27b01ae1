//! Host-side bridge client.
//!
//! Sends calls to the engine as msgpack-RPC requests and awaits their
//! responses. A background reader task routes responses back to the waiting
//! call and hands `SetSelectedPerson` notifications to the callback registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rmpv::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::engine::Rect;

use super::callbacks::{CallbackRegistry, CallbackTarget};
use super::error::BridgeError;
use super::id_bridge::validate_rect;
use super::protocol::{Call, Message};
use super::transport::{FrameReader, FrameWriter};

type Reply = oneshot::Sender<Result<Value, BridgeError>>;

/// In-flight requests by msgid. `None` once the connection is gone.
type PendingCalls = Arc<Mutex<Option<HashMap<u32, Reply>>>>;

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Bridge client for the host side of the connection.
pub struct BridgeClient {
    writer: FrameWriter<BoxedWriter>,
    pending: PendingCalls,
    callbacks: CallbackRegistry,
    next_msgid: u32,
    reader: JoinHandle<()>,
}

impl BridgeClient {
    /// Starts a client over an established byte stream.
    pub fn connect<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read, write) = tokio::io::split(stream);
        let pending: PendingCalls = Arc::new(Mutex::new(Some(HashMap::new())));
        let callbacks = CallbackRegistry::new();

        let reader = tokio::spawn(read_loop(
            FrameReader::new(read),
            pending.clone(),
            callbacks.clone(),
        ));

        Self {
            writer: FrameWriter::new(Box::new(write) as BoxedWriter),
            pending,
            callbacks,
            next_msgid: 0,
            reader,
        }
    }

    /// Connects to an engine listening on a Unix socket.
    #[cfg(unix)]
    pub async fn connect_unix(path: impl AsRef<std::path::Path>) -> Result<Self, BridgeError> {
        let path = path.as_ref();
        let stream = tokio::net::UnixStream::connect(path).await?;
        tracing::info!(socket = %path.display(), "Connected to engine");
        Ok(Self::connect(stream))
    }

    /// Registry that receives selection notifications.
    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    pub async fn initialize_graph(
        &mut self,
        selector: &str,
        callback_target: &CallbackTarget,
    ) -> Result<(), BridgeError> {
        self.call(Call::InitializeGraph {
            selector: selector.to_string(),
            callback_target: callback_target.as_str().to_string(),
        })
        .await?;
        Ok(())
    }

    /// Creates a labelled node and returns its id.
    pub async fn create_node(
        &mut self,
        label: &str,
        rect: Option<Rect>,
    ) -> Result<i64, BridgeError> {
        if let Some(rect) = &rect {
            validate_rect(rect)?;
        }
        let result = self
            .call(Call::CreateNode {
                label: label.to_string(),
                rect,
            })
            .await?;
        result.as_i64().ok_or_else(|| {
            BridgeError::UnexpectedResponse(format!("createNode returned {}", result))
        })
    }

    pub async fn create_edge(&mut self, id1: i64, id2: i64) -> Result<(), BridgeError> {
        self.call(Call::CreateEdge { id1, id2 }).await?;
        Ok(())
    }

    pub async fn apply_hierarchic_layout(&mut self) -> Result<(), BridgeError> {
        self.call(Call::ApplyHierarchicLayout).await?;
        Ok(())
    }

    async fn call(&mut self, call: Call) -> Result<Value, BridgeError> {
        let msgid = self.next_msgid;
        self.next_msgid = self.next_msgid.wrapping_add(1);
        let method = call.method();

        let (tx, rx) = oneshot::channel();
        match lock(&self.pending).as_mut() {
            Some(pending) => {
                pending.insert(msgid, tx);
            }
            None => return Err(BridgeError::ConnectionClosed),
        }

        let request = Message::Request {
            msgid,
            method: method.to_string(),
            params: call.into_params(),
        };
        if let Err(e) = self.writer.write_message(request).await {
            if let Some(pending) = lock(&self.pending).as_mut() {
                pending.remove(&msgid);
            }
            return Err(e);
        }
        tracing::debug!(method, msgid, "Sent request");

        rx.await.unwrap_or(Err(BridgeError::ConnectionClosed))
    }
}

impl Drop for BridgeClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop<R>(mut reader: FrameReader<R>, pending: PendingCalls, callbacks: CallbackRegistry)
where
    R: AsyncRead + Unpin,
{
    loop {
        match reader.read_message().await {
            Ok(Some(Message::Response {
                msgid,
                error,
                result,
            })) => {
                let reply = lock(&pending).as_mut().and_then(|p| p.remove(&msgid));
                let Some(reply) = reply else {
                    tracing::warn!(msgid, "Response for unknown request");
                    continue;
                };
                let outcome = match error {
                    Some(err) => Err(BridgeError::from(err)),
                    None => Ok(result),
                };
                // The caller may have given up waiting.
                let _ = reply.send(outcome);
            }
            Ok(Some(Message::Notification { method, params })) => {
                callbacks.dispatch(&method, params);
            }
            Ok(Some(Message::Request { method, msgid, .. })) => {
                tracing::warn!(method = %method, msgid, "Ignoring request from engine");
            }
            Ok(None) => {
                tracing::debug!("Engine closed the connection");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Bridge connection failed");
                break;
            }
        }
    }

    let orphaned = lock(&pending).take().unwrap_or_default();
    for (_, reply) in orphaned {
        let _ = reply.send(Err(BridgeError::ConnectionClosed));
    }

    // No more notifications can arrive. Dropping the handlers closes whatever
    // channels they feed, which is how selection watchers learn of the hang-up.
    let dropped = callbacks.clear();
    tracing::debug!(dropped, "Selection callbacks released");
}

fn lock(pending: &PendingCalls) -> MutexGuard<'_, Option<HashMap<u32, Reply>>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}
