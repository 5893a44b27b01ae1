//! Length-prefixed msgpack framing over async byte streams.
//!
//! Every message is written as a 4-byte big-endian length followed by the
//! msgpack encoding of [`Message::into_value`].

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};

use super::error::BridgeError;
use super::protocol::Message;

/// Largest accepted frame.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Encodes a message into a frame body (without the length prefix).
pub fn encode_message(message: Message) -> Result<Vec<u8>, BridgeError> {
    let mut buf = Vec::new();
    rmpv::encode::write_value(&mut buf, &message.into_value())
        .map_err(|e| BridgeError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Decodes a frame body.
pub fn decode_message(body: &[u8]) -> Result<Message, BridgeError> {
    let mut cursor = body;
    let value =
        rmpv::decode::read_value(&mut cursor).map_err(|e| BridgeError::Decode(e.to_string()))?;
    if !cursor.is_empty() {
        return Err(BridgeError::Decode(format!(
            "{} trailing bytes after message",
            cursor.len()
        )));
    }
    Message::from_value(value)
}

/// Reads framed messages from a byte stream.
pub struct FrameReader<R> {
    inner: R,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Reads the next message. Returns `None` when the stream ends cleanly
    /// between frames.
    pub async fn read_message(&mut self) -> Result<Option<Message>, BridgeError> {
        let len = match self.inner.read_u32().await {
            Ok(len) => len as usize,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if len > MAX_FRAME_LEN {
            return Err(BridgeError::FrameTooLarge(len));
        }

        let mut body = vec![0u8; len];
        self.inner.read_exact(&mut body).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                BridgeError::ConnectionClosed
            } else {
                e.into()
            }
        })?;
        decode_message(&body).map(Some)
    }
}

/// Writes framed messages to a byte stream.
pub struct FrameWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub async fn write_message(&mut self, message: Message) -> Result<(), BridgeError> {
        let body = encode_message(message)?;
        if body.len() > MAX_FRAME_LEN {
            return Err(BridgeError::FrameTooLarge(body.len()));
        }
        self.inner.write_u32(body.len() as u32).await?;
        self.inner.write_all(&body).await?;
        self.inner.flush().await?;
        Ok(())
    }
}

/// Splits a duplex stream into a frame reader and writer.
pub fn split<S>(stream: S) -> (FrameReader<ReadHalf<S>>, FrameWriter<WriteHalf<S>>)
where
    S: AsyncRead + AsyncWrite,
{
    let (read, write) = tokio::io::split(stream);
    (FrameReader::new(read), FrameWriter::new(write))
}
