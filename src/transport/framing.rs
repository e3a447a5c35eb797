//! Shared framing pipelines.
//!
//! Both connection roles read and write messages the same way; the logic
//! lives here as small functions generic over `AsyncRead`/`AsyncWrite` so the
//! role state machines stay free of byte-level concerns.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::core::message::{Message, MessageHeader, MessageId, HEADER_LEN};
use crate::error::Result;

/// Read messages until the stream fails or closes, handing each completed
/// message to `deliver`.
///
/// Header first, then exactly `body_len` body bytes. The loop is unbounded
/// and self-sustaining; the only backpressure is the OS socket buffer. Note
/// that the advertised body length is trusted as-is when sizing the receive
/// buffer.
pub(crate) async fn read_loop<T, R, F>(mut reader: R, mut deliver: F) -> Result<()>
where
    T: MessageId,
    R: AsyncRead + Unpin,
    F: FnMut(Message<T>),
{
    let mut raw_header = [0u8; HEADER_LEN];
    loop {
        reader.read_exact(&mut raw_header).await?;
        let header = MessageHeader::<T>::from_bytes(raw_header)?;

        let mut body = vec![0u8; header.body_len as usize];
        if !body.is_empty() {
            reader.read_exact(&mut body).await?;
        }
        deliver(Message { header, body });
    }
}

/// Drain the outbound channel onto the stream, one message at a time.
///
/// Header then non-empty body per message; strict FIFO with at most one
/// write in flight. Returns once every sender is gone and the channel is
/// drained.
pub(crate) async fn write_loop<T, W>(
    mut writer: W,
    mut outbound: mpsc::UnboundedReceiver<Message<T>>,
) -> Result<()>
where
    T: MessageId,
    W: AsyncWrite + Unpin,
{
    while let Some(message) = outbound.recv().await {
        writer.write_all(&message.header.to_bytes()).await?;
        if !message.body.is_empty() {
            writer.write_all(&message.body).await?;
        }
    }
    Ok(())
}

/// Write one 8-byte handshake token (host byte order)
pub(crate) async fn write_token<W>(writer: &mut W, token: u64) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&token.to_ne_bytes()).await?;
    Ok(())
}

/// Read one 8-byte handshake token (host byte order)
pub(crate) async fn read_token<R>(reader: &mut R) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut raw = [0u8; 8];
    reader.read_exact(&mut raw).await?;
    Ok(u64::from_ne_bytes(raw))
}
