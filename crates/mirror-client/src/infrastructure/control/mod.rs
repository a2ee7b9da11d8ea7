//! Control channel over a byte stream.
//!
//! Each message is encoded in full and written under one lock, so messages
//! from the input handlers and the shortcut commands never interleave on the
//! wire.

use async_trait::async_trait;
use mirror_core::{encode_control_message, ControlMessage};
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};
use tracing::{debug, trace};

use crate::application::session::{ChannelError, ControlChannel};

/// A [`ControlChannel`] that writes encoded messages to `W`.
pub struct StreamControlChannel<W> {
    writer: Mutex<Option<W>>,
}

impl<W> StreamControlChannel<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(Some(writer)),
        }
    }

    /// Shuts the writer down.  Later sends fail with [`ChannelError::Closed`].
    pub async fn close(&self) {
        if let Some(mut writer) = self.writer.lock().await.take() {
            if let Err(e) = writer.shutdown().await {
                debug!(error = %e, "control stream shutdown failed");
            }
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.writer.lock().await.is_none()
    }
}

#[async_trait]
impl<W> ControlChannel for StreamControlChannel<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&self, message: &ControlMessage) -> Result<(), ChannelError> {
        let bytes = encode_control_message(message);
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(ChannelError::Closed)?;
        let written = write_frame(writer, &bytes).await;
        if let Err(e) = written {
            // A broken stream cannot be resynchronised mid-message.
            *guard = None;
            return Err(ChannelError::Io(e));
        }
        trace!(kind = ?message.message_type(), len = bytes.len(), "control message sent");
        Ok(())
    }
}

async fn write_frame<W>(writer: &mut W, bytes: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(bytes).await?;
    writer.flush().await
}
