//! Network infrastructure: TCP transport to a forwarded mirroring server.
//!
//! The server listens on one local port (reached through a port forward)
//! and accepts two connections in a fixed order:
//!
//! 1. the video socket, which carries the stream metadata and packets;
//! 2. the control socket, which receives control messages.
//!
//! Optional handshake bytes depend on the server options:
//! - `send_dummy_byte`: one byte on the video socket right after connecting.
//! - `send_device_meta`: a 64-byte NUL-padded device name on the video
//!   socket once both sockets are connected.
//!
//! [`ForwardedServerDiscovery`] exposes a fixed list of endpoints as
//! devices so the session controller can treat them like any other device.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use mirror_core::{ServerOptions, VideoStreamMetadata};
use tokio::{
    io::{AsyncReadExt, BufReader},
    net::TcpStream,
};
use tracing::{debug, info, warn};

use crate::application::{
    demux::PacketSource,
    session::{ControlChannel, DeviceDiscovery, DeviceInfo, Transport, TransportError},
};
use crate::infrastructure::{
    control::StreamControlChannel,
    video::{read_metadata, StreamPacketSource},
};

/// Length of the device-name block sent when `send_device_meta` is on.
pub const DEVICE_NAME_FIELD_LENGTH: usize = 64;

/// Maps a connect failure onto the transport error taxonomy.
fn connect_error(addr: &str, e: std::io::Error) -> TransportError {
    use std::io::ErrorKind;
    match e.kind() {
        ErrorKind::ConnectionRefused | ErrorKind::NotFound | ErrorKind::TimedOut => {
            TransportError::Unavailable(format!("{addr}: {e}"))
        }
        ErrorKind::AddrInUse | ErrorKind::PermissionDenied | ErrorKind::ConnectionReset => {
            TransportError::DeviceBusy(format!("{addr}: {e}"))
        }
        _ => TransportError::Io(e),
    }
}

async fn connect_socket(addr: &str) -> Result<TcpStream, TransportError> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| connect_error(addr, e))?;
    if let Err(e) = stream.set_nodelay(true) {
        debug!(error = %e, "could not disable Nagle");
    }
    Ok(stream)
}

async fn read_device_name(video: &mut BufReader<TcpStream>) -> Result<String, TransportError> {
    let mut buf = [0u8; DEVICE_NAME_FIELD_LENGTH];
    video.read_exact(&mut buf).await?;
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
}

type VideoStream = (VideoStreamMetadata, StreamPacketSource<BufReader<TcpStream>>);

/// A connected video + control socket pair.
pub struct TcpTransport {
    addr: String,
    device_name: Option<String>,
    control: Arc<StreamControlChannel<TcpStream>>,
    video: tokio::sync::Mutex<Option<VideoStream>>,
}

impl TcpTransport {
    /// Connects both sockets and reads the stream metadata.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Unavailable`] if nothing listens at `addr`.
    /// - [`TransportError::DeviceBusy`] if the connection is refused by
    ///   another owner.
    /// - [`TransportError::Closed`] / [`TransportError::Protocol`] if the
    ///   handshake is cut short or malformed.
    pub async fn connect(addr: &str, options: &ServerOptions) -> Result<Self, TransportError> {
        let mut video = BufReader::new(connect_socket(addr).await?);
        if options.send_dummy_byte {
            let mut dummy = [0u8; 1];
            video
                .read_exact(&mut dummy)
                .await
                .map_err(|_| TransportError::Closed)?;
        }

        let control = connect_socket(addr).await?;

        let device_name = if options.send_device_meta {
            Some(read_device_name(&mut video).await?)
        } else {
            None
        };
        let metadata = read_metadata(&mut video).await?;
        info!(
            %addr,
            device = device_name.as_deref().unwrap_or("unknown"),
            codec = %metadata.codec,
            width = metadata.width,
            height = metadata.height,
            "connected to mirroring server"
        );

        Ok(Self {
            addr: addr.to_string(),
            device_name,
            control: Arc::new(StreamControlChannel::new(control)),
            video: tokio::sync::Mutex::new(Some((metadata, StreamPacketSource::new(video)))),
        })
    }

    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }
}

#[async_trait]
impl Transport for TcpTransport {
    fn control(&self) -> Arc<dyn ControlChannel> {
        Arc::clone(&self.control) as Arc<dyn ControlChannel>
    }

    async fn take_video_stream(
        &self,
    ) -> Result<(VideoStreamMetadata, Box<dyn PacketSource>), TransportError> {
        let (metadata, source) = self
            .video
            .lock()
            .await
            .take()
            .ok_or(TransportError::Closed)?;
        Ok((metadata, Box::new(source)))
    }

    async fn close(&self) {
        self.control.close().await;
        // Drops the video socket if the stream was never taken.
        self.video.lock().await.take();
        debug!(addr = %self.addr, "transport closed");
    }
}

// ── Discovery ─────────────────────────────────────────────────────────────────

/// Presents forwarded server endpoints as devices.
///
/// A device's `serial` is its `host:port` address.
pub struct ForwardedServerDiscovery {
    endpoints: Vec<DeviceInfo>,
    forgotten: Mutex<HashSet<String>>,
}

impl ForwardedServerDiscovery {
    pub fn new(endpoints: impl IntoIterator<Item = String>) -> Self {
        let endpoints = endpoints
            .into_iter()
            .map(|addr| DeviceInfo {
                name: format!("mirror@{addr}"),
                serial: addr,
            })
            .collect();
        Self {
            endpoints,
            forgotten: Mutex::new(HashSet::new()),
        }
    }

    fn granted(&self) -> Vec<DeviceInfo> {
        let forgotten = self.forgotten.lock().unwrap_or_else(PoisonError::into_inner);
        self.endpoints
            .iter()
            .filter(|d| !forgotten.contains(&d.serial))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DeviceDiscovery for ForwardedServerDiscovery {
    async fn request_device(&self) -> Result<Option<DeviceInfo>, TransportError> {
        if self.endpoints.is_empty() {
            return Err(TransportError::Unavailable(
                "no server endpoints configured".to_string(),
            ));
        }
        // Requesting access again re-grants a forgotten endpoint.
        let device = self.endpoints.first().cloned();
        if let Some(d) = &device {
            self.forgotten
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&d.serial);
        }
        Ok(device)
    }

    async fn devices(&self) -> Result<Vec<DeviceInfo>, TransportError> {
        Ok(self.granted())
    }

    async fn open(
        &self,
        device: &DeviceInfo,
        options: &ServerOptions,
    ) -> Result<Arc<dyn Transport>, TransportError> {
        debug!(args = ?options.to_server_args(), "server options");
        let transport = TcpTransport::connect(&device.serial, options).await?;
        Ok(Arc::new(transport))
    }

    async fn forget(&self, device: &DeviceInfo) -> Result<(), TransportError> {
        let removed = self
            .forgotten
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(device.serial.clone());
        if !removed {
            warn!(serial = %device.serial, "device was already forgotten");
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_core::{
        protocol::messages::KeyAction, ControlMessage, VideoCodec, VideoPacket,
    };
    use tokio::{io::AsyncWriteExt, net::TcpListener};

    /// Plays the server side of the handshake on an ephemeral port.
    async fn fake_server(options: ServerOptions) -> (String, tokio::task::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            let (mut video, _) = listener.accept().await.unwrap();
            if options.send_dummy_byte {
                video.write_all(&[0]).await.unwrap();
            }
            let (mut control, _) = listener.accept().await.unwrap();
            if options.send_device_meta {
                let mut name = [0u8; DEVICE_NAME_FIELD_LENGTH];
                name[..7].copy_from_slice(b"Pixel 7");
                video.write_all(&name).await.unwrap();
            }
            let meta = VideoStreamMetadata {
                codec: VideoCodec::H264,
                width: 1080,
                height: 2400,
            };
            video.write_all(&meta.encode()).await.unwrap();
            video
                .write_all(&VideoPacket::Configuration(vec![0, 0, 0, 1, 0x67]).encode())
                .await
                .unwrap();
            drop(video);

            let mut received = Vec::new();
            control.read_to_end(&mut received).await.unwrap();
            received
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn test_connect_reads_handshake_and_stream() {
        // Arrange
        let options = ServerOptions {
            send_dummy_byte: true,
            send_device_meta: true,
            ..ServerOptions::default()
        };
        let (addr, server) = fake_server(options.clone()).await;

        // Act
        let transport = TcpTransport::connect(&addr, &options).await.unwrap();
        let (metadata, mut source) = transport.take_video_stream().await.unwrap();
        let first = source.next_packet().await.unwrap();
        let end = source.next_packet().await.unwrap();
        transport
            .control()
            .send(&ControlMessage::BackOrScreenOn(KeyAction::Down))
            .await
            .unwrap();
        transport.close().await;

        // Assert
        assert_eq!(transport.device_name(), Some("Pixel 7"));
        assert_eq!(metadata.codec, VideoCodec::H264);
        assert_eq!((metadata.width, metadata.height), (1080, 2400));
        assert_eq!(first, Some(VideoPacket::Configuration(vec![0, 0, 0, 1, 0x67])));
        assert_eq!(end, None);
        assert_eq!(server.await.unwrap(), vec![4, 0]);
    }

    #[tokio::test]
    async fn test_video_stream_can_only_be_taken_once() {
        let options = ServerOptions::default();
        let (addr, _server) = fake_server(options.clone()).await;
        let transport = TcpTransport::connect(&addr, &options).await.unwrap();

        assert!(transport.take_video_stream().await.is_ok());
        assert!(matches!(
            transport.take_video_stream().await,
            Err(TransportError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_nothing_listening_is_unavailable() {
        // Bind then drop to get a port that refuses connections.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let result = TcpTransport::connect(&addr, &ServerOptions::default()).await;

        assert!(matches!(result, Err(TransportError::Unavailable(_))));
    }

    #[test]
    fn test_connect_error_mapping() {
        use std::io::{Error, ErrorKind};
        assert!(matches!(
            connect_error("a", Error::from(ErrorKind::ConnectionRefused)),
            TransportError::Unavailable(_)
        ));
        assert!(matches!(
            connect_error("a", Error::from(ErrorKind::AddrInUse)),
            TransportError::DeviceBusy(_)
        ));
        assert!(matches!(
            connect_error("a", Error::from(ErrorKind::InvalidInput)),
            TransportError::Io(_)
        ));
    }

    #[tokio::test]
    async fn test_forget_hides_device_until_requested_again() {
        // Arrange
        let discovery = ForwardedServerDiscovery::new(["127.0.0.1:27183".to_string()]);
        let device = discovery.devices().await.unwrap().remove(0);

        // Act
        discovery.forget(&device).await.unwrap();
        let after_forget = discovery.devices().await.unwrap();
        let requested = discovery.request_device().await.unwrap();
        let after_request = discovery.devices().await.unwrap();

        // Assert
        assert!(after_forget.is_empty());
        assert_eq!(requested, Some(device.clone()));
        assert_eq!(after_request, vec![device]);
    }

    #[tokio::test]
    async fn test_request_without_endpoints_is_unavailable() {
        let discovery = ForwardedServerDiscovery::new(Vec::new());

        let result = discovery.request_device().await;

        assert!(matches!(result, Err(TransportError::Unavailable(_))));
    }
}
