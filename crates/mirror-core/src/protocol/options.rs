//! Options passed to the mirroring server at start-up.
//!
//! The server takes its options as `key=value` command-line arguments.
//! [`ServerOptions`] is also the `[server]` table of the client's TOML
//! configuration, so every field has a serde default.

use crate::domain::frame::Rotation;
use crate::protocol::video::VideoCodec;
use serde::{Deserialize, Serialize};

/// Server-side log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerLogLevel {
    Verbose,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl ServerLogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ServerLogLevel::Verbose => "verbose",
            ServerLogLevel::Debug => "debug",
            ServerLogLevel::Info => "info",
            ServerLogLevel::Warn => "warn",
            ServerLogLevel::Error => "error",
        }
    }
}

/// Start-up options for the mirroring server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerOptions {
    /// Longest side of the encoded video, in pixels (0 = native size).
    #[serde(default = "default_max_size")]
    pub max_size: u16,

    #[serde(default = "default_video_bit_rate")]
    pub video_bit_rate: u32,

    #[serde(default = "default_video_codec")]
    pub video_codec: VideoCodec,

    /// Fixed capture orientation; `None` follows the device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_video_orientation: Option<Rotation>,

    #[serde(default)]
    pub display_id: u32,

    /// Crop rectangle as `width:height:x:y`; empty for no crop.
    #[serde(default)]
    pub crop: String,

    /// Turn the device screen on when the session starts.
    #[serde(default = "default_true")]
    pub power_on: bool,

    #[serde(default)]
    pub audio: bool,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Prefix the video socket with the device name record.
    #[serde(default)]
    pub send_device_meta: bool,

    /// Write one byte on the first socket after accepting it.
    #[serde(default)]
    pub send_dummy_byte: bool,

    /// The server listens and the client connects, instead of the reverse.
    #[serde(default = "default_true")]
    pub tunnel_forward: bool,

    #[serde(default)]
    pub log_level: ServerLogLevel,
}

fn default_max_size() -> u16 {
    1080
}

fn default_video_bit_rate() -> u32 {
    8_000_000
}

fn default_video_codec() -> VideoCodec {
    VideoCodec::H264
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            video_bit_rate: default_video_bit_rate(),
            video_codec: default_video_codec(),
            lock_video_orientation: None,
            display_id: 0,
            crop: String::new(),
            power_on: true,
            audio: false,
            audio_codec: default_audio_codec(),
            send_device_meta: false,
            send_dummy_byte: false,
            tunnel_forward: true,
            log_level: ServerLogLevel::Debug,
        }
    }
}

impl ServerOptions {
    /// Renders the options as the server's `key=value` arguments.
    ///
    /// An empty `crop` is omitted; an unlocked orientation is `-1`.
    pub fn to_server_args(&self) -> Vec<String> {
        let orientation = self
            .lock_video_orientation
            .map_or(-1, |r| i16::from(r as u8));

        let mut args = vec![
            format!("log_level={}", self.log_level.as_str()),
            format!("max_size={}", self.max_size),
            format!("video_bit_rate={}", self.video_bit_rate),
            format!("video_codec={}", self.video_codec),
            format!("lock_video_orientation={orientation}"),
            format!("display_id={}", self.display_id),
            format!("power_on={}", self.power_on),
            format!("audio={}", self.audio),
        ];
        if self.audio {
            args.push(format!("audio_codec={}", self.audio_codec));
        }
        if !self.crop.is_empty() {
            args.push(format!("crop={}", self.crop));
        }
        args.push(format!("send_device_meta={}", self.send_device_meta));
        args.push(format!("send_dummy_byte={}", self.send_dummy_byte));
        args.push(format!("tunnel_forward={}", self.tunnel_forward));
        args
    }
}
