//! Codec configuration record parsing.
//!
//! A configuration packet carries the codec's parameter sets as an Annex-B
//! byte stream.  The mirror only needs the picture size from them (to
//! resize the rendering surface and scale touch coordinates), but profile
//! and level are recovered too since they come for free and are useful in
//! logs.
//!
//! # Why the cropped size? (for beginners)
//!
//! H.264 and H.265 encode pictures in whole macroblocks / coding blocks, so
//! a 1080-line video is actually coded as 1088 lines.  The parameter set
//! carries a cropping window that tells the decoder which part of the coded
//! picture to display.  Touch coordinates must be scaled against the
//! displayed (cropped) size, never the coded size.

pub mod bitstream;
pub mod h264;
pub mod h265;

use crate::protocol::video::VideoCodec;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

/// Errors produced while parsing a configuration record.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    /// The active codec has no configuration parser.
    #[error("unsupported codec: {0}")]
    UnsupportedCodec(VideoCodec),

    #[error("configuration record does not start with an Annex-B start code")]
    MissingStartCode,

    /// No sequence parameter set was found in the record.
    #[error("no sequence parameter set in configuration record")]
    MissingParameterSet,

    #[error("parameter set ended unexpectedly")]
    UnexpectedEnd,

    #[error("invalid parameter set: {0}")]
    InvalidValue(String),
}

/// Stream parameters recovered from a configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConfiguration {
    pub profile: u8,
    pub level: u8,
    /// Coded picture size, including cropped-away padding.
    pub coded_width: u32,
    pub coded_height: u32,
    /// Displayed picture size.
    pub cropped_width: u32,
    pub cropped_height: u32,
}

/// Parses a configuration record for `codec`.
///
/// # Errors
///
/// Returns [`ConfigurationError::UnsupportedCodec`] for codecs without a
/// parser, or another [`ConfigurationError`] if the record is malformed.
pub fn parse_configuration(
    codec: VideoCodec,
    data: &[u8],
) -> Result<VideoConfiguration, ConfigurationError> {
    let config = match codec {
        VideoCodec::H264 => h264::parse_configuration(data)?,
        VideoCodec::H265 => h265::parse_configuration(data)?,
        VideoCodec::Av1 => return Err(ConfigurationError::UnsupportedCodec(codec)),
    };
    trace!(
        %codec,
        profile = config.profile,
        level = config.level,
        coded = %format_args!("{}x{}", config.coded_width, config.coded_height),
        "parsed configuration record"
    );
    Ok(config)
}

/// Subtracts a cropping window from a coded dimension.
pub(crate) fn apply_crop(
    coded: u32,
    offset_a: u32,
    offset_b: u32,
    unit: u32,
) -> Result<u32, ConfigurationError> {
    u64::from(offset_a)
        .checked_add(u64::from(offset_b))
        .and_then(|sum| sum.checked_mul(u64::from(unit)))
        .and_then(|crop| u64::from(coded).checked_sub(crop))
        .filter(|&cropped| cropped > 0)
        .map(|cropped| cropped as u32)
        .ok_or_else(|| {
            ConfigurationError::InvalidValue(format!(
                "cropping window ({offset_a}+{offset_b})x{unit} exceeds coded size {coded}"
            ))
        })
}
