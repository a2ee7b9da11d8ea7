//! H.265 sequence parameter set parsing (ITU-T H.265 §7.3.2.2).

use super::bitstream::{split_nal_units, to_rbsp, BitReader};
use super::{apply_crop, ConfigurationError, VideoConfiguration};

const NAL_TYPE_SPS: u8 = 33;

/// Parses the first SPS in an H.265 configuration record.
///
/// The record normally carries VPS, SPS and PPS in that order.
///
/// # Errors
///
/// Returns [`ConfigurationError`] if no SPS is present or it is malformed.
pub fn parse_configuration(data: &[u8]) -> Result<VideoConfiguration, ConfigurationError> {
    let sps = split_nal_units(data)?
        .into_iter()
        .find(|nal| nal.len() > 2 && (nal[0] >> 1) & 0x3F == NAL_TYPE_SPS)
        .ok_or(ConfigurationError::MissingParameterSet)?;
    parse_sps(&to_rbsp(&sps[2..]))
}

fn parse_sps(rbsp: &[u8]) -> Result<VideoConfiguration, ConfigurationError> {
    let mut r = BitReader::new(rbsp);

    r.skip_bits(4)?; // sps_video_parameter_set_id
    let max_sub_layers_minus1 = r.read_bits(3)? as usize;
    r.skip_bits(1)?; // sps_temporal_id_nesting_flag

    let (profile, level) = read_profile_tier_level(&mut r, max_sub_layers_minus1)?;

    r.read_ue()?; // sps_seq_parameter_set_id
    let chroma_format_idc = r.read_ue()?;
    if chroma_format_idc > 3 {
        return Err(ConfigurationError::InvalidValue(format!(
            "chroma_format_idc {chroma_format_idc}"
        )));
    }
    let separate_colour_plane = chroma_format_idc == 3 && r.read_bit()?;

    let coded_width = r.read_ue()?;
    let coded_height = r.read_ue()?;
    if coded_width == 0 || coded_height == 0 {
        return Err(ConfigurationError::InvalidValue(format!(
            "picture size {coded_width}x{coded_height}"
        )));
    }

    let (mut left, mut right, mut top, mut bottom) = (0, 0, 0, 0);
    if r.read_bit()? {
        left = r.read_ue()?;
        right = r.read_ue()?;
        top = r.read_ue()?;
        bottom = r.read_ue()?;
    }

    let chroma_array_type = if separate_colour_plane { 0 } else { chroma_format_idc };
    let sub_width = if matches!(chroma_array_type, 1 | 2) { 2 } else { 1 };
    let sub_height = if chroma_array_type == 1 { 2 } else { 1 };

    Ok(VideoConfiguration {
        profile,
        level,
        coded_width,
        coded_height,
        cropped_width: apply_crop(coded_width, left, right, sub_width)?,
        cropped_height: apply_crop(coded_height, top, bottom, sub_height)?,
    })
}

/// Reads `profile_tier_level(1, max_sub_layers_minus1)` and returns the
/// general profile and level.
fn read_profile_tier_level(
    r: &mut BitReader<'_>,
    max_sub_layers_minus1: usize,
) -> Result<(u8, u8), ConfigurationError> {
    r.skip_bits(2 + 1)?; // general_profile_space, general_tier_flag
    let profile = r.read_bits(5)? as u8;
    r.skip_bits(32)?; // general_profile_compatibility_flag[32]
    r.skip_bits(4 + 43 + 1)?; // source flags, constraint flags, inbld/reserved
    let level = r.read_bits(8)? as u8;

    let mut sub_layers = Vec::with_capacity(max_sub_layers_minus1);
    for _ in 0..max_sub_layers_minus1 {
        let profile_present = r.read_bit()?;
        let level_present = r.read_bit()?;
        sub_layers.push((profile_present, level_present));
    }
    if max_sub_layers_minus1 > 0 {
        r.skip_bits(2 * (8 - max_sub_layers_minus1))?; // reserved_zero_2bits
    }
    for (profile_present, level_present) in sub_layers {
        if profile_present {
            r.skip_bits(88)?;
        }
        if level_present {
            r.skip_bits(8)?;
        }
    }

    Ok((profile, level))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::bitstream::BitWriter;

    /// SPS from a 1920x1080 Main@4.0 stream.
    const SPS_1080P: [u8; 46] = [
        0, 0, 0, 1, 0x42, 0x01, 0x01, 0x01, 0x60, 0x00, 0x00, 0x03, 0x00, 0x90, 0x00, 0x00, 0x03,
        0x00, 0x00, 0x03, 0x00, 0x78, 0xA0, 0x03, 0xC0, 0x80, 0x10, 0xE5, 0x96, 0x56, 0x69, 0x24,
        0xCA, 0xE0, 0x10, 0x00, 0x00, 0x03, 0x00, 0x10, 0x00, 0x00, 0x03, 0x01, 0xE0, 0x80,
    ];

    const SPS_HEADER: [u8; 2] = [0x42, 0x01];

    fn general_ptl(w: &mut BitWriter, profile: u8, level: u8) {
        w.bits(2, 0).bit(false).bits(5, u64::from(profile));
        w.bits(32, 0x6000_0000);
        w.bits(4, 0b1001).bits(32, 0).bits(11, 0).bit(false);
        w.bits(8, u64::from(level));
    }

    #[test]
    fn test_real_1080p_sps() {
        // Arrange: VPS stub, then the SPS
        let mut record = vec![0, 0, 0, 1, 0x40, 0x01, 0x0C, 0x01];
        record.extend_from_slice(&SPS_1080P);

        // Act
        let config = parse_configuration(&record).unwrap();

        // Assert
        assert_eq!(config.profile, 1);
        assert_eq!(config.level, 120);
        assert_eq!((config.cropped_width, config.cropped_height), (1920, 1080));
    }

    #[test]
    fn test_conformance_window_in_420_uses_two_sample_units() {
        let mut w = BitWriter::new();
        w.bits(4, 0).bits(3, 0).bit(true);
        general_ptl(&mut w, 1, 93);
        w.ue(0).ue(1); // sps id, chroma 4:2:0
        w.ue(1088).ue(1920);
        w.bit(true).ue(0).ue(4).ue(0).ue(0);

        let config = parse_configuration(&w.into_annex_b(&SPS_HEADER)).unwrap();
        assert_eq!((config.coded_width, config.coded_height), (1088, 1920));
        assert_eq!((config.cropped_width, config.cropped_height), (1080, 1920));
        assert_eq!(config.level, 93);
    }

    #[test]
    fn test_sub_layers_are_skipped() {
        // Arrange: three temporal layers, 4:2:2 chroma
        let mut w = BitWriter::new();
        w.bits(4, 0).bits(3, 2).bit(true);
        general_ptl(&mut w, 4, 123);
        w.bit(true).bit(false); // sub-layer 0: profile only
        w.bit(false).bit(true); // sub-layer 1: level only
        for _ in 2..8 {
            w.bits(2, 0);
        }
        w.bits(32, 0xFFFF_FFFF).bits(32, 0xFFFF_FFFF).bits(24, 0xFF_FFFF); // 88 bits
        w.bits(8, 0xFF);
        w.ue(0).ue(2);
        w.ue(720).ue(1280);
        w.bit(true).ue(1).ue(1).ue(3).ue(5);

        // Act
        let config = parse_configuration(&w.into_annex_b(&SPS_HEADER)).unwrap();

        // Assert
        assert_eq!(config.profile, 4);
        assert_eq!(config.level, 123);
        assert_eq!((config.cropped_width, config.cropped_height), (716, 1272));
    }

    #[test]
    fn test_record_without_sps() {
        let record = [0, 0, 0, 1, 0x40, 0x01, 0x0C, 0x01, 0, 0, 0, 1, 0x44, 0x01, 0xC1];
        assert_eq!(
            parse_configuration(&record),
            Err(ConfigurationError::MissingParameterSet)
        );
    }

    #[test]
    fn test_truncated_sps() {
        assert_eq!(
            parse_configuration(&SPS_1080P[..20]),
            Err(ConfigurationError::UnexpectedEnd)
        );
    }
}
