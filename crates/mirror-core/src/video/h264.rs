//! H.264 sequence parameter set parsing (ITU-T H.264 §7.3.2.1.1).

use super::bitstream::{split_nal_units, to_rbsp, BitReader};
use super::{apply_crop, ConfigurationError, VideoConfiguration};

const NAL_TYPE_SPS: u8 = 7;

/// Profiles whose SPS carries chroma format, bit depth and scaling lists.
const HIGH_PROFILES: [u8; 13] = [100, 110, 122, 244, 44, 83, 86, 118, 128, 138, 139, 134, 135];

/// Parses the first SPS in an H.264 configuration record.
///
/// # Errors
///
/// Returns [`ConfigurationError`] if no SPS is present or it is malformed.
pub fn parse_configuration(data: &[u8]) -> Result<VideoConfiguration, ConfigurationError> {
    let sps = split_nal_units(data)?
        .into_iter()
        .find(|nal| nal[0] & 0x1F == NAL_TYPE_SPS)
        .ok_or(ConfigurationError::MissingParameterSet)?;
    parse_sps(&to_rbsp(&sps[1..]))
}

fn parse_sps(rbsp: &[u8]) -> Result<VideoConfiguration, ConfigurationError> {
    let mut r = BitReader::new(rbsp);

    let profile = r.read_bits(8)? as u8;
    r.skip_bits(8)?; // constraint_set flags + reserved
    let level = r.read_bits(8)? as u8;
    r.read_ue()?; // seq_parameter_set_id

    let mut chroma_format_idc = 1;
    let mut separate_colour_plane = false;
    if HIGH_PROFILES.contains(&profile) {
        chroma_format_idc = r.read_ue()?;
        if chroma_format_idc > 3 {
            return Err(ConfigurationError::InvalidValue(format!(
                "chroma_format_idc {chroma_format_idc}"
            )));
        }
        if chroma_format_idc == 3 {
            separate_colour_plane = r.read_bit()?;
        }
        r.read_ue()?; // bit_depth_luma_minus8
        r.read_ue()?; // bit_depth_chroma_minus8
        r.skip_bits(1)?; // qpprime_y_zero_transform_bypass_flag
        if r.read_bit()? {
            let lists = if chroma_format_idc == 3 { 12 } else { 8 };
            for i in 0..lists {
                if r.read_bit()? {
                    skip_scaling_list(&mut r, if i < 6 { 16 } else { 64 })?;
                }
            }
        }
    }

    r.read_ue()?; // log2_max_frame_num_minus4
    match r.read_ue()? {
        0 => {
            r.read_ue()?; // log2_max_pic_order_cnt_lsb_minus4
        }
        1 => {
            r.skip_bits(1)?; // delta_pic_order_always_zero_flag
            r.read_se()?; // offset_for_non_ref_pic
            r.read_se()?; // offset_for_top_to_bottom_field
            let cycle = r.read_ue()?;
            for _ in 0..cycle {
                r.read_se()?;
            }
        }
        2 => {}
        other => {
            return Err(ConfigurationError::InvalidValue(format!(
                "pic_order_cnt_type {other}"
            )))
        }
    }
    r.read_ue()?; // max_num_ref_frames
    r.skip_bits(1)?; // gaps_in_frame_num_value_allowed_flag

    let width_in_mbs = u64::from(r.read_ue()?) + 1;
    let height_in_map_units = u64::from(r.read_ue()?) + 1;
    let frame_mbs_only = r.read_bit()?;
    if !frame_mbs_only {
        r.skip_bits(1)?; // mb_adaptive_frame_field_flag
    }
    r.skip_bits(1)?; // direct_8x8_inference_flag

    let (mut left, mut right, mut top, mut bottom) = (0, 0, 0, 0);
    if r.read_bit()? {
        left = r.read_ue()?;
        right = r.read_ue()?;
        top = r.read_ue()?;
        bottom = r.read_ue()?;
    }

    let field_factor: u32 = if frame_mbs_only { 1 } else { 2 };
    let coded_width = to_dimension(width_in_mbs * 16)?;
    let coded_height = to_dimension(height_in_map_units * 16 * u64::from(field_factor))?;

    let chroma_array_type = if separate_colour_plane { 0 } else { chroma_format_idc };
    let (crop_unit_x, crop_unit_y) = match chroma_array_type {
        0 => (1, field_factor),
        1 => (2, 2 * field_factor),
        2 => (2, field_factor),
        _ => (1, field_factor),
    };

    Ok(VideoConfiguration {
        profile,
        level,
        coded_width,
        coded_height,
        cropped_width: apply_crop(coded_width, left, right, crop_unit_x)?,
        cropped_height: apply_crop(coded_height, top, bottom, crop_unit_y)?,
    })
}

fn skip_scaling_list(r: &mut BitReader<'_>, size: usize) -> Result<(), ConfigurationError> {
    let mut last_scale: i64 = 8;
    let mut next_scale: i64 = 8;
    for _ in 0..size {
        if next_scale != 0 {
            // delta_scale is nominally [-128, 127]; wider values wrap.
            let delta = i64::from(r.read_se()?);
            next_scale = (last_scale + delta).rem_euclid(256);
        }
        if next_scale != 0 {
            last_scale = next_scale;
        }
    }
    Ok(())
}

fn to_dimension(value: u64) -> Result<u32, ConfigurationError> {
    u32::try_from(value)
        .map_err(|_| ConfigurationError::InvalidValue(format!("picture dimension {value}")))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
