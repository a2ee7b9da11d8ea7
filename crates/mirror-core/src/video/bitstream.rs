//! Annex-B NAL unit splitting and an Exp-Golomb bit reader.

use super::ConfigurationError;

/// Splits an Annex-B byte stream into NAL units.
///
/// Units are delimited by `00 00 01` start codes; the extra leading zero of
/// a four-byte start code is trimmed from the end of the previous unit.
///
/// # Errors
///
/// Returns [`ConfigurationError::MissingStartCode`] if the data does not
/// begin with a start code.
pub fn split_nal_units(data: &[u8]) -> Result<Vec<&[u8]>, ConfigurationError> {
    let starts = start_code_positions(data);
    match starts.first() {
        Some(&(begin, _)) if data[..begin].iter().all(|&b| b == 0) => {}
        _ => return Err(ConfigurationError::MissingStartCode),
    }

    let mut units = Vec::with_capacity(starts.len());
    for (i, &(_, payload_start)) in starts.iter().enumerate() {
        let end = starts.get(i + 1).map_or(data.len(), |&(next, _)| next);
        let mut unit = &data[payload_start..end];
        while let [rest @ .., 0] = unit {
            unit = rest;
        }
        if !unit.is_empty() {
            units.push(unit);
        }
    }
    Ok(units)
}

/// Returns `(start_code_offset, payload_offset)` for every `00 00 01`.
fn start_code_positions(data: &[u8]) -> Vec<(usize, usize)> {
    let mut positions = Vec::new();
    let mut i = 0;
    while i + 3 <= data.len() {
        if data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 1 {
            positions.push((i, i + 3));
            i += 3;
        } else {
            i += 1;
        }
    }
    positions
}

/// Removes emulation-prevention bytes (`00 00 03` → `00 00`).
pub fn to_rbsp(nal: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(nal.len());
    let mut zeros = 0;
    for &byte in nal {
        if zeros >= 2 && byte == 0x03 {
            zeros = 0;
            continue;
        }
        out.push(byte);
        zeros = if byte == 0 { zeros + 1 } else { 0 };
    }
    out
}

/// MSB-first bit reader over an RBSP.
pub struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn bits_remaining(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.position)
    }

    pub fn read_bit(&mut self) -> Result<bool, ConfigurationError> {
        let byte = self
            .data
            .get(self.position / 8)
            .ok_or(ConfigurationError::UnexpectedEnd)?;
        let bit = (byte >> (7 - self.position % 8)) & 1;
        self.position += 1;
        Ok(bit == 1)
    }

    /// Reads up to 32 bits as an unsigned integer.
    pub fn read_bits(&mut self, count: u32) -> Result<u32, ConfigurationError> {
        debug_assert!(count <= 32);
        let mut value: u32 = 0;
        for _ in 0..count {
            value = (value << 1) | u32::from(self.read_bit()?);
        }
        Ok(value)
    }

    pub fn skip_bits(&mut self, count: usize) -> Result<(), ConfigurationError> {
        if self.bits_remaining() < count {
            return Err(ConfigurationError::UnexpectedEnd);
        }
        self.position += count;
        Ok(())
    }

    /// Unsigned Exp-Golomb, `ue(v)`.
    pub fn read_ue(&mut self) -> Result<u32, ConfigurationError> {
        let mut leading_zeros = 0u32;
        while !self.read_bit()? {
            leading_zeros += 1;
            if leading_zeros > 31 {
                return Err(ConfigurationError::InvalidValue(
                    "exp-golomb code longer than 32 bits".to_string(),
                ));
            }
        }
        let suffix = self.read_bits(leading_zeros)?;
        Ok(((1u64 << leading_zeros) - 1 + u64::from(suffix)) as u32)
    }

    /// Signed Exp-Golomb, `se(v)`.
    pub fn read_se(&mut self) -> Result<i32, ConfigurationError> {
        let k = i64::from(self.read_ue()?);
        let value = if k % 2 == 1 { (k + 1) / 2 } else { -(k / 2) };
        Ok(value as i32)
    }
}

/// MSB-first bit writer for building parameter sets in tests.
#[cfg(test)]
pub(crate) struct BitWriter {
    bytes: Vec<u8>,
    bit_len: usize,
}

#[cfg(test)]
impl BitWriter {
    pub(crate) fn new() -> Self {
        Self {
            bytes: Vec::new(),
            bit_len: 0,
        }
    }

    pub(crate) fn bit(&mut self, value: bool) -> &mut Self {
        if self.bit_len % 8 == 0 {
            self.bytes.push(0);
        }
        if value {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 1 << (7 - self.bit_len % 8);
        }
        self.bit_len += 1;
        self
    }

    pub(crate) fn bits(&mut self, count: u32, value: u64) -> &mut Self {
        for i in (0..count).rev() {
            self.bit((value >> i) & 1 == 1);
        }
        self
    }

    pub(crate) fn ue(&mut self, value: u32) -> &mut Self {
        let coded = u64::from(value) + 1;
        let len = 64 - coded.leading_zeros();
        self.bits(len - 1, 0);
        self.bits(len, coded)
    }

    pub(crate) fn se(&mut self, value: i32) -> &mut Self {
        let mapped = if value > 0 {
            (value as u32) * 2 - 1
        } else {
            value.unsigned_abs() * 2
        };
        self.ue(mapped)
    }

    /// Appends the RBSP stop bit, inserts emulation prevention and prefixes
    /// the given NAL header and a four-byte start code.
    pub(crate) fn into_annex_b(mut self, nal_header: &[u8]) -> Vec<u8> {
        self.bit(true);
        let mut out = vec![0, 0, 0, 1];
        out.extend_from_slice(nal_header);
        let mut zeros = 0;
        for byte in self.bytes {
            if zeros >= 2 && byte <= 0x03 {
                out.push(0x03);
                zeros = 0;
            }
            out.push(byte);
            zeros = if byte == 0 { zeros + 1 } else { 0 };
        }
        out
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_handles_three_and_four_byte_start_codes() {
        // Arrange
        let data = [0, 0, 0, 1, 0x67, 0xAA, 0, 0, 1, 0x68, 0xBB, 0, 0, 0, 1, 0x65];

        // Act
        let units = split_nal_units(&data).unwrap();

        // Assert
        assert_eq!(units, vec![&[0x67, 0xAA][..], &[0x68, 0xBB][..], &[0x65][..]]);
    }

    #[test]
    fn test_split_requires_leading_start_code() {
        assert_eq!(
            split_nal_units(&[0x67, 0x64, 0, 0, 1, 0x68]),
            Err(ConfigurationError::MissingStartCode)
        );
        assert_eq!(split_nal_units(&[]), Err(ConfigurationError::MissingStartCode));
    }

    #[test]
    fn test_rbsp_strips_emulation_prevention() {
        assert_eq!(to_rbsp(&[0, 0, 3, 1, 0, 0, 3, 0]), vec![0, 0, 1, 0, 0, 0]);
        // a lone 03 is data
        assert_eq!(to_rbsp(&[0, 3, 0, 3]), vec![0, 3, 0, 3]);
    }

    #[test]
    fn test_exp_golomb_values() {
        // 1 | 010 | 011 | 00100 | 00101  => ue 0,1,2,3 then se for 4 => -2
        let data = [0b1010_0110, 0b0100_0010, 0b1000_0000];
        let mut r = BitReader::new(&data);
        assert_eq!(r.read_ue().unwrap(), 0);
        assert_eq!(r.read_ue().unwrap(), 1);
        assert_eq!(r.read_ue().unwrap(), 2);
        assert_eq!(r.read_ue().unwrap(), 3);
        assert_eq!(r.read_se().unwrap(), -2);
    }

    #[test]
    fn test_reader_reports_end_of_data() {
        let mut r = BitReader::new(&[0xFF]);
        assert_eq!(r.read_bits(8).unwrap(), 0xFF);
        assert_eq!(r.read_bit(), Err(ConfigurationError::UnexpectedEnd));
        assert_eq!(BitReader::new(&[0, 0]).read_ue(), Err(ConfigurationError::UnexpectedEnd));
    }

    #[test]
    fn test_writer_output_reads_back() {
        let mut w = BitWriter::new();
        w.ue(5).se(-3).se(7).bits(5, 0b10110).ue(1919);
        let data = w.into_annex_b(&[]);
        let rbsp = to_rbsp(&data[4..]);
        let mut r = BitReader::new(&rbsp);
        assert_eq!(r.read_ue().unwrap(), 5);
        assert_eq!(r.read_se().unwrap(), -3);
        assert_eq!(r.read_se().unwrap(), 7);
        assert_eq!(r.read_bits(5).unwrap(), 0b10110);
        assert_eq!(r.read_ue().unwrap(), 1919);
    }
}
