use crate::error::{Error, Result};

/// The DNG opcode list viewed two ways: as big-endian `u32` words and as
/// big-endian `f32` values over the same bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct OpcodeDump {
    pub words: Vec<u32>,
    pub floats: Vec<f32>,
}

impl OpcodeDump {
    /// Decodes the raw opcode-list bytes. Trailing bytes that do not fill a
    /// word are zero-padded.
    pub fn from_bytes(bytes: &[u8]) -> OpcodeDump {
        let words: Vec<u32> = bytes
            .chunks(4)
            .map(|c| {
                let mut w = [0u8; 4];
                w[..c.len()].copy_from_slice(c);
                u32::from_be_bytes(w)
            })
            .collect();
        let floats = words.iter().map(|&w| f32::from_bits(w)).collect();
        OpcodeDump { words, floats }
    }

    /// Parses the two whitespace-delimited text dumps: unsigned decimal
    /// words (`od --format=u4`) and floats (`od -f`). Float tokens may use
    /// `,` as the decimal separator.
    pub fn parse(header_text: &str, payload_text: &str) -> Result<OpcodeDump> {
        let words = header_text
            .split_whitespace()
            .map(|tok| {
                tok.parse::<u32>()
                    .map_err(|e| Error::OpcodeLayout(format!("bad header token {:?}: {}", tok, e)))
            })
            .collect::<Result<Vec<_>>>()?;
        let floats = payload_text
            .split_whitespace()
            .map(|tok| {
                tok.replace(',', ".")
                    .parse::<f32>()
                    .map_err(|e| Error::OpcodeLayout(format!("bad payload token {:?}: {}", tok, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        if words.len() != floats.len() {
            return Err(Error::OpcodeLayout(format!(
                "header pass produced {} words but payload pass produced {} values",
                words.len(),
                floats.len()
            )));
        }
        Ok(OpcodeDump { words, floats })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Two consecutive words as a big-endian `f64`.
    pub fn double_at(&self, index: usize) -> Option<f64> {
        let hi = *self.words.get(index)? as u64;
        let lo = *self.words.get(index + 1)? as u64;
        Some(f64::from_bits(hi << 32 | lo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_decode_as_big_endian() {
        let mut bytes = 4u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(&1.5f32.to_be_bytes());
        let dump = OpcodeDump::from_bytes(&bytes);
        assert_eq!(dump.words[0], 4);
        assert_eq!(dump.floats[1], 1.5);
    }

    #[test]
    fn parses_text_with_comma_decimals() {
        let dump = OpcodeDump::parse("   4  1069547520\n", " 5,6051939e-45 1.5000000e+00\n").unwrap();
        assert_eq!(dump.words, vec![4, 1_069_547_520]);
        assert_eq!(dump.floats[1], 1.5);
    }

    #[test]
    fn mismatched_passes_fail() {
        assert!(matches!(OpcodeDump::parse("1 2", "1.0"), Err(Error::OpcodeLayout(_))));
        assert!(OpcodeDump::parse("x", "1.0").is_err());
    }

    #[test]
    fn doubles_span_two_words() {
        let bits = 0.25f64.to_bits();
        let dump = OpcodeDump::from_bytes(&bits.to_be_bytes());
        assert_eq!(dump.double_at(0), Some(0.25));
        assert_eq!(dump.double_at(1), None);
    }
}
