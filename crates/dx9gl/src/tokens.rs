//! Token stream primitives: field extraction for version, instruction and
//! comment tokens, plus a forward-only bounds-checked reader.

use crate::error::{self, TranslateError};
use crate::types::{ShaderStage, ShaderVersion};

/// Terminator closing every SM2/SM3 token stream (full-word compare).
pub(crate) const END_TOKEN: u32 = 0x0000_FFFF;

/// Low 16 bits of an instruction token select the opcode.
pub(crate) const OPCODE_MASK: u32 = 0x0000_FFFF;

/// Comment pseudo-opcode; bits 16..30 carry the payload length to skip.
pub(crate) const OPCODE_COMMENT: u32 = 0xFFFE;

/// Instruction token bit 28: predicated execution (coverage gap).
pub(crate) const INSTRUCTION_PREDICATED: u32 = 1 << 28;

/// Parameter token bit 13: relative addressing, one selector token follows.
pub(crate) const PARAM_RELATIVE: u32 = 1 << 13;

/// Parameter tokens always carry bit 31.
pub(crate) const PARAM_TAG: u32 = 1 << 31;

pub(crate) fn opcode_raw(token: u32) -> u32 {
    token & OPCODE_MASK
}

/// Instruction length in operand tokens (bits 24..27), excluding the
/// instruction token itself.
pub(crate) fn instruction_length(token: u32) -> usize {
    ((token >> 24) & 0xF) as usize
}

/// Opcode-specific control field (bits 16..23).
pub(crate) fn control_bits(token: u32) -> u32 {
    (token >> 16) & 0xFF
}

/// Payload length of a comment token (bits 16..30).
pub(crate) fn comment_length(token: u32) -> usize {
    ((token >> 16) & 0x7FFF) as usize
}

/// Parses and validates the leading version token.
pub(crate) fn decode_version_token(token: u32) -> Result<ShaderVersion, TranslateError> {
    let stage = match token >> 16 {
        0xFFFE => ShaderStage::Vertex,
        0xFFFF => ShaderStage::Pixel,
        _ => {
            return Err(error::protocol(
                0,
                format!("not a shader: bad version token 0x{token:08x}"),
            ));
        }
    };
    let major = ((token >> 8) & 0xFF) as u8;
    let minor = (token & 0xFF) as u8;
    match (major, minor) {
        (2, 0) | (2, 1) | (3, 0) => Ok(ShaderVersion {
            stage,
            major,
            minor,
        }),
        _ => Err(error::protocol(
            0,
            format!("unsupported {} shader model {major}.{minor}", stage.prefix()),
        )),
    }
}

/// Reassembles a little-endian byte buffer into a token stream.
pub(crate) fn tokens_from_le_bytes(bytes: &[u8]) -> Result<Vec<u32>, TranslateError> {
    if bytes.len() % 4 != 0 {
        return Err(error::protocol(
            0,
            format!("byte length {} is not a whole number of tokens", bytes.len()),
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Forward-only cursor over the token stream. Reading past the end is a
/// protocol violation, never a panic.
pub(crate) struct TokenReader<'a> {
    tokens: &'a [u32],
    position: usize,
}

impl<'a> TokenReader<'a> {
    pub(crate) fn new(tokens: &'a [u32]) -> Self {
        TokenReader {
            tokens,
            position: 0,
        }
    }

    /// Index of the next unread token; doubles as `token_index` in errors.
    pub(crate) fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.position >= self.tokens.len()
    }

    pub(crate) fn next(&mut self, what: &str) -> Result<u32, TranslateError> {
        match self.tokens.get(self.position) {
            Some(&token) => {
                self.position += 1;
                Ok(token)
            }
            None => Err(error::protocol(
                self.position,
                format!("token stream ended while reading {what}"),
            )),
        }
    }

    pub(crate) fn skip(&mut self, count: usize, what: &str) -> Result<(), TranslateError> {
        match self
            .position
            .checked_add(count)
            .filter(|&end| end <= self.tokens.len())
        {
            Some(end) => {
                self.position = end;
                Ok(())
            }
            None => Err(error::protocol(
                self.position,
                format!("token stream ended while skipping {what}"),
            )),
        }
    }
}
