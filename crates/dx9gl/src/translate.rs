//! Translation driver: walks the token stream front to back, dispatching
//! each instruction, then assembles the finished GLSL once every
//! declaration is known.

use crate::assemble::{self, SectionAssembler};
use crate::emit::{self, Frame};
use crate::error::{self, TranslateError};
use crate::limits;
use crate::options::{TranslateFlags, TranslateOptions};
use crate::tokens::{self, TokenReader};
use crate::tracker::DeclTracker;
use crate::types::{SamplerDim, Semantic, ShaderStage, ShaderVersion};

/// Mutable translation state threaded through instruction dispatch.
pub(crate) struct Translation<'a> {
    pub(crate) version: ShaderVersion,
    pub(crate) options: &'a TranslateOptions,
    pub(crate) tracker: DeclTracker,
    pub(crate) frames: Vec<Frame>,
    pub(crate) instructions: usize,
}

impl Translation<'_> {
    /// Indent depth of the next body line: one level inside main() plus one
    /// per open control-flow frame.
    pub(crate) fn depth(&self) -> usize {
        1 + self.frames.len()
    }

    /// Name position writes resolve to. Coordinate fixups and user clip
    /// planes need the unfixed position after the last write, so those
    /// configurations route it through a workspace variable that the footer
    /// folds into gl_Position.
    pub(crate) fn position_target(&mut self) -> String {
        let fixups =
            TranslateFlags::FIXUP_Y | TranslateFlags::FIXUP_Z | TranslateFlags::USER_CLIP_PLANES;
        if self.options.flags.intersects(fixups) {
            self.tracker.uses_position_workspace = true;
            "o_pos".to_owned()
        } else {
            "gl_Position".to_owned()
        }
    }
}

/// A finished translation: the GLSL 1.20 source plus the interface metadata
/// the host needs to bind it.
#[derive(Debug, Clone)]
pub struct TranslatedShader {
    pub glsl: String,
    pub stage: ShaderStage,
    pub version: ShaderVersion,
    /// Semantic bound to each vertex input slot, `v{n}` in the output.
    pub attributes: [Option<Semantic>; limits::MAX_ATTRIBUTE_SLOTS],
    /// Declared dimensionality per sampler slot.
    pub sampler_dims: [Option<SamplerDim>; limits::MAX_SAMPLER_SLOTS],
    /// Bitmask of sampler slots the shader actually samples.
    pub samplers_used: u32,
    /// Subset of `samplers_used` bound as shadow samplers.
    pub shadow_samplers: u32,
    /// Declared length of the `vc`/`pc` float constant array, 0 if absent.
    pub float_constants: usize,
    /// Declared length of the `vcbones` array, 0 if absent.
    pub bone_constants: usize,
}

/// Translates a raw little-endian byte buffer. The buffer must be a whole
/// number of 32-bit words.
pub fn translate_bytes(
    bytes: &[u8],
    options: &TranslateOptions,
) -> Result<TranslatedShader, TranslateError> {
    let words = tokens::tokens_from_le_bytes(bytes)?;
    translate_tokens(&words, options)
}

/// Translates a D3D9 shader token stream into GLSL 1.20.
pub fn translate_tokens(
    stream: &[u32],
    options: &TranslateOptions,
) -> Result<TranslatedShader, TranslateError> {
    if stream.is_empty() {
        return Err(error::protocol(0, "empty shader token stream"));
    }
    if stream.len() > limits::MAX_SHADER_TOKEN_COUNT {
        return Err(error::protocol(
            0,
            format!(
                "shader exceeds {} tokens ({})",
                limits::MAX_SHADER_TOKEN_COUNT,
                stream.len()
            ),
        ));
    }

    let mut reader = TokenReader::new(stream);
    let version = tokens::decode_version_token(reader.next("version token")?)?;
    let mut tr = Translation {
        version,
        options,
        tracker: DeclTracker::default(),
        frames: Vec::new(),
        instructions: 0,
    };
    let mut asm = SectionAssembler::new();

    let mut ended = false;
    while !reader.is_empty() {
        let token_index = reader.position();
        let token = reader.next("instruction token")?;
        if token == tokens::END_TOKEN {
            // Anything after the end token is padding; leave it unread.
            ended = true;
            break;
        }
        if tokens::opcode_raw(token) == tokens::OPCODE_COMMENT {
            reader.skip(tokens::comment_length(token), "comment payload")?;
            continue;
        }
        if token & tokens::PARAM_TAG != 0 {
            return Err(error::protocol(token_index, "expected an instruction token"));
        }
        emit::dispatch_instruction(&mut tr, &mut reader, &mut asm, stream, token, token_index)?;
        tr.instructions += 1;
    }
    if !ended {
        return Err(error::protocol(reader.position(), "missing end token"));
    }
    if !tr.frames.is_empty() {
        return Err(error::protocol(
            reader.position(),
            "unterminated control flow block",
        ));
    }

    emit::emit_footer(&tr, &mut asm);
    asm.write_header(version, options, &tr.tracker);
    asm.write_attributes(&tr.tracker);
    asm.write_declarations(version, options, &tr.tracker);
    let glsl = asm.finish();

    tracing::debug!(
        profile = version.profile(),
        instructions = tr.instructions,
        glsl_bytes = glsl.len(),
        "translated d3d9 shader"
    );

    let samplers_used = tr.tracker.samplers_sampled;
    Ok(TranslatedShader {
        glsl,
        stage: version.stage,
        version,
        attributes: tr.tracker.attributes,
        sampler_dims: tr.tracker.sampler_dims,
        samplers_used,
        shadow_samplers: options.shadow_samplers & samplers_used,
        float_constants: assemble::float_array_len(version, options, &tr.tracker).unwrap_or(0),
        bone_constants: tr.tracker.bone_watermark.map_or(0, |w| w + 1),
    })
}
