//! Parameter codec: turns destination and source parameter tokens into
//! rendered GLSL operand text, recording declarations and usage in the
//! tracker as a side effect.

use crate::error::{self, TranslateError};
use crate::limits;
use crate::options::TranslateFlags;
use crate::swizzle::LETTERS;
use crate::tokens::{self, TokenReader};
use crate::translate::Translation;
use crate::types::{DeclUsage, OperandRole, RegisterFile, Semantic, ShaderStage};

/// Decoded destination operand. `text` is the complete GLSL lvalue
/// including any write-mask suffix.
pub(crate) struct DstOperand {
    pub(crate) text: String,
    pub(crate) file: RegisterFile,
    pub(crate) mask: u8,
    /// Number of components the assignment writes.
    pub(crate) arity: usize,
    /// Target is a scalar built-in; mask text is suppressed.
    pub(crate) scalar: bool,
    pub(crate) saturate: bool,
}

impl DstOperand {
    /// Letters of the write mask in vector order.
    pub(crate) fn mask_letters(&self) -> String {
        mask_letters(self.mask)
    }

    /// Vector index a scalar target reads from its sources: the first set
    /// mask bit.
    pub(crate) fn scalar_read_position(&self) -> usize {
        (0..4).find(|&i| self.mask & (1 << i) != 0).unwrap_or(0)
    }

    /// Suffix for vec4-producing right-hand sides (texture fetches,
    /// `vec4(..)` constructors) so their arity matches the masked lvalue.
    pub(crate) fn result_suffix(&self) -> String {
        if self.scalar {
            format!(".{}", LETTERS[self.scalar_read_position()])
        } else if self.mask == 0xF {
            String::new()
        } else {
            format!(".{}", self.mask_letters())
        }
    }
}

/// Decoded source operand. `text` is the complete GLSL expression with
/// swizzle and modifier applied.
pub(crate) struct SrcOperand {
    pub(crate) text: String,
    pub(crate) file: RegisterFile,
    pub(crate) index: usize,
    /// Address-register component selected by relative addressing.
    pub(crate) relative_component: Option<char>,
}

pub(crate) fn decode_dst(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    opcode: &'static str,
) -> Result<DstOperand, TranslateError> {
    let token_index = reader.position();
    let token = reader.next("destination parameter")?;
    if token & tokens::PARAM_TAG == 0 {
        return Err(error::protocol(
            token_index,
            format!("{opcode}: expected a destination parameter token"),
        ));
    }
    if token & tokens::PARAM_RELATIVE != 0 {
        return Err(error::protocol(
            token_index,
            format!("{opcode}: relative addressing on a destination"),
        ));
    }

    let raw = ((token >> 28) & 0x7) | ((token >> 8) & 0x18);
    let index = (token & 0x7FF) as usize;
    let file = RegisterFile::from_raw(raw, tr.version, OperandRole::Dst).ok_or_else(|| {
        error::protocol(
            token_index,
            format!("{opcode}: unknown destination register type {raw}"),
        )
    })?;

    let modifier = (token >> 20) & 0xF;
    if modifier & !0x7 != 0 {
        return Err(error::coverage(
            token_index,
            opcode,
            format!("destination modifier 0x{modifier:x}"),
        ));
    }
    // Saturate is honored; partial precision (2) and centroid (4) hints
    // carry no GLSL 1.20 meaning.
    let saturate = modifier & 0x1 != 0;

    let mut mask = ((token >> 16) & 0xF) as u8;
    if mask == 0 {
        mask = 0xF;
    }

    let (base, scalar) = dst_register_name(tr, opcode, file, index, token_index)?;
    let arity = if scalar {
        1
    } else {
        mask.count_ones() as usize
    };
    let text = if scalar || mask == 0xF {
        base
    } else {
        format!("{base}.{}", mask_letters(mask))
    };

    Ok(DstOperand {
        text,
        file,
        mask,
        arity,
        scalar,
        saturate,
    })
}

pub(crate) fn decode_src(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    opcode: &'static str,
) -> Result<SrcOperand, TranslateError> {
    let token_index = reader.position();
    let token = reader.next("source parameter")?;
    if token & tokens::PARAM_TAG == 0 {
        return Err(error::protocol(
            token_index,
            format!("{opcode}: expected a source parameter token"),
        ));
    }

    let raw = ((token >> 28) & 0x7) | ((token >> 8) & 0x18);
    let index = (token & 0x7FF) as usize;
    let file = RegisterFile::from_raw(raw, tr.version, OperandRole::Src).ok_or_else(|| {
        error::protocol(
            token_index,
            format!("{opcode}: unknown source register type {raw}"),
        )
    })?;

    let mut relative_component = None;
    let base = if token & tokens::PARAM_RELATIVE != 0 {
        if tr.version.stage == ShaderStage::Pixel {
            return Err(error::coverage(
                token_index,
                opcode,
                "relative addressing in a pixel shader",
            ));
        }
        if file != RegisterFile::Const {
            return Err(error::protocol(
                token_index,
                format!("{opcode}: relative addressing on a non-constant register"),
            ));
        }
        if index >= tr.version.float_constant_limit() {
            return Err(error::protocol(
                token_index,
                format!(
                    "{opcode}: float constant c{index} out of range for {}",
                    tr.version.profile()
                ),
            ));
        }
        let component = decode_relative_selector(tr, reader, opcode)?;
        relative_component = Some(component);
        relative_const_name(tr, index, component)
    } else {
        src_register_name(tr, opcode, file, index, token_index)?
    };

    let modifier = (token >> 24) & 0xF;
    if file == RegisterFile::Sampler && modifier != 0 {
        return Err(error::protocol(
            token_index,
            format!("{opcode}: modifier on a sampler"),
        ));
    }
    let suffix = match file {
        // Bools and samplers are not four-wide; their swizzle is meaningless.
        RegisterFile::ConstBool | RegisterFile::Sampler => String::new(),
        _ => swizzle_suffix((token >> 16) & 0xFF),
    };
    let text = match modifier {
        0 => format!("{base}{suffix}"),
        1 => format!("-{base}{suffix}"),
        11 => format!("abs({base}{suffix})"),
        12 => format!("-abs({base}{suffix})"),
        13 if file == RegisterFile::ConstBool => format!("!{base}"),
        13 => {
            return Err(error::protocol(
                token_index,
                format!("{opcode}: logical not on a non-boolean register"),
            ));
        }
        other => {
            return Err(error::coverage(
                token_index,
                opcode,
                format!("source modifier {other}"),
            ));
        }
    };

    Ok(SrcOperand {
        text,
        file,
        index,
        relative_component,
    })
}

/// Renders swizzle bits: the identity drops the suffix, a replicated
/// component emits one letter, anything else all four.
fn swizzle_suffix(bits: u32) -> String {
    if bits == 0xE4 {
        return String::new();
    }
    let mut letters = ['x'; 4];
    for (i, letter) in letters.iter_mut().enumerate() {
        *letter = LETTERS[((bits >> (2 * i)) & 0x3) as usize];
    }
    if letters.iter().all(|&l| l == letters[0]) {
        return format!(".{}", letters[0]);
    }
    format!(".{}{}{}{}", letters[0], letters[1], letters[2], letters[3])
}

fn mask_letters(mask: u8) -> String {
    let mut letters = String::new();
    for (i, letter) in LETTERS.iter().enumerate() {
        if mask & (1 << i) != 0 {
            letters.push(*letter);
        }
    }
    letters
}

fn decode_relative_selector(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    opcode: &'static str,
) -> Result<char, TranslateError> {
    let token_index = reader.position();
    let token = reader.next("relative address selector")?;
    if token & tokens::PARAM_TAG == 0 {
        return Err(error::protocol(
            token_index,
            format!("{opcode}: expected an address selector token"),
        ));
    }
    let raw = ((token >> 28) & 0x7) | ((token >> 8) & 0x18);
    match RegisterFile::from_raw(raw, tr.version, OperandRole::Relative) {
        Some(RegisterFile::Addr) => {}
        Some(RegisterFile::Loop) => {
            return Err(error::coverage(
                token_index,
                opcode,
                "loop counter relative addressing",
            ));
        }
        _ => {
            return Err(error::protocol(
                token_index,
                format!("{opcode}: relative selector must be the address register"),
            ));
        }
    }
    if token & 0x7FF != 0 {
        return Err(error::protocol(
            token_index,
            format!("{opcode}: address register a{} out of range", token & 0x7FF),
        ));
    }
    tr.tracker.uses_address_reg = true;
    Ok(LETTERS[((token >> 16) & 0x3) as usize])
}

/// Text for an indirectly addressed vertex float constant. The runtime
/// index is unknowable, so the watermark of the addressed range rises to
/// its full size.
fn relative_const_name(tr: &mut Translation<'_>, index: usize, component: char) -> String {
    let bones = tr.options.flags.contains(TranslateFlags::BONE_UNIFORMS);
    if bones && index >= limits::BONE_CONSTANT_BASE {
        tr.tracker
            .note_bone_constant(limits::VS_FLOAT_CONSTANTS - limits::BONE_CONSTANT_BASE - 1);
        format!(
            "vcbones[int(a0.{component}) + {}]",
            index - limits::BONE_CONSTANT_BASE
        )
    } else {
        let limit = if bones {
            limits::BONE_CONSTANT_BASE
        } else {
            tr.version.float_constant_limit()
        };
        tr.tracker.note_constant(limit - 1);
        format!("vc[int(a0.{component}) + {index}]")
    }
}

fn dst_register_name(
    tr: &mut Translation<'_>,
    opcode: &'static str,
    file: RegisterFile,
    index: usize,
    token_index: usize,
) -> Result<(String, bool), TranslateError> {
    match file {
        RegisterFile::Temp => {
            if index >= limits::MAX_TEMP_REGISTERS {
                return Err(error::protocol(
                    token_index,
                    format!("{opcode}: temp register r{index} out of range"),
                ));
            }
            tr.tracker.note_register_used(file, index);
            Ok((format!("r{index}"), false))
        }
        RegisterFile::Addr => {
            if index != 0 {
                return Err(error::protocol(
                    token_index,
                    format!("{opcode}: address register a{index} out of range"),
                ));
            }
            tr.tracker.uses_address_reg = true;
            Ok(("a0".to_owned(), false))
        }
        RegisterFile::RastOut => match index {
            0 => Ok((tr.position_target(), false)),
            1 => Ok(("gl_FogFragCoord".to_owned(), true)),
            2 => Ok(("gl_PointSize".to_owned(), true)),
            _ => Err(error::protocol(
                token_index,
                format!("{opcode}: rasterizer output {index} out of range"),
            )),
        },
        RegisterFile::AttrOut => {
            if index >= 2 {
                return Err(error::protocol(
                    token_index,
                    format!("{opcode}: color output oD{index} out of range"),
                ));
            }
            tr.tracker.note_register_used(file, index);
            Ok((format!("oD{index}"), false))
        }
        RegisterFile::TexCoordOut => {
            if index >= 8 {
                return Err(error::protocol(
                    token_index,
                    format!("{opcode}: texcoord output oT{index} out of range"),
                ));
            }
            tr.tracker.note_register_used(file, index);
            Ok((format!("oT{index}"), false))
        }
        RegisterFile::Output => {
            let semantic = tr
                .tracker
                .vs_outputs
                .get(index)
                .copied()
                .flatten()
                .ok_or_else(|| {
                    error::protocol(
                        token_index,
                        format!("{opcode}: output register o{index} referenced without dcl"),
                    )
                })?;
            vs_output_name(tr, opcode, semantic, token_index)
        }
        RegisterFile::ColorOut => {
            if index >= 4 {
                return Err(error::protocol(
                    token_index,
                    format!("{opcode}: color output oC{index} out of range"),
                ));
            }
            Ok((format!("gl_FragData[{index}]"), false))
        }
        RegisterFile::DepthOut => {
            if index != 0 {
                return Err(error::protocol(
                    token_index,
                    format!("{opcode}: depth output {index} out of range"),
                ));
            }
            Ok(("gl_FragDepth".to_owned(), true))
        }
        RegisterFile::Loop | RegisterFile::Label | RegisterFile::Predicate => Err(
            error::coverage(token_index, opcode, register_gap(file)),
        ),
        RegisterFile::Input
        | RegisterFile::Const
        | RegisterFile::Texture
        | RegisterFile::ConstInt
        | RegisterFile::ConstBool
        | RegisterFile::Sampler => Err(error::protocol(
            token_index,
            format!("{opcode}: destination register is not writable"),
        )),
    }
}

/// Canonical varying for a declared vertex SM3 output semantic.
fn vs_output_name(
    tr: &mut Translation<'_>,
    opcode: &'static str,
    semantic: Semantic,
    token_index: usize,
) -> Result<(String, bool), TranslateError> {
    match (semantic.usage, semantic.usage_index) {
        (DeclUsage::Position, 0) => Ok((tr.position_target(), false)),
        (DeclUsage::Fog, _) => Ok(("gl_FogFragCoord".to_owned(), true)),
        (DeclUsage::PointSize, _) => Ok(("gl_PointSize".to_owned(), true)),
        (DeclUsage::Color, i) if i < 2 => {
            tr.tracker
                .note_register_used(RegisterFile::AttrOut, i as usize);
            Ok((format!("oD{i}"), false))
        }
        (DeclUsage::TexCoord, i) if i < 8 => {
            tr.tracker
                .note_register_used(RegisterFile::TexCoordOut, i as usize);
            Ok((format!("oT{i}"), false))
        }
        (usage, i) => Err(error::coverage(
            token_index,
            opcode,
            format!("output semantic {}{i}", usage.name()),
        )),
    }
}

/// Canonical varying for a declared pixel SM3 input semantic.
fn ps_input_name(
    tr: &mut Translation<'_>,
    opcode: &'static str,
    semantic: Semantic,
    token_index: usize,
) -> Result<String, TranslateError> {
    match (semantic.usage, semantic.usage_index) {
        (DeclUsage::Color, i) if i < 2 => {
            tr.tracker
                .note_register_used(RegisterFile::AttrOut, i as usize);
            Ok(format!("oD{i}"))
        }
        (DeclUsage::TexCoord, i) if i < 8 => {
            tr.tracker
                .note_register_used(RegisterFile::TexCoordOut, i as usize);
            Ok(format!("oT{i}"))
        }
        (usage, i) => Err(error::coverage(
            token_index,
            opcode,
            format!("input semantic {}{i}", usage.name()),
        )),
    }
}

fn src_register_name(
    tr: &mut Translation<'_>,
    opcode: &'static str,
    file: RegisterFile,
    index: usize,
    token_index: usize,
) -> Result<String, TranslateError> {
    let version = tr.version;
    match file {
        RegisterFile::Temp => {
            if index >= limits::MAX_TEMP_REGISTERS {
                return Err(error::protocol(
                    token_index,
                    format!("{opcode}: temp register r{index} out of range"),
                ));
            }
            tr.tracker.note_register_used(file, index);
            Ok(format!("r{index}"))
        }
        RegisterFile::Input => match version.stage {
            ShaderStage::Vertex => {
                if index >= limits::MAX_ATTRIBUTE_SLOTS {
                    return Err(error::protocol(
                        token_index,
                        format!("{opcode}: input register v{index} out of range"),
                    ));
                }
                if tr.tracker.attributes[index].is_none() {
                    return Err(error::protocol(
                        token_index,
                        format!("{opcode}: input register v{index} referenced without dcl"),
                    ));
                }
                Ok(format!("v{index}"))
            }
            ShaderStage::Pixel if version.is_sm3() => {
                let semantic = tr
                    .tracker
                    .ps_inputs
                    .get(index)
                    .copied()
                    .flatten()
                    .ok_or_else(|| {
                        error::protocol(
                            token_index,
                            format!("{opcode}: input register v{index} referenced without dcl"),
                        )
                    })?;
                ps_input_name(tr, opcode, semantic, token_index)
            }
            ShaderStage::Pixel => {
                if index >= 2 {
                    return Err(error::protocol(
                        token_index,
                        format!("{opcode}: color input v{index} out of range"),
                    ));
                }
                if tr.tracker.ps_colors_declared & (1 << index) == 0 {
                    return Err(error::protocol(
                        token_index,
                        format!("{opcode}: color input v{index} referenced without dcl"),
                    ));
                }
                tr.tracker.note_register_used(RegisterFile::AttrOut, index);
                Ok(format!("oD{index}"))
            }
        },
        RegisterFile::Texture => {
            if index >= 8 {
                return Err(error::protocol(
                    token_index,
                    format!("{opcode}: texcoord register t{index} out of range"),
                ));
            }
            if tr.tracker.ps_texcoords_declared & (1 << index) == 0 {
                return Err(error::protocol(
                    token_index,
                    format!("{opcode}: texcoord register t{index} referenced without dcl"),
                ));
            }
            tr.tracker.note_register_used(file, index);
            Ok(format!("oT{index}"))
        }
        RegisterFile::Addr => {
            if index != 0 {
                return Err(error::protocol(
                    token_index,
                    format!("{opcode}: address register a{index} out of range"),
                ));
            }
            tr.tracker.uses_address_reg = true;
            Ok("a0".to_owned())
        }
        RegisterFile::Const => {
            if index >= version.float_constant_limit() {
                return Err(error::protocol(
                    token_index,
                    format!(
                        "{opcode}: float constant c{index} out of range for {}",
                        version.profile()
                    ),
                ));
            }
            if tr.tracker.float_defs.contains_key(&index) {
                return Ok(format!("c{index}"));
            }
            let bones = version.stage == ShaderStage::Vertex
                && tr.options.flags.contains(TranslateFlags::BONE_UNIFORMS);
            if bones && index >= limits::BONE_CONSTANT_BASE {
                let offset = index - limits::BONE_CONSTANT_BASE;
                tr.tracker.note_bone_constant(offset);
                Ok(format!("vcbones[{offset}]"))
            } else {
                tr.tracker.note_constant(index);
                let array = match version.stage {
                    ShaderStage::Vertex => "vc",
                    ShaderStage::Pixel => "pc",
                };
                Ok(format!("{array}[{index}]"))
            }
        }
        RegisterFile::ConstInt => {
            if index >= limits::MAX_INT_CONSTANTS {
                return Err(error::protocol(
                    token_index,
                    format!("{opcode}: integer constant i{index} out of range"),
                ));
            }
            tr.tracker.note_register_used(file, index);
            Ok(format!("i{index}"))
        }
        RegisterFile::ConstBool => {
            if index >= limits::MAX_BOOL_CONSTANTS {
                return Err(error::protocol(
                    token_index,
                    format!("{opcode}: boolean constant b{index} out of range"),
                ));
            }
            tr.tracker.note_register_used(file, index);
            Ok(format!("b{index}"))
        }
        RegisterFile::Sampler => {
            if index >= limits::MAX_SAMPLER_SLOTS {
                return Err(error::protocol(
                    token_index,
                    format!("{opcode}: sampler s{index} out of range"),
                ));
            }
            if tr.tracker.sampler_dims[index].is_none() {
                return Err(error::protocol(
                    token_index,
                    format!("{opcode}: sampler s{index} referenced without dcl"),
                ));
            }
            tr.tracker.note_register_used(file, index);
            Ok(format!("sampler{index}"))
        }
        RegisterFile::Loop | RegisterFile::Label | RegisterFile::Predicate => {
            Err(error::coverage(token_index, opcode, register_gap(file)))
        }
        RegisterFile::RastOut
        | RegisterFile::AttrOut
        | RegisterFile::TexCoordOut
        | RegisterFile::Output
        | RegisterFile::ColorOut
        | RegisterFile::DepthOut => Err(error::protocol(
            token_index,
            format!("{opcode}: source register is not readable"),
        )),
    }
}

fn register_gap(file: RegisterFile) -> &'static str {
    match file {
        RegisterFile::Loop => "loop counter register",
        RegisterFile::Label => "label register",
        _ => "predicate register",
    }
}
