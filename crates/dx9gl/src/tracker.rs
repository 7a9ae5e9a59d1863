//! Declaration and usage tracking. The codec and the declarative strategies
//! fill this in during the main pass; the deferred post-pass queries it to
//! emit the attribute, uniform, varying and workspace declarations.

use std::collections::BTreeMap;

use crate::error::{self, TranslateError};
use crate::limits::{MAX_ATTRIBUTE_SLOTS, MAX_SAMPLER_SLOTS, MAX_SEMANTIC_SLOTS};
use crate::types::{RegisterFile, SamplerDim, Semantic};

#[derive(Default)]
pub(crate) struct DeclTracker {
    /// Vertex input slots (`dcl_usage v#`), first declaration wins.
    pub(crate) attributes: [Option<Semantic>; MAX_ATTRIBUTE_SLOTS],
    /// Vertex SM3 output slots (`dcl_usage o#`).
    pub(crate) vs_outputs: [Option<Semantic>; MAX_SEMANTIC_SLOTS],
    /// Pixel SM3 input slots (`dcl_usage v#`).
    pub(crate) ps_inputs: [Option<Semantic>; MAX_SEMANTIC_SLOTS],
    pub(crate) sampler_dims: [Option<SamplerDim>; MAX_SAMPLER_SLOTS],

    /// Pixel SM2 declared registers (these carry no usage).
    pub(crate) ps_colors_declared: u32,
    pub(crate) ps_texcoords_declared: u32,

    /// Referenced registers, one bit per index.
    pub(crate) temps: u32,
    pub(crate) int_registers: u16,
    pub(crate) bool_registers: u16,
    pub(crate) samplers_sampled: u32,
    pub(crate) color_varyings: u32,
    pub(crate) texcoord_varyings: u32,

    /// Largest float constant index referenced through the `vc`/`pc` array.
    pub(crate) float_watermark: Option<usize>,
    /// Largest referenced bone constant, relative to the bone range base.
    pub(crate) bone_watermark: Option<usize>,

    /// Explicitly named constants, keyed by register index.
    pub(crate) float_defs: BTreeMap<usize, [u32; 4]>,
    pub(crate) int_defs: BTreeMap<usize, [i32; 4]>,
    pub(crate) bool_defs: BTreeMap<usize, bool>,

    // Emulation workspaces that need file-scope declarations.
    pub(crate) uses_address_reg: bool,
    pub(crate) uses_position_workspace: bool,
    pub(crate) uses_lrp_workspace: bool,
    pub(crate) uses_cmp_workspace: bool,
    pub(crate) uses_sincos_workspace: bool,
    /// Explicit-LOD sampling in a fragment shader needs an extension.
    pub(crate) needs_fragment_lod_extension: bool,
}

impl DeclTracker {
    pub(crate) fn declare_attribute(
        &mut self,
        slot: usize,
        semantic: Semantic,
        token_index: usize,
    ) -> Result<(), TranslateError> {
        if slot >= self.attributes.len() {
            return Err(error::protocol(
                token_index,
                format!("attribute slot v{slot} out of range"),
            ));
        }
        if self.attributes[slot].is_some() {
            return Err(error::protocol(
                token_index,
                format!("attribute slot v{slot} declared twice"),
            ));
        }
        self.attributes[slot] = Some(semantic);
        Ok(())
    }

    pub(crate) fn declare_vs_output(
        &mut self,
        slot: usize,
        semantic: Semantic,
        token_index: usize,
    ) -> Result<(), TranslateError> {
        if slot >= self.vs_outputs.len() {
            return Err(error::protocol(
                token_index,
                format!("output slot o{slot} out of range"),
            ));
        }
        if self.vs_outputs[slot].is_some() {
            return Err(error::protocol(
                token_index,
                format!("output slot o{slot} declared twice"),
            ));
        }
        self.vs_outputs[slot] = Some(semantic);
        Ok(())
    }

    pub(crate) fn declare_ps_input(
        &mut self,
        slot: usize,
        semantic: Semantic,
        token_index: usize,
    ) -> Result<(), TranslateError> {
        if slot >= self.ps_inputs.len() {
            return Err(error::protocol(
                token_index,
                format!("input slot v{slot} out of range"),
            ));
        }
        if self.ps_inputs[slot].is_some() {
            return Err(error::protocol(
                token_index,
                format!("input slot v{slot} declared twice"),
            ));
        }
        self.ps_inputs[slot] = Some(semantic);
        Ok(())
    }

    pub(crate) fn declare_ps_color(
        &mut self,
        slot: usize,
        token_index: usize,
    ) -> Result<(), TranslateError> {
        if slot >= 2 {
            return Err(error::protocol(
                token_index,
                format!("color input v{slot} out of range"),
            ));
        }
        if self.ps_colors_declared & (1 << slot) != 0 {
            return Err(error::protocol(
                token_index,
                format!("color input v{slot} declared twice"),
            ));
        }
        self.ps_colors_declared |= 1 << slot;
        Ok(())
    }

    pub(crate) fn declare_ps_texcoord(
        &mut self,
        slot: usize,
        token_index: usize,
    ) -> Result<(), TranslateError> {
        if slot >= 8 {
            return Err(error::protocol(
                token_index,
                format!("texcoord register t{slot} out of range"),
            ));
        }
        if self.ps_texcoords_declared & (1 << slot) != 0 {
            return Err(error::protocol(
                token_index,
                format!("texcoord register t{slot} declared twice"),
            ));
        }
        self.ps_texcoords_declared |= 1 << slot;
        Ok(())
    }

    pub(crate) fn note_sampler_dimension(
        &mut self,
        slot: usize,
        dim: SamplerDim,
        token_index: usize,
    ) -> Result<(), TranslateError> {
        if slot >= self.sampler_dims.len() {
            return Err(error::protocol(
                token_index,
                format!("sampler s{slot} out of range"),
            ));
        }
        if self.sampler_dims[slot].is_some() {
            return Err(error::protocol(
                token_index,
                format!("sampler s{slot} declared twice"),
            ));
        }
        self.sampler_dims[slot] = Some(dim);
        Ok(())
    }

    /// Records a register reference for deferred declaration emission.
    /// Indices were bounds-checked by the codec.
    pub(crate) fn note_register_used(&mut self, file: RegisterFile, index: usize) {
        match file {
            RegisterFile::Temp => self.temps |= 1 << index,
            RegisterFile::ConstInt => self.int_registers |= 1 << index,
            RegisterFile::ConstBool => self.bool_registers |= 1 << index,
            RegisterFile::Sampler => self.samplers_sampled |= 1 << index,
            RegisterFile::AttrOut => self.color_varyings |= 1 << index,
            RegisterFile::TexCoordOut | RegisterFile::Texture => {
                self.texcoord_varyings |= 1 << index;
            }
            _ => {}
        }
    }

    /// Raises the float-constant high-water mark.
    pub(crate) fn note_constant(&mut self, index: usize) {
        self.float_watermark = Some(self.float_watermark.map_or(index, |w| w.max(index)));
    }

    /// Raises the bone high-water mark (offset is relative to the base).
    pub(crate) fn note_bone_constant(&mut self, offset: usize) {
        self.bone_watermark = Some(self.bone_watermark.map_or(offset, |w| w.max(offset)));
    }

    pub(crate) fn def_float(
        &mut self,
        index: usize,
        words: [u32; 4],
        token_index: usize,
    ) -> Result<(), TranslateError> {
        if self.float_defs.insert(index, words).is_some() {
            return Err(error::protocol(
                token_index,
                format!("constant c{index} defined twice"),
            ));
        }
        Ok(())
    }

    pub(crate) fn def_int(
        &mut self,
        index: usize,
        values: [i32; 4],
        token_index: usize,
    ) -> Result<(), TranslateError> {
        if self.int_defs.insert(index, values).is_some() {
            return Err(error::protocol(
                token_index,
                format!("constant i{index} defined twice"),
            ));
        }
        Ok(())
    }

    pub(crate) fn def_bool(
        &mut self,
        index: usize,
        value: bool,
        token_index: usize,
    ) -> Result<(), TranslateError> {
        if self.bool_defs.insert(index, value).is_some() {
            return Err(error::protocol(
                token_index,
                format!("constant b{index} defined twice"),
            ));
        }
        Ok(())
    }
}
