//! Output assembly: the GLSL text is gathered into sections (header,
//! attributes, parameters, instruction body) that are only stitched
//! together once translation finishes, since declarations depend on what
//! the instruction pass ends up touching.

use crate::float::{format_f32, format_f32_bits};
use crate::limits;
use crate::options::{TranslateFlags, TranslateOptions};
use crate::tracker::DeclTracker;
use crate::types::{ShaderStage, ShaderVersion};

/// Coefficients of the polynomial ladder sincos expands to. poly0 feeds the
/// high-order terms, poly1 finishes with the identity row.
const SINCOS_POLY0: [f32; 4] = [-1.5500992e-6, -2.1701389e-5, 0.0026041667, 0.00026041668];
const SINCOS_POLY1: [f32; 4] = [-0.020833334, -0.12500001, 1.0, 0.5];

#[derive(Default)]
pub(crate) struct SectionAssembler {
    header: String,
    attributes: String,
    parameters: String,
    alu: String,
}

impl SectionAssembler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_alu_line(&mut self, depth: usize, line: &str) {
        for _ in 0..depth {
            self.alu.push_str("  ");
        }
        self.alu.push_str(line);
        self.alu.push('\n');
    }

    /// Attaches a trailing comment to the most recent body line.
    pub(crate) fn append_to_last_alu_line(&mut self, comment: &str) {
        if self.alu.ends_with('\n') {
            self.alu.pop();
        }
        self.alu.push(' ');
        self.alu.push_str(comment);
        self.alu.push('\n');
    }

    pub(crate) fn alu_len(&self) -> usize {
        self.alu.len()
    }

    pub(crate) fn write_header(
        &mut self,
        version: ShaderVersion,
        options: &TranslateOptions,
        tracker: &DeclTracker,
    ) {
        self.header.push_str("#version 120\n");
        if tracker.needs_fragment_lod_extension {
            self.header
                .push_str("#extension GL_ARB_shader_texture_lod : require\n");
        }
        if options.flags.contains(TranslateFlags::BINDLESS_TEXTURES) {
            self.header
                .push_str("#extension GL_ARB_bindless_texture : require\n");
        }
        match &options.debug_label {
            Some(label) => self.header.push_str(&format!(
                "// {} trans#{} label:{label}\n",
                version.profile(),
                options.serial
            )),
            None => self.header.push_str(&format!(
                "// {} trans#{}\n",
                version.profile(),
                options.serial
            )),
        }
        if version.stage == ShaderStage::Pixel {
            let sampled = tracker.samplers_sampled;
            let shadow = options.shadow_samplers & sampled;
            self.header.push_str(&format!(
                "// samplers used: 0x{sampled:04x} shadow: 0x{shadow:04x}\n"
            ));
        }
    }

    pub(crate) fn write_attributes(&mut self, tracker: &DeclTracker) {
        for (slot, semantic) in tracker.attributes.iter().enumerate() {
            if let Some(semantic) = semantic {
                self.attributes.push_str(&format!(
                    "attribute vec4 v{slot}; // {}{}\n",
                    semantic.usage.name(),
                    semantic.usage_index
                ));
            }
        }
    }

    pub(crate) fn write_declarations(
        &mut self,
        version: ShaderVersion,
        options: &TranslateOptions,
        tracker: &DeclTracker,
    ) {
        let out = &mut self.parameters;
        for (index, words) in &tracker.float_defs {
            out.push_str(&format!(
                "const vec4 c{index} = vec4({}, {}, {}, {});\n",
                format_f32_bits(words[0]),
                format_f32_bits(words[1]),
                format_f32_bits(words[2]),
                format_f32_bits(words[3])
            ));
        }
        for (index, values) in &tracker.int_defs {
            out.push_str(&format!(
                "const ivec4 i{index} = ivec4({}, {}, {}, {});\n",
                values[0], values[1], values[2], values[3]
            ));
        }
        for (index, value) in &tracker.bool_defs {
            out.push_str(&format!("const bool b{index} = {value};\n"));
        }
        if tracker.uses_sincos_workspace {
            let p0 = SINCOS_POLY0.map(format_f32);
            let p1 = SINCOS_POLY1.map(format_f32);
            out.push_str(&format!(
                "const vec4 sc_poly0 = vec4({}, {}, {}, {});\n",
                p0[0], p0[1], p0[2], p0[3]
            ));
            out.push_str(&format!(
                "const vec4 sc_poly1 = vec4({}, {}, {}, {});\n",
                p1[0], p1[1], p1[2], p1[3]
            ));
        }
        if let Some(len) = float_array_len(version, options, tracker) {
            let array = match version.stage {
                ShaderStage::Vertex => "vc",
                ShaderStage::Pixel => "pc",
            };
            out.push_str(&format!("uniform vec4 {array}[{len}];\n"));
        }
        if let Some(watermark) = tracker.bone_watermark {
            out.push_str(&format!("uniform vec4 vcbones[{}];\n", watermark + 1));
        }
        for slot in 0..limits::MAX_INT_CONSTANTS {
            if tracker.int_registers & (1 << slot) != 0 && !tracker.int_defs.contains_key(&slot) {
                out.push_str(&format!("uniform ivec4 i{slot};\n"));
            }
        }
        for slot in 0..limits::MAX_BOOL_CONSTANTS {
            if tracker.bool_registers & (1 << slot) != 0 && !tracker.bool_defs.contains_key(&slot)
            {
                out.push_str(&format!("uniform bool b{slot};\n"));
            }
        }
        let bindless = options.flags.contains(TranslateFlags::BINDLESS_TEXTURES);
        for slot in 0..limits::MAX_SAMPLER_SLOTS {
            if tracker.samplers_sampled & (1 << slot) == 0 {
                continue;
            }
            if let Some(dim) = tracker.sampler_dims[slot] {
                if bindless {
                    out.push_str(&format!("uniform uvec2 sampler{slot}_handle;\n"));
                } else {
                    let shadow = options.shadow_samplers & (1 << slot) != 0;
                    out.push_str(&format!(
                        "uniform {} sampler{slot};\n",
                        dim.glsl_type(shadow)
                    ));
                }
            }
        }
        if version.stage == ShaderStage::Pixel
            && options.flags.contains(TranslateFlags::SRGB_WRITE_SUFFIX)
        {
            out.push_str("uniform float flSRGBWrite;\n");
        }
        for slot in 0..2 {
            if tracker.color_varyings & (1 << slot) != 0 {
                out.push_str(&format!("varying vec4 oD{slot};\n"));
            }
        }
        for slot in 0..8 {
            if tracker.texcoord_varyings & (1 << slot) != 0 {
                let centroid = if options.centroid_samplers & (1 << slot) != 0 {
                    "centroid "
                } else {
                    ""
                };
                out.push_str(&format!("{centroid}varying vec4 oT{slot};\n"));
            }
        }
        for slot in 0..limits::MAX_TEMP_REGISTERS {
            if tracker.temps & (1 << slot) != 0 {
                out.push_str(&format!("vec4 r{slot};\n"));
            }
        }
        if tracker.uses_address_reg {
            out.push_str("vec4 a0;\n");
        }
        if tracker.uses_position_workspace {
            out.push_str("vec4 o_pos;\n");
        }
        if tracker.uses_lrp_workspace {
            out.push_str("vec4 lrp_tmp;\n");
        }
        if tracker.uses_cmp_workspace {
            out.push_str("vec4 cmp_tmp;\n");
        }
        if tracker.uses_sincos_workspace {
            out.push_str("vec4 sc_tmp;\n");
        }
    }

    pub(crate) fn finish(self) -> String {
        let mut text = self.header;
        if !self.attributes.is_empty() {
            text.push('\n');
            text.push_str(&self.attributes);
        }
        if !self.parameters.is_empty() {
            text.push('\n');
            text.push_str(&self.parameters);
        }
        text.push('\n');
        text.push_str("void main() {\n");
        text.push_str(&self.alu);
        text.push_str("}\n");
        text
    }
}

/// Declared length of the float constant array, shared by the declaration
/// writer and the translation metadata. Environment-sourced constants pin
/// the array to the profile (or bone-split) limit so the host can upload
/// without consulting the shader.
pub(crate) fn float_array_len(
    version: ShaderVersion,
    options: &TranslateOptions,
    tracker: &DeclTracker,
) -> Option<usize> {
    let watermark = tracker.float_watermark?;
    let bones = version.stage == ShaderStage::Vertex
        && options.flags.contains(TranslateFlags::BONE_UNIFORMS);
    let limit = if bones {
        limits::BONE_CONSTANT_BASE
    } else {
        version.float_constant_limit()
    };
    if options.flags.contains(TranslateFlags::ENV_CONSTANTS) {
        Some(limit)
    } else {
        Some(watermark + 1)
    }
}
