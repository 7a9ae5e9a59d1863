//! Shared shader-model vocabulary: stage, version, register partitions,
//! declaration semantics.

/// Pipeline stage, recovered from the version token prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

impl ShaderStage {
    /// Two-letter profile prefix ("vs" / "ps").
    pub fn prefix(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs",
            ShaderStage::Pixel => "ps",
        }
    }
}

/// Shader model version. Only 2.0, 2.x and 3.0 streams are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderVersion {
    pub stage: ShaderStage,
    pub major: u8,
    pub minor: u8,
}

impl ShaderVersion {
    pub fn is_sm2(self) -> bool {
        self.major == 2
    }

    pub fn is_sm3(self) -> bool {
        self.major == 3
    }

    /// D3D profile name, e.g. `vs_3_0`.
    pub fn profile(self) -> &'static str {
        match (self.stage, self.major, self.minor) {
            (ShaderStage::Vertex, 3, _) => "vs_3_0",
            (ShaderStage::Vertex, _, 0) => "vs_2_0",
            (ShaderStage::Vertex, _, _) => "vs_2_x",
            (ShaderStage::Pixel, 3, _) => "ps_3_0",
            (ShaderStage::Pixel, _, 0) => "ps_2_0",
            (ShaderStage::Pixel, _, _) => "ps_2_x",
        }
    }

    /// Size of the float constant file for this profile.
    pub fn float_constant_limit(self) -> usize {
        match self.stage {
            ShaderStage::Vertex => crate::limits::VS_FLOAT_CONSTANTS,
            ShaderStage::Pixel if self.is_sm3() => crate::limits::PS_FLOAT_CONSTANTS_SM3,
            ShaderStage::Pixel => crate::limits::PS_FLOAT_CONSTANTS_SM2,
        }
    }
}

/// Position of an operand within an instruction. Only `Relative` changes
/// register aliasing (raw type 3 is the address register, never `t#`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OperandRole {
    Dst,
    Src,
    Relative,
}

/// Register partition a parameter token refers to, after the stage and
/// shader-model aliasing of the raw 5-bit type field is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum RegisterFile {
    Temp,
    Input,
    Const,
    /// Vertex address register `a0`.
    Addr,
    /// Pixel SM2 texture coordinate register `t#`.
    Texture,
    /// Vertex rasterizer outputs: position, fog, point size.
    RastOut,
    /// Vertex SM2 color output `oD#`.
    AttrOut,
    /// Vertex SM2 texcoord output `oT#`.
    TexCoordOut,
    /// Vertex SM3 declared output `o#`.
    Output,
    ConstInt,
    /// Pixel color output `oC#`.
    ColorOut,
    /// Pixel depth output.
    DepthOut,
    Sampler,
    ConstBool,
    /// Loop counter `aL` (no strategy; coverage gap).
    Loop,
    /// Subroutine label (no strategy; coverage gap).
    Label,
    /// Predicate register `p#` (no strategy; coverage gap).
    Predicate,
}

impl RegisterFile {
    /// Maps the raw register type (bits 28..30 | bits 11..12 of a parameter
    /// token) to a partition. Raw types 2 and 11..13 are all float constants;
    /// raw types 3, 6 and 8 alias per stage and model.
    pub(crate) fn from_raw(raw: u32, version: ShaderVersion, role: OperandRole) -> Option<Self> {
        let vertex = version.stage == ShaderStage::Vertex;
        Some(match raw {
            0 => RegisterFile::Temp,
            1 => RegisterFile::Input,
            2 | 11 | 12 | 13 => RegisterFile::Const,
            3 if role == OperandRole::Relative => RegisterFile::Addr,
            3 if vertex => RegisterFile::Addr,
            3 => RegisterFile::Texture,
            4 if vertex => RegisterFile::RastOut,
            5 if vertex => RegisterFile::AttrOut,
            6 if vertex && version.is_sm3() => RegisterFile::Output,
            6 if vertex => RegisterFile::TexCoordOut,
            7 => RegisterFile::ConstInt,
            8 if vertex => RegisterFile::Output,
            8 => RegisterFile::ColorOut,
            9 if !vertex => RegisterFile::DepthOut,
            10 => RegisterFile::Sampler,
            14 => RegisterFile::ConstBool,
            15 => RegisterFile::Loop,
            18 => RegisterFile::Label,
            19 => RegisterFile::Predicate,
            _ => return None,
        })
    }
}

/// `dcl` usage (D3DDECLUSAGE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclUsage {
    Position,
    BlendWeight,
    BlendIndices,
    Normal,
    PointSize,
    TexCoord,
    Tangent,
    Binormal,
    TessFactor,
    PositionT,
    Color,
    Fog,
    Depth,
    Sample,
}

impl DeclUsage {
    pub(crate) fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => DeclUsage::Position,
            1 => DeclUsage::BlendWeight,
            2 => DeclUsage::BlendIndices,
            3 => DeclUsage::Normal,
            4 => DeclUsage::PointSize,
            5 => DeclUsage::TexCoord,
            6 => DeclUsage::Tangent,
            7 => DeclUsage::Binormal,
            8 => DeclUsage::TessFactor,
            9 => DeclUsage::PositionT,
            10 => DeclUsage::Color,
            11 => DeclUsage::Fog,
            12 => DeclUsage::Depth,
            13 => DeclUsage::Sample,
            _ => return None,
        })
    }

    /// Lowercase D3D semantic name, used in generated attribute comments.
    pub fn name(self) -> &'static str {
        match self {
            DeclUsage::Position => "position",
            DeclUsage::BlendWeight => "blendweight",
            DeclUsage::BlendIndices => "blendindices",
            DeclUsage::Normal => "normal",
            DeclUsage::PointSize => "psize",
            DeclUsage::TexCoord => "texcoord",
            DeclUsage::Tangent => "tangent",
            DeclUsage::Binormal => "binormal",
            DeclUsage::TessFactor => "tessfactor",
            DeclUsage::PositionT => "positiont",
            DeclUsage::Color => "color",
            DeclUsage::Fog => "fog",
            DeclUsage::Depth => "depth",
            DeclUsage::Sample => "sample",
        }
    }
}

/// Declared semantic for an input or output slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Semantic {
    pub usage: DeclUsage,
    pub usage_index: u8,
}

/// Sampler dimensionality from the `dcl` texture-type bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerDim {
    TwoD,
    Cube,
    Volume,
}

impl SamplerDim {
    /// Texture type lives in bits 27..30 of the declaration token.
    pub(crate) fn from_decl_raw(raw: u32) -> Option<Self> {
        match raw {
            2 => Some(SamplerDim::TwoD),
            3 => Some(SamplerDim::Cube),
            4 => Some(SamplerDim::Volume),
            _ => None,
        }
    }

    /// GLSL sampler type. Depth compare only exists for 2D targets in GLSL
    /// 1.20; shadow cube/volume sampling is rejected before declaration.
    pub fn glsl_type(self, shadow: bool) -> &'static str {
        match (self, shadow) {
            (SamplerDim::TwoD, false) => "sampler2D",
            (SamplerDim::TwoD, true) => "sampler2DShadow",
            (SamplerDim::Cube, _) => "samplerCube",
            (SamplerDim::Volume, _) => "sampler3D",
        }
    }
}

/// Comparison selector from the control bits of `ifc` / `breakc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Gt,
    Eq,
    Ge,
    Lt,
    Ne,
    Le,
}

impl CompareOp {
    pub(crate) fn from_control_bits(bits: u32) -> Option<Self> {
        match bits {
            1 => Some(CompareOp::Gt),
            2 => Some(CompareOp::Eq),
            3 => Some(CompareOp::Ge),
            4 => Some(CompareOp::Lt),
            5 => Some(CompareOp::Ne),
            6 => Some(CompareOp::Le),
            _ => None,
        }
    }

    pub(crate) fn glsl(self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Eq => "==",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Ne => "!=",
            CompareOp::Le => "<=",
        }
    }
}
