//! Central limits for D3D9 shader translation inputs.
//!
//! These bound what the translator will accept before doing any real work, so
//! a malformed or hostile token stream fails fast instead of ballooning the
//! output buffers. The values come from the D3D9 shader model limits, not from
//! anything this crate invents.

/// Maximum accepted token count for one shader.
///
/// Real SM2/SM3 shaders are tiny (usually well under 4K tokens). 64K tokens
/// (256 KiB of bytecode) is far beyond anything fxc emits while still cheap
/// to buffer.
pub const MAX_SHADER_TOKEN_COUNT: usize = 64 * 1024;

/// Temporary registers `r0..r31`. SM3 guarantees 32; SM2 profiles expose
/// fewer, but the translator only sizes bitmasks with this.
pub const MAX_TEMP_REGISTERS: usize = 32;

/// Vertex attribute slots `v0..v15` (`D3DDECLUSAGE` stream inputs).
pub const MAX_ATTRIBUTE_SLOTS: usize = 16;

/// Declared input/output semantic slots for the SM3 `v#`/`o#` files. The
/// hardware exposes 12 vertex outputs and 10 pixel inputs; 32 covers every
/// encodable register index.
pub const MAX_SEMANTIC_SLOTS: usize = 32;

/// Sampler slots `s0..`. Pixel shaders expose 16 and vertex shaders 4; the
/// dimension table is sized to the encodable range.
pub const MAX_SAMPLER_SLOTS: usize = 32;

/// Integer constants `i0..i15` (`defi` / `rep` / `loop`).
pub const MAX_INT_CONSTANTS: usize = 16;

/// Boolean constants `b0..b15` (`defb` / `if`).
pub const MAX_BOOL_CONSTANTS: usize = 16;

/// Float constant file size for vertex shaders (`c0..c255`).
pub const VS_FLOAT_CONSTANTS: usize = 256;

/// Float constant file size for ps_2_x (`c0..c31`).
pub const PS_FLOAT_CONSTANTS_SM2: usize = 32;

/// Float constant file size for ps_3_0 (`c0..c223`).
pub const PS_FLOAT_CONSTANTS_SM3: usize = 224;

/// First vertex constant of the skinning-matrix range when bone uniforms are
/// split out (`TranslateFlags::BONE_UNIFORMS`). Matches the register layout
/// the companion engine reserves for its bone palette.
pub const BONE_CONSTANT_BASE: usize = 58;
