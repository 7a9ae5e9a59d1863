//! Direct3D 9 Shader Model 2.x / 3.0 bytecode to GLSL 1.20 translation.
//!
//! The translator makes a single forward pass over the token stream,
//! rendering each instruction to GLSL statements while recording which
//! registers, constants, samplers and varyings the shader touches. The
//! declaration sections are assembled afterwards from that record, so the
//! output only declares what the shader uses. Failure is always total:
//! a stream that violates the bytecode protocol or uses a feature without
//! an emission strategy returns an error and no GLSL.

pub mod error;
pub mod float;
pub mod limits;
pub mod options;
pub mod swizzle;
pub mod translate;
pub mod types;

mod assemble;
mod emit;
mod operand;
mod tokens;
mod tracker;

pub use error::TranslateError;
pub use options::{TranslateFlags, TranslateOptions};
pub use translate::{translate_bytes, translate_tokens, TranslatedShader};
pub use types::{DeclUsage, SamplerDim, Semantic, ShaderStage, ShaderVersion};
