//! Caller-facing translation options.

use bitflags::bitflags;

bitflags! {
    /// Behavior toggles for one translation call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TranslateFlags: u32 {
        /// Size the float constant array at the profile maximum instead of
        /// the per-shader high-water mark (shared constant environment).
        const ENV_CONSTANTS = 1 << 0;
        /// Remap clip-space Z from [0, w] to [-w, w] in the vertex footer.
        const FIXUP_Z = 1 << 1;
        /// Flip clip-space Y in the vertex footer (render-to-texture).
        const FIXUP_Y = 1 << 2;
        /// Route the position through the `o_pos` workspace and assign
        /// `gl_ClipVertex` so fixed-function clip planes keep working.
        const USER_CLIP_PLANES = 1 << 3;
        /// Annotate every instruction with its raw token words.
        const HEX_COMMENTS = 1 << 4;
        /// Place the hex annotation after the generated line instead of on
        /// its own line before it. Only meaningful with `HEX_COMMENTS`.
        const HEX_COMMENTS_AFTER = 1 << 5;
        /// Append the `flSRGBWrite`-gated gamma suffix to pixel shaders.
        const SRGB_WRITE_SUFFIX = 1 << 6;
        /// Split vertex float constants at the bone range base into a
        /// separate `vcbones` array.
        const BONE_UNIFORMS = 1 << 7;
        /// Sample through `GL_ARB_bindless_texture` handle uniforms.
        const BINDLESS_TEXTURES = 1 << 8;
    }
}

/// Options for a single translation. `Default` turns everything off.
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    pub flags: TranslateFlags,
    /// Bit n marks sampler n as a depth-compare (shadow) sampler.
    pub shadow_samplers: u32,
    /// Bit n requests centroid interpolation for the `oT{n}` varying.
    pub centroid_samplers: u32,
    /// Free-form label echoed into the header comment.
    pub debug_label: Option<String>,
    /// Diagnostic serial echoed into the header comment.
    pub serial: u64,
}
