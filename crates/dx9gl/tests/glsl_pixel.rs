use dx9gl::{translate_tokens, SamplerDim, ShaderStage, TranslateFlags, TranslateOptions};

const END: u32 = 0x0000_FFFF;

fn version_token(stage: ShaderStage, major: u8, minor: u8) -> u32 {
    let prefix = match stage {
        ShaderStage::Vertex => 0xFFFE_0000,
        ShaderStage::Pixel => 0xFFFF_0000,
    };
    prefix | ((major as u32) << 8) | (minor as u32)
}

fn opcode_token(op: u16, operand_count: u8) -> u32 {
    // Bits 24..27 carry the operand token count.
    (op as u32) | ((operand_count as u32) << 24)
}

fn reg_token(regtype: u8, index: u32) -> u32 {
    let low3 = (regtype as u32) & 0x7;
    let high2 = (regtype as u32) & 0x18;
    0x8000_0000 | (low3 << 28) | (high2 << 8) | (index & 0x7FF)
}

fn dst_token(regtype: u8, index: u32, mask: u8) -> u32 {
    reg_token(regtype, index) | ((mask as u32) << 16)
}

fn src_token(regtype: u8, index: u32, swizzle: u8, srcmod: u8) -> u32 {
    reg_token(regtype, index) | ((swizzle as u32) << 16) | ((srcmod as u32) << 24)
}

fn dcl_usage_token(usage: u8, usage_index: u8) -> u32 {
    0x8000_0000 | (usage as u32) | ((usage_index as u32) << 16)
}

fn dcl_sampler_token(dim: u8) -> u32 {
    0x8000_0000 | ((dim as u32) << 27)
}

#[test]
fn sampler_dimensions_choose_the_call() {
    // ps_2_0:
    //   dcl t0
    //   dcl_2d s0
    //   dcl_volume s1
    //   dcl_cube s2
    //   texld r0, t0, s0
    //   texldp r1, t0, s0
    //   texld r2, t0, s1
    //   texldp r3, t0, s1
    //   texld r4, t0, s2
    //   texld r5.xyz, t0, s0
    //   mov oC0, r0
    //   end
    let tokens = vec![
        version_token(ShaderStage::Pixel, 2, 0),
        opcode_token(31, 2),
        dcl_usage_token(0, 0),
        dst_token(3, 0, 0xF),
        opcode_token(31, 2),
        dcl_sampler_token(2),
        dst_token(10, 0, 0xF),
        opcode_token(31, 2),
        dcl_sampler_token(4),
        dst_token(10, 1, 0xF),
        opcode_token(31, 2),
        dcl_sampler_token(3),
        dst_token(10, 2, 0xF),
        opcode_token(66, 3),
        dst_token(0, 0, 0xF),
        src_token(3, 0, 0xE4, 0),
        src_token(10, 0, 0xE4, 0),
        opcode_token(66, 3) | (1 << 16),
        dst_token(0, 1, 0xF),
        src_token(3, 0, 0xE4, 0),
        src_token(10, 0, 0xE4, 0),
        opcode_token(66, 3),
        dst_token(0, 2, 0xF),
        src_token(3, 0, 0xE4, 0),
        src_token(10, 1, 0xE4, 0),
        opcode_token(66, 3) | (1 << 16),
        dst_token(0, 3, 0xF),
        src_token(3, 0, 0xE4, 0),
        src_token(10, 1, 0xE4, 0),
        opcode_token(66, 3),
        dst_token(0, 4, 0xF),
        src_token(3, 0, 0xE4, 0),
        src_token(10, 2, 0xE4, 0),
        opcode_token(66, 3),
        dst_token(0, 5, 0x7),
        src_token(3, 0, 0xE4, 0),
        src_token(10, 0, 0xE4, 0),
        opcode_token(1, 2),
        dst_token(8, 0, 0xF),
        src_token(0, 0, 0xE4, 0),
        END,
    ];

    let shader = translate_tokens(&tokens, &TranslateOptions::default()).unwrap();
    assert!(
        shader
            .glsl
            .contains("// ps_2_0 trans#0\n// samplers used: 0x0007 shadow: 0x0000\n"),
        "{}",
        shader.glsl
    );
    assert!(
        shader.glsl.contains(concat!(
            "uniform sampler2D sampler0;\n",
            "uniform sampler3D sampler1;\n",
            "uniform samplerCube sampler2;\n",
        )),
        "{}",
        shader.glsl
    );
    assert!(shader.glsl.contains("varying vec4 oT0;\n"), "{}", shader.glsl);
    let body = concat!(
        "  r0 = texture2D(sampler0, oT0.xy);\n",
        "  r1 = texture2DProj(sampler0, oT0);\n",
        "  r2 = texture3D(sampler1, oT0.xyz);\n",
        "  r3 = texture3DProj(sampler1, oT0);\n",
        "  r4 = textureCube(sampler2, oT0.xyz);\n",
        "  r5.xyz = texture2D(sampler0, oT0.xy).xyz;\n",
        "  gl_FragData[0] = r0;\n",
    );
    assert!(shader.glsl.contains(body), "{}", shader.glsl);
    assert_eq!(shader.samplers_used, 0x7);
    assert_eq!(shader.shadow_samplers, 0);
    assert_eq!(shader.sampler_dims[0], Some(SamplerDim::TwoD));
    assert_eq!(shader.sampler_dims[1], Some(SamplerDim::Volume));
    assert_eq!(shader.sampler_dims[2], Some(SamplerDim::Cube));
    assert_eq!(shader.sampler_dims[3], None);
}

#[test]
fn shadow_samplers_rewrite_the_sampler_type() {
    // ps_2_0:
    //   dcl t0
    //   dcl_2d s0
    //   texld r0, t0, s0
    //   texldp r1, t0, s0
    //   mov oC0, r0
    //   end
    let tokens = vec![
        version_token(ShaderStage::Pixel, 2, 0),
        opcode_token(31, 2),
        dcl_usage_token(0, 0),
        dst_token(3, 0, 0xF),
        opcode_token(31, 2),
        dcl_sampler_token(2),
        dst_token(10, 0, 0xF),
        opcode_token(66, 3),
        dst_token(0, 0, 0xF),
        src_token(3, 0, 0xE4, 0),
        src_token(10, 0, 0xE4, 0),
        opcode_token(66, 3) | (1 << 16),
        dst_token(0, 1, 0xF),
        src_token(3, 0, 0xE4, 0),
        src_token(10, 0, 0xE4, 0),
        opcode_token(1, 2),
        dst_token(8, 0, 0xF),
        src_token(0, 0, 0xE4, 0),
        END,
    ];

    let mut options = TranslateOptions::default();
    options.shadow_samplers = 0x1;
    let shader = translate_tokens(&tokens, &options).unwrap();
    assert!(
        shader.glsl.contains("uniform sampler2DShadow sampler0;\n"),
        "{}",
        shader.glsl
    );
    let body = concat!(
        "  r0 = shadow2D(sampler0, oT0.xyz);\n",
        "  r1 = shadow2DProj(sampler0, oT0);\n",
    );
    assert!(shader.glsl.contains(body), "{}", shader.glsl);
    assert!(
        shader
            .glsl
            .contains("// samplers used: 0x0001 shadow: 0x0001\n"),
        "{}",
        shader.glsl
    );
    assert_eq!(shader.shadow_samplers, 0x1);
}

#[test]
fn sm3_inputs_resolve_by_semantic() {
    // ps_3_0:
    //   dcl_texcoord3 v0
    //   dcl_color1 v1
    //   dcl_2d s0
    //   texld r0, v0, s0
    //   add r0, r0, v1
    //   mov oC0, r0
    //   end
    let tokens = vec![
        version_token(ShaderStage::Pixel, 3, 0),
        opcode_token(31, 2),
        dcl_usage_token(5, 3),
        dst_token(1, 0, 0xF),
        opcode_token(31, 2),
        dcl_usage_token(10, 1),
        dst_token(1, 1, 0xF),
        opcode_token(31, 2),
        dcl_sampler_token(2),
        dst_token(10, 0, 0xF),
        opcode_token(66, 3),
        dst_token(0, 0, 0xF),
        src_token(1, 0, 0xE4, 0),
        src_token(10, 0, 0xE4, 0),
        opcode_token(2, 3),
        dst_token(0, 0, 0xF),
        src_token(0, 0, 0xE4, 0),
        src_token(1, 1, 0xE4, 0),
        opcode_token(1, 2),
        dst_token(8, 0, 0xF),
        src_token(0, 0, 0xE4, 0),
        END,
    ];

    let shader = translate_tokens(&tokens, &TranslateOptions::default()).unwrap();
    assert!(
        shader.glsl.contains("varying vec4 oD1;\nvarying vec4 oT3;\n"),
        "{}",
        shader.glsl
    );
    assert!(
        shader.glsl.contains("  r0 = texture2D(sampler0, oT3.xy);\n"),
        "{}",
        shader.glsl
    );
    assert!(shader.glsl.contains("  r0 = r0 + oD1;\n"), "{}", shader.glsl);
}

#[test]
fn centroid_interpolation_marks_the_varying() {
    // ps_3_0:
    //   dcl_texcoord3 v0
    //   dcl_2d s0
    //   texld r0, v0, s0
    //   mov oC0, r0
    //   end
    let tokens = vec![
        version_token(ShaderStage::Pixel, 3, 0),
        opcode_token(31, 2),
        dcl_usage_token(5, 3),
        dst_token(1, 0, 0xF),
        opcode_token(31, 2),
        dcl_sampler_token(2),
        dst_token(10, 0, 0xF),
        opcode_token(66, 3),
        dst_token(0, 0, 0xF),
        src_token(1, 0, 0xE4, 0),
        src_token(10, 0, 0xE4, 0),
        opcode_token(1, 2),
        dst_token(8, 0, 0xF),
        src_token(0, 0, 0xE4, 0),
        END,
    ];

    let mut options = TranslateOptions::default();
    options.centroid_samplers = 1 << 3;
    let shader = translate_tokens(&tokens, &options).unwrap();
    assert!(
        shader.glsl.contains("centroid varying vec4 oT3;\n"),
        "{}",
        shader.glsl
    );
}

#[test]
fn explicit_lod_needs_an_extension_in_pixel_shaders() {
    // ps_3_0:
    //   dcl_texcoord0 v0
    //   dcl_2d s0
    //   dcl_cube s1
    //   texldl r0, v0, s0
    //   texldl r1, v0, s1
    //   mov oC0, r0
    //   end
    let tokens = vec![
        version_token(ShaderStage::Pixel, 3, 0),
        opcode_token(31, 2),
        dcl_usage_token(5, 0),
        dst_token(1, 0, 0xF),
        opcode_token(31, 2),
        dcl_sampler_token(2),
        dst_token(10, 0, 0xF),
        opcode_token(31, 2),
        dcl_sampler_token(3),
        dst_token(10, 1, 0xF),
        opcode_token(95, 3),
        dst_token(0, 0, 0xF),
        src_token(1, 0, 0xE4, 0),
        src_token(10, 0, 0xE4, 0),
        opcode_token(95, 3),
        dst_token(0, 1, 0xF),
        src_token(1, 0, 0xE4, 0),
        src_token(10, 1, 0xE4, 0),
        opcode_token(1, 2),
        dst_token(8, 0, 0xF),
        src_token(0, 0, 0xE4, 0),
        END,
    ];

    let shader = translate_tokens(&tokens, &TranslateOptions::default()).unwrap();
    assert!(
        shader.glsl.starts_with(concat!(
            "#version 120\n",
            "#extension GL_ARB_shader_texture_lod : require\n",
            "// ps_3_0 trans#0\n",
        )),
        "{}",
        shader.glsl
    );
    let body = concat!(
        "  r0 = texture2DLod(sampler0, oT0.xy, oT0.w);\n",
        "  r1 = textureCubeLod(sampler1, oT0.xyz, oT0.w);\n",
    );
    assert!(shader.glsl.contains(body), "{}", shader.glsl);
}

#[test]
fn vertex_texture_fetch_skips_the_extension() {
    // vs_3_0:
    //   dcl_position v0
    //   dcl_position o0
    //   dcl_2d s0
    //   texldl r0, v0, s0
    //   mov o0, r0
    //   end
    let tokens = vec![
        version_token(ShaderStage::Vertex, 3, 0),
        opcode_token(31, 2),
        dcl_usage_token(0, 0),
        dst_token(1, 0, 0xF),
        opcode_token(31, 2),
        dcl_usage_token(0, 0),
        dst_token(6, 0, 0xF),
        opcode_token(31, 2),
        dcl_sampler_token(2),
        dst_token(10, 0, 0xF),
        opcode_token(95, 3),
        dst_token(0, 0, 0xF),
        src_token(1, 0, 0xE4, 0),
        src_token(10, 0, 0xE4, 0),
        opcode_token(1, 2),
        dst_token(6, 0, 0xF),
        src_token(0, 0, 0xE4, 0),
        END,
    ];

    let shader = translate_tokens(&tokens, &TranslateOptions::default()).unwrap();
    assert!(
        shader
            .glsl
            .contains("  r0 = texture2DLod(sampler0, v0.xy, v0.w);\n"),
        "{}",
        shader.glsl
    );
    assert!(!shader.glsl.contains("#extension"), "{}", shader.glsl);
}

#[test]
fn bindless_handles_construct_samplers_inline() {
    // ps_2_0:
    //   dcl t0
    //   dcl_2d s0
    //   texld r0, t0, s0
    //   mov oC0, r0
    //   end
    let tokens = vec![
        version_token(ShaderStage::Pixel, 2, 0),
        opcode_token(31, 2),
        dcl_usage_token(0, 0),
        dst_token(3, 0, 0xF),
        opcode_token(31, 2),
        dcl_sampler_token(2),
        dst_token(10, 0, 0xF),
        opcode_token(66, 3),
        dst_token(0, 0, 0xF),
        src_token(3, 0, 0xE4, 0),
        src_token(10, 0, 0xE4, 0),
        opcode_token(1, 2),
        dst_token(8, 0, 0xF),
        src_token(0, 0, 0xE4, 0),
        END,
    ];

    let mut options = TranslateOptions::default();
    options.flags = TranslateFlags::BINDLESS_TEXTURES;
    let shader = translate_tokens(&tokens, &options).unwrap();
    assert!(
        shader
            .glsl
            .contains("#extension GL_ARB_bindless_texture : require\n"),
        "{}",
        shader.glsl
    );
    assert!(
        shader.glsl.contains("uniform uvec2 sampler0_handle;\n"),
        "{}",
        shader.glsl
    );
    assert!(
        shader
            .glsl
            .contains("  r0 = texture2D(sampler2D(sampler0_handle), oT0.xy);\n"),
        "{}",
        shader.glsl
    );
}

#[test]
fn pixel_lerp_uses_mix() {
    // ps_2_0:
    //   dcl v0
    //   def c0, 0.0, 0.0, 0.0, 1.0
    //   lrp r0, v0, c0, c1
    //   mov oC0, r0
    //   end
    let tokens = vec![
        version_token(ShaderStage::Pixel, 2, 0),
        opcode_token(31, 2),
        dcl_usage_token(0, 0),
        dst_token(1, 0, 0xF),
        opcode_token(81, 5),
        dst_token(2, 0, 0xF),
        0x0000_0000,
        0x0000_0000,
        0x0000_0000,
        0x3F80_0000,
        opcode_token(18, 4),
        dst_token(0, 0, 0xF),
        src_token(1, 0, 0xE4, 0),
        src_token(2, 0, 0xE4, 0),
        src_token(2, 1, 0xE4, 0),
        opcode_token(1, 2),
        dst_token(8, 0, 0xF),
        src_token(0, 0, 0xE4, 0),
        END,
    ];

    let shader = translate_tokens(&tokens, &TranslateOptions::default()).unwrap();
    assert!(
        shader.glsl.contains("  r0 = mix(pc[1], c0, oD0);\n"),
        "{}",
        shader.glsl
    );
    assert!(shader.glsl.contains("uniform vec4 pc[2];\n"), "{}", shader.glsl);
    assert!(!shader.glsl.contains("lrp_tmp"), "{}", shader.glsl);
}

#[test]
fn cmp_selects_per_component() {
    // ps_2_0:
    //   dcl v0
    //   def c0, 1.0, 2.0, 3.0, 4.0
    //   def c1, 5.0, 6.0, 7.0, 8.0
    //   cmp r0.x, v0, c0, c1
    //   cmp r1.xz, v0, c0, c1
    //   mov oC0, r0
    //   end
    let tokens = vec![
        version_token(ShaderStage::Pixel, 2, 0),
        opcode_token(31, 2),
        dcl_usage_token(0, 0),
        dst_token(1, 0, 0xF),
        opcode_token(81, 5),
        dst_token(2, 0, 0xF),
        0x3F80_0000,
        0x4000_0000,
        0x4040_0000,
        0x4080_0000,
        opcode_token(81, 5),
        dst_token(2, 1, 0xF),
        0x40A0_0000,
        0x40C0_0000,
        0x40E0_0000,
        0x4100_0000,
        opcode_token(88, 4),
        dst_token(0, 0, 0x1),
        src_token(1, 0, 0xE4, 0),
        src_token(2, 0, 0xE4, 0),
        src_token(2, 1, 0xE4, 0),
        opcode_token(88, 4),
        dst_token(0, 1, 0x5),
        src_token(1, 0, 0xE4, 0),
        src_token(2, 0, 0xE4, 0),
        src_token(2, 1, 0xE4, 0),
        opcode_token(1, 2),
        dst_token(8, 0, 0xF),
        src_token(0, 0, 0xE4, 0),
        END,
    ];

    let shader = translate_tokens(&tokens, &TranslateOptions::default()).unwrap();
    assert!(
        shader
            .glsl
            .contains("  r0.x = (oD0.x < 0.0) ? c1.x : c0.x;\n"),
        "{}",
        shader.glsl
    );
    let vector = concat!(
        "  cmp_tmp.x = (oD0.x < 0.0) ? c1.x : c0.x;\n",
        "  cmp_tmp.z = (oD0.z < 0.0) ? c1.z : c0.z;\n",
        "  r1.xz = cmp_tmp.xz;\n",
    );
    assert!(shader.glsl.contains(vector), "{}", shader.glsl);
    assert!(shader.glsl.contains("vec4 cmp_tmp;\n"), "{}", shader.glsl);
}

#[test]
fn srgb_suffix_wraps_the_final_color() {
    // ps_2_0:
    //   dcl v0
    //   mov oC0, v0
    //   end
    let tokens = vec![
        version_token(ShaderStage::Pixel, 2, 0),
        opcode_token(31, 2),
        dcl_usage_token(0, 0),
        dst_token(1, 0, 0xF),
        opcode_token(1, 2),
        dst_token(8, 0, 0xF),
        src_token(1, 0, 0xE4, 0),
        END,
    ];

    let mut options = TranslateOptions::default();
    options.flags = TranslateFlags::SRGB_WRITE_SUFFIX;
    let shader = translate_tokens(&tokens, &options).unwrap();
    let footer = concat!(
        "  gl_FragData[0] = oD0;\n",
        "  if (flSRGBWrite != 0.0) {\n",
        "    gl_FragData[0].xyz = exp2(log2(max(gl_FragData[0].xyz, ",
        "vec3(0.0000152587890625, 0.0000152587890625, 0.0000152587890625))) ",
        "* 0.45454543829);\n",
        "  }\n",
        "}\n",
    );
    assert!(shader.glsl.contains(footer), "{}", shader.glsl);
    assert!(
        shader.glsl.contains("uniform float flSRGBWrite;\n"),
        "{}",
        shader.glsl
    );
}

#[test]
fn depth_output_is_scalar() {
    // ps_2_0:
    //   dcl t0
    //   mov oDepth, t0.y
    //   end
    let tokens = vec![
        version_token(ShaderStage::Pixel, 2, 0),
        opcode_token(31, 2),
        dcl_usage_token(0, 0),
        dst_token(3, 0, 0xF),
        opcode_token(1, 2),
        dst_token(9, 0, 0xF),
        src_token(3, 0, 0x55, 0),
        END,
    ];

    let shader = translate_tokens(&tokens, &TranslateOptions::default()).unwrap();
    assert!(
        shader.glsl.contains("  gl_FragDepth = oT0.y;\n"),
        "{}",
        shader.glsl
    );
}

#[test]
fn pixel_constant_file_sizing() {
    // ps_2_0:
    //   mov r0, c3
    //   mov oC0, r0
    //   end
    let ps2 = vec![
        version_token(ShaderStage::Pixel, 2, 0),
        opcode_token(1, 2),
        dst_token(0, 0, 0xF),
        src_token(2, 3, 0xE4, 0),
        opcode_token(1, 2),
        dst_token(8, 0, 0xF),
        src_token(0, 0, 0xE4, 0),
        END,
    ];

    let shader = translate_tokens(&ps2, &TranslateOptions::default()).unwrap();
    assert!(shader.glsl.contains("uniform vec4 pc[4];\n"), "{}", shader.glsl);
    assert_eq!(shader.float_constants, 4);

    let mut options = TranslateOptions::default();
    options.flags = TranslateFlags::ENV_CONSTANTS;
    let shader = translate_tokens(&ps2, &options).unwrap();
    assert!(shader.glsl.contains("uniform vec4 pc[32];\n"), "{}", shader.glsl);
    assert_eq!(shader.float_constants, 32);

    let mut ps3 = ps2.clone();
    ps3[0] = version_token(ShaderStage::Pixel, 3, 0);
    let shader = translate_tokens(&ps3, &options).unwrap();
    assert!(shader.glsl.contains("uniform vec4 pc[224];\n"), "{}", shader.glsl);
    assert_eq!(shader.float_constants, 224);
}

#[test]
fn texkill_discards_on_any_negative_component() {
    // ps_2_0:
    //   dcl t0
    //   texkill t0
    //   end
    let tokens = vec![
        version_token(ShaderStage::Pixel, 2, 0),
        opcode_token(31, 2),
        dcl_usage_token(0, 0),
        dst_token(3, 0, 0xF),
        opcode_token(65, 1),
        src_token(3, 0, 0xE4, 0),
        END,
    ];

    let shader = translate_tokens(&tokens, &TranslateOptions::default()).unwrap();
    assert!(
        shader
            .glsl
            .contains("  if (oT0.x < 0.0 || oT0.y < 0.0 || oT0.z < 0.0) discard;\n"),
        "{}",
        shader.glsl
    );
}
