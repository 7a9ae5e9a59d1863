use dx9gl::{translate_tokens, ShaderStage, TranslateFlags, TranslateOptions};

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

#[test]
fn comparison_branches_open_and_close_blocks() {
    // ps_2_0:
    //   def c0, 1.0, 2.0, 3.0, 4.0
    //   def c1, 5.0, 6.0, 7.0, 8.0
    //   if_gt c0.x, c1.x
    //     mov r0, c0
    //   else
    //     mov r0, c1
    //   endif
    //   mov oC0, r0
    //   end
    let tokens = vec![
        version_token(ShaderStage::Pixel, 2, 0),
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
        opcode_token(41, 2) | (1 << 16),
        src_token(2, 0, 0xE4, 0),
        src_token(2, 1, 0xE4, 0),
        opcode_token(1, 2),
        dst_token(0, 0, 0xF),
        src_token(2, 0, 0xE4, 0),
        opcode_token(42, 0),
        opcode_token(1, 2),
        dst_token(0, 0, 0xF),
        src_token(2, 1, 0xE4, 0),
        opcode_token(43, 0),
        opcode_token(1, 2),
        dst_token(8, 0, 0xF),
        src_token(0, 0, 0xE4, 0),
        END,
    ];

    let shader = translate_tokens(&tokens, &TranslateOptions::default()).unwrap();
    let body = concat!(
        "void main() {\n",
        "  if (c0.x > c1.x) {\n",
        "    r0 = c0;\n",
        "  } else {\n",
        "    r0 = c1;\n",
        "  }\n",
        "  gl_FragData[0] = r0;\n",
        "}\n",
    );
    assert!(shader.glsl.contains(body), "{}", shader.glsl);
}

#[test]
fn boolean_conditions_read_the_constant_file() {
    // ps_2_0:
    //   defb b0, true
    //   if b0
    //     mov r0, c0
    //   endif
    //   if !b0
    //     mov r0, c1
    //   endif
    //   if b1          (never defined, so it becomes a uniform)
    //     mov r0, c0
    //   endif
    //   mov oC0, r0
    //   end
    let tokens = vec![
        version_token(ShaderStage::Pixel, 2, 0),
        opcode_token(83, 2),
        dst_token(14, 0, 0xF),
        1,
        opcode_token(40, 1),
        src_token(14, 0, 0xE4, 0),
        opcode_token(1, 2),
        dst_token(0, 0, 0xF),
        src_token(2, 0, 0xE4, 0),
        opcode_token(43, 0),
        opcode_token(40, 1),
        src_token(14, 0, 0xE4, 13),
        opcode_token(1, 2),
        dst_token(0, 0, 0xF),
        src_token(2, 1, 0xE4, 0),
        opcode_token(43, 0),
        opcode_token(40, 1),
        src_token(14, 1, 0xE4, 0),
        opcode_token(1, 2),
        dst_token(0, 0, 0xF),
        src_token(2, 0, 0xE4, 0),
        opcode_token(43, 0),
        opcode_token(1, 2),
        dst_token(8, 0, 0xF),
        src_token(0, 0, 0xE4, 0),
        END,
    ];

    let shader = translate_tokens(&tokens, &TranslateOptions::default()).unwrap();
    assert!(shader.glsl.contains("const bool b0 = true;\n"), "{}", shader.glsl);
    assert!(shader.glsl.contains("uniform bool b1;\n"), "{}", shader.glsl);
    assert!(shader.glsl.contains("  if (b0) {\n"), "{}", shader.glsl);
    assert!(shader.glsl.contains("  if (!b0) {\n"), "{}", shader.glsl);
    assert!(shader.glsl.contains("  if (b1) {\n"), "{}", shader.glsl);
}

#[test]
fn repeat_blocks_lower_to_for_loops() {
    // ps_2_0:
    //   defi i0, 4, 0, 0, 0
    //   defi i1, -2, 0, 0, 0
    //   def c0, 1.0, 2.0, 3.0, 4.0
    //   def c1, 5.0, 6.0, 7.0, 8.0
    //   rep i0
    //     breakc_ge c0.x, c1.x
    //     mov r0, c0
    //   endrep
    //   mov oC0, r0
    //   end
    let tokens = vec![
        version_token(ShaderStage::Pixel, 2, 0),
        opcode_token(82, 5),
        dst_token(7, 0, 0xF),
        4,
        0,
        0,
        0,
        opcode_token(82, 5),
        dst_token(7, 1, 0xF),
        0xFFFF_FFFE,
        0,
        0,
        0,
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
        opcode_token(38, 1),
        src_token(7, 0, 0xE4, 0),
        opcode_token(45, 2) | (3 << 16),
        src_token(2, 0, 0xE4, 0),
        src_token(2, 1, 0xE4, 0),
        opcode_token(1, 2),
        dst_token(0, 0, 0xF),
        src_token(2, 0, 0xE4, 0),
        opcode_token(39, 0),
        opcode_token(1, 2),
        dst_token(8, 0, 0xF),
        src_token(0, 0, 0xE4, 0),
        END,
    ];

    let shader = translate_tokens(&tokens, &TranslateOptions::default()).unwrap();
    assert!(
        shader.glsl.contains("const ivec4 i0 = ivec4(4, 0, 0, 0);\n"),
        "{}",
        shader.glsl
    );
    assert!(
        shader.glsl.contains("const ivec4 i1 = ivec4(-2, 0, 0, 0);\n"),
        "{}",
        shader.glsl
    );
    let body = concat!(
        "  for (int rep0 = 0; rep0 < i0.x; ++rep0) {\n",
        "    if (c0.x >= c1.x) break;\n",
        "    r0 = c0;\n",
        "  }\n",
    );
    assert!(shader.glsl.contains(body), "{}", shader.glsl);
}

#[test]
fn undefined_loop_counters_become_uniforms() {
    // ps_2_0:
    //   rep i0
    //   endrep
    //   mov oC0, c0
    //   end
    let tokens = vec![
        version_token(ShaderStage::Pixel, 2, 0),
        opcode_token(38, 1),
        src_token(7, 0, 0xE4, 0),
        opcode_token(39, 0),
        opcode_token(1, 2),
        dst_token(8, 0, 0xF),
        src_token(2, 0, 0xE4, 0),
        END,
    ];

    let shader = translate_tokens(&tokens, &TranslateOptions::default()).unwrap();
    assert!(shader.glsl.contains("uniform ivec4 i0;\n"), "{}", shader.glsl);
    assert!(
        shader
            .glsl
            .contains("  for (int rep0 = 0; rep0 < i0.x; ++rep0) {\n"),
        "{}",
        shader.glsl
    );
}

#[test]
fn nested_rep_has_no_strategy() {
    let tokens = vec![
        version_token(ShaderStage::Pixel, 2, 0),
        opcode_token(38, 1),
        src_token(7, 0, 0xE4, 0),
        opcode_token(38, 1),
        src_token(7, 0, 0xE4, 0),
        opcode_token(39, 0),
        opcode_token(39, 0),
        END,
    ];

    let err = translate_tokens(&tokens, &TranslateOptions::default()).unwrap_err();
    assert!(err.to_string().contains("nested rep blocks"), "{err}");
    assert!(err.to_string().contains("`rep`"), "{err}");
}

#[test]
fn dangling_control_flow_is_fatal() {
    let cases: Vec<(Vec<u32>, &str)> = vec![
        (
            vec![
                version_token(ShaderStage::Pixel, 2, 0),
                opcode_token(42, 0),
                END,
            ],
            "else: no open if block",
        ),
        (
            vec![
                version_token(ShaderStage::Pixel, 2, 0),
                opcode_token(43, 0),
                END,
            ],
            "endif: no open if block",
        ),
        (
            vec![
                version_token(ShaderStage::Pixel, 2, 0),
                opcode_token(39, 0),
                END,
            ],
            "endrep: no open rep block",
        ),
        (
            vec![
                version_token(ShaderStage::Pixel, 2, 0),
                opcode_token(45, 2) | (3 << 16),
                src_token(2, 0, 0xE4, 0),
                src_token(2, 1, 0xE4, 0),
                END,
            ],
            "breakc: no enclosing rep block",
        ),
        (
            // if without endif runs into the end token.
            vec![
                version_token(ShaderStage::Pixel, 2, 0),
                opcode_token(41, 2) | (1 << 16),
                src_token(2, 0, 0xE4, 0),
                src_token(2, 1, 0xE4, 0),
                END,
            ],
            "unterminated control flow block",
        ),
    ];

    for (tokens, expected) in cases {
        let err = translate_tokens(&tokens, &TranslateOptions::default()).unwrap_err();
        assert!(err.to_string().contains(expected), "{err}");
    }
}

#[test]
fn blocks_nest_with_indentation() {
    // ps_2_0:
    //   defi i0, 4, 0, 0, 0
    //   def c0, 1.0, 2.0, 3.0, 4.0
    //   def c1, 5.0, 6.0, 7.0, 8.0
    //   rep i0
    //     if_lt c0.x, c1.x
    //       mov r0, c0
    //     endif
    //     breakc_ge c0.x, c1.x
    //   endrep
    //   mov oC0, r0
    //   end
    let tokens = vec![
        version_token(ShaderStage::Pixel, 2, 0),
        opcode_token(82, 5),
        dst_token(7, 0, 0xF),
        4,
        0,
        0,
        0,
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
        opcode_token(38, 1),
        src_token(7, 0, 0xE4, 0),
        opcode_token(41, 2) | (4 << 16),
        src_token(2, 0, 0xE4, 0),
        src_token(2, 1, 0xE4, 0),
        opcode_token(1, 2),
        dst_token(0, 0, 0xF),
        src_token(2, 0, 0xE4, 0),
        opcode_token(43, 0),
        opcode_token(45, 2) | (3 << 16),
        src_token(2, 0, 0xE4, 0),
        src_token(2, 1, 0xE4, 0),
        opcode_token(39, 0),
        opcode_token(1, 2),
        dst_token(8, 0, 0xF),
        src_token(0, 0, 0xE4, 0),
        END,
    ];

    let shader = translate_tokens(&tokens, &TranslateOptions::default()).unwrap();
    let body = concat!(
        "  for (int rep0 = 0; rep0 < i0.x; ++rep0) {\n",
        "    if (c0.x < c1.x) {\n",
        "      r0 = c0;\n",
        "    }\n",
        "    if (c0.x >= c1.x) break;\n",
        "  }\n",
    );
    assert!(shader.glsl.contains(body), "{}", shader.glsl);
}

#[test]
fn texkill_deduplicates_swizzled_components() {
    // ps_2_0 with dcl t0; the kill condition repeats .x through the swizzle.
    let swizzled = vec![
        version_token(ShaderStage::Pixel, 2, 0),
        opcode_token(31, 2),
        dcl_usage_token(0, 0),
        dst_token(3, 0, 0xF),
        opcode_token(65, 1),
        src_token(3, 0, 0x04, 0),
        END,
    ];
    let shader = translate_tokens(&swizzled, &TranslateOptions::default()).unwrap();
    assert!(
        shader
            .glsl
            .contains("  if (oT0.x < 0.0 || oT0.y < 0.0) discard;\n"),
        "{}",
        shader.glsl
    );

    let replicated = vec![
        version_token(ShaderStage::Pixel, 2, 0),
        opcode_token(31, 2),
        dcl_usage_token(0, 0),
        dst_token(3, 0, 0xF),
        opcode_token(65, 1),
        src_token(3, 0, 0x00, 0),
        END,
    ];
    let shader = translate_tokens(&replicated, &TranslateOptions::default()).unwrap();
    assert!(
        shader.glsl.contains("  if (oT0.x < 0.0) discard;\n"),
        "{}",
        shader.glsl
    );

    let vertex = vec![
        version_token(ShaderStage::Vertex, 2, 0),
        opcode_token(65, 1),
        src_token(3, 0, 0xE4, 0),
        END,
    ];
    let err = translate_tokens(&vertex, &TranslateOptions::default()).unwrap_err();
    assert!(
        err.to_string()
            .contains("texkill: not valid in a vertex shader"),
        "{err}"
    );
}

#[test]
fn predicated_instructions_have_no_strategy() {
    let tokens = vec![
        version_token(ShaderStage::Pixel, 2, 0),
        opcode_token(1, 2) | (1 << 28),
        dst_token(0, 0, 0xF),
        src_token(2, 0, 0xE4, 0),
        END,
    ];

    let err = translate_tokens(&tokens, &TranslateOptions::default()).unwrap_err();
    assert!(err.to_string().contains("predicated instruction"), "{err}");
    assert!(err.to_string().contains("`mov`"), "{err}");
}

#[test]
fn hex_comments_annotate_each_instruction() {
    // ps_2_0:
    //   dcl v0
    //   mov r0, v0
    //   mov oC0, r0
    //   end
    let tokens = vec![
        version_token(ShaderStage::Pixel, 2, 0),
        opcode_token(31, 2),      // 0x0200001f
        dcl_usage_token(10, 0),   // 0x8000000a
        dst_token(1, 0, 0xF),     // 0x900f0000
        opcode_token(1, 2),       // 0x02000001
        dst_token(0, 0, 0xF),     // 0x800f0000
        src_token(1, 0, 0xE4, 0), // 0x90e40000
        opcode_token(1, 2),       // 0x02000001
        dst_token(8, 0, 0xF),     // 0x800f0800
        src_token(0, 0, 0xE4, 0), // 0x80e40000
        END,
    ];

    let mut options = TranslateOptions::default();
    options.flags = TranslateFlags::HEX_COMMENTS;
    let shader = translate_tokens(&tokens, &options).unwrap();
    assert!(
        shader
            .glsl
            .contains("  // 0x0200001f 0x8000000a 0x900f0000\n"),
        "{}",
        shader.glsl
    );
    let annotated = concat!(
        "  // 0x02000001 0x800f0000 0x90e40000\n",
        "  r0 = oD0;\n",
        "  // 0x02000001 0x800f0800 0x80e40000\n",
        "  gl_FragData[0] = r0;\n",
    );
    assert!(shader.glsl.contains(annotated), "{}", shader.glsl);

    // Trailing placement annotates only instructions that emitted code, so
    // the dcl leaves no trace.
    options.flags = TranslateFlags::HEX_COMMENTS | TranslateFlags::HEX_COMMENTS_AFTER;
    let shader = translate_tokens(&tokens, &options).unwrap();
    assert!(
        shader
            .glsl
            .contains("  r0 = oD0; // 0x02000001 0x800f0000 0x90e40000\n"),
        "{}",
        shader.glsl
    );
    assert!(!shader.glsl.contains("0x0200001f"), "{}", shader.glsl);
}
