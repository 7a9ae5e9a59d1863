#![no_main]

use dx9gl::{translate_bytes, TranslateFlags, TranslateOptions};
use libfuzzer_sys::fuzz_target;

/// Max fuzz input size. The translator rejects streams past 64Ki tokens, so
/// anything larger only wastes iterations on the length check.
const MAX_INPUT_SIZE_BYTES: usize = 512 * 1024; // 512 KiB

/// The forced-version variant copies the input every iteration; keep it small.
const MAX_FORCED_VERSION_BYTES: usize = 64 * 1024; // 64 KiB

fn options_from_seed(seed: &[u8]) -> TranslateOptions {
    let byte = |i: usize| seed.get(i).copied().unwrap_or(0);
    let bits = u32::from(byte(0)) | (u32::from(byte(1)) << 8);
    let mut options = TranslateOptions::default();
    options.flags = TranslateFlags::from_bits_truncate(bits);
    options.shadow_samplers = u32::from(byte(2));
    options.centroid_samplers = u32::from(byte(3));
    options
}

fn encode_regtype(raw: u8) -> u32 {
    let low = (raw & 0x7) as u32;
    let high = (raw & 0x18) as u32;
    (low << 28) | (high << 8)
}

fn dst_token(regtype: u8, index: u8, mask: u8) -> u32 {
    0x8000_0000 | encode_regtype(regtype) | (index as u32) | (((mask & 0xF) as u32) << 16)
}

fn src_token(regtype: u8, index: u8, swizzle: u8, modifier: u8) -> u32 {
    0x8000_0000
        | encode_regtype(regtype)
        | (index as u32)
        | ((swizzle as u32) << 16)
        | ((modifier as u32) << 24)
}

fn opcode_token(op: u16, operand_count: u32) -> u32 {
    (op as u32) | (operand_count << 24)
}

fn u32_from_seed(seed: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        *seed.get(offset).unwrap_or(&0),
        *seed.get(offset + 1).unwrap_or(&0),
        *seed.get(offset + 2).unwrap_or(&0),
        *seed.get(offset + 3).unwrap_or(&0),
    ])
}

/// Builds a small, mostly well-formed shader from the fuzz input so the
/// fuzzer reaches the emitters without having to guess the version token,
/// the mandatory declarations and the def prefixes from scratch.
fn build_patched_shader(seed: &[u8]) -> Vec<u8> {
    let byte = |i: usize| seed.get(i).copied().unwrap_or(0);

    let mode = byte(6) % 5;
    // The sampling mode needs a pixel shader; the relative mode needs vertex.
    let stage_is_pixel = match mode {
        2 => false,
        3 => true,
        _ => byte(0) & 1 != 0,
    };
    let major = 2u32 + (u32::from(byte(1)) & 1);
    let high = if stage_is_pixel { 0xFFFF_0000 } else { 0xFFFE_0000 };
    let version = high | (major << 8);

    let swz = byte(9);
    let src_mod = byte(10) % 2; // none or negate
    let dst_mask = byte(11) & 0xF;
    let mask = if dst_mask == 0 { 0xF } else { dst_mask };

    let (dst_regtype, dst_index) = if stage_is_pixel { (8u8, 0u8) } else { (4u8, 0u8) };
    let dst = dst_token(dst_regtype, dst_index, mask);

    let c0 = byte(3) % 8;
    let c1 = byte(4) % 8;
    let src0 = src_token(2, c0, swz, src_mod);
    let src1 = src_token(2, c1, swz, src_mod);

    let mut tokens: Vec<u32> = Vec::with_capacity(24);
    tokens.push(version);

    if byte(5) & 1 != 0 {
        tokens.push(opcode_token(81, 5));
        tokens.push(dst_token(2, c0, 0xF));
        tokens.push(u32_from_seed(seed, 12));
        tokens.push(u32_from_seed(seed, 16));
        tokens.push(u32_from_seed(seed, 20));
        tokens.push(u32_from_seed(seed, 24));
    }

    match mode {
        // Straight-line arithmetic.
        0 => match byte(2) % 3 {
            0 => tokens.extend([opcode_token(1, 2), dst, src0]),
            1 => tokens.extend([opcode_token(2, 3), dst, src0, src1]),
            _ => tokens.extend([opcode_token(88, 4), dst, src0, src0, src1]),
        },

        // Comparison branch with an else arm.
        1 => {
            let compare = u32::from(byte(2) % 6) + 1;
            tokens.extend([opcode_token(41, 2) | (compare << 16), src0, src1]);
            tokens.extend([opcode_token(1, 2), dst, src0]);
            tokens.push(opcode_token(42, 0));
            tokens.extend([opcode_token(2, 3), dst, src0, src1]);
            tokens.push(opcode_token(43, 0));
        }

        // Address register plus relative constant read (vertex only).
        2 => {
            tokens.extend([opcode_token(31, 2), 0x8000_0000, dst_token(1, 0, 0xF)]);
            tokens.extend([opcode_token(46, 2), dst_token(3, 0, 0x1), src_token(1, 0, 0x00, 0)]);
            tokens.extend([
                opcode_token(1, 3),
                dst,
                src_token(2, c1, swz, src_mod) | (1 << 13),
                src_token(3, 0, byte(12) & 0x3, 0),
            ]);
        }

        // Texture sampling through a declared sampler (pixel only).
        3 => {
            let dim = 2 + byte(12) % 3; // 2d, cube, volume
            tokens.extend([
                opcode_token(31, 2),
                0x8000_0000,
                dst_token(3, 0, 0xF),
            ]);
            tokens.extend([
                opcode_token(31, 2),
                0x8000_0000 | (u32::from(dim) << 27),
                dst_token(10, 0, 0xF),
            ]);
            let project = if byte(13) & 1 != 0 { 1u32 << 16 } else { 0 };
            let op = if byte(2) & 1 != 0 && major == 3 { 95 } else { 66 };
            tokens.extend([
                opcode_token(op, 3) | project,
                dst_token(0, 0, mask),
                src_token(3, 0, swz, 0),
                src_token(10, 0, 0xE4, 0),
            ]);
            tokens.extend([opcode_token(1, 2), dst, src_token(0, 0, 0xE4, 0)]);
        }

        // Transcendental and polynomial paths.
        _ => match byte(2) % 3 {
            0 => tokens.extend([opcode_token(37, 2), dst_token(0, 0, 0x3), src_token(2, c0, 0x00, 0)]),
            1 => tokens.extend([opcode_token(32, 3), dst, src0, src1]),
            _ => tokens.extend([opcode_token(7, 2), dst, src_token(2, c0, 0x55, 0)]),
        },
    }

    tokens.push(0x0000_FFFF);

    let mut out = Vec::with_capacity(tokens.len() * 4);
    for t in tokens {
        out.extend_from_slice(&t.to_le_bytes());
    }
    out
}

fuzz_target!(|data: &[u8]| {
    if data.len() > MAX_INPUT_SIZE_BYTES {
        return;
    }
    let options = options_from_seed(data);

    // A seeded, mostly well-formed stream reaches the emitters every run.
    let patched = build_patched_shader(data);
    let _ = translate_bytes(&patched, &options);

    // The raw input is hostile bytecode; all errors are fine, panics are not.
    // Skip the full tokenization when the first token cannot be a version
    // token anyway.
    if data.len() < 4 || data.len() % 4 != 0 {
        let _ = translate_bytes(data, &options);
    } else {
        let first = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        if first & 0xFFFE_0000 == 0xFFFE_0000 {
            let _ = translate_bytes(data, &options);
        }
    }

    // Forced-version variant so deeper instruction decoding does not depend
    // on the fuzzer guessing the magic prefix.
    let forced_len = data.len().min(MAX_FORCED_VERSION_BYTES) & !3;
    if forced_len < 4 {
        return;
    }
    let mut forced = data[..forced_len].to_vec();
    let stage = if forced[0] & 1 != 0 { 0xFFFF_0000u32 } else { 0xFFFE_0000 };
    let major = 2u32 + (u32::from(forced[1]) & 1);
    forced[..4].copy_from_slice(&(stage | (major << 8)).to_le_bytes());
    let _ = translate_bytes(&forced, &options);
});
