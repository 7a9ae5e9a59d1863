//! Instruction dispatch: resolves each opcode token, renders the GLSL
//! statement(s) for it, and validates that the operands consumed match the
//! length encoded in the token.

use crate::assemble::SectionAssembler;
use crate::error::{self, TranslateError};
use crate::float::format_f32;
use crate::limits;
use crate::operand::{self, DstOperand, SrcOperand};
use crate::options::TranslateFlags;
use crate::swizzle::{self, LETTERS};
use crate::tokens::{self, TokenReader};
use crate::translate::Translation;
use crate::types::{
    CompareOp, DeclUsage, OperandRole, RegisterFile, SamplerDim, Semantic, ShaderStage,
};

/// Open structured control-flow scopes, innermost last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Frame {
    If,
    Else,
    Rep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opcode {
    Nop,
    Mov,
    Add,
    Sub,
    Mad,
    Mul,
    Rcp,
    Rsq,
    Dp3,
    Dp4,
    Min,
    Max,
    Slt,
    Sge,
    Exp,
    Log,
    Dst,
    Lrp,
    Frc,
    Dcl,
    Pow,
    Crs,
    Abs,
    Sincos,
    Rep,
    EndRep,
    If,
    Ifc,
    Else,
    EndIf,
    BreakC,
    Mova,
    TexKill,
    TexLd,
    Def,
    DefI,
    DefB,
    Cmp,
    Dp2Add,
    TexLdl,
}

impl Opcode {
    fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Nop,
            1 => Self::Mov,
            2 => Self::Add,
            3 => Self::Sub,
            4 => Self::Mad,
            5 => Self::Mul,
            6 => Self::Rcp,
            7 => Self::Rsq,
            8 => Self::Dp3,
            9 => Self::Dp4,
            10 => Self::Min,
            11 => Self::Max,
            12 => Self::Slt,
            13 => Self::Sge,
            14 => Self::Exp,
            15 => Self::Log,
            17 => Self::Dst,
            18 => Self::Lrp,
            19 => Self::Frc,
            31 => Self::Dcl,
            32 => Self::Pow,
            33 => Self::Crs,
            35 => Self::Abs,
            37 => Self::Sincos,
            38 => Self::Rep,
            39 => Self::EndRep,
            40 => Self::If,
            41 => Self::Ifc,
            42 => Self::Else,
            43 => Self::EndIf,
            45 => Self::BreakC,
            46 => Self::Mova,
            65 => Self::TexKill,
            66 => Self::TexLd,
            81 => Self::Def,
            82 => Self::DefI,
            83 => Self::DefB,
            88 => Self::Cmp,
            89 => Self::Dp2Add,
            95 => Self::TexLdl,
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        match self {
            Self::Nop => "nop",
            Self::Mov => "mov",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mad => "mad",
            Self::Mul => "mul",
            Self::Rcp => "rcp",
            Self::Rsq => "rsq",
            Self::Dp3 => "dp3",
            Self::Dp4 => "dp4",
            Self::Min => "min",
            Self::Max => "max",
            Self::Slt => "slt",
            Self::Sge => "sge",
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Dst => "dst",
            Self::Lrp => "lrp",
            Self::Frc => "frc",
            Self::Dcl => "dcl",
            Self::Pow => "pow",
            Self::Crs => "crs",
            Self::Abs => "abs",
            Self::Sincos => "sincos",
            Self::Rep => "rep",
            Self::EndRep => "endrep",
            Self::If => "if",
            Self::Ifc => "ifc",
            Self::Else => "else",
            Self::EndIf => "endif",
            Self::BreakC => "breakc",
            Self::Mova => "mova",
            Self::TexKill => "texkill",
            Self::TexLd => "texld",
            Self::Def => "def",
            Self::DefI => "defi",
            Self::DefB => "defb",
            Self::Cmp => "cmp",
            Self::Dp2Add => "dp2add",
            Self::TexLdl => "texldl",
        }
    }
}

pub(crate) fn dispatch_instruction(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    stream: &[u32],
    inst_token: u32,
    token_index: usize,
) -> Result<(), TranslateError> {
    let raw = tokens::opcode_raw(inst_token);
    let length = tokens::instruction_length(inst_token);
    let opcode = Opcode::from_raw(raw)
        .ok_or_else(|| error::coverage(token_index, "unknown", format!("opcode 0x{raw:04x}")))?;
    let name = opcode.name();
    if inst_token & tokens::INSTRUCTION_PREDICATED != 0 {
        return Err(error::coverage(token_index, name, "predicated instruction"));
    }

    let flags = tr.options.flags;
    if flags.contains(TranslateFlags::HEX_COMMENTS)
        && !flags.contains(TranslateFlags::HEX_COMMENTS_AFTER)
    {
        let comment = hex_comment(stream, token_index, length);
        asm.push_alu_line(tr.depth(), &comment);
    }
    let alu_before = asm.alu_len();

    match opcode {
        Opcode::Nop => {}
        Opcode::Mov | Opcode::Frc | Opcode::Abs | Opcode::Mova => {
            emit_unary(tr, reader, asm, opcode, name)?;
        }
        Opcode::Rcp | Opcode::Rsq | Opcode::Exp | Opcode::Log => {
            emit_scalar_unary(tr, reader, asm, opcode, name)?;
        }
        Opcode::Add | Opcode::Sub | Opcode::Mul => emit_infix(tr, reader, asm, opcode, name)?,
        Opcode::Min | Opcode::Max => emit_min_max(tr, reader, asm, opcode, name)?,
        Opcode::Dp3 => emit_dot(tr, reader, asm, name, 3)?,
        Opcode::Dp4 => emit_dot(tr, reader, asm, name, 4)?,
        Opcode::Slt | Opcode::Sge => emit_compare_set(tr, reader, asm, opcode, name)?,
        Opcode::Mad => emit_mad(tr, reader, asm, name)?,
        Opcode::Dst => emit_distance(tr, reader, asm, name)?,
        Opcode::Lrp => emit_lerp(tr, reader, asm, name)?,
        Opcode::Pow => emit_pow(tr, reader, asm, name)?,
        Opcode::Crs => emit_cross(tr, reader, asm, name, token_index)?,
        Opcode::Sincos => emit_sincos(tr, reader, asm, name, token_index, length)?,
        Opcode::Cmp => emit_select(tr, reader, asm, name)?,
        Opcode::Dp2Add => emit_dp2add(tr, reader, asm, name)?,
        Opcode::TexKill => emit_texkill(tr, reader, asm, name, token_index)?,
        Opcode::TexLd => emit_texld(tr, reader, asm, inst_token, token_index, false)?,
        Opcode::TexLdl => emit_texld(tr, reader, asm, inst_token, token_index, true)?,
        Opcode::Dcl => emit_dcl(tr, reader)?,
        Opcode::Def => emit_def(tr, reader, token_index)?,
        Opcode::DefI => emit_defi(tr, reader, token_index)?,
        Opcode::DefB => emit_defb(tr, reader, token_index)?,
        Opcode::If => emit_if(tr, reader, asm, name, token_index)?,
        Opcode::Ifc => emit_ifc(tr, reader, asm, name, inst_token, token_index)?,
        Opcode::Else => emit_else(tr, asm, token_index)?,
        Opcode::EndIf => emit_endif(tr, asm, token_index)?,
        Opcode::Rep => emit_rep(tr, reader, asm, name, token_index)?,
        Opcode::EndRep => emit_endrep(tr, asm, token_index)?,
        Opcode::BreakC => emit_breakc(tr, reader, asm, name, inst_token, token_index)?,
    }

    let consumed = reader.position() - (token_index + 1);
    if consumed != length {
        return Err(error::protocol(
            token_index,
            format!("{name}: encoded length {length} but {consumed} operand tokens consumed"),
        ));
    }

    if flags.contains(TranslateFlags::HEX_COMMENTS)
        && flags.contains(TranslateFlags::HEX_COMMENTS_AFTER)
        && asm.alu_len() > alu_before
    {
        asm.append_to_last_alu_line(&hex_comment(stream, token_index, length));
    }
    Ok(())
}

/// All tokens of one instruction as a trailing comment. The end index is
/// clamped so truncated streams still annotate what is present.
fn hex_comment(stream: &[u32], token_index: usize, length: usize) -> String {
    let end = (token_index + 1 + length).min(stream.len());
    let mut text = String::from("//");
    for token in &stream[token_index..end] {
        text.push_str(&format!(" 0x{token:08x}"));
    }
    text
}

/// Source expression matched to the destination: scalar targets read one
/// component, masked vectors route source components through the mask.
fn positional(dst: &DstOperand, src: &SrcOperand) -> String {
    if dst.scalar {
        swizzle::component(&src.text, dst.scalar_read_position())
    } else {
        swizzle::remap_source_to_dest(&dst.text, &src.text)
    }
}

/// Wraps a scalar expression to the destination arity.
fn broadcast(dst: &DstOperand, expr: &str) -> String {
    if dst.arity == 1 {
        expr.to_owned()
    } else {
        format!("vec{}({expr})", dst.arity)
    }
}

fn write_statement(
    tr: &Translation<'_>,
    asm: &mut SectionAssembler,
    dst: &DstOperand,
    rhs: &str,
) {
    let depth = tr.depth();
    asm.push_alu_line(depth, &format!("{} = {rhs};", dst.text));
    if dst.saturate {
        asm.push_alu_line(depth, &saturate_line(dst));
    }
}

fn saturate_line(dst: &DstOperand) -> String {
    if dst.arity == 1 {
        format!("{0} = clamp({0}, 0.0, 1.0);", dst.text)
    } else {
        let zeros = vec!["0.0"; dst.arity].join(", ");
        let ones = vec!["1.0"; dst.arity].join(", ");
        format!(
            "{0} = clamp({0}, vec{1}({zeros}), vec{1}({ones}));",
            dst.text, dst.arity
        )
    }
}

fn emit_unary(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    opcode: Opcode,
    name: &'static str,
) -> Result<(), TranslateError> {
    let dst = operand::decode_dst(tr, reader, name)?;
    let src = operand::decode_src(tr, reader, name)?;
    let value = positional(&dst, &src);
    let rhs = match opcode {
        Opcode::Frc => format!("fract({value})"),
        Opcode::Abs => format!("abs({value})"),
        Opcode::Mova => format!("floor({value} + 0.5)"),
        _ => value,
    };
    write_statement(tr, asm, &dst, &rhs);
    Ok(())
}

fn emit_scalar_unary(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    opcode: Opcode,
    name: &'static str,
) -> Result<(), TranslateError> {
    let dst = operand::decode_dst(tr, reader, name)?;
    let src = operand::decode_src(tr, reader, name)?;
    let s = swizzle::ensure_arity(&src.text, 1);
    let expr = match opcode {
        Opcode::Rcp => format!("1.0 / {s}"),
        Opcode::Rsq => format!("inversesqrt({s})"),
        Opcode::Exp => format!("exp2({s})"),
        _ => format!("log2({s})"),
    };
    write_statement(tr, asm, &dst, &broadcast(&dst, &expr));
    Ok(())
}

fn emit_infix(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    opcode: Opcode,
    name: &'static str,
) -> Result<(), TranslateError> {
    let dst = operand::decode_dst(tr, reader, name)?;
    let a = operand::decode_src(tr, reader, name)?;
    let b = operand::decode_src(tr, reader, name)?;
    let symbol = match opcode {
        Opcode::Add => "+",
        Opcode::Sub => "-",
        _ => "*",
    };
    let rhs = format!("{} {symbol} {}", positional(&dst, &a), positional(&dst, &b));
    write_statement(tr, asm, &dst, &rhs);
    Ok(())
}

fn emit_min_max(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    opcode: Opcode,
    name: &'static str,
) -> Result<(), TranslateError> {
    let dst = operand::decode_dst(tr, reader, name)?;
    let a = operand::decode_src(tr, reader, name)?;
    let b = operand::decode_src(tr, reader, name)?;
    let call = if opcode == Opcode::Min { "min" } else { "max" };
    let rhs = format!("{call}({}, {})", positional(&dst, &a), positional(&dst, &b));
    write_statement(tr, asm, &dst, &rhs);
    Ok(())
}

fn emit_dot(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    name: &'static str,
    arity: usize,
) -> Result<(), TranslateError> {
    let dst = operand::decode_dst(tr, reader, name)?;
    let a = operand::decode_src(tr, reader, name)?;
    let b = operand::decode_src(tr, reader, name)?;
    let a = swizzle::ensure_arity(&a.text, arity);
    let b = swizzle::ensure_arity(&b.text, arity);
    write_statement(tr, asm, &dst, &broadcast(&dst, &format!("dot({a}, {b})")));
    Ok(())
}

fn emit_compare_set(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    opcode: Opcode,
    name: &'static str,
) -> Result<(), TranslateError> {
    let dst = operand::decode_dst(tr, reader, name)?;
    let a = operand::decode_src(tr, reader, name)?;
    let b = operand::decode_src(tr, reader, name)?;
    let a = positional(&dst, &a);
    let b = positional(&dst, &b);
    let rhs = if dst.arity == 1 {
        let symbol = if opcode == Opcode::Slt { "<" } else { ">=" };
        format!("({a} {symbol} {b}) ? 1.0 : 0.0")
    } else {
        let call = if opcode == Opcode::Slt {
            "lessThan"
        } else {
            "greaterThanEqual"
        };
        format!("vec{}({call}({a}, {b}))", dst.arity)
    };
    write_statement(tr, asm, &dst, &rhs);
    Ok(())
}

fn emit_mad(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    name: &'static str,
) -> Result<(), TranslateError> {
    let dst = operand::decode_dst(tr, reader, name)?;
    let a = operand::decode_src(tr, reader, name)?;
    let b = operand::decode_src(tr, reader, name)?;
    let c = operand::decode_src(tr, reader, name)?;
    let rhs = format!(
        "{} * {} + {}",
        positional(&dst, &a),
        positional(&dst, &b),
        positional(&dst, &c)
    );
    write_statement(tr, asm, &dst, &rhs);
    Ok(())
}

/// `dst` builds (1, a.y * b.y, a.z, b.w) componentwise.
fn emit_distance(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    name: &'static str,
) -> Result<(), TranslateError> {
    let dst = operand::decode_dst(tr, reader, name)?;
    let a = operand::decode_src(tr, reader, name)?;
    let b = operand::decode_src(tr, reader, name)?;
    let rhs = format!(
        "vec4(1.0, {} * {}, {}, {}){}",
        swizzle::component(&a.text, 1),
        swizzle::component(&b.text, 1),
        swizzle::component(&a.text, 2),
        swizzle::component(&b.text, 3),
        dst.result_suffix()
    );
    write_statement(tr, asm, &dst, &rhs);
    Ok(())
}

/// Pixel profiles lower lrp to mix(); vertex profiles expand it through a
/// workspace register so the factor is only read once.
fn emit_lerp(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    name: &'static str,
) -> Result<(), TranslateError> {
    let dst = operand::decode_dst(tr, reader, name)?;
    let factor = operand::decode_src(tr, reader, name)?;
    let hi = operand::decode_src(tr, reader, name)?;
    let lo = operand::decode_src(tr, reader, name)?;
    let a = positional(&dst, &factor);
    let b = positional(&dst, &hi);
    let c = positional(&dst, &lo);
    if tr.version.stage == ShaderStage::Pixel {
        write_statement(tr, asm, &dst, &format!("mix({c}, {b}, {a})"));
    } else {
        tr.tracker.uses_lrp_workspace = true;
        let suffix = dst.result_suffix();
        asm.push_alu_line(tr.depth(), &format!("lrp_tmp{suffix} = {b} - {c};"));
        write_statement(tr, asm, &dst, &format!("{a} * lrp_tmp{suffix} + {c}"));
    }
    Ok(())
}

fn emit_pow(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    name: &'static str,
) -> Result<(), TranslateError> {
    let dst = operand::decode_dst(tr, reader, name)?;
    let a = operand::decode_src(tr, reader, name)?;
    let b = operand::decode_src(tr, reader, name)?;
    let a = swizzle::ensure_arity(&a.text, 1);
    let b = swizzle::ensure_arity(&b.text, 1);
    write_statement(tr, asm, &dst, &broadcast(&dst, &format!("pow({a}, {b})")));
    Ok(())
}

fn emit_cross(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    name: &'static str,
    token_index: usize,
) -> Result<(), TranslateError> {
    let dst = operand::decode_dst(tr, reader, name)?;
    if dst.mask & 0x8 != 0 {
        return Err(error::protocol(
            token_index,
            "crs: write mask may not include w",
        ));
    }
    let a = operand::decode_src(tr, reader, name)?;
    let b = operand::decode_src(tr, reader, name)?;
    let a = swizzle::ensure_arity(&a.text, 3);
    let b = swizzle::ensure_arity(&b.text, 3);
    let rhs = format!("cross({a}, {b}){}", dst.result_suffix());
    write_statement(tr, asm, &dst, &rhs);
    Ok(())
}

/// sincos expands to the polynomial ladder the hardware macro runs, leaving
/// cosine in sc_tmp.x and sine in sc_tmp.y.
fn emit_sincos(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    name: &'static str,
    token_index: usize,
    length: usize,
) -> Result<(), TranslateError> {
    let dst = operand::decode_dst(tr, reader, name)?;
    if dst.mask & !0x3 != 0 {
        return Err(error::protocol(
            token_index,
            "sincos: write mask limited to x and y",
        ));
    }
    let src = operand::decode_src(tr, reader, name)?;
    // The SM2 form carries two reserved coefficient operands; skip unread.
    let consumed = reader.position() - (token_index + 1);
    match length.checked_sub(consumed) {
        Some(0) => {}
        Some(2) => reader.skip(2, "sincos coefficient operands")?,
        _ => {
            return Err(error::protocol(
                token_index,
                "sincos: unexpected operand count",
            ));
        }
    }

    tr.tracker.uses_sincos_workspace = true;
    let s = swizzle::ensure_arity(&src.text, 1);
    let depth = tr.depth();
    asm.push_alu_line(depth, &format!("sc_tmp.z = {s} * {s};"));
    asm.push_alu_line(depth, "sc_tmp.xy = sc_tmp.zz * sc_poly0.xy + sc_poly0.wz;");
    asm.push_alu_line(depth, "sc_tmp.xy = sc_tmp.xy * sc_tmp.zz + sc_poly1.xy;");
    asm.push_alu_line(depth, "sc_tmp.xy = sc_tmp.xy * sc_tmp.zz + sc_poly1.wz;");
    asm.push_alu_line(depth, &format!("sc_tmp.x = sc_tmp.x * {s};"));
    asm.push_alu_line(depth, "sc_tmp.xy = sc_tmp.xx * sc_tmp.xy;");
    asm.push_alu_line(depth, "sc_tmp.xy = sc_tmp.xy + sc_tmp.xy;");
    asm.push_alu_line(depth, "sc_tmp.x = -sc_tmp.x + sc_poly1.z;");
    write_statement(tr, asm, &dst, &format!("sc_tmp.{}", dst.mask_letters()));
    Ok(())
}

/// cmp selects src2 where src0 is negative and src1 elsewhere. Vector masks
/// go through a workspace register so sources may alias the destination.
fn emit_select(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    name: &'static str,
) -> Result<(), TranslateError> {
    let dst = operand::decode_dst(tr, reader, name)?;
    let cond = operand::decode_src(tr, reader, name)?;
    let pos = operand::decode_src(tr, reader, name)?;
    let neg = operand::decode_src(tr, reader, name)?;
    if dst.arity == 1 {
        let rhs = format!(
            "({} < 0.0) ? {} : {}",
            positional(&dst, &cond),
            positional(&dst, &neg),
            positional(&dst, &pos)
        );
        write_statement(tr, asm, &dst, &rhs);
        return Ok(());
    }
    tr.tracker.uses_cmp_workspace = true;
    let depth = tr.depth();
    for (position, letter) in LETTERS.iter().enumerate() {
        if dst.mask & (1 << position) == 0 {
            continue;
        }
        asm.push_alu_line(
            depth,
            &format!(
                "cmp_tmp.{letter} = ({} < 0.0) ? {} : {};",
                swizzle::component(&cond.text, position),
                swizzle::component(&neg.text, position),
                swizzle::component(&pos.text, position)
            ),
        );
    }
    write_statement(tr, asm, &dst, &format!("cmp_tmp.{}", dst.mask_letters()));
    Ok(())
}

fn emit_dp2add(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    name: &'static str,
) -> Result<(), TranslateError> {
    let dst = operand::decode_dst(tr, reader, name)?;
    let a = operand::decode_src(tr, reader, name)?;
    let b = operand::decode_src(tr, reader, name)?;
    let c = operand::decode_src(tr, reader, name)?;
    let a = swizzle::ensure_arity(&a.text, 2);
    let b = swizzle::ensure_arity(&b.text, 2);
    let c = swizzle::ensure_arity(&c.text, 1);
    let rhs = broadcast(&dst, &format!("dot({a}, {b}) + {c}"));
    write_statement(tr, asm, &dst, &rhs);
    Ok(())
}

fn emit_texkill(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    name: &'static str,
    token_index: usize,
) -> Result<(), TranslateError> {
    if tr.version.stage == ShaderStage::Vertex {
        return Err(error::protocol(
            token_index,
            "texkill: not valid in a vertex shader",
        ));
    }
    let src = operand::decode_src(tr, reader, name)?;
    let mut parts: Vec<String> = Vec::new();
    for index in 0..3 {
        let part = swizzle::component(&src.text, index);
        if !parts.contains(&part) {
            parts.push(part);
        }
    }
    let condition = parts
        .iter()
        .map(|part| format!("{part} < 0.0"))
        .collect::<Vec<_>>()
        .join(" || ");
    asm.push_alu_line(tr.depth(), &format!("if ({condition}) discard;"));
    Ok(())
}

fn emit_texld(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    inst_token: u32,
    token_index: usize,
    explicit_lod: bool,
) -> Result<(), TranslateError> {
    let name = if explicit_lod { "texldl" } else { "texld" };
    if !explicit_lod && tr.version.stage == ShaderStage::Vertex {
        return Err(error::coverage(
            token_index,
            name,
            "texld in a vertex shader",
        ));
    }
    let submode = if explicit_lod {
        0
    } else {
        (inst_token >> 16) & 0xF
    };
    let project = match submode {
        0 => false,
        1 => true,
        2 => return Err(error::coverage(token_index, name, "bias sampling")),
        other => {
            return Err(error::coverage(
                token_index,
                name,
                format!("sampling submode {other}"),
            ));
        }
    };

    let dst = operand::decode_dst(tr, reader, name)?;
    let coord = operand::decode_src(tr, reader, name)?;
    let sampler = operand::decode_src(tr, reader, name)?;
    if sampler.file != RegisterFile::Sampler {
        return Err(error::protocol(
            token_index,
            format!("{name}: last operand must be a sampler"),
        ));
    }
    let dim = tr.tracker.sampler_dims[sampler.index].ok_or_else(|| {
        error::protocol(
            token_index,
            format!("{name}: sampler s{} has no declared dimension", sampler.index),
        )
    })?;
    let shadow = tr.options.shadow_samplers & (1 << sampler.index) != 0;
    if shadow && explicit_lod {
        return Err(error::coverage(
            token_index,
            name,
            "explicit lod with a shadow sampler",
        ));
    }

    let sampler_text = if tr.options.flags.contains(TranslateFlags::BINDLESS_TEXTURES) {
        format!("{}(sampler{}_handle)", dim.glsl_type(shadow), sampler.index)
    } else {
        sampler.text.clone()
    };
    if explicit_lod && tr.version.stage == ShaderStage::Pixel {
        tr.tracker.needs_fragment_lod_extension = true;
    }

    let c2 = swizzle::ensure_arity(&coord.text, 2);
    let c3 = swizzle::ensure_arity(&coord.text, 3);
    let c4 = swizzle::ensure_arity(&coord.text, 4);
    let lod = swizzle::component(&coord.text, 3);
    let call = if explicit_lod {
        match dim {
            SamplerDim::TwoD => format!("texture2DLod({sampler_text}, {c2}, {lod})"),
            SamplerDim::Cube => format!("textureCubeLod({sampler_text}, {c3}, {lod})"),
            SamplerDim::Volume => format!("texture3DLod({sampler_text}, {c3}, {lod})"),
        }
    } else if shadow {
        if dim != SamplerDim::TwoD {
            return Err(error::coverage(
                token_index,
                name,
                "shadow sampling outside 2d",
            ));
        }
        if project {
            format!("shadow2DProj({sampler_text}, {c4})")
        } else {
            format!("shadow2D({sampler_text}, {c3})")
        }
    } else if project {
        match dim {
            SamplerDim::TwoD => format!("texture2DProj({sampler_text}, {c4})"),
            SamplerDim::Volume => format!("texture3DProj({sampler_text}, {c4})"),
            SamplerDim::Cube => {
                return Err(error::coverage(
                    token_index,
                    name,
                    "projected cube sampling",
                ));
            }
        }
    } else {
        match dim {
            SamplerDim::TwoD => format!("texture2D({sampler_text}, {c2})"),
            SamplerDim::Cube => format!("textureCube({sampler_text}, {c3})"),
            SamplerDim::Volume => format!("texture3D({sampler_text}, {c3})"),
        }
    };
    write_statement(tr, asm, &dst, &format!("{call}{}", dst.result_suffix()));
    Ok(())
}

fn emit_dcl(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
) -> Result<(), TranslateError> {
    let decl_index = reader.position();
    let decl = reader.next("declaration token")?;
    if decl & tokens::PARAM_TAG == 0 {
        return Err(error::protocol(
            decl_index,
            "dcl: expected a declaration token",
        ));
    }
    let target_index = reader.position();
    let target = reader.next("declaration target")?;
    if target & tokens::PARAM_TAG == 0 {
        return Err(error::protocol(
            target_index,
            "dcl: expected a destination parameter token",
        ));
    }
    let raw = ((target >> 28) & 0x7) | ((target >> 8) & 0x18);
    let index = (target & 0x7FF) as usize;
    let file = RegisterFile::from_raw(raw, tr.version, OperandRole::Dst)
        .ok_or_else(|| error::protocol(target_index, format!("dcl: unknown register type {raw}")))?;

    if file == RegisterFile::Sampler {
        let dim_raw = (decl >> 27) & 0xF;
        let dim = SamplerDim::from_decl_raw(dim_raw).ok_or_else(|| {
            error::protocol(decl_index, format!("dcl: sampler dimension {dim_raw}"))
        })?;
        return tr.tracker.note_sampler_dimension(index, dim, target_index);
    }

    let usage_raw = decl & 0x1F;
    let usage = DeclUsage::from_raw(usage_raw)
        .ok_or_else(|| error::protocol(decl_index, format!("dcl: unknown usage {usage_raw}")))?;
    let semantic = Semantic {
        usage,
        usage_index: ((decl >> 16) & 0xF) as u8,
    };
    match (tr.version.stage, file) {
        (ShaderStage::Vertex, RegisterFile::Input) => {
            tr.tracker.declare_attribute(index, semantic, target_index)
        }
        (ShaderStage::Vertex, RegisterFile::Output) => {
            tr.tracker.declare_vs_output(index, semantic, target_index)
        }
        (ShaderStage::Pixel, RegisterFile::Input) if tr.version.is_sm3() => {
            tr.tracker.declare_ps_input(index, semantic, target_index)
        }
        (ShaderStage::Pixel, RegisterFile::Input) => {
            tr.tracker.declare_ps_color(index, target_index)
        }
        (ShaderStage::Pixel, RegisterFile::Texture) if tr.version.is_sm2() => {
            tr.tracker.declare_ps_texcoord(index, target_index)
        }
        _ => Err(error::protocol(
            target_index,
            "dcl: register cannot be declared in this profile",
        )),
    }
}

fn def_target(
    tr: &Translation<'_>,
    reader: &mut TokenReader<'_>,
    name: &'static str,
) -> Result<(RegisterFile, usize, usize), TranslateError> {
    let target_index = reader.position();
    let target = reader.next("definition target")?;
    if target & tokens::PARAM_TAG == 0 {
        return Err(error::protocol(
            target_index,
            format!("{name}: expected a destination parameter token"),
        ));
    }
    let raw = ((target >> 28) & 0x7) | ((target >> 8) & 0x18);
    let index = (target & 0x7FF) as usize;
    let file = RegisterFile::from_raw(raw, tr.version, OperandRole::Dst).ok_or_else(|| {
        error::protocol(target_index, format!("{name}: unknown register type {raw}"))
    })?;
    Ok((file, index, target_index))
}

fn emit_def(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    token_index: usize,
) -> Result<(), TranslateError> {
    let (file, index, target_index) = def_target(tr, reader, "def")?;
    if file != RegisterFile::Const {
        return Err(error::protocol(
            token_index,
            "def: target must be a float constant",
        ));
    }
    if index >= tr.version.float_constant_limit() {
        return Err(error::protocol(
            target_index,
            format!(
                "def: float constant c{index} out of range for {}",
                tr.version.profile()
            ),
        ));
    }
    let mut words = [0u32; 4];
    for word in &mut words {
        *word = reader.next("definition value")?;
    }
    tr.tracker.def_float(index, words, target_index)
}

fn emit_defi(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    token_index: usize,
) -> Result<(), TranslateError> {
    let (file, index, target_index) = def_target(tr, reader, "defi")?;
    if file != RegisterFile::ConstInt {
        return Err(error::protocol(
            token_index,
            "defi: target must be an integer constant",
        ));
    }
    if index >= limits::MAX_INT_CONSTANTS {
        return Err(error::protocol(
            target_index,
            format!("defi: integer constant i{index} out of range"),
        ));
    }
    let mut values = [0i32; 4];
    for value in &mut values {
        *value = reader.next("definition value")? as i32;
    }
    tr.tracker.def_int(index, values, target_index)
}

fn emit_defb(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    token_index: usize,
) -> Result<(), TranslateError> {
    let (file, index, target_index) = def_target(tr, reader, "defb")?;
    if file != RegisterFile::ConstBool {
        return Err(error::protocol(
            token_index,
            "defb: target must be a boolean constant",
        ));
    }
    if index >= limits::MAX_BOOL_CONSTANTS {
        return Err(error::protocol(
            target_index,
            format!("defb: boolean constant b{index} out of range"),
        ));
    }
    let value = reader.next("definition value")?;
    tr.tracker.def_bool(index, value != 0, target_index)
}

fn emit_if(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    name: &'static str,
    token_index: usize,
) -> Result<(), TranslateError> {
    let cond = operand::decode_src(tr, reader, name)?;
    if cond.file != RegisterFile::ConstBool {
        return Err(error::protocol(
            token_index,
            "if: condition must be a boolean constant",
        ));
    }
    asm.push_alu_line(tr.depth(), &format!("if ({}) {{", cond.text));
    tr.frames.push(Frame::If);
    Ok(())
}

fn emit_ifc(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    name: &'static str,
    inst_token: u32,
    token_index: usize,
) -> Result<(), TranslateError> {
    let compare = CompareOp::from_control_bits(tokens::control_bits(inst_token))
        .ok_or_else(|| error::protocol(token_index, "ifc: unknown comparison"))?;
    let a = operand::decode_src(tr, reader, name)?;
    let b = operand::decode_src(tr, reader, name)?;
    let a = swizzle::ensure_arity(&a.text, 1);
    let b = swizzle::ensure_arity(&b.text, 1);
    asm.push_alu_line(tr.depth(), &format!("if ({a} {} {b}) {{", compare.glsl()));
    tr.frames.push(Frame::If);
    Ok(())
}

fn emit_else(
    tr: &mut Translation<'_>,
    asm: &mut SectionAssembler,
    token_index: usize,
) -> Result<(), TranslateError> {
    match tr.frames.last_mut() {
        Some(frame @ Frame::If) => *frame = Frame::Else,
        _ => return Err(error::protocol(token_index, "else: no open if block")),
    }
    asm.push_alu_line(tr.depth() - 1, "} else {");
    Ok(())
}

fn emit_endif(
    tr: &mut Translation<'_>,
    asm: &mut SectionAssembler,
    token_index: usize,
) -> Result<(), TranslateError> {
    match tr.frames.pop() {
        Some(Frame::If | Frame::Else) => {}
        _ => return Err(error::protocol(token_index, "endif: no open if block")),
    }
    asm.push_alu_line(tr.depth(), "}");
    Ok(())
}

fn emit_rep(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    name: &'static str,
    token_index: usize,
) -> Result<(), TranslateError> {
    if tr.frames.contains(&Frame::Rep) {
        return Err(error::coverage(token_index, name, "nested rep blocks"));
    }
    let count = operand::decode_src(tr, reader, name)?;
    if count.file != RegisterFile::ConstInt {
        return Err(error::protocol(
            token_index,
            "rep: counter must be an integer constant",
        ));
    }
    let bound = swizzle::ensure_arity(&count.text, 1);
    asm.push_alu_line(
        tr.depth(),
        &format!("for (int rep0 = 0; rep0 < {bound}; ++rep0) {{"),
    );
    tr.frames.push(Frame::Rep);
    Ok(())
}

fn emit_endrep(
    tr: &mut Translation<'_>,
    asm: &mut SectionAssembler,
    token_index: usize,
) -> Result<(), TranslateError> {
    match tr.frames.pop() {
        Some(Frame::Rep) => {}
        _ => return Err(error::protocol(token_index, "endrep: no open rep block")),
    }
    asm.push_alu_line(tr.depth(), "}");
    Ok(())
}

fn emit_breakc(
    tr: &mut Translation<'_>,
    reader: &mut TokenReader<'_>,
    asm: &mut SectionAssembler,
    name: &'static str,
    inst_token: u32,
    token_index: usize,
) -> Result<(), TranslateError> {
    if !tr.frames.contains(&Frame::Rep) {
        return Err(error::protocol(
            token_index,
            "breakc: no enclosing rep block",
        ));
    }
    let compare = CompareOp::from_control_bits(tokens::control_bits(inst_token))
        .ok_or_else(|| error::protocol(token_index, "breakc: unknown comparison"))?;
    let a = operand::decode_src(tr, reader, name)?;
    let b = operand::decode_src(tr, reader, name)?;
    let a = swizzle::ensure_arity(&a.text, 1);
    let b = swizzle::ensure_arity(&b.text, 1);
    asm.push_alu_line(
        tr.depth(),
        &format!("if ({a} {} {b}) break;", compare.glsl()),
    );
    Ok(())
}

pub(crate) fn emit_footer(tr: &Translation<'_>, asm: &mut SectionAssembler) {
    let flags = tr.options.flags;
    match tr.version.stage {
        ShaderStage::Vertex => {
            if !tr.tracker.uses_position_workspace {
                return;
            }
            if flags.contains(TranslateFlags::FIXUP_Y) {
                asm.push_alu_line(1, "o_pos.y = -o_pos.y;");
            }
            if flags.contains(TranslateFlags::FIXUP_Z) {
                asm.push_alu_line(1, "o_pos.z = 2.0 * o_pos.z - o_pos.w;");
            }
            if flags.contains(TranslateFlags::USER_CLIP_PLANES) {
                asm.push_alu_line(1, "gl_ClipVertex = o_pos;");
            }
            asm.push_alu_line(1, "gl_Position = o_pos;");
        }
        ShaderStage::Pixel => {
            if !flags.contains(TranslateFlags::SRGB_WRITE_SUFFIX) {
                return;
            }
            let eps = format_f32(1.0 / 65536.0);
            let inv_gamma = format_f32(1.0 / 2.2);
            asm.push_alu_line(1, "if (flSRGBWrite != 0.0) {");
            asm.push_alu_line(
                2,
                &format!(
                    "gl_FragData[0].xyz = exp2(log2(max(gl_FragData[0].xyz, \
                     vec3({eps}, {eps}, {eps}))) * {inv_gamma});"
                ),
            );
            asm.push_alu_line(1, "}");
        }
    }
}
