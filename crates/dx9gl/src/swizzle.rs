//! String-level swizzle and write-mask algebra over rendered GLSL operands.
//!
//! Operands arrive as finished GLSL expressions ("r0.xyz", "abs(vc[7])",
//! "-oT0.x"). A dot is swizzle-significant only when followed exclusively by
//! one to four letters from `xyzw`, optionally before the closing
//! parentheses of a wrapping modifier.

/// Component letters in vector order.
pub(crate) const LETTERS: [char; 4] = ['x', 'y', 'z', 'w'];

fn letter_index(letter: char) -> usize {
    match letter {
        'y' => 1,
        'z' => 2,
        'w' => 3,
        _ => 0,
    }
}

/// Splits `operand` into (head, swizzle letters, trailing parentheses).
/// The letters are empty when the operand carries no explicit swizzle.
fn split(operand: &str) -> (&str, &str, &str) {
    let bytes = operand.as_bytes();
    let mut paren_start = bytes.len();
    while paren_start > 0 && bytes[paren_start - 1] == b')' {
        paren_start -= 1;
    }
    let mut letters_start = paren_start;
    while letters_start > 0 && matches!(bytes[letters_start - 1], b'x' | b'y' | b'z' | b'w') {
        letters_start -= 1;
    }
    let count = paren_start - letters_start;
    if (1..=4).contains(&count) && letters_start > 0 && bytes[letters_start - 1] == b'.' {
        (
            &operand[..letters_start - 1],
            &operand[letters_start..paren_start],
            &operand[paren_start..],
        )
    } else {
        (&operand[..paren_start], "", &operand[paren_start..])
    }
}

/// Expands a swizzle to all four positions: absent swizzles are the
/// identity, short ones replicate their last letter.
fn expand(letters: &str) -> [char; 4] {
    if letters.is_empty() {
        return LETTERS;
    }
    let mut out = ['x'; 4];
    let mut last = 'x';
    let mut chars = letters.chars();
    for slot in &mut out {
        if let Some(c) = chars.next() {
            last = c;
        }
        *slot = last;
    }
    out
}

/// Number of components named by the trailing swizzle; zero when the operand
/// has no explicit swizzle.
pub fn component_count(operand: &str) -> usize {
    split(operand).1.len()
}

/// Rewrites the operand so its trailing swizzle names exactly `components`
/// components (clamped to 1..=4). Longer swizzles truncate, shorter ones
/// replicate their last letter, absent ones take the identity prefix. A bare
/// operand already reads all four components and stays bare when four are
/// requested.
pub fn ensure_arity(operand: &str, components: usize) -> String {
    let components = components.clamp(1, 4);
    let (head, letters, tail) = split(operand);
    if letters.len() == components || (letters.is_empty() && components == 4) {
        return operand.to_owned();
    }
    let expanded = expand(letters);
    let new_letters: String = expanded[..components].iter().collect();
    format!("{head}.{new_letters}{tail}")
}

/// Rewrites `source` so that assigning it to the masked `dest` lvalue routes
/// each component where the bytecode writes it: for every letter of the
/// destination mask, the source letter at that letter's vector index is
/// taken. Sources with an implied identity swizzle stay untouched when the
/// result would be the identity.
pub fn remap_source_to_dest(dest: &str, source: &str) -> String {
    let dest_letters = split(dest).1;
    let mask = if dest_letters.is_empty() {
        "xyzw"
    } else {
        dest_letters
    };
    let (head, letters, tail) = split(source);
    let expanded = expand(letters);
    let new_letters: String = mask.chars().map(|m| expanded[letter_index(m)]).collect();
    if letters.is_empty() && new_letters == "xyzw" {
        return source.to_owned();
    }
    format!("{head}.{new_letters}{tail}")
}

/// Extracts component `index` (0..=3, clamped) of the operand as a
/// one-component operand, preserving any wrapping modifier text.
pub fn component(operand: &str, index: usize) -> String {
    let (head, letters, tail) = split(operand);
    let letter = expand(letters)[index.min(3)];
    format!("{head}.{letter}{tail}")
}
