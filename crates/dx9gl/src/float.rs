//! Deterministic `f32` to decimal text, independent of host formatting.
//!
//! Output is sign, the full integral part, a dot, and at least one fraction
//! digit. The fraction carries twelve significant digits past its leading
//! zeros, rounded half-up, which is enough for the text to re-parse to the
//! exact source value. NaN collapses to `0.0`; infinities saturate to the
//! largest finite magnitude so emitted text always re-parses finite.

/// Two-digit groups "00".."99", indexed by value * 2.
const DIGIT_PAIRS: &[u8; 200] = b"00010203040506070809\
10111213141516171819\
20212223242526272829\
30313233343536373839\
40414243444546474849\
50515253545556575859\
60616263646566676869\
70717273747576777879\
80818283848586878889\
90919293949596979899";

/// Formats `value` as plain decimal (no exponent notation, no locale).
pub fn format_f32(value: f32) -> String {
    format_f32_bits(value.to_bits())
}

/// Bit-pattern variant of [`format_f32`], used for raw `def` payload words.
pub fn format_f32_bits(bits: u32) -> String {
    let negative = bits & 0x8000_0000 != 0;
    let exp_raw = ((bits >> 23) & 0xFF) as i32;
    let mantissa_raw = bits & 0x007F_FFFF;

    if exp_raw == 0xFF {
        if mantissa_raw != 0 {
            return "0.0".to_owned();
        }
        return format_f32_bits((bits & 0x8000_0000) | 0x7F7F_FFFF);
    }
    if exp_raw == 0 && mantissa_raw == 0 {
        return if negative {
            "-0.0".to_owned()
        } else {
            "0.0".to_owned()
        };
    }

    // value = mantissa * 2^exponent, denormals included.
    let (mantissa, exponent) = if exp_raw == 0 {
        (mantissa_raw, -149)
    } else {
        (mantissa_raw | 0x0080_0000, exp_raw - 150)
    };

    let mut integral: u128;
    let mut digits: Vec<u8> = Vec::new();

    if exponent >= 0 {
        // 24 mantissa bits shifted by at most 104: fits u128.
        integral = (mantissa as u128) << exponent;
    } else {
        let scale = (-exponent) as u32;
        integral = if scale >= 128 {
            0
        } else {
            (mantissa as u128) >> scale
        };

        let mut fraction = Wide::from_u32(mantissa);
        fraction.mask_low(scale);

        // Peel six decimal digits per round; the 2-adic valuation of the
        // running remainder grows by six each time, so the loop is bounded
        // by scale / 6 rounds even without the significance cutoff.
        let mut first_nonzero = None;
        while !fraction.is_zero() {
            fraction.mul_small(1_000_000);
            let chunk = fraction.take_high(scale);
            push_six_digits(&mut digits, chunk);
            if first_nonzero.is_none() {
                first_nonzero = digits.iter().position(|&d| d != b'0');
            }
            if let Some(first) = first_nonzero {
                if digits.len() >= first + 13 {
                    break;
                }
            }
        }

        if let Some(first) = first_nonzero {
            let keep = first + 12;
            if keep < digits.len() {
                let round_up = digits[keep] >= b'5';
                digits.truncate(keep);
                if round_up {
                    let mut carry = true;
                    for digit in digits.iter_mut().rev() {
                        if *digit == b'9' {
                            *digit = b'0';
                        } else {
                            *digit += 1;
                            carry = false;
                            break;
                        }
                    }
                    if carry {
                        integral += 1;
                    }
                }
            }
        }
    }

    let mut text = Vec::with_capacity(digits.len() + 44);
    if negative {
        text.push(b'-');
    }
    push_u128(&mut text, integral);
    text.push(b'.');
    let mut keep = digits.len();
    while keep > 1 && digits[keep - 1] == b'0' {
        keep -= 1;
    }
    if keep == 0 {
        text.push(b'0');
    } else {
        text.extend_from_slice(&digits[..keep]);
    }
    text.iter().map(|&b| b as char).collect()
}

fn push_six_digits(out: &mut Vec<u8>, chunk: u32) {
    debug_assert!(chunk < 1_000_000);
    let hi = (chunk / 10_000) as usize;
    let mid = (chunk / 100 % 100) as usize;
    let lo = (chunk % 100) as usize;
    out.extend_from_slice(&DIGIT_PAIRS[hi * 2..hi * 2 + 2]);
    out.extend_from_slice(&DIGIT_PAIRS[mid * 2..mid * 2 + 2]);
    out.extend_from_slice(&DIGIT_PAIRS[lo * 2..lo * 2 + 2]);
}

fn push_u128(out: &mut Vec<u8>, mut value: u128) {
    // 2^128 is 39 decimal digits: seven six-digit groups suffice.
    let mut groups = [0u32; 7];
    let mut count = 0;
    loop {
        groups[count] = (value % 1_000_000) as u32;
        value /= 1_000_000;
        count += 1;
        if value == 0 {
            break;
        }
    }
    let mut lead = groups[count - 1];
    let mut buf = [0u8; 6];
    let mut len = 0;
    loop {
        buf[len] = b'0' + (lead % 10) as u8;
        lead /= 10;
        len += 1;
        if lead == 0 {
            break;
        }
    }
    for i in (0..len).rev() {
        out.push(buf[i]);
    }
    for i in (0..count - 1).rev() {
        push_six_digits(out, groups[i]);
    }
}

/// Little-endian multi-word integer, wide enough for a 149-bit fraction
/// remainder scaled by one more factor of 10^6 (169 bits needed).
#[derive(Clone, Copy)]
struct Wide {
    limbs: [u32; 6],
}

impl Wide {
    fn from_u32(value: u32) -> Self {
        let mut limbs = [0u32; 6];
        limbs[0] = value;
        Wide { limbs }
    }

    fn is_zero(&self) -> bool {
        self.limbs.iter().all(|&limb| limb == 0)
    }

    /// Clears every bit at or above `bit`.
    fn mask_low(&mut self, bit: u32) {
        for (i, limb) in self.limbs.iter_mut().enumerate() {
            let base = i as u32 * 32;
            if base >= bit {
                *limb = 0;
            } else if bit - base < 32 {
                *limb &= (1u32 << (bit - base)) - 1;
            }
        }
    }

    fn mul_small(&mut self, factor: u32) {
        let mut carry = 0u64;
        for limb in &mut self.limbs {
            let wide = u64::from(*limb) * u64::from(factor) + carry;
            *limb = wide as u32;
            carry = wide >> 32;
        }
        debug_assert_eq!(carry, 0);
    }

    /// Returns the value of the bits at or above `bit` and clears them.
    /// The caller guarantees that value is below 10^6, so it spans at most
    /// two limbs.
    fn take_high(&mut self, bit: u32) -> u32 {
        let limb = (bit / 32) as usize;
        let offset = bit % 32;
        debug_assert!(limb + 1 < self.limbs.len());
        let mut high = u64::from(self.limbs[limb]) >> offset;
        if offset > 0 {
            high |= u64::from(self.limbs[limb + 1]) << (32 - offset);
        }
        debug_assert!(high < 1_000_000);
        self.mask_low(bit);
        high as u32
    }
}
