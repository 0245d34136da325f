//! Punycode for identifiers that are not plain symbol characters.
//!
//! A variant of RFC 3492: `_` is the delimiter, digits map to `a-z` then
//! `A-J`, and ASCII characters that are not valid in a symbol are shifted
//! into `0xD800..0xD880` before encoding so that they are encoded rather
//! than copied.

const BASE: u32 = 36;
const TMIN: u32 = 1;
const TMAX: u32 = 26;
const SKEW: u32 = 38;
const DAMP: u32 = 700;
const INITIAL_BIAS: u32 = 72;
const INITIAL_N: u32 = 128;
const DELIMITER: u32 = '_' as u32;

/// Offset applied to non-symbol ASCII characters.
const NON_SYMBOL_BASE: u32 = 0xD800;

/// Whether `c` may appear verbatim in a mangled identifier.
pub fn is_valid_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Whether `ident` must be punycode-encoded to appear in a symbol.
pub fn needs_punycode(ident: &str) -> bool {
    !ident.chars().all(is_valid_symbol_char)
}

/// Encodes `input`, returning `None` if it contains a code point the
/// encoding cannot represent.
///
/// With `map_non_symbol_chars` set, non-symbol ASCII characters are encoded
/// instead of being copied to the basic prefix.
pub fn encode(input: &str, map_non_symbol_chars: bool) -> Option<String> {
    let scalars: Vec<u32> = input
        .chars()
        .map(|c| {
            let value = u32::from(c);
            if value < 0x80 && map_non_symbol_chars && !is_valid_symbol_char(c) {
                value + NON_SYMBOL_BASE
            } else {
                value
            }
        })
        .collect();
    let encoded = encode_scalars(&scalars)?;
    Some(encoded.into_iter().map(char::from).collect())
}

/// Decodes a punycode identifier, undoing the non-symbol ASCII mapping.
pub fn decode(input: &str) -> Option<String> {
    let scalars: Vec<u32> = input.chars().map(u32::from).collect();
    decode_scalars(&scalars)?
        .into_iter()
        .map(|scalar| {
            if (NON_SYMBOL_BASE..NON_SYMBOL_BASE + 0x80).contains(&scalar) {
                char::from_u32(scalar - NON_SYMBOL_BASE)
            } else {
                char::from_u32(scalar)
            }
        })
        .collect()
}

fn digit_value(digit: u32) -> u8 {
    debug_assert!(digit < BASE, "invalid punycode digit");
    // Digits are below BASE, so both arms fit in a byte.
    #[allow(clippy::cast_possible_truncation)]
    let digit = digit as u8;
    if digit < 26 {
        b'a' + digit
    } else {
        b'A' + digit - 26
    }
}

fn digit_index(value: u32) -> Option<u32> {
    match char::from_u32(value)? {
        c @ 'a'..='z' => Some(u32::from(c) - u32::from('a')),
        c @ 'A'..='J' => Some(u32::from(c) - u32::from('A') + 26),
        _ => None,
    }
}

fn is_valid_unicode_scalar(scalar: u32) -> bool {
    // 0xD800..0xD880 carries mapped non-symbol ASCII.
    scalar < 0xD880 || (0xE000..=0x1F_FFFF).contains(&scalar)
}

fn threshold(k: u32, bias: u32) -> u32 {
    if k <= bias {
        TMIN
    } else if k >= bias + TMAX {
        TMAX
    } else {
        k - bias
    }
}

fn adapt(delta: u32, num_points: u32, first_time: bool) -> u32 {
    let mut delta = if first_time { delta / DAMP } else { delta / 2 };
    delta += delta / num_points;
    let mut k = 0;
    while delta > ((BASE - TMIN) * TMAX) / 2 {
        delta /= BASE - TMIN;
        k += BASE;
    }
    k + (((BASE - TMIN + 1) * delta) / (delta + SKEW))
}

fn decode_scalars(input: &[u32]) -> Option<Vec<u32>> {
    let mut output: Vec<u32> = Vec::with_capacity(input.len());
    let mut remainder = input;

    if let Some(last_delimiter) = input.iter().rposition(|&c| c == DELIMITER) {
        for &c in &input[..last_delimiter] {
            if c > 0x7F {
                return None;
            }
            output.push(c);
        }
        remainder = &input[last_delimiter + 1..];
    }

    let mut n = INITIAL_N;
    let mut i: u32 = 0;
    let mut bias = INITIAL_BIAS;

    while !remainder.is_empty() {
        let old_i = i;
        let mut w: u32 = 1;
        let mut k = BASE;
        loop {
            let (&code_point, rest) = remainder.split_first()?;
            remainder = rest;
            let digit = digit_index(code_point)?;
            i = i.checked_add(digit.checked_mul(w)?)?;
            let t = threshold(k, bias);
            if digit < t {
                break;
            }
            w = w.checked_mul(BASE - t)?;
            k = k.checked_add(BASE)?;
        }
        let len = u32::try_from(output.len()).ok()? + 1;
        bias = adapt(i - old_i, len, old_i == 0);
        n = n.checked_add(i / len)?;
        i %= len;
        if n < 0x80 {
            return None;
        }
        output.insert(i as usize, n);
        i += 1;
    }

    Some(output)
}

fn encode_scalars(input: &[u32]) -> Option<Vec<u8>> {
    let mut punycode = Vec::with_capacity(input.len());

    let mut h: u32 = 0;
    for &c in input {
        if !is_valid_unicode_scalar(c) {
            return None;
        }
        if c < 0x80 {
            h += 1;
            // Basic code points are ASCII.
            #[allow(clippy::cast_possible_truncation)]
            punycode.push(c as u8);
        }
    }

    let b = h;
    if b > 0 {
        punycode.push(b'_');
    }

    let total = u32::try_from(input.len()).ok()?;
    let mut n = INITIAL_N;
    let mut delta: u32 = 0;
    let mut bias = INITIAL_BIAS;

    while h < total {
        let m = input
            .iter()
            .copied()
            .filter(|&c| c >= n)
            .min()
            .unwrap_or(0x10_FFFF);

        delta = delta.checked_add((m - n).checked_mul(h + 1)?)?;
        n = m;
        for &c in input {
            if c < n {
                delta += 1;
            }
            if c == n {
                let mut q = delta;
                let mut k = BASE;
                loop {
                    let t = threshold(k, bias);
                    if q < t {
                        break;
                    }
                    punycode.push(digit_value(t + ((q - t) % (BASE - t))));
                    q = (q - t) / (BASE - t);
                    k += BASE;
                }
                punycode.push(digit_value(q));
                bias = adapt(delta, h + 1, h == b);
                delta = 0;
                h += 1;
            }
        }
        delta += 1;
        n += 1;
    }

    Some(punycode)
}

#[cfg(test)]
mod tests;
