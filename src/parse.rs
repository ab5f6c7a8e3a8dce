use bstr::ByteSlice;

const TAB: u8 = 9;
const SPACE: u8 = 32;
const MINUS: u8 = 45;
const PERIOD: u8 = 46;
const ZERO: u8 = 48;

/// Parses `-?digits[.digit]` into tenths, so `"23.4"` becomes `234`.
///
/// Anything else is rejected: a second fractional digit, a dangling period,
/// a stray sign or a value that does not fit an `i32` once scaled.
#[inline]
pub fn parse_scaled(buffer: &[u8]) -> Option<i32> {
    let (is_neg, digits) = match buffer {
        [MINUS, rest @ ..] => (true, rest),
        _ => (false, buffer),
    };

    let (integer, fraction) = match digits.find_byte(PERIOD) {
        Some(period) => (&digits[..period], Some(&digits[(period + 1)..])),
        None => (digits, None),
    };

    if integer.is_empty() {
        return None;
    }

    let mut acc: i32 = 0;
    for &val in integer {
        if !val.is_ascii_digit() {
            return None;
        }
        acc = acc.checked_mul(10)?.checked_add((val - ZERO) as i32)?;
    }

    let tenths = match fraction {
        None => 0,
        Some(&[digit]) if digit.is_ascii_digit() => (digit - ZERO) as i32,
        Some(_) => return None,
    };
    let acc = acc.checked_mul(10)?.checked_add(tenths)?;

    match is_neg {
        true => Some(-acc),
        false => Some(acc),
    }
}

/// Splits one record on the last `delimiter`, trims both halves and parses
/// the value. `None` means the line is malformed and should be skipped.
#[inline]
pub fn tokenize_line(line: &[u8], delimiter: u8) -> Option<(&[u8], i32)> {
    let split = line.rfind_byte(delimiter)?;
    let key = trim_blanks(&line[..split]);
    let value = trim_blanks(&line[(split + 1)..]);

    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, parse_scaled(value)?))
}

// Only spaces and tabs. `\r`, form feed and vertical tab stay in the token,
// so CRLF input has to be normalized before it gets here.
#[inline]
fn trim_blanks(buffer: &[u8]) -> &[u8] {
    let mut start = 0;
    let mut end = buffer.len();

    while start < end && matches!(buffer[start], SPACE | TAB) {
        start += 1;
    }
    while end > start && matches!(buffer[end - 1], SPACE | TAB) {
        end -= 1;
    }
    &buffer[start..end]
}
