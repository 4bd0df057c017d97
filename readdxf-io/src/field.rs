use memchr::memmem;
use readdxf_core::group_code::GroupCode;
use thiserror::Error;

/// 单个字段读取失败。`resume` 为调用方应继续扫描的位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("group code {code} not found after offset {resume}")]
    Missing { code: GroupCode, resume: usize },
    #[error("group code {code} is not followed by a number at offset {resume}")]
    Unparsable { code: GroupCode, resume: usize },
}

impl FieldError {
    #[inline]
    pub fn resume_at(&self) -> usize {
        match self {
            FieldError::Missing { resume, .. } | FieldError::Unparsable { resume, .. } => *resume,
        }
    }

    #[inline]
    pub fn code(&self) -> GroupCode {
        match self {
            FieldError::Missing { code, .. } | FieldError::Unparsable { code, .. } => *code,
        }
    }
}

/// 从 `start` 起向后查找组码标记，解析其后的数值。
///
/// 成功时返回数值与数值文本之后的位置。找不到标记时 `resume` 保持为 `start`；
/// 标记后不是数值时 `resume` 为标记之后的位置。
pub fn read_field(source: &[u8], start: usize, code: GroupCode) -> Result<(f64, usize), FieldError> {
    let marker = code.marker().as_bytes();
    let haystack = source.get(start..).unwrap_or_default();
    let Some(found) = memmem::find(haystack, marker) else {
        return Err(FieldError::Missing {
            code,
            resume: start,
        });
    };

    let value_at = start + found + marker.len();
    match parse_number(&source[value_at..]) {
        Some((value, consumed)) => Ok((value, value_at + consumed)),
        None => Err(FieldError::Unparsable {
            code,
            resume: value_at,
        }),
    }
}

/// 与区域设置无关的浮点解析，返回数值及消耗的字节数（含前导空白）。
///
/// 接受 `[空白][符号](数字[.数字] | .数字)[指数]`、十六进制浮点
/// `0x十六进制数字[.十六进制数字][p指数]`，以及不区分大小写的 `inf`、
/// `infinity`、`nan`、`nan(字符序列)`。开头不是合法数值时返回 `None`。
pub fn parse_number(text: &[u8]) -> Option<(f64, usize)> {
    let mut pos = text.iter().take_while(|&&b| is_space(b)).count();
    let literal_start = pos;
    let negative = match text.get(pos) {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    if let Some((value, len)) = parse_special(&text[pos..]) {
        let value = if negative { -value } else { value };
        return Some((value, pos + len));
    }
    if let Some((value, len)) = parse_hex(&text[pos..]) {
        let value = if negative { -value } else { value };
        return Some((value, pos + len));
    }

    let int_digits = count_digits(&text[pos..]);
    pos += int_digits;
    let mut frac_digits = 0;
    if text.get(pos) == Some(&b'.') {
        frac_digits = count_digits(&text[pos + 1..]);
        if int_digits + frac_digits > 0 {
            pos += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(text.get(pos), Some(b'e' | b'E')) {
        let mut exp = pos + 1;
        if matches!(text.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = text.get(exp..).map_or(0, count_digits);
        if exp_digits > 0 {
            pos = exp + exp_digits;
        }
    }

    let literal = std::str::from_utf8(&text[literal_start..pos]).ok()?;
    let value = literal.parse::<f64>().ok()?;
    Some((value, pos))
}

fn parse_special(text: &[u8]) -> Option<(f64, usize)> {
    const SPECIALS: [(&[u8], f64); 3] = [
        (b"infinity", f64::INFINITY),
        (b"inf", f64::INFINITY),
        (b"nan", f64::NAN),
    ];
    let (value, len) = SPECIALS.iter().find_map(|(word, value)| {
        let prefix = text.get(..word.len())?;
        prefix.eq_ignore_ascii_case(word).then_some((*value, word.len()))
    })?;
    if value.is_nan() && text.get(len) == Some(&b'(') {
        // nan(字母数字或下划线)，括号未闭合时只取 nan
        let payload = text[len + 1..]
            .iter()
            .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
            .count();
        if text.get(len + 1 + payload) == Some(&b')') {
            return Some((value, len + payload + 2));
        }
    }
    Some((value, len))
}

/// 十六进制浮点 `0x1.8p3`。`0x` 后没有十六进制数字时返回 `None`，
/// 由十进制分支只读取开头的 `0`。
fn parse_hex(text: &[u8]) -> Option<(f64, usize)> {
    if text.first() != Some(&b'0') || !matches!(text.get(1), Some(b'x' | b'X')) {
        return None;
    }
    let mut pos = 2;
    let mut mantissa = 0.0_f64;
    let mut digits = 0;
    let mut scale: i64 = 0;

    while let Some(digit) = text.get(pos).and_then(|b| hex_value(*b)) {
        mantissa = mantissa * 16.0 + f64::from(digit);
        digits += 1;
        pos += 1;
    }
    if text.get(pos) == Some(&b'.') {
        let mut frac = pos + 1;
        while let Some(digit) = text.get(frac).and_then(|b| hex_value(*b)) {
            mantissa = mantissa * 16.0 + f64::from(digit);
            scale -= 4;
            digits += 1;
            frac += 1;
        }
        if digits > 0 {
            pos = frac;
        }
    }
    if digits == 0 {
        return None;
    }

    if matches!(text.get(pos), Some(b'p' | b'P')) {
        let mut exp = pos + 1;
        let negative = match text.get(exp) {
            Some(b'-') => {
                exp += 1;
                true
            }
            Some(b'+') => {
                exp += 1;
                false
            }
            _ => false,
        };
        let exp_digits = text.get(exp..).map_or(0, count_digits);
        if exp_digits > 0 {
            let magnitude = text[exp..exp + exp_digits]
                .iter()
                .fold(0_i64, |acc, b| (acc * 10 + i64::from(b - b'0')).min(100_000));
            scale += if negative { -magnitude } else { magnitude };
            pos = exp + exp_digits;
        }
    }

    Some((scale_by_power_of_two(mantissa, scale), pos))
}

/// `mantissa * 2^scale`，分步相乘以免中间结果先溢出或下溢。
fn scale_by_power_of_two(mut mantissa: f64, mut scale: i64) -> f64 {
    const STEP: i64 = 1000;
    while scale > STEP && mantissa.is_finite() && mantissa != 0.0 {
        mantissa *= 2.0_f64.powi(STEP as i32);
        scale -= STEP;
    }
    while scale < -STEP && mantissa != 0.0 {
        mantissa *= 2.0_f64.powi(-STEP as i32);
        scale += STEP;
    }
    mantissa * 2.0_f64.powi(scale as i32)
}

#[inline]
fn hex_value(byte: u8) -> Option<u32> {
    char::from(byte).to_digit(16)
}

#[inline]
fn count_digits(text: &[u8]) -> usize {
    text.iter().take_while(|b| b.is_ascii_digit()).count()
}

#[inline]
fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}
