use memchr::memmem;
use thiserror::Error;
use tracing::debug;

pub const ENTITIES_MARKER: &str = "ENTITIES";
pub const ENDSEC_MARKER: &str = "ENDSEC";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SectionError {
    #[error("No ENTITIES section in file.")]
    NotFound,
    #[error("No ENDSEC for ENTITIES section in file.")]
    Unterminated,
}

/// 缓冲区内的半开区间 `[start, end)`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// 定位 ENTITIES 段主体：从第一个 `ENTITIES` 之后，到其后第一个 `ENDSEC` 之前。
///
/// 只做字面量查找，不校验段落嵌套；结构错乱的文件会得到偏宽或偏窄的区间。
pub fn locate_entities(source: &[u8]) -> Result<Span, SectionError> {
    let marker = memmem::find(source, ENTITIES_MARKER.as_bytes()).ok_or(SectionError::NotFound)?;
    let start = marker + ENTITIES_MARKER.len();
    let end = memmem::find(&source[start..], ENDSEC_MARKER.as_bytes())
        .map(|offset| start + offset)
        .ok_or(SectionError::Unterminated)?;
    debug!(start, end, "定位到 ENTITIES 段");
    Ok(Span::new(start, end))
}
