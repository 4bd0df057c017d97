use memchr::memmem;
use readdxf_core::entity::{Entity, EntityKind};
use tracing::{debug, trace, warn};

use crate::field::{FieldError, read_field};
use crate::section::Span;

/// 找到实体标记后，字段查找从标记起始处向后跳过的字节数。
const MARKER_SKIP: usize = 4;

/// 单次扫描的统计。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub lines: usize,
    pub arcs: usize,
    pub abandoned: usize,
}

impl ScanStats {
    #[inline]
    pub fn decoded(&self) -> usize {
        self.lines + self.arcs
    }

    fn record(&mut self, kind: EntityKind) {
        match kind {
            EntityKind::Line => self.lines += 1,
            EntityKind::Arc => self.arcs += 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Lookahead {
    Unknown,
    At(usize),
    Exhausted,
}

/// 每种实体类型一条独立的只进游标。
#[derive(Debug)]
struct Lane {
    kind: EntityKind,
    cursor: usize,
    lookahead: Lookahead,
}

impl Lane {
    fn new(kind: EntityKind, start: usize) -> Self {
        Self {
            kind,
            cursor: start,
            lookahead: Lookahead::Unknown,
        }
    }

    /// 下一个完整落在区间内的标记位置，结果缓存到游标移动为止。
    fn peek(&mut self, source: &[u8], span: Span) -> Option<usize> {
        match self.lookahead {
            Lookahead::At(offset) => Some(offset),
            Lookahead::Exhausted => None,
            Lookahead::Unknown => {
                let found = if self.cursor < span.end {
                    memmem::find(&source[self.cursor..span.end], self.kind.marker().as_bytes())
                        .map(|offset| self.cursor + offset)
                } else {
                    None
                };
                self.lookahead = found.map_or(Lookahead::Exhausted, Lookahead::At);
                found
            }
        }
    }

    fn advance(&mut self, cursor: usize) {
        debug_assert!(cursor >= self.cursor, "游标只能向前移动");
        self.cursor = cursor.max(self.cursor);
        self.lookahead = Lookahead::Unknown;
    }
}

/// 在 ENTITIES 区间内按出现位置依次解出实体。
///
/// 每一步比较各类型下一个标记的位置，先解码位置最靠前者；无论解码成功与否，
/// 该类型的游标都移动到最后一次字段查找停下的位置。字段不全的实体被丢弃，
/// 扫描继续。
#[derive(Debug)]
pub struct EntityScanner<'a> {
    source: &'a [u8],
    span: Span,
    lanes: Vec<Lane>,
    stats: ScanStats,
}

impl<'a> EntityScanner<'a> {
    /// `kinds` 中重复的类型只保留第一次出现；位置相同时列在前面的类型优先。
    pub fn new(source: &'a [u8], span: Span, kinds: &[EntityKind]) -> Self {
        let end = span.end.min(source.len());
        let span = Span::new(span.start.min(end), end);
        let mut lanes: Vec<Lane> = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            if lanes.iter().all(|lane| lane.kind != kind) {
                lanes.push(Lane::new(kind, span.start));
            }
        }
        Self {
            source,
            span,
            lanes,
            stats: ScanStats::default(),
        }
    }

    #[inline]
    pub fn span(&self) -> Span {
        self.span
    }

    #[inline]
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    fn next_marker(&mut self) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        for (index, lane) in self.lanes.iter_mut().enumerate() {
            let Some(offset) = lane.peek(self.source, self.span) else {
                continue;
            };
            if best.is_none_or(|(_, current)| offset < current) {
                best = Some((index, offset));
            }
        }
        best
    }

    fn decode(&self, kind: EntityKind, marker_at: usize) -> Result<(Vec<f64>, usize), FieldError> {
        let mut cursor = marker_at.saturating_add(MARKER_SKIP).min(self.source.len());
        let mut values = Vec::with_capacity(kind.fields().len());
        for &code in kind.fields() {
            let (value, next) = read_field(self.source, cursor, code)?;
            values.push(value);
            cursor = next;
        }
        Ok((values, cursor))
    }
}

impl Iterator for EntityScanner<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        loop {
            let (index, marker_at) = self.next_marker()?;
            let kind = self.lanes[index].kind;
            match self.decode(kind, marker_at) {
                Ok((values, cursor)) => {
                    self.lanes[index].advance(cursor);
                    match kind.build(&values) {
                        Some(entity) => {
                            self.stats.record(kind);
                            trace!(%kind, offset = marker_at, "解出实体");
                            return Some(entity);
                        }
                        None => {
                            self.stats.abandoned += 1;
                            warn!(%kind, offset = marker_at, count = values.len(), "字段数量与实体类型不符");
                        }
                    }
                }
                Err(err) => {
                    self.lanes[index].advance(err.resume_at());
                    self.stats.abandoned += 1;
                    debug!(
                        %kind,
                        offset = marker_at,
                        code = %err.code(),
                        error = %err,
                        "实体字段不完整，已跳过"
                    );
                }
            }
        }
    }
}
