mod buffer;
mod field;
mod scanner;
mod section;

use std::path::Path;

use readdxf_core::entity::{Entity, EntityKind};
use thiserror::Error;
use tracing::info;

pub use buffer::{Buffer, LoadError};
pub use field::{FieldError, parse_number, read_field};
pub use scanner::{EntityScanner, ScanStats};
pub use section::{ENDSEC_MARKER, ENTITIES_MARKER, SectionError, Span, locate_entities};

/// 一次运行中可能终止扫描的错误。单个实体的字段错误不在此列。
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Section(#[from] SectionError),
}

/// 已读入内存并定位好 ENTITIES 段的 DXF 文件。
#[derive(Debug, Clone)]
pub struct DxfFile {
    buffer: Buffer,
    span: Span,
}

impl DxfFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let buffer = Buffer::load(path)?;
        let file = Self::from_buffer(buffer)?;
        info!(
            path = %path.display(),
            size = file.buffer.len(),
            section = file.span.len(),
            "已载入 DXF 文件"
        );
        Ok(file)
    }

    pub fn from_buffer(buffer: Buffer) -> Result<Self, SectionError> {
        let span = locate_entities(buffer.as_bytes())?;
        Ok(Self { buffer, span })
    }

    #[inline]
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    #[inline]
    pub fn span(&self) -> Span {
        self.span
    }

    /// 扫描全部支持的实体类型。
    pub fn entities(&self) -> EntityScanner<'_> {
        self.scan(&EntityKind::ALL)
    }

    /// 仅扫描 `kinds` 中列出的类型，每次调用都从区间起点重新开始。
    pub fn scan(&self, kinds: &[EntityKind]) -> EntityScanner<'_> {
        EntityScanner::new(self.buffer.as_bytes(), self.span, kinds)
    }
}

impl TryFrom<&str> for DxfFile {
    type Error = SectionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_buffer(Buffer::from(value))
    }
}

/// 读取文件并收集全部实体。
pub fn scan_file(path: impl AsRef<Path>, kinds: &[EntityKind]) -> Result<Vec<Entity>, ScanError> {
    let file = DxfFile::open(path)?;
    Ok(file.scan(kinds).collect())
}
