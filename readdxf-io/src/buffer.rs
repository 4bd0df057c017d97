use std::collections::TryReserveError;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open file {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to determine size of {path:?}: {source}")]
    Size {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to allocate {size} bytes for {path:?}: {source}")]
    Alloc {
        path: PathBuf,
        size: u64,
        #[source]
        source: TryReserveError,
    },
    #[error("failed to read file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    /// 兼容旧接口的负数错误码：打开 -1，取长度 -2，分配 -3，读取 -4。
    pub fn code(&self) -> i32 {
        match self {
            LoadError::Open { .. } => -1,
            LoadError::Size { .. } => -2,
            LoadError::Alloc { .. } => -3,
            LoadError::Read { .. } => -4,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            LoadError::Open { path, .. }
            | LoadError::Size { path, .. }
            | LoadError::Alloc { path, .. }
            | LoadError::Read { path, .. } => path,
        }
    }
}

/// 整个文件的只读副本，末尾附带一个 0 字节哨兵。
///
/// 哨兵不计入 [`Buffer::len`]，[`Buffer::as_bytes`] 也不包含它。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    data: Vec<u8>,
}

impl Buffer {
    /// 读取整个文件。任何失败都不会返回部分内容。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let size = file
            .metadata()
            .map_err(|source| LoadError::Size {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        let mut data = Vec::new();
        let capacity = usize::try_from(size).unwrap_or(usize::MAX).saturating_add(1);
        data.try_reserve_exact(capacity)
            .map_err(|source| LoadError::Alloc {
                path: path.to_path_buf(),
                size,
                source,
            })?;
        file.read_to_end(&mut data)
            .map_err(|source| LoadError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        data.push(0);

        debug!(path = %path.display(), size = data.len() - 1, "文件已读入缓冲区");
        Ok(Self { data })
    }

    /// 由内存数据构造缓冲区，自动追加哨兵。
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let mut data = bytes.into();
        data.push(0);
        Self { data }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len()]
    }
}

impl From<&str> for Buffer {
    fn from(value: &str) -> Self {
        Self::from_bytes(value.as_bytes())
    }
}
