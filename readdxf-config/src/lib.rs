use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use readdxf_core::entity::EntityKind;
use serde::Deserialize;
use thiserror::Error;

/// 显式指定配置文件的环境变量。
pub const CONFIG_ENV: &str = "READDXF_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `READDXF_CONFIG`，否则寻找
    /// `./config/readdxf.toml`。若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let cwd = env::current_dir().map_err(|source| ConfigError::Context {
            message: "获取当前工作目录失败".to_string(),
            source,
        })?;
        Self::discover_in(&cwd)
    }

    /// 在指定目录下查找 `config/readdxf.toml`。
    pub fn discover_in(dir: &Path) -> Result<Self, ConfigError> {
        let default_path = dir.join("config").join("readdxf.toml");
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置。默认只输出警告及以上级别，保持标准输出干净。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "warn".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 扫描配置：参与扫描的实体类型。列表为空时不输出任何实体。
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "ScanConfig::default_kinds")]
    pub kinds: Vec<EntityKind>,
}

impl ScanConfig {
    fn default_kinds() -> Vec<EntityKind> {
        EntityKind::ALL.to_vec()
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            kinds: Self::default_kinds(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_returned_when_file_missing() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let cfg = AppConfig::discover_in(dir.path()).expect("discover should succeed");
        assert_eq!(cfg.logging.level, "warn");
        assert_eq!(cfg.scan.kinds, vec![EntityKind::Line, EntityKind::Arc]);
    }

    #[test]
    fn load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [logging]
            level = "debug"

            [scan]
            kinds = ["arc"]
            "#
        )
        .unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.scan.kinds, vec![EntityKind::Arc]);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[logging]\nlevel = \"info\"").unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.scan.kinds, EntityKind::ALL.to_vec());
    }

    #[test]
    fn discover_in_reads_config_directory() {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::create_dir(dir.path().join("config")).expect("create config dir");
        fs::write(
            dir.path().join("config").join("readdxf.toml"),
            "[scan]\nkinds = [\"line\"]\n",
        )
        .expect("write config");

        let cfg = AppConfig::discover_in(dir.path()).expect("discover should succeed");
        assert_eq!(cfg.scan.kinds, vec![EntityKind::Line]);
        assert_eq!(cfg.logging.level, "warn");
    }

    #[test]
    fn unknown_entity_kind_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[scan]\nkinds = [\"circle\"]").unwrap();

        let err = AppConfig::from_file(file.path()).expect_err("circle is not supported");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = AppConfig::from_file(dir.path().join("absent.toml")).expect_err("absent");
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
