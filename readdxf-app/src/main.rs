use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use readdxf_config::{AppConfig, ConfigError};
use readdxf_core::entity::EntityKind;
use readdxf_io::{DxfFile, ScanError, SectionError};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

mod report;

const USAGE: &str = "Usage: readdxf [--config <path>] [--log <level>] file";

const EXIT_OK: u8 = 0;
const EXIT_LOAD_FAILURE: u8 = 1;
const EXIT_NO_ENTITIES: u8 = 2;
const EXIT_NO_ENDSEC: u8 = 3;

#[derive(Debug, PartialEq)]
enum Command {
    Scan(Options),
    Help,
    Version,
}

#[derive(Debug, PartialEq)]
struct Options {
    file: PathBuf,
    config: Option<PathBuf>,
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let options = match parse_args(std::env::args().skip(1)) {
        Ok(Command::Scan(options)) => options,
        Ok(Command::Help) => {
            eprintln!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Ok(Command::Version) => {
            println!("readdxf {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            // 参数错误仍以 0 退出
            eprintln!("{message}");
            eprintln!("{USAGE}");
            return ExitCode::SUCCESS;
        }
    };

    let (config, config_error) = match load_configuration(options.config.as_deref()) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    let level = options
        .log_level
        .as_deref()
        .unwrap_or(config.logging.level.as_str());
    init_logging(level);
    if let Some(err) = config_error {
        match &err {
            ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                warn!(path = %path.display(), error = %err, "加载配置失败，使用内建默认值");
            }
            ConfigError::Context { .. } => {
                warn!(error = %err, "加载配置失败，使用内建默认值");
            }
        }
    }

    ExitCode::from(run(&options.file, &config.scan.kinds))
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Command, String> {
    let mut args = args.into_iter();
    let mut file: Option<PathBuf> = None;
    let mut config: Option<PathBuf> = None;
    let mut log_level: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-V" | "--version" => return Ok(Command::Version),
            "--config" => {
                let Some(path) = args.next() else {
                    return Err("`--config` 需要提供配置文件路径".to_string());
                };
                config = Some(PathBuf::from(path));
            }
            "--log" => {
                let Some(level) = args.next() else {
                    return Err("`--log` 需要提供日志等级".to_string());
                };
                log_level = Some(level);
            }
            other if other.len() > 1 && other.starts_with('-') => {
                return Err(format!("未知参数：{other}"));
            }
            _ => {
                if file.is_some() {
                    return Err("只能指定一个输入文件".to_string());
                }
                file = Some(PathBuf::from(arg));
            }
        }
    }

    let Some(file) = file else {
        return Err("缺少输入文件".to_string());
    };
    Ok(Command::Scan(Options {
        file,
        config,
        log_level,
    }))
}

fn load_configuration(override_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match override_path {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::discover(),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = fmt().with_env_filter(filter).with_writer(io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}

fn run(path: &Path, kinds: &[EntityKind]) -> u8 {
    let file = match DxfFile::open(path) {
        Ok(file) => file,
        Err(err) => {
            debug!(path = %path.display(), error = ?err, "无法处理输入文件");
            eprintln!("{err}");
            return exit_code(&err);
        }
    };
    if kinds.is_empty() {
        warn!("配置中未启用任何实体类型");
    }

    let mut scanner = file.scan(kinds);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(err) = report::write_entities(&mut out, &mut scanner) {
        error!(error = %err, "写出扫描结果失败");
        return EXIT_LOAD_FAILURE;
    }

    let stats = scanner.stats();
    info!(
        path = %path.display(),
        lines = stats.lines,
        arcs = stats.arcs,
        decoded = stats.decoded(),
        abandoned = stats.abandoned,
        "扫描完成"
    );
    EXIT_OK
}

fn exit_code(err: &ScanError) -> u8 {
    match err {
        ScanError::Load(_) => EXIT_LOAD_FAILURE,
        ScanError::Section(SectionError::NotFound) => EXIT_NO_ENTITIES,
        ScanError::Section(SectionError::Unterminated) => EXIT_NO_ENDSEC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_file_argument_is_accepted() {
        let command = parse_args(args(&["drawing.dxf"])).expect("valid arguments");
        assert_eq!(
            command,
            Command::Scan(Options {
                file: PathBuf::from("drawing.dxf"),
                config: None,
                log_level: None,
            })
        );
    }

    #[test]
    fn options_may_precede_or_follow_file() {
        let command = parse_args(args(&["--log", "debug", "a.dxf", "--config", "cfg.toml"]))
            .expect("valid arguments");
        assert_eq!(
            command,
            Command::Scan(Options {
                file: PathBuf::from("a.dxf"),
                config: Some(PathBuf::from("cfg.toml")),
                log_level: Some("debug".to_string()),
            })
        );
    }

    #[test]
    fn usage_errors_are_reported() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["a.dxf", "b.dxf"])).is_err());
        assert!(parse_args(args(&["--config"])).is_err());
        assert!(parse_args(args(&["--log"])).is_err());
        assert!(parse_args(args(&["--bogus", "a.dxf"])).is_err());
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert_eq!(parse_args(args(&["-h", "a.dxf"])), Ok(Command::Help));
        assert_eq!(parse_args(args(&["--version"])), Ok(Command::Version));
    }

    #[test]
    fn dash_alone_is_a_file_name() {
        let command = parse_args(args(&["-"])).expect("valid arguments");
        assert!(matches!(command, Command::Scan(options) if options.file == PathBuf::from("-")));
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(exit_code(&ScanError::Section(SectionError::NotFound)), 2);
        assert_eq!(exit_code(&ScanError::Section(SectionError::Unterminated)), 3);

        let dir = tempfile::tempdir().expect("create temp dir");
        let err = DxfFile::open(dir.path().join("missing.dxf")).expect_err("missing file");
        assert_eq!(exit_code(&err), 1);
    }
}
