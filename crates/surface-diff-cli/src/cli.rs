//! 命令行接口模块
//!
//! 提供命令行参数解析和参数校验

use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use surface_diff_core::{OutputFormat, Result, SnapshotFilter, SurfaceDiffError};

/// surface-diff - 公开 API 表面差异比较工具
///
/// 比较同一程序集两个版本的 API 表面快照，报告新增、删除和修改的类型与成员。
#[derive(Parser, Debug)]
#[command(name = "surface-diff")]
#[command(author = "surface-diff contributors")]
#[command(version)]
#[command(about = "Compare two public API surface snapshots and report what changed")]
#[command(
    long_about = "surface-diff compares two snapshots of an assembly's public API surface and reports added, removed and modified types and members. OLD and NEW are either two snapshot files or two directories of snapshot files paired by relative path."
)]
pub struct Cli {
    /// 旧版本快照（文件或目录）
    #[arg(help = "Old snapshot file or directory", value_name = "OLD")]
    pub old: PathBuf,

    /// 新版本快照（文件或目录）
    #[arg(help = "New snapshot file or directory", value_name = "NEW")]
    pub new: PathBuf,

    /// 输出格式
    #[arg(
        short = 'f',
        long = "format",
        value_enum,
        default_value_t = OutputFormatArg::PlainText,
        help = "Output format for the report"
    )]
    pub format: OutputFormatArg,

    /// 排除类型的正则表达式
    #[arg(
        short = 'e',
        long = "exclude",
        value_name = "REGEX",
        help = "Exclude types whose qualified name matches this regular expression"
    )]
    pub exclude: Option<String>,

    /// 输出到文件
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help = "Write the report to a file instead of stdout"
    )]
    pub output_file: Option<PathBuf>,

    /// 显示未变更的条目
    #[arg(
        long = "show-unchanged",
        help = "Also list types and members without changes"
    )]
    pub show_unchanged: bool,

    /// 关闭颜色
    #[arg(long = "no-color", help = "Disable colored text output")]
    pub no_color: bool,

    /// 有变更时返回非零退出码
    #[arg(
        long = "fail-on-changes",
        help = "Exit with status 2 when any change is detected"
    )]
    pub fail_on_changes: bool,

    /// 并行线程数
    #[arg(
        short = 'j',
        long = "jobs",
        value_name = "N",
        help = "Number of worker threads for directory comparisons (defaults to CPU count)",
        value_parser = clap::value_parser!(u32).range(1..=256)
    )]
    pub jobs: Option<u32>,

    /// 详细输出
    #[arg(short = 'v', long = "verbose", help = "Enable verbose logging output")]
    pub verbose: bool,
}

/// 输出格式命令行参数
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormatArg {
    #[value(name = "text")]
    PlainText,
    #[value(name = "markdown")]
    Markdown,
    #[value(name = "html")]
    Html,
    /// 机器可读的 JSON 报告
    #[value(name = "json")]
    Json,
}

/// 输入类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// 两个快照文件
    Files,
    /// 两个快照目录，按相对路径配对
    Directories,
}

/// 应用程序配置信息
#[derive(Debug, Clone)]
pub struct Config {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    pub output_format: OutputFormat,
    pub exclude_pattern: Option<String>,
    pub output_file: Option<PathBuf>,
    pub show_unchanged: bool,
    /// 是否启用颜色，写入文件时总是关闭
    pub enable_colors: bool,
    pub fail_on_changes: bool,
    /// 线程数，`None` 表示使用 CPU 核心数
    pub jobs: Option<usize>,
}

impl Config {
    /// 根据输入路径判断比较模式
    pub fn input_mode(&self) -> InputMode {
        if self.old_path.is_dir() {
            InputMode::Directories
        } else {
            InputMode::Files
        }
    }

    /// 构建快照过滤器
    pub fn snapshot_filter(&self) -> Result<SnapshotFilter> {
        SnapshotFilter::new(self.exclude_pattern.as_deref())
    }
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::PlainText => OutputFormat::PlainText,
            OutputFormatArg::Markdown => OutputFormat::Markdown,
            OutputFormatArg::Html => OutputFormat::Html,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        let enable_colors = !cli.no_color && cli.output_file.is_none();
        Config {
            old_path: cli.old,
            new_path: cli.new,
            output_format: cli.format.into(),
            exclude_pattern: cli.exclude,
            output_file: cli.output_file,
            show_unchanged: cli.show_unchanged,
            enable_colors,
            fail_on_changes: cli.fail_on_changes,
            jobs: cli.jobs.map(|jobs| jobs as usize),
        }
    }
}

impl Cli {
    /// 解析命令行参数
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// 验证参数的有效性
    pub fn validate(&self) -> Result<()> {
        ensure_exists(&self.old)?;
        ensure_exists(&self.new)?;

        // 两侧必须同为文件或同为目录
        if self.old.is_dir() != self.new.is_dir() {
            return Err(SurfaceDiffError::ConfigError(format!(
                "OLD and NEW must both be files or both be directories: {} vs {}",
                self.old.display(),
                self.new.display()
            )));
        }

        // 提前编译排除模式，错误的正则直接报告
        SnapshotFilter::new(self.exclude.as_deref())?;

        if let Some(output_file) = &self.output_file {
            if output_file.is_dir() {
                return Err(SurfaceDiffError::ConfigError(format!(
                    "Output path is a directory: {}",
                    output_file.display()
                )));
            }
            if let Some(parent) = output_file.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        SurfaceDiffError::IoError(std::io::Error::new(
                            e.kind(),
                            format!(
                                "Failed to create output directory {}: {}",
                                parent.display(),
                                e
                            ),
                        ))
                    })?;
                }
            }
        }

        Ok(())
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(SurfaceDiffError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Snapshot path does not exist: {}", path.display()),
        )))
    }
}
