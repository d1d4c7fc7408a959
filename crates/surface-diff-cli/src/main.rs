//! surface-diff - 公开 API 表面差异比较工具
//!
//! 读取两个版本的 API 表面快照（单个文件或成对目录），比较后输出变更报告。

mod cli;

use cli::{Cli, Config, InputMode};
use std::io::{IsTerminal, Write};
use std::process::ExitCode;
use surface_diff_core::{
    BatchComparator, ChangeAggregator, ComparisonResult, DiffEngine, FormatterConfig,
    JsonSnapshotCodec, ReportRenderer, Result, SnapshotCodec, SurfaceDiffError, discover_pairs,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// 检测到变更且指定了 `--fail-on-changes` 时的退出码
const EXIT_CHANGES_DETECTED: u8 = 2;

fn main() -> ExitCode {
    // 解析命令行参数
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    // 验证参数
    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        return ExitCode::FAILURE;
    }

    let config: Config = cli.into();
    debug!(
        "Configuration: old={}, new={}, format={:?}, exclude={:?}",
        config.old_path.display(),
        config.new_path.display(),
        config.output_format,
        config.exclude_pattern
    );

    match run(&config) {
        Ok(changed) if changed && config.fail_on_changes => {
            info!("Public API changes detected");
            ExitCode::from(EXIT_CHANGES_DETECTED)
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Application error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// 初始化日志，`RUST_LOG` 优先，`--verbose` 时默认级别为 debug
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

/// 主要应用逻辑，返回是否检测到变更
fn run(config: &Config) -> Result<bool> {
    let codec = JsonSnapshotCodec::new();

    let results = match config.input_mode() {
        InputMode::Files => vec![compare_files(config, &codec)?],
        InputMode::Directories => compare_directories(config, &codec)?,
    };

    let changed = results.iter().any(ChangeAggregator::has_changes);
    info!(
        "Compared {} snapshot pair(s), changes detected: {}",
        results.len(),
        changed
    );

    let renderer = ReportRenderer::new(FormatterConfig {
        output_format: config.output_format,
        show_unchanged: config.show_unchanged,
        // 标准输出被重定向时不输出颜色转义序列
        enable_colors: config.enable_colors && std::io::stdout().is_terminal(),
        ..FormatterConfig::default()
    });
    let output = renderer.render_many(&results)?;

    match &config.output_file {
        Some(path) => {
            output.save_to_file(path)?;
            info!("Report written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(output.content.as_bytes())?;
            if !output.content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            stdout.flush()?;
        }
    }

    Ok(changed)
}

fn compare_files(config: &Config, codec: &JsonSnapshotCodec) -> Result<ComparisonResult> {
    let filter = config.snapshot_filter()?;

    let old = filter.apply(&codec.load_from_path(&config.old_path)?);
    let new = filter.apply(&codec.load_from_path(&config.new_path)?);

    if old.name != new.name {
        warn!(
            "Comparing snapshots of different assemblies: {} vs {}",
            old.name, new.name
        );
    }

    Ok(DiffEngine::new().compare(&old, &new))
}

fn compare_directories(
    config: &Config,
    codec: &JsonSnapshotCodec,
) -> Result<Vec<ComparisonResult>> {
    let discovery = discover_pairs(&config.old_path, &config.new_path, codec.file_extension())?;

    for path in &discovery.unmatched_old {
        warn!("Skipping {}: no counterpart in new snapshots", path.display());
    }
    for path in &discovery.unmatched_new {
        warn!("Skipping {}: no counterpart in old snapshots", path.display());
    }

    if discovery.pairs.is_empty() {
        return Err(SurfaceDiffError::ConfigError(format!(
            "No matching snapshot pairs found in {} and {}",
            config.old_path.display(),
            config.new_path.display()
        )));
    }

    let mut comparator = BatchComparator::new().with_filter(config.snapshot_filter()?);
    if let Some(jobs) = config.jobs {
        comparator = comparator.with_thread_pool_size(jobs);
    }

    let batch = comparator.compare_files(codec, &discovery.pairs)?;

    // 任何一对失败都视为整体失败
    if let Some((label, error)) = batch.failed.into_iter().next() {
        error!("Comparison of {} failed", label);
        return Err(error);
    }

    Ok(batch
        .outcomes
        .into_iter()
        .map(|outcome| outcome.result)
        .collect())
}
