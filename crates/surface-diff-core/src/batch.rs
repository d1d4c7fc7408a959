//! 批量比较模块
//!
//! 一次运行中比较多个程序集时，每对快照各自独立，使用 rayon 线程池并行执行，
//! 结果按输入顺序返回。

use crate::aggregate::ChangeAggregator;
use crate::codec::SnapshotCodec;
use crate::diff::{ComparisonResult, DiffEngine};
use crate::error::{Result, SurfaceDiffError};
use crate::model::SurfaceSnapshot;
use crate::source::SnapshotFilter;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// 一对待比较的快照文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPair {
    /// 相对路径，用作报告标签
    pub label: String,
    pub old_path: PathBuf,
    pub new_path: PathBuf,
}

/// 目录配对结果
#[derive(Debug, Clone, Default)]
pub struct PairDiscovery {
    pub pairs: Vec<SnapshotPair>,
    /// 只存在于旧目录的文件
    pub unmatched_old: Vec<PathBuf>,
    /// 只存在于新目录的文件
    pub unmatched_new: Vec<PathBuf>,
}

/// 单对快照的比较结果
#[derive(Debug, Clone)]
pub struct PairOutcome {
    pub label: String,
    pub result: ComparisonResult,
    pub duration: Duration,
}

/// 批量统计信息
#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    /// 总耗时
    pub total_duration: Duration,
    /// 处理的快照对数量
    pub pairs_processed: usize,
    /// 存在变更的快照对数量
    pub pairs_with_changes: usize,
    /// 失败的快照对数量
    pub failed_pairs: usize,
    /// 平均每对的比较耗时
    pub avg_pair_duration: Duration,
}

/// 批量比较结果
#[derive(Debug)]
pub struct BatchResult {
    /// 成功比较的快照对，顺序与输入一致
    pub outcomes: Vec<PairOutcome>,
    /// 失败的快照对及错误信息
    pub failed: Vec<(String, SurfaceDiffError)>,
    pub stats: BatchStats,
}

impl BatchResult {
    /// 任一结果存在变更
    pub fn has_changes(&self) -> bool {
        self.outcomes
            .iter()
            .any(|outcome| ChangeAggregator::has_changes(&outcome.result))
    }
}

/// 批量比较器
#[derive(Debug, Clone)]
pub struct BatchComparator {
    /// 线程池大小
    thread_pool_size: usize,
    /// 加载后应用的过滤器
    filter: SnapshotFilter,
    engine: DiffEngine,
}

impl Default for BatchComparator {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchComparator {
    /// 创建新的批量比较器，线程数默认为 CPU 核心数
    pub fn new() -> Self {
        Self {
            thread_pool_size: num_cpus::get(),
            filter: SnapshotFilter::default(),
            engine: DiffEngine::new(),
        }
    }

    /// 设置线程池大小
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = size.max(1);
        self
    }

    /// 设置过滤器
    pub fn with_filter(mut self, filter: SnapshotFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn thread_pool_size(&self) -> usize {
        self.thread_pool_size
    }

    fn build_pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.thread_pool_size)
            .build()
            .map_err(|e| SurfaceDiffError::ConfigError(format!("Failed to create thread pool: {e}")))
    }

    /// 并行比较内存中的快照对
    pub fn compare_snapshots(
        &self,
        pairs: &[(SurfaceSnapshot, SurfaceSnapshot)],
    ) -> Result<Vec<ComparisonResult>> {
        let pool = self.build_pool()?;

        let results = pool.install(|| {
            pairs
                .par_iter()
                .map(|(old, new)| {
                    self.engine
                        .compare(&self.filter.apply(old), &self.filter.apply(new))
                })
                .collect()
        });

        Ok(results)
    }

    /// 并行加载并比较快照文件
    ///
    /// 单对失败不会中断其他对的比较，失败信息记录在 `failed` 中
    pub fn compare_files<C>(&self, codec: &C, pairs: &[SnapshotPair]) -> Result<BatchResult>
    where
        C: SnapshotCodec + Sync,
    {
        let start_time = Instant::now();
        info!(
            "Comparing {} snapshot pairs on {} threads",
            pairs.len(),
            self.thread_pool_size
        );

        let pool = self.build_pool()?;
        let results: Vec<_> = pool.install(|| {
            pairs
                .par_iter()
                .map(|pair| self.compare_pair(codec, pair))
                .collect()
        });

        let mut outcomes = Vec::new();
        let mut failed = Vec::new();
        for (pair, result) in pairs.iter().zip(results) {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(error) => {
                    warn!("Failed to compare {}: {}", pair.label, error);
                    failed.push((pair.label.clone(), error));
                }
            }
        }

        let stats = Self::collect_stats(&outcomes, failed.len(), start_time.elapsed());
        info!(
            "Batch finished: {} compared, {} with changes, {} failed, took {:?}",
            stats.pairs_processed, stats.pairs_with_changes, stats.failed_pairs, stats.total_duration
        );

        Ok(BatchResult {
            outcomes,
            failed,
            stats,
        })
    }

    fn compare_pair<C: SnapshotCodec>(&self, codec: &C, pair: &SnapshotPair) -> Result<PairOutcome> {
        let start_time = Instant::now();

        let old = self.filter.apply(&codec.load_from_path(&pair.old_path)?);
        let new = self.filter.apply(&codec.load_from_path(&pair.new_path)?);
        let result = self.engine.compare(&old, &new);

        let duration = start_time.elapsed();
        debug!("Compared {} in {:?}", pair.label, duration);

        Ok(PairOutcome {
            label: pair.label.clone(),
            result,
            duration,
        })
    }

    fn collect_stats(outcomes: &[PairOutcome], failed_pairs: usize, total: Duration) -> BatchStats {
        let pairs_processed = outcomes.len();
        let pairs_with_changes = outcomes
            .iter()
            .filter(|outcome| ChangeAggregator::has_changes(&outcome.result))
            .count();

        let avg_pair_duration = if pairs_processed > 0 {
            outcomes.iter().map(|outcome| outcome.duration).sum::<Duration>()
                / pairs_processed as u32
        } else {
            Duration::ZERO
        };

        BatchStats {
            total_duration: total,
            pairs_processed,
            pairs_with_changes,
            failed_pairs,
            avg_pair_duration,
        }
    }
}

/// 按相对路径配对两个目录中的快照文件
///
/// 只考虑指定扩展名的文件，结果按相对路径排序
pub fn discover_pairs(old_dir: &Path, new_dir: &Path, extension: &str) -> Result<PairDiscovery> {
    let old_files = collect_snapshot_files(old_dir, extension)?;
    let mut new_files = collect_snapshot_files(new_dir, extension)?;

    let mut discovery = PairDiscovery::default();

    for (label, old_path) in old_files {
        match new_files.remove(&label) {
            Some(new_path) => discovery.pairs.push(SnapshotPair {
                label,
                old_path,
                new_path,
            }),
            None => discovery.unmatched_old.push(old_path),
        }
    }
    discovery.unmatched_new = new_files.into_values().collect();

    debug!(
        "Discovered {} pairs ({} only in old, {} only in new)",
        discovery.pairs.len(),
        discovery.unmatched_old.len(),
        discovery.unmatched_new.len()
    );

    Ok(discovery)
}

fn collect_snapshot_files(root: &Path, extension: &str) -> Result<BTreeMap<String, PathBuf>> {
    let mut files = BTreeMap::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| {
            SurfaceDiffError::IoError(std::io::Error::other(format!(
                "Failed to walk {}: {}",
                root.display(),
                e
            )))
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        let label = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.insert(label, path.to_path_buf());
    }

    Ok(files)
}
