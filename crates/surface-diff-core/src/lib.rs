//! surface-diff-core - 公开 API 表面快照与差异比较核心库
//!
//! 捕获程序集公开 API 表面（类型及其成员）的快照，比较两个版本的快照，
//! 生成新增、删除、修改的结构化报告，供变更日志生成和语义化版本判断使用。

pub mod aggregate;
pub mod batch;
pub mod codec;
pub mod diff;
pub mod error;
pub mod formatter;
pub mod model;
pub mod source;

// 重新导出主要的公共 API
pub use aggregate::{ChangeAggregator, ChangeSummary, has_changes};
pub use batch::{
    BatchComparator, BatchResult, BatchStats, PairDiscovery, PairOutcome, SnapshotPair,
    discover_pairs,
};
pub use codec::{JsonSnapshotCodec, SnapshotCodec};
pub use diff::{
    AttributeChange, Change, ChangeKind, ComparisonResult, DiffEngine, MemberDiff, TypeDiff,
    compare,
};
pub use error::{Result, SurfaceDiffError};
pub use formatter::{
    ColorTheme, FormattedOutput, FormatterConfig, OutputFormat, OutputMetadata, ReportRenderer,
};
pub use model::{
    Attributes, MemberDescriptor, MemberKind, SurfaceSnapshot, TypeDescriptor, TypeKind, attr,
};
pub use source::{
    InMemorySource, RawMember, RawType, SnapshotBuilder, SnapshotFilter, SurfaceSource,
};
