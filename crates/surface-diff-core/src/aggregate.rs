//! 变更汇总模块
//!
//! 在比较结果树上做只读遍历，把成员级别的变更向上汇总到类型和程序集。

use crate::diff::{ChangeKind, ComparisonResult, TypeDiff};
use serde::Serialize;

/// 变更汇总器
pub struct ChangeAggregator;

/// 变更统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub types_added: usize,
    pub types_removed: usize,
    pub types_modified: usize,
    pub members_added: usize,
    pub members_removed: usize,
    pub members_modified: usize,
    /// 自身或成员有变更的类型数量
    pub types_with_changes: usize,
}

impl ChangeSummary {
    pub fn total_type_changes(&self) -> usize {
        self.types_added + self.types_removed + self.types_modified
    }

    pub fn total_member_changes(&self) -> usize {
        self.members_added + self.members_removed + self.members_modified
    }

    pub fn is_empty(&self) -> bool {
        self.total_type_changes() == 0 && self.total_member_changes() == 0
    }
}

impl ChangeAggregator {
    /// 任一类型或任一成员带有变更即返回 true，找到第一处即停止遍历
    pub fn has_changes(result: &ComparisonResult) -> bool {
        result.types.iter().any(TypeDiff::has_changes)
    }

    /// 单个类型的变更状态
    pub fn type_has_changes(type_diff: &TypeDiff) -> bool {
        type_diff.has_changes()
    }

    /// 统计各类变更数量
    pub fn summarize(result: &ComparisonResult) -> ChangeSummary {
        let mut summary = ChangeSummary::default();

        for type_diff in &result.types {
            for change in &type_diff.changes {
                match change.kind() {
                    ChangeKind::Added => summary.types_added += 1,
                    ChangeKind::Removed => summary.types_removed += 1,
                    ChangeKind::Modified => summary.types_modified += 1,
                }
            }

            for member in &type_diff.members {
                for change in &member.changes {
                    match change.kind() {
                        ChangeKind::Added => summary.members_added += 1,
                        ChangeKind::Removed => summary.members_removed += 1,
                        ChangeKind::Modified => summary.members_modified += 1,
                    }
                }
            }

            if type_diff.has_changes() {
                summary.types_with_changes += 1;
            }
        }

        summary
    }
}

/// 等价于 [`ChangeAggregator::has_changes`]
pub fn has_changes(result: &ComparisonResult) -> bool {
    ChangeAggregator::has_changes(result)
}
