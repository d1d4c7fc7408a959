//! 快照构建模块
//!
//! 提取器（反射、元数据读取等）位于本库之外，通过 [`SurfaceSource`] 接口提供原始条目；
//! [`SnapshotBuilder`] 负责过滤非公开条目和被排除的类型，并保证身份唯一。

use crate::error::Result;
use crate::model::{
    Attributes, MemberDescriptor, MemberKind, SurfaceSnapshot, TypeDescriptor, TypeKind,
};
use regex::Regex;
use tracing::debug;

/// 提取器产生的原始成员
#[derive(Debug, Clone)]
pub struct RawMember {
    pub signature_key: String,
    pub kind: MemberKind,
    pub is_public: bool,
    pub attributes: Attributes,
}

/// 提取器产生的原始类型
#[derive(Debug, Clone)]
pub struct RawType {
    pub qualified_name: String,
    pub kind: TypeKind,
    pub is_public: bool,
    pub attributes: Attributes,
    pub members: Vec<RawMember>,
}

/// API 表面提取接口
///
/// 每种生态系统（反射、二进制元数据解析、编译器插件）各自实现
pub trait SurfaceSource {
    /// 程序集名称
    fn assembly_name(&self) -> &str;

    /// 程序集版本
    fn assembly_version(&self) -> &str;

    /// 按声明顺序返回全部类型（包括非公开类型）
    fn raw_types(&self) -> Result<Vec<RawType>>;
}

/// 内存中的表面描述，主要供测试和上层工具直接构造使用
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    pub name: String,
    pub version: String,
    pub types: Vec<RawType>,
}

impl SurfaceSource for InMemorySource {
    fn assembly_name(&self) -> &str {
        &self.name
    }

    fn assembly_version(&self) -> &str {
        &self.version
    }

    fn raw_types(&self) -> Result<Vec<RawType>> {
        Ok(self.types.clone())
    }
}

/// 快照过滤配置
///
/// 排除模式作为显式值传入构建过程，不使用任何全局状态
#[derive(Debug, Clone, Default)]
pub struct SnapshotFilter {
    exclude: Option<Regex>,
    include_non_public: bool,
}

impl SnapshotFilter {
    /// 根据可选的排除正则创建过滤器，空字符串视为未设置
    pub fn new(exclude_pattern: Option<&str>) -> Result<Self> {
        let exclude = match exclude_pattern {
            Some(pattern) if !pattern.is_empty() => Some(Regex::new(pattern)?),
            _ => None,
        };

        Ok(Self {
            exclude,
            include_non_public: false,
        })
    }

    /// 是否保留非公开条目
    pub fn include_non_public(mut self, include: bool) -> Self {
        self.include_non_public = include;
        self
    }

    pub fn exclude_pattern(&self) -> Option<&str> {
        self.exclude.as_ref().map(Regex::as_str)
    }

    /// 判断限定名是否匹配排除模式
    pub fn is_excluded(&self, qualified_name: &str) -> bool {
        self.exclude
            .as_ref()
            .is_some_and(|regex| regex.is_match(qualified_name))
    }

    fn accepts_type(&self, raw: &RawType) -> bool {
        (raw.is_public || self.include_non_public) && !self.is_excluded(&raw.qualified_name)
    }

    fn accepts_member(&self, raw: &RawMember) -> bool {
        raw.is_public || self.include_non_public
    }

    /// 对已经存在的快照（例如从文件加载）重新应用排除模式
    pub fn apply(&self, snapshot: &SurfaceSnapshot) -> SurfaceSnapshot {
        let mut filtered = snapshot.clone();
        if self.exclude.is_some() {
            filtered.retain_types(|t| !self.is_excluded(&t.qualified_name));
            debug!(
                "Exclusion filter removed {} types from {}",
                snapshot.type_count() - filtered.type_count(),
                snapshot.name
            );
        }
        filtered
    }
}

/// 快照构建器
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    filter: SnapshotFilter,
}

impl SnapshotBuilder {
    pub fn new(filter: SnapshotFilter) -> Self {
        Self { filter }
    }

    /// 从提取源构建快照
    ///
    /// 非公开和被排除的条目被静默丢弃；重复的身份键返回 `DuplicateIdentity`
    pub fn build(&self, source: &dyn SurfaceSource) -> Result<SurfaceSnapshot> {
        let mut snapshot =
            SurfaceSnapshot::new(source.assembly_name(), source.assembly_version());
        let mut skipped = 0usize;

        for raw in source.raw_types()? {
            if !self.filter.accepts_type(&raw) {
                skipped += 1;
                continue;
            }

            let mut type_descriptor = TypeDescriptor::new(raw.qualified_name, raw.kind);
            type_descriptor.attributes = raw.attributes;

            for raw_member in raw.members {
                if !self.filter.accepts_member(&raw_member) {
                    continue;
                }
                let mut member = MemberDescriptor::new(raw_member.signature_key, raw_member.kind);
                member.attributes = raw_member.attributes;
                type_descriptor.add_member(member)?;
            }

            snapshot.add_type(type_descriptor)?;
        }

        debug!(
            "Built snapshot {} {}: {} types kept, {} skipped",
            snapshot.name,
            snapshot.version,
            snapshot.type_count(),
            skipped
        );

        Ok(snapshot)
    }
}
