//! 差异比较模块
//!
//! 按身份键匹配新旧两个快照中的类型和成员，生成独立于输入的结果树。
//! 输入快照只读，比较过程没有 I/O，也不共享可变状态，因此多个比较可以安全并行。

use crate::model::{
    Attributes, MemberDescriptor, MemberKind, SurfaceSnapshot, TypeDescriptor, TypeKind, attr,
};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// 变更种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

impl ChangeKind {
    /// 报告中使用的单字符标记
    pub fn marker(&self) -> char {
        match self {
            ChangeKind::Added => '+',
            ChangeKind::Removed => '-',
            ChangeKind::Modified => '~',
        }
    }
}

/// 单个属性的前后取值，属性只存在于一侧时另一侧为 `None`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeChange {
    pub attribute: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// 附着在某个类型或成员上的一条变更，构造后不可修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    kind: ChangeKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<AttributeChange>,
}

impl Change {
    pub fn added() -> Self {
        Self {
            kind: ChangeKind::Added,
            details: Vec::new(),
        }
    }

    pub fn removed() -> Self {
        Self {
            kind: ChangeKind::Removed,
            details: Vec::new(),
        }
    }

    pub fn modified(details: Vec<AttributeChange>) -> Self {
        Self {
            kind: ChangeKind::Modified,
            details,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn details(&self) -> &[AttributeChange] {
        &self.details
    }
}

/// 结果树中的成员节点
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberDiff {
    pub signature_key: String,
    pub kind: MemberKind,
    #[serde(skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<Change>,
}

impl MemberDiff {
    fn from_descriptor(member: &MemberDescriptor, change: Option<Change>) -> Self {
        Self {
            signature_key: member.signature_key.clone(),
            kind: member.kind,
            attributes: member.attributes.clone(),
            changes: change.into_iter().collect(),
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// 第一条变更的种类
    pub fn change_kind(&self) -> Option<ChangeKind> {
        self.changes.first().map(Change::kind)
    }
}

/// 结果树中的类型节点
///
/// 新增和匹配的类型取新版本的数据，删除的类型取旧版本的数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDiff {
    pub qualified_name: String,
    pub kind: TypeKind,
    #[serde(skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<Change>,
    pub members: Vec<MemberDiff>,
}

impl TypeDiff {
    /// 新增或删除的类型：成员按原样列出，不单独标记
    fn from_descriptor(type_descriptor: &TypeDescriptor, change: Change) -> Self {
        Self {
            qualified_name: type_descriptor.qualified_name.clone(),
            kind: type_descriptor.kind,
            attributes: type_descriptor.attributes.clone(),
            changes: vec![change],
            members: type_descriptor
                .members()
                .map(|member| MemberDiff::from_descriptor(member, None))
                .collect(),
        }
    }

    pub fn change_kind(&self) -> Option<ChangeKind> {
        self.changes.first().map(Change::kind)
    }

    /// 类型自身或任一成员有变更
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty() || self.members.iter().any(MemberDiff::has_changes)
    }

    /// 有变更的成员
    pub fn changed_members(&self) -> impl Iterator<Item = &MemberDiff> {
        self.members.iter().filter(|member| member.has_changes())
    }
}

/// 两个快照的比较结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonResult {
    pub name: String,
    pub old_version: String,
    pub new_version: String,
    pub types: Vec<TypeDiff>,
}

impl ComparisonResult {
    pub fn find_type(&self, qualified_name: &str) -> Option<&TypeDiff> {
        self.types
            .iter()
            .find(|type_diff| type_diff.qualified_name == qualified_name)
    }

    /// 有变更的类型
    pub fn changed_types(&self) -> impl Iterator<Item = &TypeDiff> {
        self.types.iter().filter(|type_diff| type_diff.has_changes())
    }
}

/// 差异比较引擎
///
/// 纯函数式：同一对输入总是产生相同顺序的相同结果
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffEngine;

impl DiffEngine {
    pub fn new() -> Self {
        Self
    }

    /// 比较旧快照和新快照
    ///
    /// 匹配和新增的类型按新快照顺序排列，删除的类型按旧快照顺序追加在最后。
    /// 不做重命名检测：改名的类型表现为一次删除加一次新增。
    pub fn compare(&self, old: &SurfaceSnapshot, new: &SurfaceSnapshot) -> ComparisonResult {
        let mut types = Vec::with_capacity(new.type_count());

        for new_type in new.types() {
            let type_diff = match old.find_type(&new_type.qualified_name) {
                Some(old_type) => self.compare_types(old_type, new_type),
                None => TypeDiff::from_descriptor(new_type, Change::added()),
            };
            types.push(type_diff);
        }

        for old_type in old.types() {
            if new.find_type(&old_type.qualified_name).is_none() {
                types.push(TypeDiff::from_descriptor(old_type, Change::removed()));
            }
        }

        debug!(
            "Compared {} {} -> {}: {} types in result",
            new.name,
            old.version,
            new.version,
            types.len()
        );

        ComparisonResult {
            name: new.name.clone(),
            old_version: old.version.clone(),
            new_version: new.version.clone(),
            types,
        }
    }

    /// 比较同名类型：类型自身属性 + 成员匹配
    fn compare_types(&self, old: &TypeDescriptor, new: &TypeDescriptor) -> TypeDiff {
        let details = attribute_changes(
            old.kind.as_str(),
            new.kind.as_str(),
            &old.attributes,
            &new.attributes,
        );

        let mut members = Vec::with_capacity(new.member_count());

        for new_member in new.members() {
            let change = match old.find_member(&new_member.signature_key) {
                Some(old_member) => compare_members(old_member, new_member),
                None => Some(Change::added()),
            };
            members.push(MemberDiff::from_descriptor(new_member, change));
        }

        for old_member in old.members() {
            if new.find_member(&old_member.signature_key).is_none() {
                members.push(MemberDiff::from_descriptor(old_member, Some(Change::removed())));
            }
        }

        TypeDiff {
            qualified_name: new.qualified_name.clone(),
            kind: new.kind,
            attributes: new.attributes.clone(),
            changes: modified_if_any(details).into_iter().collect(),
            members,
        }
    }
}

/// 比较两个快照的便捷函数
pub fn compare(old: &SurfaceSnapshot, new: &SurfaceSnapshot) -> ComparisonResult {
    DiffEngine::new().compare(old, new)
}

/// 同签名成员的所有差异属性合并为一条 `Modified`
fn compare_members(old: &MemberDescriptor, new: &MemberDescriptor) -> Option<Change> {
    modified_if_any(attribute_changes(
        old.kind.as_str(),
        new.kind.as_str(),
        &old.attributes,
        &new.attributes,
    ))
}

fn modified_if_any(details: Vec<AttributeChange>) -> Option<Change> {
    if details.is_empty() {
        None
    } else {
        Some(Change::modified(details))
    }
}

/// 计算属性差异：种类在前，其余属性按名称排序
fn attribute_changes(
    old_kind: &str,
    new_kind: &str,
    old: &Attributes,
    new: &Attributes,
) -> Vec<AttributeChange> {
    let mut details = Vec::new();

    if old_kind != new_kind {
        details.push(AttributeChange {
            attribute: attr::KIND.to_string(),
            old_value: Some(old_kind.to_string()),
            new_value: Some(new_kind.to_string()),
        });
    }

    let names: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    for name in names {
        let old_value = old.get(name);
        let new_value = new.get(name);
        if old_value != new_value {
            details.push(AttributeChange {
                attribute: name.clone(),
                old_value: old_value.cloned(),
                new_value: new_value.cloned(),
            });
        }
    }

    details
}
