//! API 表面快照数据模型
//!
//! 定义 程序集 → 类型 → 成员 三层结构。每一层按身份键保持插入顺序且唯一，
//! 快照构建完成后不再修改，比较结果单独存放在 [`crate::diff`] 中。

use crate::error::{Result, SurfaceDiffError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 属性名到属性值的映射，按名称排序以保证比较结果稳定
pub type Attributes = BTreeMap<String, String>;

/// 常用属性名
pub mod attr {
    pub const KIND: &str = "kind";
    pub const ACCESSIBILITY: &str = "accessibility";
    pub const RETURN_TYPE: &str = "return_type";
    pub const STATIC: &str = "static";
    pub const OBSOLETE: &str = "obsolete";
    pub const VIRTUAL: &str = "virtual";
    pub const ABSTRACT: &str = "abstract";
    pub const SEALED: &str = "sealed";
    pub const BASE_TYPE: &str = "base_type";
}

/// 类型种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
    Struct,
    Enum,
    Delegate,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Struct => "struct",
            TypeKind::Enum => "enum",
            TypeKind::Delegate => "delegate",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 成员种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Method,
    Property,
    Field,
    Event,
    Constructor,
}

impl MemberKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::Method => "method",
            MemberKind::Property => "property",
            MemberKind::Field => "field",
            MemberKind::Event => "event",
            MemberKind::Constructor => "constructor",
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 公开成员描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDescriptor {
    pub signature_key: String,
    pub kind: MemberKind,
    pub attributes: Attributes,
}

impl MemberDescriptor {
    pub fn new(signature_key: impl Into<String>, kind: MemberKind) -> Self {
        Self {
            signature_key: signature_key.into(),
            kind,
            attributes: Attributes::new(),
        }
    }

    /// 以链式方式追加属性
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// 生成规范化签名键
    ///
    /// 格式为 `kind:Name(ParamType1,ParamType2)`，字段和事件没有参数列表。
    /// 种类和参数类型都参与身份，足以区分重载。
    pub fn signature_key_for(kind: MemberKind, name: &str, parameters: &[&str]) -> String {
        match kind {
            MemberKind::Field | MemberKind::Event => format!("{kind}:{name}"),
            MemberKind::Property if parameters.is_empty() => format!("{kind}:{name}"),
            _ => format!("{kind}:{name}({})", parameters.join(",")),
        }
    }
}

/// 公开类型描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub qualified_name: String,
    pub kind: TypeKind,
    pub attributes: Attributes,
    members: IndexMap<String, MemberDescriptor>,
}

impl TypeDescriptor {
    pub fn new(qualified_name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            kind,
            attributes: Attributes::new(),
            members: IndexMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// 添加成员，签名键重复时返回 `DuplicateIdentity`
    pub fn add_member(&mut self, member: MemberDescriptor) -> Result<()> {
        if self.members.contains_key(&member.signature_key) {
            return Err(SurfaceDiffError::duplicate(
                &self.qualified_name,
                member.signature_key,
            ));
        }
        self.members.insert(member.signature_key.clone(), member);
        Ok(())
    }

    /// 链式添加成员，便于测试和构建器使用
    pub fn with_member(mut self, member: MemberDescriptor) -> Result<Self> {
        self.add_member(member)?;
        Ok(self)
    }

    pub fn find_member(&self, signature_key: &str) -> Option<&MemberDescriptor> {
        self.members.get(signature_key)
    }

    /// 按插入顺序遍历成员
    pub fn members(&self) -> impl ExactSizeIterator<Item = &MemberDescriptor> {
        self.members.values()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// 一个程序集在某个版本上的公开 API 表面
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceSnapshot {
    pub name: String,
    pub version: String,
    types: IndexMap<String, TypeDescriptor>,
}

impl SurfaceSnapshot {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            types: IndexMap::new(),
        }
    }

    /// 添加类型，限定名重复时返回 `DuplicateIdentity`
    pub fn add_type(&mut self, type_descriptor: TypeDescriptor) -> Result<()> {
        if self.types.contains_key(&type_descriptor.qualified_name) {
            return Err(SurfaceDiffError::duplicate(
                &self.name,
                type_descriptor.qualified_name,
            ));
        }
        self.types
            .insert(type_descriptor.qualified_name.clone(), type_descriptor);
        Ok(())
    }

    pub fn find_type(&self, qualified_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(qualified_name)
    }

    /// 按插入顺序遍历类型
    pub fn types(&self) -> impl ExactSizeIterator<Item = &TypeDescriptor> {
        self.types.values()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn member_count(&self) -> usize {
        self.types.values().map(TypeDescriptor::member_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// 只保留满足条件的类型，顺序不变
    pub(crate) fn retain_types<F>(&mut self, mut keep: F)
    where
        F: FnMut(&TypeDescriptor) -> bool,
    {
        self.types.retain(|_, type_descriptor| keep(type_descriptor));
    }
}
