//! 快照持久化模块
//!
//! 定义快照的读写接口以及基于 serde_json 的默认实现。持久化格式：
//!
//! ```json
//! {
//!   "assembly": {
//!     "name": "Acme.Core",
//!     "version": "1.2.0",
//!     "types": [
//!       {
//!         "name": "Acme.Core.Widget",
//!         "kind": "class",
//!         "attributes": { "accessibility": "public" },
//!         "members": [
//!           { "signature": "method:Run()", "kind": "method", "attributes": { "return_type": "System.Void" } }
//!         ]
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! 类型和成员的顺序在读写过程中保持不变。

use crate::aggregate::{ChangeAggregator, ChangeSummary};
use crate::diff::ComparisonResult;
use crate::error::{Result, SurfaceDiffError};
use crate::model::{
    Attributes, MemberDescriptor, MemberKind, SurfaceSnapshot, TypeDescriptor, TypeKind,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// 快照编解码接口
pub trait SnapshotCodec {
    /// 读取快照，加载结果不携带任何变更信息
    fn load(&self, reader: &mut dyn Read) -> Result<SurfaceSnapshot>;

    /// 写出快照
    fn save(&self, snapshot: &SurfaceSnapshot, writer: &mut dyn Write) -> Result<()>;

    /// 写出比较结果（快照数据及其变更标注）
    fn save_report(&self, result: &ComparisonResult, writer: &mut dyn Write) -> Result<()>;

    /// 默认文件扩展名
    fn file_extension(&self) -> &'static str;

    /// 从文件读取快照
    fn load_from_path(&self, path: &Path) -> Result<SurfaceSnapshot> {
        let file = File::open(path).map_err(|e| {
            SurfaceDiffError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to open snapshot {}: {}", path.display(), e),
            ))
        })?;
        let mut reader = BufReader::new(file);

        let snapshot = self.load(&mut reader).map_err(|e| match e {
            SurfaceDiffError::MalformedSnapshot(message) => {
                SurfaceDiffError::MalformedSnapshot(format!("{}: {}", path.display(), message))
            }
            other => other,
        })?;

        debug!(
            "Loaded snapshot {} {} from {} ({} types)",
            snapshot.name,
            snapshot.version,
            path.display(),
            snapshot.type_count()
        );
        Ok(snapshot)
    }

    /// 写出快照到文件
    fn save_to_path(&self, snapshot: &SurfaceSnapshot, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| {
            SurfaceDiffError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to create snapshot {}: {}", path.display(), e),
            ))
        })?;
        let mut writer = BufWriter::new(file);
        self.save(snapshot, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// 持久化文档根节点
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotDocument {
    assembly: AssemblyRecord,
}

#[derive(Debug, Serialize, Deserialize)]
struct AssemblyRecord {
    name: String,
    version: String,
    #[serde(default)]
    types: Vec<TypeRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TypeRecord {
    name: String,
    kind: TypeKind,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    attributes: Attributes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    members: Vec<MemberRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MemberRecord {
    signature: String,
    kind: MemberKind,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    attributes: Attributes,
}

/// 比较结果文档
#[derive(Debug, Serialize)]
struct ReportDocument<'a> {
    comparison: &'a ComparisonResult,
    has_changes: bool,
    summary: ChangeSummary,
}

impl From<&SurfaceSnapshot> for SnapshotDocument {
    fn from(snapshot: &SurfaceSnapshot) -> Self {
        let types = snapshot
            .types()
            .map(|t| TypeRecord {
                name: t.qualified_name.clone(),
                kind: t.kind,
                attributes: t.attributes.clone(),
                members: t
                    .members()
                    .map(|m| MemberRecord {
                        signature: m.signature_key.clone(),
                        kind: m.kind,
                        attributes: m.attributes.clone(),
                    })
                    .collect(),
            })
            .collect();

        SnapshotDocument {
            assembly: AssemblyRecord {
                name: snapshot.name.clone(),
                version: snapshot.version.clone(),
                types,
            },
        }
    }
}

impl SnapshotDocument {
    /// 转换为快照，校验身份字段并拒绝重复
    fn into_snapshot(self) -> Result<SurfaceSnapshot> {
        let assembly = self.assembly;
        if assembly.name.trim().is_empty() {
            return Err(SurfaceDiffError::MalformedSnapshot(
                "assembly name cannot be empty".to_string(),
            ));
        }

        let mut snapshot = SurfaceSnapshot::new(assembly.name, assembly.version);

        for (index, record) in assembly.types.into_iter().enumerate() {
            if record.name.trim().is_empty() {
                return Err(SurfaceDiffError::MalformedSnapshot(format!(
                    "type #{index} has an empty name"
                )));
            }

            let mut type_descriptor = TypeDescriptor::new(record.name, record.kind);
            type_descriptor.attributes = record.attributes;

            for member in record.members {
                if member.signature.trim().is_empty() {
                    return Err(SurfaceDiffError::MalformedSnapshot(format!(
                        "member of {} has an empty signature",
                        type_descriptor.qualified_name
                    )));
                }
                let mut descriptor = MemberDescriptor::new(member.signature, member.kind);
                descriptor.attributes = member.attributes;
                type_descriptor.add_member(descriptor)?;
            }

            snapshot.add_type(type_descriptor)?;
        }

        Ok(snapshot)
    }
}

/// 基于 JSON 的快照编解码器
#[derive(Debug, Clone)]
pub struct JsonSnapshotCodec {
    pretty: bool,
}

impl Default for JsonSnapshotCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonSnapshotCodec {
    /// 创建输出带缩进的编解码器
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// 创建输出紧凑格式的编解码器
    pub fn compact() -> Self {
        Self { pretty: false }
    }

    /// 从字符串读取快照
    pub fn load_str(&self, content: &str) -> Result<SurfaceSnapshot> {
        let document: SnapshotDocument = serde_json::from_str(content)?;
        document.into_snapshot()
    }

    /// 把快照写为字符串
    pub fn save_string(&self, snapshot: &SurfaceSnapshot) -> Result<String> {
        let mut buffer = Vec::new();
        self.save(snapshot, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| SurfaceDiffError::MalformedSnapshot(e.to_string()))
    }

    /// 把比较结果写为字符串
    pub fn report_string(&self, result: &ComparisonResult) -> Result<String> {
        let mut buffer = Vec::new();
        self.save_report(result, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| SurfaceDiffError::MalformedSnapshot(e.to_string()))
    }

    fn write_value<T: Serialize>(&self, value: &T, writer: &mut dyn Write) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, value)?;
            writer.write_all(b"\n")?;
        } else {
            serde_json::to_writer(&mut *writer, value)?;
        }
        Ok(())
    }
}

impl SnapshotCodec for JsonSnapshotCodec {
    fn load(&self, reader: &mut dyn Read) -> Result<SurfaceSnapshot> {
        let document: SnapshotDocument = serde_json::from_reader(reader)?;
        document.into_snapshot()
    }

    fn save(&self, snapshot: &SurfaceSnapshot, writer: &mut dyn Write) -> Result<()> {
        self.write_value(&SnapshotDocument::from(snapshot), writer)
    }

    fn save_report(&self, result: &ComparisonResult, writer: &mut dyn Write) -> Result<()> {
        let document = ReportDocument {
            comparison: result,
            has_changes: ChangeAggregator::has_changes(result),
            summary: ChangeAggregator::summarize(result),
        };
        self.write_value(&document, writer)
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }
}
