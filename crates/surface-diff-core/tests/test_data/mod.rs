//! 测试数据集模块
//!
//! 提供一个小型 HTTP 客户端库两个版本的原始 API 表面

#![allow(dead_code)]

use surface_diff_core::{
    Attributes, InMemorySource, MemberDescriptor, MemberKind, RawMember, RawType, TypeKind, attr,
};

/// 构造原始成员
pub fn member(kind: MemberKind, name: &str, params: &[&str], attrs: &[(&str, &str)]) -> RawMember {
    RawMember {
        signature_key: MemberDescriptor::signature_key_for(kind, name, params),
        kind,
        is_public: true,
        attributes: attributes(attrs),
    }
}

/// 构造非公开原始成员
pub fn hidden_member(kind: MemberKind, name: &str) -> RawMember {
    RawMember {
        is_public: false,
        ..member(kind, name, &[], &[])
    }
}

/// 构造原始类型
pub fn raw_type(name: &str, kind: TypeKind, members: Vec<RawMember>) -> RawType {
    RawType {
        qualified_name: name.to_string(),
        kind,
        is_public: true,
        attributes: attributes(&[(attr::ACCESSIBILITY, "public")]),
        members,
    }
}

pub fn attributes(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// 1.0.0 版本的 API 表面
pub fn http_v1() -> InMemorySource {
    InMemorySource {
        name: "Acme.Http".to_string(),
        version: "1.0.0".to_string(),
        types: vec![
            raw_type(
                "Acme.Http.HttpClient",
                TypeKind::Class,
                vec![
                    member(MemberKind::Constructor, ".ctor", &[], &[]),
                    member(
                        MemberKind::Method,
                        "Get",
                        &["System.String"],
                        &[(attr::RETURN_TYPE, "Acme.Http.Response")],
                    ),
                    member(
                        MemberKind::Method,
                        "Send",
                        &["Acme.Http.Request"],
                        &[(attr::RETURN_TYPE, "Acme.Http.Response")],
                    ),
                    member(
                        MemberKind::Property,
                        "Timeout",
                        &[],
                        &[(attr::RETURN_TYPE, "System.Int32")],
                    ),
                    hidden_member(MemberKind::Field, "_pool"),
                ],
            ),
            raw_type(
                "Acme.Http.Request",
                TypeKind::Class,
                vec![member(
                    MemberKind::Property,
                    "Url",
                    &[],
                    &[(attr::RETURN_TYPE, "System.String")],
                )],
            ),
            raw_type(
                "Acme.Http.Response",
                TypeKind::Class,
                vec![member(
                    MemberKind::Property,
                    "StatusCode",
                    &[],
                    &[(attr::RETURN_TYPE, "System.Int32")],
                )],
            ),
            raw_type(
                "Acme.Http.IRetryPolicy",
                TypeKind::Interface,
                vec![member(
                    MemberKind::Method,
                    "ShouldRetry",
                    &["System.Int32"],
                    &[(attr::RETURN_TYPE, "System.Boolean")],
                )],
            ),
            raw_type("Acme.Http.LegacyProxy", TypeKind::Class, vec![]),
            RawType {
                is_public: false,
                ..raw_type("Acme.Http.ConnectionPool", TypeKind::Class, vec![])
            },
        ],
    }
}

/// 2.0.0 版本的 API 表面
///
/// - HttpClient: Get 新增重载，Send 被删除，Timeout 返回类型改变并标记过时
/// - Response: 不变
/// - IRetryPolicy: 从接口变为类
/// - LegacyProxy: 删除
/// - Headers: 新增
/// - Generated.Serializers: 新增但属于生成代码
pub fn http_v2() -> InMemorySource {
    InMemorySource {
        name: "Acme.Http".to_string(),
        version: "2.0.0".to_string(),
        types: vec![
            raw_type(
                "Acme.Http.HttpClient",
                TypeKind::Class,
                vec![
                    member(MemberKind::Constructor, ".ctor", &[], &[]),
                    member(
                        MemberKind::Method,
                        "Get",
                        &["System.String"],
                        &[(attr::RETURN_TYPE, "Acme.Http.Response")],
                    ),
                    member(
                        MemberKind::Method,
                        "Get",
                        &["System.Uri"],
                        &[(attr::RETURN_TYPE, "Acme.Http.Response")],
                    ),
                    member(
                        MemberKind::Property,
                        "Timeout",
                        &[],
                        &[
                            (attr::RETURN_TYPE, "System.TimeSpan"),
                            (attr::OBSOLETE, "true"),
                        ],
                    ),
                    hidden_member(MemberKind::Field, "_pool"),
                ],
            ),
            raw_type(
                "Acme.Http.Request",
                TypeKind::Class,
                vec![member(
                    MemberKind::Property,
                    "Url",
                    &[],
                    &[(attr::RETURN_TYPE, "System.String")],
                )],
            ),
            raw_type(
                "Acme.Http.Headers",
                TypeKind::Class,
                vec![member(
                    MemberKind::Method,
                    "Add",
                    &["System.String", "System.String"],
                    &[(attr::RETURN_TYPE, "System.Void")],
                )],
            ),
            raw_type(
                "Acme.Http.Response",
                TypeKind::Class,
                vec![member(
                    MemberKind::Property,
                    "StatusCode",
                    &[],
                    &[(attr::RETURN_TYPE, "System.Int32")],
                )],
            ),
            raw_type(
                "Acme.Http.IRetryPolicy",
                TypeKind::Class,
                vec![member(
                    MemberKind::Method,
                    "ShouldRetry",
                    &["System.Int32"],
                    &[(attr::RETURN_TYPE, "System.Boolean")],
                )],
            ),
            raw_type("Acme.Http.Generated.Serializers", TypeKind::Class, vec![]),
        ],
    }
}
