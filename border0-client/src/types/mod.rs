//! Wire types of the Border0 REST API

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A string value that names no variant of a discriminator enum
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported {kind} \"{value}\"")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Define a discriminator enum with its wire strings
///
/// Decoding goes through `FromStr`, so a value the client does not know
/// fails with the same [`UnknownVariant`] message the provider reports.
macro_rules! string_enum {
    (
        $(#[$meta:meta])* $name:ident, $kind:literal {
            $($variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "String")]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            /// Every wire value, in declaration order
            pub const ALL: &'static [&'static str] = &[$($value),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::types::UnknownVariant;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::types::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok(Self::$variant),)+
                    other => Err($crate::types::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

pub mod service;

pub use service::*;

string_enum!(
    /// Kind of access endpoint a socket exposes
    SocketType, "socket type" {
        Http => "http",
        Ssh => "ssh",
        Tls => "tls",
        Database => "database",
        Kubernetes => "kubernetes",
        Rdp => "rdp",
        Vnc => "vnc",
        Vpn => "vpn",
        AwsS3 => "aws_s3",
        Snowflake => "snowflake",
        Elasticsearch => "elasticsearch",
        SubnetRouter => "subnet_router",
        ExitNode => "exit_node",
    }
);

/// A named access endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Socket {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub socket_id: String,
    pub name: String,
    pub socket_type: SocketType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recording_enabled: bool,
    #[serde(default)]
    pub connector_authentication_enabled: bool,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_configuration: Option<ServiceConfiguration>,
}

/// A named authorization document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub org_wide: bool,
    #[serde(default = "default_policy_version")]
    pub version: String,
    pub policy_data: serde_json::Value,
}

fn default_policy_version() -> String {
    "v1".to_string()
}

/// A deployable agent handle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub connector_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Credential issued for a connector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectorToken {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub connector_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Only present in the create response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Organization member
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub role: String,
}

/// A user as listed inside a group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
}

/// Named set of users
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<GroupMember>,
}

impl Group {
    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }
}

/// Non-human principal, identified by its name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceAccount {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub role: String,
    #[serde(default)]
    pub active: bool,
}

/// Credential issued for a service account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceAccountToken {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Only present in the create response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// One page of a listing (pages are 1-based)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub list: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Number of the following page, if any
    pub fn next_page(&self) -> Option<u32> {
        (self.pagination.current_page < self.pagination.total_pages)
            .then_some(self.pagination.current_page + 1)
    }
}
