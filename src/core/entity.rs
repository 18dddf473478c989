//! Entity records of an IAM authorization export
//!
//! Every record carries every field the export declares. Fields the export
//! omitted are defaulted by the normalizer, so presentation code never has
//! to distinguish "missing" from "empty" for list fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The four entity kinds of an authorization export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Role,
    Policy,
    Group,
}

impl EntityKind {
    /// All kinds, in the order the export lists them
    pub const ALL: [EntityKind; 4] = [
        EntityKind::User,
        EntityKind::Role,
        EntityKind::Policy,
        EntityKind::Group,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Role => "role",
            EntityKind::Policy => "policy",
            EntityKind::Group => "group",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" | "users" => Ok(EntityKind::User),
            "role" | "roles" => Ok(EntityKind::Role),
            "policy" | "policies" => Ok(EntityKind::Policy),
            "group" | "groups" => Ok(EntityKind::Group),
            _ => Err(format!(
                "Invalid entity kind '{}'. Valid options: user, role, policy, group",
                s
            )),
        }
    }
}

/// Reference from a user, role or group to a managed policy
///
/// Attachments name the policy by ARN; the policy ID never appears here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttachedPolicy {
    pub policy_arn: Option<String>,
    pub policy_name: Option<String>,
}

/// One stored version of a managed policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyVersion {
    pub version_id: Option<String>,
    pub document: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default_version: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_date: Option<String>,
}

/// IAM user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    pub user_id: String,
    pub user_name: Option<String>,
    pub arn: Option<String>,
    pub create_date: Option<String>,
    pub attached_managed_policies: Vec<AttachedPolicy>,
    /// Group NAMES, not group IDs
    pub group_list: Vec<String>,
    pub user_policy_list: Vec<Value>,
    pub tags: Vec<Value>,
}

/// IAM role
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Role {
    pub role_id: String,
    pub role_name: Option<String>,
    pub arn: Option<String>,
    pub create_date: Option<String>,
    /// Trust policy, kept verbatim. Read it through [`crate::core::iam::TrustPolicy`].
    pub assume_role_policy_document: Value,
    pub attached_managed_policies: Vec<AttachedPolicy>,
    pub role_policy_list: Vec<Value>,
    pub tags: Vec<Value>,
}

/// Managed policy
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Policy {
    pub policy_id: String,
    pub policy_name: Option<String>,
    pub arn: Option<String>,
    pub create_date: Option<String>,
    pub default_version_id: Option<String>,
    pub policy_version_list: Vec<PolicyVersion>,
    pub attachment_count: Option<u64>,
    pub is_attachable: Option<bool>,
    pub description: String,
}

impl Policy {
    /// The version whose `VersionId` equals `DefaultVersionId`
    ///
    /// First match wins. `None` when the policy declares no default version,
    /// the list is empty, or no entry matches.
    pub fn default_version(&self) -> Option<&PolicyVersion> {
        let default_id = self.default_version_id.as_deref()?;
        self.policy_version_list
            .iter()
            .find(|version| version.version_id.as_deref() == Some(default_id))
    }

    /// Document of the default version, if any
    pub fn default_document(&self) -> Option<&Value> {
        self.default_version()
            .and_then(|version| version.document.as_ref())
    }
}

/// IAM group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Group {
    pub group_id: String,
    /// Users reference groups by this name
    pub group_name: Option<String>,
    pub arn: Option<String>,
    pub create_date: Option<String>,
    pub attached_managed_policies: Vec<AttachedPolicy>,
    pub group_policy_list: Vec<Value>,
}

/// Common surface of the four entity records
pub trait Entity {
    const KIND: EntityKind;

    /// Stable key under which the model stores this entity
    fn id(&self) -> &str;

    fn name(&self) -> Option<&str>;

    fn arn(&self) -> Option<&str>;

    fn create_date(&self) -> Option<&str>;

    /// `CreateDate` parsed as RFC 3339, `None` when absent or unparseable
    fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.create_date()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Entities that can carry managed-policy attachments
pub trait AttachmentSubject: Entity {
    fn attached_managed_policies(&self) -> &[AttachedPolicy];

    /// Whether any attachment references `policy_arn`
    fn is_attached_to(&self, policy_arn: &str) -> bool {
        self.attached_managed_policies()
            .iter()
            .any(|attachment| attachment.policy_arn.as_deref() == Some(policy_arn))
    }
}

macro_rules! impl_entity {
    ($ty:ty, $kind:expr, $id:ident, $name:ident) => {
        impl Entity for $ty {
            const KIND: EntityKind = $kind;

            fn id(&self) -> &str {
                &self.$id
            }

            fn name(&self) -> Option<&str> {
                self.$name.as_deref()
            }

            fn arn(&self) -> Option<&str> {
                self.arn.as_deref()
            }

            fn create_date(&self) -> Option<&str> {
                self.create_date.as_deref()
            }
        }
    };
}

impl_entity!(User, EntityKind::User, user_id, user_name);
impl_entity!(Role, EntityKind::Role, role_id, role_name);
impl_entity!(Policy, EntityKind::Policy, policy_id, policy_name);
impl_entity!(Group, EntityKind::Group, group_id, group_name);

impl AttachmentSubject for User {
    fn attached_managed_policies(&self) -> &[AttachedPolicy] {
        &self.attached_managed_policies
    }
}

impl AttachmentSubject for Role {
    fn attached_managed_policies(&self) -> &[AttachedPolicy] {
        &self.attached_managed_policies
    }
}

impl AttachmentSubject for Group {
    fn attached_managed_policies(&self) -> &[AttachedPolicy] {
        &self.attached_managed_policies
    }
}

/// Borrowed reference to an entity of any kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "entity", rename_all = "lowercase")]
pub enum EntityRef<'a> {
    User(&'a User),
    Role(&'a Role),
    Policy(&'a Policy),
    Group(&'a Group),
}

impl<'a> EntityRef<'a> {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::User(_) => EntityKind::User,
            EntityRef::Role(_) => EntityKind::Role,
            EntityRef::Policy(_) => EntityKind::Policy,
            EntityRef::Group(_) => EntityKind::Group,
        }
    }

    pub fn id(&self) -> &'a str {
        match *self {
            EntityRef::User(u) => u.id(),
            EntityRef::Role(r) => r.id(),
            EntityRef::Policy(p) => p.id(),
            EntityRef::Group(g) => g.id(),
        }
    }

    pub fn name(&self) -> Option<&'a str> {
        match *self {
            EntityRef::User(u) => u.name(),
            EntityRef::Role(r) => r.name(),
            EntityRef::Policy(p) => p.name(),
            EntityRef::Group(g) => g.name(),
        }
    }

    pub fn arn(&self) -> Option<&'a str> {
        match *self {
            EntityRef::User(u) => u.arn(),
            EntityRef::Role(r) => r.arn(),
            EntityRef::Policy(p) => p.arn(),
            EntityRef::Group(g) => g.arn(),
        }
    }
}
