//! # iam-atlas - Indexed AWS IAM Authorization Exports
//!
//! `iam-atlas` turns the document returned by
//! `aws iam get-account-authorization-details` into an immutable,
//! cross-referenced model of users, roles, managed policies and groups:
//!
//! - **Point lookups** by entity ID or by ARN
//! - **Attachment** in both directions (policy to identities, identity to policies)
//! - **Membership** in both directions (group to users, user to groups)
//! - **Trust**: which roles a user can assume, and who can assume a role
//! - **Default policy versions**, categorization and search
//!
//! ## Quick Start
//!
//! ```rust
//! use iam_atlas::normalize;
//! use serde_json::json;
//!
//! let export = json!({
//!     "UserDetailList": [{
//!         "UserId": "AIDA1",
//!         "UserName": "alice",
//!         "Arn": "arn:aws:iam::123456789012:user/alice",
//!         "GroupList": ["admins"]
//!     }],
//!     "GroupDetailList": [{"GroupId": "AGPA1", "GroupName": "admins"}],
//!     "RoleDetailList": [{
//!         "RoleId": "AROA1",
//!         "RoleName": "ops",
//!         "AssumeRolePolicyDocument": {"Statement": [{
//!             "Effect": "Allow",
//!             "Principal": {"AWS": "arn:aws:iam::123456789012:user/alice"}
//!         }]}
//!     }]
//! });
//!
//! let model = normalize(&export);
//! let resolver = model.resolver();
//! let alice = model.user("AIDA1").unwrap();
//!
//! assert_eq!(resolver.groups_of(alice)[0].group_id, "AGPA1");
//! assert_eq!(resolver.assumable_roles_for(alice)[0].role_id, "AROA1");
//! ```
//!
//! ## Loading From Disk
//!
//! ```rust,no_run
//! use iam_atlas::{AtlasConfig, ExportLoader, Result};
//!
//! # fn main() -> Result<()> {
//! let config = AtlasConfig::load("atlas.toml")?;
//! let model = ExportLoader::new(config).load_path("authorization-details.json")?;
//! println!("{} roles", model.roles().len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod loader;

pub use crate::config::AtlasConfig;
pub use crate::core::{
    catalog::{search, ModelSummary, PolicyCategory, RoleCategory, SearchHits},
    entity::{
        AttachedPolicy, AttachmentSubject, Entity, EntityKind, EntityRef, Group, Policy,
        PolicyVersion, Role, User,
    },
    iam::{AwsPrincipal, Effect, TrustPolicy, TrustStatement},
    model::{ArnCollision, AuthorizationModel, EntityMap},
    normalize::{normalize, normalize_with, DuplicateIdPolicy, NormalizeOptions},
    resolver::{
        AttachedEntities, GroupDetails, PolicyDetails, RelatedEntities, Resolver, RoleDetails,
        UserDetails,
    },
};
pub use crate::error::{AtlasError, Result};
pub use crate::loader::ExportLoader;
