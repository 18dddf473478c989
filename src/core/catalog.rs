//! Catalog views: categorization, search and summary counts
//!
//! Roles and policies are bucketed by ARN shape the way AWS lays them out:
//! - Service-linked roles live under `role/aws-service-role/`
//! - AWS managed policies live in the `aws` account (`::aws:policy/`)
//! - Service-role policies live under `policy/service-role/` or
//!   `::aws:policy/aws-service-role/`

use super::entity::{Entity, Group, Policy, Role, User};
use super::model::AuthorizationModel;
use serde::Serialize;

/// Origin of a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleCategory {
    /// Created and owned by an AWS service
    ServiceLinked,
    Custom,
}

impl RoleCategory {
    pub fn of(role: &Role) -> Self {
        match role.arn() {
            Some(arn) if arn.contains("/aws-service-role/") => RoleCategory::ServiceLinked,
            _ => RoleCategory::Custom,
        }
    }
}

/// Origin of a managed policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyCategory {
    ServiceRole,
    AwsManaged,
    CustomerManaged,
}

impl PolicyCategory {
    pub fn of(policy: &Policy) -> Self {
        let arn = policy.arn().unwrap_or_default();
        if arn.contains("::aws:policy/aws-service-role/") || arn.contains(":policy/service-role/")
        {
            PolicyCategory::ServiceRole
        } else if arn.contains("::aws:policy/") {
            PolicyCategory::AwsManaged
        } else {
            PolicyCategory::CustomerManaged
        }
    }
}

/// Case-insensitive substring match on name or ARN
///
/// A blank query matches everything.
pub fn matches_query<T: Entity>(entity: &T, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    [entity.name(), entity.arn()]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Entities matching a search query, per kind, in collection order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchHits<'a> {
    pub users: Vec<&'a User>,
    pub roles: Vec<&'a Role>,
    pub policies: Vec<&'a Policy>,
    pub groups: Vec<&'a Group>,
}

impl SearchHits<'_> {
    pub fn len(&self) -> usize {
        self.users.len() + self.roles.len() + self.policies.len() + self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Search every collection of `model` for `query`
pub fn search<'a>(model: &'a AuthorizationModel, query: &str) -> SearchHits<'a> {
    fn hits<'a, T: Entity>(entities: &'a [T], query: &str) -> Vec<&'a T> {
        entities
            .iter()
            .filter(|entity| matches_query(*entity, query))
            .collect()
    }

    SearchHits {
        users: hits(model.users().as_slice(), query),
        roles: hits(model.roles().as_slice(), query),
        policies: hits(model.policies().as_slice(), query),
        groups: hits(model.groups().as_slice(), query),
    }
}

/// Entity counts of a model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelSummary {
    pub users: usize,
    pub groups: usize,
    pub roles: usize,
    pub service_linked_roles: usize,
    pub policies: usize,
    pub aws_managed_policies: usize,
    pub service_role_policies: usize,
    pub customer_managed_policies: usize,
    pub arn_collisions: usize,
}

impl ModelSummary {
    pub fn of(model: &AuthorizationModel) -> Self {
        let mut summary = ModelSummary {
            users: model.users().len(),
            groups: model.groups().len(),
            roles: model.roles().len(),
            policies: model.policies().len(),
            arn_collisions: model.arn_collisions().len(),
            ..Default::default()
        };

        summary.service_linked_roles = model
            .roles()
            .iter()
            .filter(|role| RoleCategory::of(role) == RoleCategory::ServiceLinked)
            .count();

        for policy in model.policies() {
            match PolicyCategory::of(policy) {
                PolicyCategory::ServiceRole => summary.service_role_policies += 1,
                PolicyCategory::AwsManaged => summary.aws_managed_policies += 1,
                PolicyCategory::CustomerManaged => summary.customer_managed_policies += 1,
            }
        }

        summary
    }
}
