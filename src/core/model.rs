//! Authorization model: the immutable, indexed snapshot of one export
//!
//! The model owns the four entity collections and the secondary indices the
//! resolver joins through. Indices are built once in [`AuthorizationModel::new`]
//! and never change afterwards, so a model can be shared across threads
//! behind an `Arc` without locking.

use super::entity::{Entity, EntityKind, EntityRef, Group, Policy, Role, User};
use super::resolver::Resolver;
use ahash::AHashMap;
use serde::Serialize;
use tracing::{debug, warn};

/// Insertion-ordered collection of entities keyed by their stable ID
///
/// Re-inserting an existing key replaces the record but keeps the position
/// of the first occurrence.
#[derive(Debug, Clone)]
pub struct EntityMap<T> {
    entries: Vec<T>,
    index: AHashMap<String, usize>,
}

impl<T: Entity> EntityMap<T> {
    pub fn new() -> Self {
        EntityMap {
            entries: Vec::new(),
            index: AHashMap::new(),
        }
    }

    /// Insert an entity, returning the record it replaced
    pub fn insert(&mut self, entity: T) -> Option<T> {
        match self.index.get(entity.id()) {
            Some(&position) => Some(std::mem::replace(&mut self.entries[position], entity)),
            None => {
                self.index.insert(entity.id().to_string(), self.entries.len());
                self.entries.push(entity);
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&position| &self.entries[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Entities in collection order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Entity> Default for EntityMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: Entity> IntoIterator for &'a EntityMap<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Position of an entity inside the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    kind: EntityKind,
    position: usize,
}

/// Two entities claiming the same ARN
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArnCollision {
    pub arn: String,
    /// Entity that owns the ARN in the index (first seen)
    pub owner: (EntityKind, String),
    /// Entity whose claim was ignored
    pub duplicate: (EntityKind, String),
}

/// Immutable snapshot of users, roles, policies and groups
#[derive(Debug, Clone, Default)]
pub struct AuthorizationModel {
    users: EntityMap<User>,
    roles: EntityMap<Role>,
    policies: EntityMap<Policy>,
    groups: EntityMap<Group>,

    /// Policy ARN -> first policy (collection order) with that ARN
    policy_by_arn: AHashMap<String, usize>,
    /// Group name -> first group (collection order) with that name
    group_by_name: AHashMap<String, usize>,
    /// Any ARN -> first entity claiming it, scanning users, roles, policies, groups
    by_arn: AHashMap<String, Slot>,
    arn_collisions: Vec<ArnCollision>,
}

impl AuthorizationModel {
    /// Build a model from normalized collections and index it
    pub fn new(
        users: EntityMap<User>,
        roles: EntityMap<Role>,
        policies: EntityMap<Policy>,
        groups: EntityMap<Group>,
    ) -> Self {
        let mut model = AuthorizationModel {
            users,
            roles,
            policies,
            groups,
            ..Default::default()
        };
        model.build_indices();
        model
    }

    fn build_indices(&mut self) {
        for (position, policy) in self.policies.iter().enumerate() {
            if let Some(arn) = policy.arn() {
                self.policy_by_arn.entry(arn.to_string()).or_insert(position);
            }
        }

        for (position, group) in self.groups.iter().enumerate() {
            if let Some(name) = group.name() {
                self.group_by_name.entry(name.to_string()).or_insert(position);
            }
        }

        let mut claims: Vec<(&str, Slot)> = Vec::new();
        collect_arns(&self.users, &mut claims);
        collect_arns(&self.roles, &mut claims);
        collect_arns(&self.policies, &mut claims);
        collect_arns(&self.groups, &mut claims);

        let mut by_arn: AHashMap<String, Slot> = AHashMap::with_capacity(claims.len());
        let mut collisions = Vec::new();
        for (arn, slot) in claims {
            match by_arn.get(arn) {
                Some(&owner) => {
                    let collision = ArnCollision {
                        arn: arn.to_string(),
                        owner: (owner.kind, self.id_at(owner).to_string()),
                        duplicate: (slot.kind, self.id_at(slot).to_string()),
                    };
                    warn!(
                        arn = %collision.arn,
                        owner = %collision.owner.1,
                        duplicate = %collision.duplicate.1,
                        "ARN claimed by more than one entity"
                    );
                    collisions.push(collision);
                }
                None => {
                    by_arn.insert(arn.to_string(), slot);
                }
            }
        }
        self.by_arn = by_arn;
        self.arn_collisions = collisions;

        debug!(
            users = self.users.len(),
            roles = self.roles.len(),
            policies = self.policies.len(),
            groups = self.groups.len(),
            arns = self.by_arn.len(),
            "Indexed authorization model"
        );
    }

    fn id_at(&self, slot: Slot) -> &str {
        self.entity_at(slot).id()
    }

    fn entity_at(&self, slot: Slot) -> EntityRef<'_> {
        match slot.kind {
            EntityKind::User => EntityRef::User(&self.users.as_slice()[slot.position]),
            EntityKind::Role => EntityRef::Role(&self.roles.as_slice()[slot.position]),
            EntityKind::Policy => EntityRef::Policy(&self.policies.as_slice()[slot.position]),
            EntityKind::Group => EntityRef::Group(&self.groups.as_slice()[slot.position]),
        }
    }

    /// Model with all four collections empty
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    pub fn role(&self, id: &str) -> Option<&Role> {
        self.roles.get(id)
    }

    pub fn policy(&self, id: &str) -> Option<&Policy> {
        self.policies.get(id)
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.get(id)
    }

    /// Lookup by kind and ID
    pub fn get(&self, kind: EntityKind, id: &str) -> Option<EntityRef<'_>> {
        match kind {
            EntityKind::User => self.user(id).map(EntityRef::User),
            EntityKind::Role => self.role(id).map(EntityRef::Role),
            EntityKind::Policy => self.policy(id).map(EntityRef::Policy),
            EntityKind::Group => self.group(id).map(EntityRef::Group),
        }
    }

    pub fn users(&self) -> &EntityMap<User> {
        &self.users
    }

    pub fn roles(&self) -> &EntityMap<Role> {
        &self.roles
    }

    pub fn policies(&self) -> &EntityMap<Policy> {
        &self.policies
    }

    pub fn groups(&self) -> &EntityMap<Group> {
        &self.groups
    }

    /// First policy (collection order) whose ARN equals `arn`
    pub fn policy_by_arn(&self, arn: &str) -> Option<&Policy> {
        self.policy_by_arn
            .get(arn)
            .map(|&position| &self.policies.as_slice()[position])
    }

    /// First group (collection order) whose name equals `name`
    pub fn group_by_name(&self, name: &str) -> Option<&Group> {
        self.group_by_name
            .get(name)
            .map(|&position| &self.groups.as_slice()[position])
    }

    /// Entity of any kind owning `arn`
    pub fn find_by_arn(&self, arn: &str) -> Option<EntityRef<'_>> {
        self.by_arn.get(arn).map(|&slot| self.entity_at(slot))
    }

    /// ARNs claimed by more than one entity, in discovery order
    pub fn arn_collisions(&self) -> &[ArnCollision] {
        &self.arn_collisions
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::User => self.users.len(),
            EntityKind::Role => self.roles.len(),
            EntityKind::Policy => self.policies.len(),
            EntityKind::Group => self.groups.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        EntityKind::ALL.iter().all(|&kind| self.len(kind) == 0)
    }

    /// Relationship queries over this model
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self)
    }
}

fn collect_arns<'a, T: Entity>(map: &'a EntityMap<T>, claims: &mut Vec<(&'a str, Slot)>) {
    for (position, entity) in map.iter().enumerate() {
        if let Some(arn) = entity.arn() {
            claims.push((
                arn,
                Slot {
                    kind: T::KIND,
                    position,
                },
            ));
        }
    }
}
