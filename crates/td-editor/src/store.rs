//! Persistence and auth boundary.
//!
//! The editor consumes these traits; real backends live elsewhere. Every
//! persistence call is attributed to a user and role-checked: a missing
//! identity is no access, and the `Viewer` role is rejected for writes with
//! a distinguishable `Forbidden` error rather than a generic failure.
//!
//! [`MemoryStore`] is the in-process implementation used by tests and local
//! sessions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use td_core::model::{Area, Note, Relationship, Table};
use td_core::{Camera, SchemaDoc};
use thiserror::Error;

// ─── Identity and roles ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiagramId(pub String);

/// Membership role for one `(diagram, user)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Owner,
    Admin,
    Editor,
    Viewer,
}

impl Role {
    pub fn can_write(self) -> bool {
        !matches!(self, Role::Viewer)
    }
}

/// Resolves the current request to a user identity, or absence thereof.
pub trait AuthProvider {
    fn current_user(&self) -> Option<UserId>;
}

// ─── Documents ───────────────────────────────────────────────────────────

/// A persisted diagram record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramDoc {
    pub id: DiagramId,
    pub name: String,
    pub owner: UserId,
    /// Short public-sharing id.
    pub share_id: String,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    /// Soft-delete flag; deleted diagrams are invisible to loads.
    pub deleted: bool,
    pub doc: SchemaDoc,
    pub camera: Camera,
}

/// Partial save: any subset of the savable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagramPatch {
    pub name: Option<String>,
    pub tables: Option<Vec<Table>>,
    pub relationships: Option<Vec<Relationship>>,
    pub notes: Option<Vec<Note>>,
    pub areas: Option<Vec<Area>>,
    pub camera: Option<Camera>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no authenticated user")]
    Unauthenticated,
    #[error("user lacks permission for this operation")]
    Forbidden,
    #[error("diagram not found")]
    NotFound,
    #[error("backend failure: {0}")]
    Backend(String),
}

/// The persistence collaborator.
pub trait DiagramStore {
    fn load(&self, user: &UserId, id: &DiagramId) -> Result<DiagramDoc, StoreError>;
    fn save(
        &mut self,
        user: &UserId,
        id: &DiagramId,
        patch: DiagramPatch,
        now_ms: u64,
    ) -> Result<(), StoreError>;
    fn delete(&mut self, user: &UserId, id: &DiagramId, now_ms: u64) -> Result<(), StoreError>;
    fn role(&self, user: &UserId, id: &DiagramId) -> Option<Role>;
}

// ─── In-memory implementation ────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
    diagrams: HashMap<DiagramId, DiagramDoc>,
    memberships: HashMap<(DiagramId, UserId), Role>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty diagram owned by `user`.
    pub fn create(&mut self, user: &UserId, name: &str, now_ms: u64) -> DiagramId {
        self.next_id += 1;
        let id = DiagramId(format!("dgm_{}", self.next_id));
        let record = DiagramDoc {
            id: id.clone(),
            name: name.to_string(),
            owner: user.clone(),
            share_id: format!("s{:06}", self.next_id),
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            deleted: false,
            doc: SchemaDoc::new(),
            camera: Camera::default(),
        };
        self.diagrams.insert(id.clone(), record);
        self.memberships
            .insert((id.clone(), user.clone()), Role::Owner);
        id
    }

    pub fn grant(&mut self, id: &DiagramId, user: &UserId, role: Role) {
        self.memberships.insert((id.clone(), user.clone()), role);
    }

    fn authorize(&self, user: &UserId, id: &DiagramId, write: bool) -> Result<(), StoreError> {
        let role = self
            .role(user, id)
            .ok_or(StoreError::Forbidden)?;
        if write && !role.can_write() {
            return Err(StoreError::Forbidden);
        }
        Ok(())
    }
}

impl DiagramStore for MemoryStore {
    fn load(&self, user: &UserId, id: &DiagramId) -> Result<DiagramDoc, StoreError> {
        self.authorize(user, id, false)?;
        match self.diagrams.get(id) {
            Some(record) if !record.deleted => Ok(record.clone()),
            _ => Err(StoreError::NotFound),
        }
    }

    fn save(
        &mut self,
        user: &UserId,
        id: &DiagramId,
        patch: DiagramPatch,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        self.authorize(user, id, true)?;
        let record = self.diagrams.get_mut(id).ok_or(StoreError::NotFound)?;
        if record.deleted {
            return Err(StoreError::NotFound);
        }

        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(tables) = patch.tables {
            record.doc.tables = tables;
        }
        if let Some(relationships) = patch.relationships {
            record.doc.relationships = relationships;
        }
        if let Some(notes) = patch.notes {
            record.doc.notes = notes;
        }
        if let Some(areas) = patch.areas {
            record.doc.areas = areas;
        }
        if let Some(camera) = patch.camera {
            record.camera = camera;
        }
        record.updated_at_ms = now_ms;
        Ok(())
    }

    fn delete(&mut self, user: &UserId, id: &DiagramId, now_ms: u64) -> Result<(), StoreError> {
        self.authorize(user, id, true)?;
        let record = self.diagrams.get_mut(id).ok_or(StoreError::NotFound)?;
        record.deleted = true;
        record.updated_at_ms = now_ms;
        Ok(())
    }

    fn role(&self, user: &UserId, id: &DiagramId) -> Option<Role> {
        self.memberships.get(&(id.clone(), user.clone())).copied()
    }
}

/// Resolve the acting user through the auth provider, treating "no
/// identity" as no access.
pub fn require_user(auth: &dyn AuthProvider) -> Result<UserId, StoreError> {
    auth.current_user().ok_or(StoreError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use td_core::model::Table;

    struct FixedAuth(Option<UserId>);

    impl AuthProvider for FixedAuth {
        fn current_user(&self) -> Option<UserId> {
            self.0.clone()
        }
    }

    fn owner() -> UserId {
        UserId("alice".into())
    }

    #[test]
    fn missing_identity_is_no_access() {
        let auth = FixedAuth(None);
        assert_eq!(require_user(&auth), Err(StoreError::Unauthenticated));
    }

    #[test]
    fn viewer_writes_are_forbidden() {
        let mut store = MemoryStore::new();
        let id = store.create(&owner(), "erd", 1_000);
        let viewer = UserId("bob".into());
        store.grant(&id, &viewer, Role::Viewer);

        // reads are fine
        assert!(store.load(&viewer, &id).is_ok());

        let patch = DiagramPatch {
            name: Some("renamed".into()),
            ..Default::default()
        };
        assert_eq!(
            store.save(&viewer, &id, patch, 2_000),
            Err(StoreError::Forbidden)
        );
        // the record is untouched
        assert_eq!(store.load(&owner(), &id).unwrap().name, "erd");
    }

    #[test]
    fn non_member_is_forbidden() {
        let mut store = MemoryStore::new();
        let id = store.create(&owner(), "erd", 0);
        let outsider = UserId("mallory".into());
        assert_eq!(store.load(&outsider, &id), Err(StoreError::Forbidden));
    }

    #[test]
    fn partial_save_touches_only_named_fields() {
        let mut store = MemoryStore::new();
        let id = store.create(&owner(), "erd", 0);

        let patch = DiagramPatch {
            tables: Some(vec![Table::starter("users", 0.0, 0.0)]),
            ..Default::default()
        };
        store.save(&owner(), &id, patch, 5_000).unwrap();

        let record = store.load(&owner(), &id).unwrap();
        assert_eq!(record.name, "erd");
        assert_eq!(record.doc.tables.len(), 1);
        assert_eq!(record.created_at_ms, 0);
        assert_eq!(record.updated_at_ms, 5_000);
    }

    #[test]
    fn soft_delete_hides_the_diagram() {
        let mut store = MemoryStore::new();
        let id = store.create(&owner(), "erd", 0);
        store.delete(&owner(), &id, 100).unwrap();
        assert_eq!(store.load(&owner(), &id), Err(StoreError::NotFound));
    }

    #[test]
    fn editor_role_can_write() {
        let mut store = MemoryStore::new();
        let id = store.create(&owner(), "erd", 0);
        let editor = UserId("carol".into());
        store.grant(&id, &editor, Role::Editor);

        let patch = DiagramPatch {
            name: Some("shared".into()),
            ..Default::default()
        };
        store.save(&editor, &id, patch, 50).unwrap();
        assert_eq!(store.load(&owner(), &id).unwrap().name, "shared");
    }
}
