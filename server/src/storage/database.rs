//! High-level document store.
//!
//! Holds the four collections (users, lost items, found items, bookmarks)
//! behind a single `RwLock`. Reads share the lock; every mutation, including
//! its precondition check, runs under one write-lock acquisition, which is
//! what makes the id+owner conditioned updates and deletes atomic.
//!
//! # Pre-conditions
//! - When opened from a path, the parent directory exists.
//!
//! # Post-conditions
//! - A mutation that changed anything is written to the snapshot file (if
//!   any) before the write lock is released.
//! - A mutation that returns an error, including a failed snapshot write,
//!   leaves the collections exactly as they were.
//!
//! # Invariants
//! - User emails are unique.
//! - A (user, lost item) pair is bookmarked at most once.
//! - Owner fields (`created_by`, `found_person`, `user`) never change.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::records::{
    Bookmark, BookmarkWithItem, FoundItem, FoundItemUpdate, LostItem, LostItemFacets,
    LostItemFilter, Notification, Page, ProfileUpdate, UserRecord, UserSummary,
};
use super::snapshot::{SnapshotError, SnapshotFile};
use crate::types::ObjectId;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Another user already holds this email.
    #[error("email already registered")]
    DuplicateEmail,
    /// The caller already bookmarked this lost item.
    #[error("lost item already bookmarked")]
    DuplicateBookmark,
    /// A previous holder of the lock panicked.
    #[error("database lock poisoned")]
    LockPoisoned,
    /// Reading or writing the snapshot file failed.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Collections {
    #[serde(default)]
    users: BTreeMap<ObjectId, UserRecord>,
    #[serde(default)]
    lost_items: BTreeMap<ObjectId, LostItem>,
    #[serde(default)]
    found_items: BTreeMap<ObjectId, FoundItem>,
    #[serde(default)]
    bookmarks: BTreeMap<ObjectId, Bookmark>,
}

impl Collections {
    fn email_taken(&self, email: &str, except: Option<ObjectId>) -> bool {
        self.users
            .values()
            .any(|user| user.email == email && Some(user.id) != except)
    }
}

/// Whether a write actually changed anything and so needs persisting.
enum Outcome<T> {
    Changed(T),
    Unchanged(T),
}

/// A database instance.
///
/// Purely in memory unless opened from a snapshot path.
pub struct Database {
    collections: RwLock<Collections>,
    snapshot: Option<SnapshotFile>,
}

impl Database {
    /// Create an empty database with no backing file.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            collections: RwLock::new(Collections::default()),
            snapshot: None,
        }
    }

    /// Open the snapshot at `path`, starting empty if the file does not exist.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let snapshot = SnapshotFile::new(path);
        let collections: Collections = snapshot.load()?.unwrap_or_default();
        tracing::info!(
            "opened database {}: {} users, {} lost items, {} found items, {} bookmarks",
            path.display(),
            collections.users.len(),
            collections.lost_items.len(),
            collections.found_items.len(),
            collections.bookmarks.len()
        );
        Ok(Self {
            collections: RwLock::new(collections),
            snapshot: Some(snapshot),
        })
    }

    fn read<T>(&self, f: impl FnOnce(&Collections) -> T) -> Result<T, DatabaseError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(f(&collections))
    }

    fn write<T>(
        &self,
        f: impl FnOnce(&mut Collections) -> Result<Outcome<T>, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| DatabaseError::LockPoisoned)?;
        // Mutate a working copy; it replaces the live collections only once
        // the snapshot holds it.
        let mut working = collections.clone();
        match f(&mut working)? {
            Outcome::Unchanged(value) => Ok(value),
            Outcome::Changed(value) => {
                if let Some(snapshot) = &self.snapshot {
                    snapshot.store(&working)?;
                }
                *collections = working;
                Ok(value)
            }
        }
    }

    // ---- users -------------------------------------------------------------

    /// Insert a new user unless the email is already registered.
    pub fn insert_user(&self, user: UserRecord) -> Result<UserRecord, DatabaseError> {
        self.write(|c| {
            if c.email_taken(&user.email, None) {
                return Err(DatabaseError::DuplicateEmail);
            }
            c.users.insert(user.id, user.clone());
            Ok(Outcome::Changed(user))
        })
    }

    pub fn find_user(&self, id: &ObjectId) -> Result<Option<UserRecord>, DatabaseError> {
        self.read(|c| c.users.get(id).cloned())
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        self.read(|c| c.users.values().find(|user| user.email == email).cloned())
    }

    pub fn user_summary(&self, id: &ObjectId) -> Result<Option<UserSummary>, DatabaseError> {
        self.read(|c| c.users.get(id).map(UserRecord::summary))
    }

    /// Apply a profile update. Returns `None` if the user does not exist.
    pub fn update_user(
        &self,
        id: &ObjectId,
        update: &ProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<UserRecord>, DatabaseError> {
        self.write(|c| {
            if let Some(email) = &update.email
                && c.email_taken(email, Some(*id))
            {
                return Err(DatabaseError::DuplicateEmail);
            }
            let Some(user) = c.users.get_mut(id) else {
                return Ok(Outcome::Unchanged(None));
            };
            let fields = [
                (&mut user.username, &update.username),
                (&mut user.email, &update.email),
                (&mut user.phone, &update.phone),
                (&mut user.profession, &update.profession),
                (&mut user.location.district, &update.district),
                (&mut user.location.state, &update.state),
            ];
            for (field, value) in fields {
                if let Some(value) = value {
                    field.clone_from(value);
                }
            }
            user.updated_at = now;
            Ok(Outcome::Changed(Some(user.clone())))
        })
    }

    /// Append a notification. Returns `false` if the user does not exist.
    pub fn push_notification(
        &self,
        id: &ObjectId,
        notification: Notification,
    ) -> Result<bool, DatabaseError> {
        self.write(|c| match c.users.get_mut(id) {
            Some(user) => {
                user.notifications.push(notification);
                Ok(Outcome::Changed(true))
            }
            None => Ok(Outcome::Unchanged(false)),
        })
    }

    // ---- lost items --------------------------------------------------------

    pub fn insert_lost_item(&self, item: LostItem) -> Result<ObjectId, DatabaseError> {
        self.write(|c| {
            let id = item.id;
            c.lost_items.insert(id, item);
            Ok(Outcome::Changed(id))
        })
    }

    pub fn find_lost_item(&self, id: &ObjectId) -> Result<Option<LostItem>, DatabaseError> {
        self.read(|c| c.lost_items.get(id).cloned())
    }

    /// Lost reports matching `filter`, oldest first.
    pub fn list_lost_items(
        &self,
        filter: &LostItemFilter,
        page: Page,
    ) -> Result<Vec<LostItem>, DatabaseError> {
        self.read(|c| {
            page.apply(
                c.lost_items
                    .values()
                    .filter(|item| filter.matches(item))
                    .cloned(),
            )
        })
    }

    /// Distinct categories, districts and states across all lost reports.
    pub fn lost_item_facets(&self) -> Result<LostItemFacets, DatabaseError> {
        self.read(|c| {
            let mut categories = BTreeSet::new();
            let mut districts = BTreeSet::new();
            let mut states = BTreeSet::new();
            for item in c.lost_items.values() {
                for (set, value) in [
                    (&mut categories, &item.category),
                    (&mut districts, &item.district),
                    (&mut states, &item.state),
                ] {
                    if !value.is_empty() {
                        set.insert(value.clone());
                    }
                }
            }
            LostItemFacets {
                categories: categories.into_iter().collect(),
                districts: districts.into_iter().collect(),
                states: states.into_iter().collect(),
            }
        })
    }

    /// Delete a lost report if and only if `owner` created it.
    pub fn delete_lost_item(&self, id: &ObjectId, owner: &ObjectId) -> Result<bool, DatabaseError> {
        self.write(|c| {
            if c.lost_items.get(id).is_some_and(|item| item.created_by == *owner) {
                c.lost_items.remove(id);
                Ok(Outcome::Changed(true))
            } else {
                Ok(Outcome::Unchanged(false))
            }
        })
    }

    // ---- found items -------------------------------------------------------

    pub fn insert_found_item(&self, item: FoundItem) -> Result<ObjectId, DatabaseError> {
        self.write(|c| {
            let id = item.id;
            c.found_items.insert(id, item);
            Ok(Outcome::Changed(id))
        })
    }

    pub fn find_found_item(&self, id: &ObjectId) -> Result<Option<FoundItem>, DatabaseError> {
        self.read(|c| c.found_items.get(id).cloned())
    }

    pub fn list_found_items(&self, page: Page) -> Result<Vec<FoundItem>, DatabaseError> {
        self.read(|c| page.apply(c.found_items.values().cloned()))
    }

    /// Found reports that answer the given lost report.
    pub fn found_items_for_lost_item(
        &self,
        lost_item: &ObjectId,
    ) -> Result<Vec<FoundItem>, DatabaseError> {
        self.read(|c| {
            c.found_items
                .values()
                .filter(|item| item.lost_item.as_ref() == Some(lost_item))
                .cloned()
                .collect()
        })
    }

    /// Found reports filed by the given user.
    pub fn found_items_by_finder(
        &self,
        found_person: &ObjectId,
    ) -> Result<Vec<FoundItem>, DatabaseError> {
        self.read(|c| {
            c.found_items
                .values()
                .filter(|item| item.found_person == *found_person)
                .cloned()
                .collect()
        })
    }

    /// Edit a found report if and only if `owner` filed it.
    pub fn update_found_item(
        &self,
        id: &ObjectId,
        owner: &ObjectId,
        update: &FoundItemUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<FoundItem>, DatabaseError> {
        self.write(|c| {
            let Some(item) = c
                .found_items
                .get_mut(id)
                .filter(|item| item.found_person == *owner)
            else {
                return Ok(Outcome::Unchanged(None));
            };
            let fields = [
                (&mut item.name, &update.name),
                (&mut item.description, &update.description),
                (&mut item.location_found, &update.location_found),
                (&mut item.found_person_phone, &update.found_person_phone),
            ];
            for (field, value) in fields {
                if let Some(value) = value {
                    field.clone_from(value);
                }
            }
            item.updated_at = now;
            Ok(Outcome::Changed(Some(item.clone())))
        })
    }

    /// Set the `found` flag if and only if `owner` filed the report.
    pub fn set_found_status(
        &self,
        id: &ObjectId,
        owner: &ObjectId,
        found: bool,
        now: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        self.write(|c| {
            match c
                .found_items
                .get_mut(id)
                .filter(|item| item.found_person == *owner)
            {
                Some(item) => {
                    item.found = found;
                    item.updated_at = now;
                    Ok(Outcome::Changed(true))
                }
                None => Ok(Outcome::Unchanged(false)),
            }
        })
    }

    /// Delete a found report if and only if `owner` filed it.
    pub fn delete_found_item(&self, id: &ObjectId, owner: &ObjectId) -> Result<bool, DatabaseError> {
        self.write(|c| {
            if c.found_items.get(id).is_some_and(|item| item.found_person == *owner) {
                c.found_items.remove(id);
                Ok(Outcome::Changed(true))
            } else {
                Ok(Outcome::Unchanged(false))
            }
        })
    }

    // ---- bookmarks ---------------------------------------------------------

    /// Insert a bookmark unless the user already bookmarked that lost item.
    pub fn insert_bookmark(&self, bookmark: Bookmark) -> Result<Bookmark, DatabaseError> {
        self.write(|c| {
            let duplicate = c
                .bookmarks
                .values()
                .any(|b| b.user == bookmark.user && b.lost_item == bookmark.lost_item);
            if duplicate {
                return Err(DatabaseError::DuplicateBookmark);
            }
            c.bookmarks.insert(bookmark.id, bookmark.clone());
            Ok(Outcome::Changed(bookmark))
        })
    }

    /// The user's bookmarks, each joined with its lost report.
    ///
    /// Stage one selects the user's bookmarks, stage two looks up the
    /// referenced report. A dangling reference is kept with `lost_item: None`.
    pub fn bookmarks_with_items(
        &self,
        user: &ObjectId,
    ) -> Result<Vec<BookmarkWithItem>, DatabaseError> {
        self.read(|c| {
            c.bookmarks
                .values()
                .filter(|b| b.user == *user)
                .map(|b| BookmarkWithItem {
                    id: b.id,
                    user: b.user,
                    lost_item: c.lost_items.get(&b.lost_item).cloned(),
                    created_at: b.created_at,
                    updated_at: b.updated_at,
                })
                .collect()
        })
    }

    /// Delete a bookmark if and only if `owner` created it.
    pub fn delete_bookmark(&self, id: &ObjectId, owner: &ObjectId) -> Result<bool, DatabaseError> {
        self.write(|c| {
            if c.bookmarks.get(id).is_some_and(|b| b.user == *owner) {
                c.bookmarks.remove(id);
                Ok(Outcome::Changed(true))
            } else {
                Ok(Outcome::Unchanged(false))
            }
        })
    }
}
