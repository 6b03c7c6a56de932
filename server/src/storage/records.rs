//! Stored documents and their client-facing views.
//!
//! All documents serialize with camelCase keys, which is both the snapshot
//! format and the JSON returned to clients. `UserRecord` is the exception:
//! it holds the password digest and is only ever sent out as a `UserProfile`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ObjectId;

/// Notification text appended to a user when someone reports finding their item.
pub const FOUND_NOTIFICATION_MESSAGE: &str = "Your lost item has been reported as found";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    #[must_use]
    pub fn unread(message: &str, now: DateTime<Utc>) -> Self {
        Self {
            message: message.to_string(),
            read: false,
            created_at: now,
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: ObjectId,
    pub username: String,
    /// Unique across users; stored trimmed and lowercased.
    pub email: String,
    pub phone: String,
    pub profession: String,
    pub location: Location,
    /// Argon2 PHC string, never the plaintext.
    pub password_digest: String,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            profession: self.profession.clone(),
            location: self.location.clone(),
            notifications: self.notifications.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    #[must_use]
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// A user as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: ObjectId,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub profession: String,
    pub location: Location,
    pub notifications: Vec<Notification>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Name and email of a related user, embedded in item responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    pub email: String,
}

/// Fields a user may change on their own profile. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub profession: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
}

/// A report of something lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LostItem {
    pub id: ObjectId,
    pub name: String,
    pub description: String,
    pub category: String,
    #[serde(rename = "image")]
    pub image_url: String,
    pub district: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<String>,
    pub date_lost: DateTime<Utc>,
    /// Owner. Immutable after creation.
    pub created_by: ObjectId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A report of something found, optionally answering a lost report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundItem {
    pub id: ObjectId,
    #[serde(default)]
    pub lost_item: Option<ObjectId>,
    #[serde(default)]
    pub lost_person: Option<ObjectId>,
    /// Owner. Immutable after creation.
    pub found_person: ObjectId,
    pub found_person_phone: String,
    pub location_found: String,
    pub date_found: DateTime<Utc>,
    pub name: String,
    #[serde(rename = "image")]
    pub image_url: String,
    pub description: String,
    pub found: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable fields of a found report. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location_found: Option<String>,
    pub found_person_phone: Option<String>,
}

/// A user's saved reference to a lost report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: ObjectId,
    /// Owner. Immutable after creation.
    pub user: ObjectId,
    pub lost_item: ObjectId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A bookmark joined with the lost report it points at.
///
/// `lost_item` is `None` when the report has since been deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkWithItem {
    pub id: ObjectId,
    pub user: ObjectId,
    pub lost_item: Option<LostItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Case-insensitive substring filters for listing lost reports.
#[derive(Debug, Clone, Default)]
pub struct LostItemFilter {
    pub name: Option<String>,
    pub category: Option<String>,
    pub district: Option<String>,
    pub created_by: Option<ObjectId>,
}

impl LostItemFilter {
    #[must_use]
    pub fn matches(&self, item: &LostItem) -> bool {
        contains_ignore_case(&item.name, self.name.as_deref())
            && contains_ignore_case(&item.category, self.category.as_deref())
            && contains_ignore_case(&item.district, self.district.as_deref())
            && self.created_by.is_none_or(|owner| owner == item.created_by)
    }
}

fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    needle.is_none_or(|needle| haystack.to_lowercase().contains(&needle.to_lowercase()))
}

/// Skip/limit paging. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

impl Page {
    pub fn apply<T>(self, items: impl Iterator<Item = T>) -> Vec<T> {
        items
            .skip(self.skip.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

/// Distinct values offered as filter options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LostItemFacets {
    pub categories: Vec<String>,
    pub districts: Vec<String>,
    pub states: Vec<String>,
}
