//! Document storage.
//!
//! An in-memory document store for users, lost reports, found reports and
//! bookmarks, optionally backed by a JSON snapshot file.
//!
//! # Usage
//!
//! ```ignore
//! use storage::Database;
//!
//! let db = Database::open(Path::new("./data/lostfound.json"))?;
//! let user = db.insert_user(record)?;
//! let deleted = db.delete_lost_item(&item_id, &user.id)?;
//! ```

mod database;
mod records;
mod snapshot;

pub use database::{Database, DatabaseError};
pub use records::{
    Bookmark, BookmarkWithItem, FOUND_NOTIFICATION_MESSAGE, FoundItem, FoundItemUpdate, Location,
    LostItem, LostItemFacets, LostItemFilter, Notification, Page, ProfileUpdate, UserProfile,
    UserRecord, UserSummary,
};
pub use snapshot::{SnapshotError, SnapshotFile};
