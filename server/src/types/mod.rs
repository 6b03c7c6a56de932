pub mod ids;

pub use ids::{InvalidObjectId, OBJECT_ID_LEN, ObjectId};
