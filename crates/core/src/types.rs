/// All entity identifiers are UUIDs (v4), assigned at creation.
pub type Id = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
