use uuid::Uuid;

/// Identity of a marketplace user. Users live in an external directory;
/// the engine only ever sees their opaque ids.
pub type UserId = Uuid;
