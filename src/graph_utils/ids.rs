use uuid::Uuid;

/// Allocate a fresh identifier for a node or relationship.
///
/// UUIDv7 packs a millisecond wall-clock timestamp together with random bits,
/// so ids are unique with overwhelming probability across sessions and sort
/// roughly by creation time.
pub fn new_id() -> Uuid {
    Uuid::now_v7()
}
