use thiserror::Error;

/// Errors surfaced synchronously to callers. Packet delivery failures are
/// deliberately not part of this: they are logged where they happen and the
/// surrounding broadcast keeps going.
#[derive(Error, Debug)]
pub enum HologramError {
    #[error("a hologram needs an identifier")]
    MissingIdentifier,
    #[error("a hologram needs a spawn position")]
    MissingSpawnPosition,
    #[error("a hologram needs at least one line")]
    NoLines,
    #[error("expected one text per index, got {indexes} indexes and {texts} texts")]
    LengthMismatch { indexes: usize, texts: usize },
}
