pub mod generate;
pub mod room;
pub mod store;

pub use generate::{ContentGenerator, ExitSeed, ExpandError, RoomSeed};
pub use room::{Exit, Room, RoomId};
pub use store::RoomStore;

/// The canonical compass directions clients may always attempt. The generator
/// is free to invent others; these are just the baseline labels.
pub const CANONICAL_DIRECTIONS: [&str; 6] = ["north", "south", "east", "west", "up", "down"];
