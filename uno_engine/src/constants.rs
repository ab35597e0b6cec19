//! Bounds shared by the engine and its operators.

pub const MIN_PLAYER_CAPACITY: usize = 2;
pub const MAX_PLAYER_CAPACITY: usize = 20;
pub const DEFAULT_PLAYER_CAPACITY: usize = 8;

pub const MIN_INITIAL_HAND_SIZE: usize = 2;
pub const MAX_INITIAL_HAND_SIZE: usize = 16;
pub const DEFAULT_INITIAL_HAND_SIZE: usize = 7;

pub const MAX_PLAYER_NAME_LENGTH: usize = 20;

/// Player names are 1-20 characters of `[A-Za-z0-9_-]`. Names double as
/// identifiers in routes and notifications, so nothing fancier is allowed.
pub fn is_valid_player_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_PLAYER_NAME_LENGTH
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
