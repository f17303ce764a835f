// handlers/public/mod.rs - endpoints served without a token
pub mod auth;
pub mod characters;
pub mod root;

pub use characters::{character_get, characters_list};
pub use root::{health, root};
