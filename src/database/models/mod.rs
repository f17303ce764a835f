pub mod character;

pub use character::{CharacterRow, HouseRow, StrengthRow};
