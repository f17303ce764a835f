pub mod error;
pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod pagination;
pub mod types;

pub use error::FilterError;
pub use filter::{Applied, Filter};
pub use filter_where::CharacterFilter;
pub use types::*;
