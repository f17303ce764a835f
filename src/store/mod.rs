//! Persistence behind the character catalog.
//!
//! Two interchangeable implementations share the `CharacterStore` trait:
//! `PgCharacterStore` (relational, in `crate::database`) and `JsonFileStore`
//! (a single JSON array on disk). Given the same records and the same
//! `Filter`, both return the same page.

pub mod error;
pub mod json_file;
pub mod mutation;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::StoreBackend;
use crate::filter::Filter;
use crate::types::Character;

pub use error::StoreError;
pub use json_file::JsonFileStore;
pub use mutation::{CharacterDraft, CharacterUpdate, NewCharacter, Patch, Reference};

/// One page of list results.
///
/// `count` is the number of characters on this page, `total` the number
/// of characters matching the filter before pagination.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub characters: Vec<Character>,
    pub count: usize,
    pub total: i64,
}

impl Page {
    pub fn new(characters: Vec<Character>, total: i64) -> Self {
        Self { count: characters.len(), characters, total }
    }
}

#[async_trait]
pub trait CharacterStore: Send + Sync {
    fn backend(&self) -> StoreBackend;

    async fn list(&self, filter: &Filter) -> Result<Page, StoreError>;

    async fn get(&self, id: i32) -> Result<Character, StoreError> {
        self.list(&Filter::by_id(id))
            .await?
            .characters
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound(id))
    }

    async fn create(&self, new: NewCharacter) -> Result<Character, StoreError>;

    async fn update(&self, id: i32, changes: CharacterUpdate) -> Result<Character, StoreError>;

    async fn delete(&self, id: i32) -> Result<(), StoreError>;

    /// Cheap liveness probe for `/health`
    async fn health(&self) -> Result<(), StoreError>;
}
