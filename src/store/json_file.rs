use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;

use super::error::StoreError;
use super::mutation::{CharacterDraft, CharacterUpdate, NewCharacter, Reference};
use super::{CharacterStore, Page};
use crate::config::StoreBackend;
use crate::filter::Filter;
use crate::types::{Character, House, Strength};

/// Character catalog kept as one JSON array on disk.
///
/// Every operation reads the whole file. Writers are serialized through an
/// in-process lock and replace the file by renaming a fully written temp
/// file, so readers never observe a partial write. A missing file is an
/// empty catalog.
///
/// The highest id ever assigned lives in a sibling `<path>.seq` file so a
/// deleted id is never handed out again.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sequence_path(&self) -> PathBuf {
        sibling(&self.path, ".seq")
    }

    async fn load(&self) -> Result<Catalog, StoreError> {
        let high_water = self.load_high_water().await?;

        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Character file {} not found, starting empty", self.path.display());
                return Ok(Catalog::normalize(vec![], high_water));
            }
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Catalog::normalize(vec![], high_water));
        }

        let records: Vec<StoredCharacter> =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt(format!("{}: {}", self.path.display(), e)))?;
        Ok(Catalog::normalize(records, high_water))
    }

    async fn load_high_water(&self) -> Result<i32, StoreError> {
        let path = self.sequence_path();
        match tokio::fs::read_to_string(&path).await {
            Ok(text) if text.trim().is_empty() => Ok(0),
            Ok(text) => text
                .trim()
                .parse::<i32>()
                .ok()
                .filter(|id| *id >= 0)
                .ok_or_else(|| StoreError::Corrupt(format!("{}: expected a non-negative id", path.display()))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, catalog: &Catalog) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Sequence first: a failure between the two writes only skips ids
        replace_file(&self.sequence_path(), catalog.high_water.to_string().into_bytes()).await?;
        replace_file(&self.path, serde_json::to_vec_pretty(&catalog.characters)?).await?;
        Ok(())
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.to_path_buf().into_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Writes a temp file next to `path` and renames it into place
async fn replace_file(path: &Path, body: Vec<u8>) -> Result<(), StoreError> {
    let staging = sibling(path, ".tmp");
    tokio::fs::write(&staging, body).await?;
    tokio::fs::rename(&staging, path).await?;
    Ok(())
}

#[async_trait]
impl CharacterStore for JsonFileStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Json
    }

    async fn list(&self, filter: &Filter) -> Result<Page, StoreError> {
        let catalog = self.load().await?;
        let applied = filter.apply(catalog.characters);
        Ok(Page::new(applied.characters, applied.total as i64))
    }

    async fn create(&self, new: NewCharacter) -> Result<Character, StoreError> {
        let draft = new.into_draft()?;

        let _guard = self.lock.lock().await;
        let mut catalog = self.load().await?;
        if catalog.name_taken(&draft.name, None) {
            return Err(StoreError::Duplicate(draft.name));
        }

        let id = catalog.next_character_id();
        let character = catalog.materialize(id, draft)?;
        catalog.high_water = id;
        catalog.characters.push(character.clone());
        self.save(&catalog).await?;

        tracing::info!("Created character {} ({})", character.id, character.name);
        Ok(character)
    }

    async fn update(&self, id: i32, changes: CharacterUpdate) -> Result<Character, StoreError> {
        let _guard = self.lock.lock().await;
        let mut catalog = self.load().await?;
        let index = catalog.position(id).ok_or(StoreError::NotFound(id))?;

        let draft = changes.apply_to(CharacterDraft::from(&catalog.characters[index]))?;
        if catalog.name_taken(&draft.name, Some(id)) {
            return Err(StoreError::Duplicate(draft.name));
        }

        let character = catalog.materialize(id, draft)?;
        catalog.characters[index] = character.clone();
        self.save(&catalog).await?;

        tracing::info!("Updated character {}", id);
        Ok(character)
    }

    async fn delete(&self, id: i32) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut catalog = self.load().await?;
        let index = catalog.position(id).ok_or(StoreError::NotFound(id))?;

        catalog.characters.remove(index);
        self.save(&catalog).await?;

        tracing::info!("Deleted character {}", id);
        Ok(())
    }

    async fn health(&self) -> Result<(), StoreError> {
        self.load().await.map(|_| ())
    }
}

/// Record as it may appear on disk: the nested shape this store writes, or
/// older files holding free text (or nothing) for house and strength.
#[derive(Debug, Deserialize)]
struct StoredCharacter {
    id: Option<i32>,
    name: String,
    #[serde(default)]
    house: Option<StoredRelation>,
    #[serde(default)]
    animal: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    role: String,
    #[serde(default)]
    age: Option<i32>,
    #[serde(default)]
    death: Option<i32>,
    #[serde(default)]
    strength: Option<StoredRelation>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredRelation {
    Label(String),
    Linked {
        id: Option<i32>,
        #[serde(alias = "description")]
        name: Option<String>,
    },
}

/// Label table for one relation kind, rebuilt from the records on every load
#[derive(Debug, Default)]
struct Labels {
    by_id: HashMap<i32, String>,
    by_name: HashMap<String, i32>,
}

impl Labels {
    fn insert(&mut self, id: i32, name: String) {
        self.by_name.entry(name.clone()).or_insert(id);
        self.by_id.entry(id).or_insert(name);
    }

    fn next_id(&self) -> i32 {
        self.by_id.keys().max().map_or(1, |max| max + 1)
    }

    /// Resolves a relation to `(id, name)`, minting an id for labels not seen yet
    fn resolve(&mut self, relation: StoredRelation) -> Option<(i32, String)> {
        let (id, name) = match relation {
            StoredRelation::Label(name) => (None, Some(name)),
            StoredRelation::Linked { id, name } => (id, name),
        };
        let name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

        match (id, name) {
            (Some(id), Some(name)) => Some((id, name)),
            (Some(id), None) => self.by_id.get(&id).map(|name| (id, name.clone())),
            (None, Some(name)) => {
                let id = match self.by_name.get(&name) {
                    Some(id) => *id,
                    None => {
                        let id = self.next_id();
                        self.insert(id, name.clone());
                        id
                    }
                };
                Some((id, name))
            }
            (None, None) => None,
        }
    }
}

#[derive(Debug, Default)]
struct Catalog {
    characters: Vec<Character>,
    /// Highest character id ever assigned, including deleted ones
    high_water: i32,
}

impl Catalog {
    fn normalize(records: Vec<StoredCharacter>, high_water: i32) -> Self {
        let mut houses = Labels::default();
        let mut strengths = Labels::default();

        // Fully linked relations claim their ids before free-text ones are numbered
        for record in &records {
            for (labels, relation) in [(&mut houses, &record.house), (&mut strengths, &record.strength)] {
                if let Some(StoredRelation::Linked { id: Some(id), name: Some(name) }) = relation {
                    labels.insert(*id, name.trim().to_string());
                }
            }
        }

        let mut next_id = records.iter().filter_map(|r| r.id).max().unwrap_or(0).max(high_water) + 1;
        let characters = records
            .into_iter()
            .map(|record| {
                let id = record.id.unwrap_or_else(|| {
                    next_id += 1;
                    next_id - 1
                });
                Character {
                    id,
                    name: record.name,
                    house: record.house.and_then(|r| houses.resolve(r)).map(|(id, name)| House { id, name }),
                    animal: record.animal,
                    symbol: record.symbol,
                    nickname: record.nickname,
                    role: record.role,
                    age: record.age,
                    death: record.death,
                    strength: record
                        .strength
                        .and_then(|r| strengths.resolve(r))
                        .map(|(id, description)| Strength { id, description }),
                }
            })
            .collect::<Vec<_>>();

        let high_water = characters.iter().map(|c| c.id).max().unwrap_or(0).max(high_water);
        Self { characters, high_water }
    }

    fn position(&self, id: i32) -> Option<usize> {
        self.characters.iter().position(|c| c.id == id)
    }

    fn next_character_id(&self) -> i32 {
        self.high_water + 1
    }

    fn name_taken(&self, name: &str, except: Option<i32>) -> bool {
        self.characters.iter().any(|c| c.name == name && Some(c.id) != except)
    }

    fn houses(&self) -> impl Iterator<Item = &House> {
        self.characters.iter().filter_map(|c| c.house.as_ref())
    }

    fn strengths(&self) -> impl Iterator<Item = &Strength> {
        self.characters.iter().filter_map(|c| c.strength.as_ref())
    }

    fn resolve_house(&self, reference: Reference) -> Result<House, StoreError> {
        match reference {
            Reference::Id(id) => self
                .houses()
                .find(|h| h.id == id)
                .cloned()
                .ok_or_else(|| StoreError::invalid_field("house_id", format!("House {} does not exist", id))),
            Reference::Name(name) => Ok(self.houses().find(|h| h.name == name).cloned().unwrap_or_else(|| House {
                id: self.houses().map(|h| h.id).max().unwrap_or(0) + 1,
                name,
            })),
        }
    }

    fn resolve_strength(&self, reference: Reference) -> Result<Strength, StoreError> {
        match reference {
            Reference::Id(id) => self
                .strengths()
                .find(|s| s.id == id)
                .cloned()
                .ok_or_else(|| StoreError::invalid_field("strength_id", format!("Strength {} does not exist", id))),
            Reference::Name(description) => {
                Ok(self.strengths().find(|s| s.description == description).cloned().unwrap_or_else(|| Strength {
                    id: self.strengths().map(|s| s.id).max().unwrap_or(0) + 1,
                    description,
                }))
            }
        }
    }

    fn materialize(&self, id: i32, draft: CharacterDraft) -> Result<Character, StoreError> {
        let house = draft.house.map(|r| self.resolve_house(r)).transpose()?;
        let strength = draft.strength.map(|r| self.resolve_strength(r)).transpose()?;

        Ok(Character {
            id,
            name: draft.name,
            house,
            animal: draft.animal,
            symbol: draft.symbol,
            nickname: draft.nickname,
            role: draft.role,
            age: draft.age,
            death: draft.death,
            strength,
        })
    }
}
