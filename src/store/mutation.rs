//! Create and partial-update payloads, and the store-agnostic merge and
//! validation both backends run before touching storage.
//!
//! A house may be referenced by `house` (name) or `house_id`, a strength by
//! `strength` (description) or `strength_id`; never both members of a pair.
//! Strength is required, house is optional.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

use super::error::StoreError;
use crate::types::Character;

/// Limit for `name` and `role`
pub const MAX_NAME_LENGTH: usize = 100;
/// Limit for `animal`, `symbol`, `nickname`, house names and strength descriptions
pub const MAX_LABEL_LENGTH: usize = 50;

/// Link to a House or Strength, either by id or by its unique name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Id(i32),
    Name(String),
}

/// Validated character body that a store resolves and persists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterDraft {
    pub name: String,
    pub house: Option<Reference>,
    pub animal: Option<String>,
    pub symbol: Option<String>,
    pub nickname: Option<String>,
    pub role: String,
    pub age: Option<i32>,
    pub death: Option<i32>,
    pub strength: Option<Reference>,
}

impl From<&Character> for CharacterDraft {
    fn from(character: &Character) -> Self {
        Self {
            name: character.name.clone(),
            house: character.house_id().map(Reference::Id),
            animal: character.animal.clone(),
            symbol: character.symbol.clone(),
            nickname: character.nickname.clone(),
            role: character.role.clone(),
            age: character.age,
            death: character.death,
            strength: character.strength_id().map(Reference::Id),
        }
    }
}

impl CharacterDraft {
    /// Trims text fields and checks every field-level rule
    fn finish(mut self) -> Result<Self, StoreError> {
        self.name = self.name.trim().to_string();
        self.role = self.role.trim().to_string();
        for label in [&mut self.animal, &mut self.symbol, &mut self.nickname] {
            *label = label.take().map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        }
        for reference in [&mut self.house, &mut self.strength] {
            if let Some(Reference::Name(name)) = reference {
                *name = name.trim().to_string();
            }
        }

        let mut errors = HashMap::new();
        check_text(&mut errors, "name", &self.name, MAX_NAME_LENGTH);
        check_text(&mut errors, "role", &self.role, MAX_NAME_LENGTH);
        for (key, value) in [("animal", &self.animal), ("symbol", &self.symbol), ("nickname", &self.nickname)] {
            if let Some(value) = value {
                check_text(&mut errors, key, value, MAX_LABEL_LENGTH);
            }
        }
        for (key, value) in [("age", self.age), ("death", self.death)] {
            if value.is_some_and(|v| v < 0) {
                errors.insert(key.to_string(), "Must be greater than or equal to 0".to_string());
            }
        }
        if let Some(house) = &self.house {
            check_reference(&mut errors, "house", "house_id", house);
        }
        match &self.strength {
            Some(strength) => check_reference(&mut errors, "strength", "strength_id", strength),
            None => {
                errors.insert("strength_id".to_string(), "A strength or strength_id is required".to_string());
            }
        }

        if errors.is_empty() {
            Ok(self)
        } else {
            Err(StoreError::validation("Validation error", errors))
        }
    }
}

fn check_text(errors: &mut HashMap<String, String>, key: &str, value: &str, max: usize) {
    if value.is_empty() {
        errors.insert(key.to_string(), "Field cannot be empty".to_string());
    } else if value.chars().count() > max {
        errors.insert(key.to_string(), format!("Max length is {} characters", max));
    }
}

fn check_reference(errors: &mut HashMap<String, String>, name_key: &str, id_key: &str, reference: &Reference) {
    match reference {
        Reference::Id(id) if *id < 1 => {
            errors.insert(id_key.to_string(), "Must be greater than or equal to 1".to_string());
        }
        Reference::Id(_) => {}
        Reference::Name(name) => check_text(errors, name_key, name, MAX_LABEL_LENGTH),
    }
}

/// Body of a create request
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewCharacter {
    pub name: String,
    pub house: Option<String>,
    pub house_id: Option<i32>,
    pub animal: Option<String>,
    pub symbol: Option<String>,
    pub nickname: Option<String>,
    pub role: String,
    pub age: Option<i32>,
    pub death: Option<i32>,
    pub strength: Option<String>,
    pub strength_id: Option<i32>,
}

impl NewCharacter {
    pub fn into_draft(self) -> Result<CharacterDraft, StoreError> {
        let mut errors = HashMap::new();
        let house = pick_reference(&mut errors, ("house", self.house), ("house_id", self.house_id));
        let strength = pick_reference(&mut errors, ("strength", self.strength), ("strength_id", self.strength_id));
        if !errors.is_empty() {
            return Err(StoreError::validation("Validation error", errors));
        }

        CharacterDraft {
            name: self.name,
            house,
            animal: self.animal,
            symbol: self.symbol,
            nickname: self.nickname,
            role: self.role,
            age: self.age,
            death: self.death,
            strength,
        }
        .finish()
    }
}

fn pick_reference(
    errors: &mut HashMap<String, String>,
    (name_key, name): (&str, Option<String>),
    (id_key, id): (&str, Option<i32>),
) -> Option<Reference> {
    match (name, id) {
        (Some(_), Some(_)) => {
            errors.insert(id_key.to_string(), format!("Provide only one of {} or {}", name_key, id_key));
            None
        }
        (Some(name), None) => Some(Reference::Name(name)),
        (None, Some(id)) => Some(Reference::Id(id)),
        (None, None) => None,
    }
}

/// One field of a partial update: left alone, cleared, or replaced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Unset,
    Null,
    Set(T),
}

impl<T> Patch<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Unset => Patch::Unset,
            Patch::Null => Patch::Null,
            Patch::Set(v) => Patch::Set(f(v)),
        }
    }
}

// Missing keys fall back to `Unset` through `#[serde(default)]`; explicit nulls land here.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Set(value),
            None => Patch::Null,
        })
    }
}

/// Body of a partial update; keys outside this set are rejected
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CharacterUpdate {
    pub name: Patch<String>,
    pub house: Patch<String>,
    pub house_id: Patch<i32>,
    pub animal: Patch<String>,
    pub symbol: Patch<String>,
    pub nickname: Patch<String>,
    pub role: Patch<String>,
    pub age: Patch<i32>,
    pub death: Patch<i32>,
    pub strength: Patch<String>,
    pub strength_id: Patch<i32>,
}

impl CharacterUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merges the provided fields onto `current` and re-validates the result
    pub fn apply_to(self, current: CharacterDraft) -> Result<CharacterDraft, StoreError> {
        if self.is_empty() {
            return Err(StoreError::validation("No data provided", HashMap::new()));
        }

        let mut errors = HashMap::new();
        let mut draft = current;

        for (key, patch, field) in [("name", self.name, &mut draft.name), ("role", self.role, &mut draft.role)] {
            match patch {
                Patch::Set(value) => *field = value,
                Patch::Null => {
                    errors.insert(key.to_string(), "Field cannot be null".to_string());
                }
                Patch::Unset => {}
            }
        }

        merge_optional(&mut draft.animal, self.animal);
        merge_optional(&mut draft.symbol, self.symbol);
        merge_optional(&mut draft.nickname, self.nickname);
        merge_optional(&mut draft.age, self.age);
        merge_optional(&mut draft.death, self.death);

        let house = merge_reference(&mut errors, ("house", self.house), ("house_id", self.house_id));
        merge_optional(&mut draft.house, house);

        match merge_reference(&mut errors, ("strength", self.strength), ("strength_id", self.strength_id)) {
            Patch::Set(strength) => draft.strength = Some(strength),
            Patch::Null => {
                errors.insert("strength_id".to_string(), "Strength cannot be removed".to_string());
            }
            Patch::Unset => {}
        }

        if !errors.is_empty() {
            return Err(StoreError::validation("Validation error", errors));
        }
        draft.finish()
    }
}

fn merge_optional<T>(field: &mut Option<T>, patch: Patch<T>) {
    match patch {
        Patch::Set(value) => *field = Some(value),
        Patch::Null => *field = None,
        Patch::Unset => {}
    }
}

fn merge_reference(
    errors: &mut HashMap<String, String>,
    (name_key, name): (&str, Patch<String>),
    (id_key, id): (&str, Patch<i32>),
) -> Patch<Reference> {
    match (name, id) {
        (name, Patch::Unset) => name.map(Reference::Name),
        (Patch::Unset, id) => id.map(Reference::Id),
        _ => {
            errors.insert(id_key.to_string(), format!("Provide only one of {} or {}", name_key, id_key));
            Patch::Unset
        }
    }
}
