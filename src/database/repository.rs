use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use crate::config::StoreBackend;
use crate::database::models::{CharacterRow, HouseRow, StrengthRow};
use crate::database::query_builder::{bind_param_query_as, QueryBuilder};
use crate::filter::types::SqlParam;
use crate::filter::Filter;
use crate::store::{CharacterDraft, CharacterStore, CharacterUpdate, NewCharacter, Page, Reference, StoreError};
use crate::types::{Character, House, Strength};

const RETURNING: &str = "RETURNING \"id\", \"name\", \"house_id\", \"animal\", \"symbol\", \"nickname\", \
     \"role\", \"age\", \"death\", \"strength_id\"";

/// Character store backed by the `characters`, `houses` and `strengths` tables
#[derive(Clone)]
pub struct PgCharacterStore {
    pool: PgPool,
}

impl PgCharacterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CharacterStore for PgCharacterStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Postgres
    }

    async fn list(&self, filter: &Filter) -> Result<Page, StoreError> {
        let rows: Vec<CharacterRow> = QueryBuilder::new(&filter.to_sql()).select_all(&self.pool).await?;
        let total = QueryBuilder::new(&filter.to_count_sql()).count(&self.pool).await?;

        let mut conn = self.pool.acquire().await?;
        let characters = materialize(&mut conn, rows).await?;
        Ok(Page::new(characters, total))
    }

    async fn create(&self, new: NewCharacter) -> Result<Character, StoreError> {
        let draft = new.into_draft()?;

        let mut tx = self.pool.begin().await?;
        let house_id = resolve_house(&mut tx, draft.house.clone()).await?;
        let strength_id = resolve_strength(&mut tx, draft.strength.clone()).await?;

        let query = format!(
            "INSERT INTO \"characters\" (\"name\", \"house_id\", \"animal\", \"symbol\", \"nickname\", \"role\", \
             \"age\", \"death\", \"strength_id\") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) {}",
            RETURNING
        );
        let row: CharacterRow = sqlx::query_as(&query)
            .bind(&draft.name)
            .bind(house_id)
            .bind(&draft.animal)
            .bind(&draft.symbol)
            .bind(&draft.nickname)
            .bind(&draft.role)
            .bind(draft.age)
            .bind(draft.death)
            .bind(strength_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| write_error(e, &draft.name))?;

        let character = materialize_one(&mut tx, row).await?;
        tx.commit().await?;

        tracing::info!("Created character {} ({})", character.id, character.name);
        Ok(character)
    }

    async fn update(&self, id: i32, changes: CharacterUpdate) -> Result<Character, StoreError> {
        let mut tx = self.pool.begin().await?;

        let current: CharacterRow = sqlx::query_as(
            "SELECT \"id\", \"name\", \"house_id\", \"animal\", \"symbol\", \"nickname\", \"role\", \"age\", \
             \"death\", \"strength_id\" FROM \"characters\" WHERE \"id\" = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound(id))?;

        let existing = materialize_one(&mut tx, current.clone()).await?;
        let draft = changes.apply_to(CharacterDraft::from(&existing))?;
        let house_id = resolve_house(&mut tx, draft.house.clone()).await?;
        let strength_id = resolve_strength(&mut tx, draft.strength.clone()).await?;

        let dirty = changed_columns(&current, &draft, house_id, strength_id);
        if dirty.is_empty() {
            tx.commit().await?;
            return Ok(existing);
        }

        let assignments: Vec<String> =
            dirty.iter().enumerate().map(|(i, (column, _))| format!("\"{}\" = ${}", column, i + 1)).collect();
        let query = format!(
            "UPDATE \"characters\" SET {} WHERE \"id\" = ${} {}",
            assignments.join(", "),
            dirty.len() + 1,
            RETURNING
        );

        let mut q = sqlx::query_as::<_, CharacterRow>(&query);
        for (_, param) in dirty.iter() {
            q = bind_param_query_as(q, param);
        }
        let row = q.bind(id).fetch_one(&mut *tx).await.map_err(|e| write_error(e, &draft.name))?;

        let character = materialize_one(&mut tx, row).await?;
        tx.commit().await?;

        tracing::info!("Updated character {} ({} columns)", id, dirty.len());
        Ok(character)
    }

    async fn delete(&self, id: i32) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM \"characters\" WHERE \"id\" = $1").bind(id).execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        tx.commit().await?;

        tracing::info!("Deleted character {}", id);
        Ok(())
    }

    async fn health(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Columns whose stored value differs from the merged draft
fn changed_columns(
    current: &CharacterRow,
    draft: &CharacterDraft,
    house_id: Option<i32>,
    strength_id: i32,
) -> Vec<(&'static str, SqlParam)> {
    let mut dirty = vec![];
    if current.name != draft.name {
        dirty.push(("name", SqlParam::Text(Some(draft.name.clone()))));
    }
    if current.house_id != house_id {
        dirty.push(("house_id", SqlParam::Int(house_id)));
    }
    for (column, stored, wanted) in [
        ("animal", &current.animal, &draft.animal),
        ("symbol", &current.symbol, &draft.symbol),
        ("nickname", &current.nickname, &draft.nickname),
    ] {
        if stored != wanted {
            dirty.push((column, SqlParam::Text(wanted.clone())));
        }
    }
    if current.role != draft.role {
        dirty.push(("role", SqlParam::Text(Some(draft.role.clone()))));
    }
    if current.age != draft.age {
        dirty.push(("age", SqlParam::Int(draft.age)));
    }
    if current.death != draft.death {
        dirty.push(("death", SqlParam::Int(draft.death)));
    }
    if current.strength_id != strength_id {
        dirty.push(("strength_id", SqlParam::Int(Some(strength_id))));
    }
    dirty
}

fn write_error(err: sqlx::Error, name: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate(name.to_string());
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::invalid_field("house_id", "Referenced house or strength does not exist");
        }
    }
    err.into()
}

async fn resolve_house(conn: &mut PgConnection, reference: Option<Reference>) -> Result<Option<i32>, StoreError> {
    match reference {
        None => Ok(None),
        Some(Reference::Id(id)) => {
            let found: Option<i32> = sqlx::query_scalar("SELECT \"id\" FROM \"houses\" WHERE \"id\" = $1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;
            found
                .map(Some)
                .ok_or_else(|| StoreError::invalid_field("house_id", format!("House {} does not exist", id)))
        }
        Some(Reference::Name(name)) => find_or_create(conn, "houses", "name", &name).await.map(Some),
    }
}

async fn resolve_strength(conn: &mut PgConnection, reference: Option<Reference>) -> Result<i32, StoreError> {
    match reference {
        None => Err(StoreError::invalid_field("strength_id", "A strength or strength_id is required")),
        Some(Reference::Id(id)) => {
            let found: Option<i32> = sqlx::query_scalar("SELECT \"id\" FROM \"strengths\" WHERE \"id\" = $1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;
            found.ok_or_else(|| StoreError::invalid_field("strength_id", format!("Strength {} does not exist", id)))
        }
        Some(Reference::Name(description)) => find_or_create(conn, "strengths", "description", &description).await,
    }
}

/// Id of the row labelled `value`, inserting it first when missing.
///
/// Looks up before inserting so existing labels do not consume sequence values.
async fn find_or_create(
    conn: &mut PgConnection,
    table: &'static str,
    column: &'static str,
    value: &str,
) -> Result<i32, StoreError> {
    let select = format!("SELECT \"id\" FROM \"{table}\" WHERE \"{column}\" = $1");
    let existing: Option<i32> = sqlx::query_scalar(&select).bind(value).fetch_optional(&mut *conn).await?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let insert = format!(
        "INSERT INTO \"{table}\" (\"{column}\") VALUES ($1) ON CONFLICT (\"{column}\") DO NOTHING RETURNING \"id\""
    );
    let inserted: Option<i32> = sqlx::query_scalar(&insert).bind(value).fetch_optional(&mut *conn).await?;
    if let Some(id) = inserted {
        tracing::debug!("Created {} row {} for '{}'", table, id, value);
        return Ok(id);
    }

    // A concurrent transaction inserted the same label first
    let id: i32 = sqlx::query_scalar(&select).bind(value).fetch_one(&mut *conn).await?;
    Ok(id)
}

async fn materialize_one(conn: &mut PgConnection, row: CharacterRow) -> Result<Character, StoreError> {
    let id = row.id;
    materialize(conn, vec![row]).await?.pop().ok_or(StoreError::NotFound(id))
}

/// Replaces foreign keys with their nested house/strength, preserving row order
async fn materialize(conn: &mut PgConnection, rows: Vec<CharacterRow>) -> Result<Vec<Character>, StoreError> {
    let house_ids: Vec<i32> = rows.iter().filter_map(|r| r.house_id).collect::<BTreeSet<_>>().into_iter().collect();
    let strength_ids: Vec<i32> = rows.iter().map(|r| r.strength_id).collect::<BTreeSet<_>>().into_iter().collect();

    let houses: HashMap<i32, House> = if house_ids.is_empty() {
        HashMap::new()
    } else {
        sqlx::query_as::<_, HouseRow>("SELECT \"id\", \"name\" FROM \"houses\" WHERE \"id\" = ANY($1)")
            .bind(&house_ids)
            .fetch_all(&mut *conn)
            .await?
            .into_iter()
            .map(|h| (h.id, House::from(h)))
            .collect()
    };
    let strengths: HashMap<i32, Strength> = if strength_ids.is_empty() {
        HashMap::new()
    } else {
        sqlx::query_as::<_, StrengthRow>("SELECT \"id\", \"description\" FROM \"strengths\" WHERE \"id\" = ANY($1)")
            .bind(&strength_ids)
            .fetch_all(&mut *conn)
            .await?
            .into_iter()
            .map(|s| (s.id, Strength::from(s)))
            .collect()
    };

    Ok(rows
        .into_iter()
        .map(|row| Character {
            id: row.id,
            name: row.name,
            house: row.house_id.and_then(|id| houses.get(&id).cloned()),
            animal: row.animal,
            symbol: row.symbol,
            nickname: row.nickname,
            role: row.role,
            age: row.age,
            death: row.death,
            strength: strengths.get(&row.strength_id).cloned(),
        })
        .collect())
}
