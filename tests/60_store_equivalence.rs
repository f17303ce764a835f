// Both stores must return identical pages for identical data.
//
// Needs a scratch Postgres database: set TEST_DATABASE_URL to run. The
// tables are truncated before seeding.

use std::path::Path;

use anyhow::Result;
use serde_json::json;
use tempfile::TempDir;

use character_api::config::{DatabaseConfig, PaginationConfig};
use character_api::database::{DatabaseManager, PgCharacterStore};
use character_api::filter::{Filter, QueryParams};
use character_api::seed::{load_seed_file, seed_store};
use character_api::store::{CharacterStore, CharacterUpdate, JsonFileStore, NewCharacter, StoreError};

const QUERIES: &[&str] = &[
    "",
    "limit=5",
    "limit=3&skip=4",
    "limit=3&offset=2",
    "sort_by=age",
    "sort_by=age&sort_order=desc",
    "sort_by=death",
    "sort_by=nickname&sort_order=desc",
    "sort_by=house&sort_order=desc",
    "sort_by=strength",
    "sort_by=role&sort_order=desc",
    "sort_by=bogus",
    "name=an",
    "house=lannister",
    "house=stark&sort_by=age",
    "house_id=1",
    "strength=SWORD",
    "strength_id=2&limit=1",
    "role=queen&sort_by=name&sort_order=desc",
    "animal=wolf",
    "age=38",
    "age_more_than=20&age_less_than=40",
    "age_more_than=30&sort_by=age&limit=2&skip=1",
    "name=%25",
    "house=nowhere",
];

fn params(query: &str) -> QueryParams {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.replace("%25", "%")))
        .collect()
}

fn paged() -> PaginationConfig {
    PaginationConfig { sample_when_unpaged: false, ..Default::default() }
}

async fn stores() -> Result<Option<(PgCharacterStore, JsonFileStore, TempDir)>> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping store equivalence");
        return Ok(None);
    };

    let config = DatabaseConfig { url: Some(url), max_connections: 2, connection_timeout: 10 };
    let pool = DatabaseManager::connect_and_migrate(&config).await?;
    sqlx::query("TRUNCATE characters, houses, strengths RESTART IDENTITY CASCADE").execute(&pool).await?;
    let pg = PgCharacterStore::new(pool);

    let dir = TempDir::new()?;
    let file = JsonFileStore::new(dir.path().join("characters.json"));

    let seed_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/seed.json");
    for store in [&pg as &dyn CharacterStore, &file] {
        let report = seed_store(store, load_seed_file(&seed_path).await?).await?;
        anyhow::ensure!(report.rejected == 0, "seed rejected records: {:?}", report);
    }

    Ok(Some((pg, file, dir)))
}

// One test so the truncate/seed cycle never interleaves with another test
#[tokio::test]
async fn relational_and_flat_file_stores_agree() -> Result<()> {
    let Some((pg, file, _dir)) = stores().await? else {
        return Ok(());
    };

    for query in QUERIES {
        let filter = Filter::from_params(&params(query), &paged())?;
        let relational = pg.list(&filter).await?;
        let flat = file.list(&filter).await?;

        assert_eq!(relational.characters, flat.characters, "characters differ for '{}'", query);
        assert_eq!(relational.count, flat.count, "count differs for '{}'", query);
        assert_eq!(relational.total, flat.total, "total differs for '{}'", query);
    }

    // Sampling draws from the same filtered set
    let filter = Filter::from_params(&params("house=lannister"), &PaginationConfig::default())?;
    let relational = pg.list(&filter).await?;
    let flat = file.list(&filter).await?;
    assert_eq!(relational.total, flat.total);
    assert_eq!(relational.count, flat.count);

    // Mutations land the same way
    let arya: NewCharacter = serde_json::from_value(json!({
        "name": "Arya Stark",
        "house": "Stark",
        "role": "Assassin",
        "strength": "Stealth",
        "age": 11
    }))?;
    let created = pg.create(arya.clone()).await?;
    assert_eq!(created, file.create(arya.clone()).await?);
    assert!(matches!(pg.create(arya.clone()).await, Err(StoreError::Duplicate(_))));
    assert!(matches!(file.create(arya).await, Err(StoreError::Duplicate(_))));

    let changes = || -> Result<CharacterUpdate> {
        Ok(serde_json::from_value(json!({ "house": null, "nickname": "No One", "age": 12 }))?)
    };
    let updated = pg.update(created.id, changes()?).await?;
    assert_eq!(updated, file.update(created.id, changes()?).await?);
    assert!(updated.house.is_none());
    assert_eq!(updated.nickname.as_deref(), Some("No One"));

    let strip_strength = || -> Result<CharacterUpdate> { Ok(serde_json::from_value(json!({ "strength": null }))?) };
    assert!(matches!(pg.update(created.id, strip_strength()?).await, Err(StoreError::Validation { .. })));
    assert!(matches!(file.update(created.id, strip_strength()?).await, Err(StoreError::Validation { .. })));

    pg.delete(created.id).await?;
    file.delete(created.id).await?;
    assert!(matches!(pg.get(created.id).await, Err(StoreError::NotFound(_))));
    assert!(matches!(file.get(created.id).await, Err(StoreError::NotFound(_))));

    // And the catalog reads the same afterwards
    let filter = Filter::from_params(&QueryParams::new(), &paged())?;
    assert_eq!(pg.list(&filter).await?.characters, file.list(&filter).await?.characters);
    Ok(())
}
