use rizq_core::{Result, RizqError};

use crate::{
    cache::{self, CATALOG_TTL},
    database::{Database, sqlx_err},
    model::dua::{Category, Dua, DuaWithCategory},
};

#[derive(sqlx::FromRow)]
struct DuaRow {
    id: i64,
    category_id: i64,
    title: String,
    arabic_text: String,
    transliteration: Option<String>,
    translation: String,
    source: Option<String>,
    xp_reward: i32,
    sort_order: i32,
}

#[derive(sqlx::FromRow)]
struct DuaWithCategoryRow {
    id: i64,
    category_id: i64,
    title: String,
    arabic_text: String,
    transliteration: Option<String>,
    translation: String,
    source: Option<String>,
    xp_reward: i32,
    sort_order: i32,
    category_name: String,
    category_slug: String,
}

fn to_dua(row: DuaRow) -> Result<Dua> {
    if row.xp_reward < 0 {
        return Err(RizqError::validation(format!(
            "dua {} has negative xp_reward {}",
            row.id, row.xp_reward
        )));
    }

    Ok(Dua {
        id: row.id,
        category_id: row.category_id,
        title: row.title,
        arabic_text: row.arabic_text,
        transliteration: row.transliteration,
        translation: row.translation,
        source: row.source,
        xp_reward: row.xp_reward,
        sort_order: row.sort_order,
    })
}

const DUA_COLUMNS: &str =
    "id, category_id, title, arabic_text, transliteration, translation, source, xp_reward, sort_order";

/// All duas in catalog order, optionally narrowed to one category. The
/// unfiltered list is the hot path and goes through the cache.
pub async fn list_duas(db: &Database, category_id: Option<i64>) -> Result<Vec<Dua>> {
    if let Some(category_id) = category_id {
        let rows: Vec<DuaRow> = sqlx::query_as(&format!(
            "SELECT {DUA_COLUMNS} FROM duas WHERE category_id = $1 ORDER BY sort_order, id"
        ))
        .bind(category_id)
        .fetch_all(db.pool())
        .await
        .map_err(|e| sqlx_err(e, "duas"))?;

        return rows.into_iter().map(to_dua).collect();
    }

    let key = cache::dua_list_key(db.cache());
    db.cache()
        .get_or_load_json(&key, CATALOG_TTL, || async move {
            let rows: Vec<DuaRow> = sqlx::query_as(&format!(
                "SELECT {DUA_COLUMNS} FROM duas ORDER BY sort_order, id"
            ))
            .fetch_all(db.pool())
            .await
            .map_err(|e| sqlx_err(e, "duas"))?;

            rows.into_iter().map(to_dua).collect()
        })
        .await
}

/// A single dua joined with its parent category.
pub async fn get_dua(db: &Database, dua_id: i64) -> Result<DuaWithCategory> {
    let row: Option<DuaWithCategoryRow> = sqlx::query_as(
        "SELECT d.id, d.category_id, d.title, d.arabic_text, d.transliteration,
                d.translation, d.source, d.xp_reward, d.sort_order,
                c.name AS category_name, c.slug AS category_slug
         FROM duas d
         JOIN categories c ON c.id = d.category_id
         WHERE d.id = $1",
    )
    .bind(dua_id)
    .fetch_optional(db.pool())
    .await
    .map_err(|e| sqlx_err(e, "dua"))?;

    let row = row.ok_or_else(|| RizqError::not_found("dua"))?;
    let category = Category {
        id: row.category_id,
        name: row.category_name,
        slug: row.category_slug,
    };
    let dua = to_dua(DuaRow {
        id: row.id,
        category_id: row.category_id,
        title: row.title,
        arabic_text: row.arabic_text,
        transliteration: row.transliteration,
        translation: row.translation,
        source: row.source,
        xp_reward: row.xp_reward,
        sort_order: row.sort_order,
    })?;

    Ok(DuaWithCategory { dua, category })
}

pub async fn list_categories(db: &Database) -> Result<Vec<Category>> {
    let rows: Vec<(i64, String, String)> =
        sqlx::query_as("SELECT id, name, slug FROM categories ORDER BY name")
            .fetch_all(db.pool())
            .await
            .map_err(|e| sqlx_err(e, "categories"))?;

    Ok(rows
        .into_iter()
        .map(|(id, name, slug)| Category { id, name, slug })
        .collect())
}
