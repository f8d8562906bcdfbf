use rizq_core::{Result, RizqError, TimeSlot};

use crate::{
    cache::{self, CATALOG_TTL},
    database::{Database, sqlx_err},
    model::{
        dua::Dua,
        journey::{Journey, JourneyDetail, JourneyDua},
    },
};

#[derive(sqlx::FromRow)]
struct JourneyRow {
    id: i64,
    title: String,
    description: Option<String>,
    sort_order: i32,
}

#[derive(sqlx::FromRow)]
struct JourneyDuaRow {
    id: i64,
    category_id: i64,
    title: String,
    arabic_text: String,
    transliteration: Option<String>,
    translation: String,
    source: Option<String>,
    xp_reward: i32,
    sort_order: i32,
    time_slot: String,
    position: i32,
}

fn to_journey(row: JourneyRow) -> Journey {
    Journey {
        id: row.id,
        title: row.title,
        description: row.description,
        sort_order: row.sort_order,
    }
}

fn to_journey_dua(row: JourneyDuaRow) -> Result<JourneyDua> {
    // The slot column is free text at the SQL level; parsing it here is the
    // typed-decode step that keeps bad rows out of the domain.
    let time_slot: TimeSlot = row.time_slot.parse()?;

    Ok(JourneyDua {
        dua: Dua {
            id: row.id,
            category_id: row.category_id,
            title: row.title,
            arabic_text: row.arabic_text,
            transliteration: row.transliteration,
            translation: row.translation,
            source: row.source,
            xp_reward: row.xp_reward,
            sort_order: row.sort_order,
        },
        time_slot,
        position: row.position,
    })
}

pub async fn list_journeys(db: &Database) -> Result<Vec<Journey>> {
    let key = cache::journey_list_key(db.cache());

    db.cache()
        .get_or_load_json(&key, CATALOG_TTL, || async move {
            let rows: Vec<JourneyRow> = sqlx::query_as(
                "SELECT id, title, description, sort_order FROM journeys ORDER BY sort_order, id",
            )
            .fetch_all(db.pool())
            .await
            .map_err(|e| sqlx_err(e, "journeys"))?;

            Ok(rows.into_iter().map(to_journey).collect())
        })
        .await
}

/// A journey with its member duas in journey order.
pub async fn get_journey(db: &Database, journey_id: i64) -> Result<JourneyDetail> {
    let key = cache::journey_key(db.cache(), journey_id);

    db.cache()
        .get_or_load_json(&key, CATALOG_TTL, || async move {
            let row: Option<JourneyRow> = sqlx::query_as(
                "SELECT id, title, description, sort_order FROM journeys WHERE id = $1",
            )
            .bind(journey_id)
            .fetch_optional(db.pool())
            .await
            .map_err(|e| sqlx_err(e, "journey"))?;
            let journey = to_journey(row.ok_or_else(|| RizqError::not_found("journey"))?);

            let rows: Vec<JourneyDuaRow> = sqlx::query_as(
                "SELECT d.id, d.category_id, d.title, d.arabic_text, d.transliteration,
                        d.translation, d.source, d.xp_reward, d.sort_order,
                        jd.time_slot, jd.position
                 FROM journey_duas jd
                 JOIN duas d ON d.id = jd.dua_id
                 WHERE jd.journey_id = $1
                 ORDER BY jd.position, d.id",
            )
            .bind(journey_id)
            .fetch_all(db.pool())
            .await
            .map_err(|e| sqlx_err(e, "journey duas"))?;

            let duas = rows
                .into_iter()
                .map(to_journey_dua)
                .collect::<Result<Vec<_>>>()?;

            Ok(JourneyDetail { journey, duas })
        })
        .await
}
