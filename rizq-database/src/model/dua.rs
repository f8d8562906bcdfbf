use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// A devotional text item the user completes via recitation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dua {
    pub id: i64,
    pub category_id: i64,
    pub title: String,
    pub arabic_text: String,
    pub transliteration: Option<String>,
    pub translation: String,
    pub source: Option<String>,
    pub xp_reward: i32,
    pub sort_order: i32,
}

/// A dua joined with its parent category, for detail views.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuaWithCategory {
    pub dua: Dua,
    pub category: Category,
}
