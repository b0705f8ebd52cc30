use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::storage::StoredImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleSort {
    Recent,
    Oldest,
    MostViewed,
}

impl ArticleSort {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "recent" => Some(ArticleSort::Recent),
            "oldest" => Some(ArticleSort::Oldest),
            "mostViewed" => Some(ArticleSort::MostViewed),
            _ => None,
        }
    }

    pub fn order_by(&self) -> &'static str {
        match self {
            ArticleSort::Recent => "a.created_at DESC, a.id DESC",
            ArticleSort::Oldest => "a.created_at ASC, a.id ASC",
            ArticleSort::MostViewed => "a.view_count DESC, a.id DESC",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ArticleCard {
    pub id: i64,
    pub publication_date: DateTime<Utc>,
    pub nutritionist_id: i64,
    pub title: String,
    pub nutritionist_name: String,
    pub nutritionist_profile_picture: Option<String>,
    pub nutritionist_focus: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDetails {
    pub image: String,
    pub publication_date: DateTime<Utc>,
    pub title: String,
    pub nutritionist_id: i64,
    pub text: String,
    pub view_count: i64,
    pub nutritionist_name: String,
    pub nutritionist_profile_picture: Option<String>,
    pub nutritionist_focus: String,
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub body: String,
    pub nutritionist_id: i64,
    pub image: StoredImage,
}
