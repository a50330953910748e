use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A movie in the catalog.
///
/// `created_by_id` is the owning user. It is assigned when the record is
/// created and no update path rewrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: Uuid,
    pub name: String,
    pub director: String,
    pub popularity: Option<f64>,
    pub imdb_score: f64,
    pub genre: Vec<String>,
    pub created_by_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Movie {
    /// Materialize a new record owned by `owner`.
    pub fn from_new(new: NewMovie, owner: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: new.name,
            director: new.director,
            popularity: new.popularity,
            imdb_score: new.imdb_score,
            genre: new.genre,
            created_by_id: owner,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update. Fields left as `None` are untouched and the
    /// owner reference is never modified.
    pub fn apply_update(&mut self, update: &MovieUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(director) = &update.director {
            self.director = director.clone();
        }
        if let Some(popularity) = update.popularity {
            self.popularity = Some(popularity);
        }
        if let Some(score) = update.imdb_score {
            self.imdb_score = score;
        }
        if let Some(genre) = &update.genre {
            self.genre = genre.clone();
        }
        self.updated_at = Utc::now();
    }
}

/// Payload accepted when creating a movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMovie {
    pub name: String,
    pub director: String,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub imdb_score: f64,
    pub genre: Vec<String>,
}

impl NewMovie {
    /// Fill in a missing popularity from the IMDb score (score x 10).
    pub fn with_derived_popularity(mut self) -> Self {
        if self.popularity.is_none() {
            self.popularity = Some(self.imdb_score * 10.0);
        }
        self
    }
}

/// Partial update for a movie; only supplied fields change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<Vec<String>>,
}
