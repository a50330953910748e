//! Initial data: the bootstrap administrator and the movie fixture.
//!
//! The fixture is a JSON array of objects shaped like
//!
//! ```json
//! {"99popularity": 83.0, "director": "Victor Fleming",
//!  "genre": ["Adventure", "Family"], "imdb_score": 8.3, "name": "The Wizard of Oz"}
//! ```
//!
//! Seeding only runs against an empty catalog; a database that already
//! holds at least one movie is left untouched.

use std::path::Path;

use marquee_model::{Movie, NewMovie, NewUser, User};
use serde::Deserialize;
use tracing::info;

use crate::crypto::AuthCrypto;
use crate::database::ports::{MoviesRepository, UsersRepository};
use crate::error::Result;

/// Credentials for the account that owns the seeded catalog.
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FixtureMovie {
    pub name: String,
    pub director: String,
    #[serde(rename = "99popularity")]
    pub popularity: Option<f64>,
    pub imdb_score: f64,
    #[serde(default)]
    pub genre: Vec<String>,
}

impl FixtureMovie {
    fn into_movie(self, owner: uuid::Uuid) -> Movie {
        let new = NewMovie {
            name: self.name.trim().to_string(),
            director: self.director.trim().to_string(),
            popularity: self.popularity,
            imdb_score: self.imdb_score,
            genre: self
                .genre
                .into_iter()
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty())
                .collect(),
        };
        Movie::from_new(new, owner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub admin_created: bool,
    pub movies_inserted: u64,
    /// The catalog already had data; nothing was written.
    pub skipped: bool,
}

pub fn load_fixture(path: &Path) -> Result<Vec<FixtureMovie>> {
    let raw = std::fs::read_to_string(path)?;
    let movies: Vec<FixtureMovie> = serde_json::from_str(&raw)?;
    Ok(movies)
}

/// Look up the bootstrap administrator by email, creating it if missing.
///
/// Returns the account and whether it was created by this call.
pub async fn ensure_admin(
    users: &dyn UsersRepository,
    crypto: &AuthCrypto,
    admin: &AdminAccount,
) -> Result<(User, bool)> {
    if let Some(existing) = users.get_user_by_email(&admin.email).await? {
        return Ok((existing, false));
    }

    let hash = crypto.hash_password(&admin.password)?;
    let user = users
        .create_user(&NewUser::admin(&admin.full_name, &admin.email), &hash)
        .await?;
    info!(
        target: "user.admin",
        user_id = %user.id,
        "created bootstrap administrator"
    );
    Ok((user, true))
}

/// Create the administrator and load `fixture` when the catalog is empty.
pub async fn seed_catalog(
    users: &dyn UsersRepository,
    movies: &dyn MoviesRepository,
    crypto: &AuthCrypto,
    admin: &AdminAccount,
    fixture: Vec<FixtureMovie>,
) -> Result<SeedReport> {
    if movies.count_movies().await? > 0 {
        info!("catalog already populated, skipping seed");
        return Ok(SeedReport {
            admin_created: false,
            movies_inserted: 0,
            skipped: true,
        });
    }

    let (owner, admin_created) = ensure_admin(users, crypto, admin).await?;
    let records: Vec<Movie> = fixture
        .into_iter()
        .map(|movie| movie.into_movie(owner.id))
        .collect();
    let movies_inserted = movies.bulk_insert(records).await?;

    info!(count = movies_inserted, owner = %owner.id, "seeded catalog");
    Ok(SeedReport {
        admin_created,
        movies_inserted,
        skipped: false,
    })
}
