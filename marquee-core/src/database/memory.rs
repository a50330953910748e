use async_trait::async_trait;
use marquee_model::{
    Movie, MovieUpdate, NewMovie, NewUser, User, UserUpdate,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::ports::{MoviesRepository, UsersRepository};
use crate::error::{DomainError, Result};
use crate::query::memory::compile;
use crate::query::{MovieFilter, Page};

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<StoredUser>,
    // Kept in insertion order; listing relies on it.
    movies: Vec<Movie>,
}

impl Tables {
    fn user_mut(&mut self, id: Uuid) -> Result<&mut StoredUser> {
        self.users
            .iter_mut()
            .find(|stored| stored.user.id == id)
            .ok_or_else(|| DomainError::NotFound(format!("user {id}")))
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users.iter().any(|stored| {
            stored.user.email == email && Some(stored.user.id) != except
        })
    }

    fn has_user(&self, id: Uuid) -> bool {
        self.users.iter().any(|stored| stored.user.id == id)
    }
}

/// In-process store implementing both repository ports.
///
/// Used by the test suites and by dev mode when no database is configured.
/// Cloning shares the underlying tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsersRepository for MemoryStore {
    async fn create_user(
        &self,
        user: &NewUser,
        password_hash: &str,
    ) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email, None) {
            return Err(DomainError::Conflict(format!(
                "A user with email {} already exists",
                user.email
            )));
        }

        let record = User::from_new(user.clone());
        tables.users.push(StoredUser {
            user: record.clone(),
            password_hash: password_hash.to_string(),
        });
        info!(user_id = %record.id, is_admin = record.is_admin, "created user");
        Ok(record)
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|stored| stored.user.id == id)
            .map(|stored| stored.user.clone()))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|stored| stored.user.email == email)
            .map(|stored| stored.user.clone()))
    }

    async fn update_user(&self, id: Uuid, update: &UserUpdate) -> Result<User> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &update.email
            && tables.email_taken(email, Some(id))
        {
            return Err(DomainError::Conflict(format!(
                "A user with email {email} already exists"
            )));
        }

        let stored = tables.user_mut(id)?;
        stored.user.apply_update(update);
        Ok(stored.user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.movies.iter().any(|movie| movie.created_by_id == id) {
            return Err(DomainError::Conflict(format!(
                "user {id} still owns movies"
            )));
        }
        let before = tables.users.len();
        tables.users.retain(|stored| stored.user.id != id);
        if tables.users.len() == before {
            return Err(DomainError::NotFound(format!("user {id}")));
        }
        info!(user_id = %id, "deleted user");
        Ok(())
    }

    async fn get_password_hash(&self, user_id: Uuid) -> Result<Option<String>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|stored| stored.user.id == user_id)
            .map(|stored| stored.password_hash.clone()))
    }

    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let stored = tables.user_mut(user_id)?;
        stored.password_hash = password_hash.to_string();
        stored.user.updated_at = chrono::Utc::now();
        info!(user_id = %user_id, "updated password");
        Ok(())
    }
}

#[async_trait]
impl MoviesRepository for MemoryStore {
    async fn list_movies(
        &self,
        filter: &MovieFilter,
        page: Page,
    ) -> Result<Vec<Movie>> {
        let query = compile(filter, page);
        let tables = self.tables.read().await;
        debug!(
            predicates = query.predicates().len(),
            offset = page.offset,
            limit = page.limit,
            "listing movies"
        );
        Ok(query.execute(&tables.movies))
    }

    async fn get_movie(&self, id: Uuid) -> Result<Option<Movie>> {
        let tables = self.tables.read().await;
        Ok(tables.movies.iter().find(|movie| movie.id == id).cloned())
    }

    async fn create_movie(
        &self,
        movie: NewMovie,
        owner: Uuid,
    ) -> Result<Movie> {
        let mut tables = self.tables.write().await;
        if !tables.has_user(owner) {
            return Err(DomainError::NotFound(format!("owner {owner}")));
        }
        let record = Movie::from_new(movie, owner);
        tables.movies.push(record.clone());
        info!(movie_id = %record.id, owner = %owner, "created movie");
        Ok(record)
    }

    async fn bulk_insert(&self, movies: Vec<Movie>) -> Result<u64> {
        let mut tables = self.tables.write().await;
        if let Some(orphan) =
            movies.iter().find(|m| !tables.has_user(m.created_by_id))
        {
            return Err(DomainError::NotFound(format!(
                "owner {}",
                orphan.created_by_id
            )));
        }
        let count = movies.len() as u64;
        tables.movies.extend(movies);
        info!(count, "bulk inserted movies");
        Ok(count)
    }

    async fn update_movie(
        &self,
        id: Uuid,
        update: &MovieUpdate,
    ) -> Result<Movie> {
        let mut tables = self.tables.write().await;
        let movie = tables
            .movies
            .iter_mut()
            .find(|movie| movie.id == id)
            .ok_or_else(|| DomainError::NotFound(format!("movie {id}")))?;
        movie.apply_update(update);
        info!(movie_id = %id, "updated movie");
        Ok(movie.clone())
    }

    async fn delete_movie(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        let before = tables.movies.len();
        tables.movies.retain(|movie| movie.id != id);
        if tables.movies.len() == before {
            return Err(DomainError::NotFound(format!("movie {id}")));
        }
        info!(movie_id = %id, "deleted movie");
        Ok(())
    }

    async fn count_movies(&self) -> Result<u64> {
        Ok(self.tables.read().await.movies.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_movie(name: &str, score: f64, genre: &[&str]) -> NewMovie {
        NewMovie {
            name: name.to_string(),
            director: "Someone".to_string(),
            popularity: None,
            imdb_score: score,
            genre: genre.iter().map(|g| g.to_string()).collect(),
        }
    }

    async fn store_with_admin() -> (MemoryStore, User) {
        let store = MemoryStore::new();
        let admin = store
            .create_user(&NewUser::admin("Admin", "root@example.com"), "hash")
            .await
            .unwrap();
        (store, admin)
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_without_writing() {
        let (store, _) = store_with_admin().await;
        let err = store
            .create_user(&NewUser::regular("Other", "root@example.com"), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(store.tables.read().await.users.len(), 1);
    }

    #[tokio::test]
    async fn password_hash_round_trips_through_update() {
        let (store, admin) = store_with_admin().await;
        store.update_password(admin.id, "new-hash").await.unwrap();
        assert_eq!(
            store.get_password_hash(admin.id).await.unwrap().as_deref(),
            Some("new-hash")
        );
    }

    #[tokio::test]
    async fn partial_user_update_keeps_unset_fields() {
        let (store, admin) = store_with_admin().await;

        let updated = store
            .update_user(
                admin.id,
                &UserUpdate {
                    full_name: Some("Root".into()),
                    is_active: Some(false),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.full_name, "Root");
        assert!(!updated.is_active);
        assert_eq!(updated.email, admin.email);
        assert!(updated.is_admin);
        assert_eq!(updated.created_at, admin.created_at);
        assert_eq!(
            store.get_user_by_id(admin.id).await.unwrap(),
            Some(updated)
        );
        assert_eq!(
            store.get_password_hash(admin.id).await.unwrap().as_deref(),
            Some("hash")
        );
    }

    #[tokio::test]
    async fn user_may_keep_own_email_on_update() {
        let (store, admin) = store_with_admin().await;
        let updated = store
            .update_user(
                admin.id,
                &UserUpdate {
                    email: Some(admin.email.clone()),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, admin.email);
    }

    #[tokio::test]
    async fn taking_another_users_email_is_a_conflict() {
        let (store, admin) = store_with_admin().await;
        let viewer = store
            .create_user(&NewUser::regular("Viewer", "viewer@example.com"), "x")
            .await
            .unwrap();

        let err = store
            .update_user(
                viewer.id,
                &UserUpdate {
                    email: Some(admin.email.clone()),
                    full_name: Some("Renamed".into()),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(
            store.get_user_by_id(viewer.id).await.unwrap(),
            Some(viewer)
        );
    }

    #[tokio::test]
    async fn updating_missing_user_is_not_found() {
        let (store, _) = store_with_admin().await;
        let err = store
            .update_user(
                Uuid::new_v4(),
                &UserUpdate {
                    full_name: Some("Ghost".into()),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_keeps_owner_and_refreshes_timestamp() {
        let (store, admin) = store_with_admin().await;
        let created = store
            .create_movie(new_movie("Psycho", 8.3, &["horror"]), admin.id)
            .await
            .unwrap();

        let updated = store
            .update_movie(
                created.id,
                &MovieUpdate {
                    imdb_score: Some(8.5),
                    ..MovieUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.imdb_score, 8.5);
        assert_eq!(updated.name, "Psycho");
        assert_eq!(updated.created_by_id, admin.id);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn list_applies_filter_in_insertion_order() {
        let (store, admin) = store_with_admin().await;
        for (name, score, genre) in [
            ("Star Wars", 8.8, ["sci-fi"]),
            ("King Kong", 8.0, ["adventure"]),
            ("The Matrix", 8.7, ["sci-fi"]),
        ] {
            store
                .create_movie(new_movie(name, score, &genre), admin.id)
                .await
                .unwrap();
        }

        let filter = MovieFilter {
            genre: Some("sci-fi".into()),
            ..MovieFilter::default()
        };
        let names: Vec<_> = store
            .list_movies(&filter, Page::default())
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, ["Star Wars", "The Matrix"]);

        let second = store
            .list_movies(&MovieFilter::default(), Page::new(1, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(second[0].name, "King Kong");
    }

    #[tokio::test]
    async fn missing_records_surface_not_found() {
        let (store, admin) = store_with_admin().await;
        let missing = Uuid::new_v4();
        assert!(matches!(
            store.delete_movie(missing).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            store.update_movie(missing, &MovieUpdate::default()).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            store.create_movie(new_movie("x", 1.0, &[]), missing).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(store.get_movie(missing).await.unwrap().is_none());
        assert!(store.get_user_by_id(admin.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn owner_with_movies_cannot_be_deleted() {
        let (store, admin) = store_with_admin().await;
        store
            .create_movie(new_movie("Psycho", 8.3, &[]), admin.id)
            .await
            .unwrap();
        assert!(matches!(
            store.delete_user(admin.id).await,
            Err(DomainError::Conflict(_))
        ));
        assert_eq!(store.count_movies().await.unwrap(), 1);
    }
}
