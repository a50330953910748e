use sqlx::{Postgres, QueryBuilder};

use super::filter::{MoviePredicate, MovieQuery};
use super::pagination::Page;

pub(crate) const MOVIE_COLUMNS: &str = "id, name, director, popularity, \
     imdb_score, genre, created_by_id, created_at, updated_at";

/// Query handle backed by an SQLx [`QueryBuilder`].
///
/// Every predicate is appended as ` AND <fragment>` with its value bound as
/// a parameter; pagination is rendered last by [`PgMovieQuery::into_builder`].
pub struct PgMovieQuery {
    qb: QueryBuilder<'static, Postgres>,
    page: Option<Page>,
}

impl std::fmt::Debug for PgMovieQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgMovieQuery")
            .field("sql", &self.qb.sql())
            .field("page", &self.page)
            .finish()
    }
}

impl Default for PgMovieQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl PgMovieQuery {
    pub fn new() -> Self {
        let qb = QueryBuilder::new(format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE TRUE"
        ));
        Self { qb, page: None }
    }

    /// Finish the statement: stable ordering plus the pagination window.
    pub fn into_builder(mut self) -> QueryBuilder<'static, Postgres> {
        self.qb.push(" ORDER BY created_at ASC, id ASC");
        if let Some(page) = self.page {
            self.qb.push(" LIMIT ");
            self.qb.push_bind(clamp_i64(page.limit));
            self.qb.push(" OFFSET ");
            self.qb.push_bind(clamp_i64(page.offset));
        }
        self.qb
    }

    fn push_predicate(&mut self, predicate: MoviePredicate) {
        self.qb.push(" AND ");
        match predicate {
            MoviePredicate::NameContains(needle) => {
                self.qb.push("name ILIKE ");
                self.qb.push_bind(like_pattern(&needle));
            }
            MoviePredicate::DirectorContains(needle) => {
                self.qb.push("director ILIKE ");
                self.qb.push_bind(like_pattern(&needle));
            }
            MoviePredicate::HasGenre(tag) => {
                self.qb.push_bind(tag);
                self.qb.push(" = ANY(genre)");
            }
            MoviePredicate::ImdbScore(cmp, value) => {
                self.qb.push("imdb_score");
                self.qb.push(cmp.sql_operator());
                self.qb.push_bind(value);
            }
            MoviePredicate::Popularity(cmp, value) => {
                self.qb.push("popularity");
                self.qb.push(cmp.sql_operator());
                self.qb.push_bind(value);
            }
        }
    }
}

impl MovieQuery for PgMovieQuery {
    fn and(mut self, predicate: MoviePredicate) -> Self {
        self.push_predicate(predicate);
        self
    }

    fn paginate(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// `%needle%` with LIKE metacharacters escaped, so the needle matches
/// literally.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::MovieFilter;

    fn sql_for(filter: &MovieFilter, page: Option<Page>) -> String {
        let mut query = filter.apply(PgMovieQuery::new());
        if let Some(page) = page {
            query = query.paginate(page);
        }
        query.into_builder().sql().to_string()
    }

    #[test]
    fn empty_filter_has_no_predicates() {
        let sql = sql_for(&MovieFilter::default(), None);
        assert!(sql.ends_with(
            "FROM movies WHERE TRUE ORDER BY created_at ASC, id ASC"
        ));
        assert!(!sql.contains(" AND "));
    }

    #[test]
    fn each_key_adds_one_bound_conjunct() {
        let filter = MovieFilter {
            name: Some("star".into()),
            genre: Some("sci-fi".into()),
            imdb_score_gte: Some(8.0),
            imdb_score_lte: Some(9.0),
            ..Default::default()
        };
        let sql = sql_for(&filter, None);
        assert_eq!(sql.matches(" AND ").count(), 4);
        assert!(sql.contains("name ILIKE $1"));
        assert!(sql.contains("$2 = ANY(genre)"));
        assert!(sql.contains("imdb_score >= $3"));
        assert!(sql.contains("imdb_score <= $4"));
        assert!(!sql.contains(" OR "));
    }

    #[test]
    fn popularity_operators() {
        let filter = MovieFilter {
            popularity: Some(80.0),
            popularity_gte: Some(70.0),
            popularity_lte: Some(90.0),
            director: Some("nolan".into()),
            ..Default::default()
        };
        let sql = sql_for(&filter, None);
        assert!(sql.contains("director ILIKE $1"));
        assert!(sql.contains("popularity = $2"));
        assert!(sql.contains("popularity >= $3"));
        assert!(sql.contains("popularity <= $4"));
    }

    #[test]
    fn pagination_rendered_after_ordering() {
        let filter = MovieFilter {
            imdb_score: Some(9.0),
            ..Default::default()
        };
        let sql = sql_for(&filter, Some(Page::new(3, 10).unwrap()));
        assert!(
            sql.ends_with("ORDER BY created_at ASC, id ASC LIMIT $2 OFFSET $3")
        );
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
        assert_eq!(like_pattern(""), "%%");
    }
}
