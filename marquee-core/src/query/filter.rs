//! Movie filter compilation.
//!
//! A [`MovieFilter`] holds one optional slot per recognized filter key. The
//! compiler turns every populated slot into exactly one [`MoviePredicate`]
//! and conjoins them onto a query handle implementing [`MovieQuery`]. The
//! handle decides how a predicate is realized (SQL fragment, in-memory
//! check); the compiler never executes anything.

use marquee_model::Movie;
use serde::{Deserialize, Serialize};

use super::pagination::Page;

/// Comparison operator used by the numeric predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Gte,
    Lte,
}

impl Comparison {
    pub fn sql_operator(self) -> &'static str {
        match self {
            Comparison::Eq => " = ",
            Comparison::Gte => " >= ",
            Comparison::Lte => " <= ",
        }
    }

    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Eq => lhs == rhs,
            Comparison::Gte => lhs >= rhs,
            Comparison::Lte => lhs <= rhs,
        }
    }
}

/// A single boolean condition over a movie record.
#[derive(Debug, Clone, PartialEq)]
pub enum MoviePredicate {
    /// Case-insensitive substring match on `name`.
    NameContains(String),
    /// Case-insensitive substring match on `director`.
    DirectorContains(String),
    /// Exact tag membership in `genre`.
    HasGenre(String),
    ImdbScore(Comparison, f64),
    /// Records without a popularity never match.
    Popularity(Comparison, f64),
}

impl MoviePredicate {
    /// Reference semantics of the predicate, used by the in-memory store
    /// and as the oracle in tests of other query handles.
    pub fn matches(&self, movie: &Movie) -> bool {
        match self {
            MoviePredicate::NameContains(needle) => {
                contains_ignore_case(&movie.name, needle)
            }
            MoviePredicate::DirectorContains(needle) => {
                contains_ignore_case(&movie.director, needle)
            }
            MoviePredicate::HasGenre(tag) => {
                movie.genre.iter().any(|g| g == tag)
            }
            MoviePredicate::ImdbScore(cmp, value) => {
                cmp.holds(movie.imdb_score, *value)
            }
            MoviePredicate::Popularity(cmp, value) => movie
                .popularity
                .is_some_and(|popularity| cmp.holds(popularity, *value)),
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// A refinable, paginable query over the movie collection.
///
/// Implementations must treat successive [`MovieQuery::and`] calls as a
/// logical AND.
pub trait MovieQuery: Sized {
    /// Conjoin one more predicate.
    fn and(self, predicate: MoviePredicate) -> Self;

    /// Restrict the result window.
    fn paginate(self, page: Page) -> Self;
}

/// Recognized filter keys, one optional slot each.
///
/// Deserializes straight from a query string; keys outside this set are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_score: Option<f64>,
    #[serde(
        default,
        rename = "imdb_score__gte",
        skip_serializing_if = "Option::is_none"
    )]
    pub imdb_score_gte: Option<f64>,
    #[serde(
        default,
        rename = "imdb_score__lte",
        skip_serializing_if = "Option::is_none"
    )]
    pub imdb_score_lte: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    #[serde(
        default,
        rename = "popularity__gte",
        skip_serializing_if = "Option::is_none"
    )]
    pub popularity_gte: Option<f64>,
    #[serde(
        default,
        rename = "popularity__lte",
        skip_serializing_if = "Option::is_none"
    )]
    pub popularity_lte: Option<f64>,
}

impl MovieFilter {
    /// The predicate table: one entry per populated key, in key order.
    pub fn predicates(&self) -> Vec<MoviePredicate> {
        let MovieFilter {
            name,
            genre,
            director,
            imdb_score,
            imdb_score_gte,
            imdb_score_lte,
            popularity,
            popularity_gte,
            popularity_lte,
        } = self;

        let text = [
            name.clone().map(MoviePredicate::NameContains),
            genre.clone().map(MoviePredicate::HasGenre),
            director.clone().map(MoviePredicate::DirectorContains),
        ];
        let numeric = [
            imdb_score.map(|v| MoviePredicate::ImdbScore(Comparison::Eq, v)),
            imdb_score_gte
                .map(|v| MoviePredicate::ImdbScore(Comparison::Gte, v)),
            imdb_score_lte
                .map(|v| MoviePredicate::ImdbScore(Comparison::Lte, v)),
            popularity.map(|v| MoviePredicate::Popularity(Comparison::Eq, v)),
            popularity_gte
                .map(|v| MoviePredicate::Popularity(Comparison::Gte, v)),
            popularity_lte
                .map(|v| MoviePredicate::Popularity(Comparison::Lte, v)),
        ];

        text.into_iter().chain(numeric).flatten().collect()
    }

    pub fn predicate_count(&self) -> usize {
        self.predicates().len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicate_count() == 0
    }

    /// Conjoin every predicate of this filter onto `base`.
    pub fn apply<Q: MovieQuery>(&self, base: Q) -> Q {
        self.predicates().into_iter().fold(base, MovieQuery::and)
    }

    /// Whether `movie` satisfies every predicate of this filter.
    pub fn matches(&self, movie: &Movie) -> bool {
        self.predicates().iter().all(|p| p.matches(movie))
    }
}
