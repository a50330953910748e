use marquee_model::Movie;

use super::filter::{MovieFilter, MoviePredicate, MovieQuery};
use super::pagination::Page;

/// Query handle evaluated against an in-memory snapshot.
#[derive(Debug, Clone, Default)]
pub struct MemoryMovieQuery {
    predicates: Vec<MoviePredicate>,
    page: Option<Page>,
}

impl MemoryMovieQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn predicates(&self) -> &[MoviePredicate] {
        &self.predicates
    }

    /// Run the query over `movies`, preserving their order.
    pub fn execute<'a, I>(&self, movies: I) -> Vec<Movie>
    where
        I: IntoIterator<Item = &'a Movie>,
    {
        let matching = movies
            .into_iter()
            .filter(|movie| self.predicates.iter().all(|p| p.matches(movie)));

        match self.page {
            Some(page) => matching
                .skip(page.offset_usize())
                .take(page.limit_usize())
                .cloned()
                .collect(),
            None => matching.cloned().collect(),
        }
    }
}

impl MovieQuery for MemoryMovieQuery {
    fn and(mut self, predicate: MoviePredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    fn paginate(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }
}

/// Convenience: compile `filter` onto a fresh handle and paginate it.
pub fn compile(filter: &MovieFilter, page: Page) -> MemoryMovieQuery {
    filter.apply(MemoryMovieQuery::new()).paginate(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_model::NewMovie;
    use uuid::Uuid;

    fn catalog() -> Vec<Movie> {
        let owner = Uuid::new_v4();
        [
            ("Star Wars", "George Lucas", 8.2, vec!["adventure", "sci-fi"]),
            ("Interstellar", "Christopher Nolan", 9.0, vec!["drama", "sci-fi"]),
            ("The Dark Knight", "Nolan", 9.5, vec!["action", "sci-fi"]),
            ("Twelve Angry Men", "Sidney Lumet", 9.8, vec!["drama"]),
        ]
        .into_iter()
        .map(|(name, director, score, genre)| {
            Movie::from_new(
                NewMovie {
                    name: name.into(),
                    director: director.into(),
                    popularity: Some(score * 10.0),
                    imdb_score: score,
                    genre: genre.into_iter().map(String::from).collect(),
                },
                owner,
            )
        })
        .collect()
    }

    fn names(movies: &[Movie]) -> Vec<&str> {
        movies.iter().map(|m| m.name.as_str()).collect()
    }

    fn run(filter: MovieFilter) -> Vec<Movie> {
        let movies = catalog();
        compile(&filter, Page::default()).execute(&movies)
    }

    #[test]
    fn score_lower_bound() {
        let found = run(MovieFilter {
            imdb_score_gte: Some(9.0),
            ..Default::default()
        });
        assert_eq!(
            names(&found),
            ["Interstellar", "The Dark Knight", "Twelve Angry Men"]
        );
    }

    #[test]
    fn score_closed_range() {
        let found = run(MovieFilter {
            imdb_score_gte: Some(9.0),
            imdb_score_lte: Some(9.5),
            ..Default::default()
        });
        assert_eq!(names(&found), ["Interstellar", "The Dark Knight"]);
    }

    #[test]
    fn genre_scenarios() {
        let by = |tag: &str| {
            run(MovieFilter {
                genre: Some(tag.into()),
                ..Default::default()
            })
            .len()
        };
        assert_eq!(by("sci-fi"), 3);
        assert_eq!(by("adventure"), 1);
        assert_eq!(by("weird"), 0);
    }

    #[test]
    fn director_substring_ignores_case() {
        let found = run(MovieFilter {
            director: Some("nolan".into()),
            ..Default::default()
        });
        assert_eq!(names(&found), ["Interstellar", "The Dark Knight"]);
    }

    #[test]
    fn empty_filter_returns_everything() {
        let movies = catalog();
        let found = compile(&MovieFilter::default(), Page::default())
            .execute(&movies);
        assert_eq!(found, movies);
    }

    #[test]
    fn pagination_after_filtering() {
        let movies = catalog();
        let filter = MovieFilter {
            genre: Some("sci-fi".into()),
            ..Default::default()
        };
        let page = Page::new(1, 1).unwrap();
        let found = compile(&filter, page).execute(&movies);
        assert_eq!(names(&found), ["Interstellar"]);

        let past_end =
            compile(&filter, Page::new(10, 5).unwrap()).execute(&movies);
        assert!(past_end.is_empty());
    }
}
