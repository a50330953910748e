//! Authorization rules for the movie mutation endpoints.
//!
//! Two independent gates, evaluated in order by the HTTP layer:
//!
//! 1. [`can_access_admin_endpoints`]: may the principal reach a mutation
//!    endpoint at all (active administrator).
//! 2. [`can_mutate_movie`]: may the principal change this particular record
//!    (owner only).
//!
//! Passing the first gate never implies the second; an administrator who
//! does not own a movie cannot update or delete it.

use marquee_model::{Movie, User};

/// Endpoint gate for create/update/delete.
pub fn can_access_admin_endpoints(principal: &User) -> bool {
    principal.is_active && principal.is_admin
}

/// Ownership gate for update/delete.
pub fn can_mutate_movie(principal: &User, movie: &Movie) -> bool {
    principal.id == movie.created_by_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_model::{NewMovie, NewUser};

    fn user(admin: bool, active: bool) -> User {
        let mut new = NewUser::regular("Someone", "someone@example.com");
        new.is_admin = admin;
        new.is_active = active;
        User::from_new(new)
    }

    fn movie_owned_by(owner: &User) -> Movie {
        Movie::from_new(
            NewMovie {
                name: "Star Wars".into(),
                director: "George Lucas".into(),
                popularity: Some(88.0),
                imdb_score: 8.8,
                genre: vec!["sci-fi".into()],
            },
            owner.id,
        )
    }

    #[test]
    fn owner_may_mutate() {
        let owner = user(true, true);
        assert!(can_mutate_movie(&owner, &movie_owned_by(&owner)));
    }

    #[test]
    fn admin_non_owner_may_not_mutate() {
        let owner = user(true, true);
        let other_admin = user(true, true);
        let movie = movie_owned_by(&owner);
        assert!(can_access_admin_endpoints(&other_admin));
        assert!(!can_mutate_movie(&other_admin, &movie));
    }

    #[test]
    fn ownership_does_not_depend_on_role() {
        let owner = user(false, true);
        let movie = movie_owned_by(&owner);
        assert!(can_mutate_movie(&owner, &movie));
        assert!(!can_access_admin_endpoints(&owner));
    }

    #[test]
    fn admin_gate_requires_active_admin() {
        assert!(can_access_admin_endpoints(&user(true, true)));
        assert!(!can_access_admin_endpoints(&user(true, false)));
        assert!(!can_access_admin_endpoints(&user(false, true)));
        assert!(!can_access_admin_endpoints(&user(false, false)));
    }
}
