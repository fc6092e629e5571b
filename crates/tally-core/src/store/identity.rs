//! Identity Store: author email to stable person id.

use indoc::indoc;
use tracing::debug;

use super::{PersonId, Resolved, Store, resolve_or_insert};
use crate::error::Result;

/// Persistent mapping of author identities, keyed by email.
///
/// The display name recorded is the one seen first; later sightings of the
/// same email under another name do not update it.
#[derive(Debug, Clone, Copy)]
pub struct IdentityStore<'s> {
    store: &'s Store,
}

impl<'s> IdentityStore<'s> {
    pub(super) const fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Look up a person by `email`, inserting `{name, email}` if absent.
    /// Any string is accepted verbatim for both fields.
    ///
    /// # Errors
    /// Returns error if the store fails.
    pub fn resolve_or_create(&self, name: &str, email: &str) -> Result<Resolved<PersonId>> {
        let conn = self.store.conn();
        let mut get = conn.prepare_cached("select people_id from people where email = ?")?;
        let mut set = conn.prepare_cached(indoc! {r"
            insert into people(name, email)
            values (?, ?)
            returning people_id
        "})?;

        let resolved = resolve_or_insert(&mut get, &mut set, [email], [name, email])?.map(PersonId);
        if resolved.is_created() {
            debug!("Added person {name} <{email}> as {}", resolved.id());
        }
        Ok(resolved)
    }

    /// The display name stored for `id`.
    #[cfg(test)]
    pub(crate) fn name_of(&self, id: PersonId) -> Result<Option<String>> {
        let mut get = self
            .store
            .conn()
            .prepare_cached("select name from people where people_id = ?")?;
        Ok(get.query_row([id], |row| row.get(0))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_email_same_person() {
        let store = Store::open_in_memory().unwrap();
        let identities = store.identities();

        let first = identities
            .resolve_or_create("Jane Doe", "jane@example.com")
            .unwrap();
        assert!(first.is_created());

        let second = identities
            .resolve_or_create("J. Doe", "jane@example.com")
            .unwrap();
        assert_eq!(second, Resolved::Existing(first.id()));
    }

    #[test]
    fn test_first_display_name_is_kept() {
        let store = Store::open_in_memory().unwrap();
        let identities = store.identities();

        let id = identities
            .resolve_or_create("Jane Doe", "jane@example.com")
            .unwrap()
            .id();
        identities
            .resolve_or_create("Jane Q. Doe", "jane@example.com")
            .unwrap();

        assert_eq!(identities.name_of(id).unwrap().as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_email_is_used_verbatim() {
        let store = Store::open_in_memory().unwrap();
        let identities = store.identities();

        let odd = identities.resolve_or_create("Nobody", "not an email").unwrap();
        let upper = identities
            .resolve_or_create("Jane", "JANE@example.com")
            .unwrap();
        let lower = identities
            .resolve_or_create("Jane", "jane@example.com")
            .unwrap();

        assert!(odd.is_created());
        assert!(upper.is_created());
        assert!(lower.is_created());
        assert_eq!(store.person_count().unwrap(), 3);
    }
}
