//! Concurrent in-memory record store.
//!
//! The store is the only shared mutable state in the service: a map of live
//! records plus the id counter. One mutex guards both, so an insert observes
//! and bumps the counter in the same critical section — two concurrent
//! inserts can never receive the same id, and ids are never reused even
//! after a delete.
//!
//! Handlers hold the store behind an `Arc` and never touch the map or the
//! counter except through these methods. Every operation is in-memory and
//! holds the lock for a bounded, allocation-light stretch.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::user::User;

struct Inner {
    users: HashMap<u64, User>,
    next_id: u64,
}

/// The shared record store. Cheap to share via `Arc`; all methods take `&self`.
pub struct UserStore {
    inner: Mutex<Inner>,
}

impl UserStore {
    /// An empty store. The first assigned id is 1.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner { users: HashMap::new(), next_id: 1 }),
        }
    }

    /// Snapshot of all live records, ordered by id for stable output.
    pub fn list(&self) -> Vec<User> {
        let inner = self.inner.lock();
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        users
    }

    pub fn get(&self, id: u64) -> Option<User> {
        self.inner.lock().users.get(&id).cloned()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.inner.lock().users.contains_key(&id)
    }

    /// Stores a new record under a freshly assigned id and returns it.
    ///
    /// The payload's id field is ignored; assignment order is strictly
    /// increasing and an id freed by [`remove`](Self::remove) never comes back.
    pub fn insert(&self, mut user: User) -> User {
        let mut inner = self.inner.lock();
        user.id = inner.next_id;
        inner.next_id += 1;
        inner.users.insert(user.id, user.clone());
        user
    }

    /// Overwrites the record stored under `id`, forcing the record's id field
    /// to `id` regardless of the payload. `None` if no such record exists.
    pub fn replace(&self, id: u64, mut user: User) -> Option<User> {
        let mut inner = self.inner.lock();
        if !inner.users.contains_key(&id) {
            return None;
        }
        user.id = id;
        inner.users.insert(id, user.clone());
        Some(user)
    }

    /// Removes the record under `id`. `false` if no such record exists.
    pub fn remove(&self, id: u64) -> bool {
        self.inner.lock().users.remove(&id).is_some()
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::user::User;

    fn user(first: &str) -> User {
        User {
            id: 0,
            first_name: first.to_owned(),
            last_name: "Lovelace".to_owned(),
            email: "ada@x.com".to_owned(),
            department: "Eng".to_owned(),
        }
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let store = UserStore::new();
        assert_eq!(store.insert(user("a")).id, 1);
        assert_eq!(store.insert(user("b")).id, 2);
        assert_eq!(store.insert(user("c")).id, 3);
    }

    #[test]
    fn get_after_insert_until_remove() {
        let store = UserStore::new();
        let id = store.insert(user("a")).id;
        assert!(store.get(id).is_some());
        assert!(store.remove(id));
        assert!(store.get(id).is_none());
        assert!(!store.remove(id));
    }

    #[test]
    fn removed_ids_are_never_reused() {
        let store = UserStore::new();
        let first = store.insert(user("a")).id;
        store.remove(first);
        let next = store.insert(user("b")).id;
        assert!(next > first);
    }

    #[test]
    fn replace_forces_the_path_id() {
        let store = UserStore::new();
        let id = store.insert(user("a")).id;
        let mut payload = user("b");
        payload.id = 999;
        let updated = store.replace(id, payload).unwrap();
        assert_eq!(updated.id, id);
        assert_eq!(store.get(id).unwrap().first_name, "b");
    }

    #[test]
    fn replace_missing_id_is_none() {
        let store = UserStore::new();
        assert_eq!(store.replace(42, user("a")), None);
    }

    #[test]
    fn concurrent_inserts_assign_distinct_ids() {
        let store = Arc::new(UserStore::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    (0..50).map(|_| store.insert(user("x")).id).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in threads {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "id {id} assigned twice");
            }
        }
        assert_eq!(seen.len(), 400);
        assert_eq!(store.list().len(), 400);
    }
}
