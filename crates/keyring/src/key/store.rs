//! [`KeyStore`]: ordered, append-only registry of keys.
//!
//! A store is built once, single-threaded, while configuration is loaded. The
//! encrypter then takes it over as an `Arc<KeyStore>`; nothing holds a mutable
//! handle after that point, so readers need no locking.

use super::Key;

/// Insertion-ordered collection of [`Key`]s.
///
/// Identifiers are not forced unique: [`KeyStore::get_by_id`] returns the first
/// match, so callers should keep ids distinct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyStore {
    keys: Vec<Key>,
}

impl KeyStore {
    /// Create a new, empty [`KeyStore`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one key.
    pub fn put(&mut self, key: Key) -> &mut Self {
        self.keys.push(key);
        self
    }

    /// Append every key yielded by `keys`, in order.
    pub fn put_all<I>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = Key>,
    {
        self.keys.extend(keys);
        self
    }

    /// Append a batch of fallible candidates all-or-nothing.
    ///
    /// Every candidate is evaluated before the store is touched.
    ///
    /// # Errors
    ///
    /// Returns the first candidate error; the store is left unchanged.
    pub fn try_put_all<I, E>(&mut self, candidates: I) -> Result<&mut Self, E>
    where
        I: IntoIterator<Item = Result<Key, E>>,
    {
        let batch = candidates.into_iter().collect::<Result<Vec<_>, E>>()?;
        self.keys.extend(batch);
        Ok(self)
    }

    /// All keys in insertion order.
    pub fn get_all(&self) -> &[Key] {
        &self.keys
    }

    /// The first key whose id equals `id`.
    pub fn get_by_id(&self, id: &str) -> Option<&Key> {
        self.keys.iter().find(|k| k.id() == id)
    }

    /// Number of stored keys.
    pub fn count(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate over the keys in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Key> {
        self.keys.iter()
    }
}

impl FromIterator<Key> for KeyStore {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a KeyStore {
    type Item = &'a Key;
    type IntoIter = std::slice::Iter<'a, Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::CipherId;

    fn key(id: &str) -> Key {
        Key::new(id, b"some-random-key".to_vec(), CipherId::Aes256Cbc)
    }

    #[test]
    fn initially_empty() {
        let store = KeyStore::new();
        assert!(store.is_empty());
        assert_eq!(store.count(), 0);
        assert!(store.get_by_id("anything").is_none());
    }

    #[test]
    fn put_and_get_all_preserves_order() {
        let mut store = KeyStore::new();
        store.put(key("b")).put(key("a")).put(key("c"));
        let ids: Vec<_> = store.get_all().iter().map(Key::id).collect();
        assert_eq!(ids, ["b", "a", "c"]);
        assert_eq!(store.count(), 3);
    }

    #[test]
    fn put_all_appends_after_existing() {
        let mut store = KeyStore::new();
        store.put(key("first"));
        store.put_all([key("second"), key("third")]);
        let ids: Vec<_> = store.iter().map(Key::id).collect();
        assert_eq!(ids, ["first", "second", "third"]);
    }

    #[test]
    fn get_by_id_returns_first_match() {
        let mut store = KeyStore::new();
        store.put(key("dup").with_cipher(CipherId::Aes128Cbc));
        store.put(key("dup"));
        assert_eq!(store.get_by_id("dup").unwrap().cipher(), CipherId::Aes128Cbc);
        assert!(store.get_by_id("missing").is_none());
    }

    #[test]
    fn try_put_all_is_all_or_nothing() {
        let mut store = KeyStore::new();
        store.put(key("existing"));

        let batch: Vec<Result<Key, &str>> = vec![Ok(key("a")), Err("not a key"), Ok(key("b"))];
        assert_eq!(store.try_put_all(batch).unwrap_err(), "not a key");
        assert_eq!(store.count(), 1);

        let batch: Vec<Result<Key, &str>> = vec![Ok(key("a")), Ok(key("b"))];
        store.try_put_all(batch).unwrap();
        assert_eq!(store.count(), 3);
    }

    #[test]
    fn collects_from_iterator() {
        let store: KeyStore = ["x", "y"].into_iter().map(key).collect();
        assert_eq!(store.count(), 2);
        assert_eq!((&store).into_iter().count(), 2);
    }
}
