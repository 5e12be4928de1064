/// Raw connection configuration: an insertion-ordered mapping from property keys to values.
///
/// Keys are case-sensitive, and each key has at most one value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyBag {
    entries: Vec<(String, String)>,
}

impl PropertyBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// The value for the given key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether a value exists for the given key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Sets the value for the given key, replacing a previous value.
    pub fn set<K: AsRef<str>, V: Into<String>>(&mut self, key: K, value: V) -> &mut Self {
        let key = key.as_ref();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key.to_string(), value)),
        }
        self
    }

    /// Adds the value if the key is not yet present and the value is not blank.
    ///
    /// Returns `true` if the value was added.
    pub fn add_if_absent<K: AsRef<str>, V: AsRef<str>>(&mut self, key: K, value: V) -> bool {
        let (key, value) = (key.as_ref(), value.as_ref());
        if is_blank(Some(value)) || self.contains_key(key) {
            false
        } else {
            self.entries.push((key.to_string(), value.to_string()));
            true
        }
    }

    /// Removes the value for the given key and returns it.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = Self::new();
        for (k, v) in iter {
            bag.set(k, v);
        }
        bag
    }
}

/// `true` for `None` and for values that consist only of whitespace.
pub(crate) fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |s| s.trim().is_empty())
}
