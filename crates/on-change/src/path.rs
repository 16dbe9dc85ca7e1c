use std::fmt;
use std::ops::Deref;

use on_change_model::PropertyKey;

/// Keys leading from the observed root to a value.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<PropertyKey>);

impl Path {
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, key: PropertyKey) -> Path {
        let mut keys = Vec::with_capacity(self.0.len() + 1);
        keys.extend_from_slice(&self.0);
        keys.push(key);
        Path(keys)
    }

    /// The path without its last key, or the root itself at the root.
    pub fn parent(&self) -> Path {
        let end = self.0.len().saturating_sub(1);
        Path(self.0[..end].to_vec())
    }

    /// The keys after `prefix`, if this path starts with it.
    pub fn strip_prefix(&self, prefix: &Path) -> Option<&[PropertyKey]> {
        self.0.strip_prefix(prefix.0.as_slice())
    }

    pub fn keys(&self) -> &[PropertyKey] {
        &self.0
    }

    pub fn into_keys(self) -> Vec<PropertyKey> {
        self.0
    }

    /// JSON Pointer rendering, with symbols shown by their description.
    pub fn to_pointer(&self) -> String {
        let mut out = String::new();
        for key in &self.0 {
            out.push('/');
            out.push_str(&escape_component(&key.to_string()));
        }
        out
    }
}

fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    component.replace('~', "~0").replace('/', "~1")
}

impl Deref for Path {
    type Target = [PropertyKey];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<PropertyKey>> for Path {
    fn from(keys: Vec<PropertyKey>) -> Self {
        Path(keys)
    }
}

impl FromIterator<PropertyKey> for Path {
    fn from_iter<I: IntoIterator<Item = PropertyKey>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl<const N: usize> PartialEq<[&str; N]> for Path {
    fn eq(&self, other: &[&str; N]) -> bool {
        self.0.len() == N && self.0.iter().zip(other.iter()).all(|(key, s)| key == s)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_pointer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(keys: &[&str]) -> Path {
        keys.iter().map(|k| PropertyKey::from(*k)).collect()
    }

    #[test]
    fn parent_of_root_is_root() {
        assert!(Path::root().parent().is_root());
        assert_eq!(path(&["a", "b"]).parent(), ["a"]);
    }

    #[test]
    fn strip_prefix_requires_a_real_prefix() {
        let full = path(&["x", "y", "0"]);
        assert_eq!(full.strip_prefix(&path(&["x"])).map(<[_]>::len), Some(2));
        assert!(full.strip_prefix(&path(&["y"])).is_none());
        assert_eq!(full.strip_prefix(&Path::root()).map(<[_]>::len), Some(3));
    }

    #[test]
    fn pointer_escapes_separators() {
        assert_eq!(path(&["a/b", "m~n", ""]).to_pointer(), "/a~1b/m~0n/");
        assert_eq!(Path::root().to_pointer(), "");
    }
}
