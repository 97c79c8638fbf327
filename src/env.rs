//! Substitution environments and match bindings.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;

use crate::template::Tag;
use crate::tree::Tree;

/// A value bound to a placeholder name: one tree for node-level names,
/// an ordered list for group-level names.
#[derive(Clone, Debug)]
pub enum Binding {
    One(Tree),
    Seq(Vec<Tree>),
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::One(tree) => write!(f, "{}", tree),
            Binding::Seq(trees) => {
                f.write_str("[")?;
                for (i, t) in trees.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// An immutable name→value mapping. The same type serves as the input
/// environment for substitution and as the bindings produced by
/// matching; keys iterate in sorted order.
#[derive(Clone, Debug, Default)]
pub struct Env {
    map: BTreeMap<Tag, Binding>,
}

/// Bindings recovered by a successful match.
pub type Bindings = Env;

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn get(&self, tag: &Tag) -> Option<&Binding> {
        self.map.get(tag)
    }

    pub fn insert(&mut self, tag: Tag, binding: Binding) {
        self.map.insert(tag, binding);
    }

    /// Bind a node-level name to a single tree.
    pub fn bind(mut self, tag: Tag, tree: Tree) -> Self {
        self.map.insert(tag, Binding::One(tree));
        self
    }

    /// Bind a group-level name to a list of trees.
    pub fn bind_seq(mut self, tag: Tag, trees: Vec<Tree>) -> Self {
        self.map.insert(tag, Binding::Seq(trees));
        self
    }

    /// Merge another mapping into this one; entries from `other` win.
    pub fn merge(&mut self, other: Env) {
        self.map.extend(other.map);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Tag, &Binding)> {
        self.map.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Tag> {
        self.map.keys()
    }
}

impl FromIterator<(Tag, Binding)> for Env {
    fn from_iter<I: IntoIterator<Item = (Tag, Binding)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

// JSON objects need string keys, so the map serializes through the
// tags' display form.
impl serde::Serialize for Env {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.map.len()))?;
        for (tag, binding) in &self.map {
            match binding {
                Binding::One(tree) => map.serialize_entry(&tag.to_string(), tree)?,
                Binding::Seq(trees) => map.serialize_entry(&tag.to_string(), trees)?,
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    #[test]
    fn test_keys_iterate_sorted() {
        let env = Env::new()
            .bind(Tag::Name("b".into()), Tree::atom("x", Span::synthetic()))
            .bind(Tag::Name("a".into()), Tree::atom("y", Span::synthetic()))
            .bind(Tag::Num(3), Tree::atom("z", Span::synthetic()));
        let keys: Vec<_> = env.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                Tag::Num(3),
                Tag::Name("a".into()),
                Tag::Name("b".into()),
            ]
        );
    }

    #[test]
    fn test_merge_last_write_wins() {
        let mut a = Env::new().bind(Tag::Num(1), Tree::atom("old", Span::synthetic()));
        let b = Env::new().bind(Tag::Num(1), Tree::atom("new", Span::synthetic()));
        a.merge(b);
        match a.get(&Tag::Num(1)) {
            Some(Binding::One(t)) => assert_eq!(t.leaf_name(), Some("new")),
            other => panic!("unexpected binding: {:?}", other),
        }
    }
}
