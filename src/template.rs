//! Templates: trees with placeholder positions made explicit.

use std::fmt;

use crate::diagnostic::TemplateError;
use crate::meta;
use crate::span::Span;
use crate::tree::{Tree, TreeKind};

/// A placeholder name: numeric (integer spelling) or textual.
/// `Num(0)` and `Name("_")` are the anonymous wildcard.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    Num(u64),
    Name(String),
}

impl Tag {
    pub fn is_anonymous(&self) -> bool {
        match self {
            Tag::Num(n) => *n == 0,
            Tag::Name(s) => s == "_",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Num(n) => write!(f, "{}", n),
            Tag::Name(s) => f.write_str(s),
        }
    }
}

/// One child slot of a structural template: either collapsed to a single
/// group placeholder (binding the whole slot) or a list of member
/// templates (each binding one child).
#[derive(Clone, Debug, PartialEq)]
pub enum TemplateGroup {
    Glob(Tag),
    Items(Vec<Template>),
}

/// A tree with placeholder positions distinguished from fixed structure.
/// Subtrees containing no placeholders are kept whole as `Ground`.
#[derive(Clone, Debug)]
pub enum Template {
    /// Stands for a single tree.
    Placeholder(Tag),
    /// Stands for a list of sibling trees; only valid inside a slot.
    Glob(Tag),
    /// A placeholder-free subtree, compared literally.
    Ground(Tree),
    /// Fixed structure with placeholder-bearing descendants.
    Structural {
        kind: TreeKind,
        span: Span,
        groups: Vec<TemplateGroup>,
    },
}

// Equality ignores spans, like every other tree comparison.
impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Template::Placeholder(a), Template::Placeholder(b)) => a == b,
            (Template::Glob(a), Template::Glob(b)) => a == b,
            (Template::Ground(a), Template::Ground(b)) => a.deep_eq(b),
            (
                Template::Structural {
                    kind: ka,
                    groups: ga,
                    ..
                },
                Template::Structural {
                    kind: kb,
                    groups: gb,
                    ..
                },
            ) => ka == kb && ga == gb,
            _ => false,
        }
    }
}

/// Result of converting one subtree: either a finished template, or a
/// lifted placeholder still waiting to replace `pending` more enclosing
/// nodes.
enum Built {
    Done(Template),
    Lifted { tag: Tag, pending: u32 },
}

impl Template {
    /// Convert a tree into a template, resolving lift and group
    /// modifiers. Fails on malformed placeholder usage.
    pub fn build(tree: &Tree) -> Result<Template, TemplateError> {
        match convert(tree)? {
            Built::Done(Template::Glob(tag)) => {
                Err(TemplateError::BadMetavariable(format!("_@@{}", tag)))
            }
            Built::Lifted { tag, .. } => Err(TemplateError::BadMetavariable(format!("_@_{}", tag))),
            Built::Done(template) => Ok(template),
        }
    }

    /// True when this template is a bare placeholder-free tree.
    pub fn is_ground(&self) -> bool {
        matches!(self, Template::Ground(_))
    }
}

fn convert(tree: &Tree) -> Result<Built, TemplateError> {
    if tree.is_leaf() {
        return Ok(match meta::recognize(tree) {
            Some(m) if m.lifts > 0 => Built::Lifted {
                tag: m.tag,
                pending: m.lifts,
            },
            Some(m) if m.group => Built::Done(Template::Glob(m.tag)),
            Some(m) => Built::Done(Template::Placeholder(m.tag)),
            None => Built::Done(Template::Ground(tree.clone())),
        });
    }

    // Lift occurrences found among this node's immediate converted
    // children; distinct tags clash. The same tag at different levels
    // keeps the deepest remaining level.
    let mut lifted: Vec<(Tag, u32)> = Vec::new();
    let mut groups = Vec::new();

    for group in tree.groups() {
        let mut items = Vec::new();
        for child in group {
            match convert(child)? {
                Built::Lifted { tag, pending } => match lifted.iter_mut().find(|(t, _)| *t == tag)
                {
                    Some((_, level)) => *level = (*level).max(pending),
                    None => lifted.push((tag.clone(), pending)),
                },
                Built::Done(template) => items.push(template),
            }
        }
        groups.push(collapse_slot(items)?);
    }

    match lifted.len() {
        0 => {}
        1 => {
            let (tag, pending) = lifted.into_iter().next().expect("one lifted entry");
            return Ok(if pending == 1 {
                Built::Done(Template::Placeholder(tag))
            } else {
                Built::Lifted {
                    tag,
                    pending: pending - 1,
                }
            });
        }
        _ => {
            return Err(TemplateError::ClashingMetavariables(
                lifted[0].0.to_string(),
                lifted[1].0.to_string(),
            ));
        }
    }

    if groups
        .iter()
        .all(|g| matches!(g, TemplateGroup::Items(items) if items.iter().all(Template::is_ground)))
    {
        return Ok(Built::Done(Template::Ground(tree.clone())));
    }

    Ok(Built::Done(Template::Structural {
        kind: tree.kind,
        span: tree.span,
        groups,
    }))
}

/// A slot whose sole member is a group placeholder collapses to it; a
/// group placeholder with siblings is an error. The check is shallow by
/// design: it looks at the slot's immediate members only.
fn collapse_slot(items: Vec<Template>) -> Result<TemplateGroup, TemplateError> {
    if items.len() == 1 {
        if let Template::Glob(tag) = &items[0] {
            return Ok(TemplateGroup::Glob(tag.clone()));
        }
    }
    for item in &items {
        if let Template::Glob(tag) = item {
            return Err(TemplateError::MisplacedGroupMetavariable(format!(
                "_@@{}",
                tag
            )));
        }
    }
    Ok(TemplateGroup::Items(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{parse_fragment, Origin};

    fn tree(source: &str) -> Tree {
        let mut trees = parse_fragment(source, Origin::default()).unwrap();
        assert_eq!(trees.len(), 1, "expected a single tree from {:?}", source);
        trees.remove(0)
    }

    fn template(source: &str) -> Template {
        Template::build(&tree(source)).unwrap()
    }

    #[test]
    fn test_ground_tree_stays_whole() {
        let t = template("foo(1, 2)");
        assert!(t.is_ground());
    }

    #[test]
    fn test_node_placeholder() {
        assert_eq!(
            template("_@X"),
            Template::Placeholder(Tag::Name("X".into()))
        );
        assert_eq!(template("@f"), Template::Placeholder(Tag::Name("f".into())));
        assert_eq!(template("9091"), Template::Placeholder(Tag::Num(1)));
    }

    #[test]
    fn test_glob_collapses_its_slot() {
        let t = template("foo(_@@Args)");
        let Template::Structural { kind, groups, .. } = t else {
            panic!("expected structural template");
        };
        assert_eq!(kind, TreeKind::Call);
        assert_eq!(groups[1], TemplateGroup::Glob(Tag::Name("Args".into())));
    }

    #[test]
    fn test_glob_with_siblings_is_misplaced() {
        let err = Template::build(&tree("foo(_@@Args, X)")).unwrap_err();
        assert!(matches!(err, TemplateError::MisplacedGroupMetavariable(_)));
    }

    #[test]
    fn test_glob_at_root_is_bad() {
        let err = Template::build(&tree("_@@Args")).unwrap_err();
        assert_eq!(err, TemplateError::BadMetavariable("_@@Args".into()));
    }

    #[test]
    fn test_lifted_leaf_at_root_is_bad() {
        let err = Template::build(&tree("_@_X")).unwrap_err();
        assert_eq!(err, TemplateError::BadMetavariable("_@_X".into()));
    }

    #[test]
    fn test_lift_collapses_enclosing_node() {
        // the tuple containing the lifted placeholder disappears
        assert_eq!(
            template("{_@_X, 1}"),
            Template::Placeholder(Tag::Name("X".into()))
        );
    }

    #[test]
    fn test_two_level_lift() {
        assert_eq!(
            template("{{_@__X}}"),
            Template::Placeholder(Tag::Name("X".into()))
        );
    }

    #[test]
    fn test_lift_too_deep_is_bad() {
        let err = Template::build(&tree("{_@__X}")).unwrap_err();
        assert!(matches!(err, TemplateError::BadMetavariable(_)));
    }

    #[test]
    fn test_same_lift_name_twice_is_fine() {
        assert_eq!(
            template("{_@_X, _@_X}"),
            Template::Placeholder(Tag::Name("X".into()))
        );
    }

    #[test]
    fn test_clashing_lift_names() {
        let err = Template::build(&tree("{_@_X, _@_Y}")).unwrap_err();
        assert!(matches!(err, TemplateError::ClashingMetavariables(_, _)));
    }

    #[test]
    fn test_placeholders_in_nested_structure() {
        let t = template("{_@A, [_@B]}");
        let Template::Structural { kind, groups, .. } = t else {
            panic!("expected structural template");
        };
        assert_eq!(kind, TreeKind::Tuple);
        let TemplateGroup::Items(items) = &groups[0] else {
            panic!("expected member list");
        };
        assert_eq!(items[0], Template::Placeholder(Tag::Name("A".into())));
        assert!(matches!(items[1], Template::Structural { .. }));
    }
}
