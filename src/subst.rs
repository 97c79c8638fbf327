//! Substitution: render a template to a concrete tree under an
//! environment. Unbound placeholders re-render to their canonical leaf
//! spelling, so the output is always a plain tree.

use crate::diagnostic::EnvError;
use crate::env::{Binding, Env};
use crate::meta;
use crate::template::{Template, TemplateGroup};
use crate::tree::Tree;

pub fn substitute(template: &Template, env: &Env) -> Result<Tree, EnvError> {
    match template {
        Template::Ground(tree) => Ok(tree.clone()),
        Template::Placeholder(tag) => match env.get(tag) {
            Some(Binding::One(tree)) => Ok(tree.clone()),
            Some(Binding::Seq(_)) => Err(EnvError::NodeBoundToList(tag.clone())),
            None => Ok(meta::placeholder_leaf(tag, false)),
        },
        // A bare glob only arises from hand-built templates; it cannot
        // contribute more than one tree here.
        Template::Glob(tag) => match env.get(tag) {
            Some(_) => Err(EnvError::GroupInNodePosition(tag.clone())),
            None => Ok(meta::placeholder_leaf(tag, true)),
        },
        Template::Structural { kind, span, groups } => {
            let mut out = Vec::with_capacity(groups.len());
            for group in groups {
                out.push(substitute_slot(group, env)?);
            }
            Ok(Tree::node(*kind, *span, out))
        }
    }
}

/// Render one child slot. A bound glob contributes zero or more sibling
/// trees; member substitution contributes one tree per member.
fn substitute_slot(group: &TemplateGroup, env: &Env) -> Result<Vec<Tree>, EnvError> {
    match group {
        TemplateGroup::Glob(tag) => match env.get(tag) {
            Some(Binding::Seq(trees)) => Ok(trees.clone()),
            Some(Binding::One(_)) => Err(EnvError::GroupBoundToNode(tag.clone())),
            None => Ok(vec![meta::placeholder_leaf(tag, true)]),
        },
        TemplateGroup::Items(items) => items.iter().map(|item| substitute(item, env)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{parse_fragment, Origin};
    use crate::template::Tag;
    use crate::tree::TreeKind;

    fn tree(source: &str) -> Tree {
        let mut trees = parse_fragment(source, Origin::default()).unwrap();
        assert_eq!(trees.len(), 1);
        trees.remove(0)
    }

    fn subst(source: &str, env: &Env) -> Result<Tree, EnvError> {
        substitute(&Template::build(&tree(source)).unwrap(), env)
    }

    #[test]
    fn test_ground_tree_unchanged() {
        let env = Env::new().bind(Tag::Name("X".into()), tree("99"));
        let out = subst("foo(1, 2)", &env).unwrap();
        assert!(out.deep_eq(&tree("foo(1, 2)")));
    }

    #[test]
    fn test_bound_placeholder_replaced() {
        let env = Env::new().bind(Tag::Name("X".into()), tree("1 + 2"));
        let out = subst("{_@X, _@X}", &env).unwrap();
        assert!(out.deep_eq(&tree("{1 + 2, 1 + 2}")));
    }

    #[test]
    fn test_bound_glob_changes_arity() {
        let args = vec![tree("1"), tree("2"), tree("3")];
        let env = Env::new().bind_seq(Tag::Name("Args".into()), args);
        let out = subst("foo(_@@Args)", &env).unwrap();
        assert!(out.deep_eq(&tree("foo(1, 2, 3)")));
    }

    #[test]
    fn test_glob_bound_to_empty_list() {
        let env = Env::new().bind_seq(Tag::Name("Args".into()), Vec::new());
        let out = subst("foo(_@@Args)", &env).unwrap();
        assert!(out.deep_eq(&tree("foo()")));
    }

    #[test]
    fn test_unbound_placeholder_renders_back() {
        let out = subst("{_@X, _@@Rest}", &Env::new()).unwrap();
        assert_eq!(out.kind, TreeKind::Tuple);
        assert_eq!(out.groups()[0][0].leaf_name(), Some("_@X"));
        assert_eq!(out.groups()[0][1].leaf_name(), Some("_@@Rest"));
    }

    #[test]
    fn test_node_name_bound_to_list_is_fatal() {
        let env = Env::new().bind_seq(Tag::Name("X".into()), vec![tree("1")]);
        let err = subst("{_@X}", &env).unwrap_err();
        assert_eq!(err, EnvError::NodeBoundToList(Tag::Name("X".into())));
    }

    #[test]
    fn test_group_name_bound_to_tree_is_fatal() {
        let env = Env::new().bind(Tag::Name("Args".into()), tree("1"));
        let err = subst("foo(_@@Args)", &env).unwrap_err();
        assert_eq!(err, EnvError::GroupBoundToNode(Tag::Name("Args".into())));
    }
}
