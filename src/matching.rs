//! Structural matching of ground trees against pattern templates.
//!
//! Failure to match is an ordinary outcome, reported as `None` — never
//! an error. No partial bindings escape a failed match.

use crate::env::{Binding, Bindings};
use crate::template::{Template, TemplateGroup};
use crate::tree::Tree;

/// Match one ground tree against a pattern template.
pub fn match_template(pattern: &Template, tree: &Tree) -> Option<Bindings> {
    let mut bindings = Bindings::new();
    if match_into(pattern, tree, &mut bindings) {
        Some(bindings)
    } else {
        None
    }
}

/// Match equal-length sequences pairwise, merging bindings; later pairs
/// overwrite earlier ones for the same name.
pub fn match_template_seq(patterns: &[Template], trees: &[Tree]) -> Option<Bindings> {
    if patterns.len() != trees.len() {
        return None;
    }
    let mut bindings = Bindings::new();
    for (pattern, tree) in patterns.iter().zip(trees) {
        bindings.merge(match_template(pattern, tree)?);
    }
    Some(bindings)
}

fn match_into(pattern: &Template, tree: &Tree, out: &mut Bindings) -> bool {
    match pattern {
        Template::Ground(literal) => literal.deep_eq(tree),
        Template::Placeholder(tag) => {
            if !tag.is_anonymous() {
                out.insert(tag.clone(), Binding::One(tree.clone()));
            }
            true
        }
        // A bare glob never stands for a single node.
        Template::Glob(_) => false,
        Template::Structural { kind, groups, .. } => {
            if tree.kind != *kind || tree.groups().len() != groups.len() {
                return false;
            }
            groups
                .iter()
                .zip(tree.groups())
                .all(|(pattern_group, tree_group)| {
                    match_slot(pattern_group, tree_group, out)
                })
        }
    }
}

fn match_slot(pattern: &TemplateGroup, trees: &[Tree], out: &mut Bindings) -> bool {
    match pattern {
        TemplateGroup::Glob(tag) => {
            if !tag.is_anonymous() {
                out.insert(tag.clone(), Binding::Seq(trees.to_vec()));
            }
            true
        }
        TemplateGroup::Items(items) => {
            items.len() == trees.len()
                && items
                    .iter()
                    .zip(trees)
                    .all(|(item, tree)| match_into(item, tree, out))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{parse_fragment, Origin};
    use crate::subst::substitute;
    use crate::template::Tag;

    fn tree(source: &str) -> Tree {
        let mut trees = parse_fragment(source, Origin::default()).unwrap();
        assert_eq!(trees.len(), 1);
        trees.remove(0)
    }

    fn template(source: &str) -> Template {
        Template::build(&tree(source)).unwrap()
    }

    #[test]
    fn test_call_pattern_binds_target_and_args() {
        let pattern = template("call(_@fn, _@@args)");
        let ground = tree("call(foo, 1, 2, 3)");
        let b = match_template(&pattern, &ground).unwrap();

        match b.get(&Tag::Name("fn".into())) {
            Some(Binding::One(t)) => assert_eq!(t.leaf_name(), Some("foo")),
            other => panic!("unexpected binding: {:?}", other),
        }
        match b.get(&Tag::Name("args".into())) {
            Some(Binding::Seq(ts)) => {
                let values: Vec<_> = ts.iter().map(|t| t.int_value().unwrap()).collect();
                assert_eq!(values, vec![1, 2, 3]);
            }
            other => panic!("unexpected binding: {:?}", other),
        }

        // matching is the inverse of substitution
        let rebuilt = substitute(&pattern, &b).unwrap();
        assert!(rebuilt.deep_eq(&ground));
    }

    #[test]
    fn test_kind_mismatch_is_plain_failure() {
        let pattern = template("{_@A}");
        assert!(match_template(&pattern, &tree("[1]")).is_none());
    }

    #[test]
    fn test_arity_mismatch_fails() {
        let pattern = template("{_@A, _@B}");
        assert!(match_template(&pattern, &tree("{1}")).is_none());
        assert!(match_template(&pattern, &tree("{1, 2, 3}")).is_none());
    }

    #[test]
    fn test_literal_leaf_mismatch_fails() {
        let pattern = template("{foo, _@A}");
        assert!(match_template(&pattern, &tree("{bar, 1}")).is_none());
        assert!(match_template(&pattern, &tree("{foo, 1}")).is_some());
    }

    #[test]
    fn test_anonymous_binds_nothing() {
        let pattern = template("{_@_, _@@_}");
        let b = match_template(&pattern, &tree("{1, 2, 3}")).unwrap();
        assert!(b.is_empty());
    }

    #[test]
    fn test_repeated_name_last_write_wins() {
        let pattern = template("{_@X, _@X}");
        let b = match_template(&pattern, &tree("{1, 2}")).unwrap();
        match b.get(&Tag::Name("X".into())) {
            Some(Binding::One(t)) => assert_eq!(t.int_value(), Some(2)),
            other => panic!("unexpected binding: {:?}", other),
        }
    }

    #[test]
    fn test_lifted_pattern_binds_whole_node() {
        // the lift collapses the tuple pattern to one placeholder, so it
        // captures the entire ground tuple
        let pattern = template("{_@_X, 9090}");
        let ground = tree("{foo, 1, 2}");
        let b = match_template(&pattern, &ground).unwrap();
        match b.get(&Tag::Name("X".into())) {
            Some(Binding::One(t)) => assert!(t.deep_eq(&ground)),
            other => panic!("unexpected binding: {:?}", other),
        }
    }

    #[test]
    fn test_sequence_matching_merges() {
        let patterns = vec![template("_@X"), template("{_@X, _@Y}")];
        let trees = vec![tree("1"), tree("{2, 3}")];
        let b = match_template_seq(&patterns, &trees).unwrap();
        match b.get(&Tag::Name("X".into())) {
            Some(Binding::One(t)) => assert_eq!(t.int_value(), Some(2)),
            other => panic!("unexpected binding: {:?}", other),
        }
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn test_sequence_length_mismatch_fails() {
        let patterns = vec![template("_@X")];
        assert!(match_template_seq(&patterns, &[]).is_none());
    }

    #[test]
    fn test_no_partial_bindings_on_failure() {
        let pattern = template("{_@X, foo}");
        assert!(match_template(&pattern, &tree("{1, bar}")).is_none());
    }
}
