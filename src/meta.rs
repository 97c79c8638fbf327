//! Placeholder recognition.
//!
//! Placeholders are spelled as ordinary valid leaf tokens:
//! `@name` (atom), `_@name` (variable), or an integer >= 9090 whose
//! decimal digits start with `909`. The raw name after the sigil further
//! decomposes: a leading run of `_`/`0` characters lifts the placeholder
//! one node level each, one optional `@`/`9` marks it group-level, and
//! the remainder is the tag (`_` and `0` are the anonymous wildcard).

use crate::span::Span;
use crate::template::Tag;
use crate::tree::{Scalar, Tree, TreeKind};

/// A recognized placeholder leaf, decomposed into its modifiers and tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Meta {
    pub lifts: u32,
    pub group: bool,
    pub tag: Tag,
}

/// Classify a leaf as a placeholder. Non-leaf trees and leaf kinds other
/// than atom/variable/integer are never placeholders.
pub fn recognize(tree: &Tree) -> Option<Meta> {
    match (tree.kind, tree.value()) {
        (TreeKind::Atom, Some(Scalar::Name(name))) => {
            decompose(name.strip_prefix('@').filter(|r| !r.is_empty())?)
        }
        (TreeKind::Var, Some(Scalar::Name(name))) => {
            decompose(name.strip_prefix("_@").filter(|r| !r.is_empty())?)
        }
        (TreeKind::Int, Some(Scalar::Int(n))) if *n >= 9090 => {
            let digits = n.to_string();
            decompose(digits.strip_prefix("909").filter(|r| !r.is_empty())?)
        }
        _ => None,
    }
}

fn is_lift(ch: char) -> bool {
    ch == '_' || ch == '0'
}

fn is_group(ch: char) -> bool {
    ch == '@' || ch == '9'
}

fn decompose(raw: &str) -> Option<Meta> {
    let lift_run = raw.chars().take_while(|&c| is_lift(c)).count();

    // A raw name made of lift characters only keeps its last character
    // as the tag, so `_` and `0` stay anonymous rather than stripping
    // to nothing.
    if lift_run == raw.chars().count() {
        return Some(Meta {
            lifts: (lift_run - 1) as u32,
            group: false,
            tag: parse_tag(&raw[raw.len() - 1..]),
        });
    }

    let rest: &str = &raw[lift_run..];
    let mut chars = rest.chars();
    let first = chars.next()?;
    let (group, tag_text) = if is_group(first) && !chars.as_str().is_empty() {
        (true, chars.as_str())
    } else {
        (false, rest)
    };

    Some(Meta {
        lifts: lift_run as u32,
        group,
        tag: parse_tag(tag_text),
    })
}

fn parse_tag(text: &str) -> Tag {
    if text.chars().all(|c| c.is_ascii_digit()) {
        match text.parse::<u64>() {
            Ok(n) => Tag::Num(n),
            Err(_) => Tag::Name(text.to_string()),
        }
    } else {
        Tag::Name(text.to_string())
    }
}

/// Canonical leaf spelling for an unbound placeholder: text tags render
/// as variables, numeric tags as integers. The spelling re-recognizes to
/// the same tag, so template/render cycles are stable.
pub fn placeholder_leaf(tag: &Tag, group: bool) -> Tree {
    let span = Span::synthetic();
    match tag {
        Tag::Name(name) => {
            let sigil = if group { "_@@" } else { "_@" };
            Tree::var(format!("{}{}", sigil, name), span)
        }
        Tag::Num(n) => {
            let digits = if group {
                format!("9099{}", n)
            } else {
                format!("909{}", n)
            };
            match digits.parse::<i64>() {
                Ok(value) => Tree::int(value, span),
                // Tag too large to re-embed in an integer literal; the
                // variable spelling recognizes to the same numeric tag.
                Err(_) => {
                    let sigil = if group { "_@@" } else { "_@" };
                    Tree::var(format!("{}{}", sigil, n), span)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp() -> Span {
        Span::synthetic()
    }

    fn meta(lifts: u32, group: bool, tag: Tag) -> Option<Meta> {
        Some(Meta { lifts, group, tag })
    }

    #[test]
    fn test_atom_placeholder() {
        assert_eq!(
            recognize(&Tree::atom("@foo", sp())),
            meta(0, false, Tag::Name("foo".into()))
        );
        assert_eq!(recognize(&Tree::atom("foo", sp())), None);
        assert_eq!(recognize(&Tree::atom("@", sp())), None);
    }

    #[test]
    fn test_var_placeholder() {
        assert_eq!(
            recognize(&Tree::var("_@Bar", sp())),
            meta(0, false, Tag::Name("Bar".into()))
        );
        assert_eq!(recognize(&Tree::var("_Bar", sp())), None);
        assert_eq!(recognize(&Tree::var("_@", sp())), None);
    }

    #[test]
    fn test_integer_placeholder() {
        assert_eq!(recognize(&Tree::int(9091, sp())), meta(0, false, Tag::Num(1)));
        assert_eq!(recognize(&Tree::int(90991, sp())), meta(0, true, Tag::Num(1)));
        assert_eq!(recognize(&Tree::int(909001, sp())), meta(2, false, Tag::Num(1)));
        // 9090 is the anonymous integer placeholder
        assert_eq!(recognize(&Tree::int(9090, sp())), meta(0, false, Tag::Num(0)));
        // below the threshold: ordinary integers
        assert_eq!(recognize(&Tree::int(909, sp())), None);
        assert_eq!(recognize(&Tree::int(1234, sp())), None);
    }

    #[test]
    fn test_group_and_lift_modifiers() {
        assert_eq!(
            recognize(&Tree::var("_@@Args", sp())),
            meta(0, true, Tag::Name("Args".into()))
        );
        assert_eq!(
            recognize(&Tree::var("_@_X", sp())),
            meta(1, false, Tag::Name("X".into()))
        );
        assert_eq!(
            recognize(&Tree::var("_@__@X", sp())),
            meta(2, true, Tag::Name("X".into()))
        );
    }

    #[test]
    fn test_anonymous() {
        assert_eq!(
            recognize(&Tree::var("_@_", sp())),
            meta(0, false, Tag::Name("_".into()))
        );
        assert!(recognize(&Tree::var("_@_", sp())).unwrap().tag.is_anonymous());
        assert_eq!(
            recognize(&Tree::var("_@__", sp())),
            meta(1, false, Tag::Name("_".into()))
        );
    }

    #[test]
    fn test_numeric_tag_starting_with_nine() {
        // the optional group marker is only taken when a tag remains
        assert_eq!(recognize(&Tree::int(9099, sp())), meta(0, false, Tag::Num(9)));
    }

    #[test]
    fn test_render_round_trip() {
        for (tag, group) in [
            (Tag::Name("foo".into()), false),
            (Tag::Name("foo".into()), true),
            (Tag::Num(7), false),
            (Tag::Num(7), true),
            (Tag::Name("_".into()), false),
            (Tag::Num(0), false),
        ] {
            let leaf = placeholder_leaf(&tag, group);
            let m = recognize(&leaf).expect("rendered leaf must recognize");
            assert_eq!(m.tag, tag);
            assert_eq!(m.group, group);
            assert_eq!(m.lifts, 0);
        }
    }
}
