//! Decides how a shadow element is matched against the live tree.

use crate::node::{Element, CLASS, HASH, ID, UID};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleKind {
	Id,
	Class,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity<'a> {
	/// None of `id`, `class`, `hash` or `uid` are present.
	NoIdentity,
	SimpleIdentity { kind: SimpleKind, value: &'a str },
	/// Looked up by `tag` and `uid`. `hash` is only compared after the lookup.
	CompoundIdentity { tag: &'a str, uid: &'a str, hash: Option<&'a str> },
}

/// Classifies a shadow element by its reserved attributes.
///
/// A `uid` always selects [`Identity::CompoundIdentity`], overriding `id` and `class`.
/// Otherwise `id` beats `class`. A lone `hash` without `uid` can't be looked up and is ignored.
#[must_use]
pub fn classify(element: &Element) -> Identity<'_> {
	if let Some(uid) = element.attribute(UID) {
		return Identity::CompoundIdentity {
			tag: &element.tag,
			uid,
			hash: element.attribute(HASH),
		};
	}

	if let Some(value) = element.attribute(ID) {
		Identity::SimpleIdentity { kind: SimpleKind::Id, value }
	} else if let Some(value) = element.attribute(CLASS) {
		Identity::SimpleIdentity { kind: SimpleKind::Class, value }
	} else {
		Identity::NoIdentity
	}
}
