//! The ignore policy: symbolic tokens that suppress classes of differences.
//!
//! Tokens outside the known vocabulary are accepted silently so callers can
//! pass forward-compatible sets; they simply match no node. Suppression is a
//! post-order pass over a finished delta tree: a suppressed node keeps its
//! shape but reads as unchanged, and a parent whose only changes were
//! suppressed follows suit.

use std::collections::BTreeSet;

use crate::delta::{Change, Delta};

/// The known token vocabulary.
pub mod tokens {
	pub const VERSION: &str = "version";
	pub const PLATFORM: &str = "platform";
	pub const LINES: &str = "lines";
	pub const POOL: &str = "pool";
	pub const MANIFEST_SUBSECTIONS: &str = "manifest_subsections";
	pub const JAR_SIGNATURE: &str = "jar_signature";
	pub const TRAILING_WHITESPACE: &str = "trailing_whitespace";
	pub const DEPRECATED: &str = "deprecated";
	pub const ADDED: &str = "added";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreSet {
	tokens: BTreeSet<String>,
}

impl Default for IgnoreSet {
	/// The default policy suppresses constant pool reordering only.
	fn default() -> IgnoreSet {
		IgnoreSet::none().with(tokens::POOL)
	}
}

impl IgnoreSet {
	pub fn none() -> IgnoreSet {
		IgnoreSet { tokens: BTreeSet::new() }
	}

	pub fn from_tokens<I, S>(tokens: I) -> IgnoreSet
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		IgnoreSet {
			tokens: tokens.into_iter().map(Into::into).collect(),
		}
	}

	pub fn with(mut self, token: &str) -> IgnoreSet {
		self.tokens.insert(token.to_owned());
		self
	}

	pub fn without(mut self, token: &str) -> IgnoreSet {
		self.tokens.remove(token);
		self
	}

	pub fn contains(&self, token: &str) -> bool {
		self.tokens.contains(token)
	}
}

/// Applies the policy to a finished tree.
///
/// Post-order: children first, then this node's own token, then the
/// propagation rule: a modified parent with no surviving changed children
/// and no scalar difference of its own becomes unchanged too.
pub fn apply(delta: &mut Delta, ignores: &IgnoreSet) {
	for child in &mut delta.children {
		apply(child, ignores);
	}

	if delta.change != Change::Unchanged {
		if let Some(token) = delta.token {
			if ignores.contains(token) {
				delta.change = Change::Unchanged;
				delta.ignored = true;
			}
		}
	}

	// a parent whose changes were all suppressed propagates to unchanged
	if delta.change == Change::Modified
		&& !delta.children.is_empty()
		&& delta.left == delta.right
		&& delta.children.iter().all(|c| c.change == Change::Unchanged)
	{
		delta.change = Change::Unchanged;
		if delta.children.iter().any(|c| c.ignored) {
			delta.ignored = true;
		}
	}
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use crate::delta::{Change, Delta, DeltaKind};
	use crate::ignore::{apply, tokens, IgnoreSet};

	#[test]
	fn default_set_contains_pool() {
		let ignores = IgnoreSet::default();
		assert!(ignores.contains(tokens::POOL));
		assert!(!ignores.contains(tokens::LINES));
	}

	#[test]
	fn unknown_tokens_are_accepted() {
		let ignores = IgnoreSet::from_tokens(["pool", "something_from_the_future"]);
		assert!(ignores.contains("something_from_the_future"));
	}

	#[test]
	fn suppression_marks_and_unchanges() {
		let mut delta = Delta::leaf(
			DeltaKind::Attribute,
			"lines",
			"Line numbers",
			Some("1".into()),
			Some("2".into()),
		)
		.with_token(tokens::LINES);

		apply(&mut delta, &IgnoreSet::none().with(tokens::LINES));
		assert_eq!(delta.change, Change::Unchanged);
		assert!(delta.ignored);
	}

	#[test]
	fn unsuppressed_nodes_keep_their_change() {
		let mut delta = Delta::leaf(
			DeltaKind::Attribute,
			"lines",
			"Line numbers",
			Some("1".into()),
			Some("2".into()),
		)
		.with_token(tokens::LINES);

		apply(&mut delta, &IgnoreSet::none());
		assert_eq!(delta.change, Change::Modified);
		assert!(!delta.ignored);
	}

	#[test]
	fn only_ignored_children_propagate_to_unchanged() {
		let child = Delta::leaf(
			DeltaKind::Attribute,
			"lines",
			"Line numbers",
			Some("1".into()),
			Some("2".into()),
		)
		.with_token(tokens::LINES);
		let mut parent = Delta::parent(DeltaKind::Method, "m", "Method m", vec![child]);
		assert_eq!(parent.change, Change::Modified);

		apply(&mut parent, &IgnoreSet::none().with(tokens::LINES));
		assert_eq!(parent.change, Change::Unchanged);
		assert!(parent.ignored);
		// the suppressed child stays visible for "show ignored"
		assert!(parent.children[0].ignored);
	}
}
