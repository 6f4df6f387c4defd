//! The delta tree: the differ's only output.
//!
//! A pure data structure; renderers consume it without callbacks. The JSON
//! shape is a stable contract: `kind`, `change`, `id`, `label`, `left`,
//! `right`, `children`, `ignored`.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Change {
	Unchanged,
	Added,
	Removed,
	Modified,
}

/// Which comparison layer produced a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaKind {
	Class,
	Field,
	Method,
	Code,
	Attribute,
	Manifest,
	Jar,
	Dist,
	Resource,
	/// An artifact that could not be decoded; the diff keeps going.
	Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delta {
	pub kind: DeltaKind,
	pub change: Change,
	/// Machine-stable identifier, unique among siblings.
	pub id: String,
	/// Human-readable label.
	pub label: String,
	pub left: Option<String>,
	pub right: Option<String>,
	pub children: Vec<Delta>,
	/// Whether the ignore policy suppressed this node.
	pub ignored: bool,
	/// The ignore token that can suppress this node, if any.
	#[serde(skip)]
	pub token: Option<&'static str>,
}

impl Delta {
	/// A leaf comparing two optional scalar renderings. The change kind
	/// falls out of the values: equal is unchanged, a missing left is an
	/// addition, a missing right a removal, anything else a modification.
	pub fn leaf(kind: DeltaKind, id: &str, label: &str, left: Option<String>, right: Option<String>) -> Delta {
		let change = match (&left, &right) {
			(l, r) if l == r => Change::Unchanged,
			(None, Some(_)) => Change::Added,
			(Some(_), None) => Change::Removed,
			_ => Change::Modified,
		};
		Delta {
			kind,
			change,
			id: id.to_owned(),
			label: label.to_owned(),
			left,
			right,
			children: Vec::new(),
			ignored: false,
			token: None,
		}
	}

	/// A parent node whose change kind is derived from its children.
	pub fn parent(kind: DeltaKind, id: &str, label: &str, children: Vec<Delta>) -> Delta {
		let change = if children.iter().any(Delta::is_changed) {
			Change::Modified
		} else {
			Change::Unchanged
		};
		Delta {
			kind,
			change,
			id: id.to_owned(),
			label: label.to_owned(),
			left: None,
			right: None,
			children,
			ignored: false,
			token: None,
		}
	}

	/// A node for something present only on the right side.
	pub fn added(kind: DeltaKind, id: &str, label: &str) -> Delta {
		Delta {
			kind,
			change: Change::Added,
			id: id.to_owned(),
			label: label.to_owned(),
			left: None,
			right: None,
			children: Vec::new(),
			ignored: false,
			token: None,
		}
	}

	/// A node for something present only on the left side.
	pub fn removed(kind: DeltaKind, id: &str, label: &str) -> Delta {
		Delta {
			kind,
			change: Change::Removed,
			id: id.to_owned(),
			label: label.to_owned(),
			left: None,
			right: None,
			children: Vec::new(),
			ignored: false,
			token: None,
		}
	}

	/// An error node recording an artifact that failed to decode, so that
	/// batch operations stay useful past a single bad input.
	pub fn error(id: &str, message: String) -> Delta {
		Delta {
			kind: DeltaKind::Error,
			change: Change::Modified,
			id: id.to_owned(),
			label: message,
			left: None,
			right: None,
			children: Vec::new(),
			ignored: false,
			token: None,
		}
	}

	/// Attaches the ignore token that may suppress this node.
	pub fn with_token(mut self, token: &'static str) -> Delta {
		self.token = Some(token);
		self
	}

	pub fn is_changed(&self) -> bool {
		self.change != Change::Unchanged
	}

	/// Serializes the tree with the stable field names.
	pub fn to_json(&self) -> serde_json::Value {
		serde_json::to_value(self).expect("delta trees always serialize")
	}
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use crate::delta::{Change, Delta, DeltaKind};

	#[test]
	fn leaf_change_kinds() {
		let same = Delta::leaf(DeltaKind::Attribute, "x", "X", Some("a".into()), Some("a".into()));
		assert_eq!(same.change, Change::Unchanged);

		let added = Delta::leaf(DeltaKind::Attribute, "x", "X", None, Some("a".into()));
		assert_eq!(added.change, Change::Added);

		let removed = Delta::leaf(DeltaKind::Attribute, "x", "X", Some("a".into()), None);
		assert_eq!(removed.change, Change::Removed);

		let modified = Delta::leaf(DeltaKind::Attribute, "x", "X", Some("a".into()), Some("b".into()));
		assert_eq!(modified.change, Change::Modified);
	}

	#[test]
	fn parent_change_derives_from_children() {
		let unchanged = Delta::leaf(DeltaKind::Attribute, "a", "A", None, None);
		let modified = Delta::leaf(DeltaKind::Attribute, "b", "B", Some("1".into()), Some("2".into()));

		assert_eq!(
			Delta::parent(DeltaKind::Class, "c", "C", vec![unchanged.clone()]).change,
			Change::Unchanged
		);
		assert_eq!(
			Delta::parent(DeltaKind::Class, "c", "C", vec![unchanged, modified]).change,
			Change::Modified
		);
	}

	#[test]
	fn json_uses_stable_field_names() {
		let delta = Delta::leaf(DeltaKind::Attribute, "version", "Version", Some("50".into()), Some("52".into()));
		let json = delta.to_json();

		assert_eq!(json["kind"], "attribute");
		assert_eq!(json["change"], "modified");
		assert_eq!(json["id"], "version");
		assert_eq!(json["label"], "Version");
		assert_eq!(json["left"], "50");
		assert_eq!(json["right"], "52");
		assert_eq!(json["children"], serde_json::json!([]));
		assert_eq!(json["ignored"], false);
		// the token is internal, not part of the export contract
		assert!(json.get("token").is_none());
	}
}
