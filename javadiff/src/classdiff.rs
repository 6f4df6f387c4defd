//! The class comparator.
//!
//! Members pair by `(name, descriptor)`; unpaired members surface as added
//! or removed. Children come out in a deterministic order: paired members in
//! lexicographic order of identifier, then additions, then removals, which
//! keeps report output reproducible.

use std::collections::BTreeMap;
use std::fmt::Write;

use classfile::attributes::{self, Attribute, AttributeInfo};
use classfile::{CancelToken, ClassFile, Field, Method};

use crate::codediff::diff_code;
use crate::delta::{Delta, DeltaKind};
use crate::ignore::tokens;

/// Compares two decoded classes into a delta tree.
///
/// Never fails on a mismatch (mismatches are the product); the only error is
/// a tripped cancel token.
pub fn diff_classes(left: &ClassFile, right: &ClassFile, cancel: &CancelToken) -> classfile::Result<Delta> {
	cancel.check()?;

	let mut children = vec![
		Delta::leaf(
			DeltaKind::Attribute,
			"version",
			"Java class version",
			Some(left.version.to_string()),
			Some(right.version.to_string()),
		)
		.with_token(tokens::VERSION),
		Delta::leaf(
			DeltaKind::Attribute,
			"platform",
			"Java platform",
			Some(platform(left)),
			Some(platform(right)),
		)
		.with_token(tokens::PLATFORM),
		Delta::leaf(
			DeltaKind::Attribute,
			"access_flags",
			"Access flags",
			Some(left.access.to_string()),
			Some(right.access.to_string()),
		),
		Delta::leaf(
			DeltaKind::Attribute,
			"this_class",
			"Class name",
			Some(left.this_class.clone()),
			Some(right.this_class.clone()),
		),
		Delta::leaf(
			DeltaKind::Attribute,
			"super_class",
			"Superclass",
			left.super_class.clone(),
			right.super_class.clone(),
		),
		Delta::leaf(
			DeltaKind::Attribute,
			"interfaces",
			"Interfaces",
			Some(sorted_list(&left.interfaces)),
			Some(sorted_list(&right.interfaces)),
		),
		Delta::leaf(
			DeltaKind::Attribute,
			"source_file",
			"Source file",
			left.source_file().map(str::to_owned),
			right.source_file().map(str::to_owned),
		),
		Delta::leaf(
			DeltaKind::Attribute,
			"signature",
			"Generics signature",
			left.signature().map(str::to_owned),
			right.signature().map(str::to_owned),
		),
		Delta::leaf(
			DeltaKind::Attribute,
			"deprecated",
			"Deprecation",
			Some(left.is_deprecated().to_string()),
			Some(right.is_deprecated().to_string()),
		)
		.with_token(tokens::DEPRECATED),
		Delta::leaf(
			DeltaKind::Attribute,
			"annotations",
			"Runtime annotations",
			annotations_repr(&left.attributes, "RuntimeVisibleAnnotations"),
			annotations_repr(&right.attributes, "RuntimeVisibleAnnotations"),
		),
		Delta::leaf(
			DeltaKind::Attribute,
			"invisible_annotations",
			"Runtime invisible annotations",
			annotations_repr(&left.attributes, "RuntimeInvisibleAnnotations"),
			annotations_repr(&right.attributes, "RuntimeInvisibleAnnotations"),
		),
		Delta::leaf(
			DeltaKind::Attribute,
			"inner_classes",
			"Inner classes",
			inner_classes_repr(left),
			inner_classes_repr(right),
		),
		Delta::leaf(
			DeltaKind::Attribute,
			"constant_pool",
			"Constant pool",
			Some(pool_repr(left)),
			Some(pool_repr(right)),
		)
		.with_token(tokens::POOL),
	];

	children.push(diff_fields(left, right));
	children.push(diff_methods(left, right));

	Ok(Delta::parent(
		DeltaKind::Class,
		"class",
		&format!("Class {}", left.this_class),
		children,
	))
}

fn diff_fields(left: &ClassFile, right: &ClassFile) -> Delta {
	let children = pair_by_key(
		&left.fields,
		&right.fields,
		|f| member_id(&f.name, &f.descriptor),
		|id, l, r| diff_field(id, l, r),
		|id, f| member_stub(DeltaKind::Field, id, "Field", &f.name, true),
		|id, f| member_stub(DeltaKind::Field, id, "Field", &f.name, false),
	);
	Delta::parent(DeltaKind::Attribute, "fields", "Fields", children)
}

fn diff_methods(left: &ClassFile, right: &ClassFile) -> Delta {
	let children = pair_by_key(
		&left.methods,
		&right.methods,
		|m| member_id(&m.name, &m.descriptor),
		|id, l, r| diff_method(id, l, r, &left.pool, &right.pool),
		|id, m| member_stub(DeltaKind::Method, id, "Method", &m.name, true),
		|id, m| member_stub(DeltaKind::Method, id, "Method", &m.name, false),
	);
	Delta::parent(DeltaKind::Attribute, "methods", "Methods", children)
}

fn diff_field(id: &str, left: &Field, right: &Field) -> Delta {
	let children = vec![
		Delta::leaf(
			DeltaKind::Attribute,
			"access_flags",
			"Access flags",
			Some(left.access.to_string()),
			Some(right.access.to_string()),
		),
		Delta::leaf(
			DeltaKind::Attribute,
			"signature",
			"Generics signature",
			left.signature().map(str::to_owned),
			right.signature().map(str::to_owned),
		),
		Delta::leaf(
			DeltaKind::Attribute,
			"constant_value",
			"Constant value",
			left.constant_value().map(|v| v.to_string()),
			right.constant_value().map(|v| v.to_string()),
		),
		Delta::leaf(
			DeltaKind::Attribute,
			"deprecated",
			"Deprecation",
			Some(left.is_deprecated().to_string()),
			Some(right.is_deprecated().to_string()),
		)
		.with_token(tokens::DEPRECATED),
		Delta::leaf(
			DeltaKind::Attribute,
			"annotations",
			"Runtime annotations",
			annotations_repr(&left.attributes, "RuntimeVisibleAnnotations"),
			annotations_repr(&right.attributes, "RuntimeVisibleAnnotations"),
		),
	];
	Delta::parent(DeltaKind::Field, id, &format!("Field {}", left.name), children)
}

fn diff_method(
	id: &str,
	left: &Method,
	right: &Method,
	left_pool: &classfile::ConstantPool,
	right_pool: &classfile::ConstantPool,
) -> Delta {
	let children = vec![
		Delta::leaf(
			DeltaKind::Attribute,
			"access_flags",
			"Access flags",
			Some(left.access.to_string()),
			Some(right.access.to_string()),
		),
		Delta::leaf(
			DeltaKind::Attribute,
			"signature",
			"Generics signature",
			left.signature().map(str::to_owned),
			right.signature().map(str::to_owned),
		),
		Delta::leaf(
			DeltaKind::Attribute,
			"exceptions",
			"Declared exceptions",
			Some(sorted_list(left.exceptions())),
			Some(sorted_list(right.exceptions())),
		),
		Delta::leaf(
			DeltaKind::Attribute,
			"deprecated",
			"Deprecation",
			Some(left.is_deprecated().to_string()),
			Some(right.is_deprecated().to_string()),
		)
		.with_token(tokens::DEPRECATED),
		Delta::leaf(
			DeltaKind::Attribute,
			"annotations",
			"Runtime annotations",
			annotations_repr(&left.attributes, "RuntimeVisibleAnnotations"),
			annotations_repr(&right.attributes, "RuntimeVisibleAnnotations"),
		),
		diff_code(left.code(), right.code(), left_pool, right_pool),
	];
	Delta::parent(DeltaKind::Method, id, &format!("Method {}", left.name), children)
}

/// Pairs two member slices by a key, emitting paired diffs in key order,
/// then additions, then removals.
fn pair_by_key<'a, T>(
	left: &'a [T],
	right: &'a [T],
	key: impl Fn(&T) -> String,
	paired: impl Fn(&str, &'a T, &'a T) -> Delta,
	added: impl Fn(&str, &'a T) -> Delta,
	removed: impl Fn(&str, &'a T) -> Delta,
) -> Vec<Delta> {
	let left_map: BTreeMap<String, &T> = left.iter().map(|t| (key(t), t)).collect();
	let right_map: BTreeMap<String, &T> = right.iter().map(|t| (key(t), t)).collect();

	let mut out = Vec::new();
	for (id, l) in &left_map {
		if let Some(r) = right_map.get(id) {
			out.push(paired(id, l, r));
		}
	}
	for (id, r) in &right_map {
		if !left_map.contains_key(id) {
			out.push(added(id, r));
		}
	}
	for (id, l) in &left_map {
		if !right_map.contains_key(id) {
			out.push(removed(id, l));
		}
	}
	out
}

fn member_id(name: &str, descriptor: &str) -> String {
	format!("{name}:{descriptor}")
}

fn member_stub(kind: DeltaKind, id: &str, what: &str, name: &str, is_added: bool) -> Delta {
	let label = format!("{what} {name}");
	if is_added {
		Delta::added(kind, id, &label).with_token(tokens::ADDED)
	} else {
		Delta::removed(kind, id, &label)
	}
}

fn platform(class: &ClassFile) -> String {
	class.version.platform().unwrap_or("unknown").to_owned()
}

fn sorted_list<S: AsRef<str>>(items: &[S]) -> String {
	let mut items: Vec<&str> = items.iter().map(AsRef::as_ref).collect();
	items.sort_unstable();
	items.join(", ")
}

fn annotations_repr(attributes: &[AttributeInfo], name: &str) -> Option<String> {
	match attributes::find(attributes, name)? {
		Attribute::RuntimeVisibleAnnotations(annotations)
		| Attribute::RuntimeInvisibleAnnotations(annotations) => Some(format!("{annotations:?}")),
		_ => None,
	}
}

fn inner_classes_repr(class: &ClassFile) -> Option<String> {
	match attributes::find(&class.attributes, "InnerClasses")? {
		Attribute::InnerClasses(inner) => {
			let mut entries: Vec<String> = inner.iter().map(|i| format!("{i:?}")).collect();
			entries.sort_unstable();
			Some(entries.join("\n"))
		},
		_ => None,
	}
}

/// The pool rendered entry by entry in index order. Two pools that hold the
/// same symbols in a different order render differently here, which is
/// exactly what the `pool` ignore token exists for.
fn pool_repr(class: &ClassFile) -> String {
	let mut out = String::new();
	for (index, _) in class.pool.iter() {
		match class.pool.symbolic(index) {
			Ok(symbolic) => {
				let _ = writeln!(out, "{index}: {symbolic}");
			},
			Err(_) => {
				let _ = writeln!(out, "{index}: ??");
			},
		}
	}
	out
}
