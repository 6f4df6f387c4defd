//! Derives the provides/requires symbol sets of a decoded class.
//!
//! Provides is the class itself plus its non-private members. Requires is
//! every class or member the class references: constant pool `Class` entries
//! and member refs, classes buried in descriptors and generic signatures,
//! and classes used by annotations. Symbols provided by the class itself
//! (including private members) never count as required.
//!
//! Member symbols use the form `owner.name:descriptor`; class symbols are
//! plain internal names like `java/lang/Object`.

use std::collections::BTreeSet;

use crate::attributes::{Annotation, Attribute, AttributeInfo, ElementValue};
use crate::class::ClassFile;
use crate::pool::Entry;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolSets {
	pub provides: BTreeSet<String>,
	pub requires: BTreeSet<String>,
}

impl SymbolSets {
	pub fn new() -> SymbolSets {
		SymbolSets::default()
	}

	/// Union-wise aggregation across classes of a jar or distribution.
	pub fn merge(&mut self, other: &SymbolSets) {
		self.provides.extend(other.provides.iter().cloned());
		self.requires.extend(other.requires.iter().cloned());
	}

	/// The symbols required but not provided anywhere in the aggregate.
	pub fn unresolved(&self) -> BTreeSet<String> {
		self.requires.difference(&self.provides).cloned().collect()
	}
}

/// Computes the provides/requires sets of one decoded class.
pub fn class_symbols(class: &ClassFile) -> SymbolSets {
	let mut provides = BTreeSet::new();
	provides.insert(class.this_class.clone());
	for field in &class.fields {
		if !field.access.is_private {
			provides.insert(member_symbol(&class.this_class, &field.name, &field.descriptor));
		}
	}
	for method in &class.methods {
		if !method.access.is_private {
			provides.insert(member_symbol(&class.this_class, &method.name, &method.descriptor));
		}
	}

	// everything the class defines, private members included, so that
	// self-references do not show up as requirements
	let mut internal: BTreeSet<String> = provides.clone();
	internal.insert(class.this_class.clone());
	for field in &class.fields {
		internal.insert(member_symbol(&class.this_class, &field.name, &field.descriptor));
	}
	for method in &class.methods {
		internal.insert(member_symbol(&class.this_class, &method.name, &method.descriptor));
	}

	let mut requires = BTreeSet::new();

	for (index, entry) in class.pool.iter() {
		match entry {
			Entry::Class { .. } => {
				if let Ok(name) = class.pool.as_class_name(index) {
					add_class_name(&mut requires, name);
				}
			},
			Entry::FieldRef { .. } => {
				if let Ok((owner, name, descriptor)) = class.pool.as_fieldref_triple(index) {
					add_class_name(&mut requires, owner);
					descriptor_classes(descriptor, &mut requires);
					if !owner.starts_with('[') {
						requires.insert(member_symbol(owner, name, descriptor));
					}
				}
			},
			Entry::MethodRef { .. } | Entry::InterfaceMethodRef { .. } => {
				if let Ok((owner, name, descriptor)) = class.pool.as_methodref_triple(index) {
					add_class_name(&mut requires, owner);
					descriptor_classes(descriptor, &mut requires);
					if !owner.starts_with('[') {
						requires.insert(member_symbol(owner, name, descriptor));
					}
				}
			},
			_ => {},
		}
	}

	for field in &class.fields {
		descriptor_classes(&field.descriptor, &mut requires);
		attribute_classes(&field.attributes, &mut requires);
	}
	for method in &class.methods {
		descriptor_classes(&method.descriptor, &mut requires);
		attribute_classes(&method.attributes, &mut requires);
	}
	attribute_classes(&class.attributes, &mut requires);

	let requires = requires.into_iter().filter(|s| !internal.contains(s)).collect();

	SymbolSets { provides, requires }
}

fn member_symbol(owner: &str, name: &str, descriptor: &str) -> String {
	format!("{owner}.{name}:{descriptor}")
}

/// Adds a class reference, unwrapping array descriptors to their element class.
fn add_class_name(set: &mut BTreeSet<String>, name: &str) {
	if let Some(stripped) = name.strip_prefix('[') {
		// an array type: only a reference element type names a class
		descriptor_classes(stripped, set);
	} else {
		set.insert(name.to_owned());
	}
}

/// Collects every `Lname;` class reference out of a field or method descriptor.
fn descriptor_classes(descriptor: &str, set: &mut BTreeSet<String>) {
	let bytes = descriptor.as_bytes();
	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] == b'L' {
			let rest = &descriptor[i + 1..];
			if let Some(end) = rest.find(';') {
				set.insert(rest[..end].to_owned());
				i += 1 + end + 1;
				continue;
			}
		}
		i += 1;
	}
}

/// Collects class references out of a generic signature.
///
/// Signatures extend descriptors with type variables (`TX;`) and type
/// arguments (`<...>`); a class name segment ends at either `;` or `<`.
fn signature_classes(signature: &str, set: &mut BTreeSet<String>) {
	let bytes = signature.as_bytes();
	let mut i = 0;
	while i < bytes.len() {
		match bytes[i] {
			b'L' => {
				let rest = &signature[i + 1..];
				let end = rest.find([';', '<']).unwrap_or(rest.len());
				if end > 0 {
					set.insert(rest[..end].to_owned());
				}
				i += 1 + end;
			},
			b'T' => {
				// a type variable use, skip to its terminator; but stop at an
				// `L` so the bounds of a formal parameter named `T` still count
				let rest = &signature[i + 1..];
				let end = rest.find(';').map_or(rest.len(), |e| e + 1);
				match rest[..end].find('L') {
					Some(l) => i += 1 + l,
					None => i += 1 + end,
				}
			},
			_ => i += 1,
		}
	}
}

fn attribute_classes(attributes: &[AttributeInfo], set: &mut BTreeSet<String>) {
	for info in attributes {
		match &info.attr {
			Attribute::Signature(signature) => signature_classes(signature, set),
			Attribute::RuntimeVisibleAnnotations(annotations)
			| Attribute::RuntimeInvisibleAnnotations(annotations) => {
				for annotation in annotations {
					annotation_classes(annotation, set);
				}
			},
			Attribute::RuntimeVisibleParameterAnnotations(parameters)
			| Attribute::RuntimeInvisibleParameterAnnotations(parameters) => {
				for annotations in parameters {
					for annotation in annotations {
						annotation_classes(annotation, set);
					}
				}
			},
			Attribute::AnnotationDefault(value) => element_value_classes(value, set),
			Attribute::Code(code) => attribute_classes(&code.attributes, set),
			_ => {},
		}
	}
}

fn annotation_classes(annotation: &Annotation, set: &mut BTreeSet<String>) {
	descriptor_classes(&annotation.type_descriptor, set);
	for (_, value) in &annotation.elements {
		element_value_classes(value, set);
	}
}

fn element_value_classes(value: &ElementValue, set: &mut BTreeSet<String>) {
	match value {
		ElementValue::Const(_) => {},
		ElementValue::Enum { type_descriptor, .. } => descriptor_classes(type_descriptor, set),
		ElementValue::ClassInfo(descriptor) => descriptor_classes(descriptor, set),
		ElementValue::Annotation(annotation) => annotation_classes(annotation, set),
		ElementValue::Array(values) => {
			for value in values {
				element_value_classes(value, set);
			}
		},
	}
}

#[cfg(test)]
mod testing {
	use std::collections::BTreeSet;
	use pretty_assertions::assert_eq;
	use crate::deps::{descriptor_classes, signature_classes, SymbolSets};

	fn classes_of(f: impl Fn(&mut BTreeSet<String>)) -> Vec<String> {
		let mut set = BTreeSet::new();
		f(&mut set);
		set.into_iter().collect()
	}

	#[test]
	fn descriptor_extraction() {
		let found = classes_of(|set| {
			descriptor_classes("(Ljava/lang/String;[Ljava/util/List;IJ)Ljava/lang/Object;", set)
		});
		assert_eq!(found, vec!["java/lang/Object", "java/lang/String", "java/util/List"]);
	}

	#[test]
	fn primitive_descriptor_has_no_classes() {
		assert_eq!(classes_of(|set| descriptor_classes("(IJ[B)V", set)), Vec::<String>::new());
	}

	#[test]
	fn signature_extraction() {
		let found = classes_of(|set| {
			signature_classes("Ljava/util/Map<TK;Ljava/lang/String;>;", set)
		});
		assert_eq!(found, vec!["java/lang/String", "java/util/Map"]);
	}

	#[test]
	fn unresolved_is_requires_minus_provides() {
		let mut a = SymbolSets::new();
		a.provides.insert("pkg/A".to_owned());
		a.requires.insert("pkg/B".to_owned());

		let mut b = SymbolSets::new();
		b.provides.insert("pkg/B".to_owned());
		b.requires.insert("java/lang/Object".to_owned());

		a.merge(&b);
		let unresolved: Vec<_> = a.unresolved().into_iter().collect();
		assert_eq!(unresolved, vec!["java/lang/Object"]);
	}
}
