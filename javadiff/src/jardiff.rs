//! The jar comparator.
//!
//! Entries pair by path. Class entries go through the class comparator,
//! the manifest through the manifest comparator, signature files under the
//! `jar_signature` token, text resources through a line comparison, binary
//! resources by content hash. Aggregated provides/requires symbol sets are
//! compared as jar-level facts.

use std::collections::BTreeMap;
use std::fmt::Write;

use anyhow::Result;
use classfile::deps::{self, SymbolSets};
use classfile::{CancelToken, ClassFile, DecodeError};
use jarbox::jar::{is_signature_block, is_signature_file, MANIFEST_PATH};
use jarbox::{EntryData, Manifest, MemJar};
use sha2::{Digest, Sha256};

use crate::classdiff::diff_classes;
use crate::delta::{Change, Delta, DeltaKind};
use crate::ignore::tokens;

pub fn diff_jars(left: &MemJar, right: &MemJar, cancel: &CancelToken) -> Result<Delta> {
	let left_entries = entry_map(left)?;
	let right_entries = entry_map(right)?;

	let mut children = Vec::new();
	let mut left_symbols = SymbolSets::new();
	let mut right_symbols = SymbolSets::new();

	// paired entries in path order
	for (path, left_data) in &left_entries {
		let Some(right_data) = right_entries.get(path) else {
			continue;
		};
		cancel.check()?;
		children.extend(diff_entry(path, left_data, right_data, cancel, &mut left_symbols, &mut right_symbols)?);
	}
	// then additions
	for (path, data) in &right_entries {
		if !left_entries.contains_key(path) {
			collect_symbols(data, &mut right_symbols);
			children.push(entry_stub(path, data, Change::Added));
		}
	}
	// then removals
	for (path, data) in &left_entries {
		if !right_entries.contains_key(path) {
			collect_symbols(data, &mut left_symbols);
			children.push(entry_stub(path, data, Change::Removed));
		}
	}

	children.push(Delta::leaf(
		DeltaKind::Attribute,
		"provides",
		"Provides",
		Some(joined(&left_symbols.provides)),
		Some(joined(&right_symbols.provides)),
	));
	children.push(Delta::leaf(
		DeltaKind::Attribute,
		"requires",
		"Requires",
		Some(joined(&left_symbols.requires)),
		Some(joined(&right_symbols.requires)),
	));

	let label = match (left.name(), right.name()) {
		(Some(l), Some(r)) if l == r => format!("Jar {l}"),
		(Some(l), Some(r)) => format!("Jar {l} -> {r}"),
		_ => "Jar".to_owned(),
	};
	Ok(Delta::parent(DeltaKind::Jar, "jar", &label, children))
}

fn entry_map(jar: &MemJar) -> Result<BTreeMap<String, EntryData>> {
	let mut map = BTreeMap::new();
	for entry in jar.open()?.entries()? {
		if entry.data == EntryData::Dir {
			continue;
		}
		map.insert(entry.name, entry.data);
	}
	Ok(map)
}

fn diff_entry(
	path: &str,
	left: &EntryData,
	right: &EntryData,
	cancel: &CancelToken,
	left_symbols: &mut SymbolSets,
	right_symbols: &mut SymbolSets,
) -> Result<Vec<Delta>> {
	Ok(match (left, right) {
		(EntryData::Class(left_bytes), EntryData::Class(right_bytes)) => {
			vec![diff_class_entry(path, left_bytes, right_bytes, cancel, left_symbols, right_symbols)?]
		},
		(EntryData::Resource(left_bytes), EntryData::Resource(right_bytes)) => {
			if path == MANIFEST_PATH {
				vec![diff_manifest_entry(path, left_bytes, right_bytes)]
			} else if is_signature_file(path) {
				vec![diff_resource(path, left_bytes, right_bytes).with_token(tokens::JAR_SIGNATURE)]
			} else if is_signature_block(path) {
				vec![diff_binary(path, left_bytes, right_bytes).with_token(tokens::JAR_SIGNATURE)]
			} else {
				vec![diff_resource(path, left_bytes, right_bytes)]
			}
		},
		// an entry that changed kind reads as a removal plus an addition
		(left_data, right_data) => vec![
			entry_stub(path, right_data, Change::Added),
			entry_stub(path, left_data, Change::Removed),
		],
	})
}

fn diff_class_entry(
	path: &str,
	left_bytes: &[u8],
	right_bytes: &[u8],
	cancel: &CancelToken,
	left_symbols: &mut SymbolSets,
	right_symbols: &mut SymbolSets,
) -> Result<Delta> {
	let left = decode_class(left_bytes, cancel)?;
	let right = decode_class(right_bytes, cancel)?;

	match (left, right) {
		(Ok(left), Ok(right)) => {
			left_symbols.merge(&deps::class_symbols(&left));
			right_symbols.merge(&deps::class_symbols(&right));

			let mut delta = diff_classes(&left, &right, cancel)?;
			delta.id = path.to_owned();
			delta.label = format!("Class {path}");
			Ok(delta)
		},
		(Err(e), _) | (_, Err(e)) => {
			log::warn!("failed to decode {path}: {e}");
			Ok(Delta::error(path, format!("failed to decode class: {e}")))
		},
	}
}

/// Decodes one class, letting cancellation through as a real error while
/// turning decode problems into values the caller records as error nodes.
fn decode_class(bytes: &[u8], cancel: &CancelToken) -> Result<std::result::Result<ClassFile, DecodeError>> {
	match ClassFile::parse_with(bytes, cancel) {
		Ok(class) => Ok(Ok(class)),
		Err(DecodeError::Cancelled) => Err(DecodeError::Cancelled.into()),
		Err(e) => Ok(Err(e)),
	}
}

fn diff_manifest_entry(path: &str, left_bytes: &[u8], right_bytes: &[u8]) -> Delta {
	let left = Manifest::parse(left_bytes);
	let right = Manifest::parse(right_bytes);

	let (left, right) = match (left, right) {
		(Ok(left), Ok(right)) => (left, right),
		(Err(e), _) | (_, Err(e)) => {
			return Delta::error(path, format!("failed to parse manifest: {e}"));
		},
	};

	let mut children = vec![Delta::leaf(
		DeltaKind::Attribute,
		"main",
		"Main attributes",
		Some(section_repr(left.main.iter())),
		Some(section_repr(right.main.iter())),
	)];

	let left_names: BTreeMap<&str, _> = left.sections.iter().map(|(k, v)| (k.as_str(), v)).collect();
	let right_names: BTreeMap<&str, _> = right.sections.iter().map(|(k, v)| (k.as_str(), v)).collect();

	for (name, left_section) in &left_names {
		if let Some(right_section) = right_names.get(name) {
			children.push(
				Delta::leaf(
					DeltaKind::Attribute,
					name,
					&format!("Section {name}"),
					Some(section_repr(left_section.iter())),
					Some(section_repr(right_section.iter())),
				)
				.with_token(tokens::MANIFEST_SUBSECTIONS),
			);
		}
	}
	for name in right_names.keys() {
		if !left_names.contains_key(name) {
			children.push(
				Delta::added(DeltaKind::Attribute, name, &format!("Section {name}"))
					.with_token(tokens::MANIFEST_SUBSECTIONS),
			);
		}
	}
	for name in left_names.keys() {
		if !right_names.contains_key(name) {
			children.push(
				Delta::removed(DeltaKind::Attribute, name, &format!("Section {name}"))
					.with_token(tokens::MANIFEST_SUBSECTIONS),
			);
		}
	}

	Delta::parent(DeltaKind::Manifest, path, "Jar manifest", children)
}

fn section_repr<'a>(entries: impl Iterator<Item = (&'a str, &'a str)>) -> String {
	let mut out = String::new();
	for (key, value) in entries {
		let _ = writeln!(out, "{key}: {value}");
	}
	out
}

/// Compares a non-class resource: line-wise when both sides are text,
/// by content hash otherwise.
pub(crate) fn diff_resource(path: &str, left: &[u8], right: &[u8]) -> Delta {
	match (text_of(left), text_of(right)) {
		(Some(left_text), Some(right_text)) => diff_text(path, left_text, right_text),
		_ => diff_binary(path, left, right),
	}
}

fn diff_text(path: &str, left: &str, right: &str) -> Delta {
	let delta = Delta::leaf(
		DeltaKind::Resource,
		path,
		&format!("Text file {path}"),
		Some(left.to_owned()),
		Some(right.to_owned()),
	);
	if !delta.is_changed() {
		return delta;
	}

	// differences in nothing but trailing whitespace get their own token
	let left_trimmed: Vec<&str> = left.lines().map(str::trim_end).collect();
	let right_trimmed: Vec<&str> = right.lines().map(str::trim_end).collect();
	if left_trimmed == right_trimmed {
		delta.with_token(tokens::TRAILING_WHITESPACE)
	} else {
		delta
	}
}

pub(crate) fn diff_binary(path: &str, left: &[u8], right: &[u8]) -> Delta {
	Delta::leaf(
		DeltaKind::Resource,
		path,
		&format!("Binary file {path}"),
		Some(sha256_hex(left)),
		Some(sha256_hex(right)),
	)
}

pub(crate) fn entry_stub(path: &str, data: &EntryData, change: Change) -> Delta {
	let (kind, what) = match data {
		EntryData::Dir => (DeltaKind::Resource, "Directory"),
		EntryData::Class(_) => (DeltaKind::Class, "Class"),
		EntryData::Resource(_) => (DeltaKind::Resource, "File"),
	};
	let label = format!("{what} {path}");
	let mut delta = match change {
		Change::Added => Delta::added(kind, path, &label).with_token(tokens::ADDED),
		_ => Delta::removed(kind, path, &label),
	};
	// the signature envelope is its own difference class, token-wise
	if is_signature_file(path) || is_signature_block(path) {
		delta = delta.with_token(tokens::JAR_SIGNATURE);
	}
	delta
}

fn collect_symbols(data: &EntryData, symbols: &mut SymbolSets) {
	if let EntryData::Class(bytes) = data {
		if let Ok(class) = ClassFile::parse(bytes) {
			symbols.merge(&deps::class_symbols(&class));
		}
	}
}

fn text_of(bytes: &[u8]) -> Option<&str> {
	if bytes.contains(&0) {
		return None;
	}
	std::str::from_utf8(bytes).ok()
}

fn sha256_hex(data: &[u8]) -> String {
	let digest = Sha256::digest(data);
	let mut out = String::with_capacity(64);
	for byte in digest {
		let _ = write!(out, "{byte:02x}");
	}
	out
}

fn joined(set: &std::collections::BTreeSet<String>) -> String {
	set.iter().cloned().collect::<Vec<_>>().join("\n")
}
