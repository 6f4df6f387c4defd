mod common;

use std::io::Write;

use pretty_assertions::assert_eq;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use classfile::{CancelToken, DecodeError};
use jarbox::{MemDir, MemJar};
use javadiff::ignore::{self, tokens};
use javadiff::{diff_dists, diff_jars, Change, Delta, DeltaKind, IgnoreSet};

use common::sample1;

fn build_jar(entries: &[(&str, &[u8])]) -> Vec<u8> {
	let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
	let options = SimpleFileOptions::default();
	for (name, data) in entries {
		writer.start_file(*name, options).unwrap();
		writer.write_all(data).unwrap();
	}
	writer.finish().unwrap().into_inner()
}

fn child<'a>(delta: &'a Delta, id: &str) -> &'a Delta {
	delta
		.children
		.iter()
		.find(|c| c.id == id)
		.unwrap_or_else(|| panic!("no child {id} in {}", delta.id))
}

#[test]
fn jar_diff_with_itself_is_unchanged() {
	let sample = sample1();
	let data = build_jar(&[
		("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\r\n\r\n"),
		("Sample1.class", &sample),
		("doc/notes.txt", b"hello\n"),
	]);
	let jar = MemJar::unnamed(data);

	let delta = diff_jars(&jar, &jar, &CancelToken::new()).unwrap();
	assert_eq!(delta.change, Change::Unchanged);
	assert_eq!(delta.kind, DeltaKind::Jar);
}

#[test]
fn entry_order_is_paired_then_added_then_removed() {
	let left = MemJar::unnamed(build_jar(&[("b.txt", b"x"), ("removed.txt", b"x")]));
	let right = MemJar::unnamed(build_jar(&[("b.txt", b"x"), ("added.txt", b"x")]));

	let delta = diff_jars(&left, &right, &CancelToken::new()).unwrap();
	let entry_ids: Vec<&str> = delta
		.children
		.iter()
		.filter(|c| c.kind == DeltaKind::Resource)
		.map(|c| c.id.as_str())
		.collect();
	assert_eq!(entry_ids, vec!["b.txt", "added.txt", "removed.txt"]);

	assert_eq!(child(&delta, "added.txt").change, Change::Added);
	assert_eq!(child(&delta, "removed.txt").change, Change::Removed);
}

#[test]
fn class_entries_go_through_the_class_comparator() {
	let sample = sample1();
	// the same class name, but final and stripped of members
	let mut cp = common::Cp::new();
	let object = cp.class("java/lang/Object");
	let this_class = cp.class("Sample1");
	let tweaked = common::class_file((52, 0), cp, 0x0031, this_class, object, &[], &[], &[], &[]);

	let left = MemJar::unnamed(build_jar(&[("Sample1.class", sample.as_slice())]));
	let right = MemJar::unnamed(build_jar(&[("Sample1.class", tweaked.as_slice())]));

	let delta = diff_jars(&left, &right, &CancelToken::new()).unwrap();
	let class = child(&delta, "Sample1.class");
	assert_eq!(class.kind, DeltaKind::Class);
	assert_eq!(class.change, Change::Modified);
	assert_eq!(child(class, "access_flags").change, Change::Modified);
}

#[test]
fn undecodable_class_becomes_an_error_node() {
	let good = sample1();
	let bad = b"\xca\xfe\xba\xbe\x00\x00\x00\x34garbage".to_vec();

	let left = MemJar::unnamed(build_jar(&[("Sample1.class", good.as_slice())]));
	let right = MemJar::unnamed(build_jar(&[("Sample1.class", bad.as_slice())]));

	let delta = diff_jars(&left, &right, &CancelToken::new()).unwrap();
	let node = child(&delta, "Sample1.class");
	assert_eq!(node.kind, DeltaKind::Error);
	assert_eq!(node.change, Change::Modified);
}

#[test]
fn trailing_whitespace_has_its_own_token() {
	let left = MemJar::unnamed(build_jar(&[("a.txt", b"hello\nworld\n")]));
	let right = MemJar::unnamed(build_jar(&[("a.txt", b"hello  \nworld\n")]));

	let mut delta = diff_jars(&left, &right, &CancelToken::new()).unwrap();
	assert_eq!(child(&delta, "a.txt").change, Change::Modified);

	ignore::apply(&mut delta, &IgnoreSet::default().with(tokens::TRAILING_WHITESPACE));
	assert_eq!(delta.change, Change::Unchanged);
	assert!(child(&delta, "a.txt").ignored);
}

#[test]
fn manifest_subsections_sit_under_their_token() {
	let left_manifest =
		b"Manifest-Version: 1.0\r\n\r\nName: a.txt\r\nSHA-256-Digest: one\r\n\r\n" as &[u8];
	let right_manifest =
		b"Manifest-Version: 1.0\r\n\r\nName: a.txt\r\nSHA-256-Digest: two\r\n\r\n" as &[u8];

	let left = MemJar::unnamed(build_jar(&[("META-INF/MANIFEST.MF", left_manifest)]));
	let right = MemJar::unnamed(build_jar(&[("META-INF/MANIFEST.MF", right_manifest)]));

	let delta = diff_jars(&left, &right, &CancelToken::new()).unwrap();
	let manifest = child(&delta, "META-INF/MANIFEST.MF");
	assert_eq!(manifest.kind, DeltaKind::Manifest);
	assert_eq!(child(manifest, "main").change, Change::Unchanged);
	assert_eq!(child(manifest, "a.txt").change, Change::Modified);

	let mut delta = diff_jars(&left, &right, &CancelToken::new()).unwrap();
	ignore::apply(&mut delta, &IgnoreSet::default().with(tokens::MANIFEST_SUBSECTIONS));
	assert_eq!(delta.change, Change::Unchanged);
}

#[test]
fn signature_files_sit_under_the_jar_signature_token() {
	let left = MemJar::unnamed(build_jar(&[
		("META-INF/SIGNER.SF", b"Signature-Version: 1.0\r\nX: 1\r\n\r\n" as &[u8]),
		("META-INF/SIGNER.RSA", b"\x01\x02"),
	]));
	let right = MemJar::unnamed(build_jar(&[
		("META-INF/SIGNER.SF", b"Signature-Version: 1.0\r\nX: 2\r\n\r\n" as &[u8]),
		("META-INF/SIGNER.RSA", b"\x03\x04"),
	]));

	let mut delta = diff_jars(&left, &right, &CancelToken::new()).unwrap();
	ignore::apply(&mut delta, &IgnoreSet::default().with(tokens::JAR_SIGNATURE));
	assert_eq!(delta.change, Change::Unchanged);
	assert!(child(&delta, "META-INF/SIGNER.SF").ignored);
	assert!(child(&delta, "META-INF/SIGNER.RSA").ignored);
}

#[test]
fn provides_and_requires_are_jar_level_children() {
	let sample = sample1();
	let with_class = MemJar::unnamed(build_jar(&[("Sample1.class", sample.as_slice())]));
	let empty = MemJar::unnamed(build_jar(&[]));

	let delta = diff_jars(&with_class, &empty, &CancelToken::new()).unwrap();
	let provides = child(&delta, "provides");
	assert_eq!(provides.change, Change::Modified);
	assert!(provides.left.as_deref().unwrap().contains("Sample1"));
	assert_eq!(provides.right.as_deref(), Some(""));

	let requires = child(&delta, "requires");
	assert!(requires.left.as_deref().unwrap().contains("java/lang/Object"));
}

#[test]
fn cancelled_jar_diff_stops() {
	let jar = MemJar::unnamed(build_jar(&[("a.txt", b"x")]));
	let token = CancelToken::new();
	token.cancel();

	let err = diff_jars(&jar, &jar, &token).unwrap_err();
	assert_eq!(err.downcast_ref::<DecodeError>(), Some(&DecodeError::Cancelled));
}

#[test]
fn dist_diff_pairs_by_logical_path() {
	let sample = sample1();
	let jar_data = build_jar(&[("Sample1.class", sample.as_slice())]);

	let mut left = MemDir::new();
	left.put("lib/app.jar", jar_data.clone());
	left.put("Sample1.class", sample.clone());
	left.put("conf/settings.txt", b"a=1\n".to_vec());
	left.put("legacy.txt", b"old\n".to_vec());

	let mut right = MemDir::new();
	right.put("lib/app.jar", jar_data);
	right.put("Sample1.class", sample);
	right.put("conf/settings.txt", b"a=2\n".to_vec());
	right.put("fresh.bin", vec![0, 159, 146, 150]);

	let delta = diff_dists(&left, &right, &CancelToken::new()).unwrap();
	assert_eq!(delta.kind, DeltaKind::Dist);
	assert_eq!(delta.change, Change::Modified);

	assert_eq!(child(&delta, "lib/app.jar").change, Change::Unchanged);
	assert_eq!(child(&delta, "lib/app.jar").kind, DeltaKind::Jar);
	assert_eq!(child(&delta, "Sample1.class").change, Change::Unchanged);
	assert_eq!(child(&delta, "conf/settings.txt").change, Change::Modified);
	assert_eq!(child(&delta, "fresh.bin").change, Change::Added);
	assert_eq!(child(&delta, "legacy.txt").change, Change::Removed);

	// deterministic order: paired, then added, then removed
	let ids: Vec<&str> = delta.children.iter().map(|c| c.id.as_str()).collect();
	assert_eq!(
		ids,
		vec![
			"Sample1.class",
			"conf/settings.txt",
			"lib/app.jar",
			"fresh.bin",
			"legacy.txt",
		]
	);
}

#[test]
fn modified_class_inside_nested_jar_is_visible() {
	let sample = sample1();
	let mut cp = common::Cp::new();
	let object = cp.class("java/lang/Object");
	let this_class = cp.class("Sample1");
	let stripped = common::class_file((52, 0), cp, 0x0021, this_class, object, &[], &[], &[], &[]);

	let mut left = MemDir::new();
	left.put("lib/app.jar", build_jar(&[("Sample1.class", sample.as_slice())]));
	let mut right = MemDir::new();
	right.put("lib/app.jar", build_jar(&[("Sample1.class", stripped.as_slice())]));

	let delta = diff_dists(&left, &right, &CancelToken::new()).unwrap();
	let jar = child(&delta, "lib/app.jar");
	assert_eq!(jar.change, Change::Modified);
	let class = child(jar, "Sample1.class");
	let fields = child(class, "fields");
	assert_eq!(
		child(fields, "DEFAULT_NAME:Ljava/lang/String;").change,
		Change::Removed
	);
}

#[test]
fn delta_tree_exports_to_json() {
	let jar = MemJar::unnamed(build_jar(&[("a.txt", b"one")]));
	let other = MemJar::unnamed(build_jar(&[("a.txt", b"two")]));

	let delta = diff_jars(&jar, &other, &CancelToken::new()).unwrap();
	let json = delta.to_json();

	assert_eq!(json["kind"], "jar");
	assert_eq!(json["change"], "modified");
	let entry = &json["children"][0];
	assert_eq!(entry["id"], "a.txt");
	assert_eq!(entry["change"], "modified");
	assert_eq!(entry["ignored"], false);
}
