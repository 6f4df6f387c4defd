//! The distribution comparator.
//!
//! Pairs files of two directory trees by logical path and delegates by
//! artifact kind: loose classes to the class comparator, archives to the
//! jar comparator, everything else to the resource comparison. Artifacts
//! that fail to decode become error nodes and the walk continues.

use anyhow::Result;
use classfile::{CancelToken, DecodeError};
use jarbox::dist::{classify, ArtifactKind, DirSource};
use jarbox::MemJar;

use crate::classdiff::diff_classes;
use crate::delta::{Change, Delta, DeltaKind};
use crate::ignore::tokens;
use crate::jardiff::{diff_resource, diff_jars};

pub fn diff_dists(left: &dyn DirSource, right: &dyn DirSource, cancel: &CancelToken) -> Result<Delta> {
	let left_paths = left.paths()?;
	let right_paths = right.paths()?;

	let mut children = Vec::new();

	// paired files in path order
	for path in &left_paths {
		if !right_paths.contains(path) {
			continue;
		}
		cancel.check()?;
		let left_bytes = left.read(path)?;
		let right_bytes = right.read(path)?;
		children.push(diff_artifact(path, &left_bytes, &right_bytes, cancel)?);
	}
	// then additions
	for path in &right_paths {
		if !left_paths.contains(path) {
			children.push(artifact_stub(path, Change::Added));
		}
	}
	// then removals
	for path in &left_paths {
		if !right_paths.contains(path) {
			children.push(artifact_stub(path, Change::Removed));
		}
	}

	Ok(Delta::parent(DeltaKind::Dist, "dist", "Distribution", children))
}

fn diff_artifact(path: &str, left: &[u8], right: &[u8], cancel: &CancelToken) -> Result<Delta> {
	Ok(match classify(path) {
		ArtifactKind::Class => match diff_loose_class(path, left, right, cancel)? {
			Some(delta) => delta,
			None => Delta::error(path, "failed to decode class".to_owned()),
		},
		ArtifactKind::Archive => {
			let left_jar = MemJar::named(path.to_owned(), left.to_vec());
			let right_jar = MemJar::named(path.to_owned(), right.to_vec());
			match diff_jars(&left_jar, &right_jar, cancel) {
				Ok(mut delta) => {
					delta.id = path.to_owned();
					delta
				},
				Err(e) if e.downcast_ref::<DecodeError>() == Some(&DecodeError::Cancelled) => {
					return Err(e);
				},
				Err(e) => {
					log::warn!("failed to diff archive {path}: {e}");
					Delta::error(path, format!("failed to open archive: {e}"))
				},
			}
		},
		ArtifactKind::Resource => diff_resource(path, left, right),
	})
}

fn diff_loose_class(path: &str, left: &[u8], right: &[u8], cancel: &CancelToken) -> Result<Option<Delta>> {
	let decode = |bytes: &[u8]| match classfile::ClassFile::parse_with(bytes, cancel) {
		Ok(class) => Ok(Some(class)),
		Err(DecodeError::Cancelled) => Err(DecodeError::Cancelled),
		Err(e) => {
			log::warn!("failed to decode {path}: {e}");
			Ok(None)
		},
	};

	let (left, right) = (decode(left)?, decode(right)?);
	Ok(match (left, right) {
		(Some(left), Some(right)) => {
			let mut delta = diff_classes(&left, &right, cancel)?;
			delta.id = path.to_owned();
			delta.label = format!("Class {path}");
			Some(delta)
		},
		_ => None,
	})
}

fn artifact_stub(path: &str, change: Change) -> Delta {
	let (kind, what) = match classify(path) {
		ArtifactKind::Class => (DeltaKind::Class, "Class"),
		ArtifactKind::Archive => (DeltaKind::Jar, "Archive"),
		ArtifactKind::Resource => (DeltaKind::Resource, "File"),
	};
	let label = format!("{what} {path}");
	match change {
		Change::Added => Delta::added(kind, path, &label).with_token(tokens::ADDED),
		_ => Delta::removed(kind, path, &label),
	}
}
