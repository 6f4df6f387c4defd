//! Walking a distribution: a directory tree containing jars, loose class
//! files and resources.
//!
//! The walker consumes a [`DirSource`], a virtual directory of logical
//! paths, so the differ never touches the filesystem directly. [`FsDir`]
//! adapts a real directory; [`MemDir`] serves tests and synthetic trees.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Result;

/// A flat view of a directory tree: logical `/`-separated paths to bytes.
pub trait DirSource {
	/// Logical paths of every file, in sorted order.
	fn paths(&self) -> Result<Vec<String>>;

	fn read(&self, path: &str) -> Result<Vec<u8>>;
}

/// What a distribution entry is, judged by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
	/// A loose `.class` file.
	Class,
	/// A jar-like archive, walked transitively by the differ.
	Archive,
	Resource,
}

const ARCHIVE_SUFFIXES: &[&str] = &[".jar", ".war", ".ear", ".zip", ".sar"];

pub fn classify(path: &str) -> ArtifactKind {
	if path.ends_with(".class") {
		ArtifactKind::Class
	} else if ARCHIVE_SUFFIXES.iter().any(|suffix| path.ends_with(suffix)) {
		ArtifactKind::Archive
	} else {
		ArtifactKind::Resource
	}
}

/// An on-disk directory, walked recursively.
pub struct FsDir {
	root: PathBuf,
}

impl FsDir {
	pub fn new(root: impl Into<PathBuf>) -> FsDir {
		FsDir { root: root.into() }
	}
}

impl DirSource for FsDir {
	fn paths(&self) -> Result<Vec<String>> {
		let mut paths = Vec::new();
		for entry in WalkDir::new(&self.root).sort_by_file_name() {
			let entry = entry.map_err(std::io::Error::from)?;
			if !entry.file_type().is_file() {
				continue;
			}
			let relative = entry
				.path()
				.strip_prefix(&self.root)
				.expect("walked entries live under the root");
			paths.push(logical_path(relative));
		}
		paths.sort();
		Ok(paths)
	}

	fn read(&self, path: &str) -> Result<Vec<u8>> {
		Ok(fs::read(self.root.join(path))?)
	}
}

fn logical_path(path: &Path) -> String {
	let parts: Vec<_> = path
		.components()
		.map(|c| c.as_os_str().to_string_lossy())
		.collect();
	parts.join("/")
}

/// An in-memory directory tree.
#[derive(Debug, Clone, Default)]
pub struct MemDir {
	files: BTreeMap<String, Vec<u8>>,
}

impl MemDir {
	pub fn new() -> MemDir {
		MemDir::default()
	}

	pub fn put(&mut self, path: &str, data: Vec<u8>) -> &mut MemDir {
		self.files.insert(path.to_owned(), data);
		self
	}
}

impl DirSource for MemDir {
	fn paths(&self) -> Result<Vec<String>> {
		Ok(self.files.keys().cloned().collect())
	}

	fn read(&self, path: &str) -> Result<Vec<u8>> {
		self.files
			.get(path)
			.cloned()
			.ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound).into())
	}
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use crate::dist::{classify, ArtifactKind, DirSource, FsDir, MemDir};

	#[test]
	fn classification() {
		assert_eq!(classify("com/example/Main.class"), ArtifactKind::Class);
		assert_eq!(classify("lib/util.jar"), ArtifactKind::Archive);
		assert_eq!(classify("webapp.war"), ArtifactKind::Archive);
		assert_eq!(classify("README.txt"), ArtifactKind::Resource);
	}

	#[test]
	fn mem_dir_sorts_paths() {
		let mut dir = MemDir::new();
		dir.put("b.txt", b"b".to_vec());
		dir.put("a.txt", b"a".to_vec());

		assert_eq!(dir.paths().unwrap(), vec!["a.txt", "b.txt"]);
		assert_eq!(dir.read("a.txt").unwrap(), b"a");
		assert!(dir.read("missing").is_err());
	}

	#[test]
	fn fs_dir_walks_recursively() {
		let root = tempfile::tempdir().unwrap();
		std::fs::create_dir_all(root.path().join("sub")).unwrap();
		std::fs::write(root.path().join("top.txt"), b"top").unwrap();
		std::fs::write(root.path().join("sub/inner.txt"), b"inner").unwrap();

		let dir = FsDir::new(root.path());
		assert_eq!(dir.paths().unwrap(), vec!["sub/inner.txt", "top.txt"]);
		assert_eq!(dir.read("sub/inner.txt").unwrap(), b"inner");
	}
}
