//! In-memory jars and the walker over their entries.

use std::fmt::{Debug, Formatter};
use std::io::{Cursor, Read};

use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::Result;
use crate::manifest::Manifest;

pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// A `.jar` held in memory, optionally carrying the name it was loaded from.
#[derive(Clone)]
pub struct MemJar {
	name: Option<String>,
	data: Vec<u8>,
}

impl Debug for MemJar {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MemJar")
			.field("name", &self.name)
			.field("size", &self.data.len())
			.finish_non_exhaustive()
	}
}

impl MemJar {
	pub fn named(name: String, data: Vec<u8>) -> MemJar {
		MemJar { name: Some(name), data }
	}

	pub fn unnamed(data: Vec<u8>) -> MemJar {
		MemJar { name: None, data }
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn open(&self) -> Result<OpenedJar<'_>> {
		Ok(OpenedJar {
			archive: ZipArchive::new(Cursor::new(self.data.as_slice()))?,
		})
	}
}

/// An opened jar, ready for entry iteration and name lookup.
pub struct OpenedJar<'a> {
	archive: ZipArchive<Cursor<&'a [u8]>>,
}

/// One entry, read eagerly out of the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JarEntry {
	pub name: String,
	pub data: EntryData,
}

/// Entries are classified by suffix only; decoding class bytes is the
/// caller's business.
#[derive(Clone, PartialEq, Eq)]
pub enum EntryData {
	Dir,
	Class(Vec<u8>),
	Resource(Vec<u8>),
}

impl Debug for EntryData {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			EntryData::Dir => write!(f, "Dir"),
			EntryData::Class(data) => write!(f, "Class({} bytes)", data.len()),
			EntryData::Resource(data) => write!(f, "Resource({} bytes)", data.len()),
		}
	}
}

impl<'a> OpenedJar<'a> {
	pub fn len(&self) -> usize {
		self.archive.len()
	}

	pub fn is_empty(&self) -> bool {
		self.archive.len() == 0
	}

	/// Entry names in archive order.
	pub fn entry_names(&self) -> Vec<String> {
		(0..self.archive.len())
			.filter_map(|index| self.archive.name_for_index(index))
			.map(str::to_owned)
			.collect()
	}

	/// Random access to one entry's bytes, `None` when absent.
	pub fn read(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
		match self.archive.by_name(name) {
			Ok(mut file) => {
				let mut data = Vec::with_capacity(file.size() as usize);
				file.read_to_end(&mut data)?;
				Ok(Some(data))
			},
			Err(ZipError::FileNotFound) => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	/// Reads every entry, in archive order.
	pub fn entries(&mut self) -> Result<Vec<JarEntry>> {
		let mut entries = Vec::with_capacity(self.archive.len());
		for index in 0..self.archive.len() {
			let mut file = self.archive.by_index(index)?;
			let name = file.name().to_owned();

			let data = if file.is_dir() {
				EntryData::Dir
			} else {
				let mut data = Vec::with_capacity(file.size() as usize);
				file.read_to_end(&mut data)?;
				if name.ends_with(".class") {
					EntryData::Class(data)
				} else {
					EntryData::Resource(data)
				}
			};

			entries.push(JarEntry { name, data });
		}
		Ok(entries)
	}

	/// The parsed `META-INF/MANIFEST.MF`, if the jar has one.
	pub fn manifest(&mut self) -> Result<Option<Manifest>> {
		match self.read(MANIFEST_PATH)? {
			Some(data) => Ok(Some(Manifest::parse(&data)?)),
			None => Ok(None),
		}
	}

	/// The `META-INF/*.SF` signature files.
	pub fn signature_files(&mut self) -> Result<Vec<(String, Vec<u8>)>> {
		let names: Vec<String> = self
			.entry_names()
			.into_iter()
			.filter(|n| is_signature_file(n))
			.collect();

		let mut files = Vec::with_capacity(names.len());
		for name in names {
			let data = self.read(&name)?.expect("names came from this jar");
			files.push((name, data));
		}
		Ok(files)
	}

	/// The signature block (`.RSA`/`.DSA`/`.EC`) matching a signature file.
	pub fn signature_block_for(&mut self, sf_name: &str) -> Result<Option<(String, Vec<u8>)>> {
		let stem = match sf_name.strip_suffix(".SF") {
			Some(stem) => stem,
			None => return Ok(None),
		};
		for suffix in [".RSA", ".DSA", ".EC"] {
			let candidate = format!("{stem}{suffix}");
			if let Some(data) = self.read(&candidate)? {
				return Ok(Some((candidate, data)));
			}
		}
		Ok(None)
	}
}

pub fn is_signature_file(name: &str) -> bool {
	name.strip_prefix("META-INF/")
		.is_some_and(|rest| rest.ends_with(".SF"))
}

pub fn is_signature_block(name: &str) -> bool {
	name.strip_prefix("META-INF/").is_some_and(|rest| {
		rest.ends_with(".RSA") || rest.ends_with(".DSA") || rest.ends_with(".EC") || rest.starts_with("SIG-")
	})
}
