//! Reading and writing the JAR manifest grammar.
//!
//! A manifest is blank-line separated sections of `Name: value` headers.
//! Values wrap across lines: a line starting with a single space continues
//! the previous header's value. The main section comes first; every later
//! section is keyed by its `Name:` header.
//!
//! Header order is preserved within and across sections. Output uses CRLF
//! and wraps lines at 72 bytes including the terminator, which is the jar
//! tool's behavior: 70 content bytes on the first line of a header, then
//! continuations of a space plus 69 bytes.

use indexmap::IndexMap;

use crate::error::{JarError, Result};

const LINE_SEPARATOR: &[u8] = b"\r\n";

/// One section: an ordered header map with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestSection {
	headers: IndexMap<String, String>,
}

impl ManifestSection {
	pub fn new() -> ManifestSection {
		ManifestSection::default()
	}

	/// A section keyed by a `Name:` header, for the non-main sections.
	pub fn named(name: &str) -> ManifestSection {
		let mut section = ManifestSection::new();
		section.headers.insert("Name".to_owned(), name.to_owned());
		section
	}

	/// The value of this section's `Name:` header.
	pub fn name(&self) -> Option<&str> {
		self.get("Name")
	}

	/// Case-insensitive header lookup; returns the value as declared.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(k, _)| k.eq_ignore_ascii_case(key))
			.map(|(_, v)| v.as_str())
	}

	/// Sets a header, replacing a case-insensitive match in place or
	/// appending a new one.
	pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
		if key.is_empty() || key.len() > 68 || key.contains(':') || key.contains(['\r', '\n']) {
			return Err(JarError::BadKey { key: key.to_owned() });
		}
		match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
			Some((_, v)) => *v = value.to_owned(),
			None => {
				self.headers.insert(key.to_owned(), value.to_owned());
			},
		}
		Ok(())
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	pub fn len(&self) -> usize {
		self.headers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.headers.is_empty()
	}

	/// Header keys ending in `suffix`, returned with the suffix cut off.
	///
	/// Used to find the digest algorithms present, e.g. `keys_with_suffix("-Digest")`
	/// yields `"SHA-256"` for a `SHA-256-Digest` header.
	pub fn keys_with_suffix<'a>(&'a self, suffix: &'a str) -> impl Iterator<Item = &'a str> {
		self.headers
			.keys()
			.filter_map(move |k| k.strip_suffix(suffix))
			.filter(|prefix| !prefix.is_empty())
	}

	/// This section's bytes as they appear in an emitted manifest, including
	/// the blank line terminating the section. Digests are computed over
	/// exactly these bytes.
	pub fn to_bytes(&self) -> Vec<u8> {
		let mut out = Vec::new();
		for (key, value) in &self.headers {
			write_header(&mut out, key, value);
		}
		out.extend_from_slice(LINE_SEPARATOR);
		out
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
	pub main: ManifestSection,
	/// Non-main sections, keyed by their `Name:` header, in declaration order.
	pub sections: IndexMap<String, ManifestSection>,
}

impl Default for Manifest {
	fn default() -> Manifest {
		Manifest::new()
	}
}

impl Manifest {
	/// An empty manifest with the conventional `Manifest-Version` header.
	pub fn new() -> Manifest {
		let mut main = ManifestSection::new();
		main.set("Manifest-Version", "1.0").expect("a valid key");
		Manifest { main, sections: IndexMap::new() }
	}

	/// Returns the named section, creating it at the end if absent.
	pub fn create_section(&mut self, name: &str) -> &mut ManifestSection {
		self.sections
			.entry(name.to_owned())
			.or_insert_with(|| ManifestSection::named(name))
	}

	pub fn parse(data: &[u8]) -> Result<Manifest> {
		let mut sections: Vec<(usize, ManifestSection)> = Vec::new();
		let mut current: Option<(usize, ManifestSection)> = None;

		for (lineno, raw_line) in split_lines(data).enumerate() {
			// NUL bytes have been observed in the wild and are dropped
			let line: Vec<u8> = raw_line.iter().copied().filter(|&b| b != 0).collect();

			if line.is_empty() {
				if let Some(section) = current.take() {
					sections.push(section);
				}
			} else if line[0] == b' ' {
				let (_, section) = current
					.as_mut()
					.ok_or(JarError::Malformed { line: lineno, message: "bad line continuation" })?;
				let last = section.headers.len().checked_sub(1)
					.ok_or(JarError::Malformed { line: lineno, message: "bad line continuation" })?;
				let (_, value) = section.headers.get_index_mut(last).expect("index is in range");
				value.push_str(&latin1(&line[1..]));
			} else {
				let text = latin1(&line);
				let (key, value) = text
					.split_once(':')
					.ok_or(JarError::Malformed { line: lineno, message: "header line without a colon" })?;
				let value = value.strip_prefix(' ').unwrap_or(value);

				let (_, section) = current.get_or_insert_with(|| (lineno, ManifestSection::new()));
				// headers may legitimately repeat only across sections; a
				// duplicate inside one section keeps the last declaration
				section.headers.insert(key.to_owned(), value.to_owned());
			}
		}
		if let Some(section) = current.take() {
			sections.push(section);
		}

		let mut iter = sections.into_iter();
		let main = match iter.next() {
			Some((_, section)) => section,
			None => ManifestSection::new(),
		};

		let mut manifest = Manifest { main, sections: IndexMap::new() };
		for (lineno, section) in iter {
			let name = section
				.name()
				.ok_or(JarError::Malformed { line: lineno, message: "section without a Name header" })?
				.to_owned();
			manifest.sections.insert(name, section);
		}

		Ok(manifest)
	}

	/// Emits the whole manifest with CRLF line endings and wrapped headers.
	pub fn to_bytes(&self) -> Vec<u8> {
		let mut out = self.main.to_bytes();
		for section in self.sections.values() {
			out.extend_from_slice(&section.to_bytes());
		}
		out
	}

	/// The main section's bytes, used for the `-Digest-Manifest-Main-Attributes`
	/// checksum of a signature file.
	pub fn main_section_bytes(&self) -> Vec<u8> {
		self.main.to_bytes()
	}
}

/// Splits on LF or CRLF without yielding a trailing empty line.
fn split_lines(data: &[u8]) -> impl Iterator<Item = &[u8]> {
	data.split(|&b| b == b'\n').map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

// Header bytes outside ASCII decode as Latin-1 so that parse cannot fail on
// legacy tool output; emitted manifests are plain ASCII anyway.
fn latin1(bytes: &[u8]) -> String {
	bytes.iter().map(|&b| b as char).collect()
}

/// Writes `key: value` with the jar wrap rule: at most 70 content bytes on
/// the first line, then continuation lines of a space plus at most 69 bytes,
/// every line terminated by CRLF.
fn write_header(out: &mut Vec<u8>, key: &str, value: &str) {
	let mut line = Vec::with_capacity(key.len() + 2 + value.len());
	line.extend_from_slice(key.as_bytes());
	line.extend_from_slice(b": ");
	line.extend_from_slice(value.as_bytes());

	if line.len() <= 70 {
		out.extend_from_slice(&line);
		out.extend_from_slice(LINE_SEPARATOR);
		return;
	}

	out.extend_from_slice(&line[..70]);
	out.extend_from_slice(LINE_SEPARATOR);
	for chunk in line[70..].chunks(69) {
		out.push(b' ');
		out.extend_from_slice(chunk);
		out.extend_from_slice(LINE_SEPARATOR);
	}
}
