//! Per-entry digests: the `<Algorithm>-Digest` headers of a jar manifest.
//!
//! Algorithm names are the Java ones (`MD5`, `SHA1`, `SHA-256`, ...), values
//! are base64. Verification follows the jar tool's rule: an entry passes if
//! at least one of its declared digests matches; in strict mode an entry
//! with no digests at all is a failure.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::{JarError, Result};
use crate::jar::OpenedJar;
use crate::manifest::Manifest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
	Md5,
	Sha1,
	Sha256,
	Sha384,
	Sha512,
}

impl DigestAlgorithm {
	/// Looks an algorithm up by its Java name. `SHA1` is accepted next to
	/// the documented `SHA-1` because that is what jarsigner writes.
	pub fn from_java_name(name: &str) -> Result<DigestAlgorithm> {
		Ok(match name {
			"MD5" => DigestAlgorithm::Md5,
			"SHA1" | "SHA-1" => DigestAlgorithm::Sha1,
			"SHA-256" => DigestAlgorithm::Sha256,
			"SHA-384" => DigestAlgorithm::Sha384,
			"SHA-512" => DigestAlgorithm::Sha512,
			_ => return Err(JarError::UnsupportedDigest { name: name.to_owned() }),
		})
	}

	pub fn java_name(&self) -> &'static str {
		match self {
			DigestAlgorithm::Md5 => "MD5",
			DigestAlgorithm::Sha1 => "SHA1",
			DigestAlgorithm::Sha256 => "SHA-256",
			DigestAlgorithm::Sha384 => "SHA-384",
			DigestAlgorithm::Sha512 => "SHA-512",
		}
	}

	pub fn digest(&self, data: &[u8]) -> Vec<u8> {
		match self {
			DigestAlgorithm::Md5 => Md5::digest(data).to_vec(),
			DigestAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
			DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
			DigestAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
			DigestAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
		}
	}

	/// The digest in the base64 form manifests carry.
	pub fn base64_digest(&self, data: &[u8]) -> String {
		BASE64.encode(self.digest(data))
	}
}

/// Whether a jar entry is exempt from digest coverage: the manifest itself,
/// the signature envelope, and directories.
pub fn skips_verification(name: &str) -> bool {
	if name.ends_with('/') {
		return true;
	}
	if name == "META-INF/MANIFEST.MF" {
		return true;
	}
	match name.strip_prefix("META-INF/") {
		Some(rest) => {
			rest.ends_with(".SF")
				|| rest.ends_with(".RSA")
				|| rest.ends_with(".DSA")
				|| rest.ends_with(".EC")
				|| rest.starts_with("SIG-")
		},
		None => false,
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestVerification {
	pub failures: Vec<DigestFailure>,
}

impl DigestVerification {
	pub fn is_ok(&self) -> bool {
		self.failures.is_empty()
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestFailure {
	/// The jar entry that failed.
	pub entry: String,
	pub reason: DigestFailureReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestFailureReason {
	/// None of the declared digests matched the entry's bytes.
	Mismatch { algorithms: Vec<String> },
	/// The entry has no digest headers at all (strict mode only).
	MissingDigest,
}

/// Adds a manifest section with an `<Algorithm>-Digest` header for every
/// entry of the jar that is subject to verification.
pub fn add_jar_entries(manifest: &mut Manifest, jar: &mut OpenedJar<'_>, algorithm: DigestAlgorithm) -> Result<()> {
	let key = format!("{}-Digest", algorithm.java_name());
	for name in jar.entry_names() {
		if skips_verification(&name) {
			continue;
		}
		let data = jar
			.read(&name)?
			.expect("entry names came from this jar");
		let digest = algorithm.base64_digest(&data);
		manifest.create_section(&name).set(&key, &digest)?;
	}
	Ok(())
}

/// Verifies the manifest's per-entry digests against the jar's content.
pub fn verify_jar_digests(manifest: &Manifest, jar: &mut OpenedJar<'_>, strict: bool) -> Result<DigestVerification> {
	let mut failures = Vec::new();

	for name in jar.entry_names() {
		if skips_verification(&name) {
			continue;
		}

		let section = manifest.sections.get(&name);
		let algorithms: Vec<String> = section
			.map(|s| s.keys_with_suffix("-Digest").map(str::to_owned).collect())
			.unwrap_or_default();

		if algorithms.is_empty() {
			if strict {
				failures.push(DigestFailure {
					entry: name,
					reason: DigestFailureReason::MissingDigest,
				});
			}
			continue;
		}

		let section = section.expect("algorithms came from this section");
		let data = jar
			.read(&name)?
			.expect("entry names came from this jar");

		let matched = algorithms.iter().any(|java_name| {
			let Ok(algorithm) = DigestAlgorithm::from_java_name(java_name) else {
				return false;
			};
			let declared = section.get(&format!("{java_name}-Digest"));
			declared == Some(algorithm.base64_digest(&data).as_str())
		});

		if !matched {
			log::debug!("digest mismatch for {name}");
			failures.push(DigestFailure {
				entry: name,
				reason: DigestFailureReason::Mismatch { algorithms },
			});
		}
	}

	Ok(DigestVerification { failures })
}
