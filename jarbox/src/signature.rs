//! Signed-jar support: `.SF` signature files and their PKCS#7 blocks.
//!
//! A signature file mirrors the manifest: its main section digests the whole
//! manifest and the manifest's main attributes, and each named section
//! digests the matching manifest section. The signature block (`.RSA`,
//! `.DSA`, `.EC`) is a PKCS#7 detached signature over the signature file's
//! bytes.
//!
//! The cryptographic half lives behind [`CryptoBackend`]. When the `crypto`
//! cargo feature is off, [`default_backend`] hands out a backend whose two
//! operations fail with [`JarError::CryptoDisabled`]; every digest-only
//! operation keeps working.

use crate::digest::DigestAlgorithm;
use crate::error::{JarError, Result};
use crate::jar::OpenedJar;
use crate::manifest::{Manifest, ManifestSection};

/// The result of verifying a signature. Legitimately invalid signatures are
/// a value, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureOutcome {
	Valid,
	Invalid { reason: String },
}

impl SignatureOutcome {
	pub fn is_valid(&self) -> bool {
		matches!(self, SignatureOutcome::Valid)
	}

	fn invalid(reason: impl Into<String>) -> SignatureOutcome {
		SignatureOutcome::Invalid { reason: reason.into() }
	}
}

/// A `KEY.SF` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureFile {
	pub manifest: Manifest,
}

impl SignatureFile {
	/// Builds a signature file digesting the given manifest.
	pub fn create(manifest: &Manifest, algorithm: DigestAlgorithm) -> SignatureFile {
		let mut main = ManifestSection::new();
		main.set("Signature-Version", "1.0").expect("a valid key");

		let java_name = algorithm.java_name();
		let main_key = format!("{java_name}-Digest-Manifest-Main-Attributes");
		let all_key = format!("{java_name}-Digest-Manifest");
		let section_key = format!("{java_name}-Digest");

		main.set(&main_key, &algorithm.base64_digest(&manifest.main_section_bytes()))
			.expect("a valid key");
		main.set(&all_key, &algorithm.base64_digest(&manifest.to_bytes()))
			.expect("a valid key");

		let mut out = Manifest { main, sections: Default::default() };
		for (name, section) in &manifest.sections {
			let digest = algorithm.base64_digest(&section.to_bytes());
			out.create_section(name)
				.set(&section_key, &digest)
				.expect("a valid key");
		}

		SignatureFile { manifest: out }
	}

	pub fn parse(data: &[u8]) -> Result<SignatureFile> {
		Ok(SignatureFile { manifest: Manifest::parse(data)? })
	}

	pub fn to_bytes(&self) -> Vec<u8> {
		self.manifest.to_bytes()
	}

	/// Verifies this signature file against a manifest.
	///
	/// Returns the manifest sections that failed; an empty list means the
	/// manifest verifies. Follows the jar specification's ladder: if the
	/// whole-manifest digest matches, done; otherwise the main-attributes
	/// digest must match and every per-section digest is checked. The
	/// special entry `META-INF/MANIFEST.MF` in the failure list means the
	/// main attributes themselves failed.
	pub fn verify_manifest(&self, manifest: &Manifest) -> Result<Vec<String>> {
		if self.verify_whole_manifest_digest(manifest)? {
			return Ok(Vec::new());
		}
		if !self.verify_main_attributes_digest(manifest)? {
			return Ok(vec!["META-INF/MANIFEST.MF".to_owned()]);
		}
		self.verify_section_digests(manifest)
	}

	fn verify_whole_manifest_digest(&self, manifest: &Manifest) -> Result<bool> {
		let data = manifest.to_bytes();
		for java_name in self.manifest.main.keys_with_suffix("-Digest-Manifest") {
			let key = format!("{java_name}-Digest-Manifest");
			let declared = self.manifest.main.get(&key).expect("key came from this section");
			let algorithm = DigestAlgorithm::from_java_name(java_name)?;
			if declared == algorithm.base64_digest(&data) {
				return Ok(true);
			}
		}
		Ok(false)
	}

	fn verify_main_attributes_digest(&self, manifest: &Manifest) -> Result<bool> {
		let data = manifest.main_section_bytes();
		for java_name in self.manifest.main.keys_with_suffix("-Digest-Manifest-Main-Attributes") {
			let key = format!("{java_name}-Digest-Manifest-Main-Attributes");
			let declared = self.manifest.main.get(&key).expect("key came from this section");
			let algorithm = DigestAlgorithm::from_java_name(java_name)?;
			if declared == algorithm.base64_digest(&data) {
				return Ok(true);
			}
		}
		Ok(false)
	}

	fn verify_section_digests(&self, manifest: &Manifest) -> Result<Vec<String>> {
		let mut failures = Vec::new();

		for (name, section) in &manifest.sections {
			let Some(sf_section) = self.manifest.sections.get(name) else {
				failures.push(name.clone());
				continue;
			};

			let data = section.to_bytes();
			let mut matched = false;
			for java_name in sf_section.keys_with_suffix("-Digest") {
				let declared = sf_section
					.get(&format!("{java_name}-Digest"))
					.expect("key came from this section");
				let algorithm = DigestAlgorithm::from_java_name(java_name)?;
				if declared == algorithm.base64_digest(&data) {
					matched = true;
					break;
				}
			}
			if !matched {
				failures.push(name.clone());
			}
		}

		Ok(failures)
	}
}

/// The optional cryptographic capability.
pub trait CryptoBackend {
	/// Produces a PKCS#7 detached signature block over `data`.
	///
	/// `certificate` and `private_key` are PEM; the result is DER, the
	/// content of a `.RSA`/`.DSA`/`.EC` entry as jarsigner would emit it.
	fn create_signature_block(&self, certificate: &[u8], private_key: &[u8], data: &[u8]) -> Result<Vec<u8>>;

	/// Verifies a PKCS#7 detached `signature` over `data`, trusting
	/// `certificate` (PEM).
	fn verify_signature_block(&self, certificate: &[u8], data: &[u8], signature: &[u8]) -> Result<SignatureOutcome>;
}

/// The backend used when the `crypto` feature is off.
pub struct DisabledCrypto;

impl CryptoBackend for DisabledCrypto {
	fn create_signature_block(&self, _certificate: &[u8], _private_key: &[u8], _data: &[u8]) -> Result<Vec<u8>> {
		Err(JarError::CryptoDisabled)
	}

	fn verify_signature_block(&self, _certificate: &[u8], _data: &[u8], _signature: &[u8]) -> Result<SignatureOutcome> {
		Err(JarError::CryptoDisabled)
	}
}

#[cfg(feature = "crypto")]
pub use openssl_backend::OpensslCrypto;

#[cfg(feature = "crypto")]
mod openssl_backend {
	use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
	use openssl::pkey::PKey;
	use openssl::stack::Stack;
	use openssl::x509::store::X509StoreBuilder;
	use openssl::x509::X509;

	use crate::error::{JarError, Result};
	use crate::signature::{CryptoBackend, SignatureOutcome};

	/// PKCS#7 signing and verification through OpenSSL.
	pub struct OpensslCrypto;

	fn crypto_error(e: impl std::fmt::Display) -> JarError {
		JarError::Crypto { message: e.to_string() }
	}

	impl CryptoBackend for OpensslCrypto {
		fn create_signature_block(&self, certificate: &[u8], private_key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
			let certificate = X509::from_pem(certificate).map_err(crypto_error)?;
			let private_key = PKey::private_key_from_pem(private_key).map_err(crypto_error)?;
			let extra_certs = Stack::new().map_err(crypto_error)?;

			let flags = Pkcs7Flags::BINARY | Pkcs7Flags::DETACHED | Pkcs7Flags::NOATTR;
			let pkcs7 = Pkcs7::sign(&certificate, &private_key, &extra_certs, data, flags)
				.map_err(crypto_error)?;
			pkcs7.to_der().map_err(crypto_error)
		}

		fn verify_signature_block(&self, certificate: &[u8], data: &[u8], signature: &[u8]) -> Result<SignatureOutcome> {
			let pkcs7 = match Pkcs7::from_der(signature) {
				Ok(pkcs7) => pkcs7,
				Err(e) => {
					return Ok(SignatureOutcome::Invalid {
						reason: format!("signature block is not PKCS#7: {e}"),
					})
				},
			};

			let trusted = X509::from_pem(certificate).map_err(crypto_error)?;
			let mut store = X509StoreBuilder::new().map_err(crypto_error)?;
			store.add_cert(trusted).map_err(crypto_error)?;
			let store = store.build();

			let certs = Stack::new().map_err(crypto_error)?;
			match pkcs7.verify(&certs, &store, Some(data), None, Pkcs7Flags::BINARY) {
				Ok(()) => Ok(SignatureOutcome::Valid),
				Err(e) => Ok(SignatureOutcome::Invalid {
					reason: format!("signature verification error: {e}"),
				}),
			}
		}
	}
}

/// The process-wide crypto backend: OpenSSL-backed when built with the
/// `crypto` feature, disabled otherwise.
pub fn default_backend() -> &'static dyn CryptoBackend {
	#[cfg(feature = "crypto")]
	{
		static BACKEND: OpensslCrypto = OpensslCrypto;
		&BACKEND
	}
	#[cfg(not(feature = "crypto"))]
	{
		static BACKEND: DisabledCrypto = DisabledCrypto;
		&BACKEND
	}
}

/// Verifies a signed jar end to end: signature block over the `.SF` file,
/// then the `.SF` digests against the manifest.
///
/// The per-entry digests of the manifest against the jar's content are a
/// separate concern, see [`verify_jar_digests`][crate::digest::verify_jar_digests].
pub fn verify_jar_signature(
	opened: &mut OpenedJar<'_>,
	trusted_certificate: &[u8],
	backend: &dyn CryptoBackend,
) -> Result<SignatureOutcome> {
	let Some(manifest) = opened.manifest()? else {
		return Ok(SignatureOutcome::invalid("jar has no manifest"));
	};

	let signature_files = opened.signature_files()?;
	if signature_files.is_empty() {
		return Ok(SignatureOutcome::invalid("jar has no signature file"));
	}

	for (sf_name, sf_data) in signature_files {
		let Some((_, block)) = opened.signature_block_for(&sf_name)? else {
			log::warn!("signature file {sf_name} has no matching signature block");
			return Ok(SignatureOutcome::invalid(format!("{sf_name} has no signature block")));
		};

		match backend.verify_signature_block(trusted_certificate, &sf_data, &block)? {
			SignatureOutcome::Valid => {},
			invalid => return Ok(invalid),
		}

		let signature_file = SignatureFile::parse(&sf_data)?;
		let failures = signature_file.verify_manifest(&manifest)?;
		if !failures.is_empty() {
			return Ok(SignatureOutcome::invalid(format!(
				"manifest sections failed signature file digests: {}",
				failures.join(", ")
			)));
		}
	}

	Ok(SignatureOutcome::Valid)
}
