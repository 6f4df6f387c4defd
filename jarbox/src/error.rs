use thiserror::Error;

/// Result type for jar and manifest operations.
pub type Result<T> = std::result::Result<T, JarError>;

#[derive(Error, Debug)]
pub enum JarError {
	#[error("malformed manifest at line {line}: {message}")]
	Malformed { line: usize, message: &'static str },

	#[error("bad manifest key {key:?}")]
	BadKey { key: String },

	#[error("unsupported digest algorithm {name}")]
	UnsupportedDigest { name: String },

	#[error("crypto backend is not available")]
	CryptoDisabled,

	#[error("crypto backend error: {message}")]
	Crypto { message: String },

	#[error("zip error: {0}")]
	Zip(#[from] zip::result::ZipError),

	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}
