use thiserror::Error;

/// Result type for class file decoding.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Everything that can go wrong while decoding a class file.
///
/// Offsets are absolute byte offsets into the input slice; constant pool
/// problems carry the pool index instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
	#[error("unexpected end of data at offset {offset}")]
	Truncated { offset: usize },

	#[error("wrong magic: got {found:#010x}, expected 0xCAFEBABE")]
	BadMagic { found: u32 },

	#[error("constant pool index {index} does not refer to a {expected} entry")]
	BadConstantRef { index: u16, expected: &'static str },

	#[error("constant pool entry {index} is a {found}, not a {expected}")]
	WrongTag { index: u16, expected: &'static str, found: &'static str },

	#[error("invalid modified utf-8 in constant pool entry {index}")]
	BadUtf8 { index: u16 },

	#[error("unknown opcode {opcode:#04x} at code offset {offset}")]
	UnknownOpcode { opcode: u8, offset: usize },

	#[error("malformed code at offset {offset}: {reason}")]
	MalformedCode { offset: usize, reason: &'static str },

	#[error("attribute {name} declared {declared} bytes but {consumed} were consumed")]
	AttributeLengthMismatch { name: String, declared: u32, consumed: u32 },

	#[error("operation cancelled")]
	Cancelled,
}
