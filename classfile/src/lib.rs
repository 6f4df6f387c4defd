//! A decoder for the [Java Virtual Machine class file format](https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html).
//!
//! The decoder is strict about structure (constant pool cross-references are
//! validated eagerly, bytecode is walked instruction by instruction) but
//! lenient about content it does not know: unrecognized attributes are
//! preserved verbatim and newer class file versions parse fine.
//!
//! Decoded classes are immutable and can be shared freely across threads.

pub mod attributes;
pub mod cancel;
pub mod class;
pub mod deps;
pub mod flags;
pub mod insn;
pub mod jstring;
pub mod pool;
pub mod reader;
pub mod version;

mod error;

pub use cancel::CancelToken;
pub use class::{ClassFile, Field, Method};
pub use error::{DecodeError, Result};
pub use pool::{ConstantPool, Entry};
pub use version::Version;
