//! Decoding whole class files.

use crate::attributes::{self, Attribute, AttributeInfo, Code, ConstValue};
use crate::cancel::CancelToken;
use crate::error::{DecodeError, Result};
use crate::flags::{ClassAccess, FieldAccess, MethodAccess};
use crate::pool::ConstantPool;
use crate::reader::ByteReader;
use crate::version::Version;

const MAGIC: u32 = 0xcafe_babe;

/// A decoded class file. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
	pub version: Version,
	pub pool: ConstantPool,
	pub access: ClassAccess,
	pub this_class: String,
	/// Absent only for `java/lang/Object`.
	pub super_class: Option<String>,
	pub interfaces: Vec<String>,
	pub fields: Vec<Field>,
	pub methods: Vec<Method>,
	pub attributes: Vec<AttributeInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
	pub access: FieldAccess,
	pub name: String,
	pub descriptor: String,
	pub attributes: Vec<AttributeInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
	pub access: MethodAccess,
	pub name: String,
	pub descriptor: String,
	pub attributes: Vec<AttributeInfo>,
}

impl ClassFile {
	pub fn parse(bytes: &[u8]) -> Result<ClassFile> {
		ClassFile::parse_with(bytes, &CancelToken::new())
	}

	/// Parses a class file, checking the cancel token once up front.
	pub fn parse_with(bytes: &[u8], cancel: &CancelToken) -> Result<ClassFile> {
		cancel.check()?;

		let mut reader = ByteReader::new(bytes);

		let magic = reader.read_u32()?;
		if magic != MAGIC {
			return Err(DecodeError::BadMagic { found: magic });
		}

		let minor = reader.read_u16()?;
		let major = reader.read_u16()?;
		let version = Version::new(major, minor);

		let pool = ConstantPool::parse(&mut reader)?;

		let access = ClassAccess::from(reader.read_u16()?);
		let this_class = pool.as_class_name(reader.read_u16()?)?.to_owned();
		let super_class = pool.as_optional_class_name(reader.read_u16()?)?.map(str::to_owned);
		let interfaces = reader.read_vec(
			|r| r.read_u16_as_usize(),
			|r| Ok(pool.as_class_name(r.read_u16()?)?.to_owned()),
		)?;

		let fields = reader.read_vec(
			|r| r.read_u16_as_usize(),
			|r| {
				Ok(Field {
					access: FieldAccess::from(r.read_u16()?),
					name: pool.as_utf8(r.read_u16()?)?.to_owned(),
					descriptor: pool.as_utf8(r.read_u16()?)?.to_owned(),
					attributes: attributes::read_attributes(r, &pool)?,
				})
			},
		)?;

		let methods = reader.read_vec(
			|r| r.read_u16_as_usize(),
			|r| {
				Ok(Method {
					access: MethodAccess::from(r.read_u16()?),
					name: pool.as_utf8(r.read_u16()?)?.to_owned(),
					descriptor: pool.as_utf8(r.read_u16()?)?.to_owned(),
					attributes: attributes::read_attributes(r, &pool)?,
				})
			},
		)?;

		let attributes = attributes::read_attributes(&mut reader, &pool)?;

		Ok(ClassFile {
			version,
			pool,
			access,
			this_class,
			super_class,
			interfaces,
			fields,
			methods,
			attributes,
		})
	}

	pub fn source_file(&self) -> Option<&str> {
		match attributes::find(&self.attributes, "SourceFile")? {
			Attribute::SourceFile(name) => Some(name),
			_ => None,
		}
	}

	pub fn signature(&self) -> Option<&str> {
		signature_of(&self.attributes)
	}

	pub fn is_deprecated(&self) -> bool {
		attributes::find(&self.attributes, "Deprecated").is_some()
	}

	pub fn field(&self, name: &str) -> Option<&Field> {
		self.fields.iter().find(|f| f.name == name)
	}

	pub fn method(&self, name: &str, descriptor: &str) -> Option<&Method> {
		self.methods
			.iter()
			.find(|m| m.name == name && m.descriptor == descriptor)
	}
}

impl Field {
	pub fn constant_value(&self) -> Option<&ConstValue> {
		match attributes::find(&self.attributes, "ConstantValue")? {
			Attribute::ConstantValue(value) => Some(value),
			_ => None,
		}
	}

	pub fn signature(&self) -> Option<&str> {
		signature_of(&self.attributes)
	}

	pub fn is_deprecated(&self) -> bool {
		attributes::find(&self.attributes, "Deprecated").is_some()
	}
}

impl Method {
	pub fn code(&self) -> Option<&Code> {
		match attributes::find(&self.attributes, "Code")? {
			Attribute::Code(code) => Some(code),
			_ => None,
		}
	}

	pub fn exceptions(&self) -> &[String] {
		match attributes::find(&self.attributes, "Exceptions") {
			Some(Attribute::Exceptions(classes)) => classes,
			_ => &[],
		}
	}

	pub fn signature(&self) -> Option<&str> {
		signature_of(&self.attributes)
	}

	pub fn is_deprecated(&self) -> bool {
		attributes::find(&self.attributes, "Deprecated").is_some()
	}
}

fn signature_of(attributes: &[AttributeInfo]) -> Option<&str> {
	match attributes::find(attributes, "Signature")? {
		Attribute::Signature(signature) => Some(signature),
		_ => None,
	}
}
