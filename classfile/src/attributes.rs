//! Attribute decoding, dispatched on the attribute's name.
//!
//! Attributes this module does not recognize are preserved verbatim as
//! [`Attribute::Unknown`], so a decoded class loses no information. An
//! attribute whose declared length disagrees with the bytes its decoder
//! consumed is not fatal: the payload is kept raw, the mismatch is recorded
//! on the node, and decoding continues after the declared length.

use std::fmt;

use crate::error::{DecodeError, Result};
use crate::flags::ClassAccess;
use crate::insn::{self, Insn};
use crate::pool::{ConstantPool, Entry};
use crate::reader::ByteReader;

/// One decoded attribute, with its original name.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
	pub name: String,
	pub attr: Attribute,
	/// Present when the declared length did not match the decoded payload.
	pub length_mismatch: Option<LengthMismatch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthMismatch {
	pub declared: u32,
	pub consumed: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
	Code(Code),
	ConstantValue(ConstValue),
	Exceptions(Vec<String>),
	InnerClasses(Vec<InnerClass>),
	EnclosingMethod(EnclosingMethod),
	Synthetic,
	Signature(String),
	SourceFile(String),
	LineNumberTable(Vec<LineNumber>),
	LocalVariableTable(Vec<LocalVariable>),
	LocalVariableTypeTable(Vec<LocalVariable>),
	Deprecated,
	RuntimeVisibleAnnotations(Vec<Annotation>),
	RuntimeInvisibleAnnotations(Vec<Annotation>),
	RuntimeVisibleParameterAnnotations(Vec<Vec<Annotation>>),
	RuntimeInvisibleParameterAnnotations(Vec<Vec<Annotation>>),
	AnnotationDefault(ElementValue),
	BootstrapMethods(Vec<BootstrapMethod>),
	/// Retained as raw bytes; the differ compares them bytewise.
	StackMapTable(Vec<u8>),
	MethodParameters(Vec<MethodParameter>),
	NestHost(String),
	NestMembers(Vec<String>),
	Unknown { bytes: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Code {
	pub max_stack: u16,
	pub max_locals: u16,
	/// The raw bytecode, exactly as stored.
	pub code: Vec<u8>,
	pub instructions: Vec<Insn>,
	pub exception_table: Vec<ExceptionHandler>,
	pub attributes: Vec<AttributeInfo>,
}

impl Code {
	pub fn line_number_table(&self) -> Option<&[LineNumber]> {
		match find(&self.attributes, "LineNumberTable")? {
			Attribute::LineNumberTable(lines) => Some(lines),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionHandler {
	pub start_pc: u16,
	pub end_pc: u16,
	pub handler_pc: u16,
	/// `None` is the catch-all used by `finally`.
	pub catch_type: Option<String>,
}

/// A field's `ConstantValue`, resolved through the pool.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
	Integer(i32),
	Float(f32),
	Long(i64),
	Double(f64),
	String(String),
}

impl fmt::Display for ConstValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConstValue::Integer(v) => write!(f, "{v}"),
			ConstValue::Float(v) => write!(f, "{v}f"),
			ConstValue::Long(v) => write!(f, "{v}L"),
			ConstValue::Double(v) => write!(f, "{v}d"),
			ConstValue::String(v) => write!(f, "{v:?}"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClass {
	pub inner_class: String,
	pub outer_class: Option<String>,
	pub inner_name: Option<String>,
	pub access: ClassAccess,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnclosingMethod {
	pub class: String,
	pub method: Option<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumber {
	pub start_pc: u16,
	pub line: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariable {
	pub start_pc: u16,
	pub length: u16,
	pub name: String,
	pub descriptor: String,
	pub index: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParameter {
	pub name: Option<String>,
	pub access: u16,
}

/// A bootstrap method with its handle and arguments in symbolic form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapMethod {
	pub handle: String,
	pub arguments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
	/// The annotation type as a field descriptor, like `Ljava/lang/Deprecated;`.
	pub type_descriptor: String,
	pub elements: Vec<(String, ElementValue)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
	Const(ConstValue),
	Enum { type_descriptor: String, const_name: String },
	ClassInfo(String),
	Annotation(Box<Annotation>),
	Array(Vec<ElementValue>),
}

/// Finds the first attribute with the given name.
pub fn find<'a>(attributes: &'a [AttributeInfo], name: &str) -> Option<&'a Attribute> {
	attributes.iter().find(|a| a.name == name).map(|a| &a.attr)
}

/// Reads an `attributes_count`-prefixed attribute table.
pub fn read_attributes(reader: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<Vec<AttributeInfo>> {
	reader.read_vec(|r| r.read_u16_as_usize(), |r| read_attribute(r, pool))
}

fn read_attribute(reader: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<AttributeInfo> {
	let name = pool.as_utf8(reader.read_u16()?)?.to_owned();
	let declared = reader.read_u32()?;
	let base = reader.tell();
	let raw = reader.bytes(declared as usize)?;

	let mut child = ByteReader::with_base(raw, base);
	match decode_payload(&name, &mut child, pool) {
		Ok(attr) => {
			let consumed = child.pos() as u32;
			let length_mismatch = (consumed != declared).then(|| {
				log::warn!("attribute {name} declared {declared} bytes, consumed {consumed}");
				LengthMismatch { declared, consumed }
			});
			Ok(AttributeInfo { name, attr, length_mismatch })
		},
		// a payload shorter than its decoder wants is recoverable: keep the
		// raw bytes and continue after the declared length
		Err(DecodeError::Truncated { .. }) => {
			let consumed = child.pos() as u32;
			log::warn!("attribute {name} declared {declared} bytes but is truncated");
			Ok(AttributeInfo {
				name,
				attr: Attribute::Unknown { bytes: raw.to_vec() },
				length_mismatch: Some(LengthMismatch { declared, consumed }),
			})
		},
		Err(fatal) => Err(fatal),
	}
}

fn decode_payload(name: &str, r: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<Attribute> {
	Ok(match name {
		"Code" => Attribute::Code(read_code(r, pool)?),
		"ConstantValue" => {
			let index = r.read_u16()?;
			Attribute::ConstantValue(read_const_value(pool, index)?)
		},
		"Exceptions" => Attribute::Exceptions(r.read_vec(
			|r| r.read_u16_as_usize(),
			|r| Ok(pool.as_class_name(r.read_u16()?)?.to_owned()),
		)?),
		"InnerClasses" => Attribute::InnerClasses(r.read_vec(
			|r| r.read_u16_as_usize(),
			|r| {
				Ok(InnerClass {
					inner_class: pool.as_class_name(r.read_u16()?)?.to_owned(),
					outer_class: pool.as_optional_class_name(r.read_u16()?)?.map(str::to_owned),
					inner_name: optional_utf8(pool, r.read_u16()?)?,
					access: ClassAccess::from(r.read_u16()?),
				})
			},
		)?),
		"EnclosingMethod" => {
			let class = pool.as_class_name(r.read_u16()?)?.to_owned();
			let method_index = r.read_u16()?;
			let method = if method_index == 0 {
				None
			} else {
				let (name, descriptor) = pool.as_name_and_type(method_index)?;
				Some((name.to_owned(), descriptor.to_owned()))
			};
			Attribute::EnclosingMethod(EnclosingMethod { class, method })
		},
		"Synthetic" => Attribute::Synthetic,
		"Signature" => Attribute::Signature(pool.as_utf8(r.read_u16()?)?.to_owned()),
		"SourceFile" => Attribute::SourceFile(pool.as_utf8(r.read_u16()?)?.to_owned()),
		"LineNumberTable" => Attribute::LineNumberTable(r.read_vec(
			|r| r.read_u16_as_usize(),
			|r| {
				Ok(LineNumber {
					start_pc: r.read_u16()?,
					line: r.read_u16()?,
				})
			},
		)?),
		"LocalVariableTable" => Attribute::LocalVariableTable(read_local_variables(r, pool)?),
		"LocalVariableTypeTable" => Attribute::LocalVariableTypeTable(read_local_variables(r, pool)?),
		"Deprecated" => Attribute::Deprecated,
		"RuntimeVisibleAnnotations" => {
			Attribute::RuntimeVisibleAnnotations(read_annotations(r, pool)?)
		},
		"RuntimeInvisibleAnnotations" => {
			Attribute::RuntimeInvisibleAnnotations(read_annotations(r, pool)?)
		},
		"RuntimeVisibleParameterAnnotations" => {
			Attribute::RuntimeVisibleParameterAnnotations(read_parameter_annotations(r, pool)?)
		},
		"RuntimeInvisibleParameterAnnotations" => {
			Attribute::RuntimeInvisibleParameterAnnotations(read_parameter_annotations(r, pool)?)
		},
		"AnnotationDefault" => Attribute::AnnotationDefault(read_element_value(r, pool)?),
		"BootstrapMethods" => Attribute::BootstrapMethods(r.read_vec(
			|r| r.read_u16_as_usize(),
			|r| {
				Ok(BootstrapMethod {
					handle: pool.symbolic(r.read_u16()?)?,
					arguments: r.read_vec(
						|r| r.read_u16_as_usize(),
						|r| pool.symbolic(r.read_u16()?),
					)?,
				})
			},
		)?),
		"StackMapTable" => Attribute::StackMapTable(r.bytes(r.remaining())?.to_vec()),
		"MethodParameters" => Attribute::MethodParameters(r.read_vec(
			|r| Ok(r.read_u8()? as usize),
			|r| {
				Ok(MethodParameter {
					name: optional_utf8(pool, r.read_u16()?)?,
					access: r.read_u16()?,
				})
			},
		)?),
		"NestHost" => Attribute::NestHost(pool.as_class_name(r.read_u16()?)?.to_owned()),
		"NestMembers" => Attribute::NestMembers(r.read_vec(
			|r| r.read_u16_as_usize(),
			|r| Ok(pool.as_class_name(r.read_u16()?)?.to_owned()),
		)?),
		_ => Attribute::Unknown { bytes: r.bytes(r.remaining())?.to_vec() },
	})
}

fn read_code(r: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<Code> {
	let max_stack = r.read_u16()?;
	let max_locals = r.read_u16()?;

	let code_length = r.read_u32()? as usize;
	let code_base = r.tell();
	let code = r.bytes(code_length)?;
	let instructions = insn::decode(code, code_base)?;

	let exception_table = r.read_vec(
		|r| r.read_u16_as_usize(),
		|r| {
			Ok(ExceptionHandler {
				start_pc: r.read_u16()?,
				end_pc: r.read_u16()?,
				handler_pc: r.read_u16()?,
				catch_type: pool.as_optional_class_name(r.read_u16()?)?.map(str::to_owned),
			})
		},
	)?;

	let attributes = read_attributes(r, pool)?;

	Ok(Code {
		max_stack,
		max_locals,
		code: code.to_vec(),
		instructions,
		exception_table,
		attributes,
	})
}

fn read_const_value(pool: &ConstantPool, index: u16) -> Result<ConstValue> {
	Ok(match pool.get(index)? {
		Entry::Integer(v) => ConstValue::Integer(*v),
		Entry::Float(v) => ConstValue::Float(*v),
		Entry::Long(v) => ConstValue::Long(*v),
		Entry::Double(v) => ConstValue::Double(*v),
		Entry::String { utf8 } => ConstValue::String(pool.as_utf8(*utf8)?.to_owned()),
		other => {
			return Err(DecodeError::WrongTag {
				index,
				expected: "loadable constant",
				found: other.tag_name(),
			})
		},
	})
}

fn read_local_variables(r: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<Vec<LocalVariable>> {
	r.read_vec(
		|r| r.read_u16_as_usize(),
		|r| {
			Ok(LocalVariable {
				start_pc: r.read_u16()?,
				length: r.read_u16()?,
				name: pool.as_utf8(r.read_u16()?)?.to_owned(),
				descriptor: pool.as_utf8(r.read_u16()?)?.to_owned(),
				index: r.read_u16()?,
			})
		},
	)
}

fn read_annotations(r: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<Vec<Annotation>> {
	r.read_vec(|r| r.read_u16_as_usize(), |r| read_annotation(r, pool))
}

fn read_parameter_annotations(r: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<Vec<Vec<Annotation>>> {
	r.read_vec(|r| Ok(r.read_u8()? as usize), |r| read_annotations(r, pool))
}

fn read_annotation(r: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<Annotation> {
	let type_descriptor = pool.as_utf8(r.read_u16()?)?.to_owned();
	let elements = r.read_vec(
		|r| r.read_u16_as_usize(),
		|r| {
			let name = pool.as_utf8(r.read_u16()?)?.to_owned();
			let value = read_element_value(r, pool)?;
			Ok((name, value))
		},
	)?;
	Ok(Annotation { type_descriptor, elements })
}

fn read_element_value(r: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<ElementValue> {
	let tag = r.read_u8()?;
	Ok(match tag {
		b'B' | b'C' | b'I' | b'S' | b'Z' | b'D' | b'F' | b'J' => {
			ElementValue::Const(read_const_value(pool, r.read_u16()?)?)
		},
		b's' => {
			let index = r.read_u16()?;
			ElementValue::Const(ConstValue::String(pool.as_utf8(index)?.to_owned()))
		},
		b'e' => ElementValue::Enum {
			type_descriptor: pool.as_utf8(r.read_u16()?)?.to_owned(),
			const_name: pool.as_utf8(r.read_u16()?)?.to_owned(),
		},
		b'c' => ElementValue::ClassInfo(pool.as_utf8(r.read_u16()?)?.to_owned()),
		b'@' => ElementValue::Annotation(Box::new(read_annotation(r, pool)?)),
		b'[' => ElementValue::Array(r.read_vec(
			|r| r.read_u16_as_usize(),
			|r| read_element_value(r, pool),
		)?),
		_ => {
			return Err(DecodeError::MalformedCode {
				offset: r.tell() - 1,
				reason: "unknown element value tag",
			})
		},
	})
}

fn optional_utf8(pool: &ConstantPool, index: u16) -> Result<Option<String>> {
	if index == 0 {
		Ok(None)
	} else {
		Ok(Some(pool.as_utf8(index)?.to_owned()))
	}
}
