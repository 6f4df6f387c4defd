//! The constant pool: an indexed table of typed literals and symbolic
//! references at the head of a class file.
//!
//! Indexing is 1-based; slot 0 and the slot following a `Long` or `Double`
//! entry are unusable. After parsing, a validation pass checks that every
//! index stored inside an entry refers to an entry of the tag the JVM
//! specification requires, so the typed accessors can assume a well-formed
//! pool.

use std::fmt::Write;

use crate::error::{DecodeError, Result};
use crate::jstring;
use crate::reader::ByteReader;

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
	Utf8(String),
	Integer(i32),
	Float(f32),
	Long(i64),
	Double(f64),
	Class { name: u16 },
	String { utf8: u16 },
	FieldRef { class: u16, name_and_type: u16 },
	MethodRef { class: u16, name_and_type: u16 },
	InterfaceMethodRef { class: u16, name_and_type: u16 },
	NameAndType { name: u16, descriptor: u16 },
	MethodHandle { kind: u8, reference: u16 },
	MethodType { descriptor: u16 },
	Dynamic { bootstrap_method: u16, name_and_type: u16 },
	InvokeDynamic { bootstrap_method: u16, name_and_type: u16 },
	Module { name: u16 },
	Package { name: u16 },
}

impl Entry {
	pub fn tag_name(&self) -> &'static str {
		match self {
			Entry::Utf8(_) => "Utf8",
			Entry::Integer(_) => "Integer",
			Entry::Float(_) => "Float",
			Entry::Long(_) => "Long",
			Entry::Double(_) => "Double",
			Entry::Class { .. } => "Class",
			Entry::String { .. } => "String",
			Entry::FieldRef { .. } => "FieldRef",
			Entry::MethodRef { .. } => "MethodRef",
			Entry::InterfaceMethodRef { .. } => "InterfaceMethodRef",
			Entry::NameAndType { .. } => "NameAndType",
			Entry::MethodHandle { .. } => "MethodHandle",
			Entry::MethodType { .. } => "MethodType",
			Entry::Dynamic { .. } => "Dynamic",
			Entry::InvokeDynamic { .. } => "InvokeDynamic",
			Entry::Module { .. } => "Module",
			Entry::Package { .. } => "Package",
		}
	}

	/// Whether this entry occupies two pool slots.
	fn is_wide(&self) -> bool {
		matches!(self, Entry::Long(_) | Entry::Double(_))
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantPool {
	// slot 0 and the slots after Long/Double entries hold None
	entries: Vec<Option<Entry>>,
}

impl ConstantPool {
	/// Parses the pool and runs the cross-reference validation pass.
	pub fn parse(reader: &mut ByteReader<'_>) -> Result<ConstantPool> {
		let count = reader.read_u16_as_usize()?;
		let mut entries: Vec<Option<Entry>> = Vec::with_capacity(count);
		entries.push(None);

		while entries.len() < count {
			let index = entries.len() as u16;
			let entry = Entry::parse(reader, index)?;
			let wide = entry.is_wide();
			entries.push(Some(entry));
			if wide {
				entries.push(None);
			}
		}

		let pool = ConstantPool { entries };
		pool.validate()?;
		Ok(pool)
	}

	/// The declared `constant_pool_count`, one more than the last usable index.
	pub fn count(&self) -> u16 {
		self.entries.len() as u16
	}

	pub fn get(&self, index: u16) -> Result<&Entry> {
		self.entries
			.get(index as usize)
			.and_then(Option::as_ref)
			.ok_or(DecodeError::BadConstantRef { index, expected: "usable" })
	}

	/// All usable `(index, entry)` pairs in pool order.
	pub fn iter(&self) -> impl Iterator<Item = (u16, &Entry)> {
		self.entries
			.iter()
			.enumerate()
			.filter_map(|(i, e)| Some((i as u16, e.as_ref()?)))
	}

	pub fn as_utf8(&self, index: u16) -> Result<&str> {
		match self.get(index)? {
			Entry::Utf8(s) => Ok(s),
			other => Err(self.wrong_tag(index, "Utf8", other)),
		}
	}

	pub fn as_class_name(&self, index: u16) -> Result<&str> {
		match self.get(index)? {
			Entry::Class { name } => self.as_utf8(*name),
			other => Err(self.wrong_tag(index, "Class", other)),
		}
	}

	/// `None` for index 0, used by `super_class` and catch-all handlers.
	pub fn as_optional_class_name(&self, index: u16) -> Result<Option<&str>> {
		if index == 0 {
			Ok(None)
		} else {
			self.as_class_name(index).map(Some)
		}
	}

	pub fn as_name_and_type(&self, index: u16) -> Result<(&str, &str)> {
		match self.get(index)? {
			Entry::NameAndType { name, descriptor } => {
				Ok((self.as_utf8(*name)?, self.as_utf8(*descriptor)?))
			},
			other => Err(self.wrong_tag(index, "NameAndType", other)),
		}
	}

	/// `(owner, name, descriptor)` of a `FieldRef` entry.
	pub fn as_fieldref_triple(&self, index: u16) -> Result<(&str, &str, &str)> {
		match self.get(index)? {
			Entry::FieldRef { class, name_and_type } => self.ref_triple(*class, *name_and_type),
			other => Err(self.wrong_tag(index, "FieldRef", other)),
		}
	}

	/// `(owner, name, descriptor)` of a `MethodRef` or `InterfaceMethodRef` entry.
	pub fn as_methodref_triple(&self, index: u16) -> Result<(&str, &str, &str)> {
		match self.get(index)? {
			Entry::MethodRef { class, name_and_type }
			| Entry::InterfaceMethodRef { class, name_and_type } => {
				self.ref_triple(*class, *name_and_type)
			},
			other => Err(self.wrong_tag(index, "MethodRef", other)),
		}
	}

	fn ref_triple(&self, class: u16, name_and_type: u16) -> Result<(&str, &str, &str)> {
		let owner = self.as_class_name(class)?;
		let (name, descriptor) = self.as_name_and_type(name_and_type)?;
		Ok((owner, name, descriptor))
	}

	/// Follows a one-level symbolic link down to the underlying Utf8 string.
	pub fn deref_name(&self, index: u16) -> Result<&str> {
		match self.get(index)? {
			Entry::Utf8(s) => Ok(s),
			Entry::Class { name }
			| Entry::Module { name }
			| Entry::Package { name } => self.as_utf8(*name),
			Entry::String { utf8 } => self.as_utf8(*utf8),
			Entry::MethodType { descriptor } => self.as_utf8(*descriptor),
			Entry::NameAndType { name, .. } => self.as_utf8(*name),
			other => Err(self.wrong_tag(index, "a name-bearing entry", other)),
		}
	}

	/// Renders an entry into a canonical, index-free form.
	///
	/// Two pools that differ only in entry order produce identical symbolic
	/// forms for corresponding entries, which is what makes constant pool
	/// permutation a non-difference for the differ.
	pub fn symbolic(&self, index: u16) -> Result<String> {
		let mut out = String::new();
		self.write_symbolic(index, &mut out)?;
		Ok(out)
	}

	fn write_symbolic(&self, index: u16, out: &mut String) -> Result<()> {
		// the validation pass rules out reference cycles apart from
		// MethodHandle, whose target can never be another MethodHandle
		match self.get(index)? {
			Entry::Utf8(s) => write!(out, "utf8 {s}"),
			Entry::Integer(v) => write!(out, "int {v}"),
			Entry::Float(v) => write!(out, "float {v}"),
			Entry::Long(v) => write!(out, "long {v}"),
			Entry::Double(v) => write!(out, "double {v}"),
			Entry::Class { .. } => write!(out, "class {}", self.as_class_name(index)?),
			Entry::String { utf8 } => write!(out, "string {}", self.as_utf8(*utf8)?),
			Entry::FieldRef { .. } => {
				let (owner, name, descriptor) = self.as_fieldref_triple(index)?;
				write!(out, "field {owner}.{name}:{descriptor}")
			},
			Entry::MethodRef { .. } => {
				let (owner, name, descriptor) = self.as_methodref_triple(index)?;
				write!(out, "method {owner}.{name}{descriptor}")
			},
			Entry::InterfaceMethodRef { .. } => {
				let (owner, name, descriptor) = self.as_methodref_triple(index)?;
				write!(out, "interface-method {owner}.{name}{descriptor}")
			},
			Entry::NameAndType { name, descriptor } => {
				write!(out, "name-and-type {}:{}", self.as_utf8(*name)?, self.as_utf8(*descriptor)?)
			},
			Entry::MethodHandle { kind, reference } => {
				write!(out, "handle {} ", handle_kind_name(*kind)).expect("writing to a string");
				return self.write_symbolic(*reference, out);
			},
			Entry::MethodType { descriptor } => {
				write!(out, "method-type {}", self.as_utf8(*descriptor)?)
			},
			Entry::Dynamic { bootstrap_method, name_and_type } => {
				let (name, descriptor) = self.as_name_and_type(*name_and_type)?;
				write!(out, "dynamic bsm#{bootstrap_method} {name}:{descriptor}")
			},
			Entry::InvokeDynamic { bootstrap_method, name_and_type } => {
				let (name, descriptor) = self.as_name_and_type(*name_and_type)?;
				write!(out, "invoke-dynamic bsm#{bootstrap_method} {name}:{descriptor}")
			},
			Entry::Module { name } => write!(out, "module {}", self.as_utf8(*name)?),
			Entry::Package { name } => write!(out, "package {}", self.as_utf8(*name)?),
		}
		.expect("writing to a string");
		Ok(())
	}

	fn wrong_tag(&self, index: u16, expected: &'static str, found: &Entry) -> DecodeError {
		DecodeError::WrongTag { index, expected, found: found.tag_name() }
	}

	fn validate(&self) -> Result<()> {
		for (index, entry) in self.iter() {
			match *entry {
				Entry::Utf8(_)
				| Entry::Integer(_)
				| Entry::Float(_)
				| Entry::Long(_)
				| Entry::Double(_) => {},
				Entry::Class { name }
				| Entry::Module { name }
				| Entry::Package { name } => self.expect_utf8(name)?,
				Entry::String { utf8 } => self.expect_utf8(utf8)?,
				Entry::MethodType { descriptor } => self.expect_utf8(descriptor)?,
				Entry::NameAndType { name, descriptor } => {
					self.expect_utf8(name)?;
					self.expect_utf8(descriptor)?;
				},
				Entry::FieldRef { class, name_and_type }
				| Entry::MethodRef { class, name_and_type }
				| Entry::InterfaceMethodRef { class, name_and_type } => {
					self.expect_tag(class, "Class", |e| matches!(e, Entry::Class { .. }))?;
					self.expect_tag(name_and_type, "NameAndType", |e| {
						matches!(e, Entry::NameAndType { .. })
					})?;
				},
				Entry::MethodHandle { kind, reference } => {
					let (expected, ok): (&'static str, fn(&Entry) -> bool) = match kind {
						1..=4 => ("FieldRef", |e| matches!(e, Entry::FieldRef { .. })),
						5 | 8 => ("MethodRef", |e| matches!(e, Entry::MethodRef { .. })),
						6 | 7 => ("MethodRef", |e| {
							matches!(e, Entry::MethodRef { .. } | Entry::InterfaceMethodRef { .. })
						}),
						9 => ("InterfaceMethodRef", |e| {
							matches!(e, Entry::InterfaceMethodRef { .. })
						}),
						_ => {
							return Err(DecodeError::BadConstantRef {
								index,
								expected: "method handle kind in 1..=9",
							})
						},
					};
					self.expect_tag(reference, expected, ok)?;
				},
				Entry::Dynamic { name_and_type, .. }
				| Entry::InvokeDynamic { name_and_type, .. } => {
					// the bootstrap method index points into the
					// BootstrapMethods attribute, not the pool
					self.expect_tag(name_and_type, "NameAndType", |e| {
						matches!(e, Entry::NameAndType { .. })
					})?;
				},
			}
		}
		Ok(())
	}

	fn expect_utf8(&self, index: u16) -> Result<()> {
		self.expect_tag(index, "Utf8", |e| matches!(e, Entry::Utf8(_)))
	}

	fn expect_tag(&self, index: u16, expected: &'static str, ok: impl Fn(&Entry) -> bool) -> Result<()> {
		match self.entries.get(index as usize).and_then(Option::as_ref) {
			Some(entry) if ok(entry) => Ok(()),
			_ => Err(DecodeError::BadConstantRef { index, expected }),
		}
	}
}

fn handle_kind_name(kind: u8) -> &'static str {
	match kind {
		1 => "getfield",
		2 => "getstatic",
		3 => "putfield",
		4 => "putstatic",
		5 => "invokevirtual",
		6 => "invokestatic",
		7 => "invokespecial",
		8 => "newinvokespecial",
		9 => "invokeinterface",
		_ => "unknown",
	}
}

impl Entry {
	fn parse(reader: &mut ByteReader<'_>, index: u16) -> Result<Entry> {
		Ok(match reader.read_u8()? {
			1 => {
				let length = reader.read_u16_as_usize()?;
				let bytes = reader.bytes(length)?;
				let string = jstring::decode(bytes)
					.map_err(|_| DecodeError::BadUtf8 { index })?;
				Entry::Utf8(string)
			},
			3 => Entry::Integer(reader.read_i32()?),
			4 => Entry::Float(reader.read_f32()?),
			5 => Entry::Long(reader.read_i64()?),
			6 => Entry::Double(reader.read_f64()?),
			7 => Entry::Class { name: reader.read_u16()? },
			8 => Entry::String { utf8: reader.read_u16()? },
			9 => Entry::FieldRef {
				class: reader.read_u16()?,
				name_and_type: reader.read_u16()?,
			},
			10 => Entry::MethodRef {
				class: reader.read_u16()?,
				name_and_type: reader.read_u16()?,
			},
			11 => Entry::InterfaceMethodRef {
				class: reader.read_u16()?,
				name_and_type: reader.read_u16()?,
			},
			12 => Entry::NameAndType {
				name: reader.read_u16()?,
				descriptor: reader.read_u16()?,
			},
			15 => Entry::MethodHandle {
				kind: reader.read_u8()?,
				reference: reader.read_u16()?,
			},
			16 => Entry::MethodType { descriptor: reader.read_u16()? },
			17 => Entry::Dynamic {
				bootstrap_method: reader.read_u16()?,
				name_and_type: reader.read_u16()?,
			},
			18 => Entry::InvokeDynamic {
				bootstrap_method: reader.read_u16()?,
				name_and_type: reader.read_u16()?,
			},
			19 => Entry::Module { name: reader.read_u16()? },
			20 => Entry::Package { name: reader.read_u16()? },
			_ => {
				return Err(DecodeError::BadConstantRef {
					index,
					expected: "known constant tag",
				})
			},
		})
	}
}
