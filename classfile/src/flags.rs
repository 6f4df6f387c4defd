//! Access flag bitsets for classes, fields and methods.

use std::fmt;

macro_rules! flag_display {
	($f:expr, $first:expr, $cond:expr, $name:expr) => {
		if $cond {
			if !$first {
				$f.write_str(" ")?;
			}
			$f.write_str($name)?;
			$first = false;
		}
	};
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ClassAccess {
	pub is_public: bool,
	pub is_final: bool,
	pub is_super: bool,
	pub is_interface: bool,
	pub is_abstract: bool,
	pub is_synthetic: bool,
	pub is_annotation: bool,
	pub is_enum: bool,
	pub is_module: bool,
}

impl From<u16> for ClassAccess {
	fn from(raw: u16) -> ClassAccess {
		ClassAccess {
			is_public:     raw & 0x0001 != 0,
			is_final:      raw & 0x0010 != 0,
			is_super:      raw & 0x0020 != 0,
			is_interface:  raw & 0x0200 != 0,
			is_abstract:   raw & 0x0400 != 0,
			is_synthetic:  raw & 0x1000 != 0,
			is_annotation: raw & 0x2000 != 0,
			is_enum:       raw & 0x4000 != 0,
			is_module:     raw & 0x8000 != 0,
		}
	}
}

impl fmt::Display for ClassAccess {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut first = true;
		flag_display!(f, first, self.is_public, "public");
		flag_display!(f, first, self.is_final, "final");
		flag_display!(f, first, self.is_super, "super");
		flag_display!(f, first, self.is_interface, "interface");
		flag_display!(f, first, self.is_abstract, "abstract");
		flag_display!(f, first, self.is_synthetic, "synthetic");
		flag_display!(f, first, self.is_annotation, "annotation");
		flag_display!(f, first, self.is_enum, "enum");
		flag_display!(f, first, self.is_module, "module");
		let _ = first;
		Ok(())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldAccess {
	pub is_public: bool,
	pub is_private: bool,
	pub is_protected: bool,
	pub is_static: bool,
	pub is_final: bool,
	pub is_volatile: bool,
	pub is_transient: bool,
	pub is_synthetic: bool,
	pub is_enum: bool,
}

impl From<u16> for FieldAccess {
	fn from(raw: u16) -> FieldAccess {
		FieldAccess {
			is_public:    raw & 0x0001 != 0,
			is_private:   raw & 0x0002 != 0,
			is_protected: raw & 0x0004 != 0,
			is_static:    raw & 0x0008 != 0,
			is_final:     raw & 0x0010 != 0,
			is_volatile:  raw & 0x0040 != 0,
			is_transient: raw & 0x0080 != 0,
			is_synthetic: raw & 0x1000 != 0,
			is_enum:      raw & 0x4000 != 0,
		}
	}
}

impl fmt::Display for FieldAccess {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut first = true;
		flag_display!(f, first, self.is_public, "public");
		flag_display!(f, first, self.is_private, "private");
		flag_display!(f, first, self.is_protected, "protected");
		flag_display!(f, first, self.is_static, "static");
		flag_display!(f, first, self.is_final, "final");
		flag_display!(f, first, self.is_volatile, "volatile");
		flag_display!(f, first, self.is_transient, "transient");
		flag_display!(f, first, self.is_synthetic, "synthetic");
		flag_display!(f, first, self.is_enum, "enum");
		let _ = first;
		Ok(())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MethodAccess {
	pub is_public: bool,
	pub is_private: bool,
	pub is_protected: bool,
	pub is_static: bool,
	pub is_final: bool,
	pub is_synchronized: bool,
	pub is_bridge: bool,
	pub is_varargs: bool,
	pub is_native: bool,
	pub is_abstract: bool,
	pub is_strict: bool,
	pub is_synthetic: bool,
}

impl From<u16> for MethodAccess {
	fn from(raw: u16) -> MethodAccess {
		MethodAccess {
			is_public:       raw & 0x0001 != 0,
			is_private:      raw & 0x0002 != 0,
			is_protected:    raw & 0x0004 != 0,
			is_static:       raw & 0x0008 != 0,
			is_final:        raw & 0x0010 != 0,
			is_synchronized: raw & 0x0020 != 0,
			is_bridge:       raw & 0x0040 != 0,
			is_varargs:      raw & 0x0080 != 0,
			is_native:       raw & 0x0100 != 0,
			is_abstract:     raw & 0x0400 != 0,
			is_strict:       raw & 0x0800 != 0,
			is_synthetic:    raw & 0x1000 != 0,
		}
	}
}

impl fmt::Display for MethodAccess {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut first = true;
		flag_display!(f, first, self.is_public, "public");
		flag_display!(f, first, self.is_private, "private");
		flag_display!(f, first, self.is_protected, "protected");
		flag_display!(f, first, self.is_static, "static");
		flag_display!(f, first, self.is_final, "final");
		flag_display!(f, first, self.is_synchronized, "synchronized");
		flag_display!(f, first, self.is_bridge, "bridge");
		flag_display!(f, first, self.is_varargs, "varargs");
		flag_display!(f, first, self.is_native, "native");
		flag_display!(f, first, self.is_abstract, "abstract");
		flag_display!(f, first, self.is_strict, "strict");
		flag_display!(f, first, self.is_synthetic, "synthetic");
		let _ = first;
		Ok(())
	}
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use crate::flags::{ClassAccess, FieldAccess, MethodAccess};

	#[test]
	fn class_flags() {
		let access = ClassAccess::from(0x0021);
		assert!(access.is_public);
		assert!(access.is_super);
		assert!(!access.is_interface);
		assert_eq!(access.to_string(), "public super");
	}

	#[test]
	fn field_flags() {
		let access = FieldAccess::from(0x0019);
		assert_eq!(access.to_string(), "public static final");
	}

	#[test]
	fn method_flags() {
		let access = MethodAccess::from(0x0401);
		assert_eq!(access.to_string(), "public abstract");
	}
}
