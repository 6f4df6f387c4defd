//! Assembles synthetic class files byte by byte, the way `javac` would lay
//! them out, so decoder tests have exact control over the input.

/// Builds constant pool bytes, handing out indices as entries are added.
pub struct Cp {
	data: Vec<u8>,
	count: u16,
}

impl Cp {
	pub fn new() -> Cp {
		Cp { data: Vec::new(), count: 1 }
	}

	fn add(&mut self, bytes: Vec<u8>, slots: u16) -> u16 {
		let index = self.count;
		self.data.extend(bytes);
		self.count += slots;
		index
	}

	pub fn utf8(&mut self, s: &str) -> u16 {
		let mut bytes = vec![1];
		bytes.extend((s.len() as u16).to_be_bytes());
		bytes.extend(s.bytes());
		self.add(bytes, 1)
	}

	pub fn class(&mut self, name: &str) -> u16 {
		let name_index = self.utf8(name);
		self.class_of(name_index)
	}

	pub fn class_of(&mut self, name_index: u16) -> u16 {
		let mut bytes = vec![7];
		bytes.extend(name_index.to_be_bytes());
		self.add(bytes, 1)
	}

	pub fn string_of(&mut self, utf8_index: u16) -> u16 {
		let mut bytes = vec![8];
		bytes.extend(utf8_index.to_be_bytes());
		self.add(bytes, 1)
	}

	pub fn string(&mut self, s: &str) -> u16 {
		let utf8_index = self.utf8(s);
		self.string_of(utf8_index)
	}

	pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
		let name_index = self.utf8(name);
		let descriptor_index = self.utf8(descriptor);
		let mut bytes = vec![12];
		bytes.extend(name_index.to_be_bytes());
		bytes.extend(descriptor_index.to_be_bytes());
		self.add(bytes, 1)
	}

	pub fn methodref(&mut self, class_index: u16, nat_index: u16) -> u16 {
		let mut bytes = vec![10];
		bytes.extend(class_index.to_be_bytes());
		bytes.extend(nat_index.to_be_bytes());
		self.add(bytes, 1)
	}
}

pub struct Attr {
	pub name: u16,
	pub payload: Vec<u8>,
}

impl Attr {
	pub fn new(name: u16, payload: Vec<u8>) -> Attr {
		Attr { name, payload }
	}
}

pub struct Member {
	pub access: u16,
	pub name: u16,
	pub descriptor: u16,
	pub attributes: Vec<Attr>,
}

fn put_attributes(out: &mut Vec<u8>, attributes: &[Attr]) {
	out.extend((attributes.len() as u16).to_be_bytes());
	for attr in attributes {
		out.extend(attr.name.to_be_bytes());
		out.extend((attr.payload.len() as u32).to_be_bytes());
		out.extend(&attr.payload);
	}
}

/// The payload of a `Code` attribute with no nested attributes.
pub fn code_payload(max_stack: u16, max_locals: u16, code: &[u8]) -> Vec<u8> {
	code_payload_with(max_stack, max_locals, code, &[])
}

pub fn code_payload_with(max_stack: u16, max_locals: u16, code: &[u8], attributes: &[Attr]) -> Vec<u8> {
	let mut out = Vec::new();
	out.extend(max_stack.to_be_bytes());
	out.extend(max_locals.to_be_bytes());
	out.extend((code.len() as u32).to_be_bytes());
	out.extend(code);
	out.extend(0u16.to_be_bytes()); // exception table
	put_attributes(&mut out, attributes);
	out
}

/// Assembles a complete class file.
pub fn class_file(
	version: (u16, u16),
	cp: Cp,
	access: u16,
	this_class: u16,
	super_class: u16,
	interfaces: &[u16],
	fields: &[Member],
	methods: &[Member],
	attributes: &[Attr],
) -> Vec<u8> {
	let mut out = Vec::new();
	out.extend(0xcafe_babeu32.to_be_bytes());
	out.extend(version.1.to_be_bytes()); // minor
	out.extend(version.0.to_be_bytes()); // major

	out.extend(cp.count.to_be_bytes());
	out.extend(&cp.data);

	out.extend(access.to_be_bytes());
	out.extend(this_class.to_be_bytes());
	out.extend(super_class.to_be_bytes());

	out.extend((interfaces.len() as u16).to_be_bytes());
	for interface in interfaces {
		out.extend(interface.to_be_bytes());
	}

	for members in [fields, methods] {
		out.extend((members.len() as u16).to_be_bytes());
		for member in members {
			out.extend(member.access.to_be_bytes());
			out.extend(member.name.to_be_bytes());
			out.extend(member.descriptor.to_be_bytes());
			put_attributes(&mut out, &member.attributes);
		}
	}

	put_attributes(&mut out, attributes);
	out
}

/// A small `public class Sample1 extends Object` with a string constant and
/// two constructors, mirroring what `javac` emits for such a class.
pub fn sample1() -> Vec<u8> {
	let mut cp = Cp::new();

	let object_class = cp.class("java/lang/Object");
	let this_class = cp.class("Sample1");
	let init_nat = cp.name_and_type("<init>", "()V");
	let object_init = cp.methodref(object_class, init_nat);
	let code_name = cp.utf8("Code");

	let default_name = cp.utf8("DEFAULT_NAME");
	let string_descriptor = cp.utf8("Ljava/lang/String;");
	let constant_value_name = cp.utf8("ConstantValue");
	let daphne = cp.string("Daphne");

	let init_name = cp.utf8("<init>");
	let void_descriptor = cp.utf8("()V");
	let string_arg_descriptor = cp.utf8("(Ljava/lang/String;)V");

	let field = Member {
		access: 0x0019, // public static final
		name: default_name,
		descriptor: string_descriptor,
		attributes: vec![Attr::new(constant_value_name, daphne.to_be_bytes().to_vec())],
	};

	// aload_0, invokespecial Object.<init>()V, return
	let mut ctor_code = vec![0x2a, 0xb7];
	ctor_code.extend(object_init.to_be_bytes());
	ctor_code.push(0xb1);

	let default_ctor = Member {
		access: 0x0001,
		name: init_name,
		descriptor: void_descriptor,
		attributes: vec![Attr::new(code_name, code_payload(1, 1, &ctor_code))],
	};
	let string_ctor = Member {
		access: 0x0001,
		name: init_name,
		descriptor: string_arg_descriptor,
		attributes: vec![Attr::new(code_name, code_payload(1, 2, &ctor_code))],
	};

	class_file(
		(52, 0),
		cp,
		0x0021, // public super
		this_class,
		object_class,
		&[],
		&[field],
		&[default_ctor, string_ctor],
		&[],
	)
}
