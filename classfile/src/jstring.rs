//! The string encoding used by the class file format.
//!
//! This is not standard UTF-8: `\0` is stored as the two bytes `C0 80`, code
//! points above `U+FFFF` are stored as a six-byte surrogate pair (each half
//! in the three-byte form), and the four-byte UTF-8 form never appears.
//!
//! See <https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.4.7>.

/// Decodes modified UTF-8 bytes. `Err` carries the offset of the offending byte.
pub fn decode(bytes: &[u8]) -> Result<String, usize> {
	let mut out = String::with_capacity(bytes.len());
	let mut i = 0;

	while i < bytes.len() {
		let a = bytes[i];
		match a {
			0x01..=0x7f => {
				out.push(a as char);
				i += 1;
			},
			0xc0..=0xdf => {
				let b = continuation(bytes, i + 1).ok_or(i)?;
				let cp = (u32::from(a & 0x1f) << 6) | u32::from(b);
				out.push(char::from_u32(cp).ok_or(i)?);
				i += 2;
			},
			0xe0..=0xef => {
				let b = continuation(bytes, i + 1).ok_or(i)?;
				let c = continuation(bytes, i + 2).ok_or(i)?;
				let cp = (u32::from(a & 0x0f) << 12) | (u32::from(b) << 6) | u32::from(c);

				match cp {
					0xd800..=0xdbff => {
						// high surrogate, must pair with a low one in the next three bytes
						let low = three_byte(bytes, i + 3).ok_or(i)?;
						if !(0xdc00..=0xdfff).contains(&low) {
							return Err(i);
						}
						let cp = 0x10000 + ((cp - 0xd800) << 10) + (low - 0xdc00);
						out.push(char::from_u32(cp).ok_or(i)?);
						i += 6;
					},
					0xdc00..=0xdfff => return Err(i),
					_ => {
						out.push(char::from_u32(cp).ok_or(i)?);
						i += 3;
					},
				}
			},
			// a raw NUL and the 4-byte UTF-8 forms are invalid here
			_ => return Err(i),
		}
	}

	Ok(out)
}

/// Encodes a string into modified UTF-8 bytes.
pub fn encode(string: &str) -> Vec<u8> {
	let mut out = Vec::with_capacity(string.len());

	for ch in string.chars() {
		let cp = ch as u32;
		match cp {
			0x01..=0x7f => out.push(cp as u8),
			// note that this includes the two-byte form of NUL
			0x00 | 0x80..=0x7ff => {
				out.push(0xc0 | (cp >> 6) as u8);
				out.push(0x80 | (cp & 0x3f) as u8);
			},
			0x800..=0xffff => {
				push_three_byte(&mut out, cp);
			},
			_ => {
				let cp = cp - 0x10000;
				push_three_byte(&mut out, 0xd800 + (cp >> 10));
				push_three_byte(&mut out, 0xdc00 + (cp & 0x3ff));
			},
		}
	}

	out
}

fn push_three_byte(out: &mut Vec<u8>, cp: u32) {
	out.push(0xe0 | (cp >> 12) as u8);
	out.push(0x80 | ((cp >> 6) & 0x3f) as u8);
	out.push(0x80 | (cp & 0x3f) as u8);
}

fn continuation(bytes: &[u8], i: usize) -> Option<u8> {
	match bytes.get(i) {
		Some(&b) if b & 0xc0 == 0x80 => Some(b & 0x3f),
		_ => None,
	}
}

fn three_byte(bytes: &[u8], i: usize) -> Option<u32> {
	let a = *bytes.get(i)?;
	if a & 0xf0 != 0xe0 {
		return None;
	}
	let b = continuation(bytes, i + 1)?;
	let c = continuation(bytes, i + 2)?;
	Some((u32::from(a & 0x0f) << 12) | (u32::from(b) << 6) | u32::from(c))
}
