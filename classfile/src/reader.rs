//! A bounded big-endian cursor over an in-memory byte slice.
//!
//! Every read checks the remaining length first and fails with
//! [`DecodeError::Truncated`] carrying the absolute offset at which the
//! underflow happened. Child cursors share the underlying data but carry
//! their own bound, which is how length-prefixed structures (attributes,
//! `Code` bodies) are decoded.

use crate::error::{DecodeError, Result};

#[derive(Clone)]
pub struct ByteReader<'a> {
	data: &'a [u8],
	pos: usize,
	base: usize,
}

impl<'a> ByteReader<'a> {
	pub fn new(data: &'a [u8]) -> ByteReader<'a> {
		ByteReader { data, pos: 0, base: 0 }
	}

	/// A reader whose [`tell`][ByteReader::tell] reports offsets shifted by `base`.
	pub fn with_base(data: &'a [u8], base: usize) -> ByteReader<'a> {
		ByteReader { data, pos: 0, base }
	}

	/// The absolute offset of the next byte to be read.
	pub fn tell(&self) -> usize {
		self.base + self.pos
	}

	/// The offset relative to the start of this cursor's slice.
	pub fn pos(&self) -> usize {
		self.pos
	}

	pub fn seek(&mut self, pos: usize) -> Result<()> {
		if pos > self.data.len() {
			return Err(DecodeError::Truncated { offset: self.base + pos });
		}
		self.pos = pos;
		Ok(())
	}

	pub fn skip(&mut self, n: usize) -> Result<()> {
		self.seek(self.pos + n)
	}

	pub fn remaining(&self) -> usize {
		self.data.len() - self.pos
	}

	pub fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
		if self.remaining() < n {
			return Err(DecodeError::Truncated { offset: self.base + self.data.len() });
		}
		let slice = &self.data[self.pos..self.pos + n];
		self.pos += n;
		Ok(slice)
	}

	/// Splits off a child cursor over the next `n` bytes and advances past them.
	///
	/// The child reports absolute offsets, but cannot read past its own bound.
	pub fn child(&mut self, n: usize) -> Result<ByteReader<'a>> {
		let base = self.tell();
		Ok(ByteReader { data: self.bytes(n)?, pos: 0, base })
	}

	fn read_n<const N: usize>(&mut self) -> Result<[u8; N]> {
		let mut buf = [0u8; N];
		buf.copy_from_slice(self.bytes(N)?);
		Ok(buf)
	}

	pub fn read_u8(&mut self) -> Result<u8> {
		Ok(u8::from_be_bytes(self.read_n()?))
	}

	pub fn read_u16(&mut self) -> Result<u16> {
		Ok(u16::from_be_bytes(self.read_n()?))
	}

	pub fn read_u32(&mut self) -> Result<u32> {
		Ok(u32::from_be_bytes(self.read_n()?))
	}

	pub fn read_u64(&mut self) -> Result<u64> {
		Ok(u64::from_be_bytes(self.read_n()?))
	}

	pub fn read_i8(&mut self) -> Result<i8> {
		Ok(i8::from_be_bytes(self.read_n()?))
	}

	pub fn read_i16(&mut self) -> Result<i16> {
		Ok(i16::from_be_bytes(self.read_n()?))
	}

	pub fn read_i32(&mut self) -> Result<i32> {
		Ok(i32::from_be_bytes(self.read_n()?))
	}

	pub fn read_i64(&mut self) -> Result<i64> {
		Ok(i64::from_be_bytes(self.read_n()?))
	}

	pub fn read_f32(&mut self) -> Result<f32> {
		Ok(f32::from_bits(self.read_u32()?))
	}

	pub fn read_f64(&mut self) -> Result<f64> {
		Ok(f64::from_bits(self.read_u64()?))
	}

	pub fn read_u16_as_usize(&mut self) -> Result<usize> {
		Ok(self.read_u16()? as usize)
	}

	pub fn read_vec<T, S, E>(&mut self, get_size: S, mut get_element: E) -> Result<Vec<T>>
	where
		S: FnOnce(&mut Self) -> Result<usize>,
		E: FnMut(&mut Self) -> Result<T>,
	{
		let size = get_size(self)?;
		let mut vec = Vec::with_capacity(size.min(4096));
		for _ in 0..size {
			vec.push(get_element(self)?);
		}
		Ok(vec)
	}
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use crate::error::DecodeError;
	use crate::reader::ByteReader;

	#[test]
	fn primitives() {
		let data = [0xca, 0xfe, 0xba, 0xbe, 0x00, 0x34, 0xff, 0xff];
		let mut r = ByteReader::new(&data);
		assert_eq!(r.read_u32().unwrap(), 0xcafe_babe);
		assert_eq!(r.read_u16().unwrap(), 0x34);
		assert_eq!(r.read_i16().unwrap(), -1);
		assert_eq!(r.tell(), 8);
		assert_eq!(r.remaining(), 0);
	}

	#[test]
	fn truncated_carries_offset() {
		let data = [0x00, 0x01];
		let mut r = ByteReader::new(&data);
		assert_eq!(r.read_u32(), Err(DecodeError::Truncated { offset: 2 }));
		// a failed read does not advance
		assert_eq!(r.read_u16().unwrap(), 1);
	}

	#[test]
	fn child_has_own_bound() {
		let data = [0x01, 0x02, 0x03, 0x04, 0x05];
		let mut r = ByteReader::new(&data);
		r.skip(1).unwrap();
		let mut child = r.child(2).unwrap();
		assert_eq!(child.tell(), 1);
		assert_eq!(child.read_u16().unwrap(), 0x0203);
		assert_eq!(child.read_u8(), Err(DecodeError::Truncated { offset: 3 }));
		// the parent has advanced past the child's bytes
		assert_eq!(r.read_u8().unwrap(), 0x04);
	}

	#[test]
	fn floats_are_bit_exact() {
		let bits = 1.5f32.to_bits().to_be_bytes();
		let mut r = ByteReader::new(&bits);
		assert_eq!(r.read_f32().unwrap(), 1.5);
	}
}
