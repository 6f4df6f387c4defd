use std::cmp::Ordering;
use std::fmt;

/// A class file version.
///
/// Versions compare by major, then minor. The decoder accepts any version;
/// [`is_recognized`][Version::is_recognized] reports whether this library
/// knows the release, as metadata for callers that care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
	pub major: u16,
	pub minor: u16,
}

impl Version {
	pub const V1_1: Version = Version::new(45, 3);
	pub const V1_2: Version = Version::new(46, 0);
	pub const V1_3: Version = Version::new(47, 0);
	pub const V1_4: Version = Version::new(48, 0);
	pub const V1_5: Version = Version::new(49, 0);
	pub const V1_6: Version = Version::new(50, 0);
	pub const V1_7: Version = Version::new(51, 0);
	pub const V1_8: Version = Version::new(52, 0);
	pub const V9: Version = Version::new(53, 0);
	pub const V11: Version = Version::new(55, 0);
	pub const V17: Version = Version::new(61, 0);
	pub const V21: Version = Version::new(65, 0);

	pub const fn new(major: u16, minor: u16) -> Version {
		Version { major, minor }
	}

	/// The Java platform release that emits this class file version, like
	/// `"1.8"` or `"17"`.
	pub fn platform(&self) -> Option<&'static str> {
		Some(match self.major {
			45 => "1.1",
			46 => "1.2",
			47 => "1.3",
			48 => "1.4",
			49 => "1.5",
			50 => "1.6",
			51 => "1.7",
			52 => "1.8",
			53 => "9",
			54 => "10",
			55 => "11",
			56 => "12",
			57 => "13",
			58 => "14",
			59 => "15",
			60 => "16",
			61 => "17",
			62 => "18",
			63 => "19",
			64 => "20",
			65 => "21",
			66 => "22",
			67 => "23",
			_ => return None,
		})
	}

	/// Whether this library knows the release this version belongs to.
	///
	/// Unrecognized versions still decode; this is purely metadata.
	pub fn is_recognized(&self) -> bool {
		self.platform().is_some()
	}
}

impl fmt::Display for Version {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}", self.major, self.minor)
	}
}

impl PartialOrd for Version {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Version {
	fn cmp(&self, other: &Self) -> Ordering {
		self.major.cmp(&other.major)
			.then_with(|| self.minor.cmp(&other.minor))
	}
}
