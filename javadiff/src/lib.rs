//! Semantic diffing of compiled Java artifacts.
//!
//! Comparators form a tree: distributions delegate to jars, jars to classes
//! and resources, classes to members and code. Every comparator emits
//! [`Delta`] nodes; the differ never fails on a mismatch, mismatches are its
//! product. Apply an [`IgnoreSet`] afterwards to suppress difference classes
//! you do not care about.
//!
//! ```no_run
//! use classfile::{CancelToken, ClassFile};
//! use javadiff::{diff_classes, ignore, IgnoreSet};
//!
//! # fn demo(left_bytes: &[u8], right_bytes: &[u8]) -> anyhow::Result<()> {
//! let left = ClassFile::parse(left_bytes)?;
//! let right = ClassFile::parse(right_bytes)?;
//!
//! let mut delta = diff_classes(&left, &right, &CancelToken::new())?;
//! ignore::apply(&mut delta, &IgnoreSet::default());
//!
//! println!("{}", delta.to_json());
//! # Ok(())
//! # }
//! ```

pub mod classdiff;
pub mod codediff;
pub mod delta;
pub mod distdiff;
pub mod ignore;
pub mod jardiff;

pub use classdiff::diff_classes;
pub use delta::{Change, Delta, DeltaKind};
pub use distdiff::diff_dists;
pub use ignore::IgnoreSet;
pub use jardiff::diff_jars;
