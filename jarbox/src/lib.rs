//! JAR plumbing: the manifest grammar, per-entry digests, signed-jar
//! verification, and walkers over archives and distribution trees.
//!
//! Everything here is byte-level; decoding class files out of the entries
//! this crate surfaces is the `classfile` crate's job.

pub mod digest;
pub mod dist;
pub mod jar;
pub mod manifest;
pub mod signature;

mod error;

pub use digest::{add_jar_entries, verify_jar_digests, DigestAlgorithm, DigestVerification};
pub use dist::{ArtifactKind, DirSource, FsDir, MemDir};
pub use error::{JarError, Result};
pub use jar::{EntryData, JarEntry, MemJar, OpenedJar};
pub use manifest::{Manifest, ManifestSection};
pub use signature::{default_backend, verify_jar_signature, CryptoBackend, SignatureFile, SignatureOutcome};
