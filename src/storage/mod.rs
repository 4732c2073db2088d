/// Content-addressed archive of blobs and provenance logs
pub mod archive;
/// Typed storage failures
pub mod errors;
/// Content fingerprints (MD5)
pub mod fingerprint;

pub use archive::{
    ArchiveStore, BLOB_FILE, EntryHealth, EntrySummary, PROVENANCE_FILE, ProvenanceRecord,
    RecordOutcome,
};
pub use errors::{StorageError, StorageResult, StorageStep};
pub use fingerprint::{Fingerprint, FingerprintHasher};
