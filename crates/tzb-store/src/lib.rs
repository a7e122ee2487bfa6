//! # tzb-store
//!
//! Everything a build reads from or writes to disk:
//!
//! - per-zone GeoJSON files in the working directory ([`ZoneFiles`])
//! - downloaded boundary sources ([`SourceStore`])
//! - streamed FeatureCollections ([`FeatureWriter`])
//! - diagnostic artifacts ([`DirectorySink`])
//! - the content-addressed recompute-skip index ([`FileMemo`])
//! - previous releases for diffing ([`load_release`])
//!
//! All whole-file writes go through [`write_atomic`]: readers never observe
//! a partially written file.

pub mod atomic;
pub mod diagnostics;
pub mod error;
pub mod feature_writer;
pub mod hash;
pub mod memo;
pub mod release;
pub mod sources;
pub mod zone_files;

pub use atomic::{write_atomic, write_json_atomic};
pub use diagnostics::DirectorySink;
pub use error::StoreError;
pub use feature_writer::FeatureWriter;
pub use hash::{ContentHash, ContentHashBuilder};
pub use memo::{FileMemo, MEMO_INDEX_FILE, MemoEntry, Memoize, Memoized, NoMemo, get_or_compute};
pub use release::{load_release, parse_release};
pub use sources::SourceStore;
pub use zone_files::ZoneFiles;
