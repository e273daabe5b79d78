//! Managed configuration files: discovery, provisioning, orphan scrubbing,
//! and diffing against the last provisioned state.
pub mod apply;
pub mod buffer;
pub mod diff;
pub mod fileio;
pub mod layer;
pub mod orphan;
pub mod paths;
pub mod scan;

pub use buffer::FileBuffer;
pub use fileio::FileKind;
pub use layer::{RepoFile, Strategy};
pub use paths::TargetFile;
pub use scan::scan_repo;
