pub mod external;
pub mod mirror_service;
pub mod storage_service;

// Re-export commonly used types
pub use external::{DriveConfig, DriveMirror};
pub use mirror_service::{CloudMirror, MirrorOutcome, NoopMirror};
pub use storage_service::PhotoStorage;
