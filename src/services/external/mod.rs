pub mod drive;

pub use drive::{DriveConfig, DriveMirror};
