pub mod photo;
pub mod session;

// Re-export commonly used types
pub use photo::*;
pub use session::*;
