pub mod health_handlers;
pub mod photo_handlers;
pub mod session_handlers;

pub use health_handlers::{diagnostic, root};
pub use photo_handlers::upload_photo;
pub use session_handlers::{create_session, get_session};
