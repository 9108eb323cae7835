//! Request dispatch module
//!
//! Turns [`RequestDescriptor`]s into transport calls:
//! - GET carries query parameters only
//! - POST/PUT carry a JSON body or multipart attachments, never both
//! - DELETE carries nothing

mod dispatcher;
mod types;

pub use dispatcher::Dispatcher;
pub use types::RequestDescriptor;
