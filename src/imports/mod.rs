mod errors;
mod service;
mod source;

pub use errors::ImportError;
pub use service::{plan_order, ImportService, ImportSummary};
pub use source::read_payload;
