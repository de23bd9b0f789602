//! HTTP response head parsing and the per-response decision logic.

pub mod policy;
pub mod response;

pub use policy::{check_response, Decision, MAX_REDIRECTS};
pub use response::{parse_response, DocType, HttpResponse};
