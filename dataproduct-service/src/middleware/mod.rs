//! HTTP middleware

pub mod deprecation;
pub mod request_tracking;

pub use deprecation::deprecation_headers;
pub use request_tracking::{
    request_id_layer, request_id_propagation_layer, sensitive_headers_layer,
    MakeTimeOrderedRequestId, SENSITIVE_HEADERS,
};
