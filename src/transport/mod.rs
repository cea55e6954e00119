//! Network transport: one HTTPS POST per adapter invocation.

mod http;

pub use http::{HttpReply, HttpTransport, TransportError};
