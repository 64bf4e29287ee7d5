//! Request-scoped context.
//!
//! Provides the `CurrentUser` extractor. Authentication happens upstream; the
//! authenticator forwards the caller's id in the `x-user-id` header.

mod extractor;
mod types;

pub use types::CurrentUser;
