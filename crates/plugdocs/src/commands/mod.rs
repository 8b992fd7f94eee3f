//! CLI command implementations.

pub(crate) mod fetch;
pub(crate) mod serve;

pub(crate) use fetch::FetchArgs;
pub(crate) use serve::ServeArgs;
