//! Request and response types for the HTTP query endpoint

pub mod query;
pub mod response;

pub use query::QueryRequest;
pub use response::QueryResponse;
