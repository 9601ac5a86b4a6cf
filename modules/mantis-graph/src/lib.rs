pub mod client;
pub mod reader;
pub mod writer;
#[cfg(feature = "test-utils")]
pub mod testutil;

pub use client::GraphClient;
pub use reader::ParamReader;
pub use writer::NodeWriter;

pub use neo4rs::query;
