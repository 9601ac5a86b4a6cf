pub mod fetcher;
pub mod parser;
pub mod pipeline;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
