pub mod http;
pub mod storage;
pub mod wire;

pub use http::{HttpGateway, RetryPolicy};
pub use storage::FileStorage;
