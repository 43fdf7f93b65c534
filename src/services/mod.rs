pub mod api_client;
pub mod local_store;
pub mod sync_service;

pub use api_client::*;
pub use local_store::*;
pub use sync_service::*;
