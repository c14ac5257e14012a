pub mod http_client_factory;
pub mod request_pacer;

pub use http_client_factory::HttpClientFactory;
pub use request_pacer::RequestPacer;
