mod http;

pub use http::HaHttpClient;
