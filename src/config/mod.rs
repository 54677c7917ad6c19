pub mod env;

pub use env::ApiConfig;
