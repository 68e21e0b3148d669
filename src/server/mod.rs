pub mod server;

pub use server::{build_bus, start_server, validate_server_config};
