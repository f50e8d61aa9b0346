pub mod loader;

pub use loader::{ConfigLoadError, Format, load_network_config, parse_network_config};
