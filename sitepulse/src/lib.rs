pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use commands::command_argument_builder;
pub use handlers::{
    expand_path, handle_loadtest, handle_scrape, load_test_config_from_args, parse_duration_secs,
    parse_positive_count,
};
