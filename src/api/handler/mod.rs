pub mod handler;

pub use handler::{index_handler, not_found_handler, render_index, stats_handler};
