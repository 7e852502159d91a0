//! Terminal interface for the ARAG marketing assistant

mod session;
mod ui;


pub use session::ChatSession;
pub use ui::{
    display_banner, handle_input_with_history, print_error, print_help, print_response, print_sources,
    source_previews,
};

// Re-export core types
pub use arag_core::{Error, Result};
