pub mod protocol;
pub mod rest;
pub mod reveal_task;
pub mod state;
pub mod status_task;
pub mod ws_handler;

// Re-export the main WebSocket handler to make it easily accessible
// to the binary that builds the web server router.
pub use rest::{
    composer_page_handler, create_letter_handler, fallback_handler, fetch_letter_handler,
    mark_opened_handler, record_response_handler, status_handler, status_page_handler,
    viewer_page_handler,
};
pub use ws_handler::ws_handler;
