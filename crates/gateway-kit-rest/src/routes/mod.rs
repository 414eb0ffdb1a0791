mod fallback;

pub use fallback::fallback_handler;
