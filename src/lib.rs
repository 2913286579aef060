// Library surface for the binary and for headless/integration tests.
pub mod app_dirs;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod sequence;
pub mod session;
pub mod source;
pub mod state;
pub mod term;
pub mod ui;
