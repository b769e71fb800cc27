pub mod config;
pub mod logging;

pub mod dispatcher;
pub mod http;
pub mod progress;
pub mod protocol;
pub mod relay;
pub mod resolve;
pub mod sender;
pub mod session;
pub mod transport;
pub mod upload;
pub mod url_model;

pub use dispatcher::Dispatcher;
pub use session::Session;
