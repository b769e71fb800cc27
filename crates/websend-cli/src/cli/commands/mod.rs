//! One handler per invocation mode. Each returns the process exit status.

mod one_shot;
mod relay;
mod session;
mod usage;

pub use one_shot::run_one_shot;
pub use relay::run_relay;
pub use session::run_session;
pub use usage::run_usage;

use websend_core::config::WebsendConfig;
use websend_core::sender::{platform_channel, Deliver, ProcessLauncher, RetryingSender};

/// Native delivery channel with one start-and-retry of the target.
fn retrying_sender(cfg: &WebsendConfig) -> RetryingSender<Box<dyn Deliver>, ProcessLauncher> {
    RetryingSender::new(platform_channel(), ProcessLauncher::from_config(cfg))
}
