mod init;
mod spans;

pub use init::init_logger;
pub use spans::{task_span, warn_if_slow};
