use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControllerError {
    /// The trade settlement source never became ready; the loop stays unarmed.
    #[error("trade settlement source failed to initialize: {0:#}")]
    Init(#[source] anyhow::Error),

    #[error("invalid controller config: {0}")]
    InvalidConfig(&'static str),

    #[error("controller already started")]
    AlreadyStarted,
}
