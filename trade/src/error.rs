use thiserror::Error;

#[derive(Error, Debug)]
pub enum TradeError {
    #[error("exchange credentials missing: {0}")]
    MissingCredentials(&'static str),

    #[error("trade manager used before init")]
    NotInitialized,

    #[error("invalid order {id}: {reason}")]
    InvalidOrder { id: uuid::Uuid, reason: String },
}
