use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AnalyticsError {
    #[error("Arithmetic overflow while calculating '{0}'")]
    Overflow(&'static str),

    #[error("Invalid reporting window: {0}")]
    InvalidWindow(String),
}
