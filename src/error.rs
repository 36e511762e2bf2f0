pub type KioskResult<T> = Result<T, KioskError>;

#[derive(thiserror::Error, Debug)]
pub enum KioskError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("load error: {0}")]
    Load(String),

    #[error("decoder error: {0}")]
    Decoder(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("display error: {0}")]
    Display(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KioskError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    pub fn decoder(msg: impl Into<String>) -> Self {
        Self::Decoder(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn display(msg: impl Into<String>) -> Self {
        Self::Display(msg.into())
    }
}
