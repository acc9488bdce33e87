#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The radio session failed to initialize or poll. Fatal to the receive
    /// loop; no frames are possible without a working radio.
    #[error("radio fault: {0}")]
    Radio(String),

    /// Input did not satisfy the block codec's length constraints.
    #[error("block codec error: {0}")]
    Codec(String),

    /// A submission to a collector service failed.
    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
