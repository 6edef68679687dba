use crate::object::ObjectId;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown object: {0:?}")]
    UnknownObject(ObjectId),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_yaml::Error),
}
