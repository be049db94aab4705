use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Dbus connection error")]
    DbusError(#[from] zbus::Error),
    #[error("Bus name {0} is already taken")]
    NameTaken(String),
    #[error("No answer to {0} in time")]
    Timeout(String),
}

pub type Result<T> = std::result::Result<T, Error>;
