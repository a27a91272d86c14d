//! Error type shared by the MDT crates

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file exists but is not valid TOML for `TomlConfig`
    #[error("Config file parse failed: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config parsed but a value is unusable
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Name or identification blank; such a record could never be looked up again
    #[error("Incomplete debtor identity: name={name:?}, identification={identification:?}")]
    IncompleteIdentity { name: String, identification: String },
}
