use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HitmapError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to read config file {path}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {path}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to start oracle '{program}'")]
    OracleSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Oracle '{program}' exited with {status}: {stderr}")]
    OracleExit {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Malformed oracle reply: {reply}")]
    OracleReply {
        reply: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to create directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create file {path}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, HitmapError>;
