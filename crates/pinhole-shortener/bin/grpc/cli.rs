use clap::{Parser, ValueEnum};
use pinhole_storage::StorageConfig;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const LISTEN_ADDR_ENV: &str = "PINHOLE_SHORTENER_GRPC_LISTEN_ADDR";
pub const BASE_URL_ENV: &str = "PINHOLE_SHORTENER_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "PINHOLE_SHORTENER_STORAGE_BACKEND";
pub const FILE_PATH_ENV: &str = "PINHOLE_SHORTENER_FILE_STORAGE_PATH";
pub const POSTGRES_DSN_ENV: &str = "PINHOLE_SHORTENER_POSTGRES_DSN";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:50051";
pub const DEFAULT_BASE_URL: &str = "http://localhost:50051";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "file")]
    File,
    #[value(name = "postgres")]
    Postgres,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::File => write!(f, "file"),
            StorageBackendArg::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "pinhole-shortener-grpc-server")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Public prefix short URLs are built from.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    /// Durability log path for the file backend.
    #[arg(long, env = FILE_PATH_ENV, required_if_eq("storage", "file"))]
    pub file_path: Option<PathBuf>,

    #[arg(long, env = POSTGRES_DSN_ENV, required_if_eq("storage", "postgres"))]
    pub postgres_dsn: Option<String>,
}

impl CLI {
    pub fn storage_config(&self) -> Result<StorageConfig, String> {
        match self.storage {
            StorageBackendArg::InMemory => Ok(StorageConfig::InMemory),
            StorageBackendArg::File => {
                let path = self
                    .file_path
                    .clone()
                    .ok_or("file path is required when storage backend is file")?;
                Ok(StorageConfig::File { path })
            }
            StorageBackendArg::Postgres => {
                let dsn = self
                    .postgres_dsn
                    .clone()
                    .ok_or("postgres dsn is required when storage backend is postgres")?;
                Ok(StorageConfig::Postgres { dsn })
            }
        }
    }
}
