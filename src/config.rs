use std::{env, net::SocketAddr, path::PathBuf};

use anyhow::Result;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bind_raw =
            env::var("TALENT_DIRECTORY_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let bind_addr = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8080)));

        let database_path = PathBuf::from(
            env::var("TALENT_DIRECTORY_DB_PATH").unwrap_or_else(|_| "talent.db".to_string()),
        );

        Ok(Self {
            bind_addr,
            database_path,
        })
    }
}
