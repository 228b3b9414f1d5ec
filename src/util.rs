use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_SNMP_PORT: u16 = 161;

pub fn get_default_snmp_port() -> u16 {
    DEFAULT_SNMP_PORT
}

const API_PORT: &str = "PORT";

const DEFAULT_PORT: u16 = 3001;

pub fn get_port() -> u16 {
    let port_from_env = std::env::var(API_PORT);
    port_from_env.map_or(DEFAULT_PORT, |res| res.parse().unwrap_or(DEFAULT_PORT))
}

const API_ADDR: &str = "TELEMETRY_ADDR";

const DEFAULT_ADDR: Ipv4Addr = Ipv4Addr::new(0, 0, 0, 0);

pub fn get_addr() -> IpAddr {
    let addr_from_env = std::env::var(API_ADDR);
    addr_from_env.map_or(IpAddr::V4(DEFAULT_ADDR), |res| {
        res.parse().unwrap_or(IpAddr::V4(DEFAULT_ADDR))
    })
}

pub fn get_bind_addr() -> SocketAddr {
    SocketAddr::new(get_addr(), get_port())
}

const DB_PATH: &str = "TELEMETRY_DB_PATH";

const DEFAULT_DB_PATH: &str = "./telemetry.db";

pub fn get_db_path() -> PathBuf {
    std::env::var(DB_PATH)
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from)
}
