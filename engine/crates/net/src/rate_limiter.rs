use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

/// Configuration for connection admission limits.
#[derive(Debug, Clone)]
pub struct LimitConfig {
    pub max_connections_total: usize,
    pub max_connections_per_ip: usize,
    /// Inbound frames larger than this are rejected as protocol errors.
    pub max_frame_bytes: usize,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_connections_total: 1000,
            max_connections_per_ip: 8,
            max_frame_bytes: 8192,
        }
    }
}

/// Reason a connection was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionRejection {
    TotalLimitReached,
    IpLimitReached,
}

impl std::fmt::Display for AdmissionRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TotalLimitReached => write!(f, "server at max connections"),
            Self::IpLimitReached => write!(f, "too many connections from this IP"),
        }
    }
}

/// Tracks connection counts per IP and in total.
/// Shared across accept tasks via Arc<Mutex>.
#[derive(Debug)]
pub struct ConnectionLimiter {
    config: LimitConfig,
    total: usize,
    per_ip: BTreeMap<IpAddr, usize>,
}

impl ConnectionLimiter {
    pub fn new(config: LimitConfig) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self {
            config,
            total: 0,
            per_ip: BTreeMap::new(),
        }))
    }

    /// Try to admit a new connection from `ip`.
    pub fn try_admit(&mut self, ip: IpAddr) -> Result<(), AdmissionRejection> {
        if self.total >= self.config.max_connections_total {
            return Err(AdmissionRejection::TotalLimitReached);
        }
        let count = self.per_ip.entry(ip).or_insert(0);
        if *count >= self.config.max_connections_per_ip {
            return Err(AdmissionRejection::IpLimitReached);
        }
        *count += 1;
        self.total += 1;
        Ok(())
    }

    /// Release a previously admitted connection.
    pub fn release(&mut self, ip: IpAddr) {
        if let Some(count) = self.per_ip.get_mut(&ip) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.per_ip.remove(&ip);
            }
        }
        self.total = self.total.saturating_sub(1);
    }

    pub fn max_frame_bytes(&self) -> usize {
        self.config.max_frame_bytes
    }

    pub fn active_total(&self) -> usize {
        self.total
    }
}
