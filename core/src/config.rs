use std::time::Duration;

/// Connection pool limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Upper bound on simultaneously open connections
    pub max_open: usize,
    /// Connections kept open while unused; extras are closed on release
    pub max_idle: usize,
    /// `None` blocks until a connection frees up, otherwise fail after the timeout
    pub acquire_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_open: 20,
            max_idle: 20,
            acquire_timeout: None,
        }
    }
}

impl PoolConfig {
    /// Clamped to at least one connection.
    pub fn with_max_open(mut self, max_open: usize) -> Self {
        self.max_open = max_open.max(1);
        self
    }

    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }
}

/// Settings of a [`Db`](crate::Db) handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbConfig {
    pub pool: PoolConfig,
    /// Deepest nesting level the eager loader descends to
    pub max_depth: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            max_depth: 8,
        }
    }
}

impl DbConfig {
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
