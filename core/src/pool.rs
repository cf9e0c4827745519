//! Bounded connection pool.
//!
//! Connections are leased as [`PooledConnection`] guards that go back to the
//! pool when dropped, so a lease is released exactly once on every exit path.
//! At most `max_open` connections exist at any time; callers beyond that block
//! on a condition variable (or time out, per [`PoolConfig::acquire_timeout`]).

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::config::PoolConfig;
use crate::connection::{Connection, Connector};
use crate::error::{Result, RowkitError};

struct State {
    idle: Vec<Box<dyn Connection>>,
    open: usize,
}

struct Shared {
    connector: Box<dyn Connector>,
    config: PoolConfig,
    state: Mutex<State>,
    available: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock()
    }
}

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub open: usize,
    pub idle: usize,
}

#[derive(Clone)]
pub struct Pool {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("config", &self.shared.config)
            .field("status", &self.status())
            .finish()
    }
}

impl Pool {
    pub fn new(connector: impl Connector + 'static, config: PoolConfig) -> Self {
        let config = PoolConfig {
            max_open: config.max_open.max(1),
            ..config
        };
        Self {
            shared: Arc::new(Shared {
                connector: Box::new(connector),
                config,
                state: Mutex::new(State {
                    idle: Vec::new(),
                    open: 0,
                }),
                available: Condvar::new(),
            }),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    pub fn status(&self) -> PoolStatus {
        let state = self.shared.lock();
        PoolStatus {
            open: state.open,
            idle: state.idle.len(),
        }
    }

    /// Leases a connection: an idle one if available, a new one while under
    /// `max_open`, otherwise waits for a release.
    pub fn acquire(&self) -> Result<PooledConnection> {
        let shared = &self.shared;
        let deadline = shared.config.acquire_timeout.map(|t| Instant::now() + t);
        let mut state = shared.lock();

        loop {
            if let Some(conn) = state.idle.pop() {
                crate::rowkit_trace_pool!("acquire", state.open, state.idle.len());
                return Ok(self.lease(conn));
            }

            if state.open < shared.config.max_open {
                // Reserve the slot, then connect without holding the lock.
                state.open += 1;
                drop(state);
                return match shared.connector.connect() {
                    Ok(conn) => {
                        crate::rowkit_trace_pool!("connect", self.status().open, 0);
                        Ok(self.lease(conn))
                    }
                    Err(e) => {
                        let mut state = shared.lock();
                        state.open -= 1;
                        drop(state);
                        shared.available.notify_one();
                        Err(RowkitError::Pool(format!("connect failed: {e}")))
                    }
                };
            }

            match deadline {
                None => shared.available.wait(&mut state),
                Some(deadline) => {
                    if shared.available.wait_until(&mut state, deadline).timed_out()
                        && state.idle.is_empty()
                        && state.open >= shared.config.max_open
                    {
                        return Err(RowkitError::Pool(format!(
                            "timed out waiting for a connection ({} open)",
                            state.open
                        )));
                    }
                }
            }
        }
    }

    /// Returns a lease to the pool. Equivalent to dropping it.
    pub fn release(&self, conn: PooledConnection) {
        drop(conn);
    }

    fn lease(&self, conn: Box<dyn Connection>) -> PooledConnection {
        PooledConnection {
            conn: Some(conn),
            shared: Arc::clone(&self.shared),
            broken: false,
        }
    }
}

/// A leased connection. Derefs to the driver connection.
pub struct PooledConnection {
    conn: Option<Box<dyn Connection>>,
    shared: Arc<Shared>,
    broken: bool,
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("released", &self.conn.is_none())
            .field("broken", &self.broken)
            .finish()
    }
}

impl PooledConnection {
    /// Closes the connection on release instead of returning it to the idle set.
    pub fn discard(mut self) {
        self.broken = true;
    }
}

impl Deref for PooledConnection {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        // `conn` is only taken in `drop`.
        self.conn.as_deref().expect("pooled connection used after release")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn
            .as_deref_mut()
            .expect("pooled connection used after release")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };

        let mut state = self.shared.lock();
        let closed = if self.broken || state.idle.len() >= self.shared.config.max_idle {
            state.open -= 1;
            Some(conn)
        } else {
            state.idle.push(conn);
            None
        };
        crate::rowkit_trace_pool!("release", state.open, state.idle.len());
        drop(state);
        self.shared.available.notify_one();
        // Close outside the lock.
        drop(closed);
    }
}
