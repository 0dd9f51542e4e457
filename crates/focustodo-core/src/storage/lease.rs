//! Cross-process lease on the persisted timer.
//!
//! Only the holder of the lease ticks the timer. The holder refreshes its
//! heartbeat every second; a heartbeat older than [`LEASE_TTL_SECS`] marks
//! the lease as abandoned (the process crashed or was killed) and any
//! process may take it over.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::error::{CoreError, Result};
use crate::ports::RunLease;

/// Seconds without a heartbeat after which a lease is abandoned.
pub const LEASE_TTL_SECS: i64 = 10;

fn stale_before(now: DateTime<Utc>) -> i64 {
    (now - Duration::seconds(LEASE_TTL_SECS)).timestamp_millis()
}

/// Held while a process drives the timer. Released on drop.
pub struct TimerLease<'a> {
    db: &'a Database,
    owner: String,
}

impl Database {
    /// Take the timer lease.
    ///
    /// # Errors
    /// [`CoreError::TimerBusy`] while another owner holds a live lease.
    pub fn acquire_timer_lease(&self, now: DateTime<Utc>) -> Result<TimerLease<'_>> {
        let owner = uuid::Uuid::new_v4().to_string();
        // One statement, so two processes racing here cannot both win.
        let changed = self.conn.execute(
            "INSERT INTO timer_lease (id, owner, heartbeat_ms) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE
             SET owner = excluded.owner, heartbeat_ms = excluded.heartbeat_ms
             WHERE timer_lease.heartbeat_ms < ?3",
            params![owner, now.timestamp_millis(), stale_before(now)],
        )?;
        if changed == 0 {
            return Err(CoreError::TimerBusy);
        }
        tracing::debug!(%owner, "timer lease acquired");
        Ok(TimerLease { db: self, owner })
    }

    /// Whether any process holds a live lease.
    pub fn timer_lease_held(&self, now: DateTime<Utc>) -> Result<bool> {
        let owner: Option<String> = self
            .conn
            .query_row(
                "SELECT owner FROM timer_lease WHERE heartbeat_ms >= ?1",
                params![stale_before(now)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(owner.is_some())
    }
}

impl TimerLease<'_> {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Refresh the heartbeat. Returns `false` once another owner has taken
    /// the lease over.
    pub fn renew(&self, now: DateTime<Utc>) -> Result<bool> {
        let changed = self.db.conn.execute(
            "UPDATE timer_lease SET heartbeat_ms = ?1 WHERE owner = ?2",
            params![now.timestamp_millis(), self.owner],
        )?;
        Ok(changed == 1)
    }
}

impl RunLease for TimerLease<'_> {
    fn renew(&self, now: DateTime<Utc>) -> Result<bool> {
        TimerLease::renew(self, now)
    }
}

impl Drop for TimerLease<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.db.conn.execute(
            "DELETE FROM timer_lease WHERE owner = ?1",
            params![self.owner],
        ) {
            tracing::warn!(error = %e, "failed to release timer lease");
        }
    }
}
