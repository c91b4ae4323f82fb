//! Lifecycle state machine
//!
//! `stopped -> started -> stable`, with `stop()` returning to stopped from
//! either running state. Every transition finishes on all container
//! children before the node's own state flips and its hook runs.

use std::fmt;
use std::sync::atomic::Ordering;

use super::hooks::invoke_hook;
use super::Node;
use crate::errors::{LinkTreeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Lifecycle {
    Stopped = 0,
    Started = 1,
    Stable = 2,
}

impl Lifecycle {
    fn from_u8(raw: u8) -> Lifecycle {
        match raw {
            1 => Lifecycle::Started,
            2 => Lifecycle::Stable,
            _ => Lifecycle::Stopped,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Lifecycle::Stopped => "stopped",
            Lifecycle::Started => "started",
            Lifecycle::Stable => "stable",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Node {
    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_u8(self.0.state.load(Ordering::Acquire))
    }

    fn set_lifecycle(&self, state: Lifecycle) {
        self.0.state.store(state as u8, Ordering::Release);
    }

    /// Started or stable
    pub fn is_running(&self) -> bool {
        self.lifecycle() != Lifecycle::Stopped
    }

    pub fn is_stopped(&self) -> bool {
        self.lifecycle() == Lifecycle::Stopped
    }

    /// Exactly started (not yet stable)
    pub fn is_started(&self) -> bool {
        self.lifecycle() == Lifecycle::Started
    }

    pub fn is_stable(&self) -> bool {
        self.lifecycle() == Lifecycle::Stable
    }

    /// Start every stopped container child, then this node
    ///
    /// # Errors
    ///
    /// - `AlreadyRunning` if the node is started or stable
    /// - `DefaultInstanceImmutable` on a default instance
    pub fn start(&self) -> Result<()> {
        self.ensure_mutable()?;
        if self.is_running() {
            return Err(LinkTreeError::AlreadyRunning { path: self.path() });
        }
        self.ensure_defaults();
        for child in self.child_nodes() {
            if child.is_stopped() {
                if let Err(err) = child.start() {
                    tracing::debug!(path = %child.path(), error = %err, "child start skipped");
                }
            }
        }
        self.set_lifecycle(Lifecycle::Started);
        tracing::debug!(path = %self.path(), node_type = self.type_name(), "node started");
        invoke_hook(self, "on_started", || self.behavior().on_started(self));
        Ok(())
    }

    /// Stabilize every started container child, then this node
    ///
    /// # Errors
    ///
    /// Returns `NotStarted` unless the node is in the started state.
    pub fn stable(&self) -> Result<()> {
        let state = self.lifecycle();
        if state != Lifecycle::Started {
            return Err(LinkTreeError::NotStarted {
                path: self.path(),
                state: state.to_string(),
            });
        }
        for child in self.child_nodes() {
            if child.is_started() {
                if let Err(err) = child.stable() {
                    tracing::debug!(path = %child.path(), error = %err, "child stable skipped");
                }
            }
        }
        self.set_lifecycle(Lifecycle::Stable);
        tracing::debug!(path = %self.path(), node_type = self.type_name(), "node stable");
        invoke_hook(self, "on_stable", || self.behavior().on_stable(self));
        Ok(())
    }

    /// Cancel subscriptions, stop every container child, then this node
    ///
    /// No-op on a stopped node.
    pub fn stop(&self) {
        if self.is_stopped() {
            return;
        }
        self.cancel_subscriptions();
        for child in self.child_nodes() {
            child.stop();
        }
        self.set_lifecycle(Lifecycle::Stopped);
        tracing::debug!(path = %self.path(), node_type = self.type_name(), "node stopped");
        invoke_hook(self, "on_stopped", || self.behavior().on_stopped(self));
    }
}
