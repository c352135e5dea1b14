//! Lifecycle events and event handling.
//!
//! This module provides event emission for execution and pool lifecycle
//! events, enabling observability into the scheduler. Handlers are
//! consumers only; the circuit breaker never depends on them.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::core::types::{ExecutionId, JobKind};

/// Lifecycle events emitted by the pool and its execution loops.
#[derive(Debug, Clone)]
pub enum Event {
    /// An execution passed its readiness gate and entered `Running`.
    ExecutionStarted {
        id: ExecutionId,
        kind: JobKind,
        timestamp: Instant,
    },

    /// An execution's job returned an error.
    ExecutionFailed {
        id: ExecutionId,
        kind: JobKind,
        error: String,
        timestamp: Instant,
    },

    /// A previously parked execution re-entered `Running`.
    ExecutionRestored {
        id: ExecutionId,
        kind: JobKind,
        timestamp: Instant,
    },

    /// The pool paused all non-detached executions after a failure.
    PoolPaused {
        /// The execution whose failure triggered the pause.
        failed: ExecutionId,
        timestamp: Instant,
    },

    /// The pool's retry window elapsed and executions were resumed.
    PoolResumed { timestamp: Instant },
}

impl Event {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> Instant {
        match self {
            Event::ExecutionStarted { timestamp, .. } => *timestamp,
            Event::ExecutionFailed { timestamp, .. } => *timestamp,
            Event::ExecutionRestored { timestamp, .. } => *timestamp,
            Event::PoolPaused { timestamp, .. } => *timestamp,
            Event::PoolResumed { timestamp } => *timestamp,
        }
    }

    /// Create an ExecutionStarted event.
    pub fn execution_started(id: ExecutionId, kind: JobKind) -> Self {
        Event::ExecutionStarted {
            id,
            kind,
            timestamp: Instant::now(),
        }
    }

    /// Create an ExecutionFailed event.
    pub fn execution_failed(id: ExecutionId, kind: JobKind, error: impl Into<String>) -> Self {
        Event::ExecutionFailed {
            id,
            kind,
            error: error.into(),
            timestamp: Instant::now(),
        }
    }

    /// Create an ExecutionRestored event.
    pub fn execution_restored(id: ExecutionId, kind: JobKind) -> Self {
        Event::ExecutionRestored {
            id,
            kind,
            timestamp: Instant::now(),
        }
    }

    /// Create a PoolPaused event.
    pub fn pool_paused(failed: ExecutionId) -> Self {
        Event::PoolPaused {
            failed,
            timestamp: Instant::now(),
        }
    }

    /// Create a PoolResumed event.
    pub fn pool_resumed() -> Self {
        Event::PoolResumed {
            timestamp: Instant::now(),
        }
    }
}

/// Handler for receiving lifecycle events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle an event.
    async fn handle(&self, event: &Event);
}

/// Event bus for distributing events to registered handlers.
pub struct EventBus {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl EventBus {
    /// Create a new event bus with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Register an event handler.
    pub async fn register(&self, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().await;
        handlers.push(handler);
    }

    /// Emit an event to all registered handlers.
    pub async fn emit(&self, event: Event) {
        let handlers = self.handlers.read().await;
        for handler in handlers.iter() {
            handler.handle(&event).await;
        }
    }

    /// Get the number of registered handlers.
    pub async fn handler_count(&self) -> usize {
        self.handlers.read().await.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
