// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::ListenerId;

/// Scroll position and measured height of the table body, in the same unit
/// as the row height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportState {
    pub scroll_top: u32,
    /// `None` until the first resize is observed.
    pub viewport_height: Option<u32>,
}

impl ViewportState {
    pub fn apply(&mut self, event: ViewportEvent) -> bool {
        let before = *self;
        match event {
            ViewportEvent::Scrolled { top } => self.scroll_top = top,
            ViewportEvent::Resized { height } => self.viewport_height = Some(height),
        }
        before != *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportEvent {
    Scrolled { top: u32 },
    Resized { height: u32 },
}

impl ViewportEvent {
    const fn kind(self) -> ListenerKind {
        match self {
            Self::Scrolled { .. } => ListenerKind::Scroll,
            Self::Resized { .. } => ListenerKind::Resize,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    Scroll,
    Resize,
}

#[derive(Debug)]
struct Listener {
    id: ListenerId,
    kind: ListenerKind,
    tx: Sender<ViewportEvent>,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<Listener>,
    limit: Option<usize>,
    closed: bool,
}

/// Fan-out point for scroll and resize notifications from the front end.
#[derive(Debug, Clone, Default)]
pub struct ViewportHub {
    registry: Arc<Mutex<Registry>>,
}

impl ViewportHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        let hub = Self::default();
        hub.lock_for_teardown().limit = Some(limit);
        hub
    }

    /// Registers a scroll listener and a resize listener. Dropping the
    /// returned guard detaches both, and a failure part way through
    /// releases whatever was already attached.
    pub fn subscribe(&self) -> Result<ViewportSubscription> {
        let (tx, rx) = mpsc::channel();
        let mut subscription = ViewportSubscription {
            hub: self.clone(),
            listeners: Vec::with_capacity(2),
            rx,
        };
        for kind in [ListenerKind::Scroll, ListenerKind::Resize] {
            let id = self.attach(kind, tx.clone())?;
            subscription.listeners.push(id);
        }
        Ok(subscription)
    }

    /// Delivers `event` to every listener of its kind and returns how many
    /// received it.
    pub fn publish(&self, event: ViewportEvent) -> Result<usize> {
        let mut registry = self.lock()?;
        let kind = event.kind();
        let mut delivered = 0;
        registry.listeners.retain(|listener| {
            if listener.kind != kind {
                return true;
            }
            if listener.tx.send(event).is_ok() {
                delivered += 1;
                true
            } else {
                false
            }
        });
        Ok(delivered)
    }

    pub fn listener_count(&self) -> usize {
        self.lock_for_teardown().listeners.len()
    }

    /// Refuses further subscriptions. Existing guards still detach normally.
    pub fn close(&self) {
        self.lock_for_teardown().closed = true;
    }

    fn attach(&self, kind: ListenerKind, tx: Sender<ViewportEvent>) -> Result<ListenerId> {
        let mut registry = self.lock()?;
        if registry.closed {
            bail!("viewport hub is closed");
        }
        if let Some(limit) = registry.limit
            && registry.listeners.len() >= limit
        {
            bail!("viewport listener limit reached ({limit})");
        }
        registry.next_id += 1;
        let id = ListenerId::new(registry.next_id);
        registry.listeners.push(Listener { id, kind, tx });
        debug!(listener = id.get(), ?kind, "viewport listener attached");
        Ok(id)
    }

    fn detach(&self, ids: &[ListenerId]) {
        let mut registry = self.lock_for_teardown();
        registry
            .listeners
            .retain(|listener| !ids.contains(&listener.id));
        for id in ids {
            debug!(listener = id.get(), "viewport listener detached");
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Registry>> {
        self.registry
            .lock()
            .map_err(|_| anyhow!("viewport listener registry poisoned"))
    }

    // Teardown paths must not fail, so take the registry even if poisoned.
    fn lock_for_teardown(&self) -> MutexGuard<'_, Registry> {
        match self.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Live scroll and resize listeners for one table.
#[derive(Debug)]
pub struct ViewportSubscription {
    hub: ViewportHub,
    listeners: Vec<ListenerId>,
    rx: Receiver<ViewportEvent>,
}

impl ViewportSubscription {
    pub fn pending(&self) -> Vec<ViewportEvent> {
        self.rx.try_iter().collect()
    }

    /// Applies every queued event to `state`; true when anything changed.
    pub fn apply_pending(&self, state: &mut ViewportState) -> bool {
        let mut changed = false;
        for event in self.rx.try_iter() {
            changed |= state.apply(event);
        }
        changed
    }
}

impl Drop for ViewportSubscription {
    fn drop(&mut self) {
        self.hub.detach(&self.listeners);
    }
}
