//! Registry of attached plugins.
//!
//! Each entry pairs the plugin with the subscription on its own destroy
//! signal. The signal handler only holds a weak reference back into the
//! registry, so a plugin never keeps the registry alive.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::collaborators::Plugin;
use super::event::PluginEvent;
use crate::events::Subscription;

struct Entry {
    id: u64,
    plugin: Arc<dyn Plugin>,
    on_destroy: Subscription,
}

#[derive(Default)]
struct Entries {
    next_id: u64,
    list: Vec<Entry>,
}

#[derive(Default)]
pub struct PluginRegistry {
    entries: Arc<Mutex<Entries>>,
}

fn lock(entries: &Mutex<Entries>) -> MutexGuard<'_, Entries> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `plugin` until it emits its destroy signal.
    pub fn add(&self, plugin: Arc<dyn Plugin>) {
        let mut entries = lock(&self.entries);
        let id = entries.next_id;
        entries.next_id += 1;

        let registry: Weak<Mutex<Entries>> = Arc::downgrade(&self.entries);
        let on_destroy = plugin.events().once(PluginEvent::Destroy, move |_| {
            if let Some(registry) = registry.upgrade() {
                remove_entry(&registry, id);
            }
        });

        log::debug!("Registered plugin {} ({id})", plugin.name());
        entries.list.push(Entry {
            id,
            plugin,
            on_destroy,
        });
    }

    pub fn active(&self) -> Vec<Arc<dyn Plugin>> {
        lock(&self.entries)
            .list
            .iter()
            .map(|e| Arc::clone(&e.plugin))
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Destroy every plugin still registered and release their subscriptions.
    pub fn destroy_all(&self) {
        let drained: Vec<Entry> = lock(&self.entries).list.drain(..).collect();
        for entry in drained {
            entry.on_destroy.unsubscribe();
            log::debug!("Destroying plugin {}", entry.plugin.name());
            entry.plugin.destroy();
        }
    }
}

fn remove_entry(entries: &Mutex<Entries>, id: u64) {
    let removed = {
        let mut entries = lock(entries);
        let position = entries.list.iter().position(|e| e.id == id);
        position.map(|index| entries.list.remove(index))
    };
    if let Some(entry) = removed {
        entry.on_destroy.unsubscribe();
        log::debug!("Plugin {} left the registry", entry.plugin.name());
    }
}
