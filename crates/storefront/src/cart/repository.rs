//! Cart persistence.
//!
//! A [`CartRepository`] stores the whole cart as one JSON snapshot and pushes
//! a [`CartChanged`] notification to subscribers after every save. Writes are
//! last-write-wins; the snapshot's `version` lets a reader notice that some
//! other writer got there first.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{CartLine, CartStoreError};

/// File name of the persisted cart inside the data directory.
pub const CART_FILE: &str = "cart.json";

/// Buffered notifications per subscriber before the slowest one lags.
const NOTIFY_CAPACITY: usize = 64;

/// The stored form of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCart {
    /// Incremented on every save.
    pub version: u64,
    /// When the snapshot was written.
    pub updated_at: DateTime<Utc>,
    /// The cart store instance that wrote the snapshot.
    pub writer: Uuid,
    pub lines: Vec<CartLine>,
}

/// Change notification pushed after a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartChanged {
    pub version: u64,
    pub writer: Uuid,
    /// Sum of quantities, for count badges.
    pub item_count: u32,
}

impl CartChanged {
    fn from_snapshot(cart: &PersistedCart) -> Self {
        Self {
            version: cart.version,
            writer: cart.writer,
            item_count: cart
                .lines
                .iter()
                .fold(0u32, |acc, line| acc.saturating_add(line.quantity)),
        }
    }
}

/// Durable storage for the cart.
pub trait CartRepository: Send + Sync {
    /// Load the stored cart, or `None` if nothing usable is stored.
    ///
    /// # Errors
    ///
    /// Returns error if the storage cannot be read.
    fn load(&self) -> Result<Option<PersistedCart>, CartStoreError>;

    /// Replace the stored cart and notify subscribers.
    ///
    /// # Errors
    ///
    /// Returns error if the storage cannot be written.
    fn save(&self, cart: &PersistedCart) -> Result<(), CartStoreError>;

    /// Receive a notification after every successful save.
    fn subscribe(&self) -> broadcast::Receiver<CartChanged>;
}

/// Push a notification; having no subscribers is fine.
fn notify(sender: &broadcast::Sender<CartChanged>, cart: &PersistedCart) {
    let _ = sender.send(CartChanged::from_snapshot(cart));
}

// =============================================================================
// In-memory
// =============================================================================

/// Cart repository that keeps the snapshot in memory.
///
/// Several cart stores sharing one `Arc<MemoryCartRepository>` behave like
/// several tabs sharing browser storage.
pub struct MemoryCartRepository {
    stored: Mutex<Option<PersistedCart>>,
    sender: broadcast::Sender<CartChanged>,
}

impl MemoryCartRepository {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            stored: Mutex::new(None),
            sender,
        }
    }
}

impl Default for MemoryCartRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl CartRepository for MemoryCartRepository {
    fn load(&self) -> Result<Option<PersistedCart>, CartStoreError> {
        Ok(self
            .stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, cart: &PersistedCart) -> Result<(), CartStoreError> {
        *self.stored.lock().unwrap_or_else(PoisonError::into_inner) = Some(cart.clone());
        notify(&self.sender, cart);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<CartChanged> {
        self.sender.subscribe()
    }
}

// =============================================================================
// JSON file
// =============================================================================

/// Cart repository backed by `cart.json` in the data directory.
///
/// Saves write a temporary file and rename it over the old one, so a reader
/// never sees a half-written cart.
pub struct JsonFileCartRepository {
    path: PathBuf,
    sender: broadcast::Sender<CartChanged>,
}

impl JsonFileCartRepository {
    /// Repository storing `cart.json` inside `data_dir`.
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        let (sender, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            path: data_dir.join(CART_FILE),
            sender,
        }
    }

    /// Location of the cart file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartRepository for JsonFileCartRepository {
    fn load(&self) -> Result<Option<PersistedCart>, CartStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&raw) {
            Ok(cart) => Ok(Some(cart)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Discarding unreadable cart"
                );
                Ok(None)
            }
        }
    }

    fn save(&self, cart: &PersistedCart) -> Result<(), CartStoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(cart)?)?;
        fs::rename(&tmp, &self.path)?;

        notify(&self.sender, cart);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<CartChanged> {
        self.sender.subscribe()
    }
}
