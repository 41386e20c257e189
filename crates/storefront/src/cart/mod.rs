//! Client-held shopping cart.
//!
//! The cart is a list of [`CartLine`]s keyed by product id. Adding a product
//! that is already in the cart merges into its line; a line never sits at
//! quantity zero. Prices are snapshotted when a product is first added and are
//! not refreshed afterwards.
//!
//! Every mutation that changes the cart saves the whole collection through the
//! [`CartRepository`] and notifies subscribers. Operations that would not
//! change anything (zero quantity, unknown id, negative quantity) are silent
//! no-ops and return `Ok(false)`.

pub mod repository;

use std::sync::Arc;

use chrono::Utc;
use javacafe_core::{Price, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::api::MenuProduct;

pub use repository::{
    CartChanged, CartRepository, JsonFileCartRepository, MemoryCartRepository, PersistedCart,
};

/// Errors from persisting the cart.
#[derive(Debug, Error)]
pub enum CartStoreError {
    /// Reading or writing the storage failed.
    #[error("cart storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The cart could not be serialized.
    #[error("cart serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One product in the cart with its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    /// Display name captured when the product was added.
    pub name: String,
    /// Unit price captured when the product was added.
    pub unit_price: Price,
    /// Always at least 1.
    pub quantity: u32,
}

impl CartLine {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// The shopping cart and its persistence.
pub struct CartStore {
    lines: Vec<CartLine>,
    repository: Arc<dyn CartRepository>,
    writer: Uuid,
    version: u64,
    /// The last save failed; the stored cart is behind `lines`.
    unsaved: bool,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &self.lines)
            .field("writer", &self.writer)
            .field("version", &self.version)
            .field("unsaved", &self.unsaved)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Open the cart stored in `repository`, or an empty one.
    ///
    /// # Errors
    ///
    /// Returns error if the repository cannot be read.
    pub fn open(repository: Arc<dyn CartRepository>) -> Result<Self, CartStoreError> {
        let stored = repository.load()?;
        let (lines, version) = stored.map_or_else(|| (Vec::new(), 0), |c| (c.lines, c.version));

        tracing::debug!(lines = lines.len(), version, "Cart loaded");

        Ok(Self {
            lines: normalize(lines),
            repository,
            writer: Uuid::new_v4(),
            version,
            unsaved: false,
        })
    }

    /// A cart that is only kept in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            lines: Vec::new(),
            repository: Arc::new(MemoryCartRepository::new()),
            writer: Uuid::new_v4(),
            version: 0,
            unsaved: false,
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lines in the order they were first added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `id`, if any.
    #[must_use]
    pub fn line(&self, id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// `Σ unit_price × quantity`, recomputed on every call.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Version of the last snapshot this store wrote or loaded.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Identity of this store in persisted snapshots.
    #[must_use]
    pub const fn writer(&self) -> Uuid {
        self.writer
    }

    /// Whether the last save failed, leaving storage behind this cart.
    #[must_use]
    pub const fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Receive a notification after every save by any store sharing the repository.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartChanged> {
        self.repository.subscribe()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` of `product`, merging into an existing line.
    ///
    /// No-op if `quantity` is zero or the product has no id.
    ///
    /// # Errors
    ///
    /// Returns error if the cart could not be saved; the in-memory cart keeps
    /// the change.
    pub fn add_item(&mut self, product: &MenuProduct, quantity: u32) -> Result<bool, CartStoreError> {
        if quantity == 0 {
            return Ok(false);
        }
        let Some(product_id) = product.product_id else {
            return Ok(false);
        };

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.lines.push(CartLine {
                product_id,
                name: product.name.clone(),
                unit_price: product.base_price,
                quantity,
            });
        }

        tracing::debug!(%product_id, quantity, "Added to cart");
        self.commit().map(|()| true)
    }

    /// Replace the quantity of a line; `0` removes it.
    ///
    /// No-op if `quantity` is negative or `id` is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns error if the cart could not be saved.
    pub fn set_quantity(&mut self, id: ProductId, quantity: i64) -> Result<bool, CartStoreError> {
        if quantity < 0 {
            return Ok(false);
        }
        if quantity == 0 {
            return self.remove_item(id);
        }

        let Some(line) = self.lines.iter_mut().find(|l| l.product_id == id) else {
            return Ok(false);
        };
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if line.quantity == quantity {
            return Ok(false);
        }
        line.quantity = quantity;

        self.commit().map(|()| true)
    }

    /// Change a line's quantity by `delta`, removing it when it reaches zero.
    ///
    /// # Errors
    ///
    /// Returns error if the cart could not be saved.
    pub fn adjust_quantity(&mut self, id: ProductId, delta: i64) -> Result<bool, CartStoreError> {
        let Some(line) = self.line(id) else {
            return Ok(false);
        };
        let target = i64::from(line.quantity).saturating_add(delta).max(0);
        self.set_quantity(id, target)
    }

    /// Remove the line for `id` if present.
    ///
    /// # Errors
    ///
    /// Returns error if the cart could not be saved.
    pub fn remove_item(&mut self, id: ProductId) -> Result<bool, CartStoreError> {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != id);
        if self.lines.len() == before {
            return Ok(false);
        }

        tracing::debug!(product_id = %id, "Removed from cart");
        self.commit().map(|()| true)
    }

    /// Empty the cart.
    ///
    /// An already empty cart is saved again if its last save failed.
    ///
    /// # Errors
    ///
    /// Returns error if the cart could not be saved.
    pub fn clear(&mut self) -> Result<bool, CartStoreError> {
        if self.lines.is_empty() && !self.unsaved {
            return Ok(false);
        }
        self.lines.clear();

        tracing::debug!("Cart cleared");
        self.commit().map(|()| true)
    }

    /// Pick up a newer snapshot written by another store.
    ///
    /// Returns `true` if the local lines were replaced.
    ///
    /// # Errors
    ///
    /// Returns error if the repository cannot be read.
    pub fn sync(&mut self) -> Result<bool, CartStoreError> {
        match self.repository.load()? {
            Some(stored) if stored.version > self.version => {
                tracing::debug!(
                    from = self.version,
                    to = stored.version,
                    writer = %stored.writer,
                    "Cart changed elsewhere, reloading"
                );
                self.version = stored.version;
                self.lines = normalize(stored.lines);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Save the full collection as the next version.
    fn commit(&mut self) -> Result<(), CartStoreError> {
        let stored_version = match self.repository.load() {
            Ok(stored) => stored.map_or(0, |c| c.version),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read stored cart version");
                0
            }
        };
        let version = self.version.max(stored_version) + 1;

        let snapshot = PersistedCart {
            version,
            updated_at: Utc::now(),
            writer: self.writer,
            lines: self.lines.clone(),
        };

        if let Err(e) = self.repository.save(&snapshot) {
            tracing::error!(error = %e, "Failed to save cart");
            self.unsaved = true;
            return Err(e);
        }
        self.version = version;
        self.unsaved = false;
        Ok(())
    }
}

/// Enforce the line invariants on data read from storage: no zero
/// quantities and one line per product.
fn normalize(lines: Vec<CartLine>) -> Vec<CartLine> {
    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines.into_iter().filter(|l| l.quantity > 0) {
        if let Some(existing) = merged.iter_mut().find(|m| m.product_id == line.product_id) {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            merged.push(line);
        }
    }
    merged
}
