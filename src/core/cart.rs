//! Cart aggregation - The active session's dish selections.
//!
//! A cart keeps at most one line per dish id, in the order dishes were first
//! added. Totals are computed from the lines on every call and never stored.
//! No cart operation fails: quantities are validated by the caller, and a
//! quantity that drops to zero or below removes the line.

use crate::core::catalog::Dish;
use serde::{Deserialize, Serialize};

/// One distinct dish and how many of it the customer wants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// The dish as it was when added
    pub dish: Dish,
    /// Requested quantity, always at least 1
    pub quantity: u32,
}

impl CartLine {
    /// Price of this line: quantity times unit price.
    #[must_use]
    pub fn subtotal(&self) -> i64 {
        i64::from(self.quantity) * self.dish.price
    }
}

/// The selections of one browsing session.
///
/// Serializes as its list of lines; the "open for viewing" flag is a
/// presentation signal and is not persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
    #[serde(skip)]
    open: bool,
}

impl Cart {
    /// Creates an empty cart
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` of `dish`, merging into an existing line for the same id.
    ///
    /// Also opens the cart view.
    pub fn add_item(&mut self, dish: &Dish, quantity: u32) {
        if quantity > 0 {
            match self.lines.iter_mut().find(|line| line.dish.id == dish.id) {
                Some(line) => line.quantity = line.quantity.saturating_add(quantity),
                None => self.lines.push(CartLine {
                    dish: dish.clone(),
                    quantity,
                }),
            }
        }
        self.open = true;
    }

    /// Removes the line for `dish_id`; does nothing if there is none.
    pub fn remove_item(&mut self, dish_id: &str) {
        self.lines.retain(|line| line.dish.id != dish_id);
    }

    /// Replaces the quantity of a line; `new_quantity <= 0` removes it.
    ///
    /// Unknown ids are ignored.
    pub fn update_quantity(&mut self, dish_id: &str, new_quantity: i64) {
        if new_quantity <= 0 {
            self.remove_item(dish_id);
            return;
        }
        let quantity = u32::try_from(new_quantity).unwrap_or(u32::MAX);
        if let Some(line) = self.lines.iter_mut().find(|line| line.dish.id == dish_id) {
            line.quantity = quantity;
        }
    }

    /// Removes every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines in insertion order
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `dish_id`, if present
    #[must_use]
    pub fn line(&self, dish_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.dish.id == dish_id)
    }

    /// Number of distinct dishes
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of `quantity × unit price` over all lines.
    #[must_use]
    pub fn total_price(&self) -> i64 {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Whether the cart view is open
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Opens or closes the cart view.
    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }
}
