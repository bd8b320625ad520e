//! Cart returned by the storefront at the end of a PunchOut session.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors found when validating a [`CartReturn`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// A line item has a quantity of zero.
    #[error("item {item_id} must have a positive quantity")]
    ZeroQuantity {
        /// Offending item.
        item_id: String,
    },
    /// A line item has a negative unit price.
    #[error("item {item_id} has a negative unit price")]
    NegativePrice {
        /// Offending item.
        item_id: String,
    },
    /// The cart has nowhere to be posted back to.
    #[error("browser_form_post_url cannot be empty")]
    MissingReturnUrl,
    /// The cart total does not fit in a decimal.
    #[error("cart total is out of range")]
    TotalOutOfRange,
}

/// One line of a returned cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Supplier part ID.
    pub id: String,
    /// Product title.
    pub title: String,
    /// Number of units, at least 1.
    pub quantity: u32,
    /// Price of one unit.
    pub unit_price: Decimal,
    /// Currency of `unit_price` as reported by the storefront.
    pub currency_code: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

impl CartLineItem {
    /// `quantity × unit_price`, or `None` on overflow.
    #[must_use]
    pub fn checked_line_total(&self) -> Option<Decimal> {
        Decimal::from(self.quantity).checked_mul(self.unit_price)
    }
}

/// A cart handed back by the storefront for delivery to the buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartReturn {
    /// Session the cart belongs to.
    pub session_id: String,
    /// Buyer endpoint that receives the order message.
    pub browser_form_post_url: String,
    /// Cookie from the setup request, echoed back verbatim.
    pub buyer_cookie: String,
    /// Currency of the whole order.
    pub currency: String,
    /// Line items in the order the buyer added them.
    #[serde(default)]
    pub items: Vec<CartLineItem>,
}

impl CartReturn {
    /// Check the cart before it is translated.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: an empty return URL, a zero quantity,
    /// a negative price, or a total too large to represent.
    pub fn validate(&self) -> Result<(), CartError> {
        if self.browser_form_post_url.trim().is_empty() {
            return Err(CartError::MissingReturnUrl);
        }

        for item in &self.items {
            if item.quantity == 0 {
                return Err(CartError::ZeroQuantity {
                    item_id: item.id.clone(),
                });
            }
            if item.unit_price < Decimal::ZERO {
                return Err(CartError::NegativePrice {
                    item_id: item.id.clone(),
                });
            }
        }

        self.checked_total()
            .map(|_| ())
            .ok_or(CartError::TotalOutOfRange)
    }

    /// Sum of all line totals, or `None` on overflow.
    #[must_use]
    pub fn checked_total(&self) -> Option<Decimal> {
        self.items.iter().try_fold(Decimal::ZERO, |acc, item| {
            acc.checked_add(item.checked_line_total()?)
        })
    }
}
