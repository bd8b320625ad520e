//! Translates a returned storefront cart into a `PunchOutOrderMessage`.

use punchout_bridge_core::CartReturn;
use punchout_bridge_core::money::round_money;
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::config::DocumentConfig;
use crate::cxml::{OrderMessage, PayloadEnvelope, render_order_message};

/// A rendered order message and where to deliver it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReturnDocument {
    /// The `PunchOutOrderMessage` document.
    pub cxml: String,
    /// Buyer endpoint the browser posts `cxml` to.
    pub redirect_url: String,
    /// Order total, rounded to two places.
    pub total: Decimal,
    /// `payloadID` of the rendered document.
    pub payload_id: String,
}

pub struct OrderReturnTranslator {
    documents: DocumentConfig,
}

impl OrderReturnTranslator {
    pub const fn new(documents: DocumentConfig) -> Self {
        Self { documents }
    }

    /// Render the order message for `cart`.
    ///
    /// The cart is expected to have passed [`CartReturn::validate`]; an
    /// unvalidated cart still renders, with the total saturating instead of
    /// overflowing.
    #[instrument(skip_all, fields(session_id = %cart.session_id, items = cart.items.len()))]
    pub fn translate(&self, cart: &CartReturn) -> OrderReturnDocument {
        self.translate_with(cart, &PayloadEnvelope::new(&self.documents.payload_domain))
    }

    /// [`translate`](Self::translate) with an explicit document envelope.
    pub fn translate_with(&self, cart: &CartReturn, envelope: &PayloadEnvelope) -> OrderReturnDocument {
        let total = round_money(order_total(cart));
        let currency = match cart.currency.trim() {
            "" => self.documents.default_currency.as_str(),
            currency => currency,
        };

        let cxml = render_order_message(&OrderMessage {
            envelope,
            supplier_identity: &self.documents.supplier_identity,
            buyer_network_identity: &self.documents.buyer_network_identity,
            buyer_cookie: &cart.buyer_cookie,
            currency,
            total,
            items: &cart.items,
        });

        debug!(payload_id = %envelope.payload_id, %total, currency, "Rendered PunchOutOrderMessage");

        OrderReturnDocument {
            cxml,
            redirect_url: cart.browser_form_post_url.clone(),
            total,
            payload_id: envelope.payload_id.clone(),
        }
    }
}

fn order_total(cart: &CartReturn) -> Decimal {
    cart.items.iter().fold(Decimal::ZERO, |acc, item| {
        acc.saturating_add(Decimal::from(item.quantity).saturating_mul(item.unit_price))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use punchout_bridge_core::CartLineItem;

    use super::*;

    fn item(id: &str, quantity: u32, unit_price: Decimal) -> CartLineItem {
        CartLineItem {
            id: id.to_string(),
            title: format!("Item {id}"),
            quantity,
            unit_price,
            currency_code: "USD".to_string(),
            description: String::new(),
        }
    }

    fn cart(currency: &str, items: Vec<CartLineItem>) -> CartReturn {
        CartReturn {
            session_id: "s-1".to_string(),
            browser_form_post_url: "https://buyer.example/return".to_string(),
            buyer_cookie: "cookie-123".to_string(),
            currency: currency.to_string(),
            items,
        }
    }

    fn translator() -> OrderReturnTranslator {
        OrderReturnTranslator::new(DocumentConfig::default())
    }

    #[test]
    fn test_total_and_redirect() {
        let cart = cart(
            "USD",
            vec![item("A", 2, Decimal::new(2500, 2)), item("B", 1, Decimal::new(10, 0))],
        );

        let document = translator().translate(&cart);

        assert_eq!(document.total, Decimal::new(60, 0));
        assert_eq!(document.redirect_url, "https://buyer.example/return");
        assert!(document.cxml.contains(r#"<Money currency="USD">60.00</Money>"#));
        assert!(document.cxml.contains("<BuyerCookie>cookie-123</BuyerCookie>"));
        assert!(document.payload_id.ends_with("@punchout-bridge"));
    }

    #[test]
    fn test_total_rounds_to_cents() {
        let cart = cart("EUR", vec![item("A", 3, Decimal::new(3333, 3))]);

        let document = translator().translate(&cart);

        assert_eq!(document.total, Decimal::new(1000, 2));
        assert!(document.cxml.contains(r#"<Money currency="EUR">10.00</Money>"#));
    }

    #[test]
    fn test_blank_currency_uses_default() {
        let document = translator().translate(&cart("  ", vec![item("A", 1, Decimal::ONE)]));
        assert!(document.cxml.contains(r#"<Money currency="USD">1.00</Money>"#));
    }

    #[test]
    fn test_empty_cart() {
        let document = translator().translate(&cart("USD", vec![]));
        assert_eq!(document.total, Decimal::ZERO);
        assert!(!document.cxml.contains("<ItemIn"));
    }

    #[test]
    fn test_configured_identities() {
        let translator = OrderReturnTranslator::new(DocumentConfig {
            supplier_identity: "AcmeSupply".to_string(),
            buyer_network_identity: "AribaNetwork".to_string(),
            ..DocumentConfig::default()
        });
        let envelope = PayloadEnvelope::at(
            Utc.with_ymd_and_hms(2026, 2, 24, 12, 0, 0).unwrap(),
            "bridge.example",
        );

        let document = translator.translate_with(&cart("USD", vec![]), &envelope);

        assert_eq!(document.payload_id, envelope.payload_id);
        assert!(document.cxml.contains("<Identity>AcmeSupply</Identity>"));
        assert!(document.cxml.contains("<Identity>AribaNetwork</Identity>"));
        assert!(document.cxml.contains(r#"timestamp="2026-02-24T12:00:00Z""#));
    }

    #[test]
    fn test_overflow_saturates() {
        let cart = cart("USD", vec![item("A", u32::MAX, Decimal::MAX), item("B", 1, Decimal::MAX)]);
        let document = translator().translate(&cart);
        assert_eq!(document.total, round_money(Decimal::MAX));
    }
}
