//! cXML response and message rendering.

use std::borrow::Cow;
use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};
use punchout_bridge_core::CartLineItem;
use punchout_bridge_core::money::format_fixed;
use quick_xml::escape::escape;
use rust_decimal::Decimal;
use uuid::Uuid;

/// DOCTYPE declared by every rendered document.
pub const CXML_DOCTYPE: &str =
    r#"<!DOCTYPE cXML SYSTEM "http://xml.cxml.org/schemas/cXML/1.2.038/cXML.dtd">"#;

/// Unit of measure stamped on every item.
const UNIT_OF_MEASURE: &str = "EA";

/// UNSPSC placeholder classification stamped on every item.
const UNSPSC_PLACEHOLDER: &str = "00000000";

/// `payloadID` and `timestamp` attributes of a `cXML` root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEnvelope {
    /// Globally unique document ID, `<millis>.<uuid>@<domain>`.
    pub payload_id: String,
    /// Document creation time.
    pub timestamp: DateTime<Utc>,
}

impl PayloadEnvelope {
    /// Envelope for a document created now.
    #[must_use]
    pub fn new(domain: &str) -> Self {
        Self::at(Utc::now(), domain)
    }

    /// Envelope for a document created at `timestamp`.
    #[must_use]
    pub fn at(timestamp: DateTime<Utc>, domain: &str) -> Self {
        Self {
            payload_id: format!(
                "{}.{}@{}",
                timestamp.timestamp_millis(),
                Uuid::new_v4().simple(),
                domain
            ),
            timestamp,
        }
    }

    fn open_tag(&self) -> String {
        format!(
            r#"<cXML payloadID="{}" timestamp="{}" xml:lang="en-US">"#,
            esc(&self.payload_id),
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}

/// Render a `PunchOutSetupResponse` that sends the buyer to `start_page`.
#[must_use]
pub fn render_setup_response(envelope: &PayloadEnvelope, start_page: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
{CXML_DOCTYPE}
{open}
  <Response>
    <Status code="200" text="OK"/>
    <PunchOutSetupResponse>
      <StartPage>
        <URL>{url}</URL>
      </StartPage>
    </PunchOutSetupResponse>
  </Response>
</cXML>
"#,
        open = envelope.open_tag(),
        url = esc(start_page),
    )
}

/// Everything needed to render a `PunchOutOrderMessage`.
#[derive(Debug, Clone, Copy)]
pub struct OrderMessage<'a> {
    /// Document identity.
    pub envelope: &'a PayloadEnvelope,
    /// Supplier identity for `From` and `Sender`.
    pub supplier_identity: &'a str,
    /// Buyer network identity for `To`.
    pub buyer_network_identity: &'a str,
    /// Cookie from the setup request.
    pub buyer_cookie: &'a str,
    /// Currency of every amount in the message.
    pub currency: &'a str,
    /// Order total.
    pub total: Decimal,
    /// Line items, rendered in order.
    pub items: &'a [CartLineItem],
}

/// Render a `PunchOutOrderMessage` carrying the returned cart.
#[must_use]
pub fn render_order_message(message: &OrderMessage<'_>) -> String {
    let currency = esc(message.currency);
    let supplier = esc(message.supplier_identity);

    let mut items = String::new();
    for item in message.items {
        let description = if item.description.trim().is_empty() {
            item.title.as_str()
        } else {
            item.description.as_str()
        };

        // Writing into a String cannot fail.
        let _ = write!(
            items,
            r#"
      <ItemIn quantity="{quantity}">
        <ItemID>
          <SupplierPartID>{id}</SupplierPartID>
        </ItemID>
        <ItemDetail>
          <UnitPrice>
            <Money currency="{currency}">{price}</Money>
          </UnitPrice>
          <Description xml:lang="en"><ShortName>{title}</ShortName>{description}</Description>
          <UnitOfMeasure>{UNIT_OF_MEASURE}</UnitOfMeasure>
          <Classification domain="UNSPSC">{UNSPSC_PLACEHOLDER}</Classification>
        </ItemDetail>
      </ItemIn>"#,
            quantity = item.quantity,
            id = esc(&item.id),
            price = format_fixed(item.unit_price),
            title = esc(&item.title),
            description = esc(description),
        );
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
{CXML_DOCTYPE}
{open}
  <Header>
    <From><Credential domain="NetworkId"><Identity>{supplier}</Identity></Credential></From>
    <To><Credential domain="NetworkId"><Identity>{buyer_network}</Identity></Credential></To>
    <Sender><Credential domain="NetworkId"><Identity>{supplier}</Identity></Credential></Sender>
  </Header>
  <Message>
    <PunchOutOrderMessage>
      <BuyerCookie>{buyer_cookie}</BuyerCookie>
      <PunchOutOrderMessageHeader operationAllowed="edit">
        <Total>
          <Money currency="{currency}">{total}</Money>
        </Total>
      </PunchOutOrderMessageHeader>{items}
    </PunchOutOrderMessage>
  </Message>
</cXML>
"#,
        open = message.envelope.open_tag(),
        buyer_network = esc(message.buyer_network_identity),
        buyer_cookie = esc(message.buyer_cookie),
        total = format_fixed(message.total),
    )
}

fn esc(raw: &str) -> Cow<'_, str> {
    escape(raw)
}
