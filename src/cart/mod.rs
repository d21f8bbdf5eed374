//! Client-side quote cart.
//!
//! [`QuoteCart`] stages prospective quote lines before submission. It works
//! without authentication and is written through to a [`CartStore`] after
//! every mutation. Persistence is best effort: failures are logged and the
//! cart carries on in memory. Concurrent writers to the same store follow
//! last-write-wins.

mod client;
mod notify;
mod store;

pub use client::{HttpQuoteClient, QuoteSubmitter, SubmitError};
pub use notify::{LogNotifier, Notice, NoticeKind, Notifier};
pub use store::{
    decode_cart, encode_cart, CartStore, CartStoreError, FileCartStore, MemoryCartStore,
    CART_FORMAT_VERSION, CART_STORAGE_KEY,
};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    entities::{Inquiry, InquiryType, Product, Quote},
    models::{CreateQuoteRequest, NewInquiry, NewQuoteItem},
};

/// One product and how many of it the customer wants priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub product: Product,
    pub quantity: i32,
}

/// Contact details for submitting a cart through the inquiry form.
#[derive(Debug, Clone, Default)]
pub struct QuoteContact {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub notes: Option<String>,
}

pub struct QuoteCart {
    lines: Vec<QuoteLine>,
    store: Arc<dyn CartStore>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for QuoteCart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteCart")
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

impl QuoteCart {
    /// Rehydrates the cart from `store`. A missing, unreadable or malformed
    /// payload yields an empty cart; the cause is logged, never returned.
    pub fn load(store: Arc<dyn CartStore>, notifier: Arc<dyn Notifier>) -> Self {
        let lines = match Self::read_persisted(store.as_ref()) {
            Ok(lines) => lines,
            Err(e) => {
                warn!(error = %e, "failed to restore quote cart; starting empty");
                Vec::new()
            }
        };
        Self {
            lines,
            store,
            notifier,
        }
    }

    fn read_persisted(store: &dyn CartStore) -> Result<Vec<QuoteLine>, CartStoreError> {
        let Some(raw) = store.load(CART_STORAGE_KEY)? else {
            return Ok(Vec::new());
        };
        let decoded = decode_cart(&raw)?;
        let stored = decoded.len();

        let mut lines: Vec<QuoteLine> = Vec::with_capacity(stored);
        let mut dropped = 0usize;
        let mut merged = 0usize;
        for line in decoded {
            if line.quantity < 1 {
                dropped += 1;
                continue;
            }
            match lines.iter_mut().find(|l| l.product.id == line.product.id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                    merged += 1;
                }
                None => lines.push(line),
            }
        }

        if dropped > 0 {
            warn!(dropped, "dropped stored quote lines with invalid quantity");
        }
        if merged > 0 {
            warn!(merged, "merged stored quote lines sharing a product");
        }
        Ok(lines)
    }

    pub fn items(&self) -> &[QuoteLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines. Derived on every call.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|line| i64::from(line.quantity)).sum()
    }

    pub fn quantity_of(&self, product_id: i32) -> Option<i32> {
        self.lines
            .iter()
            .find(|line| line.product.id == product_id)
            .map(|line| line.quantity)
    }

    /// Adds `quantity` units of `product`, merging into an existing line for
    /// the same product. Quantities below 1 are ignored.
    pub fn add_to_quote(&mut self, product: &Product, quantity: i32) {
        if quantity < 1 {
            debug!(product_id = product.id, quantity, "ignoring non-positive add");
            return;
        }

        match self
            .lines
            .iter_mut()
            .find(|line| line.product.id == product.id)
        {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(QuoteLine {
                product: product.clone(),
                quantity,
            }),
        }

        self.notifier.notify(Notice::success(
            "Added to Quote",
            format!("{}x {} added to your quote list.", quantity, product.name),
        ));
        self.persist();
    }

    /// Drops the line for `product_id`. Absent products are a no-op.
    pub fn remove_from_quote(&mut self, product_id: i32) {
        self.lines.retain(|line| line.product.id != product_id);
        self.persist();
    }

    /// Sets the quantity of an existing line. Values below 1 leave the line
    /// unchanged; use [`QuoteCart::remove_from_quote`] to drop it.
    pub fn update_quantity(&mut self, product_id: i32, quantity: i32) {
        if quantity < 1 {
            return;
        }
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.product.id == product_id)
        {
            line.quantity = quantity;
        }
        self.persist();
    }

    pub fn clear_quote(&mut self) {
        self.lines.clear();
        self.persist();
    }

    /// The submission body for the current lines, in cart order.
    pub fn to_request(&self) -> CreateQuoteRequest {
        CreateQuoteRequest {
            items: self
                .lines
                .iter()
                .map(|line| NewQuoteItem::new(line.product.id, line.quantity))
                .collect(),
        }
    }

    /// Plain-text summary used when the cart goes out as an inquiry.
    pub fn inquiry_message(&self, notes: Option<&str>) -> String {
        let lines = self
            .lines
            .iter()
            .map(|line| format!("- {} (Qty: {})", line.product.name, line.quantity))
            .collect::<Vec<_>>()
            .join("\n");
        let notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("None");
        format!(
            "Quote Request:\n\n{}\n\nAdditional Notes:\n{}",
            lines, notes
        )
    }

    /// Submits the cart as a quote. The cart is cleared only once the server
    /// has accepted it; on any error it is left untouched for a retry.
    pub async fn submit(&mut self, submitter: &dyn QuoteSubmitter) -> Result<Quote, SubmitError> {
        self.ensure_not_empty()?;
        match submitter.submit_quote(&self.to_request()).await {
            Ok(quote) => {
                self.notify_sent();
                self.clear_quote();
                Ok(quote)
            }
            Err(err) => Err(self.notify_failed(err)),
        }
    }

    /// Submits the cart through the public inquiry form, for callers that
    /// cannot authenticate. Same clearing rules as [`QuoteCart::submit`].
    pub async fn submit_as_inquiry(
        &mut self,
        contact: QuoteContact,
        submitter: &dyn QuoteSubmitter,
    ) -> Result<Inquiry, SubmitError> {
        self.ensure_not_empty()?;
        let inquiry = NewInquiry {
            message: self.inquiry_message(contact.notes.as_deref()),
            name: contact.name,
            email: contact.email,
            company: contact.company,
            inquiry_type: InquiryType::SolutionRequest,
        };
        match submitter.submit_inquiry(&inquiry).await {
            Ok(created) => {
                self.notify_sent();
                self.clear_quote();
                Ok(created)
            }
            Err(err) => Err(self.notify_failed(err)),
        }
    }

    fn ensure_not_empty(&self) -> Result<(), SubmitError> {
        if self.lines.is_empty() {
            self.notifier.notify(Notice::error(
                "Empty Quote",
                "Please add items to your quote first.",
            ));
            return Err(SubmitError::EmptyCart);
        }
        Ok(())
    }

    fn notify_sent(&self) {
        self.notifier.notify(Notice::success(
            "Quote Request Sent",
            "We'll get back to you shortly.",
        ));
    }

    fn notify_failed(&self, err: SubmitError) -> SubmitError {
        warn!(error = %err, "quote submission failed; cart kept");
        let message = match &err {
            SubmitError::Unauthorized => "Please sign in to submit your quote.",
            _ => "Something went wrong. Please try again.",
        };
        self.notifier.notify(Notice::error("Error", message));
        err
    }

    /// Writes the whole cart. Errors are logged and otherwise ignored.
    fn persist(&self) {
        if let Err(e) = self.try_persist() {
            warn!(error = %e, "failed to persist quote cart; continuing in memory");
        }
    }

    fn try_persist(&self) -> Result<(), CartStoreError> {
        let payload = encode_cart(&self.lines)?;
        self.store.save(CART_STORAGE_KEY, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier(Mutex<Vec<Notice>>);

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: Notice) {
            self.0.lock().unwrap().push(notice);
        }
    }

    fn product(id: i32, name: &str) -> Product {
        Product {
            id,
            name: name.to_string(),
            description: String::new(),
            price: None,
            category_id: None,
            image_url: format!("https://img.example/{}.jpg", id),
            gallery: None,
            specifications: None,
            is_customizable: false,
            material: None,
            seating_capacity: None,
            created_at: Utc::now(),
        }
    }

    fn cart() -> (QuoteCart, MemoryCartStore, Arc<RecordingNotifier>) {
        let store = MemoryCartStore::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let cart = QuoteCart::load(Arc::new(store.clone()), notifier.clone());
        (cart, store, notifier)
    }

    #[test]
    fn adding_same_product_merges_lines() {
        let (mut cart, _, _) = cart();
        cart.add_to_quote(&product(7, "Desk"), 2);
        cart.add_to_quote(&product(9, "Chair"), 1);
        cart.add_to_quote(&product(7, "Desk"), 3);

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].product.id, 7);
        assert_eq!(cart.items()[0].quantity, 5);
        assert_eq!(cart.items()[1].quantity, 1);
        assert_eq!(cart.item_count(), 6);
    }

    #[test]
    fn rehydrate_merges_duplicate_products() {
        let store = MemoryCartStore::new();
        let line = |id: i32, name: &str, quantity: i32| QuoteLine {
            product: product(id, name),
            quantity,
        };
        let raw = encode_cart(&[
            line(7, "Desk", 2),
            line(9, "Chair", 1),
            line(7, "Desk", 3),
            line(9, "Chair", i32::MAX),
        ])
        .unwrap();
        store.insert_raw(CART_STORAGE_KEY, &raw);

        let mut cart = QuoteCart::load(
            Arc::new(store.clone()),
            Arc::new(RecordingNotifier::default()),
        );
        let lines: Vec<(i32, i32)> = cart
            .items()
            .iter()
            .map(|l| (l.product.id, l.quantity))
            .collect();
        assert_eq!(lines, vec![(7, 5), (9, i32::MAX)]);

        cart.add_to_quote(&product(7, "Desk"), 1);
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.quantity_of(7), Some(6));
    }

    #[test]
    fn add_emits_confirmation() {
        let (mut cart, _, notifier) = cart();
        cart.add_to_quote(&product(1, "ErgoOne Task Chair"), 2);

        let notices = notifier.0.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "Added to Quote");
        assert_eq!(
            notices[0].message,
            "2x ErgoOne Task Chair added to your quote list."
        );
    }

    #[test]
    fn non_positive_add_is_ignored() {
        let (mut cart, _, notifier) = cart();
        cart.add_to_quote(&product(1, "Desk"), 0);
        cart.add_to_quote(&product(1, "Desk"), -3);
        assert!(cart.is_empty());
        assert!(notifier.0.lock().unwrap().is_empty());
    }

    #[test]
    fn update_below_one_is_a_no_op() {
        let (mut cart, _, _) = cart();
        cart.add_to_quote(&product(4, "Sofa"), 3);
        cart.update_quantity(4, 0);
        cart.update_quantity(4, -5);
        assert_eq!(cart.quantity_of(4), Some(3));

        cart.update_quantity(4, 8);
        assert_eq!(cart.quantity_of(4), Some(8));
        // Unknown product is ignored.
        cart.update_quantity(99, 2);
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn remove_and_clear() {
        let (mut cart, _, _) = cart();
        cart.add_to_quote(&product(1, "A"), 1);
        cart.add_to_quote(&product(2, "B"), 1);
        cart.remove_from_quote(1);
        cart.remove_from_quote(1);
        assert_eq!(cart.quantity_of(1), None);
        assert_eq!(cart.items().len(), 1);

        cart.clear_quote();
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn mutations_are_written_through() {
        let (mut cart, store, _) = cart();
        cart.add_to_quote(&product(3, "Cabinet"), 2);

        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
        let reloaded = QuoteCart::load(Arc::new(store.clone()), notifier);
        assert_eq!(reloaded.items(), cart.items());
    }

    #[test]
    fn malformed_payload_loads_empty() {
        let store = MemoryCartStore::new();
        store.insert_raw(CART_STORAGE_KEY, "{oops");
        let cart = QuoteCart::load(Arc::new(store), Arc::new(LogNotifier));
        assert!(cart.is_empty());
    }

    #[test]
    fn storage_failure_does_not_break_the_cart() {
        let (mut cart, store, _) = cart();
        store.set_unavailable(true);
        cart.add_to_quote(&product(1, "Desk"), 2);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn request_preserves_cart_order() {
        let (mut cart, _, _) = cart();
        cart.add_to_quote(&product(9, "B"), 1);
        cart.add_to_quote(&product(2, "A"), 4);
        let request = cart.to_request();
        assert_eq!(
            request.items,
            vec![NewQuoteItem::new(9, 1), NewQuoteItem::new(2, 4)]
        );
    }

    #[test]
    fn inquiry_message_lists_lines() {
        let (mut cart, _, _) = cart();
        cart.add_to_quote(&product(1, "Desk"), 2);
        cart.add_to_quote(&product(2, "Chair"), 6);
        assert_eq!(
            cart.inquiry_message(Some("  ")),
            "Quote Request:\n\n- Desk (Qty: 2)\n- Chair (Qty: 6)\n\nAdditional Notes:\nNone"
        );
    }
}
