//! Checkout workflow: cart to order, then loyalty points.
//!
//! # Phases
//!
//! `Idle -> Validating -> Submitting -> Awarding -> Idle`
//!
//! - **Validating**: a signed-in profile and a non-empty cart are required.
//!   Nothing remote happens before both checks pass.
//! - **Submitting**: the cart is snapshotted once into order items and the
//!   order is written. A failed write leaves the cart as it was.
//! - **Awarding**: `floor(total / 10)` points are added to the balance the
//!   session holds. Award failures are logged and reported in the receipt;
//!   the order already exists and is not rolled back.
//!
//! The cart is cleared only after the order is written.
//!
//! # Points award is not atomic with the order
//!
//! Order write and balance update are two separate store calls. Each attempt
//! carries a fresh [`CheckoutKey`] that is stored on the order and logged with
//! any award failure, so owed points can be reconciled later.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use cafe_core::{
    Cart, CheckoutKey, Identity, Money, NewOrder, NewPointsEntry, OrderId, OrderStatus,
    PaymentMethod, UserProfile,
};

use super::loyalty::points_for;
use super::session::Session;
use crate::store::{OrderStore, PointsLedger, UserDirectory};

/// Errors that end a checkout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// No signed-in user.
    #[error("sign in to place an order")]
    NotAuthenticated,

    /// Cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// Table order without a customer name.
    #[error("customer name is required")]
    MissingCustomerName,

    /// Table order without a table.
    #[error("table is required")]
    MissingTable,

    /// The order store rejected or failed the write. The cart is unchanged.
    #[error("order could not be placed")]
    SubmissionFailed,
}

/// Where a checkout currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Awarding,
}

/// Customer choices for a checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

/// Staff-entered details for a table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableTicket {
    pub customer_name: String,
    pub table: String,
    pub notes: Option<String>,
}

/// What happened to the points after the order was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwardOutcome {
    /// Balance updated to `balance`.
    Credited { balance: u32 },
    /// Nothing to award.
    Skipped,
    /// Balance update failed; the order stands.
    Failed,
}

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReceipt {
    pub order_id: OrderId,
    pub total: Money,
    pub points_earned: u32,
    pub award: AwardOutcome,
    pub checkout_key: CheckoutKey,
}

/// Resets the phase to `Idle` however the workflow exits.
struct PhaseGuard<'a>(&'a watch::Sender<CheckoutPhase>);

impl PhaseGuard<'_> {
    fn advance(&self, phase: CheckoutPhase) {
        self.0.send_replace(phase);
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(CheckoutPhase::Idle);
    }
}

/// The checkout workflow.
///
/// Not re-entrant: callers serialize checkouts for a session. The cart is
/// borrowed mutably for the whole call, so it cannot change mid-flight.
pub struct Checkout {
    orders: Arc<dyn OrderStore>,
    users: Arc<dyn UserDirectory>,
    ledger: Arc<dyn PointsLedger>,
    session: Session,
    phase: watch::Sender<CheckoutPhase>,
}

impl std::fmt::Debug for Checkout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checkout")
            .field("phase", &*self.phase.borrow())
            .finish_non_exhaustive()
    }
}

impl Checkout {
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        users: Arc<dyn UserDirectory>,
        ledger: Arc<dyn PointsLedger>,
        session: Session,
    ) -> Self {
        let (phase, _) = watch::channel(CheckoutPhase::Idle);
        Self {
            orders,
            users,
            ledger,
            session,
            phase,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> CheckoutPhase {
        *self.phase.borrow()
    }

    /// Observe phase changes.
    #[must_use]
    pub fn watch_phase(&self) -> watch::Receiver<CheckoutPhase> {
        self.phase.subscribe()
    }

    /// Place the signed-in customer's order and award points.
    ///
    /// # Errors
    ///
    /// - `CheckoutError::NotAuthenticated` if nobody is signed in
    /// - `CheckoutError::EmptyCart` if the cart has no lines
    /// - `CheckoutError::SubmissionFailed` if the order write fails
    ///
    /// On any error the cart is unchanged.
    #[instrument(skip_all, fields(checkout_key))]
    pub async fn checkout(
        &self,
        cart: &mut Cart,
        request: CheckoutRequest,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let phase = PhaseGuard(&self.phase);
        phase.advance(CheckoutPhase::Validating);

        let profile = self
            .session
            .current()
            .ok_or(CheckoutError::NotAuthenticated)?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let checkout_key = CheckoutKey::generate();
        tracing::Span::current().record("checkout_key", tracing::field::display(checkout_key));

        let items = cart.to_order_items();
        let total: Money = items.iter().map(|item| item.subtotal).sum();
        let order = NewOrder {
            user_id: profile.id.clone(),
            user_name: profile.name.clone(),
            user_email: profile.email.to_string(),
            table: None,
            items,
            total,
            status: OrderStatus::Pending,
            payment_method: request.payment_method,
            notes: non_blank(request.notes),
            checkout_key,
        };

        phase.advance(CheckoutPhase::Submitting);
        let order_id = self.submit(&order).await?;

        phase.advance(CheckoutPhase::Awarding);
        let points_earned = points_for(total);
        let award = self.award(&profile, points_earned, &order_id).await;

        cart.clear();
        info!(
            order_id = %order_id,
            user_id = %profile.id,
            total = %total,
            points_earned,
            "Order placed"
        );

        Ok(CheckoutReceipt {
            order_id,
            total,
            points_earned,
            award,
            checkout_key,
        })
    }

    /// Place an order for a table on behalf of a walk-in customer.
    ///
    /// The staff member owns the order; the customer name is shown on it.
    /// No points are awarded.
    ///
    /// # Errors
    ///
    /// - `CheckoutError::NotAuthenticated` if no staff identity is given
    /// - `CheckoutError::EmptyCart` if the cart has no lines
    /// - `CheckoutError::MissingCustomerName` / `MissingTable` for blank fields
    /// - `CheckoutError::SubmissionFailed` if the order write fails
    #[instrument(skip_all, fields(checkout_key, table = %ticket.table.trim()))]
    pub async fn checkout_for_table(
        &self,
        cart: &mut Cart,
        staff: Option<&Identity>,
        ticket: TableTicket,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let phase = PhaseGuard(&self.phase);
        phase.advance(CheckoutPhase::Validating);

        let staff = staff.ok_or(CheckoutError::NotAuthenticated)?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let customer_name = ticket.customer_name.trim();
        if customer_name.is_empty() {
            return Err(CheckoutError::MissingCustomerName);
        }
        let table = ticket.table.trim();
        if table.is_empty() {
            return Err(CheckoutError::MissingTable);
        }

        let checkout_key = CheckoutKey::generate();
        tracing::Span::current().record("checkout_key", tracing::field::display(checkout_key));

        let notes = match non_blank(ticket.notes) {
            Some(extra) => format!("Table {table} - {extra}"),
            None => format!("Table {table}"),
        };
        let items = cart.to_order_items();
        let total: Money = items.iter().map(|item| item.subtotal).sum();
        let order = NewOrder {
            user_id: staff.user_id.clone(),
            user_name: customer_name.to_owned(),
            user_email: staff.email.to_string(),
            table: Some(table.to_owned()),
            items,
            total,
            status: OrderStatus::Pending,
            payment_method: PaymentMethod::Cash,
            notes: Some(notes),
            checkout_key,
        };

        phase.advance(CheckoutPhase::Submitting);
        let order_id = self.submit(&order).await?;

        cart.clear();
        info!(order_id = %order_id, staff_id = %staff.user_id, total = %total, "Table order placed");

        Ok(CheckoutReceipt {
            order_id,
            total,
            points_earned: 0,
            award: AwardOutcome::Skipped,
            checkout_key,
        })
    }

    async fn submit(&self, order: &NewOrder) -> Result<OrderId, CheckoutError> {
        self.orders.create_order(order).await.map_err(|e| {
            error!(error = %e, user_id = %order.user_id, "Order submission failed");
            CheckoutError::SubmissionFailed
        })
    }

    /// Credit points, then write a history entry. Never fails the checkout.
    async fn award(&self, profile: &UserProfile, earned: u32, order_id: &OrderId) -> AwardOutcome {
        if earned == 0 {
            return AwardOutcome::Skipped;
        }

        let balance = profile.points.saturating_add(earned);
        if let Err(e) = self.users.set_points(&profile.id, balance).await {
            warn!(
                error = %e,
                order_id = %order_id,
                user_id = %profile.id,
                points = earned,
                "Points award failed; order kept"
            );
            return AwardOutcome::Failed;
        }
        self.session.set_points(balance);

        let entry = NewPointsEntry::earned(profile.id.clone(), earned, format!("Order {order_id}"));
        if let Err(e) = self.ledger.record_points(&entry).await {
            warn!(error = %e, order_id = %order_id, "Failed to record points history");
        }

        AwardOutcome::Credited { balance }
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_owned()).filter(|t| !t.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cafe_core::{Email, NewProduct, UserId};

    use super::*;
    use crate::store::MemoryBackend;

    struct Fixture {
        backend: Arc<MemoryBackend>,
        session: Session,
        checkout: Checkout,
        cart: Cart,
    }

    fn ana() -> Identity {
        Identity {
            user_id: UserId::new("u1"),
            email: Email::parse("ana@cafe.example").unwrap(),
        }
    }

    async fn fixture(signed_in: bool) -> Fixture {
        let backend = Arc::new(MemoryBackend::new());
        let session = Session::new(backend.clone());
        if signed_in {
            let profile = UserProfile::new_customer(&ana(), "Ana", 50);
            backend.insert_profile(profile.clone()).await;
            session.set_profile(Some(profile));
        }
        let checkout = Checkout::new(
            backend.clone(),
            backend.clone(),
            backend.clone(),
            session.clone(),
        );

        let mut cart = Cart::new();
        let espresso = backend
            .insert_product(NewProduct {
                name: "Espresso".to_owned(),
                description: String::new(),
                price: Money::from_major(25),
                category: "Coffee".to_owned(),
                stock: 10,
                available: true,
                image: None,
            })
            .await;
        cart.add(espresso, 2).unwrap();

        Fixture {
            backend,
            session,
            checkout,
            cart,
        }
    }

    #[tokio::test]
    async fn test_checkout_credits_points_and_clears_cart() {
        let mut f = fixture(true).await;
        let receipt = f
            .checkout
            .checkout(&mut f.cart, CheckoutRequest::default())
            .await
            .unwrap();

        assert_eq!(receipt.total, Money::from_major(50));
        assert_eq!(receipt.points_earned, 5);
        assert_eq!(receipt.award, AwardOutcome::Credited { balance: 55 });
        assert!(f.cart.is_empty());
        assert_eq!(f.session.current().unwrap().points, 55);
        assert_eq!(f.checkout.phase(), CheckoutPhase::Idle);

        let orders = f.backend.orders().await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].checkout_key, Some(receipt.checkout_key));
        assert_eq!(orders[0].status, OrderStatus::Pending);
        assert_eq!(orders[0].payment_method, PaymentMethod::Cash);
    }

    #[tokio::test]
    async fn test_signed_out_makes_no_remote_calls() {
        let mut f = fixture(false).await;
        let before = f.backend.remote_calls();

        let err = f
            .checkout
            .checkout(&mut f.cart, CheckoutRequest::default())
            .await
            .unwrap_err();

        assert_eq!(err, CheckoutError::NotAuthenticated);
        assert_eq!(f.backend.remote_calls(), before);
        assert_eq!(f.cart.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let mut f = fixture(true).await;
        f.cart.clear();
        let err = f
            .checkout
            .checkout(&mut f.cart, CheckoutRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err, CheckoutError::EmptyCart);
        assert!(f.backend.orders().await.is_empty());
    }

    #[tokio::test]
    async fn test_submission_failure_keeps_cart() {
        let mut f = fixture(true).await;
        f.backend.fail_order_writes(true);

        let err = f
            .checkout
            .checkout(&mut f.cart, CheckoutRequest::default())
            .await
            .unwrap_err();

        assert_eq!(err, CheckoutError::SubmissionFailed);
        assert_eq!(f.cart.item_count(), 2);
        assert_eq!(f.session.current().unwrap().points, 50);
        assert_eq!(f.checkout.phase(), CheckoutPhase::Idle);
    }

    #[tokio::test]
    async fn test_award_failure_still_succeeds() {
        let mut f = fixture(true).await;
        f.backend.fail_points_writes(true);

        let receipt = f
            .checkout
            .checkout(&mut f.cart, CheckoutRequest::default())
            .await
            .unwrap();

        assert_eq!(receipt.award, AwardOutcome::Failed);
        assert_eq!(receipt.points_earned, 5);
        assert!(f.cart.is_empty());
        assert_eq!(f.session.current().unwrap().points, 50);
        assert!(f.backend.points_entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_history_failure_still_credits() {
        let mut f = fixture(true).await;
        f.backend.fail_ledger_writes(true);

        let receipt = f
            .checkout
            .checkout(&mut f.cart, CheckoutRequest::default())
            .await
            .unwrap();
        assert_eq!(receipt.award, AwardOutcome::Credited { balance: 55 });
    }

    #[tokio::test]
    async fn test_notes_trimmed_and_payment_kept() {
        let mut f = fixture(true).await;
        f.checkout
            .checkout(
                &mut f.cart,
                CheckoutRequest {
                    payment_method: PaymentMethod::Card,
                    notes: Some("  extra hot ".to_owned()),
                },
            )
            .await
            .unwrap();

        let order = f.backend.orders().await.remove(0);
        assert_eq!(order.notes.as_deref(), Some("extra hot"));
        assert_eq!(order.payment_method, PaymentMethod::Card);
    }

    #[tokio::test]
    async fn test_table_order_validation_order() {
        let mut f = fixture(false).await;
        let staff = ana();
        let ticket = TableTicket {
            customer_name: "Luis".to_owned(),
            table: "4".to_owned(),
            notes: None,
        };

        let err = f
            .checkout
            .checkout_for_table(&mut f.cart, None, ticket.clone())
            .await
            .unwrap_err();
        assert_eq!(err, CheckoutError::NotAuthenticated);

        let err = f
            .checkout
            .checkout_for_table(
                &mut f.cart,
                Some(&staff),
                TableTicket {
                    customer_name: "  ".to_owned(),
                    ..ticket.clone()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, CheckoutError::MissingCustomerName);

        let err = f
            .checkout
            .checkout_for_table(
                &mut f.cart,
                Some(&staff),
                TableTicket {
                    table: String::new(),
                    ..ticket
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, CheckoutError::MissingTable);
        assert_eq!(f.cart.len(), 1);
    }

    #[tokio::test]
    async fn test_table_order_notes_and_no_points() {
        let mut f = fixture(false).await;
        let staff = ana();

        let receipt = f
            .checkout
            .checkout_for_table(
                &mut f.cart,
                Some(&staff),
                TableTicket {
                    customer_name: " Luis ".to_owned(),
                    table: "4".to_owned(),
                    notes: Some("no sugar".to_owned()),
                },
            )
            .await
            .unwrap();

        assert_eq!(receipt.points_earned, 0);
        assert_eq!(receipt.award, AwardOutcome::Skipped);
        assert!(f.cart.is_empty());

        let order = f.backend.orders().await.remove(0);
        assert_eq!(order.user_id, staff.user_id);
        assert_eq!(order.user_name, "Luis");
        assert_eq!(order.table.as_deref(), Some("4"));
        assert_eq!(order.notes.as_deref(), Some("Table 4 - no sugar"));
    }
}
