//! Async runner for a payment session.
//!
//! One task owns the session and every timer attached to it: the
//! one-second countdown, the simulated confirmation delay and the redirect
//! after success. Each timer exists only while the status that needs it
//! holds, and all of them are dropped when the driver returns.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant};

use crate::cart::Cart;
use crate::checkout::OrderStore;
use crate::config::PaymentConfig;
use crate::lifecycle::scripted::{poll_pending, PendingTask};
use crate::lifecycle::{CancelToken, ScriptedTask};
use crate::navigation::Route;
use crate::notifications::Notifier;
use crate::observability::metrics;
use crate::payments::session::PaymentSession;
use crate::payments::types::{PaymentStatus, SessionCommand, SessionOutcome};

/// Caller's side of a running session: send commands, watch state.
#[derive(Debug, Clone)]
pub struct SessionControl {
    commands: mpsc::UnboundedSender<SessionCommand>,
    updates: watch::Receiver<PaymentSession>,
}

impl SessionControl {
    /// Queue a command. Returns `false` if the session has ended.
    pub fn send(&self, command: SessionCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn confirm(&self) -> bool {
        self.send(SessionCommand::Confirm)
    }

    pub fn restart(&self) -> bool {
        self.send(SessionCommand::Restart)
    }

    pub fn leave(&self) -> bool {
        self.send(SessionCommand::Leave)
    }

    /// A receiver that sees every published session state.
    pub fn subscribe(&self) -> watch::Receiver<PaymentSession> {
        self.updates.clone()
    }

    /// The latest published state.
    pub fn current(&self) -> PaymentSession {
        self.updates.borrow().clone()
    }
}

/// Drives a [`PaymentSession`] until it is confirmed, restarted or left.
#[derive(Debug)]
pub struct SessionDriver {
    session: PaymentSession,
    confirmation_delay: Duration,
    redirect_delay: Duration,
    orders: OrderStore,
    notifier: Notifier,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    updates: watch::Sender<PaymentSession>,
    cancel: CancelToken,
}

impl SessionDriver {
    pub fn new(
        session: PaymentSession,
        config: &PaymentConfig,
        orders: OrderStore,
        notifier: Notifier,
        cancel: CancelToken,
    ) -> (Self, SessionControl) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (updates_tx, updates_rx) = watch::channel(session.clone());

        let driver = Self {
            session,
            confirmation_delay: Duration::from_secs(config.confirmation_delay_secs),
            redirect_delay: Duration::from_secs(config.redirect_delay_secs),
            orders,
            notifier,
            commands: commands_rx,
            updates: updates_tx,
            cancel,
        };
        let control = SessionControl {
            commands: commands_tx,
            updates: updates_rx,
        };
        (driver, control)
    }

    /// Run the session. Dropping every [`SessionControl`] counts as leaving.
    ///
    /// On confirmation the cart is cleared and the persisted order deleted.
    pub async fn run(mut self, cart: &mut Cart) -> SessionOutcome {
        tracing::info!(
            order_id = %self.session.order_id(),
            status = %self.session.status(),
            remaining_secs = self.session.remaining_secs(),
            "Payment session started"
        );

        let second = Duration::from_secs(1);
        let mut countdown = time::interval_at(Instant::now() + second, second);
        let mut confirmation: Option<PendingTask<()>> = None;
        let mut redirect: Option<PendingTask<()>> = None;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return self.finish(None);
                }
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Confirm) => {
                        if let Some(task) = self.begin_confirmation() {
                            confirmation = Some(task);
                        }
                    }
                    Some(SessionCommand::Restart) => {
                        if self.session.status().can_restart() {
                            self.discard_order();
                            return self.finish(Some(Route::Checkout));
                        }
                        tracing::warn!(status = %self.session.status(), "Ignoring restart");
                    }
                    Some(SessionCommand::BackToCheckout) => {
                        if self.session.status() == PaymentStatus::Waiting {
                            return self.finish(Some(Route::Checkout));
                        }
                        tracing::warn!(status = %self.session.status(), "Ignoring back-to-checkout");
                    }
                    Some(SessionCommand::Leave) | None => {
                        return self.finish(None);
                    }
                },
                _ = countdown.tick(), if self.session.status().counts_down() => {
                    if self.session.tick() {
                        confirmation = None;
                        self.on_expired();
                    }
                    self.publish();
                }
                result = poll_pending(&mut confirmation), if confirmation.is_some() => {
                    confirmation = None;
                    if result.is_ok() && self.on_confirmed(cart) {
                        redirect = Some(
                            ScriptedTask::new(self.redirect_delay, (), self.cancel.clone()).boxed(),
                        );
                    }
                }
                result = poll_pending(&mut redirect), if redirect.is_some() => {
                    let route = result.ok().map(|()| Route::Home);
                    return self.finish(route);
                }
            }
        }
    }

    fn begin_confirmation(&mut self) -> Option<PendingTask<()>> {
        if let Err(e) = self.session.confirm() {
            tracing::warn!(error = %e, "Ignoring payment confirmation");
            return None;
        }
        self.notifier
            .info("Processing Payment", "We are checking for your transaction...");
        self.publish();
        Some(ScriptedTask::new(self.confirmation_delay, (), self.cancel.clone()).boxed())
    }

    fn on_confirmed(&mut self, cart: &mut Cart) -> bool {
        if let Err(e) = self.session.complete() {
            tracing::warn!(error = %e, "Confirmation arrived too late");
            return false;
        }
        metrics::record_session_end("confirmed");
        self.notifier.info(
            "Payment Confirmed!",
            "Your order is confirmed. You will be contacted shortly with delivery details.",
        );
        cart.clear();
        self.discard_order();
        self.publish();
        true
    }

    fn on_expired(&mut self) {
        metrics::record_session_end("expired");
        self.notifier.error(
            "Session Expired",
            "Your payment session has expired. Please restart the checkout process.",
        );
    }

    fn discard_order(&self) {
        if let Err(e) = self.orders.discard() {
            tracing::error!(error = %e, "Failed to delete order snapshot");
        }
    }

    fn publish(&self) {
        self.updates.send_replace(self.session.clone());
    }

    fn finish(self, route: Option<Route>) -> SessionOutcome {
        let status = self.session.status();
        if !status.is_terminal() {
            metrics::record_session_end("abandoned");
        }
        tracing::info!(
            order_id = %self.session.order_id(),
            status = %status,
            route = ?route,
            "Payment session ended"
        );
        SessionOutcome { status, route }
    }
}
