//! # Customer Session
//!
//! One purchase: coins in, product code, product and change out.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  product table                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  "Insert a coin"  ◄──────────── Insufficient funds (shortfall shown)   │
//! │    <coin> | continue | cancel                     ▲                     │
//! │       │ continue                                  │                     │
//! │       ▼                                           │                     │
//! │  "Select product code"  ◄─── not found / out of stock                  │
//! │    <code> | cancel                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  dispense + change + unpaid remainder, then commit_vend                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! End of input at any prompt cancels and refunds. After "Insufficient funds"
//! an empty code selects the same product again.

use tracing::{debug, info};

use crate::error::{SessionError, SessionResult};
use crate::interactor::UserInteractor;
use crate::session::persisted;
use crate::state::MachineState;
use crate::table;
use vendo_core::{
    Catalog, CoinBatch, CoreError, Evaluation, TransactionCoordinator, TransactionState,
    VendReceipt,
};

const CONTINUE: &str = "continue";
const CANCEL: &str = "cancel";

/// How the transaction ended.
enum Outcome {
    Sold(VendReceipt),
    Refunded(CoinBatch),
}

/// Serves one customer.
pub async fn serve<I: UserInteractor>(state: &MachineState, io: &mut I) -> SessionResult<()> {
    let mut machine = state.lock().await;
    io.show(&table::products(&machine.products()));

    let mut tx = machine.begin_transaction();
    let outcome = run_transaction(&mut tx, io)?;
    let coins = tx.machine().coin_report();
    drop(tx);

    match outcome {
        Outcome::Refunded(refund) => {
            show_refund(io, &refund);
            Ok(())
        }
        Outcome::Sold(receipt) => {
            let result = state.db().sales().commit_vend(&receipt, &coins).await;
            let record = persisted(state, &mut machine, result).await?;
            info!(sale = %record.id, code = %record.product_code, "Sale persisted");
            Ok(())
        }
    }
}

fn run_transaction<I: UserInteractor>(
    tx: &mut TransactionCoordinator<'_, Catalog>,
    io: &mut I,
) -> SessionResult<Outcome> {
    loop {
        match tx.state() {
            TransactionState::CollectingCoins => {
                if let Some(refund) = collect_coin(tx, io)? {
                    return Ok(Outcome::Refunded(refund));
                }
            }
            TransactionState::SelectingProduct => {
                let prompt = match tx.pending_selection() {
                    Some(code) => format!("Select product code (Enter for {}, or 'cancel'):", code),
                    None => "Select product code (or 'cancel'):".to_string(),
                };
                let Some(input) = io.prompt(&prompt) else {
                    return Ok(Outcome::Refunded(tx.cancel()?));
                };
                if input.eq_ignore_ascii_case(CANCEL) {
                    return Ok(Outcome::Refunded(tx.cancel()?));
                }
                let code = match tx.pending_selection() {
                    Some(pending) if input.is_empty() => pending.to_string(),
                    _ => input,
                };

                match tx.select_product(&code)? {
                    Evaluation::Completed(receipt) => {
                        show_receipt(io, &receipt);
                        return Ok(Outcome::Sold(receipt));
                    }
                    Evaluation::ProductNotFound { code } => {
                        io.show(&format!("Product with code {} does not exist.", code));
                    }
                    Evaluation::OutOfStock { code } => io.show(&format!(
                        "Product with code {} is out of stock. Please select another one or contact the vendor.",
                        code
                    )),
                    Evaluation::InsufficientFunds { shortfall, .. } => {
                        io.show(&format!("Insufficient funds. Insert {} more to continue.", shortfall));
                    }
                    Evaluation::Aborted { reason, refund } => {
                        io.show(&format!("The sale could not be completed: {}", reason));
                        return Ok(Outcome::Refunded(refund));
                    }
                }
            }
            // Completed and Cancelled return above; cancel() reports the state
            state => {
                debug!(%state, "Transaction already finished");
                return Ok(Outcome::Refunded(tx.cancel()?));
            }
        }
    }
}

/// Handles one line while collecting coins. Returns the refund if the
/// customer cancelled.
fn collect_coin<I: UserInteractor>(
    tx: &mut TransactionCoordinator<'_, Catalog>,
    io: &mut I,
) -> SessionResult<Option<CoinBatch>> {
    let mut allowed: Vec<String> = tx
        .machine()
        .config()
        .denominations
        .iter()
        .map(|d| d.to_string())
        .collect();
    allowed.reverse();
    let prompt = format!(
        "Insert a coin ({}), '{}' to choose a product or '{}':",
        allowed.join(", "),
        CONTINUE,
        CANCEL
    );

    let Some(input) = io.prompt(&prompt) else {
        return Ok(Some(tx.cancel()?));
    };

    if input.eq_ignore_ascii_case(CANCEL) {
        return Ok(Some(tx.cancel()?));
    }

    if input.eq_ignore_ascii_case(CONTINUE) {
        if let Err(e) = tx.proceed() {
            io.show(&SessionError::from(e).user_message());
        }
        return Ok(None);
    }

    let inserted = tx
        .parse_coin(&input)
        .map_err(CoreError::from)
        .and_then(|coin| tx.insert_coin(coin));
    match inserted {
        Ok(total) => io.show(&format!("Total inserted: {}", total)),
        Err(e) => io.show(&SessionError::from(e).user_message()),
    }
    Ok(None)
}

fn show_receipt<I: UserInteractor>(io: &mut I, receipt: &VendReceipt) {
    io.show(&format!("Dispensing product... {}", receipt.product.name));

    let returned = receipt.change.returned();
    if !returned.is_empty() {
        io.show(&format!(
            "Returning change: {} ({})",
            returned,
            receipt.change.returned_total()
        ));
    }
    if receipt.change.unpayable.is_positive() {
        io.show(&format!(
            "The following amount could not be returned: {}.",
            receipt.change.unpayable
        ));
    }
}

fn show_refund<I: UserInteractor>(io: &mut I, refund: &CoinBatch) {
    if refund.is_empty() {
        io.show("Transaction cancelled.");
    } else {
        io.show(&format!("Returning inserted coins... {} ({})", refund, refund.total()));
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
