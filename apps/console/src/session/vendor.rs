//! # Vendor Session
//!
//! Menu-driven restocking and till management. Every mutation is confirmed
//! with y/n, applied to the machine, then written to storage.
//!
//! ## Menu
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   1. View products            6. Add product                            │
//! │   2. View coins               7. Remove product                         │
//! │   3. View sales               8. Deposit coins                          │
//! │   4. Update product quantity  9. Collect coins                          │
//! │   5. Update product price     0. Back                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::error::{SessionError, SessionResult};
use crate::interactor::UserInteractor;
use crate::session::{persisted, report};
use crate::state::MachineState;
use crate::table;
use vendo_core::{
    Catalog, CoreError, Denomination, Money, Product, ProductCatalog, ValidationError,
    VendingMachine,
};

/// Number of journal rows shown by "View sales".
const RECENT_SALES: u32 = 10;

/// Vendor menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorAction {
    ViewProducts,
    ViewCoins,
    ViewSales,
    UpdateQuantity,
    UpdatePrice,
    AddProduct,
    RemoveProduct,
    DepositCoins,
    CollectCoins,
    Back,
}

impl VendorAction {
    pub const ALL: [VendorAction; 10] = [
        VendorAction::ViewProducts,
        VendorAction::ViewCoins,
        VendorAction::ViewSales,
        VendorAction::UpdateQuantity,
        VendorAction::UpdatePrice,
        VendorAction::AddProduct,
        VendorAction::RemoveProduct,
        VendorAction::DepositCoins,
        VendorAction::CollectCoins,
        VendorAction::Back,
    ];

    /// Menu number; Back is 0.
    pub fn number(&self) -> usize {
        match self {
            VendorAction::Back => 0,
            other => VendorAction::ALL
                .iter()
                .position(|a| a == other)
                .map_or(0, |i| i + 1),
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            VendorAction::ViewProducts => "products",
            VendorAction::ViewCoins => "coins",
            VendorAction::ViewSales => "sales",
            VendorAction::UpdateQuantity => "quantity",
            VendorAction::UpdatePrice => "price",
            VendorAction::AddProduct => "add",
            VendorAction::RemoveProduct => "remove",
            VendorAction::DepositCoins => "deposit",
            VendorAction::CollectCoins => "collect",
            VendorAction::Back => "back",
        }
    }
}

impl fmt::Display for VendorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VendorAction::ViewProducts => "View products",
            VendorAction::ViewCoins => "View coins",
            VendorAction::ViewSales => "View sales",
            VendorAction::UpdateQuantity => "Update product quantity",
            VendorAction::UpdatePrice => "Update product price",
            VendorAction::AddProduct => "Add new product",
            VendorAction::RemoveProduct => "Remove product",
            VendorAction::DepositCoins => "Deposit coins",
            VendorAction::CollectCoins => "Collect coins",
            VendorAction::Back => "Back",
        };
        f.write_str(label)
    }
}

impl FromStr for VendorAction {
    type Err = String;

    /// Accepts the menu number or a keyword.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        VendorAction::ALL
            .iter()
            .copied()
            .find(|a| s == a.number().to_string() || s == a.keyword() || s == a.to_string().to_lowercase())
            .ok_or(s)
    }
}

fn menu() -> String {
    let mut lines = vec!["Select action:".to_string()];
    for action in VendorAction::ALL {
        lines.push(format!("  {}. {}", action.number(), action));
    }
    lines.join("\n")
}

// =============================================================================
// Session
// =============================================================================

/// Runs the vendor menu until "back" or end of input.
///
/// Rule violations are shown and the menu continues; storage failures
/// reload the machine and are reported the same way.
pub async fn serve<I: UserInteractor>(state: &MachineState, io: &mut I) -> SessionResult<()> {
    let mut machine = state.lock().await;

    loop {
        let Some(choice) = io.prompt(&menu()) else {
            return Ok(());
        };
        let action = match choice.parse::<VendorAction>() {
            Ok(action) => action,
            Err(_) => {
                io.show("Invalid action.");
                continue;
            }
        };
        debug!(%action, "Vendor action selected");

        let result = match action {
            VendorAction::Back => return Ok(()),
            VendorAction::ViewProducts => {
                io.show(&table::products(&machine.products()));
                Ok(())
            }
            VendorAction::ViewCoins => {
                io.show(&table::coins(&machine.coin_report()));
                Ok(())
            }
            VendorAction::ViewSales => view_sales(state, io).await,
            VendorAction::UpdateQuantity => update_quantity(state, &mut machine, io).await,
            VendorAction::UpdatePrice => update_price(state, &mut machine, io).await,
            VendorAction::AddProduct => add_product(state, &mut machine, io).await,
            VendorAction::RemoveProduct => remove_product(state, &mut machine, io).await,
            VendorAction::DepositCoins => move_coins(state, &mut machine, io, Direction::Deposit).await,
            VendorAction::CollectCoins => move_coins(state, &mut machine, io, Direction::Collect).await,
        };

        if let Err(SessionError::InputClosed) = result {
            return Ok(());
        }
        report(io, result);
    }
}

async fn view_sales<I: UserInteractor>(state: &MachineState, io: &mut I) -> SessionResult<()> {
    let recent = state.db().sales().recent(RECENT_SALES).await?;
    let totals = state.db().sales().totals().await?;
    io.show(&table::sales(&recent, &totals));
    Ok(())
}

async fn update_quantity<I: UserInteractor>(
    state: &MachineState,
    machine: &mut VendingMachine<Catalog>,
    io: &mut I,
) -> SessionResult<()> {
    let product = ask_product(machine, io)?;
    let max = machine.config().max_product_quantity;
    let input = ask(io, &format!("Enter new quantity for \"{}\" (1-{}):", product.name, max))?;
    let Ok(quantity) = input.parse::<u32>() else {
        io.show("That's not a valid product quantity.");
        return Ok(());
    };

    if !io.confirm(&format!(
        "Are you sure you want to update the quantity of \"{}\" with code {} to {}?",
        product.name, product.code, quantity
    )) {
        return Ok(());
    }

    let updated = machine.update_quantity(&product.code, quantity)?;
    let result = state.db().products().update_quantity(&updated.code, updated.quantity).await;
    persisted(state, machine, result).await?;

    io.show("Quantity successfully updated.");
    Ok(())
}

async fn update_price<I: UserInteractor>(
    state: &MachineState,
    machine: &mut VendingMachine<Catalog>,
    io: &mut I,
) -> SessionResult<()> {
    let product = ask_product(machine, io)?;
    let input = ask(
        io,
        &format!("Enter new price (in leva) for \"{}\", currently {}:", product.name, product.price),
    )?;
    let price = Money::parse_leva(&input).map_err(CoreError::from)?;

    if !io.confirm(&format!(
        "Are you sure you want to update the price of \"{}\" with code {} to {}?",
        product.name, product.code, price
    )) {
        return Ok(());
    }

    let updated = machine.update_price(&product.code, price)?;
    let result = state.db().products().update_price(&updated.code, updated.price).await;
    persisted(state, machine, result).await?;

    io.show("Price successfully updated.");
    Ok(())
}

async fn add_product<I: UserInteractor>(
    state: &MachineState,
    machine: &mut VendingMachine<Catalog>,
    io: &mut I,
) -> SessionResult<()> {
    if !machine.catalog().can_add() {
        io.show("No free slots available.");
        return Ok(());
    }

    let code = ask(io, "Enter product code:")?;
    let name = ask(io, "Enter product name:")?;
    let price = Money::parse_leva(&ask(io, "Enter product price (in leva):")?).map_err(CoreError::from)?;
    let Ok(quantity) = ask(io, "Enter product quantity:")?.parse::<u32>() else {
        io.show("That's not a valid product quantity.");
        return Ok(());
    };

    let product = Product::new(&code, &name, price, quantity);
    if !io.confirm(&format!(
        "Code: {}\nName: {}\nPrice: {}\nQuantity: {}\nAre you sure you want to add this product?",
        product.code, product.name, product.price, product.quantity
    )) {
        return Ok(());
    }

    let added = machine.add_product(product)?;
    let result = state.db().products().insert(&added).await;
    persisted(state, machine, result).await?;

    io.show("Product successfully added.");
    Ok(())
}

async fn remove_product<I: UserInteractor>(
    state: &MachineState,
    machine: &mut VendingMachine<Catalog>,
    io: &mut I,
) -> SessionResult<()> {
    let product = ask_product(machine, io)?;

    if !io.confirm(&format!(
        "Are you sure you want to remove product \"{}\" with code {}?",
        product.name, product.code
    )) {
        return Ok(());
    }

    let removed = machine.remove_product(&product.code)?;
    let result = state.db().products().delete(&removed.code).await;
    persisted(state, machine, result).await?;

    io.show("Product successfully removed.");
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Deposit,
    Collect,
}

async fn move_coins<I: UserInteractor>(
    state: &MachineState,
    machine: &mut VendingMachine<Catalog>,
    io: &mut I,
    direction: Direction,
) -> SessionResult<()> {
    io.show(&table::coins(&machine.coin_report()));

    let (prompt, verb) = match direction {
        Direction::Deposit => ("Deposit coin:", "deposit"),
        Direction::Collect => ("Collect coins:", "collect"),
    };
    let coin = ask_coin(machine, io, prompt)?;
    let Ok(quantity) = ask(io, "Enter coin quantity:")?.parse::<u32>() else {
        io.show("That's not a valid coin quantity.");
        return Ok(());
    };

    if !io.confirm(&format!("Are you sure you want to {} {}x{}?", verb, quantity, coin)) {
        return Ok(());
    }

    match direction {
        Direction::Deposit => machine.deposit_coins(coin, quantity)?,
        Direction::Collect => machine.collect_coins(coin, quantity)?,
    }
    let result = state.db().coins().save_stock(&machine.coin_report()).await;
    persisted(state, machine, result).await?;

    match direction {
        Direction::Deposit => io.show(&format!("{}x{} successfully deposited.", quantity, coin)),
        Direction::Collect => io.show("Coins successfully collected."),
    }
    Ok(())
}

// =============================================================================
// Prompts
// =============================================================================

fn ask<I: UserInteractor>(io: &mut I, prompt: &str) -> SessionResult<String> {
    io.prompt(prompt).ok_or(SessionError::InputClosed)
}

/// Asks for a code and looks it up.
fn ask_product<I: UserInteractor>(
    machine: &VendingMachine<Catalog>,
    io: &mut I,
) -> SessionResult<Product> {
    let code = ask(io, "Enter product code:")?;
    Ok(machine.catalog().get_by_code(&code)?)
}

fn ask_coin<I: UserInteractor>(
    machine: &VendingMachine<Catalog>,
    io: &mut I,
    prompt: &str,
) -> SessionResult<Denomination> {
    let input = ask(io, prompt)?;
    machine
        .config()
        .denominations
        .parse(&input)
        .map_err(|e: ValidationError| CoreError::from(e).into())
}

// =============================================================================
// Unit Tests
// =============================================================================
