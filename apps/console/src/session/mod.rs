//! # Sessions
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  role loop                                                              │
//! │    "Are you a customer or a vendor?"                                    │
//! │       │                                                                 │
//! │       ├── customer ──► customer::serve  (one purchase)                  │
//! │       ├── vendor   ──► vendor::serve    (menu until "back")             │
//! │       └── exit / end of input ──► return                                │
//! │                                                                         │
//! │  Each session holds the machine lock from start to finish.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod customer;
pub mod vendor;

use std::str::FromStr;
use tracing::{error, info};

use crate::error::{SessionError, SessionResult};
use crate::interactor::UserInteractor;
use crate::state::MachineState;
use vendo_core::{Catalog, VendingMachine};
use vendo_db::DbError;

/// Who is standing at the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Vendor,
    Exit,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "customer" | "c" => Ok(Role::Customer),
            "vendor" | "v" => Ok(Role::Vendor),
            "exit" | "quit" | "q" => Ok(Role::Exit),
            other => Err(other.to_string()),
        }
    }
}

/// Serves customers and vendors until `exit` or end of input.
pub async fn run_roles<I: UserInteractor>(state: &MachineState, io: &mut I) {
    loop {
        let Some(answer) = io.prompt("Are you a customer or a vendor? (customer / vendor / exit)")
        else {
            break;
        };

        let result = match answer.parse::<Role>() {
            Ok(Role::Customer) => customer::serve(state, io).await,
            Ok(Role::Vendor) => vendor::serve(state, io).await,
            Ok(Role::Exit) => break,
            Err(_) => {
                io.show("Invalid user role.");
                continue;
            }
        };

        report(io, result);
    }

    info!("Role loop finished");
}

/// Shows a session error; the loop goes on.
pub(crate) fn report<I: UserInteractor>(io: &mut I, result: SessionResult<()>) {
    match result {
        Ok(()) | Err(SessionError::InputClosed) => {}
        Err(e) => {
            if matches!(e, SessionError::Db(_)) {
                error!(error = %e, "Session failed");
            }
            io.show(&e.user_message());
        }
    }
}

/// Passes a storage result through, reloading the machine when it failed.
pub(crate) async fn persisted<T>(
    state: &MachineState,
    machine: &mut VendingMachine<Catalog>,
    result: Result<T, DbError>,
) -> SessionResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) => {
            error!(error = %e, "Failed to persist machine state");
            if let Err(reload) = state.reload(machine).await {
                error!(error = %reload, "Failed to reload machine state");
            }
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactor::ScriptedInteractor;
    use vendo_core::MachineConfig;
    use vendo_db::{Database, DbConfig};

    #[test]
    fn test_role_parsing() {
        assert_eq!("Customer".parse::<Role>(), Ok(Role::Customer));
        assert_eq!(" VENDOR ".parse::<Role>(), Ok(Role::Vendor));
        assert_eq!("exit".parse::<Role>(), Ok(Role::Exit));
        assert!("manager".parse::<Role>().is_err());
    }

    #[tokio::test]
    async fn test_invalid_role_reprompts_and_eof_exits() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = MachineState::load(db, MachineConfig::default()).await.unwrap();

        let mut io = ScriptedInteractor::new(["manager", "exit", "customer"]);
        run_roles(&state, &mut io).await;

        assert!(io.saw("Invalid user role."));
        // "customer" after exit is never read
        assert_eq!(io.remaining_input(), 1);
    }
}
