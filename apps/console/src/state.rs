//! # Machine State
//!
//! The one machine this process serves, plus the database it persists to.
//!
//! ## Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  customer session ──lock()──► MutexGuard<VendingMachine> ──► released  │
//! │  vendor session   ──lock()──► (waits)                                   │
//! │                                                                         │
//! │  A session holds the guard from its first prompt to its last write,    │
//! │  so a vendor's "collect coins" can never interleave with a customer's  │
//! │  change withdrawal.                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use vendo_core::{Catalog, MachineConfig, VendingMachine};
use vendo_db::{Database, DbResult};

/// Shared machine state.
#[derive(Debug)]
pub struct MachineState {
    db: Database,
    config: MachineConfig,
    machine: Mutex<VendingMachine<Catalog>>,
}

impl MachineState {
    /// Loads the machine from storage.
    pub async fn load(db: Database, config: MachineConfig) -> DbResult<Self> {
        let machine = db.load_machine(config.clone()).await?;
        Ok(MachineState {
            db,
            config,
            machine: Mutex::new(machine),
        })
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Waits for exclusive access to the machine.
    pub async fn lock(&self) -> MutexGuard<'_, VendingMachine<Catalog>> {
        self.machine.lock().await
    }

    /// Replaces `machine` with what storage holds.
    ///
    /// Used after a failed write, so memory never runs ahead of the database.
    pub async fn reload(&self, machine: &mut VendingMachine<Catalog>) -> DbResult<()> {
        warn!("Reloading machine state from storage");
        *machine = self.db.load_machine(self.config.clone()).await?;
        info!("Machine state reloaded");
        Ok(())
    }
}
