//! Journaled, lock-guarded access to the vault.
//!
//! One writer at a time holds the write lock for prepare, journal append and
//! commit; readers share the read lock and never observe a half-applied
//! command.

use crate::db::{Journal, JournalError};
use crate::domain::{
    Command, Identity, JournalEntry, LedgerEvent, LedgerSettings, NewDecision, NewModelSnapshot,
    Timestamp,
};
use crate::engine::{Applied, LedgerError, Outcome, Vault};
use crate::orchestration::clock::Clock;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};

/// Buffered events per subscriber before slow subscribers start lagging.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Journal(#[from] JournalError),
    #[error("journal entry {position} failed to replay: {source}")]
    Replay {
        position: usize,
        #[source]
        source: LedgerError,
    },
    #[error("journal is corrupt: {0}")]
    CorruptJournal(String),
    #[error("ledger invariants violated: {0}")]
    InvariantViolation(String),
    #[error("command task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Pool totals as of the committed deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositReceipt {
    pub shares_issued: u128,
    pub total_shares: u128,
    pub total_value: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawReceipt {
    pub amount_returned: u128,
    pub total_shares: u128,
    pub total_value: u128,
}

#[derive(Clone)]
pub struct LedgerService {
    vault: Arc<RwLock<Vault>>,
    journal: Arc<dyn Journal>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<LedgerEvent>,
}

impl LedgerService {
    /// Restore the vault from `journal`, or seed a new journal with
    /// `settings` when it is empty.
    ///
    /// On a non-empty journal the stored settings win; `settings` differing
    /// from them is only logged.
    pub async fn open(
        journal: Arc<dyn Journal>,
        clock: Arc<dyn Clock>,
        settings: LedgerSettings,
        page_size_limit: usize,
    ) -> Result<Self, ServiceError> {
        let entries = journal.load().await?;

        let vault = match entries.split_first() {
            None => {
                journal
                    .append(
                        &JournalEntry::Genesis {
                            settings: settings.clone(),
                        },
                        clock.now(),
                    )
                    .await?;
                info!(admin = %settings.admin, "Seeded new ledger journal");
                Vault::new(settings, page_size_limit)
            }
            Some((JournalEntry::Genesis { settings: stored }, rest)) => {
                let mut vault = Vault::new(stored.clone(), page_size_limit);
                for (offset, entry) in rest.iter().enumerate() {
                    let position = offset + 1;
                    match entry {
                        JournalEntry::Command { command } => {
                            vault
                                .execute(command)
                                .map_err(|source| ServiceError::Replay { position, source })?;
                        }
                        JournalEntry::Genesis { .. } => {
                            return Err(ServiceError::CorruptJournal(format!(
                                "second genesis entry at position {}",
                                position
                            )));
                        }
                    }
                }
                info!(
                    entries = entries.len(),
                    total_shares = %vault.total_shares(),
                    total_value = %vault.total_value(),
                    decisions = vault.decision_count(),
                    "Replayed ledger journal"
                );
                if stored != &settings {
                    warn!("Configured ledger settings differ from the journal's genesis; the journal wins");
                }
                vault
            }
            Some((first, _)) => {
                return Err(ServiceError::CorruptJournal(format!(
                    "journal starts with {} instead of genesis",
                    first.kind()
                )));
            }
        };

        let violations = vault.check_invariants();
        if !violations.is_empty() {
            return Err(ServiceError::InvariantViolation(violations.join("; ")));
        }

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            vault: Arc::new(RwLock::new(vault)),
            journal,
            clock,
            events,
        })
    }

    /// Shared read access for queries.
    pub async fn read(&self) -> RwLockReadGuard<'_, Vault> {
        self.vault.read().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    /// Number of journal entries, genesis included.
    pub async fn journal_len(&self) -> Result<u64, ServiceError> {
        Ok(self.journal.entry_count().await?)
    }

    /// Stamp, validate, journal and commit one command.
    ///
    /// The timestamp never goes backwards relative to the last committed
    /// command, even if the clock does. Once the command passes validation
    /// the journal append and commit run on their own task, so dropping the
    /// caller cannot leave a journaled command unapplied.
    pub async fn submit(
        &self,
        build: impl FnOnce(Timestamp) -> Command,
    ) -> Result<Applied, ServiceError> {
        let mut vault = self.vault.clone().write_owned().await;
        let at = self.clock.now().max(vault.last_timestamp());
        let command = build(at);

        let plan = match vault.prepare(&command) {
            Ok(plan) => plan,
            Err(e) => {
                debug!(kind = command.kind(), code = e.code(), error = %e, "Command rejected");
                return Err(e.into());
            }
        };

        let journal = self.journal.clone();
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            let kind = command.kind();
            let seq = journal
                .append(&JournalEntry::Command { command }, at)
                .await?;

            let applied = vault.commit(plan);
            info!(kind, seq, outcome = ?applied.outcome, "Command committed");

            // Sent under the write lock so subscribers see commit order.
            for event in &applied.events {
                let _ = events.send(event.clone());
            }
            Ok::<_, ServiceError>(applied)
        });
        task.await?
    }

    pub async fn deposit(
        &self,
        holder: Identity,
        amount: u128,
    ) -> Result<DepositReceipt, ServiceError> {
        let applied = self
            .submit(|at| Command::Deposit { holder, amount, at })
            .await?;
        match applied.outcome {
            Outcome::Deposited {
                shares_issued,
                total_shares,
                total_value,
            } => Ok(DepositReceipt {
                shares_issued,
                total_shares,
                total_value,
            }),
            other => unreachable!("deposit committed as {:?}", other),
        }
    }

    pub async fn withdraw(
        &self,
        holder: Identity,
        shares: u128,
    ) -> Result<WithdrawReceipt, ServiceError> {
        let applied = self
            .submit(|at| Command::Withdraw { holder, shares, at })
            .await?;
        match applied.outcome {
            Outcome::Withdrawn {
                amount_returned,
                total_shares,
                total_value,
            } => Ok(WithdrawReceipt {
                amount_returned,
                total_shares,
                total_value,
            }),
            other => unreachable!("withdraw committed as {:?}", other),
        }
    }

    /// Returns the new total value.
    pub async fn report_yield(&self, caller: Identity, amount: u128) -> Result<u128, ServiceError> {
        let applied = self
            .submit(|at| Command::ReportYield { caller, amount, at })
            .await?;
        Ok(Self::total_value_of(applied))
    }

    /// Returns the new total value.
    pub async fn report_loss(&self, caller: Identity, amount: u128) -> Result<u128, ServiceError> {
        let applied = self
            .submit(|at| Command::ReportLoss { caller, amount, at })
            .await?;
        Ok(Self::total_value_of(applied))
    }

    fn total_value_of(applied: Applied) -> u128 {
        match applied.outcome {
            Outcome::ValueAdjusted { total_value } => total_value,
            other => unreachable!("value report committed as {:?}", other),
        }
    }

    pub async fn record_decision(
        &self,
        caller: Identity,
        decision: NewDecision,
    ) -> Result<u64, ServiceError> {
        let applied = self
            .submit(|at| Command::RecordDecision {
                caller,
                decision,
                at,
            })
            .await?;
        match applied.outcome {
            Outcome::DecisionRecorded { index } => Ok(index),
            other => unreachable!("decision committed as {:?}", other),
        }
    }

    pub async fn create_model_snapshot(
        &self,
        caller: Identity,
        snapshot: NewModelSnapshot,
    ) -> Result<u64, ServiceError> {
        let applied = self
            .submit(|at| Command::CreateModelSnapshot {
                caller,
                snapshot,
                at,
            })
            .await?;
        match applied.outcome {
            Outcome::ModelSnapshotCreated { index } => Ok(index),
            other => unreachable!("model snapshot committed as {:?}", other),
        }
    }

    pub async fn activate_model_snapshot(
        &self,
        caller: Identity,
        index: u64,
    ) -> Result<(), ServiceError> {
        self.submit(|at| Command::ActivateModelSnapshot { caller, index, at })
            .await
            .map(|_| ())
    }

    pub async fn set_authorized_agent(
        &self,
        caller: Identity,
        agent: Option<Identity>,
    ) -> Result<(), ServiceError> {
        self.submit(|at| Command::SetAuthorizedAgent { caller, agent, at })
            .await
            .map(|_| ())
    }

    pub async fn transfer_admin(&self, caller: Identity, admin: Identity) -> Result<(), ServiceError> {
        self.submit(|at| Command::TransferAdmin { caller, admin, at })
            .await
            .map(|_| ())
    }

    pub async fn set_paused(&self, caller: Identity, paused: bool) -> Result<(), ServiceError> {
        self.submit(|at| Command::SetPaused { caller, paused, at })
            .await
            .map(|_| ())
    }

    pub async fn set_minimum_deposit(&self, caller: Identity, amount: u128) -> Result<(), ServiceError> {
        self.submit(|at| Command::SetMinimumDeposit { caller, amount, at })
            .await
            .map(|_| ())
    }

    pub async fn propose_strategy(
        &self,
        caller: Identity,
        strategy_ref: String,
    ) -> Result<(), ServiceError> {
        self.submit(|at| Command::ProposeStrategy {
            caller,
            strategy_ref,
            at,
        })
        .await
        .map(|_| ())
    }

    pub async fn execute_strategy(&self, caller: Identity) -> Result<(), ServiceError> {
        self.submit(|at| Command::ExecuteStrategy { caller, at })
            .await
            .map(|_| ())
    }

    pub async fn cancel_strategy(&self, caller: Identity) -> Result<(), ServiceError> {
        self.submit(|at| Command::CancelStrategy { caller, at })
            .await
            .map(|_| ())
    }
}
