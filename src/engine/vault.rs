//! The vault aggregate: share ledger, activity, decisions, models and
//! strategy behind one authorization and pause gate.
//!
//! Mutation is two-phase. [`Vault::prepare`] runs every check and every
//! checked computation against `&self`; [`Vault::commit`] writes the result
//! and cannot fail. Callers that persist commands put the durable write
//! between the two, so a rejected or unpersisted command never leaves a
//! trace.

use crate::domain::{
    Command, DailyActivity, DaySlot, DecisionRecord, Digest32, Identity, LedgerEvent,
    LedgerSettings, ModelSnapshot, NewDecision, NewModelSnapshot, OperatingState, Timestamp,
    UserSummary, ValueDirection,
};

use super::activity::{ActivityAggregator, ActivityPlan};
use super::decision_log::{AppendPlan, DecisionLog, DecisionPage};
use super::error::LedgerError;
use super::model_registry::{ActivatePlan, CreatePlan, ModelSnapshotRegistry};
use super::share_ledger::{BurnPlan, MintPlan, ShareLedger, ValuePlan};
use super::strategy::{PendingStrategy, StrategyPlan, StrategyTimelock};

/// Default cap on records returned by a single query.
pub const DEFAULT_PAGE_SIZE_LIMIT: usize = 100;

/// A validated command, ready to commit.
#[derive(Debug, Clone)]
pub struct Plan {
    at: Timestamp,
    step: Step,
}

#[derive(Debug, Clone)]
enum Step {
    Deposit {
        mint: MintPlan,
        activity: ActivityPlan,
    },
    Withdraw {
        burn: BurnPlan,
        activity: ActivityPlan,
    },
    Value {
        direction: ValueDirection,
        value: ValuePlan,
    },
    Decision(AppendPlan),
    CreateModel(CreatePlan),
    ActivateModel(ActivatePlan),
    Settings {
        settings: LedgerSettings,
        event: LedgerEvent,
    },
    Strategy(StrategyPlan),
}

/// Return value of a committed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Totals are the pool's state right after this deposit.
    Deposited {
        shares_issued: u128,
        total_shares: u128,
        total_value: u128,
    },
    Withdrawn {
        amount_returned: u128,
        total_shares: u128,
        total_value: u128,
    },
    ValueAdjusted { total_value: u128 },
    DecisionRecorded { index: u64 },
    ModelSnapshotCreated { index: u64 },
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub outcome: Outcome,
    pub events: Vec<LedgerEvent>,
}

#[derive(Debug, Clone)]
pub struct Vault {
    settings: LedgerSettings,
    page_size_limit: usize,
    shares: ShareLedger,
    activity: ActivityAggregator,
    decisions: DecisionLog,
    models: ModelSnapshotRegistry,
    strategy: StrategyTimelock,
    last_timestamp: Timestamp,
}

impl Vault {
    pub fn new(settings: LedgerSettings, page_size_limit: usize) -> Self {
        Self {
            settings,
            page_size_limit: page_size_limit.max(1),
            shares: ShareLedger::new(),
            activity: ActivityAggregator::new(),
            decisions: DecisionLog::new(),
            models: ModelSnapshotRegistry::new(),
            strategy: StrategyTimelock::new(),
            last_timestamp: Timestamp::default(),
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    pub fn prepare(&self, command: &Command) -> Result<Plan, LedgerError> {
        if command.is_pause_gated() && self.settings.state.is_paused() {
            return Err(LedgerError::SystemPaused);
        }

        let at = command.at();
        let step = match command {
            Command::Deposit { holder, amount, .. } => {
                let mint = self
                    .shares
                    .plan_deposit(holder, *amount, self.settings.minimum_deposit)?;
                let activity = self.activity.plan_deposit(holder, *amount, at)?;
                Step::Deposit { mint, activity }
            }
            Command::Withdraw { holder, shares, .. } => {
                let burn = self.shares.plan_withdraw(holder, *shares)?;
                let activity = self
                    .activity
                    .plan_withdraw(holder, burn.amount_returned, at)?;
                Step::Withdraw { burn, activity }
            }
            Command::ReportYield { caller, amount, .. } => {
                self.require_agent(caller)?;
                Step::Value {
                    direction: ValueDirection::Yield,
                    value: self.shares.plan_yield(*amount)?,
                }
            }
            Command::ReportLoss { caller, amount, .. } => {
                self.require_agent(caller)?;
                Step::Value {
                    direction: ValueDirection::Loss,
                    value: self.shares.plan_loss(*amount)?,
                }
            }
            Command::RecordDecision {
                caller, decision, ..
            } => {
                self.require_agent(caller)?;
                Step::Decision(self.decisions.plan_append(decision.clone(), at, caller)?)
            }
            Command::CreateModelSnapshot {
                caller, snapshot, ..
            } => {
                self.require_agent(caller)?;
                Step::CreateModel(self.models.plan_create(snapshot.clone(), at)?)
            }
            Command::ActivateModelSnapshot { caller, index, .. } => {
                self.require_agent(caller)?;
                Step::ActivateModel(self.models.plan_activate(*index)?)
            }
            Command::SetAuthorizedAgent { caller, agent, .. } => {
                self.require_admin(caller)?;
                Step::Settings {
                    settings: LedgerSettings {
                        authorized_agent: agent.clone(),
                        ..self.settings.clone()
                    },
                    event: LedgerEvent::AgentChanged {
                        agent: agent.clone(),
                    },
                }
            }
            Command::TransferAdmin { caller, admin, .. } => {
                self.require_admin(caller)?;
                Step::Settings {
                    settings: LedgerSettings {
                        admin: admin.clone(),
                        ..self.settings.clone()
                    },
                    event: LedgerEvent::AdminTransferred {
                        admin: admin.clone(),
                    },
                }
            }
            Command::SetPaused { caller, paused, .. } => {
                self.require_admin(caller)?;
                let state = OperatingState::from_paused(*paused);
                Step::Settings {
                    settings: LedgerSettings {
                        state,
                        ..self.settings.clone()
                    },
                    event: LedgerEvent::PauseChanged {
                        state,
                        caller: caller.clone(),
                    },
                }
            }
            Command::SetMinimumDeposit { caller, amount, .. } => {
                self.require_admin(caller)?;
                Step::Settings {
                    settings: LedgerSettings {
                        minimum_deposit: *amount,
                        ..self.settings.clone()
                    },
                    event: LedgerEvent::MinimumDepositChanged { amount: *amount },
                }
            }
            Command::ProposeStrategy {
                caller,
                strategy_ref,
                ..
            } => {
                self.require_admin(caller)?;
                Step::Strategy(self.strategy.plan_propose(
                    strategy_ref,
                    at,
                    self.settings.strategy_timelock_secs,
                )?)
            }
            Command::ExecuteStrategy { caller, .. } => {
                self.require_admin(caller)?;
                Step::Strategy(self.strategy.plan_execute(at)?)
            }
            Command::CancelStrategy { caller, .. } => {
                self.require_admin(caller)?;
                Step::Strategy(self.strategy.plan_cancel()?)
            }
        };

        Ok(Plan { at, step })
    }

    pub fn commit(&mut self, plan: Plan) -> Applied {
        let at = plan.at;
        self.last_timestamp = self.last_timestamp.max(at);

        match plan.step {
            Step::Deposit { mint, activity } => {
                self.shares.apply_mint(&mint);
                self.activity.apply(&activity);
                Applied {
                    outcome: Outcome::Deposited {
                        shares_issued: mint.shares_issued,
                        total_shares: self.shares.total_shares(),
                        total_value: self.shares.total_value(),
                    },
                    events: vec![LedgerEvent::Deposited {
                        holder: mint.holder,
                        amount: mint.amount,
                        shares_issued: mint.shares_issued,
                        timestamp: at,
                    }],
                }
            }
            Step::Withdraw { burn, activity } => {
                self.shares.apply_burn(&burn);
                self.activity.apply(&activity);
                Applied {
                    outcome: Outcome::Withdrawn {
                        amount_returned: burn.amount_returned,
                        total_shares: self.shares.total_shares(),
                        total_value: self.shares.total_value(),
                    },
                    events: vec![LedgerEvent::Withdrawn {
                        holder: burn.holder,
                        amount: burn.amount_returned,
                        shares_burned: burn.shares_burned,
                        timestamp: at,
                    }],
                }
            }
            Step::Value { direction, value } => {
                self.shares.apply_value(&value);
                Applied {
                    outcome: Outcome::ValueAdjusted {
                        total_value: value.new_total_value,
                    },
                    events: vec![LedgerEvent::ValueAdjusted {
                        direction,
                        delta: value.delta,
                        total_value: value.new_total_value,
                        timestamp: at,
                    }],
                }
            }
            Step::Decision(append) => {
                let record = self.decisions.apply(append);
                Applied {
                    outcome: Outcome::DecisionRecorded {
                        index: record.index,
                    },
                    events: vec![LedgerEvent::DecisionRecorded {
                        index: record.index,
                        decision_type: record.decision_type.clone(),
                        timestamp: record.timestamp,
                    }],
                }
            }
            Step::CreateModel(create) => {
                let snapshot = self.models.apply_create(create);
                Applied {
                    outcome: Outcome::ModelSnapshotCreated {
                        index: snapshot.index,
                    },
                    events: vec![LedgerEvent::ModelSnapshotCreated {
                        index: snapshot.index,
                        version: snapshot.version.clone(),
                    }],
                }
            }
            Step::ActivateModel(activate) => {
                self.models.apply_activate(activate);
                Applied {
                    outcome: Outcome::Updated,
                    events: vec![LedgerEvent::ModelSnapshotActivated {
                        index: activate.index,
                        deactivated: activate.deactivated,
                    }],
                }
            }
            Step::Settings { settings, event } => {
                self.settings = settings;
                Applied {
                    outcome: Outcome::Updated,
                    events: vec![event],
                }
            }
            Step::Strategy(step) => {
                self.strategy.apply(&step);
                let event = match step {
                    StrategyPlan::Propose(pending) => LedgerEvent::StrategyProposed {
                        strategy_ref: pending.strategy_ref,
                        eta: pending.eta,
                    },
                    StrategyPlan::Execute {
                        strategy_ref,
                        previous,
                    } => LedgerEvent::StrategyActivated {
                        strategy_ref,
                        previous,
                    },
                    StrategyPlan::Cancel { strategy_ref } => {
                        LedgerEvent::StrategyCancelled { strategy_ref }
                    }
                };
                Applied {
                    outcome: Outcome::Updated,
                    events: vec![event],
                }
            }
        }
    }

    /// Prepare and commit in one step.
    pub fn execute(&mut self, command: &Command) -> Result<Applied, LedgerError> {
        let plan = self.prepare(command)?;
        Ok(self.commit(plan))
    }

    pub fn deposit(
        &mut self,
        holder: &Identity,
        amount: u128,
        at: Timestamp,
    ) -> Result<u128, LedgerError> {
        let applied = self.execute(&Command::Deposit {
            holder: holder.clone(),
            amount,
            at,
        })?;
        match applied.outcome {
            Outcome::Deposited { shares_issued, .. } => Ok(shares_issued),
            other => unreachable!("deposit committed as {:?}", other),
        }
    }

    pub fn withdraw(
        &mut self,
        holder: &Identity,
        shares: u128,
        at: Timestamp,
    ) -> Result<u128, LedgerError> {
        let applied = self.execute(&Command::Withdraw {
            holder: holder.clone(),
            shares,
            at,
        })?;
        match applied.outcome {
            Outcome::Withdrawn {
                amount_returned, ..
            } => Ok(amount_returned),
            other => unreachable!("withdraw committed as {:?}", other),
        }
    }

    pub fn record_decision(
        &mut self,
        caller: &Identity,
        decision: NewDecision,
        at: Timestamp,
    ) -> Result<u64, LedgerError> {
        let applied = self.execute(&Command::RecordDecision {
            caller: caller.clone(),
            decision,
            at,
        })?;
        match applied.outcome {
            Outcome::DecisionRecorded { index } => Ok(index),
            other => unreachable!("decision committed as {:?}", other),
        }
    }

    pub fn create_model_snapshot(
        &mut self,
        caller: &Identity,
        snapshot: NewModelSnapshot,
        at: Timestamp,
    ) -> Result<u64, LedgerError> {
        let applied = self.execute(&Command::CreateModelSnapshot {
            caller: caller.clone(),
            snapshot,
            at,
        })?;
        match applied.outcome {
            Outcome::ModelSnapshotCreated { index } => Ok(index),
            other => unreachable!("model snapshot committed as {:?}", other),
        }
    }

    pub fn activate_model_snapshot(
        &mut self,
        caller: &Identity,
        index: u64,
        at: Timestamp,
    ) -> Result<(), LedgerError> {
        self.execute(&Command::ActivateModelSnapshot {
            caller: caller.clone(),
            index,
            at,
        })
        .map(|_| ())
    }

    fn require_agent(&self, caller: &Identity) -> Result<(), LedgerError> {
        match &self.settings.authorized_agent {
            Some(agent) if agent == caller => Ok(()),
            _ => Err(LedgerError::Unauthorized(format!(
                "{} is not the authorized agent",
                caller
            ))),
        }
    }

    fn require_admin(&self, caller: &Identity) -> Result<(), LedgerError> {
        if &self.settings.admin == caller {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized(format!(
                "{} is not the administrator",
                caller
            )))
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    pub fn page_size_limit(&self) -> usize {
        self.page_size_limit
    }

    pub fn last_timestamp(&self) -> Timestamp {
        self.last_timestamp
    }

    pub fn total_shares(&self) -> u128 {
        self.shares.total_shares()
    }

    pub fn total_value(&self) -> u128 {
        self.shares.total_value()
    }

    pub fn shares_of(&self, holder: &Identity) -> u128 {
        self.shares.shares_of(holder)
    }

    pub fn holder_count(&self) -> usize {
        self.activity.holder_count()
    }

    pub fn decision_count(&self) -> u64 {
        self.decisions.count()
    }

    pub fn model_count(&self) -> u64 {
        self.models.count()
    }

    pub fn current_strategy(&self) -> Option<&str> {
        self.strategy.current()
    }

    pub fn pending_strategy(&self) -> Option<&PendingStrategy> {
        self.strategy.pending()
    }

    pub fn user_summary(&self, holder: &Identity) -> Result<UserSummary, LedgerError> {
        self.activity
            .user_summary(holder, &self.shares)
            .ok_or_else(|| LedgerError::NotFound(format!("holder {}", holder)))
    }

    pub fn daily_activity(&self, day: DaySlot) -> DailyActivity {
        self.activity.daily_activity(day)
    }

    /// `limit` is capped at the page size limit.
    pub fn list_holders(&self, offset: usize, limit: usize) -> (Vec<Identity>, usize) {
        self.activity
            .list_holders(offset, limit.min(self.page_size_limit))
    }

    pub fn decision(&self, index: u64) -> Result<&DecisionRecord, LedgerError> {
        self.decisions
            .get(index)
            .ok_or_else(|| LedgerError::NotFound(format!("decision {}", index)))
    }

    pub fn decision_range(&self, from: u64, to: u64) -> Result<DecisionPage, LedgerError> {
        self.decisions.get_range(from, to, self.page_size_limit)
    }

    pub fn decisions_by_time(
        &self,
        start: Timestamp,
        end: Timestamp,
        max_results: usize,
    ) -> Result<Vec<DecisionRecord>, LedgerError> {
        self.decisions
            .get_by_time_range(start, end, max_results.min(self.page_size_limit))
    }

    pub fn decisions_by_type(&self, decision_type: &str, max_results: usize) -> (Vec<u64>, usize) {
        self.decisions
            .get_by_type(decision_type, max_results.min(self.page_size_limit))
    }

    pub fn decisions_by_strategy(&self, strategy_ref: &str, max_results: usize) -> (Vec<u64>, usize) {
        self.decisions
            .get_by_strategy_ref(strategy_ref, max_results.min(self.page_size_limit))
    }

    pub fn model(&self, index: u64) -> Option<&ModelSnapshot> {
        self.models.get(index)
    }

    pub fn latest_active_model(&self) -> Result<(&ModelSnapshot, Digest32), LedgerError> {
        self.models.latest_active()
    }

    /// Recompute ledger invariants. Returns a description of each violation.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();

        match self.shares.sum_of_balances() {
            Some(sum) if sum == self.shares.total_shares() => {}
            Some(sum) => violations.push(format!(
                "total shares {} differ from balance sum {}",
                self.shares.total_shares(),
                sum
            )),
            None => violations.push("balance sum overflows".to_string()),
        }

        if (self.shares.total_shares() == 0) != (self.shares.total_value() == 0) {
            violations.push(format!(
                "total shares {} and total value {} must be zero together",
                self.shares.total_shares(),
                self.shares.total_value()
            ));
        }

        if self.models.active_count() > 1 {
            violations.push(format!(
                "{} model snapshots are active",
                self.models.active_count()
            ));
        }

        if !self.decisions.is_contiguous() {
            violations.push("decision log indices are not contiguous".to_string());
        }

        violations
    }
}
