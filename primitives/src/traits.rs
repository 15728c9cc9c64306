//! Capability interfaces between the protocol components.
//!
//! Every cross-component call goes through one of these traits. A runtime wires the concrete
//! pallets together through `Config` associated types; tests swap in recording doubles.

use polkadot_sdk::sp_runtime::{DispatchError, DispatchResult};

use crate::types::{DeferredCallId, DeferredTask, Price, RebalanceAction, Slot};

/// Ownership-and-pause registry consulted by state-changing entry points.
pub trait GovernanceRegistry<AccountId> {
  /// Whether `who` may administer collaborator addresses and ownership.
  fn is_authorized(who: &AccountId) -> bool;
  /// Whether user-facing operations are halted.
  fn is_paused() -> bool;
}

impl<AccountId> GovernanceRegistry<AccountId> for () {
  fn is_authorized(_who: &AccountId) -> bool {
    false
  }

  fn is_paused() -> bool {
    false
  }
}

/// Read side of the price oracle.
pub trait PriceSource {
  fn twap() -> Price;
  fn sigma() -> Price;
  fn is_stale() -> bool;
}

impl PriceSource for () {
  fn twap() -> Price {
    0
  }

  fn sigma() -> Price {
    0
  }

  fn is_stale() -> bool {
    true
  }
}

/// Constant-product venue the executor trades against.
pub trait LiquidityVenue<AccountId, Balance> {
  /// Swap `amount_in` from `who`; returns the output amount credited to `who`.
  fn swap(
    who: &AccountId,
    buying_asset_a: bool,
    amount_in: Balance,
    min_amount_out: Balance,
  ) -> Result<Balance, DispatchError>;

  /// Current `(reserve_a, reserve_b)`.
  fn reserves() -> (Balance, Balance);

  /// Marginal price of asset A in units of asset B, scaled by `PRECISION`.
  fn price() -> Price;
}

/// Receiver of net-asset-value corrections computed by the executor.
pub trait NavSink<AccountId, Balance> {
  fn total_assets() -> Balance;
  fn sync(caller: &AccountId, new_total_assets: Balance) -> DispatchResult;
}

/// Entry point the strategy uses to request a rebalance.
pub trait RebalanceHandler<AccountId> {
  fn rebalance(
    caller: &AccountId,
    twap: Price,
    sigma: Price,
    action: RebalanceAction,
  ) -> DispatchResult;
}

impl<AccountId> RebalanceHandler<AccountId> for () {
  fn rebalance(
    _caller: &AccountId,
    _twap: Price,
    _sigma: Price,
    _action: RebalanceAction,
  ) -> DispatchResult {
    Ok(())
  }
}

/// Host scheduler for deferred self-calls and asynchronous messages.
pub trait DeferredCallScheduler<AccountId, Balance> {
  /// Period currently being executed.
  fn current_period() -> u64;

  /// Fee for reserving `max_gas` in `slot`, `None` if the slot cannot take the call.
  fn quote(slot: Slot, max_gas: u64) -> Option<Balance>;

  /// Cheapest slot in `[start_period, end_period]` able to take `max_gas`.
  fn find_cheapest_slot(start_period: u64, end_period: u64, max_gas: u64) -> Option<Slot>;

  /// Register `task` for execution at `slot`, escrowing `fee` from `payer`.
  fn schedule(
    payer: &AccountId,
    task: DeferredTask,
    slot: Slot,
    max_gas: u64,
    fee: Balance,
  ) -> Result<DeferredCallId, DispatchError>;

  /// Withdraw a pending deferred call registered by `payer`, refunding its fee.
  fn cancel(payer: &AccountId, id: DeferredCallId) -> DispatchResult;

  /// Queue `task` for best-effort delivery between `start_period` and `end_period`.
  fn send_message(
    sender: &AccountId,
    task: DeferredTask,
    start_period: u64,
    end_period: u64,
    max_gas: u64,
  ) -> Result<DeferredCallId, DispatchError>;
}

/// Routes a due task to the component that owns it.
///
/// Components return `None` for tasks they do not own; tuples try each member in order.
pub trait DeferredTaskHandler<AccountId> {
  fn handle(caller: &AccountId, task: &DeferredTask) -> Option<DispatchResult>;
}

impl<AccountId> DeferredTaskHandler<AccountId> for () {
  fn handle(_caller: &AccountId, _task: &DeferredTask) -> Option<DispatchResult> {
    None
  }
}

impl<AccountId, A, B> DeferredTaskHandler<AccountId> for (A, B)
where
  A: DeferredTaskHandler<AccountId>,
  B: DeferredTaskHandler<AccountId>,
{
  fn handle(caller: &AccountId, task: &DeferredTask) -> Option<DispatchResult> {
    A::handle(caller, task).or_else(|| B::handle(caller, task))
  }
}
