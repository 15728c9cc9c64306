//! Strategy Engine Pallet
//!
//! Autonomous allocation strategy that keeps itself running through the deferred-call scheduler.
//!
//! ## Loop
//!
//! `start_strategy` arms the first evaluation one `StrategyInterval` ahead. Each evaluation:
//!
//! 1. forgets the job that is running now and aborts on a stale oracle,
//! 2. classifies the market from the oracle TWAP and dispersion,
//! 3. asks the executor to rebalance unless the decision is `Hold`,
//! 4. arms the next evaluation in the cheapest slot of the search window.
//!
//! The strategy pays for its own slots from its pallet account and keeps `GasReserve` untouched.
//! Evaluations run inside the scheduler's storage layer: if any step fails, including re-arming,
//! the whole evaluation is discarded and the loop stops until the owner restarts it.
//!
//! At most one evaluation is armed at any time; arming cancels a job that is still pending.

#![cfg_attr(not(feature = "std"), no_std)]

pub use pallet::*;

#[cfg(test)]
pub mod mock;


#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod weights;
pub use weights::WeightInfo;

use frame::prelude::*;

use frame::deps::{
  frame_support::traits::{UnixTime, fungible::Inspect as NativeInspect},
  sp_runtime::traits::AccountIdConversion,
};
use primitives::{
  Balance, DeferredCallId, DeferredCallScheduler, DeferredTask, DeferredTaskHandler,
  GovernanceRegistry, Moment, Price, PriceSource, RebalanceAction, RebalanceHandler, Slot,
  params::{
    DEFAULT_SIGMA_THRESHOLD, DEFAULT_TWAP_THRESHOLD, PRICE_DOWN_BAND_PERCENT,
    PRICE_UP_BAND_PERCENT, SLOT_SEARCH_WINDOW, STRATEGY_MAX_GAS,
  },
};

const LOG_TARGET: &str = "runtime::strategy-engine";

/// Classify the market for one evaluation
///
/// Dispersion takes priority over trend; the trend bands are exclusive.
pub fn decide(
  twap: Price,
  sigma: Price,
  twap_threshold: Price,
  sigma_threshold: Price,
) -> RebalanceAction {
  let twap = u128::from(twap);
  let threshold = u128::from(twap_threshold);
  if sigma > sigma_threshold {
    RebalanceAction::Volatility
  } else if twap * 100 > threshold * u128::from(PRICE_UP_BAND_PERCENT) {
    RebalanceAction::PriceUp
  } else if twap * 100 < threshold * u128::from(PRICE_DOWN_BAND_PERCENT) {
    RebalanceAction::PriceDown
  } else {
    RebalanceAction::Hold
  }
}

#[frame::pallet]
pub mod pallet {
  use super::*;

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Native currency the strategy account pays slot fees in
    type Currency: NativeInspect<Self::AccountId, Balance = Balance>;

    /// Oracle read side
    type PriceSource: PriceSource;

    /// Rebalance entry point of the executor
    type Executor: RebalanceHandler<Self::AccountId>;

    /// Host scheduler the loop re-arms itself through
    type Scheduler: DeferredCallScheduler<Self::AccountId, Balance>;

    /// Ownership-and-pause registry
    type Governance: GovernanceRegistry<Self::AccountId>;

    /// Timestamps for evaluation events
    type TimeProvider: UnixTime;

    /// Pallet ID for the account paying for evaluations
    #[pallet::constant]
    type PalletId: Get<frame::deps::frame_support::PalletId>;

    /// Periods between two evaluations
    #[pallet::constant]
    type StrategyInterval: Get<u64>;

    /// Balance the strategy account keeps beyond the slot fee
    #[pallet::constant]
    type GasReserve: Get<Balance>;

    /// Weight information
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  /// The armed evaluation
  #[derive(
    Clone, Copy, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen,
  )]
  pub struct ScheduledExecution {
    pub call_id: DeferredCallId,
    pub slot: Slot,
  }

  #[derive(Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
  pub struct StrategyState<AccountId> {
    pub owner: AccountId,
    /// Reference price for the trend bands, scaled by `PRECISION`
    pub twap_threshold: Price,
    /// Dispersion above which the strategy de-risks
    pub sigma_threshold: Price,
    pub active: bool,
    pub next_execution: Option<ScheduledExecution>,
  }

  #[pallet::storage]
  pub type Strategy<T: Config> = StorageValue<_, StrategyState<T::AccountId>, OptionQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    StrategyStatusChanged {
      active: bool,
      next_execution: Option<Slot>,
    },
    /// An evaluation was armed
    ExecutionScheduled {
      call_id: DeferredCallId,
      slot: Slot,
      fee: Balance,
    },
    StrategyExecuted {
      twap: Price,
      sigma: Price,
      action: RebalanceAction,
      timestamp: Moment,
    },
    ThresholdsUpdated {
      twap_threshold: Price,
      sigma_threshold: Price,
    },
    OwnerChanged {
      previous: T::AccountId,
      new: T::AccountId,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Caller is not the owner, the strategy itself or a governance account
    Unauthorized,
    /// Operations are halted by governance
    Paused,
    /// Strategy is already running
    AlreadyActive,
    /// Strategy has not been configured at genesis
    NotInitialized,
    /// Oracle has not been fed recently
    StalePrice,
    /// No slot in the search window can take the evaluation
    NoSlotAvailable,
    /// Strategy account cannot pay the slot fee and keep the reserve
    InsufficientFundsForScheduling,
    /// Arithmetic overflow
    ArithmeticOverflow,
  }

  #[pallet::genesis_config]
  #[derive(frame::prelude::DefaultNoBound)]
  pub struct GenesisConfig<T: Config> {
    pub owner: Option<T::AccountId>,
    /// Falls back to `DEFAULT_TWAP_THRESHOLD`
    pub twap_threshold: Option<Price>,
    /// Falls back to `DEFAULT_SIGMA_THRESHOLD`
    pub sigma_threshold: Option<Price>,
  }

  #[pallet::genesis_build]
  impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
    fn build(&self) {
      frame_system::Pallet::<T>::inc_providers(&Pallet::<T>::account_id());
      if let Some(owner) = &self.owner {
        Strategy::<T>::put(StrategyState {
          owner: owner.clone(),
          twap_threshold: self.twap_threshold.unwrap_or(DEFAULT_TWAP_THRESHOLD),
          sigma_threshold: self.sigma_threshold.unwrap_or(DEFAULT_SIGMA_THRESHOLD),
          active: false,
          next_execution: None,
        });
      }
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Activate the loop and arm the first evaluation (owner only)
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::start_strategy())]
    pub fn start_strategy(origin: OriginFor<T>) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let state = Self::load()?;
      ensure!(who == state.owner, Error::<T>::Unauthorized);
      ensure!(!T::Governance::is_paused(), Error::<T>::Paused);
      ensure!(!state.active, Error::<T>::AlreadyActive);

      let scheduled = Self::schedule_next_execution(Self::next_target()?)?;
      Strategy::<T>::mutate(|s| {
        if let Some(s) = s {
          s.active = true;
        }
      });

      Self::deposit_event(Event::StrategyStatusChanged {
        active: true,
        next_execution: Some(scheduled.slot),
      });
      Ok(())
    }

    /// Deactivate the loop and withdraw the armed evaluation (owner only)
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::stop_strategy())]
    pub fn stop_strategy(origin: OriginFor<T>) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let mut state = Self::load()?;
      ensure!(who == state.owner, Error::<T>::Unauthorized);

      state.active = false;
      if let Some(pending) = state.next_execution.take() {
        Self::cancel_pending(pending);
      }
      Strategy::<T>::put(state);

      Self::deposit_event(Event::StrategyStatusChanged {
        active: false,
        next_execution: None,
      });
      Ok(())
    }

    /// Replace both decision thresholds (owner only)
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::update_thresholds())]
    pub fn update_thresholds(
      origin: OriginFor<T>,
      twap_threshold: Price,
      sigma_threshold: Price,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let mut state = Self::load()?;
      ensure!(who == state.owner, Error::<T>::Unauthorized);

      state.twap_threshold = twap_threshold;
      state.sigma_threshold = sigma_threshold;
      Strategy::<T>::put(state);

      Self::deposit_event(Event::ThresholdsUpdated {
        twap_threshold,
        sigma_threshold,
      });
      Ok(())
    }

    /// Hand the strategy to a new owner (governance only)
    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::transfer_ownership())]
    pub fn transfer_ownership(origin: OriginFor<T>, new_owner: T::AccountId) -> DispatchResult {
      let who = ensure_signed(origin)?;
      ensure!(T::Governance::is_authorized(&who), Error::<T>::Unauthorized);
      Self::do_transfer_ownership(new_owner)
    }
  }

  impl<T: Config> Pallet<T> {
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    pub fn load() -> Result<StrategyState<T::AccountId>, DispatchError> {
      Strategy::<T>::get().ok_or_else(|| Error::<T>::NotInitialized.into())
    }

    pub fn is_active() -> bool {
      Strategy::<T>::get().is_some_and(|s| s.active)
    }

    pub fn next_execution() -> Option<ScheduledExecution> {
      Strategy::<T>::get().and_then(|s| s.next_execution)
    }

    fn now() -> Moment {
      T::TimeProvider::now().as_secs()
    }

    fn next_target() -> Result<u64, DispatchError> {
      T::Scheduler::current_period()
        .checked_add(T::StrategyInterval::get())
        .ok_or_else(|| Error::<T>::ArithmeticOverflow.into())
    }

    fn cancel_pending(pending: ScheduledExecution) {
      if let Err(e) = T::Scheduler::cancel(&Self::account_id(), pending.call_id) {
        log::warn!(
          target: LOG_TARGET,
          "armed call {} could not be withdrawn: {:?}",
          pending.call_id,
          e
        );
      }
    }

    pub fn do_transfer_ownership(new_owner: T::AccountId) -> DispatchResult {
      let mut state = Self::load()?;
      let previous = core::mem::replace(&mut state.owner, new_owner.clone());
      Strategy::<T>::put(state);
      Self::deposit_event(Event::OwnerChanged {
        previous,
        new: new_owner,
      });
      Ok(())
    }

    /// Arm an evaluation in the cheapest slot from `target_period` on
    pub fn schedule_next_execution(
      target_period: u64,
    ) -> Result<ScheduledExecution, DispatchError> {
      let slot = T::Scheduler::find_cheapest_slot(
        target_period,
        target_period.saturating_add(SLOT_SEARCH_WINDOW),
        STRATEGY_MAX_GAS,
      )
      .ok_or(Error::<T>::NoSlotAvailable)?;
      let fee = T::Scheduler::quote(slot, STRATEGY_MAX_GAS).ok_or(Error::<T>::NoSlotAvailable)?;

      let account = Self::account_id();
      let required = fee
        .checked_add(T::GasReserve::get())
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      ensure!(
        T::Currency::balance(&account) > required,
        Error::<T>::InsufficientFundsForScheduling
      );

      let mut state = Self::load()?;
      if let Some(pending) = state.next_execution.take() {
        Self::cancel_pending(pending);
      }
      let call_id = T::Scheduler::schedule(
        &account,
        DeferredTask::EvaluateStrategy,
        slot,
        STRATEGY_MAX_GAS,
        fee,
      )?;
      let scheduled = ScheduledExecution { call_id, slot };
      state.next_execution = Some(scheduled);
      Strategy::<T>::put(state);

      Self::deposit_event(Event::ExecutionScheduled { call_id, slot, fee });
      Ok(scheduled)
    }

    /// One run of the loop, reached through the scheduler
    pub fn evaluate(caller: &T::AccountId) -> DispatchResult {
      ensure!(*caller == Self::account_id(), Error::<T>::Unauthorized);
      let mut state = Self::load()?;
      if !state.active {
        log::debug!(target: LOG_TARGET, "evaluation skipped, strategy inactive");
        return Ok(());
      }
      state.next_execution = None;
      Strategy::<T>::put(state.clone());

      ensure!(!T::PriceSource::is_stale(), Error::<T>::StalePrice);
      let twap = T::PriceSource::twap();
      let sigma = T::PriceSource::sigma();
      let action = decide(twap, sigma, state.twap_threshold, state.sigma_threshold);
      log::debug!(
        target: LOG_TARGET,
        "twap {} sigma {} -> {:?}",
        twap,
        sigma,
        action
      );

      if action.requires_trade() {
        T::Executor::rebalance(caller, twap, sigma, action)?;
      }

      Self::deposit_event(Event::StrategyExecuted {
        twap,
        sigma,
        action,
        timestamp: Self::now(),
      });

      Self::schedule_next_execution(Self::next_target()?)?;
      Ok(())
    }
  }
}

impl<T: Config> DeferredTaskHandler<T::AccountId> for Pallet<T> {
  fn handle(caller: &T::AccountId, task: &DeferredTask) -> Option<DispatchResult> {
    match task {
      DeferredTask::EvaluateStrategy => Some(Self::evaluate(caller)),
      _ => None,
    }
  }
}
