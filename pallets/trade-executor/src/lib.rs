//! Trade Executor Pallet
//!
//! Holds the protocol's trading position in the risk asset (A) and the quote asset (B) and moves
//! it toward the allocation chosen by the strategy.
//!
//! ## Rebalance
//!
//! Holdings are valued at the oracle TWAP handed in by the strategy. The target exposure is the
//! action's allocation share of the vault's net asset value. The executor buys A with B when
//! under target (capped at the B it holds) and sells A when over target. Every swap carries a
//! minimum output derived from the TWAP and the maximum slippage, and the returned amount is
//! checked again after settlement. The change in portfolio value is then reported to the vault.

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
  frame_support::traits::{
    fungibles::{Inspect as FungiblesInspect, Mutate as FungiblesMutate},
    tokens::Preservation,
  },
  sp_runtime::traits::AccountIdConversion,
};
use primitives::{
  Balance, GovernanceRegistry, LiquidityVenue, NavSink, Price, RebalanceAction, RebalanceHandler,
  math::mul_div,
  params::{BASIS_POINTS, MAX_SLIPPAGE_BPS, PRECISION},
};

const LOG_TARGET: &str = "runtime::trade-executor";

#[frame::pallet]
pub mod pallet {
  use super::*;

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Asset management interface for the traded tokens
    type Assets: FungiblesInspect<Self::AccountId, AssetId = u32, Balance = Balance>
      + FungiblesMutate<Self::AccountId, AssetId = u32, Balance = Balance>;

    /// Risk asset
    #[pallet::constant]
    type AssetA: Get<u32>;

    /// Quote asset
    #[pallet::constant]
    type AssetB: Get<u32>;

    /// Pallet ID for the trading account
    #[pallet::constant]
    type PalletId: Get<frame::deps::frame_support::PalletId>;

    /// Venue the position is traded on
    type Venue: LiquidityVenue<Self::AccountId, Balance>;

    /// Receiver of net asset value reports
    type Vault: NavSink<Self::AccountId, Balance>;

    /// Ownership-and-pause registry
    type Governance: GovernanceRegistry<Self::AccountId>;

    /// Weight information
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  #[derive(Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
  pub struct ExecutorState<AccountId> {
    /// Manual override and emergency withdrawal rights
    pub owner: AccountId,
    /// Account the strategy rebalances through
    pub strategy: AccountId,
  }

  #[pallet::storage]
  pub type Executor<T: Config> = StorageValue<_, ExecutorState<T::AccountId>, OptionQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    Rebalanced {
      action: RebalanceAction,
      /// Target exposure in basis points of net asset value
      target_allocation: u32,
      /// Net asset value reported to the vault
      new_balance: Balance,
    },
    SwapExecuted {
      is_buy: bool,
      amount_in: Balance,
      amount_out: Balance,
    },
    EmergencyWithdraw {
      recipient: T::AccountId,
      amount_a: Balance,
      amount_b: Balance,
    },
    StrategyUpdated {
      previous: T::AccountId,
      new: T::AccountId,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Operations are halted by governance
    Paused,
    /// Caller is neither the strategy nor the owner, or not a governance account
    Unauthorized,
    /// Executor has not been configured at genesis
    NotInitialized,
    /// Valuation price is zero
    DivisionByZero,
    /// Venue paid out less than the slippage bound
    SlippageExceeded,
    /// Arithmetic overflow
    ArithmeticOverflow,
  }

  #[pallet::genesis_config]
  #[derive(frame::prelude::DefaultNoBound)]
  pub struct GenesisConfig<T: Config> {
    pub owner: Option<T::AccountId>,
    /// Normally the strategy engine pallet account
    pub strategy: Option<T::AccountId>,
  }

  #[pallet::genesis_build]
  impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
    fn build(&self) {
      frame_system::Pallet::<T>::inc_providers(&Pallet::<T>::account_id());
      if let (Some(owner), Some(strategy)) = (&self.owner, &self.strategy) {
        Executor::<T>::put(ExecutorState {
          owner: owner.clone(),
          strategy: strategy.clone(),
        });
      }
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Move the position toward the allocation of `action` (strategy or owner)
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::rebalance())]
    pub fn rebalance(
      origin: OriginFor<T>,
      twap: Price,
      sigma: Price,
      action: RebalanceAction,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_rebalance(&who, twap, sigma, action)
    }

    /// Send the whole position to `recipient` (owner only)
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::emergency_withdraw())]
    pub fn emergency_withdraw(origin: OriginFor<T>, recipient: T::AccountId) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let state = Self::load()?;
      ensure!(who == state.owner, Error::<T>::Unauthorized);

      let account = Self::account_id();
      let (amount_a, amount_b) = Self::holdings(&account);
      for (asset, amount) in [(T::AssetA::get(), amount_a), (T::AssetB::get(), amount_b)] {
        if amount > 0 {
          T::Assets::transfer(asset, &account, &recipient, amount, Preservation::Expendable)?;
        }
      }
      log::warn!(
        target: LOG_TARGET,
        "emergency withdrawal of {} A and {} B",
        amount_a,
        amount_b
      );
      Self::deposit_event(Event::EmergencyWithdraw {
        recipient,
        amount_a,
        amount_b,
      });
      Ok(())
    }

    /// Replace the strategy account (governance only)
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::set_strategy())]
    pub fn set_strategy(origin: OriginFor<T>, strategy: T::AccountId) -> DispatchResult {
      let who = ensure_signed(origin)?;
      ensure!(T::Governance::is_authorized(&who), Error::<T>::Unauthorized);
      Self::do_set_strategy(strategy)
    }
  }

  impl<T: Config> Pallet<T> {
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    pub fn load() -> Result<ExecutorState<T::AccountId>, DispatchError> {
      Executor::<T>::get().ok_or_else(|| Error::<T>::NotInitialized.into())
    }

    /// `(A, B)` held by `account`
    pub fn holdings(account: &T::AccountId) -> (Balance, Balance) {
      (
        T::Assets::balance(T::AssetA::get(), account),
        T::Assets::balance(T::AssetB::get(), account),
      )
    }

    /// Value of `amount_a` of the risk asset in units of B
    fn exposure(amount_a: Balance, twap: Price) -> Result<Balance, DispatchError> {
      mul_div(amount_a, Balance::from(twap), Balance::from(PRECISION))
        .ok_or_else(|| Error::<T>::ArithmeticOverflow.into())
    }

    fn portfolio_value(account: &T::AccountId, twap: Price) -> Result<Balance, DispatchError> {
      let (amount_a, amount_b) = Self::holdings(account);
      Self::exposure(amount_a, twap)?
        .checked_add(amount_b)
        .ok_or_else(|| Error::<T>::ArithmeticOverflow.into())
    }

    pub fn do_set_strategy(strategy: T::AccountId) -> DispatchResult {
      let mut state = Self::load()?;
      let previous = core::mem::replace(&mut state.strategy, strategy.clone());
      Executor::<T>::put(state);
      Self::deposit_event(Event::StrategyUpdated {
        previous,
        new: strategy,
      });
      Ok(())
    }

    pub fn do_rebalance(
      who: &T::AccountId,
      twap: Price,
      sigma: Price,
      action: RebalanceAction,
    ) -> DispatchResult {
      ensure!(!T::Governance::is_paused(), Error::<T>::Paused);
      let state = Self::load()?;
      ensure!(
        *who == state.strategy || *who == state.owner,
        Error::<T>::Unauthorized
      );
      ensure!(twap > 0, Error::<T>::DivisionByZero);

      let account = Self::account_id();
      let total_assets = T::Vault::total_assets();
      let (balance_a, balance_b) = Self::holdings(&account);
      let exposure = Self::exposure(balance_a, twap)?;
      let portfolio_before = exposure
        .checked_add(balance_b)
        .ok_or(Error::<T>::ArithmeticOverflow)?;

      let target_bps = action.target_allocation_bps();
      let target = mul_div(
        total_assets,
        Balance::from(target_bps),
        Balance::from(BASIS_POINTS),
      )
      .ok_or(Error::<T>::ArithmeticOverflow)?;

      log::debug!(
        target: LOG_TARGET,
        "{:?} at twap {} sigma {}: exposure {} target {}",
        action,
        twap,
        sigma,
        exposure,
        target
      );

      if exposure < target {
        let amount = (target - exposure).min(balance_b);
        if amount > 0 {
          Self::execute_swap(&account, true, amount, twap)?;
        }
      } else if exposure > target {
        let amount = mul_div(exposure - target, Balance::from(PRECISION), Balance::from(twap))
          .ok_or(Error::<T>::ArithmeticOverflow)?
          .min(balance_a);
        if amount > 0 {
          Self::execute_swap(&account, false, amount, twap)?;
        }
      }

      let portfolio_after = Self::portfolio_value(&account, twap)?;
      let new_balance = total_assets
        .checked_add(portfolio_after)
        .ok_or(Error::<T>::ArithmeticOverflow)?
        .saturating_sub(portfolio_before);
      T::Vault::sync(&account, new_balance)?;

      Self::deposit_event(Event::Rebalanced {
        action,
        target_allocation: target_bps,
        new_balance,
      });
      Ok(())
    }

    /// Trade `amount` on the venue, buying A when `is_buy`, with a TWAP-derived output floor
    pub fn execute_swap(
      account: &T::AccountId,
      is_buy: bool,
      amount: Balance,
      expected_price: Price,
    ) -> Result<Balance, DispatchError> {
      let price = Balance::from(expected_price);
      let precision = Balance::from(PRECISION);
      let expected_out = if is_buy {
        mul_div(amount, precision, price)
      } else {
        mul_div(amount, price, precision)
      }
      .ok_or(Error::<T>::ArithmeticOverflow)?;
      let min_out = mul_div(
        expected_out,
        Balance::from(BASIS_POINTS - MAX_SLIPPAGE_BPS),
        Balance::from(BASIS_POINTS),
      )
      .ok_or(Error::<T>::ArithmeticOverflow)?;

      let amount_out = T::Venue::swap(account, is_buy, amount, min_out)?;
      ensure!(amount_out >= min_out, Error::<T>::SlippageExceeded);

      Self::deposit_event(Event::SwapExecuted {
        is_buy,
        amount_in: amount,
        amount_out,
      });
      Ok(amount_out)
    }
  }
}

impl<T: Config> RebalanceHandler<T::AccountId> for Pallet<T> {
  fn rebalance(
    caller: &T::AccountId,
    twap: Price,
    sigma: Price,
    action: RebalanceAction,
  ) -> DispatchResult {
    Self::do_rebalance(caller, twap, sigma, action)
  }
}
