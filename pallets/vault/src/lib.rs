//! Vault Pallet
//!
//! Custody of user deposits in the quote asset with proportional share accounting.
//!
//! Depositors receive shares priced at `total_assets / total_shares`; the first depositor gets
//! shares one-to-one. `total_assets` is a net asset value that the registered trade executor
//! overwrites after each rebalance, so share price follows trading results while the deposited
//! tokens stay in the vault account.

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
    UnixTime,
    fungibles::{Inspect as FungiblesInspect, Mutate as FungiblesMutate},
    tokens::Preservation,
  },
  sp_runtime::traits::AccountIdConversion,
};
use primitives::{Balance, GovernanceRegistry, Moment, NavSink, math::mul_div, params::PRECISION};

const LOG_TARGET: &str = "runtime::vault";

#[frame::pallet]
pub mod pallet {
  use super::*;

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Asset management interface for the underlying token
    type Assets: FungiblesInspect<Self::AccountId, AssetId = u32, Balance = Balance>
      + FungiblesMutate<Self::AccountId, AssetId = u32, Balance = Balance>;

    /// Underlying asset deposited by users
    #[pallet::constant]
    type Asset: Get<u32>;

    /// Pallet ID for the custody account
    #[pallet::constant]
    type PalletId: Get<frame::deps::frame_support::PalletId>;

    /// Smallest accepted deposit
    #[pallet::constant]
    type MinDeposit: Get<Balance>;

    /// Ownership-and-pause registry
    type Governance: GovernanceRegistry<Self::AccountId>;

    /// Timestamps for deposit and withdrawal events
    type TimeProvider: UnixTime;

    /// Weight information
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  #[derive(Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
  pub struct VaultState<AccountId> {
    /// Net asset value reported by the executor, in units of the underlying
    pub total_assets: Balance,
    pub total_shares: Balance,
    /// Only account allowed to report net asset value
    pub executor: AccountId,
  }

  #[pallet::storage]
  pub type Vault<T: Config> = StorageValue<_, VaultState<T::AccountId>, OptionQuery>;

  #[pallet::storage]
  pub type Shares<T: Config> = StorageMap<_, Blake2_128Concat, T::AccountId, Balance, ValueQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    Deposited {
      who: T::AccountId,
      amount: Balance,
      shares: Balance,
      timestamp: Moment,
    },
    Withdrawn {
      who: T::AccountId,
      shares: Balance,
      assets: Balance,
      timestamp: Moment,
    },
    /// Net asset value was overwritten by the executor
    NavSynced {
      total_assets: Balance,
      timestamp: Moment,
    },
    ExecutorUpdated {
      previous: T::AccountId,
      new: T::AccountId,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Operations are halted by governance
    Paused,
    /// Deposit is below `MinDeposit`
    DepositTooSmall,
    /// Caller cannot cover the deposit
    InsufficientBalance,
    /// Amount must be greater than zero
    ZeroAmount,
    /// Caller holds fewer shares than requested
    InsufficientShares,
    /// Caller is not the executor or not a governance account
    Unauthorized,
    /// Vault has not been configured at genesis
    NotInitialized,
    /// Arithmetic overflow
    ArithmeticOverflow,
  }

  #[pallet::genesis_config]
  #[derive(frame::prelude::DefaultNoBound)]
  pub struct GenesisConfig<T: Config> {
    /// Account allowed to report net asset value, normally the executor pallet account
    pub executor: Option<T::AccountId>,
  }

  #[pallet::genesis_build]
  impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
    fn build(&self) {
      frame_system::Pallet::<T>::inc_providers(&Pallet::<T>::account_id());
      if let Some(executor) = &self.executor {
        Vault::<T>::put(VaultState {
          total_assets: 0,
          total_shares: 0,
          executor: executor.clone(),
        });
      }
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::deposit())]
    pub fn deposit(origin: OriginFor<T>, amount: Balance) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_deposit(&who, amount).map(|_| ())
    }

    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::withdraw())]
    pub fn withdraw(origin: OriginFor<T>, shares: Balance) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_withdraw(&who, shares).map(|_| ())
    }

    /// Overwrite the net asset value (executor only)
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::sync())]
    pub fn sync(origin: OriginFor<T>, new_total_assets: Balance) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_sync(&who, new_total_assets)
    }

    /// Replace the executor account (governance only)
    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::set_executor())]
    pub fn set_executor(origin: OriginFor<T>, executor: T::AccountId) -> DispatchResult {
      let who = ensure_signed(origin)?;
      ensure!(T::Governance::is_authorized(&who), Error::<T>::Unauthorized);
      Self::do_set_executor(executor)
    }
  }

  impl<T: Config> Pallet<T> {
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    pub fn load() -> Result<VaultState<T::AccountId>, DispatchError> {
      Vault::<T>::get().ok_or_else(|| Error::<T>::NotInitialized.into())
    }

    fn now() -> Moment {
      T::TimeProvider::now().as_secs()
    }

    pub fn balance_of_shares(who: &T::AccountId) -> Balance {
      Shares::<T>::get(who)
    }

    pub fn total_assets() -> Balance {
      Vault::<T>::get().map(|s| s.total_assets).unwrap_or_default()
    }

    pub fn total_shares() -> Balance {
      Vault::<T>::get().map(|s| s.total_shares).unwrap_or_default()
    }

    /// Underlying per share, scaled by `PRECISION`
    pub fn share_price() -> Balance {
      let precision = Balance::from(PRECISION);
      match Vault::<T>::get() {
        Some(s) if s.total_shares > 0 => {
          mul_div(s.total_assets, precision, s.total_shares).unwrap_or(Balance::MAX)
        }
        _ => precision,
      }
    }

    pub fn do_deposit(who: &T::AccountId, amount: Balance) -> Result<Balance, DispatchError> {
      ensure!(!T::Governance::is_paused(), Error::<T>::Paused);
      ensure!(amount >= T::MinDeposit::get(), Error::<T>::DepositTooSmall);
      ensure!(
        T::Assets::balance(T::Asset::get(), who) >= amount,
        Error::<T>::InsufficientBalance
      );
      let mut state = Self::load()?;

      let shares = if state.total_shares == 0 || state.total_assets == 0 {
        amount
      } else {
        mul_div(amount, state.total_shares, state.total_assets)
          .ok_or(Error::<T>::ArithmeticOverflow)?
      };
      ensure!(shares > 0, Error::<T>::ZeroAmount);

      T::Assets::transfer(
        T::Asset::get(),
        who,
        &Self::account_id(),
        amount,
        Preservation::Expendable,
      )?;

      state.total_assets = state
        .total_assets
        .checked_add(amount)
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      state.total_shares = state
        .total_shares
        .checked_add(shares)
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      Vault::<T>::put(state);
      Shares::<T>::mutate(who, |held| *held = held.saturating_add(shares));

      Self::deposit_event(Event::Deposited {
        who: who.clone(),
        amount,
        shares,
        timestamp: Self::now(),
      });
      Ok(shares)
    }

    pub fn do_withdraw(who: &T::AccountId, shares: Balance) -> Result<Balance, DispatchError> {
      ensure!(!T::Governance::is_paused(), Error::<T>::Paused);
      ensure!(shares > 0, Error::<T>::ZeroAmount);
      let held = Shares::<T>::get(who);
      ensure!(held >= shares, Error::<T>::InsufficientShares);
      let mut state = Self::load()?;

      let assets = if state.total_shares == 0 {
        0
      } else {
        mul_div(shares, state.total_assets, state.total_shares)
          .ok_or(Error::<T>::ArithmeticOverflow)?
      };

      if assets > 0 {
        T::Assets::transfer(
          T::Asset::get(),
          &Self::account_id(),
          who,
          assets,
          Preservation::Expendable,
        )?;
      }

      Shares::<T>::insert(who, held - shares);
      state.total_shares = state.total_shares.saturating_sub(shares);
      state.total_assets = state.total_assets.saturating_sub(assets);
      Vault::<T>::put(state);

      Self::deposit_event(Event::Withdrawn {
        who: who.clone(),
        shares,
        assets,
        timestamp: Self::now(),
      });
      Ok(assets)
    }

    pub fn do_set_executor(executor: T::AccountId) -> DispatchResult {
      let mut state = Self::load()?;
      let previous = core::mem::replace(&mut state.executor, executor.clone());
      Vault::<T>::put(state);
      Self::deposit_event(Event::ExecutorUpdated {
        previous,
        new: executor,
      });
      Ok(())
    }

    pub fn do_sync(who: &T::AccountId, new_total_assets: Balance) -> DispatchResult {
      let mut state = Self::load()?;
      ensure!(*who == state.executor, Error::<T>::Unauthorized);
      log::debug!(
        target: LOG_TARGET,
        "nav {} -> {} over {} shares",
        state.total_assets,
        new_total_assets,
        state.total_shares
      );
      state.total_assets = new_total_assets;
      Vault::<T>::put(state);
      Self::deposit_event(Event::NavSynced {
        total_assets: new_total_assets,
        timestamp: Self::now(),
      });
      Ok(())
    }
  }
}

impl<T: Config> NavSink<T::AccountId, Balance> for Pallet<T> {
  fn total_assets() -> Balance {
    Pallet::<T>::total_assets()
  }

  fn sync(caller: &T::AccountId, new_total_assets: Balance) -> DispatchResult {
    Self::do_sync(caller, new_total_assets)
  }
}
