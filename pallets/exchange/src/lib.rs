//! Exchange Pallet
//!
//! Two-asset constant-product pool between the risk asset (A) and the quote asset (B).
//!
//! Swaps charge a 0.3% input fee and settle against the pool account. After every swap the new
//! marginal price `reserve_b * PRECISION / reserve_a` is handed to the deferred-call scheduler as
//! an asynchronous `PushPrice` message, so the oracle observes it a period later. A refused push
//! never reverts the swap.

#![cfg_attr(not(feature = "std"), no_std)]

pub use pallet::*;


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
  sp_core::U256,
  sp_runtime::{PerThing, Permill, traits::AccountIdConversion},
};
use primitives::{
  Balance, DeferredCallScheduler, DeferredTask, GovernanceRegistry, LiquidityVenue, Price,
  math::{integer_sqrt, mul_div},
  params::{
    LIQUIDITY_RATIO_TOLERANCE, ORACLE_PUSH_DELAY, ORACLE_PUSH_EXPIRY, ORACLE_PUSH_MAX_GAS,
    PRECISION, SWAP_FEE_DENOMINATOR, SWAP_FEE_NUMERATOR,
  },
};

const LOG_TARGET: &str = "runtime::exchange";

#[frame::pallet]
pub mod pallet {
  use super::*;

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Asset management interface for the pooled tokens
    type Assets: FungiblesInspect<Self::AccountId, AssetId = u32, Balance = Balance>
      + FungiblesMutate<Self::AccountId, AssetId = u32, Balance = Balance>;

    /// Risk asset
    #[pallet::constant]
    type AssetA: Get<u32>;

    /// Quote asset, prices are expressed in it
    #[pallet::constant]
    type AssetB: Get<u32>;

    /// Pallet ID for the pool account
    #[pallet::constant]
    type PalletId: Get<frame::deps::frame_support::PalletId>;

    /// Ownership-and-pause registry
    type Governance: GovernanceRegistry<Self::AccountId>;

    /// Carrier for post-swap price pushes
    type Scheduler: DeferredCallScheduler<Self::AccountId, Balance>;

    /// Weight information
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  /// Reserves and liquidity supply of the pool
  #[derive(
    Clone, Copy, Default, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen,
  )]
  pub struct ExchangeState {
    pub reserve_a: Balance,
    pub reserve_b: Balance,
    /// Product of the reserves after the last state change, saturated
    pub k: Balance,
    pub total_lp: Balance,
  }

  impl ExchangeState {
    /// Marginal price of A in B, scaled by `PRECISION`
    pub fn price(&self) -> Price {
      mul_div(self.reserve_b, u128::from(PRECISION), self.reserve_a)
        .map(|p| Price::try_from(p).unwrap_or(Price::MAX))
        .unwrap_or_default()
    }

    pub(crate) fn refresh_k(&mut self) {
      self.k = self.reserve_a.saturating_mul(self.reserve_b);
    }
  }

  #[pallet::storage]
  pub type Pool<T: Config> = StorageValue<_, ExchangeState, OptionQuery>;

  /// Liquidity shares per provider
  #[pallet::storage]
  pub type LpShares<T: Config> = StorageMap<_, Blake2_128Concat, T::AccountId, Balance, ValueQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// A swap was settled against the pool
    Swapped {
      who: T::AccountId,
      buying_asset_a: bool,
      amount_in: Balance,
      amount_out: Balance,
      price: Price,
    },
    /// Liquidity was added
    LiquidityAdded {
      who: T::AccountId,
      amount_a: Balance,
      amount_b: Balance,
      lp_tokens: Balance,
    },
    /// Liquidity was withdrawn
    LiquidityRemoved {
      who: T::AccountId,
      amount_a: Balance,
      amount_b: Balance,
      lp_tokens: Balance,
    },
    /// The scheduler refused the post-swap price push
    OraclePushDropped { price: Price, error: DispatchError },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Operations are halted by governance
    Paused,
    /// Amount must be greater than zero
    ZeroAmount,
    /// The pool has not been seeded at genesis
    NotInitialized,
    /// Output is below the caller's minimum
    SlippageExceeded,
    /// Swap would pay out nothing
    InsufficientOutputAmount,
    /// Deposit ratio deviates from the pool ratio by more than the tolerance
    RatioOutOfBand,
    /// Caller holds fewer liquidity shares than requested
    InsufficientLpShares,
    /// Withdrawal would empty a reserve
    InsufficientLiquidity,
    /// Arithmetic overflow
    ArithmeticOverflow,
  }

  #[pallet::genesis_config]
  #[derive(frame::prelude::DefaultNoBound)]
  pub struct GenesisConfig<T: Config> {
    pub reserve_a: Balance,
    pub reserve_b: Balance,
    /// Receiver of the initial liquidity shares, the pool account itself if unset
    pub initial_lp_holder: Option<T::AccountId>,
  }

  #[pallet::genesis_build]
  impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
    fn build(&self) {
      let pool_account = Pallet::<T>::account_id();
      frame_system::Pallet::<T>::inc_providers(&pool_account);
      if self.reserve_a == 0 && self.reserve_b == 0 {
        return;
      }
      assert!(
        self.reserve_a > 0 && self.reserve_b > 0,
        "both exchange reserves must be non-zero"
      );
      let lp = integer_sqrt(U256::from(self.reserve_a) * U256::from(self.reserve_b)).low_u128();
      let holder = self.initial_lp_holder.clone().unwrap_or(pool_account);
      LpShares::<T>::insert(&holder, lp);
      let mut state = ExchangeState {
        reserve_a: self.reserve_a,
        reserve_b: self.reserve_b,
        k: 0,
        total_lp: lp,
      };
      state.refresh_k();
      Pool::<T>::put(state);
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Swap `amount_in` of one asset for the other
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::swap())]
    pub fn swap(
      origin: OriginFor<T>,
      buying_asset_a: bool,
      amount_in: Balance,
      min_amount_out: Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_swap(&who, buying_asset_a, amount_in, min_amount_out).map(|_| ())
    }

    /// Deposit both assets at the pool ratio for liquidity shares
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::add_liquidity())]
    pub fn add_liquidity(
      origin: OriginFor<T>,
      amount_a: Balance,
      amount_b: Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_add_liquidity(&who, amount_a, amount_b).map(|_| ())
    }

    /// Burn liquidity shares for the pro-rata part of both reserves
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::remove_liquidity())]
    pub fn remove_liquidity(origin: OriginFor<T>, lp_tokens: Balance) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_remove_liquidity(&who, lp_tokens).map(|_| ())
    }
  }

  impl<T: Config> Pallet<T> {
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    pub fn load() -> Result<ExchangeState, DispatchError> {
      Pool::<T>::get().ok_or_else(|| Error::<T>::NotInitialized.into())
    }

    pub fn lp_shares(who: &T::AccountId) -> Balance {
      LpShares::<T>::get(who)
    }

    /// Constant-product output for `amount_in` after the input fee
    pub fn get_amount_out(
      amount_in: Balance,
      reserve_in: Balance,
      reserve_out: Balance,
    ) -> Result<Balance, DispatchError> {
      let in_with_fee = U256::from(amount_in)
        .checked_mul(U256::from(SWAP_FEE_NUMERATOR))
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      let numerator = in_with_fee
        .checked_mul(U256::from(reserve_out))
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      let denominator = U256::from(reserve_in)
        .checked_mul(U256::from(SWAP_FEE_DENOMINATOR))
        .and_then(|d| d.checked_add(in_with_fee))
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      ensure!(!denominator.is_zero(), Error::<T>::InsufficientOutputAmount);
      // Strictly below reserve_out, so it fits
      Ok((numerator / denominator).low_u128())
    }

    pub fn do_swap(
      who: &T::AccountId,
      buying_asset_a: bool,
      amount_in: Balance,
      min_amount_out: Balance,
    ) -> Result<Balance, DispatchError> {
      ensure!(!T::Governance::is_paused(), Error::<T>::Paused);
      ensure!(amount_in > 0, Error::<T>::ZeroAmount);
      let mut pool = Self::load()?;

      let (asset_in, asset_out, reserve_in, reserve_out) = if buying_asset_a {
        (T::AssetB::get(), T::AssetA::get(), pool.reserve_b, pool.reserve_a)
      } else {
        (T::AssetA::get(), T::AssetB::get(), pool.reserve_a, pool.reserve_b)
      };

      let amount_out = Self::get_amount_out(amount_in, reserve_in, reserve_out)?;
      ensure!(amount_out > 0, Error::<T>::InsufficientOutputAmount);
      ensure!(amount_out >= min_amount_out, Error::<T>::SlippageExceeded);

      let pool_account = Self::account_id();
      T::Assets::transfer(asset_in, who, &pool_account, amount_in, Preservation::Expendable)?;
      T::Assets::transfer(asset_out, &pool_account, who, amount_out, Preservation::Expendable)?;

      let new_in = reserve_in
        .checked_add(amount_in)
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      let new_out = reserve_out
        .checked_sub(amount_out)
        .ok_or(Error::<T>::InsufficientOutputAmount)?;
      if buying_asset_a {
        pool.reserve_b = new_in;
        pool.reserve_a = new_out;
      } else {
        pool.reserve_a = new_in;
        pool.reserve_b = new_out;
      }
      pool.refresh_k();
      let price = pool.price();
      Pool::<T>::put(pool);

      Self::push_price(price);

      Self::deposit_event(Event::Swapped {
        who: who.clone(),
        buying_asset_a,
        amount_in,
        amount_out,
        price,
      });
      Ok(amount_out)
    }

    /// Hand the post-swap price to the scheduler for delivery to the oracle
    fn push_price(price: Price) {
      let now = T::Scheduler::current_period();
      let sent = T::Scheduler::send_message(
        &Self::account_id(),
        DeferredTask::PushPrice { price },
        now.saturating_add(ORACLE_PUSH_DELAY),
        now.saturating_add(ORACLE_PUSH_EXPIRY),
        ORACLE_PUSH_MAX_GAS,
      );
      match sent {
        Ok(id) => log::debug!(target: LOG_TARGET, "price {} queued as message {}", price, id),
        Err(error) => {
          log::warn!(target: LOG_TARGET, "price push of {} dropped: {:?}", price, error);
          Self::deposit_event(Event::OraclePushDropped { price, error });
        }
      }
    }

    pub fn do_add_liquidity(
      who: &T::AccountId,
      amount_a: Balance,
      amount_b: Balance,
    ) -> Result<Balance, DispatchError> {
      ensure!(!T::Governance::is_paused(), Error::<T>::Paused);
      ensure!(amount_a > 0 && amount_b > 0, Error::<T>::ZeroAmount);
      let mut pool = Self::load()?;

      // |a/b - rA/rB| <= tol * rA/rB, multiplied through by b * rB
      let offered = U256::from(amount_a) * U256::from(pool.reserve_b);
      let pooled = U256::from(pool.reserve_a) * U256::from(amount_b);
      let deviation = if offered > pooled {
        offered - pooled
      } else {
        pooled - offered
      };
      let allowed = pooled
        .checked_mul(U256::from(LIQUIDITY_RATIO_TOLERANCE.deconstruct()))
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      let scaled_deviation = deviation
        .checked_mul(U256::from(Permill::ACCURACY))
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      ensure!(scaled_deviation <= allowed, Error::<T>::RatioOutOfBand);

      // Shares of a live pool are priced against the reserves, fees included
      let lp = if pool.total_lp == 0 {
        integer_sqrt(U256::from(amount_a) * U256::from(amount_b)).low_u128()
      } else {
        let by_a = mul_div(amount_a, pool.total_lp, pool.reserve_a)
          .ok_or(Error::<T>::ArithmeticOverflow)?;
        let by_b = mul_div(amount_b, pool.total_lp, pool.reserve_b)
          .ok_or(Error::<T>::ArithmeticOverflow)?;
        by_a.min(by_b)
      };
      ensure!(lp > 0, Error::<T>::ZeroAmount);

      let pool_account = Self::account_id();
      T::Assets::transfer(T::AssetA::get(), who, &pool_account, amount_a, Preservation::Expendable)?;
      T::Assets::transfer(T::AssetB::get(), who, &pool_account, amount_b, Preservation::Expendable)?;

      pool.reserve_a = pool
        .reserve_a
        .checked_add(amount_a)
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      pool.reserve_b = pool
        .reserve_b
        .checked_add(amount_b)
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      pool.total_lp = pool
        .total_lp
        .checked_add(lp)
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      pool.refresh_k();
      Pool::<T>::put(pool);
      LpShares::<T>::mutate(who, |shares| *shares = shares.saturating_add(lp));

      Self::deposit_event(Event::LiquidityAdded {
        who: who.clone(),
        amount_a,
        amount_b,
        lp_tokens: lp,
      });
      Ok(lp)
    }

    pub fn do_remove_liquidity(
      who: &T::AccountId,
      lp_tokens: Balance,
    ) -> Result<(Balance, Balance), DispatchError> {
      ensure!(!T::Governance::is_paused(), Error::<T>::Paused);
      ensure!(lp_tokens > 0, Error::<T>::ZeroAmount);
      let held = LpShares::<T>::get(who);
      ensure!(held >= lp_tokens, Error::<T>::InsufficientLpShares);
      let mut pool = Self::load()?;

      let amount_a = mul_div(lp_tokens, pool.reserve_a, pool.total_lp)
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      let amount_b = mul_div(lp_tokens, pool.reserve_b, pool.total_lp)
        .ok_or(Error::<T>::ArithmeticOverflow)?;
      ensure!(amount_a > 0 && amount_b > 0, Error::<T>::ZeroAmount);
      ensure!(
        amount_a < pool.reserve_a && amount_b < pool.reserve_b,
        Error::<T>::InsufficientLiquidity
      );

      let pool_account = Self::account_id();
      T::Assets::transfer(T::AssetA::get(), &pool_account, who, amount_a, Preservation::Expendable)?;
      T::Assets::transfer(T::AssetB::get(), &pool_account, who, amount_b, Preservation::Expendable)?;

      pool.reserve_a -= amount_a;
      pool.reserve_b -= amount_b;
      pool.total_lp = pool.total_lp.saturating_sub(lp_tokens);
      pool.refresh_k();
      Pool::<T>::put(pool);
      LpShares::<T>::insert(who, held - lp_tokens);

      Self::deposit_event(Event::LiquidityRemoved {
        who: who.clone(),
        amount_a,
        amount_b,
        lp_tokens,
      });
      Ok((amount_a, amount_b))
    }
  }
}

impl<T: Config> LiquidityVenue<T::AccountId, Balance> for Pallet<T> {
  fn swap(
    who: &T::AccountId,
    buying_asset_a: bool,
    amount_in: Balance,
    min_amount_out: Balance,
  ) -> Result<Balance, DispatchError> {
    Self::do_swap(who, buying_asset_a, amount_in, min_amount_out)
  }

  fn reserves() -> (Balance, Balance) {
    Pool::<T>::get()
      .map(|p| (p.reserve_a, p.reserve_b))
      .unwrap_or_default()
  }

  fn price() -> Price {
    Pool::<T>::get().map(|p| p.price()).unwrap_or_default()
  }
}
