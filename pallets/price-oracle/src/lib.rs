//! Price Oracle Pallet
//!
//! Windowed running-average price accumulator fed by the exchange.
//!
//! Prices arrive either as a signed `update` from the registered feeder account or as a
//! `DeferredTask::PushPrice` delivered by the deferred-call scheduler on the feeder's behalf.
//! Both paths go through the same authorization check and the same accumulator.
//!
//! ## Accumulator
//!
//! - A price pushed `TwapWindow` seconds or more after the previous one resets the window.
//! - Once more than `TwapWindow / 16` samples are held, the sum is compressed to the mean times
//!   that bound, so old samples keep their average but lose weight.
//! - `sigma` is a dispersion proxy rebuilt from the mean and the sample count only.

#![cfg_attr(not(feature = "std"), no_std)]

pub use pallet::*;


#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod weights;
pub use weights::WeightInfo;

use frame::prelude::*;

use frame::deps::{frame_support::traits::UnixTime, sp_core::U256};
use primitives::{
  DeferredTask, DeferredTaskHandler, GovernanceRegistry, Moment, Price, PriceSource,
  math::integer_sqrt,
  params::{SIGMA_SAMPLE_LIMIT, TWAP_COMPRESSION_DIVISOR},
};

const LOG_TARGET: &str = "runtime::price-oracle";

#[frame::pallet]
pub mod pallet {
  use super::*;

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Wall-clock source for window and staleness checks
    type TimeProvider: UnixTime;

    /// Ownership-and-pause registry gating feeder changes
    type Governance: GovernanceRegistry<Self::AccountId>;

    /// Accumulation window in seconds
    #[pallet::constant]
    type TwapWindow: Get<u64>;

    /// Weight information
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  /// Accumulator state of the oracle
  #[derive(Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
  pub struct OracleState<AccountId> {
    /// Sum of the samples currently held
    pub price_sum: u128,
    /// Number of samples represented by `price_sum`
    pub sample_count: u64,
    /// Time of the last accepted sample
    pub last_update: Moment,
    /// The only account allowed to push prices
    pub feeder: AccountId,
  }

  impl<AccountId> OracleState<AccountId> {
    pub fn twap(&self) -> Price {
      if self.sample_count == 0 {
        return 0;
      }
      let mean = self.price_sum / u128::from(self.sample_count);
      Price::try_from(mean).unwrap_or(Price::MAX)
    }

    pub fn sigma(&self) -> Price {
      if self.sample_count < 2 {
        return 0;
      }
      let count = u128::from(self.sample_count);
      let mean = self.price_sum / count;
      // Only the running sum survives, so recent observations are rebuilt around the mean.
      let recent = (0..self.sample_count.min(SIGMA_SAMPLE_LIMIT)).map(|_| mean);
      let squared_deviation = recent
        .map(|price| {
          let diff = price.abs_diff(mean);
          diff.saturating_mul(diff)
        })
        .fold(0u128, |acc, d| acc.saturating_add(d));
      let variance = squared_deviation / count;
      integer_sqrt(U256::from(variance)).low_u64()
    }

    pub fn is_stale(&self, now: Moment, window: u64) -> bool {
      now.saturating_sub(self.last_update) > window.saturating_mul(2)
    }
  }

  #[pallet::storage]
  pub type Oracle<T: Config> = StorageValue<_, OracleState<T::AccountId>, OptionQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// A price sample was accepted
    PriceUpdated {
      price: Price,
      twap: Price,
      timestamp: Moment,
    },
    /// The feeder account was replaced
    FeederUpdated {
      previous: T::AccountId,
      new: T::AccountId,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Caller is not the registered feeder or not a governance account
    Unauthorized,
    /// The oracle has not been configured at genesis
    NotInitialized,
    /// Price sum overflowed
    ArithmeticOverflow,
  }

  #[pallet::genesis_config]
  #[derive(frame::prelude::DefaultNoBound)]
  pub struct GenesisConfig<T: Config> {
    /// Account allowed to push prices, normally the exchange pallet account
    pub feeder: Option<T::AccountId>,
    /// Seed sample, zero leaves the accumulator empty
    pub initial_price: Price,
  }

  #[pallet::genesis_build]
  impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
    fn build(&self) {
      if let Some(feeder) = &self.feeder {
        Pallet::<T>::save(OracleState {
          price_sum: u128::from(self.initial_price),
          sample_count: if self.initial_price > 0 { 1 } else { 0 },
          last_update: Pallet::<T>::now(),
          feeder: feeder.clone(),
        });
      }
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Push a new price sample (feeder only)
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::update())]
    pub fn update(origin: OriginFor<T>, new_price: Price) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_update(&who, new_price)
    }

    /// Replace the feeder account (governance only)
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::set_feeder())]
    pub fn set_feeder(origin: OriginFor<T>, feeder: T::AccountId) -> DispatchResult {
      let who = ensure_signed(origin)?;
      ensure!(T::Governance::is_authorized(&who), Error::<T>::Unauthorized);
      Self::do_set_feeder(feeder)
    }
  }

  impl<T: Config> Pallet<T> {
    pub fn load() -> Result<OracleState<T::AccountId>, DispatchError> {
      Oracle::<T>::get().ok_or_else(|| Error::<T>::NotInitialized.into())
    }

    pub fn save(state: OracleState<T::AccountId>) {
      Oracle::<T>::put(state);
    }

    /// Wall-clock seconds as seen by the current dispatch.
    ///
    /// Pushes delivered by the scheduler run in `on_initialize`, before the timestamp inherent,
    /// so they are stamped with the parent block's time. That one-block lag is well inside the
    /// `2 * TwapWindow` staleness bound and the window reset.
    pub fn now() -> Moment {
      T::TimeProvider::now().as_secs()
    }

    /// Upper bound on the samples the accumulator represents
    pub fn max_samples() -> u64 {
      (T::TwapWindow::get() / TWAP_COMPRESSION_DIVISOR).max(1)
    }

    pub fn do_set_feeder(feeder: T::AccountId) -> DispatchResult {
      let mut state = Self::load()?;
      let previous = core::mem::replace(&mut state.feeder, feeder.clone());
      Self::save(state);
      Self::deposit_event(Event::FeederUpdated {
        previous,
        new: feeder,
      });
      Ok(())
    }

    pub fn do_update(who: &T::AccountId, new_price: Price) -> DispatchResult {
      let mut state = Self::load()?;
      ensure!(*who == state.feeder, Error::<T>::Unauthorized);

      let now = Self::now();
      if now.saturating_sub(state.last_update) >= T::TwapWindow::get() {
        state.price_sum = u128::from(new_price);
        state.sample_count = 1;
      } else {
        state.price_sum = state
          .price_sum
          .checked_add(u128::from(new_price))
          .ok_or(Error::<T>::ArithmeticOverflow)?;
        state.sample_count = state.sample_count.saturating_add(1);
        let max_samples = Self::max_samples();
        if state.sample_count > max_samples {
          let mean = state.price_sum / u128::from(state.sample_count);
          state.price_sum = mean.saturating_mul(u128::from(max_samples));
          state.sample_count = max_samples;
        }
      }
      state.last_update = now;

      let twap = state.twap();
      log::debug!(
        target: LOG_TARGET,
        "price {} accepted, twap {} over {} samples",
        new_price,
        twap,
        state.sample_count
      );
      Self::save(state);

      Self::deposit_event(Event::PriceUpdated {
        price: new_price,
        twap,
        timestamp: now,
      });
      Ok(())
    }

    pub fn sample_count() -> u64 {
      Oracle::<T>::get().map(|s| s.sample_count).unwrap_or_default()
    }
  }
}

impl<T: Config> PriceSource for Pallet<T> {
  fn twap() -> Price {
    Oracle::<T>::get().map(|s| s.twap()).unwrap_or_default()
  }

  fn sigma() -> Price {
    Oracle::<T>::get().map(|s| s.sigma()).unwrap_or_default()
  }

  fn is_stale() -> bool {
    Oracle::<T>::get()
      .map(|s| s.is_stale(Self::now(), T::TwapWindow::get()))
      .unwrap_or(true)
  }
}

impl<T: Config> DeferredTaskHandler<T::AccountId> for Pallet<T> {
  fn handle(caller: &T::AccountId, task: &DeferredTask) -> Option<DispatchResult> {
    match task {
      DeferredTask::PushPrice { price } => Some(Self::do_update(caller, *price)),
      _ => None,
    }
  }
}
