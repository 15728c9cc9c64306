#![cfg(feature = "runtime-benchmarks")]

use super::*;
use frame::deps::frame_support::traits::fungible::Mutate as NativeMutate;
use polkadot_sdk::frame_benchmarking::{account, v2::*};
use polkadot_sdk::frame_system::RawOrigin;

/// Installs a benchmark owner and funds the strategy account for slot fees
fn configured_owner<T: Config>() -> T::AccountId
where
  T::Currency: NativeMutate<T::AccountId>,
{
  let owner: T::AccountId = account("owner", 0, 0);
  Strategy::<T>::put(StrategyState {
    owner: owner.clone(),
    twap_threshold: DEFAULT_TWAP_THRESHOLD,
    sigma_threshold: DEFAULT_SIGMA_THRESHOLD,
    active: false,
    next_execution: None,
  });
  T::Currency::mint_into(&Pallet::<T>::account_id(), Balance::from(u64::MAX))
    .expect("native currency accepts the mint");
  owner
}

#[benchmarks(where T::Currency: NativeMutate<T::AccountId>)]
mod benches {
  use super::*;

  #[benchmark]
  fn start_strategy() {
    let owner = configured_owner::<T>();

    #[extrinsic_call]
    start_strategy(RawOrigin::Signed(owner));

    assert!(Pallet::<T>::is_active());
  }

  #[benchmark]
  fn stop_strategy() {
    let owner = configured_owner::<T>();
    Pallet::<T>::start_strategy(RawOrigin::Signed(owner.clone()).into())
      .expect("funded strategy arms its first evaluation");

    #[extrinsic_call]
    stop_strategy(RawOrigin::Signed(owner));

    assert!(Pallet::<T>::next_execution().is_none());
  }

  #[benchmark]
  fn update_thresholds() {
    let owner = configured_owner::<T>();

    #[extrinsic_call]
    update_thresholds(RawOrigin::Signed(owner), 2 * DEFAULT_TWAP_THRESHOLD, 1);

    assert_eq!(
      Strategy::<T>::get().map(|s| s.sigma_threshold),
      Some(1)
    );
  }

  #[benchmark]
  fn transfer_ownership() {
    configured_owner::<T>();
    let new_owner: T::AccountId = account("new_owner", 0, 0);

    #[block]
    {
      Pallet::<T>::do_transfer_ownership(new_owner.clone()).expect("strategy is configured");
    }

    assert_eq!(Strategy::<T>::get().map(|s| s.owner), Some(new_owner));
  }

  impl_benchmark_test_suite!(Pallet, crate::mock::new_test_ext(), crate::mock::Test);
}
