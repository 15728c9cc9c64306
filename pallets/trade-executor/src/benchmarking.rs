#![cfg(feature = "runtime-benchmarks")]

use super::*;
use polkadot_sdk::frame_benchmarking::{account, v2::*};
use polkadot_sdk::frame_system::RawOrigin;

const POSITION: Balance = 1_000_000;

/// Configures the executor with a benchmark owner and funds its position
fn configured_owner<T: Config>() -> T::AccountId {
  let owner: T::AccountId = account("owner", 0, 0);
  let account = Pallet::<T>::account_id();
  frame_system::Pallet::<T>::inc_providers(&account);
  Executor::<T>::put(ExecutorState {
    owner: owner.clone(),
    strategy: owner.clone(),
  });
  T::Assets::mint_into(T::AssetA::get(), &account, POSITION)
    .expect("asset A exists in the benchmark runtime");
  T::Assets::mint_into(T::AssetB::get(), &account, POSITION)
    .expect("asset B exists in the benchmark runtime");
  owner
}

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn rebalance() {
    let owner = configured_owner::<T>();

    #[extrinsic_call]
    rebalance(
      RawOrigin::Signed(owner),
      PRECISION,
      0,
      RebalanceAction::Volatility,
    );
  }

  #[benchmark]
  fn emergency_withdraw() {
    let owner = configured_owner::<T>();
    let recipient: T::AccountId = account("recipient", 0, 0);

    #[extrinsic_call]
    emergency_withdraw(RawOrigin::Signed(owner), recipient.clone());

    assert_eq!(Pallet::<T>::holdings(&Pallet::<T>::account_id()), (0, 0));
  }

  #[benchmark]
  fn set_strategy() {
    configured_owner::<T>();
    let strategy: T::AccountId = account("strategy", 0, 0);

    #[block]
    {
      Pallet::<T>::do_set_strategy(strategy.clone()).expect("executor is configured");
    }

    assert_eq!(Executor::<T>::get().map(|s| s.strategy), Some(strategy));
  }

  impl_benchmark_test_suite!(Pallet, crate::mock::new_test_ext(), crate::mock::Test);
}
