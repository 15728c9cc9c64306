#![cfg(feature = "runtime-benchmarks")]

use super::*;
use polkadot_sdk::frame_benchmarking::{account, v2::*};
use polkadot_sdk::frame_system::RawOrigin;

fn funded_depositor<T: Config>() -> T::AccountId {
  let who: T::AccountId = account("depositor", 0, 0);
  frame_system::Pallet::<T>::inc_providers(&who);
  frame_system::Pallet::<T>::inc_providers(&Pallet::<T>::account_id());
  T::Assets::mint_into(T::Asset::get(), &who, T::MinDeposit::get().saturating_mul(1_000))
    .expect("underlying asset exists in the benchmark runtime");
  if Vault::<T>::get().is_none() {
    Vault::<T>::put(VaultState {
      total_assets: 0,
      total_shares: 0,
      executor: account("executor", 0, 0),
    });
  }
  who
}

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn deposit() {
    let who = funded_depositor::<T>();
    let amount = T::MinDeposit::get().saturating_mul(10);

    #[extrinsic_call]
    deposit(RawOrigin::Signed(who.clone()), amount);

    assert!(Shares::<T>::get(&who) > 0);
  }

  #[benchmark]
  fn withdraw() {
    let who = funded_depositor::<T>();
    let shares = Pallet::<T>::do_deposit(&who, T::MinDeposit::get().saturating_mul(10))
      .expect("depositor is funded");

    #[extrinsic_call]
    withdraw(RawOrigin::Signed(who.clone()), shares);

    assert_eq!(Shares::<T>::get(&who), 0);
  }

  #[benchmark]
  fn sync() {
    funded_depositor::<T>();
    let executor = Pallet::<T>::load().expect("vault is configured").executor;

    #[extrinsic_call]
    sync(RawOrigin::Signed(executor), 42);

    assert_eq!(Pallet::<T>::total_assets(), 42);
  }

  #[benchmark]
  fn set_executor() {
    funded_depositor::<T>();
    let executor: T::AccountId = account("executor", 1, 0);

    #[block]
    {
      Pallet::<T>::do_set_executor(executor.clone()).expect("vault is configured");
    }

    assert_eq!(Pallet::<T>::load().map(|s| s.executor).ok(), Some(executor));
  }

  impl_benchmark_test_suite!(Pallet, crate::mock::new_test_ext(), crate::mock::Test);
}
