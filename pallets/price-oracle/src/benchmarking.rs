#![cfg(feature = "runtime-benchmarks")]

use super::*;
use polkadot_sdk::frame_benchmarking::{account, v2::*};
use polkadot_sdk::frame_system::RawOrigin;

fn seed_oracle<T: Config>(feeder: &T::AccountId) {
  Pallet::<T>::save(OracleState {
    price_sum: 1_000_000,
    sample_count: 1,
    last_update: Pallet::<T>::now(),
    feeder: feeder.clone(),
  });
}

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn update() {
    let feeder: T::AccountId = account("feeder", 0, 0);
    seed_oracle::<T>(&feeder);

    #[extrinsic_call]
    update(RawOrigin::Signed(feeder), 1_100_000);

    assert_eq!(Pallet::<T>::sample_count(), 2);
  }

  #[benchmark]
  fn set_feeder() {
    let feeder: T::AccountId = account("feeder", 0, 0);
    let replacement: T::AccountId = account("feeder", 1, 0);
    seed_oracle::<T>(&feeder);

    #[block]
    {
      Pallet::<T>::do_set_feeder(replacement.clone()).expect("oracle seeded above");
    }

    assert_eq!(Pallet::<T>::load().map(|s| s.feeder).ok(), Some(replacement));
  }

  impl_benchmark_test_suite!(Pallet, crate::mock::new_test_ext(), crate::mock::Test);
}
