#![cfg(feature = "runtime-benchmarks")]

use super::*;
use polkadot_sdk::frame_benchmarking::{account, v2::*};
use polkadot_sdk::frame_system::RawOrigin;

const SEED_RESERVE: Balance = 1_000_000_000_000;

/// Seeds the pool if genesis left it empty and funds a trader with both assets
fn funded_trader<T: Config>() -> T::AccountId {
  let pool_account = Pallet::<T>::account_id();
  frame_system::Pallet::<T>::inc_providers(&pool_account);
  if Pool::<T>::get().is_none() {
    T::Assets::mint_into(T::AssetA::get(), &pool_account, SEED_RESERVE)
      .expect("asset A exists in the benchmark runtime");
    T::Assets::mint_into(T::AssetB::get(), &pool_account, SEED_RESERVE)
      .expect("asset B exists in the benchmark runtime");
    let mut state = ExchangeState {
      reserve_a: SEED_RESERVE,
      reserve_b: SEED_RESERVE,
      k: 0,
      total_lp: SEED_RESERVE,
    };
    state.refresh_k();
    Pool::<T>::put(state);
  }
  let trader: T::AccountId = account("trader", 0, 0);
  frame_system::Pallet::<T>::inc_providers(&trader);
  T::Assets::mint_into(T::AssetA::get(), &trader, SEED_RESERVE).expect("asset A exists");
  T::Assets::mint_into(T::AssetB::get(), &trader, SEED_RESERVE).expect("asset B exists");
  trader
}

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn swap() {
    let trader = funded_trader::<T>();
    let reserve_b = Pool::<T>::get().map(|p| p.reserve_b).unwrap_or_default();

    #[extrinsic_call]
    swap(RawOrigin::Signed(trader), true, 1_000_000, 0);

    let after = Pool::<T>::get().map(|p| p.reserve_b).unwrap_or_default();
    assert_eq!(after, reserve_b + 1_000_000);
  }

  #[benchmark]
  fn add_liquidity() {
    let trader = funded_trader::<T>();
    let pool = Pool::<T>::get().expect("pool is seeded");
    let amount_b: Balance = 1_000_000;
    let amount_a = amount_b * pool.reserve_a / pool.reserve_b;

    #[extrinsic_call]
    add_liquidity(RawOrigin::Signed(trader.clone()), amount_a, amount_b);

    assert!(LpShares::<T>::get(&trader) > 0);
  }

  #[benchmark]
  fn remove_liquidity() {
    let trader = funded_trader::<T>();
    let pool = Pool::<T>::get().expect("pool is seeded");
    let amount_b: Balance = 1_000_000;
    let amount_a = amount_b * pool.reserve_a / pool.reserve_b;
    let lp = Pallet::<T>::do_add_liquidity(&trader, amount_a, amount_b)
      .expect("deposit at the pool ratio");

    #[extrinsic_call]
    remove_liquidity(RawOrigin::Signed(trader.clone()), lp);

    assert_eq!(LpShares::<T>::get(&trader), 0);
  }

  impl_benchmark_test_suite!(Pallet, crate::mock::new_test_ext(), crate::mock::Test);
}
