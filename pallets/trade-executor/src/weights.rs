#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use core::marker::PhantomData;
use polkadot_sdk::frame_support::{
  traits::Get,
  weights::{constants::RocksDbWeight, Weight},
};

pub trait WeightInfo {
  fn rebalance() -> Weight;
  fn emergency_withdraw() -> Weight;
  fn set_strategy() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
  // Covers at most one venue swap and the NAV report.
  fn rebalance() -> Weight {
    Weight::from_parts(95_000_000, 9000)
      .saturating_add(T::DbWeight::get().reads(12))
      .saturating_add(T::DbWeight::get().writes(10))
  }

  fn emergency_withdraw() -> Weight {
    Weight::from_parts(52_000_000, 6000)
      .saturating_add(T::DbWeight::get().reads(5))
      .saturating_add(T::DbWeight::get().writes(4))
  }

  fn set_strategy() -> Weight {
    Weight::from_parts(14_000_000, 1500)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(1))
  }
}

impl WeightInfo for () {
  fn rebalance() -> Weight {
    Weight::from_parts(95_000_000, 9000)
      .saturating_add(RocksDbWeight::get().reads(12))
      .saturating_add(RocksDbWeight::get().writes(10))
  }

  fn emergency_withdraw() -> Weight {
    Weight::from_parts(52_000_000, 6000)
      .saturating_add(RocksDbWeight::get().reads(5))
      .saturating_add(RocksDbWeight::get().writes(4))
  }

  fn set_strategy() -> Weight {
    Weight::from_parts(14_000_000, 1500)
      .saturating_add(RocksDbWeight::get().reads(1))
      .saturating_add(RocksDbWeight::get().writes(1))
  }
}
