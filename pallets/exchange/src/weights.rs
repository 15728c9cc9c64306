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
  fn swap() -> Weight;
  fn add_liquidity() -> Weight;
  fn remove_liquidity() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
  // Includes queueing the price push with the scheduler.
  fn swap() -> Weight {
    Weight::from_parts(65_000_000, 7000)
      .saturating_add(T::DbWeight::get().reads(8))
      .saturating_add(T::DbWeight::get().writes(7))
  }

  fn add_liquidity() -> Weight {
    Weight::from_parts(58_000_000, 6500)
      .saturating_add(T::DbWeight::get().reads(6))
      .saturating_add(T::DbWeight::get().writes(6))
  }

  fn remove_liquidity() -> Weight {
    Weight::from_parts(56_000_000, 6500)
      .saturating_add(T::DbWeight::get().reads(6))
      .saturating_add(T::DbWeight::get().writes(6))
  }
}

impl WeightInfo for () {
  fn swap() -> Weight {
    Weight::from_parts(65_000_000, 7000)
      .saturating_add(RocksDbWeight::get().reads(8))
      .saturating_add(RocksDbWeight::get().writes(7))
  }

  fn add_liquidity() -> Weight {
    Weight::from_parts(58_000_000, 6500)
      .saturating_add(RocksDbWeight::get().reads(6))
      .saturating_add(RocksDbWeight::get().writes(6))
  }

  fn remove_liquidity() -> Weight {
    Weight::from_parts(56_000_000, 6500)
      .saturating_add(RocksDbWeight::get().reads(6))
      .saturating_add(RocksDbWeight::get().writes(6))
  }
}
