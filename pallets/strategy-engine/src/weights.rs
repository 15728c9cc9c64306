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
  fn start_strategy() -> Weight;
  fn stop_strategy() -> Weight;
  fn update_thresholds() -> Weight;
  fn transfer_ownership() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
  // Includes the cheapest-slot search over the whole window.
  fn start_strategy() -> Weight {
    Weight::from_parts(45_000_000, 6000)
      .saturating_add(T::DbWeight::get().reads(8))
      .saturating_add(T::DbWeight::get().writes(6))
  }

  fn stop_strategy() -> Weight {
    Weight::from_parts(30_000_000, 3500)
      .saturating_add(T::DbWeight::get().reads(4))
      .saturating_add(T::DbWeight::get().writes(5))
  }

  fn update_thresholds() -> Weight {
    Weight::from_parts(12_000_000, 1500)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn transfer_ownership() -> Weight {
    Weight::from_parts(12_000_000, 1500)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(1))
  }
}

impl WeightInfo for () {
  fn start_strategy() -> Weight {
    Weight::from_parts(45_000_000, 6000)
      .saturating_add(RocksDbWeight::get().reads(8))
      .saturating_add(RocksDbWeight::get().writes(6))
  }

  fn stop_strategy() -> Weight {
    Weight::from_parts(30_000_000, 3500)
      .saturating_add(RocksDbWeight::get().reads(4))
      .saturating_add(RocksDbWeight::get().writes(5))
  }

  fn update_thresholds() -> Weight {
    Weight::from_parts(12_000_000, 1500)
      .saturating_add(RocksDbWeight::get().reads(1))
      .saturating_add(RocksDbWeight::get().writes(1))
  }

  fn transfer_ownership() -> Weight {
    Weight::from_parts(12_000_000, 1500)
      .saturating_add(RocksDbWeight::get().reads(1))
      .saturating_add(RocksDbWeight::get().writes(1))
  }
}
