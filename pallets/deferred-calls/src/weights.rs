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
  fn cancel_call() -> Weight;
  fn execute_call() -> Weight;
  fn deliver_message() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
  fn cancel_call() -> Weight {
    Weight::from_parts(22_000_000, 2500)
      .saturating_add(T::DbWeight::get().reads(4))
      .saturating_add(T::DbWeight::get().writes(5))
  }

  // Covers the scheduler bookkeeping only; the routed task reports no weight of its own.
  fn execute_call() -> Weight {
    Weight::from_parts(40_000_000, 4000)
      .saturating_add(T::DbWeight::get().reads(6))
      .saturating_add(T::DbWeight::get().writes(6))
  }

  fn deliver_message() -> Weight {
    Weight::from_parts(18_000_000, 2000)
      .saturating_add(T::DbWeight::get().reads(3))
      .saturating_add(T::DbWeight::get().writes(2))
  }
}

impl WeightInfo for () {
  fn cancel_call() -> Weight {
    Weight::from_parts(22_000_000, 2500)
      .saturating_add(RocksDbWeight::get().reads(4))
      .saturating_add(RocksDbWeight::get().writes(5))
  }

  fn execute_call() -> Weight {
    Weight::from_parts(40_000_000, 4000)
      .saturating_add(RocksDbWeight::get().reads(6))
      .saturating_add(RocksDbWeight::get().writes(6))
  }

  fn deliver_message() -> Weight {
    Weight::from_parts(18_000_000, 2000)
      .saturating_add(RocksDbWeight::get().reads(3))
      .saturating_add(RocksDbWeight::get().writes(2))
  }
}
