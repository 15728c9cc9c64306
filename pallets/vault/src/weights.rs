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
  fn deposit() -> Weight;
  fn withdraw() -> Weight;
  fn sync() -> Weight;
  fn set_executor() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
  fn deposit() -> Weight {
    Weight::from_parts(48_000_000, 5000)
      .saturating_add(T::DbWeight::get().reads(5))
      .saturating_add(T::DbWeight::get().writes(4))
  }

  fn withdraw() -> Weight {
    Weight::from_parts(47_000_000, 5000)
      .saturating_add(T::DbWeight::get().reads(5))
      .saturating_add(T::DbWeight::get().writes(4))
  }

  fn sync() -> Weight {
    Weight::from_parts(15_000_000, 1500)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn set_executor() -> Weight {
    Weight::from_parts(14_000_000, 1500)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(1))
  }
}

impl WeightInfo for () {
  fn deposit() -> Weight {
    Weight::from_parts(48_000_000, 5000)
      .saturating_add(RocksDbWeight::get().reads(5))
      .saturating_add(RocksDbWeight::get().writes(4))
  }

  fn withdraw() -> Weight {
    Weight::from_parts(47_000_000, 5000)
      .saturating_add(RocksDbWeight::get().reads(5))
      .saturating_add(RocksDbWeight::get().writes(4))
  }

  fn sync() -> Weight {
    Weight::from_parts(15_000_000, 1500)
      .saturating_add(RocksDbWeight::get().reads(1))
      .saturating_add(RocksDbWeight::get().writes(1))
  }

  fn set_executor() -> Weight {
    Weight::from_parts(14_000_000, 1500)
      .saturating_add(RocksDbWeight::get().reads(1))
      .saturating_add(RocksDbWeight::get().writes(1))
  }
}
