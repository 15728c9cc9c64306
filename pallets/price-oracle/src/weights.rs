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
  fn update() -> Weight;
  fn set_feeder() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
  fn update() -> Weight {
    Weight::from_parts(12_000_000, 1500)
      .saturating_add(T::DbWeight::get().reads(2))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn set_feeder() -> Weight {
    Weight::from_parts(9_000_000, 1500)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(1))
  }
}

impl WeightInfo for () {
  fn update() -> Weight {
    Weight::from_parts(12_000_000, 1500)
      .saturating_add(RocksDbWeight::get().reads(2))
      .saturating_add(RocksDbWeight::get().writes(1))
  }

  fn set_feeder() -> Weight {
    Weight::from_parts(9_000_000, 1500)
      .saturating_add(RocksDbWeight::get().reads(1))
      .saturating_add(RocksDbWeight::get().writes(1))
  }
}
