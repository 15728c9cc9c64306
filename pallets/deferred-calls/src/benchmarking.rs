#![cfg(feature = "runtime-benchmarks")]

use super::*;
use polkadot_sdk::frame_benchmarking::{account, v2::*};
use polkadot_sdk::frame_system::RawOrigin;

fn funded_payer<T: Config>() -> T::AccountId {
  let payer: T::AccountId = account("payer", 0, 0);
  T::Currency::set_balance(&payer, Balance::MAX / 4);
  frame_system::Pallet::<T>::inc_providers(&Pallet::<T>::account_id());
  payer
}

fn schedule_one<T: Config>(payer: &T::AccountId) -> (DeferredCallId, Slot) {
  let gas = T::SlotGasCapacity::get() / 2;
  let slot = Pallet::<T>::do_find_cheapest_slot(
    Pallet::<T>::period().saturating_add(1),
    Pallet::<T>::period().saturating_add(10),
    gas,
  )
  .expect("empty schedule has free slots");
  let fee = Pallet::<T>::do_quote(slot, gas).expect("slot is free");
  let id = Pallet::<T>::do_schedule(payer, DeferredTask::EvaluateStrategy, slot, gas, fee)
    .expect("payer is funded");
  (id, slot)
}

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn cancel_call() {
    let payer = funded_payer::<T>();
    let (id, _) = schedule_one::<T>(&payer);

    #[extrinsic_call]
    cancel_call(RawOrigin::Signed(payer), id);

    assert!(Calls::<T>::get(id).is_none());
  }

  #[benchmark]
  fn execute_call() {
    let payer = funded_payer::<T>();
    let (id, slot) = schedule_one::<T>(&payer);

    #[block]
    {
      frame_system::Pallet::<T>::set_block_number(slot.period.unique_saturated_into());
      Pallet::<T>::execute_due_calls(slot.period);
    }

    assert!(Calls::<T>::get(id).is_none());
  }

  #[benchmark]
  fn deliver_message() {
    let sender = funded_payer::<T>();
    let start = Pallet::<T>::period().saturating_add(1);
    Pallet::<T>::do_send_message(
      &sender,
      DeferredTask::PushPrice { price: 1_000_000 },
      start,
      start.saturating_add(10),
      T::MessageGasPerBlock::get(),
    )
    .expect("queue is empty");

    #[block]
    {
      frame_system::Pallet::<T>::set_block_number(start.unique_saturated_into());
      Pallet::<T>::deliver_messages(start);
    }

    assert_eq!(Pallet::<T>::queued_messages(), 0);
  }

  impl_benchmark_test_suite!(Pallet, crate::mock::new_test_ext(), crate::mock::Test);
}
