//! Deferred Calls Pallet
//!
//! Slot-based scheduler for unattended execution of protocol tasks.
//!
//! Two kinds of work are queued here:
//!
//! - **Deferred calls** target one exact `Slot { period, thread }`. The caller reserves gas in
//!   that slot and escrows a quoted fee up front; the fee is refunded on cancellation and
//!   collected on execution. Quotes grow with slot congestion, so `find_cheapest_slot` prefers
//!   quiet slots.
//! - **Asynchronous messages** carry a validity window `[start_period, end_period]` and no fee.
//!   They are delivered best-effort from a per-block gas budget, delayed while the budget is
//!   exhausted and dropped once the window has passed.
//!
//! Each task runs in its own storage layer: a failing task leaves no state behind and does not
//! affect the other tasks of the block.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

#[cfg(test)]
pub mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod weights;
pub use weights::WeightInfo;

use frame::prelude::*;

use frame::deps::{
  frame_support::{
    storage::with_storage_layer,
    traits::{
      fungible::{Inspect as NativeInspect, Mutate as NativeMutate},
      tokens::Preservation,
    },
  },
  sp_runtime::traits::{AccountIdConversion, UniqueSaturatedInto, Zero},
};
use primitives::{
  DeferredCallId, DeferredCallScheduler, DeferredTask, DeferredTaskHandler, Slot, math::mul_div,
};

const LOG_TARGET: &str = "runtime::deferred-calls";

#[frame::pallet]
pub mod pallet {
  use super::*;

  pub type Balance = u128;

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Native currency used to pay scheduling fees
    type Currency: NativeMutate<Self::AccountId, Balance = Balance>
      + NativeInspect<Self::AccountId, Balance = Balance>;

    /// Routes due tasks to the pallets that own them
    type TaskHandler: DeferredTaskHandler<Self::AccountId>;

    /// Pallet ID for the fee escrow account
    #[pallet::constant]
    type PalletId: Get<frame::deps::frame_support::PalletId>;

    /// Receiver of fees for executed calls
    type FeeCollector: Get<Self::AccountId>;

    /// Number of threads per period
    #[pallet::constant]
    type ThreadCount: Get<u8>;

    /// Gas that can be reserved in a single slot
    #[pallet::constant]
    type SlotGasCapacity: Get<u64>;

    /// Maximum number of deferred calls in a single slot
    #[pallet::constant]
    type MaxCallsPerSlot: Get<u32>;

    /// Flat part of every deferred call fee
    #[pallet::constant]
    type BaseFee: Get<Balance>;

    /// Fee per unit of reserved gas in an empty slot
    #[pallet::constant]
    type GasPrice: Get<Balance>;

    /// Capacity of the asynchronous message queue
    #[pallet::constant]
    type MaxQueuedMessages: Get<u32>;

    /// Gas available for message delivery in one block
    #[pallet::constant]
    type MessageGasPerBlock: Get<u64>;

    /// Weight information
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  /// A call registered for one exact slot
  #[derive(Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
  pub struct DeferredCall<AccountId> {
    /// Payer of the fee, also the caller the task runs as
    pub owner: AccountId,
    pub task: DeferredTask,
    pub slot: Slot,
    pub max_gas: u64,
    /// Escrowed fee
    pub fee: Balance,
  }

  /// A fee-less message deliverable within a period window
  #[derive(Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
  pub struct AsyncMessage<AccountId> {
    pub id: DeferredCallId,
    pub sender: AccountId,
    pub task: DeferredTask,
    pub start_period: u64,
    pub end_period: u64,
    pub max_gas: u64,
  }

  #[pallet::storage]
  pub type NextCallId<T> = StorageValue<_, DeferredCallId, ValueQuery>;

  #[pallet::storage]
  pub type Calls<T: Config> =
    StorageMap<_, Blake2_128Concat, DeferredCallId, DeferredCall<T::AccountId>>;

  #[pallet::storage]
  pub type SlotCalls<T: Config> =
    StorageMap<_, Twox64Concat, Slot, BoundedVec<DeferredCallId, T::MaxCallsPerSlot>, ValueQuery>;

  #[pallet::storage]
  pub type SlotGasUsed<T: Config> = StorageMap<_, Twox64Concat, Slot, u64, ValueQuery>;

  #[pallet::storage]
  pub type MessageQueue<T: Config> =
    StorageValue<_, BoundedVec<AsyncMessage<T::AccountId>, T::MaxQueuedMessages>, ValueQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// A deferred call was registered and its fee escrowed
    CallScheduled {
      id: DeferredCallId,
      owner: T::AccountId,
      slot: Slot,
      max_gas: u64,
      fee: Balance,
    },
    /// A pending call was withdrawn and its fee refunded
    CallCancelled {
      id: DeferredCallId,
      owner: T::AccountId,
      refund: Balance,
    },
    /// A deferred call ran successfully
    CallExecuted { id: DeferredCallId, slot: Slot },
    /// A deferred call ran and was rolled back
    CallFailed {
      id: DeferredCallId,
      slot: Slot,
      error: DispatchError,
    },
    /// An asynchronous message entered the queue
    MessageQueued {
      id: DeferredCallId,
      sender: T::AccountId,
      start_period: u64,
      end_period: u64,
    },
    /// An asynchronous message was delivered
    MessageDelivered { id: DeferredCallId, period: u64 },
    /// An asynchronous message was delivered and rolled back
    MessageFailed {
      id: DeferredCallId,
      error: DispatchError,
    },
    /// An asynchronous message left its window undelivered
    MessageExpired { id: DeferredCallId },
    /// An asynchronous message was pushed out of a full queue while its window was open
    MessageDropped { id: DeferredCallId },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// The slot is in the past, out of range or cannot take the requested gas
    SlotUnavailable,
    /// The offered fee is below the current quote
    FeeTooLow,
    /// The slot holds the maximum number of calls
    SlotFull,
    /// No pending call with this id
    UnknownCall,
    /// Only the payer may cancel a call
    Unauthorized,
    /// The message queue is full
    QueueFull,
    /// The delivery window is empty or already over
    InvalidWindow,
    /// The message needs more gas than a block delivers
    MessageTooLarge,
    /// No pallet accepted the task
    UnroutedTask,
  }

  #[pallet::genesis_config]
  #[derive(frame::prelude::DefaultNoBound)]
  pub struct GenesisConfig<T: Config> {
    #[serde(skip)]
    pub _marker: core::marker::PhantomData<T>,
  }

  #[pallet::genesis_build]
  impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
    fn build(&self) {
      // Escrow account must survive holding fees below the existential deposit
      frame_system::Pallet::<T>::inc_providers(&Pallet::<T>::account_id());
    }
  }

  #[pallet::hooks]
  impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
    fn on_initialize(now: BlockNumberFor<T>) -> Weight {
      let period: u64 = now.unique_saturated_into();
      let calls_weight = Self::execute_due_calls(period);
      let messages_weight = Self::deliver_messages(period);
      calls_weight.saturating_add(messages_weight)
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Withdraw a pending deferred call paid by the caller
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::cancel_call())]
    pub fn cancel_call(origin: OriginFor<T>, id: DeferredCallId) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_cancel(&who, id)
    }
  }

  impl<T: Config> Pallet<T> {
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    pub fn period() -> u64 {
      frame_system::Pallet::<T>::block_number().unique_saturated_into()
    }

    pub fn pending_call(id: DeferredCallId) -> Option<DeferredCall<T::AccountId>> {
      Calls::<T>::get(id)
    }

    pub fn queued_messages() -> usize {
      MessageQueue::<T>::decode_len().unwrap_or_default()
    }

    fn next_id() -> DeferredCallId {
      NextCallId::<T>::mutate(|next| {
        let id = *next;
        *next = next.saturating_add(1);
        id
      })
    }

    pub fn do_quote(slot: Slot, max_gas: u64) -> Option<Balance> {
      if slot.period <= Self::period() || slot.thread >= T::ThreadCount::get() {
        return None;
      }
      let capacity = T::SlotGasCapacity::get();
      let used = SlotGasUsed::<T>::get(slot);
      if used.saturating_add(max_gas) > capacity {
        return None;
      }
      let queued = SlotCalls::<T>::decode_len(slot).unwrap_or_default();
      if queued >= T::MaxCallsPerSlot::get() as usize {
        return None;
      }
      let gas_fee = T::GasPrice::get().saturating_mul(Balance::from(max_gas));
      let congestion = mul_div(gas_fee, Balance::from(used), Balance::from(capacity))?;
      Some(
        T::BaseFee::get()
          .saturating_add(gas_fee)
          .saturating_add(congestion),
      )
    }

    pub fn do_find_cheapest_slot(start_period: u64, end_period: u64, max_gas: u64) -> Option<Slot> {
      let first = start_period.max(Self::period().saturating_add(1));
      let threads = T::ThreadCount::get();
      (first..=end_period)
        .flat_map(|period| (0..threads).map(move |thread| Slot::new(period, thread)))
        .filter_map(|slot| Self::do_quote(slot, max_gas).map(|fee| (fee, slot)))
        .min()
        .map(|(_, slot)| slot)
    }

    pub fn do_schedule(
      payer: &T::AccountId,
      task: DeferredTask,
      slot: Slot,
      max_gas: u64,
      fee: Balance,
    ) -> Result<DeferredCallId, DispatchError> {
      let quote = Self::do_quote(slot, max_gas).ok_or(Error::<T>::SlotUnavailable)?;
      ensure!(fee >= quote, Error::<T>::FeeTooLow);

      if !fee.is_zero() {
        T::Currency::transfer(payer, &Self::account_id(), fee, Preservation::Expendable)?;
      }
      let id = Self::next_id();
      SlotCalls::<T>::try_mutate(slot, |ids| ids.try_push(id)).map_err(|_| Error::<T>::SlotFull)?;
      SlotGasUsed::<T>::mutate(slot, |used| *used = used.saturating_add(max_gas));
      Calls::<T>::insert(
        id,
        DeferredCall {
          owner: payer.clone(),
          task,
          slot,
          max_gas,
          fee,
        },
      );

      log::debug!(
        target: LOG_TARGET,
        "call {} scheduled at {:?} for {:?}, fee {}",
        id,
        slot,
        task,
        fee
      );
      Self::deposit_event(Event::CallScheduled {
        id,
        owner: payer.clone(),
        slot,
        max_gas,
        fee,
      });
      Ok(id)
    }

    pub fn do_cancel(payer: &T::AccountId, id: DeferredCallId) -> DispatchResult {
      let call = Calls::<T>::get(id).ok_or(Error::<T>::UnknownCall)?;
      ensure!(call.owner == *payer, Error::<T>::Unauthorized);

      if !call.fee.is_zero() {
        T::Currency::transfer(&Self::account_id(), payer, call.fee, Preservation::Expendable)?;
      }
      SlotCalls::<T>::mutate(call.slot, |ids| ids.retain(|pending| *pending != id));
      SlotGasUsed::<T>::mutate(call.slot, |used| *used = used.saturating_sub(call.max_gas));
      Calls::<T>::remove(id);

      Self::deposit_event(Event::CallCancelled {
        id,
        owner: call.owner,
        refund: call.fee,
      });
      Ok(())
    }

    pub fn do_send_message(
      sender: &T::AccountId,
      task: DeferredTask,
      start_period: u64,
      end_period: u64,
      max_gas: u64,
    ) -> Result<DeferredCallId, DispatchError> {
      ensure!(
        start_period <= end_period && end_period > Self::period(),
        Error::<T>::InvalidWindow
      );
      ensure!(
        max_gas <= T::MessageGasPerBlock::get(),
        Error::<T>::MessageTooLarge
      );

      ensure!(
        Self::queued_messages() < T::MaxQueuedMessages::get() as usize,
        Error::<T>::QueueFull
      );

      let id = Self::next_id();
      let message = AsyncMessage {
        id,
        sender: sender.clone(),
        task,
        start_period,
        end_period,
        max_gas,
      };
      MessageQueue::<T>::try_mutate(|queue| queue.try_push(message))
        .map_err(|_| Error::<T>::QueueFull)?;

      Self::deposit_event(Event::MessageQueued {
        id,
        sender: sender.clone(),
        start_period,
        end_period,
      });
      Ok(id)
    }

    fn run_task(caller: &T::AccountId, task: &DeferredTask) -> DispatchResult {
      with_storage_layer(|| {
        T::TaskHandler::handle(caller, task).unwrap_or_else(|| Err(Error::<T>::UnroutedTask.into()))
      })
    }

    pub(crate) fn execute_due_calls(period: u64) -> Weight {
      let mut weight = T::DbWeight::get().reads(u64::from(T::ThreadCount::get()));
      for thread in 0..T::ThreadCount::get() {
        let slot = Slot::new(period, thread);
        let ids = SlotCalls::<T>::take(slot);
        SlotGasUsed::<T>::remove(slot);
        for id in ids {
          let Some(call) = Calls::<T>::take(id) else {
            continue;
          };
          let result = Self::run_task(&call.owner, &call.task);

          if !call.fee.is_zero() {
            let collector = T::FeeCollector::get();
            if let Err(e) = T::Currency::transfer(
              &Self::account_id(),
              &collector,
              call.fee,
              Preservation::Expendable,
            ) {
              log::error!(target: LOG_TARGET, "fee of call {} left in escrow: {:?}", id, e);
            }
          }

          match result {
            Ok(()) => Self::deposit_event(Event::CallExecuted { id, slot }),
            Err(error) => {
              log::warn!(target: LOG_TARGET, "call {} failed at {:?}: {:?}", id, slot, error);
              Self::deposit_event(Event::CallFailed { id, slot, error });
            }
          }
          weight = weight.saturating_add(T::WeightInfo::execute_call());
        }
      }
      weight
    }

    pub(crate) fn deliver_messages(period: u64) -> Weight {
      let mut weight = T::DbWeight::get().reads_writes(1, 1);
      let queue = MessageQueue::<T>::take();
      if queue.is_empty() {
        return weight;
      }

      let mut budget = T::MessageGasPerBlock::get();
      let mut retained = alloc::vec::Vec::with_capacity(queue.len());
      for message in queue {
        if message.end_period < period {
          log::debug!(target: LOG_TARGET, "message {} expired", message.id);
          Self::deposit_event(Event::MessageExpired { id: message.id });
          continue;
        }
        if message.start_period > period || message.max_gas > budget {
          retained.push(message);
          continue;
        }
        budget = budget.saturating_sub(message.max_gas);
        match Self::run_task(&message.sender, &message.task) {
          Ok(()) => Self::deposit_event(Event::MessageDelivered {
            id: message.id,
            period,
          }),
          Err(error) => {
            log::warn!(target: LOG_TARGET, "message {} failed: {:?}", message.id, error);
            Self::deposit_event(Event::MessageFailed {
              id: message.id,
              error,
            });
          }
        }
        weight = weight.saturating_add(T::WeightInfo::deliver_message());
      }

      MessageQueue::<T>::mutate(|queue| {
        // Messages sent by delivered tasks queue up behind the retained ones.
        let fresh = core::mem::take(queue);
        for message in retained.into_iter().chain(fresh) {
          let id = message.id;
          if queue.try_push(message).is_err() {
            log::warn!(target: LOG_TARGET, "message {} dropped, queue full", id);
            Self::deposit_event(Event::MessageDropped { id });
          }
        }
      });
      weight
    }
  }
}

impl<T: Config> DeferredCallScheduler<T::AccountId, Balance> for Pallet<T> {
  fn current_period() -> u64 {
    Self::period()
  }

  fn quote(slot: Slot, max_gas: u64) -> Option<Balance> {
    Self::do_quote(slot, max_gas)
  }

  fn find_cheapest_slot(start_period: u64, end_period: u64, max_gas: u64) -> Option<Slot> {
    Self::do_find_cheapest_slot(start_period, end_period, max_gas)
  }

  fn schedule(
    payer: &T::AccountId,
    task: DeferredTask,
    slot: Slot,
    max_gas: u64,
    fee: Balance,
  ) -> Result<DeferredCallId, DispatchError> {
    Self::do_schedule(payer, task, slot, max_gas, fee)
  }

  fn cancel(payer: &T::AccountId, id: DeferredCallId) -> DispatchResult {
    Self::do_cancel(payer, id)
  }

  fn send_message(
    sender: &T::AccountId,
    task: DeferredTask,
    start_period: u64,
    end_period: u64,
    max_gas: u64,
  ) -> Result<DeferredCallId, DispatchError> {
    Self::do_send_message(sender, task, start_period, end_period, max_gas)
  }
}
