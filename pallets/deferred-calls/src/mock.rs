use crate as pallet_deferred_calls;
use core::cell::RefCell;
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl, parameter_types,
  storage::unhashed,
  traits::{ConstU8, ConstU32, ConstU64, ConstU128, Hooks},
};
use polkadot_sdk::frame_system;
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchError, DispatchResult,
  testing::H256,
  traits::{BlakeTwo256, IdentityLookup},
};
use primitives::{DeferredTask, DeferredTaskHandler};

type Block = frame_system::mocking::MockBlock<Test>;

pub const ALICE: u64 = 1;
pub const BOB: u64 = 2;
/// Tasks from this caller write a marker and then fail
pub const FAILING: u64 = 3;
/// Tasks from this caller are not claimed by any handler
pub const UNROUTED: u64 = 4;
/// Tasks from this caller send `RELAYED_MESSAGES` follow-up messages to BOB
pub const RELAY: u64 = 5;
pub const RELAYED_MESSAGES: u64 = 2;
pub const COLLECTOR: u64 = 50;
pub const INITIAL_BALANCE: u128 = 100_000_000;
pub const MARKER_KEY: &[u8] = b"deferred-calls::marker";

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Balances: polkadot_sdk::pallet_balances,
    DeferredCalls: pallet_deferred_calls,
  }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
  type Block = Block;
  type AccountId = u64;
  type Lookup = IdentityLookup<Self::AccountId>;
  type Hash = H256;
  type Hashing = BlakeTwo256;
  type AccountData = polkadot_sdk::pallet_balances::AccountData<u128>;
}

impl polkadot_sdk::pallet_balances::Config for Test {
  type MaxLocks = ();
  type MaxReserves = ();
  type ReserveIdentifier = [u8; 8];
  type Balance = u128;
  type DustRemoval = ();
  type RuntimeEvent = RuntimeEvent;
  type ExistentialDeposit = ConstU128<1>;
  type AccountStore = System;
  type WeightInfo = ();
  type FreezeIdentifier = ();
  type MaxFreezes = ();
  type RuntimeHoldReason = ();
  type RuntimeFreezeReason = ();
  type DoneSlashHandler = ();
}

thread_local! {
  static EXECUTED: RefCell<Vec<(u64, DeferredTask)>> = const { RefCell::new(Vec::new()) };
}

pub fn executed() -> Vec<(u64, DeferredTask)> {
  EXECUTED.with(|e| e.borrow().clone())
}

pub struct RecordingHandler;
impl DeferredTaskHandler<u64> for RecordingHandler {
  fn handle(caller: &u64, task: &DeferredTask) -> Option<DispatchResult> {
    if *caller == UNROUTED {
      return None;
    }
    unhashed::put(MARKER_KEY, &true);
    if *caller == FAILING {
      return Some(Err(DispatchError::CannotLookup));
    }
    EXECUTED.with(|e| e.borrow_mut().push((*caller, *task)));
    if *caller == RELAY {
      let period = DeferredCalls::period();
      for _ in 0..RELAYED_MESSAGES {
        if let Err(e) = DeferredCalls::do_send_message(&BOB, *task, period + 1, period + 3, 1_000) {
          return Some(Err(e));
        }
      }
    }
    Some(Ok(()))
  }
}

parameter_types! {
  pub const DeferredCallsPalletId: PalletId = PalletId(*primitives::pallet_ids::DEFERRED_CALLS_PALLET_ID);
  pub const FeeCollector: u64 = COLLECTOR;
}

pub const SLOT_CAPACITY: u64 = 10_000_000;
pub const BASE_FEE: u128 = 100;
pub const MESSAGE_GAS_PER_BLOCK: u64 = 2_000_000;

impl pallet_deferred_calls::Config for Test {
  type Currency = Balances;
  type TaskHandler = RecordingHandler;
  type PalletId = DeferredCallsPalletId;
  type FeeCollector = FeeCollector;
  type ThreadCount = ConstU8<2>;
  type SlotGasCapacity = ConstU64<SLOT_CAPACITY>;
  type MaxCallsPerSlot = ConstU32<3>;
  type BaseFee = ConstU128<BASE_FEE>;
  type GasPrice = ConstU128<1>;
  type MaxQueuedMessages = ConstU32<4>;
  type MessageGasPerBlock = ConstU64<MESSAGE_GAS_PER_BLOCK>;
  type WeightInfo = ();
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  EXECUTED.with(|e| e.borrow_mut().clear());
  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();
  polkadot_sdk::pallet_balances::GenesisConfig::<Test> {
    balances: vec![
      (ALICE, INITIAL_BALANCE),
      (BOB, INITIAL_BALANCE),
      (FAILING, INITIAL_BALANCE),
      (UNROUTED, INITIAL_BALANCE),
      (COLLECTOR, 1),
    ],
    dev_accounts: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();
  pallet_deferred_calls::GenesisConfig::<Test>::default()
    .assimilate_storage(&mut t)
    .unwrap();
  let mut ext = polkadot_sdk::sp_io::TestExternalities::new(t);
  ext.execute_with(|| System::set_block_number(1));
  ext
}

pub fn run_to_block(n: u64) {
  while System::block_number() < n {
    let next = System::block_number() + 1;
    System::set_block_number(next);
    DeferredCalls::on_initialize(next);
  }
}
