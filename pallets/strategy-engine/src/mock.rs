use crate as pallet_strategy_engine;
use core::{cell::RefCell, time::Duration};
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl, parameter_types,
  traits::{ConstU8, ConstU32, ConstU64, ConstU128, Hooks, UnixTime},
};
use polkadot_sdk::frame_system;
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchError, DispatchResult,
  testing::H256,
  traits::{BlakeTwo256, IdentityLookup},
};
use primitives::{
  GovernanceRegistry, Price, PriceSource, RebalanceAction, RebalanceHandler,
  pallet_ids::{DEFERRED_CALLS_PALLET_ID, STRATEGY_ENGINE_PALLET_ID},
  params::{GAS_RESERVE, PRECISION, STRATEGY_MAX_GAS},
};

type Block = frame_system::mocking::MockBlock<Test>;

pub const ALICE: u64 = 1;
pub const OWNER: u64 = 10;
pub const COLLECTOR: u64 = 50;
pub const GOVERNOR: u64 = 99;

pub const INTERVAL: u64 = 10;
pub const BASE_FEE: u128 = 1_000;
pub const SLOT_CAPACITY: u64 = 10_000_000;
/// Quote for one evaluation in an empty slot
pub const EVALUATION_FEE: u128 = BASE_FEE + STRATEGY_MAX_GAS as u128;
pub const STRATEGY_FUNDS: u128 = 100_000_000;
pub const GENESIS_TIME: u64 = 1_700_000_000;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Balances: polkadot_sdk::pallet_balances,
    DeferredCalls: pallet_deferred_calls,
    StrategyEngine: pallet_strategy_engine,
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
  static PAUSED: RefCell<bool> = const { RefCell::new(false) };
  static NOW: RefCell<u64> = const { RefCell::new(GENESIS_TIME) };
  static TWAP: RefCell<Price> = const { RefCell::new(PRECISION) };
  static SIGMA: RefCell<Price> = const { RefCell::new(0) };
  static STALE: RefCell<bool> = const { RefCell::new(false) };
  static REBALANCES: RefCell<Vec<(u64, Price, Price, RebalanceAction)>> =
    const { RefCell::new(Vec::new()) };
  static FAIL_REBALANCE: RefCell<bool> = const { RefCell::new(false) };
}

pub struct MockGovernance;
impl GovernanceRegistry<u64> for MockGovernance {
  fn is_authorized(who: &u64) -> bool {
    *who == GOVERNOR
  }

  fn is_paused() -> bool {
    PAUSED.with(|p| *p.borrow())
  }
}

pub fn set_paused(paused: bool) {
  PAUSED.with(|p| *p.borrow_mut() = paused);
}

pub struct MockTime;
impl UnixTime for MockTime {
  fn now() -> Duration {
    Duration::from_secs(NOW.with(|n| *n.borrow()))
  }
}

pub struct MockPriceSource;
impl PriceSource for MockPriceSource {
  fn twap() -> Price {
    TWAP.with(|t| *t.borrow())
  }

  fn sigma() -> Price {
    SIGMA.with(|s| *s.borrow())
  }

  fn is_stale() -> bool {
    STALE.with(|s| *s.borrow())
  }
}

pub fn set_price(twap: Price, sigma: Price) {
  TWAP.with(|t| *t.borrow_mut() = twap);
  SIGMA.with(|s| *s.borrow_mut() = sigma);
}

pub fn set_stale(stale: bool) {
  STALE.with(|s| *s.borrow_mut() = stale);
}

/// Records rebalance requests, optionally failing them
pub struct MockExecutor;
impl RebalanceHandler<u64> for MockExecutor {
  fn rebalance(caller: &u64, twap: Price, sigma: Price, action: RebalanceAction) -> DispatchResult {
    if FAIL_REBALANCE.with(|f| *f.borrow()) {
      return Err(DispatchError::Exhausted);
    }
    REBALANCES.with(|r| r.borrow_mut().push((*caller, twap, sigma, action)));
    Ok(())
  }
}

pub fn rebalances() -> Vec<(u64, Price, Price, RebalanceAction)> {
  REBALANCES.with(|r| r.borrow().clone())
}

pub fn fail_rebalance(fail: bool) {
  FAIL_REBALANCE.with(|f| *f.borrow_mut() = fail);
}

parameter_types! {
  pub const DeferredCallsPalletId: PalletId = PalletId(*DEFERRED_CALLS_PALLET_ID);
  pub const StrategyEnginePalletId: PalletId = PalletId(*STRATEGY_ENGINE_PALLET_ID);
  pub const FeeCollector: u64 = COLLECTOR;
}

impl pallet_deferred_calls::Config for Test {
  type Currency = Balances;
  type TaskHandler = StrategyEngine;
  type PalletId = DeferredCallsPalletId;
  type FeeCollector = FeeCollector;
  type ThreadCount = ConstU8<2>;
  type SlotGasCapacity = ConstU64<SLOT_CAPACITY>;
  type MaxCallsPerSlot = ConstU32<4>;
  type BaseFee = ConstU128<BASE_FEE>;
  type GasPrice = ConstU128<1>;
  type MaxQueuedMessages = ConstU32<8>;
  type MessageGasPerBlock = ConstU64<SLOT_CAPACITY>;
  type WeightInfo = ();
}

impl pallet_strategy_engine::Config for Test {
  type Currency = Balances;
  type PriceSource = MockPriceSource;
  type Executor = MockExecutor;
  type Scheduler = DeferredCalls;
  type Governance = MockGovernance;
  type TimeProvider = MockTime;
  type PalletId = StrategyEnginePalletId;
  type StrategyInterval = ConstU64<INTERVAL>;
  type GasReserve = ConstU128<GAS_RESERVE>;
  type WeightInfo = ();
}

pub fn strategy_account() -> u64 {
  StrategyEngine::account_id()
}

pub fn build_ext(strategy_funds: u128) -> polkadot_sdk::sp_io::TestExternalities {
  PAUSED.with(|p| *p.borrow_mut() = false);
  NOW.with(|n| *n.borrow_mut() = GENESIS_TIME);
  TWAP.with(|t| *t.borrow_mut() = PRECISION);
  SIGMA.with(|s| *s.borrow_mut() = 0);
  STALE.with(|s| *s.borrow_mut() = false);
  REBALANCES.with(|r| r.borrow_mut().clear());
  FAIL_REBALANCE.with(|f| *f.borrow_mut() = false);

  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  polkadot_sdk::pallet_balances::GenesisConfig::<Test> {
    balances: vec![
      (ALICE, STRATEGY_FUNDS),
      (OWNER, STRATEGY_FUNDS),
      (COLLECTOR, 1),
      (strategy_account(), strategy_funds),
    ],
    dev_accounts: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  pallet_deferred_calls::GenesisConfig::<Test>::default()
    .assimilate_storage(&mut t)
    .unwrap();

  pallet_strategy_engine::GenesisConfig::<Test> {
    owner: Some(OWNER),
    twap_threshold: None,
    sigma_threshold: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  let mut ext = polkadot_sdk::sp_io::TestExternalities::new(t);
  ext.execute_with(|| System::set_block_number(1));
  ext
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  build_ext(STRATEGY_FUNDS)
}

pub fn run_to_block(n: u64) {
  while System::block_number() < n {
    let next = System::block_number() + 1;
    System::set_block_number(next);
    NOW.with(|t| *t.borrow_mut() += 6);
    DeferredCalls::on_initialize(next);
  }
}
