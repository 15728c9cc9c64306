use crate as pallet_trade_executor;
use core::cell::RefCell;
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl, parameter_types,
  traits::{
    AsEnsureOriginWithArg, ConstU32, ConstU128,
    fungibles::Mutate,
    tokens::Preservation,
  },
};
use polkadot_sdk::frame_system::{self, EnsureRoot, EnsureSigned};
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchError, DispatchResult,
  testing::H256,
  traits::{BlakeTwo256, IdentityLookup},
};
use primitives::{
  Balance, GovernanceRegistry, LiquidityVenue, NavSink, Price,
  pallet_ids::TRADE_EXECUTOR_PALLET_ID,
  params::{BASIS_POINTS, PRECISION},
};

type Block = frame_system::mocking::MockBlock<Test>;

pub const ALICE: u64 = 1;
pub const RECIPIENT: u64 = 2;
pub const STRATEGY: u64 = 30;
pub const OWNER: u64 = 31;
pub const VENUE: u64 = 40;
pub const GOVERNOR: u64 = 99;
pub const ASSET_ADMIN: u64 = 100;

pub const ASSET_A: u32 = 1;
pub const ASSET_B: u32 = 2;
pub const VENUE_FUNDS: Balance = 1_000_000_000_000;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Balances: polkadot_sdk::pallet_balances,
    Assets: polkadot_sdk::pallet_assets,
    TradeExecutor: pallet_trade_executor,
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

impl polkadot_sdk::pallet_assets::Config for Test {
  type RuntimeEvent = RuntimeEvent;
  type Balance = u128;
  type AssetId = u32;
  type AssetIdParameter = u32;
  type Currency = Balances;
  type CreateOrigin = AsEnsureOriginWithArg<EnsureSigned<Self::AccountId>>;
  type ForceOrigin = EnsureRoot<Self::AccountId>;
  type AssetDeposit = ConstU128<1>;
  type AssetAccountDeposit = ConstU128<1>;
  type MetadataDepositBase = ConstU128<1>;
  type MetadataDepositPerByte = ConstU128<1>;
  type ApprovalDeposit = ConstU128<1>;
  type StringLimit = ConstU32<50>;
  type Freezer = ();
  type Extra = ();
  type CallbackHandle = ();
  type WeightInfo = ();
  type RemoveItemsLimit = ConstU32<5>;
  type Holder = ();
  type ReserveData = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = ();
}

thread_local! {
  static PAUSED: RefCell<bool> = const { RefCell::new(false) };
  static VENUE_PRICE: RefCell<Price> = const { RefCell::new(PRECISION) };
  static VENUE_HAIRCUT_BPS: RefCell<u32> = const { RefCell::new(0) };
  static SWAPS: RefCell<Vec<(bool, Balance, Balance)>> = const { RefCell::new(Vec::new()) };
  static NAV: RefCell<Balance> = const { RefCell::new(0) };
  static NAV_REPORTS: RefCell<Vec<(u64, Balance)>> = const { RefCell::new(Vec::new()) };
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

/// Fixed-price venue settling against `VENUE`, with an optional haircut on the output.
///
/// Ignores `min_amount_out` so that the executor's own output check is exercised.
pub struct MockVenue;
impl LiquidityVenue<u64, Balance> for MockVenue {
  fn swap(
    who: &u64,
    buying_asset_a: bool,
    amount_in: Balance,
    _min_amount_out: Balance,
  ) -> Result<Balance, DispatchError> {
    let price = Balance::from(VENUE_PRICE.with(|p| *p.borrow()));
    let haircut = Balance::from(VENUE_HAIRCUT_BPS.with(|h| *h.borrow()));
    let (asset_in, asset_out, gross) = if buying_asset_a {
      (ASSET_B, ASSET_A, amount_in * Balance::from(PRECISION) / price)
    } else {
      (ASSET_A, ASSET_B, amount_in * price / Balance::from(PRECISION))
    };
    let bps = Balance::from(BASIS_POINTS);
    let amount_out = gross * (bps - haircut) / bps;
    <Assets as Mutate<u64>>::transfer(asset_in, who, &VENUE, amount_in, Preservation::Expendable)?;
    <Assets as Mutate<u64>>::transfer(asset_out, &VENUE, who, amount_out, Preservation::Expendable)?;
    SWAPS.with(|s| s.borrow_mut().push((buying_asset_a, amount_in, amount_out)));
    Ok(amount_out)
  }

  fn reserves() -> (Balance, Balance) {
    (VENUE_FUNDS, VENUE_FUNDS)
  }

  fn price() -> Price {
    VENUE_PRICE.with(|p| *p.borrow())
  }
}

pub fn set_venue_price(price: Price) {
  VENUE_PRICE.with(|p| *p.borrow_mut() = price);
}

pub fn set_venue_haircut(bps: u32) {
  VENUE_HAIRCUT_BPS.with(|h| *h.borrow_mut() = bps);
}

pub fn venue_swaps() -> Vec<(bool, Balance, Balance)> {
  SWAPS.with(|s| s.borrow().clone())
}

/// Vault double accepting reports only from the executor account
pub struct MockVault;
impl NavSink<u64, Balance> for MockVault {
  fn total_assets() -> Balance {
    NAV.with(|n| *n.borrow())
  }

  fn sync(caller: &u64, new_total_assets: Balance) -> DispatchResult {
    if *caller != executor_account() {
      return Err(DispatchError::BadOrigin);
    }
    NAV.with(|n| *n.borrow_mut() = new_total_assets);
    NAV_REPORTS.with(|r| r.borrow_mut().push((*caller, new_total_assets)));
    Ok(())
  }
}

pub fn set_nav(total_assets: Balance) {
  NAV.with(|n| *n.borrow_mut() = total_assets);
}

pub fn nav() -> Balance {
  NAV.with(|n| *n.borrow())
}

pub fn nav_reports() -> Vec<(u64, Balance)> {
  NAV_REPORTS.with(|r| r.borrow().clone())
}

parameter_types! {
  pub const TradeExecutorPalletId: PalletId = PalletId(*TRADE_EXECUTOR_PALLET_ID);
  pub const AssetA: u32 = ASSET_A;
  pub const AssetB: u32 = ASSET_B;
}

impl pallet_trade_executor::Config for Test {
  type Assets = Assets;
  type AssetA = AssetA;
  type AssetB = AssetB;
  type PalletId = TradeExecutorPalletId;
  type Venue = MockVenue;
  type Vault = MockVault;
  type Governance = MockGovernance;
  type WeightInfo = ();
}

pub fn executor_account() -> u64 {
  TradeExecutor::account_id()
}

/// Executor funded with `(amount_a, amount_b)`, vault reporting `nav`
pub fn build_ext(
  amount_a: Balance,
  amount_b: Balance,
  total_assets: Balance,
) -> polkadot_sdk::sp_io::TestExternalities {
  PAUSED.with(|p| *p.borrow_mut() = false);
  VENUE_PRICE.with(|p| *p.borrow_mut() = PRECISION);
  VENUE_HAIRCUT_BPS.with(|h| *h.borrow_mut() = 0);
  SWAPS.with(|s| s.borrow_mut().clear());
  NAV.with(|n| *n.borrow_mut() = total_assets);
  NAV_REPORTS.with(|r| r.borrow_mut().clear());

  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  polkadot_sdk::pallet_balances::GenesisConfig::<Test> {
    balances: vec![(ASSET_ADMIN, 1_000_000)],
    dev_accounts: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  let mut accounts = vec![(ASSET_A, VENUE, VENUE_FUNDS), (ASSET_B, VENUE, VENUE_FUNDS)];
  if amount_a > 0 {
    accounts.push((ASSET_A, executor_account(), amount_a));
  }
  if amount_b > 0 {
    accounts.push((ASSET_B, executor_account(), amount_b));
  }
  polkadot_sdk::pallet_assets::GenesisConfig::<Test> {
    assets: vec![(ASSET_A, ASSET_ADMIN, true, 1), (ASSET_B, ASSET_ADMIN, true, 1)],
    metadata: vec![],
    accounts,
    reserves: vec![],
    next_asset_id: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  pallet_trade_executor::GenesisConfig::<Test> {
    owner: Some(OWNER),
    strategy: Some(STRATEGY),
  }
  .assimilate_storage(&mut t)
  .unwrap();

  let mut ext = polkadot_sdk::sp_io::TestExternalities::new(t);
  ext.execute_with(|| System::set_block_number(1));
  ext
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  build_ext(0, 1_000_000, 1_000_000)
}
