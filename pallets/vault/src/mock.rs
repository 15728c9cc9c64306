use crate as pallet_vault;
use core::{cell::RefCell, time::Duration};
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl, parameter_types,
  traits::{AsEnsureOriginWithArg, ConstU32, ConstU128, UnixTime},
};
use polkadot_sdk::frame_system::{self, EnsureRoot, EnsureSigned};
use polkadot_sdk::sp_runtime::{
  BuildStorage,
  testing::H256,
  traits::{BlakeTwo256, IdentityLookup},
};
use primitives::{
  Balance, GovernanceRegistry,
  pallet_ids::VAULT_PALLET_ID,
  params::MIN_DEPOSIT,
};

type Block = frame_system::mocking::MockBlock<Test>;

pub const ALICE: u64 = 1;
pub const BOB: u64 = 2;
pub const CHARLIE: u64 = 3;
pub const EXECUTOR: u64 = 20;
pub const GOVERNOR: u64 = 99;
pub const ASSET_ADMIN: u64 = 100;

pub const USD: u32 = 2;
pub const USER_FUNDS: Balance = 100_000_000;
pub const GENESIS_TIME: u64 = 1_700_000_000;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Balances: polkadot_sdk::pallet_balances,
    Assets: polkadot_sdk::pallet_assets,
    Vault: pallet_vault,
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
  static NOW: RefCell<u64> = const { RefCell::new(GENESIS_TIME) };
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

parameter_types! {
  pub const VaultPalletId: PalletId = PalletId(*VAULT_PALLET_ID);
  pub const UnderlyingAsset: u32 = USD;
  pub const MinDeposit: Balance = MIN_DEPOSIT;
}

impl pallet_vault::Config for Test {
  type Assets = Assets;
  type Asset = UnderlyingAsset;
  type PalletId = VaultPalletId;
  type MinDeposit = MinDeposit;
  type Governance = MockGovernance;
  type TimeProvider = MockTime;
  type WeightInfo = ();
}

pub fn vault_account() -> u64 {
  Vault::account_id()
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  PAUSED.with(|p| *p.borrow_mut() = false);
  NOW.with(|n| *n.borrow_mut() = GENESIS_TIME);

  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  polkadot_sdk::pallet_balances::GenesisConfig::<Test> {
    balances: vec![(ALICE, 1_000_000), (BOB, 1_000_000), (ASSET_ADMIN, 1_000_000)],
    dev_accounts: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  polkadot_sdk::pallet_assets::GenesisConfig::<Test> {
    assets: vec![(USD, ASSET_ADMIN, true, 1)],
    metadata: vec![],
    accounts: vec![
      (USD, ALICE, USER_FUNDS),
      (USD, BOB, USER_FUNDS),
      (USD, CHARLIE, MIN_DEPOSIT / 2),
    ],
    reserves: vec![],
    next_asset_id: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  pallet_vault::GenesisConfig::<Test> {
    executor: Some(EXECUTOR),
  }
  .assimilate_storage(&mut t)
  .unwrap();

  let mut ext = polkadot_sdk::sp_io::TestExternalities::new(t);
  ext.execute_with(|| System::set_block_number(1));
  ext
}
