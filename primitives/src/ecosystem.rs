//! Ecosystem Constants for the Autonomous Yield Protocol
//!
//! This module centralizes the pallet IDs used to derive component-owned accounts and the
//! fundamental economic and scheduling parameters shared by the oracle, exchange, strategy,
//! executor, vault and deferred-call pallets.
//!
//! Runtime configurations and test mocks read their defaults from here so that every component
//! agrees on scaling factors and thresholds.

/// Balance type alias for consistency across the protocol
pub type Balance = u128;

/// Pallet identifiers for deriving pallet-owned accounts.
///
/// Each component acts on-chain through the account derived from its ID with
/// `PalletId::into_account_truncating()`. Collaborators authorize cross-component
/// calls by comparing the caller against these derived accounts.
pub mod pallet_ids {
  /// Price oracle pallet ID (windowed TWAP accumulator)
  pub const PRICE_ORACLE_PALLET_ID: &[u8; 8] = b"py/oracl";

  /// Exchange pallet ID (constant-product pool, holds both reserves)
  pub const EXCHANGE_PALLET_ID: &[u8; 8] = b"py/xchng";

  /// Strategy engine pallet ID (pays for its own deferred executions)
  pub const STRATEGY_ENGINE_PALLET_ID: &[u8; 8] = b"py/strat";

  /// Trade executor pallet ID (holds the traded risk/quote position)
  pub const TRADE_EXECUTOR_PALLET_ID: &[u8; 8] = b"py/exect";

  /// Vault pallet ID (custody of user deposits)
  pub const VAULT_PALLET_ID: &[u8; 8] = b"py/vault";

  /// Deferred calls pallet ID (fee escrow for scheduled calls)
  pub const DEFERRED_CALLS_PALLET_ID: &[u8; 8] = b"py/dcall";
}

/// Protocol parameters defining fixed-point scales, thresholds and scheduling budgets.
pub mod params {
  use super::Balance;
  use sp_arithmetic::Permill;

  /// Fixed-point scale for prices, TWAP, sigma and share price (10^6).
  pub const PRECISION: u64 = 1_000_000;

  /// Denominator for allocation targets and slippage tolerances.
  pub const BASIS_POINTS: u32 = 10_000;

  /// Width of the TWAP accumulation window in seconds.
  ///
  /// A price pushed after a full window of silence resets the accumulator.
  pub const TWAP_WINDOW: u64 = 600;

  /// The accumulator keeps at most `TWAP_WINDOW / TWAP_COMPRESSION_DIVISOR` samples.
  pub const TWAP_COMPRESSION_DIVISOR: u64 = 16;

  /// Number of reconstructed observations used by the sigma estimator.
  pub const SIGMA_SAMPLE_LIMIT: u64 = 10;

  /// Constant-product fee numerator (0.3% fee, `997 / 1000`).
  pub const SWAP_FEE_NUMERATOR: u128 = 997;

  /// Constant-product fee denominator.
  pub const SWAP_FEE_DENOMINATOR: u128 = 1_000;

  /// Tolerated deviation between a liquidity deposit ratio and the pool ratio (1%).
  pub const LIQUIDITY_RATIO_TOLERANCE: Permill = Permill::from_percent(1);

  /// Smallest accepted vault deposit (1.0 in quote units).
  pub const MIN_DEPOSIT: Balance = 1_000_000;

  /// Maximum slippage the executor accepts against the observed TWAP (3%).
  pub const MAX_SLIPPAGE_BPS: u32 = 300;

  /// Native balance the strategy must keep on top of a scheduling quote.
  pub const GAS_RESERVE: Balance = 1_000_000;

  /// Periods between two strategy evaluations.
  pub const STRATEGY_INTERVAL: u64 = 600;

  /// Number of periods searched for the cheapest execution slot.
  pub const SLOT_SEARCH_WINDOW: u64 = 100;

  /// Gas ceiling reserved for one strategy evaluation.
  pub const STRATEGY_MAX_GAS: u64 = 5_000_000;

  /// Gas budget of the asynchronous price push sent after each swap.
  pub const ORACLE_PUSH_MAX_GAS: u64 = 1_000_000;

  /// The price push becomes deliverable this many periods after the swap.
  pub const ORACLE_PUSH_DELAY: u64 = 1;

  /// The price push expires this many periods after the swap.
  pub const ORACLE_PUSH_EXPIRY: u64 = 10;

  /// Default TWAP reference level for the strategy (1.0 quote per risk unit).
  pub const DEFAULT_TWAP_THRESHOLD: u64 = PRECISION;

  /// Default sigma level above which the strategy de-risks.
  pub const DEFAULT_SIGMA_THRESHOLD: u64 = 100;

  /// Upper price band, in percent of the TWAP threshold.
  pub const PRICE_UP_BAND_PERCENT: u64 = 110;

  /// Lower price band, in percent of the TWAP threshold.
  pub const PRICE_DOWN_BAND_PERCENT: u64 = 90;

  /// Risk allocation under high volatility (30%).
  pub const VOLATILITY_ALLOCATION_BPS: u32 = 3_000;

  /// Risk allocation when the price trades above the upper band (70%).
  pub const PRICE_UP_ALLOCATION_BPS: u32 = 7_000;

  /// Risk allocation when the price trades below the lower band (40%).
  pub const PRICE_DOWN_ALLOCATION_BPS: u32 = 4_000;

  /// Neutral risk allocation (50%).
  pub const HOLD_ALLOCATION_BPS: u32 = 5_000;
}
