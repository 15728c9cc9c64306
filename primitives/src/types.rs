use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use serde::{Deserialize, Serialize};

use crate::ecosystem::params;

/// Price scaled by `params::PRECISION`.
pub type Price = u64;

/// Wall-clock time in seconds.
pub type Moment = u64;

/// Identifier assigned by the scheduler to a registered deferred call or message.
pub type DeferredCallId = u64;

/// An addressable execution opportunity of the host scheduler.
///
/// Ordering is by period first, then thread, which is also the execution order.
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Default,
  Encode,
  Eq,
  MaxEncodedLen,
  Ord,
  PartialEq,
  PartialOrd,
  TypeInfo,
  Serialize,
  Deserialize,
)]
pub struct Slot {
  pub period: u64,
  pub thread: u8,
}

impl Slot {
  pub const fn new(period: u64, thread: u8) -> Self {
    Self { period, thread }
  }
}

/// Decision taken by the strategy on each evaluation.
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Default,
  Encode,
  Eq,
  MaxEncodedLen,
  PartialEq,
  TypeInfo,
  Serialize,
  Deserialize,
)]
pub enum RebalanceAction {
  /// Dispersion above the sigma threshold: de-risk.
  Volatility,
  /// TWAP above the upper band: lean into the risk asset.
  PriceUp,
  /// TWAP below the lower band: reduce exposure.
  PriceDown,
  /// Inside the band: no trade.
  #[default]
  Hold,
}

impl RebalanceAction {
  /// Target share of vault assets held as risk exposure, in basis points.
  pub const fn target_allocation_bps(&self) -> u32 {
    match self {
      RebalanceAction::Volatility => params::VOLATILITY_ALLOCATION_BPS,
      RebalanceAction::PriceUp => params::PRICE_UP_ALLOCATION_BPS,
      RebalanceAction::PriceDown => params::PRICE_DOWN_ALLOCATION_BPS,
      RebalanceAction::Hold => params::HOLD_ALLOCATION_BPS,
    }
  }

  pub const fn requires_trade(&self) -> bool {
    !matches!(self, RebalanceAction::Hold)
  }
}

/// Work item carried by a deferred call or an asynchronous message.
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  MaxEncodedLen,
  PartialEq,
  TypeInfo,
  Serialize,
  Deserialize,
)]
pub enum DeferredTask {
  /// Feed a post-swap marginal price into the oracle.
  PushPrice { price: Price },
  /// Run one strategy evaluation.
  EvaluateStrategy,
}
