//! Fixed-point helpers shared by the pallets.

use polkadot_sdk::sp_core::U256;

/// Integer square root by Newton iteration.
///
/// Iterates from `ceil(n / 2)` and stops as soon as the next iterate is not smaller than the
/// current one, which yields `floor(sqrt(n))`.
pub fn integer_sqrt(n: U256) -> U256 {
  if n.is_zero() {
    return n;
  }
  let mut x = n;
  let mut y = (n >> 1).saturating_add(n & U256::one());
  while y < x {
    x = y;
    y = x.saturating_add(n / x) >> 1;
  }
  x
}

/// `floor(a * b / c)` with a 256-bit intermediate, `None` on division by zero or overflow.
pub fn mul_div(a: u128, b: u128, c: u128) -> Option<u128> {
  if c == 0 {
    return None;
  }
  let result = U256::from(a).checked_mul(U256::from(b))? / U256::from(c);
  if result > U256::from(u128::MAX) {
    return None;
  }
  Some(result.low_u128())
}
