#![cfg_attr(not(feature = "std"), no_std)]

pub mod ecosystem;
pub mod math;
pub mod traits;
pub mod types;

pub use ecosystem::*;
pub use traits::*;
pub use types::*;
