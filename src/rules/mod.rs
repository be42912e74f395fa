//! Game rules: percentile checks, sanity, generators.

pub mod check;
pub mod generate;
pub mod sanity;

pub use check::{classify, FlavorText, Tier};
pub use generate::{FireballDamage, Investigator};
pub use sanity::SanLoss;
