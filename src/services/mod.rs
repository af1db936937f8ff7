pub mod cache;
pub mod analytics;
pub mod intake;
pub mod ledger;
pub mod merchant;
pub mod secrets;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{MemoryMerchantCache, MerchantCache, RedisMerchantCache};
pub use analytics::Analytics;
pub use intake::PaymentIntake;
pub use ledger::{LedgerStore, PgLedgerStore};
pub use merchant::{MerchantValidator, MerchantVerdict, MerchantVerifier, TrustOnFirstCheck};
pub use secrets::SecretResolver;
