// Sample data for manual poking at a fresh store

use chrono::{Local, NaiveDate};
use rand::Rng;
use tracing::info;

use crate::account::{Account, AccountFields, AccountType};
use crate::store::{AccountStore, StoreResult};

/// Upper bound (exclusive) of a sample balance
pub const MAX_SAMPLE_BALANCE: f64 = 9000.0;

/// Types cycle SAVINGS, CHECKING, SAVINGS, ...
fn sample_type(index: usize) -> AccountType {
    if index % 2 == 0 {
        AccountType::Savings
    } else {
        AccountType::Checking
    }
}

/// Insert `count` accounts with random balances dated `today`
pub fn seed_accounts<R: Rng>(
    store: &dyn AccountStore,
    count: usize,
    today: NaiveDate,
    rng: &mut R,
) -> StoreResult<Vec<Account>> {
    let mut created = Vec::with_capacity(count);

    for index in 0..count {
        let account = store.create(AccountFields {
            balance: rng.gen_range(0.0..MAX_SAMPLE_BALANCE),
            creation_date: today,
            account_type: sample_type(index),
        })?;
        info!(
            id = ?account.id,
            balance = account.balance,
            account_type = %account.account_type,
            "seeded account"
        );
        created.push(account);
    }

    Ok(created)
}

/// Startup seeding: three sample accounts dated today
pub fn seed_defaults(store: &dyn AccountStore) -> StoreResult<Vec<Account>> {
    seed_accounts(store, 3, Local::now().date_naive(), &mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryAccountStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_seed_accounts() {
        let store = MemoryAccountStore::new();
        let today = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let seeded = seed_accounts(&store, 3, today, &mut rng).unwrap();

        assert_eq!(seeded.len(), 3);
        assert_eq!(store.count().unwrap(), 3);
        let types: Vec<AccountType> = seeded.iter().map(|a| a.account_type).collect();
        assert_eq!(types, vec![AccountType::Savings, AccountType::Checking, AccountType::Savings]);
        for account in &seeded {
            assert!(account.is_persisted());
            assert_eq!(account.creation_date, today);
            assert!((0.0..MAX_SAMPLE_BALANCE).contains(&account.balance));
        }
    }

    #[test]
    fn test_seed_defaults_creates_three() {
        let store = MemoryAccountStore::new();
        assert_eq!(seed_defaults(&store).unwrap().len(), 3);
    }
}
