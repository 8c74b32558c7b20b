//! Transaction utilities, for Stage C's atomic metadata-row commit.

use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres, Transaction};
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::pin::Pin;

/// A transaction wrapper for explicit commit/rollback. Prefer
/// [`with_transaction`] when possible; it handles commit/rollback for you.
pub struct TransactionGuard<'a> {
    transaction: Option<Transaction<'a, Postgres>>,
}

impl<'a> TransactionGuard<'a> {
    pub async fn begin(pool: &'a PgPool) -> Result<Self> {
        let transaction = pool.begin().await.context("failed to begin transaction")?;
        Ok(Self {
            transaction: Some(transaction),
        })
    }

    pub async fn commit(mut self) -> Result<()> {
        if let Some(tx) = self.transaction.take() {
            tx.commit().await.context("failed to commit transaction")?;
        }
        Ok(())
    }

    pub async fn rollback(mut self) -> Result<()> {
        if let Some(tx) = self.transaction.take() {
            tx.rollback().await.context("failed to rollback transaction")?;
        }
        Ok(())
    }
}

impl<'a> Deref for TransactionGuard<'a> {
    type Target = Transaction<'a, Postgres>;

    fn deref(&self) -> &Self::Target {
        self.transaction.as_ref().expect("transaction already consumed")
    }
}

impl<'a> DerefMut for TransactionGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.transaction.as_mut().expect("transaction already consumed")
    }
}

/// Runs `f` inside a transaction, committing on `Ok` and rolling back on `Err`.
/// `f` returns a boxed future borrowing the transaction, since an `async fn`
/// argument can't otherwise express "the future's lifetime matches the
/// borrow" for a higher-ranked closure.
pub async fn with_transaction<T, F>(pool: &PgPool, f: F) -> Result<T>
where
    F: for<'a> FnOnce(
        &'a mut Transaction<'_, Postgres>,
    ) -> Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>,
    T: Send,
{
    let mut tx = pool.begin().await.context("failed to begin transaction")?;
    match f(&mut tx).await {
        Ok(value) => {
            tx.commit().await.context("failed to commit transaction")?;
            Ok(value)
        }
        Err(err) => {
            let _ = tx.rollback().await;
            Err(err)
        }
    }
}
