//! Two-account balance updates with a fixed lock order.
//!
//! Every `add_account_balance` takes a row lock that is held until the
//! transaction ends. Two transfers between the same accounts in opposite
//! directions would each lock their own source row first and then wait on
//! the other's: a circular wait. Locking rows in ascending id order, whatever
//! the transfer direction, rules that out.

use tracing::debug;

use crate::context::TxContext;
use crate::error::AppError;
use crate::models::{Account, AddAccountBalanceParams};
use crate::store::Queries;

/// Order in which a pair of rows has to be locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOrder {
    /// The first id is the smaller one.
    AsGiven,
    /// The second id is the smaller one.
    Swapped,
}

impl LockOrder {
    pub fn for_ids(id_a: i64, id_b: i64) -> Self {
        if id_a <= id_b {
            LockOrder::AsGiven
        } else {
            LockOrder::Swapped
        }
    }

    /// Put a pair into lock order. Applying it again restores the original order.
    pub fn arrange<T>(self, a: T, b: T) -> (T, T) {
        match self {
            LockOrder::AsGiven => (a, b),
            LockOrder::Swapped => (b, a),
        }
    }
}

/// Add `a.amount` to account `a.id` and `b.amount` to account `b.id`.
///
/// The smaller id is always updated first. The returned accounts are in the
/// caller's `(a, b)` order regardless.
pub async fn update_pair<Q>(
    ctx: &TxContext,
    q: &mut Q,
    a: AddAccountBalanceParams,
    b: AddAccountBalanceParams,
) -> Result<(Account, Account), AppError>
where
    Q: Queries + ?Sized,
{
    let order = LockOrder::for_ids(a.id, b.id);
    let (first, second) = order.arrange(a, b);
    debug!(
        tx_name = %ctx.tx_name(),
        first = first.id,
        second = second.id,
        "updating balances"
    );

    let first = ctx.run(q.add_account_balance(first)).await?;
    let second = ctx.run(q.add_account_balance(second)).await?;

    Ok(order.arrange(first, second))
}
