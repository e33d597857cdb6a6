//! Greedy change-making against a live coin stock.
//!
//! [`plan`] works out which coins to hand back without touching anything;
//! [`breakdown`] commits a successful plan by moving the coins from the
//! machine's stock into the refund ledger. A plan that cannot pay the exact
//! amount is an error, so callers never see a partial withdrawal.

use thiserror::Error;
use tracing::debug;

use crate::Amount;
use crate::ledger::Ledger;
use crate::model::Coin;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChangeError {
    #[error("coin stock holds {available}, cannot pay out {requested}")]
    InsufficientStock { requested: Amount, available: Amount },

    #[error("cannot make exact change for {requested}: {shortfall} short")]
    ExactChangeUnavailable { requested: Amount, shortfall: Amount },
}

/// Choose the coins to pay out `amount` from `source`, largest first.
pub fn plan(amount: Amount, source: &Ledger<Coin>) -> Result<Ledger<Coin>, ChangeError> {
    let available = source.total_value();
    if available < amount {
        return Err(ChangeError::InsufficientStock {
            requested: amount,
            available,
        });
    }

    let mut remaining = amount;
    let mut payout = Ledger::new();
    for (coin, in_stock) in source.iter() {
        if remaining.is_zero() {
            break;
        }
        let wanted = remaining.whole_units_of(coin.face_value());
        if wanted == 0 {
            continue;
        }
        let used = wanted.min(in_stock);
        payout.set(coin, used);
        remaining -= coin.face_value() * used;
    }

    if !remaining.is_zero() {
        return Err(ChangeError::ExactChangeUnavailable {
            requested: amount,
            shortfall: remaining,
        });
    }
    Ok(payout)
}

/// Pay out `amount` from `source` into `refund`.
///
/// On error neither ledger is modified.
pub fn breakdown(
    amount: Amount,
    source: &mut Ledger<Coin>,
    refund: &mut Ledger<Coin>,
) -> Result<(), ChangeError> {
    let payout = plan(amount, source)?;
    for (coin, used) in payout.iter().filter(|&(_, used)| used > 0) {
        source.remove(coin, used);
        refund.add(coin, used);
        debug!(coin = %coin, count = used, "coins moved to refund");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pence(p: i64) -> Amount {
        Amount::from_pence(p)
    }

    #[test]
    fn pays_largest_coins_first() {
        let mut stock = Ledger::filled(10);
        let mut refund = Ledger::new();

        breakdown(pence(208), &mut stock, &mut refund).unwrap();

        assert_eq!(
            refund.drain(),
            vec![Coin::TwoPound, Coin::FivePence, Coin::TwoPence, Coin::OnePence]
        );
        assert_eq!(stock.get(Coin::TwoPound), 9);
        assert_eq!(stock.get(Coin::FivePence), 9);
        assert_eq!(stock.total_value(), pence(3880 - 208));
    }

    #[test]
    fn falls_back_to_smaller_coins_when_stock_runs_out() {
        let mut stock = Ledger::new();
        stock.set(Coin::TwoPound, 1);
        stock.set(Coin::OnePound, 5);
        let mut refund = Ledger::new();

        breakdown(pence(500), &mut stock, &mut refund).unwrap();

        assert_eq!(refund.get(Coin::TwoPound), 1);
        assert_eq!(refund.get(Coin::OnePound), 3);
        assert_eq!(stock.get(Coin::TwoPound), 0);
        assert_eq!(stock.get(Coin::OnePound), 2);
    }

    #[test]
    fn zero_amount_emits_nothing() {
        let mut stock = Ledger::filled(3);
        let mut refund = Ledger::new();

        breakdown(Amount::ZERO, &mut stock, &mut refund).unwrap();

        assert!(refund.is_empty());
        assert_eq!(stock, Ledger::filled(3));
    }

    #[test]
    fn insufficient_stock_is_rejected_before_mutation() {
        let mut stock = Ledger::new();
        stock.set(Coin::OnePound, 4);
        let mut refund = Ledger::new();

        let result = breakdown(pence(408), &mut stock, &mut refund);

        assert_eq!(
            result,
            Err(ChangeError::InsufficientStock {
                requested: pence(408),
                available: pence(400),
            })
        );
        assert_eq!(stock.get(Coin::OnePound), 4);
        assert!(refund.is_empty());
    }

    #[test]
    fn inexact_change_is_rejected_before_mutation() {
        // enough value, but no coin small enough for the odd pennies
        let mut stock = Ledger::new();
        stock.set(Coin::TwoPound, 5);
        stock.set(Coin::FivePence, 1);
        let before = stock.clone();
        let mut refund = Ledger::new();

        let result = breakdown(pence(203), &mut stock, &mut refund);

        assert_eq!(
            result,
            Err(ChangeError::ExactChangeUnavailable {
                requested: pence(203),
                shortfall: pence(3),
            })
        );
        assert_eq!(stock, before);
        assert!(refund.is_empty());
    }

    #[test]
    fn plan_leaves_source_untouched() {
        let stock = Ledger::filled(10);
        let payout = plan(pence(408), &stock).unwrap();
        assert_eq!(payout.total_value(), pence(408));
        assert_eq!(stock, Ledger::filled(10));
    }

    #[test]
    fn whole_stock_can_be_paid_out() {
        let mut stock = Ledger::filled(7);
        let total = stock.total_value();
        let mut refund = Ledger::new();

        breakdown(total, &mut stock, &mut refund).unwrap();

        assert!(stock.is_empty());
        assert_eq!(refund, Ledger::filled(7));
    }

    fn coin_counts() -> impl Strategy<Value = Vec<u32>> {
        prop::collection::vec(0u32..20, Coin::ALL.len())
    }

    proptest! {
        #[test]
        fn coins_are_conserved(counts in coin_counts(), amount in 0i64..5_000) {
            let mut stock = Ledger::new();
            for (coin, count) in Coin::ALL.iter().zip(&counts) {
                stock.set(*coin, *count);
            }
            let before = stock.clone();
            let mut refund = Ledger::new();

            match breakdown(pence(amount), &mut stock, &mut refund) {
                Ok(()) => {
                    prop_assert_eq!(refund.total_value(), pence(amount));
                    for coin in Coin::ALL {
                        prop_assert_eq!(stock.get(coin) + refund.get(coin), before.get(coin));
                    }
                }
                Err(_) => {
                    prop_assert_eq!(&stock, &before);
                    prop_assert!(refund.is_empty());
                }
            }
        }

        #[test]
        fn full_stock_always_makes_change(amount in 0i64..3_880) {
            // with ten of every coin, greedy reaches any amount up to the stock total
            let stock = Ledger::filled(10);
            prop_assert!(plan(pence(amount), &stock).is_ok());
        }
    }
}
