//! Admin stock tables.

use std::fmt::Write;

use crate::ledger::Ledger;
use crate::model::{Coin, Product};

const RULE: &str = "+----------------+-------+";

pub fn coin_report(stock: &Ledger<Coin>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "coin stock, total {}", stock.total_value());
    let _ = writeln!(out, "{RULE}");
    for (coin, count) in stock.iter() {
        let _ = writeln!(out, "| {coin:<14} | {count:>5} |");
    }
    out.push_str(RULE);
    out
}

pub fn product_report(stock: &Ledger<Product>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "product stock, {} items", stock.total_count());
    let _ = writeln!(out, "{RULE}");
    for (product, count) in stock.iter() {
        let code = product.code();
        let label = format!("{code} {product}");
        let _ = writeln!(out, "| {label:<14} | {count:>5} |");
    }
    out.push_str(RULE);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coin_report_lists_every_coin_with_total() {
        let report = coin_report(&Ledger::filled(10));
        let lines: Vec<_> = report.lines().collect();

        assert_eq!(lines[0], "coin stock, total 38.80");
        assert_eq!(lines[1], RULE);
        assert_eq!(lines[2], "| Two pound      |    10 |");
        assert_eq!(lines[9], "| One pence      |    10 |");
        assert_eq!(lines.last(), Some(&RULE));
        assert_eq!(lines.len(), 2 + Coin::ALL.len() + 1);
    }

    #[test]
    fn product_report_shows_codes() {
        let mut stock = Ledger::filled(10);
        stock.set(Product::Coke, 9);
        let report = product_report(&stock);

        assert!(report.starts_with("product stock, 79 items\n"));
        assert!(report.contains("| 0001 Coke      |     9 |"));
        assert!(report.contains("| 1004 Candy     |    10 |"));
    }
}
