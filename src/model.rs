//! Core domain types: the coin and product catalog and the commands a machine accepts.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::Amount;
use crate::ledger::LedgerKey;

/// A coin the machine accepts, declared from the highest face value to the lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Coin {
    TwoPound,
    OnePound,
    FiftyPence,
    TwentyPence,
    TenPence,
    FivePence,
    TwoPence,
    OnePence,
}

impl Coin {
    pub const ALL: [Coin; 8] = [
        Coin::TwoPound,
        Coin::OnePound,
        Coin::FiftyPence,
        Coin::TwentyPence,
        Coin::TenPence,
        Coin::FivePence,
        Coin::TwoPence,
        Coin::OnePence,
    ];

    pub const fn face_value(self) -> Amount {
        let pence = match self {
            Coin::TwoPound => 200,
            Coin::OnePound => 100,
            Coin::FiftyPence => 50,
            Coin::TwentyPence => 20,
            Coin::TenPence => 10,
            Coin::FivePence => 5,
            Coin::TwoPence => 2,
            Coin::OnePence => 1,
        };
        Amount::from_pence(pence)
    }

    /// Stable identifier used by command scripts and reports.
    pub const fn id(self) -> &'static str {
        match self {
            Coin::TwoPound => "two_pound",
            Coin::OnePound => "one_pound",
            Coin::FiftyPence => "fifty_pence",
            Coin::TwentyPence => "twenty_pence",
            Coin::TenPence => "ten_pence",
            Coin::FivePence => "five_pence",
            Coin::TwoPence => "two_pence",
            Coin::OnePence => "one_pence",
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Coin::TwoPound => "Two pound",
            Coin::OnePound => "One pound",
            Coin::FiftyPence => "Fifty pence",
            Coin::TwentyPence => "Twenty pence",
            Coin::TenPence => "Ten pence",
            Coin::FivePence => "Five pence",
            Coin::TwoPence => "Two pence",
            Coin::OnePence => "One pence",
        };
        f.pad(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown coin '{0}'")]
pub struct UnknownCoin(pub String);

impl FromStr for Coin {
    type Err = UnknownCoin;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Coin::ALL
            .into_iter()
            .find(|coin| coin.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownCoin(s.to_string()))
    }
}

impl LedgerKey for Coin {
    const ALL: &'static [Self] = &Coin::ALL;

    fn index(self) -> usize {
        self as usize
    }
}

/// A product the machine sells. Each product carries its own keypad code and price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Product {
    Coke,
    Sprite,
    Water,
    Lemonade,
    Crisps,
    Peanuts,
    Chocolate,
    Candy,
}

impl Product {
    pub const ALL: [Product; 8] = [
        Product::Coke,
        Product::Sprite,
        Product::Water,
        Product::Lemonade,
        Product::Crisps,
        Product::Peanuts,
        Product::Chocolate,
        Product::Candy,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            Product::Coke => "0001",
            Product::Sprite => "0002",
            Product::Water => "0003",
            Product::Lemonade => "0004",
            Product::Crisps => "1001",
            Product::Peanuts => "1002",
            Product::Chocolate => "1003",
            Product::Candy => "1004",
        }
    }

    pub const fn price(self) -> Amount {
        let pence = match self {
            Product::Coke | Product::Sprite => 200,
            Product::Water => 150,
            Product::Lemonade
            | Product::Crisps
            | Product::Peanuts
            | Product::Chocolate
            | Product::Candy => 175,
        };
        Amount::from_pence(pence)
    }

    /// Resolve a keypad code to its product.
    pub fn from_code(code: &str) -> Option<Product> {
        Product::ALL.into_iter().find(|p| p.code() == code)
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Product::Coke => "Coke",
            Product::Sprite => "Sprite",
            Product::Water => "Water",
            Product::Lemonade => "Lemonade",
            Product::Crisps => "Crisps",
            Product::Peanuts => "Peanuts",
            Product::Chocolate => "Chocolate",
            Product::Candy => "Candy",
        };
        f.pad(name)
    }
}

impl LedgerKey for Product {
    const ALL: &'static [Self] = &Product::ALL;

    fn index(self) -> usize {
        self as usize
    }
}

/// A single request to the machine, as sequenced by a driver script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Enter a product code on the keypad.
    Select { code: String },
    /// Feed `count` coins of one denomination into the slot.
    InsertCoin { coin: Coin, count: u32 },
    Purchase,
    Refund,
    CollectProducts,
    CollectCoins,
    Login { username: String, password: String },
    Logout,
    /// Admin: add `count` of every coin type to the coin stock.
    DepositCoins { count: u32 },
    /// Admin: empty the coin stock into the bucket and collect it.
    WithdrawCoins,
    RefillProduct { code: String },
    RefillAllProducts,
    StockLevel { code: String },
    /// Admin: log the coin and product stock tables.
    Report,
}

impl Command {
    /// Short name used when logging command results.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Select { .. } => "select",
            Command::InsertCoin { .. } => "insert",
            Command::Purchase => "purchase",
            Command::Refund => "refund",
            Command::CollectProducts => "collect_products",
            Command::CollectCoins => "collect_coins",
            Command::Login { .. } => "login",
            Command::Logout => "logout",
            Command::DepositCoins { .. } => "deposit",
            Command::WithdrawCoins => "withdraw",
            Command::RefillProduct { .. } => "refill",
            Command::RefillAllProducts => "refill_all",
            Command::StockLevel { .. } => "stock",
            Command::Report => "report",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coins_are_declared_highest_first() {
        let values: Vec<_> = Coin::ALL.iter().map(|c| c.face_value()).collect();
        let mut sorted = values.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(values, sorted);
    }

    #[test]
    fn coin_index_matches_declaration_order() {
        for (idx, coin) in Coin::ALL.iter().enumerate() {
            assert_eq!(coin.index(), idx);
        }
    }

    #[test]
    fn coin_parses_from_id() {
        assert_eq!("one_pound".parse::<Coin>().unwrap(), Coin::OnePound);
        assert_eq!(" FIVE_PENCE ".parse::<Coin>().unwrap(), Coin::FivePence);
        assert_eq!(
            "three_pence".parse::<Coin>(),
            Err(UnknownCoin("three_pence".to_string()))
        );
    }

    #[test]
    fn coin_display() {
        assert_eq!(Coin::TwoPound.to_string(), "Two pound");
        assert_eq!(Coin::OnePence.to_string(), "One pence");
    }

    #[test]
    fn product_lookup_by_code() {
        assert_eq!(Product::from_code("0001"), Some(Product::Coke));
        assert_eq!(Product::from_code("1004"), Some(Product::Candy));
        assert_eq!(Product::from_code("0000"), None);
        assert_eq!(Product::from_code("01"), None);
    }

    #[test]
    fn product_codes_are_unique() {
        for product in Product::ALL {
            assert_eq!(Product::from_code(product.code()), Some(product));
        }
    }

    #[test]
    fn product_prices() {
        assert_eq!(Product::Coke.price(), Amount::from_pence(200));
        assert_eq!(Product::Water.price(), Amount::from_pence(150));
        assert_eq!(Product::Candy.price(), Amount::from_pence(175));
    }
}
