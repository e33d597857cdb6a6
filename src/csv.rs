use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::{Coin, Command, Machine, Product};

/// Errors that can occur when reading a command script
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open script: {0}")]
    Open(#[source] csv::Error),

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized action '{action}'")]
    UnknownAction { line: usize, action: String },

    #[error("line {line}: {action} missing {field}")]
    MissingArgument {
        line: usize,
        action: &'static str,
        field: &'static str,
    },

    #[error("line {line}: invalid {field} '{value}'")]
    InvalidValue {
        line: usize,
        field: &'static str,
        value: String,
    },
}

#[derive(Debug, Deserialize)]
struct InputRow {
    action: String,
    #[serde(default)]
    arg: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Serialize)]
struct OutputRow {
    kind: &'static str,
    id: &'static str,
    count: u32,
}

/// Read machine commands from a csv script with an `action,arg,value` header.
pub fn read_commands(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Command, CsvError>>, CsvError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(CsvError::Open)?;

    Ok(reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            parse_row(line, row)
        }))
}

fn parse_row(line: usize, row: InputRow) -> Result<Command, CsvError> {
    let InputRow { action, arg, value } = row;
    let arg = arg.filter(|s| !s.is_empty());
    let value = value.filter(|s| !s.is_empty());

    let require = |field: Option<String>, action: &'static str, name: &'static str| {
        field.ok_or(CsvError::MissingArgument {
            line,
            action,
            field: name,
        })
    };
    let count = |raw: String| {
        raw.parse::<u32>().map_err(|_| CsvError::InvalidValue {
            line,
            field: "count",
            value: raw,
        })
    };

    let command = match action.as_str() {
        "select" => Command::Select {
            code: require(arg, "select", "code")?,
        },
        "insert" => {
            let raw = require(arg, "insert", "coin")?;
            let coin = raw.parse::<Coin>().map_err(|_| CsvError::InvalidValue {
                line,
                field: "coin",
                value: raw,
            })?;
            Command::InsertCoin {
                coin,
                count: count(require(value, "insert", "count")?)?,
            }
        }
        "purchase" => Command::Purchase,
        "refund" => Command::Refund,
        "collect_products" => Command::CollectProducts,
        "collect_coins" => Command::CollectCoins,
        "login" => Command::Login {
            username: require(arg, "login", "username")?,
            password: require(value, "login", "password")?,
        },
        "logout" => Command::Logout,
        "deposit" => Command::DepositCoins {
            count: count(require(value, "deposit", "count")?)?,
        },
        "withdraw" => Command::WithdrawCoins,
        "refill" => Command::RefillProduct {
            code: require(arg, "refill", "code")?,
        },
        "refill_all" => Command::RefillAllProducts,
        "stock" => Command::StockLevel {
            code: require(arg, "stock", "code")?,
        },
        "report" => Command::Report,
        _ => return Err(CsvError::UnknownAction { line, action }),
    };
    Ok(command)
}

/// Write the machine's coin and product stock to stdout in csv format
pub fn write_stock(machine: &Machine) -> Result<(), csv::Error> {
    let stdout = io::stdout();
    write_stock_to(machine, stdout.lock())
}

/// Write `kind,id,count` rows, every coin first, then every product.
pub fn write_stock_to(machine: &Machine, out: impl io::Write) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);

    for coin in Coin::ALL {
        writer.serialize(OutputRow {
            kind: "coin",
            id: coin.id(),
            count: machine.coin_stock().get(coin),
        })?;
    }
    for product in Product::ALL {
        writer.serialize(OutputRow {
            kind: "product",
            id: product.code(),
            count: machine.product_stock().get(product),
        })?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{Locked, MachineConfig};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn read(content: &str) -> Vec<Result<Command, CsvError>> {
        let file = write_csv(content);
        read_commands(file.path()).unwrap().collect()
    }

    #[test]
    fn read_select_and_insert() {
        let results = read("action,arg,value\nselect,0001,\ninsert,one_pound,3\n");
        assert_eq!(results.len(), 2);

        let commands: Vec<_> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            commands,
            vec![
                Command::Select {
                    code: "0001".to_string()
                },
                Command::InsertCoin {
                    coin: Coin::OnePound,
                    count: 3
                },
            ]
        );
    }

    #[test]
    fn read_bare_actions() {
        let results = read("action,arg,value\npurchase,,\nrefund\ncollect_coins,,\nreport,,\n");
        let commands: Vec<_> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            commands,
            vec![
                Command::Purchase,
                Command::Refund,
                Command::CollectCoins,
                Command::Report
            ]
        );
    }

    #[test]
    fn read_admin_actions() {
        let results = read(
            "action,arg,value\nlogin,owner,secret\ndeposit,,5\nrefill,1003,\nrefill_all,,\nwithdraw,,\nlogout,,\n",
        );
        let commands: Vec<_> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            commands,
            vec![
                Command::Login {
                    username: "owner".to_string(),
                    password: "secret".to_string()
                },
                Command::DepositCoins { count: 5 },
                Command::RefillProduct {
                    code: "1003".to_string()
                },
                Command::RefillAllProducts,
                Command::WithdrawCoins,
                Command::Logout,
            ]
        );
    }

    #[test]
    fn read_with_whitespace() {
        let results = read("action, arg, value\ninsert, ten_pence, 2\n");
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Ok(Command::InsertCoin {
                coin: Coin::TenPence,
                count: 2
            })
        ));
    }

    #[test]
    fn read_returns_error_for_unknown_action() {
        let results = read("action,arg,value\ndance,,\n");
        assert_eq!(results.len(), 1);
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(err, CsvError::UnknownAction { line: 2, .. }));
    }

    #[test]
    fn read_returns_error_for_missing_argument() {
        let results = read("action,arg,value\nselect,,\ninsert,one_pound,\n");
        assert!(matches!(
            results[0],
            Err(CsvError::MissingArgument {
                line: 2,
                field: "code",
                ..
            })
        ));
        assert!(matches!(
            results[1],
            Err(CsvError::MissingArgument {
                line: 3,
                field: "count",
                ..
            })
        ));
    }

    #[test]
    fn read_returns_error_for_invalid_values() {
        let results = read("action,arg,value\ninsert,three_pence,1\ninsert,one_pound,-2\n");
        assert!(matches!(
            results[0],
            Err(CsvError::InvalidValue { field: "coin", .. })
        ));
        assert!(matches!(
            results[1],
            Err(CsvError::InvalidValue { field: "count", .. })
        ));
    }

    #[test]
    fn errors_do_not_stop_later_rows() {
        let results = read("action,arg,value\ndance,,\npurchase,,\n");
        assert!(results[0].is_err());
        assert_eq!(results[1].as_ref().unwrap(), &Command::Purchase);
    }

    #[test]
    fn missing_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_commands(dir.path().join("missing.csv"));
        assert!(matches!(result, Err(CsvError::Open(_))));
    }

    #[test]
    fn write_lists_coins_then_products() {
        let machine = Machine::new(MachineConfig::new(20, 5, 10), Locked).unwrap();
        let mut out = Vec::new();
        write_stock_to(&machine, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "kind,id,count");
        assert_eq!(lines[1], "coin,two_pound,10");
        assert_eq!(lines[8], "coin,one_pence,10");
        assert_eq!(lines[9], "product,0001,5");
        assert_eq!(lines[16], "product,1004,5");
        assert_eq!(lines.len(), 17);
    }
}
