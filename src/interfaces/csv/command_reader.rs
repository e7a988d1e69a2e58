use crate::application::registry::LoanRegistry;
use crate::domain::amount::Amount;
use crate::domain::loan::{Address, Call, LoanId, Timestamp};
use crate::error::{LoanError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Request,
    Fund,
    Repay,
    Claim,
}

/// One row of the input stream, before validation.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CommandRecord {
    pub r#type: CommandType,
    pub caller: String,
    #[serde(default)]
    pub loan: Option<LoanId>,
    /// Attached value, in coins.
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub rate: Option<u32>,
    #[serde(default)]
    pub days: Option<u64>,
    /// Block timestamp, in seconds. Rows without one run at the previous row's time.
    #[serde(default)]
    pub time: Option<u64>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Action {
    Request {
        collateral: Amount,
        interest_rate: u32,
        duration_days: u64,
    },
    Fund {
        loan: LoanId,
        amount: Amount,
    },
    Repay {
        loan: LoanId,
        amount: Amount,
    },
    Claim {
        loan: LoanId,
    },
}

/// A validated registry call together with the block time it runs at.
#[derive(Debug, PartialEq, Clone)]
pub struct Command {
    pub caller: Address,
    pub time: Option<Timestamp>,
    pub action: Action,
}

impl Command {
    /// Runs the command against `registry`. Returns the new id for requests.
    pub async fn apply(self, registry: &mut LoanRegistry) -> Result<Option<LoanId>> {
        match self.action {
            Action::Request {
                collateral,
                interest_rate,
                duration_days,
            } => registry
                .request_loan(Call::new(self.caller, collateral), interest_rate, duration_days)
                .await
                .map(Some),
            Action::Fund { loan, amount } => registry
                .fund_loan(Call::new(self.caller, amount), loan)
                .await
                .map(|_| None),
            Action::Repay { loan, amount } => registry
                .repay_loan(Call::new(self.caller, amount), loan)
                .await
                .map(|_| None),
            Action::Claim { loan } => registry
                .claim_collateral(&self.caller, loan)
                .await
                .map(|_| None),
        }
    }
}

fn required<T>(value: Option<T>, field: &str, kind: CommandType) -> Result<T> {
    value.ok_or_else(|| {
        LoanError::ValidationError(format!("{kind:?} command is missing '{field}'"))
    })
}

fn coins(value: Option<Decimal>, kind: CommandType) -> Result<Amount> {
    Amount::from_coins(required(value, "amount", kind)?)
}

impl TryFrom<CommandRecord> for Command {
    type Error = LoanError;

    fn try_from(record: CommandRecord) -> Result<Self> {
        if record.caller.is_empty() {
            return Err(LoanError::ValidationError(
                "command is missing 'caller'".to_string(),
            ));
        }
        let t = record.r#type;
        let action = match t {
            CommandType::Request => Action::Request {
                collateral: coins(record.amount, t)?,
                interest_rate: required(record.rate, "rate", t)?,
                duration_days: required(record.days, "days", t)?,
            },
            CommandType::Fund => Action::Fund {
                loan: required(record.loan, "loan", t)?,
                amount: coins(record.amount, t)?,
            },
            CommandType::Repay => Action::Repay {
                loan: required(record.loan, "loan", t)?,
                amount: coins(record.amount, t)?,
            },
            CommandType::Claim => Action::Claim {
                loan: required(record.loan, "loan", t)?,
            },
        };
        Ok(Self {
            caller: Address::new(record.caller),
            time: record.time.map(Timestamp),
            action,
        })
    }
}

/// Reads loan commands from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths, so trailing
/// empty columns may be omitted.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads, deserializes and validates commands.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize::<CommandRecord>()
            .map(|result| Command::try_from(result?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "type, caller, loan, amount, rate, days, time\n";

    fn read(rows: &str) -> Vec<Result<Command>> {
        let data = format!("{HEADER}{rows}");
        CommandReader::new(data.as_bytes()).commands().collect()
    }

    #[test]
    fn test_reader_valid_stream() {
        let results = read(
            "request, alice, , 1.0, 500, 30, 0\n\
             fund, bob, 0, 1.0, , , 60\n\
             claim, bob, 0\n",
        );
        assert_eq!(results.len(), 3);

        let request = results[0].as_ref().unwrap();
        assert_eq!(request.caller, Address::new("alice"));
        assert_eq!(request.time, Some(Timestamp(0)));
        assert_eq!(
            request.action,
            Action::Request {
                collateral: Amount::new(1_000_000_000_000_000_000),
                interest_rate: 500,
                duration_days: 30,
            }
        );

        let fund = results[1].as_ref().unwrap();
        assert_eq!(fund.time, Some(Timestamp(60)));
        assert!(matches!(fund.action, Action::Fund { loan: 0, .. }));

        let claim = results[2].as_ref().unwrap();
        assert_eq!(claim.time, None);
        assert_eq!(claim.action, Action::Claim { loan: 0 });
    }

    #[test]
    fn test_reader_unknown_type() {
        let results = read("borrow, alice, , 1.0, 500, 30, 0\n");
        assert!(matches!(results[0], Err(LoanError::CsvError(_))));
    }

    #[test]
    fn test_reader_missing_fields() {
        let results = read(
            "request, alice, , 1.0, , 30, 0\n\
             fund, bob, , 1.0, , , 0\n\
             repay, alice, 0, , , , 0\n",
        );
        assert_eq!(results.len(), 3);
        for result in results {
            assert!(matches!(result, Err(LoanError::ValidationError(_))));
        }
    }

    #[test]
    fn test_reader_rejects_sub_unit_amount() {
        let results = read("fund, bob, 0, 0.0000000000000000001, , , 0\n");
        assert!(matches!(results[0], Err(LoanError::ValidationError(_))));
    }
}
