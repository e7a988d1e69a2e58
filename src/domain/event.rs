use super::amount::Amount;
use super::loan::{Address, LoanId, Timestamp};
use serde::{Deserialize, Serialize};

/// Notifications emitted by the registry after an operation commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LoanEvent {
    LoanRequested {
        id: LoanId,
        borrower: Address,
        collateral: Amount,
        loan_amount: Amount,
        interest_rate: u32,
        due_date: Timestamp,
    },
    LoanFunded {
        id: LoanId,
        lender: Address,
    },
    LoanRepaid {
        id: LoanId,
    },
    CollateralClaimed {
        id: LoanId,
        lender: Address,
    },
    CollateralReturned {
        id: LoanId,
        borrower: Address,
    },
}

impl LoanEvent {
    pub fn loan_id(&self) -> LoanId {
        match self {
            Self::LoanRequested { id, .. }
            | Self::LoanFunded { id, .. }
            | Self::LoanRepaid { id }
            | Self::CollateralClaimed { id, .. }
            | Self::CollateralReturned { id, .. } => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_is_tagged() {
        let event = LoanEvent::LoanFunded {
            id: 3,
            lender: Address::new("bob"),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"event":"loan_funded","id":3,"lender":"bob"}"#);
        assert_eq!(event.loan_id(), 3);
    }
}
