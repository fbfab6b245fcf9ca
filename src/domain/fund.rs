use super::account::AccountId;
use super::investor::{Investment, Investor};
use super::money::{Amount, Balance};
use super::payment::Payment;
use super::transfer::{Currency, Transfer, TransferType};
use crate::error::{FundError, Result};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle of a fund.
///
/// `Open → Closed → Finished`, or `Open → Cancelled`. `Finished` and
/// `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FundState {
    Open,
    Closed,
    Finished,
    Cancelled,
}

/// Parameters for creating a fund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFund {
    /// The settlement account the fund moves money against.
    pub account: AccountId,
    pub title: String,
    pub description: String,
    /// Investment period in days, counted from the closing date.
    pub period_days: u32,
    /// Flat interest rate as a fraction, e.g. `0.05` for 5%.
    pub interest: Decimal,
    pub target_amount: Amount,
}

/// Editable fund attributes. The settlement account is fixed for life.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateFund {
    pub title: String,
    pub description: String,
    pub period_days: u32,
    pub interest: Decimal,
    pub target_amount: Amount,
}

fn validate_terms(title: &str, period_days: u32, interest: Decimal) -> Result<()> {
    if title.trim().is_empty() {
        return Err(FundError::Validation(
            "the title must not be empty".to_string(),
        ));
    }
    if period_days == 0 {
        return Err(FundError::Validation(
            "the period must be at least one day".to_string(),
        ));
    }
    if interest < Decimal::ZERO {
        return Err(FundError::Validation(
            "the interest rate must not be negative".to_string(),
        ));
    }

    Ok(())
}

/// The pooled-investment aggregate.
///
/// A fund exclusively owns its investor positions and payment history;
/// every mutation goes through the methods below and either applies fully
/// or leaves the aggregate untouched. Callers must serialize mutations of
/// one fund (single writer per aggregate) and persist the whole aggregate
/// as one atomic unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fund {
    pub state: FundState,
    /// The fund's settlement account; transfers are recorded against it.
    pub account: AccountId,
    pub title: String,
    pub description: String,
    pub period_days: u32,
    pub interest: Decimal,
    pub target_amount: Amount,
    /// Running total of all active positions. Never exceeds `target_amount`.
    pub invested_amount: Balance,
    /// Running total of payments distributed, at their nominal amounts.
    pub returned_amount: Balance,
    pub closed_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Positions in order of first contribution.
    pub investors: Vec<Investor>,
    pub payments: Vec<Payment>,
    /// The confirmed capital transfer created when the fund closed.
    pub deposit_transfer: Option<Transfer>,
}

impl Fund {
    pub fn new(params: NewFund) -> Result<Self> {
        validate_terms(&params.title, params.period_days, params.interest)?;

        Ok(Self {
            state: FundState::Open,
            account: params.account,
            title: params.title,
            description: params.description,
            period_days: params.period_days,
            interest: params.interest,
            target_amount: params.target_amount,
            invested_amount: Balance::ZERO,
            returned_amount: Balance::ZERO,
            closed_at: None,
            finished_at: None,
            cancelled_at: None,
            investors: Vec::new(),
            payments: Vec::new(),
            deposit_transfer: None,
        })
    }

    pub fn update(&mut self, values: UpdateFund) -> Result<()> {
        validate_terms(&values.title, values.period_days, values.interest)?;

        if values.target_amount.value() < self.invested_amount.0 {
            return Err(FundError::Validation(
                "the target amount must not drop below the invested amount".to_string(),
            ));
        }

        self.title = values.title;
        self.description = values.description;
        self.period_days = values.period_days;
        self.interest = values.interest;
        self.target_amount = values.target_amount;

        Ok(())
    }

    /// Ends the funding phase and locks in the pooled capital.
    ///
    /// Creates the confirmed deposit transfer for the full invested amount
    /// against the settlement account.
    pub fn close(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state != FundState::Open {
            return Err(FundError::InvalidState("the fund cannot be closed"));
        }
        if !self.invested_amount.is_positive() {
            return Err(FundError::EmptyFund);
        }

        let amount = Amount::new(self.invested_amount.0)?;

        self.state = FundState::Closed;
        self.closed_at = Some(now);

        let mut transfer = Transfer::new(TransferType::Deposit, amount, Currency::Btc, self.account);
        transfer.confirm();
        self.deposit_transfer = Some(transfer);

        Ok(())
    }

    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state != FundState::Closed {
            return Err(FundError::InvalidState("the fund cannot be finished"));
        }

        self.state = FundState::Finished;
        self.finished_at = Some(now);

        Ok(())
    }

    /// Aborts an open fund and returns every active investor their capital.
    ///
    /// Each refund goes through the regular withdrawal path, so the invested
    /// amount drops to zero and one negative ledger entry is recorded per
    /// refunded investor.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state != FundState::Open {
            return Err(FundError::InvalidState("the fund cannot be cancelled"));
        }

        self.state = FundState::Cancelled;
        self.cancelled_at = Some(now);

        let refunds = self
            .investors(true)
            .map(|investor| {
                Amount::new(investor.invested_amount.0)
                    .map(|amount| (investor.account, amount))
            })
            .collect::<Result<Vec<_>>>()?;

        for (account, amount) in refunds {
            self.remove_funds(account, amount, now)?;
        }

        Ok(())
    }

    /// Contributes `amount` from `account`, growing its position.
    ///
    /// Contributions are only accepted once the fund has moved past the open
    /// funding phase, and never past the target amount.
    pub fn add_funds(
        &mut self,
        account: AccountId,
        amount: Amount,
        now: DateTime<Utc>,
    ) -> Result<Investment> {
        if self.state == FundState::Open {
            return Err(FundError::InvalidState(
                "contributions are not accepted while the fund is open",
            ));
        }

        let future_invested = self.invested_amount + amount.into();

        if future_invested.0 > self.target_amount.value() {
            return Err(FundError::TargetExceeded);
        }

        let investment = self
            .investor_mut_or_create(account)
            .add_investment(amount.into(), now)?;

        self.invested_amount = future_invested;

        Ok(investment)
    }

    /// Withdraws `amount` from `account`'s position.
    ///
    /// The position may reach exactly zero, never go negative.
    pub fn remove_funds(
        &mut self,
        account: AccountId,
        amount: Amount,
        now: DateTime<Utc>,
    ) -> Result<Investment> {
        if self.state == FundState::Open {
            return Err(FundError::InvalidState(
                "withdrawals are not accepted while the fund is open",
            ));
        }

        let investor = self
            .investors
            .iter_mut()
            .find(|investor| investor.account == account)
            .ok_or(FundError::InvalidInvestor)?;

        let investment = investor.add_investment(-Balance::from(amount), now)?;
        self.invested_amount -= amount.into();

        Ok(investment)
    }

    /// Distributes a returned payment across all active investors.
    ///
    /// Each share is `amount * position / invested`, truncated toward zero
    /// at the minor unit. Truncation remainders are not redistributed; the
    /// shortfall stays on the settlement account. The fund's returned amount
    /// grows by the nominal payment amount, not the distributed sum.
    pub fn add_payment(&mut self, amount: Amount, now: DateTime<Utc>) -> Result<Payment> {
        if self.state != FundState::Closed {
            return Err(FundError::InvalidState("payments require a closed fund"));
        }

        let mut payment = Payment::new(amount, self.account, now);

        for investor in self.investors(true) {
            let share =
                (amount.value() * investor.invested_amount.0 / self.invested_amount.0).trunc();
            payment.add_payout(investor.account, Balance::new(share));
        }

        self.payments.push(payment.clone());
        self.returned_amount += Balance::new(amount.value());

        Ok(payment)
    }

    /// The position held by `account`, if one was ever created.
    pub fn investor(&self, account: AccountId) -> Option<&Investor> {
        self.investors
            .iter()
            .find(|investor| investor.account == account)
    }

    fn investor_mut_or_create(&mut self, account: AccountId) -> &mut Investor {
        let index = match self
            .investors
            .iter()
            .position(|investor| investor.account == account)
        {
            Some(index) => index,
            None => {
                self.investors.push(Investor::new(account));
                self.investors.len() - 1
            }
        };

        &mut self.investors[index]
    }

    /// Iterates positions in their natural retrieval order.
    ///
    /// With `only_active`, positions withdrawn down to zero are filtered out
    /// without materializing an intermediate collection.
    pub fn investors(&self, only_active: bool) -> impl Iterator<Item = &Investor> {
        self.investors
            .iter()
            .filter(move |investor| !only_active || investor.is_active())
    }

    /// The date the investment period runs to: closing date plus the period.
    pub fn closed_until(&self) -> Result<DateTime<Utc>> {
        let closed_at = self.closed_at.ok_or(FundError::NotClosed)?;

        Ok(closed_at + Duration::days(i64::from(self.period_days)))
    }

    /// Projected total return: the pooled capital (the invested amount once
    /// the fund has closed, the target before that) grown by the interest
    /// rate. Exact, for reporting.
    pub fn total_expected_return(&self) -> Balance {
        let base = if self.closed_at.is_some() {
            self.invested_amount.0
        } else {
            self.target_amount.value()
        };

        Balance::new(base * (Decimal::ONE + self.interest))
    }

    /// `amount` grown by the interest rate, truncated to the minor unit.
    pub fn expected_return(&self, amount: Amount) -> Balance {
        Balance::new((amount.value() * (Decimal::ONE + self.interest)).trunc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fund() -> Fund {
        Fund::new(NewFund {
            account: AccountId(1),
            title: "Mining round".to_string(),
            description: "Pooled mining capital".to_string(),
            period_days: 30,
            interest: dec!(0.05),
            target_amount: Amount::new(dec!(1000)).unwrap(),
        })
        .unwrap()
    }

    /// A fund past its funding phase, ready to take contributions.
    fn closed_fund() -> Fund {
        let mut fund = fund();
        fund.state = FundState::Closed;
        fund.closed_at = Some(Utc::now());
        fund
    }

    #[test]
    fn test_new_fund_is_open_and_empty() {
        let fund = fund();
        assert_eq!(fund.state, FundState::Open);
        assert_eq!(fund.invested_amount, Balance::ZERO);
        assert_eq!(fund.returned_amount, Balance::ZERO);
        assert!(fund.deposit_transfer.is_none());
    }

    #[test]
    fn test_new_fund_validation() {
        let mut params = NewFund {
            account: AccountId(1),
            title: " ".to_string(),
            description: String::new(),
            period_days: 30,
            interest: dec!(0.05),
            target_amount: Amount::new(dec!(1000)).unwrap(),
        };
        assert!(matches!(
            Fund::new(params.clone()),
            Err(FundError::Validation(_))
        ));

        params.title = "Mining round".to_string();
        params.period_days = 0;
        assert!(matches!(
            Fund::new(params.clone()),
            Err(FundError::Validation(_))
        ));

        params.period_days = 30;
        params.interest = dec!(-0.01);
        assert!(matches!(Fund::new(params), Err(FundError::Validation(_))));
    }

    #[test]
    fn test_update_cannot_undercut_invested_amount() {
        let mut fund = closed_fund();
        fund.add_funds(AccountId(2), Amount::new(dec!(500)).unwrap(), Utc::now())
            .unwrap();

        let result = fund.update(UpdateFund {
            title: "Mining round".to_string(),
            description: String::new(),
            period_days: 30,
            interest: dec!(0.05),
            target_amount: Amount::new(dec!(400)).unwrap(),
        });

        assert!(matches!(result, Err(FundError::Validation(_))));
        assert_eq!(fund.target_amount, Amount::new(dec!(1000)).unwrap());
    }

    #[test]
    fn test_close_requires_invested_capital() {
        let mut fund = fund();
        assert!(matches!(fund.close(Utc::now()), Err(FundError::EmptyFund)));
        assert_eq!(fund.state, FundState::Open);
    }

    #[test]
    fn test_close_stamps_and_creates_deposit_transfer() {
        let mut fund = fund();
        fund.state = FundState::Closed;
        fund.add_funds(AccountId(2), Amount::new(dec!(300)).unwrap(), Utc::now())
            .unwrap();
        fund.state = FundState::Open;

        let now = Utc::now();
        fund.close(now).unwrap();

        assert_eq!(fund.state, FundState::Closed);
        assert_eq!(fund.closed_at, Some(now));

        let transfer = fund.deposit_transfer.as_ref().unwrap();
        assert_eq!(transfer.transfer_type, TransferType::Deposit);
        assert_eq!(transfer.amount, Amount::new(dec!(300)).unwrap());
        assert_eq!(transfer.state, crate::domain::transfer::TransferState::Confirmed);
        assert_eq!(transfer.account, AccountId(1));
    }

    #[test]
    fn test_close_rejected_outside_open() {
        let mut fund = closed_fund();
        assert!(matches!(
            fund.close(Utc::now()),
            Err(FundError::InvalidState(_))
        ));
    }

    #[test]
    fn test_finish_only_from_closed() {
        let mut open = fund();
        assert!(matches!(
            open.finish(Utc::now()),
            Err(FundError::InvalidState(_))
        ));

        let mut fund = closed_fund();
        let now = Utc::now();
        fund.finish(now).unwrap();
        assert_eq!(fund.state, FundState::Finished);
        assert_eq!(fund.finished_at, Some(now));

        // Terminal: no further transitions.
        assert!(matches!(
            fund.finish(Utc::now()),
            Err(FundError::InvalidState(_))
        ));
        assert!(matches!(
            fund.cancel(Utc::now()),
            Err(FundError::InvalidState(_))
        ));
    }

    #[test]
    fn test_cancel_refunds_every_active_investor() {
        let mut fund = closed_fund();
        let now = Utc::now();
        fund.add_funds(AccountId(2), Amount::new(dec!(300)).unwrap(), now)
            .unwrap();
        fund.add_funds(AccountId(3), Amount::new(dec!(700)).unwrap(), now)
            .unwrap();
        fund.state = FundState::Open;

        fund.cancel(now).unwrap();

        assert_eq!(fund.state, FundState::Cancelled);
        assert_eq!(fund.cancelled_at, Some(now));
        assert_eq!(fund.invested_amount, Balance::ZERO);

        let a = fund.investor(AccountId(2)).unwrap();
        let b = fund.investor(AccountId(3)).unwrap();
        assert_eq!(a.invested_amount, Balance::ZERO);
        assert_eq!(b.invested_amount, Balance::ZERO);
        assert_eq!(a.investments.last().unwrap().amount, Balance::new(dec!(-300)));
        assert_eq!(b.investments.last().unwrap().amount, Balance::new(dec!(-700)));
    }

    #[test]
    fn test_add_funds_rejected_while_open() {
        let mut fund = fund();
        let result = fund.add_funds(AccountId(2), Amount::new(dec!(100)).unwrap(), Utc::now());
        assert!(matches!(result, Err(FundError::InvalidState(_))));
        assert_eq!(fund.invested_amount, Balance::ZERO);
        assert!(fund.investors(false).next().is_none());
    }

    #[test]
    fn test_add_funds_enforces_target() {
        let mut fund = closed_fund();
        let now = Utc::now();
        fund.add_funds(AccountId(2), Amount::new(dec!(900)).unwrap(), now)
            .unwrap();

        let result = fund.add_funds(AccountId(3), Amount::new(dec!(101)).unwrap(), now);
        assert!(matches!(result, Err(FundError::TargetExceeded)));
        // The rejected contribution must not have moved anything.
        assert_eq!(fund.invested_amount, Balance::new(dec!(900)));
        assert!(fund.investor(AccountId(3)).is_none());

        fund.add_funds(AccountId(3), Amount::new(dec!(100)).unwrap(), now)
            .unwrap();
        assert_eq!(fund.invested_amount, Balance::new(dec!(1000)));
    }

    #[test]
    fn test_remove_funds_requires_existing_position() {
        let mut fund = closed_fund();
        let result = fund.remove_funds(AccountId(9), Amount::new(dec!(10)).unwrap(), Utc::now());
        assert!(matches!(result, Err(FundError::InvalidInvestor)));
    }

    #[test]
    fn test_payout_distribution_truncates() {
        let mut fund = closed_fund();
        let now = Utc::now();
        fund.add_funds(AccountId(2), Amount::new(dec!(100)).unwrap(), now)
            .unwrap();
        fund.add_funds(AccountId(3), Amount::new(dec!(200)).unwrap(), now)
            .unwrap();

        let payment = fund
            .add_payment(Amount::new(dec!(100)).unwrap(), now)
            .unwrap();

        assert_eq!(payment.payouts.len(), 2);
        assert_eq!(payment.payouts[0].account, AccountId(2));
        assert_eq!(payment.payouts[0].amount, Balance::new(dec!(33)));
        assert_eq!(payment.payouts[1].account, AccountId(3));
        assert_eq!(payment.payouts[1].amount, Balance::new(dec!(66)));
        assert_eq!(payment.distributed(), Balance::new(dec!(99)));

        // Nominal amount, not the truncated sum.
        assert_eq!(fund.returned_amount, Balance::new(dec!(100)));
        assert_eq!(fund.payments.len(), 1);
    }

    #[test]
    fn test_payout_skips_withdrawn_positions() {
        let mut fund = closed_fund();
        let now = Utc::now();
        fund.add_funds(AccountId(2), Amount::new(dec!(100)).unwrap(), now)
            .unwrap();
        fund.add_funds(AccountId(3), Amount::new(dec!(200)).unwrap(), now)
            .unwrap();
        fund.remove_funds(AccountId(2), Amount::new(dec!(100)).unwrap(), now)
            .unwrap();

        let payment = fund
            .add_payment(Amount::new(dec!(100)).unwrap(), now)
            .unwrap();

        assert_eq!(payment.payouts.len(), 1);
        assert_eq!(payment.payouts[0].account, AccountId(3));
        assert_eq!(payment.payouts[0].amount, Balance::new(dec!(100)));
    }

    #[test]
    fn test_payment_rejected_unless_closed() {
        let mut fund = fund();
        assert!(matches!(
            fund.add_payment(Amount::new(dec!(100)).unwrap(), Utc::now()),
            Err(FundError::InvalidState(_))
        ));
    }

    #[test]
    fn test_expected_return_queries() {
        let mut fund = closed_fund();
        let now = Utc::now();

        // Not yet closed: projects from the target amount.
        let open = self::fund();
        assert_eq!(open.total_expected_return(), Balance::new(dec!(1050)));

        fund.add_funds(AccountId(2), Amount::new(dec!(500)).unwrap(), now)
            .unwrap();
        assert_eq!(fund.total_expected_return(), Balance::new(dec!(525)));

        assert_eq!(
            fund.expected_return(Amount::new(dec!(333)).unwrap()),
            Balance::new(dec!(349))
        );
    }

    #[test]
    fn test_closed_until() {
        let fund = fund();
        assert!(matches!(fund.closed_until(), Err(FundError::NotClosed)));

        let closed = closed_fund();
        let until = closed.closed_until().unwrap();
        assert_eq!(until, closed.closed_at.unwrap() + Duration::days(30));
    }

    #[test]
    fn test_invested_matches_sum_of_positions() {
        let mut fund = closed_fund();
        let now = Utc::now();
        fund.add_funds(AccountId(2), Amount::new(dec!(100)).unwrap(), now)
            .unwrap();
        fund.add_funds(AccountId(3), Amount::new(dec!(250)).unwrap(), now)
            .unwrap();
        fund.remove_funds(AccountId(2), Amount::new(dec!(40)).unwrap(), now)
            .unwrap();

        let sum = fund
            .investors(false)
            .fold(Balance::ZERO, |acc, investor| acc + investor.invested_amount);
        assert_eq!(fund.invested_amount, sum);
    }
}
