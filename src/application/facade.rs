use crate::domain::account::AccountId;
use crate::domain::fund::{Fund, NewFund, UpdateFund};
use crate::domain::investor::Investment;
use crate::domain::money::Amount;
use crate::domain::payment::Payment;
use crate::domain::ports::{EventPublisherBox, FundEvent, FundId, FundStoreBox};
use crate::error::{FundError, Result};
use chrono::Utc;

/// Orchestrates the fund lifecycle against a store and an event publisher.
///
/// Every operation is one logical unit: load the aggregate, mutate it in
/// memory, save it wholesale, then publish the corresponding event. If the
/// domain rejects the mutation or the save fails, nothing is published and
/// the stored aggregate is left as it was.
pub struct FundFacade {
    funds: FundStoreBox,
    events: EventPublisherBox,
}

impl FundFacade {
    pub fn new(funds: FundStoreBox, events: EventPublisherBox) -> Self {
        Self { funds, events }
    }

    pub async fn create_fund(&self, params: NewFund) -> Result<FundId> {
        let fund = Fund::new(params)?;
        let id = self.funds.insert(fund).await?;

        tracing::info!(fund = %id, "fund created");
        self.events.publish(FundEvent::FundCreated(id)).await?;

        Ok(id)
    }

    pub async fn update_fund(&self, id: FundId, values: UpdateFund) -> Result<()> {
        let mut fund = self.load(id).await?;
        fund.update(values)?;
        self.funds.save(id, fund).await?;

        tracing::debug!(fund = %id, "fund updated");

        Ok(())
    }

    pub async fn close_fund(&self, id: FundId, caller: AccountId) -> Result<()> {
        let mut fund = self.load(id).await?;
        authorize(&fund, caller)?;

        fund.close(Utc::now())?;
        self.funds.save(id, fund).await?;

        tracing::info!(fund = %id, "fund closed");
        self.events.publish(FundEvent::FundClosed(id)).await?;

        Ok(())
    }

    pub async fn finish_fund(&self, id: FundId, caller: AccountId) -> Result<()> {
        let mut fund = self.load(id).await?;
        authorize(&fund, caller)?;

        fund.finish(Utc::now())?;
        self.funds.save(id, fund).await?;

        tracing::info!(fund = %id, "fund finished");
        self.events.publish(FundEvent::FundFinished(id)).await?;

        Ok(())
    }

    pub async fn cancel_fund(&self, id: FundId, caller: AccountId) -> Result<()> {
        let mut fund = self.load(id).await?;
        authorize(&fund, caller)?;

        fund.cancel(Utc::now())?;
        self.funds.save(id, fund).await?;

        tracing::info!(fund = %id, "fund cancelled");
        self.events.publish(FundEvent::FundCancelled(id)).await?;

        Ok(())
    }

    pub async fn add_payment(
        &self,
        id: FundId,
        caller: AccountId,
        amount: Amount,
    ) -> Result<Payment> {
        let mut fund = self.load(id).await?;
        authorize(&fund, caller)?;

        let payment = fund.add_payment(amount, Utc::now())?;
        self.funds.save(id, fund).await?;

        tracing::info!(fund = %id, amount = %payment.amount.value(), "payment distributed");
        self.events.publish(FundEvent::PaymentCreated(id)).await?;

        Ok(payment)
    }

    pub async fn get_fund(&self, id: FundId) -> Result<Fund> {
        self.load(id).await
    }

    async fn load(&self, id: FundId) -> Result<Fund> {
        self.funds
            .get(id)
            .await?
            .ok_or(FundError::FundNotFound(id))
    }
}

/// Orchestrates investor contributions and withdrawals.
pub struct FundInvestorFacade {
    funds: FundStoreBox,
    events: EventPublisherBox,
}

impl FundInvestorFacade {
    pub fn new(funds: FundStoreBox, events: EventPublisherBox) -> Self {
        Self { funds, events }
    }

    pub async fn add_funds(
        &self,
        id: FundId,
        investor_account: AccountId,
        amount: Amount,
    ) -> Result<Investment> {
        let mut fund = self.load(id).await?;

        let investment = fund.add_funds(investor_account, amount, Utc::now())?;
        self.funds.save(id, fund).await?;

        tracing::info!(
            fund = %id,
            investor = %investor_account,
            amount = %amount.value(),
            "funds added"
        );
        self.events.publish(FundEvent::FundsAdded(id)).await?;

        Ok(investment)
    }

    pub async fn remove_funds(
        &self,
        id: FundId,
        investor_account: AccountId,
        amount: Amount,
    ) -> Result<Investment> {
        let mut fund = self.load(id).await?;

        let investment = fund.remove_funds(investor_account, amount, Utc::now())?;
        self.funds.save(id, fund).await?;

        tracing::info!(
            fund = %id,
            investor = %investor_account,
            amount = %amount.value(),
            "funds removed"
        );
        self.events.publish(FundEvent::FundsRemoved(id)).await?;

        Ok(investment)
    }

    async fn load(&self, id: FundId) -> Result<Fund> {
        self.funds
            .get(id)
            .await?
            .ok_or(FundError::FundNotFound(id))
    }
}

fn authorize(fund: &Fund, caller: AccountId) -> Result<()> {
    if fund.account != caller {
        return Err(FundError::Forbidden);
    }

    Ok(())
}
