//! Roster payment tracking

use super::service::Service;
use crate::contract::{LeagueError, NewTeamPayment, PaymentSummary, TeamPayment, TeamPaymentStatus};
use chrono::NaiveDate;

impl Service {
    pub async fn payments_for_roster(&self, roster_id: &str) -> Result<Vec<TeamPayment>, LeagueError> {
        self.call(
            "payments.find_by_roster",
            self.repos.payments.find_by_roster(roster_id),
        )
        .await
    }

    pub async fn payment_summary(&self, roster_id: &str) -> Result<PaymentSummary, LeagueError> {
        let payments = self.payments_for_roster(roster_id).await?;
        Ok(summarize(roster_id, &payments))
    }

    pub async fn record_payment(&self, payment: NewTeamPayment) -> Result<TeamPayment, LeagueError> {
        if payment.amount_cents <= 0 {
            return Err(LeagueError::validation("payment amount must be positive"));
        }
        if payment.currency.trim().is_empty() {
            return Err(LeagueError::validation("payment currency is required"));
        }
        self.require(
            "rosters.find_by_id",
            "roster",
            &payment.roster_id,
            self.repos.rosters.find_by_id(&payment.roster_id),
        )
        .await?;

        self.call("payments.create", self.repos.payments.create(&payment))
            .await
    }

    pub async fn mark_payment_paid(&self, id: &str) -> Result<TeamPayment, LeagueError> {
        self.require(
            "payments.update_status",
            "payment",
            id,
            self.repos.payments.update_status(id, TeamPaymentStatus::Paid),
        )
        .await
    }

    /// Flag pending installments due before `today` as overdue
    pub async fn mark_overdue_payments(&self, today: NaiveDate) -> Result<Vec<TeamPayment>, LeagueError> {
        let pending = self
            .call(
                "payments.find_by_status",
                self.repos.payments.find_by_status(TeamPaymentStatus::Pending),
            )
            .await?;

        let mut flagged = Vec::new();
        for payment in pending
            .into_iter()
            .filter(|p| p.due_date.is_some_and(|due| due < today))
        {
            if let Some(updated) = self
                .call(
                    "payments.update_status",
                    self.repos
                        .payments
                        .update_status(&payment.id, TeamPaymentStatus::Overdue),
                )
                .await?
            {
                flagged.push(updated);
            }
        }

        if !flagged.is_empty() {
            tracing::info!(count = flagged.len(), %today, "payments marked overdue");
        }
        Ok(flagged)
    }
}

/// Money totals for one roster; outstanding is every installment not paid
pub fn summarize(roster_id: &str, payments: &[TeamPayment]) -> PaymentSummary {
    let mut summary = PaymentSummary {
        roster_id: roster_id.to_string(),
        payment_count: payments.len(),
        ..Default::default()
    };

    for payment in payments {
        summary.total_cents += payment.amount_cents;
        match payment.status {
            TeamPaymentStatus::Paid => summary.paid_cents += payment.amount_cents,
            status => {
                summary.outstanding_cents += payment.amount_cents;
                if status == TeamPaymentStatus::Overdue {
                    summary.overdue_cents += payment.amount_cents;
                }
                if status != TeamPaymentStatus::Cancelled {
                    summary.next_due = match (summary.next_due, payment.due_date) {
                        (Some(current), Some(due)) => Some(current.min(due)),
                        (current, due) => current.or(due),
                    };
                }
            }
        }
    }
    summary
}
