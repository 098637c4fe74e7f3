//! Team registration flow: submission, review and checkout completion

use super::service::Service;
use super::validation::{check_transition, validate_registration};
use crate::contract::{
    CheckoutCompletion, LeagueError, NewTeam, NewTeamPayment, Package, PaymentStatus,
    RegistrationRequest, RegistrationStatus, Roster, TeamPaymentStatus, TeamRegistration,
    TeamStatus,
};
use std::collections::HashSet;

impl Service {
    /// Validate and store a new pending registration
    pub async fn create_registration(
        &self,
        request: RegistrationRequest,
    ) -> Result<TeamRegistration, LeagueError> {
        let registration = validate_registration(&request)?;

        if !registration.selected_session_ids.is_empty() {
            let season = self
                .current_season()
                .await?
                .ok_or_else(|| LeagueError::validation("no active season is open for registration"))?;
            let offered: HashSet<String> = self
                .sessions_for_season(&season.id)
                .await?
                .into_iter()
                .map(|s| s.id)
                .collect();
            if let Some(unknown) = registration
                .selected_session_ids
                .iter()
                .find(|id| !offered.contains(*id))
            {
                return Err(LeagueError::validation(format!(
                    "session '{unknown}' is not offered in season '{}'",
                    season.name
                )));
            }
        }

        let created = self
            .call(
                "registrations.create",
                self.repos.registrations.create(&registration),
            )
            .await?;
        tracing::info!(
            registration_id = %created.id,
            package = %created.selected_package,
            "registration submitted"
        );
        Ok(created)
    }

    pub async fn get_registration(&self, id: &str) -> Result<TeamRegistration, LeagueError> {
        self.require(
            "registrations.find_by_id",
            "registration",
            id,
            self.repos.registrations.find_by_id(id),
        )
        .await
    }

    pub async fn list_registrations(&self) -> Result<Vec<TeamRegistration>, LeagueError> {
        self.call("registrations.find_all", self.repos.registrations.find_all())
            .await
    }

    pub async fn registrations_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<TeamRegistration>, LeagueError> {
        self.call(
            "registrations.find_by_user",
            self.repos.registrations.find_by_user(user_id),
        )
        .await
    }

    pub async fn registrations_by_status(
        &self,
        status: RegistrationStatus,
    ) -> Result<Vec<TeamRegistration>, LeagueError> {
        self.call(
            "registrations.find_by_status",
            self.repos.registrations.find_by_status(status),
        )
        .await
    }

    pub async fn search_registrations(
        &self,
        term: &str,
    ) -> Result<Vec<TeamRegistration>, LeagueError> {
        self.call(
            "registrations.search",
            self.repos.registrations.search(term),
        )
        .await
    }

    /// Move a registration through the review table.
    ///
    /// Approval provisions the team, roster and session enrollments; a
    /// provisioning failure is logged and the approval still stands.
    pub async fn update_registration_status(
        &self,
        id: &str,
        new_status: RegistrationStatus,
    ) -> Result<TeamRegistration, LeagueError> {
        let current = self.get_registration(id).await?;
        check_transition(current.status, new_status)?;

        let updated = self.swap_status(id, current.status, new_status).await?;
        tracing::info!(
            registration_id = %id,
            from = %current.status,
            to = %new_status,
            "registration status changed"
        );

        if new_status != RegistrationStatus::Approved {
            return Ok(updated);
        }

        match self.provision(updated.clone()).await {
            Ok((provisioned, _)) => Ok(provisioned),
            Err(err) => {
                tracing::warn!(
                    registration_id = %id,
                    error = %err,
                    "approved registration could not be provisioned"
                );
                Ok(updated)
            }
        }
    }

    /// Apply a completed provider checkout.
    ///
    /// Marks the registration paid, approves it when still pending, provisions
    /// it and records the paid installment. Concurrent or redelivered
    /// completions converge on one team, one roster and one payment: the
    /// store links a team only once, keeps one roster per team and season
    /// division, and one payment per provider session.
    pub async fn complete_checkout(
        &self,
        completion: CheckoutCompletion,
    ) -> Result<TeamRegistration, LeagueError> {
        let id = completion.registration_id.as_str();
        let current = self.get_registration(id).await?;
        if matches!(
            current.status,
            RegistrationStatus::Rejected | RegistrationStatus::Cancelled
        ) {
            return Err(LeagueError::InvalidTransition {
                from: current.status.to_string(),
                to: RegistrationStatus::Approved.to_string(),
            });
        }

        let mut registration = if current.payment_status == PaymentStatus::Paid
            && current.payment_session_id.as_deref() == Some(completion.provider_session_id.as_str())
        {
            current
        } else {
            self.require(
                "registrations.update_payment",
                "registration",
                id,
                self.repos.registrations.update_payment(
                    id,
                    PaymentStatus::Paid,
                    Some(&completion.provider_session_id),
                ),
            )
            .await?
        };

        if registration.status == RegistrationStatus::Pending {
            registration = match self
                .swap_status(id, RegistrationStatus::Pending, RegistrationStatus::Approved)
                .await
            {
                Ok(approved) => approved,
                // Another writer got there first; accept it if it approved
                Err(LeagueError::Conflict { .. }) => {
                    let latest = self.get_registration(id).await?;
                    if latest.status != RegistrationStatus::Approved {
                        return Err(LeagueError::Conflict {
                            reason: format!(
                                "registration {id} moved to {} during checkout",
                                latest.status
                            ),
                        });
                    }
                    latest
                }
                Err(err) => return Err(err),
            };
        }

        let (registration, roster) = self.provision(registration).await?;

        let recorded = self
            .payments_for_roster(&roster.id)
            .await?
            .into_iter()
            .any(|p| {
                p.provider_session_id.as_deref() == Some(completion.provider_session_id.as_str())
            });
        if !recorded {
            self.record_payment(NewTeamPayment {
                roster_id: roster.id.clone(),
                amount_cents: completion
                    .amount_cents
                    .unwrap_or_else(|| self.pricing.price_of(registration.selected_package)),
                currency: completion
                    .currency
                    .clone()
                    .unwrap_or_else(|| self.pricing.currency.clone()),
                status: TeamPaymentStatus::Paid,
                due_date: None,
                paid_at: Some(chrono::Utc::now()),
                provider_session_id: Some(completion.provider_session_id.clone()),
                provider_payment_id: completion.provider_payment_id.clone(),
                description: Some(format!(
                    "{} registration",
                    registration.selected_package
                )),
            })
            .await?;
        }

        tracing::info!(
            registration_id = %id,
            roster_id = %roster.id,
            already_recorded = recorded,
            "checkout completed"
        );
        Ok(registration)
    }

    /// Drop a team created by a provisioning attempt that lost the link race
    async fn discard_team(&self, team_id: &str, registration_id: &str) {
        tracing::info!(
            registration_id = %registration_id,
            team_id = %team_id,
            "registration already linked to another team, discarding"
        );
        if let Err(err) = self
            .call("teams.delete", self.repos.teams.delete(team_id))
            .await
        {
            tracing::warn!(team_id = %team_id, error = %err, "could not discard team");
        }
    }

    /// Conditional status write; a stale `expected` becomes `Conflict`
    async fn swap_status(
        &self,
        id: &str,
        expected: RegistrationStatus,
        new_status: RegistrationStatus,
    ) -> Result<TeamRegistration, LeagueError> {
        self.call(
            "registrations.update_status_if",
            self.repos
                .registrations
                .update_status_if(id, expected, new_status),
        )
        .await?
        .ok_or_else(|| LeagueError::Conflict {
            reason: format!("registration {id} is no longer {expected}"),
        })
    }

    /// Create or reuse the team and current-season roster of an approved
    /// registration, then enroll the roster in its sessions.
    async fn provision(
        &self,
        registration: TeamRegistration,
    ) -> Result<(TeamRegistration, Roster), LeagueError> {
        let season = self
            .current_season()
            .await?
            .ok_or_else(|| LeagueError::not_found("season", "current"))?;

        let (registration, team_id) = match registration.team_id.clone() {
            Some(team_id) => (registration, team_id),
            None => {
                let team = self
                    .create_team(NewTeam {
                        name: registration.team_name.clone(),
                        location: Some(registration.city.clone()),
                        status: Some(TeamStatus::Active),
                        ..Default::default()
                    })
                    .await?;
                let linked = self
                    .require(
                        "registrations.link_team",
                        "registration",
                        &registration.id,
                        self.repos.registrations.link_team(&registration.id, &team.id),
                    )
                    .await?;
                match linked.team_id.clone() {
                    Some(winner) if winner == team.id => (linked, winner),
                    Some(winner) => {
                        self.discard_team(&team.id, &registration.id).await;
                        (linked, winner)
                    }
                    None => {
                        return Err(LeagueError::Conflict {
                            reason: format!("registration {} lost its team link", registration.id),
                        })
                    }
                }
            }
        };

        let existing = self
            .call(
                "rosters.find_by_team_and_season",
                self.repos
                    .rosters
                    .find_by_team_and_season(&team_id, &season.id),
            )
            .await?;
        let roster = match existing {
            Some(roster) => roster,
            None => {
                self.call(
                    "rosters.create",
                    self.repos.rosters.create(
                        &team_id,
                        &season.id,
                        &registration.division_preference,
                    ),
                )
                .await?
            }
        };

        let session_ids: Vec<String> = match registration.selected_package {
            Package::FullSeason => self
                .sessions_for_season(&season.id)
                .await?
                .into_iter()
                .map(|s| s.id)
                .collect(),
            Package::TwoSession | Package::PayPerSession => {
                registration.selected_session_ids.clone()
            }
        };

        let mut enrolled = 0usize;
        for session_id in &session_ids {
            match self
                .call(
                    "enrollments.enroll",
                    self.repos.enrollments.enroll(&roster.id, session_id, true),
                )
                .await
            {
                Ok(_) => enrolled += 1,
                Err(err) => tracing::warn!(
                    roster_id = %roster.id,
                    session_id = %session_id,
                    error = %err,
                    "skipping session enrollment"
                ),
            }
        }

        tracing::info!(
            registration_id = %registration.id,
            team_id = %team_id,
            roster_id = %roster.id,
            enrolled,
            requested = session_ids.len(),
            "registration provisioned"
        );
        Ok((registration, roster))
    }
}
