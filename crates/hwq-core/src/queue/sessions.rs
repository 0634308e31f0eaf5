use chrono::Utc;

use crate::auth::{Caller, IdentityResolver};
use crate::common::error::CoreError;
use crate::ledger::DebitReceipt;
use crate::model::{ResourceUsage, Session, SessionDraft, SessionStatus};
use crate::queue::{ListScope, QueueCore, UpdateOutcome};
use crate::store::{Pagination, RecordStore, SessionQuery, StoreTx};
use crate::SessionId;

fn load_session(tx: &dyn StoreTx, session_id: SessionId) -> crate::Result<Session> {
    tx.get_session(session_id)?
        .ok_or_else(|| CoreError::not_found("session", session_id))
}

impl<S: RecordStore, R: IdentityResolver> QueueCore<S, R> {
    /// Opens an interactive session on behalf of `draft.owner`.
    pub fn create_session(&self, caller: &Caller, draft: SessionDraft) -> crate::Result<Session> {
        let provider = caller.as_provider()?;
        self.providers
            .check_platform(provider, &draft.hardware_platform)?;
        let units = self
            .ledger
            .platforms()
            .require(&draft.hardware_platform)?
            .to_string();

        let session = self.store.transaction(|tx| {
            self.ledger
                .check_admission(&*tx, &draft.collaboration, &draft.hardware_platform)?;
            let mut session = Session {
                id: SessionId::default(),
                collaboration: draft.collaboration,
                owner: draft.owner,
                hardware_platform: draft.hardware_platform,
                status: SessionStatus::Running,
                started_at: Utc::now(),
                ended_at: None,
                resource_usage: ResourceUsage::zero(units),
            };
            session.id = tx.insert_session(session.clone())?;
            Ok(session)
        })?;
        log::info!(
            "Session {} started by {provider} on {} for {} in collaboration {}",
            session.id,
            session.hardware_platform,
            session.owner,
            session.collaboration
        );
        Ok(session)
    }

    /// Records the cumulative usage of a running session and charges the increase.
    pub fn report_session_usage(
        &self,
        caller: &Caller,
        session_id: SessionId,
        usage: ResourceUsage,
    ) -> crate::Result<UpdateOutcome<Session>> {
        let provider = caller.as_provider()?;
        self.store.transaction(|tx| {
            let mut session = load_session(&*tx, session_id)?;
            self.providers
                .check_platform(provider, &session.hardware_platform)?;
            if session.status != SessionStatus::Running {
                return crate::common::error::validation_error(format!(
                    "Session {session_id} is {} and no longer accepts usage reports",
                    session.status
                ));
            }
            let debit = self.charge_session(tx, &mut session, usage)?;
            Ok(UpdateOutcome {
                record: session,
                debit: Some(debit),
            })
        })
    }

    /// Closes a running session with its final cumulative usage.
    pub fn report_session_close(
        &self,
        caller: &Caller,
        session_id: SessionId,
        status: SessionStatus,
        usage: ResourceUsage,
    ) -> crate::Result<UpdateOutcome<Session>> {
        let provider = caller.as_provider()?;
        let outcome = self.store.transaction(|tx| {
            let mut session = load_session(&*tx, session_id)?;
            self.providers
                .check_platform(provider, &session.hardware_platform)?;
            session.status.check_close(status)?;
            session.status = status;
            session.ended_at = Some(Utc::now());
            let debit = self.charge_session(tx, &mut session, usage)?;
            Ok(UpdateOutcome {
                record: session,
                debit: Some(debit),
            })
        })?;
        log::info!(
            "Session {session_id} closed by {provider} as {} with {} {}",
            outcome.record.status,
            outcome.record.resource_usage.value,
            outcome.record.resource_usage.units
        );
        Ok(outcome)
    }

    fn charge_session(
        &self,
        tx: &mut dyn StoreTx,
        session: &mut Session,
        usage: ResourceUsage,
    ) -> crate::Result<DebitReceipt> {
        self.ledger
            .platforms()
            .check_units(&session.hardware_platform, &usage.units)?;
        usage.validate()?;
        let recorded = session.resource_usage.value;
        if usage.value < recorded {
            return crate::common::error::validation_error(format!(
                "Session usage is cumulative: reported {} is below the recorded {recorded}",
                usage.value
            ));
        }
        let increase = ResourceUsage::new(usage.value - recorded, usage.units.clone());
        session.resource_usage = usage;
        tx.update_session(session)?;
        self.ledger.debit(
            tx,
            &session.collaboration,
            &session.hardware_platform,
            &increase,
        )
    }

    pub fn get_session(&self, caller: &Caller, session_id: SessionId) -> crate::Result<Session> {
        let session = self.store.read(|tx| load_session(tx, session_id))?;
        self.check_visible(caller, &session)?;
        Ok(session)
    }

    /// Lists sessions visible to the caller; removed sessions only when asked for.
    pub fn list_sessions(
        &self,
        caller: &Caller,
        mut query: SessionQuery,
        page: Pagination,
    ) -> crate::Result<Vec<Session>> {
        self.restrict_listing(
            caller,
            ListScope {
                collaborations: &mut query.collaborations,
                owner: &mut query.owner,
                platforms: &mut query.platforms,
            },
        )?;
        if query.statuses.is_none() {
            query.statuses = Some(vec![
                SessionStatus::Running,
                SessionStatus::Finished,
                SessionStatus::Error,
            ]);
        }
        self.store.read(|tx| tx.query_sessions(&query, page))
    }

    pub fn remove_session(&self, caller: &Caller, session_id: SessionId) -> crate::Result<()> {
        let principal = caller.as_user()?;
        self.store.transaction(|tx| {
            let mut session = load_session(&*tx, session_id)?;
            self.check_visible(caller, &session)?;
            self.check_owner_or_admin(principal, &session, "remove")?;
            if session.status != SessionStatus::Removed {
                session.status = SessionStatus::Removed;
                tx.update_session(&session)?;
                log::info!("Session {session_id} removed by {}", principal.username);
            }
            Ok(())
        })
    }
}
