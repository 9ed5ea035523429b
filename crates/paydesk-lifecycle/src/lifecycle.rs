//! The payment lifecycle state machine
//!
//! Every status change goes through [`PaymentLifecycle::transition`] (or the
//! administrative [`PaymentLifecycle::override_status`]), both of which end
//! in a compare-and-set on the store. A caller that read a stale status never
//! overwrites a concurrent decision.

use std::sync::Arc;

use paydesk_db::{AccountStore, StatusUpdate, TransactionStore};
use paydesk_types::{
    Account, Actor, Clock, TransactionId, TransactionKind, TransactionRecord, TransactionStatus,
};
use tracing::{info, warn};

use crate::error::{LifecycleError, LifecycleResult};
use crate::swift::SwiftDirectory;
use crate::validation::{self, PaymentFields, TransferFields, ValidTransfer};

const CREATED_TOTAL: &str = "paydesk_transactions_created_total";
const TRANSITIONS_TOTAL: &str = "paydesk_transitions_total";
const CONFLICTS_TOTAL: &str = "paydesk_transition_conflicts_total";

/// Override reasons are 2 to 200 characters
const OVERRIDE_REASON_LEN: std::ops::RangeInclusive<usize> = 2..=200;

/// Customer-initiated creation and employee-driven review of transaction records
#[derive(Clone)]
pub struct PaymentLifecycle {
    accounts: Arc<dyn AccountStore>,
    transactions: Arc<dyn TransactionStore>,
    directory: SwiftDirectory,
    clock: Arc<dyn Clock>,
}

impl PaymentLifecycle {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        transactions: Arc<dyn TransactionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            transactions,
            directory: SwiftDirectory::new(),
            clock,
        }
    }

    pub fn directory(&self) -> &SwiftDirectory {
        &self.directory
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Record a customer payment in `initialized`
    pub async fn create_payment(
        &self,
        actor: &Actor,
        fields: PaymentFields,
    ) -> LifecycleResult<TransactionRecord> {
        require_customer(actor)?;

        let valid = validation::validate_payment(&fields, &actor.account_number)
            .map_err(LifecycleError::Validation)?;
        let owner = self.resolve_owner(actor).await?;

        let record = TransactionRecord::payment(
            owner.id,
            valid.amount,
            valid.currency,
            valid.provider,
            self.clock.now(),
        );
        let record = self.transactions.create(record).await?;

        record_created(&record);
        info!(
            transaction_id = %record.id,
            actor_id = %actor.id,
            amount = %record.amount,
            currency = %record.currency,
            "Payment created"
        );
        Ok(record)
    }

    /// Record a SWIFT transfer, auto-verifying its routing data.
    ///
    /// A bank name and SWIFT code that do not match the directory produce a
    /// `rejected` record, not an error. A `pending` transfer moves its linked
    /// payment out of `initialized`; once the transfer is stored, a failure to
    /// move the payment is logged and the transfer is still returned.
    pub async fn create_transfer(
        &self,
        actor: &Actor,
        fields: TransferFields,
    ) -> LifecycleResult<TransactionRecord> {
        require_customer(actor)?;

        let valid = validation::validate_transfer(&fields).map_err(LifecycleError::Validation)?;
        let owner = self.resolve_owner(actor).await?;

        let linked = match valid.linked_payment_id {
            Some(id) => Some(self.linked_payment(actor, id).await?),
            None => None,
        };

        let status = if self.directory.matches(&valid.bank_name, &valid.swift_code) {
            TransactionStatus::Pending
        } else {
            warn!(
                actor_id = %actor.id,
                bank_name = %valid.bank_name,
                swift_code = %valid.swift_code,
                expected = ?self.directory.lookup_by_name(&valid.bank_name),
                "Transfer auto-rejected: bank and SWIFT code do not match"
            );
            TransactionStatus::Rejected
        };

        let now = self.clock.now();
        let record = self
            .transactions
            .create(transfer_record(&owner, valid, status, now))
            .await?;

        record_created(&record);
        info!(
            transaction_id = %record.id,
            actor_id = %actor.id,
            status = %record.status,
            "Transfer created"
        );

        if let Some(payment) = linked {
            if status == TransactionStatus::Pending && payment.status == TransactionStatus::Initialized {
                self.advance_linked_payment(&payment, record.id).await;
            }
        }

        Ok(record)
    }

    async fn resolve_owner(&self, actor: &Actor) -> LifecycleResult<Account> {
        self.accounts
            .find_by_id(actor.id)
            .await?
            .ok_or_else(|| LifecycleError::not_found("account"))
    }

    async fn linked_payment(&self, actor: &Actor, id: TransactionId) -> LifecycleResult<TransactionRecord> {
        let payment = self
            .transactions
            .find_by_id(id)
            .await?
            .ok_or_else(|| LifecycleError::not_found("linked payment"))?;

        if !payment.is_owned_by(actor.id) {
            return Err(LifecycleError::forbidden("linked payment belongs to another account"));
        }
        if payment.kind != TransactionKind::Payment {
            return Err(LifecycleError::invalid(
                "linkedPaymentId",
                "Linked record must be a payment",
            ));
        }
        Ok(payment)
    }

    async fn advance_linked_payment(&self, payment: &TransactionRecord, transfer_id: TransactionId) {
        let update = self
            .transactions
            .update_status(
                payment.id,
                TransactionStatus::Initialized,
                TransactionStatus::Pending,
                self.clock.now(),
            )
            .await;

        match update {
            Ok(StatusUpdate::Applied(_)) => {
                metrics::counter!(TRANSITIONS_TOTAL, "to" => TransactionStatus::Pending.as_str()).increment(1);
                info!(transaction_id = %payment.id, %transfer_id, "Linked payment moved to pending");
            }
            Ok(StatusUpdate::Stale(current)) => {
                warn!(
                    transaction_id = %payment.id,
                    %transfer_id,
                    actual = %current.status,
                    "Linked payment left initialized before the transfer could advance it"
                );
            }
            Ok(StatusUpdate::Missing) => {
                warn!(transaction_id = %payment.id, %transfer_id, "Linked payment vanished before it could be advanced");
            }
            Err(e) => {
                warn!(
                    transaction_id = %payment.id,
                    %transfer_id,
                    error = %e,
                    "Failed to advance linked payment; transfer kept"
                );
            }
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Records of one account, newest first; owner or employee only
    pub async fn list_owned(&self, actor: &Actor, account_number: &str) -> LifecycleResult<Vec<TransactionRecord>> {
        let account_number = account_number.trim();
        if !actor.can_view_account(account_number) {
            return Err(LifecycleError::forbidden("records of another account"));
        }

        let account = self
            .accounts
            .find_by_account_number(account_number)
            .await?
            .ok_or_else(|| LifecycleError::not_found("account"))?;

        Ok(self.transactions.find_by_owner(account.id).await?)
    }

    /// Records in `status`, newest first; employees only
    pub async fn list_by_status(
        &self,
        actor: &Actor,
        status: TransactionStatus,
    ) -> LifecycleResult<Vec<TransactionRecord>> {
        require_employee(actor)?;
        Ok(self.transactions.find_by_status(status).await?)
    }

    pub async fn get_record(&self, actor: &Actor, id: TransactionId) -> LifecycleResult<TransactionRecord> {
        let record = self.load(id).await?;
        if !actor.is_employee() && !record.is_owned_by(actor.id) {
            return Err(LifecycleError::forbidden("record of another account"));
        }
        Ok(record)
    }

    async fn load(&self, id: TransactionId) -> LifecycleResult<TransactionRecord> {
        self.transactions
            .find_by_id(id)
            .await?
            .ok_or_else(|| LifecycleError::not_found("transaction"))
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Move a record along the transition table.
    ///
    /// Asking for the status the record already holds succeeds without a
    /// write, so a retried request is harmless.
    pub async fn transition(
        &self,
        actor: &Actor,
        id: TransactionId,
        target: TransactionStatus,
    ) -> LifecycleResult<TransactionRecord> {
        require_employee(actor)?;

        let record = self.load(id).await?;
        if record.status == target {
            return Ok(record);
        }
        if !record.status.can_transition_to(target) {
            return Err(LifecycleError::InvalidTransition {
                from: record.status,
                to: target,
            });
        }

        let updated = self.compare_and_set(&record, target).await?;
        info!(
            transaction_id = %id,
            actor_id = %actor.id,
            from = %record.status,
            to = %target,
            "Transaction status changed"
        );
        Ok(updated)
    }

    pub async fn approve(&self, actor: &Actor, id: TransactionId) -> LifecycleResult<TransactionRecord> {
        self.transition(actor, id, TransactionStatus::Approved).await
    }

    pub async fn reject(&self, actor: &Actor, id: TransactionId) -> LifecycleResult<TransactionRecord> {
        self.transition(actor, id, TransactionStatus::Rejected).await
    }

    pub async fn submit(&self, actor: &Actor, id: TransactionId) -> LifecycleResult<TransactionRecord> {
        self.transition(actor, id, TransactionStatus::Submitted).await
    }

    /// Administrative override outside the regular table.
    ///
    /// Only `rejected` (from anything else) and `pending` (re-opening a
    /// rejected or approved record) are reachable this way.
    pub async fn override_status(
        &self,
        actor: &Actor,
        id: TransactionId,
        target: TransactionStatus,
        reason: &str,
    ) -> LifecycleResult<TransactionRecord> {
        require_employee(actor)?;

        let reason = reason.trim();
        let mut violations = validation::Violations::new();
        violations.check(
            matches!(target, TransactionStatus::Rejected | TransactionStatus::Pending),
            "status",
            "Override target must be rejected or pending",
        );
        violations.check(
            OVERRIDE_REASON_LEN.contains(&reason.chars().count()),
            "reason",
            "Reason must be 2-200 characters",
        );
        violations.finish(()).map_err(LifecycleError::Validation)?;

        let record = self.load(id).await?;
        if record.status == target {
            return Ok(record);
        }
        if !can_override(record.status, target) {
            return Err(LifecycleError::InvalidTransition {
                from: record.status,
                to: target,
            });
        }

        let updated = self.compare_and_set(&record, target).await?;
        warn!(
            transaction_id = %id,
            actor_id = %actor.id,
            from = %record.status,
            to = %target,
            reason = %reason,
            "Transaction status overridden"
        );
        Ok(updated)
    }

    async fn compare_and_set(
        &self,
        record: &TransactionRecord,
        target: TransactionStatus,
    ) -> LifecycleResult<TransactionRecord> {
        let update = self
            .transactions
            .update_status(record.id, record.status, target, self.clock.now())
            .await?;

        match update {
            StatusUpdate::Applied(updated) => {
                metrics::counter!(TRANSITIONS_TOTAL, "to" => target.as_str()).increment(1);
                Ok(updated)
            }
            // A concurrent caller reached the same decision
            StatusUpdate::Stale(current) if current.status == target => Ok(current),
            StatusUpdate::Stale(current) => {
                metrics::counter!(CONFLICTS_TOTAL).increment(1);
                warn!(
                    transaction_id = %record.id,
                    expected = %record.status,
                    actual = %current.status,
                    to = %target,
                    "Transition lost a concurrent race"
                );
                Err(LifecycleError::Conflict {
                    expected: record.status,
                    actual: current.status,
                })
            }
            StatusUpdate::Missing => Err(LifecycleError::not_found("transaction")),
        }
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Irreversibly remove a record; employees only
    pub async fn delete_record(&self, actor: &Actor, id: TransactionId) -> LifecycleResult<()> {
        require_employee(actor)?;

        if !self.transactions.delete(id).await? {
            return Err(LifecycleError::not_found("transaction"));
        }

        info!(transaction_id = %id, actor_id = %actor.id, "Transaction deleted");
        Ok(())
    }
}

fn require_customer(actor: &Actor) -> LifecycleResult<()> {
    if actor.is_employee() {
        return Err(LifecycleError::forbidden("only customers can create transactions"));
    }
    Ok(())
}

fn require_employee(actor: &Actor) -> LifecycleResult<()> {
    if !actor.is_employee() {
        return Err(LifecycleError::forbidden("employees only"));
    }
    Ok(())
}

fn can_override(from: TransactionStatus, to: TransactionStatus) -> bool {
    match to {
        TransactionStatus::Rejected => from != TransactionStatus::Rejected,
        TransactionStatus::Pending => {
            matches!(from, TransactionStatus::Rejected | TransactionStatus::Approved)
        }
        _ => false,
    }
}

fn transfer_record(
    owner: &Account,
    valid: ValidTransfer,
    status: TransactionStatus,
    now: chrono::DateTime<chrono::Utc>,
) -> TransactionRecord {
    TransactionRecord {
        id: TransactionId::new(),
        owner_account_id: owner.id,
        amount: valid.amount,
        currency: valid.currency,
        kind: TransactionKind::Transfer,
        provider: None,
        beneficiary_name: Some(valid.beneficiary_name),
        beneficiary_account_number: Some(valid.beneficiary_account_number),
        bank_name: Some(valid.bank_name),
        swift_code: Some(valid.swift_code),
        reference: valid.reference,
        linked_transaction_id: valid.linked_payment_id,
        status,
        created_at: now,
        updated_at: now,
    }
}

fn record_created(record: &TransactionRecord) {
    metrics::counter!(
        CREATED_TOTAL,
        "kind" => record.kind.as_str(),
        "status" => record.status.as_str()
    )
    .increment(1);
}
