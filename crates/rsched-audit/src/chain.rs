//! Hash-chain construction and verification (spec.md §4.5.2), modeled on
//! RFC 6962 Certificate Transparency logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use rsched_domain::{ActorType, ApprovalAction, ApprovalRecord};
use rsched_foundation::{sha256_hex, to_canonical_string};

use crate::error::Result;

fn record_hash_input(
    prev_hash: Option<&str>,
    payload: &Value,
    actor_id: Option<Uuid>,
    actor_type: ActorType,
    action: ApprovalAction,
    timestamp: DateTime<Utc>,
    reason: Option<&str>,
) -> Value {
    json!({
        "prev_hash": prev_hash.unwrap_or("GENESIS"),
        "payload": payload,
        "actor_id": actor_id.map(|id| id.to_string()),
        "actor_type": actor_type,
        "action": action,
        "timestamp": timestamp.to_rfc3339(),
        "reason": reason,
    })
}

/// Computes `SHA-256(canonical_json({prev_hash || "GENESIS", payload,
/// actor_id, actor_type, action, iso_timestamp, reason}))`.
pub fn compute_hash(
    prev_hash: Option<&str>,
    payload: &Value,
    actor_id: Option<Uuid>,
    actor_type: ActorType,
    action: ApprovalAction,
    timestamp: DateTime<Utc>,
    reason: Option<&str>,
) -> Result<String> {
    let input = record_hash_input(prev_hash, payload, actor_id, actor_type, action, timestamp, reason);
    let canonical = to_canonical_string(&input)?;
    Ok(sha256_hex(&canonical))
}

/// Builds the genesis record (`sequence_num = 0`, `prev_hash = None`) for
/// a new chain.
pub fn create_genesis(
    chain_id: impl Into<String>,
    payload: Option<Value>,
    actor_id: Option<Uuid>,
    reason: impl Into<String>,
    now: DateTime<Utc>,
) -> Result<ApprovalRecord> {
    let payload = payload.unwrap_or_else(|| json!({"chain_initialized": true}));
    let reason = reason.into();
    let record_hash = compute_hash(
        None,
        &payload,
        actor_id,
        ActorType::System,
        ApprovalAction::Genesis,
        now,
        Some(&reason),
    )?;
    Ok(ApprovalRecord {
        id: Uuid::new_v4(),
        chain_id: chain_id.into(),
        sequence_num: 0,
        prev_record_id: None,
        prev_hash: None,
        record_hash,
        action: ApprovalAction::Genesis,
        payload,
        actor_id,
        actor_type: ActorType::System,
        reason: Some(reason),
        target_entity_type: None,
        target_entity_id: None,
        timestamp: now,
    })
}

/// Parameters for appending a new record after `prior`.
pub struct AppendRequest {
    pub action: ApprovalAction,
    pub payload: Value,
    pub actor_id: Option<Uuid>,
    pub actor_type: ActorType,
    pub reason: Option<String>,
    pub target_entity_type: Option<String>,
    pub target_entity_id: Option<String>,
}

/// Appends a new record after `prior`, computing `prev_hash` and
/// `record_hash` from it. The caller (repository layer) is responsible
/// for enforcing `(chain_id, sequence_num)` uniqueness on write.
pub fn append(prior: &ApprovalRecord, req: AppendRequest, now: DateTime<Utc>) -> Result<ApprovalRecord> {
    let record_hash = compute_hash(
        Some(&prior.record_hash),
        &req.payload,
        req.actor_id,
        req.actor_type,
        req.action,
        now,
        req.reason.as_deref(),
    )?;
    Ok(ApprovalRecord {
        id: Uuid::new_v4(),
        chain_id: prior.chain_id.clone(),
        sequence_num: prior.sequence_num + 1,
        prev_record_id: Some(prior.id),
        prev_hash: Some(prior.record_hash.clone()),
        record_hash,
        action: req.action,
        payload: req.payload,
        actor_id: req.actor_id,
        actor_type: req.actor_type,
        reason: req.reason,
        target_entity_type: req.target_entity_type,
        target_entity_id: req.target_entity_id,
        timestamp: now,
    })
}

/// Recomputes `record.record_hash` from its stored fields and compares.
pub fn verify_hash(record: &ApprovalRecord) -> Result<bool> {
    let expected = compute_hash(
        record.prev_hash.as_deref(),
        &record.payload,
        record.actor_id,
        record.actor_type,
        record.action,
        record.timestamp,
        record.reason.as_deref(),
    )?;
    Ok(expected == record.record_hash)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainVerification {
    pub ok: bool,
    pub first_bad_sequence: Option<u64>,
}

/// Walks `records` in `sequence_num` order, recomputing each hash and
/// checking `prev_hash == prior.record_hash`. Returns the first tampered
/// `sequence_num` on mismatch.
pub fn verify_chain(records: &[ApprovalRecord]) -> Result<ChainVerification> {
    let mut ordered: Vec<&ApprovalRecord> = records.iter().collect();
    ordered.sort_by_key(|r| r.sequence_num);

    let mut prior: Option<&ApprovalRecord> = None;
    for record in ordered {
        if !verify_hash(record)? {
            return Ok(ChainVerification {
                ok: false,
                first_bad_sequence: Some(record.sequence_num),
            });
        }
        let expected_prev_hash = prior.map(|p| p.record_hash.clone());
        if record.prev_hash != expected_prev_hash {
            return Ok(ChainVerification {
                ok: false,
                first_bad_sequence: Some(record.sequence_num),
            });
        }
        prior = Some(record);
    }
    Ok(ChainVerification {
        ok: true,
        first_bad_sequence: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_has_no_prev_hash() {
        let record = create_genesis("C1", None, None, "init", Utc::now()).unwrap();
        assert_eq!(record.sequence_num, 0);
        assert!(record.prev_hash.is_none());
        assert!(verify_hash(&record).unwrap());
    }

    #[test]
    fn untampered_chain_verifies() {
        let genesis = create_genesis("C1", None, None, "init", Utc::now()).unwrap();
        let rec1 = append(
            &genesis,
            AppendRequest {
                action: ApprovalAction::ScheduleGenerated,
                payload: json!({"run_id": "r1"}),
                actor_id: None,
                actor_type: ActorType::System,
                reason: None,
                target_entity_type: None,
                target_entity_id: None,
            },
            Utc::now(),
        )
        .unwrap();
        let rec2 = append(
            &rec1,
            AppendRequest {
                action: ApprovalAction::ScheduleApproved,
                payload: json!({"approved_by": "chief"}),
                actor_id: None,
                actor_type: ActorType::Human,
                reason: None,
                target_entity_type: None,
                target_entity_id: None,
            },
            Utc::now(),
        )
        .unwrap();
        let result = verify_chain(&[genesis, rec1, rec2]).unwrap();
        assert!(result.ok);
        assert!(result.first_bad_sequence.is_none());
    }

    #[test]
    fn tampered_payload_breaks_chain_at_its_sequence() {
        let genesis = create_genesis("C1", None, None, "init", Utc::now()).unwrap();
        let rec1 = append(
            &genesis,
            AppendRequest {
                action: ApprovalAction::ScheduleGenerated,
                payload: json!({"run_id": "r1"}),
                actor_id: None,
                actor_type: ActorType::System,
                reason: None,
                target_entity_type: None,
                target_entity_id: None,
            },
            Utc::now(),
        )
        .unwrap();
        let mut rec2 = append(
            &rec1,
            AppendRequest {
                action: ApprovalAction::ScheduleApproved,
                payload: json!({"approved_by": "chief"}),
                actor_id: None,
                actor_type: ActorType::Human,
                reason: None,
                target_entity_type: None,
                target_entity_id: None,
            },
            Utc::now(),
        )
        .unwrap();
        rec2.payload = json!({"approved_by": "tampered"});
        let result = verify_chain(&[genesis, rec1, rec2]).unwrap();
        assert!(!result.ok);
        assert_eq!(result.first_bad_sequence, Some(2));
    }
}
