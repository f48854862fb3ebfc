//! Join codes (long-lived, one per business) and scan codes (short-lived,
//! kept in a TTL store).

use crate::core::business::{require_business, require_event};
use crate::db::pool::DbPool;
use crate::db::repository::Repository;
use crate::db::ttl_store::TtlStore;
use crate::errors::{AppError, AppResult};
use crate::models::member::{Member, Role};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Serialize;

const SCAN_KEY_PREFIX: &str = "scan:";

#[derive(Debug, Clone)]
pub struct JoinCodePolicy {
    pub length: usize,
    /// Fresh values tried after a unique-constraint collision.
    pub retries: u32,
}

impl Default for JoinCodePolicy {
    fn default() -> Self {
        Self {
            length: 10,
            retries: 5,
        }
    }
}

/// Random alphanumeric join code.
pub fn generate_join_code(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Random scan code (32 bytes of entropy, hex encoded).
pub fn generate_scan_code() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Store a new code for `business_id`, drawing values from `generate`.
///
/// The previous code stops working in the same statement that activates
/// the new one.
pub fn replace_join_code_with<R, G>(
    repo: &R,
    business_id: i64,
    retries: u32,
    mut generate: G,
) -> AppResult<String>
where
    R: Repository + ?Sized,
    G: FnMut() -> String,
{
    let mut attempt = 0;
    loop {
        let code = generate();
        match repo.set_join_code(business_id, &code) {
            Ok(()) => return Ok(code),
            Err(AppError::Conflict(_)) if attempt < retries => attempt += 1,
            Err(e) => return Err(e),
        }
    }
}

pub(crate) fn replace_join_code<R: Repository + ?Sized>(
    repo: &R,
    business_id: i64,
    policy: &JoinCodePolicy,
) -> AppResult<String> {
    if policy.length < 6 {
        return Err(AppError::validation("join codes need at least 6 characters"));
    }
    replace_join_code_with(repo, business_id, policy.retries, || {
        generate_join_code(policy.length)
    })
}

/// Issue the business's join code, replacing any previous one.
pub fn issue_join_code(
    pool: &mut DbPool,
    business_id: i64,
    policy: &JoinCodePolicy,
) -> AppResult<String> {
    pool.transaction(|repo| {
        require_business(repo, business_id)?;
        let code = replace_join_code(repo, business_id, policy)?;
        repo.audit("join_code_issue", &business_id.to_string(), "Join code issued")?;
        Ok(code)
    })
}

/// Invalidate the current join code and activate a new one atomically.
pub fn rotate_join_code(
    pool: &mut DbPool,
    business_id: i64,
    policy: &JoinCodePolicy,
) -> AppResult<String> {
    pool.transaction(|repo| {
        let business = require_business(repo, business_id)?;
        let code = replace_join_code(repo, business_id, policy)?;
        let message = if business.join_code.is_some() {
            "Join code rotated; previous code revoked"
        } else {
            "Join code issued"
        };
        repo.audit("join_code_rotate", &business_id.to_string(), message)?;
        Ok(code)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JoinOutcome {
    Joined,
    AlreadyMember,
    PendingApproval,
}

/// Enroll `user_id` in the business owning `code`.
///
/// Unknown (or rotated-away) codes are `NotFound`. Re-redeeming by a member is a no-op.
pub fn redeem_join_code(
    pool: &mut DbPool,
    code: &str,
    user_id: &str,
    now: i64,
) -> AppResult<(i64, JoinOutcome)> {
    pool.transaction(|repo| {
        let business = repo
            .business_by_join_code(code.trim())?
            .ok_or_else(|| AppError::not_found("join code", code))?;

        if repo.get_user(user_id)?.is_none() {
            return Err(AppError::not_found("user", user_id));
        }

        if repo.get_member(business.id, user_id)?.is_some() {
            return Ok((business.id, JoinOutcome::AlreadyMember));
        }

        if business.require_join_approval {
            repo.insert_join_request(business.id, user_id, now)?;
            repo.audit(
                "join_request",
                user_id,
                &format!("Requested to join business {}", business.id),
            )?;
            return Ok((business.id, JoinOutcome::PendingApproval));
        }

        repo.upsert_member(&Member::new(business.id, user_id, Role::User))?;
        repo.audit(
            "join",
            user_id,
            &format!("Joined business {} with join code", business.id),
        )?;
        Ok((business.id, JoinOutcome::Joined))
    })
}

/// Turn a pending join request into a membership.
pub fn approve_join_request(
    pool: &mut DbPool,
    business_id: i64,
    user_id: &str,
) -> AppResult<Member> {
    pool.transaction(|repo| {
        require_business(repo, business_id)?;
        if !repo.take_join_request(business_id, user_id)? {
            return Err(AppError::not_found(
                "join request",
                format!("{user_id}@{business_id}"),
            ));
        }

        let member = match repo.get_member(business_id, user_id)? {
            Some(existing) => existing,
            None => {
                let m = Member::new(business_id, user_id, Role::User);
                repo.upsert_member(&m)?;
                m
            }
        };
        repo.audit(
            "join_approve",
            user_id,
            &format!("Join request approved for business {business_id}"),
        )?;
        Ok(member)
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanCode {
    pub code: String,
    pub business_id: i64,
    pub expires_at: i64,
}

/// Issue a short-lived code authorizing quick scans for one business.
pub fn issue_scan_code<R: Repository + ?Sized>(
    repo: &R,
    store: &dyn TtlStore,
    business_id: i64,
    ttl_secs: i64,
    now: i64,
) -> AppResult<ScanCode> {
    if ttl_secs <= 0 {
        return Err(AppError::validation("scan code lifetime must be positive"));
    }
    require_business(repo, business_id)?;

    let code = generate_scan_code();
    store.set(
        &format!("{SCAN_KEY_PREFIX}{code}"),
        &business_id.to_string(),
        ttl_secs,
        now,
    )?;
    repo.audit(
        "scan_code_issue",
        &business_id.to_string(),
        &format!("Scan code issued, valid for {ttl_secs}s"),
    )?;

    Ok(ScanCode {
        code,
        business_id,
        expires_at: now + ttl_secs,
    })
}

/// Business authorized by a scan code. Expired and unknown codes are both `NotFound`.
pub fn verify_scan_code(store: &dyn TtlStore, code: &str, now: i64) -> AppResult<i64> {
    let value = store
        .get(&format!("{SCAN_KEY_PREFIX}{}", code.trim()), now)?
        .ok_or_else(|| AppError::not_found("scan code", code))?;

    value
        .parse::<i64>()
        .map_err(|_| AppError::Other(format!("corrupt scan code entry for {code}")))
}

/// Verify that `code` authorizes scanning for the business owning `event_id`.
pub fn authorize_scan<R: Repository + ?Sized>(
    repo: &R,
    store: &dyn TtlStore,
    code: &str,
    event_id: i64,
    now: i64,
) -> AppResult<()> {
    let business_id = verify_scan_code(store, code, now)?;
    let event = require_event(repo, event_id)?;
    if event.business_id != business_id {
        return Err(AppError::not_found("scan code", code));
    }
    Ok(())
}
