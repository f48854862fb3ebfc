use crate::core::join_code::{JoinCodePolicy, replace_join_code};
use crate::db::pool::DbPool;
use crate::db::repository::Repository;
use crate::errors::{AppError, AppResult};
use crate::models::business::Business;
use crate::models::event::Event;
use crate::models::member::{Member, Role, User};

pub(crate) fn require_business<R: Repository + ?Sized>(repo: &R, id: i64) -> AppResult<Business> {
    repo.get_business(id)?
        .ok_or_else(|| AppError::not_found("business", id))
}

pub(crate) fn require_event<R: Repository + ?Sized>(repo: &R, id: i64) -> AppResult<Event> {
    repo.get_event(id)?
        .ok_or_else(|| AppError::not_found("event", id))
}

pub(crate) fn require_member<R: Repository + ?Sized>(
    repo: &R,
    business_id: i64,
    user_id: &str,
) -> AppResult<Member> {
    repo.get_member(business_id, user_id)?
        .ok_or_else(|| AppError::not_found("member", format!("{user_id}@{business_id}")))
}

/// Create a business with a fresh join code; `owner` (if any) becomes its owner.
pub fn create_business(
    pool: &mut DbPool,
    name: &str,
    require_join_approval: bool,
    owner: Option<&str>,
    policy: &JoinCodePolicy,
) -> AppResult<Business> {
    if name.trim().is_empty() {
        return Err(AppError::validation("business name must not be empty"));
    }

    pool.transaction(|repo| {
        let mut business = repo.insert_business(name.trim(), require_join_approval)?;
        business.join_code = Some(replace_join_code(repo, business.id, policy)?);

        if let Some(user_id) = owner {
            if repo.get_user(user_id)?.is_none() {
                return Err(AppError::not_found("user", user_id));
            }
            repo.upsert_member(&Member::new(business.id, user_id, Role::Owner))?;
        }

        repo.audit(
            "business_add",
            &business.id.to_string(),
            &format!("Created business '{}'", business.name),
        )?;
        Ok(business)
    })
}

pub fn get_business<R: Repository + ?Sized>(repo: &R, id: i64) -> AppResult<Business> {
    require_business(repo, id)
}

/// Register or refresh an identity handed over by the identity provider.
pub fn upsert_user<R: Repository + ?Sized>(repo: &R, user: &User) -> AppResult<()> {
    if user.id.trim().is_empty() {
        return Err(AppError::validation("user id must not be empty"));
    }
    repo.upsert_user(user)
}

/// Add a member, or change the role of an existing one. Custom data is kept.
pub fn add_member(
    pool: &mut DbPool,
    business_id: i64,
    user_id: &str,
    role: Role,
) -> AppResult<Member> {
    pool.transaction(|repo| {
        require_business(repo, business_id)?;
        if repo.get_user(user_id)?.is_none() {
            return Err(AppError::not_found("user", user_id));
        }

        let member = match repo.get_member(business_id, user_id)? {
            Some(mut existing) => {
                existing.role = role;
                existing
            }
            None => Member::new(business_id, user_id, role),
        };
        repo.upsert_member(&member)?;

        repo.audit(
            "member_add",
            user_id,
            &format!("{} is {} of business {}", user_id, role.to_db_str(), business_id),
        )?;
        Ok(member)
    })
}
