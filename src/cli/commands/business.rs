//! Businesses, users, memberships and join codes.

use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::business::{add_member, create_business, get_business, upsert_user};
use crate::core::join_code::{
    JoinOutcome, approve_join_request, issue_join_code, redeem_join_code, rotate_join_code,
};
use crate::errors::{AppError, AppResult};
use crate::models::member::{Role, User};
use crate::ui::messages::{info, success, warning};
use crate::utils::time;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let mut pool = super::open_pool(cfg)?;

    match cmd {
        Commands::Business {
            name,
            require_approval,
            owner,
        } => {
            let b = create_business(
                &mut pool,
                name,
                *require_approval,
                owner.as_deref(),
                &cfg.join_code_policy(),
            )?;
            success(format!("Business #{} '{}' created.", b.id, b.name));
            if let Some(code) = &b.join_code {
                info(format!("Join code: {code}"));
            }
        }

        Commands::User { id, email, name } => {
            upsert_user(&pool.conn, &User::new(id, email, name))?;
            success(format!("User '{id}' saved."));
        }

        Commands::Member {
            business,
            user,
            role,
        } => {
            let role = Role::from_code(role).ok_or_else(|| {
                AppError::validation(format!(
                    "invalid role '{role}' (expected owner, admin, moderator, scanner or user)"
                ))
            })?;
            let m = add_member(&mut pool, *business, user, role)?;
            success(format!(
                "{} is now {} of business #{}.",
                m.user_id,
                m.role.to_db_str(),
                m.business_id
            ));
        }

        Commands::JoinCode { business, rotate } => {
            let policy = cfg.join_code_policy();
            let current = get_business(&pool.conn, *business)?.join_code;
            let code = match current {
                Some(code) if !*rotate => code,
                Some(_) => {
                    let code = rotate_join_code(&mut pool, *business, &policy)?;
                    warning("The previous join code no longer works.");
                    code
                }
                None => issue_join_code(&mut pool, *business, &policy)?,
            };
            success(format!("Join code for business #{business}: {code}"));
        }

        Commands::Join { code, user } => {
            let (business_id, outcome) = redeem_join_code(&mut pool, code, user, time::now())?;
            match outcome {
                JoinOutcome::Joined => {
                    success(format!("{user} joined business #{business_id}."))
                }
                JoinOutcome::AlreadyMember => {
                    info(format!("{user} is already a member of business #{business_id}."))
                }
                JoinOutcome::PendingApproval => info(format!(
                    "Join request sent; business #{business_id} must approve it."
                )),
            }
        }

        Commands::Approve { business, user } => {
            approve_join_request(&mut pool, *business, user)?;
            success(format!("{user} approved for business #{business}."));
        }

        _ => {}
    }
    Ok(())
}
