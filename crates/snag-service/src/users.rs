//! User administration: creation, listing, deletion. All gated by the
//! permission matrix; role shapes are normalized at this boundary.

use std::sync::Arc;

use serde::Deserialize;

use snag_core::{Caller, Error, RawRoles, Result, Role, RoleSet, Timestamp, User, UserId};
use snag_policy::{Action, PermissionMatrix};
use snag_store::UserStore;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserInput {
    pub email: String,
    pub full_name: String,
    /// Accepts an array, a single name, or a comma-delimited string; the
    /// normalizer sorts the shape out.
    #[serde(default)]
    pub roles: RawRoles,
}

pub struct UserService {
    users: Arc<dyn UserStore>,
    matrix: Arc<PermissionMatrix>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, matrix: Arc<PermissionMatrix>) -> Self {
        Self { users, matrix }
    }

    /// Create a user with the requested role set.
    pub async fn create(&self, input: CreateUserInput, caller: &Caller) -> Result<User> {
        let email = validate_email(&input.email)?;
        let full_name = input.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(Error::validation("full name is required"));
        }
        let requested = RoleSet::normalize(&input.roles);
        if requested.is_empty() {
            return Err(Error::validation("at least one valid role is required"));
        }

        self.matrix
            .authorize(caller, &Action::CreateUser {
                requested: requested.clone(),
            })
            .require()?;

        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(Error::validation("a user with this email already exists"));
        }

        let now = Timestamp::now();
        let user = User {
            id: UserId::new(),
            email,
            full_name,
            roles: requested,
            created_at: now,
            updated_at: now,
        };
        self.users.insert_user(user.clone()).await?;
        tracing::info!(user_id = %user.id, roles = ?user.roles.names(), "user created");
        Ok(user)
    }

    /// List users. Admin sees everyone; a Lead who is not Admin does not
    /// see Admin-holding accounts.
    pub async fn list(&self, caller: &Caller) -> Result<Vec<User>> {
        if !caller.roles.contains_any(&[Role::Admin, Role::Lead]) {
            return Err(Error::forbidden("listing users requires Admin or Lead"));
        }
        let mut users = self.users.list_users().await?;
        if !caller.roles.contains(Role::Admin) {
            users.retain(|u| !u.roles.contains(Role::Admin));
        }
        Ok(users)
    }

    pub async fn get(&self, id: UserId) -> Result<User> {
        self.users
            .get_user(id)
            .await?
            .ok_or_else(|| Error::not_found("user"))
    }

    /// Delete a user, subject to the matrix rules: no self-deletion, no
    /// Admin-holding target, Lead never removes Lead.
    pub async fn delete(&self, id: UserId, caller: &Caller) -> Result<()> {
        let target = self.get(id).await?;
        self.matrix
            .authorize(caller, &Action::DeleteUser {
                target: target.id,
                target_roles: target.roles.clone(),
            })
            .require()?;
        if !self.users.delete_user(id).await? {
            return Err(Error::not_found("user"));
        }
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }
}

fn validate_email(raw: &str) -> Result<String> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(Error::validation(format!("invalid email: {raw:?}")));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert_eq!(
            validate_email(" User@Example.COM ").unwrap(),
            "user@example.com"
        );
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@nodot").is_err());
        assert!(validate_email("user@.com").is_err());
    }
}
