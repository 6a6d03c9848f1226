//! The permission matrix and its decision types.

use serde::{Deserialize, Serialize};

use snag_core::{Caller, Error, Role, RoleSet, UserId};

// ─── Actions ─────────────────────────────────────────────────────────

/// A gated action, carrying the pre-fetched resource context the rule
/// needs. Building an `Action` is cheap; nothing is looked up here.
#[derive(Debug, Clone)]
pub enum Action {
    /// Delete a defect record.
    DeleteDefect,
    /// Delete a comment authored by `author`.
    DeleteComment {
        author: UserId,
    },
    /// Delete an attachment. Authorship is deliberately not an input:
    /// the rule ignores it.
    DeleteAttachment,
    /// Run the filtered dataset export.
    ExportDefects,
    /// Create a user holding the `requested` role set.
    CreateUser {
        requested: RoleSet,
    },
    /// Delete the user `target`, who holds `target_roles`.
    DeleteUser {
        target: UserId,
        target_roles: RoleSet,
    },
}

impl Action {
    /// Short action name for deny messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeleteDefect => "delete defect",
            Self::DeleteComment { .. } => "delete comment",
            Self::DeleteAttachment => "delete attachment",
            Self::ExportDefects => "export defects",
            Self::CreateUser { .. } => "create user",
            Self::DeleteUser { .. } => "delete user",
        }
    }
}

// ─── Decision ────────────────────────────────────────────────────────

/// The outcome of a matrix evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { reason: String },
}

impl Decision {
    fn deny(reason: impl Into<String>) -> Self {
        Self::Deny {
            reason: reason.into(),
        }
    }

    /// Whether the action was allowed.
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Convert into a result, mapping a denial to `Error::Forbidden`.
    pub fn require(self) -> Result<(), Error> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny { reason } => Err(Error::Forbidden(reason)),
        }
    }
}

// ─── PermissionMatrix ────────────────────────────────────────────────

/// The decision tables for all gated non-status actions.
///
/// Field by field, the canonical values are:
///
/// | table | roles |
/// |---|---|
/// | `defect_deleters` | Manager, Lead, Admin |
/// | `comment_moderators` | Manager, Lead, Admin (plus the author) |
/// | `attachment_deleters` | Manager, Lead, Admin (author is irrelevant) |
/// | `exporters` | Manager, Lead, Admin |
/// | `user_admins` | Admin, Lead |
/// | `admin_assignable` | Engineer, Manager, Lead |
/// | `lead_assignable` | Engineer, Manager |
///
/// The Admin role is never assignable through user creation, by anyone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionMatrix {
    defect_deleters: Vec<Role>,
    comment_moderators: Vec<Role>,
    attachment_deleters: Vec<Role>,
    exporters: Vec<Role>,
    user_admins: Vec<Role>,
    admin_assignable: Vec<Role>,
    lead_assignable: Vec<Role>,
}

impl PermissionMatrix {
    /// The canonical matrix the tracker ships with.
    pub fn canonical() -> Self {
        let moderators = vec![Role::Manager, Role::Lead, Role::Admin];
        Self {
            defect_deleters: moderators.clone(),
            comment_moderators: moderators.clone(),
            attachment_deleters: moderators.clone(),
            exporters: moderators,
            user_admins: vec![Role::Admin, Role::Lead],
            admin_assignable: vec![Role::Engineer, Role::Manager, Role::Lead],
            lead_assignable: vec![Role::Engineer, Role::Manager],
        }
    }

    /// Evaluate an action for a caller. Pure; no lookups.
    pub fn authorize(&self, caller: &Caller, action: &Action) -> Decision {
        match action {
            Action::DeleteDefect => self.require_any(
                &caller.roles,
                &self.defect_deleters,
                "deleting a defect requires Manager, Lead or Admin",
            ),
            Action::DeleteComment { author } => {
                if caller.id == *author {
                    return Decision::Allow;
                }
                self.require_any(
                    &caller.roles,
                    &self.comment_moderators,
                    "deleting another author's comment requires Manager, Lead or Admin",
                )
            }
            Action::DeleteAttachment => self.require_any(
                &caller.roles,
                &self.attachment_deleters,
                "deleting an attachment requires Manager, Lead or Admin",
            ),
            Action::ExportDefects => self.require_any(
                &caller.roles,
                &self.exporters,
                "exporting defects requires Manager, Lead or Admin",
            ),
            Action::CreateUser { requested } => self.authorize_create_user(caller, requested),
            Action::DeleteUser {
                target,
                target_roles,
            } => self.authorize_delete_user(caller, *target, target_roles),
        }
    }

    fn require_any(&self, held: &RoleSet, table: &[Role], reason: &str) -> Decision {
        if held.contains_any(table) {
            Decision::Allow
        } else {
            Decision::deny(reason)
        }
    }

    fn authorize_create_user(&self, caller: &Caller, requested: &RoleSet) -> Decision {
        // Nobody mints admins through this path, including admins.
        if requested.contains(Role::Admin) {
            return Decision::deny("the Admin role cannot be assigned at user creation");
        }
        if caller.roles.contains(Role::Admin) {
            return self.check_assignable(requested, &self.admin_assignable, "Admin");
        }
        if caller.roles.contains(Role::Lead) {
            return self.check_assignable(requested, &self.lead_assignable, "Lead");
        }
        Decision::deny("creating users requires Admin or Lead")
    }

    fn check_assignable(&self, requested: &RoleSet, assignable: &[Role], who: &str) -> Decision {
        match requested.iter().find(|role| !assignable.contains(role)) {
            None => Decision::Allow,
            Some(role) => Decision::deny(format!("{who} may not assign the {role} role")),
        }
    }

    fn authorize_delete_user(
        &self,
        caller: &Caller,
        target: UserId,
        target_roles: &RoleSet,
    ) -> Decision {
        if !caller.roles.contains_any(&self.user_admins) {
            return Decision::deny("deleting users requires Admin or Lead");
        }
        // Admin-holding accounts are protected from every caller.
        if target_roles.contains(Role::Admin) {
            return Decision::deny("accounts holding Admin cannot be deleted");
        }
        // Role-independent: nobody deletes their own account.
        if caller.id == target {
            return Decision::deny("you cannot delete your own account");
        }
        if caller.roles.contains(Role::Lead)
            && !caller.roles.contains(Role::Admin)
            && target_roles.contains(Role::Lead)
        {
            return Decision::deny("Lead cannot delete an account holding Lead");
        }
        Decision::Allow
    }
}

impl Default for PermissionMatrix {
    fn default() -> Self {
        Self::canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(roles: &[Role]) -> Caller {
        Caller::new(UserId::new(), RoleSet::new(roles.iter().copied()))
    }

    fn allow(matrix: &PermissionMatrix, caller: &Caller, action: &Action) -> bool {
        matrix.authorize(caller, action).is_allow()
    }

    // ── Delete defect ────────────────────────────────────────────────

    #[test]
    fn test_delete_defect_table() {
        let matrix = PermissionMatrix::canonical();
        assert!(!allow(&matrix, &caller(&[Role::Engineer]), &Action::DeleteDefect));
        assert!(allow(&matrix, &caller(&[Role::Manager]), &Action::DeleteDefect));
        assert!(allow(&matrix, &caller(&[Role::Lead]), &Action::DeleteDefect));
        assert!(allow(&matrix, &caller(&[Role::Admin]), &Action::DeleteDefect));
        assert!(!allow(&matrix, &caller(&[]), &Action::DeleteDefect));
    }

    #[test]
    fn test_engineer_with_extra_role_may_delete_defect() {
        let matrix = PermissionMatrix::canonical();
        assert!(allow(
            &matrix,
            &caller(&[Role::Engineer, Role::Manager]),
            &Action::DeleteDefect
        ));
    }

    // ── Delete comment ───────────────────────────────────────────────

    #[test]
    fn test_comment_author_may_delete_own() {
        let matrix = PermissionMatrix::canonical();
        let engineer = caller(&[Role::Engineer]);
        let action = Action::DeleteComment { author: engineer.id };
        assert!(allow(&matrix, &engineer, &action));
    }

    #[test]
    fn test_comment_moderators_may_delete_any() {
        let matrix = PermissionMatrix::canonical();
        let action = Action::DeleteComment { author: UserId::new() };
        for role in [Role::Manager, Role::Lead, Role::Admin] {
            assert!(allow(&matrix, &caller(&[role]), &action));
        }
        assert!(!allow(&matrix, &caller(&[Role::Engineer]), &action));
    }

    // ── Delete attachment: the asymmetry ─────────────────────────────

    #[test]
    fn test_attachment_author_engineer_still_denied() {
        // Stricter than comments: authorship is not an input at all.
        let matrix = PermissionMatrix::canonical();
        let engineer = caller(&[Role::Engineer]);
        assert!(!allow(&matrix, &engineer, &Action::DeleteAttachment));
    }

    #[test]
    fn test_attachment_delete_table() {
        let matrix = PermissionMatrix::canonical();
        for role in [Role::Manager, Role::Lead, Role::Admin] {
            assert!(allow(&matrix, &caller(&[role]), &Action::DeleteAttachment));
        }
        assert!(!allow(&matrix, &caller(&[]), &Action::DeleteAttachment));
    }

    // ── Export ───────────────────────────────────────────────────────

    #[test]
    fn test_export_denied_to_pure_engineer() {
        let matrix = PermissionMatrix::canonical();
        assert!(!allow(&matrix, &caller(&[Role::Engineer]), &Action::ExportDefects));
        assert!(!allow(&matrix, &caller(&[]), &Action::ExportDefects));
    }

    #[test]
    fn test_export_allowed_with_any_moderator_role() {
        let matrix = PermissionMatrix::canonical();
        for roles in [
            vec![Role::Manager],
            vec![Role::Lead],
            vec![Role::Admin],
            vec![Role::Engineer, Role::Lead],
        ] {
            assert!(allow(&matrix, &caller(&roles), &Action::ExportDefects));
        }
    }

    // ── Create user ──────────────────────────────────────────────────

    #[test]
    fn test_admin_may_assign_non_admin_roles() {
        let matrix = PermissionMatrix::canonical();
        let admin = caller(&[Role::Admin]);
        for role in [Role::Engineer, Role::Manager, Role::Lead] {
            let action = Action::CreateUser {
                requested: RoleSet::new([role]),
            };
            assert!(allow(&matrix, &admin, &action), "Admin assigning {role}");
        }
    }

    #[test]
    fn test_admin_role_never_assignable() {
        let matrix = PermissionMatrix::canonical();
        let action = Action::CreateUser {
            requested: RoleSet::new([Role::Admin]),
        };
        for role in Role::all() {
            assert!(!allow(&matrix, &caller(&[*role]), &action));
        }
    }

    #[test]
    fn test_lead_may_assign_engineer_and_manager_only() {
        let matrix = PermissionMatrix::canonical();
        let lead = caller(&[Role::Lead]);
        for role in [Role::Engineer, Role::Manager] {
            let action = Action::CreateUser {
                requested: RoleSet::new([role]),
            };
            assert!(allow(&matrix, &lead, &action));
        }
        let action = Action::CreateUser {
            requested: RoleSet::new([Role::Lead]),
        };
        assert!(!allow(&matrix, &lead, &action));
    }

    #[test]
    fn test_lead_denied_on_mixed_set_with_forbidden_role() {
        let matrix = PermissionMatrix::canonical();
        let lead = caller(&[Role::Lead]);
        let action = Action::CreateUser {
            requested: RoleSet::new([Role::Engineer, Role::Lead]),
        };
        assert!(!allow(&matrix, &lead, &action));
    }

    #[test]
    fn test_manager_and_engineer_cannot_create_users() {
        let matrix = PermissionMatrix::canonical();
        let action = Action::CreateUser {
            requested: RoleSet::new([Role::Engineer]),
        };
        assert!(!allow(&matrix, &caller(&[Role::Manager]), &action));
        assert!(!allow(&matrix, &caller(&[Role::Engineer]), &action));
    }

    // ── Delete user ──────────────────────────────────────────────────

    #[test]
    fn test_lead_cannot_delete_admin_target() {
        let matrix = PermissionMatrix::canonical();
        let lead = caller(&[Role::Lead]);
        let action = Action::DeleteUser {
            target: UserId::new(),
            target_roles: RoleSet::new([Role::Admin]),
        };
        assert!(!allow(&matrix, &lead, &action));
    }

    #[test]
    fn test_admin_target_protected_from_every_caller() {
        let matrix = PermissionMatrix::canonical();
        let action = Action::DeleteUser {
            target: UserId::new(),
            target_roles: RoleSet::new([Role::Admin, Role::Engineer]),
        };
        for role in Role::all() {
            assert!(!allow(&matrix, &caller(&[*role]), &action));
        }
    }

    #[test]
    fn test_self_deletion_forbidden_regardless_of_role() {
        let matrix = PermissionMatrix::canonical();
        let admin = caller(&[Role::Admin]);
        let action = Action::DeleteUser {
            target: admin.id,
            target_roles: admin.roles.clone(),
        };
        assert!(!allow(&matrix, &admin, &action));

        let lead = caller(&[Role::Lead]);
        let action = Action::DeleteUser {
            target: lead.id,
            target_roles: lead.roles.clone(),
        };
        assert!(!allow(&matrix, &lead, &action));
    }

    #[test]
    fn test_lead_cannot_delete_fellow_lead() {
        let matrix = PermissionMatrix::canonical();
        let lead = caller(&[Role::Lead]);
        let action = Action::DeleteUser {
            target: UserId::new(),
            target_roles: RoleSet::new([Role::Lead]),
        };
        assert!(!allow(&matrix, &lead, &action));
    }

    #[test]
    fn test_admin_may_delete_lead() {
        let matrix = PermissionMatrix::canonical();
        let admin = caller(&[Role::Admin]);
        let action = Action::DeleteUser {
            target: UserId::new(),
            target_roles: RoleSet::new([Role::Lead]),
        };
        assert!(allow(&matrix, &admin, &action));
    }

    #[test]
    fn test_lead_may_delete_engineer() {
        let matrix = PermissionMatrix::canonical();
        let lead = caller(&[Role::Lead]);
        let action = Action::DeleteUser {
            target: UserId::new(),
            target_roles: RoleSet::new([Role::Engineer, Role::Manager]),
        };
        assert!(allow(&matrix, &lead, &action));
    }

    #[test]
    fn test_manager_and_engineer_cannot_delete_users() {
        let matrix = PermissionMatrix::canonical();
        let action = Action::DeleteUser {
            target: UserId::new(),
            target_roles: RoleSet::new([Role::Engineer]),
        };
        assert!(!allow(&matrix, &caller(&[Role::Manager]), &action));
        assert!(!allow(&matrix, &caller(&[Role::Engineer]), &action));
    }

    // ── Decision plumbing ────────────────────────────────────────────

    #[test]
    fn test_deny_converts_to_forbidden() {
        let matrix = PermissionMatrix::canonical();
        let decision = matrix.authorize(&caller(&[Role::Engineer]), &Action::DeleteDefect);
        let err = decision.require().unwrap_err();
        assert_eq!(err.kind(), "forbidden");
        assert!(err.to_string().contains("Manager"));
    }
}
