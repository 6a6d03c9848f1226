//! Workflow policy: the transition graph plus the target-status role table.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use snag_core::{DefectStatus, Error, Role, RoleSet};

/// The injectable workflow policy for defect status transitions.
///
/// Holds the adjacency list of the status graph and the per-role set of
/// writable target statuses. [`WorkflowPolicy::canonical`] builds the one
/// policy the tracker ships with; tests may build alternates through
/// [`WorkflowPolicy::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowPolicy {
    edges: Vec<(DefectStatus, Vec<DefectStatus>)>,
    role_targets: Vec<(Role, Vec<DefectStatus>)>,
}

impl WorkflowPolicy {
    /// Build a policy from explicit tables.
    ///
    /// Statuses absent from `edges` get an empty adjacency set; roles
    /// absent from `role_targets` may write nothing.
    pub fn new(
        edges: Vec<(DefectStatus, Vec<DefectStatus>)>,
        role_targets: Vec<(Role, Vec<DefectStatus>)>,
    ) -> Self {
        Self {
            edges,
            role_targets,
        }
    }

    /// The canonical tracker policy.
    pub fn canonical() -> Self {
        use DefectStatus::*;
        Self::new(
            vec![
                (New, vec![InWork]),
                (InWork, vec![Review]),
                (Review, vec![Closed, Canceled]),
                (Closed, vec![]),
                (Canceled, vec![]),
            ],
            vec![
                (Role::Engineer, vec![InWork, Review]),
                (Role::Manager, vec![InWork, Review, Closed, Canceled]),
                (Role::Lead, vec![InWork, Review, Closed, Canceled]),
                (Role::Admin, vec![InWork, Review, Closed, Canceled]),
            ],
        )
    }

    /// The statuses reachable in one step from `from`.
    pub fn allowed_targets(&self, from: DefectStatus) -> &[DefectStatus] {
        self.edges
            .iter()
            .find(|(status, _)| *status == from)
            .map(|(_, targets)| targets.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `role` may ever write `target` as a status.
    pub fn role_may_set(&self, role: Role, target: DefectStatus) -> bool {
        self.role_targets
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, targets)| targets.contains(&target))
            .unwrap_or(false)
    }

    /// Whether any held role may write `target`. The empty set authorizes
    /// nothing.
    pub fn authorized(&self, roles: &RoleSet, target: DefectStatus) -> bool {
        roles.iter().any(|role| self.role_may_set(role, target))
    }

    /// The roles that may write `target`, for error messages.
    fn roles_for_target(&self, target: DefectStatus) -> Vec<&'static str> {
        self.role_targets
            .iter()
            .filter(|(_, targets)| targets.contains(&target))
            .map(|(role, _)| role.as_str())
            .collect()
    }

    /// Decide a transition from `current` to the raw target string for a
    /// caller holding `roles`.
    ///
    /// Checks structural validity first, then authorization; returns the
    /// parsed target on success. A raw target that is not a status at all
    /// fails as an invalid transition, exactly as a structurally absent
    /// edge does.
    pub fn plan(
        &self,
        current: DefectStatus,
        target_raw: &str,
        roles: &RoleSet,
    ) -> Result<DefectStatus, Error> {
        let invalid = || Error::InvalidTransition {
            from: current.as_str().to_string(),
            to: target_raw.to_string(),
        };

        let target = DefectStatus::from_str(target_raw).map_err(|_| invalid())?;
        if !self.allowed_targets(current).contains(&target) {
            return Err(invalid());
        }

        if !self.authorized(roles, target) {
            return Err(Error::Forbidden(format!(
                "setting status {} requires {}",
                target,
                self.roles_for_target(target).join(" or "),
            )));
        }

        Ok(target)
    }
}

impl Default for WorkflowPolicy {
    fn default() -> Self {
        Self::canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DefectStatus::*;

    fn engineer() -> RoleSet {
        RoleSet::new([Role::Engineer])
    }

    fn manager() -> RoleSet {
        RoleSet::new([Role::Manager])
    }

    // ── Transition graph ─────────────────────────────────────────────

    #[test]
    fn test_only_four_edges_exist() {
        let policy = WorkflowPolicy::canonical();
        let legal: &[(DefectStatus, DefectStatus)] = &[
            (New, InWork),
            (InWork, Review),
            (Review, Closed),
            (Review, Canceled),
        ];
        for from in DefectStatus::all() {
            for to in DefectStatus::all() {
                let expected = legal.contains(&(*from, *to));
                assert_eq!(
                    policy.allowed_targets(*from).contains(to),
                    expected,
                    "edge {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_terminal_statuses_have_empty_adjacency() {
        let policy = WorkflowPolicy::canonical();
        assert!(policy.allowed_targets(Closed).is_empty());
        assert!(policy.allowed_targets(Canceled).is_empty());
    }

    #[test]
    fn test_every_illegal_pair_is_invalid_transition() {
        let policy = WorkflowPolicy::canonical();
        // Admin holds every target right, so any failure below is
        // structural, not authorization.
        let admin = RoleSet::new([Role::Admin]);
        let legal: &[(DefectStatus, DefectStatus)] = &[
            (New, InWork),
            (InWork, Review),
            (Review, Closed),
            (Review, Canceled),
        ];
        for from in DefectStatus::all() {
            for to in DefectStatus::all() {
                let result = policy.plan(*from, to.as_str(), &admin);
                if legal.contains(&(*from, *to)) {
                    assert_eq!(result.unwrap(), *to);
                } else {
                    assert!(
                        matches!(result, Err(Error::InvalidTransition { .. })),
                        "{from} -> {to} should be invalid"
                    );
                }
            }
        }
    }

    #[test]
    fn test_self_transitions_never_permitted() {
        let policy = WorkflowPolicy::canonical();
        let admin = RoleSet::new([Role::Admin]);
        for status in DefectStatus::all() {
            assert!(matches!(
                policy.plan(*status, status.as_str(), &admin),
                Err(Error::InvalidTransition { .. })
            ));
        }
    }

    #[test]
    fn test_unknown_target_string_is_invalid_transition() {
        let policy = WorkflowPolicy::canonical();
        let admin = RoleSet::new([Role::Admin]);
        for raw in ["reopened", "NEW", "", "in-work"] {
            match policy.plan(New, raw, &admin) {
                Err(Error::InvalidTransition { from, to }) => {
                    assert_eq!(from, "new");
                    assert_eq!(to, raw);
                }
                other => panic!("expected InvalidTransition, got {other:?}"),
            }
        }
    }

    // ── Role table ───────────────────────────────────────────────────

    #[test]
    fn test_role_target_table_is_exact() {
        let policy = WorkflowPolicy::canonical();
        let expectations: &[(Role, &[DefectStatus])] = &[
            (Role::Engineer, &[InWork, Review]),
            (Role::Manager, &[InWork, Review, Closed, Canceled]),
            (Role::Lead, &[InWork, Review, Closed, Canceled]),
            (Role::Admin, &[InWork, Review, Closed, Canceled]),
        ];
        for (role, allowed) in expectations {
            for target in DefectStatus::all() {
                assert_eq!(
                    policy.role_may_set(*role, *target),
                    allowed.contains(target),
                    "{role} setting {target}"
                );
            }
        }
    }

    #[test]
    fn test_no_role_may_set_new() {
        let policy = WorkflowPolicy::canonical();
        for role in Role::all() {
            assert!(!policy.role_may_set(*role, New));
        }
    }

    #[test]
    fn test_empty_role_set_authorizes_nothing() {
        let policy = WorkflowPolicy::canonical();
        for target in DefectStatus::all() {
            assert!(!policy.authorized(&RoleSet::empty(), *target));
        }
    }

    #[test]
    fn test_any_held_role_suffices() {
        let policy = WorkflowPolicy::canonical();
        let mixed = RoleSet::new([Role::Engineer, Role::Manager]);
        assert!(policy.authorized(&mixed, Closed));
    }

    // ── plan(): precedence and outcomes ──────────────────────────────

    #[test]
    fn test_engineer_walks_the_happy_path_until_review() {
        let policy = WorkflowPolicy::canonical();
        assert_eq!(policy.plan(New, "in_work", &engineer()).unwrap(), InWork);
        assert_eq!(policy.plan(InWork, "review", &engineer()).unwrap(), Review);
        assert!(matches!(
            policy.plan(Review, "closed", &engineer()),
            Err(Error::Forbidden(_))
        ));
    }

    #[test]
    fn test_manager_may_close_from_review() {
        let policy = WorkflowPolicy::canonical();
        assert_eq!(policy.plan(Review, "closed", &manager()).unwrap(), Closed);
        assert_eq!(
            policy.plan(Review, "canceled", &manager()).unwrap(),
            Canceled
        );
    }

    #[test]
    fn test_structural_check_precedes_authorization() {
        let policy = WorkflowPolicy::canonical();
        // Engineer may never set closed, but new -> closed is also not an
        // edge; the structural failure must win.
        assert!(matches!(
            policy.plan(New, "closed", &engineer()),
            Err(Error::InvalidTransition { .. })
        ));
        // Same for a caller with no roles at all.
        assert!(matches!(
            policy.plan(Closed, "in_work", &RoleSet::empty()),
            Err(Error::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_forbidden_names_sufficient_roles() {
        let policy = WorkflowPolicy::canonical();
        let err = policy.plan(Review, "closed", &engineer()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Manager"));
        assert!(msg.contains("Admin"));
    }

    // ── Alternate policies ───────────────────────────────────────────

    #[test]
    fn test_alternate_policy_is_honored() {
        // A two-state policy where Engineer may close directly.
        let policy = WorkflowPolicy::new(
            vec![(New, vec![Closed])],
            vec![(Role::Engineer, vec![Closed])],
        );
        assert_eq!(policy.plan(New, "closed", &engineer()).unwrap(), Closed);
        assert!(matches!(
            policy.plan(New, "in_work", &engineer()),
            Err(Error::InvalidTransition { .. })
        ));
    }
}
