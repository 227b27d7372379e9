//! Request-scoped identity and the RBAC visibility predicate.

use uuid::Uuid;

use crate::model::Role;

/// The authenticated caller, attached to every gateway request after JWT
/// verification.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
    pub supervisor_id: Option<Uuid>,
}

impl Principal {
    pub fn new(user_id: Uuid, role: Role, supervisor_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            role,
            supervisor_id,
        }
    }

    /// Whether this principal may see a job owned by `owner_id`, where
    /// `owner_supervisor_id` is that owner's supervisor (`None` for
    /// managers/admins who have none).
    pub fn can_view_job_owned_by(&self, owner_id: Uuid, owner_supervisor_id: Option<Uuid>) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Manager => owner_id == self.user_id || owner_supervisor_id == Some(self.user_id),
            Role::Analyst => owner_id == self.user_id,
        }
    }

    /// Builds this principal's hierarchical job id: `<supervisor>/<owner>/<unique>`.
    /// Principals with no supervisor (managers, admins, unsupervised analysts)
    /// use `root` as the supervisor segment.
    pub fn build_job_id(&self, unique: Uuid) -> String {
        format!("{}/{}/{unique}", Self::supervisor_segment(self.supervisor_id), self.user_id)
    }

    fn supervisor_segment(supervisor_id: Option<Uuid>) -> String {
        supervisor_id.map(|s| s.to_string()).unwrap_or_else(|| "root".to_string())
    }

    /// The hierarchical prefix every job id owned by `(owner_id, owner_supervisor_id)` must start with.
    fn job_id_prefix(owner_id: Uuid, owner_supervisor_id: Option<Uuid>) -> String {
        format!("{}/{owner_id}/", Self::supervisor_segment(owner_supervisor_id))
    }

    /// Scope is enforced by a prefix match on the hierarchical `job_id` and
    /// the owner-id predicate above; both must hold.
    pub fn can_view_job(&self, job_id: &str, owner_id: Uuid, owner_supervisor_id: Option<Uuid>) -> bool {
        self.can_view_job_owned_by(owner_id, owner_supervisor_id) && job_id.starts_with(&Self::job_id_prefix(owner_id, owner_supervisor_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_sees_everything() {
        let admin = Principal::new(Uuid::new_v4(), Role::Admin, None);
        assert!(admin.can_view_job_owned_by(Uuid::new_v4(), None));
    }

    #[test]
    fn analyst_sees_only_own() {
        let analyst_id = Uuid::new_v4();
        let analyst = Principal::new(analyst_id, Role::Analyst, None);
        assert!(analyst.can_view_job_owned_by(analyst_id, None));
        assert!(!analyst.can_view_job_owned_by(Uuid::new_v4(), None));
    }

    #[test]
    fn manager_sees_own_and_supervised() {
        let manager_id = Uuid::new_v4();
        let manager = Principal::new(manager_id, Role::Manager, None);
        let analyst_id = Uuid::new_v4();
        assert!(manager.can_view_job_owned_by(analyst_id, Some(manager_id)));
        assert!(!manager.can_view_job_owned_by(Uuid::new_v4(), Some(Uuid::new_v4())));
        assert!(manager.can_view_job_owned_by(manager_id, None));
    }

    #[test]
    fn build_job_id_embeds_supervisor_and_owner() {
        let supervisor_id = Uuid::new_v4();
        let analyst = Principal::new(Uuid::new_v4(), Role::Analyst, Some(supervisor_id));
        let job_id = analyst.build_job_id(Uuid::new_v4());
        assert!(job_id.starts_with(&format!("{supervisor_id}/{}/", analyst.user_id)));

        let unsupervised = Principal::new(Uuid::new_v4(), Role::Analyst, None);
        assert!(unsupervised.build_job_id(Uuid::new_v4()).starts_with(&format!("root/{}/", unsupervised.user_id)));
    }

    #[test]
    fn can_view_job_requires_both_owner_predicate_and_job_id_prefix() {
        let supervisor_id = Uuid::new_v4();
        let owner = Principal::new(Uuid::new_v4(), Role::Analyst, Some(supervisor_id));
        let job_id = owner.build_job_id(Uuid::new_v4());

        assert!(owner.can_view_job(&job_id, owner.user_id, Some(supervisor_id)));

        // Owner predicate holds but the job_id claims a different owner prefix.
        let forged_job_id = format!("{supervisor_id}/{}/deadbeef", Uuid::new_v4());
        assert!(!owner.can_view_job(&forged_job_id, owner.user_id, Some(supervisor_id)));

        // Job id prefix matches but the caller isn't the owner/supervisor.
        let stranger = Principal::new(Uuid::new_v4(), Role::Analyst, None);
        assert!(!stranger.can_view_job(&job_id, owner.user_id, Some(supervisor_id)));
    }
}
