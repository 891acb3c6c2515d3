use crate::models::audit_log::AuditAction;

/// Who performed a mutation and where the request came from.
/// Stores turn it into an audit row once the entity id is known.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AuditTrail {
    pub actor_id: Option<i64>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditTrail {
    pub fn event(
        &self,
        action: AuditAction,
        entity_type: &'static str,
        entity_id: i64,
    ) -> AuditLogCreateRequest {
        AuditLogCreateRequest {
            user_id: self.actor_id,
            action,
            entity_type,
            entity_id,
            ip_address: self.ip_address.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditLogCreateRequest {
    pub user_id: Option<i64>,
    pub action: AuditAction,
    pub entity_type: &'static str,
    pub entity_id: i64,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
