use super::value_objects::UserId;

// ============================================================================
// Request & Privileged Contexts
// ============================================================================
//
// A RequestContext identifies the user on whose behalf a command runs.
// A PrivilegedContext is the proof needed to write enrollment records. Only
// the crate can mint one, through RequestContext::sudo, so self-service
// actions may write enrollments the requester could not write directly.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    User,
    /// May write enrollment records directly
    Manager,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    user_id: UserId,
    role: Role,
}

impl RequestContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id, role: Role::User }
    }

    pub fn manager(user_id: UserId) -> Self {
        Self { user_id, role: Role::Manager }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }

    /// Elevate to write enrollments on behalf of this user
    pub(crate) fn sudo(&self) -> PrivilegedContext {
        PrivilegedContext { acting_user: self.user_id }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivilegedContext {
    acting_user: UserId,
}

impl PrivilegedContext {
    /// The user the elevated write is performed for
    pub fn acting_user(&self) -> UserId {
        self.acting_user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_role_is_plain_user() {
        let ctx = RequestContext::new(UserId::new());
        assert_eq!(ctx.role(), Role::User);
        assert!(!ctx.is_manager());
        assert!(RequestContext::manager(UserId::new()).is_manager());
    }

    #[test]
    fn test_sudo_keeps_acting_user() {
        let user = UserId::new();
        let privilege = RequestContext::new(user).sudo();
        assert_eq!(privilege.acting_user(), user);
    }
}
