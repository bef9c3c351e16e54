use crate::err::Error;
use crate::events::Route;
use crate::models::{Identity, Role};
use crate::session::SessionState;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Access {
    Render(Identity),
    Redirect(Route),
}

/// Decides whether a protected view may render. A signed-in user with the
/// wrong role goes to the landing page, not to their own dashboard.
pub fn authorize(state: &SessionState, required: Role) -> Access {
    match state {
        SessionState::Anonymous => Access::Redirect(Route::Login),
        SessionState::Authenticated(identity) if identity.role != required => {
            Access::Redirect(Route::Landing)
        }
        SessionState::Authenticated(identity) => Access::Render(identity.clone()),
    }
}

pub fn require(state: &SessionState, required: Role) -> Result<Identity, Error> {
    match authorize(state, required) {
        Access::Render(identity) => Ok(identity),
        Access::Redirect(route) => {
            log::debug!("guard for {:?} redirects to {}", required, route.path());
            Err(Error::redirect(route))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            id: 1,
            name: "John Doe".to_string(),
            email: "student@demo.com".to_string(),
            role,
            institution: None,
            registration_number: None,
            company: None,
        }
    }

    #[test]
    fn anonymous_goes_to_login() {
        for role in [Role::Student, Role::Recruiter] {
            assert_eq!(
                authorize(&SessionState::Anonymous, role),
                Access::Redirect(Route::Login)
            );
        }
    }

    #[test]
    fn wrong_role_goes_to_landing() {
        let state = SessionState::Authenticated(identity(Role::Student));
        assert_eq!(
            authorize(&state, Role::Recruiter),
            Access::Redirect(Route::Landing)
        );
    }

    #[test]
    fn matching_role_renders() {
        let state = SessionState::Authenticated(identity(Role::Recruiter));
        assert_eq!(
            authorize(&state, Role::Recruiter),
            Access::Render(identity(Role::Recruiter))
        );
        assert!(require(&state, Role::Recruiter).is_ok());
        assert!(matches!(
            require(&state, Role::Student),
            Err(Error::Redirect {
                location: Route::Landing,
                ..
            })
        ));
    }
}
