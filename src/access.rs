//! Request-level authorization: maps a resolved caller to the actions it may take.

use crate::{
    error::{AppError, AppResult},
    models::{Identity, Role, UserStatus},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Browse,
    ViewMovie,
    ToggleFavorite,
    AddReview,
    ListOwnEngagement,
    RemoveReview,
    RemoveMovie,
    /// Carries the role of the account being toggled.
    BlockUser(Role),
    ListUsers,
    ImportMovie,
}

impl Action {
    pub fn tag(self) -> &'static str {
        match self {
            Action::Browse => "browse",
            Action::ViewMovie => "view-movie",
            Action::ToggleFavorite => "toggle-favorite",
            Action::AddReview => "add-review",
            Action::ListOwnEngagement => "list-own-engagement",
            Action::RemoveReview => "remove-review",
            Action::RemoveMovie => "remove-movie",
            Action::BlockUser(_) => "block-user",
            Action::ListUsers => "list-users",
            Action::ImportMovie => "import-movie",
        }
    }

    fn is_read(self) -> bool {
        matches!(self, Action::Browse | Action::ViewMovie)
    }

    fn required_role(self) -> Role {
        match self {
            Action::Browse
            | Action::ViewMovie
            | Action::ToggleFavorite
            | Action::AddReview
            | Action::ListOwnEngagement => Role::User,
            Action::RemoveReview
            | Action::RemoveMovie
            | Action::BlockUser(_)
            | Action::ListUsers
            | Action::ImportMovie => Role::Admin,
        }
    }
}

pub fn authorize(caller: Option<&Identity>, action: Action) -> AppResult<()> {
    if action.is_read() {
        return Ok(());
    }

    let Some(caller) = caller else {
        return Err(AppError::unauthenticated());
    };

    if caller.status == UserStatus::Blocked {
        tracing::info!(
            username = %caller.username,
            action = action.tag(),
            "blocked account denied"
        );
        return Err(AppError::forbidden("This account is blocked by the admin"));
    }

    let required = action.required_role();
    if caller.role != required {
        return Err(AppError::forbidden(format!(
            "Access denied. {} role required.",
            required.as_code()
        )));
    }

    if let Action::BlockUser(Role::Admin) = action {
        return Err(AppError::forbidden("Admin accounts cannot be blocked"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role, status: UserStatus) -> Identity {
        Identity { username: "someone".to_string(), role, status }
    }

    #[test]
    fn anonymous_callers_may_only_read() {
        assert!(authorize(None, Action::Browse).is_ok());
        assert!(authorize(None, Action::ViewMovie).is_ok());
        for action in [
            Action::ToggleFavorite,
            Action::AddReview,
            Action::RemoveMovie,
            Action::ListUsers,
        ] {
            assert!(matches!(authorize(None, action), Err(AppError::AuthenticationRequired(_))));
        }
    }

    #[test]
    fn users_engage_but_do_not_moderate() {
        let user = identity(Role::User, UserStatus::Active);
        assert!(authorize(Some(&user), Action::ToggleFavorite).is_ok());
        assert!(authorize(Some(&user), Action::AddReview).is_ok());
        assert!(authorize(Some(&user), Action::ListOwnEngagement).is_ok());
        for action in [
            Action::RemoveReview,
            Action::RemoveMovie,
            Action::BlockUser(Role::User),
            Action::ListUsers,
            Action::ImportMovie,
        ] {
            assert!(matches!(authorize(Some(&user), action), Err(AppError::Forbidden(_))));
        }
    }

    #[test]
    fn admins_moderate_but_cannot_block_admins() {
        let admin = identity(Role::Admin, UserStatus::Active);
        assert!(authorize(Some(&admin), Action::RemoveMovie).is_ok());
        assert!(authorize(Some(&admin), Action::BlockUser(Role::User)).is_ok());
        assert!(matches!(
            authorize(Some(&admin), Action::BlockUser(Role::Admin)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn blocked_accounts_are_denied_every_mutation() {
        let blocked_user = identity(Role::User, UserStatus::Blocked);
        let blocked_admin = identity(Role::Admin, UserStatus::Blocked);
        assert!(matches!(
            authorize(Some(&blocked_user), Action::ToggleFavorite),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            authorize(Some(&blocked_admin), Action::RemoveMovie),
            Err(AppError::Forbidden(_))
        ));
        assert!(authorize(Some(&blocked_user), Action::ViewMovie).is_ok());
    }
}
