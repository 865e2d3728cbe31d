use campus_auth::{
    AppRoute, AuthPhase, AuthState, RedirectTarget, RoleHome, RouteDecision, decide, guard,
    post_login_route,
};
use campus_models::{Profile, Role, Session, UserId};

fn state(phase: AuthPhase, signed_in: bool, role: Option<Role>) -> AuthState {
    AuthState {
        session: signed_in.then(|| Session {
            user_id: UserId::from_u128(99),
            email: Some("user@campus.edu".into()),
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            expires_at: None,
        }),
        role,
        profile: role.map(|_| Profile::new("Someone")),
        phase,
        resolution_error: None,
    }
}

#[test]
fn rules_apply_in_order() {
    // Loading wins over everything else.
    assert_eq!(
        decide(&state(AuthPhase::Bootstrapping, false, None), &[Role::Admin]),
        RouteDecision::Pending
    );
    assert_eq!(
        decide(
            &state(AuthPhase::PendingProfile, true, None),
            &[Role::Admin]
        ),
        RouteDecision::Pending
    );
    // Then the missing session.
    assert_eq!(
        decide(&state(AuthPhase::Anonymous, false, None), &[Role::Admin]),
        RouteDecision::Redirect(RedirectTarget::SignIn)
    );
    // Then the role.
    assert_eq!(
        decide(&state(AuthPhase::Ready, true, None), &[Role::Admin]),
        RouteDecision::Redirect(RedirectTarget::Unauthorized)
    );
    assert_eq!(
        decide(
            &state(AuthPhase::Ready, true, Some(Role::Student)),
            &[Role::Admin]
        ),
        RouteDecision::Redirect(RedirectTarget::Unauthorized)
    );
    assert_eq!(
        decide(
            &state(AuthPhase::Ready, true, Some(Role::Admin)),
            &[Role::Admin]
        ),
        RouteDecision::Allow
    );
}

#[test]
fn each_role_reaches_only_its_own_pages() {
    for role in Role::ALL {
        let signed_in = state(AuthPhase::Ready, true, Some(role));
        for route in AppRoute::ALL.into_iter().filter(|r| !r.is_public()) {
            let expected = if route.required_roles().contains(&role) {
                RouteDecision::Allow
            } else {
                RouteDecision::Redirect(RedirectTarget::Unauthorized)
            };
            assert_eq!(guard(&signed_in, route), expected, "{} on {}", role, route);
        }
        assert_eq!(
            guard(&signed_in, role.home_route()),
            RouteDecision::Allow
        );
    }
}

#[test]
fn navigation_from_paths() {
    let anonymous = state(AuthPhase::Anonymous, false, None);
    let decision = AppRoute::from_path("/admin/audit").map(|route| guard(&anonymous, route));
    assert_eq!(
        decision,
        Some(RouteDecision::Redirect(RedirectTarget::SignIn))
    );
    assert_eq!(
        AppRoute::from_path("/").map(|route| guard(&anonymous, route)),
        Some(RouteDecision::Redirect(RedirectTarget::SignIn))
    );
    assert_eq!(AppRoute::from_path("/nowhere"), None);
}

#[test]
fn login_page_forwards_signed_in_users_home() {
    assert_eq!(
        post_login_route(&state(AuthPhase::Ready, true, Some(Role::Faculty))),
        Some(AppRoute::FacultyDashboard)
    );
    assert_eq!(
        post_login_route(&state(AuthPhase::PendingProfile, true, None)),
        None
    );
}
