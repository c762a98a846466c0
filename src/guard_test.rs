use super::*;
use crate::net::types::User;

fn signed_in(complete: bool) -> Session {
    let user = User { id: "u1".into(), profile_complete: complete, ..User::default() };
    Session::authenticated("tok".into(), user).unwrap()
}

fn loading() -> Session {
    let mut session = Session::default();
    session.set_loading(true);
    session
}

fn redirect(to: &str) -> GuardDecision {
    GuardDecision::Redirect(to.to_owned())
}

// =============================================================================
// route table
// =============================================================================

#[test]
fn default_table_requirements() {
    let table = RouteTable::default();
    assert_eq!(table.requirement_for("/"), RouteRequirement::Public);
    assert_eq!(table.requirement_for("/login"), RouteRequirement::GuestOnly);
    assert_eq!(table.requirement_for("/register"), RouteRequirement::GuestOnly);
    assert_eq!(table.requirement_for("/auth/callback?token=t"), RouteRequirement::Public);
    assert_eq!(table.requirement_for("/setup-profile"), RouteRequirement::Authenticated);
    assert_eq!(table.requirement_for("/discover"), RouteRequirement::ProfileComplete);
    assert_eq!(table.requirement_for("/chat/42"), RouteRequirement::ProfileComplete);
    assert_eq!(table.requirement_for("/profile/edit/photos"), RouteRequirement::ProfileComplete);
}

#[test]
fn unknown_paths_are_public() {
    let table = RouteTable::default();
    assert_eq!(table.requirement_for("/nowhere"), RouteRequirement::Public);
    assert_eq!(table.requirement_for("/chat"), RouteRequirement::Public);
    assert_eq!(table.requirement_for("/chat/1/extra"), RouteRequirement::Public);
}

#[test]
fn trailing_slash_and_query_are_ignored() {
    let table = RouteTable::default();
    assert_eq!(table.requirement_for("/matches/"), RouteRequirement::ProfileComplete);
    assert_eq!(table.requirement_for("/matches?page=2#top"), RouteRequirement::ProfileComplete);
}

#[test]
fn first_matching_route_wins() {
    let table = RouteTable::new("/in", "/setup", "/home")
        .route("/admin/public", RouteRequirement::Public)
        .route("/admin/*", RouteRequirement::ProfileComplete);
    assert_eq!(table.requirement_for("/admin/public"), RouteRequirement::Public);
    assert_eq!(table.requirement_for("/admin/users"), RouteRequirement::ProfileComplete);
}

// =============================================================================
// guard decisions
// =============================================================================

#[test]
fn unauthenticated_is_sent_to_login() {
    let guard = RouteGuard::default();
    let session = Session::default();
    assert_eq!(guard.check(&session, "/setup-profile"), redirect(LOGIN_PATH));
    assert_eq!(guard.check(&session, "/discover"), redirect(LOGIN_PATH));
    assert_eq!(guard.check(&session, "/login"), GuardDecision::Render);
    assert_eq!(guard.check(&session, "/"), GuardDecision::Render);
}

#[test]
fn incomplete_profile_never_renders_complete_only_views() {
    let guard = RouteGuard::default();
    let session = signed_in(false);
    for path in ["/discover", "/matches", "/chat/7", "/profile"] {
        assert_eq!(guard.check(&session, path), redirect(SETUP_PROFILE_PATH), "{path}");
    }
    assert_eq!(guard.check(&session, "/setup-profile"), GuardDecision::Render);
}

#[test]
fn complete_profile_renders_everything_but_guest_pages() {
    let guard = RouteGuard::default();
    let session = signed_in(true);
    assert_eq!(guard.check(&session, "/discover"), GuardDecision::Render);
    assert_eq!(guard.check(&session, "/setup-profile"), GuardDecision::Render);
    assert_eq!(guard.check(&session, "/login"), redirect(HOME_PATH));
    assert_eq!(guard.check(&session, "/register"), redirect(HOME_PATH));
}

#[test]
fn guest_pages_send_incomplete_users_to_setup() {
    let guard = RouteGuard::default();
    assert_eq!(guard.check(&signed_in(false), "/login"), redirect(SETUP_PROFILE_PATH));
}

#[test]
fn loading_waits_on_protected_routes_only() {
    let guard = RouteGuard::default();
    let session = loading();
    assert_eq!(guard.check(&session, "/discover"), GuardDecision::Wait);
    assert_eq!(guard.check(&session, "/login"), GuardDecision::Wait);
    assert_eq!(guard.check(&session, "/"), GuardDecision::Render);
}

#[test]
fn decide_matches_check() {
    let guard = RouteGuard::default();
    assert_eq!(
        guard.decide(AuthPhase::AuthenticatedIncomplete, false, "/discover"),
        guard.check(&signed_in(false), "/discover")
    );
}

// =============================================================================
// navigator
// =============================================================================

#[test]
fn navigator_follows_redirect_to_setup() {
    let mut nav = Navigator::new(RouteGuard::default());
    let outcome = nav.navigate(&signed_in(false), "/discover").unwrap();
    assert_eq!(outcome, &Outcome::Render(SETUP_PROFILE_PATH.to_owned()));
}

#[test]
fn navigator_resumes_destination_after_sign_in() {
    let mut nav = Navigator::new(RouteGuard::default());
    nav.navigate(&Session::default(), "/chat/9").unwrap();
    assert_eq!(nav.location(), &Outcome::Render(LOGIN_PATH.to_owned()));
    assert_eq!(nav.return_to(), Some("/chat/9"));

    let outcome = nav.sync(&signed_in(true)).unwrap();
    assert_eq!(outcome, &Outcome::Render("/chat/9".to_owned()));
    assert!(nav.return_to().is_none());
}

#[test]
fn navigator_sends_signed_out_user_to_login_on_sync() {
    let mut nav = Navigator::new(RouteGuard::default());
    nav.navigate(&signed_in(true), "/matches").unwrap();
    let outcome = nav.sync(&Session::default()).unwrap();
    assert_eq!(outcome, &Outcome::Render(LOGIN_PATH.to_owned()));
    assert_eq!(nav.return_to(), Some("/matches"));
}

#[test]
fn navigator_waits_then_settles() {
    let mut nav = Navigator::new(RouteGuard::default());
    let outcome = nav.navigate(&loading(), "/matches").unwrap();
    assert_eq!(outcome, &Outcome::Wait("/matches".to_owned()));

    let outcome = nav.sync(&signed_in(true)).unwrap();
    assert_eq!(outcome, &Outcome::Render("/matches".to_owned()));
}

#[test]
fn navigator_detects_redirect_loop() {
    let table = RouteTable::new("/in", "/setup", "/home").route("/in", RouteRequirement::Authenticated);
    let mut nav = Navigator::new(RouteGuard::new(table));
    let err = nav.navigate(&Session::default(), "/in").unwrap_err();
    assert!(err.to_string().contains("redirect loop"));
}
