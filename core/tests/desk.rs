mod common;

use common::{complaint, make_desk, make_desk_with, FakeApi};
use complaint_desk_core::{
    analytics::ServerStats,
    api::ComplaintApi,
    complaint::{ComplaintStatus, Language},
    config::{ComplaintSource, DeskConfig, StatsSource},
    desk::{AuthMode, AuthOutcome, Submission},
    error::{DeskError, ValidationError},
    filter::{StatCard, StatusFilter},
    gate::{GateState, RenderDecision, View},
};
use serde_json::json;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn past_tutorial(api: FakeApi) -> complaint_desk_core::desk::Desk<FakeApi> {
    let mut desk = make_desk(api);
    desk.skip_tutorial().unwrap();
    desk
}

// ── Gating ───────────────────────────────────────────────────────────────────

#[test]
fn dashboard_requires_tutorial() {
    let mut desk = make_desk(FakeApi::new("billing"));
    assert_eq!(
        desk.navigate_path("/dashboard"),
        RenderDecision::Redirect(View::Tutorial)
    );
    assert_eq!(desk.view(), View::Tutorial);

    assert_eq!(desk.complete_tutorial().unwrap(), RenderDecision::Render(View::Dashboard));
    assert_eq!(desk.navigate_path("/classify"), RenderDecision::Render(View::Classify));
}

#[test]
fn logout_replays_tutorial() {
    let mut desk = past_tutorial(FakeApi::new("billing"));
    desk.log_in("ravi@example.com", "secret1").unwrap();
    assert_eq!(desk.session().gate_state(), GateState::AuthenticatedAndVideoSeen);

    assert_eq!(desk.log_out().unwrap(), RenderDecision::Render(View::Start));
    assert_eq!(desk.session().gate_state(), GateState::Fresh);
    assert_eq!(
        desk.navigate(View::Dashboard),
        RenderDecision::Redirect(View::Tutorial)
    );
}

// ── Classification ───────────────────────────────────────────────────────────

/// An anonymous classification waits for signup, then lands in the working
/// set exactly once with the server's category.
#[test]
fn anonymous_submission_saved_after_signup() {
    let mut desk = past_tutorial(FakeApi::new("shipping"));
    desk.navigate(View::Classify);

    let submission = desk.submit_complaint("My order was late", Language::English).unwrap();
    let Submission::AuthRequired(parked) = submission else {
        panic!("expected auth prompt");
    };
    assert_eq!(desk.auth_prompt(), Some(AuthMode::SignUp));
    assert!(desk.session().complaints().is_empty());
    assert_eq!(parked.category(), Some("shipping"));

    let outcome = desk
        .sign_up("Asha", "asha@example.com", "secret1", "secret1")
        .unwrap();
    let AuthOutcome::SignedIn { reconciled, decision, .. } = outcome else {
        panic!("expected sign-in");
    };
    assert_eq!(reconciled.as_ref(), Some(&parked));
    assert_eq!(decision, RenderDecision::Render(View::Classify));
    assert_eq!(desk.auth_prompt(), None);
    assert_eq!(desk.last_result(), Some(&parked));

    let saved: Vec<_> = desk
        .session()
        .complaints()
        .iter()
        .flatten()
        .filter(|c| c.complaint_text == "My order was late")
        .collect();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].category(), Some("shipping"));
    assert_eq!(saved[0].status, Some(ComplaintStatus::Pending));
}

#[test]
fn authenticated_submission_saved_immediately() {
    let mut desk = past_tutorial(FakeApi::new("billing"));
    desk.log_in("ravi@example.com", "pw").unwrap();

    let first = desk.submit_complaint("Charged twice", Language::Hindi).unwrap();
    let second = desk.submit_complaint("Charged twice again", Language::English).unwrap();
    assert!(matches!(first, Submission::Saved(_)));
    assert!(matches!(second, Submission::Saved(_)));

    let stats = desk.stats().unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.categories.get("billing"), Some(&2));

    let ids: Vec<_> = desk
        .session()
        .complaints()
        .iter()
        .flatten()
        .map(|c| c.complaint_id.clone())
        .collect();
    assert_ne!(ids[0], ids[1], "complaint ids must be unique");
    assert!(ids.iter().all(|id| id.starts_with("CMP-")));
}

/// A classifier id that is already saved leaves the saved record alone.
#[test]
fn duplicate_server_id_is_reported_not_saved_twice() {
    let mut desk = past_tutorial(FakeApi::new("billing"));
    desk.log_in("ravi@example.com", "pw").unwrap();
    *desk.api().classify_fields.borrow_mut() = json!({ "complaint_id": 99 });

    let first = desk.submit_complaint("Charged twice", Language::English).unwrap();
    assert!(matches!(first, Submission::Saved(ref c) if c.complaint_id == "99"));

    *desk.api().classify_fields.borrow_mut() = json!({ "complaint_id": "99", "category": "refunds" });
    let second = desk.submit_complaint("Refund missing", Language::English).unwrap();
    let Submission::AlreadySaved(existing) = second else {
        panic!("expected the duplicate id to be reported");
    };
    assert_eq!(existing.complaint_text, "Charged twice");
    assert_eq!(existing.category(), Some("billing"));
    assert_eq!(desk.stats().unwrap().total, 1);
}

#[test]
fn empty_text_never_reaches_api() {
    let mut desk = past_tutorial(FakeApi::new("billing"));
    let err = desk.submit_complaint("   ", Language::English).unwrap_err();
    assert!(matches!(err, DeskError::Validation(ValidationError::EmptyComplaintText)));
    assert_eq!(err.inline_message("Classification"), "Please enter a complaint text");
    assert_eq!(desk.api().classify_calls.get(), 0);
    assert!(!desk.busy().classify);
}

#[test]
fn second_submit_while_busy_is_rejected() {
    let mut desk = past_tutorial(FakeApi::new("billing"));
    let in_flight = desk.begin_classify("first", Language::English).unwrap();
    assert!(desk.busy().classify);

    let err = desk.submit_complaint("second", Language::English).unwrap_err();
    assert!(matches!(err, DeskError::Busy { action: "classify" }));
    assert_eq!(desk.api().classify_calls.get(), 0);

    desk.finish_classify(in_flight, Ok(json!({ "category": "billing" })))
        .unwrap();
    assert!(!desk.busy().classify);
}

#[test]
fn stale_classification_is_dropped() {
    let mut desk = past_tutorial(FakeApi::new("billing"));
    desk.log_in("ravi@example.com", "pw").unwrap();
    desk.navigate(View::Classify);

    let in_flight = desk.begin_classify("Parcel damaged", Language::English).unwrap();
    desk.navigate(View::Dashboard);

    let outcome = desk
        .finish_classify(in_flight, Ok(json!({ "category": "shipping" })))
        .unwrap();
    assert_eq!(outcome, Submission::Discarded);
    assert!(desk.session().complaints().is_empty());
    assert!(desk.last_result().is_none());
    assert!(!desk.busy().classify);
}

#[test]
fn stale_login_does_not_redirect() {
    let mut desk = past_tutorial(FakeApi::new("billing"));
    desk.navigate(View::LogIn);
    let ticket = desk.begin_log_in().unwrap();
    desk.navigate(View::Start);

    let response = desk.api().login("ravi@example.com", "pw");
    let outcome = desk.finish_auth(ticket, response).unwrap();
    assert_eq!(outcome, AuthOutcome::Discarded);
    assert_eq!(desk.view(), View::Start);
    assert!(!desk.session().is_authenticated());
}

#[test]
fn api_failure_surfaces_inline_and_changes_nothing() {
    let mut desk = past_tutorial(FakeApi::failing(503, Some("Classifier offline")));
    let err = desk.submit_complaint("late", Language::English).unwrap_err();
    assert_eq!(err.inline_message("Classification"), "Classifier offline");
    assert!(!desk.busy().classify);
    assert!(desk.session().pending_classification().is_none());

    let err = desk.log_in("ravi@example.com", "pw").unwrap_err();
    assert_eq!(err.inline_message("Login"), "Classifier offline");

    let mut desk = past_tutorial(FakeApi::failing(500, None));
    let err = desk.log_in("ravi@example.com", "pw").unwrap_err();
    assert_eq!(err.inline_message("Login"), "Login failed. Please try again.");
}

// ── Authentication ───────────────────────────────────────────────────────────

#[test]
fn signup_validation_precedes_network() {
    let mut desk = make_desk(FakeApi::new("billing"));
    let err = desk.sign_up("Asha", "a@example.com", "secret1", "secret2").unwrap_err();
    assert_eq!(err.inline_message("Signup"), "Passwords do not match");

    let err = desk.sign_up("Asha", "a@example.com", "abc", "abc").unwrap_err();
    assert_eq!(err.inline_message("Signup"), "Password must be at least 6 characters");
    assert_eq!(desk.api().auth_calls.get(), 0);
    assert!(!desk.busy().auth);
}

#[test]
fn plain_login_goes_to_dashboard() {
    let mut desk = past_tutorial(FakeApi::new("billing"));
    desk.navigate(View::LogIn);
    let outcome = desk.log_in("ravi@example.com", "pw").unwrap();
    let AuthOutcome::SignedIn { reconciled, decision, user } = outcome else {
        panic!("expected sign-in");
    };
    assert!(reconciled.is_none());
    assert_eq!(decision, RenderDecision::Render(View::Dashboard));
    assert_eq!(user.email, "ravi@example.com");
    assert_eq!(desk.navigate(View::SignUp), RenderDecision::Redirect(View::Dashboard));
}

#[test]
fn auth_prompt_mode_switches() {
    let mut desk = past_tutorial(FakeApi::new("billing"));
    desk.submit_complaint("late", Language::English).unwrap();
    desk.switch_auth_mode();
    assert_eq!(desk.auth_prompt(), Some(AuthMode::LogIn));
    desk.switch_auth_mode();
    assert_eq!(desk.auth_prompt(), Some(AuthMode::SignUp));

    desk.new_classification();
    assert_eq!(desk.auth_prompt(), None);
    assert!(desk.session().pending_classification().is_none());
}

// ── Dashboard ────────────────────────────────────────────────────────────────

#[test]
fn clicking_pending_complaint_resolves_it() {
    let mut desk = past_tutorial(FakeApi::new("billing"));
    desk.log_in("ravi@example.com", "pw").unwrap();
    let Submission::Saved(saved) = desk.submit_complaint("late", Language::English).unwrap() else {
        panic!("expected saved");
    };

    assert!(desk.click_complaint(&saved.complaint_id).unwrap());
    assert!(!desk.click_complaint(&saved.complaint_id).unwrap());
    assert!(!desk.click_complaint("nope").unwrap());

    let stats = desk.stats().unwrap();
    assert_eq!((stats.pending, stats.resolved), (0, 1));

    assert!(desk.toggle_complaint(&saved.complaint_id).unwrap());
    assert_eq!(desk.stats().unwrap().pending, 1);
}

#[test]
fn search_and_stat_clicks_drive_visible_list() {
    let mut desk = past_tutorial(FakeApi::new("billing"));
    desk.log_in("ravi@example.com", "pw").unwrap();
    let Submission::Saved(a) = desk.submit_complaint("Card charged twice", Language::English).unwrap() else {
        panic!("expected saved");
    };
    desk.submit_complaint("Refund missing", Language::English).unwrap();
    desk.click_complaint(&a.complaint_id).unwrap();

    desk.search("CHARGED", StatusFilter::All);
    assert_eq!(desk.visible_complaints().len(), 1);

    desk.search("", StatusFilter::Resolved);
    assert_eq!(desk.visible_complaints().len(), 1);

    desk.click_stat(StatCard::Critical);
    assert_eq!(desk.dashboard_query().status, StatusFilter::Pending);
    desk.click_stat(StatCard::Total);
    assert_eq!(desk.visible_complaints().len(), 2);

    let state = desk.view_state().unwrap();
    assert_eq!(state.complaints.len(), 2);
    assert_eq!(state.breakdown[0].display_percent(), "100%");
}

#[test]
fn stat_clicks_can_be_disabled() {
    let mut config = DeskConfig::default_test();
    config.stat_click_filters = false;
    let mut desk = make_desk_with(config, FakeApi::new("billing"));
    desk.search("", StatusFilter::Resolved);
    desk.click_stat(StatCard::Total);
    assert_eq!(desk.dashboard_query().status, StatusFilter::Resolved);
}

// ── Remote sources ───────────────────────────────────────────────────────────

#[test]
fn remote_source_refreshes_and_puts_updates() {
    let api = FakeApi::new("billing");
    *api.remote.borrow_mut() = vec![
        Some(complaint("SRV-1", "late", ComplaintStatus::Pending, "shipping")),
        None,
    ];
    let mut config = DeskConfig::default_test();
    config.complaint_source = ComplaintSource::Remote;
    let mut desk = make_desk_with(config, api);

    desk.refresh().unwrap();
    assert_eq!(desk.session().complaints().len(), 2);

    assert!(desk.set_complaint_status("SRV-1", ComplaintStatus::Resolved).unwrap());
    let updates = desk.api().updates.borrow();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, "SRV-1");
    assert_eq!(updates[0].1.status, Some(ComplaintStatus::Resolved));
    drop(updates);

    assert_eq!(desk.stats().unwrap().resolved, 1);
}

/// An update acknowledged without a record body still changes the local copy.
#[test]
fn remote_update_ack_applies_status_locally() {
    let api = FakeApi::new("billing");
    *api.remote.borrow_mut() =
        vec![Some(complaint("SRV-1", "late", ComplaintStatus::Pending, "shipping"))];
    *api.update_reply.borrow_mut() = Some(json!({ "message": "updated" }));
    let mut config = DeskConfig::default_test();
    config.complaint_source = ComplaintSource::Remote;
    let mut desk = make_desk_with(config, api);
    desk.refresh().unwrap();

    assert!(desk.set_complaint_status("SRV-1", ComplaintStatus::Resolved).unwrap());
    let stats = desk.stats().unwrap();
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.resolved, 1);
    assert_eq!(
        desk.session().complaints()[0].as_ref().map(|c| c.complaint_text.as_str()),
        Some("late")
    );

    // A non-object reply behaves the same.
    *desk.api().update_reply.borrow_mut() = Some(json!("ok"));
    assert!(desk.set_complaint_status("SRV-1", ComplaintStatus::Pending).unwrap());
    assert_eq!(desk.stats().unwrap().pending, 1);
}

#[test]
fn remote_stats_come_from_server() {
    let mut api = FakeApi::new("billing");
    api.server_stats = serde_json::from_value::<ServerStats>(json!({
        "total_complaints": 4,
        "pending": 3,
        "resolved": 1,
        "critical": 2,
        "categories": { "billing": 3, "shipping": 1 },
    }))
    .unwrap();
    let mut config = DeskConfig::default_test();
    config.stats_source = StatsSource::Remote;
    let desk = make_desk_with(config, api);

    let stats = desk.stats().unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.breakdown()[0].display_percent(), "75%");
    assert_eq!(stats.breakdown()[1].display_percent(), "25%");
    assert_eq!(desk.api().stats_calls.get(), 1);
}
