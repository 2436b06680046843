use super::*;
use crate::page::SendOutcome;
use crate::registry::Registry;
use crate::test_helpers::{Delivery, test_env, test_room};

fn rendered(page: &Page<ProfilePage>) -> String {
    page.last_rendered().unwrap_or_default().to_string()
}

#[test]
fn profile_renders_escaped_name_and_chrome() {
    let env = test_env();
    let user = env.connect("<Ash>");
    let mut page = profile_page(user, test_room(), env.env.clone());

    assert_eq!(page.open(), SendOutcome::Delivered);

    let html = rendered(&page);
    assert!(html.contains("<h2>&lt;Ash&gt;</h2>"));
    assert!(html.contains("value=\"/profile close\""));
    assert!(html.contains("value=\"/profile switchlocation\""));
    assert!(!html.contains("Staff"));
}

#[test]
fn profile_marks_staff() {
    let env = test_env();
    let user = env.connect("Brock");
    env.directory.set_elevated(&user, true);
    let mut page = profile_page(user, test_room(), env.env.clone());
    page.open();
    assert!(rendered(&page).contains("Staff"));
}

#[test]
fn tab_command_switches_selected_tab() {
    let env = test_env();
    let user = env.connect("Ash");
    let mut page = profile_page(user, test_room(), env.env.clone());
    page.open();
    assert!(rendered(&page).contains("Trainer card."));

    page.check_component_command("tab", "badges").unwrap();
    assert_eq!(page.send(false), SendOutcome::Delivered);

    let html = rendered(&page);
    assert!(html.contains("No badges yet."));
    assert!(!html.contains("Trainer card."));
}

#[test]
fn unknown_tab_is_rejected() {
    let env = test_env();
    let user = env.connect("Ash");
    let mut page = profile_page(user, test_room(), env.env.clone());
    let err = page.check_component_command("tab", "secrets").unwrap_err();
    assert_eq!(err.to_string(), "unknown tab: secrets");
}

#[test]
fn motto_is_escaped_and_clearable() {
    let env = test_env();
    let user = env.connect("Ash");
    let mut page = profile_page(user, test_room(), env.env.clone());

    page.check_component_command("motto", "gotta <catch> 'em all").unwrap();
    page.open();
    assert!(rendered(&page).contains("gotta &lt;catch&gt; &apos;em all"));

    page.check_component_command("motto", "").unwrap();
    page.send(false);
    assert!(rendered(&page).contains("No motto set."));
}

#[test]
fn long_motto_is_rejected() {
    let env = test_env();
    let user = env.connect("Ash");
    let mut page = profile_page(user, test_room(), env.env.clone());
    let long = "x".repeat(101);
    assert!(page.check_component_command("motto", &long).is_err());
}

#[test]
fn readonly_disables_motto_button_but_not_tabs() {
    let env = test_env();
    let user = env.connect("Ash");
    let mut page = profile_page(user, test_room(), env.env.clone());
    page.set_readonly(true);
    page.open();

    let html = rendered(&page);
    assert!(html.contains("value=\"/profile motto\" disabled>Clear motto"));
    assert!(html.contains("value=\"/profile tab badges\">Badges"));
}

#[test]
fn overlay_name_survives_rename() {
    let env = test_env();
    let old = env.connect("Ash");
    let mut reg = Registry::new(PROFILE_PAGE_ID);
    reg.open(profile_page(old.clone(), test_room(), env.env.clone()));

    let new = env.directory.rename(&old, "Gary").unwrap().id;
    reg.reconcile_rename(&old, &new);
    env.transport.clear();
    reg.with_page(&new, Page::switch_location);

    let events = env.transport.events();
    assert!(events.iter().any(|e| matches!(
        e,
        Delivery::Overlay { user, name, .. } if user == &new && name == PROFILE_PAGE_ID
    )));
}
