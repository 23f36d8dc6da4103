//! End-to-end tests for course creation, browsing, update and removal
//!
//! Tests the catalog listing filters, ownership rules and the page payloads.

mod common;

use common::{
    location, TestClient, TestServer, ADMIN_EMAIL, ADMIN_PASS, DESIGN_SLUG, OTHER_TEACHER_EMAIL,
    OTHER_TEACHER_PASS, PROGRAMMING_SLUG, STUDENT_EMAIL, STUDENT_PASS, TEACHER_EMAIL,
    TEACHER_NAME, TEACHER_PASS,
};
use reqwest::StatusCode;
use serde_json::Value;

async fn teacher(server: &TestServer) -> TestClient {
    TestClient::authenticated(server.base_url.clone(), TEACHER_EMAIL, TEACHER_PASS).await
}

#[tokio::test]
async fn test_created_course_is_listed_without_filters() {
    let server = TestServer::spawn().await;
    let client = teacher(&server).await;
    let programming = server.category(PROGRAMMING_SLUG);

    let response = client
        .create_course("Intro", "First steps", programming.id)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/courses");

    assert_eq!(
        client.flash_on("/courses").await,
        vec!["Intro has been created successfully"]
    );
    assert_eq!(client.listed_course_names(None, None).await, vec!["Intro"]);

    // Anonymous visitors browse the same catalog
    let anonymous = TestClient::new(server.base_url.clone());
    assert_eq!(anonymous.listed_course_names(None, None).await, vec!["Intro"]);
}

#[tokio::test]
async fn test_listing_filters_by_category_and_search() {
    let server = TestServer::spawn().await;
    let client = teacher(&server).await;
    let programming = server.category(PROGRAMMING_SLUG);
    let design = server.category(DESIGN_SLUG);

    client
        .create_course("Rust Basics", "Ownership", programming.id)
        .await;
    client
        .create_course("Color Theory", "Hues", design.id)
        .await;
    client
        .create_course("Advanced Rust", "Lifetimes", programming.id)
        .await;

    // Newest first
    assert_eq!(
        client.listed_course_names(None, None).await,
        vec!["Advanced Rust", "Color Theory", "Rust Basics"]
    );
    assert_eq!(
        client.listed_course_names(Some(PROGRAMMING_SLUG), None).await,
        vec!["Advanced Rust", "Rust Basics"]
    );
    assert_eq!(
        client.listed_course_names(None, Some("RUST")).await,
        vec!["Advanced Rust", "Rust Basics"]
    );
    assert_eq!(
        client
            .listed_course_names(Some(DESIGN_SLUG), Some("theory"))
            .await,
        vec!["Color Theory"]
    );
    assert!(client
        .listed_course_names(Some(DESIGN_SLUG), Some("rust"))
        .await
        .is_empty());
    assert!(client
        .listed_course_names(Some("no-such-category"), None)
        .await
        .is_empty());

    // Blank filters do not restrict anything
    assert_eq!(
        client.listed_course_names(Some(""), Some("  ")).await.len(),
        3
    );
}

#[tokio::test]
async fn test_listing_echoes_filters_and_categories() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.list_courses(Some(DESIGN_SLUG), Some("art")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["page_name"], "courses");
    assert_eq!(body["filters"]["categories"], DESIGN_SLUG);
    assert_eq!(body["filters"]["search"], "art");
    assert_eq!(body["categories"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_course_detail_page() {
    let server = TestServer::spawn().await;
    let client = teacher(&server).await;
    let programming = server.category(PROGRAMMING_SLUG);
    client
        .create_course("Intro to Rust", "First steps", programming.id)
        .await;

    let response = client.get_course("intro-to-rust").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["page_name"], "course");
    assert_eq!(body["course"]["name"], "Intro to Rust");
    assert_eq!(body["course"]["description"], "First steps");
    assert_eq!(body["course"]["owner"]["name"], TEACHER_NAME);
    assert_eq!(body["course"]["category"]["slug"], PROGRAMMING_SLUG);
    assert_eq!(body["is_enrolled"], false);

    // Owner data never carries credentials
    let serialized = body.to_string();
    assert!(!serialized.contains("argon2"));
    assert!(!serialized.contains(TEACHER_PASS));
}

#[tokio::test]
async fn test_anonymous_visitors_do_not_see_owner_email() {
    let server = TestServer::spawn().await;
    let programming = server.category(PROGRAMMING_SLUG);
    teacher(&server)
        .await
        .create_course("Intro to Rust", "First steps", programming.id)
        .await;

    let anonymous = TestClient::new(server.base_url.clone());
    let listing: Value = anonymous.list_courses(None, None).await.json().await.unwrap();
    let detail: Value = anonymous.get_course("intro-to-rust").await.json().await.unwrap();

    assert_eq!(listing["courses"][0]["owner"]["name"], TEACHER_NAME);
    assert!(listing["courses"][0]["owner"].get("email").is_none());
    assert!(detail["course"]["owner"].get("email").is_none());
    assert!(!listing.to_string().contains(TEACHER_EMAIL));
    assert!(!detail.to_string().contains(TEACHER_EMAIL));
}

#[tokio::test]
async fn test_unknown_course_is_not_found() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_course("does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "fail");
    assert_eq!(body["message"], "Course not found");
}

#[tokio::test]
async fn test_same_name_gets_distinct_slugs() {
    let server = TestServer::spawn().await;
    let client = teacher(&server).await;
    let programming = server.category(PROGRAMMING_SLUG);

    client.create_course("Intro", "One", programming.id).await;
    client.create_course("Intro", "Two", programming.id).await;

    let first = server.store.get_course_details("intro").unwrap().unwrap();
    let second = server.store.get_course_details("intro-2").unwrap().unwrap();
    assert_eq!(first.course.description, "One");
    assert_eq!(second.course.description, "Two");
}

#[tokio::test]
async fn test_create_requires_login() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let programming = server.category(PROGRAMMING_SLUG);

    let response = client.create_course("Intro", "", programming.id).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert!(client.listed_course_names(None, None).await.is_empty());
}

#[tokio::test]
async fn test_student_cannot_create_course() {
    let server = TestServer::spawn().await;
    let client =
        TestClient::authenticated(server.base_url.clone(), STUDENT_EMAIL, STUDENT_PASS).await;
    let programming = server.category(PROGRAMMING_SLUG);

    let response = client.create_course("Intro", "", programming.id).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(location(&response), "/courses");
    assert_eq!(
        client.flash_on("/courses").await,
        vec!["You are not allowed to do that"]
    );
}

#[tokio::test]
async fn test_create_with_invalid_fields_fails() {
    let server = TestServer::spawn().await;
    let client = teacher(&server).await;
    let programming = server.category(PROGRAMMING_SLUG);

    let response = client.create_course("Intro", "", 999).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(location(&response), "/courses");
    assert_eq!(client.flash_on("/courses").await, vec!["Something happened!"]);

    let response = client.create_course("   ", "", programming.id).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(client.listed_course_names(None, None).await.is_empty());
}

#[tokio::test]
async fn test_owner_updates_course() {
    let server = TestServer::spawn().await;
    let client = teacher(&server).await;
    let programming = server.category(PROGRAMMING_SLUG);
    let design = server.category(DESIGN_SLUG);
    client.create_course("Intro", "Old", programming.id).await;

    let response = client
        .update_course("intro", "Intro to Color", "New", design.id)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/users/dashboard");
    assert_eq!(
        client.flash_on("/users/dashboard").await,
        vec!["Intro to Color has been updated successfully"]
    );

    // Renaming moves the course to a new slug
    let response = client.get_course("intro").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let course = server
        .store
        .get_course_details("intro-to-color")
        .unwrap()
        .unwrap();
    assert_eq!(course.course.description, "New");
    assert_eq!(course.category.id, design.id);

    // The form route does the same
    let response = client
        .update_course_via_form("intro-to-color", "Intro to Color", "Newer", design.id)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let course = server
        .store
        .get_course_details("intro-to-color")
        .unwrap()
        .unwrap();
    assert_eq!(course.course.description, "Newer");
}

#[tokio::test]
async fn test_update_rejects_invalid_fields() {
    let server = TestServer::spawn().await;
    let client = teacher(&server).await;
    let programming = server.category(PROGRAMMING_SLUG);
    client.create_course("Intro", "Old", programming.id).await;

    let response = client.update_course("intro", "", "New", programming.id).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Please enter a course name");

    let response = client.update_course("intro", "Intro", "New", 999).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let course = server.store.get_course_details("intro").unwrap().unwrap();
    assert_eq!(course.course.description, "Old");
}

#[tokio::test]
async fn test_non_owner_cannot_change_course() {
    let server = TestServer::spawn().await;
    let owner = teacher(&server).await;
    let programming = server.category(PROGRAMMING_SLUG);
    owner.create_course("Intro", "Old", programming.id).await;

    let other = TestClient::authenticated(
        server.base_url.clone(),
        OTHER_TEACHER_EMAIL,
        OTHER_TEACHER_PASS,
    )
    .await;

    let response = other
        .update_course("intro", "Hijacked", "", programming.id)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = other.delete_course("intro").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let course = server.store.get_course_details("intro").unwrap().unwrap();
    assert_eq!(course.course.name, "Intro");
}

#[tokio::test]
async fn test_owner_deletes_course() {
    let server = TestServer::spawn().await;
    let client = teacher(&server).await;
    let programming = server.category(PROGRAMMING_SLUG);
    client.create_course("Intro", "", programming.id).await;
    client.create_course("Outro", "", programming.id).await;

    let response = client.delete_course("intro").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/users/dashboard");
    assert_eq!(
        client.flash_on("/users/dashboard").await,
        vec!["Intro has been removed successfully"]
    );

    let response = client.delete_course_via_form("outro").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert!(client.listed_course_names(None, None).await.is_empty());

    let response = client.delete_course("intro").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_manages_any_course() {
    let server = TestServer::spawn().await;
    let owner = teacher(&server).await;
    let programming = server.category(PROGRAMMING_SLUG);
    owner.create_course("Intro", "", programming.id).await;
    owner.create_course("Outro", "", programming.id).await;

    let admin = TestClient::authenticated(server.base_url.clone(), ADMIN_EMAIL, ADMIN_PASS).await;
    let response = admin
        .update_course("intro", "Intro", "Reviewed", programming.id)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let response = admin.delete_course("outro").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert_eq!(owner.listed_course_names(None, None).await, vec!["Intro"]);
}

#[tokio::test]
async fn test_course_changes_require_session() {
    let server = TestServer::spawn().await;
    let owner = teacher(&server).await;
    let programming = server.category(PROGRAMMING_SLUG);
    owner.create_course("Intro", "", programming.id).await;

    let anonymous = TestClient::new(server.base_url.clone());
    let response = anonymous
        .update_course("intro", "Intro", "", programming.id)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let response = anonymous.delete_course("intro").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "fail");
}
