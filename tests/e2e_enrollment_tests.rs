//! End-to-end tests for enrolling in and leaving courses

mod common;

use common::{
    location, TestClient, TestServer, PROGRAMMING_SLUG, STUDENT_EMAIL, STUDENT_PASS,
    TEACHER_EMAIL, TEACHER_PASS,
};
use course_catalog_server::catalog_store::Course;
use reqwest::StatusCode;
use serde_json::Value;

async fn course_named(server: &TestServer, name: &str) -> Course {
    let teacher =
        TestClient::authenticated(server.base_url.clone(), TEACHER_EMAIL, TEACHER_PASS).await;
    let programming = server.category(PROGRAMMING_SLUG);
    let response = teacher.create_course(name, "", programming.id).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let slug = name.to_lowercase().replace(' ', "-");
    server
        .store
        .get_course_details(&slug)
        .unwrap()
        .unwrap()
        .course
}

async fn enrolled_names(client: &TestClient) -> Vec<String> {
    let response = client.get_dashboard().await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    body["enrolled_courses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_enroll_adds_course_once() {
    let server = TestServer::spawn().await;
    let course = course_named(&server, "Intro").await;
    let student =
        TestClient::authenticated(server.base_url.clone(), STUDENT_EMAIL, STUDENT_PASS).await;

    let response = student.enroll(course.id).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/users/dashboard");
    assert_eq!(
        student.flash_on("/users/dashboard").await,
        vec!["You are enrolled in Intro"]
    );

    let response = student.enroll(course.id).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert_eq!(enrolled_names(&student).await, vec!["Intro"]);
}

#[tokio::test]
async fn test_enrollments_keep_their_order() {
    let server = TestServer::spawn().await;
    let first = course_named(&server, "First").await;
    let second = course_named(&server, "Second").await;
    let student =
        TestClient::authenticated(server.base_url.clone(), STUDENT_EMAIL, STUDENT_PASS).await;

    student.enroll(second.id).await;
    student.enroll(first.id).await;

    assert_eq!(enrolled_names(&student).await, vec!["Second", "First"]);
}

#[tokio::test]
async fn test_release_removes_course() {
    let server = TestServer::spawn().await;
    let course = course_named(&server, "Intro").await;
    let student =
        TestClient::authenticated(server.base_url.clone(), STUDENT_EMAIL, STUDENT_PASS).await;
    let student_id = server.user(STUDENT_EMAIL).id;

    student.enroll(course.id).await;
    assert!(server.store.is_enrolled(student_id, course.id).unwrap());

    let response = student.release(course.id).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/users/dashboard");
    assert_eq!(
        student.flash_on("/users/dashboard").await,
        vec!["You left Intro"]
    );
    assert!(!server.store.is_enrolled(student_id, course.id).unwrap());

    // Releasing a course one is not enrolled in is harmless
    let response = student.release(course.id).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(enrolled_names(&student).await.is_empty());
}

#[tokio::test]
async fn test_course_page_shows_enrollment() {
    let server = TestServer::spawn().await;
    let course = course_named(&server, "Intro").await;
    let student =
        TestClient::authenticated(server.base_url.clone(), STUDENT_EMAIL, STUDENT_PASS).await;
    student.enroll(course.id).await;

    let response = student.get_course(&course.slug).await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["is_enrolled"], true);
    assert_eq!(body["current_user"]["email"], STUDENT_EMAIL);
}

#[tokio::test]
async fn test_enrollment_requires_session() {
    let server = TestServer::spawn().await;
    let course = course_named(&server, "Intro").await;
    let anonymous = TestClient::new(server.base_url.clone());

    let response = anonymous.enroll(course.id).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "fail");

    let response = anonymous.release(course.id).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_enrolling_unknown_course_is_not_found() {
    let server = TestServer::spawn().await;
    let student =
        TestClient::authenticated(server.base_url.clone(), STUDENT_EMAIL, STUDENT_PASS).await;

    let response = student.enroll(4242).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = student
        .client
        .post(format!("{}/courses/enroll", server.base_url))
        .form(&[("course_id", "not-a-number")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_course_drops_enrollments() {
    let server = TestServer::spawn().await;
    let course = course_named(&server, "Intro").await;
    let student =
        TestClient::authenticated(server.base_url.clone(), STUDENT_EMAIL, STUDENT_PASS).await;
    student.enroll(course.id).await;

    let teacher =
        TestClient::authenticated(server.base_url.clone(), TEACHER_EMAIL, TEACHER_PASS).await;
    let response = teacher.delete_course(&course.slug).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert!(enrolled_names(&student).await.is_empty());
    assert!(server.store.get_course(course.id).unwrap().is_none());
}
