//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per server route. Redirects are not
//! followed so tests can assert on the `Location` the server picked.
//!
//! When routes or form fields change, update only this file.

use super::constants::*;
use reqwest::{redirect::Policy, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Keeps the session and flash cookies
            .redirect(Policy::none())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client logged in with the given credentials
    ///
    /// # Panics
    ///
    /// Panics if the login is rejected (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String, email: &str, password: &str) -> Self {
        let client = Self::new(base_url);

        let response = client.login(email, password).await;
        assert_eq!(
            response.status(),
            StatusCode::SEE_OTHER,
            "Authentication of {} failed: {:?}",
            email,
            response.text().await
        );

        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .unwrap_or_else(|e| panic!("GET {} failed: {}", path, e))
    }

    async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .unwrap_or_else(|e| panic!("POST {} failed: {}", path, e))
    }

    // ========================================================================
    // Pages
    // ========================================================================

    /// GET any page, e.g. "/", "/about", "/login"
    pub async fn get_page(&self, path: &str) -> Response {
        self.get(path).await
    }

    /// Flash messages shown by the given page, consuming them
    pub async fn flash_on(&self, path: &str) -> Vec<String> {
        let response = self.get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {} failed", path);
        let body: Value = response.json().await.expect("Page is not JSON");
        body["flash"]
            .as_array()
            .expect("Page has no flash list")
            .iter()
            .map(|f| f["message"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    // ========================================================================
    // User Endpoints
    // ========================================================================

    /// POST /users/signup
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Option<&str>,
    ) -> Response {
        let mut form = vec![("name", name), ("email", email), ("password", password)];
        if let Some(role) = role {
            form.push(("role", role));
        }
        self.post_form("/users/signup", &form).await
    }

    /// POST /users/login
    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.post_form("/users/login", &[("email", email), ("password", password)])
            .await
    }

    /// GET /users/logout
    pub async fn logout(&self) -> Response {
        self.get("/users/logout").await
    }

    /// GET /users/dashboard
    pub async fn get_dashboard(&self) -> Response {
        self.get("/users/dashboard").await
    }

    /// DELETE /users/{id}
    pub async fn delete_user(&self, user_id: usize) -> Response {
        self.client
            .delete(self.url(&format!("/users/{}", user_id)))
            .send()
            .await
            .expect("Delete user request failed")
    }

    /// POST /users/{id}/delete
    pub async fn delete_user_via_form(&self, user_id: usize) -> Response {
        self.post_form(&format!("/users/{}/delete", user_id), &[])
            .await
    }

    // ========================================================================
    // Course Endpoints
    // ========================================================================

    /// POST /courses
    pub async fn create_course(&self, name: &str, description: &str, category_id: usize) -> Response {
        let category = category_id.to_string();
        self.post_form(
            "/courses",
            &[
                ("name", name),
                ("description", description),
                ("category", category.as_str()),
            ],
        )
        .await
    }

    /// GET /courses with optional filters
    pub async fn list_courses(&self, category: Option<&str>, search: Option<&str>) -> Response {
        let mut query = vec![];
        if let Some(category) = category {
            query.push(("categories", category));
        }
        if let Some(search) = search {
            query.push(("search", search));
        }
        self.client
            .get(self.url("/courses"))
            .query(&query)
            .send()
            .await
            .expect("List courses request failed")
    }

    /// Names of the courses listed with the given filters
    pub async fn listed_course_names(
        &self,
        category: Option<&str>,
        search: Option<&str>,
    ) -> Vec<String> {
        let response = self.list_courses(category, search).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.expect("Listing is not JSON");
        body["courses"]
            .as_array()
            .expect("Listing has no courses")
            .iter()
            .map(|c| c["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    /// GET /courses/{slug}
    pub async fn get_course(&self, slug: &str) -> Response {
        self.get(&format!("/courses/{}", slug)).await
    }

    /// POST /courses/enroll
    pub async fn enroll(&self, course_id: usize) -> Response {
        let course_id = course_id.to_string();
        self.post_form("/courses/enroll", &[("course_id", course_id.as_str())])
            .await
    }

    /// POST /courses/release
    pub async fn release(&self, course_id: usize) -> Response {
        let course_id = course_id.to_string();
        self.post_form("/courses/release", &[("course_id", course_id.as_str())])
            .await
    }

    /// DELETE /courses/{slug}
    pub async fn delete_course(&self, slug: &str) -> Response {
        self.client
            .delete(self.url(&format!("/courses/{}", slug)))
            .send()
            .await
            .expect("Delete course request failed")
    }

    /// POST /courses/{slug}/delete
    pub async fn delete_course_via_form(&self, slug: &str) -> Response {
        self.post_form(&format!("/courses/{}/delete", slug), &[])
            .await
    }

    /// PUT /courses/{slug}
    pub async fn update_course(
        &self,
        slug: &str,
        name: &str,
        description: &str,
        category_id: usize,
    ) -> Response {
        let category = category_id.to_string();
        self.client
            .put(self.url(&format!("/courses/{}", slug)))
            .form(&[
                ("name", name),
                ("description", description),
                ("category", category.as_str()),
            ])
            .send()
            .await
            .expect("Update course request failed")
    }

    /// POST /courses/{slug}/update
    pub async fn update_course_via_form(
        &self,
        slug: &str,
        name: &str,
        description: &str,
        category_id: usize,
    ) -> Response {
        let category = category_id.to_string();
        self.post_form(
            &format!("/courses/{}/update", slug),
            &[
                ("name", name),
                ("description", description),
                ("category", category.as_str()),
            ],
        )
        .await
    }
}

/// The `Location` header of a response, empty if absent
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
