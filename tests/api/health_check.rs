use crate::helpers::TestApp;

#[tokio::test]
async fn health_check_works() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app.get("/health_check", None).await;

    assert!(response.status().is_success());
    assert_eq!(Some(0), response.content_length())
}

#[tokio::test]
async fn health_check_needs_no_token() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app.get("/health_check", None).await;

    assert_eq!(200, response.status().as_u16());
    assert_eq!(0, test_app.users.calls());
}
