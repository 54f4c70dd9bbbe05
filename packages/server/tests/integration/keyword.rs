use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn keywords_are_listed_by_name() {
    let app = TestApp::spawn().await;
    app.create_keyword("Zoology").await;
    app.create_keyword("Algebra").await;

    let res = app.get(routes::KEYWORDS).await;
    assert_eq!(res.status, 200);
    let names: Vec<&str> = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|k| k["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Algebra", "Zoology"]);
}

#[tokio::test]
async fn duplicate_keyword_is_conflict() {
    let app = TestApp::spawn().await;
    app.create_keyword("Ecology").await;

    let res = app
        .post_json(routes::KEYWORDS, &json!({ "name": "Ecology" }))
        .await;
    assert_eq!(res.status, 409);
    assert_eq!(res.code(), "CONFLICT");
}

#[tokio::test]
async fn blank_keyword_is_rejected() {
    let app = TestApp::spawn().await;

    let res = app
        .post_json(routes::KEYWORDS, &json!({ "name": "   " }))
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn duplicate_category_is_conflict() {
    let app = TestApp::spawn().await;
    app.create_category("Announcements").await;

    let res = app
        .post_json(routes::CATEGORIES, &json!({ "name": "Announcements" }))
        .await;
    assert_eq!(res.status, 409);

    let list = app.get(routes::CATEGORIES).await;
    assert_eq!(list.body.as_array().unwrap().len(), 1);
    assert_eq!(list.body[0]["is_active"], true);
}
