use media::storage::MediaStore;
use reqwest::Method;
use serde_json::json;

use crate::common::{FormPart, PNG_BYTES, PNG_DATA_URI, TestApp, current_shard, routes};

fn keyword_ids(res: &crate::common::TestResponse) -> Vec<i64> {
    res.body["keywords"]
        .as_array()
        .expect("response should contain keywords")
        .iter()
        .map(|k| k["id"].as_i64().unwrap())
        .collect()
}

fn png_part<'a>(file_name: &'a str) -> FormPart<'a> {
    FormPart::File {
        name: "image",
        file_name,
        mime: "image/png",
        bytes: PNG_BYTES,
    }
}

mod create {
    use super::*;

    #[tokio::test]
    async fn multipart_create_stores_image_and_keywords() {
        let app = TestApp::spawn().await;
        let k1 = app.create_keyword("Distributed Systems").await;
        let k2 = app.create_keyword("Databases").await;

        let ids = format!("[{k2}, {k1}]");
        let res = app
            .multipart(
                Method::POST,
                routes::LECTURERS,
                &[
                    FormPart::Text("full_name", "Nguyen Van A"),
                    FormPart::Text("keyword_ids", &ids),
                    png_part("portrait.png"),
                ],
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["full_name"], "Nguyen Van A");
        assert_eq!(keyword_ids(&res), vec![k2 as i64, k1 as i64]);

        let image = res.body["image"].as_str().unwrap();
        assert!(image.starts_with(&current_shard()), "{image}");
        assert!(image.ends_with(".png"));
        assert_eq!(app.media.read(image).await.unwrap(), PNG_BYTES);
    }

    #[tokio::test]
    async fn json_create_accepts_data_uri() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::LECTURERS,
                &json!({ "full_name": "Tran Thi B", "image_base64": PNG_DATA_URI }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let image = res.body["image"].as_str().unwrap();
        let file_name = image.rsplit('/').next().unwrap();
        assert!(file_name.starts_with("base64-"), "{file_name}");
        assert!(app.media_exists(image).await);
    }

    #[tokio::test]
    async fn duplicate_keyword_ids_are_stored_once() {
        let app = TestApp::spawn().await;
        let k1 = app.create_keyword("AI").await;

        let res = app
            .post_json(
                routes::LECTURERS,
                &json!({ "full_name": "C", "keyword_ids": [k1, k1] }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(keyword_ids(&res), vec![k1 as i64]);
    }

    #[tokio::test]
    async fn unknown_keyword_rejects_and_leaves_no_file() {
        let app = TestApp::spawn().await;
        let k1 = app.create_keyword("Networks").await;

        let ids = format!("[{k1}, 9999]");
        let res = app
            .multipart(
                Method::POST,
                routes::LECTURERS,
                &[
                    FormPart::Text("full_name", "D"),
                    FormPart::Text("keyword_ids", &ids),
                    png_part("d.png"),
                ],
            )
            .await;

        assert_eq!(res.status, 404, "{}", res.text);
        assert_eq!(res.code(), "NOT_FOUND");
        assert!(res.body["message"].as_str().unwrap().contains("9999"));
        assert!(app.stored_files().is_empty());

        let list = app.get(routes::LECTURERS).await;
        assert_eq!(list.body.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn malformed_data_uri_is_format_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::LECTURERS,
                &json!({ "full_name": "E", "image_base64": "data:text/plain;base64,aGk=" }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "FORMAT_ERROR");
        assert!(app.stored_files().is_empty());
    }

    #[tokio::test]
    async fn disallowed_mime_is_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .multipart(
                Method::POST,
                routes::LECTURERS,
                &[
                    FormPart::Text("full_name", "F"),
                    FormPart::File {
                        name: "image",
                        file_name: "anim.gif",
                        mime: "image/gif",
                        bytes: b"GIF89a",
                    },
                ],
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
        assert!(app.stored_files().is_empty());
    }

    #[tokio::test]
    async fn missing_full_name_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::LECTURERS, &json!({ "email": "x@y.z" }))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn empty_keyword_list_clears_and_keeps_image() {
        let app = TestApp::spawn().await;
        let k1 = app.create_keyword("Robotics").await;
        let ids = format!("[{k1}]");
        let created = app
            .multipart(
                Method::POST,
                routes::LECTURERS,
                &[
                    FormPart::Text("full_name", "G"),
                    FormPart::Text("keyword_ids", &ids),
                    png_part("g.png"),
                ],
            )
            .await;
        assert_eq!(created.status, 201, "{}", created.text);
        let id = created.uuid();
        let image = created.body["image"].as_str().unwrap().to_string();

        let res = app
            .patch_json(&routes::lecturer(&id), &json!({ "keyword_ids": [] }))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(keyword_ids(&res).is_empty());
        assert_eq!(res.body["image"], image.as_str());
        assert!(app.media_exists(&image).await);
    }

    #[tokio::test]
    async fn absent_keyword_ids_leave_set_untouched() {
        let app = TestApp::spawn().await;
        let k1 = app.create_keyword("Compilers").await;
        let created = app
            .post_json(
                routes::LECTURERS,
                &json!({ "full_name": "H", "keyword_ids": [k1], "bio": "Old bio" }),
            )
            .await;
        let id = created.uuid();

        let res = app
            .patch_json(&routes::lecturer(&id), &json!({ "position": "Dean" }))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(keyword_ids(&res), vec![k1 as i64]);
        assert_eq!(res.body["position"], "Dean");
        assert_eq!(res.body["bio"], "Old bio");
    }

    #[tokio::test]
    async fn blank_text_clears_nullable_field() {
        let app = TestApp::spawn().await;
        let created = app
            .post_json(
                routes::LECTURERS,
                &json!({ "full_name": "I", "website": "https://example.edu" }),
            )
            .await;
        let id = created.uuid();

        let res = app
            .multipart(
                Method::PATCH,
                &routes::lecturer(&id),
                &[FormPart::Text("website", "")],
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["website"].is_null());
        assert_eq!(res.body["full_name"], "I");
    }

    #[tokio::test]
    async fn new_image_replaces_old_file() {
        let app = TestApp::spawn().await;
        let created = app
            .multipart(
                Method::POST,
                routes::LECTURERS,
                &[FormPart::Text("full_name", "J"), png_part("first.png")],
            )
            .await;
        let id = created.uuid();
        let old_image = created.body["image"].as_str().unwrap().to_string();

        let res = app
            .multipart(
                Method::PATCH,
                &routes::lecturer(&id),
                &[png_part("second.png")],
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let new_image = res.body["image"].as_str().unwrap();
        assert_ne!(new_image, old_image);
        assert!(!app.media_exists(&old_image).await);
        assert!(!app.disk_path(&old_image).exists());
        assert!(app.media_exists(new_image).await);
        assert_eq!(app.stored_files().len(), 1);
    }

    #[tokio::test]
    async fn failed_update_discards_new_file_and_keeps_row() {
        let app = TestApp::spawn().await;
        let k1 = app.create_keyword("Security").await;
        let created = app
            .post_json(
                routes::LECTURERS,
                &json!({ "full_name": "K", "keyword_ids": [k1] }),
            )
            .await;
        let id = created.uuid();

        let res = app
            .multipart(
                Method::PATCH,
                &routes::lecturer(&id),
                &[
                    FormPart::Text("full_name", "Renamed"),
                    FormPart::Text("keyword_ids", "[4242]"),
                    png_part("k.png"),
                ],
            )
            .await;

        assert_eq!(res.status, 404, "{}", res.text);
        assert!(app.stored_files().is_empty());

        let current = app.get(&routes::lecturer(&id)).await;
        assert_eq!(current.body["full_name"], "K");
        assert_eq!(keyword_ids(&current), vec![k1 as i64]);
    }

    #[tokio::test]
    async fn unknown_keyword_keeps_existing_portrait() {
        let app = TestApp::spawn().await;
        let created = app
            .multipart(
                Method::POST,
                routes::LECTURERS,
                &[FormPart::Text("full_name", "M"), png_part("old.png")],
            )
            .await;
        assert_eq!(created.status, 201, "{}", created.text);
        let id = created.uuid();
        let old_image = created.body["image"].as_str().unwrap().to_string();

        let res = app
            .multipart(
                Method::PATCH,
                &routes::lecturer(&id),
                &[
                    FormPart::Text("keyword_ids", "[4242]"),
                    png_part("new.png"),
                ],
            )
            .await;

        assert_eq!(res.status, 404, "{}", res.text);
        assert!(app.media_exists(&old_image).await);
        assert!(app.disk_path(&old_image).exists());
        assert_eq!(app.stored_files().len(), 1);

        let current = app.get(&routes::lecturer(&id)).await;
        assert_eq!(current.body["image"], old_image.as_str());
        let served = app.get(&old_image).await;
        assert_eq!(served.status, 200);
    }

    #[tokio::test]
    async fn external_image_is_left_alone_on_replace() {
        use faculty_server::entity::lecturer;
        use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};

        let app = TestApp::spawn().await;
        let created = app
            .post_json(routes::LECTURERS, &json!({ "full_name": "L" }))
            .await;
        let id = created.uuid();

        let model = lecturer::Entity::find_by_id(id.parse::<uuid::Uuid>().unwrap())
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        let mut active = model.into_active_model();
        active.image = Set(Some("https://cdn.example.edu/portrait.png".into()));
        active.update(&app.db).await.unwrap();

        let res = app
            .patch_json(&routes::lecturer(&id), &json!({ "image_base64": PNG_DATA_URI }))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["image"].as_str().unwrap().starts_with(&current_shard()));
        assert_eq!(app.stored_files().len(), 1);
    }

    #[tokio::test]
    async fn unknown_lecturer_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .patch_json(
                &routes::lecturer("0192f0c4-0000-7000-8000-000000000000"),
                &json!({ "position": "x" }),
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "NOT_FOUND");
    }
}

mod keywords {
    use super::*;

    #[tokio::test]
    async fn add_and_remove_keywords() {
        let app = TestApp::spawn().await;
        let k1 = app.create_keyword("Optics").await;
        let k2 = app.create_keyword("Photonics").await;
        let k3 = app.create_keyword("Lasers").await;
        let created = app
            .post_json(
                routes::LECTURERS,
                &json!({ "full_name": "M", "keyword_ids": [k1] }),
            )
            .await;
        let id = created.uuid();

        let added = app
            .post_json(
                &routes::lecturer_keywords(&id),
                &json!({ "keyword_ids": [k2, k1, k3] }),
            )
            .await;
        assert_eq!(added.status, 200, "{}", added.text);
        assert_eq!(keyword_ids(&added), vec![k1 as i64, k2 as i64, k3 as i64]);

        let removed = app
            .delete_json(
                &routes::lecturer_keywords(&id),
                &json!({ "keyword_ids": [k2, 777] }),
            )
            .await;
        assert_eq!(removed.status, 200, "{}", removed.text);
        assert_eq!(keyword_ids(&removed), vec![k1 as i64, k3 as i64]);

        let fetched = app.get(&routes::lecturer(&id)).await;
        assert_eq!(keyword_ids(&fetched), vec![k1 as i64, k3 as i64]);
    }

    #[tokio::test]
    async fn adding_unknown_keyword_changes_nothing() {
        let app = TestApp::spawn().await;
        let k1 = app.create_keyword("Acoustics").await;
        let created = app
            .post_json(
                routes::LECTURERS,
                &json!({ "full_name": "N", "keyword_ids": [k1] }),
            )
            .await;
        let id = created.uuid();

        let res = app
            .post_json(&routes::lecturer_keywords(&id), &json!({ "keyword_ids": [555] }))
            .await;
        assert_eq!(res.status, 404);

        let fetched = app.get(&routes::lecturer(&id)).await;
        assert_eq!(keyword_ids(&fetched), vec![k1 as i64]);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn delete_removes_row_links_and_file() {
        let app = TestApp::spawn().await;
        let k1 = app.create_keyword("Geology").await;
        let ids = format!("[{k1}]");
        let created = app
            .multipart(
                Method::POST,
                routes::LECTURERS,
                &[
                    FormPart::Text("full_name", "O"),
                    FormPart::Text("keyword_ids", &ids),
                    png_part("o.png"),
                ],
            )
            .await;
        let id = created.uuid();
        let image = created.body["image"].as_str().unwrap().to_string();

        let res = app.delete(&routes::lecturer(&id)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["id"], id.as_str());
        assert!(res.body["warnings"].as_array().unwrap().is_empty());
        assert!(!app.media_exists(&image).await);

        let gone = app.get(&routes::lecturer(&id)).await;
        assert_eq!(gone.status, 404);

        // The keyword itself survives.
        let keywords = app.get(routes::KEYWORDS).await;
        assert_eq!(keywords.body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_tolerates_already_missing_file() {
        let app = TestApp::spawn().await;
        let created = app
            .multipart(
                Method::POST,
                routes::LECTURERS,
                &[FormPart::Text("full_name", "P"), png_part("p.png")],
            )
            .await;
        let id = created.uuid();
        let image = created.body["image"].as_str().unwrap().to_string();
        std::fs::remove_file(app.disk_path(&image)).unwrap();

        let res = app.delete(&routes::lecturer(&id)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["warnings"].as_array().unwrap().is_empty());
    }
}

mod list {
    use super::*;

    #[tokio::test]
    async fn list_orders_by_display_order() {
        let app = TestApp::spawn().await;
        let k1 = app.create_keyword("Math").await;
        app.post_json(
            routes::LECTURERS,
            &json!({ "full_name": "Second", "display_order": 2 }),
        )
        .await;
        app.post_json(
            routes::LECTURERS,
            &json!({ "full_name": "First", "display_order": 1, "keyword_ids": [k1] }),
        )
        .await;

        let res = app.get(routes::LECTURERS).await;
        assert_eq!(res.status, 200);
        let lecturers = res.body.as_array().unwrap();
        assert_eq!(lecturers[0]["full_name"], "First");
        assert_eq!(lecturers[0]["keywords"][0]["name"], "Math");
        assert_eq!(lecturers[1]["full_name"], "Second");
    }

    #[tokio::test]
    async fn stored_image_is_served_under_prefix() {
        let app = TestApp::spawn().await;
        let created = app
            .multipart(
                Method::POST,
                routes::LECTURERS,
                &[FormPart::Text("full_name", "Q"), png_part("q.png")],
            )
            .await;
        let image = created.body["image"].as_str().unwrap();

        let res = app.get(image).await;
        assert_eq!(res.status, 200);
    }
}

mod search {
    use super::*;

    fn names(res: &crate::common::TestResponse) -> Vec<String> {
        res.body
            .as_array()
            .expect("search should return an array")
            .iter()
            .map(|l| l["full_name"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn filters_by_any_keyword_and_skips_inactive() {
        let app = TestApp::spawn().await;
        let ai = app.create_keyword("AI").await;
        let db = app.create_keyword("Databases").await;
        let net = app.create_keyword("Networks").await;
        app.post_json(
            routes::LECTURERS,
            &json!({ "full_name": "Alpha", "display_order": 1, "keyword_ids": [ai] }),
        )
        .await;
        app.post_json(
            routes::LECTURERS,
            &json!({ "full_name": "Beta", "display_order": 2, "keyword_ids": [db, ai] }),
        )
        .await;
        app.post_json(
            routes::LECTURERS,
            &json!({ "full_name": "Gamma", "keyword_ids": [net] }),
        )
        .await;
        app.post_json(
            routes::LECTURERS,
            &json!({ "full_name": "Hidden", "is_active": false, "keyword_ids": [ai] }),
        )
        .await;

        let res = app
            .get(&format!("{}?keyword_ids={ai},{db}", routes::LECTURER_SEARCH))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(names(&res), vec!["Alpha", "Beta"]);
        assert_eq!(res.body[1]["keywords"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn matches_name_fragment() {
        let app = TestApp::spawn().await;
        app.post_json(routes::LECTURERS, &json!({ "full_name": "Tran Van Minh" }))
            .await;
        app.post_json(routes::LECTURERS, &json!({ "full_name": "Le Thi Hoa" }))
            .await;

        let res = app
            .get(&format!("{}?search=Minh", routes::LECTURER_SEARCH))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(names(&res), vec!["Tran Van Minh"]);

        let all = app.get(routes::LECTURER_SEARCH).await;
        assert_eq!(all.body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unmatched_keyword_returns_empty() {
        let app = TestApp::spawn().await;
        let ai = app.create_keyword("AI").await;
        app.post_json(routes::LECTURERS, &json!({ "full_name": "N" }))
            .await;

        let res = app
            .get(&format!("{}?keyword_ids={ai}", routes::LECTURER_SEARCH))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_numeric_keyword_id_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app
            .get(&format!("{}?keyword_ids=1,x", routes::LECTURER_SEARCH))
            .await;
        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }
}
