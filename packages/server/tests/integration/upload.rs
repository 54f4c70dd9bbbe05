use media::storage::MediaStore;
use reqwest::Method;
use serde_json::json;

use crate::common::{FormPart, PNG_BYTES, PNG_DATA_URI, TestApp, current_shard, routes};

mod binary {
    use super::*;

    #[tokio::test]
    async fn batch_upload_stores_every_file() {
        let app = TestApp::spawn().await;

        let res = app
            .multipart(
                Method::POST,
                routes::UPLOADS,
                &[
                    FormPart::File {
                        name: "files",
                        file_name: "one.png",
                        mime: "image/png",
                        bytes: PNG_BYTES,
                    },
                    FormPart::File {
                        name: "files",
                        file_name: "two.jpg",
                        mime: "image/jpeg",
                        bytes: b"jpeg-bytes",
                    },
                ],
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let files = res.body["files"].as_array().unwrap();
        assert_eq!(files.len(), 2);
        for file in files {
            let path = file["path"].as_str().unwrap();
            assert!(path.starts_with(&current_shard()), "{path}");
            assert!(app.media_exists(path).await);
        }
        assert_eq!(files[0]["size"], PNG_BYTES.len() as u64);
        assert_eq!(files[1]["extension"], "jpg");
        assert_eq!(files[1]["content_type"], "image/jpeg");
    }

    #[tokio::test]
    async fn one_bad_file_fails_whole_batch() {
        let app = TestApp::spawn().await;

        let res = app
            .multipart(
                Method::POST,
                routes::UPLOADS,
                &[
                    FormPart::File {
                        name: "files",
                        file_name: "ok.png",
                        mime: "image/png",
                        bytes: PNG_BYTES,
                    },
                    FormPart::File {
                        name: "files",
                        file_name: "doc.pdf",
                        mime: "application/pdf",
                        bytes: b"%PDF-1.7",
                    },
                ],
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
        assert!(app.stored_files().is_empty());
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let app = TestApp::spawn().await;
        let big = vec![0u8; 64 * 1024 + 1];

        let res = app
            .multipart(
                Method::POST,
                routes::UPLOADS,
                &[FormPart::File {
                    name: "files",
                    file_name: "big.png",
                    mime: "image/png",
                    bytes: &big,
                }],
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn missing_files_field_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .multipart(Method::POST, routes::UPLOADS, &[FormPart::Text("note", "x")])
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }
}

mod base64 {
    use super::*;

    #[tokio::test]
    async fn stores_data_uris() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::UPLOADS_BASE64,
                &json!({ "images": [PNG_DATA_URI, PNG_DATA_URI] }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let files = res.body["files"].as_array().unwrap();
        assert_eq!(files.len(), 2);
        assert_ne!(files[0]["path"], files[1]["path"]);
        let stored = app.media.read(files[0]["path"].as_str().unwrap()).await.unwrap();
        assert_eq!(stored, PNG_BYTES);
    }

    #[tokio::test]
    async fn wrong_shape_is_format_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::UPLOADS_BASE64, &json!({ "images": ["iVBORw0KGgo="] }))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "FORMAT_ERROR");
    }

    #[tokio::test]
    async fn undecodable_payload_is_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::UPLOADS_BASE64, &json!({ "images": ["data:image/png;base64,@@@"] }))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn empty_list_is_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::UPLOADS_BASE64, &json!({ "images": [] }))
            .await;

        assert_eq!(res.status, 400);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn delete_is_idempotent() {
        let app = TestApp::spawn().await;
        let stored = app
            .post_json(routes::UPLOADS_BASE64, &json!({ "images": [PNG_DATA_URI] }))
            .await;
        let path = stored.body["files"][0]["path"].as_str().unwrap().to_string();

        let first = app
            .delete_json(routes::UPLOADS, &json!({ "path": path }))
            .await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.body["status"], "deleted");

        let second = app
            .delete_json(routes::UPLOADS, &json!({ "path": path }))
            .await;
        assert_eq!(second.status, 200);
        assert_eq!(second.body["status"], "missing");
    }

    #[tokio::test]
    async fn external_url_is_skipped() {
        let app = TestApp::spawn().await;

        let res = app
            .delete_json(
                routes::UPLOADS,
                &json!({ "path": "https://cdn.example.edu/a.png" }),
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "external");
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .delete_json(
                routes::UPLOADS,
                &json!({ "path": "/uploads/2024/01/../../../etc/passwd" }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }
}
