//! POST /api/tests

use crate::support::{
    assert_status, to_json_body, violation_fields, with_test_app, with_test_app_with_config,
    LabTestBuilder,
};
use axum::http::{header, Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn create_returns_normalized_record() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let payload = LabTestBuilder::new().notes("Fasting sample").build();

            let (status, headers, body) = app
                .request(Method::POST, "/api/tests", Some(to_json_body(&payload)?))
                .await?;
            assert_status(status, StatusCode::CREATED, "create");

            let created: serde_json::Value = serde_json::from_slice(&body)?;
            let id = created["id"].as_i64().expect("numeric id");
            assert!(id > 0);
            assert_eq!(created["patientName"], "Jane Doe");
            assert_eq!(created["testType"], "Blood Panel");
            assert_eq!(created["result"], "Normal");
            assert_eq!(created["testDate"], "2024-01-15T00:00:00.000Z");
            assert_eq!(created["notes"], "Fasting sample");

            let location = headers
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            assert_eq!(location, format!("/api/tests/{id}"));
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn create_without_notes_serializes_null() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let created = app.create_test(&LabTestBuilder::new().build()).await?;
            assert!(created["notes"].is_null());

            let nulled = app
                .create_test(&LabTestBuilder::new().set("notes", json!(null)).build())
                .await?;
            assert!(nulled["notes"].is_null());
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn ids_are_unique_and_increasing() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let first = app.create_test(&LabTestBuilder::new().build()).await?;
            let second = app.create_test(&LabTestBuilder::new().build()).await?;
            assert!(second["id"].as_i64() > first["id"].as_i64());
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn date_time_inputs_are_canonicalized() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            for (input, expected) in [
                ("2024-03-01T10:30:00Z", "2024-03-01T10:30:00.000Z"),
                ("2024-03-01T12:30:00+02:00", "2024-03-01T10:30:00.000Z"),
                ("2024-03-01T10:30:00.123456Z", "2024-03-01T10:30:00.123Z"),
                ("2024-03-01 10:30:00", "2024-03-01T10:30:00.000Z"),
            ] {
                let created = app
                    .create_test(&LabTestBuilder::new().date(input).build())
                    .await?;
                assert_eq!(created["testDate"], expected, "input {input}");
            }
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn unstorable_years_are_invalid_dates() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            for date in ["-5000-01-01", "0000-01-01"] {
                let (status, body) = app
                    .request_json(
                        Method::POST,
                        "/api/tests",
                        Some(&LabTestBuilder::new().date(date).build()),
                    )
                    .await?;
                assert_status(status, StatusCode::BAD_REQUEST, date);
                assert_eq!(
                    body["error"],
                    json!([{ "field": "testDate", "message": "Invalid date format." }])
                );
            }
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn unknown_fields_are_ignored() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let created = app
                .create_test(
                    &LabTestBuilder::new()
                        .set("id", json!(999))
                        .set("ward", json!("B3"))
                        .build(),
                )
                .await?;
            assert_ne!(created["id"], 999);
            assert!(created.get("ward").is_none());
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn empty_body_reports_every_required_field() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let (status, body) = app
                .request_json(Method::POST, "/api/tests", Some(&json!({})))
                .await?;
            assert_status(status, StatusCode::BAD_REQUEST, "empty create");
            assert_eq!(
                violation_fields(&body),
                vec!["patientName", "testType", "result", "testDate"]
            );
            for violation in body["error"].as_array().expect("violation list") {
                assert_eq!(violation["message"], "Required");
            }
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn length_type_and_date_violations_are_reported_together() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let payload = LabTestBuilder::new()
                .patient("J")
                .test_type("CT")
                .set("result", json!(42))
                .date("yesterday")
                .build();

            let (status, body) = app
                .request_json(Method::POST, "/api/tests", Some(&payload))
                .await?;
            assert_status(status, StatusCode::BAD_REQUEST, "invalid create");

            assert_eq!(
                body["error"],
                json!([
                    { "field": "patientName", "message": "Patient name must be at least 2 characters." },
                    { "field": "testType", "message": "Test type must be at least 3 characters." },
                    { "field": "result", "message": "Expected string, received number" },
                    { "field": "testDate", "message": "Invalid date format." }
                ])
            );
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn rejected_create_stores_nothing() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let payload = LabTestBuilder::new().without("result").build();
            let (status, _body) = app
                .request_json(Method::POST, "/api/tests", Some(&payload))
                .await?;
            assert_status(status, StatusCode::BAD_REQUEST, "missing result");

            let (status, page) = app.request_json(Method::GET, "/api/tests", None).await?;
            assert_status(status, StatusCode::OK, "list");
            assert_eq!(page["totalRecords"], 0);
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn malformed_json_is_bad_request() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let (status, _headers, body) = app
                .request(Method::POST, "/api/tests", Some(b"{\"patientName\":".to_vec()))
                .await?;
            assert_status(status, StatusCode::BAD_REQUEST, "malformed json");

            let body: serde_json::Value = serde_json::from_slice(&body)?;
            assert!(body["error"].is_string());
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn non_object_body_is_bad_request() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let (status, body) = app
                .request_json(Method::POST, "/api/tests", Some(&json!(["Jane Doe"])))
                .await?;
            assert_status(status, StatusCode::BAD_REQUEST, "array body");
            assert!(body["error"]
                .as_str()
                .is_some_and(|e| e.contains("JSON object")));
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn oversized_body_is_rejected() -> anyhow::Result<()> {
    with_test_app_with_config(
        |config| {
            config.server.max_request_body_size = 256;
        },
        |app| {
            Box::pin(async move {
                let payload = LabTestBuilder::new().notes(&"x".repeat(1024)).build();
                let (status, body) = app
                    .request_json(Method::POST, "/api/tests", Some(&payload))
                    .await?;
                assert_status(status, StatusCode::PAYLOAD_TOO_LARGE, "oversized body");
                assert_eq!(body["error"], "Request body too large");
                Ok(())
            })
        },
    )
    .await
}
