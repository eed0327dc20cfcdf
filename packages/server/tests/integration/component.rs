use serde_json::json;
use server::config::IngestConfig;

use crate::common::{MemoryRecords, TestApp, TestOptions, base_form, file_part, pdf, routes};

const LABELS: [&str; 4] = ["Weight", "weightUOM", "Packaging Type", "Material Type"];
const PREFIX: &str = "FY25/CM1/SKU1/COMP1";

mod successful_submission {
    use super::*;

    #[tokio::test]
    async fn worked_example_creates_component_placeholders_and_evidence() {
        let app = TestApp::spawn().await;
        let form = base_form()
            .text("created_by", "alice")
            .part("category1_files", pdf("scale.pdf"))
            .part("category1_files", pdf("label.pdf"));

        let res = app.post_form(routes::COMPONENTS, form).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["success"], true);
        let data = &res.body["data"];
        assert_eq!(data["component"]["id"], 1);
        assert_eq!(data["component"]["year"], 2025);
        assert_eq!(data["component"]["periods"], "FY25");
        assert_eq!(data["component"]["is_active"], true);

        let weight = data["fileUploads"]["uploadedFiles"]["Weight"]
            .as_array()
            .unwrap();
        assert_eq!(weight.len(), 2);
        assert_eq!(weight[0]["originalName"], "scale.pdf");
        assert_eq!(weight[1]["originalName"], "label.pdf");
        assert_eq!(weight[0]["mimeType"], "application/pdf");
        assert!(
            weight[0]["url"]
                .as_str()
                .unwrap()
                .starts_with("http://objects.test/FY25/CM1/SKU1/COMP1/Weight/scale_")
        );
        assert!(data["fileUploads"]["errors"].as_array().unwrap().is_empty());

        let evidence = data["evidenceRecords"].as_array().unwrap();
        assert_eq!(evidence.len(), 2);
        for record in evidence {
            assert_eq!(record["component_id"], 1);
            assert_eq!(record["category"], "Weight");
            assert_eq!(record["created_by"], "alice");
        }
        assert_eq!(evidence[0]["evidence_file_url"], weight[0]["url"]);

        assert_eq!(
            data["fileCounts"],
            json!({"Weight": 2, "weightUOM": 0, "Packaging Type": 0, "Material Type": 0})
        );
        assert!(data.get("evidenceError").is_none());

        for label in LABELS {
            let keep = std::fs::read(app.object_file(&format!("{PREFIX}/{label}/.keep"))).unwrap();
            assert_eq!(keep, b"Folder placeholder");
        }
        let generated = weight[0]["generatedName"].as_str().unwrap();
        let stored =
            std::fs::read(app.object_file(&format!("{PREFIX}/Weight/{generated}"))).unwrap();
        assert_eq!(stored, b"%PDF-1.7 scale.pdf");
    }

    #[tokio::test]
    async fn placeholders_are_written_without_files() {
        let app = TestApp::spawn().await;

        let res = app.post_form(routes::COMPONENTS, base_form()).await;

        assert_eq!(res.status, 201, "{}", res.text);
        let expected: Vec<String> = {
            let mut v: Vec<_> = LABELS.iter().map(|l| format!("{PREFIX}/{l}/.keep")).collect();
            v.sort();
            v
        };
        assert_eq!(app.stored_objects(), expected);
        assert_eq!(app.evidence_count(), 0);
    }

    #[tokio::test]
    async fn identical_names_get_distinct_generated_names() {
        let app = TestApp::spawn().await;
        let form = base_form()
            .part("category4_files", pdf("spec.pdf"))
            .part("category4_files", pdf("spec.pdf"))
            .part("category4_files", pdf("spec.pdf"));

        let res = app.post_form(routes::COMPONENTS, form).await;

        assert_eq!(res.status, 201, "{}", res.text);
        let files = res.body["data"]["fileUploads"]["uploadedFiles"]["Material Type"]
            .as_array()
            .unwrap();
        let mut names: Vec<_> = files
            .iter()
            .map(|f| f["generatedName"].as_str().unwrap().to_string())
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 3);
        assert!(
            files[0]["url"]
                .as_str()
                .unwrap()
                .contains("/Material%20Type/spec_")
        );
    }

    #[tokio::test]
    async fn resubmission_creates_a_second_component() {
        let app = TestApp::spawn().await;

        let first = app
            .post_form(routes::COMPONENTS, base_form().part("category1_files", pdf("a.pdf")))
            .await;
        let second = app
            .post_form(routes::COMPONENTS, base_form().part("category1_files", pdf("a.pdf")))
            .await;

        assert_eq!(first.status, 201);
        assert_eq!(second.status, 201);
        assert_eq!(first.body["data"]["component"]["id"], 1);
        assert_eq!(second.body["data"]["component"]["id"], 2);
        let weight_files = app
            .stored_objects()
            .into_iter()
            .filter(|p| p.starts_with(&format!("{PREFIX}/Weight/a_")))
            .count();
        assert_eq!(weight_files, 2);
    }

    #[tokio::test]
    async fn legacy_route_is_mounted() {
        let app = TestApp::spawn().await;

        let res = app.post_form(routes::ADD_COMPONENT, base_form()).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(app.component_count(), 1);
    }

    #[tokio::test]
    async fn unknown_period_falls_back_to_raw_id() {
        let app = TestApp::spawn().await;
        let form = reqwest::multipart::Form::new()
            .text("cm_code", "CM1")
            .text("year", "77")
            .text("sku_code", "SKU1")
            .text("component_code", "COMP1");

        let res = app.post_form(routes::COMPONENTS, form).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["data"]["component"]["periods"].is_null());
        assert!(app.object_file("77/CM1/SKU1/COMP1/Weight/.keep").exists());
    }

    #[tokio::test]
    async fn typed_attributes_are_persisted() {
        let app = TestApp::spawn().await;
        let form = base_form()
            .text("component_quantity", "12.5")
            .text("component_uom_id", "3")
            .text("component_valid_from", "2025-04-01")
            .text("is_active", "false")
            .text("sku_code", "SKU1");

        let res = app.post_form(routes::COMPONENTS, form).await;

        assert_eq!(res.status, 201, "{}", res.text);
        let component = &res.body["data"]["component"];
        assert_eq!(component["component_quantity"], 12.5);
        assert_eq!(component["component_uom_id"], 3);
        assert_eq!(component["is_active"], false);
        assert!(
            component["component_valid_from"]
                .as_str()
                .unwrap()
                .starts_with("2025-04-01T00:00:00")
        );
    }
}

mod partial_failures {
    use super::*;

    #[tokio::test]
    async fn failed_upload_gets_pending_evidence() {
        let app = TestApp::spawn_with(TestOptions {
            fail_uploads_on: vec!["/Packaging Type/broken_".into()],
            ..Default::default()
        })
        .await;
        let form = base_form()
            .part("category3_files", pdf("ok.pdf"))
            .part("category3_files", pdf("broken.pdf"));

        let res = app.post_form(routes::COMPONENTS, form).await;

        assert_eq!(res.status, 201, "{}", res.text);
        let uploads = &res.body["data"]["fileUploads"];
        assert_eq!(uploads["uploadedFiles"]["Packaging Type"].as_array().unwrap().len(), 1);
        let errors = uploads["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["fileName"], "broken.pdf");
        assert_eq!(errors[0]["category"], "Packaging Type");
        assert_eq!(errors[0]["stage"], "upload");

        let urls: Vec<_> = res.body["data"]["evidenceRecords"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["evidence_file_url"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(urls.len(), 2);
        assert!(urls.contains(&"pending-upload/broken.pdf".to_string()));
        assert!(urls.iter().any(|u| u.contains("/Packaging%20Type/ok_")));
    }

    #[tokio::test]
    async fn empty_file_is_reported_once_and_gets_no_evidence() {
        let app = TestApp::spawn().await;
        let form = base_form()
            .part("category2_files", file_part("blank.pdf", Vec::new(), "application/pdf"))
            .part("category2_files", pdf("uom.pdf"));

        let res = app.post_form(routes::COMPONENTS, form).await;

        assert_eq!(res.status, 201, "{}", res.text);
        let errors = res.body["data"]["fileUploads"]["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["fileName"], "blank.pdf");
        assert_eq!(errors[0]["stage"], "extraction");
        assert_eq!(app.evidence_count(), 1);
        assert_eq!(res.body["data"]["fileCounts"]["weightUOM"], 1);
    }

    #[tokio::test]
    async fn text_value_under_file_field_is_rejected_by_uploader() {
        let app = TestApp::spawn().await;
        let form = base_form().text("category2_files", "not a file");

        let res = app.post_form(routes::COMPONENTS, form).await;

        assert_eq!(res.status, 201, "{}", res.text);
        let errors = res.body["data"]["fileUploads"]["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["reason"], "File data is not a byte buffer");
        assert_eq!(errors[0]["stage"], "upload");
        assert_eq!(res.body["data"]["fileCounts"]["weightUOM"], 0);
        assert_eq!(app.evidence_count(), 0);
    }

    #[tokio::test]
    async fn unknown_category_token_is_ignored() {
        let app = TestApp::spawn().await;
        let form = base_form().part("category9_files", pdf("stray.pdf"));

        let res = app.post_form(routes::COMPONENTS, form).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["data"]["fileUploads"]["errors"].as_array().unwrap().is_empty());
        assert_eq!(app.evidence_count(), 0);
        assert_eq!(app.stored_objects().len(), 4);
    }

    #[tokio::test]
    async fn evidence_insert_failure_is_reported_inline() {
        let app = TestApp::spawn_with(TestOptions {
            records: MemoryRecords {
                fail_evidence: true,
                ..Default::default()
            },
            ..Default::default()
        })
        .await;
        let form = base_form().part("category1_files", pdf("a.pdf"));

        let res = app.post_form(routes::COMPONENTS, form).await;

        assert_eq!(res.status, 201, "{}", res.text);
        let data = &res.body["data"];
        assert!(data["evidenceRecords"].as_array().unwrap().is_empty());
        assert!(
            data["evidenceError"]
                .as_str()
                .unwrap()
                .contains("evidence table unavailable")
        );
        assert_eq!(app.component_count(), 1);
    }

    #[tokio::test]
    async fn component_insert_failure_is_a_server_error() {
        let app = TestApp::spawn_with(TestOptions {
            records: MemoryRecords {
                fail_component: true,
                ..Default::default()
            },
            ..Default::default()
        })
        .await;
        let form = base_form().part("category1_files", pdf("a.pdf"));

        let res = app.post_form(routes::COMPONENTS, form).await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["success"], false);
        assert_eq!(res.body["code"], "PERSISTENCE_ERROR");
        assert!(!res.text.contains("component table unavailable"));
        // Objects written before the insert stay behind.
        assert_eq!(app.stored_objects().len(), 5);
        assert_eq!(app.evidence_count(), 0);
    }
}

mod rejected_submission {
    use super::*;

    #[tokio::test]
    async fn missing_required_fields_write_nothing() {
        let app = TestApp::spawn().await;
        let form = reqwest::multipart::Form::new()
            .text("cm_code", "CM1")
            .part("category1_files", pdf("a.pdf"));

        let res = app.post_form(routes::COMPONENTS, form).await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["success"], false);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(
            res.body["message"],
            "Missing required fields: year, sku_code, component_code"
        );
        assert!(app.stored_objects().is_empty());
        assert_eq!(app.component_count(), 0);
    }

    #[tokio::test]
    async fn path_breaking_code_is_rejected() {
        let app = TestApp::spawn().await;
        let form = reqwest::multipart::Form::new()
            .text("cm_code", "CM1")
            .text("year", "2025")
            .text("sku_code", "../SKU1")
            .text("component_code", "COMP1");

        let res = app.post_form(routes::COMPONENTS, form).await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert!(res.body["message"].as_str().unwrap().contains("sku_code"));
        assert!(app.stored_objects().is_empty());
    }

    #[tokio::test]
    async fn malformed_number_is_rejected() {
        let app = TestApp::spawn().await;
        let form = base_form().text("percent_bio_sourced", "plenty");

        let res = app.post_form(routes::COMPONENTS, form).await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert!(res.body["message"].as_str().unwrap().contains("percent_bio_sourced"));
        assert_eq!(app.component_count(), 0);
    }

    #[tokio::test]
    async fn too_many_files_are_rejected() {
        let app = TestApp::spawn_with(TestOptions {
            ingest: Some(IngestConfig {
                max_files: 2,
                ..Default::default()
            }),
            ..Default::default()
        })
        .await;
        let form = base_form()
            .part("category1_files", pdf("a.pdf"))
            .part("category1_files", pdf("b.pdf"))
            .part("category1_files", pdf("c.pdf"));

        let res = app.post_form(routes::COMPONENTS, form).await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert!(res.body["message"].as_str().unwrap().contains("Too many files"));
        assert!(app.stored_objects().is_empty());
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let app = TestApp::spawn_with(TestOptions {
            ingest: Some(IngestConfig {
                max_file_size: 8,
                ..Default::default()
            }),
            ..Default::default()
        })
        .await;
        let form = base_form().part(
            "category1_files",
            file_part("big.bin", vec![7u8; 64], "application/octet-stream"),
        );

        let res = app.post_form(routes::COMPONENTS, form).await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(app.component_count(), 0);
    }
}

mod large_files {
    use super::*;

    #[tokio::test]
    async fn spooled_file_is_stored_intact() {
        let app = TestApp::spawn_with(TestOptions {
            ingest: Some(IngestConfig {
                inline_threshold: 16,
                ..Default::default()
            }),
            ..Default::default()
        })
        .await;
        let payload: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
        let form = base_form().part(
            "category3_files",
            file_part("drawing.bin", payload.clone(), "application/octet-stream"),
        );

        let res = app.post_form(routes::COMPONENTS, form).await;

        assert_eq!(res.status, 201, "{}", res.text);
        let file = &res.body["data"]["fileUploads"]["uploadedFiles"]["Packaging Type"][0];
        assert_eq!(file["size"], payload.len());
        let generated = file["generatedName"].as_str().unwrap();
        let path = app.object_file(&format!("{PREFIX}/Packaging Type/{generated}"));
        let stored = std::fs::read(path).unwrap();
        assert_eq!(stored, payload);
    }
}
