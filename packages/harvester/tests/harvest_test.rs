//! End-to-end harvest runs against a mock CSW service.

use std::fs;
use std::path::Path;

use catalog_harvester::harvester::{
    harvest_catalog, harvest_catalog_with_progress, HarvestOptions, SERVICE_FIELD,
};
use catalog_harvester::report::{ReportError, ReportErrorType};
use catalog_harvester::run::{CancellationFlag, HarvestRun, RunStatus};
use catalog_harvester::transport::{Method, TransportConfig, XmlRequest};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_string_contains, method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("csw")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

fn xml(name: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/xml")
        .set_body_string(load_fixture(name))
}

async fn run_harvest(url: String, options: HarvestOptions) -> HarvestRun {
    tokio::task::spawn_blocking(move || {
        let mut client = XmlRequest::from_url(&url, TransportConfig::default()).unwrap();
        harvest_catalog(&mut client, &options, &CancellationFlag::new()).unwrap()
    })
    .await
    .unwrap()
}

fn options(method: Method) -> HarvestOptions {
    HarvestOptions {
        method,
        page_size: 2,
        required_fields: vec!["title".to_string()],
        ..HarvestOptions::default()
    }
}

fn assert_two_page_report(run: &HarvestRun) {
    assert_eq!(run.status(), RunStatus::Succeeded);
    assert!(run.end_time().unwrap() >= run.start_time().unwrap());

    let report = run.report().unwrap();
    assert_eq!(report.public_records(), 1);
    assert_eq!(report.restricted_records(), 1);
    assert_eq!(report.raster_records(), 1);
    assert_eq!(report.vector_records(), 1);
    assert_eq!(report.web_service_warnings(), 0);
    // third record lacks abstract and rights
    assert_eq!(report.unrequired_field_warnings(), 2);
    assert_eq!(
        report.errors(),
        &[
            ReportError {
                field: "title".to_string(),
                error_type: ReportErrorType::RequiredFieldError,
            },
            ReportError {
                field: "bbox".to_string(),
                error_type: ReportErrorType::InvalidBoundsError,
            },
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_harvest_pages_with_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains(r#"startPosition="1""#))
        .and(body_string_contains(r#"maxRecords="2""#))
        .respond_with(xml("page1.xml"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains(r#"startPosition="3""#))
        .respond_with(xml("page2.xml"))
        .mount(&server)
        .await;

    let run = run_harvest(server.uri(), options(Method::Post)).await;

    assert_two_page_report(&run);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_harvest_pages_with_get() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("request", "GetRecords"))
        .and(query_param("startPosition", "1"))
        .respond_with(xml("page1.xml"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("startPosition", "3"))
        .respond_with(xml("page2.xml"))
        .mount(&server)
        .await;

    let run = run_harvest(format!("{}/csw", server.uri()), options(Method::Get)).await;

    assert_two_page_report(&run);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_max_records_limits_paging() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains(r#"maxRecords="1""#))
        .respond_with(xml("page1.xml"))
        .mount(&server)
        .await;

    let run = run_harvest(
        server.uri(),
        HarvestOptions {
            max_records: Some(1),
            ..options(Method::Post)
        },
    )
    .await;

    let report = run.report().unwrap();
    assert_eq!(run.status(), RunStatus::Succeeded);
    assert_eq!(report.public_records() + report.restricted_records(), 1);
    // the page held two records for a request of one
    assert_eq!(report.web_service_warnings(), 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failure_mid_harvest_keeps_partial_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains(r#"startPosition="1""#))
        .respond_with(xml("page1.xml"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains(r#"startPosition="3""#))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let run = run_harvest(server.uri(), options(Method::Post)).await;

    assert_eq!(run.status(), RunStatus::Failed);
    let report = run.report().unwrap();
    assert_eq!(report.public_records(), 1);
    assert_eq!(report.restricted_records(), 1);
    assert_eq!(
        report.errors(),
        &[ReportError {
            field: SERVICE_FIELD.to_string(),
            error_type: ReportErrorType::WebServiceError,
        }]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_exception_report_fails_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(xml("exception.xml"))
        .mount(&server)
        .await;

    let run = run_harvest(server.uri(), options(Method::Post)).await;

    assert_eq!(run.status(), RunStatus::Failed);
    let report = run.report().unwrap();
    assert_eq!(report.errors().len(), 1);
    assert_eq!(report.errors()[0].error_type, ReportErrorType::WebServiceError);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_record_count_mismatch_is_a_warning() {
    let server = MockServer::start().await;
    let body = load_fixture("page2.xml").replace(
        r#"numberOfRecordsReturned="1""#,
        r#"numberOfRecordsReturned="5""#,
    );
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let run = run_harvest(server.uri(), HarvestOptions::default()).await;

    assert_eq!(run.status(), RunStatus::Succeeded);
    assert_eq!(run.report().unwrap().web_service_warnings(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_harvest_keeps_literal_query_pairs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("service", "CSW"))
        .and(query_param("request", "GetRecords"))
        .and(query_param("startPosition", "1"))
        .respond_with(xml("page1.xml"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("service", "CSW"))
        .and(query_param("request", "GetRecords"))
        .and(query_param("startPosition", "3"))
        .respond_with(xml("page2.xml"))
        .mount(&server)
        .await;

    let url = format!("{}/csw?service=CSW&hl=eng", server.uri());
    let (run, target) = tokio::task::spawn_blocking(move || {
        let mut client = XmlRequest::from_url(&url, TransportConfig::default()).unwrap();
        let run =
            harvest_catalog(&mut client, &options(Method::Get), &CancellationFlag::new()).unwrap();
        (run, client.target().to_string())
    })
    .await
    .unwrap();

    assert_two_page_report(&run);
    assert!(target.ends_with("/csw?service=CSW&hl=eng"));

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    for request in &received {
        let query = request.url.query().unwrap();
        assert!(query.starts_with("hl=eng&service=CSW&version=2.0.2&request=GetRecords"));
        assert_eq!(query.matches("service=").count(), 1);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancel_between_pages_keeps_first_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains(r#"startPosition="1""#))
        .respond_with(xml("page1.xml"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains(r#"startPosition="3""#))
        .respond_with(xml("page2.xml"))
        .mount(&server)
        .await;

    let url = server.uri();
    let (run, pages) = tokio::task::spawn_blocking(move || {
        let mut client = XmlRequest::from_url(&url, TransportConfig::default()).unwrap();
        let cancel = CancellationFlag::new();
        let mut pages = 0;
        let run = harvest_catalog_with_progress(&mut client, &options(Method::Post), &cancel, |_| {
            pages += 1;
            cancel.cancel();
        })
        .unwrap();
        (run, pages)
    })
    .await
    .unwrap();

    assert_eq!(pages, 1);
    assert_eq!(run.status(), RunStatus::Failed);
    assert!(run.end_time().unwrap() >= run.start_time().unwrap());

    let report = run.report().unwrap();
    assert_eq!(report.public_records(), 1);
    assert_eq!(report.restricted_records(), 1);
    assert_eq!(report.raster_records(), 1);
    assert_eq!(report.vector_records(), 1);
    assert!(report.errors().is_empty());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
