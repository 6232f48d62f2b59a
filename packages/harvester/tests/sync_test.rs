//! Synchronization against a mock data center.
//!
//! The harvester uses a blocking HTTP client, so every pass runs on a
//! blocking task while wiremock serves from the async runtime.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use iers_harvester::archive::{Archive, MemoryArchive};
use iers_harvester::bulletin::{create_bulletin_registry, BulletinA, BulletinB, BulletinFormat};
use iers_harvester::catalog::{Catalog, HttpCatalog, Probe};
use iers_harvester::config::{ParseFailurePolicy, SyncConfig};
use iers_harvester::sync::{SyncReport, SyncRequest, Synchronizer};
use iers_harvester::types::{BulletinIndex, Encoding, Family, MetadataRecord};
use iers_harvester::{HarvesterError, Result};

fn seed(format: &dyn BulletinFormat, index: BulletinIndex) -> MetadataRecord {
    format
        .describe(&format.format_name(Encoding::Xml, index))
        .unwrap()
}

async fn mount_status(server: &MockServer, http_method: &str, url_path: &str, status: u16) {
    Mock::given(method(http_method))
        .and(path(url_path))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Run a pass on a blocking task and hand back the report and the archive.
async fn run_sync(
    config: SyncConfig,
    mut archive: MemoryArchive,
    request: SyncRequest,
) -> (Result<SyncReport>, MemoryArchive) {
    tokio::task::spawn_blocking(move || {
        let registry = create_bulletin_registry();
        let catalog = HttpCatalog::new().unwrap();
        let synchronizer = Synchronizer::new(&registry, catalog, config);
        let result = synchronizer.run(&mut archive, &request);
        (result, archive)
    })
    .await
    .unwrap()
}

fn config_for(server: &MockServer) -> SyncConfig {
    SyncConfig::default()
        .with_base_url(format!("{}/data", server.uri()))
        .unwrap()
        .with_rate_limit(0)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sync_stops_at_first_missing_bulletin() {
    let server = MockServer::start().await;
    for number in 253..=255 {
        mount_status(
            &server,
            "HEAD",
            &format!("/data/xml/bulletinb-{number}.xml"),
            200,
        )
        .await;
    }
    // 256 is unmatched and answered with 404.

    let archive = MemoryArchive::with_records(vec![seed(&BulletinB, BulletinIndex::number(252))]);
    let (result, archive) = run_sync(
        config_for(&server),
        archive,
        SyncRequest::new([Family::B]),
    )
    .await;

    let report = result.unwrap();
    let family = &report.families[0];
    assert_eq!(
        family.created,
        vec![
            BulletinIndex::number(253),
            BulletinIndex::number(254),
            BulletinIndex::number(255)
        ]
    );
    assert_eq!(family.stopped_at, BulletinIndex::number(256));
    assert_eq!(archive.records().len(), 4);

    let created = &archive.records()[1..];
    for record in created {
        assert!(record.core.active);
        assert!(record.core.uuid.is_some());
        assert_eq!(record.core.product_type, "IERS_B");
        assert!(record
            .core
            .remote_url
            .starts_with(&format!("{}/data/xml/", server.uri())));
    }
    assert_eq!(created[0].core.physical_name, "bulletinb-253.xml");
    assert_eq!(
        archive.latest_index("IERS_B").unwrap(),
        Some(BulletinIndex::number(255))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sync_passes_over_known_gap() {
    let server = MockServer::start().await;
    // (18, 5) is never published.
    mount_status(&server, "HEAD", "/data/xml/bulletina-xviii-006.xml", 200).await;
    mount_status(&server, "HEAD", "/data/xml/bulletina-xviii-007.xml", 200).await;

    let archive = MemoryArchive::with_records(vec![seed(&BulletinA, BulletinIndex::volume(18, 4))]);
    let (result, archive) = run_sync(
        config_for(&server),
        archive,
        SyncRequest::new([Family::A]),
    )
    .await;

    let report = result.unwrap();
    let family = &report.families[0];
    assert_eq!(family.skipped_gaps, vec![BulletinIndex::volume(18, 5)]);
    assert_eq!(
        family.created,
        vec![BulletinIndex::volume(18, 6), BulletinIndex::volume(18, 7)]
    );
    assert_eq!(family.stopped_at, BulletinIndex::volume(18, 8));
    assert!(archive
        .records()
        .iter()
        .all(|r| r.iers != BulletinIndex::volume(18, 5)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unexpected_status_aborts_the_run() {
    let server = MockServer::start().await;
    mount_status(&server, "HEAD", "/data/xml/bulletinb-253.xml", 200).await;
    mount_status(&server, "HEAD", "/data/xml/bulletinb-254.xml", 503).await;
    mount_status(&server, "HEAD", "/data/xml/bulletinc-036.xml", 200).await;

    let archive = MemoryArchive::with_records(vec![seed(&BulletinB, BulletinIndex::number(252))]);
    let (result, archive) = run_sync(
        config_for(&server),
        archive,
        SyncRequest::new([Family::B, Family::C]),
    )
    .await;

    let err = result.unwrap_err();
    assert!(
        matches!(err, HarvesterError::Transport { status: 503, .. }),
        "{err}"
    );
    // 253 was archived before the failure; family C was never started.
    assert_eq!(
        archive.latest_index("IERS_B").unwrap(),
        Some(BulletinIndex::number(253))
    );
    assert_eq!(archive.latest_index("IERS_C").unwrap(), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unsupported_options_send_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = SyncRequest {
        force: true,
        ..SyncRequest::new([Family::B])
    };
    let (result, archive) = run_sync(config_for(&server), MemoryArchive::new(), request).await;

    assert!(matches!(result, Err(HarvesterError::Unsupported(_))));
    assert!(archive.records().is_empty());
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Serve a fixture as text bulletin C number `number`.
async fn serve_bulletin_c(server: &MockServer, number: u32, fixture_name: &str) {
    let url_path = format!("/data/16/bulletinc-{number:03}.txt");
    mount_status(server, "HEAD", &url_path, 200).await;
    Mock::given(method("GET"))
        .and(path(url_path.as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(fs::read(fixture(fixture_name)).unwrap()),
        )
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_download_extracts_content_dates() {
    let server = MockServer::start().await;
    serve_bulletin_c(&server, 36, "bulletinc-069.txt").await;

    let dir = TempDir::new().unwrap();
    let config = config_for(&server)
        .with_encoding(Encoding::Text)
        .with_download_dir(dir.path());

    let (result, archive) =
        run_sync(config, MemoryArchive::new(), SyncRequest::new([Family::C])).await;

    // The fixture is issue 69 but served as 36: bulletin C has no issue
    // stamp check, so only the dates matter here.
    result.unwrap();
    let record = &archive.records()[0];
    assert_eq!(record.core.physical_name, "bulletinc-036.txt");
    assert_eq!(
        record.core.validity_start,
        chrono::NaiveDate::from_ymd_opt(2017, 1, 1)
    );
    assert!(record.core.creation_date.is_some());
    assert_eq!(
        record.core.size,
        Some(fs::metadata(fixture("bulletinc-069.txt")).unwrap().len())
    );
    assert!(dir.path().join("bulletinc-036.txt").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unparseable_download_aborts_by_default() {
    let server = MockServer::start().await;
    serve_bulletin_c(&server, 36, "bulletinc-070.txt").await;

    let dir = TempDir::new().unwrap();
    let config = config_for(&server)
        .with_encoding(Encoding::Text)
        .with_download_dir(dir.path());

    let (result, archive) =
        run_sync(config, MemoryArchive::new(), SyncRequest::new([Family::C])).await;

    assert!(result.unwrap_err().is_parse_error());
    assert!(archive.records().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unparseable_download_skipped_when_configured() {
    let server = MockServer::start().await;
    serve_bulletin_c(&server, 36, "bulletinc-070.txt").await;
    serve_bulletin_c(&server, 37, "bulletinc-069.txt").await;

    let dir = TempDir::new().unwrap();
    let config = config_for(&server)
        .with_encoding(Encoding::Text)
        .with_download_dir(dir.path())
        .with_parse_failure_policy(ParseFailurePolicy::Skip);

    let (result, archive) =
        run_sync(config, MemoryArchive::new(), SyncRequest::new([Family::C])).await;

    let report = result.unwrap();
    let family = &report.families[0];
    assert_eq!(family.skipped_unparseable, vec![BulletinIndex::number(36)]);
    assert_eq!(family.created, vec![BulletinIndex::number(37)]);
    assert_eq!(archive.records().len(), 1);
    assert!(!dir.path().join("bulletinc-036.txt").exists());
}

/// Catalog that finds a fixed number of documents and records probe times.
struct TimedCatalog {
    found: usize,
    probes: RefCell<Vec<Instant>>,
}

impl Catalog for &TimedCatalog {
    fn probe(&self, _url: &str) -> Result<Probe> {
        let mut probes = self.probes.borrow_mut();
        probes.push(Instant::now());
        if probes.len() <= self.found {
            Ok(Probe::Found { size: None })
        } else {
            Ok(Probe::NotFound)
        }
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        Err(HarvesterError::Unsupported(format!("fetch {url}")))
    }
}

fn probe_gaps(rate_limit: u32) -> Vec<Duration> {
    let registry = create_bulletin_registry();
    let catalog = TimedCatalog {
        found: 2,
        probes: RefCell::new(Vec::new()),
    };
    let config = SyncConfig::default().with_rate_limit(rate_limit);
    let synchronizer = Synchronizer::new(&registry, &catalog, config);

    synchronizer
        .run(&mut MemoryArchive::new(), &SyncRequest::new([Family::D]))
        .unwrap();

    let probes = catalog.probes.borrow();
    assert_eq!(probes.len(), 3);
    probes.windows(2).map(|w| w[1] - w[0]).collect()
}

#[test]
fn test_rate_limit_spaces_probes() {
    for gap in probe_gaps(120) {
        assert!(gap >= Duration::from_millis(500), "{gap:?}");
    }
}

#[test]
fn test_rate_limit_zero_disables_throttling() {
    for gap in probe_gaps(0) {
        assert!(gap < Duration::from_millis(250), "{gap:?}");
    }
}
