//! End-to-end pipeline scenarios against fake network backends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cartopress::cache::CacheKind;
use cartopress::error::{FetchError, PosterError, ResolutionError, ThemeError};
use cartopress::net::{FeatureSource, GeocodeBackend, GeocodedPlace};
use cartopress::pipeline::{PipelineConfig, PosterPipeline, PosterRequest};
use cartopress::{LatLng, OutputFormat, PlaceQuery, RenderSpec};

/// Geocoder that knows exactly one place: Venice, Italy.
struct VeniceGeocoder {
    calls: AtomicUsize,
}

impl VeniceGeocoder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

impl GeocodeBackend for VeniceGeocoder {
    fn lookup(&self, query: &str) -> Result<Option<GeocodedPlace>, ResolutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if query.contains("venice") {
            Ok(Some(GeocodedPlace {
                coordinate: LatLng::new(45.4408, 12.3155),
                display_name: "Venezia, Italia".into(),
            }))
        } else {
            Ok(None)
        }
    }
}

/// Feature source serving a small but realistic Venice extract.
struct VeniceFeatures {
    calls: AtomicUsize,
}

impl VeniceFeatures {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

impl FeatureSource for VeniceFeatures {
    fn fetch_layer(
        &self,
        kind: CacheKind,
        _center: LatLng,
        _radius_m: u32,
    ) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let payload = match kind {
            CacheKind::StreetGraph => serde_json::json!({
                "elements": [
                    {
                        "type": "way", "id": 1,
                        "tags": {"highway": "primary"},
                        "geometry": [
                            {"lat": 45.437, "lon": 12.305},
                            {"lat": 45.441, "lon": 12.321},
                            {"lat": 45.445, "lon": 12.334}
                        ]
                    },
                    {
                        "type": "way", "id": 2,
                        "tags": {"highway": "residential"},
                        "geometry": [
                            {"lat": 45.439, "lon": 12.318},
                            {"lat": 45.436, "lon": 12.326}
                        ]
                    }
                ]
            }),
            CacheKind::Water => serde_json::json!({
                "elements": [
                    {
                        "type": "way", "id": 3,
                        "tags": {"natural": "water"},
                        "geometry": [
                            {"lat": 45.425, "lon": 12.295},
                            {"lat": 45.425, "lon": 12.345},
                            {"lat": 45.433, "lon": 12.345},
                            {"lat": 45.433, "lon": 12.295},
                            {"lat": 45.425, "lon": 12.295}
                        ]
                    }
                ]
            }),
            CacheKind::Parks => serde_json::json!({"elements": []}),
            CacheKind::Geocode => unreachable!(),
        };
        Ok(payload.to_string().into_bytes())
    }
}

struct Harness {
    pipeline: PosterPipeline,
    geocoder: Arc<VeniceGeocoder>,
    features: Arc<VeniceFeatures>,
    _dirs: tempfile::TempDir,
}

fn harness() -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();
    let dirs = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        cache_dir: dirs.path().join("cache"),
        themes_dir: "themes".into(),
        output_dir: dirs.path().join("posters"),
    };
    let geocoder = VeniceGeocoder::new();
    let features = VeniceFeatures::new();
    let pipeline =
        PosterPipeline::with_backends(config, geocoder.clone(), features.clone()).unwrap();
    Harness {
        pipeline,
        geocoder,
        features,
        _dirs: dirs,
    }
}

fn venice_request(theme: &str) -> PosterRequest {
    PosterRequest::new(PlaceQuery::new("Venice", "Italy").unwrap(), theme)
        .with_radius(3000)
        .with_spec(RenderSpec::new(600, 800, OutputFormat::Png))
}

#[test]
fn venice_noir_scenario_produces_named_png() {
    let h = harness();
    let artifact = h.pipeline.generate(&venice_request("noir")).unwrap();

    assert!((artifact.location.coordinate.lat - 45.4408).abs() < 1e-6);
    assert!((artifact.location.coordinate.lon - 12.3155).abs() < 1e-6);

    let filename = artifact.path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(
        filename.starts_with("venice_noir_") && filename.ends_with(".png"),
        "unexpected filename {filename}"
    );

    let bytes = std::fs::read(&artifact.path).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn svg_output_orders_water_below_roads() {
    let h = harness();
    let request = venice_request("feature_based")
        .with_spec(RenderSpec::new(600, 800, OutputFormat::Svg));
    let artifact = h.pipeline.generate(&request).unwrap();

    let svg = std::fs::read_to_string(&artifact.path).unwrap();
    let water_at = svg.find("#C0C0C0").expect("water layer missing");
    let roads_at = svg.find("#1A1A1A").expect("primary roads missing");
    assert!(water_at < roads_at, "water must be drawn below roads");
    assert!(svg.contains("V  E  N  I  C  E"));
    assert!(svg.contains("45.4408° N / 12.3155° E"));
}

#[test]
fn warm_cache_skips_all_external_calls() {
    let h = harness();
    h.pipeline.generate(&venice_request("noir")).unwrap();
    let geocode_calls = h.geocoder.calls.load(Ordering::SeqCst);
    let feature_calls = h.features.calls.load(Ordering::SeqCst);
    assert_eq!(geocode_calls, 1);
    assert_eq!(feature_calls, 3);

    // Second run with identical inputs: everything from cache.
    h.pipeline.generate(&venice_request("noir")).unwrap();
    assert_eq!(h.geocoder.calls.load(Ordering::SeqCst), geocode_calls);
    assert_eq!(h.features.calls.load(Ordering::SeqCst), feature_calls);
}

#[test]
fn unknown_place_fails_before_any_feature_fetch() {
    let h = harness();
    let request = PosterRequest::new(
        PlaceQuery::new("Nowhere12345", "Nonexistentland").unwrap(),
        "noir",
    )
    .with_radius(3000);

    match h.pipeline.generate(&request) {
        Err(PosterError::Resolution(ResolutionError::NotFound(_))) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert_eq!(h.features.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn unknown_theme_fails_before_any_network_cost() {
    let h = harness();
    match h.pipeline.generate(&venice_request("not_a_theme")) {
        Err(PosterError::Theme(ThemeError::NotFound(name))) => assert_eq!(name, "not_a_theme"),
        other => panic!("expected ThemeError::NotFound, got {other:?}"),
    }
    assert_eq!(h.geocoder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.features.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn explicit_coordinate_override_bypasses_geocoding() {
    let h = harness();
    let place = PlaceQuery::new("Venice", "Italy")
        .unwrap()
        .with_coordinate(LatLng::new(45.4408, 12.3155))
        .unwrap();
    let request = PosterRequest::new(place, "noir")
        .with_radius(3000)
        .with_spec(RenderSpec::new(600, 800, OutputFormat::Svg));

    h.pipeline.generate(&request).unwrap();
    assert_eq!(h.geocoder.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn progress_reports_are_monotone_and_reach_completion() {
    let h = harness();
    let seen: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    let sink = move |percent: u8, _message: &str| {
        sink_seen.lock().unwrap().push(percent);
    };

    h.pipeline
        .generate_with_progress(&venice_request("noir"), &sink)
        .unwrap();

    let seen = seen.lock().unwrap();
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "progress not monotone: {seen:?}");
    assert_eq!(seen.first(), Some(&5));
    assert_eq!(seen.last(), Some(&100));
}

#[test]
fn invalid_radius_is_rejected_up_front() {
    let h = harness();
    let request = venice_request("noir").with_radius(100);
    assert!(matches!(
        h.pipeline.generate(&request),
        Err(PosterError::InvalidRequest(_))
    ));
    assert_eq!(h.geocoder.calls.load(Ordering::SeqCst), 0);
}

mod service_mode {
    use super::*;
    use cartopress::jobs::{JobManager, JobManagerConfig, JobState};
    use std::time::{Duration, Instant};

    fn wait_terminal(
        manager: &JobManager,
        id: &cartopress::JobId,
    ) -> cartopress::Job {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let job = manager.status(id).expect("job must stay queryable");
            if job.state.is_terminal() {
                return job;
            }
            assert!(Instant::now() < deadline, "job never finished");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn submitted_job_runs_the_real_pipeline_to_completion() {
        let h = harness();
        let manager = JobManager::new(Arc::new(h.pipeline), JobManagerConfig::default());

        let submitted = manager.submit(venice_request("terracotta"));
        assert_eq!(submitted.state, JobState::Queued);

        let job = wait_terminal(&manager, &submitted.id);
        assert_eq!(job.state, JobState::Completed);
        let path = job.artifact.expect("completed job carries an artifact");
        assert!(path.exists(), "artifact must be resolvable on disk");
    }

    #[test]
    fn failing_job_reports_error_kind_not_a_panic() {
        let h = harness();
        let manager = JobManager::new(Arc::new(h.pipeline), JobManagerConfig::default());

        let id = manager.submit(venice_request("not_a_theme")).id;
        let job = wait_terminal(&manager, &id);
        assert_eq!(job.state, JobState::Failed);
        assert_eq!(job.error_kind, Some("theme_not_found"));
        assert!(job.artifact.is_none());
    }
}
