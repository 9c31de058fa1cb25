use std::sync::Mutex;
use std::time::Duration;

use assert_matches::assert_matches;

use chart_gallery::app::{App, ManifestState, Resolution};
use chart_gallery::config::{ResolvedConfig, SourceConfig, StoreSettings};
use chart_gallery::domain::{GalleryMode, Threshold};
use chart_gallery::error::GalleryError;
use chart_gallery::output::JsonOutput;
use chart_gallery::selection::Selection;
use chart_gallery::store::{FileMap, FileStore};

const HEXBIN_MANIFEST: &str = "a_vsb_filter_c_bin_ge_0.png\na_vsb_filter_c_bin_ge_1.png\n";

#[derive(Default)]
struct MockStore {
    manifest: Option<&'static str>,
    listing: Option<Vec<(&'static str, &'static str)>>,
    broken_ids: Vec<&'static str>,
    list_calls: Mutex<usize>,
    fetch_calls: Mutex<Vec<String>>,
}

impl FileStore for MockStore {
    fn list(&self, _folder: &str) -> Result<FileMap, GalleryError> {
        *self.list_calls.lock().unwrap() += 1;
        match &self.listing {
            Some(files) => Ok(files
                .iter()
                .map(|(name, id)| (name.to_string(), id.to_string()))
                .collect()),
            None => Err(GalleryError::StoreStatus {
                status: 500,
                message: "backend error".to_string(),
            }),
        }
    }

    fn fetch(&self, id: &str) -> Result<Vec<u8>, GalleryError> {
        self.fetch_calls.lock().unwrap().push(id.to_string());
        if id == "hexbin-manifest" {
            return self
                .manifest
                .map(|text| text.as_bytes().to_vec())
                .ok_or_else(|| GalleryError::StoreHttp("manifest missing".to_string()));
        }
        if self.broken_ids.contains(&id) {
            return Err(GalleryError::StoreHttp("connection reset".to_string()));
        }
        Ok(format!("png:{id}").into_bytes())
    }
}

fn config() -> ResolvedConfig {
    ResolvedConfig {
        schema_version: 1,
        cache_ttl: Duration::from_secs(3600),
        store: StoreSettings::Directory {
            root: "unused".into(),
        },
        hexbin: SourceConfig {
            manifest: "hexbin-manifest".to_string(),
            folder: "hexbin-folder".to_string(),
        },
        ratio: SourceConfig {
            manifest: "ratio-manifest".to_string(),
            folder: "ratio-folder".to_string(),
        },
    }
}

fn selection(threshold: u8) -> Selection {
    Selection::new("a", "b", "c", Threshold::new(threshold).unwrap())
}

#[test]
fn resolves_listed_file_and_fetches_by_id() {
    let store = MockStore {
        manifest: Some(HEXBIN_MANIFEST),
        listing: Some(vec![("a_vsb_filter_c_bin_ge_1.png", "id-1")]),
        ..MockStore::default()
    };
    let app = App::new(store, config());

    let resolution = app.resolve(GalleryMode::Hexbin, &selection(1), &JsonOutput);
    assert_matches!(
        &resolution,
        Resolution::Found { filename, file_id, bytes }
            if filename == "a_vsb_filter_c_bin_ge_1.png"
                && file_id == "id-1"
                && bytes.as_slice() == b"png:id-1"
    );
    assert_eq!(resolution.status(), "found");
    assert!(resolution.message().is_none());
}

#[test]
fn unlisted_filename_is_not_found_without_fetching() {
    let store = MockStore {
        listing: Some(vec![("a_vsb_filter_c_bin_ge_1.png", "id-1")]),
        ..MockStore::default()
    };
    let app = App::new(store, config());

    let resolution = app.resolve(GalleryMode::Ratio, &selection(1), &JsonOutput);
    assert_matches!(&resolution, Resolution::NotFound { notice: None, .. });
    assert_eq!(
        resolution.message().as_deref(),
        Some("Graph not found. Looking for: a_vsb_filter_c_bin_ge_1_ratio.png")
    );
}

#[test]
fn download_error_is_reported_not_raised() {
    let store = MockStore {
        listing: Some(vec![("a_vsb_filter_c_bin_ge_0.png", "bad")]),
        broken_ids: vec!["bad"],
        ..MockStore::default()
    };
    let app = App::new(store, config());

    let resolution = app.resolve(GalleryMode::Hexbin, &selection(0), &JsonOutput);
    assert_matches!(&resolution, Resolution::FetchFailed { file_id, .. } if file_id == "bad");
    let message = resolution.message().unwrap();
    assert!(message.starts_with("Error downloading image: "), "{message}");
    assert!(message.contains("connection reset"));
}

#[test]
fn listing_failure_degrades_to_not_found_with_notice() {
    let app = App::new(MockStore::default(), config());

    let listing = app.file_listing(GalleryMode::Hexbin, &JsonOutput);
    assert!(listing.files.is_empty());
    assert!(listing.notice.unwrap().starts_with("Error listing files: "));

    let resolution = app.resolve(GalleryMode::Hexbin, &selection(0), &JsonOutput);
    assert_matches!(resolution, Resolution::NotFound { notice: Some(_), .. });
}

#[test]
fn listings_are_cached_until_invalidated() {
    let store = MockStore {
        listing: Some(vec![]),
        ..MockStore::default()
    };
    let app = App::new(store, config());

    app.resolve(GalleryMode::Hexbin, &selection(0), &JsonOutput);
    app.resolve(GalleryMode::Hexbin, &selection(1), &JsonOutput);
    app.file_listing(GalleryMode::Hexbin, &JsonOutput);
    app.invalidate();
    app.file_listing(GalleryMode::Hexbin, &JsonOutput);

    let calls = app_list_calls(&app);
    assert_eq!(calls, 2);
}

#[test]
fn failed_listing_is_retried_on_next_access() {
    let app = App::new(MockStore::default(), config());
    app.file_listing(GalleryMode::Hexbin, &JsonOutput);
    app.file_listing(GalleryMode::Hexbin, &JsonOutput);
    assert_eq!(app_list_calls(&app), 2);
}

#[test]
fn manifest_is_parsed_once() {
    let store = MockStore {
        manifest: Some(HEXBIN_MANIFEST),
        ..MockStore::default()
    };
    let app = App::new(store, config());

    let first = app.manifest(GalleryMode::Hexbin, &JsonOutput);
    let second = app.manifest(GalleryMode::Hexbin, &JsonOutput);
    let table = first.table().unwrap();
    assert_eq!(table.filter_options("a", "b"), vec!["c"]);
    assert!(second.error_message().is_none());

    let fetches = app_fetch_calls(&app);
    assert_eq!(fetches, vec!["hexbin-manifest".to_string()]);
}

#[test]
fn unreadable_and_unparseable_manifests_differ() {
    let app = App::new(MockStore::default(), config());
    let state = app.manifest(GalleryMode::Hexbin, &JsonOutput);
    assert_matches!(&state, ManifestState::Unavailable(_));
    assert!(
        state
            .error_message()
            .unwrap()
            .starts_with("Could not load manifest 'hexbin-manifest'")
    );

    let store = MockStore {
        manifest: Some("not-a-chart.txt\n"),
        ..MockStore::default()
    };
    let app = App::new(store, config());
    let state = app.manifest(GalleryMode::Hexbin, &JsonOutput);
    assert_matches!(&state, ManifestState::Empty(_));
    assert_eq!(
        state.error_message(),
        Some("Manifest 'hexbin-manifest' was found but could not parse data")
    );
}

#[test]
fn modes_report_configured_sources() {
    let app = App::new(MockStore::default(), config());
    let modes = app.modes();
    assert_eq!(modes.len(), 2);
    assert_eq!(modes[0].mode, GalleryMode::Hexbin);
    assert_eq!(modes[1].folder, "ratio-folder");
}

fn app_list_calls(app: &App<MockStore>) -> usize {
    *app.store().list_calls.lock().unwrap()
}

fn app_fetch_calls(app: &App<MockStore>) -> Vec<String> {
    app.store().fetch_calls.lock().unwrap().clone()
}
