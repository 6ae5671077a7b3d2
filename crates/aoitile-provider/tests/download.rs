//! Download driver and HTTP provider tests.

use aoitile_grid::{tile, AreaOfInterest, ErrorKind, Tile, TileSpec, TileTemplate};
use aoitile_provider::{
    download_tiles, part_path, DownloadMode, ExportParams, HttpProvider, HttpProviderConfig,
    ImageryProvider, ProviderError, TileRequest,
};
use std::cell::RefCell;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Four tiles in a 2x2 grid over a 0.15 degree box.
fn two_by_two() -> Vec<Tile> {
    let aoi = AreaOfInterest::from_vertices(
        "box",
        &[[90.0, 23.0], [90.15, 23.0], [90.15, 23.15], [90.0, 23.15]],
    )
    .unwrap();
    let tiles = tile(&aoi, &TileSpec::square(11.132, 0.0).unwrap()).unwrap();
    assert_eq!(tiles.len(), 4);
    tiles
}

/// Writes a small file per request and records the tiles asked for.
#[derive(Default)]
struct MockProvider {
    fail_on: Option<(u32, u32)>,
    calls: RefCell<Vec<(u32, u32)>>,
}

impl ImageryProvider for MockProvider {
    fn fetch(&self, request: &TileRequest, dest: &Path) -> aoitile_provider::Result<u64> {
        self.calls.borrow_mut().push((request.row, request.col));
        if self.fail_on == Some((request.row, request.col)) {
            return Err(ProviderError::EmptyResult {
                row: request.row,
                col: request.col,
            });
        }
        let body = format!("tile {} {}", request.row, request.col);
        std::fs::write(dest, &body)?;
        Ok(body.len() as u64)
    }
}

#[test]
fn test_download_all_writes_every_tile() {
    let dir = tempfile::tempdir().unwrap();
    let template = TileTemplate::from_base(dir.path().join("s2.tif"));
    let tiles = two_by_two();
    let provider = MockProvider::default();

    let report = download_tiles(
        &provider,
        &tiles,
        &template,
        &ExportParams::default(),
        DownloadMode::All,
    )
    .unwrap();

    assert_eq!(report.expected, 4);
    assert_eq!(report.downloaded, 4);
    assert_eq!(report.skipped, 0);
    assert_eq!(*provider.calls.borrow(), vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    for t in &tiles {
        assert!(template.path_for(t).is_file());
    }
    assert!(dir.path().join("s2_r01_c00.tif").is_file());
}

#[test]
fn test_missing_only_fetches_gaps() {
    let dir = tempfile::tempdir().unwrap();
    let template = TileTemplate::from_base(dir.path().join("s2.tif"));
    let tiles = two_by_two();
    for key in [(0, 0), (0, 1), (1, 1)] {
        std::fs::write(template.path(key.0, key.1), b"existing").unwrap();
    }
    let provider = MockProvider::default();

    let report = download_tiles(
        &provider,
        &tiles,
        &template,
        &ExportParams::default(),
        DownloadMode::MissingOnly,
    )
    .unwrap();

    assert_eq!(report.skipped, 3);
    assert_eq!(report.downloaded, 1);
    assert_eq!(*provider.calls.borrow(), vec![(1, 0)]);
    assert_eq!(std::fs::read(template.path(0, 0)).unwrap(), b"existing");
}

#[test]
fn test_missing_only_with_complete_set_does_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let template = TileTemplate::from_base(dir.path().join("s2.tif"));
    let tiles = two_by_two();
    for t in &tiles {
        std::fs::write(template.path_for(t), b"x").unwrap();
    }
    let provider = MockProvider::default();

    let report = download_tiles(
        &provider,
        &tiles,
        &template,
        &ExportParams::default(),
        DownloadMode::MissingOnly,
    )
    .unwrap();

    assert_eq!(report.downloaded, 0);
    assert_eq!(report.skipped, 4);
    assert!(provider.calls.borrow().is_empty());
}

#[test]
fn test_failure_stops_run_and_keeps_earlier_tiles() {
    let dir = tempfile::tempdir().unwrap();
    let template = TileTemplate::from_base(dir.path().join("s2.tif"));
    let tiles = two_by_two();
    let provider = MockProvider {
        fail_on: Some((0, 1)),
        ..Default::default()
    };

    let err = download_tiles(
        &provider,
        &tiles,
        &template,
        &ExportParams::default(),
        DownloadMode::All,
    )
    .unwrap_err();

    assert_eq!(err.completed(), Some(1));
    assert_eq!(err.kind(), ErrorKind::Provider);
    assert!(err.to_string().contains("row=0 col=1"));
    assert_eq!(provider.calls.borrow().len(), 2);
    assert!(template.path(0, 0).is_file());
    assert!(!template.path(0, 1).exists());
    assert!(!template.path(1, 0).exists());
}

#[test]
fn test_empty_tile_list_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let template = TileTemplate::from_base(dir.path().join("s2.tif"));
    let err = download_tiles(
        &MockProvider::default(),
        &[],
        &template,
        &ExportParams::default(),
        DownloadMode::All,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

/// Serve one canned response per connection and report each request line.
fn serve(responses: Vec<(u16, Vec<u8>)>) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut headers = Vec::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                headers.push(line.trim_end().to_string());
            }
            let auth = headers
                .iter()
                .find(|h| h.to_ascii_lowercase().starts_with("authorization:"))
                .cloned()
                .unwrap_or_default();
            tx.send(format!("{} | {}", request_line.trim_end(), auth)).unwrap();

            let head = format!(
                "HTTP/1.1 {status} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
            stream.flush().unwrap();
        }
    });

    (format!("http://{addr}"), rx)
}

fn provider(base: &str, token: Option<&str>) -> HttpProvider {
    let mut config = HttpProviderConfig::new(format!(
        "{base}/export?bbox={{lon_min}},{{lat_min}},{{lon_max}},{{lat_max}}&tile=r{{row}}c{{col}}&crs={{crs}}"
    ));
    config.token = token.map(str::to_string);
    config.timeout = Duration::from_secs(10);
    config.use_env_proxy = false;
    HttpProvider::new(config).unwrap()
}

fn first_request(tiles: &[Tile]) -> TileRequest {
    TileRequest::new(&tiles[0], &ExportParams::default())
}

#[test]
fn test_http_success_writes_file() {
    let (base, rx) = serve(vec![(200, b"GEOTIFF-BYTES".to_vec())]);
    let provider = provider(&base, Some("secret"));
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("nested").join("s2_r00_c00.tif");
    let tiles = two_by_two();

    let bytes = provider.fetch(&first_request(&tiles), &dest).unwrap();

    assert_eq!(bytes, 13);
    assert_eq!(std::fs::read(&dest).unwrap(), b"GEOTIFF-BYTES");
    assert!(!part_path(&dest).exists());
    let stats = provider.download_stats();
    assert_eq!(stats.tiles_downloaded, 1);
    assert_eq!(stats.bytes_downloaded, 13);

    let seen = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(seen.starts_with("GET /export?bbox=90,23,"), "{seen}");
    assert!(seen.contains("tile=r0c0"), "{seen}");
    assert!(seen.contains("crs=EPSG:4326"), "{seen}");
    assert!(seen.contains("Bearer secret"), "{seen}");
}

#[test]
fn test_http_not_found_is_empty_result() {
    let (base, _rx) = serve(vec![(404, Vec::new())]);
    let provider = provider(&base, None);
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("s2_r00_c00.tif");

    let err = provider.fetch(&first_request(&two_by_two()), &dest).unwrap_err();

    assert!(matches!(err, ProviderError::EmptyResult { row: 0, col: 0 }));
    assert_eq!(err.kind(), ErrorKind::Provider);
    assert!(!dest.exists());
    assert!(!part_path(&dest).exists());
    assert_eq!(provider.download_stats().tiles_downloaded, 0);
}

#[test]
fn test_http_server_error_is_status() {
    let (base, _rx) = serve(vec![(500, b"boom".to_vec())]);
    let provider = provider(&base, None);
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("s2_r00_c00.tif");

    let err = provider.fetch(&first_request(&two_by_two()), &dest).unwrap_err();

    assert!(matches!(err, ProviderError::Status { status: 500, .. }));
    assert!(!dest.exists());
}

#[test]
fn test_http_empty_body_is_empty_result() {
    let (base, _rx) = serve(vec![(200, Vec::new())]);
    let provider = provider(&base, None);
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("s2_r00_c00.tif");

    let err = provider.fetch(&first_request(&two_by_two()), &dest).unwrap_err();

    assert!(matches!(err, ProviderError::EmptyResult { .. }));
    assert!(!dest.exists());
    assert!(!part_path(&dest).exists());
}

#[test]
fn test_unknown_placeholder_is_configuration_error() {
    let err = HttpProvider::new(HttpProviderConfig::new("http://host/{zoom}/{row}.tif")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}
