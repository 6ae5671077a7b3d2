//! NDVI, CIgreen and clipping on generated GeoTIFFs.

use aoitile_grid::{AreaOfInterest, ErrorKind};
use aoitile_index::{cigreen, clip, ndvi, BandRef, IndexError, DEFAULT_NIR_BAND, DEFAULT_RED_BAND};
use aoitile_raster::{write_raster, GeoKeys, GeoTransform, RasterInfo, RasterReader, SampleType};
use approx::assert_relative_eq;
use std::path::Path;

fn info(width: u32, height: u32, bands: u16, sample_type: SampleType, nodata: Option<f64>) -> RasterInfo {
    RasterInfo {
        width,
        height,
        bands,
        sample_type,
        transform: GeoTransform::new(90.0, 24.0, 0.1, 0.1),
        nodata,
        geokeys: Some(GeoKeys::for_epsg(4326)),
    }
}

/// 10x10 float raster whose pixel (row, col) holds `row * 10 + col`.
fn ramp(path: &Path, epsg: u16) {
    let mut meta = info(10, 10, 1, SampleType::F32, None);
    meta.geokeys = Some(GeoKeys::for_epsg(epsg));
    let values: Vec<f64> = (0..100).map(f64::from).collect();
    write_raster(path, &meta, &values).unwrap();
}

#[test]
fn test_ndvi_from_composite() {
    let dir = tempfile::tempdir().unwrap();
    let composite = dir.path().join("s2_8band.tif");
    let out = dir.path().join("out").join("ndvi.tif");

    // Per pixel (red, nir); 65535 is nodata
    let pixels = [(1000.0, 5000.0), (0.0, 0.0), (500.0, 500.0), (65535.0, 3000.0)];
    let mut values = Vec::new();
    for (red, nir) in pixels {
        for band in 1..=8u16 {
            values.push(match band {
                DEFAULT_RED_BAND => red,
                DEFAULT_NIR_BAND => nir,
                _ => 1.0,
            });
        }
    }
    write_raster(&composite, &info(2, 2, 8, SampleType::U16, Some(65535.0)), &values).unwrap();

    let summary = ndvi(
        &BandRef::new(&composite, DEFAULT_RED_BAND),
        &BandRef::new(&composite, DEFAULT_NIR_BAND),
        &out,
    )
    .unwrap();

    assert_eq!(summary.valid, 2);
    assert_relative_eq!(summary.min.unwrap(), 0.0);
    assert_relative_eq!(summary.max.unwrap(), 0.6667, epsilon = 1e-4);

    let mut reader = RasterReader::open(&out).unwrap();
    let written = reader.info().clone();
    assert_eq!(written.bands, 1);
    assert_eq!(written.sample_type, SampleType::F32);
    assert!(written.nodata.unwrap().is_nan());
    assert_eq!(written.epsg(), Some(4326));
    let ndvi = reader.read_f64().unwrap();
    assert_relative_eq!(ndvi[0], 0.6667, epsilon = 1e-4);
    assert!(ndvi[1].is_nan());
    assert_relative_eq!(ndvi[2], 0.0);
    assert!(ndvi[3].is_nan());
}

#[test]
fn test_cigreen_from_separate_bands() {
    let dir = tempfile::tempdir().unwrap();
    let green = dir.path().join("S2_20240115_B03_10m.tif");
    let nir = dir.path().join("S2_20240115_B08_10m.tif");
    let out = dir.path().join("cigreen.tif");
    write_raster(&green, &info(2, 1, 1, SampleType::U16, None), &[1000.0, 0.0]).unwrap();
    write_raster(&nir, &info(2, 1, 1, SampleType::U16, None), &[4000.0, 4000.0]).unwrap();

    let summary = cigreen(&BandRef::new(&green, 1), &BandRef::new(&nir, 1), 1.0 / 10_000.0, &out).unwrap();

    assert_eq!(summary.valid, 1);
    let values = RasterReader::open(&out).unwrap().read_f64().unwrap();
    assert_relative_eq!(values[0], 3.0, epsilon = 1e-6);
    assert!(values[1].is_nan());
}

#[test]
fn test_misaligned_inputs_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let red = dir.path().join("red.tif");
    let nir = dir.path().join("nir.tif");
    let out = dir.path().join("ndvi.tif");
    write_raster(&red, &info(2, 2, 1, SampleType::U16, None), &[1.0; 4]).unwrap();
    let mut shifted = info(2, 2, 1, SampleType::U16, None);
    shifted.transform = GeoTransform::new(90.05, 24.0, 0.1, 0.1);
    write_raster(&nir, &shifted, &[1.0; 4]).unwrap();

    let err = ndvi(&BandRef::new(&red, 1), &BandRef::new(&nir, 1), &out).unwrap_err();

    assert!(matches!(err, IndexError::Misaligned { .. }));
    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert!(err.to_string().contains("align them first"));
    assert!(!out.exists());
}

#[test]
fn test_band_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    let red = dir.path().join("red.tif");
    write_raster(&red, &info(2, 2, 1, SampleType::U16, None), &[1.0; 4]).unwrap();

    let err = ndvi(&BandRef::new(&red, 1), &BandRef::new(&red, 7), dir.path().join("x.tif")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_clip_masks_outside_triangle() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ramp.tif");
    let out = dir.path().join("clipped.tif");
    ramp(&input, 4326);

    // Lower-left triangle; pixel centres with col <= row are inside
    let aoi = AreaOfInterest::from_vertices("tri", &[[90.0, 23.0], [91.02, 23.0], [90.0, 24.02]]).unwrap();
    let report = clip(&input, &aoi, &out).unwrap();

    assert_eq!((report.width, report.height), (10, 10));
    assert_eq!(report.masked, 45);
    assert!(report.nodata.is_nan());

    let mut reader = RasterReader::open(&out).unwrap();
    assert!(reader.info().nodata.unwrap().is_nan());
    let values = reader.read_f64().unwrap();
    for row in 0..10 {
        for col in 0..10 {
            let v = values[row * 10 + col];
            if col <= row {
                assert_eq!(v, (row * 10 + col) as f64, "pixel ({row}, {col})");
            } else {
                assert!(v.is_nan(), "pixel ({row}, {col})");
            }
        }
    }
}

#[test]
fn test_clip_crops_to_aoi_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ramp.tif");
    let out = dir.path().join("clipped.tif");
    ramp(&input, 4326);

    let aoi = AreaOfInterest::from_vertices(
        "square",
        &[[90.2, 23.2], [90.5, 23.2], [90.5, 23.5], [90.2, 23.5]],
    )
    .unwrap();
    let report = clip(&input, &aoi, &out).unwrap();

    assert_eq!((report.width, report.height), (3, 3));
    assert_eq!(report.masked, 0);
    let mut reader = RasterReader::open(&out).unwrap();
    assert_relative_eq!(reader.info().transform.origin_x, 90.2, epsilon = 1e-9);
    assert_relative_eq!(reader.info().transform.origin_y, 23.5, epsilon = 1e-9);
    assert_eq!(
        reader.read_f64().unwrap(),
        vec![52.0, 53.0, 54.0, 62.0, 63.0, 64.0, 72.0, 73.0, 74.0]
    );
}

#[test]
fn test_clip_without_overlap_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ramp.tif");
    ramp(&input, 4326);
    let aoi = AreaOfInterest::from_vertices("far", &[[10.0, 10.0], [11.0, 10.0], [11.0, 11.0]]).unwrap();

    let err = clip(&input, &aoi, dir.path().join("out.tif")).unwrap_err();
    assert!(matches!(err, IndexError::NoOverlap(_)));
    assert_eq!(err.kind(), ErrorKind::Precondition);
}

#[test]
fn test_clip_unsupported_crs_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("mercator.tif");
    ramp(&input, 3857);

    let err = clip(&input, &AreaOfInterest::brahmanbaria(), dir.path().join("out.tif")).unwrap_err();
    assert!(matches!(err, IndexError::UnsupportedCrs { .. }));
    assert!(err.to_string().contains("EPSG:3857"));
}
