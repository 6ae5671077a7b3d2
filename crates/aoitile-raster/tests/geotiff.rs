//! Round trips through files produced by `RasterWriter`.

use aoitile_raster::{
    write_raster, ByteOrder, GeoKeys, GeoTransform, RasterError, RasterInfo, RasterReader,
    RasterWriter, SampleType, Window,
};
use approx::assert_relative_eq;

fn info(width: u32, height: u32, bands: u16, sample_type: SampleType, nodata: Option<f64>) -> RasterInfo {
    RasterInfo {
        width,
        height,
        bands,
        sample_type,
        transform: GeoTransform::new(90.5, 24.5, 0.001, 0.001),
        nodata,
        geokeys: Some(GeoKeys::for_epsg(4326)),
    }
}

#[test]
fn test_metadata_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("meta.tif");
    let expected = info(7, 5, 1, SampleType::F32, Some(-9999.0));
    let values: Vec<f64> = (0..35).map(f64::from).collect();
    write_raster(&path, &expected, &values).unwrap();

    let read = RasterInfo::read(&path).unwrap();
    assert_eq!(read.width, 7);
    assert_eq!(read.height, 5);
    assert_eq!(read.bands, 1);
    assert_eq!(read.sample_type, SampleType::F32);
    assert_eq!(read.nodata, Some(-9999.0));
    assert_eq!(read.epsg(), Some(4326));
    assert!(read.same_crs(&expected));
    assert_relative_eq!(read.transform.origin_x, 90.5);
    assert_relative_eq!(read.transform.origin_y, 24.5);
    assert_relative_eq!(read.transform.pixel_width, 0.001);
    assert_relative_eq!(read.transform.pixel_height, 0.001);

    let b = read.bounds();
    assert_relative_eq!(b.max_x, 90.507, epsilon = 1e-9);
    assert_relative_eq!(b.min_y, 24.495, epsilon = 1e-9);
}

#[test]
fn test_pixels_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pixels.tif");
    let meta = info(6, 4, 1, SampleType::I16, None);
    let values: Vec<f64> = (0..24).map(|v| f64::from(v) * 10.0 - 100.0).collect();
    write_raster(&path, &meta, &values).unwrap();

    let mut reader = RasterReader::open(&path).unwrap();
    assert_eq!(reader.read_f64().unwrap(), values);
}

#[test]
fn test_multiband_read_band() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bands.tif");
    let meta = info(3, 2, 3, SampleType::U16, None);
    // Band b of pixel p holds 100 * b + p
    let mut values = Vec::new();
    for p in 0..6 {
        for b in 1..=3 {
            values.push(f64::from(100 * b + p));
        }
    }
    write_raster(&path, &meta, &values).unwrap();

    let mut reader = RasterReader::open(&path).unwrap();
    assert_eq!(reader.info().bands, 3);
    assert_eq!(
        reader.read_band(2).unwrap(),
        vec![200.0, 201.0, 202.0, 203.0, 204.0, 205.0]
    );
    assert!(matches!(
        reader.read_band(4),
        Err(RasterError::BandOutOfRange { band: 4, bands: 3 })
    ));
}

#[test]
fn test_created_raster_is_prefilled_with_nodata() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.tif");
    let meta = info(5, 5, 2, SampleType::I16, Some(-1.0));
    RasterWriter::create(&path, &meta).unwrap().finish().unwrap();

    let mut reader = RasterReader::open(&path).unwrap();
    let values = reader.read_f64().unwrap();
    assert_eq!(values.len(), 50);
    assert!(values.iter().all(|&v| v == -1.0));
}

#[test]
fn test_window_write_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("window.tif");
    let meta = info(4, 4, 1, SampleType::U8, None);
    RasterWriter::create(&path, &meta).unwrap().finish().unwrap();

    let mut writer = RasterWriter::open(&path).unwrap();
    writer
        .write_window(Window::new(1, 2, 2, 2), &[1, 2, 3, 4])
        .unwrap();
    writer.finish().unwrap();

    let mut reader = RasterReader::open(&path).unwrap();
    let values = reader.read_f64().unwrap();
    #[rustfmt::skip]
    let expected = vec![
        0.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 2.0, 0.0,
        0.0, 3.0, 4.0, 0.0,
    ];
    assert_eq!(values, expected);
}

#[test]
fn test_window_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("errors.tif");
    let meta = info(4, 4, 1, SampleType::U8, None);
    let mut writer = RasterWriter::create(&path, &meta).unwrap();

    let err = writer.write_window(Window::new(3, 0, 2, 1), &[0, 0]).unwrap_err();
    assert!(matches!(err, RasterError::WindowOutOfBounds { .. }));

    let err = writer.write_window(Window::new(0, 0, 2, 2), &[0, 0, 0]).unwrap_err();
    assert!(matches!(err, RasterError::BufferSize { expected: 4, actual: 3 }));
}

#[test]
fn test_chunks_cover_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chunks.tif");
    let meta = info(9, 7, 2, SampleType::F64, None);
    let values: Vec<f64> = (0..126).map(f64::from).collect();
    write_raster(&path, &meta, &values).unwrap();

    let mut reader = RasterReader::open(&path).unwrap();
    let order = ByteOrder::native();
    let whole = reader.read_bytes(order).unwrap();

    // Reassemble the image from its chunks
    let px = meta.pixel_bytes();
    let mut rebuilt = vec![0u8; whole.len()];
    for i in 0..reader.chunk_count() {
        let (window, bytes) = reader.read_chunk_bytes(i, order).unwrap();
        assert_eq!(bytes.len(), window.pixels() * px);
        let row_len = window.width as usize * px;
        for (r, row) in bytes.chunks(row_len).enumerate() {
            let start = ((window.row_off as usize + r) * 9 + window.col_off as usize) * px;
            rebuilt[start..start + row_len].copy_from_slice(row);
        }
    }
    assert_eq!(rebuilt, whole);
}

#[test]
fn test_missing_georeference_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.tif");
    {
        let file = std::fs::File::create(&path).unwrap();
        let mut encoder = tiff::encoder::TiffEncoder::new(file).unwrap();
        encoder
            .write_image::<tiff::encoder::colortype::Gray8>(2, 2, &[1, 2, 3, 4])
            .unwrap();
    }

    let err = RasterInfo::read(&path).unwrap_err();
    assert!(matches!(err, RasterError::InvalidGeoTiff { .. }));
    assert_eq!(err.kind(), aoitile_grid::ErrorKind::Precondition);
}
