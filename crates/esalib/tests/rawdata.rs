//! Spectrum export to CSV.

use esalib::{Esa, EsaConfig};
use esalib_test_harness::SimulatedAnalyzer;

#[tokio::test]
async fn rawdata_csv_spans_start_to_stop() {
    let sim = SimulatedAnalyzer::fsup50();
    let esa = Esa::with_transport(EsaConfig::new("FSUP50", "ESA"), Box::new(sim.clone()))
        .await
        .unwrap();
    esa.set_start_frequency(1e6).await.unwrap();
    esa.set_stop_frequency(2e6).await.unwrap();
    esa.set_sweep_points(201).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = esa
        .get_rawdata_from_spectrum(dir.path().join("captures"), "spectrum.csv")
        .await
        .unwrap();

    assert_eq!(path, dir.path().join("captures").join("spectrum.csv"));
    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 202);
    assert_eq!(lines[0], "frequency_hz,amplitude");
    assert!(lines[1].starts_with("1000000,"));
    assert!(lines[201].starts_with("2000000,"));
    // The simulated peak sits at the centre of the span.
    assert_eq!(lines[101], "1500000,-20");

    assert_eq!(sim.received().last().map(String::as_str), Some("TRAC? TRACE1"));
}

#[tokio::test]
async fn rawdata_into_unusable_directory_is_io_error() {
    let esa = Esa::with_transport(
        EsaConfig::new("FSUP50", "ESA"),
        Box::new(SimulatedAnalyzer::fsup50()),
    )
    .await
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();

    let result = esa.get_rawdata_from_spectrum(&blocker, "spectrum.csv").await;
    assert!(matches!(result, Err(esalib::Error::Io(_))));
}
