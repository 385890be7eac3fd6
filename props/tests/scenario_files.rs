//! Loads the scenario files shipped with the command-line client.

#![cfg(feature = "scenario")]

use std::path::PathBuf;

use invprops::scenario::Scenario;
use invprops::{check, Deriv};
use ndarray::array;

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../clients/scenarios")
        .join(name)
}

#[test]
fn conductivity_scenario() {
    let scenario = Scenario::load(scenario_path("conductivity.toml")).unwrap();
    let host = scenario.host().unwrap();

    assert_eq!(host.property("sigma").unwrap(), Some(array![1.0, 2.0, 4.0]));
    assert_eq!(host.property("rho").unwrap(), Some(array![1.0, 0.5, 0.25]));
    assert_eq!(host.property("eta").unwrap(), Some(array![0.1, 0.1, 0.2]));
    assert_eq!(
        host.derivative("rhoDeriv").unwrap(),
        Deriv::Diagonal(array![-1.0, -0.25, -0.0625])
    );
    assert_eq!(host.stored(), vec!["eta", "sigmaMap"]);

    let report = check::schema(host.schema());
    assert_eq!(report.findings().count(), 0, "{:#?}", report.results);
    assert!(check::host(&host).all_passed());
}

#[test]
fn log_conductivity_scenario() {
    let scenario = Scenario::load(scenario_path("log-conductivity.toml")).unwrap();
    let host = scenario.host().unwrap();

    let sigma = host.property("sigma").unwrap().unwrap();
    let expected = array![0.0f64, 0.5, 1.0].mapv(f64::exp);
    for (got, want) in sigma.iter().zip(expected.iter()) {
        assert!((got - want).abs() < 1e-12, "{got} != {want}");
    }
    assert_eq!(
        host.mapping("sigmaMap").unwrap().map(|m| m.label()),
        Some("ReciprocalMap * ReciprocalMap * ExpMap".to_owned())
    );
}

#[test]
fn missing_file_names_the_path() {
    let err = Scenario::load(scenario_path("missing.toml")).unwrap_err();
    assert!(err.to_string().contains("missing.toml"), "{err}");
}
