use chartform::bridge::{ChartBridge, SynthOptions};
use chartform::chart_file::ChartFile;
use chartform::core::ChartformError;
use chartform::terraform::{ResourceRef, Stack};

use crate::common::TestProject;
use crate::fixtures::{CYCLIC_CHART, INVALID_CHART, SETTINGS_CHART, WEB_CHART};

#[test]
fn test_web_chart_from_yaml() {
    let chart = ChartFile::parse(WEB_CHART, "web.yaml").unwrap();
    let mut stack = Stack::new();
    let bridge = ChartBridge::new(&mut stack, "web", &chart, SynthOptions::default()).unwrap();

    let names: Vec<&str> = bridge.manifests().iter().map(ResourceRef::logical_id).collect();
    assert_eq!(
        names,
        vec![
            "web-v1-Namespace-my-namespace",
            "web-apps--v1-Deployment-web-deploy-c8c5ac65-my-namespace",
            "web-v1-Service-web-svc-c8216bf5-my-namespace",
        ]
    );
    assert_eq!(stack.manifests()[2].depends_on(), &bridge.manifests()[..2]);
    assert_eq!(stack.manifests()[1].manifest()["spec"]["replicas"], 1);
}

#[test]
fn test_loaded_chart_takes_file_stem_as_name() {
    let project = TestProject::new().unwrap();
    let path = project.write_chart("settings", SETTINGS_CHART).unwrap();

    let chart = ChartFile::load(&path).unwrap();
    let name = chart.name().unwrap().to_string();
    assert_eq!(name, "settings");

    let mut stack = Stack::new();
    ChartBridge::new(&mut stack, &name, &chart, SynthOptions::default()).unwrap();
    assert_eq!(stack.manifests()[0].name(), "settings-v1-ConfigMap-settings");
    assert_eq!(stack.manifests()[0].manifest()["data"]["mode"], "production");
}

#[test]
fn test_invalid_chart_reports_every_problem() {
    let chart = ChartFile::parse(INVALID_CHART, "broken.yaml").unwrap();
    let mut stack = Stack::new();
    let err = ChartBridge::new(&mut stack, "broken", &chart, SynthOptions::default()).unwrap_err();

    match err.downcast_ref::<ChartformError>() {
        Some(ChartformError::ValidationFailed { errors }) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].to_string(), "[broken/cm] apiVersion must not be empty");
        }
        other => panic!("expected ValidationFailed, got {other:?}"),
    }
    assert!(stack.manifests().is_empty());
}

#[test]
fn test_cyclic_chart_fails() {
    let chart = ChartFile::parse(CYCLIC_CHART, "cyclic.yaml").unwrap();
    let mut stack = Stack::new();
    let err = ChartBridge::new(&mut stack, "cyclic", &chart, SynthOptions::default()).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ChartformError>(),
        Some(ChartformError::CircularDependency { .. })
    ));
}
