use anyhow::Result;
use chartform::bridge::{ChartBridge, ChartDefinition, SynthOptions, chart_fn};
use chartform::construct::{ApiObject, ChartProps, NodeId, Scope};
use chartform::core::ChartformError;
use chartform::terraform::{ManifestOptions, ProviderRequirement, ResourceRef, Stack};
use chartform::test_utils::{
    CONTAINER_NAME, IMAGE, PORT, deployment, deployment_spec, deployment_spec_with, init_test_logging,
    namespace, service,
};
use serde_json::{Value, json};

const CHART_NAME: &str = "cdk8s-cdktf";
const DEPLOYMENT_NAME: &str = "cdk8s-cdktf-apps--v1-Deployment-cdk8s-cdktf-deploy-c806be9c";
const NAMESPACE_NAME: &str = "cdk8s-cdktf-v1-Namespace-my-namespace";
const SERVICE_NAME: &str = "cdk8s-cdktf-v1-Service-cdk8s-cdktf-svc-c83d273d";

fn synth<D: ChartDefinition>(definition: &D, options: SynthOptions<D::Props>) -> (Stack, ChartBridge) {
    init_test_logging(None);
    let mut stack = Stack::new();
    let bridge = ChartBridge::new(&mut stack, CHART_NAME, definition, options).unwrap();
    (stack, bridge)
}

fn service_manifest(name: &str, namespace: Option<&str>) -> Value {
    let mut metadata = json!({ "name": name });
    if let Some(ns) = namespace {
        metadata["namespace"] = json!(ns);
    }
    json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": metadata,
        "spec": {
            "ports": [{ "port": 8080 }],
            "selector": { "app": "test" }
        }
    })
}

fn deployment_manifest(name: &str, namespace: Option<&str>) -> Value {
    let mut metadata = json!({ "name": name });
    if let Some(ns) = namespace {
        metadata["namespace"] = json!(ns);
    }
    json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": metadata,
        "spec": deployment_spec()
    })
}

#[test]
fn test_empty_chart_synthesizes_nothing() {
    let (stack, bridge) = synth(&chart_fn(|_| Ok(())), SynthOptions::default());

    assert!(bridge.manifests().is_empty());
    assert_eq!(stack.to_json_string().unwrap(), "{}");
}

#[test]
fn test_single_api_object() {
    let chart = chart_fn(|scope| {
        scope.api_object("deploy", deployment())?;
        Ok(())
    });
    let (stack, bridge) = synth(&chart, SynthOptions::default());

    assert_eq!(bridge.manifests(), &[ResourceRef::new("kubernetes_manifest", DEPLOYMENT_NAME)]);
    let manifest = stack.manifest(DEPLOYMENT_NAME).unwrap();
    assert_eq!(manifest.manifest(), &deployment_manifest("cdk8s-cdktf-deploy-c806be9c", None));
    assert!(manifest.depends_on().is_empty());
}

#[test]
fn test_multiple_api_objects_without_dependencies() {
    let chart = chart_fn(|scope| {
        scope.api_object("ns", namespace("my-namespace"))?;
        scope.api_object("deploy", deployment())?;
        scope.api_object("svc", service())?;
        Ok(())
    });
    let (stack, _) = synth(&chart, SynthOptions::default());

    assert_eq!(
        stack.to_json(),
        json!({
            "resource": {
                "kubernetes_manifest": {
                    DEPLOYMENT_NAME: {
                        "depends_on": [],
                        "manifest": deployment_manifest("cdk8s-cdktf-deploy-c806be9c", None)
                    },
                    NAMESPACE_NAME: {
                        "depends_on": [],
                        "manifest": {
                            "apiVersion": "v1",
                            "kind": "Namespace",
                            "metadata": { "name": "my-namespace" }
                        }
                    },
                    SERVICE_NAME: {
                        "depends_on": [],
                        "manifest": service_manifest("cdk8s-cdktf-svc-c83d273d", None)
                    }
                }
            }
        })
    );
}

#[test]
fn test_dependencies_become_depends_on() {
    let chart = chart_fn(|scope| {
        let ns = scope.api_object("ns", namespace("my-namespace"))?;
        let deploy = scope.api_object("deploy", deployment().with_namespace("my-namespace"))?;
        let svc = scope.api_object("svc", service().with_namespace("my-namespace"))?;
        scope.add_dependency(svc, ns)?;
        scope.add_dependency(svc, deploy)?;
        Ok(())
    });
    let (stack, bridge) = synth(&chart, SynthOptions::default());

    let deploy_name = format!("{DEPLOYMENT_NAME}-my-namespace");
    let svc_name = format!("{SERVICE_NAME}-my-namespace");
    let names: Vec<&str> = bridge.manifests().iter().map(ResourceRef::logical_id).collect();
    assert_eq!(names, vec![NAMESPACE_NAME, deploy_name.as_str(), svc_name.as_str()]);

    let svc = stack.manifest(&svc_name).unwrap();
    assert_eq!(
        svc.depends_on(),
        &[
            ResourceRef::new("kubernetes_manifest", NAMESPACE_NAME),
            ResourceRef::new("kubernetes_manifest", deploy_name.as_str()),
        ]
    );
    assert_eq!(svc.manifest(), &service_manifest("cdk8s-cdktf-svc-c83d273d", Some("my-namespace")));
    assert!(stack.manifest(&deploy_name).unwrap().depends_on().is_empty());
}

#[test]
fn test_external_dependencies_and_provider() {
    let mut stack = Stack::new();
    let ns = stack
        .add_resource("kubernetes_namespace", "namespace", json!({ "metadata": { "name": "my-namespace" } }))
        .unwrap();

    let chart = chart_fn(|scope| {
        let first = scope.api_object("deployment", deployment().with_namespace("ns"))?;
        let second = scope.api_object("deployment2", deployment().with_namespace("ns"))?;
        scope.add_dependency(second, first)?;
        Ok(())
    });
    let options = SynthOptions {
        chart_options: None,
        manifest_options: Some(ManifestOptions {
            depends_on: vec![ns],
            ..ManifestOptions::default()
        }),
    };
    ChartBridge::new(&mut stack, CHART_NAME, &chart, options).unwrap();

    stack.add_provider("kubernetes", json!({}));
    stack.require_provider(
        "kubernetes",
        ProviderRequirement {
            source: "kubernetes".to_string(),
            version: Some("2.12.1".to_string()),
        },
    );

    let first = "cdk8s-cdktf-apps--v1-Deployment-cdk8s-cdktf-deployment-c858d2ef-ns";
    let second = "cdk8s-cdktf-apps--v1-Deployment-cdk8s-cdktf-deployment2-c8ffa5fd-ns";
    assert_eq!(
        stack.to_json(),
        json!({
            "provider": { "kubernetes": [{}] },
            "resource": {
                "kubernetes_manifest": {
                    first: {
                        "depends_on": ["kubernetes_namespace.namespace"],
                        "manifest": deployment_manifest("cdk8s-cdktf-deployment-c858d2ef", Some("ns"))
                    },
                    second: {
                        "depends_on": [
                            format!("kubernetes_manifest.{first}"),
                            "kubernetes_namespace.namespace"
                        ],
                        "manifest": deployment_manifest("cdk8s-cdktf-deployment2-c8ffa5fd", Some("ns"))
                    }
                },
                "kubernetes_namespace": {
                    "namespace": { "metadata": { "name": "my-namespace" } }
                }
            },
            "terraform": {
                "required_providers": {
                    "kubernetes": { "source": "kubernetes", "version": "2.12.1" }
                }
            }
        })
    );
}

struct ContainerProps {
    name: String,
    image: String,
    port: u16,
}

/// A chart whose deployment is configured through its props.
struct ConfigurableChart;

impl ChartDefinition for ConfigurableChart {
    type Props = ContainerProps;

    fn define(&self, scope: &mut Scope<'_>, props: Option<&ContainerProps>) -> Result<()> {
        let props = props.ok_or_else(|| anyhow::anyhow!("ConfigurableChart requires props"))?;
        scope.api_object(
            "deploy",
            ApiObject::new("apps/v1", "Deployment")
                .with_field("spec", deployment_spec_with(&props.name, &props.image, props.port)),
        )?;
        Ok(())
    }
}

#[test]
fn test_chart_with_custom_options() {
    let options = SynthOptions {
        chart_options: Some(ContainerProps {
            name: CONTAINER_NAME.to_string(),
            image: IMAGE.to_string(),
            port: PORT,
        }),
        manifest_options: None,
    };
    let (stack, _) = synth(&ConfigurableChart, options);

    assert_eq!(
        stack.manifest(DEPLOYMENT_NAME).unwrap().manifest(),
        &deployment_manifest("cdk8s-cdktf-deploy-c806be9c", None)
    );

    let mut empty = Stack::new();
    assert!(ChartBridge::new(&mut empty, CHART_NAME, &ConfigurableChart, SynthOptions::default()).is_err());
}

/// Groups a namespace and a deployment in it under one construct.
fn namespaced_app(scope: &mut Scope<'_>, id: &str) -> Result<NodeId> {
    let group = scope.construct(id)?;
    let mut inner = scope.scope(group);
    inner.api_object("ns", namespace("my-namespace"))?;
    inner.api_object("deploy", deployment().with_namespace("my-namespace"))?;
    Ok(group)
}

#[test]
fn test_chart_with_custom_construct() {
    let chart = chart_fn(|scope| {
        namespaced_app(scope, "test-construct")?;
        Ok(())
    });
    let (stack, _) = synth(&chart, SynthOptions::default());

    let names: Vec<&str> = stack.manifests().iter().map(|m| m.name()).collect();
    assert_eq!(
        names,
        vec![
            NAMESPACE_NAME,
            "cdk8s-cdktf-apps--v1-Deployment-cdk8s-cdktf-test-construct-deploy-c8ae5674-my-namespace",
        ]
    );
    assert_eq!(
        stack.manifests()[1].manifest()["metadata"],
        json!({ "name": "cdk8s-cdktf-test-construct-deploy-c8ae5674", "namespace": "my-namespace" })
    );
}

#[test]
fn test_chart_props_apply_to_owned_objects() {
    struct LabelledChart;

    impl ChartDefinition for LabelledChart {
        type Props = ChartProps;

        fn chart_props(&self, props: Option<&ChartProps>) -> ChartProps {
            props.cloned().unwrap_or_default()
        }

        fn define(&self, scope: &mut Scope<'_>, _props: Option<&ChartProps>) -> Result<()> {
            scope.api_object("deploy", deployment().with_label("tier", "web"))?;
            Ok(())
        }
    }

    let mut props = ChartProps {
        namespace: Some("apps".to_string()),
        disable_resource_name_hashes: true,
        ..ChartProps::default()
    };
    props.labels.insert("team".to_string(), "platform".to_string());
    let options = SynthOptions {
        chart_options: Some(props),
        manifest_options: None,
    };
    let (stack, _) = synth(&LabelledChart, options);

    let manifest = &stack.manifests()[0];
    assert_eq!(manifest.name(), "cdk8s-cdktf-apps--v1-Deployment-cdk8s-cdktf-deploy-apps");
    assert_eq!(
        manifest.manifest()["metadata"],
        json!({
            "name": "cdk8s-cdktf-deploy",
            "namespace": "apps",
            "labels": { "team": "platform", "tier": "web" }
        })
    );
}

#[test]
fn test_manifest_options_pass_through() {
    let chart = chart_fn(|scope| {
        scope.api_object("deploy", deployment())?;
        Ok(())
    });
    let options: ManifestOptions = serde_json::from_value(json!({
        "provider": "kubernetes.staging",
        "field_manager": { "name": "chartform", "force_conflicts": true },
        "wait": { "rollout": true },
        "lifecycle": { "prevent_destroy": true }
    }))
    .unwrap();
    let (stack, _) = synth(
        &chart,
        SynthOptions {
            chart_options: None,
            manifest_options: Some(options),
        },
    );

    let body = &stack.to_json()["resource"]["kubernetes_manifest"][DEPLOYMENT_NAME];
    assert_eq!(body["provider"], "kubernetes.staging");
    assert_eq!(body["field_manager"], json!({ "name": "chartform", "force_conflicts": true }));
    assert_eq!(body["wait"], json!({ "rollout": true }));
    assert_eq!(body["lifecycle"], json!({ "prevent_destroy": true }));
    assert_eq!(body["depends_on"], json!([]));
}

#[test]
fn test_synthesis_is_deterministic() {
    let chart = chart_fn(|scope| {
        let group = namespaced_app(scope, "app")?;
        let svc = scope.api_object("svc", service())?;
        scope.add_dependency(svc, scope.tree().find_path(group, "deploy").unwrap_or(group))?;
        Ok(())
    });

    let (first, _) = synth(&chart, SynthOptions::default());
    let (second, _) = synth(&chart, SynthOptions::default());
    assert_eq!(first.to_json_string().unwrap(), second.to_json_string().unwrap());
}

#[test]
fn test_validation_failure_registers_nothing() {
    let chart = chart_fn(|scope| {
        scope.api_object("ns", namespace("my-namespace"))?;
        let deploy = scope.api_object("deploy", deployment())?;
        scope.add_validation(deploy, || vec!["replicas must be at least 2".to_string()]);
        Ok(())
    });

    let mut stack = Stack::new();
    let err = ChartBridge::new(&mut stack, CHART_NAME, &chart, SynthOptions::default()).unwrap_err();

    assert_eq!(
        err.to_string(),
        "Validation failed with the following errors:\n  [cdk8s-cdktf/deploy] replicas must be at least 2"
    );
    assert!(stack.manifests().is_empty());
    assert_eq!(stack.to_json(), json!({}));
}

#[test]
fn test_runs_into_one_stack_stay_isolated() {
    let web = chart_fn(|scope| {
        scope.api_object("deploy", deployment())?;
        Ok(())
    });
    let api = chart_fn(|scope| {
        scope.api_object("deploy", deployment())?;
        scope.api_object("svc", service())?;
        Ok(())
    });

    let mut stack = Stack::new();
    let first = ChartBridge::new(&mut stack, "web", &web, SynthOptions::default()).unwrap();
    let second = ChartBridge::new(&mut stack, "api", &api, SynthOptions::default()).unwrap();

    assert_eq!(first.manifests().len(), 1);
    assert_eq!(second.manifests().len(), 2);
    assert_eq!(stack.manifests().len(), 3);
    assert_eq!(
        first.manifests()[0].logical_id(),
        "web-apps--v1-Deployment-web-deploy-c8c5ac65"
    );
}

#[test]
fn test_dependency_on_object_of_another_run_fails() {
    let first = chart_fn(|scope| {
        scope.api_object("ns", namespace("shared"))?;
        Ok(())
    });
    let mut stack = Stack::new();
    let a = ChartBridge::new(&mut stack, "a", &first, SynthOptions::default()).unwrap();
    let foreign_ns = a.tree().find_path(a.chart(), "ns").unwrap();

    // `cm` takes the same arena position as `ns` did in the first run
    let second = chart_fn(move |scope| {
        let cm = scope.api_object("cm", ApiObject::new("v1", "ConfigMap").with_name("cm"))?;
        assert_eq!(cm.index(), foreign_ns.index());
        let svc = scope.api_object("svc", service().with_name("svc"))?;
        scope.add_dependency(svc, foreign_ns)?;
        Ok(())
    });
    let err = ChartBridge::new(&mut stack, "b", &second, SynthOptions::default()).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ChartformError>(),
        Some(ChartformError::DependencyNotFound { resource, .. }) if resource == "b/svc"
    ));
    assert_eq!(stack.manifests().len(), 1);
    assert_eq!(stack.manifests()[0].name(), "a-v1-Namespace-shared");
}

#[test]
fn test_objects_sharing_generate_name_get_distinct_names() {
    let job = || {
        ApiObject::new("batch/v1", "Job")
            .with_generate_name("migrate-")
            .with_field("spec", json!({ "template": { "spec": { "restartPolicy": "Never" } } }))
    };
    let chart = chart_fn(move |scope| {
        scope.api_object("migrate-a", job())?;
        scope.api_object("migrate-b", job())?;
        Ok(())
    });

    let mut stack = Stack::new();
    ChartBridge::new(&mut stack, "db", &chart, SynthOptions::default()).unwrap();

    let names: Vec<&str> = stack.manifests().iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["db-batch--v1-Job-c8e7a412", "db-batch--v1-Job-c83de094"]);
    for manifest in stack.manifests() {
        assert_eq!(manifest.manifest()["metadata"], json!({ "generateName": "migrate-" }));
    }
}

#[test]
fn test_same_chart_twice_collides() {
    let chart = chart_fn(|scope| {
        scope.api_object("deploy", deployment())?;
        Ok(())
    });

    let mut stack = Stack::new();
    ChartBridge::new(&mut stack, CHART_NAME, &chart, SynthOptions::default()).unwrap();
    let err = ChartBridge::new(&mut stack, CHART_NAME, &chart, SynthOptions::default()).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ChartformError>(),
        Some(ChartformError::DuplicateResourceName { name }) if name == DEPLOYMENT_NAME
    ));
    assert_eq!(stack.manifests().len(), 1);
}

#[test]
fn test_nested_chart_objects_are_not_emitted() {
    let chart = chart_fn(|scope| {
        scope.api_object("deploy", deployment())?;
        let addons = scope.chart("addons", ChartProps::default())?;
        scope.scope(addons).api_object("svc", service())?;
        Ok(())
    });
    let (stack, bridge) = synth(&chart, SynthOptions::default());

    assert_eq!(bridge.manifests().len(), 1);
    assert_eq!(stack.manifests()[0].name(), DEPLOYMENT_NAME);
}

#[test]
fn test_dependency_on_container_fails() {
    let chart = chart_fn(|scope| {
        let group = namespaced_app(scope, "app")?;
        let svc = scope.api_object("svc", service())?;
        scope.add_dependency(svc, group)?;
        Ok(())
    });

    let mut stack = Stack::new();
    let err = ChartBridge::new(&mut stack, CHART_NAME, &chart, SynthOptions::default()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ChartformError>(),
        Some(&ChartformError::DependencyNotFound {
            resource: "cdk8s-cdktf/svc".to_string(),
            dependency: "cdk8s-cdktf/app".to_string(),
        })
    );
}

#[test]
fn test_cyclic_dependencies_fail() {
    let chart = chart_fn(|scope| {
        let a = scope.api_object("a", service().with_name("a"))?;
        let b = scope.api_object("b", service().with_name("b"))?;
        scope.add_dependency(a, b)?;
        scope.add_dependency(b, a)?;
        Ok(())
    });

    let mut stack = Stack::new();
    let err = ChartBridge::new(&mut stack, CHART_NAME, &chart, SynthOptions::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Dependency cycle detected: cdk8s-cdktf/a => cdk8s-cdktf/b => cdk8s-cdktf/a"
    );
    assert!(stack.manifests().is_empty());
}

#[test]
fn test_dependencies_added_after_synthesis() {
    let chart = chart_fn(|scope| {
        scope.api_object("deploy", deployment())?;
        Ok(())
    });
    let (mut stack, bridge) = synth(&chart, SynthOptions::default());
    let secret = stack.add_resource("kubernetes_secret", "token", json!({})).unwrap();

    stack.manifest_mut(&bridge.manifests()[0]).unwrap().add_dependency(secret);

    assert_eq!(
        stack.to_json()["resource"]["kubernetes_manifest"][DEPLOYMENT_NAME]["depends_on"],
        json!(["kubernetes_secret.token"])
    );
}
