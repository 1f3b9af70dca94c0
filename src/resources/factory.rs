use crate::resources::ResourceDefinition;
use k8s_openapi::ByteString;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapEnvSource, ConfigMapVolumeSource, Container, ContainerPort,
    EmptyDirVolumeSource, EnvFromSource, EnvVar, EnvVarSource, ExecAction, HTTPGetAction,
    HostPathVolumeSource, KeyToPath, ObjectFieldSelector, Pod, PodSpec, PodTemplateSpec, Probe,
    ResourceRequirements, Secret, SecretEnvSource, SecretKeySelector, Service, ServicePort,
    ServiceSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

pub const SECRET_NAME: &str = "my-secret";
pub const CONFIG_MAP_NAME: &str = "my-config";
pub const MOUNTED_CONFIG_MAP_NAME: &str = "my-mounted-config";
pub const DEPLOYMENT_NAME: &str = "my-deployment";
pub const SERVICE_NAME: &str = "my-service";
pub const POD_NAME: &str = "my-pod";

const APP_LABEL: &str = "myapplication";
const SHARED_MEMORY_SIZE_LIMIT: &str = "100Mi";

fn string_map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn metadata(name: &str, labels: &[(&str, &str)]) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.into()),
        annotations: Some(string_map(&[("key1", "value1"), ("key2", "value2")])),
        labels: Some(string_map(labels)),
        ..Default::default()
    }
}

fn quantities(memory: &str, cpu: &str) -> BTreeMap<String, Quantity> {
    BTreeMap::from([
        ("memory".to_string(), Quantity(memory.into())),
        ("cpu".to_string(), Quantity(cpu.into())),
    ])
}

fn container_resources() -> ResourceRequirements {
    ResourceRequirements {
        limits: Some(quantities("200Mi", "100m")),
        requests: Some(quantities("100Mi", "50m")),
        ..Default::default()
    }
}

fn plain_env(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.into(),
        value: Some(value.into()),
        value_from: None,
    }
}

fn field_env(name: &str, field_path: &str) -> EnvVar {
    EnvVar {
        name: name.into(),
        value: None,
        value_from: Some(EnvVarSource {
            field_ref: Some(ObjectFieldSelector {
                field_path: field_path.into(),
                ..Default::default()
            }),
            ..Default::default()
        }),
    }
}

fn shell(script: &str) -> Vec<String> {
    vec!["sh".into(), "-c".into(), script.into()]
}

pub fn secret() -> Secret {
    Secret {
        metadata: metadata(SECRET_NAME, &[("key1", "value1"), ("app", APP_LABEL)]),
        data: Some(BTreeMap::from([
            (
                "SECRET_KEY".to_string(),
                ByteString(b"data-from-secret".to_vec()),
            ),
            (
                "SECRET_KEY_TWO".to_string(),
                ByteString(b"more-data-from-secret".to_vec()),
            ),
        ])),
        ..Default::default()
    }
}

pub fn config_map() -> ConfigMap {
    ConfigMap {
        metadata: metadata(CONFIG_MAP_NAME, &[("key1", "value1"), ("app", APP_LABEL)]),
        data: Some(string_map(&[
            ("key1", "data1-from-configmap"),
            ("key2", "data2-from-configmap"),
        ])),
        ..Default::default()
    }
}

/// Config map mounted into the deployment as the nginx document root.
pub fn mounted_config_map() -> ConfigMap {
    ConfigMap {
        metadata: metadata(
            MOUNTED_CONFIG_MAP_NAME,
            &[("key1", "value1"), ("app", APP_LABEL)],
        ),
        data: Some(string_map(&[(
            "html",
            "<!DOCTYPE html><html><body><h1 style=background-color:DodgerBlue;>Hello Rust!</h1></body></html>",
        )])),
        ..Default::default()
    }
}

pub fn deployment() -> Deployment {
    let volumes = vec![
        Volume {
            name: "shm-volume".into(),
            empty_dir: Some(EmptyDirVolumeSource {
                medium: Some("Memory".into()),
                size_limit: Some(Quantity(SHARED_MEMORY_SIZE_LIMIT.into())),
            }),
            ..Default::default()
        },
        Volume {
            name: "host-volume".into(),
            host_path: Some(HostPathVolumeSource {
                path: "/home/".into(),
                type_: Some("DirectoryOrCreate".into()),
            }),
            ..Default::default()
        },
        Volume {
            name: "configmap-volume".into(),
            config_map: Some(ConfigMapVolumeSource {
                name: MOUNTED_CONFIG_MAP_NAME.into(),
                items: Some(vec![KeyToPath {
                    key: "html".into(),
                    path: "index.html".into(),
                    mode: None,
                }]),
                ..Default::default()
            }),
            ..Default::default()
        },
    ];

    let container = Container {
        name: "my-container".into(),
        image: Some("nginx".into()),
        image_pull_policy: Some("IfNotPresent".into()),
        env: Some(vec![
            plain_env("ENV1", "regular-env1"),
            plain_env("ENV2", "regular-env2"),
            EnvVar {
                name: "ENVFROMSECRET".into(),
                value: None,
                value_from: Some(EnvVarSource {
                    secret_key_ref: Some(SecretKeySelector {
                        name: SECRET_NAME.into(),
                        key: "SECRET_KEY".into(),
                        optional: None,
                    }),
                    ..Default::default()
                }),
            },
            // Downward API
            field_env("MY_POD_IP", "status.podIP"),
            field_env("MY_NAMESPACE", "metadata.namespace"),
        ]),
        env_from: Some(vec![
            EnvFromSource {
                config_map_ref: Some(ConfigMapEnvSource {
                    name: CONFIG_MAP_NAME.into(),
                    optional: None,
                }),
                ..Default::default()
            },
            EnvFromSource {
                secret_ref: Some(SecretEnvSource {
                    name: SECRET_NAME.into(),
                    optional: None,
                }),
                ..Default::default()
            },
        ]),
        ports: Some(vec![ContainerPort {
            container_port: 80,
            ..Default::default()
        }]),
        volume_mounts: Some(vec![
            VolumeMount {
                name: "shm-volume".into(),
                mount_path: "/dev/shm".into(),
                ..Default::default()
            },
            VolumeMount {
                name: "configmap-volume".into(),
                mount_path: "/usr/share/nginx/html".into(),
                ..Default::default()
            },
        ]),
        resources: Some(container_resources()),
        liveness_probe: Some(Probe {
            http_get: Some(HTTPGetAction {
                port: IntOrString::Int(80),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    };

    Deployment {
        metadata: metadata(DEPLOYMENT_NAME, &[("key1", "value1"), ("key2", "value2")]),
        spec: Some(DeploymentSpec {
            replicas: Some(2),
            selector: LabelSelector {
                match_labels: Some(string_map(&[("app", APP_LABEL)])),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(string_map(&[
                        ("app", APP_LABEL),
                        ("key1", "value1"),
                        ("key2", "value2"),
                    ])),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    enable_service_links: Some(false),
                    volumes: Some(volumes),
                    containers: vec![container],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn service() -> Service {
    Service {
        metadata: metadata(SERVICE_NAME, &[("key1", "value1"), ("app", APP_LABEL)]),
        spec: Some(ServiceSpec {
            type_: Some("NodePort".into()),
            selector: Some(string_map(&[("app", APP_LABEL)])),
            ports: Some(vec![ServicePort {
                protocol: Some("TCP".into()),
                port: 80,
                target_port: Some(IntOrString::Int(80)),
                // default node port range: 30000-32767
                node_port: Some(30001),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Pod whose init container blocks until the service resolves in cluster DNS,
/// with a readiness probe against the service port.
pub fn pod() -> Pod {
    Pod {
        metadata: metadata(
            POD_NAME,
            &[("key1", "value1"), ("app", "myotherapplication")],
        ),
        spec: Some(PodSpec {
            init_containers: Some(vec![Container {
                name: "init-myservice".into(),
                image: Some("busybox:1.28".into()),
                image_pull_policy: Some("Always".into()),
                command: Some(shell(&format!(
                    "until nslookup {}.$(cat /var/run/secrets/kubernetes.io/serviceaccount/namespace).svc.cluster.local; do echo waiting for myservice; sleep 2; done",
                    SERVICE_NAME
                ))),
                ..Default::default()
            }]),
            containers: vec![Container {
                name: "my-container".into(),
                image: Some("busybox".into()),
                image_pull_policy: Some("IfNotPresent".into()),
                command: Some(shell(&format!(
                    "while true; do nc -z -v {} 80; sleep 10; done",
                    SERVICE_NAME
                ))),
                env: Some(vec![plain_env("ENV1", "regular-env1")]),
                resources: Some(container_resources()),
                readiness_probe: Some(Probe {
                    exec: Some(ExecAction {
                        command: Some(shell(&format!(" nc -zv {} 80", SERVICE_NAME))),
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// The default batch. Order matters: the secret and config maps must exist
/// before the deployment that references them, the service before the pod.
pub fn default_batch() -> Vec<ResourceDefinition> {
    vec![
        secret().into(),
        config_map().into(),
        mounted_config_map().into(),
        deployment().into(),
        service().into(),
        pod().into(),
    ]
}
