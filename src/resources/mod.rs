use crate::orchestrator::DeployError;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Pod, Secret, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::fmt;

pub mod factory;

/// Discriminant of a [`ResourceDefinition`], selecting its create/delete pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Secret,
    ConfigMap,
    Deployment,
    Service,
    Pod,
}

impl Kind {
    pub const ALL: [Kind; 5] = [
        Kind::Secret,
        Kind::ConfigMap,
        Kind::Deployment,
        Kind::Service,
        Kind::Pod,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Secret => "Secret",
            Kind::ConfigMap => "ConfigMap",
            Kind::Deployment => "Deployment",
            Kind::Service => "Service",
            Kind::Pod => "Pod",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed resource the orchestrator moves around without interpreting.
#[derive(Clone, Debug)]
pub enum ResourceDefinition {
    Secret(Secret),
    ConfigMap(ConfigMap),
    Deployment(Deployment),
    Service(Service),
    Pod(Pod),
}

impl ResourceDefinition {
    pub fn kind(&self) -> Kind {
        match self {
            ResourceDefinition::Secret(_) => Kind::Secret,
            ResourceDefinition::ConfigMap(_) => Kind::ConfigMap,
            ResourceDefinition::Deployment(_) => Kind::Deployment,
            ResourceDefinition::Service(_) => Kind::Service,
            ResourceDefinition::Pod(_) => Kind::Pod,
        }
    }

    fn metadata(&self) -> &ObjectMeta {
        match self {
            ResourceDefinition::Secret(secret) => &secret.metadata,
            ResourceDefinition::ConfigMap(config_map) => &config_map.metadata,
            ResourceDefinition::Deployment(deployment) => &deployment.metadata,
            ResourceDefinition::Service(service) => &service.metadata,
            ResourceDefinition::Pod(pod) => &pod.metadata,
        }
    }

    /// Name used for delete calls and logging. A definition without a
    /// non-empty `metadata.name` cannot be addressed remotely.
    pub fn name(&self) -> Result<&str, DeployError> {
        match self.metadata().name.as_deref() {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(DeployError::InvalidDefinition {
                kind: self.kind(),
                reason: "metadata.name is missing or empty".into(),
            }),
        }
    }
}

impl From<Secret> for ResourceDefinition {
    fn from(secret: Secret) -> Self {
        ResourceDefinition::Secret(secret)
    }
}

impl From<ConfigMap> for ResourceDefinition {
    fn from(config_map: ConfigMap) -> Self {
        ResourceDefinition::ConfigMap(config_map)
    }
}

impl From<Deployment> for ResourceDefinition {
    fn from(deployment: Deployment) -> Self {
        ResourceDefinition::Deployment(deployment)
    }
}

impl From<Service> for ResourceDefinition {
    fn from(service: Service) -> Self {
        ResourceDefinition::Service(service)
    }
}

impl From<Pod> for ResourceDefinition {
    fn from(pod: Pod) -> Self {
        ResourceDefinition::Pod(pod)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn named(name: Option<&str>) -> ObjectMeta {
        ObjectMeta {
            name: name.map(String::from),
            ..Default::default()
        }
    }

    #[rstest]
    #[case(ResourceDefinition::Secret(Secret { metadata: named(Some("s")), ..Default::default() }), Kind::Secret)]
    #[case(ResourceDefinition::ConfigMap(ConfigMap { metadata: named(Some("c")), ..Default::default() }), Kind::ConfigMap)]
    #[case(ResourceDefinition::Deployment(Deployment { metadata: named(Some("d")), ..Default::default() }), Kind::Deployment)]
    #[case(ResourceDefinition::Service(Service { metadata: named(Some("v")), ..Default::default() }), Kind::Service)]
    #[case(ResourceDefinition::Pod(Pod { metadata: named(Some("p")), ..Default::default() }), Kind::Pod)]
    fn test_kind_matches_variant(#[case] definition: ResourceDefinition, #[case] expected: Kind) {
        assert_eq!(definition.kind(), expected);
        assert!(definition.name().is_ok());
    }

    #[test]
    fn test_name_extracted_from_metadata() {
        let definition: ResourceDefinition = ConfigMap {
            metadata: named(Some("my-config")),
            ..Default::default()
        }
        .into();
        assert_eq!(definition.name().unwrap(), "my-config");
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    fn test_name_missing_is_invalid_definition(#[case] name: Option<&str>) {
        let definition: ResourceDefinition = Pod {
            metadata: named(name),
            ..Default::default()
        }
        .into();
        match definition.name() {
            Err(DeployError::InvalidDefinition { kind, .. }) => assert_eq!(kind, Kind::Pod),
            other => panic!("expected InvalidDefinition, got {:?}", other),
        }
    }

    #[test]
    fn test_kind_display_uses_api_kind() {
        let rendered: Vec<String> = Kind::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["Secret", "ConfigMap", "Deployment", "Service", "Pod"]
        );
    }
}
