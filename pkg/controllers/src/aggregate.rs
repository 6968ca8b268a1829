use pkg_state::objects::ObjectClient;
use pkg_types::localvolume::{LocalVolume, LocalVolumeSet};
use pkg_types::meta::OwnerReference;
use pkg_types::pod::{NodeSelector, NodeSelectorTerm, Toleration};
use pkg_types::resource::Resource;
use pkg_types::selector::LabelSelector;

use crate::error::ReconcileError;

/// Inputs of one reconciliation pass, derived from every fleet definition in
/// the namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesiredState {
    pub volume_sets: Vec<LocalVolumeSet>,
    pub volumes: Vec<LocalVolume>,
    pub tolerations: Vec<Toleration>,
    pub owner_refs: Vec<OwnerReference>,
    /// `None` runs the daemon on every node.
    pub node_selector: Option<NodeSelector>,
}

impl DesiredState {
    /// Combine fleet definitions: tolerations and owners are concatenated,
    /// node-selector terms are OR-ed. A definition without a selector asks
    /// for every node, which makes the combined selector `None`.
    pub fn from_definitions(volume_sets: Vec<LocalVolumeSet>, volumes: Vec<LocalVolume>) -> Self {
        let mut tolerations = Vec::new();
        let mut owner_refs = Vec::new();
        let mut terms: Vec<NodeSelectorTerm> = Vec::new();
        let mut all_nodes = false;

        let mut collect = |selector: &Option<NodeSelector>| match selector {
            Some(s) => terms.extend(s.terms.iter().cloned()),
            None => all_nodes = true,
        };

        for set in &volume_sets {
            tolerations.extend(set.spec.tolerations.iter().cloned());
            owner_refs.push(set.owner_reference());
            collect(&set.spec.node_selector);
        }
        for lv in &volumes {
            tolerations.extend(lv.spec.tolerations.iter().cloned());
            owner_refs.push(lv.owner_reference());
            collect(&lv.spec.node_selector);
        }

        let node_selector = if all_nodes || terms.is_empty() {
            None
        } else {
            Some(NodeSelector { terms })
        };

        Self {
            volume_sets,
            volumes,
            tolerations,
            owner_refs,
            node_selector,
        }
    }

    /// Nothing to manage in this namespace.
    pub fn is_empty(&self) -> bool {
        self.volume_sets.is_empty() && self.volumes.is_empty()
    }
}

/// List every fleet definition in `namespace` and combine them.
pub async fn aggregate(client: &ObjectClient, namespace: &str) -> Result<DesiredState, ReconcileError> {
    let everything = LabelSelector::everything();
    let volume_sets: Vec<LocalVolumeSet> = client.list(namespace, &everything).await?;
    let volumes: Vec<LocalVolume> = client.list(namespace, &everything).await?;
    Ok(DesiredState::from_definitions(volume_sets, volumes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg_types::localvolume::{LocalVolumeSetSpec, LocalVolumeSpec};
    use pkg_types::meta::ObjectMeta;
    use pkg_types::pod::{NodeSelectorOperator, NodeSelectorRequirement};

    fn term(host: &str) -> NodeSelectorTerm {
        NodeSelectorTerm {
            match_expressions: vec![NodeSelectorRequirement {
                key: "kubernetes.io/hostname".to_string(),
                operator: NodeSelectorOperator::In,
                values: vec![host.to_string()],
            }],
        }
    }

    fn toleration(key: &str) -> Toleration {
        Toleration {
            key: key.to_string(),
            operator: Default::default(),
            value: String::new(),
            effect: Default::default(),
        }
    }

    fn volume_set(name: &str, host: Option<&str>) -> LocalVolumeSet {
        let mut meta = ObjectMeta::new("ns", name);
        meta.uid = Some(format!("{}-uid", name));
        LocalVolumeSet {
            metadata: meta,
            spec: LocalVolumeSetSpec {
                storage_class_name: format!("{}-sc", name),
                node_selector: host.map(|h| NodeSelector {
                    terms: vec![term(h)],
                }),
                tolerations: vec![toleration(name)],
                ..Default::default()
            },
        }
    }

    fn volume(name: &str, host: &str) -> LocalVolume {
        LocalVolume {
            metadata: ObjectMeta::new("ns", name),
            spec: LocalVolumeSpec {
                node_selector: Some(NodeSelector {
                    terms: vec![term(host)],
                }),
                tolerations: vec![toleration(name)],
                ..Default::default()
            },
        }
    }

    #[test]
    fn terms_are_or_ed_and_owners_collected() {
        let desired = DesiredState::from_definitions(
            vec![volume_set("set-a", Some("node-1"))],
            vec![volume("lv-b", "node-2")],
        );
        let selector = desired.node_selector.expect("selector");
        assert_eq!(selector.terms, vec![term("node-1"), term("node-2")]);
        assert_eq!(desired.tolerations.len(), 2);

        let owners: Vec<(&str, &str)> = desired
            .owner_refs
            .iter()
            .map(|o| (o.kind.as_str(), o.name.as_str()))
            .collect();
        assert_eq!(owners, vec![("LocalVolumeSet", "set-a"), ("LocalVolume", "lv-b")]);
        assert_eq!(desired.owner_refs[0].uid, "set-a-uid");
    }

    #[test]
    fn definition_without_selector_selects_all_nodes() {
        let desired = DesiredState::from_definitions(
            vec![volume_set("set-a", None)],
            vec![volume("lv-b", "node-2")],
        );
        assert!(desired.node_selector.is_none());
        assert!(!desired.is_empty());
    }

    #[test]
    fn no_definitions_is_empty() {
        let desired = DesiredState::from_definitions(vec![], vec![]);
        assert!(desired.is_empty());
        assert!(desired.node_selector.is_none());
    }
}
