//! Read-only rendering of the merged view for introspection.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::service::facade::ConfigService;

/// Sorted `{key: value}` listing, serialized as `{"props": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropsView {
    pub props: BTreeMap<String, String>,
}

impl PropsView {
    pub fn capture(service: &ConfigService) -> Self {
        Self {
            props: service.props(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::ConfigLayer;
    use crate::source::{PropertyMap, SourceOrigin};

    #[test]
    fn test_props_json_shape() {
        let values: PropertyMap = [("b", "2"), ("a", "1")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let chain = ConfigLayer::new("base", SourceOrigin::Resource, values, None);
        let service = ConfigService::new(chain, false);

        let json = serde_json::to_value(PropsView::capture(&service)).unwrap();
        assert_eq!(json, serde_json::json!({"props": {"a": "1", "b": "2"}}));

        let text = PropsView::capture(&service).to_json_pretty().unwrap();
        assert!(text.find("\"a\"").unwrap() < text.find("\"b\"").unwrap());
    }
}
