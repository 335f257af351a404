//! Building the static fallback chain.

use std::sync::Arc;

use crate::error::{ConfigError, Result};
use crate::layer::chain::ConfigLayer;
use crate::layer::substitution::{EnvSource, ProcessEnv, Substitutor};
use crate::source::format::split_list;
use crate::source::{ConfigSource, PropertyMap, SourceLoader};

/// Property names and naming rules used while building the chain.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Key in the base source naming the environment/account type.
    pub account_type_key: String,
    /// Overlay source name is `"<prefix>-<account-type>.<ext>"`.
    pub overlay_prefix: String,
    pub overlay_extension: String,
    /// Key holding the ordered list of extra sources to merge.
    pub include_key: String,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            account_type_key: "config.env.account-type".to_string(),
            overlay_prefix: "app".to_string(),
            overlay_extension: "toml".to_string(),
            include_key: "config.include".to_string(),
        }
    }
}

impl ResolverOptions {
    pub fn overlay_name(&self, account_type: &str) -> String {
        format!(
            "{}-{}.{}",
            self.overlay_prefix, account_type, self.overlay_extension
        )
    }
}

/// Resolves a base source name into the full static chain.
pub struct LayerResolver {
    loader: SourceLoader,
    options: ResolverOptions,
    env: Box<dyn EnvSource>,
}

impl LayerResolver {
    pub fn new(loader: SourceLoader) -> Self {
        Self {
            loader,
            options: ResolverOptions::default(),
            env: Box::new(ProcessEnv),
        }
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the environment consulted for references no layer defines.
    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Build the chain: base, then the environment overlay, then each include
    /// in list order, with substitutions resolved against the merged result.
    ///
    /// The returned layer is the head of the chain (the last include, or the
    /// overlay when there are none).
    pub fn resolve(&self, base_name: &str) -> Result<ConfigLayer> {
        let mut sources = Vec::new();
        let mut merged = PropertyMap::new();

        let base = self.loader.load(base_name)?;
        merge_into(&mut merged, &base);
        sources.push(base);

        let account_type = self
            .lookup(&merged, &self.options.account_type_key)?
            .ok_or_else(|| ConfigError::MissingKey {
                key: self.options.account_type_key.clone(),
            })?;
        let overlay = self.loader.load(&self.options.overlay_name(&account_type))?;
        merge_into(&mut merged, &overlay);
        sources.push(overlay);

        let includes = self
            .lookup(&merged, &self.options.include_key)?
            .map(|value| split_list(&value))
            .unwrap_or_default();
        for name in &includes {
            let include = self.loader.load(name)?;
            merge_into(&mut merged, &include);
            sources.push(include);
        }

        let mut substitutor = Substitutor::new(&merged, self.env.as_ref());
        let resolved = substitutor.resolve_all()?;

        let mut head: Option<ConfigLayer> = None;
        for source in sources {
            let mut values = PropertyMap::new();
            for (key, raw) in source.entries() {
                let value = if merged.get(key) == Some(raw) {
                    resolved.get(key).cloned().unwrap_or_else(|| raw.clone())
                } else {
                    // Only merged values may fail resolution.
                    substitutor.expand(key, raw).unwrap_or_else(|e| {
                        tracing::debug!(
                            source = source.name(),
                            key = %key,
                            error = %e,
                            "shadowed value left unexpanded"
                        );
                        raw.clone()
                    })
                };
                values.insert(key.clone(), value);
            }
            head = Some(ConfigLayer::new(
                source.name(),
                source.origin().clone(),
                values,
                head.take().map(Arc::new),
            ));
        }

        // The base is always loaded, so the chain has at least one layer.
        let head = head.ok_or_else(|| ConfigError::SourceNotFound {
            name: base_name.to_string(),
        })?;

        tracing::info!(
            base = base_name,
            account_type = %account_type,
            includes = includes.len(),
            layers = head.depth(),
            keys = resolved.len(),
            "static configuration resolved"
        );
        Ok(head)
    }

    fn lookup(&self, merged: &PropertyMap, key: &str) -> Result<Option<String>> {
        Substitutor::new(merged, self.env.as_ref()).resolve_key(key)
    }
}

fn merge_into(merged: &mut PropertyMap, source: &ConfigSource) {
    for (key, value) in source.entries() {
        merged.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::source::Resources;

    fn resolver(resources: Resources) -> LayerResolver {
        LayerResolver::new(SourceLoader::new(resources))
            .with_env(HashMap::<String, String>::new())
    }

    fn base_resources() -> Resources {
        Resources::new()
            .with_embedded(
                "application.toml",
                "a = 1\nb = 2\n[config.env]\naccount-type = \"test\"\n",
            )
            .with_embedded("app-test.toml", "b = 3\n")
    }

    #[test]
    fn test_overlay_wins_over_base() {
        let layer = resolver(base_resources()).resolve("application.toml").unwrap();

        assert_eq!(layer.get("a"), Some("1"));
        assert_eq!(layer.get("b"), Some("3"));
        assert_eq!(layer.name(), "app-test.toml");
        assert_eq!(layer.depth(), 2);
    }

    #[test]
    fn test_includes_applied_in_order() {
        let resources = base_resources()
            .with_embedded(
                "app-test.toml",
                "b = 3\n[config]\ninclude = [\"extra1.toml\", \"extra2.toml\"]\n",
            )
            .with_embedded("extra1.toml", "c = 4\n")
            .with_embedded("extra2.toml", "c = 5\nd = 6\n");
        let layer = resolver(resources).resolve("application.toml").unwrap();

        assert_eq!(layer.get("c"), Some("5"));
        assert_eq!(layer.get("d"), Some("6"));
        assert_eq!(layer.get("a"), Some("1"));
        assert_eq!(layer.get("b"), Some("3"));

        let names: Vec<_> = layer.layers().map(ConfigLayer::name).collect();
        assert_eq!(
            names,
            vec!["extra2.toml", "extra1.toml", "app-test.toml", "application.toml"]
        );
    }

    #[test]
    fn test_include_outranks_overlay() {
        let resources = base_resources()
            .with_embedded("app-test.toml", "b = 3\n[config]\ninclude = [\"extra.toml\"]\n")
            .with_embedded("extra.toml", "b = 7\n");
        let layer = resolver(resources).resolve("application.toml").unwrap();
        assert_eq!(layer.get("b"), Some("7"));
    }

    #[test]
    fn test_substitution_uses_merged_result() {
        let resources = Resources::new()
            .with_embedded(
                "application.toml",
                concat!(
                    "host = \"base.example\"\n",
                    "url = \"http://${host}/v1\"\n",
                    "[config.env]\naccount-type = \"prod\"\n",
                ),
            )
            .with_embedded("app-prod.toml", "host = \"prod.example\"\n");
        let layer = resolver(resources).resolve("application.toml").unwrap();

        assert_eq!(layer.get("url"), Some("http://prod.example/v1"));
        // The shadowed base value is still kept, unresolved keys never leak.
        let base = layer.layers().last().unwrap();
        assert_eq!(base.values()["host"], "base.example");
        assert_eq!(base.values()["url"], "http://prod.example/v1");
    }

    #[test]
    fn test_shadowed_unresolvable_value_does_not_fail() {
        let resources = Resources::new()
            .with_embedded(
                "application.toml",
                "a = \"${missing}\"\nb = \"${b}\"\n[config.env]\naccount-type = \"test\"\n",
            )
            .with_embedded("app-test.toml", "a = \"ok\"\nb = \"fine\"\n");
        let layer = resolver(resources).resolve("application.toml").unwrap();

        assert_eq!(layer.get("a"), Some("ok"));
        assert_eq!(layer.get("b"), Some("fine"));
        let base = layer.layers().last().unwrap();
        assert_eq!(base.values()["a"], "${missing}");
    }

    #[test]
    fn test_discriminator_may_be_substituted() {
        let resources = Resources::new()
            .with_embedded(
                "application.toml",
                "stack = \"staging\"\n[config.env]\naccount-type = \"${stack}\"\n",
            )
            .with_embedded("app-staging.toml", "x = 1\n");
        let layer = resolver(resources).resolve("application.toml").unwrap();
        assert_eq!(layer.get("x"), Some("1"));
    }

    #[test]
    fn test_cycle_fails_resolution() {
        let resources =
            base_resources().with_embedded("app-test.toml", "x = \"${y}\"\ny = \"${x}\"\n");
        let err = resolver(resources).resolve("application.toml").unwrap_err();
        assert!(matches!(err, ConfigError::CyclicReference { .. }));
    }

    #[test]
    fn test_missing_sources_are_fatal() {
        let err = resolver(Resources::new()).resolve("application.toml").unwrap_err();
        assert!(matches!(err, ConfigError::SourceNotFound { .. }));

        let resources = Resources::new()
            .with_embedded("application.toml", "[config.env]\naccount-type = \"qa\"\n");
        let err = resolver(resources).resolve("application.toml").unwrap_err();
        assert!(matches!(err, ConfigError::SourceNotFound { ref name } if name == "app-qa.toml"));

        let resources = base_resources()
            .with_embedded("app-test.toml", "[config]\ninclude = [\"gone.toml\"]\n");
        let err = resolver(resources).resolve("application.toml").unwrap_err();
        assert!(matches!(err, ConfigError::SourceNotFound { ref name } if name == "gone.toml"));
    }

    #[test]
    fn test_missing_discriminator() {
        let resources = Resources::new().with_embedded("application.toml", "a = 1\n");
        let err = resolver(resources).resolve("application.toml").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingKey { ref key } if key == "config.env.account-type"
        ));
    }

    #[test]
    fn test_custom_options() {
        let resources = Resources::new()
            .with_embedded("base.json", r#"{"env": "dev", "extra": ["more.json"]}"#)
            .with_embedded("svc-dev.json", r#"{"a": "dev"}"#)
            .with_embedded("more.json", r#"{"a": "more"}"#);
        let options = ResolverOptions {
            account_type_key: "env".into(),
            overlay_prefix: "svc".into(),
            overlay_extension: "json".into(),
            include_key: "extra".into(),
        };
        let layer = resolver(resources).with_options(options).resolve("base.json").unwrap();
        assert_eq!(layer.get("a"), Some("more"));
    }
}
