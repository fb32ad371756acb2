use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use trellis_core::access::TokenId;
use trellis_core::criteria::SearchCriteria;
use trellis_core::node::{CollectionKind, EntitlementKind};
use trellis_storage::{CatalogStore, Country, Device, Product};

use crate::error::AdminError;
use crate::service::{AdminServices, ContentKind};

/// Seed document. Sections are applied in dependency order regardless of their order in
/// the file: catalog, entitlements, services, users, collections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedDocument {
    #[serde(rename = "country")]
    pub countries: Vec<Country>,
    #[serde(rename = "device")]
    pub devices: Vec<Device>,
    #[serde(rename = "product")]
    pub products: Vec<Product>,
    #[serde(rename = "permission")]
    pub permissions: Vec<PermissionSeed>,
    #[serde(rename = "role")]
    pub roles: Vec<RoleSeed>,
    #[serde(rename = "service")]
    pub services: Vec<ServiceSeed>,
    #[serde(rename = "user")]
    pub users: Vec<UserSeed>,
    #[serde(rename = "collection")]
    pub collections: Vec<CollectionSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PermissionSeed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub service: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleSeed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub entitlements: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSeed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub entitlements: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserSeed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub credentials: Vec<CredentialSeed>,
    #[serde(default)]
    pub entitlements: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialSeed {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSeed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: CollectionKind,
    pub criteria: Option<SearchCriteria>,
    #[serde(default)]
    pub contents: Vec<ContentSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentSeed {
    pub kind: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub countries: usize,
    pub devices: usize,
    pub products: usize,
    pub entitlements: usize,
    pub services: usize,
    pub users: usize,
    pub collections: usize,
}

impl fmt::Display for SeedSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} countries, {} devices, {} products, {} entitlements, {} services, {} users, {} collections",
            self.countries,
            self.devices,
            self.products,
            self.entitlements,
            self.services,
            self.users,
            self.collections
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file '{0}': {1}")]
    ReadFile(String, String),

    #[error("failed to parse seed file: {0}")]
    Parse(String),

    #[error("seed [{section}] '{item}': {source}")]
    Apply {
        section: &'static str,
        item: String,
        #[source]
        source: AdminError,
    },
}

impl SeedDocument {
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SeedError::ReadFile(path.display().to_string(), e.to_string()))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, SeedError> {
        toml::from_str(contents).map_err(|e| SeedError::Parse(e.to_string()))
    }

    /// Applies every section through the gated administrative surface as `token`.
    /// Stops at the first failure.
    pub fn apply<S: CatalogStore>(
        &self,
        services: &AdminServices<S>,
        token: &TokenId,
    ) -> Result<SeedSummary, SeedError> {
        let mut summary = SeedSummary::default();
        let access = &services.access;
        let catalog = &services.catalog;
        let collections = &services.collections;

        for country in &self.countries {
            at("country", &country.id, || {
                catalog.create_country(token, country.clone())
            })?;
            summary.countries += 1;
        }
        for device in &self.devices {
            at("device", &device.id, || {
                catalog.create_device(token, device.clone())
            })?;
            summary.devices += 1;
        }
        for product in &self.products {
            at("product", &product.id, || {
                catalog.create_product(token, product.clone())
            })?;
            summary.products += 1;
        }

        for permission in &self.permissions {
            at("permission", &permission.id, || {
                access.create_entitlement(
                    token,
                    EntitlementKind::Permission,
                    &permission.id,
                    &permission.name,
                    &permission.description,
                )
            })?;
            summary.entitlements += 1;
        }
        // All roles exist before any edge is added, so roles may reference each other.
        for role in &self.roles {
            at("role", &role.id, || {
                access.create_entitlement(
                    token,
                    EntitlementKind::Role,
                    &role.id,
                    &role.name,
                    &role.description,
                )
            })?;
            summary.entitlements += 1;
        }
        for role in &self.roles {
            for child in &role.entitlements {
                at("role", &role.id, || {
                    access.attach_entitlement(token, &role.id, child)
                })?;
            }
        }

        for service in &self.services {
            at("service", &service.id, || {
                access.create_service(token, &service.id, &service.name, &service.description)?;
                for entitlement in &service.entitlements {
                    access.add_to_service(token, &service.id, entitlement)?;
                }
                Ok(())
            })?;
            summary.services += 1;
        }
        for permission in &self.permissions {
            if let Some(service) = &permission.service {
                at("permission", &permission.id, || {
                    access.add_to_service(token, service, &permission.id).map(|_| ())
                })?;
            }
        }

        for user in &self.users {
            at("user", &user.id, || {
                access.create_user(token, &user.id, &user.name)?;
                for credential in &user.credentials {
                    access.add_credential(token, &user.id, &credential.login, &credential.password)?;
                }
                for entitlement in &user.entitlements {
                    access.grant_entitlement(token, &user.id, entitlement)?;
                }
                Ok(())
            })?;
            summary.users += 1;
        }

        for collection in &self.collections {
            at("collection", &collection.id, || {
                collections.create_collection(
                    token,
                    collection.kind,
                    &collection.id,
                    &collection.name,
                    &collection.description,
                )
            })?;
            summary.collections += 1;
        }
        for collection in &self.collections {
            at("collection", &collection.id, || {
                if let Some(criteria) = &collection.criteria {
                    collections.set_dynamic_criteria(token, &collection.id, criteria.clone())?;
                }
                for content in &collection.contents {
                    let kind: ContentKind = content.kind.parse()?;
                    collections.attach_content(token, &collection.id, &content.id, kind)?;
                }
                Ok(())
            })?;
        }

        tracing::info!(%summary, "seed applied");
        Ok(summary)
    }
}

fn at<T>(
    section: &'static str,
    item: &str,
    f: impl FnOnce() -> Result<T, AdminError>,
) -> Result<T, SeedError> {
    f().map_err(|source| SeedError::Apply {
        section,
        item: item.trim().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use trellis_core::access::SystemClock;
    use trellis_storage::InMemoryCatalog;

    use super::*;
    use crate::config::AppConfig;

    const SEED: &str = r#"
[[country]]
id = "US"
name = "United States"
export_open = true

[[device]]
id = "iphone"
name = "iPhone"
manufacturer = "Apple"

[[product]]
id = "p3"
name = "Okay game"
author = "Acme"
description = "middling"
content_type = "application"
categories = ["games"]
rating = 3
price = 1.0
languages = ["en_US"]
countries = ["US"]
devices = ["iphone"]
image_url = "https://img.example/p3.png"

[[product]]
id = "p5"
name = "Great game"
author = "Acme"
description = "excellent"
content_type = "application"
categories = ["games"]
rating = 5
price = 2.0
languages = ["en_US"]
countries = ["US"]
devices = ["iphone"]
image_url = "https://img.example/p5.png"

[[permission]]
id = "publish_article"
name = "Publish article"
service = "blog"

[[role]]
id = "editor"
name = "Editor"
entitlements = ["writer"]

[[role]]
id = "writer"
name = "Writer"
entitlements = ["publish_article"]

[[service]]
id = "blog"
name = "Blog"

[[user]]
id = "alice"
name = "Alice"
entitlements = ["editor"]
credentials = [{ login = "alice", password = "wonderland" }]

[[collection]]
id = "games"
name = "Games"
kind = "static"
contents = [{ kind = "product", id = "p3" }, { kind = "collection", id = "top" }]

[[collection]]
id = "top"
name = "Top rated"
kind = "dynamic"
criteria = { min_rating = 4 }
"#;

    fn services() -> (AdminServices<InMemoryCatalog>, TokenId) {
        let config = AppConfig::default();
        let services = AdminServices::build(
            &config,
            Arc::new(SystemClock),
            Arc::new(InMemoryCatalog::new()),
        )
        .unwrap();
        let token = services
            .access
            .login(&config.bootstrap.login, &config.bootstrap.password)
            .unwrap();
        (services, token)
    }

    #[test]
    fn full_seed_applies_in_dependency_order() {
        let (services, token) = services();
        let doc = SeedDocument::parse(SEED).unwrap();

        let summary = doc.apply(&services, &token).unwrap();

        assert_eq!(summary.products, 2);
        assert_eq!(summary.entitlements, 3);
        assert_eq!(summary.collections, 2);

        let alice = services.access.login("alice", "wonderland").unwrap();
        assert!(services.access.check_access(&alice, "publish_article").is_ok());

        let games: Vec<String> = services
            .collections
            .contents(Some("games"))
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(games, vec!["p3", "top", "p5"]);
    }

    #[test]
    fn permission_service_link_is_applied() {
        let (services, token) = services();
        SeedDocument::parse(SEED)
            .unwrap()
            .apply(&services, &token)
            .unwrap();

        let inventory = services.access.inventory();

        assert_eq!(inventory.services[0].entitlements, vec!["publish_article"]);
    }

    #[test]
    fn failure_names_section_and_item() {
        let (services, token) = services();
        let doc = SeedDocument::parse(
            r#"
[[role]]
id = "editor"
name = "Editor"
entitlements = ["missing"]
"#,
        )
        .unwrap();

        let err = doc.apply(&services, &token).unwrap_err();

        assert!(
            matches!(err, SeedError::Apply { section: "role", ref item, .. } if item == "editor"),
            "got: {err}"
        );
        assert!(err.to_string().contains("missing"), "got: {err}");
    }

    #[test]
    fn unknown_content_kind_is_rejected() {
        let (services, token) = services();
        let doc = SeedDocument::parse(
            r#"
[[collection]]
id = "games"
name = "Games"
kind = "static"
contents = [{ kind = "folder", id = "x" }]
"#,
        )
        .unwrap();

        let err = doc.apply(&services, &token).unwrap_err();

        assert!(err.to_string().contains("folder"), "got: {err}");
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            SeedDocument::parse("[[country]\nid = 1"),
            Err(SeedError::Parse(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.toml");
        std::fs::write(&path, SEED).unwrap();

        let doc = SeedDocument::load(&path).unwrap();

        assert_eq!(doc.countries.len(), 1);
        assert_eq!(doc.roles.len(), 2);
        assert!(SeedDocument::load(&dir.path().join("absent.toml")).is_err());
    }
}
