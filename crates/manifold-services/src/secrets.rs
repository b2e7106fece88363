// crates/manifold-services/src/secrets.rs
//
// Secret-data vault: add/get/delete keyed records guarded by a three-tier
// access level. Reading a record requires at least the level it was
// stored with; deleting requires admin. The vault synchronizes internally,
// handlers may run concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use manifold_core::{typed, HandlerError, RegistryBuilder, RegistryError};

// ---------------------------------------------------------------------------
// Access levels
// ---------------------------------------------------------------------------

/// Caller privilege, ordered: superAdmin > admin > user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccessLevel {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "superAdmin")]
    SuperAdmin,
}

impl AccessLevel {
    fn permits(self, required: AccessLevel) -> bool {
        self >= required
    }
}

// ---------------------------------------------------------------------------
// Requests / responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretAction {
    Add,
    Get,
    Delete,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManageSecretRequest {
    pub action: SecretAction,
    #[serde(rename = "dataID")]
    pub data_id: String,
    #[serde(rename = "userData", default)]
    pub user_data: Option<String>,
    #[serde(rename = "accessLevel")]
    pub access_level: AccessLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManageSecretResponse {
    pub status: String,
    pub message: String,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListSecretsRequest {
    #[serde(rename = "accessLevel")]
    pub access_level: AccessLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListSecretsResponse {
    pub ids: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecretStatsRequest {
    #[serde(rename = "accessLevel")]
    pub access_level: AccessLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct SecretStatsResponse {
    pub total: usize,
    pub user: usize,
    pub admin: usize,
    pub super_admin: usize,
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct SecretRecord {
    data: String,
    access_level: AccessLevel,
}

/// In-process secret store.
#[derive(Debug, Default)]
pub struct SecretVault {
    entries: RwLock<HashMap<String, SecretRecord>>,
}

impl SecretVault {
    pub async fn manage(
        &self,
        request: ManageSecretRequest,
    ) -> Result<ManageSecretResponse, HandlerError> {
        match request.action {
            SecretAction::Add => {
                let data = request.user_data.ok_or_else(|| {
                    HandlerError::InvalidParams("missing required field: userData".to_string())
                })?;
                let mut entries = self.entries.write().await;
                if entries.contains_key(&request.data_id) {
                    return Err(HandlerError::Failed(format!(
                        "data already exists: {}",
                        request.data_id
                    )));
                }
                tracing::debug!(data_id = %request.data_id, "secret added");
                entries.insert(
                    request.data_id,
                    SecretRecord {
                        data,
                        access_level: request.access_level,
                    },
                );
                Ok(ManageSecretResponse {
                    status: "success".to_string(),
                    message: "data added".to_string(),
                    data: None,
                })
            }
            SecretAction::Get => {
                let entries = self.entries.read().await;
                let record = entries.get(&request.data_id).ok_or_else(|| {
                    HandlerError::Failed(format!("data not found: {}", request.data_id))
                })?;
                if !request.access_level.permits(record.access_level) {
                    return Err(HandlerError::Failed("access denied".to_string()));
                }
                Ok(ManageSecretResponse {
                    status: "success".to_string(),
                    message: "data retrieved".to_string(),
                    data: Some(record.data.clone()),
                })
            }
            SecretAction::Delete => {
                if !request.access_level.permits(AccessLevel::Admin) {
                    return Err(HandlerError::Failed("access denied".to_string()));
                }
                let mut entries = self.entries.write().await;
                if entries.remove(&request.data_id).is_none() {
                    return Err(HandlerError::Failed(format!(
                        "data not found: {}",
                        request.data_id
                    )));
                }
                Ok(ManageSecretResponse {
                    status: "success".to_string(),
                    message: "data deleted".to_string(),
                    data: None,
                })
            }
        }
    }

    /// List ids whose records the caller's level may read, sorted.
    pub async fn list(
        &self,
        request: ListSecretsRequest,
    ) -> Result<ListSecretsResponse, HandlerError> {
        let entries = self.entries.read().await;
        let mut ids: Vec<String> = entries
            .iter()
            .filter(|(_, record)| request.access_level.permits(record.access_level))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort_unstable();
        let count = ids.len();
        Ok(ListSecretsResponse { ids, count })
    }

    /// Per-level counts. Admin-only, like the original surface.
    pub async fn stats(
        &self,
        request: SecretStatsRequest,
    ) -> Result<SecretStatsResponse, HandlerError> {
        if !request.access_level.permits(AccessLevel::Admin) {
            return Err(HandlerError::Failed("access denied".to_string()));
        }
        let entries = self.entries.read().await;
        let mut stats = SecretStatsResponse {
            total: entries.len(),
            user: 0,
            admin: 0,
            super_admin: 0,
        };
        for record in entries.values() {
            match record.access_level {
                AccessLevel::User => stats.user += 1,
                AccessLevel::Admin => stats.admin += 1,
                AccessLevel::SuperAdmin => stats.super_admin += 1,
            }
        }
        Ok(stats)
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

pub fn register(builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
    let vault = Arc::new(SecretVault::default());

    let v = vault.clone();
    builder.register(
        "secrets/manage",
        typed(move |req: ManageSecretRequest| {
            let vault = v.clone();
            async move { vault.manage(req).await }
        }),
    )?;

    let v = vault.clone();
    builder.register(
        "secrets/list",
        typed(move |req: ListSecretsRequest| {
            let vault = v.clone();
            async move { vault.list(req).await }
        }),
    )?;

    let v = vault;
    builder.register(
        "secrets/stats",
        typed(move |req: SecretStatsRequest| {
            let vault = v.clone();
            async move { vault.stats(req).await }
        }),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manage(action: SecretAction, id: &str, data: Option<&str>, level: AccessLevel) -> ManageSecretRequest {
        ManageSecretRequest {
            action,
            data_id: id.to_string(),
            user_data: data.map(str::to_string),
            access_level: level,
        }
    }

    #[tokio::test]
    async fn add_then_get_round_trips() {
        let vault = SecretVault::default();
        vault
            .manage(manage(SecretAction::Add, "k1", Some("v1"), AccessLevel::User))
            .await
            .unwrap();
        let got = vault
            .manage(manage(SecretAction::Get, "k1", None, AccessLevel::User))
            .await
            .unwrap();
        assert_eq!(got.data.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn get_below_stored_level_is_denied() {
        let vault = SecretVault::default();
        vault
            .manage(manage(SecretAction::Add, "k1", Some("v1"), AccessLevel::Admin))
            .await
            .unwrap();
        let err = vault
            .manage(manage(SecretAction::Get, "k1", None, AccessLevel::User))
            .await
            .unwrap_err();
        assert_eq!(err, HandlerError::Failed("access denied".to_string()));

        // superAdmin outranks admin and may read it.
        let got = vault
            .manage(manage(SecretAction::Get, "k1", None, AccessLevel::SuperAdmin))
            .await
            .unwrap();
        assert_eq!(got.data.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn duplicate_add_fails() {
        let vault = SecretVault::default();
        vault
            .manage(manage(SecretAction::Add, "k1", Some("v1"), AccessLevel::User))
            .await
            .unwrap();
        let err = vault
            .manage(manage(SecretAction::Add, "k1", Some("v2"), AccessLevel::User))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Failed(_)));
    }

    #[tokio::test]
    async fn add_without_user_data_is_invalid_params() {
        let vault = SecretVault::default();
        let err = vault
            .manage(manage(SecretAction::Add, "k1", None, AccessLevel::User))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn delete_requires_admin() {
        let vault = SecretVault::default();
        vault
            .manage(manage(SecretAction::Add, "k1", Some("v1"), AccessLevel::User))
            .await
            .unwrap();

        let err = vault
            .manage(manage(SecretAction::Delete, "k1", None, AccessLevel::User))
            .await
            .unwrap_err();
        assert_eq!(err, HandlerError::Failed("access denied".to_string()));

        vault
            .manage(manage(SecretAction::Delete, "k1", None, AccessLevel::Admin))
            .await
            .unwrap();
        let err = vault
            .manage(manage(SecretAction::Get, "k1", None, AccessLevel::SuperAdmin))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Failed(_)));
    }

    #[tokio::test]
    async fn list_filters_by_caller_level() {
        let vault = SecretVault::default();
        vault
            .manage(manage(SecretAction::Add, "a", Some("1"), AccessLevel::User))
            .await
            .unwrap();
        vault
            .manage(manage(SecretAction::Add, "b", Some("2"), AccessLevel::Admin))
            .await
            .unwrap();

        let as_user = vault
            .list(ListSecretsRequest {
                access_level: AccessLevel::User,
            })
            .await
            .unwrap();
        assert_eq!(as_user.ids, vec!["a"]);

        let as_admin = vault
            .list(ListSecretsRequest {
                access_level: AccessLevel::Admin,
            })
            .await
            .unwrap();
        assert_eq!(as_admin.ids, vec!["a", "b"]);
        assert_eq!(as_admin.count, 2);
    }

    #[tokio::test]
    async fn stats_are_admin_only() {
        let vault = SecretVault::default();
        vault
            .manage(manage(SecretAction::Add, "a", Some("1"), AccessLevel::User))
            .await
            .unwrap();
        vault
            .manage(manage(SecretAction::Add, "b", Some("2"), AccessLevel::SuperAdmin))
            .await
            .unwrap();

        let err = vault
            .stats(SecretStatsRequest {
                access_level: AccessLevel::User,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Failed(_)));

        let stats = vault
            .stats(SecretStatsRequest {
                access_level: AccessLevel::Admin,
            })
            .await
            .unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.user, 1);
        assert_eq!(stats.super_admin, 1);
    }
}
