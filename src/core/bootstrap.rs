use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::AdminRole;
use crate::repositories;

/// Makes sure the configured superadmin can log in: staff account plus an active
/// superadmin profile with every capability.
pub(crate) async fn ensure_superuser(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_superuser_password.is_empty() {
        tracing::warn!("FIRST_SUPERUSER_PASSWORD not configured; skipping superuser creation");
        return Ok(());
    }

    let username = admin.first_superuser_email.trim().to_ascii_lowercase();
    let now = primitive_now_utc();
    let mut tx = state.db().begin().await?;

    let account = match repositories::accounts::find_by_username(&mut *tx, &username).await? {
        Some(account) => {
            let verified =
                security::verify_password(&admin.first_superuser_password, &account.hashed_password)
                    .unwrap_or(false);
            let hashed_password = if verified {
                None
            } else {
                Some(security::hash_password(&admin.first_superuser_password)?)
            };

            if hashed_password.is_some() || !account.is_active || !account.is_staff {
                repositories::accounts::update(
                    &mut *tx,
                    &account.id,
                    repositories::accounts::UpdateAccount {
                        hashed_password,
                        is_active: Some(true),
                        is_staff: Some(true),
                        updated_at: now,
                    },
                )
                .await?;
                tracing::info!(username = %username, "Updated default superuser");
            } else {
                tracing::info!("Default superuser already up to date");
            }
            account
        }
        None => {
            let account = repositories::accounts::create(
                &mut *tx,
                repositories::accounts::CreateAccount {
                    id: &Uuid::new_v4().to_string(),
                    username: &username,
                    email: &username,
                    hashed_password: security::hash_password(&admin.first_superuser_password)?,
                    first_name: "Super",
                    last_name: "Admin",
                    is_staff: true,
                    created_at: now,
                },
            )
            .await?;
            tracing::info!(username = %username, "Created default superuser");
            account
        }
    };

    repositories::admin_profiles::upsert(
        &mut *tx,
        repositories::admin_profiles::UpsertAdminProfile {
            id: &Uuid::new_v4().to_string(),
            account_id: &account.id,
            role: AdminRole::Superadmin,
            can_manage_students: true,
            can_manage_admins: true,
        },
    )
    .await?;

    tx.commit().await?;
    Ok(())
}
