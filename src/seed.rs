use anyhow::Context;
use tracing::info;

use crate::auth::password::hash_password;
use crate::auth::repo::{NewUser, Role, User};
use crate::state::AppState;

/// Seed the configured admin account at startup. Self-registration never
/// grants the admin role, so this is the only way one enters the system.
pub async fn seed_admin(state: &AppState) -> anyhow::Result<()> {
    let Some(seed) = &state.config.admin_seed else {
        info!("admin seed not configured; skipping");
        return Ok(());
    };

    if User::find_by_email(&state.db, &seed.email).await?.is_some() {
        info!(email = %seed.email, "admin user already exists, skipping seed");
        return Ok(());
    }

    let password = seed.password.clone();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("join hash task")??;

    let admin = User::create(
        &state.db,
        &NewUser {
            email: &seed.email,
            password_hash: &hash,
            full_name: "Admin",
            role: Role::Admin,
            phone: None,
            gender: None,
            dob: None,
            school: None,
            class_level: None,
            verified: true,
            verification_code: None,
            code_sent_at: None,
        },
    )
    .await?;

    info!(user_id = %admin.id, email = %admin.email, "seeded admin user");
    Ok(())
}
