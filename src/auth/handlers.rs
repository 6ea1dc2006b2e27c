use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, ProfileRequest, PublicUser, RegisterRequest},
        jwt::{AuthUser, Identity, JwtKeys},
        password::{hash_password, verify_password},
        repo::{ProfilePatch, User},
        role::Role,
    },
    error::ApiError,
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("missing_field", message))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let name = required(&payload.name, "Nome é obrigatório")?;
    let email = required(&payload.email, "Email é obrigatório")?.to_lowercase();
    let password = required(&payload.password, "Senha é obrigatória")?;

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::validation("invalid_email", "Email inválido"));
    }

    if password.len() < 6 {
        warn!("password too short");
        return Err(ApiError::validation("invalid_password", "Senha muito curta"));
    }

    let role = match payload.role.as_deref() {
        Some(value) => Role::parse(value)?,
        None => Role::default(),
    };
    // The bootstrap owns supreme admin assignment; registration never does.
    if role == Role::SupremeAdmin {
        return Err(ApiError::validation(
            "invalid_role",
            "Tipo de usuário inválido para cadastro",
        ));
    }

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::conflict("duplicate_email", "Email já cadastrado"));
    }

    let hash = hash_password(password)?;
    let user = User::create(&state.db, name, &email, &hash, role).await?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&Identity {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        role: user.role,
    })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = payload.email.unwrap_or_default().trim().to_lowercase();
    let password = payload.password.unwrap_or_default();

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| {
            warn!(email = %email, "login unknown email");
            ApiError::validation("invalid_credentials", "Usuário não encontrado")
        })?;

    if !verify_password(&password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(ApiError::validation("invalid_credentials", "Senha inválida"));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&Identity {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        role: user.role,
    })?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// Identity comes off the verified token; the row is fetched by the claimed
/// id so the response carries the stored avatar.
#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, identity.id)
        .await?
        .ok_or(ApiError::InvalidToken)?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<ProfileRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let mut patch = ProfilePatch {
        name: payload.name.filter(|s| !s.trim().is_empty()),
        avatar: payload.avatar.filter(|s| !s.trim().is_empty()),
        password_hash: None,
    };

    if let (Some(new_password), Some(current_password)) =
        (&payload.new_password, &payload.current_password)
    {
        let user = User::find_by_id(&state.db, identity.id)
            .await?
            .ok_or(ApiError::InvalidToken)?;
        if !verify_password(current_password, &user.password_hash)? {
            warn!(user_id = %identity.id, "profile update with wrong current password");
            return Err(ApiError::validation(
                "invalid_password",
                "Senha atual inválida",
            ));
        }
        patch.password_hash = Some(hash_password(new_password)?);
    }

    if patch.is_empty() {
        return Err(ApiError::validation(
            "no_fields_to_update",
            "Nenhum campo para atualizar",
        ));
    }

    let updated = User::update_profile(&state.db, identity.id, &patch).await?;
    info!(user_id = %identity.id, "profile updated");
    Ok(Json(updated.into()))
}
