use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::PublicUser,
        jwt::AuthUser,
        repo::User,
        role::{Capability, Role},
    },
    demandas::{
        dto::ListQuery,
        repo::{self, Demanda, DemandaFilter},
    },
    error::ApiError,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SetUserTypeRequest {
    #[serde(rename = "userType")]
    pub user_type: Option<String>,
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<User>>, ApiError> {
    identity.role.require(Capability::ListUsers)?;
    let users = User::list_all(&state.db).await?;
    Ok(Json(users))
}

/// Team-wide demanda listing for review screens; same filters as the
/// member-facing route, without the ownership pin.
#[instrument(skip(state))]
pub async fn list_demandas(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Demanda>>, ApiError> {
    identity.role.require(Capability::ViewAllDemandas)?;
    let filter = DemandaFilter {
        user_id: query.user_id_filter(),
        categoria: query.categoria_filter(),
        status: query.status_filter(),
    };
    let demandas = repo::list(&state.db, &filter).await?;
    Ok(Json(demandas))
}

#[instrument(skip(state, payload))]
pub async fn set_user_type(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(target_id): Path<i64>,
    Json(payload): Json<SetUserTypeRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    identity.role.require(Capability::ChangeRoles)?;

    let value = payload
        .user_type
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("missing_field", "Tipo de usuário é obrigatório"))?;
    let role = Role::parse(value)?;

    let updated = User::set_role(&state.db, target_id, role).await?;
    info!(admin_id = %identity.id, target_id, role = %role, "user role changed");
    Ok(Json(updated.into()))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(target_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    identity.role.require(Capability::DeleteUsers)?;

    if target_id == identity.id {
        return Err(ApiError::validation(
            "cannot_delete_self",
            "Você não pode excluir a si mesmo",
        ));
    }

    User::delete_cascade(&state.db, target_id).await?;
    info!(admin_id = %identity.id, target_id, "user deleted");
    Ok(Json(json!({ "message": "Usuário deletado" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::Identity;
    use crate::demandas::catalog::Status;
    use crate::state::test_support::test_state;

    async fn seed_identity(state: &AppState, email: &str, role: Role) -> Identity {
        let user = User::create(&state.db, "Ana", email, "hash", role)
            .await
            .expect("seed user");
        Identity {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }

    #[tokio::test]
    async fn listings_require_manager_or_above() {
        let state = test_state(false).await;
        let member = seed_identity(&state, "ana@agencia.com", Role::Member).await;
        let manager = seed_identity(&state, "chefe@agencia.com", Role::Manager).await;

        let err = list_users(State(state.clone()), AuthUser(member.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
        let err = list_demandas(
            State(state.clone()),
            AuthUser(member),
            Query(ListQuery::default()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));

        let Json(users) = list_users(State(state.clone()), AuthUser(manager.clone()))
            .await
            .expect("manager lists users");
        assert_eq!(users.len(), 2);

        list_demandas(State(state), AuthUser(manager), Query(ListQuery::default()))
            .await
            .expect("manager lists demandas");
    }

    #[tokio::test]
    async fn admin_demanda_listing_spans_users_and_filters() {
        let state = test_state(false).await;
        let ana = seed_identity(&state, "ana@agencia.com", Role::Member).await;
        let bia = seed_identity(&state, "bia@agencia.com", Role::Member).await;
        let admin = seed_identity(&state, "admin@agencia.com", Role::SupremeAdmin).await;

        repo::create(&state.db, ana.id, "Design", "Empresa A", "Peça", 60, Status::Pending)
            .await
            .unwrap();
        repo::create(&state.db, bia.id, "Copy", "Empresa B", "Post", 30, Status::Done)
            .await
            .unwrap();

        let Json(all) = list_demandas(
            State(state.clone()),
            AuthUser(admin.clone()),
            Query(ListQuery::default()),
        )
        .await
        .expect("list all");
        assert_eq!(all.len(), 2);

        let Json(only_bia) = list_demandas(
            State(state),
            AuthUser(admin),
            Query(ListQuery {
                user_id: Some(bia.id.to_string()),
                ..Default::default()
            }),
        )
        .await
        .expect("filter by user");
        assert_eq!(only_bia.len(), 1);
        assert_eq!(only_bia[0].user_id, bia.id);
    }

    #[tokio::test]
    async fn role_changes_are_supreme_admin_only() {
        let state = test_state(false).await;
        let manager = seed_identity(&state, "chefe@agencia.com", Role::Manager).await;
        let admin = seed_identity(&state, "admin@agencia.com", Role::SupremeAdmin).await;
        let target = seed_identity(&state, "ana@agencia.com", Role::Member).await;

        let err = set_user_type(
            State(state.clone()),
            AuthUser(manager),
            Path(target.id),
            Json(SetUserTypeRequest {
                user_type: Some("manager".into()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));

        let err = set_user_type(
            State(state.clone()),
            AuthUser(admin.clone()),
            Path(target.id),
            Json(SetUserTypeRequest {
                user_type: Some("adm_supremo".into()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "invalid_role");

        let Json(updated) = set_user_type(
            State(state.clone()),
            AuthUser(admin.clone()),
            Path(target.id),
            Json(SetUserTypeRequest {
                user_type: Some("manager".into()),
            }),
        )
        .await
        .expect("promote to manager");
        assert_eq!(updated.role, Role::Manager);

        // Seat already taken by `admin`.
        let err = set_user_type(
            State(state),
            AuthUser(admin),
            Path(target.id),
            Json(SetUserTypeRequest {
                user_type: Some("supreme_admin".into()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::SupremeAdminExists));
    }

    #[tokio::test]
    async fn delete_user_refuses_self_and_cascades() {
        let state = test_state(false).await;
        let admin = seed_identity(&state, "admin@agencia.com", Role::SupremeAdmin).await;
        let target = seed_identity(&state, "ana@agencia.com", Role::Member).await;
        repo::create(
            &state.db,
            target.id,
            "Design",
            "Empresa A",
            "Peça",
            60,
            Status::Pending,
        )
        .await
        .unwrap();

        let err = delete_user(State(state.clone()), AuthUser(admin.clone()), Path(admin.id))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "cannot_delete_self");

        delete_user(State(state.clone()), AuthUser(admin.clone()), Path(target.id))
            .await
            .expect("delete");

        let Json(rows) = list_demandas(
            State(state.clone()),
            AuthUser(admin),
            Query(ListQuery {
                user_id: Some(target.id.to_string()),
                ..Default::default()
            }),
        )
        .await
        .expect("list");
        assert!(rows.is_empty());
        assert!(User::find_by_id(&state.db, target.id).await.unwrap().is_none());
    }
}
