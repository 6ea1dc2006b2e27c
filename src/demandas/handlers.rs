use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use tracing::{info, instrument};

use crate::{
    auth::{jwt::AuthUser, role::Role},
    demandas::{
        catalog::{validate_categoria, Status, CATEGORIAS},
        dto::{CreateDemandaRequest, ListQuery, UpdateDemandaRequest},
        repo::{self, Demanda, DemandaFilter, DemandaPatch},
    },
    error::ApiError,
    state::AppState,
};

/// Ownership scope for listings: members only ever see their own rows, no
/// matter what filter they pass; managers and the supreme admin may target
/// any user or all of them.
pub fn resolve_scope(role: Role, requester_id: i64, requested: Option<i64>) -> Option<i64> {
    match role {
        Role::Member => Some(requester_id),
        Role::Manager | Role::SupremeAdmin => requested,
    }
}

fn validate_tempo(tempo: i64) -> Result<(), ApiError> {
    if tempo > 0 {
        Ok(())
    } else {
        Err(ApiError::validation(
            "invalid_tempo",
            "Tempo deve ser um número positivo de minutos",
        ))
    }
}

#[instrument(skip(state))]
pub async fn list_demandas(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Demanda>>, ApiError> {
    let filter = DemandaFilter {
        user_id: resolve_scope(identity.role, identity.id, query.user_id_filter()),
        categoria: query.categoria_filter(),
        status: query.status_filter(),
    };
    let demandas = repo::list(&state.db, &filter).await?;
    Ok(Json(demandas))
}

#[instrument(skip(state))]
pub async fn get_demanda(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Demanda>, ApiError> {
    repo::get_owned(&state.db, id, identity.id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Demanda não encontrada".into()))
}

#[instrument(skip(state, payload))]
pub async fn create_demanda(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<CreateDemandaRequest>,
) -> Result<(StatusCode, Json<Demanda>), ApiError> {
    let categoria = payload
        .categoria
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("missing_field", "Categoria é obrigatória"))?;
    validate_categoria(categoria)?;

    let cliente = payload
        .cliente
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("missing_field", "Cliente é obrigatório"))?;
    let descricao = payload
        .descricao
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("missing_field", "Descrição é obrigatória"))?;

    let tempo = payload
        .tempo
        .ok_or_else(|| ApiError::validation("missing_field", "Tempo é obrigatório"))?;
    validate_tempo(tempo)?;

    let status = match payload.status.as_deref() {
        Some(value) => Status::parse(value)?,
        None => Status::default(),
    };

    let demanda = repo::create(
        &state.db,
        identity.id,
        categoria,
        cliente,
        descricao,
        tempo,
        status,
    )
    .await?;

    info!(user_id = %identity.id, demanda_id = %demanda.id, "demanda created");
    Ok((StatusCode::CREATED, Json(demanda)))
}

#[instrument(skip(state, payload))]
pub async fn update_demanda(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateDemandaRequest>,
) -> Result<Json<Demanda>, ApiError> {
    let categoria = payload.categoria.filter(|s| !s.trim().is_empty());
    if let Some(categoria) = &categoria {
        validate_categoria(categoria)?;
    }
    let status = match payload.status.as_deref().filter(|s| !s.is_empty()) {
        Some(value) => Some(Status::parse(value)?),
        None => None,
    };
    if let Some(tempo) = payload.tempo {
        validate_tempo(tempo)?;
    }

    let patch = DemandaPatch {
        categoria,
        cliente: payload.cliente.filter(|s| !s.trim().is_empty()),
        descricao: payload.descricao.filter(|s| !s.trim().is_empty()),
        tempo: payload.tempo,
        status,
    };

    let updated = repo::update(&state.db, id, identity.id, &patch).await?;
    info!(user_id = %identity.id, demanda_id = %id, "demanda updated");
    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn delete_demanda(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    repo::delete(&state.db, id, identity.id).await?;
    info!(user_id = %identity.id, demanda_id = %id, "demanda deleted");
    Ok(Json(json!({ "message": "Demanda deletada" })))
}

pub async fn list_categorias() -> Json<Vec<&'static str>> {
    Json(CATEGORIAS.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::Identity;
    use crate::auth::repo::User;
    use crate::state::test_support::test_state;

    #[test]
    fn members_are_pinned_to_their_own_rows() {
        assert_eq!(resolve_scope(Role::Member, 1, None), Some(1));
        // A member passing someone else's id still only sees their own rows.
        assert_eq!(resolve_scope(Role::Member, 1, Some(2)), Some(1));
    }

    #[test]
    fn managers_choose_their_scope() {
        assert_eq!(resolve_scope(Role::Manager, 1, Some(2)), Some(2));
        assert_eq!(resolve_scope(Role::Manager, 1, None), None);
        assert_eq!(resolve_scope(Role::SupremeAdmin, 1, None), None);
    }

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

    fn create_body(categoria: &str, tempo: Option<i64>) -> CreateDemandaRequest {
        CreateDemandaRequest {
            categoria: Some(categoria.into()),
            cliente: Some("Empresa A".into()),
            descricao: Some("Peça".into()),
            tempo,
            status: None,
        }
    }

    #[tokio::test]
    async fn create_rejects_unknown_categoria() {
        let state = test_state(false).await;
        let identity = seed_identity(&state, "ana@agencia.com", Role::Member).await;
        let err = create_demanda(
            State(state),
            AuthUser(identity),
            Json(create_body("Nonexistent", Some(60))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "invalid_category");
        assert!(err.to_string().contains("Design"));
    }

    #[tokio::test]
    async fn create_rejects_non_positive_tempo() {
        let state = test_state(false).await;
        let identity = seed_identity(&state, "ana@agencia.com", Role::Member).await;
        let err = create_demanda(
            State(state.clone()),
            AuthUser(identity.clone()),
            Json(create_body("Design", Some(0))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "invalid_tempo");

        let err = create_demanda(
            State(state),
            AuthUser(identity),
            Json(create_body("Design", None)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "missing_field");
    }

    #[tokio::test]
    async fn create_defaults_to_pending_and_lists_for_owner_only() {
        let state = test_state(false).await;
        let ana = seed_identity(&state, "ana@agencia.com", Role::Member).await;
        let bia = seed_identity(&state, "bia@agencia.com", Role::Member).await;

        let (status, Json(created)) = create_demanda(
            State(state.clone()),
            AuthUser(ana.clone()),
            Json(create_body("Design", Some(60))),
        )
        .await
        .expect("create");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.status, Status::Pending);

        // Bia asking for Ana's rows by id still gets only her own (none).
        let Json(rows) = list_demandas(
            State(state),
            AuthUser(bia),
            Query(ListQuery {
                user_id: Some(ana.id.to_string()),
                ..Default::default()
            }),
        )
        .await
        .expect("list");
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn managers_can_list_across_users() {
        let state = test_state(false).await;
        let ana = seed_identity(&state, "ana@agencia.com", Role::Member).await;
        let chefe = seed_identity(&state, "chefe@agencia.com", Role::Manager).await;

        create_demanda(
            State(state.clone()),
            AuthUser(ana.clone()),
            Json(create_body("Design", Some(60))),
        )
        .await
        .expect("create");

        let Json(rows) = list_demandas(
            State(state.clone()),
            AuthUser(chefe.clone()),
            Query(ListQuery::default()),
        )
        .await
        .expect("list all");
        assert_eq!(rows.len(), 1);

        let Json(rows) = list_demandas(
            State(state),
            AuthUser(chefe),
            Query(ListQuery {
                user_id: Some(ana.id.to_string()),
                ..Default::default()
            }),
        )
        .await
        .expect("list filtered");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, ana.id);
    }

    #[tokio::test]
    async fn get_of_someone_elses_demanda_is_not_found() {
        let state = test_state(false).await;
        let ana = seed_identity(&state, "ana@agencia.com", Role::Member).await;
        let bia = seed_identity(&state, "bia@agencia.com", Role::Member).await;

        let (_, Json(created)) = create_demanda(
            State(state.clone()),
            AuthUser(ana),
            Json(create_body("Design", Some(60))),
        )
        .await
        .expect("create");

        let err = get_demanda(State(state), AuthUser(bia), Path(created.id))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn categorias_endpoint_returns_the_current_set() {
        let Json(categorias) = list_categorias().await;
        assert_eq!(categorias.len(), 7);
        assert!(categorias.contains(&"Outro"));
    }
}
