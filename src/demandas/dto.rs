use serde::Deserialize;

/// Body for POST /demandas. Fields optional so gaps surface as validation
/// errors with pt-BR messages instead of body rejections.
#[derive(Debug, Deserialize)]
pub struct CreateDemandaRequest {
    pub categoria: Option<String>,
    pub cliente: Option<String>,
    pub descricao: Option<String>,
    pub tempo: Option<i64>,
    pub status: Option<String>,
}

/// Body for PATCH /demandas/:id — only present fields change.
#[derive(Debug, Deserialize)]
pub struct UpdateDemandaRequest {
    pub categoria: Option<String>,
    pub cliente: Option<String>,
    pub descricao: Option<String>,
    pub tempo: Option<i64>,
    pub status: Option<String>,
}

/// Query string for listings. `userId` arrives as text so an empty value
/// (``?userId=``) reads as "no filter" rather than a rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub categoria: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

impl ListQuery {
    pub fn categoria_filter(&self) -> Option<String> {
        self.categoria.clone().filter(|s| !s.is_empty())
    }

    pub fn status_filter(&self) -> Option<String> {
        self.status.clone().filter(|s| !s.is_empty())
    }

    pub fn user_id_filter(&self) -> Option<i64> {
        self.user_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse().ok())
    }
}
