use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Categories accepted for new demandas. Historic rows may carry values
/// removed from this list; they still list and aggregate normally.
pub const CATEGORIAS: [&str; 7] = [
    "Design",
    "Copy",
    "Tráfego Pago",
    "Automação",
    "Reunião",
    "Suporte",
    "Outro",
];

pub fn validate_categoria(value: &str) -> Result<(), ApiError> {
    if CATEGORIAS.contains(&value) {
        Ok(())
    } else {
        Err(ApiError::validation(
            "invalid_category",
            format!(
                "Categoria inválida: {value}. Categorias válidas: {}",
                CATEGORIAS.join(", ")
            ),
        ))
    }
}

/// Demanda lifecycle. Stored as TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Status {
    Pending,
    InProgress,
    Done,
}

impl Status {
    pub fn parse(value: &str) -> Result<Self, ApiError> {
        match value {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(ApiError::validation(
                "invalid_status",
                format!("Status inválido: {other}"),
            )),
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Pending
    }
}
