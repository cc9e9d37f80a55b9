use std::str::FromStr;

use actix::Message;
use serde::Serialize;

use crate::services::assembler::{
    CafeteriaConSucursales, ComidaConIngredientes, LoginOutcome, MenuItem, PedidoConComidas,
    SearchHit, TelefonoEncargado,
};
use crate::services::db_models::{Ingrediente, Usuario};
use crate::services::insertable::{NewPedido, NewUsuario};
use crate::services::mutations::OrderStatus;
use crate::types::{Id, ServiceError, ServiceResult};

#[derive(Message)]
#[rtype(result = "ServiceResult<Vec<MenuItem>>")]
pub struct FetchMenus;

#[derive(Message)]
#[rtype(result = "ServiceResult<Vec<CafeteriaConSucursales>>")]
pub struct FetchCafeterias;

#[derive(Message)]
#[rtype(result = "ServiceResult<Vec<ComidaConIngredientes>>")]
pub struct FetchComidasPorIngredientes {
    pub ids: Vec<Id>,
    pub nombre: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Comida,
    Cafeteria,
    Ingrediente,
}

impl FromStr for SearchKind {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "comida" => Ok(SearchKind::Comida),
            "cafeteria" => Ok(SearchKind::Cafeteria),
            "ingrediente" => Ok(SearchKind::Ingrediente),
            other => Err(ServiceError::InvalidInput(format!(
                "Tipo de búsqueda '{other}' no válido. Use comida, cafeteria o ingrediente."
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SearchResults {
    Comidas(Vec<SearchHit<MenuItem>>),
    Cafeterias(Vec<SearchHit<CafeteriaConSucursales>>),
    Ingredientes(Vec<SearchHit<ComidaConIngredientes>>),
}

#[derive(Message)]
#[rtype(result = "ServiceResult<SearchResults>")]
pub struct Search {
    pub query: String,
    pub kind: SearchKind,
}

#[derive(Message)]
#[rtype(result = "ServiceResult<LoginOutcome>")]
pub struct Login {
    pub email: String,
    pub contrasena: String,
}

#[derive(Message)]
#[rtype(result = "ServiceResult<Id>")]
pub struct CreateUsuario(pub NewUsuario);

#[derive(Message)]
#[rtype(result = "ServiceResult<Vec<Usuario>>")]
pub struct FetchUsuarios;

#[derive(Message)]
#[rtype(result = "ServiceResult<Vec<Ingrediente>>")]
pub struct FetchIngredientes;

#[derive(Message)]
#[rtype(result = "ServiceResult<Id>")]
pub struct AddPedido(pub NewPedido);

#[derive(Message)]
#[rtype(result = "ServiceResult<usize>")]
pub struct SetOrderStatus {
    pub orden: Id,
    pub status: OrderStatus,
}

#[derive(Message)]
#[rtype(result = "ServiceResult<Vec<PedidoConComidas>>")]
pub struct FetchPedidos {
    pub cafeteria: Option<Id>,
    pub sucursal: Option<Id>,
}

#[derive(Message)]
#[rtype(result = "ServiceResult<Vec<TelefonoEncargado>>")]
pub struct FetchTelefonosEncargados;
