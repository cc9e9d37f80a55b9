use actix::MailboxError;
use actix_web::web::{self, ServiceConfig};
use actix_web::{get, HttpResponse, Responder, ResponseError};
use serde::Serialize;

use crate::types::{ServiceError, ServiceResult};

pub mod assembler;
pub mod db_models;
pub mod db_utils;
pub mod filters;
pub mod insertable;
pub mod joins;
pub mod messages;
pub mod mutations;
pub mod store_handling;
pub mod table_store;

/// Registers every route. Shared by the server and the HTTP tests.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ServiceError::InvalidInput(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ServiceError::InvalidInput(err.to_string()).into()),
    )
    .service(home_page)
    .service(menu_route::view_menus)
    .service(menu_route::foods_by_ingredients)
    .service(menu_route::fetch_ingredients)
    .service(cafeteria_route::fetch_cafeterias)
    .service(search_route::search)
    .service(user_route::login)
    .service(user_route::fetch_manager_phones)
    .service(
        web::scope("/usuarios")
            .service(user_route::fetch_users)
            .service(user_route::create_user),
    )
    .service(order_route::fetch_orders)
    .service(
        web::scope("/pedido")
            .service(order_route::add_order)
            .service(order_route::mark_served)
            .service(order_route::mark_cancelled),
    )
    .service(web::scope("/test").service(test_route::healthcheck));
}

/// Turns the answer of a store actor into a response.
fn respond<T: Serialize>(answer: Result<ServiceResult<T>, MailboxError>) -> HttpResponse {
    match answer {
        Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
        Ok(Err(err)) => err.error_response(),
        Err(err) => ServiceError::from(err).error_response(),
    }
}

#[get("/")]
pub async fn home_page() -> impl Responder {
    HttpResponse::Ok().body("Campus cafeteria service")
}

// "/menus", "/comidasxingredientes", "/ingredientes"
pub mod menu_route {
    use actix_web::web::{Data, Query};
    use actix_web::{get, Responder, ResponseError};
    use serde::Deserialize;

    use super::respond;
    use crate::services::db_utils::AppState;
    use crate::services::filters::parse_id_list;
    use crate::services::messages::{FetchComidasPorIngredientes, FetchIngredientes, FetchMenus};
    use crate::types::ServiceError;

    #[get("/menus")]
    pub async fn view_menus(state: Data<AppState>) -> impl Responder {
        respond(state.readers.send(FetchMenus).await)
    }

    #[derive(Deserialize)]
    pub struct FoodsByIngredientsQuery {
        pub ingredientes: Option<String>,
        pub nombre: Option<String>,
    }

    #[get("/comidasxingredientes")]
    pub async fn foods_by_ingredients(
        state: Data<AppState>,
        query: Query<FoodsByIngredientsQuery>,
    ) -> impl Responder {
        let FoodsByIngredientsQuery { ingredientes, nombre } = query.into_inner();

        let ids = match parse_id_list(ingredientes.as_deref().unwrap_or_default()) {
            Ok(ids) => ids,
            Err(err) => return err.error_response(),
        };
        let nombre = nombre.map(|n| n.trim().to_owned()).filter(|n| !n.is_empty());

        if ids.is_empty() && nombre.is_none() {
            let message = "Se requiere una lista de ingredientes o un nombre.";
            return ServiceError::InvalidInput(message.into()).error_response();
        }

        respond(state.readers.send(FetchComidasPorIngredientes { ids, nombre }).await)
    }

    #[get("/ingredientes")]
    pub async fn fetch_ingredients(state: Data<AppState>) -> impl Responder {
        respond(state.readers.send(FetchIngredientes).await)
    }
}

// "/cafeterias"
pub mod cafeteria_route {
    use actix_web::web::Data;
    use actix_web::{get, Responder};

    use super::respond;
    use crate::services::db_utils::AppState;
    use crate::services::messages::FetchCafeterias;

    #[get("/cafeterias")]
    pub async fn fetch_cafeterias(state: Data<AppState>) -> impl Responder {
        respond(state.readers.send(FetchCafeterias).await)
    }
}

// "/buscar"
pub mod search_route {
    use actix_web::web::{Data, Query};
    use actix_web::{get, Responder, ResponseError};
    use serde::Deserialize;

    use super::respond;
    use crate::services::db_utils::AppState;
    use crate::services::messages::{Search, SearchKind};
    use crate::types::ServiceError;

    #[derive(Deserialize)]
    pub struct SearchQuery {
        pub query: Option<String>,
        pub tipo: Option<String>,
    }

    #[get("/buscar")]
    pub async fn search(state: Data<AppState>, params: Query<SearchQuery>) -> impl Responder {
        let SearchQuery { query, tipo } = params.into_inner();

        let kind = match tipo.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(tipo) => match tipo.parse::<SearchKind>() {
                Ok(kind) => kind,
                Err(err) => return err.error_response(),
            },
            None => {
                return ServiceError::InvalidInput("Se requiere el parámetro tipo.".into())
                    .error_response()
            }
        };

        respond(
            state
                .readers
                .send(Search { query: query.unwrap_or_default(), kind })
                .await,
        )
    }
}

// "/login", "/usuarios", "/telefonos/encargados"
pub mod user_route {
    use actix_web::http::StatusCode;
    use actix_web::web::{Data, Json};
    use actix_web::{get, post, HttpResponse, Responder, ResponseError};
    use serde::{Deserialize, Serialize};

    use super::respond;
    use crate::services::assembler::{LoginOutcome, PublicUsuario};
    use crate::services::db_utils::AppState;
    use crate::services::insertable::NewUsuario;
    use crate::services::messages::{CreateUsuario, FetchTelefonosEncargados, FetchUsuarios, Login};
    use crate::types::{Id, ServiceError, Text};

    #[derive(Serialize)]
    pub struct UserEnvelope<T> {
        pub success: bool,
        pub message: String,
        pub usuario: Option<T>,
    }

    fn envelope<T: Serialize>(
        status: StatusCode,
        message: &str,
        usuario: Option<T>,
    ) -> HttpResponse {
        HttpResponse::build(status).json(UserEnvelope {
            success: status.is_success(),
            message: message.to_owned(),
            usuario,
        })
    }

    #[derive(Deserialize)]
    pub struct LoginBody {
        #[serde(rename = "Correo")]
        pub correo: Option<Text>,
        #[serde(rename = "Email")]
        pub email: Option<Text>,
        #[serde(rename = "Contrasena")]
        pub contrasena: Option<Text>,
    }

    #[post("/login")]
    pub async fn login(state: Data<AppState>, body: Json<LoginBody>) -> impl Responder {
        let LoginBody { correo, email, contrasena } = body.into_inner();

        let email = correo.or(email).map(|e| e.trim().to_owned()).filter(|e| !e.is_empty());
        let contrasena = contrasena.map(|c| c.as_str().to_owned()).filter(|c| !c.is_empty());
        let (email, contrasena) = match (email, contrasena) {
            (Some(email), Some(contrasena)) => (email, contrasena),
            _ => {
                return envelope::<PublicUsuario>(
                    StatusCode::BAD_REQUEST,
                    "Correo y contraseña son obligatorios.",
                    None,
                )
            }
        };

        match state.readers.send(Login { email, contrasena }).await {
            Ok(Ok(LoginOutcome::Success(usuario))) => {
                envelope(StatusCode::OK, "Inicio de sesión exitoso.", Some(usuario))
            }
            Ok(Ok(LoginOutcome::UnknownEmail)) => {
                envelope::<PublicUsuario>(StatusCode::NOT_FOUND, "Usuario no encontrado.", None)
            }
            Ok(Ok(LoginOutcome::WrongPassword)) => {
                envelope::<PublicUsuario>(StatusCode::UNAUTHORIZED, "Contraseña incorrecta.", None)
            }
            Ok(Err(err)) => err.error_response(),
            Err(err) => ServiceError::from(err).error_response(),
        }
    }

    #[get("")]
    pub async fn fetch_users(state: Data<AppState>) -> impl Responder {
        respond(state.readers.send(FetchUsuarios).await)
    }

    #[post("/crear")]
    pub async fn create_user(state: Data<AppState>, body: Json<NewUsuario>) -> impl Responder {
        match state.writer.send(CreateUsuario(body.into_inner())).await {
            Ok(Ok(id)) => envelope(StatusCode::OK, "Usuario creado correctamente.", Some(id)),
            Ok(Err(ServiceError::InvalidInput(message))) => {
                envelope::<Id>(StatusCode::BAD_REQUEST, &message, None)
            }
            Ok(Err(err)) => err.error_response(),
            Err(err) => ServiceError::from(err).error_response(),
        }
    }

    #[get("/telefonos/encargados")]
    pub async fn fetch_manager_phones(state: Data<AppState>) -> impl Responder {
        respond(state.readers.send(FetchTelefonosEncargados).await)
    }
}

// "/pedido", "/pedidos"
pub mod order_route {
    use actix_web::web::{Data, Json, Query};
    use actix_web::{get, post, HttpResponse, Responder, ResponseError};
    use serde::Deserialize;
    use serde_json::json;

    use super::respond;
    use crate::services::db_utils::AppState;
    use crate::services::insertable::NewPedido;
    use crate::services::messages::{AddPedido, FetchPedidos, SetOrderStatus};
    use crate::services::mutations::OrderStatus;
    use crate::types::{Id, ServiceError};

    #[post("/agregar")]
    pub async fn add_order(state: Data<AppState>, body: Json<NewPedido>) -> impl Responder {
        match state.writer.send(AddPedido(body.into_inner())).await {
            Ok(Ok(_)) => HttpResponse::Ok().json(json!({ "Status": true })),
            Ok(Err(err)) => err.error_response(),
            Err(err) => ServiceError::from(err).error_response(),
        }
    }

    #[derive(Deserialize)]
    pub struct OrdenBody {
        #[serde(rename = "Orden")]
        pub orden: Option<Id>,
    }

    async fn set_status(state: &AppState, body: OrdenBody, status: OrderStatus) -> HttpResponse {
        let Some(orden) = body.orden else {
            return ServiceError::InvalidInput("Se requiere el número de orden.".into())
                .error_response();
        };

        match state.writer.send(SetOrderStatus { orden, status }).await {
            Ok(Ok(_)) => HttpResponse::Ok().json(true),
            Ok(Err(err)) => err.error_response(),
            Err(err) => ServiceError::from(err).error_response(),
        }
    }

    #[post("/entregado")]
    pub async fn mark_served(state: Data<AppState>, body: Json<OrdenBody>) -> impl Responder {
        set_status(&state, body.into_inner(), OrderStatus::Served).await
    }

    #[post("/cancelado")]
    pub async fn mark_cancelled(state: Data<AppState>, body: Json<OrdenBody>) -> impl Responder {
        set_status(&state, body.into_inner(), OrderStatus::Cancelled).await
    }

    #[derive(Deserialize)]
    pub struct OrdersQuery {
        #[serde(rename = "Id_Cafeteria")]
        pub cafeteria: Option<Id>,
        #[serde(rename = "Id_Sucursal")]
        pub sucursal: Option<Id>,
    }

    #[get("/pedidos")]
    pub async fn fetch_orders(state: Data<AppState>, query: Query<OrdersQuery>) -> impl Responder {
        let OrdersQuery { cafeteria, sucursal } = query.into_inner();
        respond(state.readers.send(FetchPedidos { cafeteria, sucursal }).await)
    }
}

// sub-route "/test"
pub mod test_route {
    use actix_web::{get, HttpResponse, Responder};

    #[get("/healthcheck")]
    pub async fn healthcheck() -> impl Responder {
        HttpResponse::Ok().body("I'm alive!")
    }
}
