use std::fs;
use std::path::Path;

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{test, App};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Settings;
use crate::schema::Table;
use crate::services::configure;
use crate::services::db_utils::start_store;

fn write_table(dir: &Path, table: Table, rows: Value) {
    fs::write(dir.join(table.file_name()), serde_json::to_string_pretty(&rows).unwrap()).unwrap();
}

fn read_table(dir: &Path, table: Table) -> Value {
    serde_json::from_str(&fs::read_to_string(dir.join(table.file_name())).unwrap()).unwrap()
}

fn seed(dir: &Path) {
    write_table(dir, Table::Cafeterias, json!([{ "Id_Cafeteria": 1, "Nombre": "Central" }]));
    write_table(dir, Table::Sucursales, json!([{ "Id_Sucursal": 10, "Nombre": "Norte" }]));
    write_table(
        dir,
        Table::CafeteriaSucursal,
        json!([{ "Id_Cafeteria": 1, "Id_Sucursal": 10, "Horario": "8-17", "Numero_Local": "A1" }]),
    );
    write_table(
        dir,
        Table::Comidas,
        json!([
            {
                "Id_Comida": 1, "Nombre": "Torta de jamón", "Precio": 45,
                "TiempoPrepa": 10, "Cafeteria_Sucursal": 1
            },
            {
                "Id_Comida": 2, "Nombre": "Ensalada", "Precio": 60,
                "TiempoPrepa": 5, "Cafeteria_Sucursal": 10
            }
        ]),
    );
    write_table(
        dir,
        Table::Ingredientes,
        json!([
            { "Id_Ingrediente": 1, "Nombre": "Jamón" },
            { "Id_Ingrediente": 2, "Nombre": "Lechuga" },
            { "Id_Ingrediente": 3, "Nombre": "Aguacate" }
        ]),
    );
    write_table(
        dir,
        Table::ComidaIngrediente,
        json!([
            { "Id_Comida": 1, "Id_Ingrediente": 1 },
            { "Id_Comida": 2, "Id_Ingrediente": 2 }
        ]),
    );
    write_table(
        dir,
        Table::Usuarios,
        json!([
            {
                "Id_Usuario": 1, "Email": "ana@campus.mx", "Contrasena": "1234",
                "Nombre": "Ana", "apellidos": "López", "Telefono": "5551110000", "Tipo": "normal"
            },
            {
                "Id_Usuario": 4, "Email": "beto@campus.mx", "Contrasena": "abcd",
                "Nombre": "Beto", "apellidos": "Ruiz", "Telefono": "5552220000", "Tipo": "Encargado"
            }
        ]),
    );
    write_table(
        dir,
        Table::UsuarioEncargado,
        json!([{ "Id_Usuario": 4, "Id_Cafeteria": 1, "Id_Sucursal": 10 }]),
    );
    write_table(dir, Table::Pedidos, json!([]));
    write_table(dir, Table::PedidoComida, json!([]));
}

fn settings_for(dir: &Path) -> Settings {
    Settings {
        data_dir: dir.to_path_buf(),
        reader_threads: 2,
        ..Settings::default()
    }
}

async fn init_app(
    settings: Settings,
) -> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error> {
    let state = Data::new(start_store(&settings).unwrap());
    test::init_service(App::new().app_data(state).configure(configure)).await
}

async fn get(
    app: &impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
    uri: &str,
) -> (StatusCode, Value) {
    let resp = test::call_service(app, test::TestRequest::get().uri(uri).to_request()).await;
    let status = resp.status();
    (status, test::read_body_json(resp).await)
}

async fn post(
    app: &impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
    uri: &str,
    body: Value,
) -> (StatusCode, Value) {
    let req = test::TestRequest::post().uri(uri).set_json(body).to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    (status, test::read_body_json(resp).await)
}

#[actix_web::test]
async fn cafeterias_roll_up_branches_and_are_idempotent() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    let app = init_app(settings_for(dir.path())).await;

    let (status, first) = get(&app, "/cafeterias").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        first,
        json!([{
            "Id_Cafeteria": 1,
            "Nombre": "Central",
            "Sucursales": [{
                "Id_Sucursal": 10,
                "Nombre": "Norte",
                "Horario": "8-17",
                "Numero_Local": "A1"
            }]
        }])
    );

    let (_, second) = get(&app, "/cafeterias").await;
    assert_eq!(first, second);
}

#[actix_web::test]
async fn menus_carry_the_cafeteria_name() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    let app = init_app(settings_for(dir.path())).await;

    let (status, body) = get(&app, "/menus").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["sucursal"], json!("Central"));
    assert_eq!(body[0]["Precio"], json!(45));
    // A branch id in the legacy key does not resolve against cafeterias.
    assert_eq!(body[1]["sucursal"], Value::Null);
}

#[actix_web::test]
async fn foods_by_ingredient_ids_and_name() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    let app = init_app(settings_for(dir.path())).await;

    let (status, body) = get(&app, "/comidasxingredientes?ingredientes=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["Id_Comida"], json!(1));
    assert_eq!(body[0]["Ingredientes"], json!(["Jamón"]));

    let (_, body) = get(&app, "/comidasxingredientes?ingredientes=1&nombre=lechu").await;
    let ids: Vec<&Value> = body.as_array().unwrap().iter().map(|c| &c["Id_Comida"]).collect();
    assert_eq!(ids, vec![&json!(1), &json!(2)]);

    let (status, body) = get(&app, "/comidasxingredientes?ingredientes=3,99").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[actix_web::test]
async fn foods_by_ingredients_needs_a_filter() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    let app = init_app(settings_for(dir.path())).await;

    let (status, body) = get(&app, "/comidasxingredientes").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], json!("invalid_input"));
    assert!(body["error"].is_string());

    let (status, _) = get(&app, "/comidasxingredientes?ingredientes=uno").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn search_requires_a_known_type() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    let app = init_app(settings_for(dir.path())).await;

    let (status, _) = get(&app, "/buscar?query=torta").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/buscar?query=torta&tipo=bebida").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(&app, "/buscar?query=ensalda&tipo=comida").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["Id_Comida"], json!(2));
    assert_eq!(body[0]["Coincidencia"], json!("aproximada"));

    let (_, body) = get(&app, "/buscar?query=central&tipo=cafeteria").await;
    assert_eq!(body[0]["Sucursales"][0]["Nombre"], json!("Norte"));
    assert_eq!(body[0]["Coincidencia"], json!("exacta"));

    let (_, body) = get(&app, "/buscar?query=lechuga&tipo=ingrediente").await;
    assert_eq!(body[0]["Id_Comida"], json!(2));
    assert_eq!(body[0]["Ingredientes"], json!(["Lechuga"]));
}

#[actix_web::test]
async fn login_statuses() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    let app = init_app(settings_for(dir.path())).await;

    let unknown = json!({ "Correo": "nadie@campus.mx", "Contrasena": "x" });
    let (status, body) = post(&app, "/login", unknown).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["usuario"], Value::Null);
    assert_eq!(body["success"], json!(false));

    let wrong = json!({ "Email": "ana@campus.mx", "Contrasena": "mala" });
    let (status, _) = post(&app, "/login", wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post(&app, "/login", json!({ "Correo": "ana@campus.mx" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let manager = json!({ "Correo": "beto@campus.mx", "Contrasena": "abcd" });
    let (status, body) = post(&app, "/login", manager).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["usuario"]["Id_Usuario"], json!(4));
    assert_eq!(body["usuario"]["Id_Sucursal"], json!(10));
    assert!(body["usuario"].get("Contrasena").is_none());
}

#[actix_web::test]
async fn created_users_get_the_next_key() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    let app = init_app(settings_for(dir.path())).await;

    let (_, before) = get(&app, "/usuarios").await;

    let (status, body) = post(
        &app,
        "/usuarios/crear",
        json!({
            "Email": "caro@campus.mx",
            "Contrasena": "pass",
            "Nombre": "Caro",
            "Tipo": "normal"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usuario"], json!(5));

    let (_, after) = get(&app, "/usuarios").await;
    let after = after.as_array().unwrap();
    assert_eq!(after.len(), 3);
    assert_eq!(&after[..2], before.as_array().unwrap().as_slice());
    assert_eq!(after[2]["Id_Usuario"], json!(5));

    let (status, body) = post(&app, "/usuarios/crear", json!({ "Email": "CARO@campus.mx" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    let (status, _) = post(&app, "/usuarios/crear", json!({ "Nombre": "Sin correo" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn new_managers_are_assigned_and_listed() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    let app = init_app(settings_for(dir.path())).await;

    let (status, _) = post(
        &app,
        "/usuarios/crear",
        json!({
            "Email": "dani@campus.mx",
            "Telefono": "5553330000",
            "Tipo": "Encargado",
            "Id_Cafeteria": 1,
            "Id_Sucursal": 10
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, phones) = get(&app, "/telefonos/encargados").await;
    assert_eq!(
        phones,
        json!([
            { "Id_Cafeteria": 1, "Id_Sucursal": 10, "Telefono": "5552220000" },
            { "Id_Cafeteria": 1, "Id_Sucursal": 10, "Telefono": "5553330000" }
        ])
    );
}

#[actix_web::test]
async fn orders_are_written_with_their_foods() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    let app = init_app(settings_for(dir.path())).await;

    let pedido = json!({
        "Pedido": { "Id_Usuario": 1, "Id_Cafeteria": 1, "Id_Sucursal": 10 },
        "Comida": [1, 2]
    });
    let (status, body) = post(&app, "/pedido/agregar", pedido.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "Status": true }));
    post(&app, "/pedido/agregar", pedido).await;

    let pedidos = read_table(dir.path(), Table::Pedidos);
    assert_eq!(pedidos[0]["Orden"], json!(1));
    assert_eq!(pedidos[1]["Orden"], json!(2));
    assert!(pedidos[0].get("Pagado").is_none());
    assert!(pedidos[0]["Fecha"].is_string());

    let links = read_table(dir.path(), Table::PedidoComida);
    assert_eq!(links.as_array().unwrap().len(), 4);
    assert_eq!(links[2], json!({ "Id_Orden": 2, "Id_Comida": 1 }));

    let (_, scoped) = get(&app, "/pedidos?Id_Cafeteria=1&Id_Sucursal=10").await;
    assert_eq!(scoped[0]["Estado"], json!("creado"));
    assert_eq!(scoped[0]["Comidas"][1]["Nombre"], json!("Ensalada"));

    let (_, other) = get(&app, "/pedidos?Id_Sucursal=11").await;
    assert_eq!(other, json!([]));
}

#[actix_web::test]
async fn terminal_orders_keep_their_status() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    write_table(dir.path(), Table::Pedidos, json!([{ "Orden": 7, "Id_Usuario": 1 }]));
    let settings = Settings { strict_order_status: true, ..settings_for(dir.path()) };
    let app = init_app(settings).await;

    let (status, body) = post(&app, "/pedido/entregado", json!({ "Orden": 7 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(true));

    let (status, body) = post(&app, "/pedido/cancelado", json!({ "Orden": 7 })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], json!("conflict"));
    assert_eq!(read_table(dir.path(), Table::Pedidos)[0]["Pagado"], json!("S"));

    let (status, _) = post(&app, "/pedido/cancelado", json!({ "Orden": 8 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post(&app, "/pedido/cancelado", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn by_default_the_last_status_write_wins() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    write_table(dir.path(), Table::Pedidos, json!([{ "Orden": 7 }]));
    let app = init_app(settings_for(dir.path())).await;

    post(&app, "/pedido/entregado", json!({ "Orden": 7 })).await;
    let (status, _) = post(&app, "/pedido/cancelado", json!({ "Orden": 7 })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(read_table(dir.path(), Table::Pedidos)[0]["Pagado"], json!("C"));
}

#[actix_web::test]
async fn hand_edited_numbers_in_text_columns_still_load() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    write_table(
        dir.path(),
        Table::Cafeterias,
        json!([{ "Id_Cafeteria": 1, "Nombre": "Central", "Edificio": 58 }]),
    );
    write_table(
        dir.path(),
        Table::Comidas,
        json!([{
            "Id_Comida": 1,
            "Nombre": "Torta de jamón",
            "Precio": "45.50",
            "Cafeteria_Sucursal": 1
        }]),
    );
    write_table(
        dir.path(),
        Table::Usuarios,
        json!([{
            "Id_Usuario": 1,
            "Email": "ana@campus.mx",
            "Contrasena": 1234,
            "Nombre": "Ana",
            "Tipo": "normal"
        }]),
    );
    let app = init_app(settings_for(dir.path())).await;

    let (status, cafeterias) = get(&app, "/cafeterias").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cafeterias[0]["Edificio"], json!(58));

    let (status, menus) = get(&app, "/menus").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(menus[0]["Precio"], json!("45.50"));
    assert_eq!(menus[0]["sucursal"], json!("Central"));

    let typed = json!({ "Email": "ana@campus.mx", "Contrasena": "1234" });
    let (status, body) = post(&app, "/login", typed).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usuario"]["Id_Usuario"], json!(1));

    let numeric = json!({ "Email": "ana@campus.mx", "Contrasena": 1234 });
    let (status, _) = post(&app, "/login", numeric).await;
    assert_eq!(status, StatusCode::OK);

    post(&app, "/usuarios/crear", json!({ "Email": "beto@campus.mx", "Contrasena": "x" })).await;
    assert_eq!(read_table(dir.path(), Table::Usuarios)[0]["Contrasena"], json!(1234));
}

#[actix_web::test]
async fn broken_tables_answer_500() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    fs::remove_file(dir.path().join(Table::Sucursales.file_name())).unwrap();
    fs::write(dir.path().join(Table::Comidas.file_name()), "[{").unwrap();
    let app = init_app(settings_for(dir.path())).await;

    let (status, body) = get(&app, "/cafeterias").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("Error al cargar los datos"));

    let (status, body) = get(&app, "/menus").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], json!("storage"));
}

#[actix_web::test]
async fn malformed_bodies_are_bad_requests() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    let app = init_app(settings_for(dir.path())).await;

    let (status, body) = post(&app, "/pedido/agregar", json!({ "Pedido": {} })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], json!("invalid_input"));

    let (status, _) = post(&app, "/pedido/agregar", json!({ "Pedido": {}, "Comida": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let seeded = read_table(dir.path(), Table::Pedidos);
    assert_eq!(seeded, json!([]));
}
