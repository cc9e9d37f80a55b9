//! Response shapes of every endpoint, built from already loaded tables.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use crate::services::db_models::{
    Cafeteria, CafeteriaSucursal, Comida, ComidaIngrediente, Ingrediente, Pedido, PedidoComida,
    Sucursal, Usuario, UsuarioEncargado,
};
use crate::services::filters::{contains_ci, fuzzy_rank, keys_linked_to_any, union_by_key};
use crate::services::joins::{index_by, junction_join, junction_rows, lookup, lookup_join};
use crate::services::mutations::OrderStatus;
use crate::types::{Id, Text};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MenuItem {
    #[serde(flatten)]
    pub comida: Comida,
    pub sucursal: Option<Text>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SucursalResumen {
    #[serde(rename = "Id_Sucursal")]
    pub id: Id,
    #[serde(rename = "Nombre")]
    pub nombre: Option<Text>,
    #[serde(rename = "Horario", skip_serializing_if = "Option::is_none")]
    pub horario: Option<Text>,
    #[serde(rename = "Numero_Local", skip_serializing_if = "Option::is_none")]
    pub numero_local: Option<Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CafeteriaConSucursales {
    #[serde(rename = "Id_Cafeteria")]
    pub id: Id,
    #[serde(rename = "Nombre", skip_serializing_if = "Option::is_none")]
    pub nombre: Option<Text>,
    #[serde(rename = "Edificio", skip_serializing_if = "Option::is_none")]
    pub edificio: Option<Text>,
    #[serde(rename = "Sucursales")]
    pub sucursales: Vec<SucursalResumen>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComidaConIngredientes {
    #[serde(flatten)]
    pub comida: Comida,
    /// One entry per link; `None` when the link names an unknown ingredient.
    #[serde(rename = "Ingredientes")]
    pub ingredientes: Vec<Option<Text>>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Coincidencia {
    Exacta,
    Aproximada,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchHit<T> {
    #[serde(flatten)]
    pub item: T,
    #[serde(rename = "Coincidencia")]
    pub coincidencia: Coincidencia,
    #[serde(rename = "Similitud")]
    pub similitud: f64,
}

impl<T> SearchHit<T> {
    fn exact(item: T) -> Self {
        SearchHit { item, coincidencia: Coincidencia::Exacta, similitud: 1.0 }
    }

    fn approximate(item: T, similitud: f64) -> Self {
        SearchHit { item, coincidencia: Coincidencia::Aproximada, similitud }
    }
}

/// User fields that may leave the service.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PublicUsuario {
    #[serde(rename = "Id_Usuario")]
    pub id: Id,
    #[serde(rename = "Email")]
    pub email: Option<Text>,
    #[serde(rename = "Nombre")]
    pub nombre: Option<Text>,
    pub apellidos: Option<Text>,
    #[serde(rename = "Telefono")]
    pub telefono: Option<Value>,
    #[serde(rename = "Tipo")]
    pub tipo: Option<Text>,
    #[serde(rename = "Id_Cafeteria", skip_serializing_if = "Option::is_none")]
    pub cafeteria_id: Option<Id>,
    #[serde(rename = "Id_Sucursal", skip_serializing_if = "Option::is_none")]
    pub sucursal_id: Option<Id>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Success(PublicUsuario),
    UnknownEmail,
    WrongPassword,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TelefonoEncargado {
    #[serde(rename = "Id_Cafeteria")]
    pub cafeteria_id: Option<Id>,
    #[serde(rename = "Id_Sucursal")]
    pub sucursal_id: Option<Id>,
    #[serde(rename = "Telefono")]
    pub telefono: Option<Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComidaResumen {
    #[serde(rename = "Id_Comida")]
    pub id: Id,
    #[serde(rename = "Nombre")]
    pub nombre: Option<Text>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PedidoConComidas {
    #[serde(flatten)]
    pub pedido: Pedido,
    #[serde(rename = "Estado")]
    pub estado: &'static str,
    #[serde(rename = "Comidas")]
    pub comidas: Vec<ComidaResumen>,
}

/// Every food with the name of the cafeteria it is sold at.
///
/// `Cafeteria_Sucursal` is resolved against `Id_Cafeteria`, not against the
/// branch table. Some data snapshots store a branch id there, which then
/// resolves to the wrong name or to `null`; the join is kept as the clients
/// rely on it.
pub fn menus(comidas: &[Comida], cafeterias: &[Cafeteria]) -> Vec<MenuItem> {
    lookup_join(
        comidas,
        cafeterias,
        |comida| comida.cafeteria_sucursal.as_ref().and_then(Id::from_value),
        |cafeteria| cafeteria.id,
    )
    .into_iter()
    .map(|(comida, cafeteria)| MenuItem {
        comida: comida.clone(),
        sucursal: cafeteria.and_then(|c| c.nombre.clone()),
    })
    .collect()
}

pub fn cafeterias_con_sucursales(
    cafeterias: &[Cafeteria],
    links: &[CafeteriaSucursal],
    sucursales: &[Sucursal],
) -> Vec<CafeteriaConSucursales> {
    junction_join(
        cafeterias,
        |cafeteria| cafeteria.id,
        links,
        |link| link.cafeteria_id,
        |link| link.sucursal_id,
        sucursales,
        |sucursal| sucursal.id,
        |link, sucursal| SucursalResumen {
            id: link.sucursal_id,
            nombre: sucursal.and_then(|s| s.nombre.clone()),
            horario: link.horario.clone(),
            numero_local: link.numero_local.clone(),
        },
    )
    .into_iter()
    .map(|(cafeteria, sucursales)| CafeteriaConSucursales {
        id: cafeteria.id,
        nombre: cafeteria.nombre.clone(),
        edificio: cafeteria.edificio.clone(),
        sucursales,
    })
    .collect()
}

fn con_ingredientes(
    comida: &Comida,
    links: &[ComidaIngrediente],
    ingredientes: &[Ingrediente],
) -> ComidaConIngredientes {
    let nombres = junction_rows(
        comida.id,
        links,
        |link| link.comida_id,
        |link| link.ingrediente_id,
        ingredientes,
        |ingrediente| ingrediente.id,
    )
    .into_iter()
    .map(|(_, ingrediente)| ingrediente.and_then(|i| i.nombre.clone()))
    .collect();

    ComidaConIngredientes { comida: comida.clone(), ingredientes: nombres }
}

/// Keys of foods linked to at least one ingredient whose name contains `nombre`.
fn comidas_con_ingrediente_nombrado(
    nombre: &str,
    links: &[ComidaIngrediente],
    ingredientes: &[Ingrediente],
) -> HashSet<Id> {
    let wanted: HashSet<Id> = ingredientes
        .iter()
        .filter(|ingrediente| contains_ci(ingrediente.nombre.as_deref(), nombre))
        .map(|ingrediente| ingrediente.id)
        .collect();

    keys_linked_to_any(links, &wanted, |link| link.comida_id, |link| link.ingrediente_id)
        .into_iter()
        .collect()
}

/// Foods containing any of `ids`, united with foods whose own name or one of
/// whose ingredients' names contains `nombre`.
pub fn comidas_por_ingredientes(
    comidas: &[Comida],
    links: &[ComidaIngrediente],
    ingredientes: &[Ingrediente],
    ids: &[Id],
    nombre: Option<&str>,
) -> Vec<ComidaConIngredientes> {
    let wanted: HashSet<Id> = ids.iter().copied().collect();
    let por_ids: HashSet<Id> =
        keys_linked_to_any(links, &wanted, |link| link.comida_id, |link| link.ingrediente_id)
            .into_iter()
            .collect();

    let por_nombre: HashSet<Id> = match nombre {
        Some(nombre) => comidas
            .iter()
            .filter(|comida| contains_ci(comida.nombre.as_deref(), nombre))
            .map(|comida| comida.id)
            .chain(comidas_con_ingrediente_nombrado(nombre, links, ingredientes))
            .collect(),
        None => HashSet::new(),
    };

    union_by_key(comidas, &por_ids, &por_nombre, |comida| comida.id)
        .into_iter()
        .map(|comida| con_ingredientes(comida, links, ingredientes))
        .collect()
}

/// Foods by name: substring matches first, then approximate ones.
pub fn buscar_comidas(
    comidas: &[Comida],
    cafeterias: &[Cafeteria],
    query: &str,
    threshold: f64,
) -> Vec<SearchHit<MenuItem>> {
    let disponibles = menus(comidas, cafeterias);

    let (exactas, resto): (Vec<MenuItem>, Vec<MenuItem>) = disponibles
        .into_iter()
        .partition(|item| contains_ci(item.comida.nombre.as_deref(), query));

    let aproximadas = fuzzy_rank(&resto, query, threshold, |item| item.comida.nombre.as_deref());

    exactas
        .into_iter()
        .map(SearchHit::exact)
        .chain(
            aproximadas
                .into_iter()
                .map(|(item, score)| SearchHit::approximate(item.clone(), score)),
        )
        .collect()
}

/// Cafeterias (with their branches) by name: substring matches first, then
/// approximate ones.
pub fn buscar_cafeterias(
    cafeterias: &[Cafeteria],
    links: &[CafeteriaSucursal],
    sucursales: &[Sucursal],
    query: &str,
    threshold: f64,
) -> Vec<SearchHit<CafeteriaConSucursales>> {
    let (exactas, resto): (Vec<_>, Vec<_>) =
        cafeterias_con_sucursales(cafeterias, links, sucursales)
            .into_iter()
            .partition(|cafeteria| contains_ci(cafeteria.nombre.as_deref(), query));

    let aproximadas =
        fuzzy_rank(&resto, query, threshold, |cafeteria| cafeteria.nombre.as_deref());

    exactas
        .into_iter()
        .map(SearchHit::exact)
        .chain(
            aproximadas
                .into_iter()
                .map(|(item, score)| SearchHit::approximate(item.clone(), score)),
        )
        .collect()
}

/// Foods by ingredient name. Foods linked to an ingredient whose name contains
/// `query` come first in table order; foods reachable only through approximate
/// ingredient names follow, best score first.
pub fn buscar_por_ingrediente(
    comidas: &[Comida],
    links: &[ComidaIngrediente],
    ingredientes: &[Ingrediente],
    query: &str,
    threshold: f64,
) -> Vec<SearchHit<ComidaConIngredientes>> {
    let exactas = comidas_con_ingrediente_nombrado(query, links, ingredientes);

    let mut scores: HashMap<Id, f64> = HashMap::new();
    let cercanos = fuzzy_rank(ingredientes, query, threshold, |i| i.nombre.as_deref());
    for (ingrediente, score) in cercanos {
        for link in links.iter().filter(|link| link.ingrediente_id == ingrediente.id) {
            let best = scores.entry(link.comida_id).or_insert(score);
            *best = best.max(score);
        }
    }

    let mut hits: Vec<SearchHit<ComidaConIngredientes>> = comidas
        .iter()
        .filter(|comida| exactas.contains(&comida.id))
        .map(|comida| SearchHit::exact(con_ingredientes(comida, links, ingredientes)))
        .collect();

    let mut aproximadas: Vec<SearchHit<ComidaConIngredientes>> = comidas
        .iter()
        .filter(|comida| !exactas.contains(&comida.id))
        .filter_map(|comida| {
            let score = *scores.get(&comida.id)?;
            Some(SearchHit::approximate(con_ingredientes(comida, links, ingredientes), score))
        })
        .collect();
    aproximadas.sort_by(|a, b| b.similitud.total_cmp(&a.similitud));

    hits.extend(aproximadas);
    hits
}

fn public(usuario: &Usuario, encargados: &[UsuarioEncargado]) -> PublicUsuario {
    let asignacion = usuario
        .is_encargado()
        .then(|| lookup(encargados, usuario.id, |e| e.usuario_id))
        .flatten();

    PublicUsuario {
        id: usuario.id,
        email: usuario.email.clone(),
        nombre: usuario.nombre.clone(),
        apellidos: usuario.apellidos.clone(),
        telefono: usuario.telefono.clone(),
        tipo: usuario.tipo.clone(),
        cafeteria_id: asignacion.map(|a| a.cafeteria_id),
        sucursal_id: asignacion.map(|a| a.sucursal_id),
    }
}

/// Plain comparison of the stored password, as the user table keeps them.
pub fn authenticate(
    usuarios: &[Usuario],
    encargados: &[UsuarioEncargado],
    email: &str,
    contrasena: &str,
) -> LoginOutcome {
    match usuarios.iter().find(|usuario| usuario.has_email(email)) {
        None => LoginOutcome::UnknownEmail,
        Some(usuario) if usuario.contrasena.as_deref() != Some(contrasena) => {
            LoginOutcome::WrongPassword
        }
        Some(usuario) => LoginOutcome::Success(public(usuario, encargados)),
    }
}

pub fn telefonos_encargados(
    usuarios: &[Usuario],
    encargados: &[UsuarioEncargado],
) -> Vec<TelefonoEncargado> {
    usuarios
        .iter()
        .filter(|usuario| usuario.is_encargado())
        .map(|usuario| {
            let asignacion = lookup(encargados, usuario.id, |e| e.usuario_id);
            TelefonoEncargado {
                cafeteria_id: asignacion.map(|a| a.cafeteria_id),
                sucursal_id: asignacion.map(|a| a.sucursal_id),
                telefono: usuario.telefono.clone(),
            }
        })
        .collect()
}

/// Orders with their foods, optionally limited to one cafeteria and/or branch.
pub fn pedidos_con_comidas(
    pedidos: &[Pedido],
    links: &[PedidoComida],
    comidas: &[Comida],
    cafeteria: Option<Id>,
    sucursal: Option<Id>,
) -> Vec<PedidoConComidas> {
    let por_id = index_by(comidas, |comida| comida.id);

    pedidos
        .iter()
        .filter(|pedido| cafeteria.map_or(true, |id| pedido.cafeteria_id == Some(id)))
        .filter(|pedido| sucursal.map_or(true, |id| pedido.sucursal_id == Some(id)))
        .map(|pedido| {
            let comidas = links
                .iter()
                .filter(|link| link.orden_id == pedido.orden)
                .map(|link| ComidaResumen {
                    id: link.comida_id,
                    nombre: por_id.get(&link.comida_id).and_then(|c| c.nombre.clone()),
                })
                .collect();

            PedidoConComidas {
                pedido: pedido.clone(),
                estado: OrderStatus::of(pedido).label(),
                comidas,
            }
        })
        .collect()
}
