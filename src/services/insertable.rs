use serde::Deserialize;
use serde_json::Value;

use crate::services::db_models::{Extra, Pedido, PedidoComida, Usuario, UsuarioEncargado};
use crate::types::{Id, Text};

/// Body of `POST /usuarios/crear`. The key is assigned on append.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUsuario {
    #[serde(rename = "Email", default)]
    pub email: Option<Text>,
    #[serde(rename = "Contrasena", default)]
    pub contrasena: Option<Text>,
    #[serde(rename = "Nombre", default)]
    pub nombre: Option<Text>,
    #[serde(default)]
    pub apellidos: Option<Text>,
    #[serde(rename = "Telefono", default)]
    pub telefono: Option<Value>,
    #[serde(rename = "Tipo", default)]
    pub tipo: Option<Text>,
    /// Branch a manager is assigned to. Only used for `Tipo = "Encargado"`.
    #[serde(rename = "Id_Cafeteria", default)]
    pub cafeteria_id: Option<Id>,
    #[serde(rename = "Id_Sucursal", default)]
    pub sucursal_id: Option<Id>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl NewUsuario {
    pub fn into_usuario(self) -> (Usuario, Option<(Id, Id)>) {
        let mut extra = self.extra;
        extra.remove("Id_Usuario");

        let usuario = Usuario {
            id: Id::default(),
            email: self.email.map(|email| Text::from(email.trim())),
            contrasena: self.contrasena,
            nombre: self.nombre,
            apellidos: self.apellidos,
            telefono: self.telefono,
            tipo: self.tipo,
            extra,
        };

        let asignacion = match (usuario.is_encargado(), self.cafeteria_id, self.sucursal_id) {
            (true, Some(cafeteria), Some(sucursal)) => Some((cafeteria, sucursal)),
            _ => None,
        };

        (usuario, asignacion)
    }
}

pub fn new_encargado(usuario_id: Id, (cafeteria_id, sucursal_id): (Id, Id)) -> UsuarioEncargado {
    UsuarioEncargado { usuario_id, cafeteria_id, sucursal_id, extra: Extra::new() }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPedidoFields {
    #[serde(rename = "Id_Usuario", default)]
    pub usuario_id: Option<Id>,
    #[serde(rename = "Id_Cafeteria", default)]
    pub cafeteria_id: Option<Id>,
    #[serde(rename = "Id_Sucursal", default)]
    pub sucursal_id: Option<Id>,
    #[serde(rename = "Fecha", default)]
    pub fecha: Option<Text>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// One food id or a list of them.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ComidaSelection {
    One(Id),
    Many(Vec<Id>),
}

impl ComidaSelection {
    pub fn ids(&self) -> Vec<Id> {
        match self {
            ComidaSelection::One(id) => vec![*id],
            ComidaSelection::Many(ids) => ids.clone(),
        }
    }
}

/// Body of `POST /pedido/agregar`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPedido {
    #[serde(rename = "Pedido")]
    pub pedido: NewPedidoFields,
    #[serde(rename = "Comida")]
    pub comida: ComidaSelection,
}

impl NewPedido {
    /// The order row (key still unassigned, status `Created`) and the foods to
    /// link to it.
    pub fn into_rows(self, now: chrono::DateTime<chrono::Utc>) -> (Pedido, Vec<Id>) {
        let NewPedido { pedido, comida } = self;

        let mut extra = pedido.extra;
        extra.remove("Orden");
        extra.remove("Pagado");

        let row = Pedido {
            orden: Id::default(),
            usuario_id: pedido.usuario_id,
            cafeteria_id: pedido.cafeteria_id,
            sucursal_id: pedido.sucursal_id,
            pagado: None,
            fecha: pedido.fecha.or_else(|| Some(Text::from(now.to_rfc3339()))),
            extra,
        };

        (row, comida.ids())
    }
}

pub fn order_food(orden_id: Id, comida_id: Id) -> PedidoComida {
    PedidoComida { orden_id, comida_id, extra: Extra::new() }
}
