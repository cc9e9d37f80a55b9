use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::Table;
use crate::types::{Id, Text};

/// Fields a row carries beyond the ones the service knows about. They are kept
/// so that rewriting a table never drops data.
pub type Extra = Map<String, Value>;

/// A row type bound to the table file it lives in.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + 'static {
    const TABLE: Table;
}

/// A row with a single numeric primary key.
pub trait Keyed: Record {
    fn key(&self) -> Id;
    fn set_key(&mut self, key: Id);
}

macro_rules! keyed {
    ($ty:ty, $field:ident) => {
        impl Keyed for $ty {
            fn key(&self) -> Id {
                self.$field
            }

            fn set_key(&mut self, key: Id) {
                self.$field = key;
            }
        }
    };
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cafeteria {
    #[serde(rename = "Id_Cafeteria")]
    pub id: Id,
    #[serde(rename = "Nombre", default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<Text>,
    #[serde(rename = "Edificio", default, skip_serializing_if = "Option::is_none")]
    pub edificio: Option<Text>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sucursal {
    #[serde(rename = "Id_Sucursal")]
    pub id: Id,
    #[serde(rename = "Nombre", default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<Text>,
    #[serde(rename = "Edificio", default, skip_serializing_if = "Option::is_none")]
    pub edificio: Option<Text>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CafeteriaSucursal {
    #[serde(rename = "Id_Cafeteria")]
    pub cafeteria_id: Id,
    #[serde(rename = "Id_Sucursal")]
    pub sucursal_id: Id,
    #[serde(rename = "Horario", default, skip_serializing_if = "Option::is_none")]
    pub horario: Option<Text>,
    #[serde(rename = "Numero_Local", default, skip_serializing_if = "Option::is_none")]
    pub numero_local: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comida {
    #[serde(rename = "Id_Comida")]
    pub id: Id,
    #[serde(rename = "Nombre", default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<Text>,
    #[serde(rename = "Precio", default, skip_serializing_if = "Option::is_none")]
    pub precio: Option<Value>,
    #[serde(rename = "TiempoPrepa", default, skip_serializing_if = "Option::is_none")]
    pub tiempo_prepa: Option<Value>,
    /// Legacy foreign key. Depending on the snapshot of the data it points at a
    /// cafeteria or at a cafeteria/branch pair, so it stays raw until a join
    /// normalizes it.
    #[serde(rename = "Cafeteria_Sucursal", default, skip_serializing_if = "Option::is_none")]
    pub cafeteria_sucursal: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingrediente {
    #[serde(rename = "Id_Ingrediente")]
    pub id: Id,
    #[serde(rename = "Nombre", default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<Text>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComidaIngrediente {
    #[serde(rename = "Id_Comida")]
    pub comida_id: Id,
    #[serde(rename = "Id_Ingrediente")]
    pub ingrediente_id: Id,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Usuario {
    #[serde(rename = "Id_Usuario")]
    pub id: Id,
    #[serde(rename = "Email", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Text>,
    #[serde(rename = "Contrasena", default, skip_serializing_if = "Option::is_none")]
    pub contrasena: Option<Text>,
    #[serde(rename = "Nombre", default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<Text>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apellidos: Option<Text>,
    #[serde(rename = "Telefono", default, skip_serializing_if = "Option::is_none")]
    pub telefono: Option<Value>,
    #[serde(rename = "Tipo", default, skip_serializing_if = "Option::is_none")]
    pub tipo: Option<Text>,
    #[serde(flatten)]
    pub extra: Extra,
}

pub const TIPO_ENCARGADO: &str = "Encargado";

impl Usuario {
    pub fn is_encargado(&self) -> bool {
        self.tipo.as_deref().map(str::trim) == Some(TIPO_ENCARGADO)
    }

    pub fn has_email(&self, email: &str) -> bool {
        self.email
            .as_deref()
            .is_some_and(|own| own.trim().eq_ignore_ascii_case(email.trim()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsuarioEncargado {
    #[serde(rename = "Id_Usuario")]
    pub usuario_id: Id,
    #[serde(rename = "Id_Cafeteria")]
    pub cafeteria_id: Id,
    #[serde(rename = "Id_Sucursal")]
    pub sucursal_id: Id,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pedido {
    #[serde(rename = "Orden")]
    pub orden: Id,
    #[serde(rename = "Id_Usuario", default, skip_serializing_if = "Option::is_none")]
    pub usuario_id: Option<Id>,
    #[serde(rename = "Id_Cafeteria", default, skip_serializing_if = "Option::is_none")]
    pub cafeteria_id: Option<Id>,
    #[serde(rename = "Id_Sucursal", default, skip_serializing_if = "Option::is_none")]
    pub sucursal_id: Option<Id>,
    #[serde(rename = "Pagado", default, skip_serializing_if = "Option::is_none")]
    pub pagado: Option<Text>,
    #[serde(rename = "Fecha", default, skip_serializing_if = "Option::is_none")]
    pub fecha: Option<Text>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PedidoComida {
    #[serde(rename = "Id_Orden")]
    pub orden_id: Id,
    #[serde(rename = "Id_Comida")]
    pub comida_id: Id,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Record for Cafeteria {
    const TABLE: Table = Table::Cafeterias;
}

impl Record for Sucursal {
    const TABLE: Table = Table::Sucursales;
}

impl Record for CafeteriaSucursal {
    const TABLE: Table = Table::CafeteriaSucursal;
}

impl Record for Comida {
    const TABLE: Table = Table::Comidas;
}

impl Record for Ingrediente {
    const TABLE: Table = Table::Ingredientes;
}

impl Record for ComidaIngrediente {
    const TABLE: Table = Table::ComidaIngrediente;
}

impl Record for Usuario {
    const TABLE: Table = Table::Usuarios;
}

impl Record for UsuarioEncargado {
    const TABLE: Table = Table::UsuarioEncargado;
}

impl Record for Pedido {
    const TABLE: Table = Table::Pedidos;
}

impl Record for PedidoComida {
    const TABLE: Table = Table::PedidoComida;
}

keyed!(Cafeteria, id);
keyed!(Sucursal, id);
keyed!(Comida, id);
keyed!(Ingrediente, id);
keyed!(Usuario, id);
keyed!(Pedido, orden);
