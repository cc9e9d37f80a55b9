// Table layout of the data directory. Every table is one JSON document holding
// an array of objects.

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Cafeterias,
    Sucursales,
    CafeteriaSucursal,
    Comidas,
    Ingredientes,
    ComidaIngrediente,
    Usuarios,
    UsuarioEncargado,
    Pedidos,
    PedidoComida,
}

impl Table {
    pub const ALL: [Table; 10] = [
        Table::Cafeterias,
        Table::Sucursales,
        Table::CafeteriaSucursal,
        Table::Comidas,
        Table::Ingredientes,
        Table::ComidaIngrediente,
        Table::Usuarios,
        Table::UsuarioEncargado,
        Table::Pedidos,
        Table::PedidoComida,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Table::Cafeterias => "TCafeteria.json",
            Table::Sucursales => "TSucursal.json",
            Table::CafeteriaSucursal => "TCafeteriaSuc.json",
            Table::Comidas => "TComida.json",
            Table::Ingredientes => "TIngredientes.json",
            Table::ComidaIngrediente => "TComida_Ingre.json",
            Table::Usuarios => "TUsuario.json",
            Table::UsuarioEncargado => "TUsuarioEncargado.json",
            Table::Pedidos => "TPedido.json",
            Table::PedidoComida => "TPedido_Comida.json",
        }
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(self.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_table_has_its_own_file() {
        let names: HashSet<&str> = Table::ALL.iter().map(Table::file_name).collect();
        assert_eq!(names.len(), Table::ALL.len());
        assert!(names.iter().all(|name| name.ends_with(".json")));
    }
}
