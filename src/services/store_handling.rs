use actix::Handler;
use tracing::info;

use crate::services::assembler::{
    authenticate, buscar_cafeterias, buscar_comidas, buscar_por_ingrediente,
    cafeterias_con_sucursales, comidas_por_ingredientes, menus, pedidos_con_comidas,
    telefonos_encargados, CafeteriaConSucursales, ComidaConIngredientes, LoginOutcome, MenuItem,
    PedidoConComidas, TelefonoEncargado,
};
use crate::services::db_models::{
    Cafeteria, CafeteriaSucursal, Comida, ComidaIngrediente, Ingrediente, Pedido, PedidoComida,
    Sucursal, Usuario, UsuarioEncargado,
};
use crate::services::db_utils::StoreActor;
use crate::services::insertable::{new_encargado, order_food};
use crate::services::messages::{
    AddPedido, CreateUsuario, FetchCafeterias, FetchComidasPorIngredientes, FetchIngredientes,
    FetchMenus, FetchPedidos, FetchTelefonosEncargados, FetchUsuarios, Login, Search, SearchKind,
    SearchResults, SetOrderStatus,
};
use crate::services::mutations::{append_with_key, set_order_status};
use crate::services::table_store::Changeset;
use crate::types::{Id, ServiceError, ServiceResult};

impl Handler<FetchMenus> for StoreActor {
    type Result = ServiceResult<Vec<MenuItem>>;

    fn handle(&mut self, _msg: FetchMenus, _ctx: &mut Self::Context) -> Self::Result {
        let cafeterias: Vec<Cafeteria> = self.store.load()?;
        let comidas: Vec<Comida> = self.store.load()?;

        Ok(menus(&comidas, &cafeterias))
    }
}

impl Handler<FetchCafeterias> for StoreActor {
    type Result = ServiceResult<Vec<CafeteriaConSucursales>>;

    fn handle(&mut self, _msg: FetchCafeterias, _ctx: &mut Self::Context) -> Self::Result {
        let cafeterias: Vec<Cafeteria> = self.store.load()?;
        let sucursales: Vec<Sucursal> = self.store.load()?;
        let links: Vec<CafeteriaSucursal> = self.store.load()?;

        Ok(cafeterias_con_sucursales(&cafeterias, &links, &sucursales))
    }
}

impl Handler<FetchComidasPorIngredientes> for StoreActor {
    type Result = ServiceResult<Vec<ComidaConIngredientes>>;

    fn handle(
        &mut self,
        msg: FetchComidasPorIngredientes,
        _ctx: &mut Self::Context,
    ) -> Self::Result {
        let ingredientes: Vec<Ingrediente> = self.store.load()?;
        let comidas: Vec<Comida> = self.store.load()?;
        let links: Vec<ComidaIngrediente> = self.store.load()?;

        Ok(comidas_por_ingredientes(
            &comidas,
            &links,
            &ingredientes,
            &msg.ids,
            msg.nombre.as_deref(),
        ))
    }
}

impl Handler<Search> for StoreActor {
    type Result = ServiceResult<SearchResults>;

    fn handle(&mut self, msg: Search, _ctx: &mut Self::Context) -> Self::Result {
        let threshold = self.fuzzy_threshold;

        let results = match msg.kind {
            SearchKind::Comida => {
                let comidas: Vec<Comida> = self.store.load()?;
                let cafeterias: Vec<Cafeteria> = self.store.load()?;
                SearchResults::Comidas(buscar_comidas(&comidas, &cafeterias, &msg.query, threshold))
            }
            SearchKind::Cafeteria => {
                let cafeterias: Vec<Cafeteria> = self.store.load()?;
                let sucursales: Vec<Sucursal> = self.store.load()?;
                let links: Vec<CafeteriaSucursal> = self.store.load()?;
                SearchResults::Cafeterias(buscar_cafeterias(
                    &cafeterias,
                    &links,
                    &sucursales,
                    &msg.query,
                    threshold,
                ))
            }
            SearchKind::Ingrediente => {
                let comidas: Vec<Comida> = self.store.load()?;
                let ingredientes: Vec<Ingrediente> = self.store.load()?;
                let links: Vec<ComidaIngrediente> = self.store.load()?;
                SearchResults::Ingredientes(buscar_por_ingrediente(
                    &comidas,
                    &links,
                    &ingredientes,
                    &msg.query,
                    threshold,
                ))
            }
        };

        Ok(results)
    }
}

impl Handler<Login> for StoreActor {
    type Result = ServiceResult<LoginOutcome>;

    fn handle(&mut self, msg: Login, _ctx: &mut Self::Context) -> Self::Result {
        let usuarios: Vec<Usuario> = self.store.load()?;
        let encargados: Vec<UsuarioEncargado> = self.store.load_or_empty()?;

        Ok(authenticate(&usuarios, &encargados, &msg.email, &msg.contrasena))
    }
}

impl Handler<CreateUsuario> for StoreActor {
    type Result = ServiceResult<Id>;

    fn handle(&mut self, msg: CreateUsuario, _ctx: &mut Self::Context) -> Self::Result {
        let (usuario, asignacion) = msg.0.into_usuario();

        let email = match usuario.email.as_deref() {
            Some(email) if !email.is_empty() => email.to_owned(),
            _ => return Err(ServiceError::InvalidInput("El campo Email es obligatorio.".into())),
        };

        let mut usuarios: Vec<Usuario> = self.store.load_or_empty()?;
        if usuarios.iter().any(|existing| existing.has_email(&email)) {
            return Err(ServiceError::InvalidInput("El correo ya está registrado.".into()));
        }

        let id = append_with_key(&mut usuarios, usuario)?;

        let mut changeset = Changeset::default();
        changeset.stage(&usuarios)?;
        if let Some(asignacion) = asignacion {
            let mut encargados: Vec<UsuarioEncargado> = self.store.load_or_empty()?;
            encargados.push(new_encargado(id, asignacion));
            changeset.stage(&encargados)?;
        }
        self.store.commit(changeset)?;

        info!("Created user {id}");
        Ok(id)
    }
}

impl Handler<FetchUsuarios> for StoreActor {
    type Result = ServiceResult<Vec<Usuario>>;

    fn handle(&mut self, _msg: FetchUsuarios, _ctx: &mut Self::Context) -> Self::Result {
        Ok(self.store.load()?)
    }
}

impl Handler<FetchIngredientes> for StoreActor {
    type Result = ServiceResult<Vec<Ingrediente>>;

    fn handle(&mut self, _msg: FetchIngredientes, _ctx: &mut Self::Context) -> Self::Result {
        Ok(self.store.load()?)
    }
}

impl Handler<AddPedido> for StoreActor {
    type Result = ServiceResult<Id>;

    fn handle(&mut self, msg: AddPedido, _ctx: &mut Self::Context) -> Self::Result {
        let (pedido, comida_ids) = msg.0.into_rows(chrono::Utc::now());
        if comida_ids.is_empty() {
            return Err(ServiceError::InvalidInput(
                "El pedido debe incluir al menos una comida.".into(),
            ));
        }

        let mut pedidos: Vec<Pedido> = self.store.load_or_empty()?;
        let mut links: Vec<PedidoComida> = self.store.load_or_empty()?;

        let orden = append_with_key(&mut pedidos, pedido)?;
        links.extend(comida_ids.iter().map(|comida_id| order_food(orden, *comida_id)));

        // Both tables or neither.
        let mut changeset = Changeset::default();
        changeset.stage(&pedidos)?.stage(&links)?;
        self.store.commit(changeset)?;

        info!("Created order {orden} with {} food(s)", comida_ids.len());
        Ok(orden)
    }
}

impl Handler<SetOrderStatus> for StoreActor {
    type Result = ServiceResult<usize>;

    fn handle(&mut self, msg: SetOrderStatus, _ctx: &mut Self::Context) -> Self::Result {
        let mut pedidos: Vec<Pedido> = self.store.load()?;

        let changed =
            set_order_status(&mut pedidos, msg.orden, msg.status, self.strict_order_status)?;
        self.store.save(&pedidos)?;

        info!("Order {} marked as {} ({changed} row(s))", msg.orden, msg.status);
        Ok(changed)
    }
}

impl Handler<FetchPedidos> for StoreActor {
    type Result = ServiceResult<Vec<PedidoConComidas>>;

    fn handle(&mut self, msg: FetchPedidos, _ctx: &mut Self::Context) -> Self::Result {
        let pedidos: Vec<Pedido> = self.store.load_or_empty()?;
        let links: Vec<PedidoComida> = self.store.load_or_empty()?;
        let comidas: Vec<Comida> = self.store.load()?;

        Ok(pedidos_con_comidas(&pedidos, &links, &comidas, msg.cafeteria, msg.sucursal))
    }
}

impl Handler<FetchTelefonosEncargados> for StoreActor {
    type Result = ServiceResult<Vec<TelefonoEncargado>>;

    fn handle(&mut self, _msg: FetchTelefonosEncargados, _ctx: &mut Self::Context) -> Self::Result {
        let usuarios: Vec<Usuario> = self.store.load()?;
        let encargados: Vec<UsuarioEncargado> = self.store.load_or_empty()?;

        Ok(telefonos_encargados(&usuarios, &encargados))
    }
}
