use std::fmt::{Display, Formatter};

use crate::services::db_models::{Keyed, Pedido};
use crate::types::{Id, ServiceError, StoreError, Text};

/// Key the next appended row gets: one past the largest key, or 1.
pub fn next_key<R: Keyed>(rows: &[R]) -> Result<Id, StoreError> {
    match rows.iter().map(Keyed::key).max() {
        None => Ok(Id(1)),
        Some(last) => last.next().ok_or(StoreError::KeysExhausted { table: R::TABLE, last }),
    }
}

/// Assigns the next key to `record` and pushes it last. Returns the key.
pub fn append_with_key<R: Keyed>(rows: &mut Vec<R>, mut record: R) -> Result<Id, StoreError> {
    let key = next_key(rows)?;
    record.set_key(key);
    rows.push(record);
    Ok(key)
}

/// Applies `update` to every row whose key is `key`. Keys are not assumed to be
/// unique, so several rows may change. Returns how many did.
pub fn update_where<R: Keyed>(rows: &mut [R], key: Id, mut update: impl FnMut(&mut R)) -> usize {
    let mut matched = 0;
    for row in rows.iter_mut().filter(|row| row.key() == key) {
        update(row);
        matched += 1;
    }
    matched
}

/// Lifecycle of an order as stored in `Pagado`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Created,
    Served,
    Cancelled,
}

impl OrderStatus {
    pub fn of(pedido: &Pedido) -> OrderStatus {
        match pedido.pagado.as_deref().map(str::trim) {
            Some("S") => OrderStatus::Served,
            Some("C") => OrderStatus::Cancelled,
            _ => OrderStatus::Created,
        }
    }

    pub fn code(&self) -> Option<&'static str> {
        match self {
            OrderStatus::Created => None,
            OrderStatus::Served => Some("S"),
            OrderStatus::Cancelled => Some("C"),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Created => "creado",
            OrderStatus::Served => "entregado",
            OrderStatus::Cancelled => "cancelado",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Created)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// Checks that an order may move from `from` to `to`.
///
/// Orders only leave `Created`. With `strict == false` any move between
/// terminal states is allowed too, so the last write wins.
pub fn transition(
    from: OrderStatus,
    to: OrderStatus,
    strict: bool,
) -> Result<OrderStatus, ServiceError> {
    if !to.is_terminal() {
        return Err(ServiceError::InvalidInput(
            "Un pedido no puede volver al estado creado.".into(),
        ));
    }
    if strict && from.is_terminal() && from != to {
        return Err(ServiceError::Conflict(format!(
            "El pedido ya fue {from}, no puede marcarse como {to}."
        )));
    }
    Ok(to)
}

/// Sets `Pagado` on every order numbered `orden`. Fails without touching
/// anything when no order matches or when the guard rejects one of them.
pub fn set_order_status(
    pedidos: &mut [Pedido],
    orden: Id,
    to: OrderStatus,
    strict: bool,
) -> Result<usize, ServiceError> {
    let mut found = false;
    for pedido in pedidos.iter().filter(|p| p.orden == orden) {
        transition(OrderStatus::of(pedido), to, strict)?;
        found = true;
    }

    if !found {
        return Err(ServiceError::NotFound(format!("No existe el pedido {orden}.")));
    }

    Ok(update_where(pedidos, orden, |pedido| pedido.pagado = to.code().map(Text::from)))
}
