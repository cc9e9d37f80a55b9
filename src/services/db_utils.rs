use std::fs;

use actix::{Actor, Addr, SyncArbiter, SyncContext};
use tracing::{info, warn};

use crate::config::Settings;
use crate::schema::Table;
use crate::services::table_store::TableStore;

/// Owns the table store. Each instance runs on its own `SyncArbiter` thread.
#[derive(Debug, Clone)]
pub struct StoreActor {
    pub store: TableStore,
    pub fuzzy_threshold: f64,
    pub strict_order_status: bool,
}

impl StoreActor {
    pub fn new(settings: &Settings) -> Self {
        StoreActor {
            store: TableStore::new(&settings.data_dir),
            fuzzy_threshold: settings.fuzzy_threshold,
            strict_order_status: settings.strict_order_status,
        }
    }
}

impl Actor for StoreActor {
    type Context = SyncContext<Self>;
}

pub struct AppState {
    /// Pool for requests that only read tables.
    pub readers: Addr<StoreActor>,
    /// Single thread, so read-modify-write cycles never interleave.
    pub writer: Addr<StoreActor>,
}

/// Starts the reader pool and the writer. Must run inside an actix system.
pub fn start_store(settings: &Settings) -> std::io::Result<AppState> {
    if !settings.data_dir.is_dir() {
        warn!("Data directory {} does not exist, creating it", settings.data_dir.display());
        fs::create_dir_all(&settings.data_dir)?;
    }

    let actor = StoreActor::new(settings);
    info!(
        "Serving tables from {} with {} reader thread(s)",
        actor.store.data_dir().display(),
        settings.reader_threads
    );

    for table in Table::ALL {
        if !actor.store.path_of(table).exists() {
            warn!("Table {table} is missing, reads on it will fail until it is created");
        }
    }

    let reader = actor.clone();
    let readers = SyncArbiter::start(settings.reader_threads, move || reader.clone());
    let writer = SyncArbiter::start(1, move || actor.clone());

    Ok(AppState { readers, writer })
}
