pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod crypto;
pub mod db;
pub mod store;
pub mod validation;

pub use db::DbPool;

use store::{AttendanceStore, StudentStore};

pub struct AppState {
    pub students: StudentStore,
    pub attendance: AttendanceStore,
}

impl AppState {
    pub fn new(db: DbPool) -> Self {
        Self {
            students: StudentStore::new(db.clone()),
            attendance: AttendanceStore::new(db),
        }
    }
}
