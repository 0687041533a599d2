use std::sync::Arc;

use sqlx::{Pool, Sqlite};

use crate::advisor::CareerAdvisor;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub advisor: Arc<CareerAdvisor>,
    pub config: Arc<Config>,
}
