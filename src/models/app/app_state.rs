use crate::utils::ReportStore;

#[derive(Clone)]
pub struct AppState {
    pub store: ReportStore,
}

impl AppState {
    pub fn new(store: ReportStore) -> Self {
        Self { store }
    }
}
