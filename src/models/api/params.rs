use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    pub dir: Option<String>,
}
