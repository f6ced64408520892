pub mod params;

pub use params::StatsParams;
