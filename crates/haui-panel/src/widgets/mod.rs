pub mod slider;
pub mod status_indicator;
