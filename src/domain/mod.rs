// Domain layer - Plain data types and pure transformations
pub mod battery_temp;
pub mod charging;
pub mod chart;
pub mod column;
pub mod csv_data;
pub mod extremum;
pub mod telemetry;
pub mod time;
pub mod time_window;
