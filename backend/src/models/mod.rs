pub mod forecast;
pub mod pollutant;
pub mod region;
pub mod series;
pub mod time;

pub use forecast::*;
pub use pollutant::*;
pub use region::*;
pub use series::*;
