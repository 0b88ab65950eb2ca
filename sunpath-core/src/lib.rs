pub mod engine;
pub mod error;
pub mod location;
pub mod request;
pub mod response;
pub mod series;
pub mod summary;
pub mod sun;
pub mod time_window;

pub use engine::{AstronomicalEngine, Atmosphere, ClearSkyModel, ClearSkySample, SpaEngine, Surface};
pub use error::{Result, SunpathError};
pub use location::Location;
pub use request::{BatchRequest, CalculationParams, CalculationRequest, ObjectSpec, RequestDefaults};
pub use response::{BatchItem, BatchResponse, CalculationResponse, Metadata};
pub use series::{IrradianceSample, PoaIrradiance, SeriesPoint, ShadowSample, ShadowStatus};
pub use summary::{ChannelStats, DailySummary, DailyTotals, ExtremeConditions, IrradianceStatistics};
pub use sun::{SunPosition, SunTimes};
pub use time_window::TimeWindow;
