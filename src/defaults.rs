pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_NOMINATIM_COUNTRY_CODES: &str = "in";
pub const DEFAULT_WAITING_TIME_URL: &str = "http://localhost:5190/api/centers/wait";
pub const DEFAULT_USER_AGENT: &str = "NearestCenters/1.0 (support@nearestcentersapi.com)";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

pub const RATE_LIMIT_MAX_IN_FLIGHT: usize = 1;
pub const RATE_LIMIT_COOLDOWN_MS: u64 = 1000;

pub const DEFAULT_MAX_DISTANCE_KM: f64 = 15.0;
pub const DEFAULT_TOP_N: usize = 2;

/// Fixed travel model: average speed in km/h and traffic inflation
pub const TRAVEL_SPEED_KMH: f64 = 20.0;
pub const TRAFFIC_FACTOR: f64 = 1.3;

pub const FLAGSHIP_WAIT_MINUTES: f64 = 10.0;
pub const MINUTES_PER_PATIENT: f64 = 60.0;
/// Assumed queue length when the waiting-time service cannot answer
pub const FALLBACK_PATIENT_COUNT: u32 = 1;
