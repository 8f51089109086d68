//! Autocentile Status Tool
//!
//! Provides runtime status information and usage instructions.

use serde::Serialize;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::config::CentileConfig;

/// Centile calculation instructions for AI assistants
pub const CENTILE_INSTRUCTIONS: &str = r#"
# Auto Centile Calculator Instructions

Calculates growth centiles and SDS (z-scores) for children by sending
measurements to the RCPCH growth API. No centile maths is done locally.

## calculate_centiles

Required:
- `birth_date` and `measurement_date`: `25-12-2020`, `25/12/2020`, `2020-12-25`,
  optionally followed by a time (`25-12-2020 14:30`)
- `sex`: `"1"` for male; any other value is treated as female

At least one of:
- `weight` (kg), `height` (cm), `ofc` (head circumference, cm)

Optional:
- `gestation_weeks` (default 40) and `gestation_days` (default 0)
- `measurement_method`: `height`, `length`, `standing_height` or `supine_length`
- `dob_format` / `measurement_date_format`: field validation types such as
  `date_dmy`, `date_mdy`, `date_ymd`. Pass these whenever the date order is known:
  without a hint `03-04-2020` is read as 3 April 2020.

BMI is always derived from weight and height (weight / (height in m)², 2 dp).
Never send BMI yourself.

## Reading the response

`{"success": true, "results": {"weight": {...}, "height": {...}, "bmi": {...}}}`

Each result holds `centile`, `sds`, `centile_band`, `age_error`, `corrected_age`
and `clinical_advice`, any of which may be null. A measurement the API rejected
holds only `error`; the other measurements are still valid.

`{"success": false, "error": "..."}` means nothing was calculated: fix the input
(missing field, unreadable date, no measurement) and try again.

## calculate_form_centiles

Pass the instrument name and the current form values keyed by field name. The
configured field mapping decides which fields are read and written; the result
lists the output fields to set (centile to 1 dp, SDS to 2 dp). An empty value
means clear the field.
"#;

/// Runtime status of the autocentile service
#[derive(Debug, Clone, Serialize)]
pub struct AutocentileStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Growth API configuration
    pub endpoint: String,
    pub reference: &'static str,
    pub api_key_configured: bool,
    pub strict_dates: bool,
    pub target_instruments: Vec<String>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    config: CentileConfig,
}

impl StatusTracker {
    pub fn new(config: CentileConfig) -> Self {
        Self {
            start_time: Instant::now(),
            config,
        }
    }

    pub fn get_status(&self) -> AutocentileStatus {
        let build_info = BuildInfo::current();

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        AutocentileStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            endpoint: self.config.endpoint(),
            reference: self.config.reference.as_str(),
            api_key_configured: self.config.api_key.is_some(),
            strict_dates: self.config.strict_dates,
            target_instruments: self
                .config
                .fields
                .instruments()
                .into_iter()
                .map(String::from)
                .collect(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
