use crate::record::Record;
use sbuf::{Consumer, Sbuf};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, trace, warn};

/// How many standard deviations a reading must deviate from its sensor's
/// running mean, after warm-up, to be flagged as an anomaly.
const ANOMALY_DEVIATION_FACTOR: f64 = 3.0;

/// Minimum number of readings from a sensor before its running statistics
/// are trusted enough to flag anomalies.
const WARMUP_READINGS: u64 = 5;

/// Running mean/variance for one sensor, updated with Welford's algorithm
/// so it needs no history buffer.
#[derive(Default)]
struct RunningStat {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStat {
    fn update(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    fn stddev(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64).sqrt()
        }
    }
}

/// Domain validation / threshold monitoring for sensor readings.
///
/// Tracks a per-sensor running average; once a sensor has enough history,
/// a reading that deviates too far from its own running mean is logged as
/// an anomaly. This is a deliberately small stand-in for a real
/// sensor-to-room mapping and anomaly pipeline, which are out of scope.
pub fn run(buf: Arc<Sbuf<Record>>) {
    let mut stats: HashMap<u16, RunningStat> = HashMap::new();
    let mut processed: u64 = 0;

    loop {
        let record = match buf.remove(Consumer::Data) {
            Ok(record) => record,
            Err(_terminated) => break,
        };

        let stat = stats.entry(record.sensor_id).or_default();
        if stat.count >= WARMUP_READINGS {
            let stddev = stat.stddev();
            if stddev > 0.0 && (record.value - stat.mean).abs() > ANOMALY_DEVIATION_FACTOR * stddev
            {
                warn!(
                    sensor_id = record.sensor_id,
                    value = record.value,
                    mean = stat.mean,
                    stddev,
                    "anomalous reading"
                );
            }
        }
        stat.update(record.value);
        processed += 1;
        trace!(sensor_id = record.sensor_id, value = record.value, "processed reading");
    }

    info!(processed, sensors = stats.len(), "data manager drained and exiting");
}
