//! Sensor traffic simulator.
//!
//! Connects to a running `sensor-ingest` driver and streams synthetic
//! frames from a handful of simulated sensors, for manual end-to-end
//! testing without a real TCP client population.
//!
//! ```bash
//! cargo run -p sensor-sim -- 8080 --sensors 4 --readings 200
//! ```

use rand::Rng;
use std::io::Write;
use std::net::TcpStream;
use std::time::{SystemTime, UNIX_EPOCH};

struct SimConfig {
    port: u16,
    sensors: u16,
    readings_per_sensor: u32,
}

fn parse_args() -> Result<SimConfig, String> {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from(mut args: impl Iterator<Item = String>) -> Result<SimConfig, String> {
    let port = args
        .next()
        .ok_or("missing port")?
        .parse::<u16>()
        .map_err(|e| e.to_string())?;

    let mut sensors = 4u16;
    let mut readings_per_sensor = 100u32;

    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--sensors" => {
                sensors = args
                    .next()
                    .ok_or("--sensors needs a value")?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| e.to_string())?;
            }
            "--readings" => {
                readings_per_sensor = args
                    .next()
                    .ok_or("--readings needs a value")?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| e.to_string())?;
            }
            other => return Err(format!("unrecognized flag: {other}")),
        }
    }

    Ok(SimConfig {
        port,
        sensors,
        readings_per_sensor,
    })
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

fn encode_frame(sensor_id: u16, value: f64, ts: i64) -> [u8; 18] {
    let mut buf = [0u8; 18];
    buf[0..2].copy_from_slice(&sensor_id.to_ne_bytes());
    buf[2..10].copy_from_slice(&value.to_ne_bytes());
    buf[10..18].copy_from_slice(&ts.to_ne_bytes());
    buf
}

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("usage: sensor-sim <port> [--sensors N] [--readings N]");
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let mut stream = TcpStream::connect(("127.0.0.1", config.port))
        .unwrap_or_else(|e| panic!("could not connect to 127.0.0.1:{}: {e}", config.port));

    let mut rng = rand::thread_rng();
    let mut sent = 0u64;
    for _ in 0..config.readings_per_sensor {
        for sensor_id in 0..config.sensors {
            let value = 18.0 + rng.gen_range(-2.0..2.0);
            let frame = encode_frame(sensor_id, value, now_secs());
            stream
                .write_all(&frame)
                .expect("sensor-ingest connection dropped");
            sent += 1;
        }
    }

    println!("sent {sent} readings from {} sensors", config.sensors);
}
