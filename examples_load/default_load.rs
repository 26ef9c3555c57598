use std::time::Instant;

use app_event_formatter::{AppEventFormatter, JsonSerializer, Map, RawRecord, Value};
use chrono::Utc;

fn main() {
    let formatter = AppEventFormatter::new(JsonSerializer::default());

    let mut context = Map::new();
    context.insert("username".to_string(), Value::from("william"));
    context.insert("attempt".to_string(), Value::from(1));
    let record = RawRecord::new("login.success", "NOTICE", Utc::now(), context);

    let n: u64 = 100_000;
    let start = Instant::now();
    let mut bytes = 0usize;

    for _ in 0..n {
        match formatter.format(&record) {
            Ok(line) => bytes += line.len(),
            Err(e) => eprintln!("failed to format record: {}", e),
        }
    }

    let elapsed = start.elapsed();
    println!("default config: formatted {} records ({} bytes) in {:?} (~{:.0} rec/s)",
        n,
        bytes,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
