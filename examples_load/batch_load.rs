use std::time::Instant;

use app_event_formatter::{
    AppEventFormatter, BatchMode, FormatterConfig, JsonSerializer, Map, RawRecord, Value,
};
use chrono::Utc;

fn main() {
    let serializer = JsonSerializer::new(BatchMode::Newlines, true);
    let config = FormatterConfig::from_env();
    let formatter = match AppEventFormatter::with_config(serializer, config) {
        Ok(formatter) => formatter,
        Err(e) => {
            eprintln!("invalid formatter config: {}", e);
            return;
        }
    };

    // Wide payloads exercise the per-container item cap.
    let mut context = Map::new();
    for i in 0..1_500u64 {
        context.insert(format!("field{}", i), Value::from(i));
    }
    let batch: Vec<RawRecord> = (0..100)
        .map(|i| RawRecord::new(format!("load.event{}", i), "INFO", Utc::now(), context.clone()))
        .collect();

    let rounds: u64 = 100;
    let start = Instant::now();

    for _ in 0..rounds {
        if let Err(e) = formatter.format_batch(&batch) {
            eprintln!("failed to format batch: {}", e);
        }
    }

    let elapsed = start.elapsed();
    let records = rounds * batch.len() as u64;
    println!("batch mode: formatted {} records in {:?} (~{:.0} rec/s)",
        records,
        elapsed,
        records as f64 / elapsed.as_secs_f64()
    );
}
