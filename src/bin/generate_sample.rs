use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};

const REGIONS: [&str; 4] = ["North", "South", "East", "West"];
const DAYS: i64 = 120;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = SimpleRng::new(42);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).context("invalid start date")?;

    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_data.csv".to_string());
    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("creating {output_path}"))?;
    writer.write_record(["date", "region", "units", "price", "revenue"])?;

    let mut rows = 0usize;
    for day in 0..DAYS {
        let date = start + Duration::days(day);
        // Gentle upward trend with weekly seasonality.
        let trend = 40.0 + day as f64 * 0.2 + 8.0 * (day as f64 * std::f64::consts::TAU / 7.0).sin();
        for (i, region) in REGIONS.iter().enumerate() {
            let units = rng.gauss(trend + i as f64 * 5.0, 6.0).round().max(0.0) as i64;
            let price = (rng.gauss(19.9, 1.5) * 100.0).round() / 100.0;
            // Roughly one row in fifty has no recorded price.
            let (price_field, revenue_field) = if rng.next_f64() < 0.02 {
                (String::new(), String::new())
            } else {
                (
                    format!("{price:.2}"),
                    format!("{:.2}", units as f64 * price),
                )
            };
            writer.write_record([
                date.format("%Y-%m-%d").to_string(),
                region.to_string(),
                units.to_string(),
                price_field,
                revenue_field,
            ])?;
            rows += 1;
        }
    }
    writer.flush()?;

    log::info!("Wrote {rows} rows to {output_path}");
    println!("Wrote {rows} rows ({} regions over {DAYS} days) to {output_path}", REGIONS.len());
    Ok(())
}
