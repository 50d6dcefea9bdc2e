use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            // splitmix64
            x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
            let mut z = x;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
            *slot = z ^ (z >> 31);
        }
        Self { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = self.state[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);
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

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Log-normal draw, for right-skewed durations and enrollments.
    fn lognormal(&mut self, median: f64, sigma: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        median * (sigma * z).exp()
    }
}

const PHASES: [&str; 4] = ["Phase 2", "Phase 3", "Phase 2/3", "Phase 1/2"];
const SPONSORS: [&str; 3] = ["Industry", "Academic", "Government"];
const CONDITIONS: [&str; 5] = [
    "Oncology",
    "Cardiovascular",
    "Infectious Disease",
    "Neurology",
    "Metabolic",
];
const STATUSES: [&str; 5] = ["Completed", "Terminated", "Withdrawn", "Active", "Recruiting"];

#[derive(Default)]
struct Columns {
    nct_id: Vec<String>,
    phase: Vec<Option<&'static str>>,
    sponsor_type: Vec<Option<&'static str>>,
    condition_area: Vec<Option<&'static str>>,
    status_group: Vec<Option<&'static str>>,
    // Pandas stores a nullable integer year as float64.
    start_year: Vec<Option<f64>>,
    duration: Vec<Option<f64>>,
    enrollment: Vec<Option<f64>>,
}

fn generate(n: usize, rng: &mut SimpleRng) -> Columns {
    let mut cols = Columns::default();
    for i in 0..n {
        let phase = rng.pick(&PHASES);
        let status = rng.pick(&STATUSES);
        let ongoing = matches!(status, "Active" | "Recruiting");

        let year = if rng.chance(0.05) {
            None
        } else if ongoing {
            Some(2020.0 + (rng.next_u64() % 6) as f64)
        } else {
            Some(2008.0 + (rng.next_u64() % 15) as f64)
        };
        let base_days = if phase == "Phase 3" { 1100.0 } else { 800.0 };
        // Right-censored: ongoing trials have no completion yet.
        let duration = (!ongoing && status != "Withdrawn" && !rng.chance(0.08))
            .then(|| rng.lognormal(base_days, 0.45).round());
        let enrollment = (status != "Withdrawn" && !rng.chance(0.1))
            .then(|| rng.lognormal(180.0, 0.9).round());

        cols.nct_id.push(format!("NCT{:08}", 1_000_000 + i));
        cols.phase.push(Some(phase));
        cols.sponsor_type
            .push((!rng.chance(0.02)).then(|| rng.pick(&SPONSORS)));
        cols.condition_area
            .push((!rng.chance(0.04)).then(|| rng.pick(&CONDITIONS)));
        cols.status_group.push(Some(status));
        cols.start_year.push(year);
        cols.duration.push(duration);
        cols.enrollment.push(enrollment);
    }
    cols
}

fn write_snapshot(path: &Path, cols: Columns) -> Result<usize> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("nct_id", DataType::Utf8, false),
        Field::new("phase", DataType::Utf8, true),
        Field::new("sponsor_type", DataType::Utf8, true),
        Field::new("condition_area", DataType::Utf8, true),
        Field::new("status_group", DataType::Utf8, true),
        Field::new("start_year", DataType::Float64, true),
        Field::new("duration_start_to_completion_days", DataType::Float64, true),
        Field::new("enrollment_count", DataType::Float64, true),
    ]));
    let n = cols.nct_id.len();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(cols.nct_id)),
            Arc::new(StringArray::from(cols.phase)),
            Arc::new(StringArray::from(cols.sponsor_type)),
            Arc::new(StringArray::from(cols.condition_area)),
            Arc::new(StringArray::from(cols.status_group)),
            Arc::new(Float64Array::from(cols.start_year)),
            Arc::new(Float64Array::from(cols.duration)),
            Arc::new(Float64Array::from(cols.enrollment)),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(n)
}

/// A small phase summary so the reporting section has something to show.
fn write_phase_table(path: &Path, cols: &Columns) -> Result<()> {
    let mut out = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    out.write_record(["phase", "trials", "discontinued"])?;
    for phase in PHASES {
        let rows: Vec<usize> = (0..cols.phase.len())
            .filter(|&i| cols.phase[i] == Some(phase))
            .collect();
        let discontinued = rows
            .iter()
            .filter(|&&i| matches!(cols.status_group[i], Some("Terminated" | "Withdrawn")))
            .count();
        out.write_record([phase.to_string(), rows.len().to_string(), discontinued.to_string()])?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let data_dir = root.join("data").join("processed");
    let table_dir = root.join("reports").join("tables");
    std::fs::create_dir_all(&data_dir).context("creating data directory")?;
    std::fs::create_dir_all(&table_dir).context("creating tables directory")?;
    std::fs::create_dir_all(root.join("reports").join("figures"))
        .context("creating figures directory")?;

    let mut rng = SimpleRng::new(42);
    let cols = generate(2_500, &mut rng);

    let table_path = table_dir.join("trials_by_phase.csv");
    write_phase_table(&table_path, &cols)?;

    let snapshot_path = data_dir.join("trialpulse_analysis.parquet");
    let n = write_snapshot(&snapshot_path, cols)?;

    println!(
        "Wrote {n} trials to {} and a summary to {}",
        snapshot_path.display(),
        table_path.display()
    );
    Ok(())
}
