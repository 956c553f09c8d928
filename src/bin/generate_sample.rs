use anyhow::{Context, Result};

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
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

const CONDITIONS: [&str; 6] = [
    "Asthma",
    "Diabetes",
    "Hypertension",
    "Migraine",
    "Arthritis",
    "Depression",
];
const SITES: [&str; 3] = ["North", "Central", "South"];
const SEXES: [&str; 2] = ["F", "M"];

/// Writes a synthetic patient survey: a multi-valued `conditions` column
/// (quoted, `", "`-separated), a binary `response` column, numeric `age` and
/// `satisfaction`, and a sparse categorical `smoker` column.
fn main() -> Result<()> {
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_survey.csv".to_string());
    let mut rng = SimpleRng::new(42);

    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("creating {output_path}"))?;
    writer.write_record([
        "id",
        "conditions",
        "sex",
        "site",
        "age",
        "response",
        "satisfaction",
        "smoker",
    ])?;

    let n_patients = 300;
    for i in 0..n_patients {
        let first = rng.pick(&CONDITIONS);
        let conditions = if rng.next_f64() < 0.3 {
            let second = rng.pick(&CONDITIONS);
            if second == first {
                first.to_string()
            } else {
                format!("{first}, {second}")
            }
        } else {
            first.to_string()
        };

        let age = rng.gauss(52.0, 15.0).clamp(18.0, 95.0).round();
        // older patients improve a little less often
        let improved = rng.next_f64() < 0.75 - (age - 18.0) / 300.0;
        let satisfaction = (rng.gauss(if improved { 4.0 } else { 2.5 }, 0.8))
            .clamp(1.0, 5.0)
            .round();
        let smoker = match rng.next_f64() {
            p if p < 0.2 => "yes",
            p if p < 0.7 => "no",
            _ => "",
        };

        writer.write_record([
            format!("P{:04}", i + 1),
            conditions,
            rng.pick(&SEXES).to_string(),
            rng.pick(&SITES).to_string(),
            age.to_string(),
            if improved { "Improved" } else { "Not improved" }.to_string(),
            satisfaction.to_string(),
            smoker.to_string(),
        ])?;
    }
    writer.flush().with_context(|| format!("writing {output_path}"))?;

    println!("Wrote {n_patients} survey rows to {output_path}");
    Ok(())
}
