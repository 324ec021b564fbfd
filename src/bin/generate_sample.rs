use std::io::Write;
use std::sync::Arc;

use arrow::array::Float64Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Thermal voltage at 300 K, V.
const VT: f64 = 0.025852;

/// Single-diode cell parameters (current densities in mA/cm², resistances
/// in Ω·cm²).
struct Cell {
    j_ph: f64,
    j_0: f64,
    ideality: f64,
    r_sh: f64,
}

impl Cell {
    /// Current density at `v`, negative under illumination (photocurrent
    /// flows out of the device).
    fn current_density(&self, v: f64) -> f64 {
        -self.j_ph + self.j_0 * ((v / (self.ideality * VT)).exp() - 1.0) + 1000.0 * v / self.r_sh
    }
}

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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() {
    let mut rng = SimpleRng::new(42);

    let cell = Cell {
        j_ph: 22.0,
        j_0: 1e-9,
        ideality: 1.5,
        r_sh: 1000.0,
    };
    // 6 mm² device, the calculator's default.
    let area_cm2 = 0.06;

    // Forward scan: -0.2 V → 1.1 V, step 10 mV
    let voltages: Vec<f64> = (0..=130).map(|i| -0.2 + i as f64 * 0.01).collect();
    let currents: Vec<f64> = voltages
        .iter()
        .map(|&v| {
            let j = cell.current_density(v) + rng.gauss(0.0, 0.02);
            j * area_cm2 / 1000.0
        })
        .collect();

    // CSV with a header row
    let csv_path = "sample_jv.csv";
    let mut csv = std::fs::File::create(csv_path).expect("Failed to create CSV file");
    writeln!(csv, "Voltage (V),Current (A)").expect("Failed to write CSV");
    for (v, i) in voltages.iter().zip(&currents) {
        writeln!(csv, "{v},{i}").expect("Failed to write CSV");
    }

    // Reverse scan as tab separated text, the way it is pasted from a
    // source-meter export.
    let txt_path = "sample_jv_reverse.txt";
    let mut txt = std::fs::File::create(txt_path).expect("Failed to create text file");
    for (v, i) in voltages.iter().zip(&currents).rev() {
        writeln!(txt, "{v}\t{i}").expect("Failed to write text file");
    }

    // Parquet
    let schema = Arc::new(Schema::new(vec![
        Field::new("Voltage", DataType::Float64, false),
        Field::new("Current", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(voltages.clone())),
            Arc::new(Float64Array::from(currents)),
        ],
    )
    .expect("Failed to create RecordBatch");

    let parquet_path = "sample_jv.parquet";
    let file = std::fs::File::create(parquet_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    println!(
        "Wrote {} samples to {csv_path}, {txt_path} and {parquet_path}",
        voltages.len()
    );
}
