//! Secondary energy/jitter model: an advisory per-node
//! temperature and timing readout. Nothing here is consulted by
//! [`crate::cpu::Cpu::step`] or the chip scheduler — it is folded in by
//! the caller after the fact, sitting beside (not inside) instruction
//! dispatch.

use crate::word::Opcode;

/// Fixed per-opcode energy (pJ) and base execution time (ns). Opcodes are
/// grouped by the same categories `cpu::step` dispatches on, since those are
/// the categories whose relative cost is actually distinguishable here.
fn energy_and_base_time(op: Opcode) -> (f64, f64) {
    use Opcode::*;
    match op {
        Ret | Ex | Jump | Call | Unext | Next | If | MinusIf => (3.2, 4.0),
        FetchP | FetchPlus | FetchB | Fetch | StoreP | StorePlus | StoreB | Store => (2.6, 3.5),
        MulStep | ShiftLeft | ShiftRight | Not | Plus | And | Or => (1.8, 2.5),
        Nop | Drop | Dup | Pop | Over | A | Push | BStore | AStore => (1.1, 2.0),
    }
}

/// Cooling-law and jitter coefficients shaping `exp(-dt/tau)` decay with
/// Gaussian jitter scaled by `sqrt(|T|)`; picked to keep temperature in a
/// readable ~0..100 range under sustained opcode traffic rather than to
/// match any particular silicon part.
const TAU: f64 = 50.0;
const ENERGY_TO_TEMP_K: f64 = 0.6;
const JITTER_COEFFICIENT_J: f64 = 0.05;
const TEMP_TIME_ALPHA: f64 = 0.01;

/// Per-node xorshift32 PRNG, periodically remixed with the node's own
/// temperature so two nodes executing
/// identical instruction streams still diverge once their thermal
/// histories diverge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThermalRng {
    state: u32,
}

impl ThermalRng {
    pub fn new(seed: u32) -> Self {
        Self { state: if seed == 0 { 0x9E37_79B9 } else { seed } }
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Standard normal sample via Box-Muller, built from two draws of this
    /// xorshift32 stream.
    fn next_standard_normal(&mut self) -> f64 {
        let u1 = ((self.next_u32() as f64) + 1.0) / (u32::MAX as f64 + 2.0);
        let u2 = (self.next_u32() as f64) / (u32::MAX as f64 + 1.0);
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }

    /// Folds `temperature` back into the generator state.
    pub fn mix_thermal_seed(&mut self, temperature: f64) {
        self.state ^= temperature.to_bits() as u32;
        self.next_u32();
    }
}

/// A node's advisory thermal state, stepped once per executed opcode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalState {
    pub temperature: f64,
    pub elapsed_ns: f64,
    pub energy_pj: f64,
    rng: ThermalRng,
}

impl ThermalState {
    pub fn new(seed: u32) -> Self {
        Self { temperature: 0.0, elapsed_ns: 0.0, energy_pj: 0.0, rng: ThermalRng::new(seed) }
    }

    /// Advances the model by one executed opcode, given the wall-clock gap
    /// `dt_ns` since the last instruction on this node.
    pub fn record_instruction(&mut self, op: Opcode, dt_ns: f64) {
        let (energy, base_time) = energy_and_base_time(op);

        self.temperature = self.temperature * (-dt_ns / TAU).exp() + energy * ENERGY_TO_TEMP_K;
        self.energy_pj += energy;

        let sigma = JITTER_COEFFICIENT_J * base_time * self.temperature.abs().sqrt();
        let jitter = sigma * self.rng.next_standard_normal();
        let instruction_time = (base_time * (1.0 + TEMP_TIME_ALPHA * self.temperature) + jitter).max(0.0);
        self.elapsed_ns += instruction_time;

        if self.energy_pj > 0.0 && (self.energy_pj / energy).round() as u64 % 64 == 0 {
            self.rng.mix_thermal_seed(self.temperature);
        }
    }
}
