//! Biological parameters and event rates of the two-strain model.
//!
//! Strain 1 is drug-susceptible, strain 2 carries partial resistance at a
//! reproductive cost. Both compete for a shared carrying capacity and die
//! naturally and through a Hill-type pharmacodynamic response to the
//! antibiotic concentration.

/// Reproduction rate of strain 1.
pub const REPRODUCTION: f64 = 2.7726;
/// Reproductive cost of carrying resistance (strain 2).
pub const RESISTANCE_COST: f64 = 0.2;
/// Shared carrying capacity.
pub const CAPACITY: f64 = 1000.0;
/// Antibiotic degradation rate per time unit.
pub const DECAY: f64 = 0.48;

/// Pharmacodynamic parameters of one strain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strain {
    /// Natural mortality rate.
    pub mortality: f64,
    /// Max net growth rate without antibiotic.
    pub max_growth: f64,
    /// Min net growth rate at saturating antibiotic.
    pub min_growth: f64,
    /// Pharmacodynamic MIC (half-maximal-effect concentration).
    pub mic: f64,
    /// Hill coefficient.
    pub hill: f64,
}

impl Strain {
    /// Death rate of `n` bacteria at concentration `conc`, natural plus drug-induced.
    pub fn death_rate(&self, conc: f64, n: f64) -> f64 {
        let h = (conc / self.mic).powf(self.hill);
        self.mortality * n
            + ((self.max_growth - self.min_growth) * h) / (h - self.min_growth / self.max_growth) * n
    }
}

/// Susceptible strain.
pub const STRAIN_1: Strain = Strain {
    mortality: 0.2,
    max_growth: REPRODUCTION - 0.2,
    min_growth: -2.1,
    mic: 16.0,
    hill: 4.0,
};

/// Partially resistant strain.
pub const STRAIN_2: Strain = Strain {
    mortality: 0.2,
    max_growth: REPRODUCTION * (1.0 - RESISTANCE_COST) - 0.2,
    min_growth: -2.1,
    mic: 32.0,
    hill: 4.0,
};

/// The four competing event rates, in selection order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    pub growth_1: f64,
    pub growth_2: f64,
    pub death_1: f64,
    pub death_2: f64,
}

impl Rates {
    /// Compute the event rates for populations `(s1, s2)` at concentration `conc`.
    ///
    /// Negative population counts contribute nothing, and logistic crowding
    /// never drives a growth rate below zero.
    pub fn new(s1: i32, s2: i32, conc: f64) -> Self {
        let n1 = s1.max(0) as f64;
        let n2 = s2.max(0) as f64;
        let crowding = (1.0 - (n1 + n2) / CAPACITY).max(0.0);
        Self {
            growth_1: REPRODUCTION * n1 * crowding,
            growth_2: REPRODUCTION * n2 * crowding * (1.0 - RESISTANCE_COST),
            death_1: STRAIN_1.death_rate(conc, n1),
            death_2: STRAIN_2.death_rate(conc, n2),
        }
    }

    pub fn sum(&self) -> f64 {
        self.growth_1 + self.growth_2 + self.death_1 + self.death_2
    }
}
