//! Parameter sets threading through every stage of the bootstrap pipeline.
//!
//! - `n`: outer LWE dimension
//! - `N`: ring degree (power of two)
//! - `k`: TLWE mask width
//! - `ℓ`, `Bgbit`: TGSW gadget decomposition (level count, base bits)
//! - `t`, `basebit`: key-switch decomposition
//! - `alpha`: noise standard deviations, consumed only by key generation
use crate::errors::{TfheError, TfheResult};
use crate::torus::Torus32;

/// Parameters of an LWE sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LweParams {
    pub n: usize,
    pub alpha_min: f64,
    pub alpha_max: f64,
}

impl LweParams {
    pub fn new(n: usize, alpha_min: f64, alpha_max: f64) -> Self {
        Self {
            n,
            alpha_min,
            alpha_max,
        }
    }
}

/// Parameters of a TLWE sample over `Z[X]/(X^N + 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TLweParams {
    pub ring_degree: usize,
    pub mask_size: usize,
    pub alpha_min: f64,
    pub alpha_max: f64,
}

impl TLweParams {
    pub fn new(
        ring_degree: usize,
        mask_size: usize,
        alpha_min: f64,
        alpha_max: f64,
    ) -> Self {
        Self {
            ring_degree,
            mask_size,
            alpha_min,
            alpha_max,
        }
    }

    /// Parameters of the LWE sample obtained by extracting one coefficient.
    pub fn extracted_lwe_params(&self) -> LweParams {
        LweParams::new(
            self.ring_degree * self.mask_size,
            self.alpha_min,
            self.alpha_max,
        )
    }

    /// Number of spectral coefficients per polynomial.
    pub fn spectral_len(&self) -> usize {
        self.ring_degree / 2
    }
}

/// Parameters of a TGSW sample: `(k+1)·ℓ` TLWE rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TGswParams {
    pub decomp_length: usize,
    pub base_bits: u32,
    pub tlwe: TLweParams,
}

impl TGswParams {
    pub fn new(decomp_length: usize, base_bits: u32, tlwe: TLweParams) -> Self {
        Self {
            decomp_length,
            base_bits,
            tlwe,
        }
    }

    /// Number of TLWE rows, `(k+1)·ℓ`.
    pub fn row_count(&self) -> usize {
        (self.tlwe.mask_size + 1) * self.decomp_length
    }

    pub fn base(&self) -> u32 {
        1 << self.base_bits
    }

    /// Gadget value `Bg^{-(level+1)}` as a torus value.
    pub fn gadget(&self, level: usize) -> Torus32 {
        let shift = 32 - (level as u32 + 1) * self.base_bits;
        (1u32 << shift) as Torus32
    }
}

/// Parameters of the key-switching decomposition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeySwitchParams {
    pub length: usize,
    pub base_bits: u32,
}

impl KeySwitchParams {
    pub fn new(length: usize, base_bits: u32) -> Self {
        Self { length, base_bits }
    }

    pub fn base(&self) -> usize {
        1 << self.base_bits
    }
}

/// Everything a bootstrap call needs to know about its keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BootstrapParams {
    pub lwe: LweParams,
    pub tgsw: TGswParams,
    pub key_switch: KeySwitchParams,
}

impl BootstrapParams {
    pub fn builder() -> BootstrapParamsBuilder {
        BootstrapParamsBuilder::new()
    }

    /// The standard gate-bootstrapping set (about 128 bits of security).
    pub fn default_128() -> Self {
        const MAX_STDEV: f64 = 0.012_467;
        Self {
            lwe: LweParams::new(500, 2.44e-5, MAX_STDEV),
            tgsw: TGswParams::new(
                2,
                10,
                TLweParams::new(1024, 1, 7.18e-9, MAX_STDEV),
            ),
            key_switch: KeySwitchParams::new(8, 2),
        }
    }

    /// A small, insecure set for tests and demos.
    pub fn small() -> Self {
        let mut params = Self::default_128();
        params.lwe.n = 64;
        params.tgsw.tlwe.ring_degree = 256;
        params
    }

    pub fn accumulator(&self) -> &TLweParams {
        &self.tgsw.tlwe
    }

    pub fn extracted(&self) -> LweParams {
        self.tgsw.tlwe.extracted_lwe_params()
    }

    /// Checks the invariants every stage relies on.
    pub fn validate(&self) -> TfheResult<()> {
        let tlwe = &self.tgsw.tlwe;
        if !tlwe.ring_degree.is_power_of_two() || tlwe.ring_degree < 4 {
            return Err(TfheError::invalid(format!(
                "ring degree must be a power of two >= 4, got {}",
                tlwe.ring_degree
            )));
        }
        if tlwe.mask_size == 0 {
            return Err(TfheError::invalid("TLWE mask size must be at least 1"));
        }
        if self.lwe.n == 0 {
            return Err(TfheError::invalid("LWE dimension must be at least 1"));
        }
        check_decomposition(
            "TGSW",
            self.tgsw.decomp_length,
            self.tgsw.base_bits,
        )?;
        check_decomposition(
            "key-switch",
            self.key_switch.length,
            self.key_switch.base_bits,
        )?;
        for (name, alpha) in [
            ("LWE alpha_min", self.lwe.alpha_min),
            ("LWE alpha_max", self.lwe.alpha_max),
            ("TLWE alpha_min", tlwe.alpha_min),
            ("TLWE alpha_max", tlwe.alpha_max),
        ] {
            if !alpha.is_finite() || alpha < 0.0 {
                return Err(TfheError::invalid(format!(
                    "{name} must be finite and non-negative, got {alpha}"
                )));
            }
        }
        Ok(())
    }
}

pub(crate) fn check_decomposition(
    name: &str,
    length: usize,
    base_bits: u32,
) -> TfheResult<()> {
    if length == 0 || base_bits == 0 {
        return Err(TfheError::invalid(format!(
            "{name} decomposition needs at least one level of at least one bit"
        )));
    }
    if length as u64 * base_bits as u64 > 32 {
        return Err(TfheError::invalid(format!(
            "{name} decomposition uses {length}x{base_bits} bits, more than 32"
        )));
    }
    Ok(())
}

pub struct BootstrapParamsBuilder {
    lwe_dimension: Option<usize>,
    ring_degree: Option<usize>,
    mask_size: Option<usize>,
    decomp_length: Option<usize>,
    decomp_base_bits: Option<u32>,
    ks_length: Option<usize>,
    ks_base_bits: Option<u32>,
    lwe_stdev: Option<f64>,
    tlwe_stdev: Option<f64>,
}

impl Default for BootstrapParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BootstrapParamsBuilder {
    pub fn new() -> Self {
        Self {
            lwe_dimension: None,
            ring_degree: None,
            mask_size: None,
            decomp_length: None,
            decomp_base_bits: None,
            ks_length: None,
            ks_base_bits: None,
            lwe_stdev: None,
            tlwe_stdev: None,
        }
    }

    pub fn lwe_dimension(mut self, n: usize) -> Self {
        self.lwe_dimension = Some(n);
        self
    }

    pub fn ring_degree(mut self, degree: usize) -> Self {
        self.ring_degree = Some(degree);
        self
    }

    pub fn mask_size(mut self, k: usize) -> Self {
        self.mask_size = Some(k);
        self
    }

    pub fn decomposition(mut self, length: usize, base_bits: u32) -> Self {
        self.decomp_length = Some(length);
        self.decomp_base_bits = Some(base_bits);
        self
    }

    pub fn key_switch(mut self, length: usize, base_bits: u32) -> Self {
        self.ks_length = Some(length);
        self.ks_base_bits = Some(base_bits);
        self
    }

    pub fn lwe_stdev(mut self, stdev: f64) -> Self {
        self.lwe_stdev = Some(stdev);
        self
    }

    pub fn tlwe_stdev(mut self, stdev: f64) -> Self {
        self.tlwe_stdev = Some(stdev);
        self
    }

    /// Fills unset fields from [`BootstrapParams::default_128`] and validates.
    pub fn build(self) -> TfheResult<BootstrapParams> {
        let defaults = BootstrapParams::default_128();
        let mut params = defaults;
        params.lwe.n = self.lwe_dimension.unwrap_or(defaults.lwe.n);
        params.lwe.alpha_min = self.lwe_stdev.unwrap_or(defaults.lwe.alpha_min);
        params.tgsw.tlwe.ring_degree =
            self.ring_degree.unwrap_or(defaults.tgsw.tlwe.ring_degree);
        params.tgsw.tlwe.mask_size =
            self.mask_size.unwrap_or(defaults.tgsw.tlwe.mask_size);
        params.tgsw.tlwe.alpha_min =
            self.tlwe_stdev.unwrap_or(defaults.tgsw.tlwe.alpha_min);
        params.tgsw.decomp_length =
            self.decomp_length.unwrap_or(defaults.tgsw.decomp_length);
        params.tgsw.base_bits =
            self.decomp_base_bits.unwrap_or(defaults.tgsw.base_bits);
        params.key_switch.length =
            self.ks_length.unwrap_or(defaults.key_switch.length);
        params.key_switch.base_bits =
            self.ks_base_bits.unwrap_or(defaults.key_switch.base_bits);
        params.validate()?;
        Ok(params)
    }
}
