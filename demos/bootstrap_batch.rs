use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use toy_tfhe_bootstrap::{
    BootstrapMetrics, BootstrapParams, Bootstrapper, f64_to_torus32, generate_key_pair,
    mod_switch_to_torus32, torus32_to_f64,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("🔐 TFHE Gate Bootstrapping Demo");
    let params = BootstrapParams::small();
    println!(
        "📐 n = {}, N = {}, k = {}, ℓ = {}, Bgbit = {}",
        params.lwe.n,
        params.tgsw.tlwe.ring_degree,
        params.tgsw.tlwe.mask_size,
        params.tgsw.decomp_length,
        params.tgsw.base_bits
    );

    let mut rng = ChaCha20Rng::from_seed([42u8; 32]);
    let (secrets, keys) = generate_key_pair(params, &mut rng)?;
    println!("✅ Keys generated");

    let phases = [0.25, -0.25, 0.1, -0.4, 0.4, -0.1, 0.3, -0.3];
    let messages: Vec<_> = phases.iter().map(|&p| f64_to_torus32(p)).collect();
    let input = secrets.lwe.encrypt(&messages, params.lwe.alpha_min, &mut rng)?;
    println!("\n📊 Input phases: {phases:?}");

    let bootstrapper = Bootstrapper::new(&keys)?;
    let mu = mod_switch_to_torus32(1, 8);
    let mut metrics = BootstrapMetrics::default();
    let output = bootstrapper.bootstrap_with_metrics(&input, mu, &mut metrics)?;

    let refreshed = secrets.lwe.phase(&output)?;
    println!("\n🔄 Bootstrapped:");
    for (phase, out) in phases.iter().zip(&refreshed) {
        let sign = if *out >= 0 { '+' } else { '-' };
        println!("  {phase:>6.2} → {sign}  (phase {:+.5})", torus32_to_f64(*out));
    }

    println!("\n⏱️  Timings for {} samples:", metrics.samples);
    println!("  allocation      {:?}", metrics.allocation);
    println!("  modulus switch  {:?}", metrics.modulus_switch);
    println!("  blind rotation  {:?}", metrics.blind_rotation);
    println!("  extraction      {:?}", metrics.extraction);
    println!("  key switch      {:?}", metrics.key_switch);
    println!("  total           {:?}", metrics.total());
    Ok(())
}
