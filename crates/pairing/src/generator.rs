use rand::Rng;

/// Produces new pair codes when rotation fires.
///
/// Implementations must return exactly six decimal digits (zero-padded).
/// Supplying a custom generator is mostly useful for tests that want
/// deterministic or exhaustible sequences.
pub trait PairCodeGenerator: Send + Sync {
    /// Returns a freshly generated six-digit pair code.
    fn generate(&self) -> String;
}

/// The default generator: a uniformly random six-digit code per call.
#[derive(Debug, Default)]
pub struct RandomPairCodeGenerator;

impl PairCodeGenerator for RandomPairCodeGenerator {
    fn generate(&self) -> String {
        let value: u32 = rand::thread_rng().gen_range(0..1_000_000);
        format!("{value:06}")
    }
}

/// Maximum number of regeneration attempts made to avoid producing a code
/// identical to the one currently in effect.
pub const MAX_REGENERATE_ATTEMPTS: u32 = 5;

/// Generates a code distinct from `avoid`, retrying up to
/// [`MAX_REGENERATE_ATTEMPTS`] times. If every attempt collides, returns
/// the last generated value anyway (rotation still proceeds; a single
/// collision across six independent random draws is vanishingly unlikely
/// and not worth failing the rotation over).
pub fn generate_distinct(generator: &dyn PairCodeGenerator, avoid: Option<&str>) -> String {
    let mut candidate = generator.generate();
    let mut attempts = 0;
    while Some(candidate.as_str()) == avoid && attempts < MAX_REGENERATE_ATTEMPTS {
        candidate = generator.generate();
        attempts += 1;
    }
    candidate
}
