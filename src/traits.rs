/// A fit model `f(x; p)` with parameters `p`
pub trait Model {
    /// Number of parameters
    fn npar(&self) -> usize;

    /// Model value at `x`
    fn eval(&self, x: f64, par: &[f64]) -> f64;
}

pub trait Progress {
    fn inc(&self, i: u64);

    fn finish(&self);
}
