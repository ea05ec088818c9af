pub(crate) mod integrator;
pub(crate) mod state;
