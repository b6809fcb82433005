mod coverage;
mod loader;
mod run;

pub(crate) use run::run;
