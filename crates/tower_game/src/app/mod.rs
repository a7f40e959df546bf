mod bootstrap;
mod command;
mod runner;

pub(crate) use runner::run;
