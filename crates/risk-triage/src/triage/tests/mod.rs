mod common;
mod rules;
mod training;
