pub mod fund;
pub mod generate;
pub mod run;
pub mod set_inflation;
